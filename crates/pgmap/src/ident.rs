//! SQL identifier quoting.
//!
//! Rendered identifiers are always double-quoted with embedded `"` doubled,
//! so a table or column name can never change the statement shape.

/// Write `name` into `out` as a quoted SQL identifier.
pub(crate) fn write_ident(out: &mut String, name: &str) {
    out.push('"');
    for ch in name.chars() {
        if ch == '"' {
            out.push('"');
        }
        out.push(ch);
    }
    out.push('"');
}

/// Quoted identifier as an owned string.
pub fn quote_ident(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 2);
    write_ident(&mut out, name);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ident_simple() {
        assert_eq!(quote_ident("users"), r#""users""#);
    }

    #[test]
    fn ident_mixed_case() {
        assert_eq!(quote_ident("UserTable"), r#""UserTable""#);
    }

    #[test]
    fn ident_embedded_quote_doubled() {
        assert_eq!(quote_ident(r#"has"quote"#), r#""has""quote""#);
    }

    #[test]
    fn ident_space_kept_inside_quotes() {
        assert_eq!(quote_ident("my table"), r#""my table""#);
    }
}
