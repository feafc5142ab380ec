//! The SQL fragment buffer.
//!
//! [`SqlBuf`] is an append-only sequence of typed fragments and the sole
//! output contract of the statement renderer. A separate [`SqlBuf::render`]
//! step turns the sequence into `(commandText, parameterList)` with dense
//! 1-based `$n` placeholders whose numbering matches list position exactly.

use crate::ident::write_ident;
use crate::value::Value;

/// One atomic unit of SQL text production.
#[derive(Debug, Clone, PartialEq)]
pub enum Fragment {
    /// Literal SQL text, emitted verbatim.
    Text(String),
    /// A quoted identifier.
    Ident(String),
    /// A bound parameter, rendered as a positional placeholder.
    Param(Value),
    /// A value embedded directly as a literal (LIMIT, explicit opt-in).
    Inline(Value),
}

/// Append-only SQL fragment buffer.
#[must_use]
#[derive(Debug, Default, Clone)]
pub struct SqlBuf {
    frags: Vec<Fragment>,
}

impl SqlBuf {
    /// Create an empty buffer.
    pub fn new() -> Self {
        Self { frags: Vec::new() }
    }

    /// Append literal SQL text.
    pub fn push(&mut self, text: &str) -> &mut Self {
        if text.is_empty() {
            return self;
        }
        match self.frags.last_mut() {
            Some(Fragment::Text(last)) => last.push_str(text),
            _ => self.frags.push(Fragment::Text(text.to_string())),
        }
        self
    }

    /// Append a quoted identifier.
    pub fn push_ident(&mut self, name: &str) -> &mut Self {
        self.frags.push(Fragment::Ident(name.to_string()));
        self
    }

    /// Append a bound parameter.
    pub fn push_param(&mut self, value: impl Into<Value>) -> &mut Self {
        self.frags.push(Fragment::Param(value.into()));
        self
    }

    /// Append a value as an inline literal.
    ///
    /// This bypasses parameter binding; use only where parameterization is
    /// structurally impossible or explicitly requested.
    pub fn push_inline(&mut self, value: impl Into<Value>) -> &mut Self {
        self.frags.push(Fragment::Inline(value.into()));
        self
    }

    /// Number of parameter fragments appended so far.
    pub fn param_count(&self) -> usize {
        self.frags
            .iter()
            .filter(|f| matches!(f, Fragment::Param(_)))
            .count()
    }

    /// The raw fragment sequence.
    pub fn fragments(&self) -> &[Fragment] {
        &self.frags
    }

    /// Render the fragment sequence into SQL text and an ordered parameter
    /// list. Placeholder numbers are dense, 1-based, and match list position.
    pub fn render(&self) -> (String, Vec<Value>) {
        // Pre-size the output to avoid repeated reallocation.
        let mut idx = 0usize;
        let mut cap = 0usize;
        for frag in &self.frags {
            match frag {
                Fragment::Text(s) => cap += s.len(),
                Fragment::Ident(s) => cap += s.len() + 2,
                Fragment::Param(_) => {
                    idx += 1;
                    cap += 1 + decimal_digits(idx);
                }
                Fragment::Inline(_) => cap += 8,
            }
        }

        let mut sql = String::with_capacity(cap);
        let mut params = Vec::with_capacity(idx);
        for frag in &self.frags {
            match frag {
                Fragment::Text(s) => sql.push_str(s),
                Fragment::Ident(name) => write_ident(&mut sql, name),
                Fragment::Param(value) => {
                    params.push(value.clone());
                    sql.push('$');
                    sql.push_str(&params.len().to_string());
                }
                Fragment::Inline(value) => value.write_literal(&mut sql),
            }
        }
        (sql, params)
    }
}

#[inline]
fn decimal_digits(n: usize) -> usize {
    if n < 10 {
        1
    } else if n < 100 {
        2
    } else if n < 1000 {
        3
    } else {
        (n.ilog10() as usize) + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::SqlType;

    #[test]
    fn placeholders_are_dense_and_ordered() {
        let mut buf = SqlBuf::new();
        buf.push("SELECT ")
            .push_param(1i64)
            .push(", ")
            .push_param("two")
            .push(", ")
            .push_param(3.0f64);
        let (sql, params) = buf.render();
        assert_eq!(sql, "SELECT $1, $2, $3");
        assert_eq!(
            params,
            vec![Value::Int8(1), Value::Text("two".into()), Value::Float8(3.0)]
        );
    }

    #[test]
    fn idents_are_quoted() {
        let mut buf = SqlBuf::new();
        buf.push("SELECT ").push_ident("name").push(" FROM ").push_ident("users");
        let (sql, params) = buf.render();
        assert_eq!(sql, r#"SELECT "name" FROM "users""#);
        assert!(params.is_empty());
    }

    #[test]
    fn inline_values_skip_binding() {
        let mut buf = SqlBuf::new();
        buf.push("LIMIT ").push_inline(10i64);
        let (sql, params) = buf.render();
        assert_eq!(sql, "LIMIT 10");
        assert!(params.is_empty());
    }

    #[test]
    fn inline_string_is_escaped() {
        let mut buf = SqlBuf::new();
        buf.push_inline("O'Brien");
        let (sql, _) = buf.render();
        assert_eq!(sql, "'O''Brien'");
    }

    #[test]
    fn adjacent_text_fragments_coalesce() {
        let mut buf = SqlBuf::new();
        buf.push("SELECT ").push("1");
        assert_eq!(buf.fragments().len(), 1);
    }

    #[test]
    fn null_param_is_still_bound() {
        let mut buf = SqlBuf::new();
        buf.push("WHERE x = ").push_param(Value::Null(SqlType::Text));
        let (sql, params) = buf.render();
        assert_eq!(sql, "WHERE x = $1");
        assert_eq!(params, vec![Value::Null(SqlType::Text)]);
    }
}
