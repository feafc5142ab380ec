//! Constant folding.
//!
//! Reduces an expression to a single [`Value`] ahead of rendering. Anything
//! that depends on row data (column references, aggregates) is a
//! [`CompileError::NotConstant`]; a shape the folder cannot evaluate is
//! `Unsupported`. Both are synchronous compile failures, never deferred.

use crate::error::{CompileError, MapResult};
use crate::expr::{BinOp, Expr};
use crate::registry::Registry;
use crate::value::Value;

/// Fold `expr` to a constant value.
pub fn fold(cx: &Registry, expr: &Expr) -> MapResult<Value> {
    match expr {
        Expr::Value(v) => Ok(v.clone()),
        Expr::EnumConst { codec, value } => {
            codec.encode_int(*value, cx.enum_technique(codec.type_id))
        }
        Expr::Column { source, name } => Err(CompileError::NotConstant(format!(
            "column \"{name}\" of source #{source}"
        ))
        .into()),
        Expr::Func { func, .. } => {
            Err(CompileError::NotConstant(format!("aggregate {}", func.sql())).into())
        }
        Expr::Convert { expr, codec } => {
            let inner = fold(cx, expr)?;
            match inner.as_i64() {
                Some(int) => codec.encode_int(int, cx.enum_technique(codec.type_id)),
                None => Ok(inner),
            }
        }
        Expr::IsNull { expr, negate } => {
            let inner = fold(cx, expr)?;
            Ok(Value::Bool(inner.is_null() != *negate))
        }
        Expr::Row(_) => Err(CompileError::unsupported(
            "row constructor cannot fold to a single value",
        )
        .into()),
        Expr::Binary { lhs, op, rhs } => {
            let lhs = fold(cx, lhs)?;
            let rhs = fold(cx, rhs)?;
            fold_binary(&lhs, *op, &rhs)
        }
    }
}

fn fold_binary(lhs: &Value, op: BinOp, rhs: &Value) -> MapResult<Value> {
    let mismatch = || {
        CompileError::unsupported(format!(
            "cannot evaluate {} {} {}",
            lhs.type_name(),
            op.sql(),
            rhs.type_name()
        ))
    };

    match op {
        BinOp::And | BinOp::Or => {
            let (a, b) = match (lhs.as_bool(), rhs.as_bool()) {
                (Some(a), Some(b)) => (a, b),
                _ => return Err(mismatch().into()),
            };
            Ok(Value::Bool(if op == BinOp::And { a && b } else { a || b }))
        }
        BinOp::Add | BinOp::Sub | BinOp::Mul => {
            if let (Some(a), Some(b)) = (lhs.as_i64(), rhs.as_i64()) {
                let n = match op {
                    BinOp::Add => a.wrapping_add(b),
                    BinOp::Sub => a.wrapping_sub(b),
                    _ => a.wrapping_mul(b),
                };
                return Ok(Value::Int8(n));
            }
            if let (Some(a), Some(b)) = (numeric(lhs), numeric(rhs)) {
                let n = match op {
                    BinOp::Add => a + b,
                    BinOp::Sub => a - b,
                    _ => a * b,
                };
                return Ok(Value::Float8(n));
            }
            // String concatenation folds through `+`.
            if op == BinOp::Add {
                if let (Some(a), Some(b)) = (lhs.as_str(), rhs.as_str()) {
                    return Ok(Value::Text(format!("{a}{b}")));
                }
            }
            Err(mismatch().into())
        }
        BinOp::Eq | BinOp::Ne | BinOp::Lt | BinOp::Le | BinOp::Gt | BinOp::Ge => {
            let ordering = if let (Some(a), Some(b)) = (lhs.as_i64(), rhs.as_i64()) {
                a.cmp(&b)
            } else if let (Some(a), Some(b)) = (numeric(lhs), numeric(rhs)) {
                a.partial_cmp(&b).ok_or_else(mismatch)?
            } else if let (Some(a), Some(b)) = (lhs.as_str(), rhs.as_str()) {
                a.cmp(b)
            } else if let (Some(a), Some(b)) = (lhs.as_bool(), rhs.as_bool()) {
                a.cmp(&b)
            } else {
                return Err(mismatch().into());
            };
            let result = match op {
                BinOp::Eq => ordering.is_eq(),
                BinOp::Ne => ordering.is_ne(),
                BinOp::Lt => ordering.is_lt(),
                BinOp::Le => ordering.is_le(),
                BinOp::Gt => ordering.is_gt(),
                _ => ordering.is_ge(),
            };
            Ok(Value::Bool(result))
        }
    }
}

/// Numeric view with int-to-float promotion for mixed operands.
fn numeric(v: &Value) -> Option<f64> {
    v.as_f64().or_else(|| v.as_i64().map(|n| n as f64))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enums::EnumTechnique;
    use crate::expr::{col, enum_lit, lit};

    crate::pg_enum! {
        enum Tier {
            Free = 0,
            Paid = 1,
        }
    }

    #[test]
    fn integer_arithmetic_folds() {
        let cx = Registry::new();
        let e = lit(2i64).add(3i64).mul(4i64);
        assert_eq!(fold(&cx, &e).unwrap(), Value::Int8(20));
    }

    #[test]
    fn mixed_numeric_promotes_to_float() {
        let cx = Registry::new();
        let e = lit(2i64).add(0.5f64);
        assert_eq!(fold(&cx, &e).unwrap(), Value::Float8(2.5));
    }

    #[test]
    fn string_concat_folds() {
        let cx = Registry::new();
        let e = lit("foo").add("bar");
        assert_eq!(fold(&cx, &e).unwrap(), Value::Text("foobar".into()));
    }

    #[test]
    fn boolean_logic_and_comparison_fold() {
        let cx = Registry::new();
        let e = lit(3i64).lt(5i64).and(lit(true));
        assert_eq!(fold(&cx, &e).unwrap(), Value::Bool(true));
    }

    #[test]
    fn column_reference_is_not_constant() {
        let cx = Registry::new();
        let e = col(0, "age").add(1i64);
        let err = fold(&cx, &e).unwrap_err();
        assert!(matches!(
            err,
            crate::error::MapError::Compile(CompileError::NotConstant(_))
        ));
    }

    #[test]
    fn enum_constant_folds_per_technique() {
        let as_string = Registry::builder().enums(EnumTechnique::AsString).build();
        assert_eq!(
            fold(&as_string, &enum_lit(Tier::Paid)).unwrap(),
            Value::Text("Paid".into())
        );

        let as_int = Registry::builder().enums(EnumTechnique::AsInteger).build();
        assert_eq!(
            fold(&as_int, &enum_lit(Tier::Paid)).unwrap(),
            Value::Int4(1)
        );
    }

    #[test]
    fn type_mismatch_is_unsupported() {
        let cx = Registry::new();
        let e = lit("x").add(1i64);
        let err = fold(&cx, &e).unwrap_err();
        assert!(matches!(
            err,
            crate::error::MapError::Compile(CompileError::Unsupported(_))
        ));
    }
}
