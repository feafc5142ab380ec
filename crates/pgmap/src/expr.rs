//! Typed query expressions.
//!
//! [`Expr`] is a closed union; the renderer and folder match it exhaustively,
//! so an unsupported shape is a compile-time variant addition, not a runtime
//! surprise. Construction goes through the free functions ([`col`], [`lit`],
//! [`count`], ...) and the chaining methods on `Expr`.

use crate::enums::{EnumCodec, PgEnum};
use crate::value::Value;

/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Add,
    Sub,
    Mul,
    And,
    Or,
}

impl BinOp {
    pub fn sql(self) -> &'static str {
        match self {
            BinOp::Eq => "=",
            BinOp::Ne => "<>",
            BinOp::Lt => "<",
            BinOp::Le => "<=",
            BinOp::Gt => ">",
            BinOp::Ge => ">=",
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::And => "AND",
            BinOp::Or => "OR",
        }
    }

    /// Comparison operators participate in enum literal coercion.
    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            BinOp::Eq | BinOp::Ne | BinOp::Lt | BinOp::Le | BinOp::Gt | BinOp::Ge
        )
    }
}

/// Aggregate functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggFunc {
    Count,
    Sum,
    Avg,
    Min,
    Max,
}

impl AggFunc {
    pub fn sql(self) -> &'static str {
        match self {
            AggFunc::Count => "COUNT",
            AggFunc::Sum => "SUM",
            AggFunc::Avg => "AVG",
            AggFunc::Min => "MIN",
            AggFunc::Max => "MAX",
        }
    }
}

/// A query expression.
#[derive(Debug, Clone)]
pub enum Expr {
    /// A constant value.
    Value(Value),
    /// An enum constant; its stored representation depends on the registry's
    /// technique for the codec's type, so encoding is deferred to rendering.
    EnumConst { codec: EnumCodec, value: i64 },
    /// A column of the query's table source `source` (0 = primary, joins
    /// follow in declaration order).
    Column { source: usize, name: String },
    Binary {
        lhs: Box<Expr>,
        op: BinOp,
        rhs: Box<Expr>,
    },
    /// An enum-typed view of the inner expression. Renders as the operand;
    /// exists so the coercion pass can see the enum type of a comparison.
    Convert { expr: Box<Expr>, codec: EnumCodec },
    /// An aggregate call; `COUNT` with no argument renders `COUNT(*)`.
    Func {
        func: AggFunc,
        arg: Option<Box<Expr>>,
    },
    IsNull { expr: Box<Expr>, negate: bool },
    /// A parenthesized row of expressions.
    Row(Vec<Expr>),
}

/// Reference a column on table source `source`.
pub fn col(source: usize, name: impl Into<String>) -> Expr {
    Expr::Column {
        source,
        name: name.into(),
    }
}

/// Reference an enum-typed column on table source `source`.
pub fn col_enum<E: PgEnum>(source: usize, name: impl Into<String>) -> Expr {
    Expr::Convert {
        expr: Box::new(col(source, name)),
        codec: EnumCodec::of::<E>(),
    }
}

/// A constant value.
pub fn lit(value: impl Into<Value>) -> Expr {
    Expr::Value(value.into())
}

/// An enum constant.
pub fn enum_lit<E: PgEnum>(value: E) -> Expr {
    Expr::EnumConst {
        codec: EnumCodec::of::<E>(),
        value: value.to_int(),
    }
}

/// `COUNT(*)`.
pub fn count() -> Expr {
    Expr::Func {
        func: AggFunc::Count,
        arg: None,
    }
}

/// `COUNT(expr)`.
pub fn count_of(expr: Expr) -> Expr {
    Expr::Func {
        func: AggFunc::Count,
        arg: Some(Box::new(expr)),
    }
}

pub fn sum(expr: Expr) -> Expr {
    Expr::Func {
        func: AggFunc::Sum,
        arg: Some(Box::new(expr)),
    }
}

pub fn avg(expr: Expr) -> Expr {
    Expr::Func {
        func: AggFunc::Avg,
        arg: Some(Box::new(expr)),
    }
}

pub fn min(expr: Expr) -> Expr {
    Expr::Func {
        func: AggFunc::Min,
        arg: Some(Box::new(expr)),
    }
}

pub fn max(expr: Expr) -> Expr {
    Expr::Func {
        func: AggFunc::Max,
        arg: Some(Box::new(expr)),
    }
}

impl Expr {
    pub fn text(value: impl Into<String>) -> Expr {
        Expr::Value(Value::Text(value.into()))
    }

    pub fn int(value: i64) -> Expr {
        Expr::Value(Value::Int8(value))
    }

    pub fn float(value: f64) -> Expr {
        Expr::Value(Value::Float8(value))
    }

    pub fn bool(value: bool) -> Expr {
        Expr::Value(Value::Bool(value))
    }

    pub fn null(ty: crate::value::SqlType) -> Expr {
        Expr::Value(Value::Null(ty))
    }

    fn binary(self, op: BinOp, rhs: impl IntoExpr) -> Expr {
        Expr::Binary {
            lhs: Box::new(self),
            op,
            rhs: Box::new(rhs.into_expr()),
        }
    }

    pub fn eq(self, rhs: impl IntoExpr) -> Expr {
        self.binary(BinOp::Eq, rhs)
    }

    pub fn ne(self, rhs: impl IntoExpr) -> Expr {
        self.binary(BinOp::Ne, rhs)
    }

    pub fn lt(self, rhs: impl IntoExpr) -> Expr {
        self.binary(BinOp::Lt, rhs)
    }

    pub fn le(self, rhs: impl IntoExpr) -> Expr {
        self.binary(BinOp::Le, rhs)
    }

    pub fn gt(self, rhs: impl IntoExpr) -> Expr {
        self.binary(BinOp::Gt, rhs)
    }

    pub fn ge(self, rhs: impl IntoExpr) -> Expr {
        self.binary(BinOp::Ge, rhs)
    }

    pub fn add(self, rhs: impl IntoExpr) -> Expr {
        self.binary(BinOp::Add, rhs)
    }

    pub fn sub(self, rhs: impl IntoExpr) -> Expr {
        self.binary(BinOp::Sub, rhs)
    }

    pub fn mul(self, rhs: impl IntoExpr) -> Expr {
        self.binary(BinOp::Mul, rhs)
    }

    pub fn and(self, rhs: impl IntoExpr) -> Expr {
        self.binary(BinOp::And, rhs)
    }

    pub fn or(self, rhs: impl IntoExpr) -> Expr {
        self.binary(BinOp::Or, rhs)
    }

    pub fn is_null(self) -> Expr {
        Expr::IsNull {
            expr: Box::new(self),
            negate: false,
        }
    }

    pub fn is_not_null(self) -> Expr {
        Expr::IsNull {
            expr: Box::new(self),
            negate: true,
        }
    }
}

/// Anything usable as the right-hand side of a chained operator.
pub trait IntoExpr {
    fn into_expr(self) -> Expr;
}

impl IntoExpr for Expr {
    fn into_expr(self) -> Expr {
        self
    }
}

macro_rules! into_expr_via_value {
    ($( $ty:ty ),+ $(,)?) => {
        $(
            impl IntoExpr for $ty {
                fn into_expr(self) -> Expr {
                    Expr::Value(Value::from(self))
                }
            }
        )+
    };
}

into_expr_via_value!(
    bool,
    i16,
    i32,
    i64,
    f32,
    f64,
    &str,
    String,
    Vec<u8>,
    uuid::Uuid,
    chrono::NaiveDate,
    chrono::NaiveDateTime,
    chrono::DateTime<chrono::Utc>,
    serde_json::Value,
);

impl IntoExpr for Value {
    fn into_expr(self) -> Expr {
        Expr::Value(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chaining_builds_binary_nodes() {
        let e = col(0, "age").ge(18i32).and(col(0, "name").ne("root"));
        let Expr::Binary { op: BinOp::And, lhs, rhs } = e else {
            panic!("expected AND");
        };
        assert!(matches!(*lhs, Expr::Binary { op: BinOp::Ge, .. }));
        assert!(matches!(*rhs, Expr::Binary { op: BinOp::Ne, .. }));
    }

    #[test]
    fn count_without_argument() {
        assert!(matches!(
            count(),
            Expr::Func {
                func: AggFunc::Count,
                arg: None
            }
        ));
    }

    #[test]
    fn comparison_classification() {
        assert!(BinOp::Eq.is_comparison());
        assert!(!BinOp::Add.is_comparison());
        assert!(!BinOp::And.is_comparison());
    }
}
