//! The [`Field`] trait: how a Rust type participates in mapping.
//!
//! A `Field` knows four things about itself: the read-plan node that locates
//! its columns in a row, the flattened column list it contributes to a table,
//! how to reconstruct itself from the value tree a plan walk produces, and
//! how to emit its values (or typed nulls) as ordered parameters. Structs
//! declared with [`model!`](crate::model!) or [`composite!`](crate::composite)
//! and enums declared with [`pg_enum!`](crate::pg_enum) get implementations
//! generated; primitives, `Option`, and tuples are implemented here.

use crate::error::MappingError;
use crate::reader::{ReadNode, Tree};
use crate::registry::Registry;
use crate::schema::Column;
use crate::value::{SqlType, Value};
use std::any::TypeId;

/// A type that can be read from and written to a block of row columns.
pub trait Field: Sized + 'static {
    /// Number of leaf columns this type occupies.
    fn width(cx: &Registry) -> usize;

    /// Read-plan node for this type at resolved path `name` (empty at the
    /// root, which makes scalar reads positional).
    fn node(cx: &Registry, name: &str) -> ReadNode;

    /// Append the flattened columns this type contributes under `name`.
    fn columns(cx: &Registry, name: &str, generated: bool, out: &mut Vec<Column>);

    /// Reconstruct a value from the tree produced by a plan walk. `path` is
    /// the field path used in diagnostics.
    fn from_tree(cx: &Registry, tree: &Tree, path: &str) -> Result<Self, MappingError>;

    /// Append this value's encoded parameters in column order.
    fn write(&self, cx: &Registry, out: &mut Vec<Value>) -> Result<(), MappingError>;

    /// Append typed nulls, one per leaf column, preserving statement arity.
    fn write_null(cx: &Registry, out: &mut Vec<Value>);
}

/// Build a leaf node for `T` at `name`, attaching any registered converter.
/// An empty name yields a positional leaf.
pub fn leaf_node<T: 'static>(cx: &Registry, name: &str, ty: SqlType) -> ReadNode {
    let convert = cx.converter(TypeId::of::<T>());
    if name.is_empty() {
        ReadNode::Leaf { ty, convert }
    } else {
        ReadNode::Named {
            name: name.to_string(),
            ty,
            convert,
        }
    }
}

/// Push a leaf value through `T`'s registered converter, if any.
pub(crate) fn write_leaf<T: 'static>(
    cx: &Registry,
    value: Value,
    out: &mut Vec<Value>,
) -> Result<(), MappingError> {
    let value = match cx.converter(TypeId::of::<T>()) {
        Some(convert) => convert.write(value)?,
        None => value,
    };
    out.push(value);
    Ok(())
}

/// Expect a leaf tree node, or report the plan/tree shape mismatch.
pub fn expect_leaf<'t>(tree: &'t Tree, path: &str) -> Result<&'t Value, MappingError> {
    tree.leaf()
        .ok_or_else(|| MappingError::conversion(path, "single column", "composite value"))
}

macro_rules! leaf_field {
    ($ty:ty, $sql:expr, $expected:literal, $decode:expr) => {
        impl Field for $ty {
            fn width(_cx: &Registry) -> usize {
                1
            }

            fn node(cx: &Registry, name: &str) -> ReadNode {
                leaf_node::<$ty>(cx, name, $sql)
            }

            fn columns(_cx: &Registry, name: &str, generated: bool, out: &mut Vec<Column>) {
                out.push(Column {
                    name: name.to_string(),
                    ty: $sql,
                    generated,
                });
            }

            fn from_tree(
                _cx: &Registry,
                tree: &Tree,
                path: &str,
            ) -> Result<Self, MappingError> {
                let value = expect_leaf(tree, path)?;
                if value.is_null() {
                    return Err(MappingError::UnexpectedNull(path.to_string()));
                }
                let decode: fn(&Value) -> Option<$ty> = $decode;
                decode(value).ok_or_else(|| {
                    MappingError::conversion(path, $expected, value.type_name())
                })
            }

            fn write(&self, cx: &Registry, out: &mut Vec<Value>) -> Result<(), MappingError> {
                write_leaf::<$ty>(cx, Value::from(self.clone()), out)
            }

            fn write_null(_cx: &Registry, out: &mut Vec<Value>) {
                out.push(Value::Null($sql));
            }
        }
    };
}

leaf_field!(bool, SqlType::Bool, "boolean", |v| v.as_bool());
leaf_field!(i16, SqlType::Int2, "smallint", |v| match v {
    Value::Int2(n) => Some(*n),
    _ => None,
});
leaf_field!(i32, SqlType::Int4, "integer", |v| match v {
    Value::Int2(n) => Some(i32::from(*n)),
    Value::Int4(n) => Some(*n),
    _ => None,
});
leaf_field!(i64, SqlType::Int8, "bigint", |v| v.as_i64());
leaf_field!(f32, SqlType::Float4, "real", |v| match v {
    Value::Float4(n) => Some(*n),
    _ => None,
});
leaf_field!(f64, SqlType::Float8, "double precision", |v| v.as_f64());
leaf_field!(String, SqlType::Text, "text", |v| {
    v.as_str().map(str::to_string)
});
leaf_field!(Vec<u8>, SqlType::Bytes, "bytea", |v| match v {
    Value::Bytes(b) => Some(b.clone()),
    _ => None,
});
leaf_field!(uuid::Uuid, SqlType::Uuid, "uuid", |v| match v {
    Value::Uuid(u) => Some(*u),
    _ => None,
});
leaf_field!(chrono::NaiveDate, SqlType::Date, "date", |v| match v {
    Value::Date(d) => Some(*d),
    _ => None,
});
leaf_field!(
    chrono::NaiveDateTime,
    SqlType::Timestamp,
    "timestamp",
    |v| match v {
        Value::Timestamp(t) => Some(*t),
        _ => None,
    }
);
leaf_field!(
    chrono::DateTime<chrono::Utc>,
    SqlType::TimestampTz,
    "timestamptz",
    |v| match v {
        Value::TimestampTz(t) => Some(*t),
        _ => None,
    }
);
leaf_field!(serde_json::Value, SqlType::Json, "json", |v| match v {
    Value::Json(j) => Some(j.clone()),
    _ => None,
});

impl<T: Field> Field for Option<T> {
    fn width(cx: &Registry) -> usize {
        T::width(cx)
    }

    fn node(cx: &Registry, name: &str) -> ReadNode {
        T::node(cx, name)
    }

    fn columns(cx: &Registry, name: &str, generated: bool, out: &mut Vec<Column>) {
        T::columns(cx, name, generated, out);
    }

    /// An all-null block is `None`; any non-null leaf makes the whole block
    /// required, so partial nulls surface as the inner type's error.
    fn from_tree(cx: &Registry, tree: &Tree, path: &str) -> Result<Self, MappingError> {
        if tree.is_all_null() {
            Ok(None)
        } else {
            T::from_tree(cx, tree, path).map(Some)
        }
    }

    fn write(&self, cx: &Registry, out: &mut Vec<Value>) -> Result<(), MappingError> {
        match self {
            Some(inner) => inner.write(cx, out),
            None => {
                T::write_null(cx, out);
                Ok(())
            }
        }
    }

    fn write_null(cx: &Registry, out: &mut Vec<Value>) {
        T::write_null(cx, out);
    }
}

macro_rules! tuple_field {
    ($( $name:ident / $idx:tt ),+) => {
        impl<$( $name: Field ),+> Field for ($( $name, )+) {
            fn width(cx: &Registry) -> usize {
                0 $( + $name::width(cx) )+
            }

            fn node(cx: &Registry, _name: &str) -> ReadNode {
                // Tuple items are contiguous positional blocks; column names
                // are not consulted, so a joined projection's output aliases
                // read straight back in source order.
                ReadNode::Tuple {
                    items: vec![ $( $name::node(cx, "").positional() ),+ ],
                }
            }

            fn columns(cx: &Registry, name: &str, generated: bool, out: &mut Vec<Column>) {
                $(
                    $name::columns(
                        cx,
                        &crate::reader::join_path(name, stringify!($idx)),
                        generated,
                        out,
                    );
                )+
            }

            fn from_tree(cx: &Registry, tree: &Tree, path: &str) -> Result<Self, MappingError> {
                let items = tree
                    .branch()
                    .ok_or_else(|| MappingError::conversion(path, "tuple block", "single column"))?;
                let mut it = items.iter();
                Ok((
                    $(
                        $name::from_tree(
                            cx,
                            it.next().ok_or_else(|| {
                                MappingError::conversion(path, "tuple block", "short block")
                            })?,
                            &crate::reader::join_path(path, stringify!($idx)),
                        )?,
                    )+
                ))
            }

            fn write(&self, cx: &Registry, out: &mut Vec<Value>) -> Result<(), MappingError> {
                $( self.$idx.write(cx, out)?; )+
                Ok(())
            }

            fn write_null(cx: &Registry, out: &mut Vec<Value>) {
                $( $name::write_null(cx, out); )+
            }
        }
    };
}

tuple_field!(A / 0, B / 1);
tuple_field!(A / 0, B / 1, C / 2);
tuple_field!(A / 0, B / 1, C / 2, D / 3);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::Registry;

    #[test]
    fn scalar_widths() {
        let cx = Registry::new();
        assert_eq!(i64::width(&cx), 1);
        assert_eq!(<Option<String>>::width(&cx), 1);
        assert_eq!(<(i64, String, bool)>::width(&cx), 3);
    }

    #[test]
    fn root_scalar_node_is_positional() {
        let cx = Registry::new();
        assert!(matches!(i64::node(&cx, ""), ReadNode::Leaf { .. }));
        assert!(matches!(i64::node(&cx, "id"), ReadNode::Named { .. }));
    }

    #[test]
    fn leaf_from_tree_converts_and_checks_null() {
        let cx = Registry::new();
        let tree = Tree::Leaf(Value::Int4(7));
        assert_eq!(i64::from_tree(&cx, &tree, "n").unwrap(), 7);

        let null = Tree::Leaf(Value::Null(SqlType::Int8));
        assert!(matches!(
            i64::from_tree(&cx, &null, "n").unwrap_err(),
            MappingError::UnexpectedNull(_)
        ));
        assert_eq!(<Option<i64>>::from_tree(&cx, &null, "n").unwrap(), None);
    }

    #[test]
    fn leaf_from_tree_rejects_wrong_type() {
        let cx = Registry::new();
        let tree = Tree::Leaf(Value::Text("x".into()));
        assert!(matches!(
            i64::from_tree(&cx, &tree, "n").unwrap_err(),
            MappingError::Conversion { .. }
        ));
    }

    #[test]
    fn option_write_none_emits_typed_null() {
        let cx = Registry::new();
        let mut out = Vec::new();
        let v: Option<String> = None;
        v.write(&cx, &mut out).unwrap();
        assert_eq!(out, vec![Value::Null(SqlType::Text)]);
    }

    #[test]
    fn tuple_write_is_sequential() {
        let cx = Registry::new();
        let mut out = Vec::new();
        (1i64, "a".to_string()).write(&cx, &mut out).unwrap();
        assert_eq!(out, vec![Value::Int8(1), Value::Text("a".into())]);
    }
}
