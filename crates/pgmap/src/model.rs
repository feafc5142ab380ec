//! Mapped row types.
//!
//! [`model!`] declares a struct bound to a table; [`composite!`] declares a
//! nested value object whose columns are flattened into its owner with
//! `owner_member` names. Both generate [`Field`](crate::Field)
//! implementations; `model!` additionally implements [`Model`], which ties
//! the struct to a cached [`Table`](crate::schema::Table) description.

use crate::registry::Registry;
use crate::schema::Table;
use std::sync::Arc;

/// A struct mapped to a table.
pub trait Model: crate::field::Field {
    const TABLE: &'static str;

    /// Build the table description. Called once per registry and cached;
    /// use [`Registry::table`] instead of calling this directly.
    fn build_table(cx: &Registry) -> Arc<Table>;
}

/// Declare a table-mapped struct.
///
/// Field options in trailing brackets: `[generated]` excludes the column
/// from inserts, `[column = "name"]` overrides the resolved column name.
/// Nested struct fields flatten into prefixed columns.
///
/// ```ignore
/// pgmap::model! {
///     pub struct User in "users" {
///         id: i64 [generated],
///         name: String,
///         age: i32,
///     }
/// }
/// ```
#[macro_export]
macro_rules! model {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident in $table:literal {
            $( $fname:ident : $fty:ty $( [ $($attr:tt)* ] )? ),+ $(,)?
        }
    ) => {
        $crate::composite! {
            $(#[$meta])*
            $vis struct $name {
                $( $fname : $fty $( [ $($attr)* ] )? ),+
            }
        }

        impl $crate::model::Model for $name {
            const TABLE: &'static str = $table;

            fn build_table(
                cx: &$crate::registry::Registry,
            ) -> ::std::sync::Arc<$crate::schema::Table> {
                let mut columns = ::std::vec::Vec::new();
                $(
                    <$fty as $crate::field::Field>::columns(
                        cx,
                        &$crate::model!(@colname cx, $fname $( [ $($attr)* ] )?),
                        $crate::model!(@generated $( [ $($attr)* ] )?),
                        &mut columns,
                    );
                )+
                ::std::sync::Arc::new($crate::schema::Table {
                    name: Self::TABLE.to_string(),
                    columns,
                })
            }
        }
    };

    (@colname $cx:ident, $fname:ident) => {
        $cx.resolve_member(stringify!($fname))
    };
    (@colname $cx:ident, $fname:ident [generated]) => {
        $cx.resolve_member(stringify!($fname))
    };
    (@colname $cx:ident, $fname:ident [column = $col:literal]) => {
        ($col).to_string()
    };

    (@generated) => { false };
    (@generated [generated]) => { true };
    (@generated [column = $col:literal]) => { false };
}

/// Declare a nested value object without a table of its own.
///
/// ```ignore
/// pgmap::composite! {
///     pub struct Address {
///         street: String,
///         city: String,
///     }
/// }
/// ```
#[macro_export]
macro_rules! composite {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident {
            $( $fname:ident : $fty:ty $( [ $($attr:tt)* ] )? ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq)]
        $vis struct $name {
            $( pub $fname : $fty ),+
        }

        impl $crate::field::Field for $name {
            fn width(cx: &$crate::registry::Registry) -> usize {
                0 $( + <$fty as $crate::field::Field>::width(cx) )+
            }

            fn node(
                cx: &$crate::registry::Registry,
                name: &str,
            ) -> $crate::reader::ReadNode {
                $crate::reader::ReadNode::Composite {
                    type_name: stringify!($name),
                    fields: ::std::vec![
                        $(
                            <$fty as $crate::field::Field>::node(
                                cx,
                                &$crate::reader::join_path(
                                    name,
                                    &$crate::model!(@colname cx, $fname $( [ $($attr)* ] )?),
                                ),
                            )
                        ),+
                    ],
                }
            }

            fn columns(
                cx: &$crate::registry::Registry,
                name: &str,
                generated: bool,
                out: &mut ::std::vec::Vec<$crate::schema::Column>,
            ) {
                $(
                    <$fty as $crate::field::Field>::columns(
                        cx,
                        &$crate::reader::join_path(
                            name,
                            &$crate::model!(@colname cx, $fname $( [ $($attr)* ] )?),
                        ),
                        generated,
                        out,
                    );
                )+
            }

            fn from_tree(
                cx: &$crate::registry::Registry,
                tree: &$crate::reader::Tree,
                path: &str,
            ) -> ::std::result::Result<Self, $crate::error::MappingError> {
                let items = tree.branch().ok_or(
                    $crate::error::MappingError::NoConstructor(stringify!($name)),
                )?;
                let mut items = items.iter();
                Ok(Self {
                    $(
                        $fname: <$fty as $crate::field::Field>::from_tree(
                            cx,
                            items.next().ok_or(
                                $crate::error::MappingError::NoConstructor(stringify!($name)),
                            )?,
                            &$crate::reader::join_path(path, stringify!($fname)),
                        )?,
                    )+
                })
            }

            fn write(
                &self,
                cx: &$crate::registry::Registry,
                out: &mut ::std::vec::Vec<$crate::value::Value>,
            ) -> ::std::result::Result<(), $crate::error::MappingError> {
                $( $crate::field::Field::write(&self.$fname, cx, out)?; )+
                Ok(())
            }

            fn write_null(
                cx: &$crate::registry::Registry,
                out: &mut ::std::vec::Vec<$crate::value::Value>,
            ) {
                $( <$fty as $crate::field::Field>::write_null(cx, out); )+
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use crate::reader::{ReadNode, materialize};
    use crate::registry::{NamingConvention, Registry};
    use crate::row::TestRow;
    use crate::schema::Column;
    use crate::value::{SqlType, Value};

    crate::composite! {
        struct Address {
            street: String,
            city: String,
        }
    }

    crate::model! {
        #[allow(non_snake_case)]
        struct Person in "people" {
            id: i64 [generated],
            fullName: String [column = "full_name"],
            address: Option<Address>,
        }
    }

    fn snake() -> Registry {
        Registry::builder().naming(NamingConvention::SnakeCase).build()
    }

    #[test]
    fn table_flattens_nested_columns() {
        let cx = snake();
        let table = cx.table::<Person>();
        assert_eq!(table.name, "people");
        let cols: Vec<_> = table
            .columns
            .iter()
            .map(|c: &Column| (c.name.as_str(), c.ty, c.generated))
            .collect();
        assert_eq!(
            cols,
            vec![
                ("id", SqlType::Int8, true),
                ("full_name", SqlType::Text, false),
                ("address_street", SqlType::Text, false),
                ("address_city", SqlType::Text, false),
            ]
        );
    }

    #[test]
    fn plan_uses_resolved_names() {
        let cx = snake();
        let plan = cx.plan::<Person>();
        let ReadNode::Composite { fields, .. } = plan.as_ref() else {
            panic!("expected composite plan");
        };
        assert!(matches!(
            &fields[0],
            ReadNode::Named { name, .. } if name == "id"
        ));
        let ReadNode::Composite { fields: addr, .. } = &fields[2] else {
            panic!("expected nested composite");
        };
        assert!(matches!(
            &addr[0],
            ReadNode::Named { name, .. } if name == "address_street"
        ));
    }

    #[test]
    fn round_trip_with_nested_value() {
        let cx = snake();
        let row = TestRow::new([
            ("id", Value::Int8(1)),
            ("full_name", Value::Text("Ada".into())),
            ("address_street", Value::Text("Main St 1".into())),
            ("address_city", Value::Text("Berlin".into())),
        ]);
        let person: Person = materialize(&cx, &row).unwrap();
        assert_eq!(
            person,
            Person {
                id: 1,
                fullName: "Ada".into(),
                address: Some(Address {
                    street: "Main St 1".into(),
                    city: "Berlin".into(),
                }),
            }
        );
    }

    #[test]
    fn all_null_nested_block_is_none() {
        let cx = snake();
        let row = TestRow::new([
            ("id", Value::Int8(2)),
            ("full_name", Value::Text("Bob".into())),
            ("address_street", Value::Null(SqlType::Text)),
            ("address_city", Value::Null(SqlType::Text)),
        ]);
        let person: Person = materialize(&cx, &row).unwrap();
        assert_eq!(person.address, None);
    }

    #[test]
    fn partial_null_nested_block_is_an_error() {
        let cx = snake();
        let row = TestRow::new([
            ("id", Value::Int8(3)),
            ("full_name", Value::Text("Eve".into())),
            ("address_street", Value::Text("Side St 2".into())),
            ("address_city", Value::Null(SqlType::Text)),
        ]);
        let err = materialize::<Person, _>(&cx, &row).unwrap_err();
        assert!(err.is_mapping());
    }

    #[test]
    fn option_none_writes_typed_nulls_for_each_column() {
        let cx = snake();
        let person = Person {
            id: 9,
            fullName: "Kim".into(),
            address: None,
        };
        let mut out = Vec::new();
        crate::field::Field::write(&person, &cx, &mut out).unwrap();
        assert_eq!(
            out,
            vec![
                Value::Int8(9),
                Value::Text("Kim".into()),
                Value::Null(SqlType::Text),
                Value::Null(SqlType::Text),
            ]
        );
    }
}
