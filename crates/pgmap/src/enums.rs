//! Enum storage encodings.
//!
//! A mapped enum is stored under one of three techniques, selectable globally
//! or per-type: `AsIs` (underlying numeric representation, no conversion),
//! `AsString` (case-sensitive member name), `AsInteger` (explicit integer
//! cast). [`EnumCodec`] is the type-erased view the renderer's coercion pass
//! uses to re-encode primitive literals compared against enum columns.

use crate::error::{CompileError, MapResult, MappingError};
use crate::value::{SqlType, Value};
use std::any::TypeId;

/// How an enum is encoded in its column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EnumTechnique {
    /// Underlying numeric representation, stored untouched.
    #[default]
    AsIs,
    /// Member name as text; decoding is case-sensitive and unknown text is a
    /// hard mapping error.
    AsString,
    /// Explicit cast to/from the underlying integer type.
    AsInteger,
}

/// Column type an enum occupies under a technique.
pub fn storage_type(technique: EnumTechnique) -> SqlType {
    match technique {
        EnumTechnique::AsString => SqlType::Text,
        EnumTechnique::AsIs | EnumTechnique::AsInteger => SqlType::Int4,
    }
}

/// A mapped Rust enum with a stable name/value table.
///
/// Implemented by the [`pg_enum!`](crate::pg_enum) macro.
pub trait PgEnum: Sized + Copy + 'static {
    const NAME: &'static str;

    /// Declared members as `(name, value)` pairs, in declaration order.
    fn members() -> &'static [(&'static str, i64)];

    fn to_int(self) -> i64;

    fn from_int(value: i64) -> Option<Self>;

    fn name(self) -> &'static str;

    /// Case-sensitive name lookup.
    fn from_name(name: &str) -> Option<Self> {
        Self::members()
            .iter()
            .find(|(n, _)| *n == name)
            .and_then(|(_, v)| Self::from_int(*v))
    }
}

/// Type-erased enum description, carried by `Convert` expression nodes.
#[derive(Debug, Clone, Copy)]
pub struct EnumCodec {
    pub ty_name: &'static str,
    pub type_id: TypeId,
    members: &'static [(&'static str, i64)],
}

impl EnumCodec {
    pub fn of<E: PgEnum>() -> Self {
        Self {
            ty_name: E::NAME,
            type_id: TypeId::of::<E>(),
            members: E::members(),
        }
    }

    pub fn name_of(&self, value: i64) -> Option<&'static str> {
        self.members
            .iter()
            .find(|(_, v)| *v == value)
            .map(|(n, _)| *n)
    }

    pub fn value_of(&self, name: &str) -> Option<i64> {
        self.members.iter().find(|(n, _)| *n == name).map(|(_, v)| *v)
    }

    /// Re-encode an integer literal as this enum's stored representation.
    ///
    /// Used by the coercion pass; an integer with no declared member is a
    /// compile error, surfaced before any SQL is emitted.
    pub fn encode_int(&self, value: i64, technique: EnumTechnique) -> MapResult<Value> {
        match technique {
            EnumTechnique::AsString => {
                let name = self.name_of(value).ok_or_else(|| {
                    CompileError::unsupported(format!(
                        "integer {value} is not a member of enum '{}'",
                        self.ty_name
                    ))
                })?;
                Ok(Value::Text(name.to_string()))
            }
            EnumTechnique::AsIs | EnumTechnique::AsInteger => {
                let int = i32::try_from(value).map_err(|_| {
                    CompileError::unsupported(format!(
                        "integer {value} does not fit enum '{}' int4 storage",
                        self.ty_name
                    ))
                })?;
                Ok(Value::Int4(int))
            }
        }
    }
}

/// Encode an enum value under a technique. A discriminant outside int4 range
/// cannot be stored under the integer techniques and is a mapping error.
pub fn encode_enum<E: PgEnum>(value: E, technique: EnumTechnique) -> Result<Value, MappingError> {
    match technique {
        EnumTechnique::AsString => Ok(Value::Text(value.name().to_string())),
        EnumTechnique::AsIs | EnumTechnique::AsInteger => {
            let int = i32::try_from(value.to_int()).map_err(|_| {
                MappingError::conversion(E::NAME, "int4-range enum value", value.to_int().to_string())
            })?;
            Ok(Value::Int4(int))
        }
    }
}

/// Decode a stored value back into an enum under a technique.
pub fn decode_enum<E: PgEnum>(
    value: &Value,
    path: &str,
    technique: EnumTechnique,
) -> Result<E, MappingError> {
    if value.is_null() {
        return Err(MappingError::UnexpectedNull(path.to_string()));
    }
    match technique {
        EnumTechnique::AsString => {
            let text = value.as_str().ok_or_else(|| {
                MappingError::conversion(path, "text", value.type_name())
            })?;
            E::from_name(text).ok_or_else(|| MappingError::UnknownEnumText {
                ty: E::NAME,
                text: text.to_string(),
            })
        }
        EnumTechnique::AsIs | EnumTechnique::AsInteger => {
            let int = value.as_i64().ok_or_else(|| {
                MappingError::conversion(path, "integer", value.type_name())
            })?;
            E::from_int(int).ok_or(MappingError::UnknownEnumValue {
                ty: E::NAME,
                value: int,
            })
        }
    }
}

/// Declare a mapped enum with a stable name/value table.
///
/// Generates the enum itself plus [`PgEnum`] and [`Field`](crate::Field)
/// implementations. The storage technique is taken from the registry at use
/// time (global setting or per-type override).
///
/// ```ignore
/// pgmap::pg_enum! {
///     pub enum Role {
///         Admin = 0,
///         Member = 1,
///     }
/// }
/// ```
#[macro_export]
macro_rules! pg_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $( $variant:ident = $value:expr ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        $vis enum $name {
            $( $variant = $value ),+
        }

        impl $crate::enums::PgEnum for $name {
            const NAME: &'static str = stringify!($name);

            fn members() -> &'static [(&'static str, i64)] {
                &[ $( (stringify!($variant), $value) ),+ ]
            }

            fn to_int(self) -> i64 {
                self as i64
            }

            fn from_int(value: i64) -> Option<Self> {
                match value {
                    $( v if v == $value => Some(Self::$variant), )+
                    _ => None,
                }
            }

            fn name(self) -> &'static str {
                match self {
                    $( Self::$variant => stringify!($variant), )+
                }
            }
        }

        impl $crate::field::Field for $name {
            fn width(_cx: &$crate::registry::Registry) -> usize {
                1
            }

            fn node(
                cx: &$crate::registry::Registry,
                name: &str,
            ) -> $crate::reader::ReadNode {
                let technique = cx.enum_technique(::std::any::TypeId::of::<Self>());
                $crate::field::leaf_node::<Self>(cx, name, $crate::enums::storage_type(technique))
            }

            fn columns(
                cx: &$crate::registry::Registry,
                name: &str,
                generated: bool,
                out: &mut ::std::vec::Vec<$crate::schema::Column>,
            ) {
                let technique = cx.enum_technique(::std::any::TypeId::of::<Self>());
                out.push($crate::schema::Column {
                    name: name.to_string(),
                    ty: $crate::enums::storage_type(technique),
                    generated,
                });
            }

            fn from_tree(
                cx: &$crate::registry::Registry,
                tree: &$crate::reader::Tree,
                path: &str,
            ) -> ::std::result::Result<Self, $crate::error::MappingError> {
                let technique = cx.enum_technique(::std::any::TypeId::of::<Self>());
                let value = $crate::field::expect_leaf(tree, path)?;
                $crate::enums::decode_enum::<Self>(value, path, technique)
            }

            fn write(
                &self,
                cx: &$crate::registry::Registry,
                out: &mut ::std::vec::Vec<$crate::value::Value>,
            ) -> ::std::result::Result<(), $crate::error::MappingError> {
                let technique = cx.enum_technique(::std::any::TypeId::of::<Self>());
                out.push($crate::enums::encode_enum(*self, technique)?);
                Ok(())
            }

            fn write_null(
                cx: &$crate::registry::Registry,
                out: &mut ::std::vec::Vec<$crate::value::Value>,
            ) {
                let technique = cx.enum_technique(::std::any::TypeId::of::<Self>());
                out.push($crate::value::Value::Null($crate::enums::storage_type(technique)));
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    crate::pg_enum! {
        enum Color {
            Red = 0,
            Green = 1,
            Blue = 2,
        }
    }

    #[test]
    fn member_table_in_declaration_order() {
        assert_eq!(
            Color::members(),
            &[("Red", 0), ("Green", 1), ("Blue", 2)]
        );
    }

    #[test]
    fn name_round_trip_is_case_sensitive() {
        assert_eq!(Color::from_name("Green"), Some(Color::Green));
        assert_eq!(Color::from_name("green"), None);
    }

    #[test]
    fn encode_per_technique() {
        assert_eq!(
            encode_enum(Color::Blue, EnumTechnique::AsString).unwrap(),
            Value::Text("Blue".into())
        );
        assert_eq!(
            encode_enum(Color::Blue, EnumTechnique::AsInteger).unwrap(),
            Value::Int4(2)
        );
        assert_eq!(
            encode_enum(Color::Blue, EnumTechnique::AsIs).unwrap(),
            Value::Int4(2)
        );
    }

    #[test]
    fn decode_round_trip_per_technique() {
        for technique in [
            EnumTechnique::AsIs,
            EnumTechnique::AsString,
            EnumTechnique::AsInteger,
        ] {
            let stored = encode_enum(Color::Green, technique).unwrap();
            let back: Color = decode_enum(&stored, "color", technique).unwrap();
            assert_eq!(back, Color::Green);
        }
    }

    crate::pg_enum! {
        enum Wide {
            Small = 1,
            Big = 5_000_000_000,
        }
    }

    #[test]
    fn out_of_range_discriminant_is_rejected_not_truncated() {
        assert!(encode_enum(Wide::Big, EnumTechnique::AsInteger).is_err());
        assert!(encode_enum(Wide::Big, EnumTechnique::AsIs).is_err());
        assert_eq!(
            encode_enum(Wide::Big, EnumTechnique::AsString).unwrap(),
            Value::Text("Big".into())
        );
        assert_eq!(
            encode_enum(Wide::Small, EnumTechnique::AsInteger).unwrap(),
            Value::Int4(1)
        );

        let codec = EnumCodec::of::<Wide>();
        assert!(codec.encode_int(5_000_000_000, EnumTechnique::AsInteger).is_err());
    }

    #[test]
    fn decode_unknown_text_is_mapping_error() {
        let err = decode_enum::<Color>(
            &Value::Text("Purple".into()),
            "color",
            EnumTechnique::AsString,
        )
        .unwrap_err();
        assert!(matches!(err, MappingError::UnknownEnumText { .. }));
    }

    #[test]
    fn decode_unknown_int_is_mapping_error() {
        let err =
            decode_enum::<Color>(&Value::Int4(9), "color", EnumTechnique::AsInteger).unwrap_err();
        assert!(matches!(err, MappingError::UnknownEnumValue { .. }));
    }

    #[test]
    fn codec_reencodes_integer_literals() {
        let codec = EnumCodec::of::<Color>();
        assert_eq!(
            codec.encode_int(1, EnumTechnique::AsString).unwrap(),
            Value::Text("Green".into())
        );
        assert_eq!(
            codec.encode_int(1, EnumTechnique::AsInteger).unwrap(),
            Value::Int4(1)
        );
        assert!(codec.encode_int(7, EnumTechnique::AsString).is_err());
    }
}
