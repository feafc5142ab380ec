//! Custom value converters.
//!
//! A converter sits between a field's Rust type and its stored column
//! representation. Reads pass the raw stored value (nulls included) through
//! [`ValueConvert::read`] before decoding; writes pass the encoded value
//! through [`ValueConvert::write`] before binding. Converters are registered
//! on a [`Registry`](crate::registry::Registry) keyed by the field type.

use crate::error::MappingError;
use crate::value::Value;
use std::fmt::Debug;

/// A bidirectional column-value transform for one field type.
///
/// Implementations must be pure with respect to their input; the same
/// converter instance is shared across threads and cached read plans.
pub trait ValueConvert: Send + Sync + Debug {
    /// Transform a value read from a row, before field decoding.
    ///
    /// Nulls are passed through too, so a converter can supply its own
    /// null handling (for example mapping NULL to a sentinel).
    fn read(&self, value: Value) -> Result<Value, MappingError>;

    /// Transform a field's encoded value, before parameter binding.
    fn write(&self, value: Value) -> Result<Value, MappingError>;
}

/// Converter built from two closures.
pub struct FnConvert<R, W> {
    name: &'static str,
    read: R,
    write: W,
}

impl<R, W> FnConvert<R, W>
where
    R: Fn(Value) -> Result<Value, MappingError> + Send + Sync,
    W: Fn(Value) -> Result<Value, MappingError> + Send + Sync,
{
    pub fn new(name: &'static str, read: R, write: W) -> Self {
        Self { name, read, write }
    }
}

impl<R, W> Debug for FnConvert<R, W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnConvert").field("name", &self.name).finish()
    }
}

impl<R, W> ValueConvert for FnConvert<R, W>
where
    R: Fn(Value) -> Result<Value, MappingError> + Send + Sync,
    W: Fn(Value) -> Result<Value, MappingError> + Send + Sync,
{
    fn read(&self, value: Value) -> Result<Value, MappingError> {
        (self.read)(value)
    }

    fn write(&self, value: Value) -> Result<Value, MappingError> {
        (self.write)(value)
    }
}
