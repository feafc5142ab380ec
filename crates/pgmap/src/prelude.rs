//! Convenient imports for typical `pgmap` usage.
//!
//! ```ignore
//! use pgmap::prelude::*;
//! ```

pub use crate::{
    Delete, EnumTechnique, Expr, Field, GenericClient, Insert, MapError, MapResult, Model,
    NamingConvention, PgEnum, Query, Registry, StreamingClient, Update, Value, col, col_enum,
    count, enum_lit, lit,
};
