//! # pgmap
//!
//! A typed database-access layer for Postgres.
//!
//! ## Features
//!
//! - **Typed queries**: filters, joins, and projections are expression trees
//!   compiled to parameterized SQL, never string-pasted
//! - **Safe parameters**: constants bind as dense `$1..$n` placeholders;
//!   inlining is a narrow, explicit opt-in
//! - **Schema-driven mapping**: structs declared with [`model!`] get cached
//!   read plans and flattened column layouts, nested values included
//! - **Null-object semantics**: an all-null column block reads as `None`, a
//!   partially-null one is a hard error
//! - **Explicit configuration**: naming convention, enum encodings, and
//!   converters live on an injected [`Registry`], not in ambient statics
//! - **Transaction-friendly**: pass a transaction anywhere a
//!   [`GenericClient`] is expected
//! - **Safe defaults**: UPDATE and DELETE require WHERE unless opted out
//!
//! ## Quick start
//!
//! ```ignore
//! use pgmap::prelude::*;
//!
//! pgmap::model! {
//!     pub struct User in "users" {
//!         id: i64 [generated],
//!         name: String,
//!         age: i32,
//!     }
//! }
//!
//! let cx = Registry::global();
//!
//! let adults: Vec<User> = Query::table::<User>(cx)
//!     .filter(col(0, "age").ge(18))
//!     .order_by(col(0, "name"))
//!     .fetch_all(cx, &client)
//!     .await?;
//! ```

pub mod client;
pub mod convert;
pub mod enums;
pub mod error;
pub mod expr;
pub mod field;
pub mod fold;
pub mod fragment;
mod ident;
pub mod model;
pub mod reader;
pub mod registry;
pub mod render;
pub mod row;
pub mod schema;
pub mod stmt;
pub mod value;

pub use client::{GenericClient, RowStream, StreamingClient};
pub use convert::{FnConvert, ValueConvert};
pub use enums::{EnumCodec, EnumTechnique, PgEnum};
pub use error::{CompileError, MapError, MapResult, MappingError};
pub use expr::{
    AggFunc, BinOp, Expr, IntoExpr, avg, col, col_enum, count, count_of, enum_lit, lit, max, min,
    sum,
};
pub use field::Field;
pub use fold::fold;
pub use fragment::{Fragment, SqlBuf};
pub use ident::quote_ident;
pub use model::Model;
pub use reader::{ReadNode, Tree, materialize, materialize_all};
pub use registry::{MapConfig, NamingConvention, Registry, RegistryBuilder};
pub use render::RenderOptions;
pub use row::{RowAccess, TestRow};
pub use schema::{Column, Table, TableBuilder, TableSource};
pub use stmt::{Delete, Insert, Join, JoinKind, Query, TypedStream, Update};
pub use value::{SqlType, Value};

pub mod prelude;
