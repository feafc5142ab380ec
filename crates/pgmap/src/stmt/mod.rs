//! Statement builders.
//!
//! Builders are immutable: every combinator clones and extends, so a shared
//! base query can branch without interference. Compilation is synchronous and
//! side-effect free; execution borrows a [`GenericClient`](crate::client).

mod delete;
mod insert;
mod query;
mod update;

pub use delete::Delete;
pub use insert::Insert;
pub use query::{Join, JoinKind, Query, TypedStream};
pub use update::Update;
