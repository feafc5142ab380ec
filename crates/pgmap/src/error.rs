//! Error types for pgmap

use thiserror::Error;

/// Result type alias for pgmap operations
pub type MapResult<T> = Result<T, MapError>;

/// Query compilation failures.
///
/// These are always surfaced synchronously when a statement is compiled,
/// never deferred to execution.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CompileError {
    /// An expression shape the renderer does not understand.
    #[error("unsupported expression: {0}")]
    Unsupported(String),

    /// A column reference that does not resolve to a column of its table source.
    #[error("unresolved column '{column}' on table '{table}'")]
    UnresolvedColumn { table: String, column: String },

    /// A table-source index that does not name a source of the query.
    #[error("unresolved table source #{0}")]
    UnresolvedSource(usize),

    /// An expression that should fold to a constant but still depends on row data.
    #[error("expression depends on row data and cannot be evaluated: {0}")]
    NotConstant(String),

    /// A statement that would mutate every row without an explicit opt-in.
    #[error("{0} without WHERE requires without_where()")]
    MissingWhere(&'static str),
}

/// Materialization failures, from plan construction or row decoding.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MappingError {
    /// The target type has no usable constructor shape.
    #[error("no usable constructor for type '{0}'")]
    NoConstructor(&'static str),

    /// No column matching a resolved name was found at or after the expected offset.
    #[error("no column named '{name}' at or after ordinal {floor}")]
    UnresolvedColumn { name: String, floor: usize },

    /// A stored value could not be converted to the field's type.
    #[error("conversion failed for '{name}': expected {expected}, got {got}")]
    Conversion {
        name: String,
        expected: &'static str,
        got: String,
    },

    /// A NULL was stored where the target field requires a value.
    #[error("unexpected NULL in non-nullable field '{0}'")]
    UnexpectedNull(String),

    /// Enum text that does not match any declared member.
    #[error("'{text}' is not a member of enum '{ty}'")]
    UnknownEnumText { ty: &'static str, text: String },

    /// Enum integer that does not match any declared member.
    #[error("{value} is not a member of enum '{ty}'")]
    UnknownEnumValue { ty: &'static str, value: i64 },

    /// An ordinal past the end of the row.
    #[error("ordinal {0} is out of range for the row")]
    OrdinalOutOfRange(usize),
}

/// Error type for database mapping operations.
#[derive(Debug, Error)]
pub enum MapError {
    /// Statement compilation error
    #[error("compile error: {0}")]
    Compile(#[from] CompileError),

    /// Row materialization error
    #[error("mapping error: {0}")]
    Mapping(#[from] MappingError),

    /// Driver error, passed through unmodified
    #[error("database error: {0}")]
    Db(#[from] tokio_postgres::Error),

    /// Row not found
    #[error("not found: {0}")]
    NotFound(String),
}

impl MapError {
    /// Create a not found error
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    /// Check if this is a not found error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// Check if this is a compile-time error
    pub fn is_compile(&self) -> bool {
        matches!(self, Self::Compile(_))
    }

    /// Check if this is a materialization error
    pub fn is_mapping(&self) -> bool {
        matches!(self, Self::Mapping(_))
    }
}

impl CompileError {
    pub fn unsupported(what: impl Into<String>) -> Self {
        Self::Unsupported(what.into())
    }

    pub fn unresolved_column(table: impl Into<String>, column: impl Into<String>) -> Self {
        Self::UnresolvedColumn {
            table: table.into(),
            column: column.into(),
        }
    }
}

impl MappingError {
    pub fn unresolved_column(name: impl Into<String>, floor: usize) -> Self {
        Self::UnresolvedColumn {
            name: name.into(),
            floor,
        }
    }

    pub fn conversion(name: impl Into<String>, expected: &'static str, got: impl Into<String>) -> Self {
        Self::Conversion {
            name: name.into(),
            expected,
            got: got.into(),
        }
    }
}
