//! Unified error type
//!
//! Every fallible operation in the crate returns [`Error`]. Compilation and
//! evaluation errors are caused by caller input and are always reported, never
//! panicked on. Driver errors are opaque and carry the statement that failed.

use thiserror::Error;

use crate::filter::Operation;

/// Boxed driver error, kept opaque
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Unified error type for compilation, evaluation and repository operations
#[derive(Error, Debug)]
pub enum Error {
    /// A filter or order references a field absent from the mapping
    #[error("unknown field `{0}`")]
    UnknownField(String),

    /// The dialect (or the evaluator) has no rule for this operation
    #[error("operation {operation} is not supported by {dialect}")]
    UnsupportedOperation {
        operation: Operation,
        dialect: &'static str,
    },

    /// The operation exists but cannot be applied to this kind of value
    #[error("operation {operation} is not supported for {value_type}")]
    UnsupportedValue {
        operation: Operation,
        value_type: &'static str,
    },

    /// Subnet literal given to IPWithin does not parse
    #[error("invalid subnet `{0}`")]
    InvalidSubnet(String),

    /// Single-record lookup matched nothing
    #[error("object not found")]
    NotFound,

    /// Loading a record from column data failed
    #[error("cannot decode field `{field}`: expected {expected}, found {found}")]
    Decode {
        field: String,
        expected: &'static str,
        found: &'static str,
    },

    /// Invalid repository or mapping configuration
    #[error("configuration error: {0}")]
    Config(String),

    /// Filter could not be read from its wire form
    #[error("invalid filter: {0}")]
    InvalidFilter(String),

    /// Error returned by the underlying driver
    #[error("cannot execute query `{statement}`: {source}")]
    Driver {
        statement: String,
        #[source]
        source: BoxError,
    },
}

/// Crate-wide result alias
pub type Result<T, E = Error> = std::result::Result<T, E>;

impl Error {
    /// Create an unknown field error
    pub fn unknown_field(field: impl Into<String>) -> Self {
        Self::UnknownField(field.into())
    }

    /// Create an unsupported operation error for a dialect
    pub fn unsupported_operation(operation: Operation, dialect: &'static str) -> Self {
        Self::UnsupportedOperation { operation, dialect }
    }

    /// Create an unsupported value error
    pub fn unsupported_value(operation: Operation, value_type: &'static str) -> Self {
        Self::UnsupportedValue {
            operation,
            value_type,
        }
    }

    /// Create a decode error for a field
    pub fn decode(field: impl Into<String>, expected: &'static str, found: &'static str) -> Self {
        Self::Decode {
            field: field.into(),
            expected,
            found,
        }
    }

    /// Wrap a driver error together with the statement that caused it
    pub fn driver(statement: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self::Driver {
            statement: statement.into(),
            source: source.into(),
        }
    }

    /// Check if this is the not-found sentinel
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound)
    }

    /// Check if this error was caused by the filter or query itself
    ///
    /// Such errors are deterministic: retrying with the same input fails again.
    pub fn is_invalid_input(&self) -> bool {
        matches!(
            self,
            Self::UnknownField(_)
                | Self::UnsupportedOperation { .. }
                | Self::UnsupportedValue { .. }
                | Self::InvalidSubnet(_)
                | Self::InvalidFilter(_)
        )
    }
}
