use std::fmt;

use thiserror::Error;

/// Boxed error used for causes reported by external collaborators.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Unified error type for all rowmap operations.
///
/// All variants are returned to the immediate caller; nothing is retried
/// internally. Variants that describe a specific column keep both the column
/// name and its position so they can be surfaced verbatim to users.
///
/// `Error` implements `Send` and `Sync`.
#[derive(Error, Debug)]
pub enum Error {
    /// The destination type is not a record.
    ///
    /// Raised when a column map is requested for a type whose outermost shape,
    /// after unwrapping `Option`/`Box`, is a scalar or an unsupported type.
    #[error("cannot scan into this type: {type_name}")]
    NotARecordType { type_name: String },

    /// A pseudo-column carried the reserved notation prefix more than once.
    ///
    /// The payload is the offending physical column name.
    #[error("column notate syntax is invalid: expecting \"notate:name\", got {0:?}")]
    InvalidNotationSyntax(String),

    /// The column list handed to the scan engine was empty.
    #[error("columns can not be empty")]
    NoColumns,

    /// Strict matching is on and a column has no corresponding field.
    #[error("unable to find corresponding field to column \"{0}\" returned by query")]
    UnknownColumn(String),

    /// The row source rejected the value of one column.
    ///
    /// Typical causes are a NULL delivered into a non-optional field, or a
    /// value whose runtime type cannot be converted into the field type.
    /// `field` is the dotted path of declared field names inside the
    /// destination record, or `"<discarded>"` when the column was not bound.
    #[error("can't scan column {column_index} (\"{column}\") into field {field}: {cause}")]
    FieldAssign {
        column_index: usize,
        column: String,
        field: String,
        #[source]
        cause: BoxError,
    },

    /// The destination or one of its intermediate fields cannot be written.
    ///
    /// Raised when an absent optional container has no way to be
    /// materialised, or when a field accessor does not agree with the
    /// record's descriptor.
    #[error("destination is not addressable: {0}")]
    DestinationNotAddressable(String),

    /// A rows scan configured to report empty results produced no rows.
    #[error("no rows in result set")]
    NoRows,

    /// The underlying row source failed outside of any single column.
    #[error("row source error: {0}")]
    RowSource(#[source] BoxError),

    /// Arrow error raised while preparing record batches for scanning.
    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    /// Internal error indicating a bug or unexpected state.
    #[error("An internal operation failed: {0}")]
    Internal(String),
}

impl Error {
    /// Create a [`Error::NotARecordType`] naming `type_name`.
    #[inline]
    pub fn not_a_record(type_name: impl Into<String>) -> Self {
        Error::NotARecordType {
            type_name: type_name.into(),
        }
    }

    /// Create a [`Error::DestinationNotAddressable`] from any displayable detail.
    #[inline]
    pub fn not_addressable<D: fmt::Display>(detail: D) -> Self {
        Error::DestinationNotAddressable(detail.to_string())
    }

    /// Wrap a failure reported by the row source.
    #[inline]
    pub fn row_source(cause: impl Into<BoxError>) -> Self {
        Error::RowSource(cause.into())
    }

    /// Position of the column this error refers to, if any.
    pub fn column_index(&self) -> Option<usize> {
        match self {
            Error::FieldAssign { column_index, .. } => Some(*column_index),
            _ => None,
        }
    }
}
