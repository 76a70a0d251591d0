//! The row-source collaborator.
//!
//! A [`RowSource`] is a forward-only cursor over a result set. The engine only
//! ever asks it for the physical column names and for one positional scan of
//! the current row into a set of [`Receiver`] slots.

use rowmap_result::BoxError;
use rowmap_types::Receiver;
use thiserror::Error;

/// Failure reported by [`RowSource::scan`].
///
/// `column` is the position of the column whose value was rejected, or `None`
/// when the failure is not tied to a single column (cursor not positioned,
/// receiver count mismatch, transport error).
#[derive(Error, Debug)]
#[error("{}: {cause}", position(.column))]
pub struct ScanError {
    pub column: Option<usize>,
    #[source]
    pub cause: BoxError,
}

fn position(column: &Option<usize>) -> String {
    match column {
        Some(index) => format!("column {index}"),
        None => "scan".to_string(),
    }
}

impl ScanError {
    pub fn at_column(column: usize, cause: impl Into<BoxError>) -> Self {
        Self {
            column: Some(column),
            cause: cause.into(),
        }
    }

    pub fn other(cause: impl Into<BoxError>) -> Self {
        Self {
            column: None,
            cause: cause.into(),
        }
    }
}

/// Forward-only cursor over tabular results.
pub trait RowSource {
    /// Advance to the next row. Returns `false` once the rows are exhausted or
    /// iteration failed; see [`RowSource::err`].
    fn next(&mut self) -> bool;

    /// Take the error that stopped iteration, if any.
    fn err(&mut self) -> Option<BoxError>;

    /// Release the cursor. Further calls to `next` return `false`.
    fn close(&mut self);

    /// Physical column names of the result set, before notation rewriting.
    fn column_names(&self) -> Vec<String>;

    /// Deliver every column of the current row into `receivers`, positionally.
    fn scan(&mut self, receivers: &mut [Box<dyn Receiver>]) -> Result<(), ScanError>;
}

impl<S: RowSource + ?Sized> RowSource for &mut S {
    fn next(&mut self) -> bool {
        (**self).next()
    }

    fn err(&mut self) -> Option<BoxError> {
        (**self).err()
    }

    fn close(&mut self) {
        (**self).close()
    }

    fn column_names(&self) -> Vec<String> {
        (**self).column_names()
    }

    fn scan(&mut self, receivers: &mut [Box<dyn Receiver>]) -> Result<(), ScanError> {
        (**self).scan(receivers)
    }
}

impl<S: RowSource + ?Sized> RowSource for Box<S> {
    fn next(&mut self) -> bool {
        (**self).next()
    }

    fn err(&mut self) -> Option<BoxError> {
        (**self).err()
    }

    fn close(&mut self) {
        (**self).close()
    }

    fn column_names(&self) -> Vec<String> {
        (**self).column_names()
    }

    fn scan(&mut self, receivers: &mut [Box<dyn Receiver>]) -> Result<(), ScanError> {
        (**self).scan(receivers)
    }
}
