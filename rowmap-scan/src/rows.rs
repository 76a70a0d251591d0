//! Row and rows adapters.
//!
//! [`Rows`] drives the scan-assign engine over a [`RowSource`]. Column names
//! are re-read and notation-rewritten for every row. Every adapter method
//! closes the source when it returns, whether it succeeded or not.

use rowmap_mapping::ColumnMapCache;
use rowmap_result::{Error, Result};
use rowmap_types::ColumnType;

use crate::engine::scan_into_with;
use crate::notation::{Column, NotationRewriter};
use crate::source::RowSource;

/// Behaviour switches for [`Rows`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanOptions {
    /// Fail with [`Error::UnknownColumn`] when a column has no field.
    /// Unmatched columns are discarded otherwise.
    pub match_all_columns: bool,
    /// Report [`Error::NoRows`] from [`Rows::scan_one`] and
    /// [`Rows::scan_all`] when the source produced no rows.
    pub no_rows_error: bool,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            match_all_columns: true,
            no_rows_error: false,
        }
    }
}

/// Scans the rows of a [`RowSource`] into records.
pub struct Rows<'c, S> {
    source: S,
    options: ScanOptions,
    rewriter: NotationRewriter,
    cache: &'c ColumnMapCache,
}

impl<S: RowSource> Rows<'static, S> {
    /// Adapter using the process-wide column map cache and default options.
    pub fn new(source: S) -> Self {
        Self {
            source,
            options: ScanOptions::default(),
            rewriter: NotationRewriter::default(),
            cache: ColumnMapCache::global(),
        }
    }
}

impl<'c, S: RowSource> Rows<'c, S> {
    pub fn with_cache<'d>(self, cache: &'d ColumnMapCache) -> Rows<'d, S> {
        Rows {
            source: self.source,
            options: self.options,
            rewriter: self.rewriter,
            cache,
        }
    }

    pub fn with_options(mut self, options: ScanOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_rewriter(mut self, rewriter: NotationRewriter) -> Self {
        self.rewriter = rewriter;
        self
    }

    pub fn options(&self) -> ScanOptions {
        self.options
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn into_inner(self) -> S {
        self.source
    }

    pub fn next(&mut self) -> bool {
        self.source.next()
    }

    pub fn close(&mut self) {
        self.source.close();
    }

    /// Column names of the result set after notation rewriting.
    pub fn columns(&self) -> Result<Vec<Column>> {
        self.rewriter.rewrite(&self.source.column_names())
    }

    /// Scan the current row into `dest` without advancing or closing.
    pub fn scan_current<T: ColumnType>(&mut self, dest: &mut T) -> Result<()> {
        let columns = self.columns()?;
        scan_into_with(
            self.cache,
            &mut self.source,
            dest,
            &columns,
            self.options.match_all_columns,
        )
    }

    /// Scan the first row into `dest`.
    ///
    /// Fails with [`Error::NoRows`] when there is no row, regardless of
    /// [`ScanOptions::no_rows_error`].
    pub fn scan_row<T: ColumnType>(&mut self, dest: &mut T) -> Result<()> {
        let outcome = if self.source.next() {
            self.scan_current(dest).map(|()| 1)
        } else {
            Ok(0)
        };
        self.finish(outcome, true)
    }

    /// Scan every row into the same `dest`; the last row wins.
    pub fn scan_one<T: ColumnType>(&mut self, dest: &mut T) -> Result<()> {
        let outcome = self.for_each_row(|rows| rows.scan_current(dest));
        self.finish(outcome, self.options.no_rows_error)
    }

    /// Append one freshly allocated element per row to `dest`.
    ///
    /// `T` may be a record, a boxed record or an optional record.
    pub fn scan_all<T: ColumnType>(&mut self, dest: &mut Vec<T>) -> Result<()> {
        let outcome = self.cache.get_for::<T>().and_then(|_| {
            self.for_each_row(|rows| {
                let mut element = T::default_value().ok_or_else(|| {
                    Error::not_addressable(format!(
                        "{} has no default instance",
                        std::any::type_name::<T>()
                    ))
                })?;
                rows.scan_current(&mut element)?;
                dest.push(element);
                Ok(())
            })
        });
        self.finish(outcome, self.options.no_rows_error)
    }

    fn for_each_row<F>(&mut self, mut scan: F) -> Result<usize>
    where
        F: FnMut(&mut Self) -> Result<()>,
    {
        let mut count = 0;
        while self.source.next() {
            scan(self)?;
            count += 1;
        }
        Ok(count)
    }

    /// Surface the iteration error, close the source and apply the empty
    /// result policy.
    fn finish(&mut self, outcome: Result<usize>, no_rows_error: bool) -> Result<()> {
        let outcome = outcome.and_then(|count| match self.source.err() {
            Some(err) => Err(Error::RowSource(err)),
            None => Ok(count),
        });
        self.source.close();

        let count = outcome?;
        tracing::trace!(rows = count, "rows scan finished");
        if count == 0 && no_rows_error {
            return Err(Error::NoRows);
        }
        Ok(())
    }
}
