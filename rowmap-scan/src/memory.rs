//! In-memory row source.

use std::collections::VecDeque;

use rowmap_result::BoxError;
use rowmap_types::{Receiver, Value};

use crate::source::{RowSource, ScanError};

/// Row source over rows of [`Value`]s held in memory.
///
/// Records whether it was closed and can be told to fail iteration after a
/// number of rows, which makes it convenient for exercising the adapters.
#[derive(Debug, Default)]
pub struct MemoryRows {
    columns: Vec<String>,
    pending: VecDeque<Vec<Value>>,
    current: Option<Vec<Value>>,
    closed: bool,
    fail_after: Option<(usize, String)>,
    yielded: usize,
    error: Option<String>,
}

impl MemoryRows {
    pub fn new<I, S>(columns: I, rows: Vec<Vec<Value>>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            pending: rows.into(),
            ..Self::default()
        }
    }

    /// Stop iterating with `message` once `rows` rows have been produced.
    pub fn fail_after(mut self, rows: usize, message: impl Into<String>) -> Self {
        self.fail_after = Some((rows, message.into()));
        self
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Rows not yet reached by `next`.
    pub fn remaining(&self) -> usize {
        self.pending.len()
    }
}

impl RowSource for MemoryRows {
    fn next(&mut self) -> bool {
        self.current = None;
        if self.closed {
            return false;
        }
        if let Some((limit, message)) = &self.fail_after {
            if self.yielded >= *limit {
                self.error = Some(message.clone());
                return false;
            }
        }
        match self.pending.pop_front() {
            Some(row) => {
                self.current = Some(row);
                self.yielded += 1;
                true
            }
            None => false,
        }
    }

    fn err(&mut self) -> Option<BoxError> {
        self.error.take().map(BoxError::from)
    }

    fn close(&mut self) {
        self.closed = true;
        self.current = None;
    }

    fn column_names(&self) -> Vec<String> {
        self.columns.clone()
    }

    fn scan(&mut self, receivers: &mut [Box<dyn Receiver>]) -> Result<(), ScanError> {
        let Some(row) = self.current.as_ref() else {
            return Err(ScanError::other("scan called without a current row"));
        };
        if receivers.len() != row.len() {
            return Err(ScanError::other(format!(
                "number of field descriptions must equal number of destinations, got {} and {}",
                row.len(),
                receivers.len()
            )));
        }
        for (index, (receiver, value)) in receivers.iter_mut().zip(row).enumerate() {
            receiver
                .receive(value.clone())
                .map_err(|err| ScanError::at_column(index, err))?;
        }
        Ok(())
    }
}
