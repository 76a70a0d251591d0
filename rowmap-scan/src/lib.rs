//! Scanning tabular rows into rowmap records.
//!
//! This crate sits between a [`RowSource`] (any forward-only cursor that can
//! name its columns and scan one row into receiver slots) and the column maps
//! built by `rowmap-mapping`:
//!
//! - [`notation`]: rewrites `notate:<prefix>` pseudo-columns into dotted
//!   column names.
//! - [`engine`]: binds columns to fields, performs the single scan call and
//!   assigns the received values.
//! - [`rows`]: row and rows adapters with closing and empty-result handling.
//! - [`memory`] and [`record_batch`]: row sources over in-memory values and
//!   Arrow record batches.

pub mod engine;
pub mod memory;
pub mod notation;
pub mod record_batch;
pub mod rows;
pub mod source;

pub use engine::{ScanPlan, destination_record, scan_into, scan_into_with};
pub use memory::MemoryRows;
pub use notation::{Column, NOTATE_PREFIX, NotationRewriter, rewrite_columns};
pub use record_batch::RecordBatchRows;
pub use rows::{Rows, ScanOptions};
pub use source::{RowSource, ScanError};
