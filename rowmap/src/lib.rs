//! rowmap: scan tabular query results into nested Rust records
//!
//! This crate is the primary entrypoint for rowmap. It re-exports the record
//! model, the column mapper and the scan engine from the underlying
//! `rowmap-*` crates, providing a unified API surface for users.
//!
//! # Quick Start
//!
//! Describe the destination records, then scan a row source into them:
//!
//! ```rust
//! use rowmap::{MemoryRows, Rows, Value, impl_record};
//!
//! #[derive(Debug, Default)]
//! struct Address {
//!     city: String,
//! }
//!
//! #[derive(Debug, Default)]
//! struct User {
//!     id: i64,
//!     name: String,
//!     address: Option<Box<Address>>,
//! }
//!
//! impl_record!(Address { city });
//! impl_record!(User {
//!     id,
//!     name,
//!     address: r#"scan:"notate""#,
//! });
//!
//! let source = MemoryRows::new(
//!     ["id", "name", "notate:address", "city"],
//!     vec![vec![Value::Int(1), Value::from("ada"), Value::Null, Value::from("Paris")]],
//! );
//! let mut users: Vec<User> = Vec::new();
//! Rows::new(source).scan_all(&mut users).unwrap();
//! assert_eq!(users[0].address.as_ref().map(|a| a.city.as_str()), Some("Paris"));
//! ```
//!
//! # Architecture
//!
//! - **Record model** (`rowmap-types`): values, receivers and record descriptors.
//! - **Mapping** (`rowmap-mapping`): annotation parsing, name normalization and
//!   cached column maps.
//! - **Scanning** (`rowmap-scan`): notation rewriting, the scan-assign engine,
//!   row adapters and row sources over memory and Arrow record batches.
//! - **Errors** (`rowmap-result`): the shared [`Error`] type.
//!
//! # Re-exports
//!
//! - [`Rows`]: the row and rows adapters.
//! - [`mapping`]: column map construction and mapper configuration.
//! - [`sources`]: bundled [`RowSource`] implementations.

// Record model
pub use rowmap_types::{
    ColumnType, ConvertError, FromColumn, Record, Value, impl_column_value, impl_record,
};

// Scanning
pub use rowmap_scan::{
    Column, NotationRewriter, RowSource, Rows, ScanError, ScanOptions, rewrite_columns,
    scan_into, scan_into_with,
};

pub mod sources {
    //! Row sources shipped with rowmap.
    //!
    //! Any cursor implementing [`RowSource`](crate::RowSource) can be scanned;
    //! these cover rows held in memory and Arrow record batches.

    pub use rowmap_scan::{MemoryRows, RecordBatchRows};
}

pub use sources::{MemoryRows, RecordBatchRows};

pub mod mapping {
    //! Column maps and the process-wide mapper configuration.
    //!
    //! Changes made through [`set_notated_by_default`],
    //! [`set_column_rename_function`] and [`register_value_record`] only apply
    //! to types mapped afterwards; call [`ColumnMapCache::clear`] on
    //! [`ColumnMapCache::global`] to remap types already seen.

    pub use rowmap_mapping::{
        ColumnEntry, ColumnMap, ColumnMapCache, MapperConfig, RenameFn, build_column_map,
        column_map, column_map_of, lowercase, register_value_record,
        reset_column_rename_function, set_column_rename_function, set_notated_by_default,
        snake_case,
    };
}

// Re-export result types for error handling
pub use rowmap_result::{Error, Result};
