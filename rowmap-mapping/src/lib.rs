//! Column map derivation for rowmap records.
//!
//! A [`ColumnMap`] tells the scan engine, for every column name a record can
//! absorb, which nested field receives it and with which value type. Maps are
//! derived from a record's [`RecordDescriptor`](rowmap_types::RecordDescriptor)
//! and its per-field annotations, then cached per type in a
//! [`ColumnMapCache`].
//!
//! - [`normalize`]: default column names derived from field names.
//! - [`annotation`]: `db`/`scan` directive parsing.
//! - [`column_map`]: the recursive builder.
//! - [`path`]: field path interpreter used to write scanned values.
//! - [`cache`]: process-wide and explicit map caches.

pub mod annotation;
pub mod cache;
pub mod column_map;
pub mod config;
pub mod normalize;
pub mod path;

pub use annotation::{Directives, parse_directives};
pub use cache::{
    ColumnMapCache, column_map, column_map_of, register_value_record,
    reset_column_rename_function, set_column_rename_function, set_notated_by_default,
};
pub use column_map::{ColumnEntry, ColumnMap, build_column_map};
pub use config::{MapperConfig, RenameFn};
pub use normalize::{lowercase, snake_case};
pub use path::{FieldPath, assign_entry};
