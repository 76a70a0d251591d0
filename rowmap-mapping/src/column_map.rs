//! Column map builder.
//!
//! Walks a record descriptor recursively and produces the flat mapping from
//! column name to field location used by the scan engine. The walk carries
//! three pieces of state: the field path prefix, the column name prefix
//! segments, and whether the current branch is reached through an
//! absent-capable container.
//!
//! Name collisions resolve by declaration order. Direct leaf entries of a
//! record are installed first; nested maps are merged afterwards, in field
//! order, and never overwrite an existing key.

use std::any::TypeId;
use std::sync::OnceLock;

use rowmap_result::{Error, Result};
use rowmap_types::{DynRecord, FieldDescriptor, FieldKind, RecordDescriptor, Receiver, ValueType};
use rustc_hash::FxHashMap;

use crate::annotation::{Directives, parse_directives};
use crate::config::MapperConfig;
use crate::path::{self, FieldPath};

/// Where and how one column is delivered into a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnEntry {
    /// Fully qualified column name (dot-joined prefix segments).
    pub column_name: String,
    pub path: FieldPath,
    /// Dotted path of declared field names, for diagnostics.
    pub field: String,
    /// Declared type of the destination field.
    pub value_type: ValueType,
    /// Reached through an absent-capable container: NULL means "leave unset".
    pub optional: bool,
}

impl ColumnEntry {
    /// Allocate a fresh receiver slot for this column.
    pub fn new_receiver(&self) -> Box<dyn Receiver> {
        self.value_type.new_receiver(self.optional)
    }
}

/// Column name to [`ColumnEntry`] mapping for one record type.
#[derive(Debug, Clone)]
pub struct ColumnMap {
    record: &'static str,
    entries: FxHashMap<String, ColumnEntry>,
    /// Outcome of the first [`ColumnMap::verify_once`] call.
    verified: OnceLock<std::result::Result<(), String>>,
}

impl PartialEq for ColumnMap {
    fn eq(&self, other: &Self) -> bool {
        self.record == other.record && self.entries == other.entries
    }
}

impl ColumnMap {
    pub fn record_type_name(&self) -> &'static str {
        self.record
    }

    pub fn get(&self, column: &str) -> Option<&ColumnEntry> {
        self.entries.get(column)
    }

    pub fn contains(&self, column: &str) -> bool {
        self.entries.contains_key(column)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ColumnEntry)> {
        self.entries.iter().map(|(name, entry)| (name.as_str(), entry))
    }

    /// Column names in sorted order.
    pub fn columns(&self) -> Vec<&str> {
        let mut columns: Vec<&str> = self.entries.keys().map(String::as_str).collect();
        columns.sort_unstable();
        columns
    }

    /// Check that every entry's path leads to a field of the entry's type in
    /// `scratch`, a throwaway instance of the mapped record.
    ///
    /// Hand-written [`Record`](rowmap_types::Record) impls whose `field_mut`
    /// disagrees with their descriptor fail here instead of halfway through
    /// an assignment.
    pub fn verify(&self, scratch: &mut dyn DynRecord) -> Result<()> {
        for entry in self.entries.values() {
            path::check(scratch, &entry.path, &entry.value_type)
                .map_err(|err| path::entry_context(entry, err))?;
        }
        Ok(())
    }

    /// Run `verify` on the first call only and replay its outcome afterwards.
    pub fn verify_once<F>(&self, verify: F) -> Result<()>
    where
        F: FnOnce() -> Result<()>,
    {
        self.verified
            .get_or_init(|| {
                verify().map_err(|err| match err {
                    Error::DestinationNotAddressable(detail) => detail,
                    other => other.to_string(),
                })
            })
            .clone()
            .map_err(Error::DestinationNotAddressable)
    }
}

/// Derive the column map of `descriptor` under `config`.
///
/// Building is deterministic: the same descriptor and config always produce
/// the same entries.
pub fn build_column_map(descriptor: &'static RecordDescriptor, config: &MapperConfig) -> ColumnMap {
    let mut builder = Builder {
        config,
        ancestors: vec![descriptor.type_id()],
    };
    let entries = builder.collect(descriptor, &Scope::default());
    tracing::debug!(
        record = descriptor.type_name(),
        columns = entries.len(),
        "built column map"
    );
    ColumnMap {
        record: descriptor.type_name(),
        entries,
        verified: OnceLock::new(),
    }
}

#[derive(Default, Clone)]
struct Scope {
    path: Vec<usize>,
    fields: Vec<&'static str>,
    names: Vec<String>,
    optional: bool,
}

impl Scope {
    fn child(
        &self,
        index: usize,
        field: &'static str,
        name: Option<&str>,
        optional: bool,
    ) -> Scope {
        let mut child = self.clone();
        child.path.push(index);
        child.fields.push(field);
        if let Some(name) = name {
            child.names.push(name.to_string());
        }
        child.optional = optional;
        child
    }

    fn column_name(&self, column: &str) -> String {
        if self.names.is_empty() {
            return column.to_string();
        }
        let mut joined = self.names.join(".");
        joined.push('.');
        joined.push_str(column);
        joined
    }

    fn field_name(&self, field: &str) -> String {
        if self.fields.is_empty() {
            return field.to_string();
        }
        let mut joined = self.fields.join(".");
        joined.push('.');
        joined.push_str(field);
        joined
    }
}

struct Builder<'a> {
    config: &'a MapperConfig,
    /// Record types on the current descent path.
    ancestors: Vec<TypeId>,
}

impl Builder<'_> {
    fn collect(
        &mut self,
        descriptor: &'static RecordDescriptor,
        scope: &Scope,
    ) -> FxHashMap<String, ColumnEntry> {
        let mut entries = FxHashMap::default();
        let mut nested: Vec<FxHashMap<String, ColumnEntry>> = Vec::new();

        for (index, field) in descriptor.fields().iter().enumerate() {
            let directives = parse_directives(field.tag());
            if directives.ignore {
                continue;
            }
            let column = directives
                .name
                .clone()
                .unwrap_or_else(|| self.config.rename(field.name()));

            match self.config.resolve_kind(field.kind()) {
                FieldKind::Value(value_type) => {
                    let entry = self.leaf(scope, index, field, &column, value_type);
                    entries.entry(entry.column_name.clone()).or_insert(entry);
                }
                FieldKind::Record(inner) => {
                    if let Some(sub) =
                        self.nested(scope, index, field, &directives, &column, inner(), false)
                    {
                        nested.push(sub);
                    }
                }
                FieldKind::OptionalRecord(inner) => {
                    if let Some(sub) =
                        self.nested(scope, index, field, &directives, &column, inner(), true)
                    {
                        nested.push(sub);
                    }
                }
                FieldKind::Unsupported(type_name) => {
                    tracing::warn!(
                        record = descriptor.type_name(),
                        field = field.name(),
                        type_name,
                        "skipping field of unsupported type"
                    );
                }
            }
        }

        for sub in nested {
            for (column, entry) in sub {
                entries.entry(column).or_insert(entry);
            }
        }
        entries
    }

    fn leaf(
        &self,
        scope: &Scope,
        index: usize,
        field: &FieldDescriptor,
        column: &str,
        value_type: ValueType,
    ) -> ColumnEntry {
        let mut path = scope.path.clone();
        path.push(index);
        ColumnEntry {
            column_name: scope.column_name(column),
            path: FieldPath::from(path),
            field: scope.field_name(field.name()),
            value_type,
            optional: scope.optional,
        }
    }

    /// Map of a nested record field, or `None` when the field contributes no
    /// columns.
    #[allow(clippy::too_many_arguments)]
    fn nested(
        &mut self,
        scope: &Scope,
        index: usize,
        field: &FieldDescriptor,
        directives: &Directives,
        column: &str,
        inner: &'static RecordDescriptor,
        behind_option: bool,
    ) -> Option<FxHashMap<String, ColumnEntry>> {
        let child = if field.is_embedded() || directives.follow {
            // Flattened: only an explicit name without `follow` adds a segment.
            let segment = (directives.is_named() && !directives.follow).then_some(column);
            scope.child(index, field.name(), segment, scope.optional)
        } else if (directives.notate || self.config.notate_by_default) && !directives.embed {
            scope.child(index, field.name(), Some(column), scope.optional || behind_option)
        } else {
            tracing::debug!(
                field = field.name(),
                record = inner.type_name(),
                "nested record without follow or notate directive is not mapped"
            );
            return None;
        };

        if self.ancestors.contains(&inner.type_id()) {
            tracing::warn!(
                field = field.name(),
                record = inner.type_name(),
                "record type recursion cut"
            );
            return None;
        }

        self.ancestors.push(inner.type_id());
        let sub = self.collect(inner, &child);
        self.ancestors.pop();

        (!sub.is_empty()).then_some(sub)
    }
}
