use std::any::TypeId;
use std::fmt;
use std::sync::Arc;

use rowmap_types::{FieldKind, FromColumn, Record, ValueType};
use rustc_hash::FxHashMap;

use crate::normalize::snake_case;

/// Column name derivation applied to fields without an explicit name.
pub type RenameFn = Arc<dyn Fn(&str) -> String + Send + Sync>;

/// Leaf value types registered for a record type: the plain form and the
/// `Option` form.
#[derive(Debug, Clone, Copy)]
struct ValueRecord {
    plain: ValueType,
    optional: ValueType,
}

/// Settings consulted by the column map builder.
#[derive(Clone)]
pub struct MapperConfig {
    /// Namespace nested record columns under the field's column name even
    /// without a `notate` directive.
    pub notate_by_default: bool,
    rename: RenameFn,
    value_records: FxHashMap<TypeId, ValueRecord>,
}

impl Default for MapperConfig {
    fn default() -> Self {
        Self {
            notate_by_default: false,
            rename: Arc::new(snake_case),
            value_records: FxHashMap::default(),
        }
    }
}

impl fmt::Debug for MapperConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MapperConfig")
            .field("notate_by_default", &self.notate_by_default)
            .field("value_records", &self.value_records.len())
            .finish_non_exhaustive()
    }
}

impl MapperConfig {
    pub fn with_notate_by_default(mut self, notate: bool) -> Self {
        self.notate_by_default = notate;
        self
    }

    pub fn with_rename<F>(mut self, rename: F) -> Self
    where
        F: Fn(&str) -> String + Send + Sync + 'static,
    {
        self.rename = Arc::new(rename);
        self
    }

    pub fn set_rename(&mut self, rename: RenameFn) {
        self.rename = rename;
    }

    pub fn rename(&self, field_name: &str) -> String {
        (self.rename)(field_name)
    }

    /// Treat record type `T` as a single-column value wherever it appears.
    ///
    /// The field must be declared as `T`, `Box<T>` or `Option<T>`.
    pub fn register_value_record<T: Record + FromColumn>(&mut self) {
        self.value_records.insert(
            TypeId::of::<T>(),
            ValueRecord {
                plain: ValueType::of::<T>(),
                optional: ValueType::of::<Option<T>>(),
            },
        );
    }

    pub fn with_value_record<T: Record + FromColumn>(mut self) -> Self {
        self.register_value_record::<T>();
        self
    }

    /// Reclassify record kinds registered as values.
    pub fn resolve_kind(&self, kind: FieldKind) -> FieldKind {
        match kind {
            FieldKind::Record(descriptor) => self
                .value_records
                .get(&descriptor().type_id())
                .map_or(kind, |registered| FieldKind::Value(registered.plain)),
            FieldKind::OptionalRecord(descriptor) => self
                .value_records
                .get(&descriptor().type_id())
                .map_or(kind, |registered| FieldKind::Value(registered.optional)),
            other => other,
        }
    }
}
