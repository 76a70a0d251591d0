//! Per-type column map caches.
//!
//! A [`ColumnMapCache`] pairs a [`MapperConfig`] with the maps built under it.
//! One mutex guards both the lookup and the build, so concurrent first use of
//! a type builds its map exactly once and every other caller waits for that
//! build. Built maps are shared through `Arc` and never evicted unless
//! [`ColumnMapCache::clear`] is called.
//!
//! The process-wide instance behind [`ColumnMapCache::global`] backs the free
//! functions of this module. Changing its configuration does not invalidate
//! maps already built; configure it once at start-up, or call `clear`.

use std::any::TypeId;
use std::sync::{Arc, Mutex, OnceLock, PoisonError, RwLock};

use rowmap_result::{Error, Result};
use rowmap_types::{ColumnType, FieldKind, FromColumn, Record, RecordDescriptor};
use rustc_hash::FxHashMap;

use crate::column_map::{ColumnMap, build_column_map};
use crate::config::{MapperConfig, RenameFn};
use crate::normalize::snake_case;

/// Column maps keyed by record type, built lazily under one configuration.
#[derive(Debug, Default)]
pub struct ColumnMapCache {
    config: RwLock<MapperConfig>,
    maps: Mutex<FxHashMap<TypeId, Arc<ColumnMap>>>,
}

impl ColumnMapCache {
    pub fn new(config: MapperConfig) -> Self {
        Self {
            config: RwLock::new(config),
            maps: Mutex::new(FxHashMap::default()),
        }
    }

    /// The process-wide cache.
    pub fn global() -> &'static ColumnMapCache {
        static GLOBAL: OnceLock<ColumnMapCache> = OnceLock::new();
        GLOBAL.get_or_init(ColumnMapCache::default)
    }

    /// Snapshot of the current configuration.
    pub fn config(&self) -> MapperConfig {
        self.config
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Mutate the configuration. Maps that are already cached keep the shape
    /// they were built with.
    pub fn update_config<F>(&self, update: F)
    where
        F: FnOnce(&mut MapperConfig),
    {
        let mut config = self.config.write().unwrap_or_else(PoisonError::into_inner);
        update(&mut config);
    }

    /// Treat record type `T` as a single-column value in maps built from now on.
    pub fn register_value_record<T: Record + FromColumn>(&self) {
        self.update_config(|config| config.register_value_record::<T>());
    }

    /// Drop every cached map.
    pub fn clear(&self) {
        self.maps
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    /// Number of record types with a cached map.
    pub fn len(&self) -> usize {
        self.maps
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Column map of the record described by `descriptor`, building it on
    /// first use.
    pub fn get(&self, descriptor: &'static RecordDescriptor) -> Arc<ColumnMap> {
        let mut maps = self.maps.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(map) = maps.get(&descriptor.type_id()) {
            return Arc::clone(map);
        }

        let config = self.config.read().unwrap_or_else(PoisonError::into_inner);
        let map = Arc::new(build_column_map(descriptor, &config));
        maps.insert(descriptor.type_id(), Arc::clone(&map));
        map
    }

    /// Column map of `T` after unwrapping `Option` and `Box`.
    ///
    /// Fails with [`Error::NotARecordType`] when `T` is a leaf value, including
    /// records registered as value records.
    pub fn get_for<T: ColumnType>(&self) -> Result<Arc<ColumnMap>> {
        let kind = self.config().resolve_kind(T::field_kind());
        match kind {
            FieldKind::Record(descriptor) | FieldKind::OptionalRecord(descriptor) => {
                Ok(self.get(descriptor()))
            }
            FieldKind::Value(_) | FieldKind::Unsupported(_) => {
                Err(Error::not_a_record(std::any::type_name::<T>()))
            }
        }
    }
}

/// Column map of `descriptor` from the process-wide cache.
pub fn column_map(descriptor: &'static RecordDescriptor) -> Arc<ColumnMap> {
    ColumnMapCache::global().get(descriptor)
}

/// Column map of `T` from the process-wide cache.
pub fn column_map_of<T: ColumnType>() -> Result<Arc<ColumnMap>> {
    ColumnMapCache::global().get_for::<T>()
}

/// Namespace nested records by default in the process-wide configuration.
///
/// Intended for start-up; maps cached before the call are not rebuilt.
pub fn set_notated_by_default(notate: bool) {
    ColumnMapCache::global().update_config(|config| config.notate_by_default = notate);
}

/// Replace the default column name derivation of the process-wide
/// configuration.
///
/// Intended for start-up; maps cached before the call are not rebuilt.
pub fn set_column_rename_function<F>(rename: F)
where
    F: Fn(&str) -> String + Send + Sync + 'static,
{
    let rename: RenameFn = Arc::new(rename);
    ColumnMapCache::global().update_config(|config| config.set_rename(rename));
}

/// Restore the snake-case column name derivation.
pub fn reset_column_rename_function() {
    set_column_rename_function(snake_case);
}

/// Register a value record in the process-wide configuration.
pub fn register_value_record<T: Record + FromColumn>() {
    ColumnMapCache::global().register_value_record::<T>();
}

#[cfg(test)]
mod tests {
    use super::*;
    use rowmap_types::impl_record;
    use std::thread;

    #[derive(Default)]
    struct Account {
        account_id: i64,
        owner: Option<String>,
    }

    impl_record!(Account { account_id, owner });

    #[test]
    fn builds_once_and_shares_the_map() {
        let cache = ColumnMapCache::default();
        assert!(cache.is_empty());
        let first = cache.get(Account::descriptor());
        let second = cache.get(Account::descriptor());
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.len(), 1);
        assert_eq!(first.columns(), vec!["account_id", "owner"]);
    }

    #[test]
    fn concurrent_first_use_yields_one_map() {
        let cache = Arc::new(ColumnMapCache::default());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cache = Arc::clone(&cache);
                thread::spawn(move || cache.get(Account::descriptor()))
            })
            .collect();
        let maps: Vec<_> = handles
            .into_iter()
            .map(|handle| handle.join().expect("thread"))
            .collect();
        assert!(maps.iter().all(|map| Arc::ptr_eq(map, &maps[0])));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn config_changes_apply_after_clear() {
        let cache = ColumnMapCache::default();
        let before = cache.get(Account::descriptor());
        cache.update_config(|config| config.set_rename(Arc::new(|name: &str| name.to_uppercase())));

        let stale = cache.get(Account::descriptor());
        assert!(Arc::ptr_eq(&before, &stale));

        cache.clear();
        let rebuilt = cache.get(Account::descriptor());
        assert_eq!(rebuilt.columns(), vec!["ACCOUNT_ID", "OWNER"]);
    }

    #[test]
    fn unwraps_option_and_box_and_rejects_scalars() {
        let cache = ColumnMapCache::default();
        let plain = cache.get_for::<Account>().expect("record");
        let boxed = cache.get_for::<Option<Box<Account>>>().expect("optional record");
        assert!(Arc::ptr_eq(&plain, &boxed));

        let err = cache.get_for::<i64>().unwrap_err();
        assert!(matches!(err, Error::NotARecordType { type_name } if type_name == "i64"));
        assert!(matches!(
            cache.get_for::<Option<String>>(),
            Err(Error::NotARecordType { .. })
        ));
    }
}
