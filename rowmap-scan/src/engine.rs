//! Scan-assign engine.
//!
//! Scanning one row into a destination happens in three steps:
//!
//! 1. Plan: resolve the destination's [`ColumnMap`] and bind every column to
//!    its [`ColumnEntry`] or to a discard slot.
//! 2. Scan: hand one receiver per physical column to the row source in a
//!    single call.
//! 3. Assign: move every received value into the destination through its
//!    field path.
//!
//! The destination is not touched before the scan call succeeds. Values
//! received by nullable slots as NULL are skipped, so optional branches that
//! came back entirely NULL stay unset.

use std::sync::Arc;

use rowmap_mapping::{ColumnEntry, ColumnMap, ColumnMapCache, assign_entry};
use rowmap_result::{Error, Result};
use rowmap_types::{ColumnType, Discard, DynRecord, FieldMut, Receiver};

use crate::notation::Column;
use crate::source::{RowSource, ScanError};

/// Field label used in diagnostics for columns without a destination.
const DISCARDED: &str = "<discarded>";

/// Column bindings for one scan of one destination type.
#[derive(Debug)]
pub struct ScanPlan<'a> {
    columns: &'a [Column],
    bindings: Vec<Option<&'a ColumnEntry>>,
}

impl<'a> ScanPlan<'a> {
    /// Bind `columns` against `map`.
    ///
    /// With `strict` set, a data column missing from the map fails with
    /// [`Error::UnknownColumn`]; otherwise it is discarded.
    pub fn new(map: &'a ColumnMap, columns: &'a [Column], strict: bool) -> Result<Self> {
        if columns.is_empty() {
            return Err(Error::NoColumns);
        }

        let mut bindings = Vec::with_capacity(columns.len());
        for column in columns {
            let Some(name) = column.name() else {
                bindings.push(None);
                continue;
            };
            match map.get(name) {
                Some(entry) => bindings.push(Some(entry)),
                None if strict => return Err(Error::UnknownColumn(name.to_string())),
                None => {
                    tracing::trace!(
                        column = name,
                        record = map.record_type_name(),
                        "discarding unmapped column"
                    );
                    bindings.push(None);
                }
            }
        }

        Ok(Self { columns, bindings })
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Entry bound to the column at `index`, `None` for discarded columns.
    pub fn binding(&self, index: usize) -> Option<&'a ColumnEntry> {
        self.bindings.get(index).copied().flatten()
    }

    /// Fresh receiver slots, one per column, in column order.
    pub fn receivers(&self) -> Vec<Box<dyn Receiver>> {
        self.bindings
            .iter()
            .map(|binding| match binding {
                Some(entry) => entry.new_receiver(),
                None => Box::new(Discard) as Box<dyn Receiver>,
            })
            .collect()
    }

    /// Attach column and field context to a row source failure.
    pub fn translate(&self, err: ScanError) -> Error {
        let Some(index) = err.column else {
            return Error::RowSource(err.cause);
        };
        let column = self
            .columns
            .get(index)
            .map_or_else(|| format!("#{index}"), ToString::to_string);
        let field = self
            .binding(index)
            .map_or_else(|| DISCARDED.to_string(), |entry| entry.field.clone());
        Error::FieldAssign {
            column_index: index,
            column,
            field,
            cause: err.cause,
        }
    }

    /// Move the values held by `receivers` into `record`.
    pub fn assign(
        &self,
        record: &mut dyn DynRecord,
        receivers: &mut [Box<dyn Receiver>],
    ) -> Result<()> {
        for (binding, receiver) in self.bindings.iter().zip(receivers.iter_mut()) {
            let Some(entry) = binding else {
                continue;
            };
            // Empty when a nullable slot received NULL.
            if let Some(value) = receiver.take() {
                assign_entry(record, entry, value)?;
            }
        }
        Ok(())
    }
}

/// Record behind `dest`, materialising an empty optional destination.
pub fn destination_record<T: ColumnType>(dest: &mut T) -> Result<&mut dyn DynRecord> {
    match dest.field_mut() {
        FieldMut::Record(record) => Ok(record),
        FieldMut::OptionalRecord(container) => container.materialize().ok_or_else(|| {
            Error::not_addressable(format!(
                "{} cannot be materialized",
                std::any::type_name::<T>()
            ))
        }),
        FieldMut::Value(_) | FieldMut::Unsupported(_) => {
            Err(Error::not_a_record(std::any::type_name::<T>()))
        }
    }
}

/// Check once per map that its paths resolve on a scratch `T`, so a record
/// whose fields disagree with its descriptor fails before `dest` is touched.
fn verify_layout<T: ColumnType>(map: &ColumnMap) -> Result<()> {
    map.verify_once(|| {
        let Some(mut scratch) = T::default_value() else {
            return Ok(());
        };
        let record = destination_record(&mut scratch)?;
        map.verify(record)
    })
}

/// Scan the current row of `source` into `dest` using the process-wide
/// column map cache.
pub fn scan_into<S, T>(source: &mut S, dest: &mut T, columns: &[Column], strict: bool) -> Result<()>
where
    S: RowSource + ?Sized,
    T: ColumnType,
{
    scan_into_with(ColumnMapCache::global(), source, dest, columns, strict)
}

/// Scan the current row of `source` into `dest`, resolving column maps
/// through `cache`.
pub fn scan_into_with<S, T>(
    cache: &ColumnMapCache,
    source: &mut S,
    dest: &mut T,
    columns: &[Column],
    strict: bool,
) -> Result<()>
where
    S: RowSource + ?Sized,
    T: ColumnType,
{
    if columns.is_empty() {
        return Err(Error::NoColumns);
    }
    let map: Arc<ColumnMap> = cache.get_for::<T>()?;
    verify_layout::<T>(&map)?;
    let plan = ScanPlan::new(&map, columns, strict)?;

    let mut receivers = plan.receivers();
    source
        .scan(&mut receivers)
        .map_err(|err| plan.translate(err))?;

    let record = destination_record(dest)?;
    plan.assign(record, &mut receivers)
}
