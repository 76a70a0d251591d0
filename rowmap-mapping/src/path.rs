//! Field path interpreter.
//!
//! A [`FieldPath`] is the chain of declaration indices leading from a root
//! record to a leaf field. Writing through a path materialises absent
//! optional containers on the way down, and only on paths that actually
//! receive a value.

use std::any::Any;
use std::fmt;

use rowmap_result::{Error, Result};
use rowmap_types::{DynRecord, FieldMut, ValueType};

use crate::column_map::ColumnEntry;

/// Declaration-index chain from a root record to one of its (nested) fields.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct FieldPath(Box<[usize]>);

impl FieldPath {
    pub fn new(indices: impl Into<Box<[usize]>>) -> Self {
        Self(indices.into())
    }

    pub fn indices(&self) -> &[usize] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// `true` when the field sits inside one or more nested records.
    pub fn is_nested(&self) -> bool {
        self.0.len() > 1
    }
}

impl fmt::Debug for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.0.iter()).finish()
    }
}

impl From<Vec<usize>> for FieldPath {
    fn from(indices: Vec<usize>) -> Self {
        Self(indices.into_boxed_slice())
    }
}

/// Write `value` into `root` at `path`.
pub fn set(
    root: &mut dyn DynRecord,
    path: &FieldPath,
    value_type: &ValueType,
    value: Box<dyn Any + Send>,
) -> Result<()> {
    with_leaf(root, path.indices(), |target, type_name, index| {
        if value_type.assign(target, value) {
            Ok(())
        } else {
            Err(Error::not_addressable(format!(
                "{type_name} field #{index} does not hold {}",
                value_type.type_name()
            )))
        }
    })
}

/// Check that `root` has a field of `value_type` at `path`.
///
/// Materialises absent optional containers on the way down, so `root` is
/// expected to be a scratch instance.
pub fn check(root: &mut dyn DynRecord, path: &FieldPath, value_type: &ValueType) -> Result<()> {
    with_leaf(root, path.indices(), |target, type_name, index| {
        let target: &dyn Any = target;
        if target.type_id() == value_type.type_id() {
            Ok(())
        } else {
            Err(Error::not_addressable(format!(
                "{type_name} field #{index} does not hold {}",
                value_type.type_name()
            )))
        }
    })
}

/// Write a scanned value for `entry` into `root`.
pub fn assign_entry(
    root: &mut dyn DynRecord,
    entry: &ColumnEntry,
    value: Box<dyn Any + Send>,
) -> Result<()> {
    set(root, &entry.path, &entry.value_type, value).map_err(|err| entry_context(entry, err))
}

pub(crate) fn entry_context(entry: &ColumnEntry, err: Error) -> Error {
    match err {
        Error::DestinationNotAddressable(detail) => Error::DestinationNotAddressable(format!(
            "field {} for column \"{}\": {detail}",
            entry.field, entry.column_name
        )),
        other => other,
    }
}

/// Walk `indices` from `record` and hand the leaf to `apply` along with the
/// owning record's type name and the leaf's index.
fn with_leaf<F>(record: &mut dyn DynRecord, indices: &[usize], apply: F) -> Result<()>
where
    F: FnOnce(&mut dyn Any, &str, usize) -> Result<()>,
{
    let Some((&index, rest)) = indices.split_first() else {
        return Err(Error::not_addressable("empty field path"));
    };
    let type_name = record.record_descriptor().type_name();
    let field = record
        .field_at(index)
        .ok_or_else(|| Error::not_addressable(format!("{type_name} has no field #{index}")))?;

    if rest.is_empty() {
        let target = leaf_target(field, type_name, index)?;
        return apply(target, type_name, index);
    }

    match field {
        FieldMut::Record(inner) => with_leaf(inner, rest, apply),
        FieldMut::OptionalRecord(container) => {
            let inner = container.materialize().ok_or_else(|| {
                Error::not_addressable(format!(
                    "{type_name} field #{index} cannot be materialized"
                ))
            })?;
            with_leaf(inner, rest, apply)
        }
        FieldMut::Value(_) | FieldMut::Unsupported(_) => Err(Error::not_addressable(format!(
            "{type_name} field #{index} is not a record"
        ))),
    }
}

fn leaf_target<'a>(field: FieldMut<'a>, type_name: &str, index: usize) -> Result<&'a mut dyn Any> {
    match field {
        FieldMut::Value(target) => Ok(target),
        FieldMut::Record(record) => Ok(record.as_any_mut()),
        FieldMut::OptionalRecord(container) => Ok(container.as_any_mut()),
        FieldMut::Unsupported(name) => Err(Error::not_addressable(format!(
            "{type_name} field #{index} has unsupported type {name}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rowmap_types::impl_record;

    #[derive(Debug, Default, PartialEq)]
    struct Inner {
        value: i32,
    }

    #[derive(Debug, Default, PartialEq)]
    struct Outer {
        inline: Inner,
        boxed: Option<Box<Inner>>,
        label: String,
    }

    impl_record!(Inner { value });
    impl_record!(Outer { inline, boxed, label });

    #[test]
    fn writes_through_inline_and_optional_records() {
        let mut outer = Outer::default();
        let i32_type = ValueType::of::<i32>();

        set(&mut outer, &FieldPath::from(vec![0, 0]), &i32_type, Box::new(7i32)).expect("inline");
        assert_eq!(outer.inline.value, 7);
        assert!(outer.boxed.is_none());

        set(&mut outer, &FieldPath::from(vec![1, 0]), &i32_type, Box::new(9i32)).expect("boxed");
        assert_eq!(outer.boxed, Some(Box::new(Inner { value: 9 })));
    }

    #[test]
    fn rejects_paths_through_leaves_and_wrong_types() {
        let mut outer = Outer::default();
        let err = set(
            &mut outer,
            &FieldPath::from(vec![2, 0]),
            &ValueType::of::<i32>(),
            Box::new(1i32),
        )
        .unwrap_err();
        assert!(matches!(err, Error::DestinationNotAddressable(_)));

        let err = set(
            &mut outer,
            &FieldPath::from(vec![2]),
            &ValueType::of::<i32>(),
            Box::new(1i32),
        )
        .unwrap_err();
        assert!(matches!(err, Error::DestinationNotAddressable(msg) if msg.contains("does not hold")));
        assert_eq!(outer, Outer::default());
    }

    #[test]
    fn check_matches_declared_leaf_types() {
        let mut scratch = Outer::default();
        let i32_type = ValueType::of::<i32>();
        check(&mut scratch, &FieldPath::from(vec![1, 0]), &i32_type).expect("boxed");
        check(&mut scratch, &FieldPath::from(vec![2]), &ValueType::of::<String>()).expect("label");

        let err = check(&mut scratch, &FieldPath::from(vec![2]), &i32_type).unwrap_err();
        assert!(matches!(err, Error::DestinationNotAddressable(msg) if msg.contains("does not hold")));
        assert!(check(&mut scratch, &FieldPath::from(vec![3]), &i32_type).is_err());
    }

    #[test]
    fn nested_paths_report_nesting() {
        assert!(FieldPath::from(vec![1, 0]).is_nested());
        assert!(!FieldPath::from(vec![1]).is_nested());
        assert_eq!(format!("{:?}", FieldPath::from(vec![1, 2])), "[1, 2]");
    }
}
