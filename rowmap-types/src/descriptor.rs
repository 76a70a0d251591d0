//! Record and field descriptors.
//!
//! A [`RecordDescriptor`] is the first-use-time description of a record type:
//! its declared fields in order, each with its raw annotation string and
//! [`FieldKind`]. Descriptors are built once per type and live for the rest of
//! the process.

use std::any::{Any, TypeId};
use std::fmt;

use time::{Date, OffsetDateTime, PrimitiveDateTime};

use crate::convert::FromColumn;
use crate::receiver::{Receiver, assign_value, new_nullable_receiver, new_value_receiver};

/// Lazily resolves the descriptor of a nested record type.
///
/// A function pointer rather than a reference so self-referential record
/// types can describe themselves.
pub type DescriptorFn = fn() -> &'static RecordDescriptor;

/// Runtime handle on a leaf type: how to allocate a receiver for it and how
/// to move a received value into a field of that type.
#[derive(Clone, Copy)]
pub struct ValueType {
    type_id: TypeId,
    type_name: &'static str,
    new_receiver: fn() -> Box<dyn Receiver>,
    new_nullable_receiver: fn() -> Box<dyn Receiver>,
    assign: fn(&mut dyn Any, Box<dyn Any + Send>) -> bool,
}

impl ValueType {
    pub fn of<T: FromColumn>() -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            type_name: std::any::type_name::<T>(),
            new_receiver: new_value_receiver::<T>,
            new_nullable_receiver: new_nullable_receiver::<T>,
            assign: assign_value::<T>,
        }
    }

    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Allocate a receiver slot. `nullable` slots treat NULL as "absent".
    pub fn new_receiver(&self, nullable: bool) -> Box<dyn Receiver> {
        if nullable {
            (self.new_nullable_receiver)()
        } else {
            (self.new_receiver)()
        }
    }

    /// Move `value` into `target`. Returns `false` when either side is not of
    /// this type.
    pub fn assign(&self, target: &mut dyn Any, value: Box<dyn Any + Send>) -> bool {
        (self.assign)(target, value)
    }
}

impl PartialEq for ValueType {
    fn eq(&self, other: &Self) -> bool {
        self.type_id == other.type_id
    }
}

impl Eq for ValueType {}

impl fmt::Debug for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ValueType").field(&self.type_name).finish()
    }
}

/// Structural shape of a field's declared type.
#[derive(Clone, Copy)]
pub enum FieldKind {
    /// Written directly from one column.
    Value(ValueType),
    /// A nested record held inline or boxed.
    Record(DescriptorFn),
    /// A nested record behind an absent-capable reference (`Option<R>`,
    /// `Option<Box<R>>`).
    OptionalRecord(DescriptorFn),
    /// A shape the mapper cannot address; such fields are skipped.
    Unsupported(&'static str),
}

impl FieldKind {
    pub fn is_value(&self) -> bool {
        matches!(self, FieldKind::Value(_))
    }

    /// Descriptor of the record this kind refers to, if any.
    pub fn record(&self) -> Option<&'static RecordDescriptor> {
        match self {
            FieldKind::Record(descriptor) | FieldKind::OptionalRecord(descriptor) => {
                Some(descriptor())
            }
            _ => None,
        }
    }
}

impl fmt::Debug for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldKind::Value(value_type) => f.debug_tuple("Value").field(value_type).finish(),
            FieldKind::Record(descriptor) => f
                .debug_tuple("Record")
                .field(&descriptor().type_name())
                .finish(),
            FieldKind::OptionalRecord(descriptor) => f
                .debug_tuple("OptionalRecord")
                .field(&descriptor().type_name())
                .finish(),
            FieldKind::Unsupported(name) => f.debug_tuple("Unsupported").field(name).finish(),
        }
    }
}

/// One declared field of a record.
#[derive(Debug, Clone)]
pub struct FieldDescriptor {
    name: &'static str,
    tag: &'static str,
    embedded: bool,
    kind: FieldKind,
}

impl FieldDescriptor {
    pub fn new(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            tag: "",
            embedded: false,
            kind,
        }
    }

    /// Attach the raw annotation string (`db:"..." scan:"..."`).
    pub fn with_tag(mut self, tag: &'static str) -> Self {
        self.tag = tag;
        self
    }

    /// Mark the field as transparently embedded into its container.
    pub fn embedded(mut self) -> Self {
        self.embedded = true;
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn tag(&self) -> &'static str {
        self.tag
    }

    pub fn is_embedded(&self) -> bool {
        self.embedded
    }

    pub fn kind(&self) -> FieldKind {
        self.kind
    }
}

/// Declared shape of a record type.
#[derive(Debug)]
pub struct RecordDescriptor {
    type_id: TypeId,
    type_name: &'static str,
    fields: Vec<FieldDescriptor>,
}

impl RecordDescriptor {
    pub fn new<T: 'static>(fields: Vec<FieldDescriptor>) -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            type_name: std::any::type_name::<T>(),
            fields,
        }
    }

    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }
}

/// Mutable access to one field, as seen by the path interpreter.
pub enum FieldMut<'a> {
    Value(&'a mut dyn Any),
    Record(&'a mut dyn DynRecord),
    OptionalRecord(&'a mut dyn OptionalRecord),
    Unsupported(&'static str),
}

/// A record type the mapper can scan into.
///
/// Usually implemented through [`impl_record!`](crate::impl_record).
pub trait Record: Default + Send + 'static {
    fn descriptor() -> &'static RecordDescriptor;

    /// Field at declaration `index`, or `None` past the last field.
    fn field_mut(&mut self, index: usize) -> Option<FieldMut<'_>>;
}

/// Object-safe view of a [`Record`].
pub trait DynRecord: Send {
    fn record_descriptor(&self) -> &'static RecordDescriptor;
    fn field_at(&mut self, index: usize) -> Option<FieldMut<'_>>;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Record> DynRecord for T {
    fn record_descriptor(&self) -> &'static RecordDescriptor {
        T::descriptor()
    }

    fn field_at(&mut self, index: usize) -> Option<FieldMut<'_>> {
        Record::field_mut(self, index)
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// An absent-capable container of a record.
pub trait OptionalRecord: Send {
    fn is_present(&self) -> bool;

    /// Allocate a default record if absent and return it. `None` if the
    /// contained type has no default instance or is not a record.
    fn materialize(&mut self) -> Option<&mut dyn DynRecord>;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: ColumnType> OptionalRecord for Option<T> {
    fn is_present(&self) -> bool {
        self.is_some()
    }

    fn materialize(&mut self) -> Option<&mut dyn DynRecord> {
        if self.is_none() {
            *self = Some(T::default_value()?);
        }
        self.as_mut().and_then(|inner| inner.as_record_mut())
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Implemented by every type that can appear as a mapped field.
pub trait ColumnType: Send + 'static {
    fn field_kind() -> FieldKind
    where
        Self: Sized;

    /// Kind of `Option<Self>`.
    fn optional_kind() -> FieldKind
    where
        Self: Sized;

    fn field_mut(&mut self) -> FieldMut<'_>;

    /// Fresh instance used to materialise absent containers.
    fn default_value() -> Option<Self>
    where
        Self: Sized,
    {
        None
    }

    fn as_record_mut(&mut self) -> Option<&mut dyn DynRecord> {
        None
    }
}

impl<T: ColumnType> ColumnType for Option<T> {
    fn field_kind() -> FieldKind {
        T::optional_kind()
    }

    fn optional_kind() -> FieldKind {
        FieldKind::Unsupported(std::any::type_name::<Option<Self>>())
    }

    fn field_mut(&mut self) -> FieldMut<'_> {
        match T::field_kind() {
            FieldKind::Value(_) => FieldMut::Value(self),
            FieldKind::Record(_) | FieldKind::OptionalRecord(_) => FieldMut::OptionalRecord(self),
            FieldKind::Unsupported(name) => FieldMut::Unsupported(name),
        }
    }

    fn default_value() -> Option<Self> {
        Some(None)
    }
}

impl<T: ColumnType> ColumnType for Box<T> {
    fn field_kind() -> FieldKind {
        T::field_kind()
    }

    fn optional_kind() -> FieldKind {
        match T::optional_kind() {
            // Option<Box<scalar>> has no receiver of its exact type.
            FieldKind::Value(_) => FieldKind::Unsupported(std::any::type_name::<Option<Self>>()),
            kind => kind,
        }
    }

    fn field_mut(&mut self) -> FieldMut<'_> {
        ColumnType::field_mut(&mut **self)
    }

    fn default_value() -> Option<Self> {
        T::default_value().map(Box::new)
    }

    fn as_record_mut(&mut self) -> Option<&mut dyn DynRecord> {
        (**self).as_record_mut()
    }
}

/// Reports the kind of the field selected by `accessor`.
///
/// Used by [`impl_record!`](crate::impl_record) to infer field types.
pub fn kind_of<R, T, F>(_accessor: F) -> FieldKind
where
    T: ColumnType,
    F: Fn(&R) -> &T,
{
    T::field_kind()
}

impl_column_value!(
    bool,
    i8,
    i16,
    i32,
    i64,
    isize,
    u8,
    u16,
    u32,
    u64,
    usize,
    f32,
    f64,
    String,
    Vec<u8>,
    OffsetDateTime,
    PrimitiveDateTime,
    Date
);
