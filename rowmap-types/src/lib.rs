//! Runtime value model and record descriptors for rowmap.
//!
//! A row source hands each column to a [`Receiver`] as a [`Value`]. Receivers
//! convert values through the [`FromColumn`] capability and hold the result
//! until the scan engine writes it into a destination field.
//!
//! Destinations describe themselves through [`Record`], usually generated by
//! [`impl_record!`]. Every addressable field type implements [`ColumnType`],
//! which reports a [`FieldKind`] to the column map builder and hands out a
//! [`FieldMut`] accessor to the path interpreter.

#[macro_use]
mod macros;

pub mod convert;
pub mod descriptor;
pub mod receiver;
pub mod value;

pub use convert::{ConvertError, FromColumn};
pub use descriptor::{
    ColumnType, DescriptorFn, DynRecord, FieldDescriptor, FieldKind, FieldMut, OptionalRecord,
    Record, RecordDescriptor, ValueType,
};
pub use receiver::{Discard, NullableReceiver, Receiver, ValueReceiver};
pub use value::Value;
