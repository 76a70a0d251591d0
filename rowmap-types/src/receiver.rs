//! Typed receiver slots handed to a row source.
//!
//! The scan engine allocates one receiver per physical column. The row source
//! pushes each column value into its receiver; the engine later takes the
//! converted value out and writes it into the destination field.

use std::any::Any;

use crate::convert::{ConvertError, FromColumn};
use crate::value::Value;

/// A slot that absorbs one column value.
pub trait Receiver: Send {
    /// Convert and store `value`. Called at most once per scan.
    fn receive(&mut self, value: Value) -> Result<(), ConvertError>;

    /// Take the stored value, if any.
    ///
    /// `None` means nothing should be written, for example because a nullable
    /// slot received NULL.
    fn take(&mut self) -> Option<Box<dyn Any + Send>>;
}

/// Receiver for a column bound to a field that is always present.
///
/// NULL is only accepted when `T` itself is nullable (e.g. `Option<i64>`).
pub struct ValueReceiver<T> {
    value: Option<T>,
}

impl<T> Default for ValueReceiver<T> {
    fn default() -> Self {
        Self { value: None }
    }
}

impl<T: FromColumn> Receiver for ValueReceiver<T> {
    fn receive(&mut self, value: Value) -> Result<(), ConvertError> {
        self.value = Some(T::from_column(value)?);
        Ok(())
    }

    fn take(&mut self) -> Option<Box<dyn Any + Send>> {
        self.value
            .take()
            .map(|value| Box::new(value) as Box<dyn Any + Send>)
    }
}

/// Receiver for a column reached through an absent-capable container.
///
/// NULL leaves the slot empty so the destination branch is not touched.
pub struct NullableReceiver<T> {
    value: Option<T>,
}

impl<T> Default for NullableReceiver<T> {
    fn default() -> Self {
        Self { value: None }
    }
}

impl<T: FromColumn> Receiver for NullableReceiver<T> {
    fn receive(&mut self, value: Value) -> Result<(), ConvertError> {
        self.value = match value {
            Value::Null => None,
            other => Some(T::from_column(other)?),
        };
        Ok(())
    }

    fn take(&mut self) -> Option<Box<dyn Any + Send>> {
        self.value
            .take()
            .map(|value| Box::new(value) as Box<dyn Any + Send>)
    }
}

/// Receiver that accepts and drops any value.
#[derive(Debug, Default, Clone, Copy)]
pub struct Discard;

impl Receiver for Discard {
    fn receive(&mut self, _value: Value) -> Result<(), ConvertError> {
        Ok(())
    }

    fn take(&mut self) -> Option<Box<dyn Any + Send>> {
        None
    }
}

pub(crate) fn new_value_receiver<T: FromColumn>() -> Box<dyn Receiver> {
    Box::new(ValueReceiver::<T>::default())
}

pub(crate) fn new_nullable_receiver<T: FromColumn>() -> Box<dyn Receiver> {
    Box::new(NullableReceiver::<T>::default())
}

/// Moves a taken value into a destination of the same type.
pub(crate) fn assign_value<T: 'static>(target: &mut dyn Any, value: Box<dyn Any + Send>) -> bool {
    let Some(slot) = target.downcast_mut::<T>() else {
        return false;
    };
    match value.downcast::<T>() {
        Ok(value) => {
            *slot = *value;
            true
        }
        Err(_) => false,
    }
}
