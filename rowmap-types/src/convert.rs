//! Conversion from [`Value`] into destination field types.
//!
//! [`FromColumn`] is the value-conversion capability of the mapper: any type
//! implementing it is a leaf, even when it is structurally a record. Types
//! outside this crate opt in with [`impl_column_value!`](crate::impl_column_value).

use thiserror::Error;
use time::{Date, OffsetDateTime, PrimitiveDateTime, UtcOffset};

use crate::value::Value;

/// Error converting a [`Value`] into a concrete native type.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConvertError {
    /// NULL delivered into a field that cannot hold it.
    #[error("cannot assign NULL to non-optional {expected}")]
    UnexpectedNull { expected: &'static str },

    #[error("expected {expected}, got {got}")]
    TypeMismatch {
        expected: &'static str,
        got: &'static str,
    },

    /// Value does not fit in the destination type.
    #[error("value {value} is out of range for {target}")]
    OutOfRange { target: &'static str, value: String },

    #[error("{0}")]
    Custom(String),
}

impl ConvertError {
    pub fn mismatch(expected: &'static str, got: &Value) -> Self {
        match got {
            Value::Null => ConvertError::UnexpectedNull { expected },
            other => ConvertError::TypeMismatch {
                expected,
                got: other.kind_name(),
            },
        }
    }
}

/// Types that can absorb a single column value.
pub trait FromColumn: Sized + Send + 'static {
    fn from_column(value: Value) -> Result<Self, ConvertError>;
}

impl<T: FromColumn> FromColumn for Option<T> {
    fn from_column(value: Value) -> Result<Self, ConvertError> {
        match value {
            Value::Null => Ok(None),
            other => T::from_column(other).map(Some),
        }
    }
}

impl<T: FromColumn> FromColumn for Box<T> {
    fn from_column(value: Value) -> Result<Self, ConvertError> {
        T::from_column(value).map(Box::new)
    }
}

macro_rules! impl_from_column_int {
    ($($t:ty),*) => {
        $(
            impl FromColumn for $t {
                fn from_column(value: Value) -> Result<Self, ConvertError> {
                    let target = stringify!($t);
                    match value {
                        Value::Int(v) => <$t>::try_from(v).map_err(|_| ConvertError::OutOfRange {
                            target,
                            value: v.to_string(),
                        }),
                        Value::UInt(v) => <$t>::try_from(v).map_err(|_| ConvertError::OutOfRange {
                            target,
                            value: v.to_string(),
                        }),
                        Value::Bool(b) => Ok(<$t>::from(b)),
                        other => Err(ConvertError::mismatch(target, &other)),
                    }
                }
            }
        )*
    };
}

impl_from_column_int!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);

impl FromColumn for f64 {
    fn from_column(value: Value) -> Result<Self, ConvertError> {
        match value {
            Value::Float(v) => Ok(v),
            Value::Int(v) => Ok(v as f64),
            Value::UInt(v) => Ok(v as f64),
            other => Err(ConvertError::mismatch("f64", &other)),
        }
    }
}

impl FromColumn for f32 {
    fn from_column(value: Value) -> Result<Self, ConvertError> {
        match value {
            Value::Float(v) => {
                if v.is_finite() && v.abs() > f32::MAX as f64 {
                    return Err(ConvertError::OutOfRange {
                        target: "f32",
                        value: v.to_string(),
                    });
                }
                Ok(v as f32)
            }
            Value::Int(v) => Ok(v as f32),
            Value::UInt(v) => Ok(v as f32),
            other => Err(ConvertError::mismatch("f32", &other)),
        }
    }
}

impl FromColumn for bool {
    fn from_column(value: Value) -> Result<Self, ConvertError> {
        match value {
            Value::Bool(b) => Ok(b),
            Value::Int(0) | Value::UInt(0) => Ok(false),
            Value::Int(1) | Value::UInt(1) => Ok(true),
            other => Err(ConvertError::mismatch("bool", &other)),
        }
    }
}

impl FromColumn for String {
    fn from_column(value: Value) -> Result<Self, ConvertError> {
        match value {
            Value::Text(s) => Ok(s),
            Value::Bytes(bytes) => String::from_utf8(bytes)
                .map_err(|err| ConvertError::Custom(format!("invalid UTF-8 in text column: {err}"))),
            other => Err(ConvertError::mismatch("String", &other)),
        }
    }
}

impl FromColumn for Vec<u8> {
    fn from_column(value: Value) -> Result<Self, ConvertError> {
        match value {
            Value::Bytes(bytes) => Ok(bytes),
            Value::Text(s) => Ok(s.into_bytes()),
            other => Err(ConvertError::mismatch("Vec<u8>", &other)),
        }
    }
}

impl FromColumn for OffsetDateTime {
    fn from_column(value: Value) -> Result<Self, ConvertError> {
        match value {
            Value::Timestamp(ts) => Ok(ts),
            Value::Int(secs) => OffsetDateTime::from_unix_timestamp(secs).map_err(|_| {
                ConvertError::OutOfRange {
                    target: "OffsetDateTime",
                    value: secs.to_string(),
                }
            }),
            other => Err(ConvertError::mismatch("OffsetDateTime", &other)),
        }
    }
}

impl FromColumn for PrimitiveDateTime {
    fn from_column(value: Value) -> Result<Self, ConvertError> {
        match value {
            Value::Timestamp(ts) => {
                let utc = ts.to_offset(UtcOffset::UTC);
                Ok(PrimitiveDateTime::new(utc.date(), utc.time()))
            }
            other => Err(ConvertError::mismatch("PrimitiveDateTime", &other)),
        }
    }
}

impl FromColumn for Date {
    fn from_column(value: Value) -> Result<Self, ConvertError> {
        match value {
            Value::Timestamp(ts) => Ok(ts.to_offset(UtcOffset::UTC).date()),
            other => Err(ConvertError::mismatch("Date", &other)),
        }
    }
}
