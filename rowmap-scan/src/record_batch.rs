//! Row source over Arrow record batches.
//!
//! Columns of natively supported types are read value by value. Every other
//! column is cast to UTF-8 when the source is created, so destinations can
//! still receive it as text.

use std::sync::Arc;

use arrow::array::{
    Array, ArrayRef, BinaryArray, BooleanArray, Date32Array, Float32Array, Float64Array,
    Int8Array, Int16Array, Int32Array, Int64Array, LargeBinaryArray, LargeStringArray,
    StringArray, TimestampMicrosecondArray, TimestampMillisecondArray, TimestampNanosecondArray,
    TimestampSecondArray, UInt8Array, UInt16Array, UInt32Array, UInt64Array,
};
use arrow::compute::cast;
use arrow::datatypes::{DataType, SchemaRef, TimeUnit};
use arrow::record_batch::RecordBatch;
use rowmap_result::{BoxError, Error, Result};
use rowmap_types::{Receiver, Value};
use time::{Duration, OffsetDateTime};

use crate::source::{RowSource, ScanError};

const NANOS_PER_SECOND: i128 = 1_000_000_000;

/// Iterates the rows of a sequence of record batches sharing one schema.
#[derive(Debug)]
pub struct RecordBatchRows {
    schema: SchemaRef,
    batches: Vec<Vec<ArrayRef>>,
    batch: usize,
    /// Row within `batch`, `None` before the first call to `next`.
    row: Option<usize>,
    closed: bool,
}

impl RecordBatchRows {
    /// Source over `batches`, taking the schema from the first batch.
    ///
    /// An empty list has no schema to report; use
    /// [`RecordBatchRows::try_with_schema`] for results that may be empty.
    pub fn try_new(batches: Vec<RecordBatch>) -> Result<Self> {
        let Some(first) = batches.first() else {
            return Err(Error::Internal(
                "record batch rows need at least one batch to know the schema".into(),
            ));
        };
        let schema = first.schema();
        Self::try_with_schema(schema, batches)
    }

    /// Source over `batches` declared with `schema`. An empty batch list
    /// iterates zero rows.
    ///
    /// Fails when a batch's schema differs from `schema` or a column cannot
    /// be cast to UTF-8.
    pub fn try_with_schema(schema: SchemaRef, batches: Vec<RecordBatch>) -> Result<Self> {
        let mut columns = Vec::with_capacity(batches.len());
        for batch in &batches {
            if batch.schema().fields() != schema.fields() {
                return Err(Error::Internal(
                    "record batches passed to one row source must share a schema".into(),
                ));
            }
            let arrays = batch
                .columns()
                .iter()
                .map(normalize_array)
                .collect::<Result<Vec<_>>>()?;
            columns.push(arrays);
        }

        Ok(Self {
            schema,
            batches: columns,
            batch: 0,
            row: None,
            closed: false,
        })
    }

    pub fn schema(&self) -> &SchemaRef {
        &self.schema
    }

    fn current(&self) -> Option<(&[ArrayRef], usize)> {
        let row = self.row?;
        self.batches
            .get(self.batch)
            .map(|arrays| (arrays.as_slice(), row))
    }
}

impl RowSource for RecordBatchRows {
    fn next(&mut self) -> bool {
        if self.closed {
            return false;
        }
        let mut candidate = self.row.map_or(0, |row| row + 1);
        while let Some(arrays) = self.batches.get(self.batch) {
            let len = arrays.first().map_or(0, |array| array.len());
            if candidate < len {
                self.row = Some(candidate);
                return true;
            }
            self.batch += 1;
            candidate = 0;
        }
        self.row = None;
        false
    }

    fn err(&mut self) -> Option<BoxError> {
        None
    }

    fn close(&mut self) {
        self.closed = true;
        self.row = None;
    }

    fn column_names(&self) -> Vec<String> {
        self.schema
            .fields()
            .iter()
            .map(|field| field.name().clone())
            .collect()
    }

    fn scan(&mut self, receivers: &mut [Box<dyn Receiver>]) -> std::result::Result<(), ScanError> {
        let Some((arrays, row)) = self.current() else {
            return Err(ScanError::other("scan called without a current row"));
        };
        if receivers.len() != arrays.len() {
            return Err(ScanError::other(format!(
                "number of columns must equal number of destinations, got {} and {}",
                arrays.len(),
                receivers.len()
            )));
        }
        for (index, (receiver, array)) in receivers.iter_mut().zip(arrays).enumerate() {
            let value = value_at(array, row).map_err(|err| ScanError::at_column(index, err))?;
            receiver
                .receive(value)
                .map_err(|err| ScanError::at_column(index, err))?;
        }
        Ok(())
    }
}

fn is_native(data_type: &DataType) -> bool {
    matches!(
        data_type,
        DataType::Null
            | DataType::Boolean
            | DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
            | DataType::Float32
            | DataType::Float64
            | DataType::Utf8
            | DataType::LargeUtf8
            | DataType::Binary
            | DataType::LargeBinary
            | DataType::Date32
            | DataType::Timestamp(_, _)
    )
}

fn normalize_array(array: &ArrayRef) -> Result<ArrayRef> {
    if is_native(array.data_type()) {
        return Ok(Arc::clone(array));
    }
    tracing::debug!(
        data_type = ?array.data_type(),
        "casting column without native conversion to Utf8"
    );
    Ok(cast(array, &DataType::Utf8)?)
}

macro_rules! read {
    ($array:expr, $ty:ty, $row:expr) => {
        $array
            .as_any()
            .downcast_ref::<$ty>()
            .ok_or_else(|| {
                format!(
                    "expected {} for {:?} column",
                    stringify!($ty),
                    $array.data_type()
                )
            })?
            .value($row)
    };
}

fn value_at(array: &ArrayRef, row: usize) -> std::result::Result<Value, String> {
    if array.is_null(row) {
        return Ok(Value::Null);
    }

    let value = match array.data_type() {
        DataType::Null => Value::Null,
        DataType::Boolean => Value::Bool(read!(array, BooleanArray, row)),
        DataType::Int8 => Value::from(read!(array, Int8Array, row)),
        DataType::Int16 => Value::from(read!(array, Int16Array, row)),
        DataType::Int32 => Value::from(read!(array, Int32Array, row)),
        DataType::Int64 => Value::from(read!(array, Int64Array, row)),
        DataType::UInt8 => Value::from(read!(array, UInt8Array, row)),
        DataType::UInt16 => Value::from(read!(array, UInt16Array, row)),
        DataType::UInt32 => Value::from(read!(array, UInt32Array, row)),
        DataType::UInt64 => Value::from(read!(array, UInt64Array, row)),
        DataType::Float32 => Value::from(read!(array, Float32Array, row)),
        DataType::Float64 => Value::from(read!(array, Float64Array, row)),
        DataType::Utf8 => Value::from(read!(array, StringArray, row)),
        DataType::LargeUtf8 => Value::from(read!(array, LargeStringArray, row)),
        DataType::Binary => Value::from(read!(array, BinaryArray, row)),
        DataType::LargeBinary => Value::from(read!(array, LargeBinaryArray, row)),
        DataType::Date32 => {
            let days = read!(array, Date32Array, row);
            let ts = OffsetDateTime::UNIX_EPOCH
                .checked_add(Duration::days(i64::from(days)))
                .ok_or_else(|| format!("Date32 value {days} is out of range"))?;
            Value::Timestamp(ts)
        }
        DataType::Timestamp(unit, _) => {
            let (raw, nanos_per_unit) = match unit {
                TimeUnit::Second => (read!(array, TimestampSecondArray, row), NANOS_PER_SECOND),
                TimeUnit::Millisecond => (read!(array, TimestampMillisecondArray, row), 1_000_000),
                TimeUnit::Microsecond => (read!(array, TimestampMicrosecondArray, row), 1_000),
                TimeUnit::Nanosecond => (read!(array, TimestampNanosecondArray, row), 1),
            };
            let ts = OffsetDateTime::from_unix_timestamp_nanos(i128::from(raw) * nanos_per_unit)
                .map_err(|err| format!("timestamp {raw} is out of range: {err}"))?;
            Value::Timestamp(ts)
        }
        other => return Err(format!("unsupported Arrow type {other:?}")),
    };
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::datatypes::{Field, Schema};
    use rowmap_types::ValueType;

    fn batch(ids: Vec<i64>, names: Vec<Option<&str>>) -> RecordBatch {
        let schema = Arc::new(Schema::new(vec![
            Field::new("id", DataType::Int64, false),
            Field::new("name", DataType::Utf8, true),
        ]));
        RecordBatch::try_new(
            schema,
            vec![
                Arc::new(Int64Array::from(ids)) as ArrayRef,
                Arc::new(StringArray::from(names)) as ArrayRef,
            ],
        )
        .expect("batch")
    }

    #[test]
    fn iterates_across_batches() {
        let mut rows = RecordBatchRows::try_new(vec![
            batch(vec![1, 2], vec![Some("a"), None]),
            batch(vec![], vec![]),
            batch(vec![3], vec![Some("c")]),
        ])
        .expect("rows");
        assert_eq!(rows.column_names(), vec!["id", "name"]);

        let mut seen = Vec::new();
        while rows.next() {
            let mut receivers = vec![
                ValueType::of::<i64>().new_receiver(false),
                ValueType::of::<Option<String>>().new_receiver(false),
            ];
            rows.scan(&mut receivers).expect("scan");
            let id = *receivers[0].take().expect("id").downcast::<i64>().expect("i64");
            let name = *receivers[1]
                .take()
                .expect("name")
                .downcast::<Option<String>>()
                .expect("string");
            seen.push((id, name));
        }
        assert_eq!(
            seen,
            vec![
                (1, Some("a".to_string())),
                (2, None),
                (3, Some("c".to_string()))
            ]
        );
        assert!(rows.err().is_none());
    }

    #[test]
    fn reads_temporal_and_cast_columns() {
        let schema = Arc::new(Schema::new(vec![
            Field::new("day", DataType::Date32, false),
            Field::new(
                "at",
                DataType::Timestamp(TimeUnit::Millisecond, None),
                false,
            ),
            Field::new("ratio", DataType::Decimal128(10, 2), false),
        ]));
        let decimal = arrow::array::Decimal128Array::from(vec![12_345i128])
            .with_precision_and_scale(10, 2)
            .expect("decimal");
        let batch = RecordBatch::try_new(
            schema,
            vec![
                Arc::new(Date32Array::from(vec![1])) as ArrayRef,
                Arc::new(TimestampMillisecondArray::from(vec![1_500])) as ArrayRef,
                Arc::new(decimal) as ArrayRef,
            ],
        )
        .expect("batch");

        let mut rows = RecordBatchRows::try_new(vec![batch]).expect("rows");
        assert!(rows.next());
        let (arrays, row) = rows.current().expect("current");
        assert_eq!(arrays[2].data_type(), &DataType::Utf8);
        assert_eq!(
            value_at(&arrays[0], row),
            Ok(Value::Timestamp(OffsetDateTime::UNIX_EPOCH + Duration::days(1)))
        );
        assert_eq!(
            value_at(&arrays[1], row),
            Ok(Value::Timestamp(
                OffsetDateTime::UNIX_EPOCH + Duration::milliseconds(1_500)
            ))
        );
        assert_eq!(value_at(&arrays[2], row), Ok(Value::Text("123.45".into())));
    }

    #[test]
    fn conversion_failures_name_the_column() {
        let mut rows =
            RecordBatchRows::try_new(vec![batch(vec![1], vec![None])]).expect("rows");
        assert!(rows.next());
        let mut receivers = vec![
            ValueType::of::<i64>().new_receiver(false),
            ValueType::of::<String>().new_receiver(false),
        ];
        let err = rows.scan(&mut receivers).unwrap_err();
        assert_eq!(err.column, Some(1));

        rows.close();
        assert!(!rows.next());
    }

    #[test]
    fn empty_batch_list_is_rejected() {
        assert!(matches!(
            RecordBatchRows::try_new(Vec::new()),
            Err(Error::Internal(_))
        ));
    }

    #[test]
    fn declared_schema_allows_empty_results() {
        let schema = batch(vec![], vec![]).schema();
        let mut rows = RecordBatchRows::try_with_schema(schema, Vec::new()).expect("rows");
        assert_eq!(rows.column_names(), vec!["id", "name"]);
        assert!(!rows.next());
        assert!(rows.err().is_none());

        let other = Arc::new(Schema::new(vec![Field::new("id", DataType::Int64, false)]));
        assert!(matches!(
            RecordBatchRows::try_with_schema(other, vec![batch(vec![1], vec![None])]),
            Err(Error::Internal(_))
        ));
    }
}
