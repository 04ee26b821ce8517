//! Arrow to JSON value conversion
//!
//! Converts single Arrow array elements into `serde_json::Value`s, and JSON
//! scalars into the text used in object keys.

use crate::error::{Error, Result};
use arrow::array::timezone::Tz;
use arrow::array::{
    Array, BooleanArray, Date32Array, Date64Array, Float64Array, Int64Array, ListArray,
    StringArray, StructArray, TimestampMicrosecondArray, TimestampMillisecondArray,
    TimestampNanosecondArray, TimestampSecondArray,
};
use arrow::datatypes::{DataType, TimeUnit};
use arrow::util::display::array_value_to_string;
use chrono::{NaiveDateTime, TimeZone};
use serde_json::Value;

const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";
const DATETIME_TZ_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f%:z";

/// Downcast an array or fail with a serialization error
fn downcast<'a, T: 'static>(array: &'a dyn Array, name: &str) -> Result<&'a T> {
    array
        .as_any()
        .downcast_ref::<T>()
        .ok_or_else(|| Error::serialization(format!("Failed to downcast to {name}")))
}

/// Convert a single array element to JSON
///
/// Timestamps and dates become text (`2024-01-01 10:00:00`), non-finite
/// floats become `null`, and types without a JSON counterpart fall back to
/// Arrow's display formatting.
pub fn array_value_to_json(array: &dyn Array, row: usize) -> Result<Value> {
    if array.is_null(row) {
        return Ok(Value::Null);
    }

    match array.data_type() {
        DataType::Null => Ok(Value::Null),

        DataType::Boolean => {
            let arr = downcast::<BooleanArray>(array, "BooleanArray")?;
            Ok(Value::Bool(arr.value(row)))
        }

        DataType::Int8 => {
            let arr = downcast::<arrow::array::Int8Array>(array, "Int8Array")?;
            Ok(Value::Number(arr.value(row).into()))
        }

        DataType::Int16 => {
            let arr = downcast::<arrow::array::Int16Array>(array, "Int16Array")?;
            Ok(Value::Number(arr.value(row).into()))
        }

        DataType::Int32 => {
            let arr = downcast::<arrow::array::Int32Array>(array, "Int32Array")?;
            Ok(Value::Number(arr.value(row).into()))
        }

        DataType::Int64 => {
            let arr = downcast::<Int64Array>(array, "Int64Array")?;
            Ok(Value::Number(arr.value(row).into()))
        }

        DataType::UInt8 => {
            let arr = downcast::<arrow::array::UInt8Array>(array, "UInt8Array")?;
            Ok(Value::Number(arr.value(row).into()))
        }

        DataType::UInt16 => {
            let arr = downcast::<arrow::array::UInt16Array>(array, "UInt16Array")?;
            Ok(Value::Number(arr.value(row).into()))
        }

        DataType::UInt32 => {
            let arr = downcast::<arrow::array::UInt32Array>(array, "UInt32Array")?;
            Ok(Value::Number(arr.value(row).into()))
        }

        DataType::UInt64 => {
            let arr = downcast::<arrow::array::UInt64Array>(array, "UInt64Array")?;
            Ok(Value::Number(arr.value(row).into()))
        }

        DataType::Float32 => {
            let arr = downcast::<arrow::array::Float32Array>(array, "Float32Array")?;
            let val = f64::from(arr.value(row));
            Ok(serde_json::Number::from_f64(val).map_or(Value::Null, Value::Number))
        }

        DataType::Float64 => {
            let arr = downcast::<Float64Array>(array, "Float64Array")?;
            let val = arr.value(row);
            Ok(serde_json::Number::from_f64(val).map_or(Value::Null, Value::Number))
        }

        DataType::Utf8 => {
            let arr = downcast::<StringArray>(array, "StringArray")?;
            Ok(Value::String(arr.value(row).to_string()))
        }

        DataType::LargeUtf8 => {
            let arr = downcast::<arrow::array::LargeStringArray>(array, "LargeStringArray")?;
            Ok(Value::String(arr.value(row).to_string()))
        }

        DataType::Timestamp(unit, tz) => {
            let naive = match unit {
                TimeUnit::Second => downcast::<TimestampSecondArray>(array, "TimestampSecondArray")?
                    .value_as_datetime(row),
                TimeUnit::Millisecond => {
                    downcast::<TimestampMillisecondArray>(array, "TimestampMillisecondArray")?
                        .value_as_datetime(row)
                }
                TimeUnit::Microsecond => {
                    downcast::<TimestampMicrosecondArray>(array, "TimestampMicrosecondArray")?
                        .value_as_datetime(row)
                }
                TimeUnit::Nanosecond => {
                    downcast::<TimestampNanosecondArray>(array, "TimestampNanosecondArray")?
                        .value_as_datetime(row)
                }
            }
            .ok_or_else(|| Error::serialization("Timestamp out of range"))?;
            Ok(Value::String(format_timestamp(naive, tz.as_deref())))
        }

        DataType::Date32 => {
            let arr = downcast::<Date32Array>(array, "Date32Array")?;
            let date = arr
                .value_as_date(row)
                .ok_or_else(|| Error::serialization("Date out of range"))?;
            Ok(Value::String(date.format("%Y-%m-%d").to_string()))
        }

        DataType::Date64 => {
            let arr = downcast::<Date64Array>(array, "Date64Array")?;
            let date = arr
                .value_as_date(row)
                .ok_or_else(|| Error::serialization("Date out of range"))?;
            Ok(Value::String(date.format("%Y-%m-%d").to_string()))
        }

        DataType::List(_) => {
            let arr = downcast::<ListArray>(array, "ListArray")?;
            let values = arr.value(row);
            let mut items = Vec::with_capacity(values.len());
            for i in 0..values.len() {
                items.push(array_value_to_json(values.as_ref(), i)?);
            }
            Ok(Value::Array(items))
        }

        DataType::Struct(_) => {
            let arr = downcast::<StructArray>(array, "StructArray")?;
            let mut obj = serde_json::Map::new();
            for (i, field) in arr.fields().iter().enumerate() {
                let val = array_value_to_json(arr.column(i).as_ref(), row)?;
                obj.insert(field.name().clone(), val);
            }
            Ok(Value::Object(obj))
        }

        // Decimals, dictionaries, binary, durations...
        other => array_value_to_string(array, row)
            .map(Value::String)
            .map_err(|e| Error::serialization(format!("Cannot represent {other} as JSON: {e}"))),
    }
}

/// Render a UTC-normalized timestamp, in its own zone when it has one
fn format_timestamp(naive: NaiveDateTime, tz: Option<&str>) -> String {
    match tz {
        None => naive.format(DATETIME_FORMAT).to_string(),
        Some(tz) => match tz.parse::<Tz>() {
            Ok(tz) => tz
                .from_utc_datetime(&naive)
                .format(DATETIME_TZ_FORMAT)
                .to_string(),
            Err(_) => naive.and_utc().format(DATETIME_TZ_FORMAT).to_string(),
        },
    }
}

/// Text form of a JSON scalar, as used in object keys
///
/// Strings are taken verbatim, numbers and booleans use their JSON text.
/// `null` has no text form.
pub fn json_to_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        other => Some(other.to_string()),
    }
}
