//! Parquet fixtures shared by unit tests

use arrow::array::{ArrayRef, Float64Array, Int64Array, StringArray, TimestampMicrosecondArray};
use arrow::datatypes::{DataType, Field, Schema, TimeUnit};
use arrow::record_batch::RecordBatch;
use bytes::Bytes;
use chrono::NaiveDateTime;
use parquet::arrow::ArrowWriter;
use std::sync::Arc;

/// Microseconds since the epoch for `YYYY-MM-DD HH:MM:SS`
pub(crate) fn micros(timestamp: &str) -> i64 {
    NaiveDateTime::parse_from_str(timestamp, "%Y-%m-%d %H:%M:%S")
        .unwrap()
        .and_utc()
        .timestamp_micros()
}

/// A taxi-trip batch with one row per `(vendor, pickup)` pair
pub(crate) fn trip_batch(rows: &[(i64, &str)]) -> RecordBatch {
    let schema = Arc::new(Schema::new(vec![
        Field::new("VendorID", DataType::Int64, true),
        Field::new(
            "tpep_pickup_datetime",
            DataType::Timestamp(TimeUnit::Microsecond, None),
            true,
        ),
        Field::new("fare_amount", DataType::Float64, true),
        Field::new("store_and_fwd_flag", DataType::Utf8, true),
    ]));

    let vendors: Vec<i64> = rows.iter().map(|(v, _)| *v).collect();
    let pickups: Vec<i64> = rows.iter().map(|(_, t)| micros(t)).collect();
    let fares: Vec<f64> = (0..rows.len()).map(|i| 10.5 + i as f64).collect();
    let flags: Vec<&str> = rows.iter().map(|_| "N").collect();

    let columns: Vec<ArrayRef> = vec![
        Arc::new(Int64Array::from(vendors)),
        Arc::new(TimestampMicrosecondArray::from(pickups)),
        Arc::new(Float64Array::from(fares)),
        Arc::new(StringArray::from(flags)),
    ];

    RecordBatch::try_new(schema, columns).unwrap()
}

/// Encode batches as a parquet file
pub(crate) fn to_parquet(batches: &[RecordBatch]) -> Bytes {
    let mut buf = Vec::new();
    {
        let mut writer = ArrowWriter::try_new(&mut buf, batches[0].schema(), None).unwrap();
        for batch in batches {
            writer.write(batch).unwrap();
        }
        writer.close().unwrap();
    }
    Bytes::from(buf)
}

/// Parquet file of taxi trips
pub(crate) fn trip_parquet(rows: &[(i64, &str)]) -> Bytes {
    to_parquet(&[trip_batch(rows)])
}
