//! Tests for decode module

use super::*;
use crate::error::Error;
use crate::store::ReadHandle;
use crate::test_support::{micros, to_parquet, trip_batch, trip_parquet};
use arrow::array::{
    ArrayRef, Date32Array, Decimal128Array, Float64Array, Int64Array, ListArray, StringArray,
    StructArray, TimestampMicrosecondArray, TimestampSecondArray,
};
use arrow::datatypes::{DataType, Field, Int32Type};
use bytes::Bytes;
use pretty_assertions::assert_eq;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn decoder() -> ParquetDecoder {
    ParquetDecoder::new(Duration::from_secs(5)).unwrap()
}

// ============================================================================
// Value Conversion Tests
// ============================================================================

#[test]
fn test_convert_scalars() {
    let ints = Int64Array::from(vec![Some(2), None]);
    assert_eq!(array_value_to_json(&ints, 0).unwrap(), json!(2));
    assert_eq!(array_value_to_json(&ints, 1).unwrap(), json!(null));

    let floats = Float64Array::from(vec![12.5, f64::NAN]);
    assert_eq!(array_value_to_json(&floats, 0).unwrap(), json!(12.5));
    assert_eq!(array_value_to_json(&floats, 1).unwrap(), json!(null));

    let strings = StringArray::from(vec!["N"]);
    assert_eq!(array_value_to_json(&strings, 0).unwrap(), json!("N"));
}

#[test]
fn test_convert_naive_timestamp() {
    let ts = TimestampMicrosecondArray::from(vec![
        micros("2024-01-01 10:00:00"),
        micros("2024-01-01 11:30:00") + 250_000,
    ]);
    assert_eq!(
        array_value_to_json(&ts, 0).unwrap(),
        json!("2024-01-01 10:00:00")
    );
    assert_eq!(
        array_value_to_json(&ts, 1).unwrap(),
        json!("2024-01-01 11:30:00.250")
    );
}

#[test]
fn test_convert_offset_timestamp() {
    // 2024-01-01 10:00:00 UTC
    let ts = TimestampSecondArray::from(vec![1_704_103_200]).with_timezone("+02:00");
    assert_eq!(
        array_value_to_json(&ts, 0).unwrap(),
        json!("2024-01-01 12:00:00+02:00")
    );
}

#[test]
fn test_convert_date() {
    // 19723 days after the epoch
    let dates = Date32Array::from(vec![19_723]);
    assert_eq!(array_value_to_json(&dates, 0).unwrap(), json!("2024-01-01"));
}

#[test]
fn test_convert_nested() {
    let list = ListArray::from_iter_primitive::<Int32Type, _, _>(vec![Some(vec![
        Some(1),
        None,
        Some(3),
    ])]);
    assert_eq!(array_value_to_json(&list, 0).unwrap(), json!([1, null, 3]));

    let structs = StructArray::from(vec![
        (
            Arc::new(Field::new("zone", DataType::Utf8, true)),
            Arc::new(StringArray::from(vec!["JFK"])) as ArrayRef,
        ),
        (
            Arc::new(Field::new("id", DataType::Int64, true)),
            Arc::new(Int64Array::from(vec![132])) as ArrayRef,
        ),
    ]);
    assert_eq!(
        array_value_to_json(&structs, 0).unwrap(),
        json!({"zone": "JFK", "id": 132})
    );
}

#[test]
fn test_convert_fallback_display() {
    let decimals = Decimal128Array::from(vec![1250])
        .with_precision_and_scale(10, 2)
        .unwrap();
    assert_eq!(array_value_to_json(&decimals, 0).unwrap(), json!("12.50"));
}

#[test]
fn test_json_to_text() {
    assert_eq!(json_to_text(&json!("2024-01-01 10:00:00")).as_deref(), Some("2024-01-01 10:00:00"));
    assert_eq!(json_to_text(&json!(1)).as_deref(), Some("1"));
    assert_eq!(json_to_text(&json!(1.5)).as_deref(), Some("1.5"));
    assert_eq!(json_to_text(&json!(true)).as_deref(), Some("true"));
    assert_eq!(json_to_text(&json!(null)), None);
}

// ============================================================================
// DecodedTable / SourceRecord Tests
// ============================================================================

#[test]
fn test_rows_span_batches() {
    let first = trip_batch(&[(1, "2024-01-01 10:00:00"), (2, "2024-01-01 11:30:00")]);
    let second = trip_batch(&[(1, "2024-01-02 08:15:00")]);
    let table = DecodedTable::new("a.parquet", first.schema(), vec![first, second]);

    assert_eq!(table.num_rows(), 3);
    assert!(!table.is_empty());
    assert_eq!(
        table.column_names(),
        vec!["VendorID", "tpep_pickup_datetime", "fare_amount", "store_and_fwd_flag"]
    );

    let rows: Vec<(usize, String)> = table
        .rows()
        .map(|r| (r.index(), r.text("tpep_pickup_datetime").unwrap()))
        .collect();
    assert_eq!(
        rows,
        vec![
            (0, "2024-01-01 10:00:00".to_string()),
            (1, "2024-01-01 11:30:00".to_string()),
            (2, "2024-01-02 08:15:00".to_string()),
        ]
    );
}

#[test]
fn test_record_fields() {
    let batch = trip_batch(&[(2, "2024-01-01 11:30:00")]);
    let table = DecodedTable::new("a.parquet", batch.schema(), vec![batch]);
    let record = table.rows().next().unwrap();

    assert!(record.has_field("VendorID"));
    assert!(!record.has_field("vendor_id"));
    assert_eq!(record.text("VendorID").unwrap(), "2");
    assert_eq!(record.value("missing").unwrap(), None);

    let err = record.text("missing").unwrap_err();
    assert!(matches!(err, Error::MissingField { ref field } if field == "missing"));

    let document = record.to_document().unwrap();
    let keys: Vec<&String> = document.keys().collect();
    assert_eq!(
        keys,
        vec!["VendorID", "tpep_pickup_datetime", "fare_amount", "store_and_fwd_flag"]
    );
    assert_eq!(document["fare_amount"], json!(10.5));
}

#[test]
fn test_null_structural_field_is_missing() {
    let schema = Arc::new(arrow::datatypes::Schema::new(vec![Field::new(
        "VendorID",
        DataType::Int64,
        true,
    )]));
    let batch = arrow::record_batch::RecordBatch::try_new(
        schema.clone(),
        vec![Arc::new(Int64Array::from(vec![None::<i64>])) as ArrayRef],
    )
    .unwrap();
    let table = DecodedTable::new("a.parquet", schema, vec![batch]);
    let record = table.rows().next().unwrap();

    assert!(matches!(
        record.text("VendorID"),
        Err(Error::MissingField { .. })
    ));
}

// ============================================================================
// ParquetDecoder Tests
// ============================================================================

#[tokio::test]
async fn test_decode_inline() {
    let data = trip_parquet(&[(1, "2024-01-01 10:00:00"), (2, "2024-01-01 11:30:00")]);
    let table = decoder()
        .decode("nyc_taxi_files/jan.parquet", ReadHandle::Inline(data))
        .await
        .unwrap();

    assert_eq!(table.object(), "nyc_taxi_files/jan.parquet");
    assert_eq!(table.num_rows(), 2);
}

#[tokio::test]
async fn test_decode_small_batches() {
    let data = to_parquet(&[trip_batch(&[
        (1, "2024-01-01 10:00:00"),
        (2, "2024-01-01 11:30:00"),
        (1, "2024-01-01 12:45:00"),
    ])]);
    let table = decoder()
        .with_batch_size(2)
        .decode_bytes("a.parquet", data)
        .unwrap();

    assert_eq!(table.num_rows(), 3);
    assert_eq!(table.rows().last().unwrap().index(), 2);
}

#[tokio::test]
async fn test_decode_garbage_is_decode_error() {
    let err = decoder()
        .decode(
            "nyc_taxi_files/broken.parquet",
            ReadHandle::Inline(Bytes::from_static(b"definitely not parquet")),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Decode { ref object, .. } if object == "nyc_taxi_files/broken.parquet"));
    assert!(!err.is_fatal());
}

#[tokio::test]
async fn test_decode_presigned_url() {
    let server = MockServer::start().await;
    let data = trip_parquet(&[(1, "2024-01-01 10:00:00")]);

    Mock::given(method("GET"))
        .and(path("/bronze/nyc_taxi_files/jan.parquet"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(data.to_vec()))
        .expect(1)
        .mount(&server)
        .await;

    let url = url::Url::parse(&format!(
        "{}/bronze/nyc_taxi_files/jan.parquet?X-Amz-Signature=abc",
        server.uri()
    ))
    .unwrap();

    let table = decoder()
        .decode("nyc_taxi_files/jan.parquet", ReadHandle::Presigned(url))
        .await
        .unwrap();
    assert_eq!(table.num_rows(), 1);
}

#[tokio::test]
async fn test_decode_presigned_url_expired() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;

    let url = url::Url::parse(&format!("{}/bronze/jan.parquet", server.uri())).unwrap();
    let err = decoder()
        .decode("jan.parquet", ReadHandle::Presigned(url))
        .await
        .unwrap_err();

    assert!(err.to_string().contains("HTTP 403"));
    assert!(matches!(err, Error::Decode { .. }));
}
