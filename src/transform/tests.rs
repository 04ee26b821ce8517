//! Tests for transform module

use super::*;
use crate::decode::DecodedTable;
use crate::test_support::trip_batch;
use arrow::array::{ArrayRef, Int64Array};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use pretty_assertions::assert_eq;
use serde_json::json;
use std::sync::Arc;
use test_case::test_case;

fn table(rows: &[(i64, &str)]) -> DecodedTable {
    let batch = trip_batch(rows);
    DecodedTable::new("nyc_taxi_files/jan.parquet", batch.schema(), vec![batch])
}

#[test_case("1", "2024-01-01 10:00:00", "nyc_taxi_record/trip_1_2024-01-01_10-00-00.json" ; "scenario row one")]
#[test_case("2", "2024-01-01 11:30:00", "nyc_taxi_record/trip_2_2024-01-01_11-30-00.json" ; "scenario row two")]
#[test_case("1", "2024-01-01 10:00:00.250", "nyc_taxi_record/trip_1_2024-01-01_10-00-00.250.json" ; "fractional seconds")]
#[test_case("1", "2024-01-01 10:00:00+02:00", "nyc_taxi_record/trip_1_2024-01-01_10-00-00+02-00.json" ; "offset suffix")]
#[test_case("7", "2024-01-01", "nyc_taxi_record/trip_7_2024-01-01.json" ; "date only")]
fn test_object_key(vendor: &str, pickup: &str, expected: &str) {
    let transformer = RecordTransformer::default();
    assert_eq!(transformer.object_key(vendor, pickup), expected);
}

#[test]
fn test_sanitize_timestamp() {
    assert_eq!(sanitize_timestamp("2024-01-01 10:00:00"), "2024-01-01_10-00-00");
    assert_eq!(sanitize_timestamp("a b:c  d"), "a_b-c__d");
}

#[test]
fn test_custom_prefix() {
    let transformer = RecordTransformer::new(NamingConfig {
        prefix: "records/2024/".into(),
        ..NamingConfig::default()
    });
    assert_eq!(
        transformer.object_key("2", "2024-01-01 11:30:00"),
        "records/2024/trip_2_2024-01-01_11-30-00.json"
    );
}

#[test]
fn test_transform_row() {
    let table = table(&[(1, "2024-01-01 10:00:00"), (2, "2024-01-01 11:30:00")]);
    let transformer = RecordTransformer::default();

    let docs: Vec<OutputDocument> = table
        .rows()
        .map(|r| transformer.transform(&r).unwrap())
        .collect();

    assert_eq!(docs[0].key, "nyc_taxi_record/trip_1_2024-01-01_10-00-00.json");
    assert_eq!(docs[1].key, "nyc_taxi_record/trip_2_2024-01-01_11-30-00.json");

    let payload: serde_json::Value = serde_json::from_slice(&docs[1].payload).unwrap();
    assert_eq!(
        payload,
        json!({
            "VendorID": 2,
            "tpep_pickup_datetime": "2024-01-01 11:30:00",
            "fare_amount": 11.5,
            "store_and_fwd_flag": "N"
        })
    );
}

#[test]
fn test_payload_roundtrips_row_fields() {
    let table = table(&[(1, "2024-03-05 07:08:09")]);
    let record = table.rows().next().unwrap();
    let doc = RecordTransformer::default().transform(&record).unwrap();

    let decoded: serde_json::Map<String, serde_json::Value> =
        serde_json::from_slice(&doc.payload).unwrap();
    assert_eq!(decoded, record.to_document().unwrap());
}

#[test]
fn test_same_vendor_and_pickup_collide() {
    let table = table(&[(1, "2024-01-01 10:00:00"), (1, "2024-01-01 10:00:00")]);
    let transformer = RecordTransformer::default();
    let keys: Vec<String> = table
        .rows()
        .map(|r| transformer.key_for(&r).unwrap())
        .collect();
    assert_eq!(keys[0], keys[1]);
}

#[test]
fn test_missing_pickup_field() {
    let schema = Arc::new(Schema::new(vec![Field::new("VendorID", DataType::Int64, false)]));
    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![Arc::new(Int64Array::from(vec![1])) as ArrayRef],
    )
    .unwrap();
    let table = DecodedTable::new("a.parquet", schema, vec![batch]);
    let record = table.rows().next().unwrap();

    let err = RecordTransformer::default().transform(&record).unwrap_err();
    assert!(matches!(err, Error::MissingField { ref field } if field == "tpep_pickup_datetime"));
}
