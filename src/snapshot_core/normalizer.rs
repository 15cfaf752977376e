//! Raw feed payload to canonical, timestamp-ordered trades
//!
//! The feed delivers either a bare JSON array of records or an object carrying
//! the array under `data` or `rows`. Field types drift between records, so every
//! field is coerced individually and failures degrade to `None`.

use super::trade::{RawRecord, TimeUnit, Trade, TradeFields};
use crate::error::SourceError;
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::cmp::Ordering;
use std::sync::Arc;

/// Wrapper keys checked in order when the payload is an object
const WRAPPER_KEYS: [&str; 2] = ["data", "rows"];

/// One complete, immutable canonical sequence produced from a single fetch
#[derive(Debug, Clone)]
pub struct Snapshot {
    trades: Arc<[Trade]>,
    fetched_at: DateTime<Utc>,
    time_unit: Option<TimeUnit>,
}

impl Snapshot {
    /// Normalize a decoded payload into a snapshot stamped with `fetched_at`
    pub fn from_payload(payload: &Value, fetched_at: DateTime<Utc>) -> Result<Self, SourceError> {
        let records = unwrap_records(payload)?;
        let (trades, time_unit) = normalize_records(records);
        Ok(Self {
            trades: trades.into(),
            fetched_at,
            time_unit,
        })
    }

    pub fn trades(&self) -> &[Trade] {
        &self.trades
    }

    pub fn fetched_at(&self) -> DateTime<Utc> {
        self.fetched_at
    }

    /// Unit decided for this snapshot; `None` when no record had a numeric timestamp
    pub fn time_unit(&self) -> Option<TimeUnit> {
        self.time_unit
    }

    pub fn len(&self) -> usize {
        self.trades.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trades.is_empty()
    }
}

/// Normalize a decoded payload into the canonical trade sequence
pub fn normalize(payload: &Value) -> Result<Vec<Trade>, SourceError> {
    let records = unwrap_records(payload)?;
    Ok(normalize_records(records).0)
}

/// Peel at most one `data`/`rows` wrapper off the payload
pub fn unwrap_records(payload: &Value) -> Result<&[Value], SourceError> {
    match payload {
        Value::Array(records) => Ok(records),
        Value::Object(map) => {
            let inner = WRAPPER_KEYS
                .iter()
                .find_map(|key| map.get(*key))
                .ok_or_else(|| {
                    SourceError::Malformed("object payload has no `data` or `rows` key".to_string())
                })?;
            match inner {
                Value::Array(records) => Ok(records),
                other => Err(SourceError::Malformed(format!(
                    "wrapped payload is {}, expected an array",
                    json_kind(other)
                ))),
            }
        }
        other => Err(SourceError::Malformed(format!(
            "payload is {}, expected an array or object",
            json_kind(other)
        ))),
    }
}

fn normalize_records(records: &[Value]) -> (Vec<Trade>, Option<TimeUnit>) {
    if records.is_empty() {
        log::debug!("Empty payload, nothing to normalize");
        return (Vec::new(), None);
    }

    let mut skipped = 0usize;
    let parsed: Vec<TradeFields> = records
        .iter()
        .filter_map(|value| match value {
            Value::Object(record) => Some(coerce_record(record)),
            other => {
                skipped += 1;
                log::warn!("Skipping non-object record ({})", json_kind(other));
                None
            }
        })
        .collect();

    // Single pre-pass: one unit for the whole column
    let numeric_timestamps: Vec<f64> = parsed.iter().filter_map(|f| f.timestamp_raw).collect();
    let time_unit = if numeric_timestamps.is_empty() {
        None
    } else {
        Some(TimeUnit::infer(numeric_timestamps.iter().copied()))
    };
    let unit = time_unit.unwrap_or(TimeUnit::Seconds);

    let mut trades: Vec<Trade> = parsed
        .into_iter()
        .map(|fields| Trade::derive(fields, unit))
        .collect();

    // Vec::sort_by is stable, so equal and missing timestamps keep feed order
    trades.sort_by(|a, b| newest_first(a.timestamp, b.timestamp));

    log::debug!(
        "Normalized {} trades ({} skipped, {} with timestamps, unit={})",
        trades.len(),
        skipped,
        numeric_timestamps.len(),
        unit.as_str()
    );

    (trades, time_unit)
}

/// Descending by instant, missing instants last
fn newest_first(a: Option<DateTime<Utc>>, b: Option<DateTime<Utc>>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => b.cmp(&a),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

fn coerce_record(record: &RawRecord) -> TradeFields {
    let mut fields = TradeFields::default();

    for (raw_key, value) in record {
        let key = raw_key.trim();
        match key {
            "timestamp_raw" => fields.timestamp_raw = coerce_f64(value),
            "asset" => fields.asset = coerce_string(value),
            "shares" => fields.shares = coerce_f64(value),
            "price_qubic" => fields.price_qubic = coerce_f64(value),
            "qubic_price_usd" => fields.qubic_price_usd = coerce_f64(value),
            "trade_value_qub" => fields.trade_value_qub = coerce_f64(value),
            "trade_value_usdt" => fields.trade_value_usdt = coerce_f64(value),
            "side" => fields.side = coerce_string(value),
            "direction" => fields.direction = coerce_string(value),
            "risk_score" => fields.risk_score = coerce_f64(value),
            "risk_score_anomaly" | "risk_score_anamoly" => {
                fields.risk_score_anomaly = coerce_f64(value)
            }
            "risk_level" => fields.risk_level = coerce_string(value),
            "risk_level_anomaly" | "risk_level_anamoly" => {
                fields.risk_level_anomaly = coerce_string(value)
            }
            "risk_tags_anomaly" | "risk_tags_anamoly" => {
                fields.risk_tags_anomaly = coerce_string(value)
            }
            "txid" => fields.txid = coerce_string(value),
            _ => {
                fields.extra.insert(key.to_string(), value.clone());
            }
        }
    }

    fields
}

/// Numbers pass through, numeric strings are parsed, everything else is `None`
fn coerce_f64(value: &Value) -> Option<f64> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|v| v.is_finite())
}

/// Strings are trimmed, scalars are stringified, null and containers are `None`
fn coerce_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_unwraps_data_and_rows() {
        let bare = json!([{"asset": "QX"}]);
        let data = json!({"data": [{"asset": "QX"}]});
        let rows = json!({"rows": [{"asset": "QX"}]});

        for payload in [bare, data, rows] {
            let trades = normalize(&payload).unwrap();
            assert_eq!(trades.len(), 1);
            assert_eq!(trades[0].asset.as_deref(), Some("QX"));
        }
    }

    #[test]
    fn test_unwraps_only_one_layer() {
        let nested = json!({"data": {"rows": [{"asset": "QX"}]}});
        assert!(normalize(&nested).unwrap_err().is_malformed());
    }

    #[test]
    fn test_malformed_payloads() {
        for payload in [json!("nope"), json!(42), json!(null), json!({"items": []})] {
            let err = normalize(&payload).unwrap_err();
            assert!(err.is_malformed(), "expected malformed for {}", payload);
        }
    }

    #[test]
    fn test_empty_payload() {
        let snapshot = Snapshot::from_payload(&json!({"data": []}), Utc::now()).unwrap();
        assert!(snapshot.is_empty());
        assert!(snapshot.time_unit().is_none());
    }

    #[test]
    fn test_keys_are_trimmed_and_values_coerced() {
        let payload = json!([{
            " asset ": "  QX ",
            "trade_value_usdt": "42.5",
            "shares ": "not a number",
            " direction": " Buy ",
            "risk_level_anamoly": " HIGH ",
            "note": "kept aside"
        }]);
        let trades = normalize(&payload).unwrap();
        let trade = &trades[0];

        assert_eq!(trade.asset.as_deref(), Some("QX"));
        assert_eq!(trade.trade_value_usdt, Some(42.5));
        assert_eq!(trade.shares, None);
        assert_eq!(trade.direction.as_deref(), Some("Buy"));
        assert_eq!(trade.risk_level_anomaly.as_deref(), Some("HIGH"));
        assert!(trade.has_anomaly);
        assert_eq!(trade.extra.get("note"), Some(&json!("kept aside")));
    }

    #[test]
    fn test_bad_timestamp_is_null_not_fatal() {
        let payload = json!([
            {"timestamp_raw": "garbage", "asset": "A"},
            {"timestamp_raw": 1_700_000_000, "asset": "B"}
        ]);
        let trades = normalize(&payload).unwrap();
        assert_eq!(trades.len(), 2);
        assert_eq!(trades[0].asset.as_deref(), Some("B"));
        assert!(trades[1].timestamp.is_none());
    }

    #[test]
    fn test_millisecond_inference_applies_to_whole_snapshot() {
        let payload = json!([
            {"timestamp_raw": 1_700_000_000_000i64, "asset": "ms"},
            {"timestamp_raw": 1_700_000_000, "asset": "small"}
        ]);
        let snapshot = Snapshot::from_payload(&payload, Utc::now()).unwrap();
        assert_eq!(snapshot.time_unit(), Some(TimeUnit::Milliseconds));

        let small = snapshot.trades().iter().find(|t| t.asset_is("small")).unwrap();
        // Read as milliseconds: about twenty days after the epoch
        assert_eq!(small.timestamp.unwrap().timestamp(), 1_700_000);
    }

    #[test]
    fn test_seconds_inference() {
        let payload = json!([{"timestamp_raw": 1_700_000_000}, {"timestamp_raw": "1700000060"}]);
        let snapshot = Snapshot::from_payload(&payload, Utc::now()).unwrap();
        assert_eq!(snapshot.time_unit(), Some(TimeUnit::Seconds));
        assert_eq!(snapshot.trades()[0].timestamp.unwrap().timestamp(), 1_700_000_060);
    }

    #[test]
    fn test_sorted_descending_stable_nulls_last() {
        let payload = json!([
            {"timestamp_raw": 100, "txid": "a"},
            {"txid": "null-1"},
            {"timestamp_raw": 300, "txid": "b"},
            {"timestamp_raw": 100, "txid": "c"},
            {"txid": "null-2"}
        ]);
        let order: Vec<String> = normalize(&payload)
            .unwrap()
            .into_iter()
            .map(|t| t.txid.unwrap())
            .collect();
        assert_eq!(order, vec!["b", "a", "c", "null-1", "null-2"]);
    }

    #[test]
    fn test_non_object_records_are_skipped() {
        let payload = json!([{"asset": "A"}, 7, "x", {"asset": "B"}]);
        assert_eq!(normalize(&payload).unwrap().len(), 2);
    }

    #[test]
    fn test_derived_fields_are_deterministic() {
        let payload = json!([{"timestamp_raw": 1_700_000_000, "trade_value_usdt": 600, "shares": 10}]);
        let first = normalize(&payload).unwrap();
        let second = normalize(&payload).unwrap();
        assert_eq!(first, second);
    }
}
