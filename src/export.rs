//! CSV export of a filtered trade sequence
//!
//! Format: one header row of canonical field names followed by any extra feed
//! columns in key order, then one row per trade in the sequence's current order.
//! Missing values are empty fields.

use crate::snapshot_core::Trade;
use chrono::{DateTime, NaiveDate, Utc};
use csv::Writer;
use serde_json::Value;
use std::borrow::Borrow;
use std::collections::BTreeSet;
use std::fs::File;
use std::io::Write;
use std::path::Path;

pub const CSV_HEADER: [&str; 23] = [
    "timestamp_raw",
    "timestamp",
    "asset",
    "shares",
    "price_qubic",
    "qubic_price_usd",
    "trade_value_qub",
    "trade_value_usdt",
    "side",
    "direction",
    "risk_score",
    "risk_score_anomaly",
    "risk_level",
    "risk_level_anomaly",
    "risk_tags_anomaly",
    "txid",
    "is_whale_value",
    "is_whale_shares",
    "is_whale",
    "has_anomaly",
    "effective_risk",
    "date",
    "hour_bucket",
];

#[derive(Debug)]
pub enum ExportError {
    Io(std::io::Error),
    Csv(csv::Error),
}

impl From<std::io::Error> for ExportError {
    fn from(err: std::io::Error) -> Self {
        ExportError::Io(err)
    }
}

impl From<csv::Error> for ExportError {
    fn from(err: csv::Error) -> Self {
        ExportError::Csv(err)
    }
}

impl std::fmt::Display for ExportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExportError::Io(e) => write!(f, "IO error: {}", e),
            ExportError::Csv(e) => write!(f, "CSV error: {}", e),
        }
    }
}

impl std::error::Error for ExportError {}

/// Write header plus one row per trade
pub fn write_csv<W: Write, T: Borrow<Trade>>(writer: W, trades: &[T]) -> Result<(), ExportError> {
    let extra_columns = extra_columns(trades);

    let mut writer = Writer::from_writer(writer);
    writer.write_record(CSV_HEADER.iter().copied().chain(extra_columns.iter().copied()))?;

    for trade in trades.iter().map(Borrow::<Trade>::borrow) {
        let extras = extra_columns
            .iter()
            .map(|key| trade.extra.get(*key).map(extra_value).unwrap_or_default());
        writer.write_record(trade_row(trade).into_iter().chain(extras))?;
    }

    writer.flush()?;
    Ok(())
}

/// UTF-8 CSV bytes, ready to hand to a download
pub fn to_csv_bytes<T: Borrow<Trade>>(trades: &[T]) -> Result<Vec<u8>, ExportError> {
    let mut buf = Vec::new();
    write_csv(&mut buf, trades)?;
    Ok(buf)
}

pub fn write_csv_file<T: Borrow<Trade>>(path: &Path, trades: &[T]) -> Result<(), ExportError> {
    let file = File::create(path)?;
    write_csv(file, trades)?;
    log::info!("📝 Exported {} trades to {}", trades.len(), path.display());
    Ok(())
}

/// Union of passthrough keys, sorted; names shadowing a canonical column are dropped
fn extra_columns<T: Borrow<Trade>>(trades: &[T]) -> Vec<&str> {
    let keys: BTreeSet<&str> = trades
        .iter()
        .flat_map(|t| t.borrow().extra.keys().map(String::as_str))
        .collect();

    keys.into_iter()
        .filter(|key| {
            let shadowed = CSV_HEADER.contains(key);
            if shadowed {
                log::debug!("Extra column {} shadows a canonical field, not exported", key);
            }
            !shadowed
        })
        .collect()
}

fn extra_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => flag(*b),
        other => other.to_string(),
    }
}

fn trade_row(t: &Trade) -> [String; 23] {
    [
        num(t.timestamp_raw),
        instant(t.timestamp),
        text(&t.asset),
        num(t.shares),
        num(t.price_qubic),
        num(t.qubic_price_usd),
        num(t.trade_value_qub),
        num(t.trade_value_usdt),
        text(&t.side),
        text(&t.direction),
        num(t.risk_score),
        num(t.risk_score_anomaly),
        text(&t.risk_level),
        text(&t.risk_level_anomaly),
        text(&t.risk_tags_anomaly),
        text(&t.txid),
        flag(t.is_whale_value),
        flag(t.is_whale_shares),
        flag(t.is_whale),
        flag(t.has_anomaly),
        text(&t.effective_risk),
        date(t.date),
        instant(t.hour_bucket),
    ]
}

/// Shortest representation that parses back to the same f64
fn num(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn text(value: &Option<String>) -> String {
    value.clone().unwrap_or_default()
}

fn flag(value: bool) -> String {
    if value { "True" } else { "False" }.to_string()
}

fn instant(value: Option<DateTime<Utc>>) -> String {
    value
        .map(|ts| ts.format("%Y-%m-%d %H:%M:%S%.f%:z").to_string())
        .unwrap_or_default()
}

fn date(value: Option<NaiveDate>) -> String {
    value.map(|d| d.format("%Y-%m-%d").to_string()).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot_core::{TimeUnit, TradeFields};
    use serde_json::json;

    fn sample() -> Trade {
        Trade::derive(
            TradeFields {
                timestamp_raw: Some(1_700_000_000_250.0),
                asset: Some("QX".to_string()),
                trade_value_usdt: Some(600.0),
                shares: Some(10.0),
                risk_level: Some("LOW".to_string()),
                risk_level_anomaly: Some("HIGH".to_string()),
                risk_tags_anomaly: Some("wash, burst".to_string()),
                ..Default::default()
            },
            TimeUnit::Milliseconds,
        )
    }

    #[test]
    fn test_header_and_row() {
        let bytes = to_csv_bytes(&[sample()]).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        let mut lines = text.lines();

        assert_eq!(lines.next().unwrap(), CSV_HEADER.join(","));
        let row = lines.next().unwrap();
        assert!(row.starts_with("1700000000250,2023-11-14 22:13:20.250+00:00,QX,10,"));
        assert!(row.contains("\"wash, burst\""));
        assert!(row.ends_with("True,False,True,True,HIGH,2023-11-14,2023-11-14 22:00:00+00:00"));
        assert!(lines.next().is_none());
    }

    #[test]
    fn test_missing_values_are_empty_fields() {
        let bare = Trade::derive(TradeFields::default(), TimeUnit::Seconds);
        let text = String::from_utf8(to_csv_bytes(&[bare]).unwrap()).unwrap();
        let row = text.lines().nth(1).unwrap();
        assert_eq!(row, ",,,,,,,,,,,,,,,,False,False,False,False,,,");
    }

    #[test]
    fn test_extra_columns_follow_canonical_header() {
        let mut with_extras = TradeFields::default();
        with_extras.extra.insert("venue".to_string(), json!("qx-main"));
        with_extras.extra.insert("block".to_string(), json!(18_000_123));
        with_extras.extra.insert("is_whale".to_string(), json!(true));
        let mut partial = TradeFields::default();
        partial.extra.insert("venue".to_string(), json!(null));

        let trades = vec![
            Trade::derive(with_extras, TimeUnit::Seconds),
            Trade::derive(partial, TimeUnit::Seconds),
            Trade::derive(TradeFields::default(), TimeUnit::Seconds),
        ];
        let text = String::from_utf8(to_csv_bytes(&trades).unwrap()).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], format!("{},block,venue", CSV_HEADER.join(",")));
        assert!(lines[1].ends_with("False,False,False,False,,,,18000123,qx-main"));
        assert!(lines[2].ends_with(",,,,"));
        assert!(lines[3].ends_with(",,,,"));
    }

    #[test]
    fn test_empty_sequence_writes_header_only() {
        let empty: Vec<Trade> = Vec::new();
        let text = String::from_utf8(to_csv_bytes(&empty).unwrap()).unwrap();
        assert_eq!(text.lines().count(), 1);
    }
}
