//! Canonical trade entity and the derived risk/liquidity flags

use chrono::{DateTime, NaiveDate, Timelike, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Untyped record exactly as delivered by the feed
pub type RawRecord = serde_json::Map<String, Value>;

/// Trades at or above this USDT value are whales
pub const WHALE_VALUE_USDT: f64 = 500.0;

/// Trades at or above this share count are whales
pub const WHALE_SHARES: f64 = 1_000_000.0;

/// Anomaly-detector levels that count as an anomaly
pub const ANOMALY_LEVELS: [&str; 2] = ["MEDIUM", "HIGH"];

/// Epoch unit applied uniformly to every `timestamp_raw` in one snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimeUnit {
    Seconds,
    Milliseconds,
}

impl TimeUnit {
    /// Values above this are only plausible as milliseconds
    pub const MILLIS_THRESHOLD: f64 = 1e10;

    /// Decide the unit for a whole column: milliseconds if any value exceeds the threshold
    pub fn infer<I>(raw_values: I) -> Self
    where
        I: IntoIterator<Item = f64>,
    {
        if raw_values.into_iter().any(|v| v > Self::MILLIS_THRESHOLD) {
            TimeUnit::Milliseconds
        } else {
            TimeUnit::Seconds
        }
    }

    /// Convert a raw epoch value into a UTC instant
    pub fn to_instant(&self, raw: f64) -> Option<DateTime<Utc>> {
        if !raw.is_finite() {
            return None;
        }
        let millis = match self {
            TimeUnit::Seconds => raw * 1000.0,
            TimeUnit::Milliseconds => raw,
        };
        if millis.abs() > i64::MAX as f64 {
            return None;
        }
        DateTime::<Utc>::from_timestamp_millis(millis.round() as i64)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TimeUnit::Seconds => "s",
            TimeUnit::Milliseconds => "ms",
        }
    }
}

/// Source fields of a trade after coercion, before flags are derived
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TradeFields {
    pub timestamp_raw: Option<f64>,
    pub asset: Option<String>,
    pub shares: Option<f64>,
    pub price_qubic: Option<f64>,
    pub qubic_price_usd: Option<f64>,
    pub trade_value_qub: Option<f64>,
    pub trade_value_usdt: Option<f64>,
    pub side: Option<String>,
    pub direction: Option<String>,
    pub risk_score: Option<f64>,
    pub risk_score_anomaly: Option<f64>,
    pub risk_level: Option<String>,
    pub risk_level_anomaly: Option<String>,
    pub risk_tags_anomaly: Option<String>,
    pub txid: Option<String>,
    pub extra: BTreeMap<String, Value>,
}

/// One normalized trade. Built once by the normalizer and never mutated.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Trade {
    pub timestamp_raw: Option<f64>,
    pub timestamp: Option<DateTime<Utc>>,
    pub asset: Option<String>,
    pub shares: Option<f64>,
    pub price_qubic: Option<f64>,
    pub qubic_price_usd: Option<f64>,
    pub trade_value_qub: Option<f64>,
    pub trade_value_usdt: Option<f64>,
    pub side: Option<String>,
    pub direction: Option<String>,
    pub risk_score: Option<f64>,
    pub risk_score_anomaly: Option<f64>,
    pub risk_level: Option<String>,
    pub risk_level_anomaly: Option<String>,
    pub risk_tags_anomaly: Option<String>,
    pub txid: Option<String>,

    pub is_whale_value: bool,
    pub is_whale_shares: bool,
    pub is_whale: bool,
    pub has_anomaly: bool,
    pub effective_risk: Option<String>,
    pub date: Option<NaiveDate>,
    pub hour_bucket: Option<DateTime<Utc>>,

    /// Columns the feed sent that nothing downstream interprets
    #[serde(skip)]
    pub extra: BTreeMap<String, Value>,
}

impl Trade {
    /// Build a trade and compute every derived attribute
    pub fn derive(fields: TradeFields, unit: TimeUnit) -> Self {
        let timestamp = fields.timestamp_raw.and_then(|raw| unit.to_instant(raw));

        let is_whale_value = or_zero(fields.trade_value_usdt) >= WHALE_VALUE_USDT;
        let is_whale_shares = or_zero(fields.shares) >= WHALE_SHARES;

        let has_anomaly = fields
            .risk_level_anomaly
            .as_deref()
            .map_or(false, |level| ANOMALY_LEVELS.contains(&level));

        let effective_risk = match fields.risk_level_anomaly.as_deref() {
            Some(level) if !level.is_empty() => Some(level.to_string()),
            _ => fields.risk_level.clone(),
        };

        Self {
            timestamp_raw: fields.timestamp_raw,
            timestamp,
            asset: fields.asset,
            shares: fields.shares,
            price_qubic: fields.price_qubic,
            qubic_price_usd: fields.qubic_price_usd,
            trade_value_qub: fields.trade_value_qub,
            trade_value_usdt: fields.trade_value_usdt,
            side: fields.side,
            direction: fields.direction,
            risk_score: fields.risk_score,
            risk_score_anomaly: fields.risk_score_anomaly,
            risk_level: fields.risk_level,
            risk_level_anomaly: fields.risk_level_anomaly,
            risk_tags_anomaly: fields.risk_tags_anomaly,
            txid: fields.txid,
            is_whale_value,
            is_whale_shares,
            is_whale: is_whale_value || is_whale_shares,
            has_anomaly,
            effective_risk,
            date: timestamp.map(|ts| ts.date_naive()),
            hour_bucket: timestamp.and_then(floor_to_hour),
            extra: fields.extra,
        }
    }

    /// USDT value with a missing value counted as zero
    pub fn value_usdt_or_zero(&self) -> f64 {
        or_zero(self.trade_value_usdt)
    }

    /// Upper-cased effective risk; empty string when unlabelled
    pub fn risk_label(&self) -> String {
        self.effective_risk
            .as_deref()
            .map(str::to_uppercase)
            .unwrap_or_default()
    }

    pub fn asset_is(&self, asset: &str) -> bool {
        self.asset.as_deref() == Some(asset)
    }
}

/// Single null-as-zero rule for numeric comparisons and sums
fn or_zero(value: Option<f64>) -> f64 {
    value.unwrap_or(0.0)
}

fn floor_to_hour(ts: DateTime<Utc>) -> Option<DateTime<Utc>> {
    ts.with_minute(0)?.with_second(0)?.with_nanosecond(0)
}
