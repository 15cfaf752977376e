//! Volume and count summaries: per asset, per time bucket, per day

use crate::snapshot_core::trade::Trade;
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use std::borrow::Borrow;
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BucketInterval {
    Min15,
    Hour1,
}

impl BucketInterval {
    pub fn as_str(&self) -> &'static str {
        match self {
            BucketInterval::Min15 => "15m",
            BucketInterval::Hour1 => "1h",
        }
    }

    pub fn duration_secs(&self) -> i64 {
        match self {
            BucketInterval::Min15 => 15 * 60,
            BucketInterval::Hour1 => 60 * 60,
        }
    }

    /// Epoch-aligned start of the bucket containing `ts`
    pub fn floor(&self, ts: DateTime<Utc>) -> Option<DateTime<Utc>> {
        let width = self.duration_secs();
        DateTime::<Utc>::from_timestamp(ts.timestamp().div_euclid(width) * width, 0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssetVolume {
    pub asset: String,
    pub volume_usdt: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssetCount {
    pub asset: String,
    pub trades: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VolumeBucket {
    pub start: DateTime<Utc>,
    pub volume_usdt: f64,
    pub trades: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyVolume {
    pub date: NaiveDate,
    pub volume_usdt: f64,
}

/// Latest day against the day before it
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum VolumeChange {
    Percent(f64),
    /// Fewer than two days, or the previous day had zero volume
    NoPriorDay,
}

impl VolumeChange {
    pub fn percent(&self) -> Option<f64> {
        match self {
            VolumeChange::Percent(p) => Some(*p),
            VolumeChange::NoPriorDay => None,
        }
    }
}

impl std::fmt::Display for VolumeChange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VolumeChange::Percent(p) => {
                let arrow = if *p >= 0.0 { "▲" } else { "▼" };
                write!(f, "{} {:+.1}% vs previous day", arrow, p)
            }
            VolumeChange::NoPriorDay => write!(f, "No prior day for comparison"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DayOverDay {
    /// Ascending by date
    pub daily: Vec<DailyVolume>,
    pub change: VolumeChange,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverviewKpis {
    pub total_trades: usize,
    pub total_volume_usdt: f64,
    pub unique_assets: usize,
    pub whale_share_pct: f64,
    pub anomaly_share_pct: f64,
    pub volume_change: VolumeChange,
}

/// Summed USDT volume per asset, largest first
pub fn volume_by_asset<T: Borrow<Trade>>(trades: &[T]) -> Vec<AssetVolume> {
    let mut totals: BTreeMap<&str, f64> = BTreeMap::new();
    for trade in trades.iter().map(Borrow::<Trade>::borrow) {
        if let Some(asset) = trade.asset.as_deref() {
            *totals.entry(asset).or_default() += trade.value_usdt_or_zero();
        }
    }

    let mut volumes: Vec<AssetVolume> = totals
        .into_iter()
        .map(|(asset, volume_usdt)| AssetVolume {
            asset: asset.to_string(),
            volume_usdt,
        })
        .collect();
    volumes.sort_by(|a, b| b.volume_usdt.total_cmp(&a.volume_usdt));
    volumes
}

/// Number of trades per asset, most active first
pub fn trade_count_by_asset<T: Borrow<Trade>>(trades: &[T]) -> Vec<AssetCount> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for trade in trades.iter().map(Borrow::<Trade>::borrow) {
        if let Some(asset) = trade.asset.as_deref() {
            *counts.entry(asset).or_default() += 1;
        }
    }

    let mut counts: Vec<AssetCount> = counts
        .into_iter()
        .map(|(asset, trades)| AssetCount {
            asset: asset.to_string(),
            trades,
        })
        .collect();
    counts.sort_by(|a, b| b.trades.cmp(&a.trades));
    counts
}

/// Fifteen-minute volume series
pub fn volume_timeline<T: Borrow<Trade>>(trades: &[T]) -> Vec<VolumeBucket> {
    volume_by_interval(trades, BucketInterval::Min15)
}

/// Sparse volume series, ascending by bucket start; empty buckets are not emitted
pub fn volume_by_interval<T: Borrow<Trade>>(
    trades: &[T],
    interval: BucketInterval,
) -> Vec<VolumeBucket> {
    let mut buckets: BTreeMap<DateTime<Utc>, (f64, usize)> = BTreeMap::new();
    for trade in trades.iter().map(Borrow::<Trade>::borrow) {
        let Some(start) = trade.timestamp.and_then(|ts| interval.floor(ts)) else {
            continue;
        };
        let bucket = buckets.entry(start).or_insert((0.0, 0));
        bucket.0 += trade.value_usdt_or_zero();
        bucket.1 += 1;
    }

    buckets
        .into_iter()
        .map(|(start, (volume_usdt, trades))| VolumeBucket {
            start,
            volume_usdt,
            trades,
        })
        .collect()
}

/// Daily volume and the change of the latest day against the one before it
pub fn day_over_day<T: Borrow<Trade>>(trades: &[T]) -> DayOverDay {
    let mut per_day: BTreeMap<NaiveDate, f64> = BTreeMap::new();
    for trade in trades.iter().map(Borrow::<Trade>::borrow) {
        if let Some(date) = trade.date {
            *per_day.entry(date).or_default() += trade.value_usdt_or_zero();
        }
    }

    let daily: Vec<DailyVolume> = per_day
        .into_iter()
        .map(|(date, volume_usdt)| DailyVolume { date, volume_usdt })
        .collect();

    let change = match daily.as_slice() {
        [.., previous, latest] if previous.volume_usdt > 0.0 => VolumeChange::Percent(
            (latest.volume_usdt - previous.volume_usdt) / previous.volume_usdt * 100.0,
        ),
        _ => VolumeChange::NoPriorDay,
    };

    DayOverDay { daily, change }
}

/// Headline numbers for the selected window
pub fn overview_kpis<T: Borrow<Trade>>(trades: &[T]) -> OverviewKpis {
    let total_trades = trades.len();
    let mut total_volume_usdt = 0.0;
    let mut whales = 0usize;
    let mut anomalies = 0usize;
    let mut assets = BTreeSet::new();

    for trade in trades.iter().map(Borrow::<Trade>::borrow) {
        total_volume_usdt += trade.value_usdt_or_zero();
        whales += usize::from(trade.is_whale);
        anomalies += usize::from(trade.has_anomaly);
        if let Some(asset) = trade.asset.as_deref() {
            assets.insert(asset);
        }
    }

    OverviewKpis {
        total_trades,
        total_volume_usdt,
        unique_assets: assets.len(),
        whale_share_pct: share_pct(whales, total_trades),
        anomaly_share_pct: share_pct(anomalies, total_trades),
        volume_change: day_over_day(trades).change,
    }
}

/// `part / whole * 100`, zero for an empty whole
pub(crate) fn share_pct(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}
