//! Per-asset league table and single-asset drill-down

use super::distribution::{value_histogram, HistogramBucket, ValueBins};
use super::volume::{share_pct, volume_timeline, VolumeBucket};
use crate::snapshot_core::trade::Trade;
use serde::Serialize;
use std::borrow::Borrow;
use std::collections::BTreeMap;

pub const DEFAULT_LATEST_TRADES: usize = 20;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssetKpi {
    pub asset: String,
    pub trades: usize,
    pub volume_usdt: f64,
    pub whales: usize,
    pub anomalies: usize,
    pub whale_share_pct: f64,
    pub anomaly_share_pct: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct AssetFocus<'a> {
    pub asset: String,
    pub timeline: Vec<VolumeBucket>,
    pub histogram: Vec<HistogramBucket>,
    /// Newest first, in snapshot order
    pub latest: Vec<&'a Trade>,
}

#[derive(Default)]
struct KpiAccumulator {
    trades: usize,
    volume_usdt: f64,
    whales: usize,
    anomalies: usize,
}

/// One row per asset, highest volume first
pub fn asset_kpis<T: Borrow<Trade>>(trades: &[T]) -> Vec<AssetKpi> {
    let mut per_asset: BTreeMap<&str, KpiAccumulator> = BTreeMap::new();
    for trade in trades.iter().map(Borrow::<Trade>::borrow) {
        let Some(asset) = trade.asset.as_deref() else {
            continue;
        };
        let acc = per_asset.entry(asset).or_default();
        acc.trades += 1;
        acc.volume_usdt += trade.value_usdt_or_zero();
        acc.whales += usize::from(trade.is_whale);
        acc.anomalies += usize::from(trade.has_anomaly);
    }

    let mut rows: Vec<AssetKpi> = per_asset
        .into_iter()
        .map(|(asset, acc)| AssetKpi {
            asset: asset.to_string(),
            trades: acc.trades,
            volume_usdt: acc.volume_usdt,
            whales: acc.whales,
            anomalies: acc.anomalies,
            whale_share_pct: share_pct(acc.whales, acc.trades),
            anomaly_share_pct: share_pct(acc.anomalies, acc.trades),
        })
        .collect();
    rows.sort_by(|a, b| b.volume_usdt.total_cmp(&a.volume_usdt));
    rows
}

/// The first `limit` trades of `asset`, keeping input order
pub fn latest_for_asset<'a, T: Borrow<Trade>>(
    trades: &'a [T],
    asset: &str,
    limit: usize,
) -> Vec<&'a Trade> {
    trades
        .iter()
        .map(Borrow::<Trade>::borrow)
        .filter(|t| t.asset_is(asset))
        .take(limit)
        .collect()
}

/// Timeline, size distribution and latest trades for one asset
pub fn asset_focus<'a, T: Borrow<Trade>>(
    trades: &'a [T],
    asset: &str,
    latest_limit: usize,
) -> AssetFocus<'a> {
    let selected: Vec<&Trade> = trades
        .iter()
        .map(Borrow::<Trade>::borrow)
        .filter(|t| t.asset_is(asset))
        .collect();

    AssetFocus {
        asset: asset.to_string(),
        timeline: volume_timeline(&selected),
        histogram: value_histogram(&selected, &ValueBins::asset_focus()),
        latest: selected.iter().copied().take(latest_limit).collect(),
    }
}
