//! Risk posture: label distribution, inventory, alert feed, flagged volume

use super::volume::{volume_by_asset, AssetVolume};
use crate::snapshot_core::trade::Trade;
use serde::Serialize;
use std::borrow::Borrow;
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// Label used for trades without an effective risk
const UNLABELLED: &str = "LOW";

pub const DEFAULT_FEED_LIMIT: usize = 30;
pub const DEFAULT_FLAGGED_ASSET_LIMIT: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RiskCount {
    pub level: String,
    pub trades: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RiskInventory {
    pub high: usize,
    pub medium: usize,
    /// LOW plus unlabelled trades
    pub low_or_none: usize,
}

/// Ordering weight of an upper-cased risk label
pub fn risk_rank(label: &str) -> u8 {
    match label {
        "HIGH" => 3,
        "MEDIUM" => 2,
        "LOW" => 1,
        _ => 0,
    }
}

/// Trades per upper-cased effective risk; unlabelled trades count as LOW
pub fn risk_distribution<T: Borrow<Trade>>(trades: &[T]) -> Vec<RiskCount> {
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for trade in trades.iter().map(Borrow::<Trade>::borrow) {
        let label = trade.risk_label();
        let level = if label.is_empty() { UNLABELLED.to_string() } else { label };
        *counts.entry(level).or_default() += 1;
    }

    let mut counts: Vec<RiskCount> = counts
        .into_iter()
        .map(|(level, trades)| RiskCount { level, trades })
        .collect();
    counts.sort_by(|a, b| b.trades.cmp(&a.trades));
    counts
}

pub fn risk_inventory<T: Borrow<Trade>>(trades: &[T]) -> RiskInventory {
    let mut inventory = RiskInventory::default();
    for trade in trades.iter().map(Borrow::<Trade>::borrow) {
        match trade.risk_label().as_str() {
            "HIGH" => inventory.high += 1,
            "MEDIUM" => inventory.medium += 1,
            "LOW" | "" => inventory.low_or_none += 1,
            _ => {}
        }
    }
    inventory
}

/// Most severe trades first, newest first within a level, at most `limit`
pub fn risk_alert_feed<T: Borrow<Trade>>(trades: &[T], limit: usize) -> Vec<&Trade> {
    let mut ranked: Vec<(u8, &Trade)> = trades
        .iter()
        .map(Borrow::<Trade>::borrow)
        .map(|t| (risk_rank(&t.risk_label()), t))
        .collect();

    ranked.sort_by(|(rank_a, a), (rank_b, b)| {
        rank_b.cmp(rank_a).then_with(|| match (a.timestamp, b.timestamp) {
            (Some(a), Some(b)) => b.cmp(&a),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        })
    });

    ranked.into_iter().take(limit).map(|(_, t)| t).collect()
}

/// Volume per asset over whale or anomaly trades only, largest first, at most `limit`
pub fn flagged_volume_by_asset<T: Borrow<Trade>>(trades: &[T], limit: usize) -> Vec<AssetVolume> {
    let flagged: Vec<&Trade> = trades
        .iter()
        .map(Borrow::<Trade>::borrow)
        .filter(|t| t.is_whale || t.has_anomaly)
        .collect();

    let mut volumes = volume_by_asset(&flagged);
    volumes.truncate(limit);
    volumes
}
