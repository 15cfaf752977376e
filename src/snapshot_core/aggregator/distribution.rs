//! Trade-size histograms over fixed, half-open USDT intervals

use crate::snapshot_core::trade::Trade;
use serde::Serialize;
use std::borrow::Borrow;

/// Bin edges and their labels; `edges.len() == labels.len() + 1`
#[derive(Debug, Clone, Copy)]
pub struct ValueBins {
    edges: &'static [f64],
    labels: &'static [&'static str],
}

impl ValueBins {
    /// Network-wide trade size distribution
    pub fn overview() -> Self {
        Self {
            edges: &[0.0, 10.0, 50.0, 100.0, 250.0, 500.0, 1_000.0, 5_000.0, 10_000.0],
            labels: &["<10", "10-50", "50-100", "100-250", "250-500", "500-1k", "1k-5k", "5k-10k"],
        }
    }

    /// Coarser bins used when focusing on a single asset
    pub fn asset_focus() -> Self {
        Self {
            edges: &[0.0, 50.0, 100.0, 250.0, 500.0, 1_000.0, 5_000.0, 10_000.0],
            labels: &["<50", "50-100", "100-250", "250-500", "500-1k", "1k-5k", "5k-10k"],
        }
    }

    /// Index of the `[lower, upper)` bin holding `value`; `None` outside every bin
    pub fn index_of(&self, value: f64) -> Option<usize> {
        self.edges
            .windows(2)
            .position(|edge| value >= edge[0] && value < edge[1])
    }

    /// Values at or above this edge fall outside the histogram
    pub fn upper_edge(&self) -> f64 {
        self.edges[self.edges.len() - 1]
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistogramBucket {
    pub label: &'static str,
    pub lower: f64,
    pub upper: f64,
    pub trades: usize,
}

/// Count trades per value bin (missing value counts as zero).
///
/// Values at or above the top edge are left out rather than clamped into the
/// last bin. Every bin is reported, including empty ones, unless the input is empty.
pub fn value_histogram<T: Borrow<Trade>>(trades: &[T], bins: &ValueBins) -> Vec<HistogramBucket> {
    if trades.is_empty() {
        return Vec::new();
    }

    let mut counts = vec![0usize; bins.len()];
    let mut outside = 0usize;
    for trade in trades.iter().map(Borrow::<Trade>::borrow) {
        match bins.index_of(trade.value_usdt_or_zero()) {
            Some(idx) => counts[idx] += 1,
            None => outside += 1,
        }
    }

    if outside > 0 {
        log::debug!(
            "{} trades outside histogram range [0, {})",
            outside,
            bins.upper_edge()
        );
    }

    bins.labels
        .iter()
        .zip(bins.edges.windows(2))
        .zip(counts)
        .map(|((label, edge), trades)| HistogramBucket {
            label: *label,
            lower: edge[0],
            upper: edge[1],
            trades,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot_core::trade::{TimeUnit, TradeFields};

    fn valued(value: Option<f64>) -> Trade {
        Trade::derive(
            TradeFields {
                trade_value_usdt: value,
                ..Default::default()
            },
            TimeUnit::Seconds,
        )
    }

    fn counts(buckets: &[HistogramBucket]) -> Vec<usize> {
        buckets.iter().map(|b| b.trades).collect()
    }

    #[test]
    fn test_half_open_intervals() {
        let trades: Vec<Trade> = [0.0, 9.99, 10.0, 49.99, 50.0, 499.99, 500.0, 9_999.99]
            .iter()
            .map(|v| valued(Some(*v)))
            .collect();
        let buckets = value_histogram(&trades, &ValueBins::overview());
        assert_eq!(buckets.len(), 8);
        assert_eq!(counts(&buckets), vec![2, 2, 1, 0, 1, 1, 0, 1]);
        assert_eq!(buckets[0].label, "<10");
        assert_eq!(buckets[7].upper, 10_000.0);
    }

    #[test]
    fn test_top_edge_is_excluded_not_clamped() {
        let trades = vec![valued(Some(10_000.0)), valued(Some(25_000.0)), valued(Some(7_500.0))];
        let buckets = value_histogram(&trades, &ValueBins::overview());
        assert_eq!(counts(&buckets).iter().sum::<usize>(), 1);
        assert_eq!(buckets[7].trades, 1);
    }

    #[test]
    fn test_missing_value_lands_in_first_bin() {
        let buckets = value_histogram(&[valued(None)], &ValueBins::overview());
        assert_eq!(buckets[0].trades, 1);
    }

    #[test]
    fn test_negative_values_are_outside() {
        let buckets = value_histogram(&[valued(Some(-1.0))], &ValueBins::overview());
        assert_eq!(counts(&buckets).iter().sum::<usize>(), 0);
    }

    #[test]
    fn test_asset_focus_bins() {
        let bins = ValueBins::asset_focus();
        assert_eq!(bins.len(), 7);
        assert_eq!(bins.index_of(49.0), Some(0));
        assert_eq!(bins.index_of(50.0), Some(1));
        assert_eq!(bins.index_of(10_000.0), None);
    }

    #[test]
    fn test_empty_input() {
        let empty: Vec<Trade> = Vec::new();
        assert!(value_histogram(&empty, &ValueBins::overview()).is_empty());
    }
}
