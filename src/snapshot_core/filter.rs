//! Conjunctive trade filtering for a user selection

use super::normalizer::Snapshot;
use super::trade::Trade;
use chrono::{DateTime, Duration, Utc};
use std::borrow::Borrow;
use std::collections::BTreeSet;
use std::str::FromStr;

pub const MIN_LOOKBACK_HOURS: u32 = 1;
pub const MAX_LOOKBACK_HOURS: u32 = 48;

/// Selection label meaning "no restriction"
const ALL: &str = "All";

#[derive(Debug)]
pub enum FilterError {
    UnknownRiskView(String),
}

impl std::fmt::Display for FilterError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FilterError::UnknownRiskView(label) => write!(f, "Unknown risk view: {}", label),
        }
    }
}

impl std::error::Error for FilterError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RiskView {
    #[default]
    All,
    High,
    Medium,
    Low,
    OnlyAnomalies,
}

impl RiskView {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskView::All => "All",
            RiskView::High => "High",
            RiskView::Medium => "Medium",
            RiskView::Low => "Low",
            RiskView::OnlyAnomalies => "OnlyAnomalies",
        }
    }

    /// Upper-cased level compared against `effective_risk`
    fn level(&self) -> Option<&'static str> {
        match self {
            RiskView::High => Some("HIGH"),
            RiskView::Medium => Some("MEDIUM"),
            RiskView::Low => Some("LOW"),
            RiskView::All | RiskView::OnlyAnomalies => None,
        }
    }

    fn matches(&self, trade: &Trade) -> bool {
        match self {
            RiskView::All => true,
            RiskView::OnlyAnomalies => trade.has_anomaly,
            level_view => level_view.level().map_or(true, |level| trade.risk_label() == level),
        }
    }
}

impl FromStr for RiskView {
    type Err = FilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "all" | "" => Ok(RiskView::All),
            "high" => Ok(RiskView::High),
            "medium" => Ok(RiskView::Medium),
            "low" => Ok(RiskView::Low),
            "onlyanomalies" | "only anomalies" | "only_anomalies" => Ok(RiskView::OnlyAnomalies),
            _ => Err(FilterError::UnknownRiskView(s.to_string())),
        }
    }
}

/// User selection. Every field is optional; `None` means no restriction.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterCriteria {
    pub lookback_hours: Option<u32>,
    pub asset: Option<String>,
    pub direction: Option<String>,
    pub min_value_usdt: f64,
    pub risk_view: RiskView,
}

impl FilterCriteria {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clamped into 1..=48 hours
    pub fn with_lookback_hours(mut self, hours: u32) -> Self {
        self.lookback_hours = Some(hours.clamp(MIN_LOOKBACK_HOURS, MAX_LOOKBACK_HOURS));
        self
    }

    /// `"All"` clears the restriction
    pub fn with_asset(mut self, asset: &str) -> Self {
        self.asset = selection(asset);
        self
    }

    /// `"All"` clears the restriction
    pub fn with_direction(mut self, direction: &str) -> Self {
        self.direction = selection(direction);
        self
    }

    /// Negative thresholds are treated as zero
    pub fn with_min_value_usdt(mut self, min_value: f64) -> Self {
        self.min_value_usdt = if min_value.is_finite() { min_value.max(0.0) } else { 0.0 };
        self
    }

    pub fn with_risk_view(mut self, risk_view: RiskView) -> Self {
        self.risk_view = risk_view;
        self
    }
}

fn selection(label: &str) -> Option<String> {
    let label = label.trim();
    if label.is_empty() || label.eq_ignore_ascii_case(ALL) {
        None
    } else {
        Some(label.to_string())
    }
}

pub struct FilterEngine {
    now: DateTime<Utc>,
    /// Whether a lookback window can apply at all; fixed per snapshot, not per view
    lookback_applies: bool,
}

impl FilterEngine {
    /// Lookback cutoffs are computed against `now` and always apply
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now,
            lookback_applies: true,
        }
    }

    /// Engine for views over `trades`. The lookback is skipped for every view when
    /// no trade in the full sequence carries a timestamp.
    pub fn for_trades<T: Borrow<Trade>>(trades: &[T], now: DateTime<Utc>) -> Self {
        Self {
            now,
            lookback_applies: trades.iter().any(|t| t.borrow().timestamp.is_some()),
        }
    }

    pub fn for_snapshot(snapshot: &Snapshot, now: DateTime<Utc>) -> Self {
        Self::for_trades(snapshot.trades(), now)
    }

    /// Keep the trades matching every active predicate, preserving input order
    pub fn apply<'a, T>(&self, trades: &'a [T], criteria: &FilterCriteria) -> Vec<&'a Trade>
    where
        T: Borrow<Trade>,
    {
        if trades.is_empty() {
            return Vec::new();
        }

        let cutoff = criteria
            .lookback_hours
            .filter(|_| self.lookback_applies)
            .map(|hours| self.now - Duration::hours(i64::from(hours)));
        let direction = criteria.direction.as_deref().map(str::to_lowercase);

        let kept: Vec<&Trade> = trades
            .iter()
            .map(Borrow::<Trade>::borrow)
            .filter(|t| cutoff.map_or(true, |c| t.timestamp.map_or(false, |ts| ts >= c)))
            .filter(|t| criteria.asset.as_deref().map_or(true, |a| t.asset_is(a)))
            .filter(|t| {
                direction.as_deref().map_or(true, |d| {
                    t.direction.as_deref().map_or(false, |td| td.to_lowercase() == d)
                })
            })
            .filter(|t| t.value_usdt_or_zero() >= criteria.min_value_usdt)
            .filter(|t| criteria.risk_view.matches(t))
            .collect();

        log::debug!(
            "Filter kept {} of {} trades (lookback={:?}, asset={:?}, direction={:?}, min_usdt={}, risk={})",
            kept.len(),
            trades.len(),
            criteria.lookback_hours,
            criteria.asset,
            criteria.direction,
            criteria.min_value_usdt,
            criteria.risk_view.as_str()
        );

        kept
    }
}

/// Sorted, de-duplicated assets for the asset selector
pub fn distinct_assets<T: Borrow<Trade>>(trades: &[T]) -> Vec<String> {
    distinct(trades.iter().filter_map(|t| t.borrow().asset.as_deref()))
}

/// Sorted, de-duplicated directions for the direction selector
pub fn distinct_directions<T: Borrow<Trade>>(trades: &[T]) -> Vec<String> {
    distinct(trades.iter().filter_map(|t| t.borrow().direction.as_deref()))
}

fn distinct<'a>(values: impl Iterator<Item = &'a str>) -> Vec<String> {
    values
        .filter(|v| !v.is_empty())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(str::to_string)
        .collect()
}
