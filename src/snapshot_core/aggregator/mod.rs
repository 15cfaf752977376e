//! Read-only summaries over a (possibly filtered) trade sequence
//!
//! Every function accepts `&[Trade]` or `&[&Trade]`, returns an empty result for
//! empty input, and is deterministic for identical input order and content.

pub mod assets;
pub mod distribution;
pub mod risk;
pub mod volume;

pub use assets::{asset_focus, asset_kpis, latest_for_asset, AssetFocus, AssetKpi};
pub use distribution::{value_histogram, HistogramBucket, ValueBins};
pub use risk::{
    flagged_volume_by_asset, risk_alert_feed, risk_distribution, risk_inventory, RiskCount,
    RiskInventory,
};
pub use volume::{
    day_over_day, overview_kpis, trade_count_by_asset, volume_by_asset, volume_by_interval,
    volume_timeline, AssetCount, AssetVolume, BucketInterval, DailyVolume, DayOverDay,
    OverviewKpis, VolumeBucket, VolumeChange,
};
