//! Guardian Report Binary - One-shot snapshot summary
//!
//! Fetches one snapshot of the trade feed, applies the configured selection and
//! logs the overview, risk posture and asset league table.
//!
//! ## Usage
//!
//! ```bash
//! GUARDIAN_API_URL=https://... cargo run --release --bin guardian_report
//! ```
//!
//! ## Environment Variables
//!
//! - GUARDIAN_API_URL - Trade feed endpoint (required)
//! - FETCH_TIMEOUT_SECS - HTTP timeout in seconds (default: 10)
//! - SNAPSHOT_TTL_SECS - Snapshot freshness window in seconds (default: 30)
//! - LOOKBACK_HOURS - Lookback window, clamped to 1..=48 (default: 24)
//! - FILTER_ASSET - Asset to keep, or All (default: All)
//! - FILTER_DIRECTION - Direction to keep, or All (default: All)
//! - MIN_VALUE_USDT - Minimum trade value in USDT (default: 0)
//! - RISK_VIEW - All, High, Medium, Low or OnlyAnomalies (default: All)
//! - EXPORT_PATH - Write the filtered trades as CSV (optional)
//! - RUST_LOG - Logging level (optional, default: info)

use chrono::Utc;
use qubic_guardian::config::{GuardianConfig, ReportConfig};
use qubic_guardian::export::write_csv_file;
use qubic_guardian::snapshot_core::aggregator::{
    asset_kpis, flagged_volume_by_asset, overview_kpis, risk_alert_feed, risk_inventory,
    value_histogram, ValueBins,
};
use qubic_guardian::snapshot_core::aggregator::risk::{
    DEFAULT_FEED_LIMIT, DEFAULT_FLAGGED_ASSET_LIMIT,
};
use qubic_guardian::snapshot_core::{distinct_assets, FilterEngine};
use qubic_guardian::source::{HttpSource, SnapshotCache};

const TOP_ASSETS: usize = 5;
const ALERTS_SHOWN: usize = 5;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Stderr)
        .init();

    let config = GuardianConfig::from_env()?;
    let report = ReportConfig::from_env();

    log::info!("🚀 Starting Guardian Report");
    log::info!("   Feed: {}", config.api_url);
    log::info!("   Timeout: {}s", config.fetch_timeout.as_secs());
    log::info!("   Snapshot TTL: {}s", config.snapshot_ttl.as_secs());
    log::info!("   Lookback: {}h", report.lookback_hours);
    log::info!("   Asset: {} | Direction: {}", report.asset, report.direction);
    log::info!("   Min value: {} USDT | Risk view: {}", report.min_value_usdt, report.risk_view.as_str());

    let cache = SnapshotCache::new(HttpSource::new(config.fetch_timeout)?);
    let snapshot = cache.get_or_fetch(&config.api_url, config.snapshot_ttl).await?;

    log::info!(
        "📦 Snapshot: {} trades, {} assets, time unit {}",
        snapshot.len(),
        distinct_assets(snapshot.trades()).len(),
        snapshot.time_unit().map_or("n/a", |u| u.as_str())
    );

    let criteria = report.criteria();
    let filtered = FilterEngine::for_snapshot(&snapshot, Utc::now()).apply(snapshot.trades(), &criteria);

    if filtered.is_empty() {
        log::warn!("⚠️  No trades match the current selection");
    }

    let kpis = overview_kpis(&filtered);
    log::info!("📊 Overview");
    log::info!("   Trades: {}", kpis.total_trades);
    log::info!("   Volume: {:.2} USDT ({})", kpis.total_volume_usdt, kpis.volume_change);
    log::info!("   Assets: {}", kpis.unique_assets);
    log::info!("   Whale share: {:.1}%", kpis.whale_share_pct);
    log::info!("   Anomaly share: {:.1}%", kpis.anomaly_share_pct);

    let inventory = risk_inventory(&filtered);
    log::info!(
        "🛡️  Risk inventory: HIGH {} | MEDIUM {} | LOW/none {}",
        inventory.high,
        inventory.medium,
        inventory.low_or_none
    );

    for row in flagged_volume_by_asset(&filtered, DEFAULT_FLAGGED_ASSET_LIMIT) {
        log::info!("   🐋 Flagged {}: {:.2} USDT", row.asset, row.volume_usdt);
    }

    for trade in risk_alert_feed(&filtered, DEFAULT_FEED_LIMIT).into_iter().take(ALERTS_SHOWN) {
        log::info!(
            "   🚨 {} {} {} {:.2} USDT",
            trade.risk_label(),
            trade.timestamp.map(|ts| ts.to_rfc3339()).unwrap_or_default(),
            trade.asset.as_deref().unwrap_or("?"),
            trade.value_usdt_or_zero()
        );
    }

    log::info!("🏆 Top assets");
    for row in asset_kpis(&filtered).into_iter().take(TOP_ASSETS) {
        log::info!(
            "   {:<10} trades={:<5} volume={:>12.2} whales={:.1}% anomalies={:.1}%",
            row.asset,
            row.trades,
            row.volume_usdt,
            row.whale_share_pct,
            row.anomaly_share_pct
        );
    }

    for bucket in value_histogram(&filtered, &ValueBins::overview()) {
        log::debug!("   {:>8}: {}", bucket.label, bucket.trades);
    }

    if let Some(path) = &report.export_path {
        write_csv_file(path, &filtered)?;
    }

    log::info!("✅ Report complete");
    Ok(())
}
