//! Configuration from environment variables
//!
//! `GuardianConfig` covers where the feed lives and how long a snapshot stays
//! fresh. `ReportConfig` carries the report's selection and is parsed leniently:
//! unreadable values fall back to their defaults.

use crate::snapshot_core::{FilterCriteria, RiskView};
use crate::source::http::DEFAULT_TIMEOUT;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_SNAPSHOT_TTL: Duration = Duration::from_secs(30);
pub const DEFAULT_LOOKBACK_HOURS: u32 = 24;

#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    MissingVariable(String),
    InvalidValue(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::MissingVariable(var) => write!(f, "Missing environment variable: {}", var),
            ConfigError::InvalidValue(msg) => write!(f, "Invalid configuration value: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

#[derive(Debug, Clone)]
pub struct GuardianConfig {
    pub api_url: String,
    pub fetch_timeout: Duration,
    pub snapshot_ttl: Duration,
}

impl GuardianConfig {
    /// Environment variables:
    /// - `GUARDIAN_API_URL` (required, http or https)
    /// - `FETCH_TIMEOUT_SECS` (default: 10)
    /// - `SNAPSHOT_TTL_SECS` (default: 30)
    pub fn from_env() -> Result<Self, ConfigError> {
        let api_url = env::var("GUARDIAN_API_URL")
            .map_err(|_| ConfigError::MissingVariable("GUARDIAN_API_URL".to_string()))?;
        let api_url = api_url.trim().to_string();

        if !api_url.starts_with("http://") && !api_url.starts_with("https://") {
            return Err(ConfigError::InvalidValue(
                "GUARDIAN_API_URL must start with http:// or https://".to_string(),
            ));
        }

        let fetch_timeout = secs_var("FETCH_TIMEOUT_SECS")?.unwrap_or(DEFAULT_TIMEOUT);
        if fetch_timeout.is_zero() {
            return Err(ConfigError::InvalidValue(
                "FETCH_TIMEOUT_SECS must be greater than 0".to_string(),
            ));
        }

        Ok(Self {
            api_url,
            fetch_timeout,
            snapshot_ttl: secs_var("SNAPSHOT_TTL_SECS")?.unwrap_or(DEFAULT_SNAPSHOT_TTL),
        })
    }
}

fn secs_var(name: &str) -> Result<Option<Duration>, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse::<u64>()
            .map(|secs| Some(Duration::from_secs(secs)))
            .map_err(|_| ConfigError::InvalidValue(format!("{}={} is not a whole number of seconds", name, raw))),
        Err(_) => Ok(None),
    }
}

/// Selection applied by the report binary
#[derive(Debug, Clone, PartialEq)]
pub struct ReportConfig {
    pub lookback_hours: u32,
    pub asset: String,
    pub direction: String,
    pub min_value_usdt: f64,
    pub risk_view: RiskView,
    pub export_path: Option<PathBuf>,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            lookback_hours: DEFAULT_LOOKBACK_HOURS,
            asset: "All".to_string(),
            direction: "All".to_string(),
            min_value_usdt: 0.0,
            risk_view: RiskView::All,
            export_path: None,
        }
    }
}

impl ReportConfig {
    /// Environment variables:
    /// - `LOOKBACK_HOURS` (default: 24)
    /// - `FILTER_ASSET` (default: All)
    /// - `FILTER_DIRECTION` (default: All)
    /// - `MIN_VALUE_USDT` (default: 0)
    /// - `RISK_VIEW` (default: All)
    /// - `EXPORT_PATH` (default: no export)
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let risk_view = match env::var("RISK_VIEW") {
            Ok(label) => label.parse().unwrap_or_else(|e| {
                log::warn!("{}, using All", e);
                RiskView::All
            }),
            Err(_) => defaults.risk_view,
        };

        Self {
            lookback_hours: env::var("LOOKBACK_HOURS")
                .ok()
                .and_then(|s| s.trim().parse().ok())
                .unwrap_or(defaults.lookback_hours),
            asset: env::var("FILTER_ASSET").unwrap_or(defaults.asset),
            direction: env::var("FILTER_DIRECTION").unwrap_or(defaults.direction),
            min_value_usdt: env::var("MIN_VALUE_USDT")
                .ok()
                .and_then(|s| s.trim().parse().ok())
                .unwrap_or(defaults.min_value_usdt),
            risk_view,
            export_path: env::var("EXPORT_PATH")
                .ok()
                .filter(|p| !p.trim().is_empty())
                .map(PathBuf::from),
        }
    }

    pub fn criteria(&self) -> FilterCriteria {
        FilterCriteria::new()
            .with_lookback_hours(self.lookback_hours)
            .with_asset(&self.asset)
            .with_direction(&self.direction)
            .with_min_value_usdt(self.min_value_usdt)
            .with_risk_view(self.risk_view)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    // Tests share one process environment
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    const REPORT_VARS: [&str; 6] = [
        "LOOKBACK_HOURS",
        "FILTER_ASSET",
        "FILTER_DIRECTION",
        "MIN_VALUE_USDT",
        "RISK_VIEW",
        "EXPORT_PATH",
    ];

    fn clear_guardian_vars() {
        env::remove_var("GUARDIAN_API_URL");
        env::remove_var("FETCH_TIMEOUT_SECS");
        env::remove_var("SNAPSHOT_TTL_SECS");
    }

    #[test]
    fn test_guardian_defaults() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        clear_guardian_vars();
        env::set_var("GUARDIAN_API_URL", " https://api.example.org/trades ");

        let config = GuardianConfig::from_env().unwrap();

        assert_eq!(config.api_url, "https://api.example.org/trades");
        assert_eq!(config.fetch_timeout, Duration::from_secs(10));
        assert_eq!(config.snapshot_ttl, Duration::from_secs(30));

        clear_guardian_vars();
    }

    #[test]
    fn test_guardian_missing_url() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        clear_guardian_vars();

        let err = GuardianConfig::from_env().unwrap_err();
        assert_eq!(err, ConfigError::MissingVariable("GUARDIAN_API_URL".to_string()));
    }

    #[test]
    fn test_guardian_rejects_bad_values() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        clear_guardian_vars();

        env::set_var("GUARDIAN_API_URL", "ftp://api.example.org");
        assert!(matches!(GuardianConfig::from_env(), Err(ConfigError::InvalidValue(_))));

        env::set_var("GUARDIAN_API_URL", "http://localhost:8080/trades");
        env::set_var("SNAPSHOT_TTL_SECS", "soon");
        assert!(matches!(GuardianConfig::from_env(), Err(ConfigError::InvalidValue(_))));

        env::set_var("SNAPSHOT_TTL_SECS", "5");
        env::set_var("FETCH_TIMEOUT_SECS", "0");
        assert!(matches!(GuardianConfig::from_env(), Err(ConfigError::InvalidValue(_))));

        env::set_var("FETCH_TIMEOUT_SECS", "3");
        let config = GuardianConfig::from_env().unwrap();
        assert_eq!(config.snapshot_ttl, Duration::from_secs(5));
        assert_eq!(config.fetch_timeout, Duration::from_secs(3));

        clear_guardian_vars();
    }

    #[test]
    fn test_report_defaults() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        for var in REPORT_VARS {
            env::remove_var(var);
        }

        let config = ReportConfig::from_env();
        assert_eq!(config, ReportConfig::default());

        let criteria = config.criteria();
        assert_eq!(criteria.lookback_hours, Some(24));
        assert_eq!(criteria.asset, None);
        assert_eq!(criteria.direction, None);
        assert_eq!(criteria.risk_view, RiskView::All);
    }

    #[test]
    fn test_report_custom_and_lenient() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        env::set_var("LOOKBACK_HOURS", "96");
        env::set_var("FILTER_ASSET", "QX");
        env::set_var("FILTER_DIRECTION", "buy");
        env::set_var("MIN_VALUE_USDT", "-5");
        env::set_var("RISK_VIEW", "only anomalies");
        env::set_var("EXPORT_PATH", "/tmp/trades.csv");

        let config = ReportConfig::from_env();
        assert_eq!(config.export_path, Some(PathBuf::from("/tmp/trades.csv")));

        let criteria = config.criteria();
        assert_eq!(criteria.lookback_hours, Some(48));
        assert_eq!(criteria.asset.as_deref(), Some("QX"));
        assert_eq!(criteria.direction.as_deref(), Some("buy"));
        assert_eq!(criteria.min_value_usdt, 0.0);
        assert_eq!(criteria.risk_view, RiskView::OnlyAnomalies);

        env::set_var("LOOKBACK_HOURS", "a day");
        env::set_var("RISK_VIEW", "extreme");
        let config = ReportConfig::from_env();
        assert_eq!(config.lookback_hours, DEFAULT_LOOKBACK_HOURS);
        assert_eq!(config.risk_view, RiskView::All);

        for var in REPORT_VARS {
            env::remove_var(var);
        }
    }
}
