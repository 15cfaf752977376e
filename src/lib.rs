//! Qubic Guardian - trade snapshot analytics
//!
//! Fetches the trade feed, normalizes it into canonical trades with derived
//! whale/anomaly/risk flags, and answers filtered and aggregated queries.

pub mod config;
pub mod error;
pub mod export;
pub mod snapshot_core;
pub mod source;

pub use config::{ConfigError, GuardianConfig, ReportConfig};
pub use error::SourceError;
pub use export::ExportError;
pub use snapshot_core::{FilterCriteria, FilterEngine, RiskView, Snapshot, Trade};
pub use source::{HttpSource, SnapshotCache, SnapshotSource};
