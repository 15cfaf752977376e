//! Snapshot Core - Normalize, Filter, Aggregate
//!
//! Turns one raw feed payload into an immutable snapshot of canonical trades,
//! then answers filtered and grouped queries over it.
//!
//! # Architecture
//!
//! ```text
//! Raw payload (JSON array, or {data|rows: [...]})
//!     ↓
//! Normalizer (key trim, coercion, global TimeUnit, derived flags, newest-first sort)
//!     ↓
//! Snapshot (immutable, shared via Arc)
//!     ↓
//! FilterEngine (lookback AND asset AND direction AND min value AND risk view)
//!     ↓
//! Aggregator (volume, histograms, risk posture, per-asset KPIs)
//! ```

pub mod aggregator;
pub mod filter;
pub mod normalizer;
pub mod trade;

pub use filter::{distinct_assets, distinct_directions, FilterCriteria, FilterEngine, FilterError, RiskView};
pub use normalizer::{normalize, Snapshot};
pub use trade::{RawRecord, TimeUnit, Trade, TradeFields};
