//! Snapshot sources: where raw payloads come from and how long they stay fresh

pub mod cache;
pub mod http;

use crate::error::SourceError;
use async_trait::async_trait;
use serde_json::Value;

pub use cache::SnapshotCache;
pub use http::HttpSource;

/// Backend trait for fetching one raw, decoded payload
#[async_trait]
pub trait SnapshotSource: Send + Sync {
    /// Fetch the payload addressed by `key` (for HTTP sources, the URL)
    async fn fetch_payload(&self, key: &str) -> Result<Value, SourceError>;

    /// Get source type for logging
    fn source_type(&self) -> &'static str;
}
