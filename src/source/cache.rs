//! Time-boxed reuse of the last fetched snapshot
//!
//! A refresh either replaces a key's snapshot wholesale or, on failure, leaves the
//! held snapshot exactly as it was.

use super::SnapshotSource;
use crate::error::SourceError;
use crate::snapshot_core::Snapshot;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

struct CacheEntry {
    snapshot: Arc<Snapshot>,
    stored_at: Instant,
}

impl CacheEntry {
    fn is_fresh(&self, ttl: Duration) -> bool {
        self.stored_at.elapsed() < ttl
    }
}

pub struct SnapshotCache<S> {
    source: S,
    entries: RwLock<HashMap<String, CacheEntry>>,
}

impl<S: SnapshotSource> SnapshotCache<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Return the held snapshot for `key` if younger than `ttl`, otherwise fetch a fresh one
    pub async fn get_or_fetch(&self, key: &str, ttl: Duration) -> Result<Arc<Snapshot>, SourceError> {
        {
            let entries = self.entries.read().await;
            if let Some(entry) = entries.get(key).filter(|e| e.is_fresh(ttl)) {
                log::debug!("Snapshot cache hit for {} ({} trades)", key, entry.snapshot.len());
                return Ok(entry.snapshot.clone());
            }
        }

        let payload = match self.source.fetch_payload(key).await {
            Ok(payload) => payload,
            Err(e) => {
                log::warn!("{} fetch failed for {}: {}", self.source.source_type(), key, e);
                return Err(e);
            }
        };

        let snapshot = Arc::new(Snapshot::from_payload(&payload, Utc::now()).map_err(|e| {
            log::warn!("Rejected payload from {}: {}", key, e);
            e
        })?);

        log::info!(
            "🔄 Snapshot refreshed from {} ({} trades)",
            self.source.source_type(),
            snapshot.len()
        );

        self.entries.write().await.insert(
            key.to_string(),
            CacheEntry {
                snapshot: snapshot.clone(),
                stored_at: Instant::now(),
            },
        );

        Ok(snapshot)
    }

    /// Last successfully fetched snapshot for `key`, however old
    pub async fn last_known(&self, key: &str) -> Option<Arc<Snapshot>> {
        self.entries.read().await.get(key).map(|e| e.snapshot.clone())
    }

    /// Drop every held snapshot so the next call fetches
    pub async fn invalidate(&self) {
        let mut entries = self.entries.write().await;
        log::debug!("Invalidating {} cached snapshots", entries.len());
        entries.clear();
    }

    pub async fn invalidate_key(&self, key: &str) {
        self.entries.write().await.remove(key);
    }
}
