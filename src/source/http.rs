//! HTTP feed source
//!
//! One GET per refresh. The body must be JSON: either an array of trade records
//! or an object holding that array under `data` or `rows`.

use super::SnapshotSource;
use crate::error::SourceError;
use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

pub struct HttpSource {
    client: reqwest::Client,
}

impl HttpSource {
    pub fn new(timeout: Duration) -> Result<Self, SourceError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl SnapshotSource for HttpSource {
    /// Fetch and decode the payload at `url`
    ///
    /// # Returns
    /// * `Err(SourceError::Unavailable)` - transport error, timeout, or non-2xx status
    /// * `Err(SourceError::Malformed)` - body is not valid JSON
    async fn fetch_payload(&self, url: &str) -> Result<Value, SourceError> {
        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::Unavailable(format!("feed returned HTTP {}", status)));
        }

        let body = response.text().await?;
        let payload: Value = serde_json::from_str(&body)?;

        log::debug!("Fetched {} bytes from {}", body.len(), url);
        Ok(payload)
    }

    fn source_type(&self) -> &'static str {
        "HTTP"
    }
}
