//! Errors that end a refresh cycle
//!
//! Per-field coercion problems never surface here; the normalizer absorbs them as nulls.

#[derive(Debug, Clone, PartialEq)]
pub enum SourceError {
    /// Transport failure, timeout, or non-success HTTP status
    Unavailable(String),
    /// Payload is neither a record list nor a `data`/`rows` wrapper around one
    Malformed(String),
}

impl From<reqwest::Error> for SourceError {
    fn from(err: reqwest::Error) -> Self {
        SourceError::Unavailable(err.to_string())
    }
}

impl From<serde_json::Error> for SourceError {
    fn from(err: serde_json::Error) -> Self {
        SourceError::Malformed(err.to_string())
    }
}

impl std::fmt::Display for SourceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceError::Unavailable(e) => write!(f, "Source unavailable: {}", e),
            SourceError::Malformed(e) => write!(f, "Malformed source payload: {}", e),
        }
    }
}

impl std::error::Error for SourceError {}

impl SourceError {
    pub fn is_unavailable(&self) -> bool {
        matches!(self, SourceError::Unavailable(_))
    }

    pub fn is_malformed(&self) -> bool {
        matches!(self, SourceError::Malformed(_))
    }
}
