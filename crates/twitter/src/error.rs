//! Twitter client error types.

use chrono::{DateTime, Utc};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TwitterError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    /// Provider-reported throttle. Not a failure: callers treat this as
    /// a control-flow signal carrying the authoritative quota state.
    #[error("rate limited: {remaining} calls remaining, resets at {reset_at}")]
    RateLimited {
        remaining: i32,
        reset_at: DateTime<Utc>,
    },
}

impl TwitterError {
    pub fn is_rate_limit(&self) -> bool {
        matches!(self, TwitterError::RateLimited { .. })
    }
}
