//! Worker error types.

use thiserror::Error;

use mentionloop_store::StoreError;
use mentionloop_twitter::TwitterError;

#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("twitter error: {0}")]
    Twitter(#[from] TwitterError),
}
