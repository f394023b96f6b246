//! Shared handle passed down to the worker loops.

use std::sync::Arc;

use mentionloop_store::{JobStore, MentionStore};
use mentionloop_twitter::SocialClient;

use crate::compose::ReplyComposer;

/// Everything a job execution needs, constructed once at process start
/// and passed down explicitly (no module-level singletons).
pub struct WorkerContext {
    pub jobs: Arc<dyn JobStore>,
    pub mentions: Arc<dyn MentionStore>,
    pub client: Arc<dyn SocialClient>,
    pub composer: Arc<dyn ReplyComposer>,
    /// Numeric id of the account whose mentions are watched.
    pub user_id: String,
    /// Handle of that account, for the ingestion filter.
    pub account_handle: String,
}
