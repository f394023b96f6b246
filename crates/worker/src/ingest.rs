//! Discovery execution: fetch the mention timeline past the stored
//! high-water mark and upsert what it returns.

use tracing::{debug, info};

use mentionloop_core::{Job, NewMention};

use crate::context::WorkerContext;
use crate::error::WorkerError;

/// Mentions requested per discovery run.
const MENTION_PAGE_SIZE: u32 = 100;

/// Outcome of one discovery run.
#[derive(Debug, Clone, Copy)]
pub struct IngestOutcome {
    /// Mentions the provider returned.
    pub fetched: usize,
    /// Mentions that targeted the account and were stored.
    pub ingested: i32,
}

/// Fetch mentions newer than the most recently stored one and upsert
/// each author + mention pair. Completes the job with the ingested
/// count; any error propagates to the tick handler, which fails the
/// job.
pub async fn run_search_mentions(
    ctx: &WorkerContext,
    job: &Job,
) -> Result<IngestOutcome, WorkerError> {
    let since_id = ctx.mentions.latest().await?.map(|m| m.tweet_id);

    let batch = ctx
        .client
        .fetch_mentions_since(&ctx.user_id, MENTION_PAGE_SIZE, since_id.as_deref())
        .await?;
    let fetched = batch.mentions.len();

    let mut ingested = 0i32;
    for mention in &batch.mentions {
        // The timeline can return superset matches; only store tweets
        // that actually @-mention the account.
        if !mention.mentions_handle(&ctx.account_handle) {
            debug!(tweet_id = %mention.tweet_id, "skipping tweet that does not target the account");
            continue;
        }

        ctx.mentions.upsert_author(&mention.author).await?;
        ctx.mentions
            .upsert_mention(&NewMention {
                tweet_id: mention.tweet_id.clone(),
                author_id: mention.author_id.clone(),
                created_at: mention.created_at,
                text: mention.text.clone(),
            })
            .await?;
        ingested += 1;
    }

    ctx.jobs.complete(job.id, ingested, None).await?;
    info!(job_id = %job.id, fetched, ingested, "mention search complete");

    Ok(IngestOutcome { fetched, ingested })
}
