//! Reply execution: drain a bounded page of the unhandled-mention
//! backlog while respecting the provider's call budget.

use chrono::Utc;
use tracing::{debug, info, warn};

use mentionloop_core::{Job, Mention, RateLimitSnapshot};
use mentionloop_twitter::TwitterError;

use crate::context::WorkerContext;
use crate::error::WorkerError;
use crate::quota::QuotaTracker;

/// Unhandled mentions drained per reply run, oldest first.
const REPLY_PAGE_SIZE: i64 = 50;

/// Outcome of one reply run.
#[derive(Debug, Clone, Copy)]
pub struct BatchOutcome {
    /// Mentions successfully replied to and marked handled.
    pub processed: i32,
    /// Reply attempts made (processed + failed, excluding quota skips).
    pub attempted: usize,
    /// Whether any item failed with a non-rate-limit error.
    pub failed: bool,
    /// Final quota state, as persisted on the job.
    pub snapshot: RateLimitSnapshot,
}

/// Walk the backlog page in order, stopping early when the quota
/// tracker says further calls are certain to be rejected or when the
/// provider reports a rate limit mid-run. A non-rate-limit failure on
/// one mention marks the job failed but does not block the rest of the
/// page. The processed count and final quota snapshot are persisted
/// either way.
pub async fn run_process_mentions(
    ctx: &WorkerContext,
    job: &Job,
) -> Result<BatchOutcome, WorkerError> {
    let backlog = ctx.mentions.unhandled(REPLY_PAGE_SIZE).await?;

    let mut quota = QuotaTracker::from_snapshot(job.rate_limit_snapshot());
    let mut processed = 0i32;
    let mut attempted = 0usize;
    let mut failed = false;

    for mention in &backlog {
        if quota.is_exhausted(Utc::now()) {
            info!(
                job_id = %job.id,
                reset_at = ?quota.snapshot().reset_at,
                "call budget exhausted, stopping batch"
            );
            break;
        }

        attempted += 1;
        match reply_to(ctx, mention).await {
            Ok(()) => {
                ctx.mentions
                    .mark_handled(&mention.tweet_id, Utc::now())
                    .await?;
                quota.record_success();
                processed += 1;
            }
            Err(TwitterError::RateLimited {
                remaining,
                reset_at,
            }) => {
                // Provider state wins over local bookkeeping.
                warn!(
                    job_id = %job.id,
                    remaining,
                    reset_at = %reset_at,
                    "provider reported rate limit, stopping batch"
                );
                quota.apply_provider(remaining, reset_at);
                break;
            }
            Err(e) => {
                warn!(tweet_id = %mention.tweet_id, error = %e, "reply failed, continuing batch");
                ctx.jobs.fail(job.id).await?;
                failed = true;
            }
        }
    }

    let snapshot = quota.snapshot();
    ctx.jobs.complete(job.id, processed, Some(snapshot)).await?;
    info!(
        job_id = %job.id,
        backlog = backlog.len(),
        attempted,
        processed,
        "mention processing complete"
    );

    Ok(BatchOutcome {
        processed,
        attempted,
        failed,
        snapshot,
    })
}

async fn reply_to(ctx: &WorkerContext, mention: &Mention) -> Result<(), TwitterError> {
    let text = ctx.composer.compose(mention);
    let posted = ctx.client.post_reply(&mention.tweet_id, &text).await?;
    debug!(tweet_id = %mention.tweet_id, reply_id = %posted.tweet_id, "replied");
    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use mentionloop_core::{JobStatus, JobType};
    use mentionloop_store::{JobStore, MentionStore};
    use mentionloop_twitter::PostedReply;

    use crate::testing::{claimed_job, harness, seed_unhandled};

    use super::*;

    #[tokio::test]
    async fn test_stops_when_local_budget_runs_out() {
        let h = harness();
        let base = Utc::now();
        seed_unhandled(&h.mentions, "m1", base).await;
        seed_unhandled(&h.mentions, "m2", base + Duration::seconds(1)).await;

        let job = claimed_job(
            &h.jobs,
            JobType::ProcessMentions,
            Some(RateLimitSnapshot {
                remaining: Some(1),
                reset_at: Some(base + Duration::minutes(15)),
            }),
        )
        .await;

        let outcome = run_process_mentions(&h.ctx, &job).await.unwrap();
        assert_eq!(outcome.processed, 1);
        assert_eq!(h.client.posted_count().await, 1);

        // Oldest first: m1 is handled, m2 is left for the next run.
        let m1 = h.mentions.get("m1").await.unwrap().unwrap();
        assert!(m1.handled);
        assert!(m1.handled_at.is_some());
        assert!(!h.mentions.get("m2").await.unwrap().unwrap().handled);

        let row = h.jobs.get(job.id).await.unwrap().unwrap();
        assert_eq!(row.status, JobStatus::Completed);
        assert_eq!(row.tweets_consumed, 1);
        assert_eq!(row.rate_limit_remaining, Some(0));
    }

    #[tokio::test]
    async fn test_provider_rate_limit_stops_batch_and_persists_snapshot() {
        let h = harness();
        let base = Utc::now();
        let reset = base + Duration::minutes(15);
        seed_unhandled(&h.mentions, "m1", base).await;
        seed_unhandled(&h.mentions, "m2", base + Duration::seconds(1)).await;

        let job = claimed_job(&h.jobs, JobType::ProcessMentions, None).await;
        h.client
            .script_reply(Err(TwitterError::RateLimited {
                remaining: 0,
                reset_at: reset,
            }))
            .await;

        let outcome = run_process_mentions(&h.ctx, &job).await.unwrap();
        assert_eq!(outcome.processed, 0);
        assert!(!outcome.failed);
        // Only the first mention was attempted; nothing was handled.
        assert_eq!(h.client.posted_count().await, 1);
        assert!(!h.mentions.get("m1").await.unwrap().unwrap().handled);

        // A rate limit is not a failure.
        let row = h.jobs.get(job.id).await.unwrap().unwrap();
        assert_eq!(row.status, JobStatus::Completed);
        assert_eq!(row.tweets_consumed, 0);
        assert_eq!(row.rate_limit_remaining, Some(0));
        assert_eq!(row.rate_limit_reset, Some(reset));
    }

    #[tokio::test]
    async fn test_item_failure_marks_job_failed_but_batch_continues() {
        let h = harness();
        let base = Utc::now();
        for i in 0..3 {
            seed_unhandled(&h.mentions, &format!("m{i}"), base + Duration::seconds(i)).await;
        }

        let job = claimed_job(&h.jobs, JobType::ProcessMentions, None).await;
        h.client
            .script_reply(Ok(PostedReply {
                tweet_id: "r0".to_string(),
            }))
            .await;
        h.client
            .script_reply(Err(TwitterError::Api {
                status: 403,
                message: "you cannot reply to this tweet".to_string(),
            }))
            .await;
        h.client
            .script_reply(Ok(PostedReply {
                tweet_id: "r2".to_string(),
            }))
            .await;

        let outcome = run_process_mentions(&h.ctx, &job).await.unwrap();
        assert_eq!(outcome.attempted, 3);
        assert_eq!(outcome.processed, 2);
        assert!(outcome.failed);

        assert!(h.mentions.get("m0").await.unwrap().unwrap().handled);
        assert!(!h.mentions.get("m1").await.unwrap().unwrap().handled);
        assert!(h.mentions.get("m2").await.unwrap().unwrap().handled);

        // The failure wins the status race; counters still persist.
        let row = h.jobs.get(job.id).await.unwrap().unwrap();
        assert_eq!(row.status, JobStatus::Failed);
        assert_eq!(row.tweets_consumed, 2);
    }

    #[tokio::test]
    async fn test_exhausted_snapshot_attempts_nothing() {
        let h = harness();
        let base = Utc::now();
        let reset = base + Duration::minutes(10);
        seed_unhandled(&h.mentions, "m1", base).await;
        seed_unhandled(&h.mentions, "m2", base + Duration::seconds(1)).await;

        let job = claimed_job(
            &h.jobs,
            JobType::ProcessMentions,
            Some(RateLimitSnapshot {
                remaining: Some(0),
                reset_at: Some(reset),
            }),
        )
        .await;

        let outcome = run_process_mentions(&h.ctx, &job).await.unwrap();
        assert_eq!(outcome.attempted, 0);
        assert_eq!(outcome.processed, 0);
        assert_eq!(h.client.posted_count().await, 0);

        // The paused window is carried forward unchanged.
        let row = h.jobs.get(job.id).await.unwrap().unwrap();
        assert_eq!(row.status, JobStatus::Completed);
        assert_eq!(row.rate_limit_remaining, Some(0));
        assert_eq!(row.rate_limit_reset, Some(reset));
    }

    #[tokio::test]
    async fn test_window_reopens_once_reset_has_passed() {
        let h = harness();
        let base = Utc::now();
        seed_unhandled(&h.mentions, "m1", base).await;

        let job = claimed_job(
            &h.jobs,
            JobType::ProcessMentions,
            Some(RateLimitSnapshot {
                remaining: Some(0),
                reset_at: Some(base - Duration::seconds(30)),
            }),
        )
        .await;

        let outcome = run_process_mentions(&h.ctx, &job).await.unwrap();
        assert_eq!(outcome.processed, 1);
        assert!(h.mentions.get("m1").await.unwrap().unwrap().handled);
    }

    #[tokio::test]
    async fn test_empty_backlog_completes_with_zero() {
        let h = harness();
        let job = claimed_job(&h.jobs, JobType::ProcessMentions, None).await;

        let outcome = run_process_mentions(&h.ctx, &job).await.unwrap();
        assert_eq!(outcome.processed, 0);
        assert_eq!(h.client.posted_count().await, 0);

        let row = h.jobs.get(job.id).await.unwrap().unwrap();
        assert_eq!(row.status, JobStatus::Completed);
    }
}
