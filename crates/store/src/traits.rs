//! Storage traits for jobs, mentions, and authors.
//!
//! Implementations handle the specifics of a particular backend
//! (PostgreSQL in production, in-memory for tests and local runs).
//! The lease protocol lives here too: `claim_next` is the single
//! serialization point that keeps at most one job of a type running.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use mentionloop_core::{Author, Job, JobPatch, JobStatus, JobType, Mention, NewMention, RateLimitSnapshot};

use crate::error::StoreError;

/// Durable table of job records plus the lease state machine on top.
///
/// No caller other than these operations may change a job's `status`.
#[async_trait]
pub trait JobStore: Send + Sync {
    /// Insert a new pending job of the given type.
    async fn create(&self, job_type: JobType) -> Result<Job, StoreError>;

    /// Fetch a job by id.
    async fn get(&self, id: Uuid) -> Result<Option<Job>, StoreError>;

    /// Apply a partial update. Fails with [`StoreError::NotFound`] if no
    /// job with `id` exists.
    async fn update_fields(&self, id: Uuid, patch: JobPatch) -> Result<Job, StoreError>;

    /// Most recent job of a type, by `created_at` descending.
    async fn latest_by_type(&self, job_type: JobType) -> Result<Option<Job>, StoreError>;

    /// Oldest pending job of a type (FIFO fairness among retries).
    async fn oldest_pending_by_type(&self, job_type: JobType) -> Result<Option<Job>, StoreError>;

    /// Move every job of `job_type` currently in `from` to `to`.
    /// Returns the number of rows transitioned.
    async fn bulk_transition(
        &self,
        job_type: JobType,
        from: JobStatus,
        to: JobStatus,
    ) -> Result<u64, StoreError>;

    /// Claim the next job of a type, atomically.
    ///
    /// If a pending job exists, it transitions to running (with
    /// `started_at` set) and is returned. If none exists, a fresh
    /// pending job is created and returned *without* being started —
    /// the caller's next poll cycle picks it up. The whole
    /// read-then-conditional-write is serialized per type, so two
    /// concurrent claims can never both transition the same row.
    async fn claim_next(&self, job_type: JobType) -> Result<Job, StoreError>;

    /// Transition `running → completed` and persist the run's counters.
    ///
    /// The counters are written unconditionally, but the status only
    /// moves if the row is still running — a racing `fail` wins and is
    /// not overwritten. Safe to call on a non-running row.
    async fn complete(
        &self,
        id: Uuid,
        tweets_consumed: i32,
        rate_limit: Option<RateLimitSnapshot>,
    ) -> Result<(), StoreError>;

    /// Transition `running → failed`. Safe to call on a non-running row.
    async fn fail(&self, id: Uuid) -> Result<(), StoreError>;

    /// Crash-recovery sweep: move every running job of `job_type` back
    /// to pending. Run once per type at process start, before the
    /// worker loop begins, to recover jobs orphaned by an unclean
    /// shutdown. Assumes no other instance of the same worker type is
    /// live at that moment.
    async fn reschedule(&self, job_type: JobType) -> Result<u64, StoreError> {
        self.bulk_transition(job_type, JobStatus::Running, JobStatus::Pending)
            .await
    }
}

/// Mention and author persistence. All writes are idempotent upserts
/// keyed by the external identifier.
#[async_trait]
pub trait MentionStore: Send + Sync {
    /// Insert or update an author profile (last write wins).
    async fn upsert_author(&self, author: &Author) -> Result<(), StoreError>;

    /// Insert or update a mention. Re-ingesting the same `tweet_id`
    /// never duplicates a row and never touches the handled flag.
    async fn upsert_mention(&self, mention: &NewMention) -> Result<(), StoreError>;

    /// Fetch a mention by its external id.
    async fn get(&self, tweet_id: &str) -> Result<Option<Mention>, StoreError>;

    /// Fetch an author by its external id.
    async fn author(&self, id: &str) -> Result<Option<Author>, StoreError>;

    /// Most recently created mention — the high-water-mark cursor for
    /// the next discovery fetch.
    async fn latest(&self) -> Result<Option<Mention>, StoreError>;

    /// Up to `limit` unhandled mentions, oldest first.
    async fn unhandled(&self, limit: i64) -> Result<Vec<Mention>, StoreError>;

    /// Mark a mention handled at `at`.
    async fn mark_handled(&self, tweet_id: &str, at: DateTime<Utc>) -> Result<(), StoreError>;
}
