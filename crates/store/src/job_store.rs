//! PostgreSQL-backed [`JobStore`].
//!
//! The claim path is a single transaction with a row lock
//! (`FOR UPDATE SKIP LOCKED`), which is what upholds the one-running-
//! job-per-type invariant across concurrent ticks and across process
//! instances.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use mentionloop_core::{Job, JobPatch, JobStatus, JobType, RateLimitSnapshot};

use crate::error::StoreError;
use crate::traits::JobStore;

#[derive(Debug, Clone)]
pub struct PgJobStore {
    pool: PgPool,
}

impl PgJobStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl JobStore for PgJobStore {
    async fn create(&self, job_type: JobType) -> Result<Job, StoreError> {
        let job = sqlx::query_as::<_, Job>(
            "INSERT INTO jobs (id, job_type) VALUES ($1, $2)
             RETURNING id, job_type, status, started_at, tweets_consumed,
                       rate_limit_remaining, rate_limit_reset, created_at",
        )
        .bind(Uuid::new_v4())
        .bind(job_type)
        .fetch_one(&self.pool)
        .await?;
        Ok(job)
    }

    async fn get(&self, id: Uuid) -> Result<Option<Job>, StoreError> {
        let job = sqlx::query_as::<_, Job>(
            "SELECT id, job_type, status, started_at, tweets_consumed,
                    rate_limit_remaining, rate_limit_reset, created_at
             FROM jobs WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(job)
    }

    async fn update_fields(&self, id: Uuid, patch: JobPatch) -> Result<Job, StoreError> {
        let job = sqlx::query_as::<_, Job>(
            "UPDATE jobs SET
                status = COALESCE($2, status),
                started_at = COALESCE($3, started_at),
                tweets_consumed = COALESCE($4, tweets_consumed),
                rate_limit_remaining = COALESCE($5, rate_limit_remaining),
                rate_limit_reset = COALESCE($6, rate_limit_reset)
             WHERE id = $1
             RETURNING id, job_type, status, started_at, tweets_consumed,
                       rate_limit_remaining, rate_limit_reset, created_at",
        )
        .bind(id)
        .bind(patch.status)
        .bind(patch.started_at)
        .bind(patch.tweets_consumed)
        .bind(patch.rate_limit_remaining)
        .bind(patch.rate_limit_reset)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StoreError::NotFound(id))?;
        Ok(job)
    }

    async fn latest_by_type(&self, job_type: JobType) -> Result<Option<Job>, StoreError> {
        let job = sqlx::query_as::<_, Job>(
            "SELECT id, job_type, status, started_at, tweets_consumed,
                    rate_limit_remaining, rate_limit_reset, created_at
             FROM jobs WHERE job_type = $1
             ORDER BY created_at DESC
             LIMIT 1",
        )
        .bind(job_type)
        .fetch_optional(&self.pool)
        .await?;
        Ok(job)
    }

    async fn oldest_pending_by_type(&self, job_type: JobType) -> Result<Option<Job>, StoreError> {
        let job = sqlx::query_as::<_, Job>(
            "SELECT id, job_type, status, started_at, tweets_consumed,
                    rate_limit_remaining, rate_limit_reset, created_at
             FROM jobs WHERE job_type = $1 AND status = 'pending'
             ORDER BY created_at ASC
             LIMIT 1",
        )
        .bind(job_type)
        .fetch_optional(&self.pool)
        .await?;
        Ok(job)
    }

    async fn bulk_transition(
        &self,
        job_type: JobType,
        from: JobStatus,
        to: JobStatus,
    ) -> Result<u64, StoreError> {
        let result = sqlx::query("UPDATE jobs SET status = $3 WHERE job_type = $1 AND status = $2")
            .bind(job_type)
            .bind(from)
            .bind(to)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn claim_next(&self, job_type: JobType) -> Result<Job, StoreError> {
        let mut tx = self.pool.begin().await?;

        let pending = sqlx::query_as::<_, Job>(
            "SELECT id, job_type, status, started_at, tweets_consumed,
                    rate_limit_remaining, rate_limit_reset, created_at
             FROM jobs WHERE job_type = $1 AND status = 'pending'
             ORDER BY created_at ASC
             LIMIT 1
             FOR UPDATE SKIP LOCKED",
        )
        .bind(job_type)
        .fetch_optional(&mut *tx)
        .await?;

        let job = match pending {
            Some(job) => {
                sqlx::query_as::<_, Job>(
                    "UPDATE jobs SET status = 'running', started_at = now()
                     WHERE id = $1
                     RETURNING id, job_type, status, started_at, tweets_consumed,
                               rate_limit_remaining, rate_limit_reset, created_at",
                )
                .bind(job.id)
                .fetch_one(&mut *tx)
                .await?
            }
            // Queue is empty: seed it with a pending row and return it
            // unstarted; the next tick picks it up.
            None => {
                sqlx::query_as::<_, Job>(
                    "INSERT INTO jobs (id, job_type) VALUES ($1, $2)
                     RETURNING id, job_type, status, started_at, tweets_consumed,
                               rate_limit_remaining, rate_limit_reset, created_at",
                )
                .bind(Uuid::new_v4())
                .bind(job_type)
                .fetch_one(&mut *tx)
                .await?
            }
        };

        tx.commit().await?;
        Ok(job)
    }

    async fn complete(
        &self,
        id: Uuid,
        tweets_consumed: i32,
        rate_limit: Option<RateLimitSnapshot>,
    ) -> Result<(), StoreError> {
        let snapshot = rate_limit.unwrap_or_default();
        sqlx::query(
            "UPDATE jobs SET
                tweets_consumed = $2,
                rate_limit_remaining = $3,
                rate_limit_reset = $4,
                status = CASE WHEN status = 'running' THEN 'completed'::job_status ELSE status END
             WHERE id = $1",
        )
        .bind(id)
        .bind(tweets_consumed)
        .bind(snapshot.remaining)
        .bind(snapshot.reset_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn fail(&self, id: Uuid) -> Result<(), StoreError> {
        sqlx::query("UPDATE jobs SET status = 'failed' WHERE id = $1 AND status = 'running'")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
