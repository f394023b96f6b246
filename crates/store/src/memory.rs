//! In-memory store backend.
//!
//! Backs tests and Postgres-free local runs. The claim path holds the
//! jobs mutex across the whole read-then-conditional-write, giving it
//! the same per-type serialization the Postgres backend gets from its
//! row lock.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use uuid::Uuid;

use mentionloop_core::{
    Author, Job, JobPatch, JobStatus, JobType, Mention, NewMention, RateLimitSnapshot,
};

use crate::error::StoreError;
use crate::traits::{JobStore, MentionStore};

#[derive(Default)]
pub struct MemoryJobStore {
    jobs: Mutex<Vec<Job>>,
}

impl MemoryJobStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn new_job(job_type: JobType) -> Job {
        Job {
            id: Uuid::new_v4(),
            job_type,
            status: JobStatus::Pending,
            started_at: None,
            tweets_consumed: 0,
            rate_limit_remaining: None,
            rate_limit_reset: None,
            created_at: Utc::now(),
        }
    }

    /// Number of jobs of a type currently in `status`.
    pub async fn count_in_status(&self, job_type: JobType, status: JobStatus) -> usize {
        self.jobs
            .lock()
            .await
            .iter()
            .filter(|j| j.job_type == job_type && j.status == status)
            .count()
    }
}

#[async_trait]
impl JobStore for MemoryJobStore {
    async fn create(&self, job_type: JobType) -> Result<Job, StoreError> {
        let job = Self::new_job(job_type);
        self.jobs.lock().await.push(job.clone());
        Ok(job)
    }

    async fn get(&self, id: Uuid) -> Result<Option<Job>, StoreError> {
        Ok(self.jobs.lock().await.iter().find(|j| j.id == id).cloned())
    }

    async fn update_fields(&self, id: Uuid, patch: JobPatch) -> Result<Job, StoreError> {
        let mut jobs = self.jobs.lock().await;
        let job = jobs
            .iter_mut()
            .find(|j| j.id == id)
            .ok_or(StoreError::NotFound(id))?;
        if let Some(status) = patch.status {
            job.status = status;
        }
        if let Some(started_at) = patch.started_at {
            job.started_at = Some(started_at);
        }
        if let Some(consumed) = patch.tweets_consumed {
            job.tweets_consumed = consumed;
        }
        if let Some(remaining) = patch.rate_limit_remaining {
            job.rate_limit_remaining = Some(remaining);
        }
        if let Some(reset) = patch.rate_limit_reset {
            job.rate_limit_reset = Some(reset);
        }
        Ok(job.clone())
    }

    async fn latest_by_type(&self, job_type: JobType) -> Result<Option<Job>, StoreError> {
        Ok(self
            .jobs
            .lock()
            .await
            .iter()
            .filter(|j| j.job_type == job_type)
            .max_by_key(|j| j.created_at)
            .cloned())
    }

    async fn oldest_pending_by_type(&self, job_type: JobType) -> Result<Option<Job>, StoreError> {
        Ok(self
            .jobs
            .lock()
            .await
            .iter()
            .filter(|j| j.job_type == job_type && j.status == JobStatus::Pending)
            .min_by_key(|j| j.created_at)
            .cloned())
    }

    async fn bulk_transition(
        &self,
        job_type: JobType,
        from: JobStatus,
        to: JobStatus,
    ) -> Result<u64, StoreError> {
        let mut jobs = self.jobs.lock().await;
        let mut moved = 0u64;
        for job in jobs.iter_mut() {
            if job.job_type == job_type && job.status == from {
                job.status = to;
                moved += 1;
            }
        }
        Ok(moved)
    }

    async fn claim_next(&self, job_type: JobType) -> Result<Job, StoreError> {
        let mut jobs = self.jobs.lock().await;

        let idx = jobs
            .iter()
            .enumerate()
            .filter(|(_, j)| j.job_type == job_type && j.status == JobStatus::Pending)
            .min_by_key(|(_, j)| j.created_at)
            .map(|(i, _)| i);

        match idx {
            Some(i) => {
                let job = &mut jobs[i];
                job.status = JobStatus::Running;
                job.started_at = Some(Utc::now());
                Ok(job.clone())
            }
            None => {
                let job = Self::new_job(job_type);
                jobs.push(job.clone());
                Ok(job)
            }
        }
    }

    async fn complete(
        &self,
        id: Uuid,
        tweets_consumed: i32,
        rate_limit: Option<RateLimitSnapshot>,
    ) -> Result<(), StoreError> {
        let mut jobs = self.jobs.lock().await;
        if let Some(job) = jobs.iter_mut().find(|j| j.id == id) {
            let snapshot = rate_limit.unwrap_or_default();
            job.tweets_consumed = tweets_consumed;
            job.rate_limit_remaining = snapshot.remaining;
            job.rate_limit_reset = snapshot.reset_at;
            if job.status == JobStatus::Running {
                job.status = JobStatus::Completed;
            }
        }
        Ok(())
    }

    async fn fail(&self, id: Uuid) -> Result<(), StoreError> {
        let mut jobs = self.jobs.lock().await;
        if let Some(job) = jobs.iter_mut().find(|j| j.id == id) {
            if job.status == JobStatus::Running {
                job.status = JobStatus::Failed;
            }
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryMentionStore {
    mentions: Mutex<HashMap<String, Mention>>,
    authors: Mutex<HashMap<String, Author>>,
}

impl MemoryMentionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn mention_count(&self) -> usize {
        self.mentions.lock().await.len()
    }
}

#[async_trait]
impl MentionStore for MemoryMentionStore {
    async fn upsert_author(&self, author: &Author) -> Result<(), StoreError> {
        self.authors
            .lock()
            .await
            .insert(author.id.clone(), author.clone());
        Ok(())
    }

    async fn upsert_mention(&self, mention: &NewMention) -> Result<(), StoreError> {
        let mut mentions = self.mentions.lock().await;
        match mentions.get_mut(&mention.tweet_id) {
            // Re-ingest never touches the handled flag.
            Some(existing) => {
                existing.author_id = mention.author_id.clone();
                existing.created_at = mention.created_at;
                existing.text = mention.text.clone();
            }
            None => {
                mentions.insert(
                    mention.tweet_id.clone(),
                    Mention {
                        tweet_id: mention.tweet_id.clone(),
                        author_id: mention.author_id.clone(),
                        created_at: mention.created_at,
                        text: mention.text.clone(),
                        handled: false,
                        handled_at: None,
                    },
                );
            }
        }
        Ok(())
    }

    async fn get(&self, tweet_id: &str) -> Result<Option<Mention>, StoreError> {
        Ok(self.mentions.lock().await.get(tweet_id).cloned())
    }

    async fn author(&self, id: &str) -> Result<Option<Author>, StoreError> {
        Ok(self.authors.lock().await.get(id).cloned())
    }

    async fn latest(&self) -> Result<Option<Mention>, StoreError> {
        Ok(self
            .mentions
            .lock()
            .await
            .values()
            .max_by_key(|m| m.created_at)
            .cloned())
    }

    async fn unhandled(&self, limit: i64) -> Result<Vec<Mention>, StoreError> {
        let mut backlog: Vec<Mention> = self
            .mentions
            .lock()
            .await
            .values()
            .filter(|m| !m.handled)
            .cloned()
            .collect();
        backlog.sort_by_key(|m| m.created_at);
        backlog.truncate(limit.max(0) as usize);
        Ok(backlog)
    }

    async fn mark_handled(&self, tweet_id: &str, at: DateTime<Utc>) -> Result<(), StoreError> {
        if let Some(mention) = self.mentions.lock().await.get_mut(tweet_id) {
            mention.handled = true;
            mention.handled_at = Some(at);
        }
        Ok(())
    }
}
