//! Job queue model: recurring units of work driven by the worker loops.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The closed set of recurring job kinds. Each type has its own lease
/// and its own polling cadence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "job_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum JobType {
    /// Discovery: fetch new mentions of the account into the store.
    SearchMentions,
    /// Reply: drain the unhandled-mention backlog within the rate limit.
    ProcessMentions,
}

impl JobType {
    /// All job types, in the order their workers are started.
    pub const ALL: [JobType; 2] = [JobType::SearchMentions, JobType::ProcessMentions];

    pub fn as_str(&self) -> &'static str {
        match self {
            JobType::SearchMentions => "search_mentions",
            JobType::ProcessMentions => "process_mentions",
        }
    }
}

impl std::fmt::Display for JobType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle of a job row: `pending → running → {completed | failed}`.
/// Terminal rows are never resurrected; new work is a fresh pending row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "job_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Running => "running",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One row of the `jobs` table.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Job {
    pub id: Uuid,
    pub job_type: JobType,
    pub status: JobStatus,
    /// Set when the job transitions to running (the lease start).
    pub started_at: Option<DateTime<Utc>>,
    /// Items successfully handled in the last completed run.
    pub tweets_consumed: i32,
    pub rate_limit_remaining: Option<i32>,
    pub rate_limit_reset: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Job {
    /// The provider-quota snapshot persisted on this row, if any.
    pub fn rate_limit_snapshot(&self) -> RateLimitSnapshot {
        RateLimitSnapshot {
            remaining: self.rate_limit_remaining,
            reset_at: self.rate_limit_reset,
        }
    }
}

/// Last known external-quota state, persisted on the job row so a later
/// run can resume a paused window instead of re-probing the provider.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RateLimitSnapshot {
    pub remaining: Option<i32>,
    pub reset_at: Option<DateTime<Utc>>,
}

/// Partial update for a job row (all fields optional).
#[derive(Debug, Clone, Default)]
pub struct JobPatch {
    pub status: Option<JobStatus>,
    pub started_at: Option<DateTime<Utc>>,
    pub tweets_consumed: Option<i32>,
    pub rate_limit_remaining: Option<i32>,
    pub rate_limit_reset: Option<DateTime<Utc>>,
}
