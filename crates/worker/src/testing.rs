//! Test doubles shared by the worker tests.

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use mentionloop_core::{Author, Job, JobPatch, JobType, NewMention, RateLimitSnapshot};
use mentionloop_store::{JobStore, MemoryJobStore, MemoryMentionStore, MentionStore};
use mentionloop_twitter::{FetchedMention, MentionBatch, PostedReply, SocialClient, TwitterError};

use crate::compose::StaticComposer;
use crate::context::WorkerContext;

/// Scripted social client: queued fetch/reply outcomes, recorded calls.
#[derive(Default)]
pub(crate) struct StubClient {
    fetch_script: Mutex<VecDeque<Result<MentionBatch, TwitterError>>>,
    reply_script: Mutex<VecDeque<Result<PostedReply, TwitterError>>>,
    pub fetch_calls: Mutex<Vec<Option<String>>>,
    pub posted: Mutex<Vec<String>>,
}

impl StubClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn script_fetch(&self, result: Result<MentionBatch, TwitterError>) {
        self.fetch_script.lock().await.push_back(result);
    }

    pub async fn script_reply(&self, result: Result<PostedReply, TwitterError>) {
        self.reply_script.lock().await.push_back(result);
    }

    pub async fn posted_count(&self) -> usize {
        self.posted.lock().await.len()
    }
}

#[async_trait]
impl SocialClient for StubClient {
    async fn fetch_mentions_since(
        &self,
        _user_id: &str,
        _page_size: u32,
        since_id: Option<&str>,
    ) -> Result<MentionBatch, TwitterError> {
        self.fetch_calls
            .lock()
            .await
            .push(since_id.map(|s| s.to_string()));
        match self.fetch_script.lock().await.pop_front() {
            Some(result) => result,
            None => Ok(MentionBatch {
                mentions: Vec::new(),
                rate_limit: None,
            }),
        }
    }

    async fn post_reply(&self, target_id: &str, _text: &str) -> Result<PostedReply, TwitterError> {
        self.posted.lock().await.push(target_id.to_string());
        match self.reply_script.lock().await.pop_front() {
            Some(result) => result,
            None => Ok(PostedReply {
                tweet_id: format!("reply-{target_id}"),
            }),
        }
    }
}

pub(crate) struct TestHarness {
    pub ctx: Arc<WorkerContext>,
    pub jobs: Arc<MemoryJobStore>,
    pub mentions: Arc<MemoryMentionStore>,
    pub client: Arc<StubClient>,
}

pub(crate) fn harness() -> TestHarness {
    let jobs = Arc::new(MemoryJobStore::new());
    let mentions = Arc::new(MemoryMentionStore::new());
    let client = Arc::new(StubClient::new());
    let ctx = Arc::new(WorkerContext {
        jobs: jobs.clone(),
        mentions: mentions.clone(),
        client: client.clone(),
        composer: Arc::new(StaticComposer::new("hello")),
        user_id: "42".to_string(),
        account_handle: "launchaction".to_string(),
    });
    TestHarness {
        ctx,
        jobs,
        mentions,
        client,
    }
}

pub(crate) fn fetched_mention(id: &str, targets: &[&str], at: DateTime<Utc>) -> FetchedMention {
    FetchedMention {
        tweet_id: id.to_string(),
        author_id: format!("author-{id}"),
        created_at: at,
        text: format!("@launchaction tweet {id}"),
        mentioned_handles: targets.iter().map(|t| t.to_string()).collect(),
        author: Author {
            id: format!("author-{id}"),
            name: format!("Author {id}"),
            handle: format!("handle_{id}"),
            verified: false,
            profile_image_url: None,
            verified_followers_count: 1,
        },
    }
}

pub(crate) fn batch(mentions: Vec<FetchedMention>) -> MentionBatch {
    MentionBatch {
        mentions,
        rate_limit: None,
    }
}

pub(crate) async fn seed_unhandled(store: &MemoryMentionStore, id: &str, at: DateTime<Utc>) {
    store
        .upsert_mention(&NewMention {
            tweet_id: id.to_string(),
            author_id: format!("author-{id}"),
            created_at: at,
            text: format!("@launchaction tweet {id}"),
        })
        .await
        .unwrap();
}

/// Create a job of `job_type`, optionally pre-load a quota snapshot on
/// it, and claim it into running state.
pub(crate) async fn claimed_job(
    jobs: &MemoryJobStore,
    job_type: JobType,
    snapshot: Option<RateLimitSnapshot>,
) -> Job {
    let created = jobs.create(job_type).await.unwrap();
    if let Some(snapshot) = snapshot {
        jobs.update_fields(
            created.id,
            JobPatch {
                rate_limit_remaining: snapshot.remaining,
                rate_limit_reset: snapshot.reset_at,
                ..Default::default()
            },
        )
        .await
        .unwrap();
    }
    jobs.claim_next(job_type).await.unwrap()
}
