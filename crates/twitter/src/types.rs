//! Wire types for the v2 mention timeline and the domain shapes the
//! rest of the system consumes.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::warn;

use mentionloop_core::Author;

// ── Wire types ───────────────────────────────────────────────────────

/// Body of `GET /2/users/:id/mentions`.
#[derive(Debug, Deserialize)]
pub struct MentionsResponse {
    #[serde(default)]
    pub data: Vec<TweetObject>,
    #[serde(default)]
    pub includes: Includes,
}

#[derive(Debug, Default, Deserialize)]
pub struct Includes {
    #[serde(default)]
    pub users: Vec<UserObject>,
}

#[derive(Debug, Deserialize)]
pub struct TweetObject {
    pub id: String,
    pub text: String,
    pub author_id: String,
    pub created_at: DateTime<Utc>,
    pub entities: Option<TweetEntities>,
}

#[derive(Debug, Deserialize)]
pub struct TweetEntities {
    #[serde(default)]
    pub mentions: Vec<EntityMention>,
}

#[derive(Debug, Deserialize)]
pub struct EntityMention {
    pub username: String,
}

#[derive(Debug, Deserialize)]
pub struct UserObject {
    pub id: String,
    pub name: String,
    pub username: String,
    #[serde(default)]
    pub verified: bool,
    pub profile_image_url: Option<String>,
    pub public_metrics: Option<PublicMetrics>,
}

#[derive(Debug, Deserialize)]
pub struct PublicMetrics {
    #[serde(default)]
    pub followers_count: i32,
}

/// Body of `POST /2/tweets`.
#[derive(Debug, Deserialize)]
pub struct CreateTweetResponse {
    pub data: CreatedTweet,
}

#[derive(Debug, Deserialize)]
pub struct CreatedTweet {
    pub id: String,
}

// ── Domain types ─────────────────────────────────────────────────────

/// One mention from the timeline, joined with its author profile.
#[derive(Debug, Clone)]
pub struct FetchedMention {
    pub tweet_id: String,
    pub author_id: String,
    pub created_at: DateTime<Utc>,
    pub text: String,
    /// Handles the tweet explicitly @-mentions (lowercased as sent by
    /// the provider's entity parse, but matched case-insensitively).
    pub mentioned_handles: Vec<String>,
    pub author: Author,
}

impl FetchedMention {
    /// Whether the tweet explicitly @-mentions `handle`.
    pub fn mentions_handle(&self, handle: &str) -> bool {
        self.mentioned_handles
            .iter()
            .any(|h| h.eq_ignore_ascii_case(handle))
    }
}

/// Provider quota state read from response headers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RateLimitInfo {
    pub remaining: i32,
    pub reset_at: DateTime<Utc>,
}

/// One page of the mention timeline.
#[derive(Debug, Clone)]
pub struct MentionBatch {
    pub mentions: Vec<FetchedMention>,
    pub rate_limit: Option<RateLimitInfo>,
}

#[derive(Debug, Clone)]
pub struct PostedReply {
    pub tweet_id: String,
}

/// Join tweets with their expanded author profiles.
///
/// Tweets whose author is missing from `includes.users` are dropped —
/// the provider occasionally elides suspended accounts and a mention
/// row without a profile is useless downstream.
pub fn collect_mentions(response: MentionsResponse) -> Vec<FetchedMention> {
    let users: HashMap<&str, &UserObject> = response
        .includes
        .users
        .iter()
        .map(|u| (u.id.as_str(), u))
        .collect();

    let mut mentions = Vec::with_capacity(response.data.len());
    for tweet in &response.data {
        let author = match users.get(tweet.author_id.as_str()) {
            Some(user) => user,
            None => {
                warn!(tweet_id = %tweet.id, author_id = %tweet.author_id, "author missing from includes, skipping tweet");
                continue;
            }
        };

        let mentioned_handles = tweet
            .entities
            .as_ref()
            .map(|e| e.mentions.iter().map(|m| m.username.clone()).collect())
            .unwrap_or_default();

        mentions.push(FetchedMention {
            tweet_id: tweet.id.clone(),
            author_id: tweet.author_id.clone(),
            created_at: tweet.created_at,
            text: tweet.text.clone(),
            mentioned_handles,
            author: Author {
                id: author.id.clone(),
                name: author.name.clone(),
                handle: author.username.clone(),
                verified: author.verified,
                profile_image_url: author.profile_image_url.clone(),
                verified_followers_count: author
                    .public_metrics
                    .as_ref()
                    .map(|m| m.followers_count)
                    .unwrap_or(0),
            },
        });
    }

    mentions
}

#[cfg(test)]
mod tests {
    use super::*;

    fn timeline_fixture() -> MentionsResponse {
        serde_json::from_value(serde_json::json!({
            "data": [
                {
                    "id": "1001",
                    "text": "@launchaction ship it",
                    "author_id": "u1",
                    "created_at": "2025-06-01T10:00:00Z",
                    "entities": { "mentions": [{ "username": "LaunchAction" }] }
                },
                {
                    "id": "1002",
                    "text": "talking about launches in general",
                    "author_id": "u2",
                    "created_at": "2025-06-01T10:05:00Z"
                },
                {
                    "id": "1003",
                    "text": "@launchaction also this",
                    "author_id": "ghost",
                    "created_at": "2025-06-01T10:06:00Z",
                    "entities": { "mentions": [{ "username": "launchaction" }] }
                }
            ],
            "includes": {
                "users": [
                    {
                        "id": "u1",
                        "name": "Alice",
                        "username": "alice",
                        "verified": true,
                        "profile_image_url": "https://img.example/alice.png",
                        "public_metrics": { "followers_count": 120 }
                    },
                    { "id": "u2", "name": "Bob", "username": "bob" }
                ]
            }
        }))
        .unwrap()
    }

    #[test]
    fn test_collect_joins_authors_and_drops_orphans() {
        let mentions = collect_mentions(timeline_fixture());
        // Tweet 1003's author is absent from includes and is dropped.
        assert_eq!(mentions.len(), 2);

        let first = &mentions[0];
        assert_eq!(first.tweet_id, "1001");
        assert_eq!(first.author.handle, "alice");
        assert!(first.author.verified);
        assert_eq!(first.author.verified_followers_count, 120);

        let second = &mentions[1];
        assert_eq!(second.author.name, "Bob");
        assert_eq!(second.author.verified_followers_count, 0);
        assert!(second.mentioned_handles.is_empty());
    }

    #[test]
    fn test_mentions_handle_is_case_insensitive() {
        let mentions = collect_mentions(timeline_fixture());
        assert!(mentions[0].mentions_handle("launchaction"));
        assert!(mentions[0].mentions_handle("LAUNCHACTION"));
        assert!(!mentions[1].mentions_handle("launchaction"));
    }

    #[test]
    fn test_empty_timeline_parses() {
        let response: MentionsResponse = serde_json::from_value(serde_json::json!({
            "meta": { "result_count": 0 }
        }))
        .unwrap();
        assert!(collect_mentions(response).is_empty());
    }
}
