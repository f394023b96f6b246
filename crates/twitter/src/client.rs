//! Social API client trait and the reqwest-backed implementation.

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use reqwest::header::HeaderMap;
use reqwest::StatusCode;
use tracing::debug;

use mentionloop_core::config::TwitterConfig;

use crate::error::TwitterError;
use crate::types::{
    collect_mentions, CreateTweetResponse, MentionBatch, MentionsResponse, PostedReply,
    RateLimitInfo,
};

/// Fallback pause when a 429 arrives without usable reset headers.
/// The v2 endpoints run on 15-minute windows.
const DEFAULT_RESET_WINDOW_SECS: i64 = 900;

/// The two operations the engine needs from the social provider.
///
/// Implementations handle transport and auth; rate-limit responses are
/// surfaced as [`TwitterError::RateLimited`] with the provider's
/// remaining/reset values, never as a generic failure.
#[async_trait]
pub trait SocialClient: Send + Sync {
    /// One page of the account's mention timeline, newer than
    /// `since_id` when given (provider default backfill otherwise).
    async fn fetch_mentions_since(
        &self,
        user_id: &str,
        page_size: u32,
        since_id: Option<&str>,
    ) -> Result<MentionBatch, TwitterError>;

    /// Post `text` as a reply to the tweet `target_id`.
    async fn post_reply(&self, target_id: &str, text: &str) -> Result<PostedReply, TwitterError>;
}

/// Parse `x-rate-limit-remaining` / `x-rate-limit-reset` (epoch secs).
pub fn parse_rate_limit(headers: &HeaderMap) -> Option<RateLimitInfo> {
    let remaining: i32 = headers
        .get("x-rate-limit-remaining")?
        .to_str()
        .ok()?
        .parse()
        .ok()?;
    let reset_secs: i64 = headers
        .get("x-rate-limit-reset")?
        .to_str()
        .ok()?
        .parse()
        .ok()?;
    let reset_at = Utc.timestamp_opt(reset_secs, 0).single()?;
    Some(RateLimitInfo {
        remaining,
        reset_at,
    })
}

fn rate_limited(info: Option<RateLimitInfo>) -> TwitterError {
    match info {
        Some(info) => TwitterError::RateLimited {
            remaining: info.remaining,
            reset_at: info.reset_at,
        },
        None => TwitterError::RateLimited {
            remaining: 0,
            reset_at: Utc::now() + chrono::Duration::seconds(DEFAULT_RESET_WINDOW_SECS),
        },
    }
}

/// Client for the v2 API. Reads use the app-only token, writes the
/// user-context token; obtaining those tokens is out of scope here.
#[derive(Debug, Clone)]
pub struct HttpTwitterClient {
    http: reqwest::Client,
    base_url: String,
    app_token: String,
    user_token: String,
}

impl HttpTwitterClient {
    pub fn from_config(config: &TwitterConfig) -> Result<Self, TwitterError> {
        let app_token = config
            .app_token
            .clone()
            .ok_or_else(|| TwitterError::Config("TWITTER_APP_AUTH_TOKEN is not set".to_string()))?;
        let user_token = match &config.user_token {
            Some(token) => token.clone(),
            None => app_token.clone(),
        };
        Ok(Self {
            http: reqwest::Client::new(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            app_token,
            user_token,
        })
    }
}

#[async_trait]
impl SocialClient for HttpTwitterClient {
    async fn fetch_mentions_since(
        &self,
        user_id: &str,
        page_size: u32,
        since_id: Option<&str>,
    ) -> Result<MentionBatch, TwitterError> {
        let url = format!("{}/2/users/{}/mentions", self.base_url, user_id);

        let mut request = self
            .http
            .get(&url)
            .bearer_auth(&self.app_token)
            .query(&[
                ("max_results", page_size.to_string()),
                ("tweet.fields", "author_id,text,entities,created_at".to_string()),
                (
                    "user.fields",
                    "id,name,username,verified,profile_image_url,public_metrics".to_string(),
                ),
                ("expansions", "author_id,entities.mentions.username".to_string()),
            ]);
        if let Some(since) = since_id {
            request = request.query(&[("since_id", since)]);
        }

        debug!(user_id = %user_id, since_id = ?since_id, "fetching mention timeline");
        let response = request.send().await?;

        let rate_limit = parse_rate_limit(response.headers());
        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(rate_limited(rate_limit));
        }
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(TwitterError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: MentionsResponse = response.json().await?;
        Ok(MentionBatch {
            mentions: collect_mentions(parsed),
            rate_limit,
        })
    }

    async fn post_reply(&self, target_id: &str, text: &str) -> Result<PostedReply, TwitterError> {
        let url = format!("{}/2/tweets", self.base_url);
        let body = serde_json::json!({
            "text": text,
            "reply": { "in_reply_to_tweet_id": target_id },
        });

        debug!(target_id = %target_id, "posting reply");
        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.user_token)
            .json(&body)
            .send()
            .await?;

        let rate_limit = parse_rate_limit(response.headers());
        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(rate_limited(rate_limit));
        }
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(TwitterError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: CreateTweetResponse = response.json().await?;
        Ok(PostedReply {
            tweet_id: parsed.data.id,
        })
    }
}

#[cfg(test)]
mod tests {
    use reqwest::header::HeaderValue;

    use super::*;

    fn headers(remaining: &str, reset: &str) -> HeaderMap {
        let mut map = HeaderMap::new();
        map.insert("x-rate-limit-remaining", HeaderValue::from_str(remaining).unwrap());
        map.insert("x-rate-limit-reset", HeaderValue::from_str(reset).unwrap());
        map
    }

    #[test]
    fn test_parse_rate_limit_headers() {
        let info = parse_rate_limit(&headers("7", "1750000000")).unwrap();
        assert_eq!(info.remaining, 7);
        assert_eq!(info.reset_at, Utc.timestamp_opt(1_750_000_000, 0).unwrap());
    }

    #[test]
    fn test_parse_rate_limit_requires_both_headers() {
        let mut map = HeaderMap::new();
        map.insert("x-rate-limit-remaining", HeaderValue::from_static("7"));
        assert!(parse_rate_limit(&map).is_none());
        assert!(parse_rate_limit(&HeaderMap::new()).is_none());
    }

    #[test]
    fn test_parse_rate_limit_rejects_garbage() {
        assert!(parse_rate_limit(&headers("many", "soon")).is_none());
    }

    #[test]
    fn test_rate_limited_prefers_provider_values() {
        let reset = Utc.timestamp_opt(1_750_000_000, 0).unwrap();
        let err = rate_limited(Some(RateLimitInfo {
            remaining: 0,
            reset_at: reset,
        }));
        match err {
            TwitterError::RateLimited {
                remaining,
                reset_at,
            } => {
                assert_eq!(remaining, 0);
                assert_eq!(reset_at, reset);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_rate_limited_without_headers_backs_off() {
        let before = Utc::now();
        match rate_limited(None) {
            TwitterError::RateLimited {
                remaining,
                reset_at,
            } => {
                assert_eq!(remaining, 0);
                assert!(reset_at > before);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_from_config_requires_app_token() {
        let config = TwitterConfig {
            app_token: None,
            user_token: None,
            user_id: "1".to_string(),
            account_handle: "bot".to_string(),
            base_url: "https://api.twitter.com".to_string(),
            reply_text: "hello".to_string(),
        };
        assert!(HttpTwitterClient::from_config(&config).is_err());
    }
}
