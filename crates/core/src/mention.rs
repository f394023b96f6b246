//! Mention and author rows, as discovered from the account's timeline.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A discovered inbound mention of the account.
///
/// Immutable once inserted except for the handled transition, which is
/// owned by the mention processor. `handled = true` always comes with a
/// `handled_at` timestamp.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Mention {
    /// External tweet identifier (primary key).
    pub tweet_id: String,
    pub author_id: String,
    pub created_at: DateTime<Utc>,
    pub text: String,
    pub handled: bool,
    pub handled_at: Option<DateTime<Utc>>,
}

/// Insert/upsert payload for a mention; `handled` starts false.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewMention {
    pub tweet_id: String,
    pub author_id: String,
    pub created_at: DateTime<Utc>,
    pub text: String,
}

/// Denormalized author profile, upserted on every ingest of a mention
/// referencing it (last write wins on profile fields).
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Author {
    /// External user identifier (primary key).
    pub id: String,
    pub name: String,
    pub handle: String,
    pub verified: bool,
    pub profile_image_url: Option<String>,
    pub verified_followers_count: i32,
}
