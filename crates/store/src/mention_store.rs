//! PostgreSQL-backed [`MentionStore`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use mentionloop_core::{Author, Mention, NewMention};

use crate::error::StoreError;
use crate::traits::MentionStore;

#[derive(Debug, Clone)]
pub struct PgMentionStore {
    pool: PgPool,
}

impl PgMentionStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MentionStore for PgMentionStore {
    async fn upsert_author(&self, author: &Author) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO authors (id, name, handle, verified, profile_image_url, verified_followers_count)
             VALUES ($1, $2, $3, $4, $5, $6)
             ON CONFLICT (id) DO UPDATE SET
                name = EXCLUDED.name,
                handle = EXCLUDED.handle,
                verified = EXCLUDED.verified,
                profile_image_url = EXCLUDED.profile_image_url,
                verified_followers_count = EXCLUDED.verified_followers_count",
        )
        .bind(&author.id)
        .bind(&author.name)
        .bind(&author.handle)
        .bind(author.verified)
        .bind(&author.profile_image_url)
        .bind(author.verified_followers_count)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn upsert_mention(&self, mention: &NewMention) -> Result<(), StoreError> {
        // The handled flag is never touched here: re-ingesting an
        // already-processed mention must not reopen it.
        sqlx::query(
            "INSERT INTO mentions (tweet_id, author_id, created_at, text)
             VALUES ($1, $2, $3, $4)
             ON CONFLICT (tweet_id) DO UPDATE SET
                author_id = EXCLUDED.author_id,
                created_at = EXCLUDED.created_at,
                text = EXCLUDED.text",
        )
        .bind(&mention.tweet_id)
        .bind(&mention.author_id)
        .bind(mention.created_at)
        .bind(&mention.text)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get(&self, tweet_id: &str) -> Result<Option<Mention>, StoreError> {
        let mention = sqlx::query_as::<_, Mention>(
            "SELECT tweet_id, author_id, created_at, text, handled, handled_at
             FROM mentions WHERE tweet_id = $1",
        )
        .bind(tweet_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(mention)
    }

    async fn author(&self, id: &str) -> Result<Option<Author>, StoreError> {
        let author = sqlx::query_as::<_, Author>(
            "SELECT id, name, handle, verified, profile_image_url, verified_followers_count
             FROM authors WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(author)
    }

    async fn latest(&self) -> Result<Option<Mention>, StoreError> {
        let mention = sqlx::query_as::<_, Mention>(
            "SELECT tweet_id, author_id, created_at, text, handled, handled_at
             FROM mentions
             ORDER BY created_at DESC
             LIMIT 1",
        )
        .fetch_optional(&self.pool)
        .await?;
        Ok(mention)
    }

    async fn unhandled(&self, limit: i64) -> Result<Vec<Mention>, StoreError> {
        let mentions = sqlx::query_as::<_, Mention>(
            "SELECT tweet_id, author_id, created_at, text, handled, handled_at
             FROM mentions WHERE handled = FALSE
             ORDER BY created_at ASC
             LIMIT $1",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(mentions)
    }

    async fn mark_handled(&self, tweet_id: &str, at: DateTime<Utc>) -> Result<(), StoreError> {
        sqlx::query("UPDATE mentions SET handled = TRUE, handled_at = $2 WHERE tweet_id = $1")
            .bind(tweet_id)
            .bind(at)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
