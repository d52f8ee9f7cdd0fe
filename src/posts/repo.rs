use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;

use crate::error::ApiError;

/// Post record. `author_name` is resolved by a join on read paths and is
/// never persisted.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Post {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub published: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
    pub author_id: i64,
    #[sqlx(default)]
    pub author_name: Option<String>,
}

/// Partial update; `None` keeps the stored value.
#[derive(Debug, Default)]
pub struct PostChanges {
    pub title: Option<String>,
    pub content: Option<String>,
    pub published: Option<bool>,
}

impl Post {
    /// Newest first. Unpublished posts only appear when the viewer has
    /// been cleared for them.
    pub async fn list(
        db: &PgPool,
        include_unpublished: bool,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Post>, ApiError> {
        let posts = sqlx::query_as::<_, Post>(
            r#"
            SELECT p.id, p.title, p.content, p.published, p.created_at, p.updated_at,
                   p.author_id, u.username AS author_name
            FROM posts p
            LEFT JOIN users u ON u.id = p.author_id
            WHERE p.published OR $1
            ORDER BY p.created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(include_unpublished)
        .bind(limit)
        .bind(offset)
        .fetch_all(db)
        .await?;
        Ok(posts)
    }

    pub async fn find_by_id(db: &PgPool, id: i64) -> Result<Option<Post>, ApiError> {
        let post = sqlx::query_as::<_, Post>(
            r#"
            SELECT p.id, p.title, p.content, p.published, p.created_at, p.updated_at,
                   p.author_id, u.username AS author_name
            FROM posts p
            LEFT JOIN users u ON u.id = p.author_id
            WHERE p.id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(post)
    }

    pub async fn create(
        db: &PgPool,
        title: &str,
        content: &str,
        published: bool,
        author_id: i64,
    ) -> Result<Post, ApiError> {
        let post = sqlx::query_as::<_, Post>(
            r#"
            INSERT INTO posts (title, content, published, author_id)
            VALUES ($1, $2, $3, $4)
            RETURNING id, title, content, published, created_at, updated_at, author_id
            "#,
        )
        .bind(title)
        .bind(content)
        .bind(published)
        .bind(author_id)
        .fetch_one(db)
        .await?;
        Ok(post)
    }

    /// Partial-merge update; refreshes `updated_at` on every call.
    pub async fn update(db: &PgPool, id: i64, changes: PostChanges) -> Result<Post, ApiError> {
        let existing = Self::find_by_id(db, id).await?.ok_or(ApiError::NotFound)?;

        let post = sqlx::query_as::<_, Post>(
            r#"
            UPDATE posts
            SET title = $1, content = $2, published = $3, updated_at = now()
            WHERE id = $4
            RETURNING id, title, content, published, created_at, updated_at, author_id
            "#,
        )
        .bind(changes.title.unwrap_or(existing.title))
        .bind(changes.content.unwrap_or(existing.content))
        .bind(changes.published.unwrap_or(existing.published))
        .bind(id)
        .fetch_one(db)
        .await?;
        Ok(post)
    }

    pub async fn delete(db: &PgPool, id: i64) -> Result<(), ApiError> {
        let result = sqlx::query("DELETE FROM posts WHERE id = $1")
            .bind(id)
            .execute(db)
            .await?;
        if result.rows_affected() == 0 {
            return Err(ApiError::NotFound);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn post_serializes_timestamps_as_rfc3339() {
        let post = Post {
            id: 1,
            title: "A".into(),
            content: "B".into(),
            published: true,
            created_at: OffsetDateTime::UNIX_EPOCH,
            updated_at: OffsetDateTime::UNIX_EPOCH,
            author_id: 1,
            author_name: Some("alice".into()),
        };
        let json = serde_json::to_string(&post).unwrap();
        assert!(json.contains("1970-01-01T00:00:00Z"));
        assert!(json.contains("\"author_name\":\"alice\""));
    }
}
