use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};

use crate::error::ApiError;

/// User record in the database.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String, // argon2 hash, not exposed in JSON
    pub is_active: bool,
    pub is_admin: bool,
}

/// Partial update; `None` keeps the stored value.
#[derive(Debug, Default)]
pub struct UserChanges {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password_hash: Option<String>,
    pub is_active: Option<bool>,
    pub is_admin: Option<bool>,
}

impl User {
    pub async fn find_by_id(db: &PgPool, id: i64) -> Result<Option<User>, ApiError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, email, password_hash, is_active, is_admin
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    pub async fn find_by_username(db: &PgPool, username: &str) -> Result<Option<User>, ApiError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, email, password_hash, is_active, is_admin
            FROM users
            WHERE username = $1
            "#,
        )
        .bind(username)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    pub async fn find_by_email(db: &PgPool, email: &str) -> Result<Option<User>, ApiError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, email, password_hash, is_active, is_admin
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    pub async fn list(db: &PgPool, limit: i64, offset: i64) -> Result<Vec<User>, ApiError> {
        let users = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, email, password_hash, is_active, is_admin
            FROM users
            ORDER BY id
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(db)
        .await?;
        Ok(users)
    }

    /// Insert a new user. Username and email are each globally unique;
    /// duplicates fail before anything is written.
    pub async fn create(
        db: &PgPool,
        username: &str,
        email: &str,
        password_hash: &str,
        is_active: bool,
        is_admin: bool,
    ) -> Result<User, ApiError> {
        if Self::find_by_username(db, username).await?.is_some() {
            return Err(ApiError::DuplicateUsername);
        }
        if Self::find_by_email(db, email).await?.is_some() {
            return Err(ApiError::DuplicateEmail);
        }

        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (username, email, password_hash, is_active, is_admin)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, username, email, password_hash, is_active, is_admin
            "#,
        )
        .bind(username)
        .bind(email)
        .bind(password_hash)
        .bind(is_active)
        .bind(is_admin)
        .fetch_one(db)
        .await?;
        Ok(user)
    }

    /// Partial-merge update. Changed username/email are re-validated for
    /// uniqueness against all other rows before the write.
    pub async fn update(db: &PgPool, id: i64, changes: UserChanges) -> Result<User, ApiError> {
        let existing = Self::find_by_id(db, id).await?.ok_or(ApiError::NotFound)?;

        if let Some(username) = &changes.username {
            let taken = sqlx::query_scalar::<_, i64>(
                "SELECT id FROM users WHERE username = $1 AND id <> $2",
            )
            .bind(username)
            .bind(id)
            .fetch_optional(db)
            .await?;
            if taken.is_some() {
                return Err(ApiError::DuplicateUsername);
            }
        }

        if let Some(email) = &changes.email {
            let taken =
                sqlx::query_scalar::<_, i64>("SELECT id FROM users WHERE email = $1 AND id <> $2")
                    .bind(email)
                    .bind(id)
                    .fetch_optional(db)
                    .await?;
            if taken.is_some() {
                return Err(ApiError::DuplicateEmail);
            }
        }

        let user = sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET username = $1, email = $2, password_hash = $3, is_active = $4, is_admin = $5
            WHERE id = $6
            RETURNING id, username, email, password_hash, is_active, is_admin
            "#,
        )
        .bind(changes.username.unwrap_or(existing.username))
        .bind(changes.email.unwrap_or(existing.email))
        .bind(changes.password_hash.unwrap_or(existing.password_hash))
        .bind(changes.is_active.unwrap_or(existing.is_active))
        .bind(changes.is_admin.unwrap_or(existing.is_admin))
        .bind(id)
        .fetch_one(db)
        .await?;
        Ok(user)
    }

    pub async fn delete(db: &PgPool, id: i64) -> Result<(), ApiError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
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
    fn serialized_user_hides_the_password_hash() {
        let user = User {
            id: 1,
            username: "alice".into(),
            email: "alice@example.com".into(),
            password_hash: "$argon2id$secret".into(),
            is_active: true,
            is_admin: false,
        };
        let json = serde_json::to_string(&user).unwrap();
        assert!(json.contains("\"username\":\"alice\""));
        assert!(!json.contains("password_hash"));
        assert!(!json.contains("argon2id"));
    }
}
