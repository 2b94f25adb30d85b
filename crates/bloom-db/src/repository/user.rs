//! # User Repository
//!
//! Staff identities used for ledger attribution. Users are owned
//! by the external identity system; `upsert` exists for seeding and tests.

use bloom_core::User;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::DbResult;

/// Repository for user lookups.
#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    /// Creates a new UserRepository.
    pub fn new(pool: SqlitePool) -> Self {
        UserRepository { pool }
    }

    /// Inserts a user or refreshes its email and display name.
    pub async fn upsert(&self, user: &User) -> DbResult<()> {
        debug!(id = %user.id, "Upserting user");

        sqlx::query(
            r#"
            INSERT INTO users (id, email, display_name)
            VALUES (?1, ?2, ?3)
            ON CONFLICT (id) DO UPDATE SET
                email = excluded.email,
                display_name = excluded.display_name
            "#,
        )
        .bind(&user.id)
        .bind(&user.email)
        .bind(&user.display_name)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Counts users (for the seed tool).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DbError;
    use crate::{Database, DbConfig};

    fn user(id: &str, email: &str) -> User {
        User {
            id: id.to_string(),
            email: email.to_string(),
            display_name: None,
        }
    }

    #[tokio::test]
    async fn test_upsert_replaces_email() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let users = db.users();

        users.upsert(&user("u1", "old@bloom.test")).await.unwrap();
        users.upsert(&user("u1", "new@bloom.test")).await.unwrap();

        let email: String = sqlx::query_scalar("SELECT email FROM users WHERE id = 'u1'")
            .fetch_one(db.pool())
            .await
            .unwrap();
        assert_eq!(email, "new@bloom.test");
        assert_eq!(users.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_email() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let users = db.users();

        users.upsert(&user("u1", "same@bloom.test")).await.unwrap();
        let err = users.upsert(&user("u2", "same@bloom.test")).await.unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));
    }
}
