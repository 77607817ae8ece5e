//! ProfileService — the persisted profile collection, backed by SQLite.
//!
//! This is the only component that writes to the `profiles` table. Uniqueness
//! of usernames is enforced by the table's UNIQUE constraint at insert time,
//! never by a check-then-insert at the API layer, so two concurrent creates
//! with the same username resolve to exactly one winner.

use crate::models::profile::Profile;
use chrono::Utc;
use sqlx::SqlitePool;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("username `{0}` is already taken")]
    DuplicateUsername(String),
    #[error("{field} must not be empty")]
    MissingField { field: &'static str },
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// ProfileService provides the three record operations the directory needs:
/// - List every stored profile
/// - Create a profile (assigns the id, enforces username uniqueness)
/// - Delete a profile by id (idempotent — deleting a missing id succeeds)
#[derive(Clone)]
pub struct ProfileService {
    /// Shared SQLite connection pool. Injected at startup so tests can swap
    /// in an in-memory pool.
    pub db: Arc<SqlitePool>,
}

impl ProfileService {
    pub fn new(db: Arc<SqlitePool>) -> Self {
        Self { db }
    }

    /// Return every stored profile in insert order.
    ///
    /// No stronger ordering is promised to callers.
    pub async fn list(&self) -> StoreResult<Vec<Profile>> {
        let profiles = sqlx::query_as::<_, Profile>(
            "SELECT id, username, description, picture_ref, created_at
             FROM profiles ORDER BY rowid",
        )
        .fetch_all(&*self.db)
        .await?;

        Ok(profiles)
    }

    /// Insert a new profile and return the fully assigned record.
    ///
    /// Fails with `MissingField` when `username` or `description` is empty
    /// and with `DuplicateUsername` when the UNIQUE constraint fires.
    pub async fn create(
        &self,
        username: &str,
        description: &str,
        picture_ref: Option<String>,
    ) -> StoreResult<Profile> {
        if username.is_empty() {
            return Err(StoreError::MissingField { field: "username" });
        }
        if description.is_empty() {
            return Err(StoreError::MissingField {
                field: "description",
            });
        }

        let insert_result = sqlx::query_as::<_, Profile>(
            "INSERT INTO profiles (id, username, description, picture_ref, created_at)
             VALUES (?, ?, ?, ?, ?)
             RETURNING id, username, description, picture_ref, created_at",
        )
        .bind(Uuid::new_v4())
        .bind(username)
        .bind(description)
        .bind(picture_ref)
        .bind(Utc::now())
        .fetch_one(&*self.db)
        .await;

        match insert_result {
            Ok(profile) => Ok(profile),
            Err(err) if is_unique_violation(&err) => {
                Err(StoreError::DuplicateUsername(username.to_string()))
            }
            Err(err) => Err(StoreError::Sqlx(err)),
        }
    }

    /// Delete the profile with the given id.
    ///
    /// An id that matches nothing is still success; the caller cannot tell
    /// "removed" apart from "already absent".
    pub async fn delete_by_id(&self, id: Uuid) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM profiles WHERE id = ?")
            .bind(id)
            .execute(&*self.db)
            .await?;

        if result.rows_affected() == 0 {
            debug!("delete for {} matched no row", id);
        }

        Ok(())
    }
}

/// Return true if SQLx error indicates a unique constraint violation.
fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(
        err,
        sqlx::Error::Database(db_err) if db_err.message().to_ascii_lowercase().contains("unique")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn test_service() -> ProfileService {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .expect("in-memory pool");
        sqlx::query(
            "CREATE TABLE profiles (
                id BLOB PRIMARY KEY,
                username TEXT NOT NULL UNIQUE,
                description TEXT NOT NULL,
                picture_ref TEXT,
                created_at TEXT NOT NULL
            )",
        )
        .execute(&pool)
        .await
        .expect("create schema");
        ProfileService::new(Arc::new(pool))
    }

    #[tokio::test]
    async fn create_then_list_round_trips() {
        let service = test_service().await;
        let created = service
            .create("alice", "hi", None)
            .await
            .expect("create alice");

        let listed = service.list().await.expect("list");
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, created.id);
        assert_eq!(listed[0].username, "alice");
        assert_eq!(listed[0].description, "hi");
        assert_eq!(listed[0].picture_ref, None);
    }

    #[tokio::test]
    async fn duplicate_username_is_rejected() {
        let service = test_service().await;
        service
            .create("bob", "first", None)
            .await
            .expect("first create");

        let err = service
            .create("bob", "second", None)
            .await
            .expect_err("second create must fail");
        assert!(matches!(err, StoreError::DuplicateUsername(name) if name == "bob"));

        // The first row survives untouched.
        let listed = service.list().await.expect("list");
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].description, "first");
    }

    #[tokio::test]
    async fn empty_fields_fail_validation() {
        let service = test_service().await;

        let err = service
            .create("carol", "", None)
            .await
            .expect_err("empty description");
        assert!(matches!(err, StoreError::MissingField { field: "description" }));

        let err = service
            .create("", "something", None)
            .await
            .expect_err("empty username");
        assert!(matches!(err, StoreError::MissingField { field: "username" }));

        assert!(service.list().await.expect("list").is_empty());
    }

    #[tokio::test]
    async fn delete_is_idempotent() {
        let service = test_service().await;
        let created = service
            .create("dave", "to be removed", None)
            .await
            .expect("create");

        service.delete_by_id(created.id).await.expect("first delete");
        service
            .delete_by_id(created.id)
            .await
            .expect("second delete must also succeed");

        assert!(service.list().await.expect("list").is_empty());
    }

    #[tokio::test]
    async fn listing_returns_every_created_profile() {
        let service = test_service().await;
        for i in 0..5 {
            service
                .create(&format!("user{}", i), &format!("desc{}", i), None)
                .await
                .expect("create");
        }

        let listed = service.list().await.expect("list");
        assert_eq!(listed.len(), 5);
        for (i, profile) in listed.iter().enumerate() {
            assert_eq!(profile.username, format!("user{}", i));
            assert_eq!(profile.description, format!("desc{}", i));
        }
    }

    #[tokio::test]
    async fn picture_ref_round_trips() {
        let service = test_service().await;
        let created = service
            .create("erin", "with picture", Some("1700000000000.png".into()))
            .await
            .expect("create");
        assert_eq!(created.picture_ref.as_deref(), Some("1700000000000.png"));

        let listed = service.list().await.expect("list");
        assert_eq!(
            listed[0].picture_ref.as_deref(),
            Some("1700000000000.png")
        );
    }
}
