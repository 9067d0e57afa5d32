//! Persistence seam for users, applications and transactions.
//!
//! `PgStore` is the production backend; `MemoryStore` backs tests and
//! single-process development. Both enforce the same uniqueness rules and
//! cascade deletes.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::auth::AuthError;
use crate::models::auth::{Application, TransactionToken};
use crate::models::user::User;

/// Storage operations the flow relies on.
#[async_trait]
pub trait AcessoStore: Send + Sync {
    /// Check that the backend is reachable.
    async fn ping(&self) -> Result<(), AuthError>;

    /// Insert or replace a user, keeping an existing `first_access`.
    async fn upsert_user(&self, user: &User) -> Result<User, AuthError>;

    async fn find_user(&self, username: &str) -> Result<Option<User>, AuthError>;

    /// Delete a user with its applications and transactions.
    async fn delete_user(&self, username: &str) -> Result<bool, AuthError>;

    /// Insert a new application. Fails with `Duplicate` on a taken `client_id`.
    async fn insert_application(&self, app: &Application) -> Result<(), AuthError>;

    /// Update mutable fields. Never writes `client_id` or `secret`.
    async fn update_application(&self, app: &Application) -> Result<bool, AuthError>;

    /// Find an application by `client_id` that has not been soft-deleted.
    async fn find_active_application(
        &self,
        client_id: &str,
    ) -> Result<Option<Application>, AuthError>;

    async fn soft_delete_application(
        &self,
        client_id: &str,
        at: DateTime<Utc>,
    ) -> Result<bool, AuthError>;

    /// Hard delete, cascading to the application's transactions.
    async fn delete_application(&self, id: Uuid) -> Result<bool, AuthError>;

    /// Insert a transaction. Fails with `Duplicate` on a taken hashcode.
    async fn insert_transaction(&self, token: &TransactionToken) -> Result<(), AuthError>;

    /// Find a transaction for `application_id` with `expire_at > now`.
    async fn find_live_transaction(
        &self,
        application_id: Uuid,
        hashcode: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<TransactionToken>, AuthError>;

    /// Like `find_live_transaction`, but atomically deletes the match.
    async fn take_live_transaction(
        &self,
        application_id: Uuid,
        hashcode: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<TransactionToken>, AuthError>;

    /// Delete transactions with `expire_at <= now`. Returns the count removed.
    async fn purge_expired_transactions(&self, now: DateTime<Utc>) -> Result<u64, AuthError>;
}
