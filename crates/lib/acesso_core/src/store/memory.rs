//! In-memory store backed by `DashMap`s.
//!
//! Mirrors the Postgres schema rules: unique `client_id` and hashcode,
//! foreign keys checked on insert, cascade on delete.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use uuid::Uuid;

use super::AcessoStore;
use crate::auth::AuthError;
use crate::models::auth::{Application, TransactionToken};
use crate::models::user::User;

/// Process-local store for tests and development.
#[derive(Debug, Default)]
pub struct MemoryStore {
    users: DashMap<String, User>,
    applications: DashMap<Uuid, Application>,
    /// `client_id` → application id.
    client_ids: DashMap<String, Uuid>,
    /// hashcode → transaction.
    transactions: DashMap<String, TransactionToken>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored transactions, live or not.
    pub fn transaction_count(&self) -> usize {
        self.transactions.len()
    }

    fn remove_application(&self, id: Uuid) -> Option<Application> {
        let (_, app) = self.applications.remove(&id)?;
        self.client_ids.remove(&app.client_id);
        self.transactions.retain(|_, t| t.application_id != id);
        Some(app)
    }
}

#[async_trait]
impl AcessoStore for MemoryStore {
    async fn ping(&self) -> Result<(), AuthError> {
        Ok(())
    }

    async fn upsert_user(&self, user: &User) -> Result<User, AuthError> {
        let mut stored = user.clone();
        match self.users.entry(user.username.clone()) {
            Entry::Occupied(mut existing) => {
                stored.first_access = existing.get().first_access;
                existing.insert(stored.clone());
            }
            Entry::Vacant(slot) => {
                slot.insert(stored.clone());
            }
        }
        Ok(stored)
    }

    async fn find_user(&self, username: &str) -> Result<Option<User>, AuthError> {
        Ok(self.users.get(username).map(|u| u.value().clone()))
    }

    async fn delete_user(&self, username: &str) -> Result<bool, AuthError> {
        if self.users.remove(username).is_none() {
            return Ok(false);
        }
        let owned: Vec<Uuid> = self
            .applications
            .iter()
            .filter(|app| app.owner == username)
            .map(|app| app.id)
            .collect();
        for id in owned {
            self.remove_application(id);
        }
        self.transactions.retain(|_, t| t.username != username);
        Ok(true)
    }

    async fn insert_application(&self, app: &Application) -> Result<(), AuthError> {
        if !self.users.contains_key(&app.owner) {
            return Err(AuthError::UnknownUser(app.owner.clone()));
        }
        match self.client_ids.entry(app.client_id.clone()) {
            Entry::Occupied(_) => Err(AuthError::Duplicate("client_id".into())),
            Entry::Vacant(slot) => {
                slot.insert(app.id);
                self.applications.insert(app.id, app.clone());
                Ok(())
            }
        }
    }

    async fn update_application(&self, app: &Application) -> Result<bool, AuthError> {
        let Some(mut stored) = self.applications.get_mut(&app.id) else {
            return Ok(false);
        };
        stored.name = app.name.clone();
        stored.description = app.description.clone();
        stored.allowed_callback_urls = app.allowed_callback_urls.clone();
        stored.allowed_web_origins = app.allowed_web_origins.clone();
        stored.allowed_logout_urls = app.allowed_logout_urls.clone();
        stored.expiration = app.expiration;
        Ok(true)
    }

    async fn find_active_application(
        &self,
        client_id: &str,
    ) -> Result<Option<Application>, AuthError> {
        let Some(id) = self.client_ids.get(client_id).map(|id| *id.value()) else {
            return Ok(None);
        };
        Ok(self
            .applications
            .get(&id)
            .filter(|app| app.is_active())
            .map(|app| app.value().clone()))
    }

    async fn soft_delete_application(
        &self,
        client_id: &str,
        at: DateTime<Utc>,
    ) -> Result<bool, AuthError> {
        let Some(id) = self.client_ids.get(client_id).map(|id| *id.value()) else {
            return Ok(false);
        };
        match self.applications.get_mut(&id) {
            Some(mut app) if app.deleted_at.is_none() => {
                app.deleted_at = Some(at);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn delete_application(&self, id: Uuid) -> Result<bool, AuthError> {
        Ok(self.remove_application(id).is_some())
    }

    async fn insert_transaction(&self, token: &TransactionToken) -> Result<(), AuthError> {
        if !self.applications.contains_key(&token.application_id) {
            return Err(AuthError::InvalidClient);
        }
        if !self.users.contains_key(&token.username) {
            return Err(AuthError::UnknownUser(token.username.clone()));
        }
        match self.transactions.entry(token.hashcode.clone()) {
            Entry::Occupied(_) => Err(AuthError::Duplicate("hashcode".into())),
            Entry::Vacant(slot) => {
                slot.insert(token.clone());
                Ok(())
            }
        }
    }

    async fn find_live_transaction(
        &self,
        application_id: Uuid,
        hashcode: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<TransactionToken>, AuthError> {
        Ok(self
            .transactions
            .get(hashcode)
            .filter(|t| t.application_id == application_id && t.is_live_at(now))
            .map(|t| t.value().clone()))
    }

    async fn take_live_transaction(
        &self,
        application_id: Uuid,
        hashcode: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<TransactionToken>, AuthError> {
        Ok(self
            .transactions
            .remove_if(hashcode, |_, t| {
                t.application_id == application_id && t.is_live_at(now)
            })
            .map(|(_, t)| t))
    }

    async fn purge_expired_transactions(&self, now: DateTime<Utc>) -> Result<u64, AuthError> {
        let mut removed = 0u64;
        self.transactions.retain(|_, t| {
            let keep = t.is_live_at(now);
            if !keep {
                removed += 1;
            }
            keep
        });
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{seed_app, seed_user, test_application, transaction_for};

    #[tokio::test]
    async fn duplicate_client_id_is_rejected() {
        let store = MemoryStore::new();
        let app = seed_app(&store).await;

        let mut clash = test_application("owner");
        clash.client_id = app.client_id.clone();
        clash.secret = "s".into();
        assert!(matches!(
            store.insert_application(&clash).await,
            Err(AuthError::Duplicate(_))
        ));
    }

    #[tokio::test]
    async fn application_requires_existing_owner() {
        let store = MemoryStore::new();
        let mut app = test_application("ghost");
        app.client_id = "c".into();
        app.secret = "s".into();
        assert!(matches!(
            store.insert_application(&app).await,
            Err(AuthError::UnknownUser(_))
        ));
    }

    #[tokio::test]
    async fn duplicate_hashcode_is_rejected() {
        let store = MemoryStore::new();
        let app = seed_app(&store).await;
        let token = transaction_for(&app, "u1", Utc::now() + chrono::Duration::minutes(1));
        store.insert_transaction(&token).await.unwrap();

        let mut again = token.clone();
        again.id = crate::uuid::uuidv7();
        assert!(matches!(
            store.insert_transaction(&again).await,
            Err(AuthError::Duplicate(_))
        ));
    }

    #[tokio::test]
    async fn deleting_owner_removes_applications() {
        let store = MemoryStore::new();
        let app = seed_app(&store).await;
        seed_user(&store, "u1").await;

        assert!(store.delete_user("owner").await.unwrap());
        assert!(store.find_active_application(&app.client_id).await.unwrap().is_none());
        assert!(!store.delete_user("owner").await.unwrap());
    }
}
