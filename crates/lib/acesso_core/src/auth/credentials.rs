//! Credential store for registered client applications.
//!
//! Credentials are generated once at creation. Updates go through
//! [`AcessoStore::update_application`], which never touches them.

use chrono::Utc;
use rand::RngCore;
use sha2::{Digest, Sha256, Sha512};
use tracing::info;
use uuid::Uuid;

use super::AuthError;
use crate::models::auth::Application;
use crate::store::AcessoStore;
use crate::uuid::uuidv7;

/// Length of a generated `client_id` (hex chars).
const CLIENT_ID_LEN: usize = 40;

fn random_bytes<const N: usize>() -> [u8; N] {
    let mut bytes = [0u8; N];
    rand::rng().fill_bytes(&mut bytes);
    bytes
}

/// Public identifier: 40 hex chars of a SHA-256 digest over a UUIDv7 and
/// random bytes.
pub fn generate_client_id() -> String {
    let mut hasher = Sha256::new();
    hasher.update(uuidv7().as_bytes());
    hasher.update(random_bytes::<16>());
    let mut hex = format!("{:x}", hasher.finalize());
    hex.truncate(CLIENT_ID_LEN);
    hex
}

/// Signing key: SHA-512 hex digest of 64 random bytes (128 hex chars).
pub fn generate_secret() -> String {
    format!("{:x}", Sha512::digest(random_bytes::<64>()))
}

/// Join allow-list entries into the stored newline-delimited form.
///
/// Each entry must be an absolute URL. An empty slice stores `None`.
pub fn join_allow_list(urls: &[String]) -> Result<Option<String>, AuthError> {
    for entry in urls {
        url::Url::parse(entry)
            .map_err(|e| AuthError::ValidationError(format!("invalid URL '{entry}': {e}")))?;
    }
    Ok((!urls.is_empty()).then(|| urls.join("\n")))
}

/// Persist a new application, generating credentials when either is missing.
pub async fn create(
    store: &dyn AcessoStore,
    mut app: Application,
) -> Result<Application, AuthError> {
    if app.name.trim().is_empty() {
        return Err(AuthError::ValidationError("application name is required".into()));
    }
    if app.expiration < 0 {
        return Err(AuthError::ValidationError("expiration must be >= 0".into()));
    }
    if !app.has_credentials() {
        app.client_id = generate_client_id();
        app.secret = generate_secret();
    }
    store.insert_application(&app).await?;
    info!(client_id = %app.client_id, name = %app.name, owner = %app.owner, "application registered");
    Ok(app)
}

/// Persist mutable fields of an existing application.
pub async fn update(store: &dyn AcessoStore, app: &Application) -> Result<(), AuthError> {
    if store.update_application(app).await? {
        Ok(())
    } else {
        Err(AuthError::InvalidClient)
    }
}

/// Resolve an active application by `client_id`.
pub async fn lookup_by_client_id(
    store: &dyn AcessoStore,
    client_id: &str,
) -> Result<Application, AuthError> {
    store
        .find_active_application(client_id)
        .await?
        .ok_or(AuthError::InvalidClient)
}

/// Mark an application deleted; subsequent lookups fail with `InvalidClient`.
pub async fn soft_delete(store: &dyn AcessoStore, client_id: &str) -> Result<(), AuthError> {
    if store.soft_delete_application(client_id, Utc::now()).await? {
        info!(client_id, "application soft-deleted");
        Ok(())
    } else {
        Err(AuthError::InvalidClient)
    }
}

/// Remove an application and its transactions.
pub async fn delete(store: &dyn AcessoStore, id: Uuid) -> Result<bool, AuthError> {
    store.delete_application(id).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::MemoryStore;
    use crate::test_support::{seed_user, test_application};

    #[test]
    fn generated_credentials_have_expected_shape() {
        let client_id = generate_client_id();
        let secret = generate_secret();
        assert_eq!(client_id.len(), 40);
        assert_eq!(secret.len(), 128);
        assert!(client_id.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(generate_client_id(), client_id);
        assert_ne!(generate_secret(), secret);
    }

    #[tokio::test]
    async fn create_generates_missing_credentials() {
        let store = MemoryStore::new();
        seed_user(&store, "owner").await;

        let app = create(&store, Application::new("owner", "portal")).await.unwrap();
        assert!(app.has_credentials());

        let found = lookup_by_client_id(&store, &app.client_id).await.unwrap();
        assert_eq!(found.secret, app.secret);
    }

    #[tokio::test]
    async fn create_generates_both_when_only_one_is_missing() {
        let store = MemoryStore::new();
        seed_user(&store, "owner").await;

        let mut app = Application::new("owner", "portal");
        app.client_id = "preset".into();
        let app = create(&store, app).await.unwrap();
        assert_ne!(app.client_id, "preset");
        assert!(!app.secret.is_empty());
    }

    #[tokio::test]
    async fn update_never_changes_credentials() {
        let store = MemoryStore::new();
        seed_user(&store, "owner").await;
        let app = create(&store, test_application("owner")).await.unwrap();

        let mut changed = app.clone();
        changed.name = "renamed".into();
        changed.expiration = 60;
        changed.secret = String::new();
        changed.allowed_callback_urls = Some("https://other.example/cb".into());
        update(&store, &changed).await.unwrap();

        let found = lookup_by_client_id(&store, &app.client_id).await.unwrap();
        assert_eq!(found.client_id, app.client_id);
        assert_eq!(found.secret, app.secret);
        assert_eq!(found.name, "renamed");
        assert_eq!(found.expiration, 60);
    }

    #[tokio::test]
    async fn unknown_and_soft_deleted_clients_are_invalid() {
        let store = MemoryStore::new();
        seed_user(&store, "owner").await;
        let app = create(&store, test_application("owner")).await.unwrap();

        assert!(matches!(
            lookup_by_client_id(&store, "nope").await,
            Err(AuthError::InvalidClient)
        ));

        soft_delete(&store, &app.client_id).await.unwrap();
        assert!(matches!(
            lookup_by_client_id(&store, &app.client_id).await,
            Err(AuthError::InvalidClient)
        ));
    }

    #[tokio::test]
    async fn create_rejects_blank_name() {
        let store = MemoryStore::new();
        let err = create(&store, Application::new("owner", " ")).await.unwrap_err();
        assert!(matches!(err, AuthError::ValidationError(_)));
    }

    #[test]
    fn allow_list_entries_must_be_urls() {
        assert_eq!(join_allow_list(&[]).unwrap(), None);
        assert_eq!(
            join_allow_list(&["https://a.example/cb".into(), "https://b.example/cb".into()])
                .unwrap()
                .as_deref(),
            Some("https://a.example/cb\nhttps://b.example/cb")
        );
        assert!(join_allow_list(&["not a url".into()]).is_err());
    }
}
