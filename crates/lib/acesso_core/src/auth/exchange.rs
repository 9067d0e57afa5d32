//! Token exchange: trades a hashcode for a signed identity assertion.

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use super::{AuthError, credentials, jwt, ledger};
use crate::config::FlowConfig;
use crate::models::auth::AssertionClaims;
use crate::models::user::User;
use crate::store::AcessoStore;
use crate::users::timestamps::display_timestamp;

/// Snapshot of `user` as assertion claims.
pub fn assertion_claims(user: &User) -> AssertionClaims {
    AssertionClaims {
        username: user.username.clone(),
        cpf: user.cpf.clone(),

        is_active: user.is_active,
        active: user.active.clone(),
        status: user.status(),

        presentation_name: user.presentation_name.clone(),
        civil_name: user.civil_name.clone(),
        social_name: user.social_name.clone(),

        campus: user.campus.clone(),
        department: user.department.clone(),
        title: user.title.clone(),
        carrer: user.carrer.clone(),
        job: user.job.clone(),

        personal_email: user.email.clone(),
        enterprise_email: user.enterprise_email.clone(),
        academic_email: user.academic_email.clone(),
        scholar_email: user.scholar_email.clone(),

        first_access: display_timestamp(Some(user.first_access)),
        last_access: display_timestamp(Some(user.last_access)),
        deleted: display_timestamp(user.deleted),

        created_at: display_timestamp(user.created_at),
        changed_at: display_timestamp(user.changed_at),
        password_set_at: display_timestamp(user.password_set_at),
        last_access_at: display_timestamp(user.last_access_at),

        photo_blob: user.photo_blob.clone(),
    }
}

/// Exchange `hashcode` for an assertion signed with the application secret.
pub async fn validate(
    store: &dyn AcessoStore,
    config: &FlowConfig,
    client_id: &str,
    hashcode: &str,
) -> Result<String, AuthError> {
    validate_at(store, config, client_id, hashcode, Utc::now()).await
}

/// [`validate`] with an explicit clock.
pub async fn validate_at(
    store: &dyn AcessoStore,
    config: &FlowConfig,
    client_id: &str,
    hashcode: &str,
    now: DateTime<Utc>,
) -> Result<String, AuthError> {
    let app = credentials::lookup_by_client_id(store, client_id).await?;
    let token = ledger::fetch_live(store, &app, hashcode, now, config.single_use_transactions).await?;

    // Users cascade to their transactions, so a miss here is a race with a delete.
    let Some(user) = store.find_user(&token.username).await? else {
        warn!(username = %token.username, hashcode, "transaction user vanished");
        return Err(AuthError::TransactionNotFoundOrExpired);
    };

    let assertion = jwt::sign(&assertion_claims(&user), app.secret.as_bytes())?;
    info!(client_id, username = %user.username, "assertion issued");
    Ok(assertion)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use serde_json::{Map, Value};

    use crate::auth::authorize::{AuthorizeRequest, authorize_at};
    use crate::models::auth::ASSERTION_FIELDS;
    use crate::store::memory::MemoryStore;
    use crate::test_support::{ENCODED_CALLBACK, seed_app, seed_user, sign_state};

    async fn authorized(
        store: &MemoryStore,
        config: &FlowConfig,
        now: DateTime<Utc>,
    ) -> (crate::models::auth::Application, String) {
        let app = seed_app(store).await;
        let user = seed_user(store, "u1").await;
        let state = sign_state(&app.client_id, &app.secret);
        let hashcode = authorize_at(
            store,
            config,
            &user,
            AuthorizeRequest {
                client_id: &app.client_id,
                state: &state,
                redirect_uri: ENCODED_CALLBACK,
                referer: None,
            },
            now,
        )
        .await
        .unwrap();
        (app, hashcode)
    }

    #[tokio::test]
    async fn assertion_verifies_with_application_secret() {
        let store = MemoryStore::new();
        let config = FlowConfig::default();
        let now = Utc::now();
        let (app, hashcode) = authorized(&store, &config, now).await;

        let assertion = validate_at(&store, &config, &app.client_id, &hashcode, now)
            .await
            .unwrap();

        let claims: AssertionClaims = jwt::verify(&assertion, app.secret.as_bytes()).unwrap();
        assert_eq!(claims.username, "u1");
        assert!(claims.is_active);
        assert_eq!(claims.status, "active (user)");
        assert_eq!(claims.deleted, "None");

        let raw: Map<String, Value> = jwt::verify(&assertion, app.secret.as_bytes()).unwrap();
        let mut keys: Vec<&str> = raw.keys().map(String::as_str).collect();
        let mut expected = ASSERTION_FIELDS.to_vec();
        keys.sort_unstable();
        expected.sort_unstable();
        assert_eq!(keys, expected);
    }

    #[tokio::test]
    async fn assertion_does_not_verify_with_other_secret() {
        let store = MemoryStore::new();
        let config = FlowConfig::default();
        let now = Utc::now();
        let (app, hashcode) = authorized(&store, &config, now).await;

        let assertion = validate_at(&store, &config, &app.client_id, &hashcode, now)
            .await
            .unwrap();
        assert!(jwt::verify::<AssertionClaims>(&assertion, b"other").is_none());
    }

    #[tokio::test]
    async fn hashcode_is_reusable_until_expiry() {
        let store = MemoryStore::new();
        let config = FlowConfig::default();
        let now = Utc::now();
        let (app, hashcode) = authorized(&store, &config, now).await;

        let first = validate_at(&store, &config, &app.client_id, &hashcode, now)
            .await
            .unwrap();
        let second = validate_at(&store, &config, &app.client_id, &hashcode, now + Duration::minutes(9))
            .await
            .unwrap();

        let a: AssertionClaims = jwt::verify(&first, app.secret.as_bytes()).unwrap();
        let b: AssertionClaims = jwt::verify(&second, app.secret.as_bytes()).unwrap();
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn expired_hashcode_is_rejected() {
        let store = MemoryStore::new();
        let config = FlowConfig::default();
        let now = Utc::now();
        let (app, hashcode) = authorized(&store, &config, now).await;

        for later in [Duration::minutes(10), Duration::minutes(11)] {
            let err = validate_at(&store, &config, &app.client_id, &hashcode, now + later)
                .await
                .unwrap_err();
            assert!(matches!(err, AuthError::TransactionNotFoundOrExpired));
        }
    }

    #[tokio::test]
    async fn hashcode_is_scoped_to_its_application() {
        let store = MemoryStore::new();
        let config = FlowConfig::default();
        let now = Utc::now();
        let (_app, hashcode) = authorized(&store, &config, now).await;
        let other = seed_app(&store).await;

        let err = validate_at(&store, &config, &other.client_id, &hashcode, now)
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::TransactionNotFoundOrExpired));
    }

    #[tokio::test]
    async fn unknown_client_is_rejected_before_lookup() {
        let store = MemoryStore::new();
        let config = FlowConfig::default();
        let now = Utc::now();
        let (_app, hashcode) = authorized(&store, &config, now).await;

        let err = validate_at(&store, &config, "nope", &hashcode, now)
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::InvalidClient));
    }

    #[tokio::test]
    async fn single_use_mode_consumes_the_transaction() {
        let store = MemoryStore::new();
        let config = FlowConfig {
            single_use_transactions: true,
            ..FlowConfig::default()
        };
        let now = Utc::now();
        let (app, hashcode) = authorized(&store, &config, now).await;

        assert!(validate_at(&store, &config, &app.client_id, &hashcode, now).await.is_ok());
        let err = validate_at(&store, &config, &app.client_id, &hashcode, now)
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::TransactionNotFoundOrExpired));
    }

    #[tokio::test]
    async fn deleting_the_user_cascades_to_transactions() {
        let store = MemoryStore::new();
        let config = FlowConfig::default();
        let now = Utc::now();
        let (app, hashcode) = authorized(&store, &config, now).await;

        assert!(store.delete_user("u1").await.unwrap());
        let err = validate_at(&store, &config, &app.client_id, &hashcode, now)
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::TransactionNotFoundOrExpired));
    }

    #[tokio::test]
    async fn deleting_the_application_cascades_to_transactions() {
        let store = MemoryStore::new();
        let config = FlowConfig::default();
        let now = Utc::now();
        let (app, _hashcode) = authorized(&store, &config, now).await;

        assert!(credentials::delete(&store, app.id).await.unwrap());
        assert_eq!(store.transaction_count(), 0);
    }
}
