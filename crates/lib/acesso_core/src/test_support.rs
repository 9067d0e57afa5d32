//! Fixtures shared by the unit tests.

use chrono::{DateTime, Utc};
use serde_json::json;

use crate::auth::{credentials, jwt};
use crate::models::auth::{Application, TransactionToken};
use crate::models::user::{User, UserImport};
use crate::store::AcessoStore;
use crate::users;
use crate::uuid::{new_hashcode, uuidv7};

/// `https://app.example/cb`, form-encoded.
pub const ENCODED_CALLBACK: &str = "https%3A%2F%2Fapp.example%2Fcb";

pub async fn seed_user(store: &dyn AcessoStore, username: &str) -> User {
    users::save(
        store,
        UserImport {
            username: username.into(),
            first_name: Some("Test".into()),
            last_name: Some(username.into()),
            active: Some(users::ACTIVE_MARKER.into()),
            email: Some(format!("{username}@mail.example")),
            ..Default::default()
        },
    )
    .await
    .expect("seed user")
}

pub fn test_application(owner: &str) -> Application {
    let mut app = Application::new(owner, "test app");
    app.allowed_callback_urls = Some("https://app.example/cb\r\nhttps://app.example/alt\r\n".into());
    app.allowed_web_origins = Some("https://app.example/login".into());
    app
}

/// Register an application owned by `owner`; also seeds user `u1`.
pub async fn seed_app(store: &dyn AcessoStore) -> Application {
    seed_user(store, "owner").await;
    seed_user(store, "u1").await;
    credentials::create(store, test_application("owner"))
        .await
        .expect("seed application")
}

pub fn sign_state(client_id: &str, secret: &str) -> String {
    jwt::sign(&json!({"client_id": client_id, "uuid": "x"}), secret.as_bytes()).expect("sign state")
}

pub fn transaction_for(app: &Application, username: &str, expire_at: DateTime<Utc>) -> TransactionToken {
    TransactionToken {
        id: uuidv7(),
        application_id: app.id,
        username: username.into(),
        hashcode: new_hashcode(),
        state: "state".into(),
        redirect_uri: "https://app.example/cb".into(),
        referer: None,
        created_at: Utc::now(),
        expire_at,
    }
}
