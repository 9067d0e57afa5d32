//! Authorization domain models.
//!
//! Client applications, the transaction records linking a user to an
//! in-flight authorization, and the claim set signed into assertions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::uuid::uuidv7;

/// Default application `expiration`: 5 minutes.
pub const DEFAULT_APPLICATION_EXPIRATION_SECS: i32 = 300;

/// A registered client application.
///
/// `client_id` and `secret` start empty and are filled in exactly once by
/// [`crate::auth::credentials::create`].
#[derive(Debug, Clone, PartialEq)]
pub struct Application {
    pub id: Uuid,
    /// Username of the owning user.
    pub owner: String,
    pub name: String,
    pub description: Option<String>,
    pub client_id: String,
    pub secret: String,
    /// Newline-delimited allow-list of callback URLs.
    pub allowed_callback_urls: Option<String>,
    /// Newline-delimited allow-list of web origins.
    pub allowed_web_origins: Option<String>,
    /// Newline-delimited allow-list of logout URLs.
    pub allowed_logout_urls: Option<String>,
    /// Expiration in seconds.
    pub expiration: i32,
    pub created_at: DateTime<Utc>,
    /// Soft-delete marker. `None` means active.
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Application {
    /// A new, unsaved application with empty credentials.
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: uuidv7(),
            owner: owner.into(),
            name: name.into(),
            description: None,
            client_id: String::new(),
            secret: String::new(),
            allowed_callback_urls: None,
            allowed_web_origins: None,
            allowed_logout_urls: None,
            expiration: DEFAULT_APPLICATION_EXPIRATION_SECS,
            created_at: Utc::now(),
            deleted_at: None,
        }
    }

    /// Whether the application has not been soft-deleted.
    pub fn is_active(&self) -> bool {
        self.deleted_at.is_none()
    }

    /// Whether both credentials have been assigned.
    pub fn has_credentials(&self) -> bool {
        !self.client_id.is_empty() && !self.secret.is_empty()
    }
}

/// Short-lived transaction created by an authorization and read by an exchange.
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionToken {
    pub id: Uuid,
    pub application_id: Uuid,
    pub username: String,
    /// One-time handle returned to the client.
    pub hashcode: String,
    /// Raw signed state blob as received.
    pub state: String,
    /// Decoded, allow-listed redirect URI.
    pub redirect_uri: String,
    pub referer: Option<String>,
    pub created_at: DateTime<Utc>,
    pub expire_at: DateTime<Utc>,
}

impl TransactionToken {
    /// Whether the transaction can still be exchanged at `now`.
    pub fn is_live_at(&self, now: DateTime<Utc>) -> bool {
        self.expire_at > now
    }
}

/// Identity assertion claims signed with the application secret.
///
/// Field order is the serialized order. Timestamps are rendered with
/// [`crate::users::timestamps::display_timestamp`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssertionClaims {
    pub username: String,
    pub cpf: Option<String>,

    pub is_active: bool,
    pub active: Option<String>,
    pub status: String,

    pub presentation_name: Option<String>,
    pub civil_name: Option<String>,
    pub social_name: Option<String>,

    pub campus: Option<String>,
    pub department: Option<String>,
    pub title: Option<String>,
    pub carrer: Option<String>,
    pub job: Option<String>,

    pub personal_email: Option<String>,
    pub enterprise_email: Option<String>,
    pub academic_email: Option<String>,
    pub scholar_email: Option<String>,

    pub first_access: String,
    pub last_access: String,
    pub deleted: String,

    pub created_at: String,
    pub changed_at: String,
    pub password_set_at: String,
    pub last_access_at: String,

    pub photo_blob: Option<String>,
}

/// Claim names carried by every assertion, in serialized order.
pub const ASSERTION_FIELDS: [&str; 25] = [
    "username",
    "cpf",
    "is_active",
    "active",
    "status",
    "presentation_name",
    "civil_name",
    "social_name",
    "campus",
    "department",
    "title",
    "carrer",
    "job",
    "personal_email",
    "enterprise_email",
    "academic_email",
    "scholar_email",
    "first_access",
    "last_access",
    "deleted",
    "created_at",
    "changed_at",
    "password_set_at",
    "last_access_at",
    "photo_blob",
];
