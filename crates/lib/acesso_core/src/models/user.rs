//! User domain models.
//!
//! `User` is the stored record with derived fields already computed.
//! `UserImport` is the raw shape fed in by a directory sync, with legacy
//! string timestamps not yet normalized.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Stored user record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub username: String,
    pub cpf: Option<String>,

    pub is_active: bool,
    pub is_staff: bool,
    pub is_superuser: bool,
    /// Raw directory status string (`is_active` is derived from it).
    pub active: Option<String>,

    pub presentation_name: Option<String>,
    pub civil_name: Option<String>,
    pub social_name: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,

    pub campus: Option<String>,
    pub department: Option<String>,
    pub title: Option<String>,
    pub carrer: Option<String>,
    pub job: Option<String>,

    /// Personal email, falling back to the other addresses on save.
    pub email: Option<String>,
    pub enterprise_email: Option<String>,
    pub academic_email: Option<String>,
    pub scholar_email: Option<String>,

    pub first_access: DateTime<Utc>,
    pub last_access: DateTime<Utc>,
    pub deleted: Option<DateTime<Utc>>,

    pub created_at: Option<DateTime<Utc>>,
    pub changed_at: Option<DateTime<Utc>>,
    pub password_set_at: Option<DateTime<Utc>>,
    pub last_access_at: Option<DateTime<Utc>>,

    pub photo_blob: Option<String>,
}

/// Raw user record as delivered by an import.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserImport {
    pub username: String,
    pub cpf: Option<String>,

    pub is_staff: bool,
    pub is_superuser: bool,
    pub active: Option<String>,

    pub social_name: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,

    pub campus: Option<String>,
    pub department: Option<String>,
    pub title: Option<String>,
    pub carrer: Option<String>,
    pub job: Option<String>,

    #[serde(alias = "personal_email")]
    pub email: Option<String>,
    pub enterprise_email: Option<String>,
    pub academic_email: Option<String>,
    pub scholar_email: Option<String>,

    pub deleted: Option<String>,
    pub created_at: Option<String>,
    pub changed_at: Option<String>,
    pub password_set_at: Option<String>,
    pub last_access_at: Option<String>,

    pub photo_blob: Option<String>,
}
