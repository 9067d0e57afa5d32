//! User derivation rules and directory import.
//!
//! Derived fields are recomputed on every save so the stored record never
//! disagrees with its raw inputs.

pub mod timestamps;

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::auth::AuthError;
use crate::models::user::{User, UserImport};
use crate::store::AcessoStore;
use timestamps::normalize;

/// Raw `active` value that marks a user as active.
pub const ACTIVE_MARKER: &str = "Active";

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

/// Whether the raw directory status marks the user active.
pub fn is_active_marker(active: Option<&str>) -> bool {
    active == Some(ACTIVE_MARKER)
}

/// First non-empty address: personal > enterprise > academic > scholar.
pub fn primary_email(
    personal: Option<&str>,
    enterprise: Option<&str>,
    academic: Option<&str>,
    scholar: Option<&str>,
) -> Option<String> {
    [personal, enterprise, academic, scholar]
        .into_iter()
        .find_map(non_empty)
        .map(str::to_string)
}

/// First and last name joined by a space.
pub fn civil_name(first_name: Option<&str>, last_name: Option<&str>) -> String {
    format!("{} {}", first_name.unwrap_or(""), last_name.unwrap_or(""))
        .trim()
        .to_string()
}

/// The social name when set and distinct from the civil name.
pub fn presentation_name(social_name: Option<&str>, civil_name: &str) -> String {
    match non_empty(social_name) {
        Some(social) if social != civil_name => social.to_string(),
        _ => civil_name.to_string(),
    }
}

/// Display status, e.g. `"active (superuser but not a staff)"`.
pub fn status(is_active: bool, is_staff: bool, is_superuser: bool) -> String {
    let mut result = String::from(if is_active { "active " } else { "inactive " });
    if is_superuser {
        result.push_str("(superuser");
        if !is_staff {
            result.push_str(" but not a staff");
        }
        result.push(')');
    } else if is_staff {
        result.push_str("(staff)");
    } else {
        result.push_str("(user)");
    }
    result
}

fn some_if_filled(value: String) -> Option<String> {
    (!value.is_empty()).then_some(value)
}

impl User {
    /// Build a stored record from an import, computing derived fields.
    ///
    /// `first_access` and `last_access` are both set to `now`; the store keeps
    /// the original `first_access` when the user already exists.
    pub fn from_import(import: UserImport, now: DateTime<Utc>) -> Self {
        let civil = civil_name(import.first_name.as_deref(), import.last_name.as_deref());
        let presentation = presentation_name(import.social_name.as_deref(), &civil);
        let email = primary_email(
            import.email.as_deref(),
            import.enterprise_email.as_deref(),
            import.academic_email.as_deref(),
            import.scholar_email.as_deref(),
        );

        Self {
            is_active: is_active_marker(import.active.as_deref()),
            is_staff: import.is_staff,
            is_superuser: import.is_superuser,
            presentation_name: some_if_filled(presentation),
            civil_name: some_if_filled(civil),
            email,
            first_access: now,
            last_access: now,
            deleted: normalize("deleted", import.deleted.as_deref()),
            created_at: normalize("created_at", import.created_at.as_deref()),
            changed_at: normalize("changed_at", import.changed_at.as_deref()),
            password_set_at: normalize("password_set_at", import.password_set_at.as_deref()),
            last_access_at: normalize("last_access_at", import.last_access_at.as_deref()),
            username: import.username,
            cpf: import.cpf,
            active: import.active,
            social_name: import.social_name,
            first_name: import.first_name,
            last_name: import.last_name,
            campus: import.campus,
            department: import.department,
            title: import.title,
            carrer: import.carrer,
            job: import.job,
            enterprise_email: import.enterprise_email,
            academic_email: import.academic_email,
            scholar_email: import.scholar_email,
            photo_blob: import.photo_blob,
        }
    }

    /// Display status derived from the three flags.
    pub fn status(&self) -> String {
        status(self.is_active, self.is_staff, self.is_superuser)
    }

    /// `"social (civil)"` when the social name differs, else the civil name.
    pub fn printing_name(&self) -> String {
        let civil = self.civil_name.as_deref().unwrap_or("");
        match non_empty(self.social_name.as_deref()) {
            Some(social) if social != civil => format!("{social} ({civil})"),
            _ => civil.to_string(),
        }
    }
}

/// Derive fields for an imported user and upsert it.
pub async fn save(store: &dyn AcessoStore, import: UserImport) -> Result<User, AuthError> {
    if import.username.trim().is_empty() {
        return Err(AuthError::ValidationError("username is required".into()));
    }
    let user = User::from_import(import, Utc::now());
    let saved = store.upsert_user(&user).await?;
    debug!(username = %saved.username, is_active = saved.is_active, "user saved");
    Ok(saved)
}
