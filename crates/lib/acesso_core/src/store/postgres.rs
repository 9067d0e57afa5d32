//! PostgreSQL store.
//!
//! Row structs mirror the tables in `migrations/`; explicit `From` impls map
//! them onto the domain models. Uniqueness and cascades are enforced by the
//! schema, not here.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::AcessoStore;
use crate::auth::AuthError;
use crate::models::auth::{Application, TransactionToken};
use crate::models::user::User;

const USER_COLUMNS: &str = "username, cpf, is_active, is_staff, is_superuser, active, \
     presentation_name, civil_name, social_name, first_name, last_name, \
     campus, department, title, carrer, job, \
     email, enterprise_email, academic_email, scholar_email, \
     first_access, last_access, deleted, \
     created_at, changed_at, password_set_at, last_access_at, photo_blob";

const APPLICATION_COLUMNS: &str = "id, owner, name, description, client_id, secret, \
     allowed_callback_urls, allowed_web_origins, allowed_logout_urls, \
     expiration, created_at, deleted_at";

const TRANSACTION_COLUMNS: &str = "id, application_id, username, hashcode, state, \
     redirect_uri, referer, created_at, expire_at";

#[derive(sqlx::FromRow)]
struct UserRow {
    username: String,
    cpf: Option<String>,
    is_active: bool,
    is_staff: bool,
    is_superuser: bool,
    active: Option<String>,
    presentation_name: Option<String>,
    civil_name: Option<String>,
    social_name: Option<String>,
    first_name: Option<String>,
    last_name: Option<String>,
    campus: Option<String>,
    department: Option<String>,
    title: Option<String>,
    carrer: Option<String>,
    job: Option<String>,
    email: Option<String>,
    enterprise_email: Option<String>,
    academic_email: Option<String>,
    scholar_email: Option<String>,
    first_access: DateTime<Utc>,
    last_access: DateTime<Utc>,
    deleted: Option<DateTime<Utc>>,
    created_at: Option<DateTime<Utc>>,
    changed_at: Option<DateTime<Utc>>,
    password_set_at: Option<DateTime<Utc>>,
    last_access_at: Option<DateTime<Utc>>,
    photo_blob: Option<String>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        Self {
            username: row.username,
            cpf: row.cpf,
            is_active: row.is_active,
            is_staff: row.is_staff,
            is_superuser: row.is_superuser,
            active: row.active,
            presentation_name: row.presentation_name,
            civil_name: row.civil_name,
            social_name: row.social_name,
            first_name: row.first_name,
            last_name: row.last_name,
            campus: row.campus,
            department: row.department,
            title: row.title,
            carrer: row.carrer,
            job: row.job,
            email: row.email,
            enterprise_email: row.enterprise_email,
            academic_email: row.academic_email,
            scholar_email: row.scholar_email,
            first_access: row.first_access,
            last_access: row.last_access,
            deleted: row.deleted,
            created_at: row.created_at,
            changed_at: row.changed_at,
            password_set_at: row.password_set_at,
            last_access_at: row.last_access_at,
            photo_blob: row.photo_blob,
        }
    }
}

#[derive(sqlx::FromRow)]
struct ApplicationRow {
    id: Uuid,
    owner: String,
    name: String,
    description: Option<String>,
    client_id: String,
    secret: String,
    allowed_callback_urls: Option<String>,
    allowed_web_origins: Option<String>,
    allowed_logout_urls: Option<String>,
    expiration: i32,
    created_at: DateTime<Utc>,
    deleted_at: Option<DateTime<Utc>>,
}

impl From<ApplicationRow> for Application {
    fn from(row: ApplicationRow) -> Self {
        Self {
            id: row.id,
            owner: row.owner,
            name: row.name,
            description: row.description,
            client_id: row.client_id,
            secret: row.secret,
            allowed_callback_urls: row.allowed_callback_urls,
            allowed_web_origins: row.allowed_web_origins,
            allowed_logout_urls: row.allowed_logout_urls,
            expiration: row.expiration,
            created_at: row.created_at,
            deleted_at: row.deleted_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct TransactionRow {
    id: Uuid,
    application_id: Uuid,
    username: String,
    hashcode: String,
    state: String,
    redirect_uri: String,
    referer: Option<String>,
    created_at: DateTime<Utc>,
    expire_at: DateTime<Utc>,
}

impl From<TransactionRow> for TransactionToken {
    fn from(row: TransactionRow) -> Self {
        Self {
            id: row.id,
            application_id: row.application_id,
            username: row.username,
            hashcode: row.hashcode,
            state: row.state,
            redirect_uri: row.redirect_uri,
            referer: row.referer,
            created_at: row.created_at,
            expire_at: row.expire_at,
        }
    }
}

/// Translate constraint violations into domain errors.
fn map_write_error(e: sqlx::Error, duplicate: &str, missing: impl FnOnce() -> AuthError) -> AuthError {
    let (unique, foreign_key) = e
        .as_database_error()
        .map(|db| (db.is_unique_violation(), db.is_foreign_key_violation()))
        .unwrap_or((false, false));
    if unique {
        AuthError::Duplicate(duplicate.to_string())
    } else if foreign_key {
        missing()
    } else {
        AuthError::DbError(e)
    }
}

/// Store backed by a PostgreSQL pool.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl AcessoStore for PgStore {
    async fn ping(&self) -> Result<(), AuthError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn upsert_user(&self, user: &User) -> Result<User, AuthError> {
        let sql = format!(
            "INSERT INTO users ({USER_COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, \
                     $15, $16, $17, $18, $19, $20, $21, $22, $23, $24, $25, $26, $27, $28) \
             ON CONFLICT (username) DO UPDATE SET \
                cpf = EXCLUDED.cpf, \
                is_active = EXCLUDED.is_active, \
                is_staff = EXCLUDED.is_staff, \
                is_superuser = EXCLUDED.is_superuser, \
                active = EXCLUDED.active, \
                presentation_name = EXCLUDED.presentation_name, \
                civil_name = EXCLUDED.civil_name, \
                social_name = EXCLUDED.social_name, \
                first_name = EXCLUDED.first_name, \
                last_name = EXCLUDED.last_name, \
                campus = EXCLUDED.campus, \
                department = EXCLUDED.department, \
                title = EXCLUDED.title, \
                carrer = EXCLUDED.carrer, \
                job = EXCLUDED.job, \
                email = EXCLUDED.email, \
                enterprise_email = EXCLUDED.enterprise_email, \
                academic_email = EXCLUDED.academic_email, \
                scholar_email = EXCLUDED.scholar_email, \
                last_access = EXCLUDED.last_access, \
                deleted = EXCLUDED.deleted, \
                created_at = EXCLUDED.created_at, \
                changed_at = EXCLUDED.changed_at, \
                password_set_at = EXCLUDED.password_set_at, \
                last_access_at = EXCLUDED.last_access_at, \
                photo_blob = EXCLUDED.photo_blob \
             RETURNING {USER_COLUMNS}"
        );
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(&user.username)
            .bind(&user.cpf)
            .bind(user.is_active)
            .bind(user.is_staff)
            .bind(user.is_superuser)
            .bind(&user.active)
            .bind(&user.presentation_name)
            .bind(&user.civil_name)
            .bind(&user.social_name)
            .bind(&user.first_name)
            .bind(&user.last_name)
            .bind(&user.campus)
            .bind(&user.department)
            .bind(&user.title)
            .bind(&user.carrer)
            .bind(&user.job)
            .bind(&user.email)
            .bind(&user.enterprise_email)
            .bind(&user.academic_email)
            .bind(&user.scholar_email)
            .bind(user.first_access)
            .bind(user.last_access)
            .bind(user.deleted)
            .bind(user.created_at)
            .bind(user.changed_at)
            .bind(user.password_set_at)
            .bind(user.last_access_at)
            .bind(&user.photo_blob)
            .fetch_one(&self.pool)
            .await?;
        Ok(row.into())
    }

    async fn find_user(&self, username: &str) -> Result<Option<User>, AuthError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE username = $1");
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(User::from))
    }

    async fn delete_user(&self, username: &str) -> Result<bool, AuthError> {
        let result = sqlx::query("DELETE FROM users WHERE username = $1")
            .bind(username)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn insert_application(&self, app: &Application) -> Result<(), AuthError> {
        let sql = format!(
            "INSERT INTO applications ({APPLICATION_COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)"
        );
        sqlx::query(&sql)
            .bind(app.id)
            .bind(&app.owner)
            .bind(&app.name)
            .bind(&app.description)
            .bind(&app.client_id)
            .bind(&app.secret)
            .bind(&app.allowed_callback_urls)
            .bind(&app.allowed_web_origins)
            .bind(&app.allowed_logout_urls)
            .bind(app.expiration)
            .bind(app.created_at)
            .bind(app.deleted_at)
            .execute(&self.pool)
            .await
            .map_err(|e| map_write_error(e, "client_id", || AuthError::UnknownUser(app.owner.clone())))?;
        Ok(())
    }

    async fn update_application(&self, app: &Application) -> Result<bool, AuthError> {
        let result = sqlx::query(
            "UPDATE applications SET \
                name = $2, description = $3, \
                allowed_callback_urls = $4, allowed_web_origins = $5, allowed_logout_urls = $6, \
                expiration = $7 \
             WHERE id = $1",
        )
        .bind(app.id)
        .bind(&app.name)
        .bind(&app.description)
        .bind(&app.allowed_callback_urls)
        .bind(&app.allowed_web_origins)
        .bind(&app.allowed_logout_urls)
        .bind(app.expiration)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn find_active_application(
        &self,
        client_id: &str,
    ) -> Result<Option<Application>, AuthError> {
        let sql = format!(
            "SELECT {APPLICATION_COLUMNS} FROM applications \
             WHERE client_id = $1 AND deleted_at IS NULL"
        );
        let row = sqlx::query_as::<_, ApplicationRow>(&sql)
            .bind(client_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Application::from))
    }

    async fn soft_delete_application(
        &self,
        client_id: &str,
        at: DateTime<Utc>,
    ) -> Result<bool, AuthError> {
        let result = sqlx::query(
            "UPDATE applications SET deleted_at = $2 \
             WHERE client_id = $1 AND deleted_at IS NULL",
        )
        .bind(client_id)
        .bind(at)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_application(&self, id: Uuid) -> Result<bool, AuthError> {
        let result = sqlx::query("DELETE FROM applications WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn insert_transaction(&self, token: &TransactionToken) -> Result<(), AuthError> {
        let sql = format!(
            "INSERT INTO transaction_tokens ({TRANSACTION_COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)"
        );
        sqlx::query(&sql)
            .bind(token.id)
            .bind(token.application_id)
            .bind(&token.username)
            .bind(&token.hashcode)
            .bind(&token.state)
            .bind(&token.redirect_uri)
            .bind(&token.referer)
            .bind(token.created_at)
            .bind(token.expire_at)
            .execute(&self.pool)
            .await
            .map_err(|e| map_write_error(e, "hashcode", || AuthError::UnknownUser(token.username.clone())))?;
        Ok(())
    }

    async fn find_live_transaction(
        &self,
        application_id: Uuid,
        hashcode: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<TransactionToken>, AuthError> {
        let sql = format!(
            "SELECT {TRANSACTION_COLUMNS} FROM transaction_tokens \
             WHERE application_id = $1 AND hashcode = $2 AND expire_at > $3"
        );
        let row = sqlx::query_as::<_, TransactionRow>(&sql)
            .bind(application_id)
            .bind(hashcode)
            .bind(now)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(TransactionToken::from))
    }

    async fn take_live_transaction(
        &self,
        application_id: Uuid,
        hashcode: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<TransactionToken>, AuthError> {
        let sql = format!(
            "DELETE FROM transaction_tokens \
             WHERE application_id = $1 AND hashcode = $2 AND expire_at > $3 \
             RETURNING {TRANSACTION_COLUMNS}"
        );
        let row = sqlx::query_as::<_, TransactionRow>(&sql)
            .bind(application_id)
            .bind(hashcode)
            .bind(now)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(TransactionToken::from))
    }

    async fn purge_expired_transactions(&self, now: DateTime<Utc>) -> Result<u64, AuthError> {
        let result = sqlx::query("DELETE FROM transaction_tokens WHERE expire_at <= $1")
            .bind(now)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}
