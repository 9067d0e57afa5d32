//! Authorization handshake.
//!
//! Credential store, transaction ledger, the authorize flow and the token
//! exchange, plus the HS512 JWT helpers they share. Shared by `acesso_api`
//! and the `acesso_server` CLI.

pub mod allow_list;
pub mod authorize;
pub mod credentials;
pub mod exchange;
pub mod jwt;
pub mod ledger;

use thiserror::Error;

/// Authorization errors.
///
/// A flow that fails with any of these has written nothing.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid 'client_id'")]
    InvalidClient,

    #[error("Invalid 'state'")]
    InvalidState,

    #[error("'state' invalid encoded, {0} not present")]
    MalformedState(&'static str),

    #[error("'redirect_uri' not present on 'allowed_callback_urls'")]
    RedirectUriNotAllowed,

    #[error("'referer' not present on 'allowed_web_origins'")]
    RefererNotAllowed,

    #[error("Transaction not found or expired")]
    TransactionNotFoundOrExpired,

    #[error("Unknown user: {0}")]
    UnknownUser(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Duplicate {0}")]
    Duplicate(String),

    #[error("Token error: {0}")]
    TokenError(String),

    #[error("Database error: {0}")]
    DbError(#[from] sqlx::Error),
}
