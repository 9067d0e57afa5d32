//! Remote-user authentication middleware.
//!
//! The fronting proxy authenticates the user and forwards the username in a
//! configured header. This layer resolves it to a stored user.

use acesso_core::auth::AuthError;
use acesso_core::models::user::User;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use tracing::debug;

use crate::AppState;
use crate::error::AppError;

/// Key used to store the resolved `User` in request extensions.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub User);

/// Axum middleware: reads the remote-user header, loads the user and injects
/// `AuthenticatedUser` into request extensions.
pub async fn require_user(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let username = request
        .headers()
        .get(state.config.remote_user_header.as_str())
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AppError::Unauthorized("Missing remote user".into()))?
        .to_string();

    let user = state
        .store
        .find_user(&username)
        .await?
        .ok_or(AuthError::UnknownUser(username))?;

    debug!(username = %user.username, "remote user resolved");
    request.extensions_mut().insert(AuthenticatedUser(user));

    Ok(next.run(request).await)
}
