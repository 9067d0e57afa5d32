//! Authorization request handler.

use acesso_core::auth::authorize::{self, AuthorizeRequest};
use axum::Json;
use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::http::header::REFERER;

use crate::AppState;
use crate::error::AppResult;
use crate::middleware::auth::AuthenticatedUser;
use crate::models::{AuthorizeQuery, AuthorizeResponse};

/// `GET /api/v1/authorize`: authorize the remote user for a client
/// application and return the transaction hashcode.
pub async fn authorize_handler(
    State(state): State<AppState>,
    axum::Extension(AuthenticatedUser(user)): axum::Extension<AuthenticatedUser>,
    headers: HeaderMap,
    query: Result<Query<AuthorizeQuery>, QueryRejection>,
) -> AppResult<Json<AuthorizeResponse>> {
    let Query(query) = query?;
    let referer = headers.get(REFERER).and_then(|v| v.to_str().ok());
    let hashcode = authorize::authorize(
        state.store.as_ref(),
        &state.config.flow,
        &user,
        AuthorizeRequest {
            client_id: &query.client_id,
            state: &query.state,
            redirect_uri: &query.redirect_uri,
            referer,
        },
    )
    .await?;
    Ok(Json(AuthorizeResponse { hashcode }))
}
