//! Token exchange handler.

use acesso_core::auth::exchange;
use axum::Json;
use axum::extract::rejection::PathRejection;
use axum::extract::{Path, State};

use crate::AppState;
use crate::error::AppResult;
use crate::models::ValidateResponse;

/// `GET /api/v1/validate/{client_id}/{auth_token}`: exchange a hashcode for
/// a signed identity assertion.
pub async fn validate_handler(
    State(state): State<AppState>,
    path: Result<Path<(String, String)>, PathRejection>,
) -> AppResult<Json<ValidateResponse>> {
    let Path((client_id, auth_token)) = path?;
    let token = exchange::validate(
        state.store.as_ref(),
        &state.config.flow,
        &client_id,
        &auth_token,
    )
    .await?;
    Ok(Json(ValidateResponse { token }))
}
