//! Authorization flow: validates a request and mints a transaction.

use chrono::{DateTime, Utc};
use tracing::info;

use super::allow_list::{self, decode_form_component, strip_query};
use super::{AuthError, credentials, jwt, ledger};
use crate::config::FlowConfig;
use crate::models::auth::TransactionToken;
use crate::models::user::User;
use crate::store::AcessoStore;
use crate::uuid::{new_hashcode, uuidv7};

/// Claims a decoded `state` must carry.
const REQUIRED_STATE_FIELDS: [&str; 2] = ["client_id", "uuid"];

/// Inputs of an authorization request, as received from the client.
#[derive(Debug, Clone, Copy)]
pub struct AuthorizeRequest<'a> {
    pub client_id: &'a str,
    /// HS512 JWT signed with the application secret.
    pub state: &'a str,
    /// Form-encoded redirect URI.
    pub redirect_uri: &'a str,
    pub referer: Option<&'a str>,
}

/// Authorize `user` for the requesting application and return a hashcode.
pub async fn authorize(
    store: &dyn AcessoStore,
    config: &FlowConfig,
    user: &User,
    request: AuthorizeRequest<'_>,
) -> Result<String, AuthError> {
    authorize_at(store, config, user, request, Utc::now()).await
}

/// [`authorize`] with an explicit clock.
pub async fn authorize_at(
    store: &dyn AcessoStore,
    config: &FlowConfig,
    user: &User,
    request: AuthorizeRequest<'_>,
    now: DateTime<Utc>,
) -> Result<String, AuthError> {
    let app = credentials::lookup_by_client_id(store, request.client_id).await?;

    let state = jwt::decode_claims(request.state, app.secret.as_bytes())?;
    if let Some(missing) = REQUIRED_STATE_FIELDS
        .into_iter()
        .find(|field| !state.contains_key(*field))
    {
        return Err(AuthError::MalformedState(missing));
    }

    let redirect_uri = decode_form_component(request.redirect_uri);
    if !allow_list::contains(app.allowed_callback_urls.as_deref(), &redirect_uri) {
        return Err(AuthError::RedirectUriNotAllowed);
    }

    if config.check_referer
        && let Some(referer) = request.referer
        && !allow_list::contains(app.allowed_web_origins.as_deref(), strip_query(referer))
    {
        return Err(AuthError::RefererNotAllowed);
    }

    let token = TransactionToken {
        id: uuidv7(),
        application_id: app.id,
        username: user.username.clone(),
        hashcode: new_hashcode(),
        state: request.state.to_string(),
        redirect_uri,
        referer: request.referer.map(str::to_string),
        created_at: now,
        expire_at: now + config.transaction_expiry.ttl_for(&app),
    };
    ledger::record(store, &token).await?;

    info!(
        client_id = %app.client_id,
        username = %user.username,
        redirect_uri = %token.redirect_uri,
        "authorization granted"
    );
    Ok(token.hashcode)
}
