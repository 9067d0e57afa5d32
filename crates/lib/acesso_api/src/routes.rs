//! Route paths, relative to the configured URL prefix.

pub const GET_API_HEALTH: &str = "/api/health";
pub const GET_API_V1_AUTHORIZE: &str = "/api/v1/authorize";
pub const GET_API_V1_VALIDATE: &str = "/api/v1/validate/{client_id}/{auth_token}";
