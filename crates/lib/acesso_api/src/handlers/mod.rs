//! Request handlers.

pub mod authorize;
pub mod health;
pub mod validate;
