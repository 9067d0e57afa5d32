//! # acesso_core
//!
//! Core domain logic for Acesso: client applications, authorization
//! transactions and the signed identity assertions exchanged for them.

pub mod auth;
pub mod config;
pub mod migrate;
pub mod models;
pub mod store;
pub mod users;
pub mod uuid;

#[cfg(test)]
mod test_support;

/// Returns the crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
