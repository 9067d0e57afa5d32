//! Domain models.
//!
//! Explicit structs per entity; the store implementations map them to and
//! from their persistence shape.

pub mod auth;
pub mod user;
