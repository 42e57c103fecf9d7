//! # Profile Module
//!
//! Profile display fields and per-platform social credentials. Credential
//! documents are typed per platform so shape errors fail at save time.

pub mod handlers;
pub mod models;
pub mod routes;

#[cfg(test)]
mod tests;

pub use models::{Platform, SocialCredentialData};
pub use routes::profile_routes;
