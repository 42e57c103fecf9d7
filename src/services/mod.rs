// src/services/mod.rs
//
// Shared services: the OIDC client provider and the per-platform social
// publishers.

pub mod oidc;
pub mod publisher;

// Re-export commonly used types for convenience
pub use oidc::{OidcConfig, OidcService};
pub use publisher::{PublishError, PublishReceipt, PublisherService};
