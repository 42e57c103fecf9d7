//! # Publish Module
//!
//! Multi-platform publish fan-out. Each platform resolves independently
//! to a typed result; the response is a single per-platform map.

pub mod handlers;
pub mod models;
pub mod routes;

#[cfg(test)]
mod tests;

pub use routes::publish_routes;
