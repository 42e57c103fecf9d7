//! # Projects Module
//!
//! Owner-scoped content projects (title, description, asset URLs).

pub mod handlers;
pub mod models;
pub mod routes;
pub mod validators;

#[cfg(test)]
mod tests;

pub use routes::projects_routes;
