//! Service layer providing business-oriented operations on top of models.
//! - Separates business logic and permission checks from data access.
//! - Reuses validation and entity definitions in `models` crate.
//! - Provides clear error types and documented interfaces.

pub mod errors;
pub mod auth;
pub mod user_service;
pub mod schedule_service;
mod pagination;
#[cfg(test)]
pub mod test_support;

pub use auth::{Actor, AuthConfig};
pub use errors::ServiceError;
