//! Auth module: three-layer architecture (domain, repository, service).
//!
//! Registration, login, password changes and token verification live here,
//! independent of the web framework.

pub mod domain;
pub mod errors;
pub mod repository;
pub mod service;
pub mod token;
pub mod repo;

pub use domain::Actor;
pub use service::{AuthConfig, AuthService};
