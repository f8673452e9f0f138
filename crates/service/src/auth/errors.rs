use thiserror::Error;

use crate::errors::ServiceError;

/// Business errors for auth workflows
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("user already exists")]
    Conflict,
    #[error("user not found")]
    NotFound,
    #[error("invalid credentials")]
    Unauthorized,
    #[error("hashing error: {0}")]
    HashError(String),
    #[error("token error: {0}")]
    TokenError(String),
    #[error("repository error: {0}")]
    Repository(String),
}

impl AuthError {
    /// Stable numeric code for external mapping/logging
    pub fn code(&self) -> u16 {
        match self {
            AuthError::Validation(_) => 1001,
            AuthError::Conflict => 1002,
            AuthError::NotFound => 1003,
            AuthError::Unauthorized => 1004,
            AuthError::HashError(_) => 1101,
            AuthError::TokenError(_) => 1102,
            AuthError::Repository(_) => 1200,
        }
    }
}

impl From<models::errors::ModelError> for AuthError {
    fn from(e: models::errors::ModelError) -> Self {
        use models::errors::ModelError;
        match e {
            ModelError::Validation(m) => AuthError::Validation(m),
            ModelError::Conflict(_) => AuthError::Conflict,
            ModelError::Db(m) => AuthError::Repository(m),
        }
    }
}

impl From<AuthError> for ServiceError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::Validation(m) => ServiceError::Validation(m),
            AuthError::Conflict => ServiceError::Conflict("user already exists".into()),
            AuthError::NotFound => ServiceError::not_found("user"),
            AuthError::Unauthorized => ServiceError::Forbidden("invalid credentials".into()),
            AuthError::HashError(m) | AuthError::TokenError(m) | AuthError::Repository(m) => ServiceError::Db(m),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_stable() {
        assert_eq!(AuthError::Validation("x".into()).code(), 1001);
        assert_eq!(AuthError::Conflict.code(), 1002);
        assert_eq!(AuthError::Unauthorized.code(), 1004);
        assert_eq!(AuthError::Repository("db".into()).code(), 1200);
    }
}
