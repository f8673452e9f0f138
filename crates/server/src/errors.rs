use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use common::types::ErrorBody;
use service::auth::errors::AuthError;
use service::errors::ServiceError;
use thiserror::Error;
use tracing::error;

/// Error response rendered as `{status, title, detail}`.
#[derive(Debug)]
pub struct JsonApiError {
    pub status: StatusCode,
    pub title: String,
    pub detail: Option<String>,
}

impl JsonApiError {
    pub fn new(status: StatusCode, title: impl Into<String>, detail: Option<String>) -> Self {
        Self { status, title: title.into(), detail }
    }

    pub fn unauthorized(detail: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "Unauthorized", Some(detail.into()))
    }

    pub fn forbidden(detail: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, "Forbidden", Some(detail.into()))
    }

    fn internal(detail: String) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Internal Error", Some(detail))
    }
}

impl IntoResponse for JsonApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            error!(status = %self.status, title = %self.title, detail = ?self.detail, "request failed");
        }
        let body = ErrorBody { status: self.status.as_u16(), title: self.title, detail: self.detail };
        (self.status, Json(body)).into_response()
    }
}

impl From<ServiceError> for JsonApiError {
    fn from(e: ServiceError) -> Self {
        match e {
            ServiceError::Validation(m) => Self::new(StatusCode::BAD_REQUEST, "Validation Error", Some(m)),
            ServiceError::NotFound(m) => Self::new(StatusCode::NOT_FOUND, "Not Found", Some(m)),
            ServiceError::Conflict(m) => Self::new(StatusCode::CONFLICT, "Conflict", Some(m)),
            ServiceError::Forbidden(m) => Self::forbidden(m),
            ServiceError::Db(m) => Self::internal(m),
        }
    }
}

impl From<AuthError> for JsonApiError {
    fn from(e: AuthError) -> Self {
        let detail = e.to_string();
        match e {
            AuthError::Validation(_) => Self::new(StatusCode::BAD_REQUEST, "Validation Error", Some(detail)),
            AuthError::Conflict => Self::new(StatusCode::CONFLICT, "Conflict", Some(detail)),
            AuthError::NotFound => Self::new(StatusCode::NOT_FOUND, "Not Found", Some(detail)),
            AuthError::Unauthorized | AuthError::TokenError(_) => Self::unauthorized(detail),
            AuthError::HashError(_) | AuthError::Repository(_) => Self::internal(detail),
        }
    }
}

impl JsonApiError {
    /// Extractor rejections keep their status; the body text becomes the detail.
    fn rejected(status: StatusCode, detail: String) -> Self {
        let title = match status {
            StatusCode::BAD_REQUEST => "Bad Request",
            StatusCode::UNPROCESSABLE_ENTITY => "Unprocessable Entity",
            StatusCode::UNSUPPORTED_MEDIA_TYPE => "Unsupported Media Type",
            StatusCode::PAYLOAD_TOO_LARGE => "Payload Too Large",
            _ if status.is_server_error() => "Internal Error",
            _ => "Invalid Request",
        };
        Self::new(status, title, Some(detail))
    }
}

impl From<QueryRejection> for JsonApiError {
    fn from(r: QueryRejection) -> Self {
        Self::rejected(r.status(), r.body_text())
    }
}

impl From<PathRejection> for JsonApiError {
    fn from(r: PathRejection) -> Self {
        Self::rejected(r.status(), r.body_text())
    }
}

impl From<JsonRejection> for JsonApiError {
    fn from(r: JsonRejection) -> Self {
        Self::rejected(r.status(), r.body_text())
    }
}

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}
