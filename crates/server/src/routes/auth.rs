use std::sync::Arc;

use axum::{Extension, Json, extract::{State, Request}, http::{header, Method, StatusCode}, middleware::Next, response::Response};
use axum_extra::extract::{cookie::{Cookie, CookieJar, SameSite}, WithRejection};
use serde::Serialize;
use sea_orm::DatabaseConnection;
use tracing::{info, warn};
use uuid::Uuid;

use models::user::Role;
use service::auth::{domain::{ChangePasswordInput, LoginInput, RegisterInput}, service::{AuthConfig, AuthService}};
use service::auth::repo::seaorm::SeaOrmAuthRepository;
use service::auth::errors::AuthError;
use service::auth::token::Claims;

use crate::errors::JsonApiError;

pub const AUTH_COOKIE: &str = "auth_token";

#[derive(Clone)]
pub struct ServerState {
    pub db: DatabaseConnection,
    pub auth: AuthConfig,
}

impl ServerState {
    pub fn auth_service(&self) -> AuthService<SeaOrmAuthRepository> {
        let repo = Arc::new(SeaOrmAuthRepository { db: self.db.clone() });
        AuthService::new(repo, self.auth.clone())
    }
}

#[derive(Serialize)]
pub struct RegisterOutput { pub user_id: Uuid }

#[derive(Serialize)]
pub struct MeOutput { pub user_id: Uuid, pub email: String, pub username: String, pub display_name: String, pub role: Role }

#[derive(Serialize)]
pub struct LoginOutput { pub user_id: Uuid, pub email: String, pub username: String, pub role: Role, pub token: String }

#[utoipa::path(post, path = "/auth/register", tag = "auth", request_body = crate::openapi::RegisterRequest, responses((status = 200, description = "Registered"), (status = 400, description = "Bad Request"), (status = 409, description = "Conflict")))]
pub async fn register(
    State(state): State<ServerState>,
    WithRejection(Json(input), _): WithRejection<Json<RegisterInput>, JsonApiError>,
) -> Result<Json<RegisterOutput>, JsonApiError> {
    let user = state.auth_service().register(input).await?;
    Ok(Json(RegisterOutput { user_id: user.id }))
}

#[utoipa::path(post, path = "/auth/login", tag = "auth", request_body = crate::openapi::LoginRequest, responses((status = 200, description = "Logged In"), (status = 401, description = "Unauthorized")))]
pub async fn login(
    State(state): State<ServerState>,
    jar: CookieJar,
    WithRejection(Json(input), _): WithRejection<Json<LoginInput>, JsonApiError>,
) -> Result<(CookieJar, Json<LoginOutput>), JsonApiError> {
    let session = state.auth_service().login(input).await?;
    let user = session.user;
    let mut cookie = Cookie::new(AUTH_COOKIE, session.token.clone());
    cookie.set_path("/");
    cookie.set_http_only(true);
    cookie.set_secure(false);
    cookie.set_same_site(SameSite::Lax);
    let out = LoginOutput { user_id: user.id, email: user.email, username: user.username, role: user.role, token: session.token };
    Ok((jar.add(cookie), Json(out)))
}

#[utoipa::path(post, path = "/auth/logout", tag = "auth", responses((status = 204, description = "Logged Out")))]
pub async fn logout(jar: CookieJar) -> (CookieJar, StatusCode) {
    let mut cookie = Cookie::from(AUTH_COOKIE);
    cookie.set_path("/");
    (jar.remove(cookie), StatusCode::NO_CONTENT)
}

#[utoipa::path(get, path = "/auth/me", tag = "auth", responses((status = 200, description = "Current User"), (status = 401, description = "Unauthorized")))]
pub async fn me(State(state): State<ServerState>, Extension(claims): Extension<Claims>) -> Result<Json<MeOutput>, JsonApiError> {
    let user = state.auth_service().current_user(&claims).await?;
    Ok(Json(MeOutput { user_id: user.id, email: user.email, username: user.username, display_name: user.display_name, role: user.role }))
}

#[utoipa::path(post, path = "/auth/password", tag = "auth", request_body = crate::openapi::ChangePasswordRequest, responses((status = 204, description = "Password Changed"), (status = 400, description = "Bad Request"), (status = 401, description = "Unauthorized")))]
pub async fn change_password(
    State(state): State<ServerState>,
    Extension(claims): Extension<Claims>,
    WithRejection(Json(input), _): WithRejection<Json<ChangePasswordInput>, JsonApiError>,
) -> Result<StatusCode, JsonApiError> {
    state.auth_service().change_password(claims.sub, input).await?;
    Ok(StatusCode::NO_CONTENT)
}

fn is_public(path: &str, method: &Method) -> bool {
    path == "/health"
        || path == "/auth/login"
        || path == "/auth/register"
        || path.starts_with("/docs")
        || path.starts_with("/api-docs")
        || method == Method::OPTIONS
}

/// Global middleware: everything except the public routes needs `Authorization: Bearer <token>`
/// or the `auth_token` cookie. The token's user must still exist; its claims, refreshed from
/// the user row, are stored in the request extensions.
pub async fn require_bearer_token_state(
    State(state): State<ServerState>,
    mut req: Request,
    next: Next,
) -> Result<Response, JsonApiError> {
    let path = req.uri().path().to_string();
    if is_public(&path, req.method()) {
        return Ok(next.run(req).await);
    }

    let authz = req.headers().get(header::AUTHORIZATION).and_then(|v| v.to_str().ok());
    let token = match authz {
        Some(h) => match h.strip_prefix("Bearer ") {
            Some(t) => t.trim().to_string(),
            None => {
                warn!(path = %path, "invalid Authorization format (expect Bearer)");
                return Err(JsonApiError::unauthorized("expected a Bearer token"));
            }
        },
        None => CookieJar::from_headers(req.headers())
            .get(AUTH_COOKIE)
            .map(|c| c.value().to_string())
            .unwrap_or_default(),
    };
    if token.is_empty() {
        warn!(path = %path, "missing Authorization header and auth_token cookie");
        return Err(JsonApiError::unauthorized("missing token"));
    }

    // Claims carry the stored role, not the one signed into the token
    match state.auth_service().authenticate(&token).await {
        Ok(claims) => {
            req.extensions_mut().insert(claims);
            Ok(next.run(req).await)
        }
        Err(e @ (AuthError::Unauthorized | AuthError::TokenError(_))) => {
            info!(path = %path, err = %e, "token validation failed");
            Err(JsonApiError::unauthorized("invalid or expired token"))
        }
        Err(e) => Err(e.into()),
    }
}
