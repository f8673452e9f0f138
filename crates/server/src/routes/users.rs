use axum::{extract::{Path, Query, State}, http::StatusCode, Extension, Json};
use axum_extra::extract::WithRejection;
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use common::pagination::{Page, PageQuery};
use models::user::{self, Role};
use service::auth::domain::{AuthUser, RegisterInput};
use service::auth::token::Claims;
use service::user_service::{self, UpdateUserInput};

use crate::{errors::JsonApiError, routes::auth::ServerState};

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub email: String,
    pub username: String,
    pub display_name: String,
    pub password: String,
    #[serde(default)]
    pub role: Option<Role>,
}

#[utoipa::path(
    get, path = "/users", tag = "users",
    params(crate::openapi::PageParams),
    responses(
        (status = 200, description = "List OK"),
        (status = 400, description = "Unknown sort column"),
        (status = 403, description = "Admin only")
    )
)]
pub async fn list(
    State(state): State<ServerState>,
    Extension(claims): Extension<Claims>,
    WithRejection(Query(q), _): WithRejection<Query<PageQuery>, JsonApiError>,
) -> Result<Json<Page<user::Model>>, JsonApiError> {
    let page = user_service::list_users(&state.db, claims.actor(), &q).await?;
    Ok(Json(page))
}

#[utoipa::path(
    get, path = "/users/{id}", tag = "users",
    params(("id" = Uuid, Path, description = "User id")),
    responses((status = 200, description = "Found"), (status = 403, description = "Forbidden"), (status = 404, description = "Not Found"))
)]
pub async fn get(
    State(state): State<ServerState>,
    Extension(claims): Extension<Claims>,
    WithRejection(Path(id), _): WithRejection<Path<Uuid>, JsonApiError>,
) -> Result<Json<user::Model>, JsonApiError> {
    Ok(Json(user_service::get_user(&state.db, claims.actor(), id).await?))
}

#[utoipa::path(
    post, path = "/users", tag = "users",
    request_body = crate::openapi::CreateUserRequestDoc,
    responses((status = 200, description = "Created"), (status = 400, description = "Validation Error"), (status = 403, description = "Admin only"), (status = 409, description = "Conflict"))
)]
pub async fn create(
    State(state): State<ServerState>,
    Extension(claims): Extension<Claims>,
    WithRejection(Json(input), _): WithRejection<Json<CreateUserRequest>, JsonApiError>,
) -> Result<Json<AuthUser>, JsonApiError> {
    let role = input.role.unwrap_or_default();
    let register = RegisterInput { email: input.email, username: input.username, display_name: input.display_name, password: input.password };
    let created = user_service::create_user(&state.auth_service(), claims.actor(), register, role).await?;
    info!(user_id = %created.id, by = %claims.sub, "user_created");
    Ok(Json(created))
}

#[utoipa::path(
    put, path = "/users/{id}", tag = "users",
    params(("id" = Uuid, Path, description = "User id")),
    request_body = crate::openapi::UpdateUserRequestDoc,
    responses((status = 200, description = "Updated"), (status = 400, description = "Validation Error"), (status = 403, description = "Forbidden"), (status = 404, description = "Not Found"), (status = 409, description = "Conflict"))
)]
pub async fn update(
    State(state): State<ServerState>,
    Extension(claims): Extension<Claims>,
    WithRejection(Path(id), _): WithRejection<Path<Uuid>, JsonApiError>,
    WithRejection(Json(input), _): WithRejection<Json<UpdateUserInput>, JsonApiError>,
) -> Result<Json<user::Model>, JsonApiError> {
    Ok(Json(user_service::update_user(&state.db, claims.actor(), id, input).await?))
}

#[utoipa::path(
    delete, path = "/users/{id}", tag = "users",
    params(("id" = Uuid, Path, description = "User id")),
    responses((status = 204, description = "Deleted"), (status = 403, description = "Admin only"), (status = 404, description = "Not Found"))
)]
pub async fn delete(
    State(state): State<ServerState>,
    Extension(claims): Extension<Claims>,
    WithRejection(Path(id), _): WithRejection<Path<Uuid>, JsonApiError>,
) -> Result<StatusCode, JsonApiError> {
    user_service::delete_user(&state.db, claims.actor(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}
