use axum::{extract::{Path, Query, State}, http::StatusCode, Extension, Json};
use axum_extra::extract::WithRejection;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use common::pagination::{Page, PageQuery};
use models::schedule;
use service::auth::token::Claims;
use service::schedule_service::{self, CreateScheduleInput, UpdateScheduleInput};

use crate::{errors::JsonApiError, routes::auth::ServerState};

#[derive(Debug, Clone, Default, Deserialize, Serialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct OwnerFilter {
    /// Restrict the listing to one owner (admins only for other users)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner_id: Option<Uuid>,
}

#[utoipa::path(
    get, path = "/schedules", tag = "schedules",
    params(crate::openapi::PageParams, OwnerFilter),
    responses(
        (status = 200, description = "List OK"),
        (status = 400, description = "Unknown sort column"),
        (status = 403, description = "Forbidden")
    )
)]
pub async fn list(
    State(state): State<ServerState>,
    Extension(claims): Extension<Claims>,
    WithRejection(Query(q), _): WithRejection<Query<PageQuery>, JsonApiError>,
    WithRejection(Query(filter), _): WithRejection<Query<OwnerFilter>, JsonApiError>,
) -> Result<Json<Page<schedule::Model>>, JsonApiError> {
    let page = schedule_service::list_schedules(&state.db, claims.actor(), filter.owner_id, &q).await?;
    Ok(Json(page))
}

#[utoipa::path(
    get, path = "/schedules/{id}", tag = "schedules",
    params(("id" = Uuid, Path, description = "Schedule id")),
    responses((status = 200, description = "Found"), (status = 403, description = "Forbidden"), (status = 404, description = "Not Found"))
)]
pub async fn get(
    State(state): State<ServerState>,
    Extension(claims): Extension<Claims>,
    WithRejection(Path(id), _): WithRejection<Path<Uuid>, JsonApiError>,
) -> Result<Json<schedule::Model>, JsonApiError> {
    Ok(Json(schedule_service::get_schedule(&state.db, claims.actor(), id).await?))
}

#[utoipa::path(
    post, path = "/schedules", tag = "schedules",
    request_body = crate::openapi::CreateScheduleRequestDoc,
    responses((status = 200, description = "Created"), (status = 400, description = "Validation Error"), (status = 403, description = "Forbidden"))
)]
pub async fn create(
    State(state): State<ServerState>,
    Extension(claims): Extension<Claims>,
    WithRejection(Json(input), _): WithRejection<Json<CreateScheduleInput>, JsonApiError>,
) -> Result<Json<schedule::Model>, JsonApiError> {
    Ok(Json(schedule_service::create_schedule(&state.db, claims.actor(), input).await?))
}

#[utoipa::path(
    put, path = "/schedules/{id}", tag = "schedules",
    params(("id" = Uuid, Path, description = "Schedule id")),
    request_body = crate::openapi::UpdateScheduleRequestDoc,
    responses((status = 200, description = "Updated"), (status = 400, description = "Validation Error"), (status = 403, description = "Forbidden"), (status = 404, description = "Not Found"))
)]
pub async fn update(
    State(state): State<ServerState>,
    Extension(claims): Extension<Claims>,
    WithRejection(Path(id), _): WithRejection<Path<Uuid>, JsonApiError>,
    WithRejection(Json(input), _): WithRejection<Json<UpdateScheduleInput>, JsonApiError>,
) -> Result<Json<schedule::Model>, JsonApiError> {
    Ok(Json(schedule_service::update_schedule(&state.db, claims.actor(), id, input).await?))
}

#[utoipa::path(
    delete, path = "/schedules/{id}", tag = "schedules",
    params(("id" = Uuid, Path, description = "Schedule id")),
    responses((status = 204, description = "Deleted"), (status = 403, description = "Forbidden"), (status = 404, description = "Not Found"))
)]
pub async fn delete(
    State(state): State<ServerState>,
    Extension(claims): Extension<Claims>,
    WithRejection(Path(id), _): WithRejection<Path<Uuid>, JsonApiError>,
) -> Result<StatusCode, JsonApiError> {
    schedule_service::delete_schedule(&state.db, claims.actor(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}
