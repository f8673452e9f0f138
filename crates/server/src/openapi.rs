use utoipa::{IntoParams, OpenApi, ToSchema};
use uuid::Uuid;

#[derive(ToSchema)]
pub struct HealthResponse { pub status: String }

#[derive(ToSchema)]
pub struct ErrorResponse { pub status: u16, pub title: String, pub detail: Option<String> }

#[derive(ToSchema)]
pub struct RegisterRequest { pub email: String, pub username: String, pub display_name: String, pub password: String }

#[derive(ToSchema)]
pub struct LoginRequest { pub email: String, pub password: String }

#[derive(ToSchema)]
pub struct ChangePasswordRequest { pub current_password: String, pub new_password: String }

#[derive(ToSchema)]
pub struct CreateUserRequestDoc {
    pub email: String,
    pub username: String,
    pub display_name: String,
    pub password: String,
    /// `user` or `admin`
    pub role: Option<String>,
}

#[derive(ToSchema)]
pub struct UpdateUserRequestDoc {
    pub email: Option<String>,
    pub username: Option<String>,
    pub display_name: Option<String>,
    pub role: Option<String>,
}

#[derive(ToSchema)]
pub struct CreateScheduleRequestDoc {
    pub owner_id: Option<Uuid>,
    pub title: String,
    pub description: Option<String>,
    /// RFC 3339 timestamp
    pub starts_at: String,
    pub ends_at: String,
    /// `planned`, `in_progress`, `done` or `cancelled`
    pub status: Option<String>,
}

#[derive(ToSchema)]
pub struct UpdateScheduleRequestDoc {
    pub title: Option<String>,
    /// Empty string clears the description
    pub description: Option<String>,
    pub starts_at: Option<String>,
    pub ends_at: Option<String>,
    pub status: Option<String>,
}

/// Pagination and sorting query parameters shared by list endpoints.
#[derive(IntoParams)]
#[into_params(parameter_in = Query)]
#[allow(non_snake_case, dead_code)]
pub struct PageParams {
    /// 0-based page index
    page: Option<u64>,
    /// Page size, clamped to 1..=100 (default 10)
    rowsPerPage: Option<u64>,
    /// `asc` or `desc`
    order: Option<String>,
    /// Column key to sort by
    orderBy: Option<String>,
}

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::routes::health,
        crate::routes::auth::register,
        crate::routes::auth::login,
        crate::routes::auth::logout,
        crate::routes::auth::me,
        crate::routes::auth::change_password,
        crate::routes::users::list,
        crate::routes::users::get,
        crate::routes::users::create,
        crate::routes::users::update,
        crate::routes::users::delete,
        crate::routes::schedules::list,
        crate::routes::schedules::get,
        crate::routes::schedules::create,
        crate::routes::schedules::update,
        crate::routes::schedules::delete,
    ),
    components(
        schemas(
            HealthResponse,
            ErrorResponse,
            RegisterRequest,
            LoginRequest,
            ChangePasswordRequest,
            CreateUserRequestDoc,
            UpdateUserRequestDoc,
            CreateScheduleRequestDoc,
            UpdateScheduleRequestDoc,
        )
    ),
    tags(
        (name = "health"),
        (name = "auth"),
        (name = "users"),
        (name = "schedules")
    )
)]
pub struct ApiDoc;
