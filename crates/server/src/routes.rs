pub mod auth;
pub mod schedules;
pub mod users;

use axum::{middleware, routing::{get, post}, Json, Router};
use tower_http::{
    cors::CorsLayer,
    trace::{TraceLayer, DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, DefaultOnFailure},
};
use tracing::Level;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use common::types::Health;

use crate::admin::pages;
use crate::openapi::ApiDoc;
use auth::ServerState;

#[utoipa::path(get, path = "/health", tag = "health", responses((status = 200, description = "OK", body = crate::openapi::HealthResponse)))]
pub async fn health() -> Json<Health> {
    Json(Health { status: "ok" })
}

/// Build the full application router: public, authenticated API and admin pages
pub fn build_router(state: ServerState, cors: CorsLayer) -> Router {
    let auth_routes = Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/logout", post(auth::logout))
        .route("/auth/me", get(auth::me))
        .route("/auth/password", post(auth::change_password));

    let user_routes = Router::new()
        .route("/users", get(users::list).post(users::create))
        .route("/users/:id", get(users::get).put(users::update).delete(users::delete));

    let schedule_routes = Router::new()
        .route("/schedules", get(schedules::list).post(schedules::create))
        .route("/schedules/:id", get(schedules::get).put(schedules::update).delete(schedules::delete));

    let admin_pages = Router::new()
        .route("/admin/users", get(pages::users_page))
        .route("/admin/schedules", get(pages::schedules_page));

    Router::new()
        .route("/health", get(health))
        .merge(auth_routes)
        .merge(user_routes)
        .merge(schedule_routes)
        .merge(admin_pages)
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(middleware::from_fn_with_state(state.clone(), auth::require_bearer_token_state))
        .with_state(state)
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO).include_headers(false))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO).include_headers(false))
                // 5xx and transport failures
                .on_failure(DefaultOnFailure::new().level(Level::ERROR)),
        )
}
