use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use migration::MigratorTrait;
use serde_json::{json, Value};
use tokio::sync::OnceCell;
use tower::Service;
use uuid::Uuid;

use server::routes::auth::ServerState;
use service::auth::AuthConfig;

static MIGRATED: OnceCell<bool> = OnceCell::const_new();

/// App over a migrated database; `None` skips the test.
async fn build_app(admin_email: Option<&str>) -> Option<Router> {
    if std::env::var("SKIP_DB_TESTS").is_ok() { return None; }
    let ready = MIGRATED
        .get_or_init(|| async {
            match models::db::connect().await {
                Ok(db) => migration::Migrator::up(&db, None).await.is_ok(),
                Err(e) => { eprintln!("skip: cannot connect to db: {}", e); false }
            }
        })
        .await;
    if !*ready { return None; }
    let db = models::db::connect().await.ok()?;
    let mut auth = AuthConfig::new("test-secret");
    auth.admin_email = admin_email.map(str::to_string);
    Some(server::startup::build_app(ServerState { db, auth }))
}

fn json_req(method: &str, uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
    let mut req = Request::builder().method(method).uri(uri).header("content-type", "application/json");
    if let Some(t) = token { req = req.header(header::AUTHORIZATION, format!("Bearer {t}")); }
    req.body(Body::from(serde_json::to_vec(&body).unwrap())).unwrap()
}

fn empty_req(method: &str, uri: &str, token: &str) -> Request<Body> {
    Request::builder().method(method).uri(uri).header(header::AUTHORIZATION, format!("Bearer {token}")).body(Body::empty()).unwrap()
}

async fn body_json(resp: axum::response::Response) -> Value {
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap_or(Value::Null)
}

fn unique(tag: &str) -> (String, String) {
    let suffix = Uuid::new_v4().simple().to_string();
    (format!("{tag}_{suffix}@example.com"), format!("{tag}_{}", &suffix[..12]))
}

async fn register_and_login(app: &mut Router, tag: &str, password: &str) -> anyhow::Result<(Value, String)> {
    let (email, username) = unique(tag);
    let resp = app.call(json_req("POST", "/auth/register", None, json!({"email": email, "username": username, "display_name": "Tester", "password": password}))).await?;
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = app.call(json_req("POST", "/auth/login", None, json!({"email": email, "password": password}))).await?;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    let token = body["token"].as_str().unwrap_or_default().to_string();
    Ok((body, token))
}

#[tokio::test]
async fn test_register_login_and_me() -> anyhow::Result<()> {
    let Some(mut app) = build_app(None).await else { return Ok(()) };
    let (email, username) = unique("flow");
    let password = "S3curePass!";

    let resp = app.call(json_req("POST", "/auth/register", None, json!({"email": email, "username": username, "display_name": "Tester", "password": password}))).await?;
    assert_eq!(resp.status(), StatusCode::OK);
    let user_id = body_json(resp).await["user_id"].as_str().unwrap_or_default().to_string();

    let resp = app.call(json_req("POST", "/auth/login", None, json!({"email": email, "password": password}))).await?;
    assert_eq!(resp.status(), StatusCode::OK);
    let cookie = resp.headers().get(header::SET_COOKIE).and_then(|v| v.to_str().ok()).unwrap_or_default().to_string();
    assert!(cookie.starts_with("auth_token="));
    assert!(cookie.contains("HttpOnly"));
    let body = body_json(resp).await;
    assert_eq!(body["user_id"], user_id);
    assert_eq!(body["role"], "user");

    // The cookie alone authenticates.
    let token_pair = cookie.split(';').next().unwrap_or_default().to_string();
    let req = Request::builder().uri("/auth/me").header(header::COOKIE, token_pair).body(Body::empty())?;
    let resp = app.call(req).await?;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await["username"], username);

    let resp = app.call(json_req("POST", "/auth/logout", body["token"].as_str(), json!({}))).await?;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    Ok(())
}

#[tokio::test]
async fn test_register_rejections() -> anyhow::Result<()> {
    let Some(mut app) = build_app(None).await else { return Ok(()) };
    let (email, username) = unique("rej");

    let resp = app.call(json_req("POST", "/auth/register", None, json!({"email": email, "username": username, "display_name": "A", "password": "short"}))).await?;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(resp).await["status"], 400);

    let ok = json!({"email": email, "username": username, "display_name": "A", "password": "LongEnough1"});
    assert_eq!(app.call(json_req("POST", "/auth/register", None, ok.clone())).await?.status(), StatusCode::OK);
    assert_eq!(app.call(json_req("POST", "/auth/register", None, ok)).await?.status(), StatusCode::CONFLICT);

    let resp = app.call(json_req("POST", "/auth/login", None, json!({"email": email, "password": "wrong-password"}))).await?;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn test_change_password() -> anyhow::Result<()> {
    let Some(mut app) = build_app(None).await else { return Ok(()) };
    let (body, token) = register_and_login(&mut app, "pw", "FirstPass1").await?;
    let email = body["email"].as_str().unwrap_or_default().to_string();

    let resp = app.call(json_req("POST", "/auth/password", Some(&token), json!({"current_password": "nope-nope", "new_password": "SecondPass2"}))).await?;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let resp = app.call(json_req("POST", "/auth/password", Some(&token), json!({"current_password": "FirstPass1", "new_password": "SecondPass2"}))).await?;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let resp = app.call(json_req("POST", "/auth/login", None, json!({"email": email, "password": "SecondPass2"}))).await?;
    assert_eq!(resp.status(), StatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn test_admin_bootstrap_and_user_management() -> anyhow::Result<()> {
    let (admin_email, admin_username) = unique("boss");
    let Some(mut app) = build_app(Some(&admin_email)).await else { return Ok(()) };

    let resp = app.call(json_req("POST", "/auth/register", None, json!({"email": admin_email, "username": admin_username, "display_name": "Boss", "password": "AdminPass1"}))).await?;
    assert_eq!(resp.status(), StatusCode::OK);
    let resp = app.call(json_req("POST", "/auth/login", None, json!({"email": admin_email, "password": "AdminPass1"}))).await?;
    let body = body_json(resp).await;
    assert_eq!(body["role"], "admin");
    let admin_token = body["token"].as_str().unwrap_or_default().to_string();

    // Admin creates a user, then pages through users.
    let (email, username) = unique("managed");
    let resp = app.call(json_req("POST", "/users", Some(&admin_token), json!({"email": email, "username": username, "display_name": "Managed", "password": "Managed123"}))).await?;
    assert_eq!(resp.status(), StatusCode::OK);
    let managed_id = body_json(resp).await["id"].as_str().unwrap_or_default().to_string();

    let resp = app.call(empty_req("GET", "/users?page=0&rowsPerPage=1&order=desc&orderBy=created_at", &admin_token)).await?;
    assert_eq!(resp.status(), StatusCode::OK);
    let page = body_json(resp).await;
    assert_eq!(page["rows"].as_array().map(Vec::len), Some(1));
    assert!(page["totalItems"].as_u64().unwrap_or_default() >= 2);
    assert_eq!(page["rowsPerPage"], 1);

    // The managed user cannot promote themselves.
    let resp = app.call(json_req("POST", "/auth/login", None, json!({"email": email, "password": "Managed123"}))).await?;
    let user_token = body_json(resp).await["token"].as_str().unwrap_or_default().to_string();
    let resp = app.call(json_req("PUT", &format!("/users/{managed_id}"), Some(&user_token), json!({"role": "admin"}))).await?;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    let resp = app.call(json_req("PUT", &format!("/users/{managed_id}"), Some(&user_token), json!({"display_name": "Renamed"}))).await?;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await["display_name"], "Renamed");

    let resp = app.call(empty_req("GET", "/admin/users?orderBy=email", &admin_token)).await?;
    assert_eq!(resp.status(), StatusCode::OK);
    let html = String::from_utf8(to_bytes(resp.into_body(), usize::MAX).await?.to_vec())?;
    assert!(html.contains("class=\"data-table\""));
    assert!(html.contains("sort-label active"));

    let resp = app.call(empty_req("DELETE", &format!("/users/{managed_id}"), &admin_token)).await?;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    let resp = app.call(empty_req("DELETE", &format!("/users/{managed_id}"), &admin_token)).await?;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn test_schedule_lifecycle() -> anyhow::Result<()> {
    let Some(mut app) = build_app(None).await else { return Ok(()) };
    let (_, owner) = register_and_login(&mut app, "owner", "OwnerPass1").await?;
    let (_, other) = register_and_login(&mut app, "other", "OtherPass1").await?;

    let resp = app.call(json_req("POST", "/schedules", Some(&owner), json!({
        "title": "Planning",
        "description": "Quarterly planning",
        "starts_at": "2030-01-01T09:00:00+00:00",
        "ends_at": "2030-01-01T10:00:00+00:00"
    }))).await?;
    assert_eq!(resp.status(), StatusCode::OK);
    let created = body_json(resp).await;
    assert_eq!(created["status"], "planned");
    let id = created["id"].as_str().unwrap_or_default().to_string();

    let resp = app.call(json_req("POST", "/schedules", Some(&owner), json!({
        "title": "Backwards",
        "starts_at": "2030-01-01T10:00:00+00:00",
        "ends_at": "2030-01-01T09:00:00+00:00"
    }))).await?;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    assert_eq!(app.call(empty_req("GET", &format!("/schedules/{id}"), &other)).await?.status(), StatusCode::FORBIDDEN);

    let resp = app.call(empty_req("GET", "/schedules?orderBy=starts_at", &other)).await?;
    assert_eq!(body_json(resp).await["totalItems"], 0);

    let resp = app.call(json_req("PUT", &format!("/schedules/{id}"), Some(&owner), json!({"status": "in_progress", "description": ""}))).await?;
    assert_eq!(resp.status(), StatusCode::OK);
    let updated = body_json(resp).await;
    assert_eq!(updated["status"], "in_progress");
    assert!(updated["description"].is_null());

    let resp = app.call(empty_req("GET", "/admin/schedules", &owner)).await?;
    assert_eq!(resp.status(), StatusCode::OK);

    assert_eq!(app.call(empty_req("DELETE", &format!("/schedules/{id}"), &other)).await?.status(), StatusCode::FORBIDDEN);
    assert_eq!(app.call(empty_req("DELETE", &format!("/schedules/{id}"), &owner)).await?.status(), StatusCode::NO_CONTENT);
    assert_eq!(app.call(empty_req("GET", &format!("/schedules/{id}"), &owner)).await?.status(), StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn test_demoted_or_deleted_admin_loses_access() -> anyhow::Result<()> {
    let (admin_email, admin_username) = unique("former");
    let Some(mut app) = build_app(Some(&admin_email)).await else { return Ok(()) };

    let resp = app.call(json_req("POST", "/auth/register", None, json!({"email": admin_email, "username": admin_username, "display_name": "Former", "password": "AdminPass1"}))).await?;
    assert_eq!(resp.status(), StatusCode::OK);
    let former_id = body_json(resp).await["user_id"].as_str().unwrap_or_default().to_string();
    let resp = app.call(json_req("POST", "/auth/login", None, json!({"email": admin_email, "password": "AdminPass1"}))).await?;
    let former_token = body_json(resp).await["token"].as_str().unwrap_or_default().to_string();

    // A second admin who outlives the first.
    let (email, username) = unique("successor");
    let resp = app.call(json_req("POST", "/users", Some(&former_token), json!({"email": email, "username": username, "display_name": "Successor", "password": "Successor1", "role": "admin"}))).await?;
    assert_eq!(resp.status(), StatusCode::OK);
    let resp = app.call(json_req("POST", "/auth/login", None, json!({"email": email, "password": "Successor1"}))).await?;
    let successor_token = body_json(resp).await["token"].as_str().unwrap_or_default().to_string();

    let resp = app.call(json_req("PUT", &format!("/users/{former_id}"), Some(&former_token), json!({"role": "user"}))).await?;
    assert_eq!(resp.status(), StatusCode::OK);
    // The token still says admin; the stored role wins.
    assert_eq!(app.call(empty_req("GET", "/users", &former_token)).await?.status(), StatusCode::FORBIDDEN);
    assert_eq!(app.call(empty_req("GET", "/admin/users", &former_token)).await?.status(), StatusCode::FORBIDDEN);

    let resp = app.call(empty_req("DELETE", &format!("/users/{former_id}"), &successor_token)).await?;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    assert_eq!(app.call(empty_req("GET", "/auth/me", &former_token)).await?.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(app.call(empty_req("GET", "/admin/users", &former_token)).await?.status(), StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn test_out_of_range_page_is_rejected() -> anyhow::Result<()> {
    let Some(mut app) = build_app(None).await else { return Ok(()) };
    let (_, token) = register_and_login(&mut app, "paging", "PagingPass1").await?;

    let resp = app.call(empty_req("GET", "/schedules?page=1000000000000000000&rowsPerPage=100", &token)).await?;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(resp).await["title"], "Validation Error");

    // Largest page that still fits: empty, not an error.
    let resp = app.call(empty_req("GET", &format!("/schedules?page={}&rowsPerPage=1", i64::MAX), &token)).await?;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await["rows"].as_array().map(Vec::len), Some(0));
    Ok(())
}
