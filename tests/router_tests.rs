use std::sync::{Arc, OnceLock};

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Method, Request, StatusCode, header},
    response::Response,
};
use base64::{Engine as _, engine::general_purpose::STANDARD};
use liberator_friend::{
    AppState, create_router,
    config::{AppConfig, Env},
    models::TokenResponse,
    store::{InMemoryUserStore, UserStoreState},
};
use serde_json::{Value, json};
use tower::ServiceExt;

// --- Harness ---

/// Argon2 hashing is slow; seed the demo store once for the whole file.
fn store() -> UserStoreState {
    static STORE: OnceLock<UserStoreState> = OnceLock::new();
    STORE
        .get_or_init(|| Arc::new(InMemoryUserStore::demo().unwrap()))
        .clone()
}

fn app_with_env(env: Env) -> Router {
    let mut config = AppConfig::default();
    config.env = env;
    create_router(AppState::new(store(), config))
}

fn app() -> Router {
    app_with_env(Env::Production)
}

fn basic(username: &str, password: &str) -> String {
    format!("Basic {}", STANDARD.encode(format!("{}:{}", username, password)))
}

fn request(method: Method, uri: &str, accept: Option<&str>, auth: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(accept) = accept {
        builder = builder.header(header::ACCEPT, accept);
    }
    if let Some(auth) = auth {
        builder = builder.header(header::AUTHORIZATION, auth);
    }
    builder.body(Body::empty()).unwrap()
}

async fn send(request: Request<Body>) -> Response {
    app().oneshot(request).await.unwrap()
}

async fn body_string(response: Response) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

// --- Scenarios ---

#[tokio::test]
async fn test_root_welcome() {
    let response = send(request(Method::GET, "/", None, None)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_string(response).await,
        "Welcome to the liberator-friend demo site!"
    );
}

#[tokio::test]
async fn test_admin_without_admin_role_json() {
    let response = send(request(
        Method::GET,
        "/admin",
        Some("application/json"),
        Some(&basic("jane", "user_password")),
    ))
    .await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        body_string(response).await,
        r#"{"success":false,"message":"Not authorized!"}"#
    );
}

#[tokio::test]
async fn test_admin_anonymous_json_gets_body_not_challenge() {
    let response = send(request(Method::GET, "/admin", Some("application/json"), None)).await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(response.headers().get(header::WWW_AUTHENTICATE).is_none());
    let body: Value = serde_json::from_str(&body_string(response).await).unwrap();
    assert_eq!(body, json!({"success": false, "message": "Not authorized!"}));
}

#[tokio::test]
async fn test_admin_with_admin_role_plain_text() {
    let response = send(request(
        Method::GET,
        "/admin",
        Some("text/plain"),
        Some(&basic("root", "admin_password")),
    ))
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await, "Welcome, admin!");
}

#[tokio::test]
async fn test_unknown_route_json() {
    let response = send(request(
        Method::GET,
        "/nonexistent",
        Some("application/json"),
        None,
    ))
    .await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(
        body_string(response).await,
        r#"{"success":false,"message":"Resource not found."}"#
    );
}

#[tokio::test]
async fn test_unknown_route_plain_and_html() {
    let plain = send(request(Method::GET, "/nope", Some("text/plain"), None)).await;
    assert_eq!(plain.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_string(plain).await, "Resource not found.");

    let html = send(request(Method::GET, "/nope", Some("text/html"), None)).await;
    assert_eq!(html.status(), StatusCode::NOT_FOUND);
    assert!(body_string(html).await.contains("Route not found!"));
}

#[tokio::test]
async fn test_user_unsupported_type_falls_back_to_plain_default() {
    let response = send(request(
        Method::GET,
        "/user",
        Some("text/xml"),
        Some(&basic("jane", "user_password")),
    ))
    .await;

    assert_eq!(response.status(), StatusCode::NOT_ACCEPTABLE);
    assert_eq!(body_string(response).await, "No acceptable resource available.");
}

#[tokio::test]
async fn test_user_refused_plain_text_is_not_acceptable() {
    let response = send(request(
        Method::GET,
        "/user",
        Some("text/plain;q=0, */*"),
        Some(&basic("jane", "user_password")),
    ))
    .await;

    assert_eq!(response.status(), StatusCode::NOT_ACCEPTABLE);
    assert_eq!(response.headers()[header::VARY], "accept");
}

#[tokio::test]
async fn test_user_not_acceptable_json() {
    let response = send(request(
        Method::GET,
        "/user",
        Some("application/json"),
        Some(&basic("jane", "user_password")),
    ))
    .await;

    assert_eq!(response.status(), StatusCode::NOT_ACCEPTABLE);
    assert_eq!(
        body_string(response).await,
        r#"{"success":false,"message":"No acceptable resource available"}"#
    );
}

#[tokio::test]
async fn test_unauthorized_plain_text() {
    let response = send(request(Method::GET, "/user", Some("text/plain"), None)).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_string(response).await, "Not authorized.");
}

#[tokio::test]
async fn test_anonymous_browser_gets_login_challenge() {
    let response = send(request(Method::GET, "/authenticated", Some("text/html"), None)).await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        response.headers()[header::WWW_AUTHENTICATE],
        "Basic realm=\"liberator-friend\""
    );
}

#[tokio::test]
async fn test_authenticated_accepts_any_identity() {
    let response = send(request(
        Method::GET,
        "/authenticated",
        None,
        Some(&basic("jane", "user_password")),
    ))
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await, "Welcome, authenticated user!");
}

#[tokio::test]
async fn test_resource_rejects_unsupported_method() {
    let response = send(request(
        Method::DELETE,
        "/user",
        Some("application/json"),
        Some(&basic("jane", "user_password")),
    ))
    .await;

    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(response.headers()[header::ALLOW], "GET, HEAD");
}

#[tokio::test]
async fn test_login_then_bearer_access() {
    let login = Request::builder()
        .method(Method::POST)
        .uri("/login")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(
            json!({"username": "root", "password": "admin_password"}).to_string(),
        ))
        .unwrap();

    let response = send(login).await;
    assert_eq!(response.status(), StatusCode::OK);
    let token: TokenResponse = serde_json::from_str(&body_string(response).await).unwrap();

    let response = send(request(
        Method::GET,
        "/admin",
        Some("text/plain"),
        Some(&format!("Bearer {}", token.token)),
    ))
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await, "Welcome, admin!");
}

#[tokio::test]
async fn test_login_with_bad_password() {
    let login = Request::builder()
        .method(Method::POST)
        .uri("/login")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(
            json!({"username": "root", "password": "guess"}).to_string(),
        ))
        .unwrap();

    let response = send(login).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        body_string(response).await,
        r#"{"success":false,"message":"Invalid username or password."}"#
    );
}

#[tokio::test]
async fn test_local_bypass_header_through_router() {
    let request = Request::builder()
        .uri("/user")
        .header("x-username", "jane")
        .body(Body::empty())
        .unwrap();

    let local = app_with_env(Env::Local).oneshot(request).await.unwrap();
    assert_eq!(local.status(), StatusCode::OK);
    assert_eq!(body_string(local).await, "Welcome, user!");
}

#[tokio::test]
async fn test_request_id_is_propagated() {
    let response = send(request(Method::GET, "/", None, None)).await;
    assert!(response.headers().get("x-request-id").is_some());
}
