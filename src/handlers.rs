use std::sync::Arc;

use axum::{Json, extract::State, response::Response};

use crate::{
    ResourcesState,
    auth,
    config::AppConfig,
    error::AppResult,
    models::{ErrorBody, LoginRequest, TokenResponse},
    resource::{RequestContext, Resource},
    resources::WELCOME,
    store::UserStoreState,
};

/// serve
///
/// Executes a resource and, when its gate refuses, hands the refusal to the
/// authentication layer to turn into a challenge or an unauthorized body.
fn serve(resource: &Arc<Resource>, ctx: RequestContext, config: &AppConfig) -> Response {
    let fallback_ctx = ctx.clone();
    match resource.execute(ctx) {
        Ok(response) => response,
        Err(unauthorized) => auth::handle_unauthorized(unauthorized, &fallback_ctx, &config.realm),
    }
}

/// welcome
///
/// [Public Route] The landing page, a fixed greeting.
#[utoipa::path(
    get,
    path = "/",
    responses((status = 200, description = "Welcome message", body = String, content_type = "text/plain"))
)]
pub async fn welcome() -> &'static str {
    WELCOME
}

/// login
///
/// [Public Route] Exchanges a username and password for a bearer token.
#[utoipa::path(
    post,
    path = "/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Token issued", body = TokenResponse),
        (status = 401, description = "Invalid credentials", body = ErrorBody)
    )
)]
pub async fn login(
    State(store): State<UserStoreState>,
    State(config): State<AppConfig>,
    Json(payload): Json<LoginRequest>,
) -> AppResult<Json<TokenResponse>> {
    let user = auth::verify_credentials(&store, &payload.username, &payload.password).await?;
    let token = auth::issue_token(&user.username, &config)?;
    tracing::info!(user = %user.username, "Issued bearer token");
    Ok(Json(token))
}

/// admin
///
/// [Admin Route] Requires the `admin` role.
#[utoipa::path(
    get,
    path = "/admin",
    responses(
        (status = 200, description = "Admin greeting", body = String, content_type = "text/plain"),
        (status = 401, description = "Not authorized", body = ErrorBody),
        (status = 406, description = "No acceptable representation", body = ErrorBody)
    )
)]
pub async fn admin(
    State(resources): State<ResourcesState>,
    State(config): State<AppConfig>,
    ctx: RequestContext,
) -> Response {
    serve(&resources.admin, ctx, &config)
}

/// user
///
/// [Authenticated Route] Requires the `user` role.
#[utoipa::path(
    get,
    path = "/user",
    responses(
        (status = 200, description = "User greeting", body = String, content_type = "text/plain"),
        (status = 401, description = "Not authorized", body = ErrorBody),
        (status = 406, description = "No acceptable representation", body = ErrorBody)
    )
)]
pub async fn user(
    State(resources): State<ResourcesState>,
    State(config): State<AppConfig>,
    ctx: RequestContext,
) -> Response {
    serve(&resources.user, ctx, &config)
}

/// authenticated
///
/// [Authenticated Route] Any signed-in identity, whatever its roles.
#[utoipa::path(
    get,
    path = "/authenticated",
    responses(
        (status = 200, description = "Greeting", body = String, content_type = "text/plain"),
        (status = 401, description = "Not signed in", body = ErrorBody),
        (status = 406, description = "No acceptable representation", body = ErrorBody)
    )
)]
pub async fn authenticated(
    State(resources): State<ResourcesState>,
    State(config): State<AppConfig>,
    ctx: RequestContext,
) -> Response {
    serve(&resources.authenticated, ctx, &config)
}

/// Router fallback for every path without a route.
pub async fn not_found(State(resources): State<ResourcesState>, ctx: RequestContext) -> Response {
    resources.fallback.not_found(&ctx)
}
