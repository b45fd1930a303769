use std::sync::Arc;

use axum::{
    Router,
    extract::FromRef,
    http::HeaderName,
    middleware,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod models;
pub mod password;
pub mod resource;
pub mod resources;
pub mod store;

// Routing split by audience (Public, Authenticated, Admin).
pub mod routes;
use routes::{admin, authenticated, public};

// --- Public Re-exports ---

pub use config::AppConfig;
pub use resources::Resources;
pub use store::{InMemoryUserStore, UserStore, UserStoreState};

/// Shared, read-only resource definitions.
pub type ResourcesState = Arc<Resources>;

/// ApiDoc
///
/// OpenAPI description of the site, served at `/api-docs/openapi.json`.
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::welcome, handlers::login, handlers::admin,
        handlers::user, handlers::authenticated
    ),
    components(
        schemas(models::LoginRequest, models::TokenResponse, models::ErrorBody)
    ),
    tags(
        (name = "liberator-friend", description = "Role-based authentication and content negotiation demo")
    )
)]
struct ApiDoc;

/// AppState
///
/// The single container of everything handlers and middleware need. Immutable after
/// startup and cheap to clone.
#[derive(Clone)]
pub struct AppState {
    /// Credentials store consulted by the authentication layer.
    pub store: UserStoreState,
    /// Resource definitions, built once from the configuration.
    pub resources: ResourcesState,
    pub config: AppConfig,
}

impl AppState {
    /// Builds the resource definitions from `config` and bundles them with `store`.
    pub fn new(store: UserStoreState, config: AppConfig) -> Self {
        let resources = Arc::new(Resources::new(&config));
        Self {
            store,
            resources,
            config,
        }
    }
}

// --- Axum FromRef Extractor Implementations ---

impl FromRef<AppState> for UserStoreState {
    fn from_ref(app_state: &AppState) -> UserStoreState {
        app_state.store.clone()
    }
}

impl FromRef<AppState> for ResourcesState {
    fn from_ref(app_state: &AppState) -> ResourcesState {
        app_state.resources.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

/// create_router
///
/// Assembles the routes, the unmatched-route fallback, the identity and Accept layers,
/// and the observability stack.
pub fn create_router(state: AppState) -> Router {
    // 1. CORS Configuration
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    let x_request_id = HeaderName::from_static("x-request-id");

    // 2. Routes. Protected resources run their own authorization gate, so no
    //    route-level auth layer is needed; identity is resolved for every request.
    let base_router = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(public::public_routes())
        .merge(authenticated::authenticated_routes())
        .merge(admin::admin_routes())
        .fallback(handlers::not_found)
        // Runs second: attaches the caller's identity, if any.
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::authenticate,
        ))
        // Runs first: attaches the Accept representation negotiation relies on.
        .layer(middleware::from_fn(resource::negotiate::accept_layer))
        .with_state(state);

    // 3. Observability and Correlation Layers
    base_router
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(
                    x_request_id.clone(),
                    MakeRequestUuid,
                ))
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace_span_logger)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                .layer(PropagateRequestIdLayer::new(x_request_id))
                // A panicking handler is a bug; answer 500 instead of dropping the connection.
                .layer(CatchPanicLayer::new()),
        )
        .layer(cors)
}

/// trace_span_logger
///
/// Span for one request, carrying method, URI and the `x-request-id` so every log
/// line of the request can be correlated.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        uri = ?request.uri(),
        req_id = %request_id,
    )
}
