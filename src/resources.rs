//! The site's resource definitions.
//!
//! Every resource starts from [`base_resource`], which carries the error bodies for each
//! outcome and media type, and overrides its gate and its `handle_ok` body.

use std::sync::Arc;

use axum::{
    http::StatusCode,
    response::{Html, IntoResponse},
};
use serde_json::{Value, json};

use crate::{
    auth,
    config::AppConfig,
    resource::{
        Resource,
        dispatch::{Entry, MediaDispatch},
        gate::{authenticated_base, role_auth},
    },
};

pub const WELCOME: &str = "Welcome to the liberator-friend demo site!";

pub const NOT_FOUND_TEXT: &str = "Resource not found.";
pub const NOT_FOUND_JSON: &str = "Resource not found.";
pub const NOT_FOUND_HTML: &str = "Route not found!";

pub const NOT_ACCEPTABLE_TEXT: &str = "No acceptable resource available.";
pub const NOT_ACCEPTABLE_JSON: &str = "No acceptable resource available";

pub const UNAUTHORIZED_TEXT: &str = "Not authorized.";
pub const UNAUTHORIZED_JSON: &str = "Not authorized!";

pub const METHOD_NOT_ALLOWED_TEXT: &str = "Method not allowed.";

/// `{"success": false, "message": ...}`, keys in that order.
pub fn error_body(message: &str) -> Value {
    json!({ "success": false, "message": message })
}

fn plain_and_json(text: &str, json_message: &str) -> MediaDispatch {
    MediaDispatch::new()
        .with("text/plain", Entry::text(text))
        .with("application/json", Entry::value(error_body(json_message)))
        .with_default(Entry::text(text))
}

pub fn not_found_bodies() -> MediaDispatch {
    plain_and_json(NOT_FOUND_TEXT, NOT_FOUND_JSON).merge(MediaDispatch::new().with(
        "text/html",
        Entry::handler(|_| {
            let page = format!(
                "<!DOCTYPE html><html><head><title>Not Found</title></head><body><h1>{}</h1></body></html>",
                NOT_FOUND_HTML
            );
            (StatusCode::NOT_FOUND, Html(page)).into_response()
        }),
    ))
}

// text/html has no entry of its own and falls back to the plain-text default.
pub fn not_acceptable_bodies() -> MediaDispatch {
    plain_and_json(NOT_ACCEPTABLE_TEXT, NOT_ACCEPTABLE_JSON)
}

/// Browsers are sent to the authentication layer's login challenge.
pub fn unauthorized_bodies(realm: &str) -> MediaDispatch {
    let realm = realm.to_string();
    plain_and_json(UNAUTHORIZED_TEXT, UNAUTHORIZED_JSON).merge(
        MediaDispatch::new().with("text/html", Entry::handler(move |_| auth::challenge(&realm))),
    )
}

pub fn method_not_allowed_bodies() -> MediaDispatch {
    plain_and_json(METHOD_NOT_ALLOWED_TEXT, METHOD_NOT_ALLOWED_TEXT)
}

/// base_resource
///
/// Error bodies for every outcome; lets everyone through and has nothing to say on success.
pub fn base_resource(realm: &str) -> Resource {
    Resource {
        name: "base".to_string(),
        handle_not_found: not_found_bodies(),
        handle_not_acceptable: not_acceptable_bodies(),
        handle_unauthorized: unauthorized_bodies(realm),
        handle_method_not_allowed: method_not_allowed_bodies(),
        ..Resource::default()
    }
}

pub fn admin_resource(base: &Resource) -> Resource {
    Resource {
        name: "admin".to_string(),
        authorized: role_auth(["admin"]),
        handle_ok: Entry::text("Welcome, admin!"),
        ..base.clone()
    }
}

pub fn user_resource(base: &Resource) -> Resource {
    Resource {
        name: "user".to_string(),
        authorized: role_auth(["user"]),
        handle_ok: Entry::text("Welcome, user!"),
        ..base.clone()
    }
}

pub fn authenticated_resource(base: &Resource) -> Resource {
    Resource {
        name: "authenticated".to_string(),
        authorized: authenticated_base(),
        handle_ok: Entry::text("Welcome, authenticated user!"),
        ..base.clone()
    }
}

/// Resources
///
/// Every resource the router serves, built once at startup and shared through `AppState`.
#[derive(Debug, Clone)]
pub struct Resources {
    pub admin: Arc<Resource>,
    pub user: Arc<Resource>,
    pub authenticated: Arc<Resource>,
    /// Answers unmatched routes with its `handle_not_found` bodies.
    pub fallback: Arc<Resource>,
}

impl Resources {
    pub fn new(config: &AppConfig) -> Self {
        let base = base_resource(&config.realm);
        Self {
            admin: Arc::new(admin_resource(&base)),
            user: Arc::new(user_resource(&base)),
            authenticated: Arc::new(authenticated_resource(&base)),
            fallback: Arc::new(base),
        }
    }
}
