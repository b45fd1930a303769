use std::collections::BTreeSet;

use axum::{
    extract::{Request, State},
    http::{Extensions, HeaderMap, HeaderValue, StatusCode, header},
    middleware::Next,
    response::{Html, IntoResponse, Response},
};
use base64::{Engine as _, engine::general_purpose::STANDARD};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};

use crate::{
    config::{AppConfig, Env},
    error::{AppError, AppResult},
    models::{Claims, TokenResponse, User},
    password,
    resource::{RequestContext, gate::Unauthorized, negotiate::MediaType},
    store::UserStoreState,
};

/// Header honoured in `Env::Local` to act as any existing user without credentials.
pub const LOCAL_USER_HEADER: &str = "x-username";

/// Identity
///
/// The resolved identity of an authenticated request, attached to the request
/// extensions by [`authenticate`]. Anonymous requests carry none.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub username: String,
    pub roles: BTreeSet<String>,
}

impl From<User> for Identity {
    fn from(user: User) -> Self {
        Self {
            username: user.username,
            roles: user.roles,
        }
    }
}

/// The identity attached to a request, if any.
pub fn current_identity(extensions: &Extensions) -> Option<&Identity> {
    extensions.get::<Identity>()
}

pub fn has_role(identity: &Identity, role: &str) -> bool {
    identity.roles.contains(role)
}

/// authenticate
///
/// Middleware resolving the caller's identity and attaching it to the request.
///
/// Sources, first match wins:
/// 1. Local Bypass: in `Env::Local`, the `x-username` header naming an existing user.
/// 2. Basic: `Authorization: Basic`, verified against the store's Argon2 hash.
/// 3. Bearer: `Authorization: Bearer` token issued by `POST /login`.
///
/// Failures never reject here. The request continues anonymously and each resource's
/// authorization gate decides what that means.
pub async fn authenticate(
    State(store): State<UserStoreState>,
    State(config): State<AppConfig>,
    mut request: Request,
    next: Next,
) -> Response {
    if let Some(identity) = resolve_identity(request.headers(), &store, &config).await {
        tracing::debug!(user = %identity.username, "Request authenticated");
        request.extensions_mut().insert(identity);
    }
    next.run(request).await
}

/// resolve_identity
///
/// The identity the request's headers prove, if any.
pub async fn resolve_identity(
    headers: &HeaderMap,
    store: &UserStoreState,
    config: &AppConfig,
) -> Option<Identity> {
    // 1. Local Development Bypass
    if config.env == Env::Local {
        if let Some(username) = headers.get(LOCAL_USER_HEADER).and_then(|v| v.to_str().ok()) {
            if let Some(user) = store.lookup(username).await {
                return Some(user.into());
            }
        }
    }

    // 2. Authorization header
    let authorization = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())?;

    if let Some(encoded) = authorization.strip_prefix("Basic ") {
        let (username, password) = parse_basic(encoded)?;
        return verify_credentials(store, &username, &password)
            .await
            .ok()
            .map(Identity::from);
    }

    if let Some(token) = authorization.strip_prefix("Bearer ") {
        let claims = decode_token(token, &config.jwt_secret)?;
        // The user may have been removed since the token was issued.
        return store.lookup(&claims.sub).await.map(Identity::from);
    }

    None
}

/// Splits a Basic credential into `(username, password)`.
fn parse_basic(encoded: &str) -> Option<(String, String)> {
    let decoded = STANDARD.decode(encoded.trim()).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (username, password) = decoded.split_once(':')?;
    Some((username.to_string(), password.to_string()))
}

/// verify_credentials
///
/// Looks the user up and checks the password. Unknown users and wrong passwords are
/// indistinguishable to the caller.
pub async fn verify_credentials(
    store: &UserStoreState,
    username: &str,
    plain_password: &str,
) -> AppResult<User> {
    let user = store
        .lookup(username)
        .await
        .ok_or(AppError::InvalidCredentials)?;

    // Argon2 is deliberately slow; keep it off the async workers.
    let plain = plain_password.to_string();
    let hash = user.password_hash.clone();
    let matches = tokio::task::spawn_blocking(move || password::verify_password(&plain, &hash))
        .await
        .unwrap_or(false);

    if matches {
        Ok(user)
    } else {
        tracing::info!(user = %username, "Password verification failed");
        Err(AppError::InvalidCredentials)
    }
}

/// issue_token
///
/// Signs an HS256 bearer token for `username`, valid for the configured TTL. A TTL that
/// is not positive or pushes the expiry past what a timestamp can hold is refused.
pub fn issue_token(username: &str, config: &AppConfig) -> AppResult<TokenResponse> {
    let now = chrono::Utc::now().timestamp();
    let exp = now
        .checked_add(config.token_ttl_secs)
        .filter(|exp| *exp > now)
        .ok_or(AppError::TokenLifetime(config.token_ttl_secs))?;

    let claims = Claims {
        sub: username.to_string(),
        iat: usize::try_from(now).map_err(|_| AppError::TokenLifetime(config.token_ttl_secs))?,
        exp: usize::try_from(exp).map_err(|_| AppError::TokenLifetime(config.token_ttl_secs))?,
    };

    let key = EncodingKey::from_secret(config.jwt_secret.as_bytes());
    let token = encode(&Header::default(), &claims, &key)?;

    Ok(TokenResponse {
        token,
        token_type: "Bearer".to_string(),
        expires_in: config.token_ttl_secs,
    })
}

/// Validates signature and expiry. Any failure yields `None`.
pub fn decode_token(token: &str, secret: &str) -> Option<Claims> {
    let key = DecodingKey::from_secret(secret.as_bytes());
    let mut validation = Validation::default();
    validation.validate_exp = true;

    match decode::<Claims>(token, &key, &validation) {
        Ok(data) => Some(data.claims),
        Err(e) => {
            tracing::debug!("Rejected bearer token: {}", e);
            None
        }
    }
}

/// challenge
///
/// The login challenge: 401 with a Basic `WWW-Authenticate` header and a short page.
pub fn challenge(realm: &str) -> Response {
    let mut response = (
        StatusCode::UNAUTHORIZED,
        Html("<!DOCTYPE html><html><head><title>Sign in</title></head><body><h1>Sign in required</h1><p>Please sign in to view this page.</p></body></html>"),
    )
        .into_response();

    let realm = realm.replace('"', "");
    if let Ok(value) = HeaderValue::from_str(&format!("Basic realm=\"{}\"", realm)) {
        response.headers_mut().insert(header::WWW_AUTHENTICATE, value);
    }
    response
}

/// handle_unauthorized
///
/// The outer half of the authorization gate. Anonymous browsers are asked to sign in;
/// API clients and signed-in users without the required role get the refusing
/// resource's own `handle_unauthorized` body.
pub fn handle_unauthorized(err: Unauthorized, ctx: &RequestContext, realm: &str) -> Response {
    tracing::info!(path = %ctx.path, "{}", err);

    let wants_html = ctx.preferred_media_type() == Some(MediaType::html());
    if ctx.identity.is_none() && wants_html {
        return challenge(realm);
    }
    err.resource.unauthorized(ctx)
}
