use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

// --- Credential Records ---

/// User
///
/// A credential record from the user store. Created once at startup and never mutated.
/// The store is keyed by `username`, and the key always equals this field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub username: String,
    // Argon2 PHC string; never the plain password.
    pub password_hash: String,
    // RBAC roles, e.g. "admin" or "user".
    pub roles: BTreeSet<String>,
}

impl User {
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.contains(role)
    }
}

/// Claims
///
/// Payload of the bearer tokens issued by `POST /login`.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (sub): the username. Roles are re-read from the store on every request.
    pub sub: String,
    /// Expiration Time (exp), seconds since the epoch.
    pub exp: usize,
    /// Issued At (iat), seconds since the epoch.
    pub iat: usize,
}

// --- Request & Response Bodies ---

/// Credentials posted to `POST /login`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Bearer token handed back by `POST /login`.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TokenResponse {
    pub token: String,
    pub token_type: String,
    /// Seconds until the token expires.
    pub expires_in: i64,
}

/// ErrorBody
///
/// The JSON error shape shared by every failure the site reports to API clients:
/// `{"success": false, "message": "..."}`. Field order is part of the wire format.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorBody {
    pub success: bool,
    pub message: String,
}

impl ErrorBody {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}
