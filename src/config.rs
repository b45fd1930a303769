use std::env;

const LOCAL_JWT_SECRET: &str = "super-secure-test-secret-value-local";
const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
const DEFAULT_TOKEN_TTL_SECS: i64 = 3600;
pub const MAX_TOKEN_TTL_SECS: i64 = 30 * 24 * 3600;
const DEFAULT_REALM: &str = "liberator-friend";

/// AppConfig
///
/// Holds the site's configuration. Loaded once at startup and immutable afterwards;
/// handlers and the authentication layer pull it out of `AppState` through `FromRef`.
#[derive(Clone, Debug)]
pub struct AppConfig {
    // Runtime environment marker. Controls the local `x-username` bypass and log format.
    pub env: Env,
    // HS256 secret used to sign and validate bearer tokens issued by POST /login.
    pub jwt_secret: String,
    // Socket address the HTTP server binds to.
    pub bind_addr: String,
    // Lifetime of issued bearer tokens, in seconds. `load` caps it at thirty days.
    pub token_ttl_secs: i64,
    // Realm advertised in the `WWW-Authenticate` login challenge.
    pub realm: String,
}

/// Env
///
/// Runtime context. `Local` enables development conveniences, `Production` disables them.
#[derive(Clone, PartialEq, Debug)]
pub enum Env {
    Local,
    Production,
}

impl Default for AppConfig {
    /// default
    ///
    /// Safe, non-panicking values for test setup. Nothing is read from the environment.
    fn default() -> Self {
        Self {
            env: Env::Local,
            jwt_secret: LOCAL_JWT_SECRET.to_string(),
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            token_ttl_secs: DEFAULT_TOKEN_TTL_SECS,
            realm: DEFAULT_REALM.to_string(),
        }
    }
}

impl AppConfig {
    /// load
    ///
    /// Reads the configuration from environment variables, implementing the **fail-fast**
    /// principle for production secrets.
    ///
    /// # Panics
    /// Panics in `Env::Production` when `JWT_SECRET` is not set, so the server never
    /// starts signing tokens with the well-known local fallback.
    pub fn load() -> Self {
        let env_str = env::var("APP_ENV").unwrap_or_else(|_| "local".to_string());
        let env = match env_str.as_str() {
            "production" => Env::Production,
            _ => Env::Local,
        };

        let jwt_secret = match env {
            Env::Production => {
                env::var("JWT_SECRET").expect("FATAL: JWT_SECRET must be set in production.")
            }
            Env::Local => env::var("JWT_SECRET").unwrap_or_else(|_| LOCAL_JWT_SECRET.to_string()),
        };

        let token_ttl_secs = env::var("TOKEN_TTL_SECS")
            .ok()
            .and_then(|raw| raw.parse::<i64>().ok())
            .filter(|ttl| *ttl > 0)
            .map(|ttl| ttl.min(MAX_TOKEN_TTL_SECS))
            .unwrap_or(DEFAULT_TOKEN_TTL_SECS);

        Self {
            env,
            jwt_secret,
            bind_addr: env::var("BIND_ADDR").unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string()),
            token_ttl_secs,
            realm: env::var("AUTH_REALM").unwrap_or_else(|_| DEFAULT_REALM.to_string()),
        }
    }
}
