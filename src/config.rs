use std::env;
use std::time::Duration;

use crate::access::gate::DEFAULT_REDIRECT_DELAY;
use crate::registry::{DEFAULT_EDITOR_IDLE_TTL, DEFAULT_MAX_EDITORS_PER_OWNER};

/// AppConfig
///
/// Immutable configuration loaded once at startup and shared through `AppState`.
#[derive(Clone, Debug)]
pub struct AppConfig {
    // Base URL of the remote REST backend that owns documents and profiles.
    pub backend_url: String,
    // Address the HTTP server binds to.
    pub bind_addr: String,
    // Debounce before a gate redirect is carried out.
    pub redirect_delay: Duration,
    // Request timeout for the document client.
    pub backend_timeout: Duration,
    // Open editors one user may hold before the least recently modified is evicted.
    pub max_editors_per_owner: usize,
    // Editors left unmodified this long are dropped on the next open.
    pub editor_idle_ttl: Duration,
    // Runtime environment marker. Controls the local header session bypass.
    pub env: Env,
}

/// Env
///
/// `Local` enables developer conveniences (header-based sessions, pretty logs);
/// `Production` demands every external setting explicitly.
#[derive(Clone, PartialEq, Debug)]
pub enum Env {
    Local,
    Production,
}

impl Default for AppConfig {
    /// Non-panicking values for test scaffolding.
    fn default() -> Self {
        Self {
            backend_url: "http://localhost:8080".to_string(),
            bind_addr: "127.0.0.1:0".to_string(),
            redirect_delay: DEFAULT_REDIRECT_DELAY,
            backend_timeout: Duration::from_secs(10),
            max_editors_per_owner: DEFAULT_MAX_EDITORS_PER_OWNER,
            editor_idle_ttl: DEFAULT_EDITOR_IDLE_TTL,
            env: Env::Local,
        }
    }
}

impl AppConfig {
    /// Whether `x-user-id` / `x-user-role` headers may stand in for a session.
    /// True whenever `APP_ENV` is anything but `production`, including unset.
    pub fn header_sessions_enabled(&self) -> bool {
        self.env == Env::Local
    }

    /// load
    ///
    /// Reads the configuration from the environment.
    ///
    /// # Panics
    /// Panics in `Production` when `BACKEND_URL` is missing, and in any
    /// environment when a numeric setting does not parse. The server must not
    /// start half-configured.
    pub fn load() -> Self {
        let env = match env::var("APP_ENV").as_deref() {
            Ok("production") => Env::Production,
            _ => Env::Local,
        };

        let backend_url = match env {
            Env::Production => {
                env::var("BACKEND_URL").expect("FATAL: BACKEND_URL must be set in production.")
            }
            Env::Local => {
                env::var("BACKEND_URL").unwrap_or_else(|_| "http://localhost:8080".to_string())
            }
        };

        let redirect_delay_ms =
            numeric_var("REDIRECT_DELAY_MS", DEFAULT_REDIRECT_DELAY.as_millis() as u64);
        let backend_timeout_secs = numeric_var("BACKEND_TIMEOUT_SECS", 10);
        let max_editors_per_owner =
            numeric_var("MAX_EDITORS_PER_OWNER", DEFAULT_MAX_EDITORS_PER_OWNER as u64) as usize;
        let editor_idle_ttl_secs =
            numeric_var("EDITOR_IDLE_TTL_SECS", DEFAULT_EDITOR_IDLE_TTL.as_secs());

        Self {
            backend_url,
            bind_addr: env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string()),
            redirect_delay: Duration::from_millis(redirect_delay_ms),
            backend_timeout: Duration::from_secs(backend_timeout_secs),
            max_editors_per_owner,
            editor_idle_ttl: Duration::from_secs(editor_idle_ttl_secs),
            env,
        }
    }
}

fn numeric_var(key: &str, default: u64) -> u64 {
    match env::var(key) {
        Ok(raw) => raw
            .parse()
            .unwrap_or_else(|_| panic!("FATAL: {key} must be a non-negative integer, got {raw:?}")),
        Err(_) => default,
    }
}
