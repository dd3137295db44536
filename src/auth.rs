use axum::{
    extract::{FromRef, FromRequestParts},
    http::{StatusCode, header, request::Parts},
};
use std::sync::Arc;

use crate::{
    config::AppConfig,
    error::PortalError,
    session::{
        CookieJar, LayeredSessionStore, Role, SessionMarker, SessionStore, keys, read_marker,
    },
};

/// Builds the request-scoped session store from the `Cookie` header.
///
/// In `Env::Local` the `x-user-id` / `x-user-role` headers are copied into the
/// persistent layer, so they take precedence over cookies.
pub fn session_from_parts(parts: &Parts, config: &AppConfig) -> Arc<LayeredSessionStore> {
    let jar = parts
        .headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .collect::<Vec<_>>()
        .join("; ");
    let store = LayeredSessionStore::with_cookies(CookieJar::parse(&jar));

    if config.header_sessions_enabled() {
        let bypass = [("x-user-id", keys::USER_ID), ("x-user-role", keys::USER_ROLE)];
        for (name, key) in bypass {
            if let Some(value) = parts.headers.get(name).and_then(|v| v.to_str().ok()) {
                if let Err(e) = store.insert_persistent(key, value) {
                    tracing::warn!(error = %e, "could not apply local session header");
                }
            }
        }
    }

    Arc::new(store)
}

/// RequestSession
///
/// Extractor for handlers that need the session without requiring one
/// (the gate, logout). Never rejects.
pub struct RequestSession {
    pub store: Arc<LayeredSessionStore>,
    pub marker: SessionMarker,
}

impl<S> FromRequestParts<S> for RequestSession
where
    S: Send + Sync,
    AppConfig: FromRef<S>,
{
    type Rejection = StatusCode;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let config = AppConfig::from_ref(state);
        let store = session_from_parts(parts, &config);
        let marker = read_marker(store.as_ref());
        Ok(RequestSession { store, marker })
    }
}

/// SessionUser
///
/// Resolved identity of an authenticated request. Rejects with the 401 error
/// envelope whenever the marker is incomplete.
#[derive(Debug, Clone)]
pub struct SessionUser {
    pub id: String,
    pub role: Role,
    /// Bearer token forwarded to the backend, when the session carries one.
    pub token: Option<String>,
}

impl<S> FromRequestParts<S> for SessionUser
where
    S: Send + Sync,
    AppConfig: FromRef<S>,
{
    type Rejection = PortalError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let config = AppConfig::from_ref(state);
        let store = session_from_parts(parts, &config);
        let marker = read_marker(store.as_ref());

        let (Some(id), Some(role)) = (marker.user_id, marker.role) else {
            return Err(PortalError::Unauthorized);
        };

        // An Authorization header wins over a stored token.
        let token = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .map(str::to_string)
            .or_else(|| store.read(keys::ACCESS_TOKEN).ok().flatten());

        Ok(SessionUser { id, role, token })
    }
}
