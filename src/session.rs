use std::collections::HashMap;
use std::fmt;
use std::sync::RwLock;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use ts_rs::TS;
use utoipa::ToSchema;

/// Well-known session keys written by the external login flow.
pub mod keys {
    pub const USER_ID: &str = "userId";
    pub const USER_ROLE: &str = "userRole";
    pub const USER_NAME: &str = "userName";
    pub const USER_EMAIL: &str = "userEmail";
    pub const ACCESS_TOKEN: &str = "accessToken";
    pub const REFRESH_TOKEN: &str = "refreshToken";
    pub const THEME: &str = "theme";

    /// Everything the logout action wipes.
    pub const SESSION_KEYS: [&str; 6] = [
        USER_ID,
        USER_ROLE,
        USER_NAME,
        USER_EMAIL,
        ACCESS_TOKEN,
        REFRESH_TOKEN,
    ];
}

/// SessionError
///
/// A backing medium could not be reached. Absence of a key is never an error.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("session store unavailable: {0}")]
    Unavailable(String),
}

/// SessionStore
///
/// The single injected capability through which every consumer touches session
/// state. Implementations must treat missing keys as `Ok(None)`.
pub trait SessionStore: Send + Sync {
    fn read(&self, key: &str) -> Result<Option<String>, SessionError>;

    fn write(&self, key: &str, value: &str) -> Result<(), SessionError>;

    /// Removes `keys` from every backing medium and wipes session-scoped storage.
    fn clear(&self, keys: &[&str]) -> Result<(), SessionError>;
}

/// Normalizes a raw stored value: missing, the literal `"undefined"`, and
/// whitespace-only values all count as absent.
pub fn normalize_value(raw: Option<&str>) -> Option<String> {
    let raw = raw?;
    if raw == "undefined" || raw.trim().is_empty() {
        return None;
    }
    Some(raw.to_string())
}

/// Role
///
/// Role-class of an authenticated identity. Unknown role strings do not parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
#[ts(export)]
pub enum Role {
    User,
    Admin,
}

impl Role {
    pub fn parse(raw: &str) -> Option<Role> {
        match raw.trim() {
            "USER" => Some(Role::User),
            "ADMIN" => Some(Role::Admin),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "USER",
            Role::Admin => "ADMIN",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// SessionMarker
///
/// The minimal authenticated-identity fact read from the session store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct SessionMarker {
    pub user_id: Option<String>,
    pub role: Option<Role>,
}

impl SessionMarker {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn new(user_id: impl Into<String>, role: Role) -> Self {
        Self {
            user_id: Some(user_id.into()),
            role: Some(role),
        }
    }

    /// A session counts as authenticated only when both the id and a known role are present.
    pub fn is_authenticated(&self) -> bool {
        self.user_id.is_some() && self.role.is_some()
    }
}

/// read_marker
///
/// Reads the session marker once. Store failures are swallowed and the caller
/// sees an anonymous marker, so protected content is never rendered on error.
pub fn read_marker(store: &dyn SessionStore) -> SessionMarker {
    let user_id = match store.read(keys::USER_ID) {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!(error = %e, "session read failed; treating as unauthenticated");
            return SessionMarker::anonymous();
        }
    };
    let role = match store.read(keys::USER_ROLE) {
        Ok(value) => value.as_deref().and_then(Role::parse),
        Err(e) => {
            tracing::warn!(error = %e, "session read failed; treating as unauthenticated");
            return SessionMarker::anonymous();
        }
    };
    SessionMarker { user_id, role }
}

/// CookieJar
///
/// Parsed form of an HTTP `Cookie` header. Removals are remembered so the HTTP
/// layer can answer with expiring `Set-Cookie` headers.
#[derive(Debug, Clone, Default)]
pub struct CookieJar {
    values: HashMap<String, String>,
    removed: Vec<String>,
}

impl CookieJar {
    /// Parses `a=1; b=2`. Malformed pairs are skipped; values are percent-decoded when possible.
    pub fn parse(header: &str) -> Self {
        let mut values = HashMap::new();
        for pair in header.split(';') {
            let Some((name, value)) = pair.split_once('=') else {
                continue;
            };
            let name = name.trim();
            if name.is_empty() {
                continue;
            }
            let value = value.trim();
            let decoded = urlencoding::decode(value)
                .map(|v| v.into_owned())
                .unwrap_or_else(|_| value.to_string());
            values.insert(name.to_string(), decoded);
        }
        Self {
            values,
            removed: Vec::new(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    pub fn set(&mut self, name: &str, value: &str) {
        self.removed.retain(|n| n != name);
        self.values.insert(name.to_string(), value.to_string());
    }

    pub fn remove(&mut self, name: &str) {
        self.values.remove(name);
        if !self.removed.iter().any(|n| n == name) {
            self.removed.push(name.to_string());
        }
    }

    pub fn removed(&self) -> &[String] {
        &self.removed
    }
}

#[derive(Debug, Default)]
struct Layers {
    persistent: HashMap<String, String>,
    session_scoped: HashMap<String, String>,
    cookies: CookieJar,
}

/// LayeredSessionStore
///
/// Browser-equivalent session store: a persistent key-value layer consulted
/// first, then the cookie layer. A separate session-scoped layer is wiped on
/// every `clear`.
#[derive(Debug, Default)]
pub struct LayeredSessionStore {
    layers: RwLock<Layers>,
}

impl LayeredSessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cookies(cookies: CookieJar) -> Self {
        Self {
            layers: RwLock::new(Layers {
                cookies,
                ..Layers::default()
            }),
        }
    }

    /// Seeds the persistent layer. Used by tests and by the local header bypass.
    pub fn insert_persistent(&self, key: &str, value: &str) -> Result<(), SessionError> {
        let mut layers = self.layers.write().map_err(poisoned)?;
        layers.persistent.insert(key.to_string(), value.to_string());
        Ok(())
    }

    pub fn set_cookie(&self, key: &str, value: &str) -> Result<(), SessionError> {
        let mut layers = self.layers.write().map_err(poisoned)?;
        layers.cookies.set(key, value);
        Ok(())
    }

    pub fn write_session_scoped(&self, key: &str, value: &str) -> Result<(), SessionError> {
        let mut layers = self.layers.write().map_err(poisoned)?;
        layers.session_scoped.insert(key.to_string(), value.to_string());
        Ok(())
    }

    pub fn read_session_scoped(&self, key: &str) -> Result<Option<String>, SessionError> {
        let layers = self.layers.read().map_err(poisoned)?;
        Ok(layers.session_scoped.get(key).cloned())
    }

    /// Cookie names removed since construction.
    pub fn removed_cookies(&self) -> Result<Vec<String>, SessionError> {
        let layers = self.layers.read().map_err(poisoned)?;
        Ok(layers.cookies.removed().to_vec())
    }
}

fn poisoned<T>(_: std::sync::PoisonError<T>) -> SessionError {
    SessionError::Unavailable("session lock poisoned".to_string())
}

impl SessionStore for LayeredSessionStore {
    fn read(&self, key: &str) -> Result<Option<String>, SessionError> {
        let layers = self.layers.read().map_err(poisoned)?;
        if let Some(value) = normalize_value(layers.persistent.get(key).map(String::as_str)) {
            return Ok(Some(value));
        }
        Ok(normalize_value(layers.cookies.get(key)))
    }

    fn write(&self, key: &str, value: &str) -> Result<(), SessionError> {
        let mut layers = self.layers.write().map_err(poisoned)?;
        layers.persistent.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn clear(&self, keys: &[&str]) -> Result<(), SessionError> {
        let mut layers = self.layers.write().map_err(poisoned)?;
        for key in keys {
            layers.persistent.remove(*key);
            layers.cookies.remove(key);
        }
        layers.session_scoped.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_rejects_placeholder_values() {
        assert_eq!(normalize_value(None), None);
        assert_eq!(normalize_value(Some("undefined")), None);
        assert_eq!(normalize_value(Some("   ")), None);
        assert_eq!(normalize_value(Some("42")), Some("42".to_string()));
    }

    #[test]
    fn persistent_layer_wins_over_cookie() {
        let store = LayeredSessionStore::with_cookies(CookieJar::parse("userId=cookie-id"));
        assert_eq!(store.read(keys::USER_ID).unwrap().as_deref(), Some("cookie-id"));

        store.insert_persistent(keys::USER_ID, "local-id").unwrap();
        assert_eq!(store.read(keys::USER_ID).unwrap().as_deref(), Some("local-id"));
    }

    #[test]
    fn placeholder_in_persistent_layer_falls_through_to_cookie() {
        let store = LayeredSessionStore::with_cookies(CookieJar::parse("userId=7"));
        store.insert_persistent(keys::USER_ID, "undefined").unwrap();
        assert_eq!(store.read(keys::USER_ID).unwrap().as_deref(), Some("7"));
    }

    #[test]
    fn cookie_parse_skips_malformed_pairs() {
        let jar = CookieJar::parse("a=1; broken; =x; b=hello%20world");
        assert_eq!(jar.get("a"), Some("1"));
        assert_eq!(jar.get("b"), Some("hello world"));
        assert_eq!(jar.get("broken"), None);
    }

    #[test]
    fn unknown_role_is_not_authenticated() {
        let store = LayeredSessionStore::new();
        store.insert_persistent(keys::USER_ID, "1").unwrap();
        store.insert_persistent(keys::USER_ROLE, "GUEST").unwrap();
        let marker = read_marker(&store);
        assert_eq!(marker.role, None);
        assert!(!marker.is_authenticated());
    }
}
