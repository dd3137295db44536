//! Route classification and the pure access decision.
//!
//! `decide` is the whole policy; `gate::AccessGate` only adds lifecycle
//! (auth check on mount, debounced navigation) around it.

pub mod gate;

use serde::{Deserialize, Serialize};
use ts_rs::TS;
use utoipa::ToSchema;

use crate::session::{Role, SessionMarker};

pub const LOGIN_PATH: &str = "/login";
pub const USER_HOME: &str = "/dashboard";
pub const ADMIN_HOME: &str = "/admin";

/// RouteClass
///
/// Access class of a path. `Unclassified` paths are open to nobody but still
/// produce a landing redirect for authenticated sessions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum RouteClass {
    Public,
    UserOnly,
    AdminOnly,
    Unclassified,
}

/// RouteTable
///
/// Static partition of path prefixes. Not configurable at runtime.
#[derive(Debug, Clone, Copy)]
pub struct RouteTable {
    pub public: &'static [&'static str],
    pub user_only: &'static [&'static str],
    pub admin_only: &'static [&'static str],
    /// Login/signup style entry points. Authenticated sessions bounce off these.
    pub entry_points: &'static [&'static str],
}

impl RouteTable {
    pub const fn standard() -> Self {
        Self {
            public: &["/", "/login", "/signup", "/find-password", "/community"],
            user_only: &[
                "/dashboard",
                "/resume",
                "/introduce",
                "/calendar",
                "/mypage",
                "/community/profile",
                "/community/write",
            ],
            admin_only: &["/admin"],
            entry_points: &["/login", "/signup"],
        }
    }

    /// Classifies by the longest matching prefix, so `/community/profile`
    /// (user only) wins over `/community` (public).
    pub fn classify(&self, path: &str) -> RouteClass {
        let path = strip_query(path);
        let sets = [
            (RouteClass::Public, self.public),
            (RouteClass::UserOnly, self.user_only),
            (RouteClass::AdminOnly, self.admin_only),
        ];

        let mut best: Option<(usize, RouteClass)> = None;
        for (class, prefixes) in sets {
            for prefix in prefixes {
                if matches_prefix(path, prefix) {
                    let better = best.is_none_or(|(len, _)| prefix.len() > len);
                    if better {
                        best = Some((prefix.len(), class));
                    }
                }
            }
        }
        best.map(|(_, class)| class).unwrap_or(RouteClass::Unclassified)
    }

    pub fn is_entry_point(&self, path: &str) -> bool {
        let path = strip_query(path);
        self.entry_points.iter().any(|p| matches_prefix(path, p))
    }
}

impl Default for RouteTable {
    fn default() -> Self {
        Self::standard()
    }
}

/// A path matches an entry when it equals it or continues with `/`.
fn matches_prefix(path: &str, prefix: &str) -> bool {
    if path == prefix {
        return true;
    }
    if prefix == "/" {
        return path.starts_with("//");
    }
    path.strip_prefix(prefix)
        .is_some_and(|rest| rest.starts_with('/'))
}

fn strip_query(path: &str) -> &str {
    let end = path.find(['?', '#']).unwrap_or(path.len());
    &path[..end]
}

/// AccessDecision
///
/// Derived on every path or session change; never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct AccessDecision {
    pub render: bool,
    pub redirect_to: Option<String>,
    pub show_navigation: bool,
}

impl AccessDecision {
    pub fn render(show_navigation: bool) -> Self {
        Self {
            render: true,
            redirect_to: None,
            show_navigation,
        }
    }

    pub fn redirect(target: impl Into<String>) -> Self {
        Self {
            render: false,
            redirect_to: Some(target.into()),
            show_navigation: false,
        }
    }
}

pub fn landing_for(role: Role) -> &'static str {
    match role {
        Role::Admin => ADMIN_HOME,
        Role::User => USER_HOME,
    }
}

pub fn login_redirect(current_path: &str) -> String {
    format!("{LOGIN_PATH}?redirect={}", urlencoding::encode(current_path))
}

/// decide
///
/// Pure access policy over (path, session, table).
pub fn decide(path: &str, marker: &SessionMarker, table: &RouteTable) -> AccessDecision {
    let class = table.classify(path);

    if class == RouteClass::Public {
        return match marker.role {
            Some(role) if marker.is_authenticated() && table.is_entry_point(path) => {
                AccessDecision::redirect(landing_for(role))
            }
            _ => AccessDecision::render(false),
        };
    }

    let role = match marker.role {
        Some(role) if marker.is_authenticated() => role,
        _ => return AccessDecision::redirect(login_redirect(path)),
    };

    match (role, class) {
        (Role::Admin, RouteClass::AdminOnly) => AccessDecision::render(false),
        (Role::Admin, _) => AccessDecision::redirect(ADMIN_HOME),
        (Role::User, RouteClass::UserOnly) => AccessDecision::render(true),
        (Role::User, _) => AccessDecision::redirect(USER_HOME),
    }
}
