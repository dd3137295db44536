use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::task::JoinHandle;

use super::{AccessDecision, RouteTable, decide};
use crate::config::AppConfig;
use crate::session::{SessionError, SessionMarker, SessionStore, keys, read_marker};

pub const DEFAULT_REDIRECT_DELAY: Duration = Duration::from_millis(100);

/// Navigator
///
/// Router capability. The gate never navigates synchronously; it schedules a
/// call here after the redirect delay.
pub trait Navigator: Send + Sync {
    fn navigate(&self, target: &str);
}

/// Navigator that only records targets. Handy for tests and headless shells.
#[derive(Debug, Default)]
pub struct RecordingNavigator {
    visited: Mutex<Vec<String>>,
}

impl RecordingNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn visited(&self) -> Vec<String> {
        self.visited.lock().map(|v| v.clone()).unwrap_or_default()
    }
}

impl Navigator for RecordingNavigator {
    fn navigate(&self, target: &str) {
        if let Ok(mut visited) = self.visited.lock() {
            visited.push(target.to_string());
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateState {
    CheckingAuth,
    Redirecting { target: String },
    Rendering { show_navigation: bool },
}

struct ScheduledRedirect {
    path: String,
    target: String,
    // `None` when the redirect ran inline for lack of a runtime.
    handle: Option<JoinHandle<()>>,
}

/// AccessGate
///
/// Lifecycle wrapper around [`decide`]. Reads the session once per mount,
/// re-evaluates on every path or session change and debounces redirects.
/// A given (path, target) pair is scheduled at most once, so re-evaluating
/// with unchanged inputs never navigates twice.
///
/// Redirects are spawned on the current tokio runtime. Outside a runtime the
/// navigator is called immediately instead.
pub struct AccessGate {
    table: RouteTable,
    navigator: Arc<dyn Navigator>,
    delay: Duration,
    marker: Option<SessionMarker>,
    path: String,
    state: GateState,
    scheduled: Option<ScheduledRedirect>,
}

impl AccessGate {
    pub fn new(table: RouteTable, navigator: Arc<dyn Navigator>, delay: Duration) -> Self {
        Self {
            table,
            navigator,
            delay,
            marker: None,
            path: String::from("/"),
            state: GateState::CheckingAuth,
            scheduled: None,
        }
    }

    /// Gate using the configured redirect delay (`REDIRECT_DELAY_MS`).
    pub fn from_config(table: RouteTable, navigator: Arc<dyn Navigator>, config: &AppConfig) -> Self {
        Self::new(table, navigator, config.redirect_delay)
    }

    pub fn state(&self) -> &GateState {
        &self.state
    }

    pub fn marker(&self) -> Option<&SessionMarker> {
        self.marker.as_ref()
    }

    /// Current decision, or `None` while the auth check is still pending.
    pub fn decision(&self) -> Option<AccessDecision> {
        self.marker
            .as_ref()
            .map(|marker| decide(&self.path, marker, &self.table))
    }

    /// Enters `CheckingAuth`, reads the marker and evaluates `path`.
    pub fn mount(&mut self, store: &dyn SessionStore, path: &str) -> &GateState {
        self.cancel_scheduled();
        self.state = GateState::CheckingAuth;
        self.path = path.to_string();
        self.marker = Some(read_marker(store));
        self.evaluate()
    }

    pub fn on_path_change(&mut self, path: &str) -> &GateState {
        self.path = path.to_string();
        self.evaluate()
    }

    pub fn on_session_change(&mut self, marker: SessionMarker) -> &GateState {
        self.marker = Some(marker);
        self.evaluate()
    }

    /// Clears every session key and re-evaluates as an anonymous visitor.
    pub fn logout(&mut self, store: &dyn SessionStore) -> Result<&GateState, SessionError> {
        store.clear(&keys::SESSION_KEYS)?;
        tracing::info!("session cleared by logout");
        Ok(self.on_session_change(SessionMarker::anonymous()))
    }

    pub fn unmount(&mut self) {
        self.cancel_scheduled();
        self.marker = None;
        self.state = GateState::CheckingAuth;
    }

    fn evaluate(&mut self) -> &GateState {
        let Some(decision) = self.decision() else {
            return &self.state;
        };
        tracing::debug!(path = %self.path, ?decision, "access decision");

        match decision.redirect_to {
            Some(target) => {
                self.schedule(target.clone());
                self.state = GateState::Redirecting { target };
            }
            None => {
                self.cancel_scheduled();
                self.state = GateState::Rendering {
                    show_navigation: decision.show_navigation,
                };
            }
        }
        &self.state
    }

    fn schedule(&mut self, target: String) {
        if let Some(existing) = &self.scheduled {
            if existing.path == self.path && existing.target == target {
                return;
            }
        }
        self.cancel_scheduled();

        tracing::info!(from = %self.path, to = %target, "scheduling redirect");
        let handle = match tokio::runtime::Handle::try_current() {
            Ok(runtime) => {
                let navigator = Arc::clone(&self.navigator);
                let delay = self.delay;
                let destination = target.clone();
                Some(runtime.spawn(async move {
                    tokio::time::sleep(delay).await;
                    navigator.navigate(&destination);
                }))
            }
            Err(_) => {
                tracing::warn!(to = %target, "no async runtime; redirecting without delay");
                self.navigator.navigate(&target);
                None
            }
        };

        self.scheduled = Some(ScheduledRedirect {
            path: self.path.clone(),
            target,
            handle,
        });
    }

    fn cancel_scheduled(&mut self) {
        if let Some(handle) = self.scheduled.take().and_then(|s| s.handle) {
            handle.abort();
        }
    }
}

impl Drop for AccessGate {
    fn drop(&mut self) {
        self.cancel_scheduled();
    }
}
