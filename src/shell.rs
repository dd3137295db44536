use tokio::sync::{broadcast, watch};

use crate::access::gate::{AccessGate, GateState};
use crate::events::{SettingChange, SettingsChannel, Theme, Viewport, ViewportObserver};
use crate::session::{SessionStore, keys};

/// What the layout chrome should look like right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChromeState {
    /// Content is hidden behind the "checking/redirecting" placeholder.
    pub placeholder: bool,
    pub show_sidebar: bool,
    pub compact: bool,
    pub theme: Theme,
}

/// LayoutShell
///
/// Route shell that keeps three layers in step: the access gate, the theme
/// broadcast and the viewport shape. Subscriptions are taken on `mount` and
/// dropped on `unmount`.
pub struct LayoutShell {
    gate: AccessGate,
    theme: Theme,
    viewport: Viewport,
    theme_rx: Option<broadcast::Receiver<SettingChange>>,
    viewport_rx: Option<watch::Receiver<Viewport>>,
}

impl LayoutShell {
    pub fn new(gate: AccessGate) -> Self {
        Self {
            gate,
            theme: Theme::default(),
            viewport: Viewport::default(),
            theme_rx: None,
            viewport_rx: None,
        }
    }

    pub fn gate(&self) -> &AccessGate {
        &self.gate
    }

    pub fn mount(
        &mut self,
        store: &dyn SessionStore,
        path: &str,
        channel: &SettingsChannel,
        observer: &dyn ViewportObserver,
    ) -> ChromeState {
        self.theme = Theme::load(store);
        self.theme_rx = channel.subscribe(keys::THEME);
        self.viewport_rx = Some(observer.subscribe());
        self.gate.mount(store, path);
        self.sync()
    }

    pub fn navigate(&mut self, path: &str) -> ChromeState {
        self.gate.on_path_change(path);
        self.sync()
    }

    /// Applies every theme and viewport event delivered since the last call.
    pub fn sync(&mut self) -> ChromeState {
        if let Some(rx) = self.theme_rx.as_mut() {
            loop {
                match rx.try_recv() {
                    Ok(change) => {
                        if let Some(theme) = Theme::parse(&change.value) {
                            self.theme = theme;
                        }
                    }
                    Err(broadcast::error::TryRecvError::Lagged(skipped)) => {
                        tracing::debug!(skipped, "theme subscriber lagged");
                    }
                    Err(_) => break,
                }
            }
        }

        if let Some(rx) = self.viewport_rx.as_mut() {
            if rx.has_changed().unwrap_or(false) {
                self.viewport = *rx.borrow_and_update();
            }
        }

        self.chrome()
    }

    pub fn chrome(&self) -> ChromeState {
        let (placeholder, show_sidebar) = match self.gate.state() {
            GateState::Rendering { show_navigation } => (false, *show_navigation),
            GateState::CheckingAuth | GateState::Redirecting { .. } => (true, false),
        };
        ChromeState {
            placeholder,
            show_sidebar,
            compact: self.viewport.is_mobile(),
            theme: self.theme,
        }
    }

    pub fn unmount(&mut self) {
        self.theme_rx = None;
        self.viewport_rx = None;
        self.gate.unmount();
    }
}
