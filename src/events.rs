//! Cross-view notification plumbing: a pub/sub channel keyed by setting name
//! and the viewport observer capability.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, watch};
use ts_rs::TS;
use utoipa::ToSchema;

use crate::session::{SessionError, SessionStore, keys};

const CHANNEL_CAPACITY: usize = 16;

/// Below this width the shell switches to the compact layout.
pub const MOBILE_BREAKPOINT: u32 = 768;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettingChange {
    pub key: String,
    pub value: String,
}

/// SettingsChannel
///
/// Fan-out channel per setting name. Any number of subscribers; a lagging
/// subscriber skips to the newest value rather than blocking the publisher.
#[derive(Clone, Default)]
pub struct SettingsChannel {
    topics: Arc<Mutex<HashMap<String, broadcast::Sender<SettingChange>>>>,
}

impl SettingsChannel {
    pub fn new() -> Self {
        Self::default()
    }

    fn sender(&self, key: &str) -> Option<broadcast::Sender<SettingChange>> {
        let mut topics = self.topics.lock().ok()?;
        let sender = topics
            .entry(key.to_string())
            .or_insert_with(|| broadcast::channel(CHANNEL_CAPACITY).0);
        Some(sender.clone())
    }

    pub fn subscribe(&self, key: &str) -> Option<broadcast::Receiver<SettingChange>> {
        self.sender(key).map(|s| s.subscribe())
    }

    /// Returns how many subscribers saw the change. Zero is not an error.
    pub fn publish(&self, key: &str, value: &str) -> usize {
        let Some(sender) = self.sender(key) else {
            return 0;
        };
        sender
            .send(SettingChange {
                key: key.to_string(),
                value: value.to_string(),
            })
            .unwrap_or(0)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn parse(raw: &str) -> Option<Theme> {
        match raw {
            "light" => Some(Theme::Light),
            "dark" => Some(Theme::Dark),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }

    pub fn toggled(&self) -> Theme {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }

    /// Reads the stored theme; anything unreadable falls back to light.
    pub fn load(store: &dyn SessionStore) -> Theme {
        store
            .read(keys::THEME)
            .ok()
            .flatten()
            .and_then(|v| Theme::parse(&v))
            .unwrap_or_default()
    }
}

/// Persists the flipped theme and broadcasts it to every mounted shell.
pub fn toggle_theme(store: &dyn SessionStore, channel: &SettingsChannel) -> Result<Theme, SessionError> {
    let next = Theme::load(store).toggled();
    store.write(keys::THEME, next.as_str())?;
    let delivered = channel.publish(keys::THEME, next.as_str());
    tracing::debug!(theme = next.as_str(), delivered, "theme toggled");
    Ok(next)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub fn is_mobile(&self) -> bool {
        self.width < MOBILE_BREAKPOINT
    }

    pub fn is_portrait(&self) -> bool {
        self.height > self.width
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 800,
        }
    }
}

/// ViewportObserver
///
/// Source of viewport-shape changes. Each `subscribe` starts a fresh receiver
/// that first yields the current shape.
pub trait ViewportObserver: Send + Sync {
    fn subscribe(&self) -> watch::Receiver<Viewport>;
}

/// ManualViewport
///
/// Observer driven by explicit `resize` calls (tests, headless rendering).
pub struct ManualViewport {
    tx: watch::Sender<Viewport>,
}

impl ManualViewport {
    pub fn new(initial: Viewport) -> Self {
        let (tx, _rx) = watch::channel(initial);
        Self { tx }
    }

    pub fn resize(&self, width: u32, height: u32) {
        self.tx.send_replace(Viewport { width, height });
    }
}

impl ViewportObserver for ManualViewport {
    fn subscribe(&self) -> watch::Receiver<Viewport> {
        let mut rx = self.tx.subscribe();
        rx.mark_changed();
        rx
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::LayeredSessionStore;

    #[tokio::test]
    async fn every_subscriber_receives_theme_change() {
        let channel = SettingsChannel::new();
        let mut first = channel.subscribe(keys::THEME).unwrap();
        let mut second = channel.subscribe(keys::THEME).unwrap();
        let store = LayeredSessionStore::new();

        let theme = toggle_theme(&store, &channel).unwrap();
        assert_eq!(theme, Theme::Dark);
        assert_eq!(first.recv().await.unwrap().value, "dark");
        assert_eq!(second.recv().await.unwrap().value, "dark");
        assert_eq!(Theme::load(&store), Theme::Dark);
    }

    #[test]
    fn publishing_without_subscribers_is_fine() {
        let channel = SettingsChannel::new();
        assert_eq!(channel.publish("theme", "dark"), 0);
    }

    #[test]
    fn viewport_subscription_starts_with_current_shape() {
        let viewport = ManualViewport::new(Viewport::default());
        viewport.resize(375, 812);
        let mut rx = viewport.subscribe();
        assert!(rx.has_changed().unwrap());
        let shape = *rx.borrow_and_update();
        assert!(shape.is_mobile());
        assert!(shape.is_portrait());
    }
}
