use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::editor::{CoverLetterEditor, EditorMode};
use crate::models::{EditorStats, EditorView};

struct EditorSlot {
    owner: String,
    editor: CoverLetterEditor,
    updated_at: DateTime<Utc>,
    // Registry-wide modification order; breaks timestamp ties.
    touched: u64,
}

pub const DEFAULT_MAX_EDITORS_PER_OWNER: usize = 8;
pub const DEFAULT_EDITOR_IDLE_TTL: Duration = Duration::from_secs(2 * 60 * 60);

/// EditorRegistry
///
/// Open editor sessions keyed by id. Every access is owner-scoped: a session
/// belonging to someone else behaves exactly like a missing one.
///
/// Opening an editor first drops every slot left unmodified for `idle_ttl`,
/// then evicts the owner's least recently modified editors until the owner is
/// below `max_per_owner`.
#[derive(Clone)]
pub struct EditorRegistry {
    slots: Arc<RwLock<HashMap<Uuid, EditorSlot>>>,
    max_per_owner: usize,
    idle_ttl: TimeDelta,
    clock: Arc<AtomicU64>,
}

impl Default for EditorRegistry {
    fn default() -> Self {
        Self::with_limits(DEFAULT_MAX_EDITORS_PER_OWNER, DEFAULT_EDITOR_IDLE_TTL)
    }
}

impl EditorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// `max_per_owner` is clamped to at least one.
    pub fn with_limits(max_per_owner: usize, idle_ttl: Duration) -> Self {
        Self {
            slots: Arc::new(RwLock::new(HashMap::new())),
            max_per_owner: max_per_owner.max(1),
            idle_ttl: TimeDelta::from_std(idle_ttl).unwrap_or(TimeDelta::MAX),
            clock: Arc::new(AtomicU64::new(0)),
        }
    }

    pub async fn open(&self, owner: &str, editor: CoverLetterEditor) -> EditorView {
        let now = Utc::now();
        let mut slots = self.slots.write().await;
        self.drop_idle(&mut slots, now);
        self.make_room(&mut slots, owner);

        let id = Uuid::new_v4();
        let mut slot = EditorSlot {
            owner: owner.to_string(),
            editor,
            updated_at: now,
            touched: self.tick(),
        };
        let view = render(id, &mut slot);
        slots.insert(id, slot);
        tracing::debug!(editor_id = %id, owner, "editor opened");
        view
    }

    /// Removes every slot not modified since `now - idle_ttl`. Returns the count removed.
    pub async fn evict_idle(&self, now: DateTime<Utc>) -> usize {
        let mut slots = self.slots.write().await;
        self.drop_idle(&mut slots, now)
    }

    fn drop_idle(&self, slots: &mut HashMap<Uuid, EditorSlot>, now: DateTime<Utc>) -> usize {
        let before = slots.len();
        slots.retain(|_, slot| now.signed_duration_since(slot.updated_at) < self.idle_ttl);
        let removed = before - slots.len();
        if removed > 0 {
            tracing::info!(removed, "idle editors evicted");
        }
        removed
    }

    fn tick(&self) -> u64 {
        self.clock.fetch_add(1, Ordering::Relaxed)
    }

    fn make_room(&self, slots: &mut HashMap<Uuid, EditorSlot>, owner: &str) {
        let mut owned: Vec<(u64, Uuid)> = slots
            .iter()
            .filter(|(_, slot)| slot.owner == owner)
            .map(|(id, slot)| (slot.touched, *id))
            .collect();
        if owned.len() < self.max_per_owner {
            return;
        }
        owned.sort_unstable();
        let excess = owned.len() + 1 - self.max_per_owner;
        for (_, id) in owned.into_iter().take(excess) {
            slots.remove(&id);
            tracing::info!(editor_id = %id, owner, "editor evicted to stay under the per-owner limit");
        }
    }

    pub async fn view(&self, owner: &str, id: Uuid) -> Option<EditorView> {
        self.with_editor(owner, id, |_| ()).await.map(|(_, view)| view)
    }

    /// Runs `f` against the owner's editor and returns its result plus a fresh view.
    pub async fn with_editor<T>(
        &self,
        owner: &str,
        id: Uuid,
        f: impl FnOnce(&mut CoverLetterEditor) -> T,
    ) -> Option<(T, EditorView)> {
        let mut slots = self.slots.write().await;
        let slot = slots.get_mut(&id).filter(|s| s.owner == owner)?;
        let before = slot.editor.clone();
        let out = f(&mut slot.editor);
        if slot.editor != before {
            slot.updated_at = Utc::now();
            slot.touched = self.tick();
        }
        Some((out, render(id, slot)))
    }

    pub async fn snapshot(&self, owner: &str, id: Uuid) -> Option<CoverLetterEditor> {
        let slots = self.slots.read().await;
        slots
            .get(&id)
            .filter(|s| s.owner == owner)
            .map(|s| s.editor.clone())
    }

    pub async fn close(&self, owner: &str, id: Uuid) -> bool {
        let mut slots = self.slots.write().await;
        match slots.get(&id) {
            Some(slot) if slot.owner == owner => {
                slots.remove(&id);
                true
            }
            _ => false,
        }
    }

    pub async fn stats(&self) -> EditorStats {
        let slots = self.slots.read().await;
        let mut owners: Vec<&str> = slots.values().map(|s| s.owner.as_str()).collect();
        owners.sort_unstable();
        owners.dedup();
        EditorStats {
            open_editors: slots.len(),
            single_mode: slots
                .values()
                .filter(|s| s.editor.mode() == EditorMode::Single)
                .count(),
            multi_mode: slots
                .values()
                .filter(|s| s.editor.mode() == EditorMode::Multi)
                .count(),
            owners: owners.len(),
        }
    }
}

fn render(id: Uuid, slot: &mut EditorSlot) -> EditorView {
    let editor = &mut slot.editor;
    EditorView {
        id,
        mode: editor.mode(),
        ceiling: editor.mode().ceiling(),
        title: editor.title().to_string(),
        document_id: editor.document_id().map(str::to_string),
        questions: editor.entries().to_vec(),
        scroll_to: editor.take_scroll_target(),
        updated_at: slot.updated_at,
    }
}
