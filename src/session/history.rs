//! Undo/redo log for annotation edits
//!
//! Only arrow/line/rectangle additions and deletions are recorded. Images,
//! moves, scaling and full clears never enter the log.
//!
//! Entries own the items they detach from the scene, so a removed annotation
//! lives in exactly one place: the scene while live, the log while undone or
//! deleted.

use crate::domain::{ItemId, Point, SceneItem};
use crate::scene::Scene;

/// Snapshot of one deleted annotation
#[derive(Clone, Debug)]
pub struct SavedAnnotation {
    pub id: ItemId,
    pub position: Point,
    pub z: i64,
    /// Detached item; `None` while the annotation is live again after an undo
    item: Option<SceneItem>,
}

impl SavedAnnotation {
    fn capture(mut item: SceneItem) -> Self {
        item.selected = false;
        Self {
            id: item.id,
            position: item.position(),
            z: item.z,
            item: Some(item),
        }
    }
}

#[derive(Clone, Debug)]
pub enum HistoryEntry {
    AddAnnotation {
        item_id: ItemId,
        /// Detached item; `None` while it is live in the scene
        parked: Option<SceneItem>,
    },
    DeleteAnnotations { items: Vec<SavedAnnotation> },
}

impl HistoryEntry {
    /// Revert the recorded change
    fn revert(&mut self, scene: &mut Scene) {
        match self {
            HistoryEntry::AddAnnotation { item_id, parked } => {
                *parked = scene.remove(*item_id);
                if parked.is_none() {
                    log::debug!("Undo add: {} is no longer in the scene", item_id);
                }
            }
            HistoryEntry::DeleteAnnotations { items } => {
                for saved in items.iter_mut() {
                    let Some(mut item) = saved.item.take() else {
                        continue;
                    };
                    item.set_position(saved.position);
                    item.z = saved.z;
                    scene.restore(item);
                }
            }
        }
    }

    /// Re-apply the recorded change
    fn reapply(&mut self, scene: &mut Scene) {
        match self {
            HistoryEntry::AddAnnotation { item_id, parked } => {
                if let Some(item) = parked.take() {
                    scene.restore(item);
                } else {
                    log::debug!("Redo add: nothing parked for {}", item_id);
                }
            }
            HistoryEntry::DeleteAnnotations { items } => {
                for saved in items.iter_mut() {
                    if let Some(item) = scene.remove(saved.id) {
                        saved.position = item.position();
                        saved.z = item.z;
                        saved.item = Some(item);
                    }
                }
            }
        }
    }
}

/// Undo/redo stacks with linear history
#[derive(Debug)]
pub struct CommandLog {
    /// Most recent last
    undo_stack: Vec<HistoryEntry>,
    /// Most recent last
    redo_stack: Vec<HistoryEntry>,
    limit: usize,
}

impl Default for CommandLog {
    fn default() -> Self {
        Self::with_limit(100)
    }
}

impl CommandLog {
    pub fn with_limit(limit: usize) -> Self {
        Self {
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            limit: limit.max(1),
        }
    }

    fn push(&mut self, entry: HistoryEntry) {
        // Any new action invalidates redo history
        self.redo_stack.clear();
        self.undo_stack.push(entry);
        while self.undo_stack.len() > self.limit {
            self.undo_stack.remove(0);
        }
    }

    /// Record a freshly added annotation that is live in the scene
    pub fn record_add(&mut self, item_id: ItemId) {
        self.push(HistoryEntry::AddAnnotation {
            item_id,
            parked: None,
        });
    }

    /// Record annotations that were just detached from the scene.
    ///
    /// Non-annotation items are dropped. Returns false if nothing was recorded.
    pub fn record_delete(&mut self, items: Vec<SceneItem>) -> bool {
        let saved: Vec<SavedAnnotation> = items
            .into_iter()
            .filter(SceneItem::is_annotation)
            .map(SavedAnnotation::capture)
            .collect();
        if saved.is_empty() {
            return false;
        }
        self.push(HistoryEntry::DeleteAnnotations { items: saved });
        true
    }

    /// Revert the most recent entry. Returns false if there is nothing to undo.
    pub fn undo(&mut self, scene: &mut Scene) -> bool {
        let Some(mut entry) = self.undo_stack.pop() else {
            return false;
        };
        entry.revert(scene);
        self.redo_stack.push(entry);
        true
    }

    /// Re-apply the most recently undone entry. Returns false if there is none.
    pub fn redo(&mut self, scene: &mut Scene) -> bool {
        let Some(mut entry) = self.redo_stack.pop() else {
            return false;
        };
        entry.reapply(scene);
        self.undo_stack.push(entry);
        true
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_count(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn is_empty(&self) -> bool {
        self.undo_stack.is_empty() && self.redo_stack.is_empty()
    }

    /// Drop all history; parked items are destroyed with it
    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }
}
