//! Game-thread → audio-thread staging
//!
//! Per-voice deltas (position, velocity, volume, pitch) are never written
//! into voices directly. The game thread stages them here and the tick drains
//! the whole buffer at once, before any voice advances.
//!
//! Updates carry absolute values, so a newer update for the same object
//! replaces the staged one. The mailbox holds at most one entry per object
//! and at most [`MAX_PENDING_UPDATES`] objects between ticks.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::registry::lock;
use crate::sound::SoundConfig;
use crate::types::{EntityId, ObjectId, SceneId, Transform, Vec3};

/// One object's per-tick parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SourceUpdateData {
    /// Applies to every voice owned by this object (or component entity)
    pub object_id: ObjectId,
    pub volume_multiplier: f32,
    pub pitch_multiplier: f32,
    pub transform: Transform,
    pub velocity: Vec3,
}

impl SourceUpdateData {
    /// Unity gain/pitch at `transform`
    pub fn at(object_id: ObjectId, transform: Transform) -> Self {
        Self {
            object_id,
            volume_multiplier: 1.0,
            pitch_multiplier: 1.0,
            transform,
            velocity: Vec3::ZERO,
        }
    }
}

/// Distinct objects the mailbox holds between two ticks
pub const MAX_PENDING_UPDATES: usize = 4096;

#[derive(Debug, Default)]
struct Pending {
    updates: Vec<SourceUpdateData>,
    /// object → position in `updates`
    index: HashMap<ObjectId, usize>,
}

impl Pending {
    fn stage(&mut self, update: SourceUpdateData, limit: usize) {
        if let Some(&at) = self.index.get(&update.object_id) {
            self.updates[at] = update;
        } else if self.updates.len() < limit {
            self.index.insert(update.object_id, self.updates.len());
            self.updates.push(update);
        } else {
            log::warn!(
                "Update mailbox full ({} objects), dropping update for object {}",
                limit,
                update.object_id
            );
        }
    }
}

/// Mutex-guarded buffer drained wholesale once per tick
#[derive(Debug)]
pub struct UpdateMailbox {
    pending: Mutex<Pending>,
    limit: usize,
}

impl Default for UpdateMailbox {
    fn default() -> Self {
        Self::with_limit(MAX_PENDING_UPDATES)
    }
}

impl UpdateMailbox {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mailbox holding at most `limit` objects between drains
    pub fn with_limit(limit: usize) -> Self {
        Self {
            pending: Mutex::new(Pending::default()),
            limit,
        }
    }

    pub fn push(&self, update: SourceUpdateData) {
        lock(&self.pending).stage(update, self.limit);
    }

    pub fn extend(&self, updates: impl IntoIterator<Item = SourceUpdateData>) {
        let mut pending = lock(&self.pending);
        for update in updates {
            pending.stage(update, self.limit);
        }
    }

    /// Take everything staged so far in first-staged order, leaving the
    /// mailbox empty
    pub fn drain(&self) -> Vec<SourceUpdateData> {
        let mut pending = lock(&self.pending);
        pending.index.clear();
        std::mem::take(&mut pending.updates)
    }

    /// Number of objects with a staged update
    pub fn len(&self) -> usize {
        lock(&self.pending).updates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A start deferred to the next tick
#[derive(Debug, Clone)]
pub enum StartRequest {
    /// Play-on-awake for a registered component
    Component { scene: SceneId, entity: EntityId },
    /// Fire-and-forget sound with no owner
    OneShot {
        config: Arc<SoundConfig>,
        transform: Transform,
    },
}
