//! Gameplay-facing audio handles
//!
//! [`AudioComponent`] is what an entity carries; [`AudioObject`] is an ad-hoc
//! emitter that triggers are posted against.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::sound::SoundConfig;
use crate::types::{EntityId, ObjectId, Transform, Vec3};

/// Audio component attached to an entity
#[derive(Debug)]
pub struct AudioComponent {
    /// Entity owning this component; doubles as its object ID
    pub parent_handle: EntityId,
    pub sound_config: Option<Arc<SoundConfig>>,
    /// Trigger name posted by scripts when the component starts
    pub start_event: String,
    pub play_on_awake: bool,
    /// Mark the entity for destruction once its voice finishes
    pub auto_destroy: bool,
    pub volume_multiplier: f32,
    pub pitch_multiplier: f32,
    /// Emitter placement used when the voice starts
    pub source_transform: Transform,
    marked_for_destroy: AtomicBool,
}

impl AudioComponent {
    pub fn new(parent_handle: EntityId, sound_config: Option<Arc<SoundConfig>>) -> Self {
        Self {
            parent_handle,
            sound_config,
            start_event: String::new(),
            play_on_awake: false,
            auto_destroy: false,
            volume_multiplier: 1.0,
            pitch_multiplier: 1.0,
            source_transform: Transform::default(),
            marked_for_destroy: AtomicBool::new(false),
        }
    }

    /// Set from any thread when the component's voice completes
    pub fn mark_for_destroy(&self) {
        self.marked_for_destroy.store(true, Ordering::Release);
    }

    /// Read by the owning (game) thread to reap finished one-shots
    pub fn is_marked_for_destroy(&self) -> bool {
        self.marked_for_destroy.load(Ordering::Acquire)
    }
}

/// Ad-hoc 3D emitter
#[derive(Debug, Clone, PartialEq)]
pub struct AudioObject {
    pub id: ObjectId,
    pub debug_name: String,
    pub transform: Transform,
    pub velocity: Vec3,
}

impl AudioObject {
    pub fn new(id: ObjectId, debug_name: impl Into<String>, transform: Transform) -> Self {
        Self {
            id,
            debug_name: debug_name.into(),
            transform,
            velocity: Vec3::ZERO,
        }
    }
}
