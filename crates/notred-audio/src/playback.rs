//! Gameplay-facing playback facade
//!
//! Scripts and gameplay systems address sounds by entity ID within the
//! engine's active scene; [`AudioPlayback`] resolves those IDs through the
//! component registry and forwards to the engine. Every call returns a
//! sentinel (`false` or [`EventId::NONE`]) instead of failing.

use crate::command::CommandId;
use crate::engine::AudioEngine;
use crate::types::{EntityId, EventId, ObjectId, Transform};
use crate::voice::Voice;

/// Borrowed handle onto an [`AudioEngine`] for gameplay code
#[derive(Debug, Clone, Copy)]
pub struct AudioPlayback<'a> {
    engine: &'a AudioEngine,
}

impl<'a> AudioPlayback<'a> {
    pub fn new(engine: &'a AudioEngine) -> Self {
        Self { engine }
    }

    pub fn engine(&self) -> &'a AudioEngine {
        self.engine
    }

    // ── components ───────────────────────────────────────────────────────

    /// Start the component's sound `start_time` seconds in
    pub fn play(&self, entity: EntityId, start_time: f32) -> bool {
        self.engine
            .play_component(self.engine.active_scene(), entity, start_time)
    }

    /// Fade out the component's voice
    pub fn stop_active_sound(&self, entity: EntityId) -> bool {
        self.with_voice(entity, Voice::stop).unwrap_or(false)
    }

    pub fn pause_active_sound(&self, entity: EntityId) -> bool {
        self.with_voice(entity, Voice::pause).unwrap_or(false)
    }

    pub fn resume(&self, entity: EntityId) -> bool {
        self.with_voice(entity, Voice::resume).unwrap_or(false)
    }

    pub fn is_playing(&self, entity: EntityId) -> bool {
        self.with_voice(entity, |voice| voice.is_playing())
            .unwrap_or(false)
    }

    fn with_voice<R>(&self, entity: EntityId, f: impl FnOnce(&mut Voice) -> R) -> Option<R> {
        self.engine
            .with_component_voice(self.engine.active_scene(), entity, f)
    }

    // ── triggers ─────────────────────────────────────────────────────────

    pub fn post_trigger(&self, command: CommandId, object: ObjectId) -> EventId {
        self.engine.post_trigger(command, object)
    }

    /// Post against the entity owning the component
    pub fn post_trigger_from_component(&self, command: CommandId, entity: EntityId) -> EventId {
        let scene = self.engine.active_scene();
        let Some(component) = self.engine.components().get(scene, entity) else {
            log::warn!(
                "Cannot post trigger {}: no audio component for entity {}",
                command,
                entity
            );
            return EventId::NONE;
        };
        self.engine.post_trigger(command, component.parent_handle)
    }

    /// Post on a transient emitter placed at `transform`
    pub fn post_trigger_at_location(&self, command: CommandId, transform: Transform) -> EventId {
        self.engine.post_trigger_at_location(command, transform)
    }

    // ── audio objects ────────────────────────────────────────────────────

    pub fn initialize_audio_object(&self, id: ObjectId, debug_name: &str, transform: Transform) -> bool {
        self.engine.initialize_audio_object(id, debug_name, transform)
    }

    pub fn release_audio_object(&self, id: ObjectId) -> bool {
        self.engine.release_audio_object(id)
    }

    pub fn has_audio_object(&self, id: ObjectId) -> bool {
        self.engine.find_object(id).is_some()
    }

    // ── events ───────────────────────────────────────────────────────────

    pub fn stop_event_id(&self, event: EventId) -> bool {
        self.engine.stop_event(event)
    }

    pub fn pause_event_id(&self, event: EventId) -> bool {
        self.engine.pause_event(event)
    }

    pub fn resume_event_id(&self, event: EventId) -> bool {
        self.engine.resume_event(event)
    }
}
