//! Trigger execution and per-event control
//!
//! `post_trigger` runs a trigger's actions in stored order while holding the
//! pool lock, so a tick can never reclaim voices of an event that is still
//! being built.

use std::sync::atomic::Ordering;

use crate::command::{ActionContext, ActionType, CommandId, TriggerAction};
use crate::registry::{lock, EventInfo};
use crate::types::{EventId, ObjectId, Transform};
use crate::voice::{Voice, VoiceOwner};

use super::engine::{AudioEngine, Emitter, PoolState};

/// Maximum chain length of `PostTrigger` actions
pub const MAX_TRIGGER_DEPTH: usize = 8;

/// First object ID handed to transient location emitters
pub const TRANSIENT_OBJECT_BASE: ObjectId = 1 << 63;

impl AudioEngine {
    /// Execute a trigger against `object`
    ///
    /// Returns the new event, or `EventId::NONE` for an unknown command.
    pub fn post_trigger(&self, command: CommandId, object: ObjectId) -> EventId {
        if !self.is_initialized() {
            return EventId::NONE;
        }
        let emitter = self.emitter_for(object);
        let mut state = lock(&self.pool);
        self.run_trigger(&mut state, command, object, emitter, 0)
    }

    /// Execute a trigger at a world position through a transient object
    pub fn post_trigger_at_location(&self, command: CommandId, transform: Transform) -> EventId {
        if !self.is_initialized() {
            return EventId::NONE;
        }
        let object = self.next_transient_object.fetch_add(1, Ordering::Relaxed);
        if !self.initialize_audio_object(object, "TransientLocation", transform) {
            return EventId::NONE;
        }
        let event = self.post_trigger(command, object);
        self.release_audio_object(object);
        event
    }

    fn run_trigger(
        &self,
        state: &mut PoolState,
        command: CommandId,
        object: ObjectId,
        emitter: Emitter,
        depth: usize,
    ) -> EventId {
        let Some(trigger) = self.commands.get_trigger(command) else {
            log::error!("PostTrigger: no trigger registered for command {}", command);
            return EventId::NONE;
        };

        let event = self.events.add(EventInfo::new(command, object));
        self.object_events.add(object, event);
        state.pending_events.push(event);

        for action in &trigger.actions {
            self.execute_action(state, action, event, object, emitter, depth);
        }

        state.pending_events.retain(|&pending| pending != event);
        if self.events.number_of_sources(event) == 0 {
            self.retire_event(event);
        }
        log::debug!(
            "Posted '{}' on object {} as event {} ({} voices)",
            trigger.debug_name,
            object,
            event,
            self.events.number_of_sources(event)
        );
        event
    }

    fn execute_action(
        &self,
        state: &mut PoolState,
        action: &TriggerAction,
        event: EventId,
        object: ObjectId,
        emitter: Emitter,
        depth: usize,
    ) {
        match (action.action_type, action.context) {
            (ActionType::Play, ActionContext::GameObject) => {
                let Some(config) = self.assets.sound_config(action.target) else {
                    log::warn!("Play: unknown sound {}", action.target);
                    return;
                };
                let started = self.start_voice(
                    state,
                    config,
                    action.target,
                    VoiceOwner::Object(object),
                    emitter,
                    Some(event),
                );
                if let Some(id) = started {
                    self.object_sources.add(object, id);
                    self.events.add_source(event, id);
                }
            }
            (ActionType::PostTrigger, ActionContext::GameObject) => {
                if depth + 1 >= MAX_TRIGGER_DEPTH {
                    log::warn!("PostTrigger: nesting deeper than {} ignored", MAX_TRIGGER_DEPTH);
                    return;
                }
                let nested = CommandId(action.target as u32);
                self.run_trigger(state, nested, object, emitter, depth + 1);
            }
            (ActionType::Play | ActionType::PostTrigger, ActionContext::Global) => {
                log::warn!("{} has no Global form, action skipped", action.action_type);
            }
            (kind, ActionContext::GameObject) => {
                let Some(sources) = self.object_sources.get(object) else {
                    return;
                };
                let any_target = kind.targets_all() || action.target == 0;
                for id in sources {
                    if let Some(voice) = state.voices.get_mut(id) {
                        if any_target || voice.handle() == action.target {
                            apply_action(voice, kind);
                        }
                    }
                }
            }
            (kind, ActionContext::Global) => {
                let any_target = kind.targets_all();
                for voice in state.voices.active_voices_mut() {
                    if any_target || voice.handle() == action.target {
                        apply_action(voice, kind);
                    }
                }
            }
        }
    }

    /// Run `f` on every voice of an event; false if the event is unknown
    fn for_event_voices(&self, event: EventId, mut f: impl FnMut(&mut Voice) -> bool) -> bool {
        if !self.is_initialized() {
            return false;
        }
        let Some(info) = self.events.find(event) else {
            return false;
        };
        let mut state = lock(&self.pool);
        let mut any = false;
        for id in info.sources {
            if let Some(voice) = state.voices.get_mut(id) {
                any |= f(voice);
            }
        }
        any
    }

    pub fn stop_event(&self, event: EventId) -> bool {
        self.for_event_voices(event, Voice::stop)
    }

    pub fn pause_event(&self, event: EventId) -> bool {
        self.for_event_voices(event, Voice::pause)
    }

    pub fn resume_event(&self, event: EventId) -> bool {
        self.for_event_voices(event, Voice::resume)
    }
}

/// Non-starting actions on one voice
fn apply_action(voice: &mut Voice, kind: ActionType) {
    match kind {
        ActionType::Stop | ActionType::StopAll => {
            voice.stop();
        }
        ActionType::Pause | ActionType::PauseAll => {
            voice.pause();
        }
        ActionType::Resume | ActionType::ResumeAll => {
            voice.resume();
        }
        ActionType::Break => voice.break_loop(),
        ActionType::Seek | ActionType::SeekAll => voice.seek_to_start(),
        ActionType::Play | ActionType::PostTrigger => {}
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;
    use crate::command::TriggerCommand;
    use crate::types::Vec3;
    use crate::voice::PlayState;

    fn sources(engine: &AudioEngine, event: EventId) -> Vec<u32> {
        engine.events().get(event).unwrap().sources
    }

    #[test]
    fn test_explosion_trigger_registers_both_sources() {
        let engine = engine(8);
        let event = engine.post_trigger(CommandId::from_name("ExplosionTrigger"), 42);

        assert!(event.is_valid());
        assert_eq!(engine.events().number_of_sources(event), 2);
        assert_eq!(engine.object_events().get(42), Some(vec![event]));
        assert_eq!(engine.object_sources().count(42), 2);

        let info = engine.events().get(event).unwrap();
        assert_eq!(info.command_id, CommandId::from_name("ExplosionTrigger"));
        assert_eq!(info.object_id, 42);
    }

    #[test]
    fn test_unknown_trigger_changes_nothing() {
        let engine = engine(8);
        engine.post_trigger(CommandId::from_name("ExplosionTrigger"), 1);
        let before = engine.events().count();

        let event = engine.post_trigger(CommandId::from_name("NoSuchTrigger"), 42);
        assert_eq!(event, EventId::NONE);
        assert_eq!(engine.events().count(), before);
        assert!(!engine.object_events().contains_key(42));
        assert_eq!(engine.active_voice_count(), 2);
    }

    #[test]
    fn test_event_retired_when_voices_finish() {
        let engine = engine(8);
        let event = engine.post_trigger(CommandId::from_name("ExplosionTrigger"), 42);

        // Boom ends first; the event survives on Rumble
        assert!(run_until(&engine, |e| e.events().number_of_sources(event) == 1));
        assert!(engine.events().contains(event));

        assert!(run_until(&engine, |e| e.active_voice_count() == 0));
        assert!(!engine.events().contains(event));
        assert!(!engine.object_events().contains_key(42));
        assert!(!engine.object_sources().contains_key(42));
    }

    #[test]
    fn test_stop_event_fades_then_reclaims() {
        let engine = engine(8);
        let event = engine.post_trigger(CommandId::from_name("ExplosionTrigger"), 42);
        engine.tick(TICK);
        let ids = sources(&engine, event);
        assert_eq!(engine.voice_state(ids[0]), Some(PlayState::Playing));

        assert!(engine.stop_event(event));
        assert_eq!(engine.voice_state(ids[0]), Some(PlayState::Stopping));
        for _ in 0..6 {
            engine.tick(TICK);
        }
        assert_eq!(engine.active_voice_count(), 2);
        engine.tick(TICK);
        assert_eq!(engine.active_voice_count(), 0);
        assert!(!engine.events().contains(event));
        assert!(!engine.stop_event(event));
    }

    #[test]
    fn test_pause_and_resume_event() {
        let engine = engine(8);
        let event = engine.post_trigger(CommandId::from_name("ExplosionTrigger"), 42);
        engine.tick(TICK);
        let ids = sources(&engine, event);

        assert!(engine.pause_event(event));
        engine.tick(0.05);
        assert_eq!(engine.voice_state(ids[1]), Some(PlayState::Paused));
        assert_eq!(engine.active_voice_count(), 2);

        assert!(engine.resume_event(event));
        engine.tick(TICK);
        assert_eq!(engine.voice_state(ids[1]), Some(PlayState::Playing));
    }

    #[test]
    fn test_object_stop_targets_matching_sound() {
        let engine = engine(8);
        engine.commands().insert_trigger(TriggerCommand::new("StopBoom").with_action(TriggerAction::new(
            ActionType::Stop,
            BOOM,
            ActionContext::GameObject,
        )));
        let event = engine.post_trigger(CommandId::from_name("ExplosionTrigger"), 42);
        let other = engine.post_trigger(CommandId::from_name("ExplosionTrigger"), 43);
        engine.tick(TICK);
        let ids = sources(&engine, event);
        let other_ids = sources(&engine, other);

        let stop_event = engine.post_trigger(CommandId::from_name("StopBoom"), 42);
        // No voices of its own: retired at once, ID still returned
        assert!(stop_event.is_valid());
        assert!(!engine.events().contains(stop_event));

        assert_eq!(engine.voice_state(ids[0]), Some(PlayState::Stopping));
        assert_eq!(engine.voice_state(ids[1]), Some(PlayState::Playing));
        assert_eq!(engine.voice_state(other_ids[0]), Some(PlayState::Playing));
    }

    #[test]
    fn test_global_stop_all_reaches_every_voice() {
        let engine = engine(8);
        engine.commands().insert_trigger(TriggerCommand::new("Silence").with_action(TriggerAction::new(
            ActionType::StopAll,
            0,
            ActionContext::Global,
        )));
        engine.post_trigger(CommandId::from_name("ExplosionTrigger"), 1);
        engine.post_trigger(CommandId::from_name("ExplosionTrigger"), 2);
        engine.tick(TICK);

        engine.post_trigger(CommandId::from_name("Silence"), 99);
        assert!(run_until(&engine, |e| e.active_voice_count() == 0));
        assert_eq!(engine.events().count(), 0);
    }

    #[test]
    fn test_global_play_is_skipped() {
        let engine = engine(8);
        engine.commands().insert_trigger(TriggerCommand::new("GlobalPlay").with_action(TriggerAction::new(
            ActionType::Play,
            BOOM,
            ActionContext::Global,
        )));
        engine.post_trigger(CommandId::from_name("GlobalPlay"), 5);
        assert_eq!(engine.active_voice_count(), 0);
    }

    #[test]
    fn test_break_lets_loop_finish() {
        let engine = engine(8);
        engine
            .commands()
            .insert_trigger(TriggerCommand::new("Hum").with_action(TriggerAction::play(HUM)));
        engine.commands().insert_trigger(TriggerCommand::new("BreakHum").with_action(TriggerAction::new(
            ActionType::Break,
            HUM,
            ActionContext::GameObject,
        )));

        engine.post_trigger(CommandId::from_name("Hum"), 7);
        for _ in 0..10 {
            step(&engine);
        }
        assert_eq!(engine.active_voice_count(), 1);

        engine.post_trigger(CommandId::from_name("BreakHum"), 7);
        assert!(run_until(&engine, |e| e.active_voice_count() == 0));
    }

    #[test]
    fn test_nested_post_trigger() {
        let engine = engine(8);
        engine.commands().insert_trigger(TriggerCommand::new("Outer").with_action(TriggerAction::new(
            ActionType::PostTrigger,
            CommandId::from_name("ExplosionTrigger").0 as u64,
            ActionContext::GameObject,
        )));

        let outer = engine.post_trigger(CommandId::from_name("Outer"), 42);
        assert!(outer.is_valid());
        assert!(!engine.events().contains(outer));
        assert_eq!(engine.events().count(), 1);
        assert_eq!(engine.object_sources().count(42), 2);
    }

    #[test]
    fn test_recursive_trigger_is_bounded() {
        let engine = engine(32);
        let id = CommandId::from_name("Echo");
        engine.commands().insert_trigger(
            TriggerCommand::new("Echo")
                .with_action(TriggerAction::new(
                    ActionType::PostTrigger,
                    id.0 as u64,
                    ActionContext::GameObject,
                ))
                .with_action(TriggerAction::play(BOOM)),
        );

        engine.post_trigger(id, 3);
        assert_eq!(engine.active_voice_count(), MAX_TRIGGER_DEPTH);
        assert_eq!(engine.events().count(), MAX_TRIGGER_DEPTH);
    }

    #[test]
    fn test_eviction_within_one_trigger_keeps_event() {
        let engine = engine(1);
        let event = engine.post_trigger(CommandId::from_name("ExplosionTrigger"), 42);

        // Rumble stole Boom's slot
        assert!(engine.events().contains(event));
        assert_eq!(engine.events().number_of_sources(event), 1);
        assert_eq!(engine.object_sources().count(42), 1);
        assert_eq!(engine.active_voice_count(), 1);
    }

    #[test]
    fn test_eviction_retires_victim_event() {
        let engine = engine(2);
        engine
            .commands()
            .insert_trigger(TriggerCommand::new("Boom").with_action(TriggerAction::play(BOOM)));
        let first = engine.post_trigger(CommandId::from_name("Boom"), 1);
        engine.post_trigger(CommandId::from_name("Boom"), 2);
        let third = engine.post_trigger(CommandId::from_name("Boom"), 3);

        assert!(!engine.events().contains(first));
        assert!(!engine.object_events().contains_key(1));
        assert!(!engine.object_sources().contains_key(1));
        assert_eq!(engine.events().number_of_sources(third), 1);
    }

    #[test]
    fn test_post_trigger_at_location_releases_object() {
        let engine = engine(8);
        let at = Transform::at(Vec3::new(10.0, 0.0, -4.0));
        let event = engine.post_trigger_at_location(CommandId::from_name("ExplosionTrigger"), at);

        assert!(event.is_valid());
        let object = engine.events().get(event).unwrap().object_id;
        assert!(object >= TRANSIENT_OBJECT_BASE);
        assert!(engine.find_object(object).is_none());
        assert_eq!(engine.events().number_of_sources(event), 2);
    }

    #[test]
    fn test_unknown_event_controls_are_false() {
        let engine = engine(4);
        assert!(!engine.stop_event(EventId(77)));
        assert!(!engine.pause_event(EventId::NONE));
        assert!(!engine.resume_event(EventId(3)));
    }
}
