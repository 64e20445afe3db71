//! Main audio engine - voice pool, registries, tick and mix
//!
//! The engine is one context object shared between the game thread and the
//! audio thread. There is no global lock: the pool, each registry, the
//! mailboxes and the reverb each own their own lock. Outside of rendering,
//! whenever the pool lock is held together with another lock the pool lock
//! is taken first; the registries never call back into the engine. The mix
//! buffers belong to the render path alone, which takes the pool lock per
//! block only while voices render and processes the reverb after releasing it.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use std::time::Instant;

use crate::command::CommandRegistry;
use crate::component::{AudioComponent, AudioObject};
use crate::config::EngineConfig;
use crate::node::DspNode;
use crate::pool::{EvictedVoice, VoicePool};
use crate::registry::{
    lock, read_lock, write_lock, AudioComponentRegistry, EventRegistry, ObjectEventRegistry, ObjectSourceRegistry,
    ALL_SCENES,
};
use crate::reverb::MasterReverb;
use crate::sound::{AssetProvider, SoundConfig};
use crate::spatial::{AudioListener, ListenerState};
use crate::types::{AssetHandle, EntityId, EventId, ObjectId, SceneId, SourceId, StereoBuffer, StereoSample, Transform, Vec3};
use crate::voice::{CompletionCallback, PlayState, Voice, VoiceOwner};

use super::stats::EngineStats;
use super::update::{SourceUpdateData, StartRequest, UpdateMailbox};

/// Scene that component calls address until the host sets another
pub const DEFAULT_SCENE: SceneId = 1;

/// Deferred starts (one-shots, play-on-awake) held between two ticks
pub const MAX_PENDING_STARTS: usize = 1024;

/// Where a voice starts: emitter placement and motion
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub(super) struct Emitter {
    pub transform: Transform,
    pub velocity: Vec3,
}

/// Everything guarded by the pool lock
pub(super) struct PoolState {
    pub voices: VoicePool,
    /// (scene, entity) → the component's voice
    pub by_component: HashMap<(SceneId, EntityId), SourceId>,
    /// Events whose trigger is still executing; never retired mid-build
    pub pending_events: Vec<EventId>,
    /// Listener as of the last tick
    pub listener: ListenerState,
}

/// Pre-allocated mix buffers, one block each
struct MixBuffers {
    scratch: StereoBuffer,
    dry: StereoBuffer,
    wet: StereoBuffer,
    reverb_out: StereoBuffer,
}

impl MixBuffers {
    fn new(block_size: usize) -> Self {
        Self {
            scratch: StereoBuffer::silence(block_size),
            dry: StereoBuffer::silence(block_size),
            wet: StereoBuffer::silence(block_size),
            reverb_out: StereoBuffer::silence(block_size),
        }
    }
}

/// The audio engine context
///
/// Created by the host with [`AudioEngine::new`] and torn down with
/// [`AudioEngine::shutdown`]. The game thread posts triggers, registers
/// components and stages updates; the audio thread calls [`AudioEngine::tick`]
/// and [`AudioEngine::render`] once per callback.
pub struct AudioEngine {
    config: EngineConfig,
    pub(super) assets: Arc<dyn AssetProvider>,
    initialized: AtomicBool,
    pub(super) pool: Mutex<PoolState>,
    pub(super) commands: CommandRegistry,
    pub(super) events: EventRegistry,
    pub(super) object_events: ObjectEventRegistry,
    pub(super) object_sources: ObjectSourceRegistry,
    components: AudioComponentRegistry,
    pub(super) objects: RwLock<HashMap<ObjectId, AudioObject>>,
    listener: AudioListener,
    updates: UpdateMailbox,
    starts: Mutex<Vec<StartRequest>>,
    reverb: Mutex<MasterReverb>,
    mix: Mutex<MixBuffers>,
    stats: RwLock<EngineStats>,
    active_scene: AtomicU64,
    pub(super) next_transient_object: AtomicU64,
}

impl AudioEngine {
    /// Allocate the voice pool and master reverb
    pub fn new(config: EngineConfig, assets: Arc<dyn AssetProvider>) -> Self {
        let block_size = config.block_size.max(1);
        let mut reverb = MasterReverb::new(config.sample_rate);
        config.master_reverb.apply(&mut reverb);

        log::info!(
            "Audio engine initialized: {} voices @ {} Hz, block {}",
            config.voice_pool_size,
            config.sample_rate,
            block_size
        );

        Self {
            pool: Mutex::new(PoolState {
                voices: VoicePool::new(config.voice_pool_size),
                by_component: HashMap::new(),
                pending_events: Vec::new(),
                listener: ListenerState::default(),
            }),
            assets,
            initialized: AtomicBool::new(true),
            commands: CommandRegistry::new(),
            events: EventRegistry::new(),
            object_events: ObjectEventRegistry::new(),
            object_sources: ObjectSourceRegistry::new(),
            components: AudioComponentRegistry::new(),
            objects: RwLock::new(HashMap::new()),
            listener: AudioListener::new(),
            updates: UpdateMailbox::new(),
            starts: Mutex::new(Vec::new()),
            reverb: Mutex::new(reverb),
            mix: Mutex::new(MixBuffers::new(block_size)),
            stats: RwLock::new(EngineStats::default()),
            active_scene: AtomicU64::new(DEFAULT_SCENE),
            next_transient_object: AtomicU64::new(super::trigger::TRANSIENT_OBJECT_BASE),
            config,
        }
    }

    /// Stop everything and clear all state; later calls return sentinels
    pub fn shutdown(&self) {
        if !self.initialized.swap(false, Ordering::AcqRel) {
            return;
        }

        {
            let mut state = lock(&self.pool);
            state.voices.release_all();
            state.by_component.clear();
            state.pending_events.clear();
        }
        self.events.clear();
        self.object_events.clear();
        self.object_sources.clear();
        self.components.clear(ALL_SCENES);
        write_lock(&self.objects).clear();
        self.updates.drain();
        lock(&self.starts).clear();
        lock(&self.reverb).mute();
        *write_lock(&self.stats) = EngineStats::default();

        log::info!("Audio engine shut down");
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::Acquire)
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn sample_rate(&self) -> u32 {
        self.config.sample_rate
    }

    pub fn commands(&self) -> &CommandRegistry {
        &self.commands
    }

    pub fn events(&self) -> &EventRegistry {
        &self.events
    }

    pub fn object_events(&self) -> &ObjectEventRegistry {
        &self.object_events
    }

    pub fn object_sources(&self) -> &ObjectSourceRegistry {
        &self.object_sources
    }

    pub fn components(&self) -> &AudioComponentRegistry {
        &self.components
    }

    pub fn listener(&self) -> &AudioListener {
        &self.listener
    }

    /// Copy of the counters from the last tick
    pub fn stats(&self) -> EngineStats {
        *read_lock(&self.stats)
    }

    pub fn active_scene(&self) -> SceneId {
        self.active_scene.load(Ordering::Acquire)
    }

    pub fn set_active_scene(&self, scene: SceneId) {
        self.active_scene.store(scene, Ordering::Release);
    }

    pub fn set_reverb_param(&self, param: crate::reverb::ReverbParam, value: f32) {
        lock(&self.reverb).set(param, value);
    }

    pub fn reverb_param(&self, param: crate::reverb::ReverbParam) -> f32 {
        lock(&self.reverb).get(param)
    }

    // ── game-thread staging ──────────────────────────────────────────────

    /// Move the listener; applied at the next tick
    pub fn set_listener(&self, transform: Transform, velocity: Vec3) {
        self.listener.set(transform, velocity);
    }

    /// Stage `update` for the next tick; ignored after shutdown
    pub fn submit_source_update(&self, update: SourceUpdateData) {
        if self.is_initialized() {
            self.updates.push(update);
        }
    }

    pub fn submit_source_updates(&self, updates: Vec<SourceUpdateData>) {
        if self.is_initialized() {
            self.updates.extend(updates);
        }
    }

    /// Play `config` once at `transform` on the next tick
    pub fn queue_one_shot(&self, config: Arc<SoundConfig>, transform: Transform) -> bool {
        self.queue_start(StartRequest::OneShot { config, transform })
    }

    fn queue_start(&self, request: StartRequest) -> bool {
        if !self.is_initialized() {
            return false;
        }
        let mut starts = lock(&self.starts);
        if starts.len() >= MAX_PENDING_STARTS {
            log::warn!("Start queue full ({} requests), dropping {:?}", MAX_PENDING_STARTS, request);
            return false;
        }
        starts.push(request);
        true
    }

    /// Objects with an update waiting for the next tick
    pub fn pending_update_count(&self) -> usize {
        self.updates.len()
    }

    /// Starts waiting for the next tick
    pub fn pending_start_count(&self) -> usize {
        lock(&self.starts).len()
    }

    // ── audio objects ────────────────────────────────────────────────────

    /// Register an ad-hoc emitter; false if the ID is taken
    pub fn initialize_audio_object(&self, id: ObjectId, debug_name: &str, transform: Transform) -> bool {
        if !self.is_initialized() {
            return false;
        }
        let mut objects = write_lock(&self.objects);
        if objects.contains_key(&id) {
            log::warn!("Audio object {} already exists", id);
            return false;
        }
        objects.insert(id, AudioObject::new(id, debug_name, transform));
        true
    }

    /// Forget an emitter; its voices keep playing where they started
    pub fn release_audio_object(&self, id: ObjectId) -> bool {
        write_lock(&self.objects).remove(&id).is_some()
    }

    pub fn find_object(&self, id: ObjectId) -> Option<AudioObject> {
        read_lock(&self.objects).get(&id).cloned()
    }

    /// Placement for voices started on `object`: the object's own transform,
    /// or the listener position for unknown objects
    pub(super) fn emitter_for(&self, object: ObjectId) -> Emitter {
        match read_lock(&self.objects).get(&object) {
            Some(found) => Emitter {
                transform: found.transform,
                velocity: found.velocity,
            },
            None => Emitter {
                transform: Transform::at(self.listener.snapshot().transform.position),
                velocity: Vec3::ZERO,
            },
        }
    }

    // ── components ───────────────────────────────────────────────────────

    /// Register a component; play-on-awake components start next tick
    ///
    /// Returns false once the engine has shut down.
    pub fn register_component(&self, scene: SceneId, entity: EntityId, component: Arc<AudioComponent>) -> bool {
        if !self.is_initialized() {
            return false;
        }
        let play_on_awake = component.play_on_awake;
        if self.components.add(scene, entity, component).is_some() {
            log::debug!("Replaced audio component {} in scene {}", entity, scene);
        }
        if play_on_awake {
            self.queue_start(StartRequest::Component { scene, entity });
        }
        true
    }

    /// Drop a component and hard-stop its voice
    pub fn unregister_component(&self, scene: SceneId, entity: EntityId) -> bool {
        let removed = self.components.take(scene, entity).is_some();
        let mut state = lock(&self.pool);
        if let Some(id) = state.by_component.remove(&(scene, entity)) {
            self.hard_release(&mut state, id);
        }
        removed
    }

    /// Drop every component of `scene` (or of all scenes) and their voices
    pub fn clear_scene(&self, scene: SceneId) {
        let removed = self.components.clear(scene).len();
        let mut state = lock(&self.pool);
        let keys: Vec<_> = state
            .by_component
            .keys()
            .copied()
            .filter(|(s, _)| scene == ALL_SCENES || *s == scene)
            .collect();
        for key in keys {
            if let Some(id) = state.by_component.remove(&key) {
                self.hard_release(&mut state, id);
            }
        }
        log::debug!("Cleared {} audio components from scene {}", removed, scene);
    }

    /// Voice bound to a component, binding a new one if needed
    ///
    /// Returns the voice and whether it was freshly bound.
    pub(super) fn get_sound_for_component(
        &self,
        state: &mut PoolState,
        scene: SceneId,
        entity: EntityId,
    ) -> Option<(SourceId, bool)> {
        if let Some(&id) = state.by_component.get(&(scene, entity)) {
            return Some((id, false));
        }

        let Some(component) = self.components.get(scene, entity) else {
            log::warn!("No audio component for entity {} in scene {}", entity, scene);
            return None;
        };
        let Some(config) = component.sound_config.clone() else {
            log::warn!("Audio component {} has no sound config", entity);
            return None;
        };

        let emitter = Emitter {
            transform: component.source_transform,
            velocity: Vec3::ZERO,
        };
        let callback_component = Arc::clone(&component);
        let callback: CompletionCallback = Box::new(move |_| {
            if callback_component.auto_destroy {
                callback_component.mark_for_destroy();
            }
        });

        let id = self.bind_voice(
            state,
            config,
            0,
            VoiceOwner::Component { scene, entity },
            emitter,
            None,
            Some(callback),
        )?;
        if let Some(voice) = state.voices.get_mut(id) {
            voice.scale_base(component.volume_multiplier, component.pitch_multiplier);
        }
        state.by_component.insert((scene, entity), id);
        Some((id, true))
    }

    /// Play a component's sound from `start_time` seconds
    pub fn play_component(&self, scene: SceneId, entity: EntityId, start_time: f32) -> bool {
        if !self.is_initialized() {
            return false;
        }
        let mut state = lock(&self.pool);
        self.play_component_locked(&mut state, scene, entity, start_time)
    }

    fn play_component_locked(&self, state: &mut PoolState, scene: SceneId, entity: EntityId, start_time: f32) -> bool {
        let Some((id, fresh)) = self.get_sound_for_component(state, scene, entity) else {
            return false;
        };
        let Some(voice) = state.voices.get_mut(id) else {
            return false;
        };
        if start_time > 0.0 {
            voice.seek_to(start_time);
        }
        let played = voice.play();
        if !played && fresh {
            state.by_component.remove(&(scene, entity));
            state.voices.release(id);
        }
        played
    }

    /// Run `f` on a component's voice, if it has one
    pub fn with_component_voice<R>(
        &self,
        scene: SceneId,
        entity: EntityId,
        f: impl FnOnce(&mut Voice) -> R,
    ) -> Option<R> {
        if !self.is_initialized() {
            return None;
        }
        let mut state = lock(&self.pool);
        let id = *state.by_component.get(&(scene, entity))?;
        state.voices.get_mut(id).map(f)
    }

    // ── voices ───────────────────────────────────────────────────────────

    /// Acquire and initialize a voice without starting it
    #[allow(clippy::too_many_arguments)]
    pub(super) fn bind_voice(
        &self,
        state: &mut PoolState,
        config: Arc<SoundConfig>,
        handle: AssetHandle,
        owner: VoiceOwner,
        emitter: Emitter,
        event: Option<EventId>,
        callback: Option<CompletionCallback>,
    ) -> Option<SourceId> {
        let Some(stream) = self.assets.open_stream(&config) else {
            log::warn!("Cannot play asset {}: no data source", config.file_asset);
            return None;
        };

        let acquired = state.voices.acquire()?;
        if let Some(evicted) = acquired.evicted {
            self.detach(state, evicted);
        }

        let voice = state.voices.get_mut(acquired.id)?;
        voice.initialize(config, stream, self.config.sample_rate);
        voice.set_handle(handle);
        voice.set_owner(owner);
        voice.set_event(event);
        voice.set_transform(emitter.transform);
        voice.set_velocity(emitter.velocity);
        if let Some(callback) = callback {
            voice.set_completion_callback(callback);
        }
        voice.update_spatial(&state.listener, self.config.speed_of_sound);
        Some(acquired.id)
    }

    /// Bind and start a voice; the slot is returned if it refuses to play
    pub(super) fn start_voice(
        &self,
        state: &mut PoolState,
        config: Arc<SoundConfig>,
        handle: AssetHandle,
        owner: VoiceOwner,
        emitter: Emitter,
        event: Option<EventId>,
    ) -> Option<SourceId> {
        let id = self.bind_voice(state, config, handle, owner, emitter, event, None)?;
        let played = state.voices.get_mut(id).is_some_and(Voice::play);
        if !played {
            state.voices.release(id);
            return None;
        }
        Some(id)
    }

    /// Remove a voice from every index it appears in
    pub(super) fn detach(&self, state: &mut PoolState, voice: EvictedVoice) {
        match voice.owner {
            VoiceOwner::Component { scene, entity } => {
                if state.by_component.get(&(scene, entity)) == Some(&voice.id) {
                    state.by_component.remove(&(scene, entity));
                }
            }
            VoiceOwner::Object(object) => {
                self.object_sources.remove(object, voice.id);
            }
            VoiceOwner::None => {}
        }

        if let Some(event) = voice.event {
            if !self.events.contains(event) {
                return;
            }
            let emptied = self.events.remove_source(event, voice.id);
            if emptied && !state.pending_events.contains(&event) {
                self.retire_event(event);
            }
        }
    }

    /// Drop an event and its object index entry
    pub(super) fn retire_event(&self, event: EventId) {
        if let Some(info) = self.events.remove(event) {
            self.object_events.remove(info.object_id, event);
        }
    }

    /// Hard-stop a voice, detach it and free its slot
    fn hard_release(&self, state: &mut PoolState, id: SourceId) {
        let Some(voice) = state.voices.get_mut(id) else {
            return;
        };
        voice.stop_now(false, true);
        let detached = EvictedVoice {
            id,
            owner: voice.owner(),
            event: voice.event(),
        };
        self.detach(state, detached);
        state.voices.release(id);
    }

    pub fn active_voice_count(&self) -> usize {
        lock(&self.pool).voices.active_count()
    }

    pub fn voice_state(&self, id: SourceId) -> Option<PlayState> {
        lock(&self.pool).voices.get(id).map(Voice::state)
    }

    // ── global controls ──────────────────────────────────────────────────

    /// Stop every voice: faded, or immediately with `stop_now`
    pub fn stop_all(&self, stop_now: bool) {
        let mut state = lock(&self.pool);
        for voice in state.voices.active_voices_mut() {
            if stop_now {
                voice.stop_now(true, true);
            } else {
                voice.stop();
            }
        }
    }

    pub fn pause_all(&self) {
        let mut state = lock(&self.pool);
        for voice in state.voices.active_voices_mut() {
            voice.pause();
        }
    }

    pub fn resume_all(&self) {
        let mut state = lock(&self.pool);
        for voice in state.voices.active_voices_mut() {
            voice.resume();
        }
    }

    // ── audio thread ─────────────────────────────────────────────────────

    /// Advance the engine by `dt` seconds
    ///
    /// Order: staged updates, listener, voice state, reclamation, deferred
    /// starts. A voice is never recycled mid-update and never receives an
    /// update meant for its previous owner.
    pub fn tick(&self, dt: f32) {
        if !self.is_initialized() {
            return;
        }
        let started = Instant::now();
        let mut state = lock(&self.pool);

        // 1. Staged deltas
        let updates = self.updates.drain();
        if !updates.is_empty() {
            self.apply_updates(&mut state, &updates);
        }

        // 2. Listener
        if let Some(listener) = self.listener.take_changed() {
            state.listener = listener;
        }

        // 3. Voice state
        let speed_of_sound = self.config.speed_of_sound;
        let PoolState { voices, listener, .. } = &mut *state;
        for voice in voices.active_voices_mut() {
            voice.update_spatial(listener, speed_of_sound);
            voice.update(dt);
        }

        // 4. Reclaim finished voices
        for id in state.voices.finished_ids() {
            self.hard_release(&mut state, id);
        }

        // 5. Deferred starts
        let requests = std::mem::take(&mut *lock(&self.starts));
        for request in requests {
            match request {
                StartRequest::Component { scene, entity } => {
                    self.play_component_locked(&mut state, scene, entity, 0.0);
                }
                StartRequest::OneShot { config, transform } => {
                    let emitter = Emitter {
                        transform,
                        velocity: Vec3::ZERO,
                    };
                    self.start_voice(&mut state, config, 0, VoiceOwner::None, emitter, None);
                }
            }
        }

        let active_sounds = state.voices.active_count();
        drop(state);
        self.refresh_stats(active_sounds, started.elapsed().as_secs_f32() * 1000.0);
    }

    fn apply_updates(&self, state: &mut PoolState, updates: &[SourceUpdateData]) {
        for update in updates {
            for voice in state.voices.active_voices_mut() {
                if voice.owner().object_id() == Some(update.object_id) {
                    voice.set_volume_multiplier(update.volume_multiplier);
                    voice.set_pitch_multiplier(update.pitch_multiplier);
                    voice.set_transform(update.transform);
                    voice.set_velocity(update.velocity);
                }
            }
        }

        let mut objects = write_lock(&self.objects);
        for update in updates {
            if let Some(object) = objects.get_mut(&update.object_id) {
                object.transform = update.transform;
                object.velocity = update.velocity;
            }
        }
    }

    fn refresh_stats(&self, active_sounds: usize, frame_time_ms: f32) {
        let stats = EngineStats {
            audio_objects: read_lock(&self.objects).len(),
            active_events: self.events.count(),
            active_sounds,
            total_sources: self.object_sources.total_count(),
            audio_components: self.components.count(ALL_SCENES),
            frame_time_ms,
        };
        *write_lock(&self.stats) = stats;
    }

    /// Mix every audible voice plus the master reverb into `output`
    pub fn render(&self, output: &mut [StereoSample]) {
        output.fill(StereoSample::silence());
        if !self.is_initialized() {
            return;
        }

        let mut mix = lock(&self.mix);
        let sample_rate = self.config.sample_rate;
        let MixBuffers {
            scratch,
            dry,
            wet,
            reverb_out,
        } = &mut *mix;
        let block = scratch.len();

        for chunk in output.chunks_mut(block) {
            let frames = chunk.len();
            dry.as_mut_slice()[..frames].fill(StereoSample::silence());
            wet.as_mut_slice()[..frames].fill(StereoSample::silence());

            let any_active = {
                let mut state = lock(&self.pool);
                let any_active = state.voices.active_count() > 0;
                for voice in state.voices.active_voices_mut() {
                    voice.render(
                        sample_rate,
                        &mut scratch.as_mut_slice()[..frames],
                        &mut dry.as_mut_slice()[..frames],
                        &mut wet.as_mut_slice()[..frames],
                    );
                }
                any_active
            };
            chunk.copy_from_slice(&dry.as_slice()[..frames]);

            let input = any_active.then(|| &wet.as_slice()[..frames]);
            lock(&self.reverb).process(input, reverb_out.as_mut_slice(), frames);
            for (out, tail) in chunk.iter_mut().zip(reverb_out.iter()) {
                *out += *tail;
            }
        }
    }
}

impl std::fmt::Debug for AudioEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AudioEngine")
            .field("initialized", &self.is_initialized())
            .field("config", &self.config)
            .field("stats", &self.stats())
            .finish()
    }
}
