//! Voice: one pooled playback instance
//!
//! A voice owns a decoded stream, a fader and the per-voice DSP chain
//! (filter, splitter). Its play state advances only in [`Voice::update`],
//! which the engine calls once per tick; commands (`play`, `stop`, `pause`)
//! start transitions but never block on them.
//!
//! ```text
//! Stopped ──play──▶ Starting ──stream running──▶ Playing ──end of data──▶ Stopped
//!                                                   │ pause        │ stop
//!                                                   ▼              ▼
//!                  Paused ◀──fade done── Pausing   Stopping ──fade done──▶ Stopped
//! ```

mod fader;
mod splitter;

pub use fader::Fader;
pub use splitter::VoiceSplitter;

use std::sync::Arc;

use crate::dsp::VoiceFilter;
use crate::sound::{SoundConfig, VoiceStream, DEFAULT_PRIORITY};
use crate::spatial::{spatialize, ListenerState, SpatialParams};
use crate::types::{AssetHandle, EntityId, EventId, ObjectId, SceneId, SourceId, StereoSample, Transform, Vec3};

/// Length of the stop/pause fade-out in milliseconds
pub const STOPPING_FADE_MS: f32 = 28.0;

/// Resume fade-in, half the stop fade
const RESUME_FADE_MS: f32 = STOPPING_FADE_MS * 0.5;

/// Remaining fade time below which a fade counts as done (seconds)
const FADE_EPSILON: f32 = 1e-6;

/// Voice play state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PlayState {
    #[default]
    Stopped,
    Starting,
    Playing,
    Pausing,
    Paused,
    Stopping,
    /// Reserved; never entered
    FadingOut,
    /// Reserved; never entered
    FadingIn,
}

impl PlayState {
    pub const ALL: [PlayState; 8] = [
        PlayState::Stopped,
        PlayState::Starting,
        PlayState::Playing,
        PlayState::Pausing,
        PlayState::Paused,
        PlayState::Stopping,
        PlayState::FadingOut,
        PlayState::FadingIn,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PlayState::Stopped => "Stopped",
            PlayState::Starting => "Starting",
            PlayState::Playing => "Playing",
            PlayState::Pausing => "Pausing",
            PlayState::Paused => "Paused",
            PlayState::Stopping => "Stopping",
            PlayState::FadingOut => "FadingOut",
            PlayState::FadingIn => "FadingIn",
        }
    }
}

impl std::fmt::Display for PlayState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Who started a voice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum VoiceOwner {
    #[default]
    None,
    /// An entity's audio component
    Component { scene: SceneId, entity: EntityId },
    /// An audio object (trigger or one-shot)
    Object(ObjectId),
}

impl VoiceOwner {
    /// Object ID that source updates address this voice by
    pub fn object_id(&self) -> Option<ObjectId> {
        match *self {
            VoiceOwner::None => None,
            VoiceOwner::Component { entity, .. } => Some(entity),
            VoiceOwner::Object(id) => Some(id),
        }
    }
}

/// Invoked with the voice's ID when it finishes or is hard-stopped
pub type CompletionCallback = Box<dyn FnMut(SourceId) + Send>;

pub struct Voice {
    id: SourceId,
    state: PlayState,
    fade_timer: f32,
    fader: Fader,
    /// Fader value captured by `pause`, restored on resume
    stored_fader: f32,
    priority: u8,
    looping: bool,
    finished: bool,
    stream: Option<Box<dyn VoiceStream>>,
    on_complete: Option<CompletionCallback>,

    config: Option<Arc<SoundConfig>>,
    /// Handle the sound config was resolved from (0 for inline configs)
    handle: AssetHandle,
    owner: VoiceOwner,
    event: Option<EventId>,
    base_volume: f32,
    base_pitch: f32,
    volume_multiplier: f32,
    pitch_multiplier: f32,
    transform: Transform,
    velocity: Vec3,
    spatial: SpatialParams,
    filter: VoiceFilter,
    splitter: VoiceSplitter,
}

impl std::fmt::Debug for Voice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Voice")
            .field("id", &self.id)
            .field("state", &self.state)
            .field("fader", &self.fader.volume())
            .field("priority", &self.priority)
            .field("finished", &self.finished)
            .field("owner", &self.owner)
            .finish()
    }
}

impl Voice {
    pub fn new(id: SourceId) -> Self {
        Self {
            id,
            state: PlayState::Stopped,
            fade_timer: 0.0,
            fader: Fader::new(),
            stored_fader: 1.0,
            priority: DEFAULT_PRIORITY,
            looping: false,
            finished: false,
            stream: None,
            on_complete: None,
            config: None,
            handle: 0,
            owner: VoiceOwner::None,
            event: None,
            base_volume: 1.0,
            base_pitch: 1.0,
            volume_multiplier: 1.0,
            pitch_multiplier: 1.0,
            transform: Transform::default(),
            velocity: Vec3::ZERO,
            spatial: SpatialParams::FLAT,
            filter: VoiceFilter::open(),
            splitter: VoiceSplitter::default(),
        }
    }

    /// Bind a sound to this voice, resetting all playback state
    pub fn initialize(&mut self, config: Arc<SoundConfig>, mut stream: Box<dyn VoiceStream>, engine_sample_rate: u32) {
        stream.set_looping(config.looping);
        self.state = PlayState::Stopped;
        self.fade_timer = 0.0;
        self.fader.jump_to(1.0);
        self.stored_fader = 1.0;
        self.priority = config.priority;
        self.looping = config.looping;
        self.finished = false;
        self.base_volume = config.volume_multiplier;
        self.base_pitch = config.pitch_multiplier;
        self.volume_multiplier = 1.0;
        self.pitch_multiplier = 1.0;
        self.spatial = SpatialParams::FLAT;
        self.filter = VoiceFilter::new(config.lp_filter_value, config.hp_filter_value, engine_sample_rate);
        self.splitter = VoiceSplitter::new(config.master_reverb_send);
        self.stream = Some(stream);
        self.config = Some(config);
    }

    /// Drop everything bound to this voice so its slot can be reused
    pub fn release(&mut self) {
        if let Some(stream) = self.stream.as_mut() {
            stream.stop();
        }
        *self = Voice::new(self.id);
    }

    pub fn set_completion_callback(&mut self, callback: CompletionCallback) {
        self.on_complete = Some(callback);
    }

    pub fn set_owner(&mut self, owner: VoiceOwner) {
        self.owner = owner;
    }

    pub fn set_event(&mut self, event: Option<EventId>) {
        self.event = event;
    }

    pub fn set_handle(&mut self, handle: AssetHandle) {
        self.handle = handle;
    }

    /// Component volume/pitch, folded into the sound's own multipliers
    pub fn scale_base(&mut self, volume: f32, pitch: f32) {
        self.base_volume *= volume;
        self.base_pitch *= pitch;
    }

    // ── queries ──────────────────────────────────────────────────────────

    pub fn id(&self) -> SourceId {
        self.id
    }

    pub fn state(&self) -> PlayState {
        self.state
    }

    pub fn owner(&self) -> VoiceOwner {
        self.owner
    }

    pub fn event(&self) -> Option<EventId> {
        self.event
    }

    pub fn config(&self) -> Option<&Arc<SoundConfig>> {
        self.config.as_ref()
    }

    /// Sound handle this voice was started from
    pub fn handle(&self) -> AssetHandle {
        self.handle
    }

    pub fn priority(&self) -> u8 {
        self.priority
    }

    pub fn is_looping(&self) -> bool {
        self.looping
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// True in every state that can still produce sound
    pub fn is_playing(&self) -> bool {
        matches!(
            self.state,
            PlayState::Starting | PlayState::Playing | PlayState::Pausing | PlayState::Stopping
        )
    }

    pub fn is_stopping(&self) -> bool {
        self.state == PlayState::Stopping
    }

    pub fn fade_volume(&self) -> f32 {
        self.fader.volume()
    }

    /// Eviction score: lower is evicted first
    pub fn priority_score(&self) -> f32 {
        self.fader.volume() * self.priority as f32 / 255.0
    }

    // ── commands ─────────────────────────────────────────────────────────

    /// Start or restart playback
    ///
    /// Returns false if nothing is bound or the state refuses the command.
    pub fn play(&mut self) -> bool {
        if self.stream.is_none() {
            log::warn!("Voice {} has no stream bound, cannot play", self.id);
            return false;
        }

        match self.state {
            PlayState::Stopped => {
                self.fader.jump_to(1.0);
                self.start_stream();
            }
            PlayState::Starting => {}
            PlayState::Playing | PlayState::Pausing => {
                self.stop_now(false, false);
                self.start_stream();
            }
            PlayState::Paused => {
                let resume_to = self.stored_fader;
                self.fader.fade(0.0, resume_to, RESUME_FADE_MS / 1000.0);
                self.start_stream();
            }
            PlayState::Stopping => {
                self.stop_now(false, true);
                self.start_stream();
            }
            PlayState::FadingOut | PlayState::FadingIn => return false,
        }
        true
    }

    fn start_stream(&mut self) {
        if let Some(stream) = self.stream.as_mut() {
            stream.start();
        }
        self.finished = false;
        self.state = PlayState::Starting;
    }

    fn begin_fade_out(&mut self) {
        let duration = STOPPING_FADE_MS / 1000.0;
        self.fade_timer = duration;
        self.fader.fade_to(0.0, duration);
    }

    /// Begin a fade-out that ends in `Stopped`
    pub fn stop(&mut self) -> bool {
        match self.state {
            PlayState::Stopped => return false,
            PlayState::Starting => {
                self.stop_now(false, false);
                self.state = PlayState::Stopping;
            }
            PlayState::Playing => {
                self.begin_fade_out();
                self.state = PlayState::Stopping;
            }
            PlayState::Pausing | PlayState::Paused => {
                self.stop_now(false, true);
                self.fade_timer = 0.0;
                self.finished = false;
                self.state = PlayState::Stopping;
            }
            PlayState::Stopping => self.stop_now(true, true),
            PlayState::FadingOut | PlayState::FadingIn => return false,
        }
        true
    }

    /// Continue a paused (or pausing) voice
    pub fn resume(&mut self) -> bool {
        match self.state {
            PlayState::Paused | PlayState::Pausing => self.play(),
            _ => false,
        }
    }

    /// Begin a fade-out that ends in `Paused`; only valid while playing
    pub fn pause(&mut self) -> bool {
        if self.state != PlayState::Playing {
            return false;
        }
        self.stored_fader = self.fader.volume();
        self.begin_fade_out();
        self.state = PlayState::Pausing;
        true
    }

    /// Hard stop
    ///
    /// With `reset`, the stream rewinds and the voice becomes `Stopped` and
    /// finished. With `notify`, the completion callback runs.
    pub fn stop_now(&mut self, notify: bool, reset: bool) {
        if let Some(stream) = self.stream.as_mut() {
            stream.stop();
            if reset {
                stream.seek(0);
            }
        }
        if reset {
            self.finished = true;
            self.state = PlayState::Stopped;
        }
        self.fader.jump_to(1.0);

        if notify {
            let id = self.id;
            if let Some(callback) = self.on_complete.as_mut() {
                callback(id);
            }
        }
    }

    /// Clear looping so the sound ends at its next natural end
    pub fn break_loop(&mut self) {
        self.looping = false;
        if let Some(stream) = self.stream.as_mut() {
            stream.set_looping(false);
        }
    }

    /// Rewind to the first frame without changing state
    pub fn seek_to_start(&mut self) {
        if let Some(stream) = self.stream.as_mut() {
            stream.seek(0);
        }
    }

    /// Jump `seconds` into the sound
    pub fn seek_to(&mut self, seconds: f32) {
        if let Some(stream) = self.stream.as_mut() {
            let frame = seconds.max(0.0) as f64 * stream.sample_rate() as f64;
            stream.seek(frame as u64);
        }
    }

    // ── per-tick parameters ──────────────────────────────────────────────

    pub fn set_volume_multiplier(&mut self, volume: f32) {
        self.volume_multiplier = volume.max(0.0);
    }

    pub fn set_pitch_multiplier(&mut self, pitch: f32) {
        self.pitch_multiplier = pitch.max(0.0);
    }

    pub fn set_transform(&mut self, transform: Transform) {
        self.transform = transform;
    }

    pub fn transform(&self) -> &Transform {
        &self.transform
    }

    pub fn set_velocity(&mut self, velocity: Vec3) {
        self.velocity = velocity;
    }

    pub fn spatial(&self) -> SpatialParams {
        self.spatial
    }

    /// Recompute distance gain, pan and Doppler against the listener
    pub fn update_spatial(&mut self, listener: &ListenerState, speed_of_sound: f32) {
        self.spatial = match self.config.as_ref() {
            Some(config) if config.spatialization_enabled => spatialize(
                &config.spatialization,
                &self.transform,
                self.velocity,
                listener,
                speed_of_sound,
            ),
            _ => SpatialParams::FLAT,
        };
    }

    /// Advance fades and state transitions by `dt` seconds
    pub fn update(&mut self, dt: f32) {
        self.fade_timer = (self.fade_timer - dt).max(0.0);
        self.fader.advance(dt);
        let fade_done = self.fade_timer <= FADE_EPSILON;

        match self.state {
            PlayState::Starting => {
                let (running, ended) = self
                    .stream
                    .as_ref()
                    .map_or((false, true), |s| (s.is_playing(), s.is_at_end()));
                if running {
                    self.state = PlayState::Playing;
                } else if ended {
                    log::debug!("Voice {} stream ended before it started", self.id);
                    self.stop_now(true, true);
                }
            }
            PlayState::Playing => {
                if self.stream.as_ref().map_or(true, |s| s.is_at_end()) {
                    self.stop_now(true, true);
                }
            }
            PlayState::Pausing if fade_done => {
                self.stop_now(false, false);
                self.state = PlayState::Paused;
            }
            PlayState::Stopping if fade_done => self.stop_now(true, true),
            _ => {}
        }
    }

    /// Render `scratch.len()` frames, adding the dry signal to `dry` and the
    /// reverb send to `wet`
    ///
    /// Returns whether anything reached the reverb bus.
    pub fn render(
        &mut self,
        engine_sample_rate: u32,
        scratch: &mut [StereoSample],
        dry: &mut [StereoSample],
        wet: &mut [StereoSample],
    ) -> bool {
        let Some(stream) = self.stream.as_mut() else {
            return false;
        };
        if !stream.is_playing() || engine_sample_rate == 0 {
            return false;
        }

        let pitch = (self.base_pitch * self.pitch_multiplier * self.spatial.pitch) as f64;
        let step = pitch * stream.sample_rate() as f64 / engine_sample_rate as f64;
        let produced = stream.read(scratch, step);
        if produced == 0 {
            return false;
        }

        let frames = &mut scratch[..produced];
        self.filter.process(frames);

        let gain = self.base_volume * self.volume_multiplier * self.fader.volume() * self.spatial.gain;
        let spatialized = self.config.as_ref().is_some_and(|c| c.spatialization_enabled);
        if spatialized {
            let (left, right) = self.spatial.pan_gains();
            for frame in frames.iter_mut() {
                let mono = (frame.left + frame.right) * 0.5 * gain;
                *frame = StereoSample::new(mono * left, mono * right);
            }
        } else {
            for frame in frames.iter_mut() {
                *frame = *frame * gain;
            }
        }

        self.splitter.mix_into(frames, dry, wet)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sound::PcmStream;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const RATE: u32 = 48000;
    const TICK: f32 = 0.004;

    fn voice_with(frames: usize, looping: bool) -> Voice {
        let mut config = SoundConfig::for_asset(7);
        config.looping = looping;
        let data: Arc<[StereoSample]> = vec![StereoSample::mono(0.5); frames].into();
        let mut voice = Voice::new(1);
        voice.initialize(Arc::new(config), Box::new(PcmStream::new(data, RATE)), RATE);
        voice
    }

    fn render_block(voice: &mut Voice, frames: usize) -> Vec<StereoSample> {
        let mut scratch = vec![StereoSample::silence(); frames];
        let mut dry = vec![StereoSample::silence(); frames];
        let mut wet = vec![StereoSample::silence(); frames];
        voice.render(RATE, &mut scratch, &mut dry, &mut wet);
        dry
    }

    fn playing_voice() -> Voice {
        let mut voice = voice_with(RATE as usize, true);
        assert!(voice.play());
        voice.update(TICK);
        assert_eq!(voice.state(), PlayState::Playing);
        voice
    }

    fn counting_callback(voice: &mut Voice) -> Arc<AtomicUsize> {
        let count = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&count);
        voice.set_completion_callback(Box::new(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        }));
        count
    }

    #[test]
    fn test_play_starts_then_plays() {
        let mut voice = voice_with(1024, false);
        assert_eq!(voice.state(), PlayState::Stopped);
        assert!(voice.play());
        assert_eq!(voice.state(), PlayState::Starting);
        assert!(voice.is_playing());
        voice.update(TICK);
        assert_eq!(voice.state(), PlayState::Playing);
    }

    #[test]
    fn test_play_without_stream_fails() {
        let mut voice = Voice::new(3);
        assert!(!voice.play());
        assert_eq!(voice.state(), PlayState::Stopped);
    }

    #[test]
    fn test_stop_reaches_stopped_after_fade_and_not_before() {
        let mut voice = playing_voice();
        let completed = counting_callback(&mut voice);

        assert!(voice.stop());
        assert_eq!(voice.state(), PlayState::Stopping);

        // 24 ms: still fading
        for _ in 0..6 {
            voice.update(TICK);
        }
        assert_eq!(voice.state(), PlayState::Stopping);
        assert!(!voice.is_finished());
        assert_eq!(completed.load(Ordering::SeqCst), 0);

        // 28 ms
        voice.update(TICK);
        assert_eq!(voice.state(), PlayState::Stopped);
        assert!(voice.is_finished());
        assert_eq!(completed.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_stop_fades_volume_down() {
        let mut voice = playing_voice();
        voice.stop();
        voice.update(STOPPING_FADE_MS / 2000.0);
        assert!((voice.fade_volume() - 0.5).abs() < 1e-3);
        assert!(voice.priority_score() < DEFAULT_PRIORITY as f32 / 255.0);
    }

    #[test]
    fn test_pause_and_resume() {
        let mut voice = playing_voice();
        assert!(voice.pause());
        assert_eq!(voice.state(), PlayState::Pausing);
        for _ in 0..7 {
            voice.update(TICK);
        }
        assert_eq!(voice.state(), PlayState::Paused);
        assert!(!voice.is_finished());
        assert!(!voice.is_playing());

        // Paused voices render nothing
        assert_eq!(render_block(&mut voice, 16)[0], StereoSample::silence());

        assert!(voice.play());
        assert_eq!(voice.state(), PlayState::Starting);
        assert_eq!(voice.fade_volume(), 0.0);
        voice.update(RESUME_FADE_MS / 1000.0);
        assert_eq!(voice.state(), PlayState::Playing);
        assert!((voice.fade_volume() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_pause_only_from_playing() {
        let mut voice = voice_with(1024, false);
        assert!(!voice.pause());
        voice.play();
        assert!(!voice.pause());
        assert_eq!(voice.state(), PlayState::Starting);
    }

    #[test]
    fn test_stop_from_paused_notifies_once() {
        let mut voice = playing_voice();
        let completed = counting_callback(&mut voice);
        voice.pause();
        for _ in 0..7 {
            voice.update(TICK);
        }
        assert!(voice.stop());
        assert_eq!(voice.state(), PlayState::Stopping);
        assert!(!voice.is_finished());

        voice.update(TICK);
        assert_eq!(voice.state(), PlayState::Stopped);
        assert!(voice.is_finished());
        assert_eq!(completed.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_natural_end_finishes_and_notifies() {
        let mut voice = voice_with(100, false);
        let completed = counting_callback(&mut voice);
        voice.play();
        voice.update(TICK);

        let out = render_block(&mut voice, 128);
        assert_eq!(out[99], StereoSample::mono(0.5));
        assert_eq!(out[100], StereoSample::silence());

        voice.update(TICK);
        assert_eq!(voice.state(), PlayState::Stopped);
        assert!(voice.is_finished());
        assert_eq!(completed.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_break_loop_lets_sound_end() {
        let mut voice = voice_with(64, true);
        voice.play();
        voice.update(TICK);
        render_block(&mut voice, 256);
        voice.update(TICK);
        assert_eq!(voice.state(), PlayState::Playing);

        voice.break_loop();
        assert!(!voice.is_looping());
        render_block(&mut voice, 256);
        voice.update(TICK);
        assert_eq!(voice.state(), PlayState::Stopped);
    }

    #[test]
    fn test_restart_from_playing() {
        let mut voice = playing_voice();
        let completed = counting_callback(&mut voice);
        assert!(voice.play());
        assert_eq!(voice.state(), PlayState::Starting);
        assert_eq!(completed.load(Ordering::SeqCst), 0);
        voice.update(TICK);
        assert_eq!(voice.state(), PlayState::Playing);
    }

    #[test]
    fn test_every_state_accepts_every_command() {
        let reachable = |voice: &Voice| {
            !matches!(voice.state(), PlayState::FadingIn | PlayState::FadingOut)
        };

        // Drive a voice into each reachable state
        let into = |state: PlayState| {
            let mut voice = voice_with(RATE as usize, true);
            match state {
                PlayState::Stopped => {}
                PlayState::Starting => {
                    voice.play();
                }
                PlayState::Playing => {
                    voice.play();
                    voice.update(TICK);
                }
                PlayState::Pausing | PlayState::Paused => {
                    voice.play();
                    voice.update(TICK);
                    voice.pause();
                    if state == PlayState::Paused {
                        voice.update(0.1);
                    }
                }
                PlayState::Stopping => {
                    voice.play();
                    voice.update(TICK);
                    voice.stop();
                }
                PlayState::FadingIn | PlayState::FadingOut => unreachable!(),
            }
            assert_eq!(voice.state(), state);
            voice
        };

        let states = [
            PlayState::Stopped,
            PlayState::Starting,
            PlayState::Playing,
            PlayState::Pausing,
            PlayState::Paused,
            PlayState::Stopping,
        ];
        for state in states {
            for command in 0..3 {
                let mut voice = into(state);
                match command {
                    0 => voice.play(),
                    1 => voice.stop(),
                    _ => voice.pause(),
                };
                assert!(reachable(&voice), "{} + command {}", state, command);

                // Every transition settles
                for _ in 0..25 {
                    voice.update(TICK);
                }
                assert!(
                    matches!(voice.state(), PlayState::Stopped | PlayState::Playing | PlayState::Paused),
                    "{} + command {} settled in {}",
                    state,
                    command,
                    voice.state()
                );
            }
        }
    }

    #[test]
    fn test_reserved_states_refuse_commands() {
        let mut voice = voice_with(16, false);
        for state in [PlayState::FadingIn, PlayState::FadingOut] {
            voice.state = state;
            assert!(!voice.play());
            assert!(!voice.stop());
            assert!(!voice.pause());
            assert_eq!(voice.state(), state);
        }
    }

    #[test]
    fn test_volume_and_send_reach_buses() {
        let mut config = SoundConfig::for_asset(1);
        config.volume_multiplier = 0.5;
        config.master_reverb_send = 0.5;
        let data: Arc<[StereoSample]> = vec![StereoSample::mono(1.0); 64].into();
        let mut voice = Voice::new(2);
        voice.initialize(Arc::new(config), Box::new(PcmStream::new(data, RATE)), RATE);
        voice.set_volume_multiplier(0.5);
        voice.play();

        let mut scratch = vec![StereoSample::silence(); 8];
        let mut dry = vec![StereoSample::silence(); 8];
        let mut wet = vec![StereoSample::silence(); 8];
        assert!(voice.render(RATE, &mut scratch, &mut dry, &mut wet));
        assert!((dry[4].left - 0.25).abs() < 1e-6);
        assert!((wet[4].left - 0.125).abs() < 1e-6);
    }

    #[test]
    fn test_release_clears_binding() {
        let mut voice = playing_voice();
        voice.set_owner(VoiceOwner::Object(9));
        voice.set_event(Some(EventId(4)));
        voice.release();
        assert_eq!(voice.id(), 1);
        assert_eq!(voice.state(), PlayState::Stopped);
        assert_eq!(voice.owner(), VoiceOwner::None);
        assert_eq!(voice.event(), None);
        assert!(voice.config().is_none());
    }
}
