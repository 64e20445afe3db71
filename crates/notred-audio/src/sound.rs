//! Sound configuration and the asset collaborator seam
//!
//! The asset pipeline hands this crate fully resolved [`SoundConfig`]s and
//! opens [`VoiceStream`]s for them; nothing here resolves paths or decodes
//! files. [`MemoryAssets`] is the in-process provider backed by decoded PCM.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use serde::{Deserialize, Serialize};

use crate::registry::{read_lock, write_lock};
use crate::types::{AssetHandle, StereoSample};

/// Default static priority for voices
pub const DEFAULT_PRIORITY: u8 = 64;

/// Distance attenuation curve
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttenuationModel {
    None,
    #[default]
    Inverse,
    Linear,
    Exponential,
}

/// 3D parameters of a sound
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpatializationConfig {
    pub attenuation_model: AttenuationModel,
    pub min_gain: f32,
    pub max_gain: f32,
    pub min_distance: f32,
    pub max_distance: f32,
    /// Full-gain cone, radians
    pub cone_inner_angle: f32,
    /// Outside this cone the gain is `cone_outer_gain`, radians
    pub cone_outer_angle: f32,
    pub cone_outer_gain: f32,
    pub doppler_factor: f32,
    pub rolloff: f32,
}

impl Default for SpatializationConfig {
    fn default() -> Self {
        Self {
            attenuation_model: AttenuationModel::Inverse,
            min_gain: 0.0,
            max_gain: 1.0,
            min_distance: 1.0,
            max_distance: 1000.0,
            cone_inner_angle: std::f32::consts::TAU,
            cone_outer_angle: std::f32::consts::TAU,
            cone_outer_gain: 0.0,
            doppler_factor: 1.0,
            rolloff: 0.6,
        }
    }
}

/// Immutable recipe for starting a voice
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SoundConfig {
    /// Decoded-data handle the stream is opened from
    pub file_asset: AssetHandle,
    pub looping: bool,
    pub volume_multiplier: f32,
    pub pitch_multiplier: f32,
    /// Static eviction priority, 0..=255
    pub priority: u8,
    pub spatialization_enabled: bool,
    pub spatialization: SpatializationConfig,
    /// Send level into the master reverb (0 = dry only)
    pub master_reverb_send: f32,
    /// Normalized lowpass cutoff (1.0 = open)
    pub lp_filter_value: f32,
    /// Normalized highpass cutoff (0.0 = open)
    pub hp_filter_value: f32,
}

impl Default for SoundConfig {
    fn default() -> Self {
        Self {
            file_asset: 0,
            looping: false,
            volume_multiplier: 1.0,
            pitch_multiplier: 1.0,
            priority: DEFAULT_PRIORITY,
            spatialization_enabled: false,
            spatialization: SpatializationConfig::default(),
            master_reverb_send: 0.0,
            lp_filter_value: 1.0,
            hp_filter_value: 0.0,
        }
    }
}

impl SoundConfig {
    /// Config playing `file_asset` with default settings
    pub fn for_asset(file_asset: AssetHandle) -> Self {
        Self {
            file_asset,
            ..Default::default()
        }
    }
}

/// A playable data source bound to one voice
///
/// Implementations are driven only from the audio thread.
pub trait VoiceStream: Send {
    /// Begin (or continue) producing frames from the current cursor
    fn start(&mut self);

    /// Stop producing frames; the cursor is kept
    fn stop(&mut self);

    /// Move the cursor to `frame`
    fn seek(&mut self, frame: u64);

    fn is_playing(&self) -> bool;

    /// Whether a non-looping stream has consumed all of its data
    fn is_at_end(&self) -> bool;

    fn set_looping(&mut self, looping: bool);

    /// Native sample rate of the data
    fn sample_rate(&self) -> u32;

    /// Render into `out`, advancing `step` source frames per output frame
    ///
    /// Returns the number of frames produced; the remainder is silenced.
    fn read(&mut self, out: &mut [StereoSample], step: f64) -> usize;
}

/// Resolves sound handles and opens streams for them
pub trait AssetProvider: Send + Sync {
    /// Look up the config a trigger action's target refers to
    fn sound_config(&self, handle: AssetHandle) -> Option<Arc<SoundConfig>>;

    /// Open a fresh stream for `config.file_asset`
    fn open_stream(&self, config: &SoundConfig) -> Option<Box<dyn VoiceStream>>;
}

/// Stream over decoded PCM shared between voices
pub struct PcmStream {
    data: Arc<[StereoSample]>,
    sample_rate: u32,
    /// Fractional read position in source frames
    cursor: f64,
    playing: bool,
    looping: bool,
    at_end: bool,
}

impl PcmStream {
    pub fn new(data: Arc<[StereoSample]>, sample_rate: u32) -> Self {
        Self {
            data,
            sample_rate,
            cursor: 0.0,
            playing: false,
            looping: false,
            at_end: false,
        }
    }

    /// Current read position in source frames
    pub fn cursor(&self) -> f64 {
        self.cursor
    }

    pub fn len_frames(&self) -> usize {
        self.data.len()
    }

    #[inline]
    fn frame_at(&self, index: usize) -> StereoSample {
        if index < self.data.len() {
            self.data[index]
        } else if self.looping && !self.data.is_empty() {
            self.data[index % self.data.len()]
        } else {
            StereoSample::silence()
        }
    }
}

impl VoiceStream for PcmStream {
    fn start(&mut self) {
        if self.data.is_empty() {
            self.at_end = true;
            return;
        }
        self.at_end = false;
        self.playing = true;
    }

    fn stop(&mut self) {
        self.playing = false;
    }

    fn seek(&mut self, frame: u64) {
        self.cursor = (frame as f64).min(self.data.len() as f64);
        self.at_end = false;
    }

    fn is_playing(&self) -> bool {
        self.playing
    }

    fn is_at_end(&self) -> bool {
        self.at_end
    }

    fn set_looping(&mut self, looping: bool) {
        self.looping = looping;
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn read(&mut self, out: &mut [StereoSample], step: f64) -> usize {
        let len = self.data.len() as f64;
        let mut produced = 0;

        if self.playing {
            for frame in out.iter_mut() {
                if self.cursor >= len {
                    if self.looping && len > 0.0 {
                        self.cursor %= len;
                    } else {
                        self.playing = false;
                        self.at_end = true;
                        break;
                    }
                }

                // Linear interpolation between neighbouring frames
                let index = self.cursor as usize;
                let frac = (self.cursor - index as f64) as f32;
                let a = self.frame_at(index);
                let b = self.frame_at(index + 1);
                *frame = a * (1.0 - frac) + b * frac;

                self.cursor += step;
                produced += 1;
            }
        }

        out[produced..].fill(StereoSample::silence());
        produced
    }
}

/// In-memory asset provider
///
/// Sound configs are registered by handle; PCM data by file asset. Streams
/// opened for the same file share one decoded buffer.
#[derive(Default)]
pub struct MemoryAssets {
    configs: RwLock<HashMap<AssetHandle, Arc<SoundConfig>>>,
    pcm: RwLock<HashMap<AssetHandle, (Arc<[StereoSample]>, u32)>>,
}

impl MemoryAssets {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) a sound config under `handle`
    pub fn insert_config(&self, handle: AssetHandle, config: SoundConfig) {
        write_lock(&self.configs).insert(handle, Arc::new(config));
    }

    /// Register decoded frames for `file_asset`
    pub fn insert_pcm(&self, file_asset: AssetHandle, frames: Vec<StereoSample>, sample_rate: u32) {
        write_lock(&self.pcm).insert(file_asset, (frames.into(), sample_rate));
    }

    pub fn config_count(&self) -> usize {
        read_lock(&self.configs).len()
    }
}

impl AssetProvider for MemoryAssets {
    fn sound_config(&self, handle: AssetHandle) -> Option<Arc<SoundConfig>> {
        read_lock(&self.configs).get(&handle).cloned()
    }

    fn open_stream(&self, config: &SoundConfig) -> Option<Box<dyn VoiceStream>> {
        let pcm = read_lock(&self.pcm);
        let (data, sample_rate) = pcm.get(&config.file_asset)?;
        let mut stream = PcmStream::new(Arc::clone(data), *sample_rate);
        stream.set_looping(config.looping);
        Some(Box::new(stream))
    }
}
