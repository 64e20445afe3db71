//! Engine configuration
//!
//! [`EngineConfig`] is read once at startup through the generic YAML loader.
//! Every field has a default, so partial documents are fine:
//!
//! ```yaml
//! voice_pool_size: 32
//! sample_rate: 48000
//! MasterReverb:
//!   room_size: 0.7
//!   wet: 0.4
//! ```

mod io;
mod paths;

pub use io::{load_config, save_config};
pub use paths::{default_command_registry_path, default_config_dir, default_config_path};

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::reverb::{MasterReverb, ReverbParam, DEFAULT_PRE_DELAY_MS};
use crate::spatial::SPEED_OF_SOUND;
use crate::types::{DEFAULT_SAMPLE_RATE, PCM_FRAME_CHUNK_SIZE};

/// Default number of pooled voices
pub const DEFAULT_VOICE_POOL_SIZE: usize = 32;

/// Persisted master reverb settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReverbSettings {
    /// Pre-delay in milliseconds (clamped to 1000)
    pub pre_delay_ms: f32,
    pub room_size: f32,
    pub damp: f32,
    pub width: f32,
    pub wet: f32,
    pub dry: f32,
    /// >= 0.5 freezes the tail
    pub mode: f32,
}

impl Default for ReverbSettings {
    fn default() -> Self {
        Self {
            pre_delay_ms: DEFAULT_PRE_DELAY_MS,
            room_size: 0.5,
            damp: 0.5,
            width: 1.0,
            wet: 1.0 / 3.0,
            dry: 0.0,
            mode: 0.0,
        }
    }
}

impl ReverbSettings {
    /// (parameter, value) pairs in node parameter order
    pub fn values(&self) -> [(ReverbParam, f32); 7] {
        [
            (ReverbParam::PreDelay, self.pre_delay_ms),
            (ReverbParam::Mode, self.mode),
            (ReverbParam::RoomSize, self.room_size),
            (ReverbParam::Damp, self.damp),
            (ReverbParam::Width, self.width),
            (ReverbParam::Wet, self.wet),
            (ReverbParam::Dry, self.dry),
        ]
    }

    /// Push every setting into the node
    pub fn apply(&self, reverb: &mut MasterReverb) {
        for (param, value) in self.values() {
            log::debug!("MasterReverb {} = {}", param.key(), value);
            reverb.set(param, value);
        }
    }
}

/// Top-level engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Number of voices allocated at startup
    pub voice_pool_size: usize,
    /// Mix rate in Hz
    pub sample_rate: u32,
    /// Frames rendered per internal block
    pub block_size: usize,
    /// Meters per second, used for Doppler
    pub speed_of_sound: f32,
    #[serde(rename = "MasterReverb")]
    pub master_reverb: ReverbSettings,
    /// Trigger document loaded at startup, if any
    pub command_registry_path: Option<PathBuf>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            voice_pool_size: DEFAULT_VOICE_POOL_SIZE,
            sample_rate: DEFAULT_SAMPLE_RATE,
            block_size: PCM_FRAME_CHUNK_SIZE,
            speed_of_sound: SPEED_OF_SOUND,
            master_reverb: ReverbSettings::default(),
            command_registry_path: None,
        }
    }
}
