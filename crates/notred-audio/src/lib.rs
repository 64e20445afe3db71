//! NotRed Audio - real-time playback core for the NotRed engine
//!
//! Voice pool with priority eviction, the per-voice playback state machine,
//! cross-thread event registries, the declarative trigger system and the
//! master reverb bus.

pub mod audio;
pub mod command;
pub mod component;
pub mod config;
pub mod dsp;
pub mod engine;
pub mod node;
pub mod playback;
pub mod pool;
pub mod registry;
pub mod reverb;
pub mod sound;
pub mod spatial;
pub mod types;
pub mod voice;

pub use engine::AudioEngine;
pub use playback::AudioPlayback;
pub use types::*;
