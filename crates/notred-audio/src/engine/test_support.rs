//! Shared fixtures for engine tests

use std::sync::Arc;

use crate::command::{TriggerAction, TriggerCommand};
use crate::config::EngineConfig;
use crate::sound::{MemoryAssets, SoundConfig};
use crate::types::{AssetHandle, StereoSample};

use super::AudioEngine;

pub const RATE: u32 = 48000;
/// One render block
pub const BLOCK: usize = 480;
pub const BLOCK_SECONDS: f32 = BLOCK as f32 / RATE as f32;
pub const TICK: f32 = 0.004;

/// 0.1 s one-shot
pub const BOOM: AssetHandle = 1001;
/// 0.2 s one-shot
pub const RUMBLE: AssetHandle = 1002;
/// Short looping sound
pub const HUM: AssetHandle = 1003;

pub const LEVEL: f32 = 0.25;

pub fn assets() -> Arc<MemoryAssets> {
    let assets = MemoryAssets::new();
    for (handle, file, frames, looping) in [(BOOM, 1, 4800, false), (RUMBLE, 2, 9600, false), (HUM, 3, 480, true)] {
        let mut config = SoundConfig::for_asset(file);
        config.looping = looping;
        assets.insert_config(handle, config);
        assets.insert_pcm(file, vec![StereoSample::mono(LEVEL); frames], RATE);
    }
    Arc::new(assets)
}

/// Engine with `voices` slots and `ExplosionTrigger = [Play(BOOM), Play(RUMBLE)]`
pub fn engine(voices: usize) -> AudioEngine {
    let config = EngineConfig {
        voice_pool_size: voices,
        sample_rate: RATE,
        block_size: BLOCK,
        ..Default::default()
    };
    let engine = AudioEngine::new(config, assets());
    engine.commands().insert_trigger(
        TriggerCommand::new("ExplosionTrigger")
            .with_action(TriggerAction::play(BOOM))
            .with_action(TriggerAction::play(RUMBLE)),
    );
    engine
}

/// Tick then render one block, returning the mix
pub fn step(engine: &AudioEngine) -> Vec<StereoSample> {
    engine.tick(BLOCK_SECONDS);
    let mut out = vec![StereoSample::silence(); BLOCK];
    engine.render(&mut out);
    out
}

/// Step until `done` holds, for at most one simulated second
pub fn run_until(engine: &AudioEngine, mut done: impl FnMut(&AudioEngine) -> bool) -> bool {
    for _ in 0..(RATE as usize / BLOCK) {
        if done(engine) {
            return true;
        }
        step(engine);
    }
    done(engine)
}
