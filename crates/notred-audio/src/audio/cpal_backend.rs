//! CPAL output backend
//!
//! Opens the default output device at the engine's sample rate and drives
//! the engine from the device callback: each callback ticks the engine by
//! the callback's duration, renders into a pre-allocated buffer and
//! interleaves the result into the device buffer.

use std::sync::Arc;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{BufferSize as CpalBufferSize, SampleFormat, Stream, StreamConfig};

use super::error::{AudioError, AudioResult};
use super::{interleave, MAX_CALLBACK_FRAMES};
use crate::engine::AudioEngine;
use crate::types::StereoBuffer;

/// Keeps the output stream alive; drop it to stop audio
pub struct OutputHandle {
    _stream: Stream,
    sample_rate: u32,
    buffer_size: u32,
}

impl OutputHandle {
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Requested buffer size in frames
    pub fn buffer_size(&self) -> u32 {
        self.buffer_size
    }

    /// One-way output latency in milliseconds
    pub fn latency_ms(&self) -> f32 {
        (self.buffer_size as f32 / self.sample_rate as f32) * 1000.0
    }
}

/// Open the default output device and start driving `engine`
pub fn start_output(engine: Arc<AudioEngine>) -> AudioResult<OutputHandle> {
    let device = cpal::default_host()
        .default_output_device()
        .ok_or_else(|| AudioError::NoDefaultDevice("No default output device".to_string()))?;

    let device_name = device.name().unwrap_or_else(|_| "Unknown".to_string());
    log::info!("Using audio device: {}", device_name);

    let sample_rate = engine.sample_rate();
    let buffer_size = (engine.config().block_size as u32).clamp(64, MAX_CALLBACK_FRAMES as u32);
    let supported = get_output_config(&device, sample_rate)?;

    let stream_config = StreamConfig {
        channels: supported.channels(),
        sample_rate: supported.sample_rate(),
        buffer_size: CpalBufferSize::Fixed(buffer_size),
    };

    log::info!(
        "Audio config: {} channels, {}Hz, {} frames (~{:.1}ms latency)",
        stream_config.channels,
        sample_rate,
        buffer_size,
        (buffer_size as f32 / sample_rate as f32) * 1000.0
    );

    let stream = build_output_stream(&device, &stream_config, engine)?;
    stream
        .play()
        .map_err(|e| AudioError::StreamPlayError(e.to_string()))?;

    log::info!("Audio stream started");

    Ok(OutputHandle {
        _stream: stream,
        sample_rate,
        buffer_size,
    })
}

/// Pick an f32 stereo config that runs at `sample_rate`
fn get_output_config(device: &cpal::Device, sample_rate: u32) -> AudioResult<cpal::SupportedStreamConfig> {
    let supported_configs: Vec<_> = device
        .supported_output_configs()
        .map_err(|e| AudioError::ConfigError(e.to_string()))?
        .collect();

    if supported_configs.is_empty() {
        return Err(AudioError::ConfigError(
            "No supported output configurations".to_string(),
        ));
    }

    let in_range = |c: &&cpal::SupportedStreamConfigRange| {
        sample_rate >= c.min_sample_rate().0 && sample_rate <= c.max_sample_rate().0
    };

    let best_config = supported_configs
        .iter()
        .filter(in_range)
        .find(|c| c.sample_format() == SampleFormat::F32 && c.channels() >= 2)
        .or_else(|| {
            supported_configs
                .iter()
                .filter(in_range)
                .find(|c| c.sample_format() == SampleFormat::F32)
        })
        .ok_or(AudioError::UnsupportedSampleRate(sample_rate))?;

    Ok(best_config.clone().with_sample_rate(cpal::SampleRate(sample_rate)))
}

fn build_output_stream(
    device: &cpal::Device,
    config: &StreamConfig,
    engine: Arc<AudioEngine>,
) -> AudioResult<Stream> {
    let channels = config.channels as usize;
    let sample_rate = config.sample_rate.0 as f32;
    let mut buffer = StereoBuffer::silence(MAX_CALLBACK_FRAMES);

    let stream = device
        .build_output_stream(
            config,
            move |data: &mut [f32], _info: &cpal::OutputCallbackInfo| {
                let n_frames = (data.len() / channels.max(1)).min(MAX_CALLBACK_FRAMES);
                buffer.set_len_from_capacity(n_frames);

                engine.tick(n_frames as f32 / sample_rate);
                engine.render(buffer.as_mut_slice());

                interleave(buffer.as_slice(), data, channels);
            },
            move |err| {
                log::error!("Audio stream error: {}", err);
            },
            None,
        )
        .map_err(|e| AudioError::StreamBuildError(e.to_string()))?;

    Ok(stream)
}
