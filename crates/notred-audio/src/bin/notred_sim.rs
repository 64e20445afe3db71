//! NotRed audio simulator
//!
//! Loads an engine config, a trigger document and a sound bank, posts one
//! trigger on a simulated object and renders the result, either offline to
//! a WAV file or live through the default output device.
//!
//! ## Command line flags
//!
//! - `--config <path>`: engine config (default `~/.config/notred/audio.yaml`)
//! - `--commands <path>`: trigger document (default from the engine config)
//! - `--bank <path>`: sound bank YAML (required)
//! - `--trigger <name>`: trigger to post (default `ExplosionTrigger`)
//! - `--object <id>`: object to post on (default 1)
//! - `--seconds <n>`: how long to render (default 2)
//! - `--out <path>`: output WAV (default `notred-sim.wav`)
//! - `--play`: play live instead of writing a file (needs `cpal-backend`)
//!
//! A sound bank maps handles to WAV files:
//!
//! ```yaml
//! sounds:
//!   - handle: 1001
//!     path: sounds/boom.wav
//!     config:
//!       priority: 128
//!       master_reverb_send: 0.3
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{anyhow, bail, Context, Result};
use serde::{Deserialize, Serialize};

use notred_audio::command::CommandId;
use notred_audio::config::{self, EngineConfig};
use notred_audio::sound::{MemoryAssets, SoundConfig};
use notred_audio::{AssetHandle, AudioEngine, ObjectId, StereoSample, Transform};

/// One playable sound: a WAV file plus the config handed to voices
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct BankEntry {
    handle: AssetHandle,
    path: PathBuf,
    #[serde(default)]
    config: SoundConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct SoundBank {
    sounds: Vec<BankEntry>,
}

#[derive(Debug)]
struct Args {
    config: Option<PathBuf>,
    commands: Option<PathBuf>,
    bank: PathBuf,
    trigger: String,
    object: ObjectId,
    seconds: f32,
    out: PathBuf,
    play: bool,
}

impl Args {
    fn parse() -> Result<Self> {
        let mut config = None;
        let mut commands = None;
        let mut bank = None;
        let mut trigger = "ExplosionTrigger".to_string();
        let mut object = 1;
        let mut seconds = 2.0;
        let mut out = PathBuf::from("notred-sim.wav");
        let mut play = false;

        let mut args = std::env::args().skip(1);
        while let Some(arg) = args.next() {
            let mut value = || args.next().ok_or_else(|| anyhow!("{} needs a value", arg));
            match arg.as_str() {
                "--config" => config = Some(PathBuf::from(value()?)),
                "--commands" => commands = Some(PathBuf::from(value()?)),
                "--bank" => bank = Some(PathBuf::from(value()?)),
                "--trigger" => trigger = value()?,
                "--object" => object = value()?.parse().context("--object expects an integer")?,
                "--seconds" => seconds = value()?.parse().context("--seconds expects a number")?,
                "--out" => out = PathBuf::from(value()?),
                "--play" => play = true,
                other => bail!("Unknown argument: {}", other),
            }
        }

        Ok(Self {
            config,
            commands,
            bank: bank.ok_or_else(|| anyhow!("--bank <path> is required"))?,
            trigger,
            object,
            seconds,
            out,
            play,
        })
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let args = Args::parse()?;
    log::info!("notred-sim starting up");

    let config_path = args.config.clone().unwrap_or_else(config::default_config_path);
    let engine_config: EngineConfig = config::load_config(&config_path);

    let bank_dir = args.bank.parent().unwrap_or_else(|| Path::new("."));
    let bank: SoundBank = serde_yaml::from_str(
        &std::fs::read_to_string(&args.bank)
            .with_context(|| format!("Failed to read sound bank: {:?}", args.bank))?,
    )
    .with_context(|| format!("Failed to parse sound bank: {:?}", args.bank))?;
    let assets = load_bank(&bank, bank_dir)?;
    log::info!("Loaded {} sounds", assets.config_count());

    let engine = Arc::new(AudioEngine::new(engine_config, Arc::new(assets)));

    let commands_path = args
        .commands
        .clone()
        .or_else(|| engine.config().command_registry_path.clone())
        .unwrap_or_else(config::default_command_registry_path);
    let loaded = engine
        .commands()
        .load(&commands_path)
        .with_context(|| format!("Failed to load triggers from {:?}", commands_path))?;
    log::info!("Loaded {} triggers from {:?}", loaded, commands_path);

    engine.initialize_audio_object(args.object, "SimObject", Transform::default());
    let event = engine.post_trigger(CommandId::from_name(&args.trigger), args.object);
    if !event.is_valid() {
        bail!("Trigger {:?} did not start", args.trigger);
    }
    println!("Posted {} on object {} as event {}", args.trigger, args.object, event);

    if args.play {
        play_live(&engine, args.seconds)?;
    } else {
        let frames = render_offline(&engine, args.seconds);
        write_wav(&args.out, &frames, engine.sample_rate())?;
        println!("Wrote {:.2}s to {:?}", args.seconds, args.out);
    }

    println!("{}", engine.stats());
    engine.shutdown();
    Ok(())
}

/// Decode every bank entry into an in-memory provider
fn load_bank(bank: &SoundBank, dir: &Path) -> Result<MemoryAssets> {
    let assets = MemoryAssets::new();
    for entry in &bank.sounds {
        let path = dir.join(&entry.path);
        let (frames, sample_rate) = decode_wav(&path)?;
        let mut config = entry.config.clone();
        if config.file_asset == 0 {
            config.file_asset = entry.handle;
        }
        log::debug!("Sound {} -> {:?} ({} frames)", entry.handle, path, frames.len());
        assets.insert_pcm(config.file_asset, frames, sample_rate);
        assets.insert_config(entry.handle, config);
    }
    Ok(assets)
}

fn decode_wav(path: &Path) -> Result<(Vec<StereoSample>, u32)> {
    let mut reader = hound::WavReader::open(path).with_context(|| format!("Failed to load WAV: {:?}", path))?;
    let spec = reader.spec();

    let samples: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Int => {
            let scale = int_sample_scale(spec.bits_per_sample)
                .with_context(|| format!("Unsupported WAV: {:?}", path))?;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 * scale))
                .collect::<Result<_, _>>()?
        }
        hound::SampleFormat::Float => reader.samples::<f32>().collect::<Result<_, _>>()?,
    };

    let channels = spec.channels as usize;
    let frames = match channels {
        0 => bail!("WAV has no channels: {:?}", path),
        1 => samples.into_iter().map(StereoSample::mono).collect(),
        _ => samples
            .chunks_exact(channels)
            .map(|frame| StereoSample::new(frame[0], frame[1]))
            .collect(),
    };
    Ok((frames, spec.sample_rate))
}

/// Factor mapping signed integer samples of `bits` width onto -1.0..1.0
fn int_sample_scale(bits: u16) -> Result<f32> {
    let Some(shift) = bits.checked_sub(1).filter(|&shift| shift < 32) else {
        bail!("Unsupported bit depth: {}", bits);
    };
    Ok(1.0 / (1u64 << shift) as f32)
}

/// Tick and render block by block, as a device callback would
fn render_offline(engine: &AudioEngine, seconds: f32) -> Vec<StereoSample> {
    let sample_rate = engine.sample_rate();
    let block = engine.config().block_size.max(1);
    let total = (seconds.max(0.0) * sample_rate as f32) as usize;

    let mut output = vec![StereoSample::silence(); total];
    for chunk in output.chunks_mut(block) {
        engine.tick(chunk.len() as f32 / sample_rate as f32);
        engine.render(chunk);
    }
    output
}

fn write_wav(path: &Path, frames: &[StereoSample], sample_rate: u32) -> Result<()> {
    use hound::{SampleFormat, WavSpec, WavWriter};

    let spec = WavSpec {
        channels: 2,
        sample_rate,
        bits_per_sample: 32,
        sample_format: SampleFormat::Float,
    };
    let mut writer = WavWriter::create(path, spec).with_context(|| format!("Failed to create {:?}", path))?;
    for &sample in bytemuck::cast_slice::<StereoSample, f32>(frames) {
        writer.write_sample(sample)?;
    }
    writer.finalize()?;
    Ok(())
}

#[cfg(feature = "cpal-backend")]
fn play_live(engine: &Arc<AudioEngine>, seconds: f32) -> Result<()> {
    let handle = notred_audio::audio::start_output(Arc::clone(engine))?;
    println!(
        "Playing at {}Hz (~{:.1}ms latency)",
        handle.sample_rate(),
        handle.latency_ms()
    );
    std::thread::sleep(std::time::Duration::from_secs_f32(seconds.max(0.0)));
    Ok(())
}

#[cfg(not(feature = "cpal-backend"))]
fn play_live(_engine: &Arc<AudioEngine>, _seconds: f32) -> Result<()> {
    bail!("--play needs the cpal-backend feature")
}
