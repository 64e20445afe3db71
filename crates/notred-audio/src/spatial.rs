//! Listener state and the distance/cone/doppler gain model
//!
//! The game thread writes the listener through [`AudioListener::set`]; the
//! audio thread picks the change up once per tick with
//! [`AudioListener::take_changed`] and spatializes against its own copy.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::RwLock;

use crate::registry::{read_lock, write_lock};
use crate::sound::{AttenuationModel, SpatializationConfig};
use crate::types::{Transform, Vec3};

/// Speed of sound in m/s
pub const SPEED_OF_SOUND: f32 = 343.3;

/// Doppler pitch is kept inside this range
const MIN_DOPPLER_PITCH: f32 = 0.25;
const MAX_DOPPLER_PITCH: f32 = 4.0;

/// Snapshot of the listener used for one tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ListenerState {
    pub transform: Transform,
    pub velocity: Vec3,
    pub cone_inner_angle: f32,
    pub cone_outer_angle: f32,
    pub cone_outer_gain: f32,
}

impl Default for ListenerState {
    fn default() -> Self {
        Self {
            transform: Transform::default(),
            velocity: Vec3::ZERO,
            cone_inner_angle: std::f32::consts::TAU,
            cone_outer_angle: std::f32::consts::TAU,
            cone_outer_gain: 0.0,
        }
    }
}

/// Cross-thread listener with a change flag
#[derive(Debug, Default)]
pub struct AudioListener {
    state: RwLock<ListenerState>,
    changed: AtomicBool,
}

impl AudioListener {
    pub fn new() -> Self {
        Self::default()
    }

    /// Move the listener (game thread)
    pub fn set(&self, transform: Transform, velocity: Vec3) {
        {
            let mut state = write_lock(&self.state);
            state.transform = transform;
            state.velocity = velocity;
        }
        self.changed.store(true, Ordering::Release);
    }

    /// Set the listener's directional cone (angles in radians)
    pub fn set_cone(&self, inner_angle: f32, outer_angle: f32, outer_gain: f32) {
        {
            let mut state = write_lock(&self.state);
            state.cone_inner_angle = inner_angle;
            state.cone_outer_angle = outer_angle;
            state.cone_outer_gain = outer_gain;
        }
        self.changed.store(true, Ordering::Release);
    }

    pub fn has_changed(&self) -> bool {
        self.changed.load(Ordering::Acquire)
    }

    /// Consume the change flag, returning the new state if it was set
    pub fn take_changed(&self) -> Option<ListenerState> {
        if self.changed.swap(false, Ordering::AcqRel) {
            Some(self.snapshot())
        } else {
            None
        }
    }

    pub fn snapshot(&self) -> ListenerState {
        *read_lock(&self.state)
    }
}

/// Per-voice result of spatialization
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpatialParams {
    /// Combined attenuation and cone gain
    pub gain: f32,
    /// -1.0 (left) ..= 1.0 (right)
    pub pan: f32,
    /// Doppler pitch factor
    pub pitch: f32,
}

impl SpatialParams {
    /// Unspatialized voice
    pub const FLAT: SpatialParams = SpatialParams {
        gain: 1.0,
        pan: 0.0,
        pitch: 1.0,
    };

    /// Constant-power left/right gains for `pan`
    pub fn pan_gains(&self) -> (f32, f32) {
        let angle = (self.pan.clamp(-1.0, 1.0) + 1.0) * std::f32::consts::FRAC_PI_4;
        (angle.cos(), angle.sin())
    }
}

/// Distance attenuation for `distance` under `config`
pub fn attenuation(config: &SpatializationConfig, distance: f32) -> f32 {
    let min = config.min_distance.max(f32::EPSILON);
    let max = config.max_distance.max(min);
    let d = distance.clamp(min, max);

    let gain = match config.attenuation_model {
        AttenuationModel::None => 1.0,
        AttenuationModel::Inverse => min / (min + config.rolloff * (d - min)),
        AttenuationModel::Linear => {
            if max > min {
                1.0 - config.rolloff * (d - min) / (max - min)
            } else {
                1.0
            }
        }
        AttenuationModel::Exponential => (d / min).powf(-config.rolloff),
    };

    let (lo, hi) = gain_bounds(config);
    gain.max(lo).min(hi)
}

/// Ordered `(min_gain, max_gain)`; non-finite bounds fall back to `0.0..=1.0`
fn gain_bounds(config: &SpatializationConfig) -> (f32, f32) {
    let lo = if config.min_gain.is_finite() { config.min_gain } else { 0.0 };
    let hi = if config.max_gain.is_finite() { config.max_gain } else { 1.0 };
    (lo.min(hi), lo.max(hi))
}

/// Gain of a directional cone for a target at `direction` (unit) from an
/// emitter facing `forward`
pub fn cone_gain(forward: Vec3, direction: Vec3, inner_angle: f32, outer_angle: f32, outer_gain: f32) -> f32 {
    if inner_angle >= std::f32::consts::TAU {
        return 1.0;
    }
    let forward = forward.normalize_or_zero();
    if forward == Vec3::ZERO || direction == Vec3::ZERO {
        return 1.0;
    }

    let cutoff_inner = (inner_angle * 0.5).cos();
    let cutoff_outer = (outer_angle * 0.5).cos();
    let d = forward.dot(direction);

    if d > cutoff_inner {
        1.0
    } else if d > cutoff_outer && cutoff_inner > cutoff_outer {
        let t = (d - cutoff_outer) / (cutoff_inner - cutoff_outer);
        outer_gain + (1.0 - outer_gain) * t
    } else {
        outer_gain
    }
}

/// Spatialize a source against the listener
pub fn spatialize(
    config: &SpatializationConfig,
    source: &Transform,
    source_velocity: Vec3,
    listener: &ListenerState,
    speed_of_sound: f32,
) -> SpatialParams {
    let offset = source.position - listener.transform.position;
    let distance = offset.length();
    let to_source = offset.normalize_or_zero();

    let mut gain = attenuation(config, distance);
    gain *= cone_gain(
        source.orientation,
        -to_source,
        config.cone_inner_angle,
        config.cone_outer_angle,
        config.cone_outer_gain,
    );
    gain *= cone_gain(
        listener.transform.orientation,
        to_source,
        listener.cone_inner_angle,
        listener.cone_outer_angle,
        listener.cone_outer_gain,
    );

    let right = listener
        .transform
        .orientation
        .cross(listener.transform.up)
        .normalize_or_zero();
    let pan = to_source.dot(right).clamp(-1.0, 1.0);

    let pitch = doppler_pitch(
        to_source,
        listener.velocity,
        source_velocity,
        speed_of_sound,
        config.doppler_factor,
    );

    SpatialParams { gain, pan, pitch }
}

/// Doppler shift for a listener→source direction `to_source` (unit)
fn doppler_pitch(to_source: Vec3, listener_velocity: Vec3, source_velocity: Vec3, speed_of_sound: f32, factor: f32) -> f32 {
    if factor <= 0.0 || to_source == Vec3::ZERO || speed_of_sound <= 0.0 {
        return 1.0;
    }
    // Closing speeds along the line of sight
    let listener_closing = listener_velocity.dot(to_source) * factor;
    let source_closing = -source_velocity.dot(to_source) * factor;

    let denominator = (speed_of_sound - source_closing).max(speed_of_sound * 0.01);
    ((speed_of_sound + listener_closing) / denominator).clamp(MIN_DOPPLER_PITCH, MAX_DOPPLER_PITCH)
}
