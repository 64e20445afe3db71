//! Common types for the NotRed audio core
//!
//! Stereo sample/buffer handling, 3D transforms and the opaque IDs that every
//! registry stores instead of references.

use std::ops::{Index, IndexMut};

use serde::{Deserialize, Serialize};

/// Default engine sample rate (48kHz)
pub const DEFAULT_SAMPLE_RATE: u32 = 48000;

/// Frames rendered per engine block when the host doesn't dictate one
pub const PCM_FRAME_CHUNK_SIZE: usize = 1024;

/// Audio sample type
pub type Sample = f32;

/// Pool slot index of a voice
pub type SourceId = u32;

/// Gameplay object (emitter) identifier; entity UUIDs double as object IDs
pub type ObjectId = u64;

/// Scene identifier; `0` addresses every scene in bulk operations
pub type SceneId = u64;

/// Entity identifier inside a scene
pub type EntityId = u64;

/// Handle to a fully resolved sound asset; `0` means "no asset"
pub type AssetHandle = u64;

/// One execution instance of a trigger against one object
///
/// `EventId(0)` is the null event returned when nothing was posted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EventId(pub u32);

impl EventId {
    /// The null event
    pub const NONE: EventId = EventId(0);

    /// Whether this is a real event
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.0 != 0
    }
}

impl std::fmt::Display for EventId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A single stereo sample (left and right channels)
///
/// `#[repr(C)]` keeps the layout `[left, right]` so slices cast to
/// interleaved `f32` with bytemuck.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct StereoSample {
    pub left: Sample,
    pub right: Sample,
}

impl StereoSample {
    /// Create a new stereo sample
    #[inline]
    pub fn new(left: Sample, right: Sample) -> Self {
        Self { left, right }
    }

    /// Create a silent stereo sample
    #[inline]
    pub fn silence() -> Self {
        Self::default()
    }

    /// Create a mono sample (same value in both channels)
    #[inline]
    pub fn mono(value: Sample) -> Self {
        Self { left: value, right: value }
    }

    /// Get the peak amplitude (max of abs(left), abs(right))
    #[inline]
    pub fn peak(&self) -> Sample {
        self.left.abs().max(self.right.abs())
    }
}

impl std::ops::Add for StereoSample {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Self {
            left: self.left + other.left,
            right: self.right + other.right,
        }
    }
}

impl std::ops::AddAssign for StereoSample {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.left += other.left;
        self.right += other.right;
    }
}

impl std::ops::Mul<Sample> for StereoSample {
    type Output = Self;

    #[inline]
    fn mul(self, factor: Sample) -> Self {
        Self {
            left: self.left * factor,
            right: self.right * factor,
        }
    }
}

/// A buffer of stereo samples
///
/// Pre-allocated once at engine init and resized within capacity on the
/// audio thread, so the render path never allocates.
#[derive(Debug, Clone, Default)]
pub struct StereoBuffer {
    samples: Vec<StereoSample>,
}

impl StereoBuffer {
    /// Create an empty buffer with the specified capacity (in stereo samples)
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            samples: Vec::with_capacity(capacity),
        }
    }

    /// Create a buffer filled with silence
    pub fn silence(len: usize) -> Self {
        Self {
            samples: vec![StereoSample::silence(); len],
        }
    }

    /// Number of stereo samples in the buffer
    #[inline]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Set the working length of a pre-allocated buffer
    ///
    /// Newly exposed elements are silent. Growing past capacity allocates,
    /// which debug builds flag.
    #[inline]
    pub fn set_len_from_capacity(&mut self, new_len: usize) {
        debug_assert!(
            new_len <= self.samples.capacity(),
            "set_len_from_capacity called with len > capacity"
        );
        self.samples.resize(new_len, StereoSample::silence());
    }

    #[inline]
    pub fn as_slice(&self) -> &[StereoSample] {
        &self.samples
    }

    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [StereoSample] {
        &mut self.samples
    }

    /// View as interleaved `[L, R, L, R, ...]`
    #[inline]
    pub fn as_interleaved(&self) -> &[Sample] {
        bytemuck::cast_slice(&self.samples)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, StereoSample> {
        self.samples.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, StereoSample> {
        self.samples.iter_mut()
    }
}

impl Index<usize> for StereoBuffer {
    type Output = StereoSample;

    #[inline]
    fn index(&self, index: usize) -> &Self::Output {
        &self.samples[index]
    }
}

impl IndexMut<usize> for StereoBuffer {
    #[inline]
    fn index_mut(&mut self, index: usize) -> &mut Self::Output {
        &mut self.samples[index]
    }
}

pub use glam::Vec3;

/// World-space placement of an emitter or the listener
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub position: Vec3,
    /// Forward direction
    pub orientation: Vec3,
    pub up: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            orientation: Vec3::new(0.0, 0.0, -1.0),
            up: Vec3::new(0.0, 1.0, 0.0),
        }
    }
}

impl Transform {
    /// Transform at `position` with the default facing
    pub fn at(position: Vec3) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }
}
