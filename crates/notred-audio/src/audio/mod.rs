//! Output backends for the NotRed engine
//!
//! The engine itself never touches a device. A backend owns the platform
//! stream and, once per device callback, advances the engine by the
//! callback's duration and renders into the device buffer:
//!
//! ```text
//! ┌──────────────────┐  triggers, updates   ┌─────────────────────┐
//! │   Game Thread    │─────────────────────►│    AudioEngine      │
//! └──────────────────┘                      │  (Arc, own locks)   │
//!                                           └──────────┬──────────┘
//!                                                      │ tick + render
//!                                           ┌──────────▼──────────┐
//!                                           │  CPAL Audio Thread  │
//!                                           └─────────────────────┘
//! ```

mod error;

#[cfg(feature = "cpal-backend")]
mod cpal_backend;

pub use error::{AudioError, AudioResult};

#[cfg(feature = "cpal-backend")]
pub use cpal_backend::{start_output, OutputHandle};

use crate::types::StereoSample;

/// Largest device callback the backends pre-allocate for
pub const MAX_CALLBACK_FRAMES: usize = 8192;

/// Copy stereo frames into an interleaved device buffer
///
/// Channels past the second are silenced; frames beyond `samples` are
/// silent.
pub fn interleave(samples: &[StereoSample], data: &mut [f32], channels: usize) {
    if channels == 0 {
        return;
    }
    for (i, frame) in data.chunks_mut(channels).enumerate() {
        match samples.get(i) {
            Some(sample) => {
                frame[0] = sample.left;
                if channels > 1 {
                    frame[1] = sample.right;
                }
                for ch in frame.iter_mut().skip(2) {
                    *ch = 0.0;
                }
            }
            None => frame.fill(0.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interleave_stereo() {
        let samples = [StereoSample::new(0.1, 0.2), StereoSample::new(0.3, 0.4)];
        let mut data = [9.0; 4];
        interleave(&samples, &mut data, 2);
        assert_eq!(data, [0.1, 0.2, 0.3, 0.4]);
    }

    #[test]
    fn test_interleave_extra_channels_and_short_input() {
        let samples = [StereoSample::new(0.5, -0.5)];
        let mut data = [9.0; 8];
        interleave(&samples, &mut data, 4);
        assert_eq!(data, [0.5, -0.5, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_interleave_mono_takes_left() {
        let samples = [StereoSample::new(0.7, 0.1)];
        let mut data = [0.0; 1];
        interleave(&samples, &mut data, 1);
        assert_eq!(data, [0.7]);
    }
}
