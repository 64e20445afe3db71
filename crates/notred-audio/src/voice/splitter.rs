//! Per-voice dry/wet splitter
//!
//! Output 0 feeds the master bus at unit gain; output 1 feeds the master
//! reverb at the voice's send level.

use crate::types::StereoSample;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VoiceSplitter {
    reverb_send: f32,
}

impl Default for VoiceSplitter {
    fn default() -> Self {
        Self { reverb_send: 0.0 }
    }
}

impl VoiceSplitter {
    /// Dry path gain, fixed
    pub const DRY_GAIN: f32 = 1.0;

    pub fn new(reverb_send: f32) -> Self {
        Self {
            reverb_send: reverb_send.clamp(0.0, 1.0),
        }
    }

    pub fn set_reverb_send(&mut self, send: f32) {
        self.reverb_send = send.clamp(0.0, 1.0);
    }

    pub fn reverb_send(&self) -> f32 {
        self.reverb_send
    }

    /// Accumulate `frames` into the dry and reverb buses
    ///
    /// Returns whether anything was sent to the reverb.
    pub fn mix_into(&self, frames: &[StereoSample], dry: &mut [StereoSample], wet: &mut [StereoSample]) -> bool {
        for (out, frame) in dry.iter_mut().zip(frames) {
            *out += *frame * Self::DRY_GAIN;
        }
        if self.reverb_send <= 0.0 {
            return false;
        }
        for (out, frame) in wet.iter_mut().zip(frames) {
            *out += *frame * self.reverb_send;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_send_is_dry_only() {
        let splitter = VoiceSplitter::default();
        let frames = [StereoSample::mono(0.5); 4];
        let mut dry = [StereoSample::silence(); 4];
        let mut wet = [StereoSample::silence(); 4];

        assert!(!splitter.mix_into(&frames, &mut dry, &mut wet));
        assert_eq!(dry[0], StereoSample::mono(0.5));
        assert_eq!(wet[0], StereoSample::silence());
    }

    #[test]
    fn test_send_scales_wet_only() {
        let splitter = VoiceSplitter::new(0.25);
        let frames = [StereoSample::mono(1.0); 2];
        let mut dry = [StereoSample::mono(1.0); 2];
        let mut wet = [StereoSample::silence(); 2];

        assert!(splitter.mix_into(&frames, &mut dry, &mut wet));
        assert_eq!(dry[1], StereoSample::mono(2.0));
        assert_eq!(wet[1], StereoSample::mono(0.25));
    }
}
