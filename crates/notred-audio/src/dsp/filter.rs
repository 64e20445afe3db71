//! Per-voice lowpass/highpass filter pair
//!
//! Sounds carry normalized cutoffs (`lp = 1.0` and `hp = 0.0` mean "open").
//! The normalized value maps exponentially onto 20Hz..20kHz and drives a
//! two-pole state-variable filter per stage.

use crate::types::StereoSample;

const MIN_CUTOFF_HZ: f32 = 20.0;
const MAX_CUTOFF_HZ: f32 = 20000.0;
/// Butterworth response
const DEFAULT_Q: f32 = 0.707;

/// Map a normalized cutoff in `0.0..=1.0` to Hz
pub fn normalized_to_hz(value: f32) -> f32 {
    let value = value.clamp(0.0, 1.0);
    MIN_CUTOFF_HZ * (MAX_CUTOFF_HZ / MIN_CUTOFF_HZ).powf(value)
}

/// Two-pole (12dB/octave) state-variable filter
#[derive(Debug, Clone, Default)]
struct SvfFilter {
    ic1eq_l: f32,
    ic2eq_l: f32,
    ic1eq_r: f32,
    ic2eq_r: f32,
    k: f32,
    a1: f32,
    a2: f32,
    a3: f32,
}

impl SvfFilter {
    fn new(cutoff: f32, sample_rate: u32) -> Self {
        let mut f = Self::default();
        f.set_cutoff(cutoff, sample_rate);
        f
    }

    fn set_cutoff(&mut self, cutoff: f32, sample_rate: u32) {
        // Stay clear of Nyquist where tan() blows up
        let nyquist_guard = sample_rate as f32 * 0.49;
        let cutoff = cutoff.clamp(MIN_CUTOFF_HZ, MAX_CUTOFF_HZ.min(nyquist_guard));

        let g = (std::f32::consts::PI * cutoff / sample_rate as f32).tan();
        self.k = 1.0 / DEFAULT_Q;
        self.a1 = 1.0 / (1.0 + g * (g + self.k));
        self.a2 = g * self.a1;
        self.a3 = g * self.a2;
    }

    /// Process one frame, returning (lowpass, highpass)
    #[inline]
    fn process(&mut self, input: StereoSample) -> (StereoSample, StereoSample) {
        let v3_l = input.left - self.ic2eq_l;
        let v1_l = self.a1 * self.ic1eq_l + self.a2 * v3_l;
        let v2_l = self.ic2eq_l + self.a2 * self.ic1eq_l + self.a3 * v3_l;
        self.ic1eq_l = 2.0 * v1_l - self.ic1eq_l;
        self.ic2eq_l = 2.0 * v2_l - self.ic2eq_l;

        let v3_r = input.right - self.ic2eq_r;
        let v1_r = self.a1 * self.ic1eq_r + self.a2 * v3_r;
        let v2_r = self.ic2eq_r + self.a2 * self.ic1eq_r + self.a3 * v3_r;
        self.ic1eq_r = 2.0 * v1_r - self.ic1eq_r;
        self.ic2eq_r = 2.0 * v2_r - self.ic2eq_r;

        let low = StereoSample::new(v2_l, v2_r);
        let high = StereoSample::new(
            input.left - self.k * v1_l - v2_l,
            input.right - self.k * v1_r - v2_r,
        );
        (low, high)
    }

    fn reset(&mut self) {
        self.ic1eq_l = 0.0;
        self.ic2eq_l = 0.0;
        self.ic1eq_r = 0.0;
        self.ic2eq_r = 0.0;
    }
}

/// Lowpass followed by highpass, each bypassed while fully open
#[derive(Debug, Clone)]
pub struct VoiceFilter {
    lowpass: Option<SvfFilter>,
    highpass: Option<SvfFilter>,
}

impl VoiceFilter {
    /// Build from normalized cutoffs
    pub fn new(lp_value: f32, hp_value: f32, sample_rate: u32) -> Self {
        let lowpass = (lp_value < 1.0).then(|| SvfFilter::new(normalized_to_hz(lp_value), sample_rate));
        let highpass = (hp_value > 0.0).then(|| SvfFilter::new(normalized_to_hz(hp_value), sample_rate));
        Self { lowpass, highpass }
    }

    /// A filter that passes everything untouched
    pub fn open() -> Self {
        Self {
            lowpass: None,
            highpass: None,
        }
    }

    /// Whether both stages are bypassed
    pub fn is_open(&self) -> bool {
        self.lowpass.is_none() && self.highpass.is_none()
    }

    /// Filter a block in place
    pub fn process(&mut self, frames: &mut [StereoSample]) {
        if self.is_open() {
            return;
        }
        for frame in frames.iter_mut() {
            let mut sample = *frame;
            if let Some(lp) = self.lowpass.as_mut() {
                sample = lp.process(sample).0;
            }
            if let Some(hp) = self.highpass.as_mut() {
                sample = hp.process(sample).1;
            }
            *frame = sample;
        }
    }

    pub fn reset(&mut self) {
        if let Some(lp) = self.lowpass.as_mut() {
            lp.reset();
        }
        if let Some(hp) = self.highpass.as_mut() {
            hp.reset();
        }
    }
}

impl Default for VoiceFilter {
    fn default() -> Self {
        Self::open()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sine(freq: f32, frames: usize, sample_rate: u32) -> Vec<StereoSample> {
        (0..frames)
            .map(|i| {
                let v = (2.0 * std::f32::consts::PI * freq * i as f32 / sample_rate as f32).sin();
                StereoSample::mono(v)
            })
            .collect()
    }

    fn rms(frames: &[StereoSample]) -> f32 {
        (frames.iter().map(|s| s.left * s.left).sum::<f32>() / frames.len() as f32).sqrt()
    }

    #[test]
    fn test_cutoff_mapping() {
        assert!((normalized_to_hz(0.0) - 20.0).abs() < 1e-3);
        assert!((normalized_to_hz(1.0) - 20000.0).abs() < 1.0);
        assert!(normalized_to_hz(0.5) > 500.0 && normalized_to_hz(0.5) < 800.0);
    }

    #[test]
    fn test_open_filter_is_transparent() {
        let mut filter = VoiceFilter::new(1.0, 0.0, 48000);
        assert!(filter.is_open());
        let input = sine(1000.0, 256, 48000);
        let mut output = input.clone();
        filter.process(&mut output);
        assert_eq!(input, output);
    }

    #[test]
    fn test_lowpass_attenuates_highs() {
        let mut filter = VoiceFilter::new(0.3, 0.0, 48000);
        let mut block = sine(10000.0, 4800, 48000);
        filter.process(&mut block);
        assert!(rms(&block[2400..]) < 0.05);
    }

    #[test]
    fn test_highpass_attenuates_lows() {
        let mut filter = VoiceFilter::new(1.0, 0.7, 48000);
        let mut block = sine(50.0, 9600, 48000);
        filter.process(&mut block);
        assert!(rms(&block[4800..]) < 0.05);
    }
}
