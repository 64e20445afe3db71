//! Freeverb reverb model
//!
//! Jezar's Schroeder/Moorer network: 8 parallel lowpass-feedback comb filters
//! per channel followed by 4 series allpass diffusers. Right-channel taps are
//! offset by [`STEREO_SPREAD`] samples to decorrelate the two outputs.
//!
//! Tap lengths are tuned for 44.1kHz and scaled to the engine sample rate.

/// Gain applied when the model is frozen
pub const MUTED: f32 = 0.0;
/// Input gain into the comb bank
pub const FIXED_GAIN: f32 = 0.015;
pub const SCALE_WET: f32 = 3.0;
pub const SCALE_DRY: f32 = 2.0;
pub const SCALE_DAMP: f32 = 0.4;
pub const SCALE_ROOM: f32 = 0.28;
pub const OFFSET_ROOM: f32 = 0.7;
pub const INITIAL_ROOM: f32 = 0.5;
pub const INITIAL_DAMP: f32 = 0.5;
pub const INITIAL_WET: f32 = 1.0 / SCALE_WET;
pub const INITIAL_DRY: f32 = 0.0;
pub const INITIAL_WIDTH: f32 = 1.0;
pub const INITIAL_MODE: f32 = 0.0;
/// Mode values at or above this freeze the tail
pub const FREEZE_MODE: f32 = 0.5;
/// Right-channel tap offset in samples
pub const STEREO_SPREAD: usize = 23;

/// Comb tap lengths (left channel, 44.1kHz)
const COMB_LENGTHS: [usize; 8] = [1116, 1188, 1277, 1356, 1422, 1491, 1557, 1617];

/// Allpass tap lengths (left channel, 44.1kHz)
const ALLPASS_LENGTHS: [usize; 4] = [556, 441, 341, 225];

const ALLPASS_FEEDBACK: f32 = 0.5;

/// Sample rate the tap lengths were tuned at
const TUNING_SAMPLE_RATE: f64 = 44100.0;

fn scaled_length(length: usize, sample_rate: u32) -> usize {
    ((length as f64 * sample_rate as f64 / TUNING_SAMPLE_RATE).round() as usize).max(1)
}

/// Lowpass-feedback comb filter
#[derive(Debug, Clone)]
pub struct CombFilter {
    buffer: Vec<f32>,
    pos: usize,
    filter_state: f32,
    feedback: f32,
    damp1: f32,
    damp2: f32,
}

impl CombFilter {
    pub fn new(length: usize) -> Self {
        Self {
            buffer: vec![0.0; length.max(1)],
            pos: 0,
            filter_state: 0.0,
            feedback: 0.0,
            damp1: 0.0,
            damp2: 1.0,
        }
    }

    pub fn set_feedback(&mut self, feedback: f32) {
        self.feedback = feedback;
    }

    pub fn set_damp(&mut self, damp: f32) {
        self.damp1 = damp;
        self.damp2 = 1.0 - damp;
    }

    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        let output = self.buffer[self.pos];

        // One-pole lowpass in the feedback path damps high frequencies
        self.filter_state = output * self.damp2 + self.filter_state * self.damp1;

        self.buffer[self.pos] = input + self.filter_state * self.feedback;
        self.pos = (self.pos + 1) % self.buffer.len();

        output
    }

    pub fn reset(&mut self) {
        self.buffer.fill(0.0);
        self.filter_state = 0.0;
    }
}

/// Schroeder allpass diffuser
#[derive(Debug, Clone)]
pub struct AllpassFilter {
    buffer: Vec<f32>,
    pos: usize,
    feedback: f32,
}

impl AllpassFilter {
    pub fn new(length: usize) -> Self {
        Self {
            buffer: vec![0.0; length.max(1)],
            pos: 0,
            feedback: ALLPASS_FEEDBACK,
        }
    }

    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        let buffered = self.buffer[self.pos];
        let output = -input + buffered;
        self.buffer[self.pos] = input + buffered * self.feedback;
        self.pos = (self.pos + 1) % self.buffer.len();
        output
    }

    pub fn reset(&mut self) {
        self.buffer.fill(0.0);
    }
}

/// Stereo Freeverb network with user-scaled parameters
///
/// Setters take user-facing values in `0.0..=1.0` and store the scaled
/// internal coefficients; getters undo the scaling.
#[derive(Debug, Clone)]
pub struct Freeverb {
    combs_l: Vec<CombFilter>,
    combs_r: Vec<CombFilter>,
    allpass_l: Vec<AllpassFilter>,
    allpass_r: Vec<AllpassFilter>,

    gain: f32,
    room_size: f32,
    room_size1: f32,
    damp: f32,
    damp1: f32,
    wet: f32,
    wet1: f32,
    wet2: f32,
    dry: f32,
    width: f32,
    mode: f32,
}

impl Freeverb {
    /// Create a model with the initial tuning at `sample_rate`
    pub fn new(sample_rate: u32) -> Self {
        let combs_l = COMB_LENGTHS
            .iter()
            .map(|&len| CombFilter::new(scaled_length(len, sample_rate)))
            .collect();
        let combs_r = COMB_LENGTHS
            .iter()
            .map(|&len| CombFilter::new(scaled_length(len + STEREO_SPREAD, sample_rate)))
            .collect();
        let allpass_l = ALLPASS_LENGTHS
            .iter()
            .map(|&len| AllpassFilter::new(scaled_length(len, sample_rate)))
            .collect();
        let allpass_r = ALLPASS_LENGTHS
            .iter()
            .map(|&len| AllpassFilter::new(scaled_length(len + STEREO_SPREAD, sample_rate)))
            .collect();

        let mut model = Self {
            combs_l,
            combs_r,
            allpass_l,
            allpass_r,
            gain: FIXED_GAIN,
            room_size: 0.0,
            room_size1: 0.0,
            damp: 0.0,
            damp1: 0.0,
            wet: 0.0,
            wet1: 0.0,
            wet2: 0.0,
            dry: 0.0,
            width: 0.0,
            mode: 0.0,
        };
        model.room_size = INITIAL_ROOM * SCALE_ROOM + OFFSET_ROOM;
        model.damp = INITIAL_DAMP * SCALE_DAMP;
        model.wet = INITIAL_WET * SCALE_WET;
        model.dry = INITIAL_DRY * SCALE_DRY;
        model.width = INITIAL_WIDTH;
        model.mode = INITIAL_MODE;
        model.update();
        model.mute();
        model
    }

    /// Clear all filter history
    pub fn mute(&mut self) {
        if self.mode >= FREEZE_MODE {
            return;
        }
        self.combs_l.iter_mut().for_each(CombFilter::reset);
        self.combs_r.iter_mut().for_each(CombFilter::reset);
        self.allpass_l.iter_mut().for_each(AllpassFilter::reset);
        self.allpass_r.iter_mut().for_each(AllpassFilter::reset);
    }

    /// Recompute derived coefficients after a parameter change
    fn update(&mut self) {
        self.wet1 = self.wet * (self.width / 2.0 + 0.5);
        self.wet2 = self.wet * ((1.0 - self.width) / 2.0);

        if self.mode >= FREEZE_MODE {
            self.room_size1 = 1.0;
            self.damp1 = 0.0;
            self.gain = MUTED;
        } else {
            self.room_size1 = self.room_size;
            self.damp1 = self.damp;
            self.gain = FIXED_GAIN;
        }

        for comb in self.combs_l.iter_mut().chain(self.combs_r.iter_mut()) {
            comb.set_feedback(self.room_size1);
            comb.set_damp(self.damp1);
        }
    }

    pub fn set_room_size(&mut self, value: f32) {
        self.room_size = value * SCALE_ROOM + OFFSET_ROOM;
        self.update();
    }

    pub fn room_size(&self) -> f32 {
        (self.room_size - OFFSET_ROOM) / SCALE_ROOM
    }

    pub fn set_damp(&mut self, value: f32) {
        self.damp = value * SCALE_DAMP;
        self.update();
    }

    pub fn damp(&self) -> f32 {
        self.damp / SCALE_DAMP
    }

    pub fn set_wet(&mut self, value: f32) {
        self.wet = value * SCALE_WET;
        self.update();
    }

    pub fn wet(&self) -> f32 {
        self.wet / SCALE_WET
    }

    pub fn set_dry(&mut self, value: f32) {
        self.dry = value * SCALE_DRY;
    }

    pub fn dry(&self) -> f32 {
        self.dry / SCALE_DRY
    }

    pub fn set_width(&mut self, value: f32) {
        self.width = value;
        self.update();
    }

    pub fn width(&self) -> f32 {
        self.width
    }

    pub fn set_mode(&mut self, value: f32) {
        self.mode = value;
        self.update();
    }

    pub fn mode(&self) -> f32 {
        if self.mode >= FREEZE_MODE {
            1.0
        } else {
            0.0
        }
    }

    /// Whether the tail is currently frozen
    pub fn is_frozen(&self) -> bool {
        self.mode >= FREEZE_MODE
    }

    /// Process one frame, replacing the output
    #[inline]
    pub fn process_frame(&mut self, in_l: f32, in_r: f32) -> (f32, f32) {
        let input = (in_l + in_r) * self.gain;

        let mut out_l = 0.0f32;
        let mut out_r = 0.0f32;

        for comb in &mut self.combs_l {
            out_l += comb.process(input);
        }
        for comb in &mut self.combs_r {
            out_r += comb.process(input);
        }

        for ap in &mut self.allpass_l {
            out_l = ap.process(out_l);
        }
        for ap in &mut self.allpass_r {
            out_r = ap.process(out_r);
        }

        (
            out_l * self.wet1 + out_r * self.wet2 + in_l * self.dry,
            out_r * self.wet1 + out_l * self.wet2 + in_r * self.dry,
        )
    }
}
