//! Master reverb bus node
//!
//! Fixed 2-in/1-out node on the master bus. Every voice feeds it through its
//! splitter's wet send; the node runs continuously so tails keep ringing after
//! all senders stop, and a missing input renders silence.
//!
//! Signal path per channel:
//! ```text
//! input ──► pre-delay (≤ 1 s) ──► 8 × comb (parallel) ──► 4 × allpass (series) ──► wet/dry
//! ```

use crate::dsp::freeverb::{FREEZE_MODE, SCALE_DRY, SCALE_WET};
use crate::dsp::{DelayLine, Freeverb};
use crate::node::{DspNode, NodeFlags, NodeInfo, ParamInfo};
use crate::types::StereoSample;

/// Ceiling for the pre-delay time
pub const MAX_PRE_DELAY_MS: f32 = 1000.0;

/// Pre-delay applied at construction
pub const DEFAULT_PRE_DELAY_MS: f32 = 50.0;

/// Reverb parameters, in parameter-table order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(usize)]
pub enum ReverbParam {
    PreDelay = 0,
    Mode = 1,
    RoomSize = 2,
    Damp = 3,
    Width = 4,
    Wet = 5,
    Dry = 6,
}

impl ReverbParam {
    pub const ALL: [ReverbParam; 7] = [
        ReverbParam::PreDelay,
        ReverbParam::Mode,
        ReverbParam::RoomSize,
        ReverbParam::Damp,
        ReverbParam::Width,
        ReverbParam::Wet,
        ReverbParam::Dry,
    ];

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Display name
    pub fn name(&self) -> &'static str {
        match self {
            ReverbParam::PreDelay => "Pre-delay",
            ReverbParam::Mode => "Mode",
            ReverbParam::RoomSize => "Room size",
            ReverbParam::Damp => "Damping",
            ReverbParam::Width => "Width",
            ReverbParam::Wet => "Wet level",
            ReverbParam::Dry => "Dry level",
        }
    }

    /// Unit label
    pub fn label(&self) -> &'static str {
        match self {
            ReverbParam::PreDelay => "ms",
            ReverbParam::Mode => "mode",
            ReverbParam::RoomSize => "size",
            ReverbParam::Damp | ReverbParam::Width => "%",
            ReverbParam::Wet | ReverbParam::Dry => "dB",
        }
    }

    /// Key used in persisted reverb settings
    pub fn key(&self) -> &'static str {
        match self {
            ReverbParam::PreDelay => "PreDelay",
            ReverbParam::Mode => "Mode",
            ReverbParam::RoomSize => "RoomSize",
            ReverbParam::Damp => "Damp",
            ReverbParam::Width => "Width",
            ReverbParam::Wet => "Wet",
            ReverbParam::Dry => "Dry",
        }
    }
}

/// Master-bus reverb: pre-delay into a Freeverb network
pub struct MasterReverb {
    info: NodeInfo,
    sample_rate: u32,
    pre_delay_l: DelayLine,
    pre_delay_r: DelayLine,
    model: Freeverb,
}

impl MasterReverb {
    pub fn new(sample_rate: u32) -> Self {
        let flags = NodeFlags {
            continuous_processing: true,
            allow_null_input: true,
        };
        let mut info = NodeInfo::new("Master Reverb", 2, 1).with_flags(flags);
        for param in ReverbParam::ALL {
            let (default, max) = match param {
                ReverbParam::PreDelay => (DEFAULT_PRE_DELAY_MS, MAX_PRE_DELAY_MS),
                ReverbParam::Mode => (0.0, 1.0),
                ReverbParam::RoomSize => (crate::dsp::freeverb::INITIAL_ROOM, 1.0),
                ReverbParam::Damp => (crate::dsp::freeverb::INITIAL_DAMP, 1.0),
                ReverbParam::Width => (crate::dsp::freeverb::INITIAL_WIDTH, 1.0),
                ReverbParam::Wet => (crate::dsp::freeverb::INITIAL_WET, 1.0),
                ReverbParam::Dry => (crate::dsp::freeverb::INITIAL_DRY, 1.0),
            };
            info = info.with_param(
                ParamInfo::new(param.name(), default)
                    .with_range(0.0, max)
                    .with_unit(param.label()),
            );
        }

        // One second of history per channel
        let capacity = sample_rate as usize;
        let mut reverb = Self {
            info,
            sample_rate,
            pre_delay_l: DelayLine::new(capacity),
            pre_delay_r: DelayLine::new(capacity),
            model: Freeverb::new(sample_rate),
        };
        reverb.set(ReverbParam::PreDelay, DEFAULT_PRE_DELAY_MS);
        reverb
    }

    /// Set a parameter; out-of-range values are clamped
    pub fn set(&mut self, param: ReverbParam, value: f32) {
        let value = self.info.params[param as usize].clamp(value);
        match param {
            ReverbParam::PreDelay => {
                let samples = (value * self.sample_rate as f32 / 1000.0).round() as usize;
                self.pre_delay_l.set_delay(samples);
                self.pre_delay_r.set_delay(samples);
            }
            ReverbParam::Mode => self.model.set_mode(value),
            ReverbParam::RoomSize => self.model.set_room_size(value),
            ReverbParam::Damp => self.model.set_damp(value),
            ReverbParam::Width => self.model.set_width(value),
            ReverbParam::Wet => self.model.set_wet(value),
            ReverbParam::Dry => self.model.set_dry(value),
        }
    }

    pub fn get(&self, param: ReverbParam) -> f32 {
        match param {
            ReverbParam::PreDelay => self.pre_delay_l.delay_ms(self.sample_rate),
            ReverbParam::Mode => self.model.mode(),
            ReverbParam::RoomSize => self.model.room_size(),
            ReverbParam::Damp => self.model.damp(),
            ReverbParam::Width => self.model.width(),
            ReverbParam::Wet => self.model.wet(),
            ReverbParam::Dry => self.model.dry(),
        }
    }

    /// Formatted value for UI display
    pub fn display(&self, param: ReverbParam) -> String {
        match param {
            ReverbParam::PreDelay => format!("{}", self.get(param).round() as i64),
            ReverbParam::Mode => {
                if self.get(param) >= FREEZE_MODE {
                    "Freeze".to_string()
                } else {
                    "Normal".to_string()
                }
            }
            ReverbParam::RoomSize => format!("{:.2}", self.get(param)),
            ReverbParam::Damp | ReverbParam::Width => {
                format!("{}", (self.get(param) * 100.0) as i64)
            }
            ReverbParam::Wet => gain_db(self.get(param) * SCALE_WET),
            ReverbParam::Dry => gain_db(self.get(param) * SCALE_DRY),
        }
    }

    /// Silence the tail (host suspend/resume)
    pub fn mute(&mut self) {
        self.model.mute();
    }
}

impl DspNode for MasterReverb {
    fn info(&self) -> &NodeInfo {
        &self.info
    }

    fn process(&mut self, input: Option<&[StereoSample]>, output: &mut [StereoSample], frames: usize) {
        let frames = frames.min(output.len());
        let Some(input) = input else {
            output[..frames].fill(StereoSample::silence());
            return;
        };

        let frames = frames.min(input.len());
        for (frame_in, frame_out) in input[..frames].iter().zip(output[..frames].iter_mut()) {
            let delayed_l = self.pre_delay_l.process(frame_in.left);
            let delayed_r = self.pre_delay_r.process(frame_in.right);
            let (l, r) = self.model.process_frame(delayed_l, delayed_r);
            *frame_out = StereoSample::new(l, r);
        }
    }

    fn get_param(&self, index: usize) -> f32 {
        ReverbParam::from_index(index).map_or(0.0, |p| self.get(p))
    }

    fn set_param(&mut self, index: usize, value: f32) {
        if let Some(param) = ReverbParam::from_index(index) {
            self.set(param, value);
        }
    }

    fn param_display(&self, index: usize) -> String {
        ReverbParam::from_index(index)
            .map(|p| self.display(p))
            .unwrap_or_default()
    }

    fn reset(&mut self) {
        self.pre_delay_l.reset();
        self.pre_delay_r.reset();
        self.model.mute();
    }
}

/// Linear gain as decibels for display
fn gain_db(gain: f32) -> String {
    if gain <= 0.0 {
        "-inf".to_string()
    } else {
        format!("{:.1}", 20.0 * gain.log10())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_layout() {
        let reverb = MasterReverb::new(48000);
        let info = reverb.info();
        assert_eq!(info.input_buses, 2);
        assert_eq!(info.output_buses, 1);
        assert!(info.flags.continuous_processing);
        assert!(info.flags.allow_null_input);
        assert_eq!(info.param_count(), 7);
        assert_eq!(info.params[ReverbParam::Damp as usize].name, "Damping");
        assert_eq!(info.params[ReverbParam::Wet as usize].unit, "dB");
    }

    #[test]
    fn test_wet_dry_display_in_decibels() {
        let mut reverb = MasterReverb::new(48000);
        assert_eq!(ReverbParam::Wet.label(), "dB");
        reverb.set(ReverbParam::Wet, 0.5);
        assert_eq!(reverb.display(ReverbParam::Wet), "3.5");

        reverb.set(ReverbParam::Wet, 0.0);
        assert_eq!(reverb.display(ReverbParam::Wet), "-inf");

        reverb.set(ReverbParam::Dry, 0.25);
        assert_eq!(reverb.display(ReverbParam::Dry), "-6.0");
    }

    #[test]
    fn test_null_input_writes_exact_silence() {
        let mut reverb = MasterReverb::new(48000);
        let sentinel = StereoSample::new(9.0, 9.0);
        let mut output = vec![sentinel; 100];

        reverb.process(None, &mut output, 64);

        assert!(output[..64].iter().all(|s| *s == StereoSample::silence()));
        assert!(output[64..].iter().all(|s| *s == sentinel));
    }

    #[test]
    fn test_null_input_leaves_tail_untouched() {
        let mut reverb = MasterReverb::new(48000);
        let mut impulse = vec![StereoSample::silence(); 512];
        impulse[0] = StereoSample::mono(1.0);
        let mut output = vec![StereoSample::silence(); 512];
        reverb.process(Some(&impulse), &mut output, 512);

        // A null block performs no computation, so the tail resumes where it was
        let mut null_out = vec![StereoSample::silence(); 256];
        reverb.process(None, &mut null_out, 256);

        let silence = vec![StereoSample::silence(); 8192];
        let mut tail = vec![StereoSample::silence(); 8192];
        reverb.process(Some(&silence), &mut tail, 8192);
        let energy: f32 = tail.iter().map(|s| s.peak()).sum();
        assert!(energy > 0.0);
    }

    #[test]
    fn test_pre_delay_defaults_and_clamps() {
        let mut reverb = MasterReverb::new(48000);
        assert!((reverb.get(ReverbParam::PreDelay) - 50.0).abs() < 0.05);

        reverb.set(ReverbParam::PreDelay, 5000.0);
        assert!((reverb.get(ReverbParam::PreDelay) - MAX_PRE_DELAY_MS).abs() < 0.05);

        reverb.set(ReverbParam::PreDelay, 120.0);
        assert!((reverb.get_param(ReverbParam::PreDelay as usize) - 120.0).abs() < 0.05);
    }

    #[test]
    fn test_pre_delay_shifts_onset() {
        let sample_rate = 48000;
        let mut reverb = MasterReverb::new(sample_rate);
        reverb.set(ReverbParam::Wet, 0.0);
        reverb.set(ReverbParam::Dry, 0.5);
        reverb.set(ReverbParam::PreDelay, 10.0);

        let mut input = vec![StereoSample::silence(); 1024];
        input[0] = StereoSample::mono(1.0);
        let mut output = vec![StereoSample::silence(); 1024];
        reverb.process(Some(&input), &mut output, 1024);

        let onset = output.iter().position(|s| s.peak() > 0.5);
        assert_eq!(onset, Some(480));
    }

    #[test]
    fn test_mode_display() {
        let mut reverb = MasterReverb::new(48000);
        assert_eq!(reverb.display(ReverbParam::Mode), "Normal");
        reverb.set(ReverbParam::Mode, 0.75);
        assert_eq!(reverb.display(ReverbParam::Mode), "Freeze");
        assert_eq!(reverb.get(ReverbParam::Mode), 1.0);
        assert_eq!(reverb.param_display(ReverbParam::Width as usize), "100");
    }

    #[test]
    fn test_parameters_are_independent() {
        let mut reverb = MasterReverb::new(48000);
        reverb.set(ReverbParam::RoomSize, 0.9);
        reverb.set(ReverbParam::Damp, 0.2);
        reverb.set(ReverbParam::Width, 0.4);
        reverb.set(ReverbParam::Wet, 0.7);
        reverb.set(ReverbParam::Dry, 0.1);

        assert!((reverb.get(ReverbParam::RoomSize) - 0.9).abs() < 1e-5);
        assert!((reverb.get(ReverbParam::Damp) - 0.2).abs() < 1e-5);
        assert!((reverb.get(ReverbParam::Width) - 0.4).abs() < 1e-5);
        assert!((reverb.get(ReverbParam::Wet) - 0.7).abs() < 1e-5);
        assert!((reverb.get(ReverbParam::Dry) - 0.1).abs() < 1e-5);
    }
}
