//! DSP primitives
//!
//! - [`DelayLine`]: fixed-capacity circular delay (reverb pre-delay)
//! - [`Freeverb`]: comb/allpass reverb network with its tuning constants
//! - [`VoiceFilter`]: per-voice LP/HP cutoff stage

pub mod delay_line;
pub mod filter;
pub mod freeverb;

pub use delay_line::DelayLine;
pub use filter::VoiceFilter;
pub use freeverb::{AllpassFilter, CombFilter, Freeverb};
