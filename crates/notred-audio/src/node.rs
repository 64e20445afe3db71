//! Audio-graph node surface
//!
//! A node declares its bus layout, processing flags and parameter table up
//! front so the mixer can schedule it without knowing its concrete type.
//! Parameters are addressed by index and carry real (unnormalized) values.

use crate::types::StereoSample;

/// Scheduling flags for a node
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NodeFlags {
    /// Process every block even when all inputs are silent (tails, decays)
    pub continuous_processing: bool,
    /// Accept a missing input instead of requiring an upstream connection
    pub allow_null_input: bool,
}

/// Information about a node parameter
#[derive(Debug, Clone)]
pub struct ParamInfo {
    /// Parameter name for display
    pub name: String,
    /// Unit label (e.g., "ms", "dB", "%")
    pub unit: String,
    pub default: f32,
    pub min: f32,
    pub max: f32,
}

impl Default for ParamInfo {
    fn default() -> Self {
        Self {
            name: String::new(),
            unit: String::new(),
            default: 0.0,
            min: 0.0,
            max: 1.0,
        }
    }
}

impl ParamInfo {
    /// Create a new parameter info with name and default value
    pub fn new(name: impl Into<String>, default: f32) -> Self {
        Self {
            name: name.into(),
            default,
            ..Default::default()
        }
    }

    /// Set the value range
    pub fn with_range(mut self, min: f32, max: f32) -> Self {
        self.min = min;
        self.max = max;
        self
    }

    /// Set the unit label
    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = unit.into();
        self
    }

    /// Clamp a value into this parameter's range
    #[inline]
    pub fn clamp(&self, value: f32) -> f32 {
        value.clamp(self.min, self.max)
    }
}

/// Static description of a node
#[derive(Debug, Clone)]
pub struct NodeInfo {
    pub name: String,
    /// Number of mono input buses (a stereo frame feeds buses 0 and 1)
    pub input_buses: usize,
    pub output_buses: usize,
    pub flags: NodeFlags,
    pub params: Vec<ParamInfo>,
}

impl NodeInfo {
    pub fn new(name: impl Into<String>, input_buses: usize, output_buses: usize) -> Self {
        Self {
            name: name.into(),
            input_buses,
            output_buses,
            flags: NodeFlags::default(),
            params: Vec::new(),
        }
    }

    pub fn with_flags(mut self, flags: NodeFlags) -> Self {
        self.flags = flags;
        self
    }

    /// Append a parameter; its index is its position in the table
    pub fn with_param(mut self, param: ParamInfo) -> Self {
        self.params.push(param);
        self
    }

    pub fn param_count(&self) -> usize {
        self.params.len()
    }
}

/// A processing node on the mix graph
pub trait DspNode: Send {
    /// Static description (buses, flags, parameters)
    fn info(&self) -> &NodeInfo;

    /// Process `frames` frames from `input` into `output[..frames]`
    ///
    /// `input` is `None` when nothing upstream is connected.
    fn process(&mut self, input: Option<&[StereoSample]>, output: &mut [StereoSample], frames: usize);

    /// Current value of a parameter (0.0 for an unknown index)
    fn get_param(&self, index: usize) -> f32;

    /// Set a parameter by index; values are clamped to the declared range
    fn set_param(&mut self, index: usize, value: f32);

    /// Human-readable rendering of a parameter's current value
    fn param_display(&self, index: usize) -> String {
        format!("{:.2}", self.get_param(index))
    }

    /// Clear all internal state (delay lines, filter history)
    fn reset(&mut self);
}
