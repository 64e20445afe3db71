//! Linear gain ramp advanced once per engine tick

/// Linear volume ramp
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fader {
    current: f32,
    start: f32,
    target: f32,
    /// Ramp length in seconds (0 = not fading)
    duration: f32,
    elapsed: f32,
}

impl Default for Fader {
    fn default() -> Self {
        Self::new()
    }
}

impl Fader {
    /// Fader resting at unity gain
    pub fn new() -> Self {
        Self {
            current: 1.0,
            start: 1.0,
            target: 1.0,
            duration: 0.0,
            elapsed: 0.0,
        }
    }

    /// Ramp from `from` to `to` over `duration` seconds
    pub fn fade(&mut self, from: f32, to: f32, duration: f32) {
        self.start = from;
        self.target = to;
        self.elapsed = 0.0;
        if duration > 0.0 {
            self.duration = duration;
            self.current = from;
        } else {
            self.duration = 0.0;
            self.current = to;
        }
    }

    /// Ramp from the current value to `to`
    pub fn fade_to(&mut self, to: f32, duration: f32) {
        self.fade(self.current, to, duration);
    }

    /// Set the value immediately, cancelling any ramp
    pub fn jump_to(&mut self, value: f32) {
        self.fade(value, value, 0.0);
    }

    /// Advance the ramp by `dt` seconds
    pub fn advance(&mut self, dt: f32) {
        if self.duration <= 0.0 {
            return;
        }
        self.elapsed = (self.elapsed + dt).min(self.duration);
        let t = self.elapsed / self.duration;
        self.current = self.start + (self.target - self.start) * t;
        if self.elapsed >= self.duration {
            self.current = self.target;
            self.duration = 0.0;
        }
    }

    /// Current gain
    #[inline]
    pub fn volume(&self) -> f32 {
        self.current
    }

    pub fn target(&self) -> f32 {
        self.target
    }

    pub fn is_fading(&self) -> bool {
        self.duration > 0.0
    }
}
