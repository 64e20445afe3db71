//! Mono circular delay line
//!
//! Used as the master reverb's pre-delay. Capacity is fixed at construction;
//! the delay time can be changed freely up to that ceiling without allocating.

/// Smallest buffer ever allocated, in samples
const MIN_CAPACITY: usize = 4;

/// Fixed-capacity delay line with a runtime-adjustable delay
#[derive(Debug, Clone)]
pub struct DelayLine {
    buffer: Vec<f32>,
    write_pos: usize,
    /// Current delay in samples, always in `1..buffer.len()`
    delay: usize,
}

impl DelayLine {
    /// Create a delay line able to hold up to `max_delay` samples of delay
    pub fn new(max_delay: usize) -> Self {
        let capacity = (max_delay + 1).max(MIN_CAPACITY);
        Self {
            buffer: vec![0.0; capacity],
            write_pos: 0,
            delay: 1,
        }
    }

    /// Longest delay this line supports, in samples
    #[inline]
    pub fn max_delay(&self) -> usize {
        self.buffer.len() - 1
    }

    /// Set the delay in samples, clamped to `1..=max_delay()`
    pub fn set_delay(&mut self, samples: usize) {
        self.delay = samples.clamp(1, self.max_delay());
    }

    /// Current delay in samples
    #[inline]
    pub fn delay(&self) -> usize {
        self.delay
    }

    /// Current delay in milliseconds at the given sample rate
    pub fn delay_ms(&self, sample_rate: u32) -> f32 {
        self.delay as f32 * 1000.0 / sample_rate as f32
    }

    /// Push one sample and return the sample written `delay()` pushes ago
    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        let len = self.buffer.len();
        self.buffer[self.write_pos] = input;
        let read_pos = (self.write_pos + len - self.delay) % len;
        let output = self.buffer[read_pos];
        self.write_pos = (self.write_pos + 1) % len;
        output
    }

    /// Clear the stored history
    pub fn reset(&mut self) {
        self.buffer.fill(0.0);
        self.write_pos = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_impulse_arrives_after_delay() {
        let mut line = DelayLine::new(100);
        line.set_delay(5);

        let mut outputs = Vec::new();
        outputs.push(line.process(1.0));
        for _ in 0..10 {
            outputs.push(line.process(0.0));
        }

        let hit = outputs.iter().position(|&s| s == 1.0);
        assert_eq!(hit, Some(5));
    }

    #[test]
    fn test_delay_is_clamped() {
        let mut line = DelayLine::new(10);
        line.set_delay(0);
        assert_eq!(line.delay(), 1);
        line.set_delay(1000);
        assert_eq!(line.delay(), 10);
    }

    #[test]
    fn test_minimum_capacity() {
        let line = DelayLine::new(0);
        assert_eq!(line.max_delay(), MIN_CAPACITY - 1);
    }

    #[test]
    fn test_delay_ms() {
        let mut line = DelayLine::new(48000);
        line.set_delay(2400);
        assert!((line.delay_ms(48000) - 50.0).abs() < 1e-3);
    }

    #[test]
    fn test_reset_clears_history() {
        let mut line = DelayLine::new(8);
        line.set_delay(2);
        line.process(1.0);
        line.reset();
        for _ in 0..8 {
            assert_eq!(line.process(0.0), 0.0);
        }
    }
}
