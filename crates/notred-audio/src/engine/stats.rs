//! Engine counters, refreshed at the end of every tick

/// Snapshot of engine occupancy
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct EngineStats {
    /// Live ad-hoc audio objects
    pub audio_objects: usize,
    /// Trigger executions with at least one voice
    pub active_events: usize,
    /// Voices holding a pool slot
    pub active_sounds: usize,
    /// Voices tracked per object
    pub total_sources: usize,
    /// Registered audio components, all scenes
    pub audio_components: usize,
    /// Duration of the last tick
    pub frame_time_ms: f32,
}

impl std::fmt::Display for EngineStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "objects={} events={} sounds={} sources={} components={} frame={:.3}ms",
            self.audio_objects,
            self.active_events,
            self.active_sounds,
            self.total_sources,
            self.audio_components,
            self.frame_time_ms
        )
    }
}
