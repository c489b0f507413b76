use std::time::Duration;

use isoroom_pool::PoolStrategy;
use serde::{Deserialize, Serialize};

/// Streaming configuration: pool capacities, release strategies and the
/// transparent draw-order bias.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamConfig {
    /// Sprite slots available to opaque tiles.
    pub opaque_capacity: usize,
    /// Sprite slots available to transparent tiles.
    pub transparent_capacity: usize,
    pub opaque_strategy: PoolStrategy,
    pub transparent_strategy: PoolStrategy,
    /// Weight of depth in the transparent sort key `bias * depth - (x + y)`.
    pub depth_bias: f32,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            opaque_capacity: 1024,
            transparent_capacity: 128,
            opaque_strategy: PoolStrategy::Swap,
            transparent_strategy: PoolStrategy::Swap,
            depth_bias: 1.1,
        }
    }
}

impl StreamConfig {
    /// Sort key for a transparent sprite; smaller keys draw first.
    pub fn transparent_key(&self, x: f32, y: f32, depth: f32) -> f32 {
        self.depth_bias * depth - (x + y)
    }
}

/// Running streaming counters for instrumentation.
#[derive(Debug, Clone, Default)]
pub struct StreamStats {
    pub rooms_loaded: usize,
    pub rooms_unloaded: usize,
    /// Load or unload requests that were reported and ignored.
    pub requests_rejected: usize,
    pub resident_opaque: usize,
    pub resident_transparent: usize,
    pub last_load_time: Duration,
}

/// Fixed-size ring of recent durations, e.g. room load times.
#[derive(Debug)]
pub struct TimingWindow {
    history: Vec<Duration>,
    capacity: usize,
    index: usize,
    filled: bool,
}

impl TimingWindow {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            history: vec![Duration::ZERO; capacity],
            capacity,
            index: 0,
            filled: false,
        }
    }

    pub fn record(&mut self, dt: Duration) {
        self.history[self.index] = dt;
        self.index = (self.index + 1) % self.capacity;
        if self.index == 0 {
            self.filled = true;
        }
    }

    fn recorded(&self) -> &[Duration] {
        &self.history[..self.count()]
    }

    pub fn average(&self) -> Duration {
        let count = self.count();
        if count == 0 {
            return Duration::ZERO;
        }
        self.recorded().iter().sum::<Duration>() / count as u32
    }

    pub fn max(&self) -> Duration {
        self.recorded().iter().copied().max().unwrap_or(Duration::ZERO)
    }

    pub fn count(&self) -> usize {
        if self.filled {
            self.capacity
        } else {
            self.index
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stream_config_defaults() {
        let config = StreamConfig::default();
        assert_eq!(config.opaque_capacity, 1024);
        assert_eq!(config.transparent_capacity, 128);
        assert_eq!(config.opaque_strategy, PoolStrategy::Swap);
        assert_eq!(config.transparent_strategy, PoolStrategy::Swap);
        assert_eq!(config.depth_bias, 1.1);
    }

    #[test]
    fn transparent_key_prefers_low_depth_then_far_cells() {
        let config = StreamConfig::default();
        let low = config.transparent_key(0.0, 0.0, 1.0);
        let high = config.transparent_key(0.0, 0.0, 2.0);
        let near = config.transparent_key(3.0, 3.0, 1.0);
        assert!(low < high);
        assert!(near < low);
    }

    #[test]
    fn partial_config_fills_defaults() {
        let config: StreamConfig =
            serde_json::from_str(r#"{ "opaque_capacity": 8, "transparent_strategy": "Ordered" }"#)
                .unwrap();
        assert_eq!(config.opaque_capacity, 8);
        assert_eq!(config.transparent_capacity, 128);
        assert_eq!(config.transparent_strategy, PoolStrategy::Ordered);
    }

    #[test]
    fn timing_window_tracks_history() {
        let mut window = TimingWindow::new(3);
        assert_eq!(window.average(), Duration::ZERO);
        window.record(Duration::from_millis(10));
        window.record(Duration::from_millis(20));
        window.record(Duration::from_millis(30));

        assert_eq!(window.count(), 3);
        assert_eq!(window.average(), Duration::from_millis(20));
        assert_eq!(window.max(), Duration::from_millis(30));
    }

    #[test]
    fn timing_window_wraps_around() {
        let mut window = TimingWindow::new(2);
        window.record(Duration::from_millis(10));
        window.record(Duration::from_millis(20));
        window.record(Duration::from_millis(30)); // overwrites first

        assert_eq!(window.count(), 2);
        assert_eq!(window.average(), Duration::from_millis(25));
    }
}
