//! Scaled, clamped simulation clock.

use std::time::Duration;

/// Converts raw frame deltas into simulation time.
///
/// Raw deltas are clamped to the configured maximum before scaling, so a
/// stalled host never produces a catch-up jump. A scale of zero pauses the
/// simulation: the scaled delta is zero and elapsed time stands still.
#[derive(Clone, Debug)]
pub struct GameClock {
    max_delta: Duration,
    scale: f32,
    elapsed: Duration,
}

impl GameClock {
    /// Creates a clock at time zero running at normal speed.
    #[must_use]
    pub const fn new(max_delta: Duration) -> Self {
        Self {
            max_delta,
            scale: 1.0,
            elapsed: Duration::ZERO,
        }
    }

    /// Scaled simulation time accumulated so far.
    #[must_use]
    pub const fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// Current time scale.
    #[must_use]
    pub const fn time_scale(&self) -> f32 {
        self.scale
    }

    /// Changes the time scale. Negative or non-finite scales pause the clock.
    pub fn set_time_scale(&mut self, scale: f32) {
        if scale.is_finite() && scale >= 0.0 {
            self.scale = scale;
        } else {
            log::warn!("rejected time scale {scale}; pausing instead");
            self.scale = 0.0;
        }
    }

    /// Reports whether the clock is paused.
    #[must_use]
    pub fn is_paused(&self) -> bool {
        self.scale == 0.0
    }

    /// Clamps and scales a raw delta, advancing elapsed time by the result.
    pub fn advance(&mut self, raw: Duration) -> Duration {
        let clamped = raw.min(self.max_delta);
        let scaled = if self.scale == 1.0 {
            clamped
        } else {
            let nanos = (clamped.as_nanos() as f64 * f64::from(self.scale)).round();
            Duration::from_nanos(nanos as u64)
        };
        self.elapsed += scaled;
        scaled
    }

    /// Rewinds elapsed time to zero and restores normal speed.
    pub fn reset(&mut self) {
        self.elapsed = Duration::ZERO;
        self.scale = 1.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stalls_are_clamped() {
        let mut clock = GameClock::new(Duration::from_millis(100));
        assert_eq!(clock.advance(Duration::from_secs(3)), Duration::from_millis(100));
        assert_eq!(clock.advance(Duration::from_millis(16)), Duration::from_millis(16));
        assert_eq!(clock.elapsed(), Duration::from_millis(116));
    }

    #[test]
    fn pause_freezes_elapsed_time() {
        let mut clock = GameClock::new(Duration::from_millis(100));
        clock.set_time_scale(0.0);
        assert!(clock.is_paused());
        assert_eq!(clock.advance(Duration::from_millis(50)), Duration::ZERO);
        assert_eq!(clock.elapsed(), Duration::ZERO);
    }

    #[test]
    fn fast_forward_scales_after_clamping() {
        let mut clock = GameClock::new(Duration::from_millis(100));
        clock.set_time_scale(2.0);
        assert_eq!(clock.advance(Duration::from_millis(500)), Duration::from_millis(200));
    }

    #[test]
    fn invalid_scales_pause() {
        let mut clock = GameClock::new(Duration::from_millis(100));
        clock.set_time_scale(-1.0);
        assert_eq!(clock.time_scale(), 0.0);
        clock.set_time_scale(f32::NAN);
        assert!(clock.is_paused());
    }
}
