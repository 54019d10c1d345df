//! Wall-clock timing for the frame loop

use std::time::Instant;

/// Tracks elapsed seconds since the clock started
#[derive(Debug, Clone, Copy)]
pub struct Clock {
    start: Instant,
    last: Instant,
}

impl Clock {
    pub fn start() -> Self {
        let now = Instant::now();
        Self {
            start: now,
            last: now,
        }
    }

    /// Seconds since [`Clock::start`]
    pub fn elapsed(&self) -> f32 {
        self.elapsed_at(Instant::now())
    }

    pub fn elapsed_at(&self, now: Instant) -> f32 {
        now.saturating_duration_since(self.start).as_secs_f32()
    }

    /// Seconds since the previous call to `delta`
    pub fn delta(&mut self) -> f32 {
        let now = Instant::now();
        let delta = now.saturating_duration_since(self.last).as_secs_f32();
        self.last = now;
        delta
    }
}

impl Default for Clock {
    fn default() -> Self {
        Self::start()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn elapsed_measures_from_start() {
        let clock = Clock::start();
        let later = clock.start + Duration::from_millis(1500);
        assert!((clock.elapsed_at(later) - 1.5).abs() < 1e-6);
    }

    #[test]
    fn elapsed_never_goes_negative() {
        let clock = Clock::start();
        let before = clock.start.checked_sub(Duration::from_secs(1));
        if let Some(before) = before {
            assert_eq!(clock.elapsed_at(before), 0.0);
        }
    }

    #[test]
    fn delta_is_non_negative_and_resets() {
        let mut clock = Clock::start();
        let first = clock.delta();
        let second = clock.delta();
        assert!(first >= 0.0);
        assert!(second >= 0.0);
        assert!(clock.elapsed() >= first);
    }
}
