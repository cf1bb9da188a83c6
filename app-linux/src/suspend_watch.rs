//! Suspend detection without a session bus.
//!
//! `Instant` is backed by CLOCK_MONOTONIC, which stops while the machine is
//! suspended; the wall clock keeps going. A wall-clock gap much larger than the
//! monotonic gap between two polls means we just woke up.

use std::time::{Duration, Instant, SystemTime};

pub struct SuspendWatch {
    last_wall: SystemTime,
    last_mono: Instant,
    threshold: Duration,
}

impl SuspendWatch {
    pub fn new(threshold: Duration) -> Self {
        Self {
            last_wall: SystemTime::now(),
            last_mono: Instant::now(),
            threshold,
        }
    }

    /// Time spent suspended since the previous poll, if above the threshold.
    pub fn poll(&mut self) -> Option<Duration> {
        self.poll_at(SystemTime::now(), Instant::now())
    }

    fn poll_at(&mut self, wall: SystemTime, mono: Instant) -> Option<Duration> {
        // Wall clock stepped backwards (NTP, manual change): nothing to report.
        let wall_delta = wall.duration_since(self.last_wall).unwrap_or_default();
        let mono_delta = mono.duration_since(self.last_mono);
        self.last_wall = wall;
        self.last_mono = mono;

        let suspended = wall_delta.saturating_sub(mono_delta);
        (suspended > self.threshold).then_some(suspended)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn regular_ticks_are_not_a_wake() {
        let mut watch = SuspendWatch::new(Duration::from_secs(10));
        let wall = watch.last_wall + Duration::from_secs(1);
        let mono = watch.last_mono + Duration::from_secs(1);

        assert_eq!(watch.poll_at(wall, mono), None);
    }

    #[test]
    fn wall_clock_jump_reports_suspend_time() {
        let mut watch = SuspendWatch::new(Duration::from_secs(10));
        let wall = watch.last_wall + Duration::from_secs(3601);
        let mono = watch.last_mono + Duration::from_secs(1);

        assert_eq!(watch.poll_at(wall, mono), Some(Duration::from_secs(3600)));
        // The next regular tick starts from the new baseline.
        let wall = wall + Duration::from_secs(1);
        let mono = mono + Duration::from_secs(1);
        assert_eq!(watch.poll_at(wall, mono), None);
    }

    #[test]
    fn backwards_wall_clock_is_ignored() {
        let mut watch = SuspendWatch::new(Duration::from_secs(10));
        let wall = watch.last_wall - Duration::from_secs(600);
        let mono = watch.last_mono + Duration::from_secs(1);

        assert_eq!(watch.poll_at(wall, mono), None);
    }
}
