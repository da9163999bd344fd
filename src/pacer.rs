use std::time::{Duration, Instant};

/// 30 presents per second.
pub const DEFAULT_FRAME_INTERVAL: Duration = Duration::from_nanos(33_333_333);

/// Decides when a finished sweep is worth presenting and when the run is over.
#[derive(Clone, Debug)]
pub struct FramePacer {
    interval: Duration,
    min_draws: u64,
    last_present: Option<Instant>,
    presents: u64,
}

impl Default for FramePacer {
    fn default() -> Self {
        Self::new(DEFAULT_FRAME_INTERVAL, 1)
    }
}

impl FramePacer {
    pub fn new(interval: Duration, min_draws: u64) -> Self {
        Self {
            interval,
            min_draws,
            last_present: None,
            presents: 0,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn presents(&self) -> u64 {
        self.presents
    }

    /// Starts the interval clock, e.g. when the run begins.
    pub fn reset(&mut self, now: Instant) {
        self.last_present = Some(now);
    }

    /// A sweep is presented only when the interval has elapsed and it drew
    /// at least `min_draws` pixels.
    pub fn should_present(&self, now: Instant, draw_count: u64) -> bool {
        if draw_count == 0 || draw_count < self.min_draws {
            return false;
        }
        match self.last_present {
            Some(last) => now.saturating_duration_since(last) >= self.interval,
            None => true,
        }
    }

    pub fn record_present(&mut self, now: Instant) {
        self.last_present = Some(now);
        self.presents += 1;
    }

    /// Done once the sort has finished and a whole sweep came up fully revealed.
    pub fn is_complete(&self, sort_finished: bool, draw_count: u64, window_pixels: u64) -> bool {
        sort_finished && draw_count >= window_pixels
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    #[test]
    fn waits_for_the_interval() {
        let start = Instant::now();
        let mut pacer = FramePacer::new(Duration::from_millis(33), 1);
        pacer.reset(start);

        assert!(!pacer.should_present(start + Duration::from_millis(10), 50));
        assert!(pacer.should_present(start + Duration::from_millis(40), 50));

        pacer.record_present(start + Duration::from_millis(40));
        assert!(!pacer.should_present(start + Duration::from_millis(60), 50));
        assert!(pacer.should_present(start + Duration::from_millis(80), 50));
        assert_eq!(pacer.presents(), 1);
    }

    #[test]
    fn skips_sweeps_that_drew_nothing() {
        let start = Instant::now();
        let mut pacer = FramePacer::new(Duration::from_millis(33), 0);
        pacer.reset(start);
        assert!(!pacer.should_present(start + Duration::from_secs(1), 0));
    }

    #[test]
    fn honours_min_draws() {
        let start = Instant::now();
        let mut pacer = FramePacer::new(Duration::ZERO, 3);
        pacer.reset(start);
        assert!(!pacer.should_present(start, 2));
        assert!(pacer.should_present(start, 3));
    }

    #[test]
    fn completion_needs_both_sort_and_full_sweep() {
        let pacer = FramePacer::default();
        assert!(!pacer.is_complete(false, 100, 100));
        assert!(!pacer.is_complete(true, 99, 100));
        assert!(pacer.is_complete(true, 100, 100));
    }
}
