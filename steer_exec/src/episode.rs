//! # Episode accumulator
//!
//! An episode is one fixed-length run of the simulation between resets, used as a single trial
//! when tuning. Only the second half of the episode is scored so that the transient as the vehicle
//! settles onto the track does not dominate the cost.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Serialize;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Accumulates the squared error over one episode.
#[derive(Debug, Clone, Serialize)]
pub struct EpisodeAccumulator {
    /// Number of steps in a full episode
    episode_length: usize,

    /// Number of steps recorded in the current episode
    step_count: usize,

    /// Sum of the squared errors recorded after the warm-up window
    squared_error_sum: f64
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl EpisodeAccumulator {
    pub fn new(episode_length: usize) -> Self {
        Self {
            episode_length,
            step_count: 0,
            squared_error_sum: 0f64
        }
    }

    /// Clear the accumulator ready for a new episode.
    pub fn begin_episode(&mut self) {
        self.step_count = 0;
        self.squared_error_sum = 0f64;
    }

    /// Record the error of one step.
    pub fn record(&mut self, error: f64) {
        self.step_count += 1;

        // Warm-up window is the first half of the episode
        if self.step_count > self.episode_length / 2 {
            self.squared_error_sum += error * error;
        }
    }

    /// The mean squared error of the episode.
    ///
    /// The sum only covers the second half, so it is doubled before being normalised over the full
    /// episode length.
    pub fn mean_squared_error(&self) -> f64 {
        self.squared_error_sum * 2f64 / self.episode_length as f64
    }

    /// Returns true once the episode's full length has been recorded.
    pub fn is_complete(&self) -> bool {
        self.step_count >= self.episode_length
    }

    pub fn step_count(&self) -> usize {
        self.step_count
    }

    pub fn episode_length(&self) -> usize {
        self.episode_length
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_constant_error_score() {
        let length = 3200;
        let mut acc = EpisodeAccumulator::new(length);

        for _ in 0..length {
            assert!(!acc.is_complete());
            acc.record(2.0);
        }

        assert!(acc.is_complete());
        assert!((acc.mean_squared_error() - 4.0).abs() < 1e-9);
    }

    #[test]
    fn test_warm_up_excluded() {
        let mut acc = EpisodeAccumulator::new(10);

        // Large errors in the first half are not scored
        for _ in 0..5 {
            acc.record(100.0);
        }
        assert_eq!(acc.mean_squared_error(), 0.0);

        for _ in 0..5 {
            acc.record(1.0);
        }
        assert_eq!(acc.step_count(), 10);
        assert!((acc.mean_squared_error() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_begin_episode() {
        let mut acc = EpisodeAccumulator::new(4);
        for _ in 0..4 {
            acc.record(3.0);
        }
        assert!(acc.is_complete());

        acc.begin_episode();
        assert_eq!(acc.step_count(), 0);
        assert_eq!(acc.mean_squared_error(), 0.0);
        assert!(!acc.is_complete());
    }
}
