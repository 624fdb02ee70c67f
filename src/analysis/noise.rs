//! Adaptive noise floor
//!
//! The floor is an exponential moving average of the mean channel loudness.
//! A frame in which every channel is exactly silent leaves the floor where it
//! was: letting it decay during true silence would drop the threshold to zero
//! and fire on the next faint transient.

use crate::config::SensitivityConfig;

/// Noise floor estimate and the detection threshold derived from it
#[derive(Debug, Clone)]
pub struct NoiseTracker {
    noise_floor: f32,
    smoothing: f32,
    threshold_multiplier: f32,
}

impl NoiseTracker {
    pub fn new(sensitivity: SensitivityConfig) -> Self {
        Self {
            noise_floor: 0.0,
            smoothing: sensitivity.smoothing,
            threshold_multiplier: sensitivity.threshold_multiplier,
        }
    }

    /// Fold one frame's channel volumes into the floor
    ///
    /// Returns the detection threshold for that same frame.
    pub fn update(&mut self, volumes: &[f32]) -> f32 {
        if volumes.iter().any(|&v| v > 0.0) {
            let mean = volumes.iter().sum::<f32>() / volumes.len() as f32;
            let next = self.noise_floor + self.smoothing * (mean - self.noise_floor);

            // Rounding must not carry the floor past its target
            self.noise_floor = if self.noise_floor <= mean {
                next.min(mean)
            } else {
                next.max(mean)
            };
        }

        self.threshold()
    }

    /// Current detection threshold
    pub fn threshold(&self) -> f32 {
        self.noise_floor * self.threshold_multiplier
    }

    pub fn noise_floor(&self) -> f32 {
        self.noise_floor
    }

    /// Forget the learned floor, as after a stream restart
    pub fn reset(&mut self) {
        self.noise_floor = 0.0;
    }
}

impl Default for NoiseTracker {
    fn default() -> Self {
        Self::new(SensitivityConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn tracker_at(floor: f32) -> NoiseTracker {
        let mut tracker = NoiseTracker::default();
        tracker.noise_floor = floor;
        tracker
    }

    #[test]
    fn test_first_frame_update() {
        let mut tracker = NoiseTracker::default();
        let threshold = tracker.update(&[100.0, 300.0]);

        assert!((tracker.noise_floor() - 20.0).abs() < 1e-4);
        assert!((threshold - 30.0).abs() < 1e-4);
    }

    #[test]
    fn test_silence_freezes_floor() {
        let mut tracker = tracker_at(42.0);
        let threshold = tracker.update(&[0.0, 0.0, 0.0, 0.0, 0.0, 0.0]);

        assert_eq!(tracker.noise_floor(), 42.0);
        assert_eq!(threshold, 63.0);
    }

    #[test]
    fn test_partial_silence_still_updates() {
        let mut tracker = NoiseTracker::default();
        tracker.update(&[0.0, 50.0]);
        assert!((tracker.noise_floor() - 2.5).abs() < 1e-5);
    }

    #[test]
    fn test_custom_sensitivity() {
        let mut tracker = NoiseTracker::new(SensitivityConfig {
            smoothing: 0.5,
            threshold_multiplier: 2.0,
        });
        let threshold = tracker.update(&[10.0, 10.0]);

        assert_eq!(tracker.noise_floor(), 5.0);
        assert_eq!(threshold, 10.0);
    }

    #[test]
    fn test_reset() {
        let mut tracker = tracker_at(12.0);
        tracker.reset();
        assert_eq!(tracker.noise_floor(), 0.0);
        assert_eq!(tracker.threshold(), 0.0);
    }

    proptest! {
        #[test]
        fn prop_rises_monotonically_without_overshoot(
            start in 0.0f32..1000.0,
            extra in 0.0f32..1000.0,
            frames in 1usize..200,
        ) {
            let target = start + extra + 1.0;
            let mut tracker = tracker_at(start);
            let mut previous = start;

            for _ in 0..frames {
                tracker.update(&[target, target]);
                prop_assert!(tracker.noise_floor() >= previous);
                prop_assert!(tracker.noise_floor() <= target);
                previous = tracker.noise_floor();
            }
        }

        #[test]
        fn prop_falls_monotonically_without_undershoot(
            target in 0.5f32..1000.0,
            extra in 0.0f32..1000.0,
            frames in 1usize..200,
        ) {
            let start = target + extra;
            let mut tracker = tracker_at(start);
            let mut previous = start;

            for _ in 0..frames {
                tracker.update(&[target; 6]);
                prop_assert!(tracker.noise_floor() <= previous);
                prop_assert!(tracker.noise_floor() >= target);
                previous = tracker.noise_floor();
            }
        }

        #[test]
        fn prop_silent_frame_never_moves_floor(
            start in 0.0f32..10_000.0,
            channels in prop::sample::select(vec![2usize, 6, 8]),
        ) {
            let mut tracker = tracker_at(start);
            tracker.update(&vec![0.0; channels]);
            prop_assert_eq!(tracker.noise_floor(), start);
        }
    }
}
