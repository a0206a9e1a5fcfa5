//! Speed estimation and moving-average smoothing.

use std::collections::VecDeque;
use std::time::Duration;

use runwatch_models::Point2;

/// Fixed-capacity moving average over instantaneous speed samples.
#[derive(Debug, Clone)]
pub struct SpeedSmoother {
    samples: VecDeque<f64>,
    capacity: usize,
}

impl SpeedSmoother {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Push a sample, evicting the oldest at capacity, and return the new mean.
    pub fn push(&mut self, sample: f64) -> f64 {
        if self.samples.len() == self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(sample);
        self.current()
    }

    /// Mean of the buffered samples, 0.0 when empty.
    pub fn current(&self) -> f64 {
        if self.samples.is_empty() {
            return 0.0;
        }
        self.samples.iter().sum::<f64>() / self.samples.len() as f64
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn samples(&self) -> impl Iterator<Item = &f64> {
        self.samples.iter()
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }
}

/// Turns successive centroid observations into smoothed speed.
///
/// Timestamps are monotonic offsets from an arbitrary origin (frame clock).
#[derive(Debug, Clone)]
pub struct SpeedEstimator {
    smoother: SpeedSmoother,
    gain: f64,
    last: Option<(Point2, Duration)>,
}

impl SpeedEstimator {
    pub fn new(buffer_size: usize, gain: f64) -> Self {
        Self {
            smoother: SpeedSmoother::new(buffer_size),
            gain,
            last: None,
        }
    }

    /// Record a centroid observation.
    ///
    /// `scale` multiplies the raw displacement (perspective factor, times the
    /// grid column count in grid mode). Returns the smoothed speed when a
    /// sample was pushed. The first observation only sets the reference; an
    /// observation whose elapsed time is zero or negative is ignored
    /// entirely.
    pub fn observe(&mut self, centroid: Point2, at: Duration, scale: f64) -> Option<f64> {
        let Some((prev, prev_at)) = self.last else {
            self.last = Some((centroid, at));
            return None;
        };

        let dt = at.checked_sub(prev_at).filter(|dt| !dt.is_zero())?;

        let distance = centroid.distance(&prev) * scale;
        let instant = distance / dt.as_secs_f64() * self.gain;
        self.last = Some((centroid, at));

        Some(self.smoother.push(instant))
    }

    pub fn current(&self) -> f64 {
        self.smoother.current()
    }

    pub fn smoother(&self) -> &SpeedSmoother {
        &self.smoother
    }

    pub fn reset(&mut self) {
        self.smoother.clear();
        self.last = None;
    }
}
