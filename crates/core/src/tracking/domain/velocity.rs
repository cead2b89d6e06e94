use std::collections::VecDeque;

use crate::shared::bounding_box::BoundingBox;

/// Centroid displacement per frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Velocity {
    pub vx: f64,
    pub vy: f64,
}

/// Velocity in polar form: magnitude (pixels/frame) and direction
/// (radians, `atan2(vy, vx)`).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PolarVelocity {
    pub speed: f64,
    pub direction: f64,
}

impl Velocity {
    /// Velocity of the centroid moving from `prev` to `cur` over
    /// `frame_delta` frames.
    ///
    /// `None` when the delta is zero or either box has non-finite geometry.
    pub fn between(prev: &BoundingBox, cur: &BoundingBox, frame_delta: u64) -> Option<Self> {
        if frame_delta == 0 || !prev.is_finite() || !cur.is_finite() {
            return None;
        }
        let (px, py) = prev.centroid();
        let (cx, cy) = cur.centroid();
        let dt = frame_delta as f64;
        Some(Self {
            vx: (cx - px) / dt,
            vy: (cy - py) / dt,
        })
    }

    pub fn to_polar(self) -> PolarVelocity {
        PolarVelocity {
            speed: self.vx.hypot(self.vy),
            direction: self.vy.atan2(self.vx),
        }
    }
}

/// Bounded window of recent per-frame speed samples, oldest first.
#[derive(Clone, Debug)]
pub struct SpeedWindow {
    samples: VecDeque<f64>,
    capacity: usize,
    min_samples: usize,
}

impl SpeedWindow {
    pub fn new(capacity: usize, min_samples: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            samples: VecDeque::with_capacity(capacity + 1),
            capacity,
            min_samples: min_samples.max(1),
        }
    }

    pub fn push(&mut self, speed: f64) {
        self.samples.push_back(speed);
        while self.samples.len() > self.capacity {
            self.samples.pop_front();
        }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Mean absolute magnitude in pixels/frame; `None` until `min_samples`
    /// samples have been collected.
    pub fn average(&self) -> Option<f64> {
        if self.samples.len() < self.min_samples {
            return None;
        }
        let sum: f64 = self.samples.iter().map(|s| s.abs()).sum();
        Some(sum / self.samples.len() as f64)
    }

    /// Average scaled to pixels/second assuming a fixed frame rate.
    pub fn per_second(&self, assumed_fps: f64) -> Option<f64> {
        self.average().map(|per_frame| per_frame * assumed_fps)
    }
}
