//! Kinetic tracking: periodic velocity and direction estimates for release.

use log::trace;
use serde::Serialize;

use crate::geometry::Point;

/// Sampling period while a gesture is tracked.
pub const TRACK_INTERVAL_MS: f64 = 20.0;

/// Velocity above which a drag ends in a release phase.
pub const RELEASE_MIN_VELOCITY: f64 = 1.0;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Kinetics {
    pub velocity: f64,
    /// Direction of motion in radians, screen coordinates (y down).
    pub angle: f64,
    /// Pointer position at the last sample.
    pub frame: Point,
    /// Clock time of the last sample.
    pub timestamp: f64,
}

impl Kinetics {
    /// Start a new baseline at `frame`.
    pub fn reset(&mut self, frame: Point, now: f64) {
        self.velocity = 0.0;
        self.angle = 0.0;
        self.frame = frame;
        self.timestamp = now;
    }

    /// Fold one sample into the smoothed velocity and angle.
    ///
    /// `pointer` is the latest pointer position, `origin` where the gesture
    /// started and `scale` the configured velocity factor.
    pub fn sample(&mut self, pointer: Point, origin: Point, now: f64, scale: f64) {
        let elapsed = now - self.timestamp;
        let dx = pointer.x - self.frame.x;
        let dy = pointer.y - self.frame.y;
        self.frame = pointer;
        self.timestamp = now;

        let delta = (dx * dx + dy * dy).sqrt();
        // +1 keeps near-simultaneous samples finite
        let speed = scale * delta / (1.0 + elapsed);
        self.velocity = 0.6 * speed + 0.4 * self.velocity;

        let step_angle = dy.atan2(dx);
        let gesture_angle = (self.frame.y - origin.y).atan2(self.frame.x - origin.x);
        self.angle = 0.7 * step_angle + 0.2 * self.angle + 0.1 * gesture_angle;

        trace!(
            "kinetic sample: delta={delta:.2} elapsed={elapsed:.1} velocity={:.3} angle={:.3}",
            self.velocity, self.angle
        );
    }

    pub fn is_fast(&self) -> bool {
        self.velocity > RELEASE_MIN_VELOCITY
    }

    /// Displacement applied when released, optionally capped in length.
    pub fn release_offset(&self, cap: Option<f64>) -> Point {
        let distance = match cap {
            Some(max) => self.velocity.min(max),
            None => self.velocity,
        };
        Point::new(distance * self.angle.cos(), distance * self.angle.sin())
    }
}
