//! Raycast distance sensors.
//!
//! Every agent carries the same fan of rays relative to its heading. The fan
//! is laid out once; per tick it is rotated by the agent's heading and cast
//! against the [`BorderIndex`].

use geo::coord;

use super::borders::BorderIndex;
use super::geometry::{LineSegment, Point2, Transform2D, rotate};

/// Upper bound on the number of rays in a fan.
pub const MAX_SENSOR_RAYS: usize = 255;

/// Fixed fan of unit ray directions relative to an agent's heading.
#[derive(Debug, Clone)]
pub struct SensorFan {
    directions: Vec<Point2>,
    max_range: f32,
}

impl SensorFan {
    /// Creates a fan with the angles from [`SensorFan::layout`].
    pub fn new(step: f32, sweep: f32, max_range: f32) -> Self {
        Self {
            directions: Self::layout(step, sweep),
            max_range,
        }
    }

    /// Ray directions for angle 0 followed by `+a, -a` pairs for
    /// `a = step, 2 * step, ...` while `a < sweep`.
    ///
    /// An angle `a` maps to `(sin a, cos a)`, so angle 0 points along the
    /// agent's forward axis. At most [`MAX_SENSOR_RAYS`] rays are laid out.
    pub fn layout(step: f32, sweep: f32) -> Vec<Point2> {
        let mut angles = vec![0.0_f32];
        let mut angle = step;
        while angle < sweep && angles.len() + 2 <= MAX_SENSOR_RAYS {
            angles.push(angle);
            angles.push(-angle);
            angle += step;
        }

        angles
            .into_iter()
            .map(|a| coord! { x: a.sin(), y: a.cos() })
            .collect()
    }

    /// Unrotated ray directions.
    pub fn directions(&self) -> &[Point2] {
        &self.directions
    }

    /// Number of rays, i.e. readings per agent.
    pub fn len(&self) -> usize {
        self.directions.len()
    }

    /// Whether the fan has no rays.
    pub fn is_empty(&self) -> bool {
        self.directions.is_empty()
    }

    /// Distance reported by rays that hit nothing.
    pub fn max_range(&self) -> f32 {
        self.max_range
    }

    /// Ray directions rotated into the world frame of `transform`.
    pub fn rotated(&self, transform: &Transform2D) -> Vec<Point2> {
        self.directions
            .iter()
            .map(|dir| rotate(*dir, transform.rot))
            .collect()
    }

    /// Casts the fan from `transform` and writes one distance per ray.
    pub fn sample(&self, transform: &Transform2D, borders: &BorderIndex, out: &mut [f32]) {
        let rays = self.rotated(transform);
        borders.raycast(transform.pos, &rays, self.max_range, out);
    }

    /// World-space segments from the agent to each reading, for overlays.
    pub fn ray_segments(&self, transform: &Transform2D, readings: &[f32]) -> Vec<LineSegment> {
        self.rotated(transform)
            .into_iter()
            .zip(readings)
            .map(|(dir, distance)| LineSegment::new(transform.pos, transform.pos + dir * *distance))
            .collect()
    }
}
