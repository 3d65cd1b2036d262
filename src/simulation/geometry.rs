//! 2-D geometry primitives shared by the spatial indices and the agents.
//!
//! Segments, triangles and rectangles are the `geo` crate's types over `f32`;
//! this module adds the handful of vector helpers the simulation needs on top.

use geo::{Coord, Line, Rect, Triangle, coord};
use serde::{Deserialize, Serialize};

/// A 2-D point or vector.
pub type Point2 = Coord<f32>;
/// A boundary segment of the track.
pub type LineSegment = Line<f32>;
/// A triangle of the drivable surface.
pub type TrackTriangle = Triangle<f32>;
/// An axis-aligned rectangle.
pub type AxisAlignedRect = Rect<f32>;

/// One of the two split axes of the KD-tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    /// Horizontal axis.
    X,
    /// Vertical axis.
    Y,
}

impl Axis {
    /// Both axes in the order candidate splits are evaluated.
    pub const ALL: [Axis; 2] = [Axis::X, Axis::Y];

    /// Returns the component of `p` along this axis.
    #[inline]
    pub fn of(self, p: Point2) -> f32 {
        match self {
            Axis::X => p.x,
            Axis::Y => p.y,
        }
    }

    /// Returns `p` with its component along this axis replaced by `value`.
    #[inline]
    pub fn with(self, p: Point2, value: f32) -> Point2 {
        match self {
            Axis::X => coord! { x: value, y: p.y },
            Axis::Y => coord! { x: p.x, y: value },
        }
    }
}

/// Position and heading of an agent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform2D {
    /// Position in map units.
    #[serde(with = "point_serde")]
    pub pos: Point2,
    /// Heading in radians.
    pub rot: f32,
}

impl Transform2D {
    /// Creates a transform at `(x, y)` with heading `rot`.
    pub fn new(x: f32, y: f32, rot: f32) -> Self {
        Self {
            pos: coord! { x: x, y: y },
            rot,
        }
    }

    /// Unit vector the agent is facing, `(sin(-rot), cos(-rot))`.
    #[inline]
    pub fn forward(&self) -> Point2 {
        let rot = -self.rot;
        coord! { x: rot.sin(), y: rot.cos() }
    }
}

impl Default for Transform2D {
    fn default() -> Self {
        Self::new(0.0, 0.0, 0.0)
    }
}

/// Dot product of two vectors.
#[inline]
pub fn dot(a: Point2, b: Point2) -> f32 {
    a.x * b.x + a.y * b.y
}

/// Z component of the 3-D cross product of two planar vectors.
#[inline]
pub fn cross(a: Point2, b: Point2) -> f32 {
    a.x * b.y - a.y * b.x
}

/// Rotates `v` counter-clockwise by `angle` radians.
#[inline]
pub fn rotate(v: Point2, angle: f32) -> Point2 {
    let (sin, cos) = angle.sin_cos();
    coord! {
        x: cos * v.x - sin * v.y,
        y: sin * v.x + cos * v.y
    }
}

/// Euclidean distance from `p` to the closest point of `rect` (0 inside).
#[inline]
pub fn rect_point_distance(rect: &AxisAlignedRect, p: Point2) -> f32 {
    let (min, max) = (rect.min(), rect.max());
    let dx = (min.x - p.x).max(0.0).max(p.x - max.x);
    let dy = (min.y - p.y).max(0.0).max(p.y - max.y);
    dx.hypot(dy)
}

/// Whether `p` lies inside `rect`, boundary included.
#[inline]
pub fn rect_contains(rect: &AxisAlignedRect, p: Point2) -> bool {
    let (min, max) = (rect.min(), rect.max());
    p.x >= min.x && p.x <= max.x && p.y >= min.y && p.y <= max.y
}

/// Smallest rectangle holding every point, or `None` for an empty iterator.
pub fn bounding_rect(points: impl IntoIterator<Item = Point2>) -> Option<AxisAlignedRect> {
    let mut points = points.into_iter();
    let first = points.next()?;
    let (min, max) = points.fold((first, first), |(min, max), p| {
        (
            coord! { x: min.x.min(p.x), y: min.y.min(p.y) },
            coord! { x: max.x.max(p.x), y: max.y.max(p.y) },
        )
    });
    Some(Rect::new(min, max))
}

/// Serde adapter storing a point as `[x, y]`.
pub(crate) mod point_serde {
    use super::Point2;
    use geo::coord;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(p: &Point2, serializer: S) -> Result<S::Ok, S::Error> {
        [p.x, p.y].serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Point2, D::Error> {
        let [x, y] = <[f32; 2]>::deserialize(deserializer)?;
        Ok(coord! { x: x, y: y })
    }
}
