//! Spatial index over the drivable triangles, answering membership queries.

use std::ops::ControlFlow;

use super::error::Result;
use super::geometry::{Axis, Point2, TrackTriangle, rect_contains};
use super::kd_tree::{KdTree, Primitive, Side};

impl Primitive for TrackTriangle {
    const KIND: &'static str = "surface";

    fn centroid(&self) -> Point2 {
        let [a, b, c] = self.to_array();
        (a + b + c) / 3.0
    }

    fn classify(&self, axis: Axis, split: f32) -> Side {
        let below = self
            .to_array()
            .iter()
            .filter(|p| axis.of(**p) < split)
            .count();

        match below {
            0 => Side::Upper,
            3 => Side::Lower,
            _ => Side::Straddle,
        }
    }

    fn vertices(&self) -> impl Iterator<Item = Point2> {
        self.to_array().into_iter()
    }
}

/// Drivable area partitioned for point-membership tests.
#[derive(Debug, Clone)]
pub struct SurfaceIndex {
    tree: KdTree<TrackTriangle>,
}

impl SurfaceIndex {
    /// Builds the index. Fails on an empty triangle set.
    pub fn build(triangles: Vec<TrackTriangle>, min_unique: usize) -> Result<Self> {
        Ok(Self {
            tree: KdTree::build(triangles, min_unique)?,
        })
    }

    /// The underlying tree.
    pub fn tree(&self) -> &KdTree<TrackTriangle> {
        &self.tree
    }

    /// Whether `point` lies on any triangle of the surface.
    pub fn contains(&self, point: Point2) -> bool {
        self.tree
            .walk(
                |bounds| rect_contains(bounds, point),
                |leaf| {
                    if leaf.primitives.iter().any(|t| triangle_contains(t, point)) {
                        ControlFlow::Break(())
                    } else {
                        ControlFlow::Continue(())
                    }
                },
            )
            .is_some()
    }
}

/// Barycentric point-in-triangle test; edges count as inside.
///
/// Evaluated in `f64`. Zero-area triangles divide by zero and give
/// meaningless results.
pub fn triangle_contains(triangle: &TrackTriangle, point: Point2) -> bool {
    let [v0, v1, v2] = triangle.to_array().map(|v| (f64::from(v.x), f64::from(v.y)));
    let (px, py) = (f64::from(point.x), f64::from(point.y));

    let denominator = (v1.1 - v2.1) * (v0.0 - v2.0) + (v2.0 - v1.0) * (v0.1 - v2.1);
    let a = ((v1.1 - v2.1) * (px - v2.0) + (v2.0 - v1.0) * (py - v2.1)) / denominator;
    let b = ((v2.1 - v0.1) * (px - v2.0) + (v0.0 - v2.0) * (py - v2.1)) / denominator;
    let c = 1.0 - a - b;

    a >= 0.0 && b >= 0.0 && c >= 0.0
}
