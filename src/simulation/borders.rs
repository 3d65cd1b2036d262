//! Spatial index over the track boundary, answering raycast queries.

use std::ops::ControlFlow;

use geo::coord;

use super::error::Result;
use super::geometry::{
    AxisAlignedRect, Axis, LineSegment, Point2, cross, dot, rect_contains, rect_point_distance,
};
use super::kd_tree::{KdLeaf, KdTree, Primitive, Side};

/// Rays closer than this to parallel with a segment never hit it.
pub const PARALLEL_EPSILON: f32 = 0.000_001;

impl Primitive for LineSegment {
    const KIND: &'static str = "border";

    fn centroid(&self) -> Point2 {
        (self.start + self.end) / 2.0
    }

    fn classify(&self, axis: Axis, split: f32) -> Side {
        let (a, b) = (axis.of(self.start), axis.of(self.end));
        let (min, max) = (a.min(b), a.max(b));

        if min <= split && split <= max {
            Side::Straddle
        } else if min < split {
            Side::Lower
        } else {
            Side::Upper
        }
    }

    fn vertices(&self) -> impl Iterator<Item = Point2> {
        [self.start, self.end].into_iter()
    }
}

/// Boundary segments partitioned for nearest-hit raycasts.
#[derive(Debug, Clone)]
pub struct BorderIndex {
    tree: KdTree<LineSegment>,
}

impl BorderIndex {
    /// Builds the index. Fails on an empty segment set.
    pub fn build(segments: Vec<LineSegment>, min_unique: usize) -> Result<Self> {
        Ok(Self {
            tree: KdTree::build(segments, min_unique)?,
        })
    }

    /// The underlying tree.
    pub fn tree(&self) -> &KdTree<LineSegment> {
        &self.tree
    }

    /// Leaves whose bounds lie within `max_range` of `origin`.
    pub fn candidate_leaves(&self, origin: Point2, max_range: f32) -> Vec<&KdLeaf<LineSegment>> {
        let mut leaves = Vec::new();
        self.tree.walk(
            |bounds| rect_point_distance(bounds, origin) <= max_range,
            |leaf| {
                leaves.push(leaf);
                ControlFlow::<()>::Continue(())
            },
        );
        leaves
    }

    /// Casts one ray per entry of `directions` from `origin`, writing the hit
    /// distance of each into `out`. Rays that hit nothing report `max_range`.
    ///
    /// `directions` are expected to be unit length so that the ray parameter
    /// is a distance.
    pub fn raycast(&self, origin: Point2, directions: &[Point2], max_range: f32, out: &mut [f32]) {
        debug_assert_eq!(directions.len(), out.len());
        let leaves = self.candidate_leaves(origin, max_range);

        for (dir, result) in directions.iter().zip(out.iter_mut()) {
            let mut nearest = max_range;
            for leaf in leaves
                .iter()
                .filter(|leaf| ray_crosses_rect(origin, *dir, &leaf.bounds))
            {
                for segment in &leaf.primitives {
                    if let Some(t) = ray_segment_intersection(origin, *dir, segment) {
                        nearest = nearest.min(t);
                    }
                }
            }
            *result = nearest;
        }
    }

    /// Single-ray convenience over [`BorderIndex::raycast`].
    pub fn raycast_one(&self, origin: Point2, direction: Point2, max_range: f32) -> f32 {
        let mut out = [max_range];
        self.raycast(origin, &[direction], max_range, &mut out);
        out[0]
    }
}

/// Ray parameter at which `origin + t * dir` meets `segment`, if it does.
///
/// Near-parallel pairs are rejected; the hit must be in front of the origin
/// and within the segment's endpoints.
#[inline]
pub fn ray_segment_intersection(origin: Point2, dir: Point2, segment: &LineSegment) -> Option<f32> {
    let v1 = origin - segment.start;
    let v2 = segment.end - segment.start;
    let v3 = coord! { x: -dir.y, y: dir.x };

    let denom = dot(v2, v3);
    if denom.abs() < PARALLEL_EPSILON {
        return None;
    }

    let t = cross(v2, v1) / denom;
    let s = dot(v1, v3) / denom;

    (t >= 0.0 && (0.0..=1.0).contains(&s)).then_some(t)
}

/// Approximate test of whether a ray enters `rect`: the origin lies inside,
/// or the ray meets one of the two diagonals.
#[inline]
pub fn ray_crosses_rect(origin: Point2, dir: Point2, rect: &AxisAlignedRect) -> bool {
    if rect_contains(rect, origin) {
        return true;
    }

    let (min, max) = (rect.min(), rect.max());
    let diagonals = [
        LineSegment::new(min, max),
        LineSegment::new(coord! { x: min.x, y: max.y }, coord! { x: max.x, y: min.y }),
    ];
    diagonals
        .iter()
        .any(|diagonal| ray_segment_intersection(origin, dir, diagonal).is_some())
}
