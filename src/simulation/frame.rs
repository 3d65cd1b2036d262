//! Snapshot of the simulation handed to a presentation layer each tick.

use serde::{Deserialize, Serialize};

use super::geometry::{AxisAlignedRect, LineSegment, Transform2D};

/// A segment or rectangle as two `[x, y]` corners.
pub type Corners = [[f32; 2]; 2];

/// Which optional overlays to include in a [`Frame`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameOptions {
    /// Include one segment per sensor ray of every live agent.
    pub rays: bool,
    /// Include the leaf bounds of both spatial indices.
    pub leaf_bounds: bool,
}

/// Everything a renderer needs for one tick.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    /// Generation counter, starting at 0.
    pub generation: u64,
    /// Ticks elapsed in the current generation.
    pub tick: u64,
    /// Poses of the live agents.
    pub cars: Vec<Transform2D>,
    /// Sensor rays from agent to hit point, when requested.
    pub rays: Vec<Corners>,
    /// Border index leaf bounds as `[min, max]`, when requested.
    pub border_leaves: Vec<Corners>,
    /// Surface index leaf bounds as `[min, max]`, when requested.
    pub surface_leaves: Vec<Corners>,
    /// Best fitness known for display.
    pub champion_fitness: Option<f32>,
}

/// Endpoints of a segment.
pub fn segment_corners(segment: &LineSegment) -> Corners {
    [
        [segment.start.x, segment.start.y],
        [segment.end.x, segment.end.y],
    ]
}

/// `[min, max]` corners of a rectangle.
pub fn rect_corners(rect: &AxisAlignedRect) -> Corners {
    let (min, max) = (rect.min(), rect.max());
    [[min.x, min.y], [max.x, max.y]]
}
