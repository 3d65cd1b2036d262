//! Axis-aligned binary space partition with duplicate-on-straddle semantics.
//!
//! This is not a median-split KD-tree. A leaf is split at the mean of its
//! primitives' centroids along whichever axis separates more primitives
//! cleanly; primitives crossing the split plane are copied into both
//! children. Nodes live in one flat vector and an internal node stores the
//! index of its first child, the second child sitting right after it.

use std::ops::ControlFlow;

use geo::Rect;
use tracing::debug;

use super::error::{Result, SimulationError};
use super::geometry::{AxisAlignedRect, Axis, Point2, bounding_rect};

/// Where a primitive lies relative to a split plane.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    /// Entirely below the split value.
    Lower,
    /// Entirely above the split value.
    Upper,
    /// Crossing the split value; goes to both children.
    Straddle,
}

/// Geometry that can be stored in a [`KdTree`].
pub trait Primitive: Clone + Send + Sync {
    /// Name used in error messages and logs.
    const KIND: &'static str;

    /// Point whose coordinates are averaged to place split planes.
    fn centroid(&self) -> Point2;

    /// Classifies the primitive against the plane `axis == split`.
    fn classify(&self, axis: Axis, split: f32) -> Side;

    /// Vertices used to compute the root bounds.
    fn vertices(&self) -> impl Iterator<Item = Point2>;
}

/// A node that owns primitives.
#[derive(Debug, Clone)]
pub struct KdLeaf<P> {
    /// Region covered by this leaf.
    pub bounds: AxisAlignedRect,
    /// Primitives reachable through this leaf.
    pub primitives: Vec<P>,
    /// Primitives assigned here without straddling the last split.
    pub unique: usize,
    /// Straddling copies accumulated along the path from the root.
    pub duplicates: usize,
}

/// A node of the flat tree.
#[derive(Debug, Clone)]
pub enum KdNode<P> {
    /// Terminal node holding primitives.
    Leaf(KdLeaf<P>),
    /// Split node; children sit at `children` and `children + 1`.
    Internal {
        /// Region covered by both children.
        bounds: AxisAlignedRect,
        /// Index of the lower child.
        children: usize,
    },
}

impl<P> KdNode<P> {
    /// Region covered by the node.
    pub fn bounds(&self) -> &AxisAlignedRect {
        match self {
            KdNode::Leaf(leaf) => &leaf.bounds,
            KdNode::Internal { bounds, .. } => bounds,
        }
    }

    /// Whether the node is a leaf.
    pub fn is_final(&self) -> bool {
        matches!(self, KdNode::Leaf(_))
    }
}

/// Flat duplicate-on-straddle KD-tree. Immutable after [`KdTree::build`].
#[derive(Debug, Clone)]
pub struct KdTree<P> {
    nodes: Vec<KdNode<P>>,
    depth: usize,
}

impl<P: Primitive> KdTree<P> {
    /// Builds the tree, rejecting splits that leave either child with fewer
    /// than `min_unique` cleanly assigned primitives.
    pub fn build(primitives: Vec<P>, min_unique: usize) -> Result<Self> {
        let bounds = bounding_rect(primitives.iter().flat_map(|p| p.vertices()))
            .ok_or(SimulationError::EmptyGeometry(P::KIND))?;
        if min_unique == 0 {
            return Err(SimulationError::InvalidParams(format!(
                "{} split threshold must be at least 1",
                P::KIND
            )));
        }

        let mut nodes = vec![KdNode::Leaf(KdLeaf {
            bounds,
            unique: primitives.len(),
            duplicates: 0,
            primitives,
        })];
        let mut depth = 0;
        let mut pending = vec![(0, 0)];

        while let Some((index, level)) = pending.pop() {
            depth = depth.max(level);
            let split = match &nodes[index] {
                KdNode::Leaf(leaf) => try_split(leaf, min_unique).map(|c| (leaf.bounds, c)),
                KdNode::Internal { .. } => None,
            };
            let Some((bounds, (lower, upper))) = split else {
                continue;
            };

            let children = nodes.len();
            nodes[index] = KdNode::Internal { bounds, children };
            nodes.push(KdNode::Leaf(lower));
            nodes.push(KdNode::Leaf(upper));
            pending.push((children + 1, level + 1));
            pending.push((children, level + 1));
        }

        let tree = Self { nodes, depth };
        debug!(
            kind = P::KIND,
            nodes = tree.nodes.len(),
            leaves = tree.leaves().count(),
            depth = tree.depth,
            "built kd-tree"
        );
        Ok(tree)
    }

    /// Walks the tree from the root with an explicit stack.
    ///
    /// Subtrees whose bounds fail `descend` are skipped. Leaves are handed
    /// to `visit`, which may stop the walk early by breaking with a value.
    pub fn walk<'a, B>(
        &'a self,
        mut descend: impl FnMut(&AxisAlignedRect) -> bool,
        mut visit: impl FnMut(&'a KdLeaf<P>) -> ControlFlow<B>,
    ) -> Option<B> {
        let mut stack = vec![0];

        while let Some(index) = stack.pop() {
            let node = &self.nodes[index];
            if !descend(node.bounds()) {
                continue;
            }
            match node {
                KdNode::Leaf(leaf) => {
                    if let ControlFlow::Break(value) = visit(leaf) {
                        return Some(value);
                    }
                }
                KdNode::Internal { children, .. } => {
                    stack.push(children + 1);
                    stack.push(*children);
                }
            }
        }

        None
    }
}

impl<P> KdTree<P> {
    /// All nodes in storage order; the root is at index 0.
    pub fn nodes(&self) -> &[KdNode<P>] {
        &self.nodes
    }

    /// Leaves in storage order.
    pub fn leaves(&self) -> impl Iterator<Item = &KdLeaf<P>> {
        self.nodes.iter().filter_map(|node| match node {
            KdNode::Leaf(leaf) => Some(leaf),
            KdNode::Internal { .. } => None,
        })
    }

    /// Bounds of every leaf, for debug overlays.
    pub fn leaf_bounds(&self) -> Vec<AxisAlignedRect> {
        self.leaves().map(|leaf| leaf.bounds).collect()
    }

    /// Number of edges on the longest root-to-leaf path.
    pub fn depth(&self) -> usize {
        self.depth
    }
}

fn try_split<P: Primitive>(leaf: &KdLeaf<P>, min_unique: usize) -> Option<(KdLeaf<P>, KdLeaf<P>)> {
    if leaf.primitives.len() < 3 {
        return None;
    }

    let [x, y] = Axis::ALL.map(|axis| split_along(leaf, axis));
    let (lower, upper) = if x.0.unique + x.1.unique > y.0.unique + y.1.unique {
        x
    } else {
        y
    };

    if lower.unique.min(upper.unique) < min_unique {
        return None;
    }
    Some((lower, upper))
}

fn split_along<P: Primitive>(leaf: &KdLeaf<P>, axis: Axis) -> (KdLeaf<P>, KdLeaf<P>) {
    let split = leaf
        .primitives
        .iter()
        .map(|p| axis.of(p.centroid()))
        .sum::<f32>()
        / leaf.primitives.len() as f32;

    let (min, max) = (leaf.bounds.min(), leaf.bounds.max());
    let plane = split.clamp(axis.of(min), axis.of(max));
    let empty = |bounds| KdLeaf {
        bounds,
        primitives: Vec::new(),
        unique: 0,
        duplicates: leaf.duplicates,
    };
    let mut lower = empty(Rect::new(min, axis.with(max, plane)));
    let mut upper = empty(Rect::new(axis.with(min, plane), max));

    for primitive in &leaf.primitives {
        match primitive.classify(axis, split) {
            Side::Lower => {
                lower.primitives.push(primitive.clone());
                lower.unique += 1;
            }
            Side::Upper => {
                upper.primitives.push(primitive.clone());
                upper.unique += 1;
            }
            Side::Straddle => {
                lower.primitives.push(primitive.clone());
                upper.primitives.push(primitive.clone());
                lower.duplicates += 1;
                upper.duplicates += 1;
            }
        }
    }

    (lower, upper)
}
