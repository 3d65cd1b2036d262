//! # Racer - Neuro-Evolved Track Racing
//!
//! A population of cars learns to follow a closed track. Each car is driven by
//! a small feed-forward network fed with raycast distances to the track
//! border; cars that leave the drivable surface are culled and the fittest
//! controller of each generation seeds the next one through mutation.
//!
//! ## Features
//!
//! - Duplicate-on-straddle KD-trees over border segments and surface triangles
//! - Raycast sensor fan with distance-pruned tree queries
//! - Damped point-mass vehicle integration
//! - Softsign MLP controllers with uniform mutation
//! - Generational selection with parallel per-agent updates
//! - Presentation snapshots for an external renderer
//!
//! ## Core Modules
//!
//! - [`simulation::kd_tree`] - Spatial partition shared by both indices
//! - [`simulation::borders`] - Raycasts against the track boundary
//! - [`simulation::surface`] - Point-in-track membership
//! - [`simulation::controller`] - Neural network implementation
//! - [`simulation::evolution`] - Tick pipeline and generation lifecycle

/// Core simulation logic and data structures.
pub mod simulation {
    /// Spatial index over boundary segments.
    pub mod borders;
    /// Neural network controllers.
    pub mod controller;
    /// Vehicle integration.
    pub mod dynamics;
    /// Error types.
    pub mod error;
    /// Generational evolution engine.
    pub mod evolution;
    /// Presentation snapshots.
    pub mod frame;
    /// Geometry primitives and helpers.
    pub mod geometry;
    /// Generic duplicate-on-straddle KD-tree.
    pub mod kd_tree;
    /// Simulation parameters.
    pub mod params;
    /// Agents and generation results.
    pub mod population;
    /// Raycast sensor fan.
    pub mod sensors;
    /// Spatial index over drivable triangles.
    pub mod surface;
    /// Track meshes and derived geometry.
    pub mod track;
}
