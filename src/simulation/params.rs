use std::f32::consts::PI;

use serde::{Deserialize, Serialize};

use super::error::{Result, SimulationError};
use super::geometry::Transform2D;
use super::sensors::MAX_SENSOR_RAYS;

/// Default minimum number of cleanly separated segments per border child.
pub const BORDER_MIN_UNIQUE: usize = 8;
/// Default minimum number of cleanly separated triangles per surface child.
pub const SURFACE_MIN_UNIQUE: usize = 3;
/// Controller outputs: acceleration and turn rate.
pub const CONTROL_OUTPUTS: usize = 2;
/// Controller inputs that precede the sensor readings: relative velocity.
pub const VELOCITY_INPUTS: usize = 2;

/// Checks that `rate` is a usable mutation rate: finite, non-negative, and
/// small enough that the range `[-rate, rate]` has a finite width.
pub fn check_mutation_rate(rate: f32) -> Result<()> {
    if rate.is_finite() && rate >= 0.0 && (2.0 * rate).is_finite() {
        Ok(())
    } else {
        Err(SimulationError::InvalidParams(format!(
            "mutation_rate must be finite, non-negative and at most {}, got {rate}",
            f32::MAX / 2.0
        )))
    }
}

/// Simulation parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Params {
    /// Agents spawned per generation.
    pub population_size: usize,
    /// Bound of the uniform perturbation applied to champion clones.
    pub mutation_rate: f32,
    /// Hidden layer widths; input and output widths are derived.
    pub hidden_layers: Vec<usize>,
    /// Angular step between neighbouring sensor rays (radians).
    pub sensor_step: f32,
    /// Rays are laid out while their angle is below this (radians).
    pub sensor_sweep: f32,
    /// Maximum sensor distance; rays that hit nothing report this.
    pub max_sensor_range: f32,
    /// Pose every agent starts a generation from.
    pub start_pose: Transform2D,
    /// Split threshold of the border index.
    pub border_min_unique: usize,
    /// Split threshold of the surface index.
    pub surface_min_unique: usize,
    /// Start the next generation as soon as every agent is culled.
    pub auto_restart: bool,
    /// Seed for controller genesis and mutation; entropy when unset.
    pub seed: Option<u64>,
}

impl Default for Params {
    fn default() -> Self {
        Self {
            population_size: 50,
            mutation_rate: 0.05,
            hidden_layers: vec![10, 10],
            sensor_step: 0.25,
            sensor_sweep: 1.6,
            max_sensor_range: 50.0,
            start_pose: Transform2D::default(),
            border_min_unique: BORDER_MIN_UNIQUE,
            surface_min_unique: SURFACE_MIN_UNIQUE,
            auto_restart: true,
            seed: None,
        }
    }
}

impl Params {
    /// Checks every parameter for a usable value.
    pub fn validate(&self) -> Result<()> {
        let fail = |reason: &str| Err(SimulationError::InvalidParams(reason.to_owned()));

        if self.population_size == 0 {
            return fail("population_size must be at least 1");
        }
        check_mutation_rate(self.mutation_rate)?;
        if self.hidden_layers.contains(&0) {
            return fail("hidden layer widths must be non-zero");
        }
        if !(self.sensor_step > 0.0 && self.sensor_step.is_finite()) {
            return fail("sensor_step must be positive");
        }
        if !(0.0..=PI).contains(&self.sensor_sweep) {
            return fail("sensor_sweep must be within [0, pi]");
        }
        if self.sensor_sweep / self.sensor_step > (MAX_SENSOR_RAYS / 2) as f32 {
            return fail("sensor_step is too small for sensor_sweep");
        }
        if !(self.max_sensor_range > 0.0 && self.max_sensor_range.is_finite()) {
            return fail("max_sensor_range must be positive");
        }
        if self.border_min_unique == 0 || self.surface_min_unique == 0 {
            return fail("split thresholds must be at least 1");
        }
        Ok(())
    }

    /// Uses `pose` as the start pose unless one was configured, i.e. unless
    /// the start pose differs from the default at the origin.
    pub fn default_start_pose(&mut self, pose: Transform2D) {
        if self.start_pose == Transform2D::default() {
            self.start_pose = pose;
        }
    }

    /// Controller layer widths for a fan of `rays` sensors.
    pub fn layer_sizes(&self, rays: usize) -> Vec<usize> {
        std::iter::once(VELOCITY_INPUTS + rays)
            .chain(self.hidden_layers.iter().copied())
            .chain(std::iter::once(CONTROL_OUTPUTS))
            .collect()
    }

    /// Saves the parameters as pretty JSON.
    pub fn save_to_file(&self, path: impl AsRef<std::path::Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Loads and validates parameters from a JSON file. Missing fields take
    /// their defaults.
    pub fn load_from_file(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        let params: Self = serde_json::from_str(&json)?;
        params.validate()?;
        Ok(params)
    }
}
