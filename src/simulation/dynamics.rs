//! Vehicle integration.
//!
//! A damped velocity pushed along the heading, one unit timestep per tick.

use serde::{Deserialize, Serialize};

use super::geometry::{Point2, Transform2D, dot};

/// Fraction of velocity kept from the previous tick.
pub const VELOCITY_RETENTION: f32 = 0.4;
/// Velocity gained per tick at full acceleration.
pub const ACCELERATION_GAIN: f32 = 0.08;
/// Heading change per tick is `turn_rate / TURN_DIVISOR`.
pub const TURN_DIVISOR: f32 = 2.0;

/// Controller outputs driving one agent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Controls {
    /// Forward acceleration, nominally in (-1, 1).
    pub acceleration: f32,
    /// Turn rate, nominally in (-1, 1).
    pub turn_rate: f32,
}

/// What one integration step did, used for fitness bookkeeping.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StepDelta {
    /// New velocity projected on the new forward direction.
    pub forward_distance: f32,
    /// Absolute heading change.
    pub turn: f32,
}

/// Advances `transform` and `velocity` by one tick under `controls`.
///
/// The heading is updated first and the acceleration applied along the new
/// heading.
#[inline]
pub fn step(transform: &mut Transform2D, velocity: &mut Point2, controls: Controls) -> StepDelta {
    let turn = controls.turn_rate / TURN_DIVISOR;
    transform.rot += turn;

    let forward = transform.forward();
    *velocity = *velocity * VELOCITY_RETENTION + forward * controls.acceleration * ACCELERATION_GAIN;
    transform.pos = transform.pos + *velocity;

    StepDelta {
        forward_distance: dot(*velocity, forward),
        turn: turn.abs(),
    }
}
