//! Agents of the running generation and the results of culled ones.
//!
//! Each agent owns all of its state, so culling never has to keep parallel
//! collections in step. Off-track agents are marked during the tick and
//! compacted out in one pass afterwards, preserving the order of survivors.

use std::fmt;

use geo::coord;
use ndarray::Array1;
use serde::{Deserialize, Serialize};
use tracing::trace;

use super::borders::BorderIndex;
use super::controller::NeuralController;
use super::dynamics::{self, Controls};
use super::error::{Result, SimulationError};
use super::geometry::{Point2, Transform2D, rotate};
use super::sensors::SensorFan;
use super::surface::SurfaceIndex;

/// Identifier of an agent, unique within its generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AgentId(pub u32);

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Fitness of an agent: forward distance per elapsed tick, 0 before the
/// first tick.
#[inline]
pub fn fitness(forward_distance: f32, elapsed_ticks: u64) -> f32 {
    if elapsed_ticks == 0 {
        0.0
    } else {
        forward_distance / elapsed_ticks as f32
    }
}

/// One simulated car.
#[derive(Debug, Clone)]
pub struct Agent {
    /// Identifier within the generation.
    pub id: AgentId,
    /// Pose.
    pub transform: Transform2D,
    /// Velocity in world units per tick.
    pub velocity: Point2,
    /// Controls chosen on the last tick.
    pub controls: Controls,
    /// Sum of per-tick velocity projected on the heading.
    pub forward_distance: f32,
    /// Sum of absolute heading changes.
    pub turn_magnitude: f32,
    /// Sensor distances from the last tick, one per ray.
    pub readings: Vec<f32>,
    /// The controller driving this agent.
    pub controller: NeuralController,
    on_track: bool,
}

impl Agent {
    /// Creates an agent at rest at `start` with zeroed accumulators.
    pub fn new(id: AgentId, start: Transform2D, controller: NeuralController, rays: usize) -> Self {
        Self {
            id,
            transform: start,
            velocity: coord! { x: 0.0, y: 0.0 },
            controls: Controls::default(),
            forward_distance: 0.0,
            turn_magnitude: 0.0,
            readings: vec![0.0; rays],
            controller,
            on_track: true,
        }
    }

    /// Whether the last membership check found the agent on the surface.
    pub fn is_on_track(&self) -> bool {
        self.on_track
    }

    /// Controller input: velocity in the agent's frame, then the readings.
    pub fn controller_input(&self) -> Array1<f32> {
        let relative = rotate(self.velocity, -self.transform.rot);
        [relative.x, relative.y]
            .into_iter()
            .chain(self.readings.iter().copied())
            .collect()
    }

    /// Runs one tick for this agent: sense, think, move, then check whether
    /// it is still on the surface.
    ///
    /// Touches nothing but the agent itself, so agents can be stepped in
    /// parallel.
    pub fn step(
        &mut self,
        sensors: &SensorFan,
        borders: &BorderIndex,
        surface: &SurfaceIndex,
    ) -> Result<()> {
        sensors.sample(&self.transform, borders, &mut self.readings);
        self.controls = self.controller.controls(&self.controller_input())?;

        let delta = dynamics::step(&mut self.transform, &mut self.velocity, self.controls);
        self.forward_distance += delta.forward_distance;
        self.turn_magnitude += delta.turn;

        self.on_track = surface.contains(self.transform.pos);
        Ok(())
    }

    /// Marks the agent as off the surface; it is culled at the next compaction.
    pub fn mark_off_track(&mut self) {
        self.on_track = false;
    }
}

/// Fitness and controller of a culled agent.
#[derive(Debug, Clone)]
pub struct GenerationResult {
    /// Agent the result came from.
    pub agent: AgentId,
    /// Forward distance per tick survived.
    pub fitness: f32,
    /// Ticks elapsed when the agent was culled.
    pub ticks_survived: u64,
    /// Total heading change of the agent.
    pub turn_magnitude: f32,
    /// The agent's controller.
    pub controller: NeuralController,
}

impl GenerationResult {
    fn record(agent: Agent, elapsed_ticks: u64) -> Self {
        trace!(
            agent = %agent.id,
            forward = agent.forward_distance,
            ticks = elapsed_ticks,
            "culled agent"
        );
        Self {
            agent: agent.id,
            fitness: fitness(agent.forward_distance, elapsed_ticks),
            ticks_survived: elapsed_ticks,
            turn_magnitude: agent.turn_magnitude,
            controller: agent.controller,
        }
    }
}

/// Live agents plus the results recorded this generation.
///
/// The number of live agents plus recorded results never exceeds the
/// population size the generation was spawned with.
#[derive(Debug, Clone)]
pub struct Population {
    size: usize,
    agents: Vec<Agent>,
    results: Vec<GenerationResult>,
}

impl Population {
    /// Spawns one agent per controller at `start`.
    pub fn spawn(
        start: Transform2D,
        controllers: impl IntoIterator<Item = NeuralController>,
        rays: usize,
    ) -> Self {
        let agents: Vec<Agent> = controllers
            .into_iter()
            .zip(0..)
            .map(|(controller, id)| Agent::new(AgentId(id), start, controller, rays))
            .collect();

        Self {
            size: agents.len(),
            agents,
            results: Vec::new(),
        }
    }

    /// Number of agents the generation was spawned with.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Live agents in spawn order.
    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    /// Mutable access to the live agents.
    pub fn agents_mut(&mut self) -> &mut [Agent] {
        &mut self.agents
    }

    /// Results recorded so far, in cull order.
    pub fn results(&self) -> &[GenerationResult] {
        &self.results
    }

    /// Number of live agents.
    pub fn len(&self) -> usize {
        self.agents.len()
    }

    /// Whether every agent has been culled.
    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    /// Sensor readings of all live agents in (agent, ray) order.
    pub fn readings(&self) -> Vec<f32> {
        self.agents
            .iter()
            .flat_map(|agent| agent.readings.iter().copied())
            .collect()
    }

    /// Culls one live agent, recording its fitness.
    pub fn cull(&mut self, id: AgentId, elapsed_ticks: u64) -> Result<&GenerationResult> {
        let index = self
            .agents
            .iter()
            .position(|agent| agent.id == id)
            .ok_or(SimulationError::UnknownAgent(id))?;

        let agent = self.agents.remove(index);
        self.results.push(GenerationResult::record(agent, elapsed_ticks));
        self.check_size();
        Ok(&self.results[self.results.len() - 1])
    }

    /// Removes every agent marked off track, keeping survivors in order.
    /// Returns the number culled.
    pub fn cull_off_track(&mut self, elapsed_ticks: u64) -> usize {
        let (culled, alive): (Vec<Agent>, Vec<Agent>) = std::mem::take(&mut self.agents)
            .into_iter()
            .partition(|agent| !agent.on_track);
        self.agents = alive;

        let count = culled.len();
        self.results.extend(
            culled
                .into_iter()
                .map(|agent| GenerationResult::record(agent, elapsed_ticks)),
        );
        self.check_size();
        count
    }

    /// Culls every live agent.
    pub fn cull_all(&mut self, elapsed_ticks: u64) {
        for agent in &mut self.agents {
            agent.mark_off_track();
        }
        self.cull_off_track(elapsed_ticks);
    }

    /// The recorded result with the highest fitness; the earliest wins ties.
    pub fn champion(&self) -> Option<&GenerationResult> {
        self.results.iter().reduce(|best, result| {
            if result.fitness > best.fitness {
                result
            } else {
                best
            }
        })
    }

    /// Consumes the population, keeping only the champion.
    pub fn into_champion(self) -> Option<GenerationResult> {
        let best = self.champion().map(|champion| champion.agent)?;
        self.results.into_iter().find(|result| result.agent == best)
    }

    fn check_size(&self) {
        debug_assert!(
            self.agents.len() + self.results.len() <= self.size,
            "population holds more agents and results than it was spawned with"
        );
    }
}
