//! Generational evolution loop.
//!
//! The engine owns the static track indices and the population. Each tick
//! steps every live agent in parallel, then culls the ones that left the
//! surface in a single-threaded commit. A restart keeps only the fittest
//! controller and respawns the whole population as mutated clones of it.

use rand::SeedableRng;
use rand::rngs::StdRng;
use rayon::prelude::*;
use tracing::{debug, info};

use super::borders::BorderIndex;
use super::controller::NeuralController;
use super::error::{Result, SimulationError};
use super::frame::{Frame, FrameOptions, rect_corners, segment_corners};
use super::params::{Params, check_mutation_rate};
use super::population::{GenerationResult, Population};
use super::sensors::SensorFan;
use super::surface::SurfaceIndex;
use super::track::Track;

/// Lifecycle of the current generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationState {
    /// At least one agent is still racing.
    Running,
    /// Every agent has been culled; waiting for a restart.
    Complete,
}

/// Outcome of one [`EvolutionEngine::tick`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickReport {
    /// Generation the tick ran in.
    pub generation: u64,
    /// Ticks elapsed in that generation after this one.
    pub tick: u64,
    /// Agents culled on this tick.
    pub culled: usize,
    /// Agents still racing.
    pub alive: usize,
    /// State after the tick.
    pub state: GenerationState,
}

/// Owns the population and drives sensing, inference, physics and selection.
#[derive(Debug)]
pub struct EvolutionEngine {
    params: Params,
    borders: BorderIndex,
    surface: SurfaceIndex,
    sensors: SensorFan,
    population: Population,
    champion: Option<GenerationResult>,
    state: GenerationState,
    generation: u64,
    elapsed: u64,
    rng: StdRng,
}

impl EvolutionEngine {
    /// Builds both indices from `track` and spawns a random first generation.
    pub fn new(params: Params, track: Track) -> Result<Self> {
        params.validate()?;

        let borders = BorderIndex::build(track.borders, params.border_min_unique)?;
        let surface = SurfaceIndex::build(track.surface, params.surface_min_unique)?;
        let sensors = SensorFan::new(
            params.sensor_step,
            params.sensor_sweep,
            params.max_sensor_range,
        );

        let mut rng = match params.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };

        let layer_sizes = params.layer_sizes(sensors.len());
        let controllers = (0..params.population_size)
            .map(|_| NeuralController::new_random(&layer_sizes, &mut rng))
            .collect::<Result<Vec<_>>>()?;
        let population = Population::spawn(params.start_pose, controllers, sensors.len());

        info!(
            agents = population.len(),
            rays = sensors.len(),
            layers = ?layer_sizes,
            border_depth = borders.tree().depth(),
            surface_depth = surface.tree().depth(),
            "spawned first generation"
        );

        Ok(Self {
            params,
            borders,
            surface,
            sensors,
            population,
            champion: None,
            state: GenerationState::Running,
            generation: 0,
            elapsed: 0,
            rng,
        })
    }

    /// Advances the generation by one tick.
    ///
    /// A complete generation is restarted first when `auto_restart` is set;
    /// otherwise the tick does nothing until [`EvolutionEngine::restart`] is
    /// called.
    pub fn tick(&mut self) -> Result<TickReport> {
        if self.state == GenerationState::Complete {
            if !self.params.auto_restart {
                return Ok(self.report(0));
            }
            self.restart()?;
        }

        self.elapsed += 1;

        let (sensors, borders, surface) = (&self.sensors, &self.borders, &self.surface);
        self.population
            .agents_mut()
            .par_iter_mut()
            .try_for_each(|agent| agent.step(sensors, borders, surface))?;

        let culled = self.population.cull_off_track(self.elapsed);
        if self.population.is_empty() {
            self.state = GenerationState::Complete;
            debug!(
                generation = self.generation,
                ticks = self.elapsed,
                "every agent culled"
            );
        }

        Ok(self.report(culled))
    }

    /// Ticks until the generation completes or `max_ticks` elapse, then
    /// restarts. Returns the champion that seeded the next generation.
    pub fn run_generation(&mut self, max_ticks: u64) -> Result<&GenerationResult> {
        while self.state == GenerationState::Running && self.elapsed < max_ticks {
            self.tick()?;
        }
        self.restart()?;
        self.champion.as_ref().ok_or(SimulationError::NoCandidates)
    }

    /// Ends the current generation and spawns the next one.
    ///
    /// Agents still racing are culled first so that they compete too. The
    /// fittest result becomes the champion and every new agent gets its own
    /// mutated clone of the champion's controller. Pending population size
    /// and mutation rate take effect here. Fails with
    /// [`SimulationError::NoCandidates`] when there is nothing to select
    /// from, leaving the generation as it was.
    pub fn restart(&mut self) -> Result<()> {
        self.population.cull_all(self.elapsed);
        if self.population.champion().is_none() {
            return Err(SimulationError::NoCandidates);
        }

        let empty = Population::spawn(self.params.start_pose, Vec::new(), self.sensors.len());
        let champion = std::mem::replace(&mut self.population, empty)
            .into_champion()
            .ok_or(SimulationError::NoCandidates)?;

        let clones: Vec<NeuralController> = (0..self.params.population_size)
            .map(|_| {
                NeuralController::mutated(
                    &champion.controller,
                    self.params.mutation_rate,
                    &mut self.rng,
                )
            })
            .collect();
        self.population = Population::spawn(self.params.start_pose, clones, self.sensors.len());

        info!(
            generation = self.generation,
            fitness = champion.fitness,
            ticks = champion.ticks_survived,
            next_size = self.population.len(),
            "generation finished"
        );

        self.champion = Some(champion);
        self.state = GenerationState::Running;
        self.generation += 1;
        self.elapsed = 0;
        Ok(())
    }

    /// Sets the population size used from the next restart on.
    pub fn set_population_size(&mut self, size: usize) -> Result<()> {
        if size == 0 {
            return Err(SimulationError::InvalidParams(
                "population_size must be at least 1".to_owned(),
            ));
        }
        self.params.population_size = size;
        Ok(())
    }

    /// Sets the mutation rate used from the next restart on.
    pub fn set_mutation_rate(&mut self, rate: f32) -> Result<()> {
        check_mutation_rate(rate)?;
        self.params.mutation_rate = rate;
        Ok(())
    }

    /// Best fitness to display: the best result of the running generation,
    /// or the previous champion's before anything has been culled.
    pub fn champion_fitness(&self) -> Option<f32> {
        self.population
            .champion()
            .or(self.champion.as_ref())
            .map(|result| result.fitness)
    }

    /// Builds the presentation snapshot for the current tick.
    pub fn frame(&self, options: FrameOptions) -> Frame {
        let agents = self.population.agents();

        let rays = if options.rays {
            agents
                .iter()
                .flat_map(|agent| self.sensors.ray_segments(&agent.transform, &agent.readings))
                .map(|segment| segment_corners(&segment))
                .collect()
        } else {
            Vec::new()
        };

        let (border_leaves, surface_leaves) = if options.leaf_bounds {
            (
                self.borders.tree().leaf_bounds().iter().map(rect_corners).collect(),
                self.surface.tree().leaf_bounds().iter().map(rect_corners).collect(),
            )
        } else {
            (Vec::new(), Vec::new())
        };

        Frame {
            generation: self.generation,
            tick: self.elapsed,
            cars: agents.iter().map(|agent| agent.transform).collect(),
            rays,
            border_leaves,
            surface_leaves,
            champion_fitness: self.champion_fitness(),
        }
    }

    fn report(&self, culled: usize) -> TickReport {
        TickReport {
            generation: self.generation,
            tick: self.elapsed,
            culled,
            alive: self.population.len(),
            state: self.state,
        }
    }

    /// Parameters in effect, including pending population size and mutation rate.
    pub fn params(&self) -> &Params {
        &self.params
    }

    /// The running generation.
    pub fn population(&self) -> &Population {
        &self.population
    }

    /// Mutable access to the running generation, for hosts and tests.
    pub fn population_mut(&mut self) -> &mut Population {
        &mut self.population
    }

    /// Champion that seeded the running generation, if any.
    pub fn champion(&self) -> Option<&GenerationResult> {
        self.champion.as_ref()
    }

    /// Current lifecycle state.
    pub fn state(&self) -> GenerationState {
        self.state
    }

    /// Generation counter, starting at 0.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Ticks elapsed in the running generation.
    pub fn elapsed_ticks(&self) -> u64 {
        self.elapsed
    }

    /// The border index.
    pub fn borders(&self) -> &BorderIndex {
        &self.borders
    }

    /// The surface index.
    pub fn surface(&self) -> &SurfaceIndex {
        &self.surface
    }

    /// The sensor fan shared by all agents.
    pub fn sensors(&self) -> &SensorFan {
        &self.sensors
    }
}
