use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use racer::simulation::evolution::EvolutionEngine;
use racer::simulation::frame::FrameOptions;
use racer::simulation::geometry::Transform2D;
use racer::simulation::params::Params;
use racer::simulation::track::TrackMesh;

#[derive(Parser)]
#[command(name = "racer")]
#[command(about = "Evolve neural track racers without a window")]
struct Args {
    /// JSON parameter file; defaults are used when omitted
    #[arg(long)]
    config: Option<PathBuf>,

    /// Wavefront mesh of the drivable area; a ring track when omitted
    #[arg(long)]
    map: Option<PathBuf>,

    /// Scale applied to map vertices
    #[arg(long, default_value_t = 1.0)]
    scale: f32,

    /// Number of generations to run
    #[arg(long, default_value_t = 20)]
    generations: u64,

    /// Ticks after which a generation is ended
    #[arg(long, default_value_t = 2000)]
    max_ticks: u64,

    /// Override the population size
    #[arg(long)]
    population: Option<usize>,

    /// Override the mutation rate
    #[arg(long)]
    mutation_rate: Option<f32>,

    /// Override the random seed
    #[arg(long)]
    seed: Option<u64>,

    /// Write the final frame, with rays and leaf bounds, as JSON
    #[arg(long)]
    frame_out: Option<PathBuf>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::filter::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();

    let mut params = match &args.config {
        Some(path) => Params::load_from_file(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => Params::default(),
    };
    if let Some(size) = args.population {
        params.population_size = size;
    }
    if let Some(rate) = args.mutation_rate {
        params.mutation_rate = rate;
    }
    if args.seed.is_some() {
        params.seed = args.seed;
    }

    let mesh = match &args.map {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read map {}", path.display()))?;
            TrackMesh::parse_obj(&text, args.scale)
                .with_context(|| format!("failed to parse map {}", path.display()))?
        }
        None => {
            // Ring of radius 40..60; start on the right, facing counter-clockwise.
            params.default_start_pose(Transform2D::new(50.0, 0.0, 0.0));
            TrackMesh::ring(40.0, 60.0, 48)
        }
    };
    let track = mesh.to_track().context("invalid track mesh")?;
    info!(
        triangles = track.surface.len(),
        borders = track.borders.len(),
        "loaded track"
    );

    let mut engine = EvolutionEngine::new(params, track).context("failed to build simulation")?;

    for _ in 0..args.generations {
        let generation = engine.generation();
        let champion = engine.run_generation(args.max_ticks)?;
        println!(
            "generation {:>4}  fitness {:>9.5}  survived {:>5} ticks",
            generation, champion.fitness, champion.ticks_survived
        );
    }

    if let Some(path) = &args.frame_out {
        let frame = engine.frame(FrameOptions {
            rays: true,
            leaf_bounds: true,
        });
        let json = serde_json::to_string_pretty(&frame)?;
        std::fs::write(path, json)
            .with_context(|| format!("failed to write frame {}", path.display()))?;
    }

    Ok(())
}
