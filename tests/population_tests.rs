#![allow(missing_docs)]
#![allow(clippy::float_cmp)]

use std::f32::consts::FRAC_PI_2;

use geo::coord;
use rand::SeedableRng;
use rand::rngs::StdRng;
use racer::simulation::controller::NeuralController;
use racer::simulation::error::SimulationError;
use racer::simulation::geometry::Transform2D;
use racer::simulation::population::{AgentId, Population, fitness};

const RAYS: usize = 2;

fn create_test_population(size: usize) -> Population {
    let mut rng = StdRng::seed_from_u64(21);
    let controllers = (0..size)
        .map(|_| NeuralController::new_random(&[RAYS + 2, 4, 2], &mut rng).unwrap())
        .collect::<Vec<_>>();
    Population::spawn(Transform2D::new(5.0, 5.0, 0.0), controllers, RAYS)
}

#[test]
fn test_spawn() {
    let population = create_test_population(4);

    assert_eq!(population.len(), 4);
    assert_eq!(population.size(), 4);
    assert!(population.results().is_empty());
    for (i, agent) in population.agents().iter().enumerate() {
        assert_eq!(agent.id, AgentId(i as u32));
        assert_eq!(agent.transform, Transform2D::new(5.0, 5.0, 0.0));
        assert_eq!(agent.velocity, coord! { x: 0.0, y: 0.0 });
        assert_eq!(agent.forward_distance, 0.0);
        assert_eq!(agent.readings, vec![0.0; RAYS]);
        assert!(agent.is_on_track());
    }
}

#[test]
fn test_fitness_is_distance_per_tick() {
    assert_eq!(fitness(2.0, 10), 0.2);
    assert_eq!(fitness(-3.0, 3), -1.0);
    assert_eq!(fitness(5.0, 0), 0.0);
}

#[test]
fn test_cull_records_fitness() {
    let mut population = create_test_population(1);
    population.agents_mut()[0].forward_distance = 2.0;

    let result = population.cull(AgentId(0), 10).unwrap();
    assert_eq!(result.agent, AgentId(0));
    assert_eq!(result.fitness, 0.2);
    assert_eq!(result.ticks_survived, 10);

    assert!(population.is_empty());
    assert_eq!(population.results().len(), 1);
}

#[test]
fn test_cull_unknown_agent() {
    let mut population = create_test_population(2);
    population.cull(AgentId(1), 3).unwrap();

    assert!(matches!(
        population.cull(AgentId(1), 4),
        Err(SimulationError::UnknownAgent(AgentId(1)))
    ));
    assert!(matches!(
        population.cull(AgentId(99), 4),
        Err(SimulationError::UnknownAgent(_))
    ));
    assert_eq!(population.len(), 1);
    assert_eq!(population.results().len(), 1);
}

#[test]
fn test_compaction_keeps_survivors_in_order() {
    let mut population = create_test_population(5);
    for agent in population.agents_mut() {
        agent.readings = vec![agent.id.0 as f32; RAYS];
    }
    population.agents_mut()[1].mark_off_track();
    population.agents_mut()[3].mark_off_track();

    let culled = population.cull_off_track(4);

    assert_eq!(culled, 2);
    let ids: Vec<u32> = population.agents().iter().map(|a| a.id.0).collect();
    assert_eq!(ids, vec![0, 2, 4]);
    // Readings stay aligned with their agents.
    assert_eq!(population.readings(), vec![0.0, 0.0, 2.0, 2.0, 4.0, 4.0]);

    let results: Vec<u32> = population.results().iter().map(|r| r.agent.0).collect();
    assert_eq!(results, vec![1, 3]);
    assert!(population.results().iter().all(|r| r.ticks_survived == 4));
    assert_eq!(population.len() + population.results().len(), population.size());
}

#[test]
fn test_champion_is_fittest_and_earliest_on_ties() {
    let mut population = create_test_population(4);
    population.agents_mut()[1].forward_distance = 6.0;
    population.agents_mut()[2].forward_distance = 6.0;
    population.agents_mut()[3].forward_distance = -1.0;

    population.cull_all(3);

    let champion = population.champion().unwrap();
    assert_eq!(champion.agent, AgentId(1));
    assert_eq!(champion.fitness, 2.0);

    assert!(population.is_empty());
    let owned = population.into_champion().unwrap();
    assert_eq!(owned.agent, AgentId(1));
}

#[test]
fn test_no_champion_without_results() {
    let population = create_test_population(3);
    assert!(population.champion().is_none());
    assert!(population.into_champion().is_none());
}

#[test]
fn test_controller_input_uses_agent_frame() {
    let mut population = create_test_population(1);
    let agent = &mut population.agents_mut()[0];
    agent.transform.rot = FRAC_PI_2;
    // Moving along the heading.
    agent.velocity = agent.transform.forward();
    agent.readings = vec![7.0, 9.0];

    let input = agent.controller_input();
    assert_eq!(input.len(), RAYS + 2);
    assert!(input[0].abs() < 1e-6);
    assert!((input[1] - 1.0).abs() < 1e-6);
    assert_eq!(input[2], 7.0);
    assert_eq!(input[3], 9.0);
}
