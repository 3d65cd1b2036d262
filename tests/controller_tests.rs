#![allow(missing_docs)]
#![allow(clippy::float_cmp)]

use ndarray::Array1;
use rand::SeedableRng;
use rand::rngs::StdRng;
use racer::simulation::controller::{NeuralController, softsign};
use racer::simulation::error::SimulationError;

fn create_test_controller(seed: u64) -> NeuralController {
    let mut rng = StdRng::seed_from_u64(seed);
    NeuralController::new_random(&[15, 10, 10, 2], &mut rng).unwrap()
}

#[test]
fn test_softsign_is_bounded() {
    assert_eq!(softsign(0.0), 0.0);
    assert_eq!(softsign(1.0), 0.5);
    assert_eq!(softsign(-3.0), -0.75);

    let mut x = -1000.0_f32;
    while x <= 1000.0 {
        let y = softsign(x);
        assert!(y > -1.0 && y < 1.0, "softsign({x}) = {y}");
        assert_eq!(y.signum(), x.signum());
        x += 7.3;
    }
}

#[test]
fn test_controller_shape() {
    let controller = create_test_controller(1);

    assert_eq!(controller.input_size(), 15);
    assert_eq!(controller.output_size(), 2);
    assert_eq!(controller.layer_sizes(), vec![15, 10, 10, 2]);
    assert_eq!(controller.layers().len(), 3);
    assert_eq!(controller.layers()[0].weights.shape(), &[10, 15]);
}

#[test]
fn test_random_parameters_in_unit_range() {
    let controller = create_test_controller(2);

    assert!(controller.input_biases().iter().all(|b| b.abs() <= 1.0));
    for layer in controller.layers() {
        assert!(layer.weights.iter().all(|w| w.abs() <= 1.0));
        assert!(layer.biases.iter().all(|b| b.abs() <= 1.0));
    }
}

#[test]
fn test_invalid_layer_sizes() {
    let mut rng = StdRng::seed_from_u64(3);

    assert!(NeuralController::new_random(&[4], &mut rng).is_err());
    assert!(NeuralController::new_random(&[4, 0, 2], &mut rng).is_err());
}

#[test]
fn test_forward_outputs_are_bounded() {
    let controller = create_test_controller(4);

    for scale in [0.0, 1.0, 50.0, 1000.0] {
        let input = Array1::from_elem(15, scale);
        let output = controller.forward(&input).unwrap();
        assert_eq!(output.len(), 2);
        assert!(output.iter().all(|v| *v > -1.0 && *v < 1.0));
    }
}

#[test]
fn test_forward_is_deterministic() {
    let controller = create_test_controller(5);
    let input = Array1::linspace(-2.0, 40.0, 15);

    assert_eq!(
        controller.forward(&input).unwrap(),
        controller.forward(&input).unwrap()
    );
}

#[test]
fn test_input_size_mismatch() {
    let controller = create_test_controller(6);
    let result = controller.forward(&Array1::zeros(14));

    assert!(matches!(
        result,
        Err(SimulationError::InputSizeMismatch {
            expected: 15,
            actual: 14
        })
    ));
}

#[test]
fn test_mutation_stays_within_rate() {
    let parent = create_test_controller(7);
    let mut rng = StdRng::seed_from_u64(8);
    let rate = 0.05;

    let child = NeuralController::mutated(&parent, rate, &mut rng);
    assert_eq!(child.layer_sizes(), parent.layer_sizes());
    assert!(NeuralController::distance(&parent, &child) > 0.0);

    for (a, b) in parent.input_biases().iter().zip(child.input_biases()) {
        assert!((a - b).abs() <= rate + 1e-6);
    }
    for (pl, cl) in parent.layers().iter().zip(child.layers()) {
        for (a, b) in pl.weights.iter().zip(cl.weights.iter()) {
            assert!((a - b).abs() <= rate + 1e-6);
        }
    }
}

#[test]
fn test_zero_rate_mutation_is_a_clone() {
    let parent = create_test_controller(9);
    let mut rng = StdRng::seed_from_u64(10);

    let child = NeuralController::mutated(&parent, 0.0, &mut rng);
    assert_eq!(child, parent);
    assert_eq!(NeuralController::distance(&parent, &child), 0.0);
}

#[test]
fn test_controls_come_from_first_two_outputs() {
    let controller = create_test_controller(11);
    let input = Array1::from_elem(15, 0.5);

    let output = controller.forward(&input).unwrap();
    let controls = controller.controls(&input).unwrap();
    assert_eq!(controls.acceleration, output[0]);
    assert_eq!(controls.turn_rate, output[1]);
}
