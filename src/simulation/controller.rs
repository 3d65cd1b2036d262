//! Feed-forward neural controller driving one agent.
//!
//! A plain multi-layer perceptron with softsign activation on every layer,
//! including the input layer after its own bias vector. Controllers are
//! created at random for the first generation and as mutated clones of the
//! champion afterwards.

use ndarray::{Array1, Array2};
use rand::Rng;

use super::error::{Result, SimulationError};
use super::dynamics::Controls;

/// Softsign activation, `x / (1 + |x|)`, bounded to (-1, 1).
#[inline]
pub fn softsign(x: f32) -> f32 {
    x / (1.0 + x.abs())
}

/// One fully connected layer.
#[derive(Debug, Clone, PartialEq)]
pub struct Layer {
    /// Weight matrix (`output_size` × `input_size`).
    pub weights: Array2<f32>,
    /// Bias vector (`output_size`).
    pub biases: Array1<f32>,
}

impl Layer {
    fn new_random<R: Rng + ?Sized>(input_size: usize, output_size: usize, rng: &mut R) -> Self {
        Self {
            weights: Array2::from_shape_fn((output_size, input_size), |_| {
                rng.random_range(-1.0..=1.0)
            }),
            biases: Array1::from_shape_fn(output_size, |_| rng.random_range(-1.0..=1.0)),
        }
    }

    /// Computes `softsign(biases + weights · inputs)`.
    #[inline]
    pub fn forward(&self, inputs: &Array1<f32>) -> Array1<f32> {
        let mut output = self.weights.dot(inputs);
        output += &self.biases;
        output.mapv_inplace(softsign);
        output
    }

    fn mutate<R: Rng + ?Sized>(&mut self, mutation_rate: f32, rng: &mut R) {
        self.weights
            .mapv_inplace(|w| w + rng.random_range(-mutation_rate..=mutation_rate));
        self.biases
            .mapv_inplace(|b| b + rng.random_range(-mutation_rate..=mutation_rate));
    }
}

/// Multi-layer perceptron mapping sensor input to [`Controls`].
#[derive(Debug, Clone, PartialEq)]
pub struct NeuralController {
    input_biases: Array1<f32>,
    layers: Vec<Layer>,
}

impl NeuralController {
    /// Creates a controller with weights and biases uniform in [-1, 1].
    ///
    /// `layer_sizes` lists the input width, any hidden widths and the output
    /// width. At least two entries, all non-zero, are required.
    pub fn new_random<R: Rng + ?Sized>(layer_sizes: &[usize], rng: &mut R) -> Result<Self> {
        if layer_sizes.len() < 2 || layer_sizes.contains(&0) {
            return Err(SimulationError::InvalidParams(format!(
                "controller needs at least two non-empty layers, got {layer_sizes:?}"
            )));
        }

        let input_biases = Array1::from_shape_fn(layer_sizes[0], |_| rng.random_range(-1.0..=1.0));
        let layers = layer_sizes
            .windows(2)
            .map(|pair| Layer::new_random(pair[0], pair[1], rng))
            .collect();

        Ok(Self {
            input_biases,
            layers,
        })
    }

    /// Clones `parent` and perturbs every weight and bias independently by a
    /// uniform amount in `[-mutation_rate, mutation_rate]`.
    pub fn mutated<R: Rng + ?Sized>(parent: &Self, mutation_rate: f32, rng: &mut R) -> Self {
        let mut child = parent.clone();
        child.mutate(mutation_rate, rng);
        child
    }

    /// Perturbs all parameters in place. A non-positive rate is a no-op.
    ///
    /// Panics when `2 * mutation_rate` is not finite; rates accepted by
    /// [`check_mutation_rate`](super::params::check_mutation_rate) never do.
    pub fn mutate<R: Rng + ?Sized>(&mut self, mutation_rate: f32, rng: &mut R) {
        if mutation_rate <= 0.0 {
            return;
        }
        self.input_biases
            .mapv_inplace(|b| b + rng.random_range(-mutation_rate..=mutation_rate));
        for layer in &mut self.layers {
            layer.mutate(mutation_rate, rng);
        }
    }

    /// Runs a forward pass.
    pub fn forward(&self, input: &Array1<f32>) -> Result<Array1<f32>> {
        if input.len() != self.input_size() {
            return Err(SimulationError::InputSizeMismatch {
                expected: self.input_size(),
                actual: input.len(),
            });
        }

        let mut values = input + &self.input_biases;
        values.mapv_inplace(softsign);
        for layer in &self.layers {
            values = layer.forward(&values);
        }
        Ok(values)
    }

    /// Runs a forward pass and reads the first two outputs as controls.
    pub fn controls(&self, input: &Array1<f32>) -> Result<Controls> {
        let output = self.forward(input)?;
        Ok(Controls {
            acceleration: output[0],
            turn_rate: output.get(1).copied().unwrap_or_default(),
        })
    }

    /// Width of the input layer.
    pub fn input_size(&self) -> usize {
        self.input_biases.len()
    }

    /// Width of the output layer.
    pub fn output_size(&self) -> usize {
        self.layers.last().map_or(0, |layer| layer.biases.len())
    }

    /// Input, hidden and output widths.
    pub fn layer_sizes(&self) -> Vec<usize> {
        std::iter::once(self.input_size())
            .chain(self.layers.iter().map(|layer| layer.biases.len()))
            .collect()
    }

    /// Layers from input to output.
    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    /// Bias added to the raw input before the first activation.
    pub fn input_biases(&self) -> &Array1<f32> {
        &self.input_biases
    }

    /// Euclidean distance between the parameters of two controllers of the
    /// same shape.
    pub fn distance(a: &Self, b: &Self) -> f32 {
        let mut sum_sq: f32 = a
            .input_biases
            .iter()
            .zip(b.input_biases.iter())
            .map(|(x, y)| (x - y).powi(2))
            .sum();
        for (la, lb) in a.layers.iter().zip(&b.layers) {
            for (x, y) in la.weights.iter().zip(lb.weights.iter()) {
                sum_sq += (x - y).powi(2);
            }
            for (x, y) in la.biases.iter().zip(lb.biases.iter()) {
                sum_sq += (x - y).powi(2);
            }
        }
        sum_sq.sqrt()
    }
}
