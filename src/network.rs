//! The fixed-topology controller evolved by walknet: an input layer, a single hidden layer and an
//! output layer, joined by two weight matrices.

use crate::{
    constants::{WALKNET_HIDDEN_SIZE, WALKNET_INPUT_SIZE, WALKNET_OUTPUT_SIZE},
    crossover::{crossover, Mutation},
    error::WalkError,
    random::Happens,
    serialize::{deserialize_matrix, serialize_matrix},
};
use rand::Rng;
use rand_distr::{Distribution, Uniform};
use rulinalg::matrix::{BaseMatrix, BaseMatrixMut, Matrix};
use serde::{Deserialize, Serialize};

pub mod activate {
    use core::f64::consts::E;

    /// Logistic sigmoid, squashing into (0, 1)
    pub fn sigmoid(x: f64) -> f64 {
        1. / (1. + E.powf(-x))
    }
}

/// Layer sizes of a [Network]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Topology {
    pub input: usize,
    pub hidden: usize,
    pub output: usize,
}

impl Default for Topology {
    fn default() -> Self {
        Self {
            input: WALKNET_INPUT_SIZE,
            hidden: WALKNET_HIDDEN_SIZE,
            output: WALKNET_OUTPUT_SIZE,
        }
    }
}

/// Where a network came from. Networks of the first generation have no parents.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lineage {
    pub generation: usize,
    /// indices of both parents within the previous generation
    pub parents: Option<(usize, usize)>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "NetworkRepr")]
pub struct Network {
    /// input × hidden
    #[serde(serialize_with = "serialize_matrix")]
    input_weights: Matrix<f64>,
    /// hidden × output
    #[serde(serialize_with = "serialize_matrix")]
    output_weights: Matrix<f64>,
    /// best reward seen during the current evaluation window
    #[serde(skip)]
    fitness: f64,
    pub lineage: Lineage,
}

/// Saved form of a [Network], checked by [Network::from_weights] before use
#[derive(Deserialize)]
struct NetworkRepr {
    #[serde(deserialize_with = "deserialize_matrix")]
    input_weights: Matrix<f64>,
    #[serde(deserialize_with = "deserialize_matrix")]
    output_weights: Matrix<f64>,
    #[serde(default)]
    lineage: Lineage,
}

impl TryFrom<NetworkRepr> for Network {
    type Error = WalkError;

    fn try_from(repr: NetworkRepr) -> Result<Self, Self::Error> {
        let mut network = Network::from_weights(repr.input_weights, repr.output_weights)?;
        network.lineage = repr.lineage;
        Ok(network)
    }
}

impl Network {
    /// A network with both weight sets drawn uniformly from [-range, range]
    pub fn random(topology: Topology, range: f64, rng: &mut impl Rng) -> Result<Self, WalkError> {
        let dist = Uniform::new_inclusive(-range, range)
            .map_err(|e| WalkError::InvalidParams(format!("initial weight range: {e}")))?;
        let mut draw = |n: usize| (0..n).map(|_| dist.sample(rng)).collect::<Vec<_>>();

        let input = draw(topology.input * topology.hidden);
        let output = draw(topology.hidden * topology.output);
        Ok(Self {
            input_weights: Matrix::new(topology.input, topology.hidden, input),
            output_weights: Matrix::new(topology.hidden, topology.output, output),
            fitness: 0.,
            lineage: Lineage::default(),
        })
    }

    /// Build a network from known weights, such as a hand-tuned or previously evolved gait
    pub fn from_weights(
        input_weights: Matrix<f64>,
        output_weights: Matrix<f64>,
    ) -> Result<Self, WalkError> {
        if input_weights.cols() != output_weights.rows() {
            return Err(WalkError::Shape {
                input_rows: input_weights.rows(),
                input_cols: input_weights.cols(),
                output_rows: output_weights.rows(),
                output_cols: output_weights.cols(),
            });
        }

        Ok(Self {
            input_weights,
            output_weights,
            fitness: 0.,
            lineage: Lineage::default(),
        })
    }

    pub fn topology(&self) -> Topology {
        Topology {
            input: self.input_weights.rows(),
            hidden: self.input_weights.cols(),
            output: self.output_weights.cols(),
        }
    }

    #[inline]
    pub fn input_weights(&self) -> &Matrix<f64> {
        &self.input_weights
    }

    #[inline]
    pub fn output_weights(&self) -> &Matrix<f64> {
        &self.output_weights
    }

    /// Propagate `input` through both weight matrices, activating each layer with a sigmoid.
    /// Every output lands in (0, 1).
    pub fn forward(&self, input: &[f64]) -> Vec<f64> {
        debug_assert_eq!(input.len(), self.input_weights.rows());
        let x = Matrix::new(1, input.len(), input.to_vec());
        let hidden = (&x * &self.input_weights).apply(&activate::sigmoid);
        (hidden * &self.output_weights)
            .apply(&activate::sigmoid)
            .into_vec()
    }

    #[inline]
    pub fn fitness(&self) -> f64 {
        self.fitness
    }

    /// Fitness only ever ratchets upward within a window. NaN samples are ignored.
    #[inline]
    pub fn update_fitness(&mut self, sample: f64) {
        self.fitness = self.fitness.max(sample);
    }

    #[inline]
    pub fn reset_fitness(&mut self) {
        self.fitness = 0.;
    }

    /// Produce a child whose weights are a uniform crossover of ours and `partner`'s, then
    /// mutated. The child always starts with a fitness of 0.
    pub fn breed(&self, partner: &Self, mutation: &Mutation, rng: &mut impl Happens) -> Self {
        debug_assert_eq!(self.topology(), partner.topology());
        let mut input = crossover(
            self.input_weights.data(),
            partner.input_weights.data(),
            rng,
        );
        let mut output = crossover(
            self.output_weights.data(),
            partner.output_weights.data(),
            rng,
        );
        mutation.apply(&mut input, rng);
        mutation.apply(&mut output, rng);

        let topology = self.topology();
        Self {
            input_weights: Matrix::new(topology.input, topology.hidden, input),
            output_weights: Matrix::new(topology.hidden, topology.output, output),
            fitness: 0.,
            lineage: Lineage::default(),
        }
    }
}
