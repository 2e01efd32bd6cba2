//! Weight-level recombination and mutation used when two networks breed.

use crate::{
    error::WalkError,
    random::{EvolutionEvent, Happens},
};
use rand_distr::{Distribution, Normal, Uniform};

/// How a child's weights drift away from its parents after crossover
#[derive(Debug, Clone)]
pub struct Mutation {
    perturb: Normal<f64>,
    replace: Uniform<f64>,
}

impl Mutation {
    /// Perturbations are drawn from N(0, std_dev), replacements from [-range, range]
    pub fn new(std_dev: f64, range: f64) -> Result<Self, WalkError> {
        Ok(Self {
            perturb: Normal::new(0., std_dev)
                .map_err(|e| WalkError::InvalidParams(format!("perturbation: {e}")))?,
            replace: Uniform::new_inclusive(-range, range)
                .map_err(|e| WalkError::InvalidParams(format!("weight range: {e}")))?,
        })
    }

    /// Mutate every weight independently. Most weights are left alone.
    pub fn apply(&self, weights: &mut [f64], rng: &mut impl Happens) {
        for w in weights.iter_mut() {
            if !rng.happens(EvolutionEvent::MutateWeight) {
                continue;
            }
            if rng.happens(EvolutionEvent::ReplaceWeight) {
                *w = self.replace.sample(rng);
            } else {
                *w += self.perturb.sample(rng);
            }
        }
    }
}

/// Uniform crossover of two equally shaped weight sets: each position comes from `primary` when
/// [EvolutionEvent::PickPrimary] happens, and from `secondary` otherwise.
pub fn crossover(primary: &[f64], secondary: &[f64], rng: &mut impl Happens) -> Vec<f64> {
    debug_assert_eq!(primary.len(), secondary.len(), "parents differ in shape");
    primary
        .iter()
        .zip(secondary)
        .map(|(p, s)| {
            if rng.happens(EvolutionEvent::PickPrimary) {
                *p
            } else {
                *s
            }
        })
        .collect()
}
