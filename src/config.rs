//! Run parameters. Every field is optional in a config file and falls back to its `WALKNET_`
//! default. The camelCase option names of older config files are accepted as aliases.

use crate::{
    constants::*,
    error::WalkError,
    network::Topology,
    random::{chance, EvolutionEvent, ProbStatic},
};
use serde::{Deserialize, Serialize};

/// What to do when roulette selection draws the same network as both parents
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelfPairing {
    /// Keep the pair; the child varies from its parent through mutation only
    Permit,
    /// Redraw the second parent from every other network
    #[default]
    Distinct,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BreedParams {
    pub pick_primary: f64,
    pub mutate_weight: f64,
    pub replace_weight: f64,
    pub perturb_std_dev: f64,
    pub weight_range: f64,
    pub init_weight_range: f64,
    pub self_pairing: SelfPairing,
}

impl Default for BreedParams {
    fn default() -> Self {
        Self {
            pick_primary: WALKNET_PICK_PRIMARY_PROB,
            mutate_weight: WALKNET_MUTATE_WEIGHT_PROB,
            replace_weight: WALKNET_REPLACE_WEIGHT_PROB,
            perturb_std_dev: WALKNET_PERTURB_STD_DEV,
            weight_range: WALKNET_WEIGHT_RANGE,
            init_weight_range: WALKNET_INIT_WEIGHT_RANGE,
            self_pairing: SelfPairing::default(),
        }
    }
}

impl BreedParams {
    pub fn probabilities(&self) -> ProbStatic {
        ProbStatic::default().with_overrides(&[
            (EvolutionEvent::PickPrimary, chance(self.pick_primary)),
            (EvolutionEvent::MutateWeight, chance(self.mutate_weight)),
            (EvolutionEvent::ReplaceWeight, chance(self.replace_weight)),
        ])
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FitnessParams {
    pub axis: usize,
    pub speed_window: usize,
    pub speed_penalty: f64,
}

impl Default for FitnessParams {
    fn default() -> Self {
        Self {
            axis: WALKNET_FORWARD_AXIS,
            speed_window: WALKNET_SPEED_WINDOW,
            speed_penalty: WALKNET_SPEED_PENALTY,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Params {
    pub speed: f64,
    #[serde(alias = "sinMod")]
    pub sin_mod: f64,
    #[serde(alias = "hipampl", alias = "hipamplitude")]
    pub hip_amplitude: f64,
    #[serde(alias = "kneeampl", alias = "kneeamplitude")]
    pub knee_amplitude: f64,
    #[serde(alias = "resetRobot")]
    pub reset_robot: bool,
    #[serde(alias = "numberOfGenerations")]
    pub number_of_generations: usize,
    #[serde(alias = "numberOfNetworks")]
    pub number_of_networks: usize,
    #[serde(alias = "maxTime")]
    pub max_time: usize,
    pub topology: Topology,
    /// run the best network for a window after every generation, for recording
    pub demo_best: bool,
    pub seed: Option<u64>,
    pub breeding: BreedParams,
    pub fitness: FitnessParams,
}

impl Default for Params {
    fn default() -> Self {
        Self {
            speed: WALKNET_SPEED,
            sin_mod: WALKNET_SIN_MOD,
            hip_amplitude: WALKNET_HIP_AMPLITUDE,
            knee_amplitude: WALKNET_KNEE_AMPLITUDE,
            reset_robot: false,
            number_of_generations: WALKNET_NUMBER_OF_GENERATIONS,
            number_of_networks: WALKNET_NUMBER_OF_NETWORKS,
            max_time: WALKNET_MAX_TIME,
            topology: Topology::default(),
            demo_best: true,
            seed: None,
            breeding: BreedParams::default(),
            fitness: FitnessParams::default(),
        }
    }
}

fn probability(name: &str, p: f64) -> Result<(), WalkError> {
    if (0.0..=1.0).contains(&p) {
        Ok(())
    } else {
        Err(WalkError::InvalidParams(format!(
            "{name} must be a probability, got {p}"
        )))
    }
}

fn non_negative(name: &str, v: f64) -> Result<(), WalkError> {
    if v.is_finite() && v >= 0. {
        Ok(())
    } else {
        Err(WalkError::InvalidParams(format!(
            "{name} must be finite and non-negative, got {v}"
        )))
    }
}

impl Params {
    pub fn validate(&self) -> Result<(), WalkError> {
        if !(self.speed.is_finite() && self.speed > 0.) {
            return Err(WalkError::InvalidParams(format!(
                "speed must be positive, got {}",
                self.speed
            )));
        }
        if !self.sin_mod.is_finite() {
            return Err(WalkError::InvalidParams(format!(
                "sin_mod must be finite, got {}",
                self.sin_mod
            )));
        }
        if self.number_of_networks == 0 {
            return Err(WalkError::InvalidParams(
                "a generation needs at least one network".into(),
            ));
        }
        if self.max_time == 0 {
            return Err(WalkError::InvalidParams(
                "evaluation window must be at least one tick".into(),
            ));
        }

        let Topology {
            input,
            hidden,
            output,
        } = self.topology;
        if input == 0 || hidden == 0 || output == 0 {
            return Err(WalkError::InvalidParams(format!(
                "every layer needs a neuron, got {input}-{hidden}-{output}"
            )));
        }

        probability("pick_primary", self.breeding.pick_primary)?;
        probability("mutate_weight", self.breeding.mutate_weight)?;
        probability("replace_weight", self.breeding.replace_weight)?;
        non_negative("perturb_std_dev", self.breeding.perturb_std_dev)?;
        non_negative("weight_range", self.breeding.weight_range)?;
        non_negative("init_weight_range", self.breeding.init_weight_range)?;

        if self.fitness.speed_window == 0 {
            return Err(WalkError::InvalidParams(
                "speed window must be at least one tick".into(),
            ));
        }
        if self.fitness.axis >= 3 {
            return Err(WalkError::InvalidParams(format!(
                "forward axis {} is not one of x, y, z",
                self.fitness.axis
            )));
        }
        non_negative("speed_penalty", self.fitness.speed_penalty)?;

        Ok(())
    }

    /// Fewest motors a host needs to carry this topology's outputs
    pub fn motors_required(&self) -> usize {
        WALKNET_MIN_MOTORS.max(WALKNET_MOTOR_OFFSET + self.topology.output)
    }
}
