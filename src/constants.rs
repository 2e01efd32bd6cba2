//! Centralized defaults for walknet parameters.
//!
//! Every field of [Params](crate::config::Params) falls back to the `WALKNET_` constant of the
//! same name, so a config file only needs to carry what it changes.

// ============================================================================
// Host Layout
// ============================================================================

/// Fewest motors a host must expose: neck, tail, four hips, four knees, two ankles
pub const WALKNET_MIN_MOTORS: usize = 12;

/// First motor slot driven by a network; slots below it are held at 0
pub const WALKNET_MOTOR_OFFSET: usize = 2;

/// First of the three sensor slots carrying the robot's absolute position
pub const WALKNET_POSITION_OFFSET: usize = 12;

/// Ticks at the start of every window spent letting the body settle
pub const WALKNET_SETTLE_TICKS: usize = 2;

// ============================================================================
// Drive Signal
// ============================================================================

/// Divisor turning the tick counter into signal phase
pub const WALKNET_SPEED: f64 = 30.0;

/// Amplitude of the synthesized input sinusoids
pub const WALKNET_SIN_MOD: f64 = 10.0;

/// Legacy hand-tuned gait amplitude for the hips (not read by the forward path)
pub const WALKNET_HIP_AMPLITUDE: f64 = 0.8;

/// Legacy hand-tuned gait amplitude for the knees (not read by the forward path)
pub const WALKNET_KNEE_AMPLITUDE: f64 = 0.8;

// ============================================================================
// Evaluation
// ============================================================================

/// Networks per generation
pub const WALKNET_NUMBER_OF_NETWORKS: usize = 20;

/// Ticks in one evaluation window
pub const WALKNET_MAX_TIME: usize = 500;

/// Generation index at which learning stops
pub const WALKNET_NUMBER_OF_GENERATIONS: usize = 100;

// ============================================================================
// Topology
// ============================================================================

pub const WALKNET_INPUT_SIZE: usize = 2;
pub const WALKNET_HIDDEN_SIZE: usize = 2;
pub const WALKNET_OUTPUT_SIZE: usize = 10;

// ============================================================================
// Breeding
// ============================================================================

/// Chance that a child inherits a weight from its first parent
pub const WALKNET_PICK_PRIMARY_PROB: f64 = 0.5;

/// Chance that any single child weight mutates
pub const WALKNET_MUTATE_WEIGHT_PROB: f64 = 0.1;

/// Chance that a mutation replaces the weight instead of perturbing it
pub const WALKNET_REPLACE_WEIGHT_PROB: f64 = 0.1;

/// Standard deviation of the gaussian weight perturbation
pub const WALKNET_PERTURB_STD_DEV: f64 = 0.2;

/// Replacement weights are drawn from [-range, range]
pub const WALKNET_WEIGHT_RANGE: f64 = 3.0;

/// Initial weights are drawn from [-range, range]
pub const WALKNET_INIT_WEIGHT_RANGE: f64 = 1.0;

// ============================================================================
// Fitness
// ============================================================================

/// Position component measuring forward progress
pub const WALKNET_FORWARD_AXIS: usize = 0;

/// Ticks per rolling-speed window
pub const WALKNET_SPEED_WINDOW: usize = 5;

/// Weight of the speed variation penalty; 0 leaves the reward as pure displacement
pub const WALKNET_SPEED_PENALTY: f64 = 0.0;
