pub mod config;
pub mod constants;
pub mod controller;
pub mod crossover;
pub mod error;
pub mod fitness;
pub mod hook;
pub mod network;
pub mod population;
pub mod random;
pub mod serde_traits;
pub mod serialize;
pub mod signal;

mod macros;

pub use config::{BreedParams, FitnessParams, Params, SelfPairing};
pub use controller::{Controller, EvalState, Phase};
pub use error::WalkError;
pub use hook::{FileHook, Hook, LogHook, Stats};
pub use network::{activate, Lineage, Network, Topology};
pub use population::Population;
pub use random::{Happens, Probabilities};
pub use serde_traits::{FromFile, ToFile};
