use core::cmp::min;
use rand::RngCore;
use std::{
    fs::File,
    io::{self, Read},
};

use crate::constants::{
    WALKNET_MUTATE_WEIGHT_PROB, WALKNET_PICK_PRIMARY_PROB, WALKNET_REPLACE_WEIGHT_PROB,
};

/// Discrete per-weight decisions made while breeding
#[derive(Debug, Clone, Copy)]
pub enum EvolutionEvent {
    /// inherit from the first parent rather than the second
    PickPrimary,
    MutateWeight,
    /// a mutation replaces the weight outright instead of nudging it
    ReplaceWeight,
}

pub const fn percent(x: u64) -> u64 {
    x * (u64::MAX / 100)
}

/// Map a probability in [0, 1] onto the u64 threshold compared against a roll
pub fn chance(p: f64) -> u64 {
    if p >= 1. {
        u64::MAX
    } else if p > 0. {
        (p * u64::MAX as f64) as u64
    } else {
        0
    }
}

pub trait Probabilities {
    type Update;
    fn probability(&self, evt: EvolutionEvent) -> u64;
    fn update(&mut self, stats: Self::Update);
}

pub trait Happens: RngCore + Probabilities {
    fn happens(&mut self, evt: EvolutionEvent) -> bool;
}

impl<T: RngCore + Probabilities> Happens for T {
    fn happens(&mut self, evt: EvolutionEvent) -> bool {
        self.probability(evt) > self.next_u64()
    }
}

#[derive(Debug, Clone)]
pub struct ProbStatic {
    pick_primary: u64,
    mutate_weight: u64,
    replace_weight: u64,
}

impl ProbStatic {
    pub fn with_overrides(mut self, updates: &[(EvolutionEvent, u64)]) -> Self {
        for update in updates {
            self.update(*update);
        }
        self
    }
}

impl Default for ProbStatic {
    fn default() -> Self {
        Self {
            pick_primary: chance(WALKNET_PICK_PRIMARY_PROB),
            mutate_weight: chance(WALKNET_MUTATE_WEIGHT_PROB),
            replace_weight: chance(WALKNET_REPLACE_WEIGHT_PROB),
        }
    }
}

impl Probabilities for ProbStatic {
    type Update = (EvolutionEvent, u64);
    fn probability(&self, evt: EvolutionEvent) -> u64 {
        match evt {
            EvolutionEvent::PickPrimary => self.pick_primary,
            EvolutionEvent::MutateWeight => self.mutate_weight,
            EvolutionEvent::ReplaceWeight => self.replace_weight,
        }
    }

    fn update(&mut self, (evt, v): Self::Update) {
        match evt {
            EvolutionEvent::PickPrimary => self.pick_primary = v,
            EvolutionEvent::MutateWeight => self.mutate_weight = v,
            EvolutionEvent::ReplaceWeight => self.replace_weight = v,
        }
    }
}

#[derive(Debug, Clone)]
pub struct WyRng {
    state: u64,
}

impl WyRng {
    pub fn seeded(state: u64) -> Self {
        Self { state }
    }
}

impl RngCore for WyRng {
    fn next_u32(&mut self) -> u32 {
        self.next_u64() as u32
    }

    fn next_u64(&mut self) -> u64 {
        const WY_CONST_0: u64 = 0x2d35_8dcc_aa6c_78a5;
        const WY_CONST_1: u64 = 0x8bb8_4b93_962e_acc9;
        self.state = self.state.wrapping_add(WY_CONST_0);
        let t = u128::from(self.state) * u128::from(self.state ^ WY_CONST_1);
        (t as u64) ^ (t >> 64) as u64
    }

    fn fill_bytes(&mut self, dst: &mut [u8]) {
        let mut idx = 0;
        while idx < dst.len() {
            let lim = min(8, dst.len() - idx);
            dst[idx..idx + lim].copy_from_slice(&self.next_u64().to_ne_bytes()[..lim]);
            idx += lim;
        }
    }
}

/// An rng paired with the probability table it rolls against
#[derive(Debug, Clone)]
pub struct ProbBinding<P: Probabilities, R: RngCore> {
    p: P,
    r: R,
}

impl<P: Probabilities, R: RngCore> ProbBinding<P, R> {
    pub fn new(p: P, r: R) -> Self {
        Self { p, r }
    }
}

impl<P: Probabilities, R: RngCore> Probabilities for ProbBinding<P, R> {
    type Update = P::Update;
    fn probability(&self, evt: EvolutionEvent) -> u64 {
        self.p.probability(evt)
    }

    fn update(&mut self, stats: Self::Update) {
        self.p.update(stats);
    }
}

impl<P: Probabilities, R: RngCore> RngCore for ProbBinding<P, R> {
    fn next_u32(&mut self) -> u32 {
        self.r.next_u32()
    }

    fn next_u64(&mut self) -> u64 {
        self.r.next_u64()
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        self.r.fill_bytes(dest)
    }
}

pub fn seed_urandom() -> io::Result<u64> {
    let mut file = File::open("/dev/urandom")?;
    let mut buffer = [0u8; 8];
    file.read_exact(&mut buffer)?;
    Ok(u64::from_le_bytes(buffer))
}
