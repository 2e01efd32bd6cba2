//! The generational population manager: one generation of networks, fitness-proportionate
//! breeding of the next, and the best network seen over the whole run.

use crate::{
    config::{Params, SelfPairing},
    crossover::Mutation,
    error::WalkError,
    hook::{Hook, Stats},
    network::{Lineage, Network},
    random::{ProbBinding, ProbStatic, WyRng},
    signal::DriveSignal,
};
use rand::Rng;

pub type PopulationRng = ProbBinding<ProbStatic, WyRng>;

/// Walk the cumulative normalized fitness of every network but `skip`, and return the first
/// index whose share carries it past `roll`. `total` must be the fitness sum of the networks
/// taking part. Returns `None` when no network has any fitness to select by.
pub fn roulette(fitness: &[f64], total: f64, skip: Option<usize>, roll: f64) -> Option<usize> {
    if !(total > 0.) {
        return None;
    }

    let mut cumulative = 0.;
    for (idx, f) in fitness.iter().enumerate() {
        if Some(idx) == skip {
            continue;
        }
        cumulative += f / total;
        if cumulative > roll {
            return Some(idx);
        }
    }

    // rounding can leave the walk just short of roll
    fitness
        .iter()
        .enumerate()
        .rev()
        .find(|(idx, f)| Some(*idx) != skip && **f > 0.)
        .map(|(idx, _)| idx)
}

/// Draw one parent by roulette, or uniformly when nobody has fitness
fn draw(fitness: &[f64], total: f64, rng: &mut impl Rng) -> usize {
    let roll = rng.random::<f64>();
    roulette(fitness, total, None, roll).unwrap_or_else(|| rng.random_range(0..fitness.len()))
}

/// Draw a parent other than `first`, by roulette over the rest or uniformly among them
fn draw_other(fitness: &[f64], total: f64, first: usize, rng: &mut impl Rng) -> usize {
    let roll = rng.random::<f64>();
    roulette(fitness, total - fitness[first], Some(first), roll).unwrap_or_else(|| {
        let idx = rng.random_range(0..fitness.len() - 1);
        if idx >= first {
            idx + 1
        } else {
            idx
        }
    })
}

/// Choose both parents of one child
pub fn select_parents(
    fitness: &[f64],
    total: f64,
    pairing: SelfPairing,
    rng: &mut impl Rng,
) -> (usize, usize) {
    let first = draw(fitness, total, rng);
    let second = draw(fitness, total, rng);
    if first != second || pairing == SelfPairing::Permit || fitness.len() == 1 {
        (first, second)
    } else {
        (first, draw_other(fitness, total, first, rng))
    }
}

#[derive(Debug)]
pub struct Population {
    networks: Vec<Network>,
    generation: usize,
    best: Option<Network>,
    /// the best network changed since its trajectory was last reported
    best_changed: bool,
    pairing: SelfPairing,
    mutation: Mutation,
    signal: DriveSignal,
    window: usize,
    rng: PopulationRng,
}

impl Population {
    /// A first generation of `number_of_networks` randomly weighted networks
    pub fn new(params: &Params, rng: WyRng) -> Result<Self, WalkError> {
        let mut rng = ProbBinding::new(params.breeding.probabilities(), rng);
        let networks = (0..params.number_of_networks)
            .map(|_| {
                Network::random(
                    params.topology,
                    params.breeding.init_weight_range,
                    &mut rng,
                )
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            networks,
            generation: 0,
            best: None,
            best_changed: false,
            pairing: params.breeding.self_pairing,
            mutation: Mutation::new(
                params.breeding.perturb_std_dev,
                params.breeding.weight_range,
            )?,
            signal: DriveSignal::new(params.speed, params.sin_mod),
            window: params.max_time,
            rng,
        })
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.networks.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.networks.is_empty()
    }

    #[inline]
    pub fn generation(&self) -> usize {
        self.generation
    }

    #[inline]
    pub fn networks(&self) -> &[Network] {
        &self.networks
    }

    #[inline]
    pub fn network(&self, id: usize) -> &Network {
        &self.networks[id]
    }

    #[inline]
    pub fn network_mut(&mut self, id: usize) -> &mut Network {
        &mut self.networks[id]
    }

    /// Best network of the run so far. `None` until some network earns a positive fitness.
    #[inline]
    pub fn best(&self) -> Option<&Network> {
        self.best.as_ref()
    }

    #[inline]
    pub fn best_fitness(&self) -> f64 {
        self.best.as_ref().map_or(0., Network::fitness)
    }

    /// Close the current generation: record its statistics, breed its replacement by
    /// fitness-proportionate selection and move the generation counter on. When the best
    /// network changed and `hook` wants it, the best network's motor trajectory over a full
    /// window is replayed into `hook`.
    pub fn advance_generation(&mut self, hook: &mut impl Hook) -> Stats {
        let fitness = self
            .networks
            .iter()
            .map(Network::fitness)
            .collect::<Vec<_>>();

        let mut total = 0.;
        let mut max_fitness = 0f64;
        for (idx, f) in fitness.iter().enumerate() {
            // ties keep the incumbent
            if *f > self.best_fitness() {
                self.best = Some(self.networks[idx].clone());
                self.best_changed = true;
            }
            max_fitness = max_fitness.max(*f);
            total += f;
        }

        let stats = Stats {
            generation: self.generation,
            max_fitness,
            mean_fitness: total / self.networks.len() as f64,
            best_fitness: self.best_fitness(),
        };
        hook.generation_done(&stats);

        let next = self.generation + 1;
        let mut children = Vec::with_capacity(self.networks.len());
        for _ in 0..self.networks.len() {
            let (l, r) = select_parents(&fitness, total, self.pairing, &mut self.rng);
            let mut child = self.networks[l].breed(&self.networks[r], &self.mutation, &mut self.rng);
            child.lineage = Lineage {
                generation: next,
                parents: Some((l, r)),
            };
            children.push(child);
        }
        debug_assert_eq!(self.networks.len(), children.len());

        self.networks = children;
        self.generation = next;

        if self.best_changed && hook.wants_trajectory() {
            if let Some(best) = &self.best {
                hook.best_trajectory(stats.generation, &self.signal.trajectory(best, self.window));
                self.best_changed = false;
            }
        }

        stats
    }
}
