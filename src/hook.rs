//! Observers of a run. The controller and population report what happened through a [Hook] at
//! fixed points; logging and file output live here and never in the control logic.

use crate::{network::Network, serde_traits::ToFile};
use log::{debug, info, warn};
use serde::Serialize;
use std::{
    fs::{self, File, OpenOptions},
    io::{self, BufWriter, Write},
    path::{Path, PathBuf},
};

/// Summary of one finished generation
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Stats {
    pub generation: usize,
    pub max_fitness: f64,
    pub mean_fitness: f64,
    /// best fitness of the whole run, this generation included
    pub best_fitness: f64,
}

#[allow(unused_variables)]
pub trait Hook {
    /// First tick of the run
    fn started(&mut self, generation: usize, network: usize) {}

    /// A network's evaluation window closed with `fitness`
    fn network_evaluated(&mut self, generation: usize, network: usize, fitness: f64) {}

    /// Evaluation moved on to `network` of `generation`
    fn network_started(&mut self, generation: usize, network: usize) {}

    fn generation_done(&mut self, stats: &Stats) {}

    /// Whether [Hook::best_trajectory] is worth computing
    fn wants_trajectory(&self) -> bool {
        false
    }

    /// Motor commands of the best network over a full window, one row per tick. Only reported
    /// when the best network changed since the last report.
    fn best_trajectory(&mut self, generation: usize, trajectory: &[Vec<f64>]) {}

    /// The best network takes over the robot for a window, for recording
    fn demo_started(&mut self, best: &Network) {}

    /// Learning is over, `best` drives the robot from here on
    fn finished(&mut self, best: &Network) {}
}

impl Hook for () {}

impl<A: Hook, B: Hook> Hook for (A, B) {
    fn started(&mut self, generation: usize, network: usize) {
        self.0.started(generation, network);
        self.1.started(generation, network);
    }

    fn network_evaluated(&mut self, generation: usize, network: usize, fitness: f64) {
        self.0.network_evaluated(generation, network, fitness);
        self.1.network_evaluated(generation, network, fitness);
    }

    fn network_started(&mut self, generation: usize, network: usize) {
        self.0.network_started(generation, network);
        self.1.network_started(generation, network);
    }

    fn generation_done(&mut self, stats: &Stats) {
        self.0.generation_done(stats);
        self.1.generation_done(stats);
    }

    fn wants_trajectory(&self) -> bool {
        self.0.wants_trajectory() || self.1.wants_trajectory()
    }

    fn best_trajectory(&mut self, generation: usize, trajectory: &[Vec<f64>]) {
        self.0.best_trajectory(generation, trajectory);
        self.1.best_trajectory(generation, trajectory);
    }

    fn demo_started(&mut self, best: &Network) {
        self.0.demo_started(best);
        self.1.demo_started(best);
    }

    fn finished(&mut self, best: &Network) {
        self.0.finished(best);
        self.1.finished(best);
    }
}

/// Reports progress through the `log` facade
#[derive(Debug, Default, Clone, Copy)]
pub struct LogHook;

impl Hook for LogHook {
    fn started(&mut self, generation: usize, network: usize) {
        info!("starting simulation, using network {network} from generation {generation}");
    }

    fn network_evaluated(&mut self, generation: usize, network: usize, fitness: f64) {
        debug!("network {network} of generation {generation} got a fitness of {fitness}");
    }

    fn network_started(&mut self, generation: usize, network: usize) {
        debug!("using network {network} from generation {generation}");
    }

    fn generation_done(&mut self, stats: &Stats) {
        info!(
            "generation {} completed: mean fitness {}, highest {}, best so far {}",
            stats.generation, stats.mean_fitness, stats.max_fitness, stats.best_fitness
        );
    }

    fn demo_started(&mut self, best: &Network) {
        info!("demonstrating best network, fitness {}", best.fitness());
    }

    fn finished(&mut self, best: &Network) {
        info!(
            "finished last generation, best network has fitness {}",
            best.fitness()
        );
        info!("best input weights: {:?}", best.input_weights().data());
        info!("best output weights: {:?}", best.output_weights().data());
    }
}

/// Persists a run under a directory: an append-only `fitness` table, one
/// `motorData/motorOutput{generation}` file per improvement of the best network, and
/// `best.json` once the run finishes.
#[derive(Debug)]
pub struct FileHook {
    dir: PathBuf,
    fitness: BufWriter<File>,
}

impl FileHook {
    pub fn create<P: AsRef<Path>>(dir: P) -> io::Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(dir.join("motorData"))?;
        let fitness = OpenOptions::new()
            .create(true)
            .append(true)
            .open(dir.join("fitness"))?;
        Ok(Self {
            dir,
            fitness: BufWriter::new(fitness),
        })
    }

    fn motor_path(&self, generation: usize) -> PathBuf {
        self.dir
            .join("motorData")
            .join(format!("motorOutput{generation}"))
    }

    fn write_stats(&mut self, stats: &Stats) -> io::Result<()> {
        writeln!(
            self.fitness,
            "{}  {}  {}",
            stats.generation, stats.max_fitness, stats.mean_fitness
        )?;
        self.fitness.flush()
    }

    fn write_trajectory(&self, generation: usize, trajectory: &[Vec<f64>]) -> io::Result<()> {
        let mut out = BufWriter::new(File::create(self.motor_path(generation))?);
        for (t, commands) in trajectory.iter().enumerate() {
            write!(out, "{t}\t")?;
            for m in commands {
                write!(out, "{m}\t")?;
            }
            writeln!(out)?;
        }
        out.flush()
    }
}

impl Hook for FileHook {
    fn generation_done(&mut self, stats: &Stats) {
        if let Err(e) = self.write_stats(stats) {
            warn!("could not record generation {}: {e}", stats.generation);
        }
    }

    fn wants_trajectory(&self) -> bool {
        true
    }

    fn best_trajectory(&mut self, generation: usize, trajectory: &[Vec<f64>]) {
        if let Err(e) = self.write_trajectory(generation, trajectory) {
            warn!("could not record motor output of generation {generation}: {e}");
        }
    }

    fn finished(&mut self, best: &Network) {
        if let Err(e) = best.to_file(self.dir.join("best.json")) {
            warn!("could not save best network: {e}");
        }
    }
}
