//! The per-tick evaluation state machine the host drives.
//!
//! Every network of a generation controls the robot for one window of `max_time` ticks. The tick
//! after a window ends is a transition tick: it writes no motor commands, moves evaluation on
//! and raises `reset_robot` so the host puts the robot back at its starting pose. Between
//! generations the best network may demonstrate for a window, and once the last generation is
//! bred the best network drives the robot for good.

use crate::{
    config::Params,
    constants::{
        WALKNET_MOTOR_OFFSET, WALKNET_POSITION_OFFSET, WALKNET_SETTLE_TICKS,
    },
    error::WalkError,
    fitness::{FitnessEvaluator, Position},
    hook::{Hook, LogHook},
    network::Network,
    population::Population,
    random::{seed_urandom, WyRng},
    signal::DriveSignal,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// No tick yet
    Init,
    /// The current network is being evaluated
    Evaluating,
    /// The best network drives a window for recording; nothing is learned
    DemoBest,
    /// Learning is over and the best network drives indefinitely
    Finished,
}

/// Counters and snapshots belonging to the evaluation in progress
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EvalState {
    /// tick within the current window
    pub t: usize,
    /// ticks driven since the run started
    pub total_time: usize,
    pub cur_net_id: usize,
    pub start_pos: Position,
    pub reset_robot: bool,
}

/// Write `network`'s commands for tick `t` into the leg motors, holding neck and tail still
fn drive(signal: &DriveSignal, network: &Network, t: usize, motors: &mut [f64]) {
    motors[..WALKNET_MOTOR_OFFSET].fill(0.);
    for (slot, command) in motors[WALKNET_MOTOR_OFFSET..]
        .iter_mut()
        .zip(signal.commands(network, t))
    {
        *slot = command;
    }
}

fn position(sensors: &[f64]) -> Position {
    [
        sensors[WALKNET_POSITION_OFFSET],
        sensors[WALKNET_POSITION_OFFSET + 1],
        sensors[WALKNET_POSITION_OFFSET + 2],
    ]
}

#[derive(Debug)]
pub struct Controller<H: Hook = LogHook> {
    params: Params,
    population: Population,
    fitness: FitnessEvaluator,
    signal: DriveSignal,
    state: EvalState,
    phase: Phase,
    /// the network driving the robot once learning is over
    playback: Option<Network>,
    /// the host has been told the run started
    started: bool,
    sensor_count: usize,
    motor_count: usize,
    hook: H,
}

impl<H: Hook> Controller<H> {
    pub fn new(params: Params, hook: H) -> Result<Self, WalkError> {
        params.validate()?;
        let seed = match params.seed {
            Some(seed) => seed,
            None => seed_urandom()?,
        };

        Ok(Self {
            population: Population::new(&params, WyRng::seeded(seed))?,
            fitness: FitnessEvaluator::new(&params.fitness),
            signal: DriveSignal::new(params.speed, params.sin_mod),
            state: EvalState {
                reset_robot: params.reset_robot,
                ..EvalState::default()
            },
            phase: Phase::Init,
            playback: None,
            started: false,
            sensor_count: 0,
            motor_count: 0,
            hook,
            params,
        })
    }

    /// A controller that learns nothing and drives `network` from the first tick
    pub fn replaying(params: Params, network: Network, hook: H) -> Result<Self, WalkError> {
        if network.topology() != params.topology {
            return Err(WalkError::InvalidParams(format!(
                "replayed network is shaped {:?}, expected {:?}",
                network.topology(),
                params.topology
            )));
        }

        let mut controller = Self::new(params, hook)?;
        controller.phase = Phase::Finished;
        controller.playback = Some(network);
        Ok(controller)
    }

    /// Record the host's sensor and motor counts. The host must treat an error as fatal.
    pub fn init(&mut self, sensor_count: usize, motor_count: usize) -> Result<(), WalkError> {
        let required = self.params.motors_required();
        if motor_count < required {
            return Err(WalkError::TooFewMotors {
                required,
                got: motor_count,
            });
        }
        self.sensor_count = sensor_count;
        self.motor_count = motor_count;
        Ok(())
    }

    /// Advance the run by one simulation tick. `sensors` follows the host layout with the
    /// absolute position in slots 12 to 14; `motors` receives commands in [-1, 1].
    pub fn tick(&mut self, sensors: &[f64], motors: &mut [f64]) {
        debug_assert!(sensors.len() >= WALKNET_POSITION_OFFSET + 3);
        debug_assert!(motors.len() >= self.params.motors_required());

        if !self.started {
            self.started = true;
            self.hook
                .started(self.population.generation(), self.state.cur_net_id);
        }
        if self.phase == Phase::Init {
            self.phase = Phase::Evaluating;
        }

        let position = position(sensors);
        if self.state.t == WALKNET_SETTLE_TICKS {
            self.state.start_pos = position;
        }

        match self.phase {
            Phase::Init => unreachable!("the first tick leaves Init"),
            Phase::Evaluating if self.state.t < self.params.max_time => {
                let id = self.state.cur_net_id;
                drive(&self.signal, self.population.network(id), self.state.t, motors);
                if self.state.t > WALKNET_SETTLE_TICKS {
                    let sample = self
                        .fitness
                        .sample(self.state.t, &self.state.start_pos, &position);
                    self.population.network_mut(id).update_fitness(sample);
                }
                self.step();
            }
            Phase::Evaluating => self.finish_network(),
            Phase::DemoBest if self.state.t < self.params.max_time => {
                if let Some(best) = self.population.best() {
                    drive(&self.signal, best, self.state.t, motors);
                }
                self.step();
            }
            Phase::DemoBest => {
                self.phase = Phase::Evaluating;
                self.start_window();
                self.hook
                    .network_started(self.population.generation(), self.state.cur_net_id);
            }
            Phase::Finished => {
                let network = match &self.playback {
                    Some(network) => network,
                    None => self.population.network(0),
                };
                drive(&self.signal, network, self.state.t, motors);
                self.step();
            }
        }
    }

    /// Move the clocks forward after a driven tick
    fn step(&mut self) {
        self.state.reset_robot = false;
        self.state.t += 1;
        self.state.total_time += 1;
    }

    /// Reset per-window accumulators and ask the host to reposition the robot
    fn start_window(&mut self) {
        self.state.t = 0;
        self.state.start_pos = Position::default();
        self.fitness.reset();
        self.state.reset_robot = true;
    }

    fn finish_network(&mut self) {
        let generation = self.population.generation();
        let id = self.state.cur_net_id;
        self.hook
            .network_evaluated(generation, id, self.population.network(id).fitness());

        if id + 1 < self.population.len() {
            self.state.cur_net_id += 1;
            self.start_window();
            self.hook.network_started(generation, self.state.cur_net_id);
            return;
        }

        self.population.advance_generation(&mut self.hook);
        self.state.cur_net_id = 0;
        self.start_window();

        if generation < self.params.number_of_generations {
            match self.population.best() {
                Some(best) if self.params.demo_best => {
                    self.hook.demo_started(best);
                    self.phase = Phase::DemoBest;
                }
                _ => self
                    .hook
                    .network_started(self.population.generation(), self.state.cur_net_id),
            }
        } else {
            let best = self
                .population
                .best()
                .unwrap_or_else(|| self.population.network(0))
                .clone();
            self.hook.finished(&best);
            self.playback = Some(best);
            self.phase = Phase::Finished;
        }
    }

    #[inline]
    pub fn reset_robot(&self) -> bool {
        self.state.reset_robot
    }

    #[inline]
    pub fn state(&self) -> &EvalState {
        &self.state
    }

    #[inline]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    #[inline]
    pub fn population(&self) -> &Population {
        &self.population
    }

    #[inline]
    pub fn params(&self) -> &Params {
        &self.params
    }

    /// Sensor and motor counts recorded by [Controller::init]
    #[inline]
    pub fn io(&self) -> (usize, usize) {
        (self.sensor_count, self.motor_count)
    }

    #[inline]
    pub fn hook(&self) -> &H {
        &self.hook
    }

    /// The network currently in control of the robot, if any
    pub fn active_network(&self) -> Option<&Network> {
        match self.phase {
            Phase::Init | Phase::Evaluating => {
                Some(self.population.network(self.state.cur_net_id))
            }
            Phase::DemoBest => self.population.best(),
            Phase::Finished => self.playback.as_ref(),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{assert_f64_approx, fitness::displacement_reward, hook::Stats, test_n};
    use core::f64::consts::E;

    const SENSORS: usize = 15;
    const MOTORS: usize = 12;

    fn params(n: usize, max_time: usize, generations: usize) -> Params {
        Params {
            number_of_networks: n,
            max_time,
            number_of_generations: generations,
            seed: Some(1234),
            ..Params::default()
        }
    }

    fn sensors_at(x: f64) -> [f64; SENSORS] {
        let mut sensors = [0.; SENSORS];
        sensors[WALKNET_POSITION_OFFSET] = x;
        sensors
    }

    #[derive(Debug, Default)]
    struct Journal {
        evaluated: Vec<(usize, usize, f64)>,
        stats: Vec<Stats>,
        demos: usize,
        finished: usize,
        started: usize,
    }

    impl Hook for Journal {
        fn started(&mut self, _: usize, _: usize) {
            self.started += 1;
        }

        fn network_evaluated(&mut self, generation: usize, network: usize, fitness: f64) {
            self.evaluated.push((generation, network, fitness));
        }

        fn generation_done(&mut self, stats: &Stats) {
            self.stats.push(*stats);
        }

        fn demo_started(&mut self, _: &Network) {
            self.demos += 1;
        }

        fn finished(&mut self, _: &Network) {
            self.finished += 1;
        }
    }

    /// A sled that slides forward with the mean command of the first hip motor
    struct Sled {
        x: f64,
    }

    impl Sled {
        fn sensors(&self) -> [f64; SENSORS] {
            sensors_at(self.x)
        }

        fn apply(&mut self, motors: &[f64], reset: bool) {
            if reset {
                self.x = 0.;
            } else {
                self.x += 0.01 * motors[WALKNET_MOTOR_OFFSET];
            }
        }
    }

    fn run(controller: &mut Controller<Journal>, sled: &mut Sled, motors: &mut [f64], ticks: usize) {
        for _ in 0..ticks {
            controller.tick(&sled.sensors(), motors);
            sled.apply(motors, controller.reset_robot());
        }
    }

    #[test]
    fn test_init_needs_twelve_motors() {
        let mut controller = Controller::new(params(4, 10, 1), ()).unwrap();
        assert!(matches!(
            controller.init(SENSORS, 11),
            Err(WalkError::TooFewMotors {
                required: 12,
                got: 11
            })
        ));
        controller.init(SENSORS, MOTORS).unwrap();
        assert_eq!((SENSORS, MOTORS), controller.io());
    }

    #[test]
    fn test_new_rejects_invalid_params() {
        assert!(Controller::new(params(0, 10, 1), ()).is_err());
    }

    #[test]
    fn test_window_transition() {
        let mut controller = Controller::new(params(4, 500, 10), Journal::default()).unwrap();
        let mut motors = [0.; MOTORS];
        let sensors = sensors_at(0.);
        assert_eq!(Phase::Init, controller.phase());
        assert_eq!(0, controller.hook().started);

        for _ in 0..500 {
            controller.tick(&sensors, &mut motors);
            assert_eq!(Phase::Evaluating, controller.phase());
            assert!(!controller.reset_robot());
        }
        assert_eq!(500, controller.state().t);
        assert_eq!(0, controller.state().cur_net_id);
        assert_eq!(1, controller.hook().started);

        // tick 500 of the window
        controller.tick(&sensors, &mut motors);
        assert_eq!(1, controller.state().cur_net_id);
        assert_eq!(0, controller.state().t);
        assert!(controller.reset_robot());
        assert_eq!(500, controller.state().total_time);
        assert_eq!(1, controller.hook().evaluated.len());

        controller.tick(&sensors, &mut motors);
        assert!(!controller.reset_robot());
        assert_eq!(1, controller.state().t);
    }

    #[test]
    fn test_fitness_is_max_sample() {
        let max_time = 60;
        let mut controller = Controller::new(params(2, max_time, 3), Journal::default()).unwrap();
        let mut motors = [0.; MOTORS];
        let xs = (0..max_time)
            .map(|t| (t as f64 / 9.).sin() * 0.7 + 0.01 * t as f64)
            .collect::<Vec<_>>();

        for x in &xs {
            controller.tick(&sensors_at(*x), &mut motors);
        }
        let start = [xs[2], 0., 0.];
        let expected = xs[3..]
            .iter()
            .map(|x| displacement_reward(&start, &[*x, 0., 0.], 0))
            .fold(0f64, f64::max);
        assert!(expected > 0.);
        assert_f64_approx!(controller.population().network(0).fitness(), expected);

        // the transition tick takes no sample
        controller.tick(&sensors_at(100.), &mut motors);
        assert_f64_approx!(controller.population().network(0).fitness(), expected);
        assert_f64_approx!(controller.hook().evaluated[0].2, expected);
    }

    #[test]
    fn test_settling_ticks_ignored() {
        let mut controller = Controller::new(params(2, 10, 3), Journal::default()).unwrap();
        let mut motors = [0.; MOTORS];
        // large moves before the start snapshot must not count
        for x in [50., 80., 0., 0., 0.] {
            controller.tick(&sensors_at(x), &mut motors);
        }
        assert_eq!(0., controller.population().network(0).fitness());
        assert_eq!([0.; 3], controller.state().start_pos);
    }

    #[test]
    fn test_constant_displacement() {
        let mut controller = Controller::new(params(2, 500, 3), Journal::default()).unwrap();
        let mut motors = [0.; MOTORS];
        for t in 0..500 {
            let x = if t < 3 { 0. } else { 1. };
            controller.tick(&sensors_at(x), &mut motors);
        }
        assert_f64_approx!(controller.population().network(0).fitness(), E - 1., 1e-9);
    }

    #[test]
    fn test_motors_in_range() {
        let mut controller = Controller::new(params(3, 40, 2), Journal::default()).unwrap();
        controller.init(SENSORS, MOTORS).unwrap();
        let mut sled = Sled { x: 0. };
        let mut motors = [0.5; MOTORS];
        for _ in 0..2000 {
            controller.tick(&sled.sensors(), &mut motors);
            assert_eq!([0., 0.], motors[..2]);
            assert!(motors[2..].iter().all(|m| (-1.0..=1.0).contains(m)));
            sled.apply(&motors, controller.reset_robot());
        }
        assert_eq!(Phase::Finished, controller.phase());
    }

    test_n!(full_run[N: 4 | 20]() {
        let max_time = 30;
        let generations = 2;
        let mut controller = Controller::new(params(N, max_time, generations), Journal::default()).unwrap();
        let mut sled = Sled { x: 0. };
        let mut motors = [0.; MOTORS];

        let mut ticks = 0;
        while controller.phase() != Phase::Finished {
            assert_eq!(N, controller.population().len());
            assert!(controller.state().cur_net_id < N);
            run(&mut controller, &mut sled, &mut motors, 1);
            ticks += 1;
            assert!(ticks < 10 * N * (max_time + 1) * (generations + 2));
        }

        let journal = controller.hook();
        assert_eq!(generations + 1, journal.stats.len());
        assert_eq!(N * (generations + 1), journal.evaluated.len());
        assert_eq!(1, journal.finished);
        assert!(journal.demos <= generations);
        assert!(controller.reset_robot());

        let evaluated = N * (generations + 1) * (max_time + 1);
        let demos = journal.demos * (max_time + 1);
        assert_eq!(evaluated + demos, ticks);

        for (generation, stats) in journal.stats.iter().enumerate() {
            assert_eq!(generation, stats.generation);
        }
        let mut last = 0.;
        for stats in &journal.stats {
            assert!(stats.best_fitness >= last);
            last = stats.best_fitness;
        }
    });

    #[test]
    fn test_demo_between_generations() {
        let max_time = 10;
        let mut controller = Controller::new(params(2, max_time, 5), Journal::default()).unwrap();
        let mut motors = [0.; MOTORS];

        // both networks move forward, so a best network exists after the first generation
        for _ in 0..2 {
            for t in 0..max_time {
                controller.tick(&sensors_at(t as f64 * 0.1), &mut motors);
            }
            controller.tick(&sensors_at(0.), &mut motors);
        }
        assert_eq!(Phase::DemoBest, controller.phase());
        assert_eq!(1, controller.population().generation());
        assert!(controller.reset_robot());
        let best = controller.population().best().unwrap();
        let expected = DriveSignal::new(controller.params().speed, controller.params().sin_mod)
            .commands(best, 0);

        let before = controller
            .population()
            .networks()
            .iter()
            .map(Network::fitness)
            .collect::<Vec<_>>();
        controller.tick(&sensors_at(5.), &mut motors);
        assert_eq!(expected[..], motors[2..]);
        for _ in 1..max_time {
            controller.tick(&sensors_at(5.), &mut motors);
        }
        let after = controller
            .population()
            .networks()
            .iter()
            .map(Network::fitness)
            .collect::<Vec<_>>();
        assert_eq!(before, after);

        controller.tick(&sensors_at(0.), &mut motors);
        assert_eq!(Phase::Evaluating, controller.phase());
        assert!(controller.reset_robot());
        assert_eq!(0, controller.state().cur_net_id);
        assert_eq!(0, controller.state().t);
        assert_eq!(1, controller.hook().demos);
    }

    #[test]
    fn test_no_demo_without_best() {
        let max_time = 10;
        let mut controller = Controller::new(params(2, max_time, 5), Journal::default()).unwrap();
        let mut motors = [0.; MOTORS];
        for _ in 0..2 * (max_time + 1) {
            controller.tick(&sensors_at(0.), &mut motors);
        }
        assert_eq!(Phase::Evaluating, controller.phase());
        assert_eq!(1, controller.population().generation());
        assert_eq!(0, controller.hook().demos);
    }

    #[test]
    fn test_finished_plays_best_and_learns_nothing() {
        let max_time = 10;
        let mut controller = Controller::new(
            Params {
                demo_best: false,
                ..params(2, max_time, 1)
            },
            Journal::default(),
        )
        .unwrap();
        let mut motors = [0.; MOTORS];

        let mut ticks = 0;
        while controller.phase() != Phase::Finished {
            controller.tick(&sensors_at(ticks as f64 * 0.01), &mut motors);
            ticks += 1;
        }
        assert_eq!(2 * 2 * (max_time + 1), ticks);
        assert!(controller.reset_robot());

        let best = controller.population().best().unwrap().clone();
        assert_eq!(
            Some(best.forward(&[0.5, 0.5])),
            controller.active_network().map(|n| n.forward(&[0.5, 0.5]))
        );
        let signal = DriveSignal::new(controller.params().speed, controller.params().sin_mod);
        let frozen = controller
            .population()
            .networks()
            .iter()
            .map(Network::fitness)
            .collect::<Vec<_>>();
        let generation = controller.population().generation();

        for t in 0..200 {
            controller.tick(&sensors_at(t as f64), &mut motors);
            assert!(!controller.reset_robot());
            assert_eq!(signal.commands(&best, t)[..], motors[2..]);
        }
        assert_eq!(
            frozen,
            controller
                .population()
                .networks()
                .iter()
                .map(Network::fitness)
                .collect::<Vec<_>>()
        );
        assert_eq!(generation, controller.population().generation());
        assert_eq!(1, controller.hook().finished);
    }

    #[test]
    fn test_replaying() {
        let params = params(2, 10, 1);
        let donor = Controller::new(params.clone(), ()).unwrap();
        let network = donor.population().network(1).clone();
        let signal = DriveSignal::new(params.speed, params.sin_mod);

        let mut controller =
            Controller::replaying(params, network.clone(), Journal::default()).unwrap();
        assert_eq!(Phase::Finished, controller.phase());
        let mut motors = [0.; MOTORS];
        for t in 0..50 {
            controller.tick(&sensors_at(0.), &mut motors);
            assert_eq!(signal.commands(&network, t)[..], motors[2..]);
        }
        // the startup notice fires once, and playback reports nothing else
        assert_eq!(1, controller.hook().started);
        assert!(controller.hook().evaluated.is_empty());
        assert_eq!(0, controller.hook().finished);
    }

    #[test]
    fn test_replaying_rejects_wrong_shape() {
        let mut params = params(2, 10, 1);
        let donor = Controller::new(params.clone(), ()).unwrap();
        let network = donor.population().network(0).clone();
        params.topology.output = 8;
        assert!(Controller::replaying(params, network, ()).is_err());
    }
}
