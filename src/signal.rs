use crate::network::Network;
use core::f64::consts::FRAC_PI_2;

/// The periodic input every network is driven with. Component `i` is a sinusoid a quarter
/// period behind component `i - 1`, all sharing the tick-scaled frequency `t / speed`.
#[derive(Debug, Clone, Copy)]
pub struct DriveSignal {
    speed: f64,
    amplitude: f64,
}

impl DriveSignal {
    pub fn new(speed: f64, amplitude: f64) -> Self {
        Self { speed, amplitude }
    }

    pub fn at(&self, t: usize, inputs: usize) -> Vec<f64> {
        let phase = t as f64 / self.speed;
        (0..inputs)
            .map(|i| (phase + i as f64 * FRAC_PI_2).sin() * self.amplitude)
            .collect()
    }

    /// Motor commands `network` produces at tick `t`
    pub fn commands(&self, network: &Network, t: usize) -> Vec<f64> {
        network
            .forward(&self.at(t, network.topology().input))
            .into_iter()
            .map(motor_command)
            .collect()
    }

    /// Motor commands for every tick of a `window`-tick evaluation, without touching any robot
    pub fn trajectory(&self, network: &Network, window: usize) -> Vec<Vec<f64>> {
        (0..window).map(|t| self.commands(network, t)).collect()
    }
}

/// Map a network output in [0, 1] onto a motor command in [-1, 1]
#[inline]
pub fn motor_command(o: f64) -> f64 {
    2. * o - 1.
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        assert_f64_approx,
        network::Topology,
        random::{ProbBinding, ProbStatic, WyRng},
    };

    #[test]
    fn test_quadrature() {
        let signal = DriveSignal::new(30., 10.);
        let start = signal.at(0, 2);
        assert_f64_approx!(start[0], 0.);
        assert_f64_approx!(start[1], 10.);
        for t in [1, 17, 250, 4999] {
            let [s, c] = signal.at(t, 2)[..] else {
                panic!("expected two components")
            };
            let phase = t as f64 / 30.;
            assert_f64_approx!(s, phase.sin() * 10., 1e-9);
            assert_f64_approx!(c, phase.cos() * 10., 1e-9);
            // a quarter period apart
            assert_f64_approx!(s * s + c * c, 100., 1e-9);
        }
    }

    #[test]
    fn test_more_inputs_keep_stepping_phase() {
        let signal = DriveSignal::new(1., 1.);
        let v = signal.at(0, 4);
        assert_f64_approx!(v[0], 0.);
        assert_f64_approx!(v[1], 1.);
        assert_f64_approx!(v[2], 0.);
        assert_f64_approx!(v[3], -1.);
    }

    #[test]
    fn test_motor_command_range() {
        assert_eq!(-1., motor_command(0.));
        assert_eq!(0., motor_command(0.5));
        assert_eq!(1., motor_command(1.));
    }

    #[test]
    fn test_trajectory() {
        let mut rng = ProbBinding::new(ProbStatic::default(), WyRng::seeded(2));
        let net = Network::random(Topology::default(), 3., &mut rng).unwrap();
        let signal = DriveSignal::new(30., 10.);
        let trajectory = signal.trajectory(&net, 50);
        assert_eq!(50, trajectory.len());
        assert_eq!(signal.commands(&net, 17), trajectory[17]);
        assert!(trajectory
            .iter()
            .flatten()
            .all(|m| (-1.0..=1.0).contains(m)));
    }
}
