use crate::config::FitnessParams;

/// Absolute robot position as reported by the host
pub type Position = [f64; 3];

/// Reward for moving `current - start` along `axis`: `exp(d) - 1`. Forward progress pays off
/// super-linearly, while backing up can never cost more than 1.
#[inline]
pub fn displacement_reward(start: &Position, current: &Position, axis: usize) -> f64 {
    (current[axis] - start[axis]).exp() - 1.
}

/// Turns positions sampled during one evaluation window into rewards. Alongside displacement it
/// tracks speed over fixed windows, and can charge for deviating from the running average speed.
#[derive(Debug, Clone)]
pub struct FitnessEvaluator {
    axis: usize,
    window: usize,
    penalty_weight: f64,
    distance_then: f64,
    total_speed: f64,
    average_speed: f64,
    penalty: f64,
}

impl FitnessEvaluator {
    pub fn new(params: &FitnessParams) -> Self {
        Self {
            axis: params.axis,
            window: params.speed_window,
            penalty_weight: params.speed_penalty,
            distance_then: 0.,
            total_speed: 0.,
            average_speed: 0.,
            penalty: 0.,
        }
    }

    /// Forget the previous window
    pub fn reset(&mut self) {
        self.distance_then = 0.;
        self.total_speed = 0.;
        self.average_speed = 0.;
        self.penalty = 0.;
    }

    /// Reward sample for tick `t` of the window
    pub fn sample(&mut self, t: usize, start: &Position, current: &Position) -> f64 {
        let distance = current[self.axis] - start[self.axis];

        if t != 0 && t % self.window == 0 {
            let speed = (distance - self.distance_then) / self.window as f64;
            self.total_speed += speed;
            self.average_speed = self.total_speed / (t / self.window) as f64;
            self.penalty += (self.average_speed - speed).abs();
            self.distance_then = distance;
        }

        let reward = displacement_reward(start, current, self.axis);
        if self.penalty_weight == 0. {
            reward
        } else {
            reward - self.penalty_weight * self.penalty
        }
    }

    #[inline]
    pub fn average_speed(&self) -> f64 {
        self.average_speed
    }

    #[inline]
    pub fn penalty(&self) -> f64 {
        self.penalty
    }
}
