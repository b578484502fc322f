// src/logic.rs
// Time integration and the simulation loop.
// Integrator advances a State by one fixed step using either semi-implicit Euler or classical RK4
// on the state vector y = [θ1, θ2, ω1, ω2], optionally followed by quadratic-drag friction.
// Simulation owns one Parameters/State pair, drives the integrator, and records the trajectory.
// Stepping never fails: a blow-up leaves the State invalid and the driver stops there.

use crate::error::ParameterError;
use crate::math::{accelerations_at, Parameters, State};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::{debug, info, warn};

/// Snapshots reserved up front; `max_steps` is only an upper bound.
const PREALLOC_SNAPSHOTS: usize = 1 << 16;

/// Stepping strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Method {
    /// Semi-implicit Euler: velocity first, then angle with the new velocity. First order.
    Euler,
    /// Classical 4th-order Runge-Kutta on the full state vector.
    #[default]
    Rk4,
}

impl FromStr for Method {
    type Err = ParameterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "euler" => Ok(Method::Euler),
            "rk4" => Ok(Method::Rk4),
            _ => Err(ParameterError::UnknownMethod(s.to_string())),
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Method::Euler => f.write_str("euler"),
            Method::Rk4 => f.write_str("rk4"),
        }
    }
}

/// Quadratic drag on one angular velocity: v' = v - sign(v) * v² * f.
/// Always opposes the motion; a no-op for f = 0 or v = 0.
pub fn apply_friction(v: f64, friction: f64) -> f64 {
    v - v * v.abs() * friction // v * |v| == sign(v) * v².
}

/// Time derivative of y = [θ1, θ2, ω1, ω2]: [ω1, ω2, α1, α2].
fn deriv(params: &Parameters, y: &[f64; 4]) -> [f64; 4] {
    let (alpha1, alpha2) = accelerations_at(params, y[0], y[1], y[2], y[3]);
    [y[2], y[3], alpha1, alpha2]
}

/// y + h * k, component-wise.
fn offset(y: &[f64; 4], k: &[f64; 4], h: f64) -> [f64; 4] {
    std::array::from_fn(|i| y[i] + h * k[i])
}

/// Stateless stepper; holds only the chosen strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Integrator {
    method: Method,
}

impl Integrator {
    pub fn new(method: Method) -> Self {
        Self { method }
    }

    pub fn method(&self) -> Method {
        self.method
    }

    /// Advances `state` by `params.time_step()` in place.
    ///
    /// Does not validate: if the step produces NaN or infinity the state is simply left
    /// invalid, and every later step keeps it invalid.
    pub fn step(&self, params: &Parameters, state: &mut State) {
        let y = state.vector();
        let y_new = match self.method {
            Method::Euler => euler_step(params, &y),
            Method::Rk4 => rk4_step(params, &y),
        };
        state.assign(params, y_new); // Positions follow the new angles.
    }
}

/// Semi-implicit Euler: ω += α·dt, friction, θ += ω·dt. With dt = 1 this is the
/// "step folded into the constant" variant.
fn euler_step(params: &Parameters, y: &[f64; 4]) -> [f64; 4] {
    let dt = params.time_step();
    let f = params.friction();
    let (alpha1, alpha2) = accelerations_at(params, y[0], y[1], y[2], y[3]);

    let omega1 = apply_friction(y[2] + alpha1 * dt, f);
    let omega2 = apply_friction(y[3] + alpha2 * dt, f);

    [y[0] + omega1 * dt, y[1] + omega2 * dt, omega1, omega2]
}

/// Single RK4 step: y_{t+dt} = y + (dt/6)(k1 + 2k2 + 2k3 + k4), then friction on the velocities.
/// Friction is a post-step correction, not part of the stage evaluations.
fn rk4_step(params: &Parameters, y: &[f64; 4]) -> [f64; 4] {
    let dt = params.time_step();
    let k1 = deriv(params, y);
    let k2 = deriv(params, &offset(y, &k1, 0.5 * dt));
    let k3 = deriv(params, &offset(y, &k2, 0.5 * dt));
    let k4 = deriv(params, &offset(y, &k3, dt));

    let mut y_new: [f64; 4] =
        std::array::from_fn(|i| y[i] + (dt / 6.0) * (k1[i] + 2.0 * k2[i] + 2.0 * k3[i] + k4[i]));
    y_new[2] = apply_friction(y_new[2], params.friction());
    y_new[3] = apply_friction(y_new[3], params.friction());
    y_new
}

/// One recorded point of a trajectory.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Snapshot {
    pub step: usize,
    pub time: f64,
    pub theta1: f64,
    pub theta2: f64,
    pub omega1: f64,
    pub omega2: f64,
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
}

impl Snapshot {
    fn capture(step: usize, time: f64, state: &State) -> Self {
        let (x1, y1, x2, y2) = state.positions();
        Self {
            step,
            time,
            theta1: state.theta1(),
            theta2: state.theta2(),
            omega1: state.omega1(),
            omega2: state.omega2(),
            x1,
            y1,
            x2,
            y2,
        }
    }
}

/// Recorded run: only valid states are kept.
#[derive(Debug, Clone, Default)]
pub struct Trajectory {
    pub snapshots: Vec<Snapshot>,
    /// Step at which the state became invalid, if it did.
    pub diverged_at: Option<usize>,
}

impl Trajectory {
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    pub fn last(&self) -> Option<&Snapshot> {
        self.snapshots.last()
    }
}

/// Owns one pendulum and drives its integration.
#[derive(Debug, Clone)]
pub struct Simulation {
    params: Parameters,
    state: State,
    integrator: Integrator,
    steps: usize, // Steps taken so far.
}

impl Simulation {
    pub fn new(params: Parameters, state: State, method: Method) -> Self {
        Self {
            params,
            state,
            integrator: Integrator::new(method),
            steps: 0,
        }
    }

    pub fn params(&self) -> &Parameters {
        &self.params
    }

    pub fn state(&self) -> &State {
        &self.state
    }

    pub fn steps(&self) -> usize {
        self.steps
    }

    /// Elapsed simulated time.
    pub fn time(&self) -> f64 {
        self.steps as f64 * self.params.time_step()
    }

    /// Takes one step; returns whether the state is still valid.
    pub fn step(&mut self) -> bool {
        self.integrator.step(&self.params, &mut self.state);
        self.steps += 1;
        self.state.is_valid()
    }

    /// Runs up to `max_steps` steps, recording the starting state and every valid state after it.
    /// Stops at the first invalid state; that state is not recorded.
    pub fn run(&mut self, max_steps: usize) -> Trajectory {
        info!(
            method = %self.integrator.method(),
            max_steps,
            time_step = self.params.time_step(),
            friction = self.params.friction(),
            "Starting double pendulum simulation"
        );

        let mut trajectory = Trajectory {
            snapshots: Vec::with_capacity(max_steps.min(PREALLOC_SNAPSHOTS).saturating_add(1)),
            diverged_at: None,
        };

        if !self.state.is_valid() {
            warn!(step = self.steps, "Initial state is already invalid");
            trajectory.diverged_at = Some(self.steps);
            return trajectory;
        }
        trajectory
            .snapshots
            .push(Snapshot::capture(self.steps, self.time(), &self.state));

        for _ in 0..max_steps {
            if !self.step() {
                warn!(step = self.steps, "State became non-finite, stopping run");
                trajectory.diverged_at = Some(self.steps);
                break;
            }
            trajectory
                .snapshots
                .push(Snapshot::capture(self.steps, self.time(), &self.state));
        }

        debug!(
            recorded = trajectory.len(),
            diverged = trajectory.diverged_at.is_some(),
            "Simulation finished"
        );
        trajectory
    }
}
