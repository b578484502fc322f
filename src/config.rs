// src/config.rs
// User-facing simulation configuration. Deserialized from JSON (every field optional, missing
// fields fall back to the defaults below) and validated into the core types in one place.
// Initial angles are given in degrees; the core works in radians.

use crate::error::{ParameterError, ParameterResult};
use crate::logic::{Method, Simulation};
use crate::math::{Parameters, State};
use serde::{Deserialize, Serialize};

/// Upper bound on steps a single request may ask for.
pub const MAX_STEPS: usize = 500_000;

/// Environment variable holding the server bind address.
pub const ADDR_ENV: &str = "PENDULUM_ADDR";

/// Bind address when [`ADDR_ENV`] is unset.
pub const DEFAULT_ADDR: &str = "127.0.0.1:8080";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub mass1: f64,
    pub mass2: f64,
    pub length1: f64,
    pub length2: f64,
    pub gravity: f64,
    pub friction: f64,
    pub time_step: f64,
    pub theta1: f64, // Initial inner angle, degrees.
    pub theta2: f64, // Initial outer angle, degrees.
    pub method: Method,
    pub steps: usize,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            mass1: 10.0,
            mass2: 0.15,
            length1: 125.0,
            length2: 125.0,
            gravity: 9.81,
            friction: 0.0,
            time_step: 0.1,
            theta1: 90.0,
            theta2: 90.0,
            method: Method::Rk4,
            steps: 4000,
        }
    }
}

impl SimConfig {
    /// Validates the configuration into a ready-to-run simulation.
    pub fn build(&self) -> ParameterResult<Simulation> {
        if self.steps > MAX_STEPS {
            return Err(ParameterError::TooManySteps {
                requested: self.steps,
                max: MAX_STEPS,
            });
        }
        for (name, value) in [("theta1", self.theta1), ("theta2", self.theta2)] {
            if !value.is_finite() {
                return Err(ParameterError::NonFinite { name, value });
            }
        }
        let params = Parameters::new(
            self.mass1,
            self.mass2,
            self.length1,
            self.length2,
            self.gravity,
            self.friction,
            self.time_step,
        )?;
        let state = State::at_rest(&params, self.theta1.to_radians(), self.theta2.to_radians());
        Ok(Simulation::new(params, state, self.method))
    }
}

/// Server bind address: [`ADDR_ENV`] if set, otherwise [`DEFAULT_ADDR`].
pub fn bind_addr() -> String {
    std::env::var(ADDR_ENV).unwrap_or_else(|_| DEFAULT_ADDR.to_string())
}
