// src/math.rs
// Physical model of a double pendulum: parameters, the dynamical state, and the closed-form
// equations of motion derived from the Lagrangian of two point masses on massless rods.
// Angles are measured from the downward vertical; Cartesian coordinates use screen orientation
// (x to the right, y growing downward), so a pendulum hanging at rest sits at (0, l1) / (0, l1 + l2).
// Everything here is pure: no I/O, no global state, f64 throughout.

use crate::error::{ParameterError, ParameterResult};

/// Fails unless `value` is finite and strictly positive.
fn check_positive(name: &'static str, value: f64) -> ParameterResult<f64> {
    if !value.is_finite() {
        return Err(ParameterError::NonFinite { name, value });
    }
    if value <= 0.0 {
        return Err(ParameterError::NonPositive { name, value });
    }
    Ok(value)
}

/// Physical constants of one pendulum instance plus the fixed integration step.
/// Immutable once built; every constructor path validates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Parameters {
    mass1: f64,     // Inner point mass.
    mass2: f64,     // Outer point mass.
    length1: f64,   // Inner rod length.
    length2: f64,   // Outer rod length.
    gravity: f64,   // Gravitational acceleration.
    friction: f64,  // Quadratic drag coefficient; 0 disables friction.
    time_step: f64, // Fixed step size used by both integration strategies.
}

impl Parameters {
    /// Validates and builds a parameter set.
    ///
    /// Masses, lengths, gravity and the time step must be finite and strictly positive;
    /// friction must be finite and non-negative. Nothing is clamped.
    pub fn new(
        mass1: f64,
        mass2: f64,
        length1: f64,
        length2: f64,
        gravity: f64,
        friction: f64,
        time_step: f64,
    ) -> ParameterResult<Self> {
        if !friction.is_finite() {
            return Err(ParameterError::NonFinite {
                name: "friction",
                value: friction,
            });
        }
        if friction < 0.0 {
            return Err(ParameterError::NegativeFriction(friction));
        }
        Ok(Self {
            mass1: check_positive("mass1", mass1)?,
            mass2: check_positive("mass2", mass2)?,
            length1: check_positive("length1", length1)?,
            length2: check_positive("length2", length2)?,
            gravity: check_positive("gravity", gravity)?,
            friction,
            time_step: check_positive("time_step", time_step)?,
        })
    }

    pub fn mass1(&self) -> f64 {
        self.mass1
    }

    pub fn mass2(&self) -> f64 {
        self.mass2
    }

    pub fn length1(&self) -> f64 {
        self.length1
    }

    pub fn length2(&self) -> f64 {
        self.length2
    }

    pub fn gravity(&self) -> f64 {
        self.gravity
    }

    pub fn friction(&self) -> f64 {
        self.friction
    }

    pub fn time_step(&self) -> f64 {
        self.time_step
    }

    /// Reach of the fully extended pendulum, used to size plots.
    pub fn total_length(&self) -> f64 {
        self.length1 + self.length2
    }
}

/// Cartesian positions of both point masses for the given angles: [x1, y1, x2, y2].
/// Depends only on angles and rod lengths.
fn derive_positions(params: &Parameters, theta1: f64, theta2: f64) -> [f64; 4] {
    let x1 = params.length1 * theta1.sin(); // Inner mass, offset from the pivot.
    let y1 = params.length1 * theta1.cos();
    let x2 = x1 + params.length2 * theta2.sin(); // Outer mass, offset from the inner mass.
    let y2 = y1 + params.length2 * theta2.cos();
    [x1, y1, x2, y2]
}

/// Dynamical state of the pendulum. Angles are unbounded (never wrapped).
///
/// The Cartesian positions are derived from the angles and are only ever rewritten together
/// with them, so the two can never disagree. Outside the crate the state is read-only;
/// it evolves through [`crate::logic::Integrator::step`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct State {
    theta1: f64,
    theta2: f64,
    omega1: f64,
    omega2: f64,
    positions: [f64; 4],
}

impl State {
    /// Builds a state from initial angles (radians) and angular velocities.
    /// No validation: any real (or non-finite) value is accepted and reported by [`State::is_valid`].
    pub fn new(params: &Parameters, theta1: f64, theta2: f64, omega1: f64, omega2: f64) -> Self {
        Self {
            theta1,
            theta2,
            omega1,
            omega2,
            positions: derive_positions(params, theta1, theta2),
        }
    }

    /// Conventional starting point: released from the given angles with zero velocity.
    pub fn at_rest(params: &Parameters, theta1: f64, theta2: f64) -> Self {
        Self::new(params, theta1, theta2, 0.0, 0.0)
    }

    pub fn theta1(&self) -> f64 {
        self.theta1
    }

    pub fn theta2(&self) -> f64 {
        self.theta2
    }

    pub fn omega1(&self) -> f64 {
        self.omega1
    }

    pub fn omega2(&self) -> f64 {
        self.omega2
    }

    /// Derived Cartesian coordinates (x1, y1, x2, y2).
    pub fn positions(&self) -> (f64, f64, f64, f64) {
        let [x1, y1, x2, y2] = self.positions;
        (x1, y1, x2, y2)
    }

    /// False once any angle, velocity or position is NaN or infinite. Invalid is terminal.
    pub fn is_valid(&self) -> bool {
        self.vector().iter().all(|v| v.is_finite()) && self.positions.iter().all(|v| v.is_finite())
    }

    /// The integrated quantities as one vector: [theta1, theta2, omega1, omega2].
    pub(crate) fn vector(&self) -> [f64; 4] {
        [self.theta1, self.theta2, self.omega1, self.omega2]
    }

    /// Overwrites angles and velocities and re-derives the positions from the new angles.
    pub(crate) fn assign(&mut self, params: &Parameters, [theta1, theta2, omega1, omega2]: [f64; 4]) {
        self.theta1 = theta1;
        self.theta2 = theta2;
        self.omega1 = omega1;
        self.omega2 = omega2;
        self.positions = derive_positions(params, theta1, theta2);
    }
}

/// Angular accelerations (alpha1, alpha2) for raw angles and velocities.
///
/// Gravity only: no friction, no external torque. When the shared denominator
/// `2*m1 + m2 - m2*cos(2*delta)` is exactly zero the result is non-finite; that is left to
/// propagate into the state and be caught by the validity check.
pub(crate) fn accelerations_at(
    params: &Parameters,
    theta1: f64,
    theta2: f64,
    omega1: f64,
    omega2: f64,
) -> (f64, f64) {
    let Parameters {
        mass1: m1,
        mass2: m2,
        length1: l1,
        length2: l2,
        gravity: g,
        ..
    } = *params;

    let delta = theta1 - theta2;
    let (sin_d, cos_d) = delta.sin_cos();
    let w1_sq = omega1 * omega1;
    let w2_sq = omega2 * omega2;
    let mass_term = 2.0 * m1 + m2 - m2 * (2.0 * delta).cos(); // Shared by both denominators.

    let alpha1 = (-g * (2.0 * m1 + m2) * theta1.sin()
        - m2 * g * (theta1 - 2.0 * theta2).sin()
        - 2.0 * sin_d * m2 * (w2_sq * l2 + w1_sq * l1 * cos_d))
        / (l1 * mass_term);

    let alpha2 = (2.0
        * sin_d
        * (w1_sq * l1 * (m1 + m2) + g * (m1 + m2) * theta1.cos() + w2_sq * l2 * m2 * cos_d))
        / (l2 * mass_term);

    (alpha1, alpha2)
}

/// Equations of motion: angular accelerations implied by the current state.
pub fn accelerations(params: &Parameters, state: &State) -> (f64, f64) {
    accelerations_at(params, state.theta1, state.theta2, state.omega1, state.omega2)
}

/// Total mechanical energy (kinetic + potential), potential zero at the pivot height.
pub fn total_energy(params: &Parameters, state: &State) -> f64 {
    let Parameters {
        mass1: m1,
        mass2: m2,
        length1: l1,
        length2: l2,
        gravity: g,
        ..
    } = *params;
    let (t1, t2, w1, w2) = (state.theta1, state.theta2, state.omega1, state.omega2);

    let v1_sq = l1 * l1 * w1 * w1; // Speed squared of the inner mass.
    let v2_sq = v1_sq + l2 * l2 * w2 * w2 + 2.0 * l1 * l2 * w1 * w2 * (t1 - t2).cos();
    let kinetic = 0.5 * m1 * v1_sq + 0.5 * m2 * v2_sq;
    let potential = -(m1 + m2) * g * l1 * t1.cos() - m2 * g * l2 * t2.cos();
    kinetic + potential
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::{FRAC_PI_2, PI};

    fn params() -> Parameters {
        Parameters::new(10.0, 0.15, 125.0, 125.0, 9.81, 0.0, 1.0).unwrap()
    }

    #[test]
    fn test_parameters_reject_non_positive() {
        let err = Parameters::new(0.0, 1.0, 1.0, 1.0, 9.81, 0.0, 0.01).unwrap_err();
        assert_eq!(
            err,
            ParameterError::NonPositive {
                name: "mass1",
                value: 0.0
            }
        );
        assert!(Parameters::new(1.0, -1.0, 1.0, 1.0, 9.81, 0.0, 0.01).is_err());
        assert!(Parameters::new(1.0, 1.0, 1.0, 1.0, 0.0, 0.0, 0.01).is_err());
        assert!(Parameters::new(1.0, 1.0, 1.0, 1.0, 9.81, 0.0, 0.0).is_err());
    }

    #[test]
    fn test_parameters_reject_non_finite() {
        let err = Parameters::new(1.0, 1.0, f64::INFINITY, 1.0, 9.81, 0.0, 0.01).unwrap_err();
        assert!(matches!(err, ParameterError::NonFinite { name: "length1", .. }));
        assert!(Parameters::new(1.0, 1.0, 1.0, f64::NAN, 9.81, 0.0, 0.01).is_err());
        assert!(Parameters::new(1.0, 1.0, 1.0, 1.0, 9.81, f64::NAN, 0.01).is_err());
    }

    #[test]
    fn test_parameters_reject_negative_friction() {
        let err = Parameters::new(1.0, 1.0, 1.0, 1.0, 9.81, -0.1, 0.01).unwrap_err();
        assert_eq!(err, ParameterError::NegativeFriction(-0.1));
    }

    #[test]
    fn test_hanging_straight_is_equilibrium() {
        let p = params();
        let state = State::at_rest(&p, 0.0, 0.0);
        let (a1, a2) = accelerations(&p, &state);
        assert_eq!(a1, 0.0);
        assert_eq!(a2, 0.0);
    }

    #[test]
    fn test_aligned_rods_at_rest_outer_acceleration_vanishes() {
        // sin(delta) = 0, so the outer rod feels no relative torque.
        let p = params();
        let state = State::at_rest(&p, 0.7, 0.7);
        let (a1, a2) = accelerations(&p, &state);
        assert_eq!(a2, 0.0);
        // Inner rod falls back toward the vertical like a simple pendulum.
        assert_relative_eq!(a1, -p.gravity() * 0.7_f64.sin() / p.length1(), epsilon = 1e-12);
    }

    #[test]
    fn test_accelerations_are_antisymmetric_in_angles() {
        let p = params();
        let (a1, a2) = accelerations(&p, &State::new(&p, 0.4, -0.9, 0.2, -0.1));
        let (b1, b2) = accelerations(&p, &State::new(&p, -0.4, 0.9, -0.2, 0.1));
        assert_relative_eq!(a1, -b1, epsilon = 1e-12);
        assert_relative_eq!(a2, -b2, epsilon = 1e-12);
    }

    #[test]
    fn test_positions_match_geometry() {
        let p = params();
        let (x1, y1, x2, y2) = State::at_rest(&p, FRAC_PI_2, 0.0).positions();
        assert_relative_eq!(x1, 125.0, epsilon = 1e-9);
        assert_relative_eq!(y1, 0.0, epsilon = 1e-9);
        assert_relative_eq!(x2, 125.0, epsilon = 1e-9);
        assert_relative_eq!(y2, 125.0, epsilon = 1e-9);

        let (_, y1, _, y2) = State::at_rest(&p, 0.0, 0.0).positions();
        assert_eq!(y1, 125.0);
        assert_eq!(y2, 250.0);
    }

    #[test]
    fn test_positions_are_idempotent() {
        let p = params();
        let state = State::new(&p, 1.234, -5.678, 0.5, 0.25);
        let first = state.positions();
        let second = state.positions();
        assert_eq!(first.0.to_bits(), second.0.to_bits());
        assert_eq!(first.3.to_bits(), second.3.to_bits());
        assert_eq!(derive_positions(&p, 1.234, -5.678), derive_positions(&p, 1.234, -5.678));
    }

    #[test]
    fn test_assign_rederives_positions() {
        let p = params();
        let mut state = State::at_rest(&p, 0.0, 0.0);
        state.assign(&p, [PI, PI, 1.0, 2.0]);
        let (x1, y1, _, y2) = state.positions();
        assert_relative_eq!(x1, 0.0, epsilon = 1e-9);
        assert_relative_eq!(y1, -125.0, epsilon = 1e-9);
        assert_relative_eq!(y2, -250.0, epsilon = 1e-9);
        assert_eq!(state.omega2(), 2.0);
    }

    #[test]
    fn test_is_valid() {
        let p = params();
        assert!(State::at_rest(&p, 1.0, 2.0).is_valid());
        assert!(!State::new(&p, f64::NAN, 0.0, 0.0, 0.0).is_valid());
        assert!(!State::new(&p, 0.0, 0.0, f64::INFINITY, 0.0).is_valid());
    }

    #[test]
    fn test_energy_at_rest_is_potential_only() {
        let p = params();
        let hanging = total_energy(&p, &State::at_rest(&p, 0.0, 0.0));
        let expected = -(p.mass1() + p.mass2()) * p.gravity() * p.length1()
            - p.mass2() * p.gravity() * p.length2();
        assert_relative_eq!(hanging, expected, epsilon = 1e-9);

        let horizontal = total_energy(&p, &State::at_rest(&p, FRAC_PI_2, FRAC_PI_2));
        assert_relative_eq!(horizontal, 0.0, epsilon = 1e-9);
    }
}
