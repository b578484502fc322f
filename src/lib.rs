// src/lib.rs
// Double pendulum simulator: closed-form equations of motion, Euler/RK4 stepping with optional
// quadratic drag, a bounded simulation driver, a text log exporter, and the web front end.

pub mod config; // SimConfig defaults and validation
pub mod error; // ParameterError / ExportError
pub mod export; // "x1;y1;x2;y2;" trajectory log
pub mod logic; // Integrator, friction, Simulation driver
pub mod math; // Parameters, State, accelerations, energy
pub mod ui; // Actix-web handlers and plot rendering

pub use error::{ExportError, ParameterError};
pub use logic::{Integrator, Method, Simulation, Snapshot, Trajectory};
pub use math::{accelerations, total_energy, Parameters, State};
