//! Simulation driver for Skein.
//!
//! Integrates a [`Dynamics`](skein_core::Dynamics) with an adaptive
//! `ode_solvers` method and captures a [`LogRecord`](skein_core::LogRecord)
//! at each save time. The integrator only ever runs the plain evaluation;
//! logging-mode evaluations happen once per save, after a step is accepted,
//! so recording never changes the trajectory.
//!
//! # Example
//!
//! ```
//! use skein_core::{Args, LogScope, from_fn};
//! use skein_sim::{Options, SaveTimes, simulate};
//!
//! let decay = from_fn(|dx: &mut [f64], args: Args<'_, f64>, log: &mut LogScope| {
//!     dx[0] = -args.params * args.x[0];
//!     log.append("x", args.x[0])
//! });
//!
//! let options = Options::new(0.0, 1.0)?.with_save_times(SaveTimes::At(vec![0.0, 0.5, 1.0]));
//! let result = simulate([1.0], &decay, &1.0, &options)?;
//!
//! assert!(result.status.is_complete());
//! assert_eq!(result.table.time(), &[0.0, 0.5, 1.0]);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod action;
mod config;
mod error;
mod event;
mod recorder;
mod simulate;
mod solution;
mod table;
mod trace;
mod trajectory;

pub use action::Action;
pub use config::{ConfigError, MAX_SAVE_TIMES, Method, Options, SaveTimes};
pub use error::Error;
pub use event::Event;
pub use simulate::{simulate, simulate_env, simulate_observed};
pub use solution::{SimulationResult, Stats, Status};
pub use table::{Table, TableError};
pub use trace::Trace;
pub use trajectory::{Knot, Trajectory};
