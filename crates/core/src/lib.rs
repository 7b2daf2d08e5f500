//! Core traits and types for Skein.
//!
//! This crate defines the instrumentation layer that simulation drivers build on:
//!
//! - [`Dynamics`]: a user-authored derivative computation with optional logging
//! - [`LoggableFunction`]: the plain and logging entry points every [`Dynamics`] gets
//! - [`LogRecord`] / [`LogValue`]: hierarchical, per-time-step structured records
//! - [`LogScope`]: the accumulation context of one logging-mode activation
//! - [`MergePolicy`]: how a nested subsystem's record joins its parent's record
//! - [`apply_inputs`]: resolves named external inputs before delegating
//! - [`Environment`]: factories for a subsystem's state, dynamics, and parameters
//! - [`Observer`]: receives driver events and optionally returns control actions

mod compose;
mod dynamics;
mod environment;
mod error;
mod inputs;
mod observer;
mod record;
mod scope;

pub use compose::MergePolicy;
pub use dynamics::{Args, Dynamics, FnDynamics, LoggableFunction, Unlogged, from_fn, unlogged};
pub use environment::Environment;
pub use error::LogError;
pub use inputs::{InputFn, Inputs, WithInputs, apply_inputs};
pub use observer::Observer;
pub use record::{LogRecord, LogShape, LogValue};
pub use scope::LogScope;
