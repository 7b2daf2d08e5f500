use crate::{Table, Trajectory};

/// Indicates how a simulation terminated.
#[derive(Debug, Clone, PartialEq)]
pub enum Status {
    /// Integrated to the end time and realized every save.
    Complete,

    /// Stopped by an observer after the save at `time`.
    StoppedByObserver { time: f64 },

    /// The integrator gave up after its last accepted step at `time`.
    IntegratorFailed { time: f64, reason: String },
}

impl Status {
    /// Returns `true` if the run reached the end time.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        matches!(self, Self::Complete)
    }
}

/// Counters collected during a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Stats {
    /// Plain-mode derivative evaluations, including rejected steps.
    pub evaluations: usize,

    /// Steps accepted by the integrator.
    pub accepted_steps: usize,

    /// Logging-mode evaluations, one per table row.
    pub save_events: usize,
}

/// The result of a simulation.
#[derive(Debug, Clone)]
pub struct SimulationResult<const N: usize> {
    /// How the run terminated.
    pub status: Status,

    /// One row per realized save time.
    pub table: Table,

    /// The integrator's accepted steps, for reading states between saves.
    pub trajectory: Trajectory<N>,

    /// Evaluation and step counters.
    pub stats: Stats,
}
