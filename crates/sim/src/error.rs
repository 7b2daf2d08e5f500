use skein_core::LogError;
use thiserror::Error;

use crate::{ConfigError, TableError};

/// Errors that abort a simulation.
///
/// Integrator failures are not errors: they end the run with
/// [`Status::IntegratorFailed`](crate::Status::IntegratorFailed) and keep the
/// partial table.
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid options: {0}")]
    Config(#[from] ConfigError),

    #[error("logging failed at t = {time}: {source}")]
    Log {
        time: f64,
        #[source]
        source: LogError,
    },

    #[error("inconsistent trace: {0}")]
    Table(#[from] TableError),

    #[error("no parameters were given and the environment provides none")]
    MissingParams,
}

impl Error {
    pub(crate) fn log(time: f64, source: LogError) -> Self {
        Self::Log { time, source }
    }
}
