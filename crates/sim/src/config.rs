use std::collections::VecDeque;

use thiserror::Error;

/// Supported integration methods.
///
/// Both are adaptive embedded Runge–Kutta methods from `ode_solvers`, which
/// owns step-size selection and error control.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Method {
    /// Adaptive Dormand–Prince 5(4) method.
    ///
    /// A good general-purpose choice for non-stiff problems.
    Dopri5 { abs_tol: f64, rel_tol: f64 },

    /// Adaptive Dormand–Prince 8(5,3) method.
    ///
    /// More work per step than `Dopri5`, but usually fewer steps when tight
    /// tolerances are needed.
    Dop853 { abs_tol: f64, rel_tol: f64 },
}

impl Default for Method {
    fn default() -> Self {
        Self::Dopri5 {
            abs_tol: 1e-10,
            rel_tol: 1e-10,
        }
    }
}

impl Method {
    /// Returns a short name for diagnostics.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Dopri5 { .. } => "dopri5",
            Self::Dop853 { .. } => "dop853",
        }
    }

    fn tolerances(&self) -> (f64, f64) {
        match *self {
            Self::Dopri5 { abs_tol, rel_tol } | Self::Dop853 { abs_tol, rel_tol } => {
                (abs_tol, rel_tol)
            }
        }
    }
}

/// The times at which records are captured.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum SaveTimes {
    /// Save at the start time and after every accepted integrator step.
    #[default]
    Steps,

    /// Save at exactly these times.
    ///
    /// Times must be strictly ascending and lie within `[start, end]`.
    ///
    /// A time that falls inside an accepted step is filled in by cubic Hermite
    /// interpolation between the step's end points. That interpolant is fourth
    /// order, so its error can exceed the integrator's own local error by a
    /// small factor. Tighten the tolerances, or use [`SaveTimes::Steps`], when
    /// saves must carry the full accuracy of the method.
    At(Vec<f64>),

    /// Save on a uniform grid from the start time, always including the end time.
    ///
    /// The grid may hold at most [`MAX_SAVE_TIMES`] points.
    Every(f64),
}

/// Time span, method, and save times for one simulation.
#[derive(Debug, Clone, PartialEq)]
pub struct Options {
    start_time: f64,
    end_time: f64,
    method: Method,
    save_times: SaveTimes,
}

/// Errors that can occur when validating simulation options.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    #[error("start and end times must be finite")]
    NonFiniteSpan,

    #[error("end time {end} must be greater than start time {start}")]
    EmptySpan { start: f64, end: f64 },

    #[error("tolerances must be finite and positive")]
    Tolerance,

    #[error("save time {time} is outside [{start}, {end}]")]
    SaveTimeOutOfRange { time: f64, start: f64, end: f64 },

    #[error("save times must be strictly ascending, but {time} follows {previous}")]
    SaveTimesNotAscending { previous: f64, time: f64 },

    #[error("save interval must be finite and positive")]
    SaveInterval,

    #[error("save interval {interval} yields more than {limit} save times")]
    TooManySaveTimes { interval: f64, limit: usize },
}

/// Upper bound on the number of save times a uniform grid may produce.
pub const MAX_SAVE_TIMES: usize = 10_000_000;

impl Options {
    /// Creates options for integrating over `[start_time, end_time]`.
    ///
    /// The method defaults to [`Method::default`] and saves happen at every
    /// accepted step.
    ///
    /// # Errors
    ///
    /// Returns an error if either time is non-finite or the span is empty.
    pub fn new(start_time: f64, end_time: f64) -> Result<Self, ConfigError> {
        if !start_time.is_finite() || !end_time.is_finite() {
            return Err(ConfigError::NonFiniteSpan);
        }
        if end_time <= start_time {
            return Err(ConfigError::EmptySpan {
                start: start_time,
                end: end_time,
            });
        }

        Ok(Self {
            start_time,
            end_time,
            method: Method::default(),
            save_times: SaveTimes::default(),
        })
    }

    /// Sets the integration method.
    #[must_use]
    pub fn with_method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    /// Sets the save times.
    #[must_use]
    pub fn with_save_times(mut self, save_times: SaveTimes) -> Self {
        self.save_times = save_times;
        self
    }

    #[must_use]
    pub fn start_time(&self) -> f64 {
        self.start_time
    }

    #[must_use]
    pub fn end_time(&self) -> f64 {
        self.end_time
    }

    #[must_use]
    pub fn method(&self) -> Method {
        self.method
    }

    #[must_use]
    pub fn save_times(&self) -> &SaveTimes {
        &self.save_times
    }

    /// Checks the method tolerances and save times.
    ///
    /// The driver calls this before integrating.
    ///
    /// # Errors
    ///
    /// Returns the first problem found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.schedule().map(|_| ())
    }

    /// Validates the options and resolves the save times into a schedule.
    pub(crate) fn schedule(&self) -> Result<Schedule, ConfigError> {
        let (abs_tol, rel_tol) = self.method.tolerances();
        if !(abs_tol.is_finite() && abs_tol > 0.0 && rel_tol.is_finite() && rel_tol > 0.0) {
            return Err(ConfigError::Tolerance);
        }

        let (start, end) = (self.start_time, self.end_time);
        match &self.save_times {
            SaveTimes::Steps => Ok(Schedule::Steps),
            SaveTimes::At(times) => {
                let mut previous: Option<f64> = None;
                for &time in times {
                    if !(start..=end).contains(&time) {
                        return Err(ConfigError::SaveTimeOutOfRange { time, start, end });
                    }
                    if let Some(previous) = previous {
                        if time <= previous {
                            return Err(ConfigError::SaveTimesNotAscending { previous, time });
                        }
                    }
                    previous = Some(time);
                }
                Ok(Schedule::At(times.iter().copied().collect()))
            }
            SaveTimes::Every(interval) => {
                let interval = *interval;
                if !interval.is_finite() || interval <= 0.0 {
                    return Err(ConfigError::SaveInterval);
                }
                let count = ((end - start) / interval).ceil();
                if count > MAX_SAVE_TIMES as f64 {
                    return Err(ConfigError::TooManySaveTimes {
                        interval,
                        limit: MAX_SAVE_TIMES,
                    });
                }
                let count = count as usize;

                let mut times = VecDeque::with_capacity(count + 1);
                for index in 0..count {
                    let time = start + index as f64 * interval;
                    if time >= end - time_tolerance(end) {
                        break;
                    }
                    times.push_back(time);
                }
                times.push_back(end);
                Ok(Schedule::At(times))
            }
        }
    }
}

/// Resolved save times for one run.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Schedule {
    /// Save at every accepted step.
    Steps,

    /// Save at these times, in order.
    At(VecDeque<f64>),
}

impl Schedule {
    /// Number of planned saves, if known before integrating.
    pub(crate) fn planned(&self) -> Option<usize> {
        match self {
            Self::Steps => None,
            Self::At(times) => Some(times.len()),
        }
    }

    /// Removes and returns the next explicit save time if it is at or before `limit`.
    pub(crate) fn pop_due(&mut self, limit: f64) -> Option<f64> {
        let Self::At(times) = self else {
            return None;
        };
        if *times.front()? > limit {
            return None;
        }
        times.pop_front()
    }

    /// Returns the next explicit save time not yet realized.
    pub(crate) fn next_pending(&self) -> Option<f64> {
        match self {
            Self::Steps => None,
            Self::At(times) => times.front().copied(),
        }
    }
}

/// Two times closer than this are treated as the same save time.
pub(crate) fn time_tolerance(time: f64) -> f64 {
    4.0 * f64::EPSILON * time.abs().max(1.0)
}
