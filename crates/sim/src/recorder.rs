use std::cell::{Cell, RefCell};

use ode_solvers::{SVector, System, dop_shared::IntegrationError};
use skein_core::{Args, Dynamics, LogError, LoggableFunction, Observer};
use tracing::{trace, warn};

use crate::{
    Action, Error, Event, SimulationResult, Stats, Status, Trace,
    config::{Schedule, time_tolerance},
    trajectory::{Knot, Trajectory, hermite},
};

/// Why the recorder asked the integrator to stop.
enum Halt {
    Observer { time: f64 },
    Failed(Error),
}

/// Captures records at save times while the integrator runs.
///
/// The integrator only ever sees plain-mode evaluations through
/// [`Recorder::derivative`]. Logging-mode evaluations happen in
/// [`Recorder::on_step`], once per realized save time, after a step has been
/// accepted.
pub(crate) struct Recorder<'a, D: Dynamics, O, const N: usize> {
    dynamics: &'a D,
    params: &'a D::Params,
    schedule: Schedule,
    trace: Trace,
    trajectory: Trajectory<N>,
    observer: O,
    evaluations: Cell<usize>,
    accepted_steps: usize,
    rhs_error: RefCell<Option<Error>>,
    halt: Option<Halt>,
}

impl<'a, D, O, const N: usize> Recorder<'a, D, O, N>
where
    D: Dynamics,
    O: for<'e> Observer<Event<'e>, Action>,
{
    /// Creates a recorder positioned at the initial state.
    ///
    /// Saves due at the start time are captured immediately.
    pub(crate) fn new(
        dynamics: &'a D,
        params: &'a D::Params,
        schedule: Schedule,
        start_time: f64,
        initial_state: [f64; N],
        observer: O,
    ) -> Result<Self, Error> {
        let mut derivative = [0.0; N];
        dynamics
            .evaluate(&mut derivative, Args::new(&initial_state, params, start_time))
            .map_err(|source| Error::log(start_time, source))?;
        let initial = Knot {
            time: start_time,
            state: initial_state,
            derivative,
        };

        let mut recorder = Self {
            dynamics,
            params,
            schedule,
            trace: Trace::new(),
            trajectory: Trajectory::new(initial),
            observer,
            evaluations: Cell::new(1),
            accepted_steps: 0,
            rhs_error: RefCell::new(None),
            halt: None,
        };

        if matches!(recorder.schedule, Schedule::Steps) {
            recorder.save(start_time, &initial_state);
        } else {
            recorder.realize_due(None, &initial);
        }

        Ok(recorder)
    }

    /// Returns `true` once the run should not continue.
    pub(crate) fn is_halted(&self) -> bool {
        self.halt.is_some()
    }

    /// Plain-mode evaluation, the integrator's hot path.
    fn derivative(&self, time: f64, state: &[f64], dx: &mut [f64]) -> Result<(), LogError> {
        self.evaluations.set(self.evaluations.get() + 1);
        self.dynamics.evaluate(dx, Args::new(state, self.params, time))
    }

    /// Handles an accepted step and returns `true` to stop the integrator.
    fn on_step(&mut self, time: f64, state: [f64; N]) -> bool {
        if self.halt.is_some() {
            return true;
        }
        if let Some(error) = self.rhs_error.get_mut().take() {
            self.halt = Some(Halt::Failed(error));
            return true;
        }

        let previous = *self.trajectory.last();
        if time <= previous.time {
            return false;
        }

        let mut derivative = [0.0; N];
        if let Err(source) = self.derivative(time, &state, &mut derivative) {
            self.halt = Some(Halt::Failed(Error::log(time, source)));
            return true;
        }
        let knot = Knot {
            time,
            state,
            derivative,
        };
        self.trajectory.push(knot);
        self.accepted_steps += 1;

        if matches!(self.schedule, Schedule::Steps) {
            self.save(time, &state);
        } else {
            self.realize_due(Some(&previous), &knot);
        }

        self.halt.is_some()
    }

    /// Saves every pending time covered by the step ending at `knot`.
    fn realize_due(&mut self, previous: Option<&Knot<N>>, knot: &Knot<N>) {
        let tolerance = time_tolerance(knot.time);
        while let Some(time) = self.schedule.pop_due(knot.time + tolerance) {
            let state = match previous {
                Some(previous) if (time - knot.time).abs() > tolerance => {
                    hermite(previous, knot, time)
                }
                _ => knot.state,
            };
            self.save(time, &state);
            if self.halt.is_some() {
                break;
            }
        }
    }

    fn save(&mut self, time: f64, state: &[f64; N]) {
        if let Err(error) = self.capture(time, state) {
            self.halt = Some(Halt::Failed(error));
        }
    }

    /// Logging-mode evaluation at a save time.
    ///
    /// The derivative is written to scratch space and discarded.
    fn capture(&mut self, time: f64, state: &[f64; N]) -> Result<(), Error> {
        let mut scratch = [0.0; N];
        let record = self
            .dynamics
            .evaluate_with_log(&mut scratch, Args::new(state, self.params, time))
            .map_err(|source| Error::log(time, source))?;

        trace!(time, fields = record.len(), "captured record");
        self.trace.push(time, record)?;

        if let Some((time, record)) = self.trace.last() {
            let event = Event {
                index: self.trace.len() - 1,
                time,
                state,
                record,
            };
            if let Some(Action::StopEarly) = self.observer.observe(&event) {
                self.halt = Some(Halt::Observer { time });
            }
        }

        Ok(())
    }

    /// Converts the recorder and the integrator's outcome into a result.
    pub(crate) fn finish(
        self,
        outcome: Result<(), IntegrationError>,
    ) -> Result<SimulationResult<N>, Error> {
        let Self {
            schedule,
            trace,
            trajectory,
            evaluations,
            accepted_steps,
            rhs_error,
            halt,
            ..
        } = self;

        let status = match halt {
            Some(Halt::Failed(error)) => return Err(error),
            Some(Halt::Observer { time }) => {
                warn!(time, "simulation stopped by observer");
                Status::StoppedByObserver { time }
            }
            None => {
                if let Some(error) = rhs_error.into_inner() {
                    return Err(error);
                }
                match (outcome, schedule.next_pending()) {
                    (Err(error), _) => {
                        let time = trajectory.end_time();
                        warn!(time, %error, "integrator failed");
                        Status::IntegratorFailed {
                            time,
                            reason: error.to_string(),
                        }
                    }
                    (Ok(()), Some(pending)) => {
                        let time = trajectory.end_time();
                        warn!(time, pending, "integrator stopped before the last save time");
                        Status::IntegratorFailed {
                            time,
                            reason: format!("integration ended before save time {pending}"),
                        }
                    }
                    (Ok(()), None) => Status::Complete,
                }
            }
        };

        let stats = Stats {
            evaluations: evaluations.get(),
            accepted_steps,
            save_events: trace.len(),
        };

        Ok(SimulationResult {
            status,
            table: trace.into_table(),
            trajectory,
            stats,
        })
    }
}

/// Adapts a borrowed [`Recorder`] to the `ode_solvers` system interface.
pub(crate) struct Hook<'r, 'a, D: Dynamics, O, const N: usize>(
    pub(crate) &'r mut Recorder<'a, D, O, N>,
);

impl<D, O, const N: usize> System<f64, SVector<f64, N>> for Hook<'_, '_, D, O, N>
where
    D: Dynamics,
    O: for<'e> Observer<Event<'e>, Action>,
{
    fn system(&self, t: f64, y: &SVector<f64, N>, dy: &mut SVector<f64, N>) {
        if let Err(source) = self.0.derivative(t, y.as_slice(), dy.as_mut_slice()) {
            let mut error = self.0.rhs_error.borrow_mut();
            if error.is_none() {
                *error = Some(Error::log(t, source));
            }
            *dy = SVector::from_element(f64::NAN);
        }
    }

    fn solout(&mut self, t: f64, y: &SVector<f64, N>, _dy: &SVector<f64, N>) -> bool {
        // Stop once a save failed, an observer asked to stop, or an evaluation
        // failed on the hot path.
        self.0.on_step(t, (*y).into())
    }
}
