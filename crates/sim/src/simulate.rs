use ode_solvers::{
    Dop853, Dopri5, SVector,
    dop_shared::{IntegrationError, OutputType},
};
use skein_core::{Dynamics, Environment, Observer};
use tracing::debug;

use crate::{
    Action, Error, Event, Method, Options, SimulationResult,
    recorder::{Hook, Recorder},
};

/// Integrates `dynamics` from `initial_state` and records a table of logs.
///
/// This is a convenience wrapper around [`simulate_observed`] that ignores
/// events.
///
/// # Errors
///
/// See [`simulate_observed`].
pub fn simulate<D, const N: usize>(
    initial_state: [f64; N],
    dynamics: &D,
    params: &D::Params,
    options: &Options,
) -> Result<SimulationResult<N>, Error>
where
    D: Dynamics,
{
    simulate_observed(initial_state, dynamics, params, options, ())
}

/// Integrates `dynamics` and reports every save to an observer.
///
/// # Algorithm
///
/// 1. Validate the options and resolve the save times.
/// 2. Hand the plain-mode evaluation to the integrator. It is called at every
///    stage of every step, including rejected ones, and never logs.
/// 3. After each accepted step, realize the save times it covers. A save time
///    that falls inside the step uses the state interpolated from the step's
///    end points and derivatives.
/// 4. At each save, run a logging-mode evaluation, discard its derivative,
///    push `(time, record)` to the trace, and emit an [`Event`].
/// 5. Finalize the trace into a table.
///
/// With [`SaveTimes::Steps`](crate::SaveTimes::Steps), saves happen at the
/// start time and after every accepted step instead.
///
/// # Observer
///
/// The observer receives an [`Event`] after each save and may return
/// [`Action::StopEarly`] to end the run with the rows recorded so far.
///
/// # Errors
///
/// - [`Error::Config`] if the options are invalid. Nothing is integrated.
/// - [`Error::Log`] if an evaluation raises a [`LogError`](skein_core::LogError),
///   such as a field appended twice.
/// - [`Error::Table`] if a field changes shape between saves.
///
/// An integrator failure is not an error: the result carries
/// [`Status::IntegratorFailed`](crate::Status::IntegratorFailed) and the rows
/// recorded before the failure.
pub fn simulate_observed<D, O, const N: usize>(
    initial_state: [f64; N],
    dynamics: &D,
    params: &D::Params,
    options: &Options,
    observer: O,
) -> Result<SimulationResult<N>, Error>
where
    D: Dynamics,
    O: for<'e> Observer<Event<'e>, Action>,
{
    let schedule = options.schedule()?;
    debug!(
        start = options.start_time(),
        end = options.end_time(),
        method = options.method().name(),
        saves = ?schedule.planned(),
        "starting simulation"
    );

    let mut recorder = Recorder::new(
        dynamics,
        params,
        schedule,
        options.start_time(),
        initial_state,
        observer,
    )?;

    let outcome = if recorder.is_halted() {
        Ok(())
    } else {
        integrate(&mut recorder, options, initial_state)
    };
    let result = recorder.finish(outcome)?;

    debug!(
        status = ?result.status,
        rows = result.table.len(),
        evaluations = result.stats.evaluations,
        accepted_steps = result.stats.accepted_steps,
        "simulation finished"
    );
    Ok(result)
}

/// Simulates an [`Environment`] using its own initial state and dynamics.
///
/// Explicit `params` take precedence over the environment's defaults.
///
/// # Errors
///
/// Returns [`Error::MissingParams`] if `params` is `None` and the environment
/// provides no defaults, or any error from [`simulate`].
pub fn simulate_env<E, const N: usize>(
    env: &E,
    params: Option<E::Params>,
    options: &Options,
) -> Result<SimulationResult<N>, Error>
where
    E: Environment<N>,
{
    let params = params.or_else(|| env.params()).ok_or(Error::MissingParams)?;
    let dynamics = env.dynamics();
    simulate(env.initial_state(), &dynamics, &params, options)
}

/// Step limit passed to the integrator.
const MAX_STEPS: u32 = 100_000;

/// Number of steps between stiffness checks.
const STIFFNESS_CHECK: u32 = 1000;

/// Runs the selected `ode_solvers` method over the full span.
///
/// The controller settings are the `ode_solvers` defaults for each method.
fn integrate<D, O, const N: usize>(
    recorder: &mut Recorder<'_, D, O, N>,
    options: &Options,
    initial_state: [f64; N],
) -> Result<(), IntegrationError>
where
    D: Dynamics,
    O: for<'e> Observer<Event<'e>, Action>,
{
    let system = Hook(recorder);
    let (start, end) = (options.start_time(), options.end_time());
    let y0 = SVector::from(initial_state);
    let span = end - start;

    // Sparse output hands `solout` the state at the end of each accepted
    // step. Dense output would hand it the last dense point instead.
    match options.method() {
        Method::Dopri5 { abs_tol, rel_tol } => {
            let mut stepper = Dopri5::from_param(
                system,
                start,
                end,
                span,
                y0,
                rel_tol,
                abs_tol,
                0.9,
                0.04,
                0.2,
                10.0,
                span,
                0.0,
                MAX_STEPS,
                STIFFNESS_CHECK,
                OutputType::Sparse,
            );
            stepper.integrate().map(|_stats| ())
        }
        Method::Dop853 { abs_tol, rel_tol } => {
            let mut stepper = Dop853::from_param(
                system,
                start,
                end,
                span,
                y0,
                rel_tol,
                abs_tol,
                0.9,
                0.0,
                0.333,
                6.0,
                span,
                0.0,
                MAX_STEPS,
                STIFFNESS_CHECK,
                OutputType::Sparse,
            );
            stepper.integrate().map(|_stats| ())
        }
    }
}
