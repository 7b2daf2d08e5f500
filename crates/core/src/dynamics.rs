use std::marker::PhantomData;

use crate::{Inputs, LogError, LogRecord, LogScope};

/// The arguments of one derivative evaluation.
///
/// Bundles the state, parameters, time, and resolved external inputs so that
/// a parent can hand a child subsystem a projection of its own arguments with
/// [`Args::project`].
#[derive(Debug)]
pub struct Args<'a, P> {
    /// The state vector at which the derivative is evaluated.
    pub x: &'a [f64],

    /// The parameters of the dynamics.
    pub params: &'a P,

    /// The time at which the derivative is evaluated.
    pub t: f64,

    /// External inputs resolved for this evaluation.
    pub inputs: Inputs<'a>,
}

impl<P> Clone for Args<'_, P> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<P> Copy for Args<'_, P> {}

impl<'a, P> Args<'a, P> {
    /// Creates arguments with no external inputs.
    #[must_use]
    pub fn new(x: &'a [f64], params: &'a P, t: f64) -> Self {
        Self {
            x,
            params,
            t,
            inputs: Inputs::none(),
        }
    }

    /// Replaces the external inputs.
    #[must_use]
    pub fn with_inputs(self, inputs: Inputs<'a>) -> Self {
        Self { inputs, ..self }
    }

    /// Replaces the state, keeping parameters, time, and inputs.
    #[must_use]
    pub fn with_state(self, x: &'a [f64]) -> Self {
        Self { x, ..self }
    }

    /// Replaces the parameters, keeping state, time, and inputs.
    #[must_use]
    pub fn with_params<Q>(self, params: &'a Q) -> Args<'a, Q> {
        Args {
            x: self.x,
            params,
            t: self.t,
            inputs: self.inputs,
        }
    }

    /// Builds a child subsystem's arguments from a slice of this state and a
    /// part of these parameters. Time and inputs carry over.
    #[must_use]
    pub fn project<Q>(self, x: &'a [f64], params: &'a Q) -> Args<'a, Q> {
        self.with_state(x).with_params(params)
    }
}

/// A user-authored derivative computation with optional structured logging.
///
/// Implementors write a single [`Dynamics::derivative`] body that fills `dx`
/// and appends named values to `log`. The same body serves both call modes of
/// [`LoggableFunction`]: with a disabled scope every append is skipped, and
/// with an enabled scope the appends build a [`LogRecord`]. Because the
/// derivative computation is shared, both modes write identical values to
/// `dx` for identical arguments.
///
/// Logging must never feed back into the derivative. Code that branches on
/// [`LogScope::is_enabled`] should only decide what to log.
///
/// # Example
///
/// ```
/// use skein_core::{Args, Dynamics, LogError, LogScope, LoggableFunction};
///
/// struct Decay;
///
/// impl Dynamics for Decay {
///     type Params = f64;
///
///     fn derivative(
///         &self,
///         dx: &mut [f64],
///         args: Args<'_, f64>,
///         log: &mut LogScope,
///     ) -> Result<(), LogError> {
///         dx[0] = -args.params * args.x[0];
///         log.append("x", args.x[0])
///     }
/// }
///
/// let mut dx = [0.0];
/// let record = Decay.evaluate_with_log(&mut dx, Args::new(&[2.0], &0.5, 0.0))?;
///
/// assert_eq!(dx, [-1.0]);
/// assert_eq!(record.get("x").and_then(|v| v.as_scalar()), Some(2.0));
/// # Ok::<(), LogError>(())
/// ```
pub trait Dynamics {
    type Params;

    /// Writes the derivative of `args.x` into `dx`, appending fields to `log`.
    ///
    /// # Errors
    ///
    /// Returns a [`LogError`] if a field is appended twice at the same level or
    /// a flattened child collides with an existing field. Disabled scopes never
    /// produce these errors.
    fn derivative(
        &self,
        dx: &mut [f64],
        args: Args<'_, Self::Params>,
        log: &mut LogScope,
    ) -> Result<(), LogError>;
}

impl<D: Dynamics + ?Sized> Dynamics for &D {
    type Params = D::Params;

    fn derivative(
        &self,
        dx: &mut [f64],
        args: Args<'_, Self::Params>,
        log: &mut LogScope,
    ) -> Result<(), LogError> {
        (**self).derivative(dx, args, log)
    }
}

impl<D: Dynamics + ?Sized> Dynamics for Box<D> {
    type Params = D::Params;

    fn derivative(
        &self,
        dx: &mut [f64],
        args: Args<'_, Self::Params>,
        log: &mut LogScope,
    ) -> Result<(), LogError> {
        (**self).derivative(dx, args, log)
    }
}

/// The two call modes of a [`Dynamics`].
///
/// This trait is implemented for every [`Dynamics`] and cannot be implemented
/// separately, so both modes always run the same derivative body.
pub trait LoggableFunction: Dynamics {
    /// Evaluates the derivative without logging.
    ///
    /// This is the integrator's hot path. Appends are no-ops and nothing is
    /// allocated for logging.
    ///
    /// # Errors
    ///
    /// Only returns an error if the derivative body produces one itself, since
    /// a disabled scope never rejects an append.
    fn evaluate(&self, dx: &mut [f64], args: Args<'_, Self::Params>) -> Result<(), LogError> {
        self.derivative(dx, args, &mut LogScope::disabled())
    }

    /// Evaluates the derivative and returns every appended field as a record.
    ///
    /// A body without appends yields an empty record.
    ///
    /// # Errors
    ///
    /// Returns a [`LogError`] if the body appends a duplicate field or a
    /// flattened child collides with an existing field.
    fn evaluate_with_log(
        &self,
        dx: &mut [f64],
        args: Args<'_, Self::Params>,
    ) -> Result<LogRecord, LogError> {
        let mut scope = LogScope::enabled();
        self.derivative(dx, args, &mut scope)?;
        Ok(scope.into_record())
    }
}

impl<D: Dynamics + ?Sized> LoggableFunction for D {}

/// A [`Dynamics`] built from a closure. See [`from_fn`].
pub struct FnDynamics<F, P> {
    f: F,
    _params: PhantomData<fn(&P)>,
}

/// Creates a [`Dynamics`] from a closure taking `(dx, args, log)`.
///
/// ```
/// use skein_core::{Args, LogError, LogScope, LoggableFunction, from_fn};
///
/// let decay = from_fn(|dx: &mut [f64], args: Args<'_, ()>, log: &mut LogScope| {
///     dx[0] = -args.x[0];
///     log.append("x", args.x[0])
/// });
///
/// let mut dx = [0.0];
/// let record = decay.evaluate_with_log(&mut dx, Args::new(&[1.0], &(), 0.0))?;
/// assert_eq!(record.len(), 1);
/// # Ok::<(), LogError>(())
/// ```
pub fn from_fn<P, F>(f: F) -> FnDynamics<F, P>
where
    F: Fn(&mut [f64], Args<'_, P>, &mut LogScope) -> Result<(), LogError>,
{
    FnDynamics {
        f,
        _params: PhantomData,
    }
}

impl<P, F> Dynamics for FnDynamics<F, P>
where
    F: Fn(&mut [f64], Args<'_, P>, &mut LogScope) -> Result<(), LogError>,
{
    type Params = P;

    fn derivative(
        &self,
        dx: &mut [f64],
        args: Args<'_, P>,
        log: &mut LogScope,
    ) -> Result<(), LogError> {
        (self.f)(dx, args, log)
    }
}

/// A [`Dynamics`] around a plain derivative closure. See [`unlogged`].
pub struct Unlogged<F, P> {
    f: F,
    _params: PhantomData<fn(&P)>,
}

/// Wraps a derivative closure that knows nothing about logging.
///
/// The result is a [`Dynamics`] whose logging mode always yields an empty
/// record, which lets unlogged dynamics run through the same driver and
/// combinators as loggable ones.
pub fn unlogged<P, F>(f: F) -> Unlogged<F, P>
where
    F: Fn(&mut [f64], Args<'_, P>),
{
    Unlogged {
        f,
        _params: PhantomData,
    }
}

impl<P, F> Dynamics for Unlogged<F, P>
where
    F: Fn(&mut [f64], Args<'_, P>),
{
    type Params = P;

    fn derivative(
        &self,
        dx: &mut [f64],
        args: Args<'_, P>,
        _log: &mut LogScope,
    ) -> Result<(), LogError> {
        (self.f)(dx, args);
        Ok(())
    }
}
