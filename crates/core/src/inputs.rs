use std::fmt;

use crate::{Args, Dynamics, LogError, LogScope};

/// Named external input values visible to one derivative evaluation.
///
/// Lookups search from the most recently added value, so an input resolved
/// by an inner [`WithInputs`] shadows an outer input of the same name.
#[derive(Debug, Clone, Copy, Default)]
pub struct Inputs<'a> {
    values: &'a [(&'a str, f64)],
}

impl<'a> Inputs<'a> {
    /// No external inputs.
    #[must_use]
    pub const fn none() -> Self {
        Self { values: &[] }
    }

    /// Wraps a list of `(name, value)` pairs.
    #[must_use]
    pub const fn new(values: &'a [(&'a str, f64)]) -> Self {
        Self { values }
    }

    /// Returns the value of a named input.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<f64> {
        self.values
            .iter()
            .rev()
            .find(|(input, _)| *input == name)
            .map(|(_, value)| *value)
    }

    /// Returns the underlying `(name, value)` pairs.
    #[must_use]
    pub fn as_slice(&self) -> &'a [(&'a str, f64)] {
        self.values
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Resolves one named input from the state, parameters, and time.
pub type InputFn<P> = Box<dyn Fn(&[f64], &P, f64) -> f64 + Send + Sync>;

/// A [`Dynamics`] that resolves named inputs before delegating to a base.
///
/// Created by [`apply_inputs`]. Every evaluation, in either mode, computes
/// each input from the current `(x, params, t)` and passes the values to the
/// base dynamics through [`Args::inputs`]. The combinator itself logs nothing.
pub struct WithInputs<D: Dynamics> {
    base: D,
    inputs: Vec<(String, InputFn<D::Params>)>,
}

/// Wraps `base` so that the given named inputs are resolved before each call.
///
/// Unlogged derivative closures can be passed through [`unlogged`] first,
/// which gives them an always-empty record.
///
/// ```
/// use skein_core::{Args, LoggableFunction, apply_inputs, unlogged};
///
/// let forced = unlogged(|dx: &mut [f64], args: Args<'_, ()>| {
///     dx[0] = args.inputs.get("force").unwrap_or(0.0) - args.x[0];
/// });
/// let driven = apply_inputs(forced, Vec::new()).input("force", |_x, _p, t| 2.0 * t);
///
/// let mut dx = [0.0];
/// let record = driven.evaluate_with_log(&mut dx, Args::new(&[1.0], &(), 3.0))?;
///
/// assert_eq!(dx, [5.0]);
/// assert!(record.is_empty());
/// # Ok::<(), skein_core::LogError>(())
/// ```
///
/// [`unlogged`]: crate::unlogged
pub fn apply_inputs<D: Dynamics>(
    base: D,
    inputs: impl IntoIterator<Item = (String, InputFn<D::Params>)>,
) -> WithInputs<D> {
    WithInputs {
        base,
        inputs: inputs.into_iter().collect(),
    }
}

impl<D: Dynamics> WithInputs<D> {
    /// Adds a named input.
    #[must_use]
    pub fn input<F>(mut self, name: impl Into<String>, resolve: F) -> Self
    where
        F: Fn(&[f64], &D::Params, f64) -> f64 + Send + Sync + 'static,
    {
        self.inputs.push((name.into(), Box::new(resolve)));
        self
    }

    /// Returns the wrapped dynamics.
    pub fn base(&self) -> &D {
        &self.base
    }

    /// Returns the names of the inputs this wrapper resolves, in order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.inputs.iter().map(|(name, _)| name.as_str())
    }
}

impl<D: Dynamics> Dynamics for WithInputs<D> {
    type Params = D::Params;

    fn derivative(
        &self,
        dx: &mut [f64],
        args: Args<'_, Self::Params>,
        log: &mut LogScope,
    ) -> Result<(), LogError> {
        let mut resolved = Vec::with_capacity(args.inputs.len() + self.inputs.len());
        resolved.extend_from_slice(args.inputs.as_slice());
        for (name, resolve) in &self.inputs {
            resolved.push((name.as_str(), resolve(args.x, args.params, args.t)));
        }

        self.base
            .derivative(dx, args.with_inputs(Inputs::new(&resolved)), log)
    }
}

impl<D: Dynamics + fmt::Debug> fmt::Debug for WithInputs<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WithInputs")
            .field("base", &self.base)
            .field("inputs", &self.names().collect::<Vec<_>>())
            .finish()
    }
}
