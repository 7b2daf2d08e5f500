use crate::Dynamics;

/// Packages a subsystem with the data needed to simulate it on its own.
///
/// An environment is a set of factories: the initial state, the dynamics, and
/// optionally the parameters. Drivers call each factory once per run, so an
/// environment can be reused for many independent simulations.
///
/// `N` is the length of the state vector.
///
/// ```
/// use skein_core::{Args, Dynamics, Environment, LogError, LogScope};
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
/// struct DecayEnv;
///
/// impl Environment<1> for DecayEnv {
///     type Params = f64;
///     type Dynamics = Decay;
///
///     fn initial_state(&self) -> [f64; 1] {
///         [1.0]
///     }
///
///     fn dynamics(&self) -> Decay {
///         Decay
///     }
///
///     fn params(&self) -> Option<f64> {
///         Some(0.5)
///     }
/// }
///
/// assert_eq!(DecayEnv.initial_state(), [1.0]);
/// assert_eq!(DecayEnv.params(), Some(0.5));
/// ```
pub trait Environment<const N: usize> {
    type Params;
    type Dynamics: Dynamics<Params = Self::Params>;

    /// Returns the state the simulation starts from.
    fn initial_state(&self) -> [f64; N];

    /// Returns the dynamics to integrate.
    fn dynamics(&self) -> Self::Dynamics;

    /// Returns the default parameters, if the environment provides any.
    ///
    /// Drivers fall back to caller-supplied parameters when this is `None`.
    fn params(&self) -> Option<Self::Params> {
        None
    }
}
