/// An accepted integrator step: the time, the state, and its derivative.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Knot<const N: usize> {
    pub time: f64,
    pub state: [f64; N],
    pub derivative: [f64; N],
}

/// The state trajectory produced by the integrator.
///
/// Holds the initial state followed by one knot per accepted step, in
/// ascending time order. Values between knots come from cubic Hermite
/// interpolation on the neighboring states and derivatives.
#[derive(Debug, Clone, PartialEq)]
pub struct Trajectory<const N: usize> {
    knots: Vec<Knot<N>>,
}

impl<const N: usize> Trajectory<N> {
    pub(crate) fn new(initial: Knot<N>) -> Self {
        Self {
            knots: vec![initial],
        }
    }

    pub(crate) fn push(&mut self, knot: Knot<N>) {
        self.knots.push(knot);
    }

    /// Returns all knots, starting with the initial state.
    #[must_use]
    pub fn knots(&self) -> &[Knot<N>] {
        &self.knots
    }

    /// Returns the most recent knot.
    #[must_use]
    pub fn last(&self) -> &Knot<N> {
        // A trajectory is never empty: it is created with its initial knot.
        &self.knots[self.knots.len() - 1]
    }

    /// Returns the time the trajectory starts at.
    #[must_use]
    pub fn start_time(&self) -> f64 {
        self.knots[0].time
    }

    /// Returns the time of the last accepted step.
    #[must_use]
    pub fn end_time(&self) -> f64 {
        self.last().time
    }

    /// Returns the state at the last accepted step.
    #[must_use]
    pub fn final_state(&self) -> [f64; N] {
        self.last().state
    }

    /// Returns the state at `time`, or `None` outside the integrated span.
    ///
    /// A time that falls exactly on a knot returns that knot's state.
    #[must_use]
    pub fn interpolate(&self, time: f64) -> Option<[f64; N]> {
        let index = self.knots.partition_point(|knot| knot.time < time);
        let upper = self.knots.get(index)?;
        if upper.time == time {
            return Some(upper.state);
        }
        let lower = self.knots.get(index.checked_sub(1)?)?;
        Some(hermite(lower, upper, time))
    }
}

/// Cubic Hermite interpolation between two knots.
pub(crate) fn hermite<const N: usize>(lower: &Knot<N>, upper: &Knot<N>, time: f64) -> [f64; N] {
    let h = upper.time - lower.time;
    let s = (time - lower.time) / h;
    let s2 = s * s;
    let s3 = s2 * s;

    let h00 = 2.0 * s3 - 3.0 * s2 + 1.0;
    let h10 = s3 - 2.0 * s2 + s;
    let h01 = -2.0 * s3 + 3.0 * s2;
    let h11 = s3 - s2;

    std::array::from_fn(|i| {
        h00 * lower.state[i]
            + h10 * h * lower.derivative[i]
            + h01 * upper.state[i]
            + h11 * h * upper.derivative[i]
    })
}
