/// Watches the saves a simulation driver makes and may steer the run.
///
/// A driver hands each event `E` to the observer right after the matching
/// record is stored. Returning `Some(action)` asks the driver to act on it
/// (for a simulation, typically stopping early) and `None` keeps going.
///
/// Any `FnMut(&E) -> Option<A>` closure is an observer. Pass `()` to run
/// without one.
pub trait Observer<E, A> {
    fn observe(&mut self, event: &E) -> Option<A>;
}

impl<E, A, F> Observer<E, A> for F
where
    F: FnMut(&E) -> Option<A>,
{
    fn observe(&mut self, event: &E) -> Option<A> {
        self(event)
    }
}

impl<E, A> Observer<E, A> for () {
    fn observe(&mut self, _event: &E) -> Option<A> {
        None
    }
}
