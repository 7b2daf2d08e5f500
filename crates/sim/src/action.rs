/// Control actions supported by the simulation driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Stop the integration and return the table recorded so far.
    StopEarly,
}
