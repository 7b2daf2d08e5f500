use skein_core::LogRecord;

/// Event emitted by the driver after each save.
///
/// Index 0 is the first save of the run, usually at the start time.
#[derive(Debug, Clone, Copy)]
pub struct Event<'a> {
    /// Row index of this save in the resulting table.
    pub index: usize,

    /// The save time.
    pub time: f64,

    /// The state at the save time.
    pub state: &'a [f64],

    /// The record captured at the save time.
    pub record: &'a LogRecord,
}
