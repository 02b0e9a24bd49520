/// Receives progress from a running read or write.
///
/// Calls are synchronous and there's no way to push back; a caller that wants
/// to cancel simply stops issuing further codec calls.
pub trait ProgressSink {
    /// Something of size `amount` was just consumed.
    fn add_progress(&mut self, amount: u64);

    /// Absolute position, with the expected total when it is known.
    fn update_progress(&mut self, done: u64, total: Option<u64>);
}

/// Sink that drops every report.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn add_progress(&mut self, _amount: u64) {}
    fn update_progress(&mut self, _done: u64, _total: Option<u64>) {}
}
