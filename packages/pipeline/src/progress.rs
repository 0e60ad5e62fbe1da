//! Progress reporting over the building batch.
//!
//! [`ProgressCallback`] keeps the pipeline independent of how progress is
//! shown: the CLI renders an `indicatif` bar, tests pass [`NullProgress`].

/// Receives progress updates from a pipeline run.
pub trait ProgressCallback: Send + Sync {
    /// Sets the number of buildings to process.
    fn set_total(&self, total: u64);

    /// Advances by `delta` buildings.
    fn inc(&self, delta: u64);

    /// Updates the message shown next to the indicator.
    fn set_message(&self, msg: String);

    /// Marks the run complete with a final message.
    fn finish(&self, msg: String);
}

/// Ignores every update.
pub struct NullProgress;

impl ProgressCallback for NullProgress {
    fn set_total(&self, _total: u64) {}
    fn inc(&self, _delta: u64) {}
    fn set_message(&self, _msg: String) {}
    fn finish(&self, _msg: String) {}
}
