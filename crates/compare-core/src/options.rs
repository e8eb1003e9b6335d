//! Tunables shared by every comparison entry point.

use std::time::Duration;

/// Options controlling one comparison run.
#[derive(Debug, Clone)]
pub struct CompareOptions {
    /// Width of the bounded worker pool running per-namespace and
    /// per-database checks.
    pub concurrency: usize,

    /// Connect and server-selection timeout applied when probing endpoints.
    /// An endpoint that does not answer within this window is fatal.
    pub probe_timeout: Duration,

    /// Whole-run budget. On expiry the run is cancelled as a unit and
    /// partial results are discarded.
    pub deadline: Option<Duration>,

    /// Replace fingerprint comparison with the exhaustive per-document
    /// differ, which reports the specific document keys that were lost or
    /// changed.
    pub full_compare: bool,
}

impl Default for CompareOptions {
    fn default() -> Self {
        Self {
            concurrency: 8,
            probe_timeout: Duration::from_secs(10),
            deadline: None,
            full_compare: false,
        }
    }
}

impl CompareOptions {
    pub fn with_full_compare(mut self, full_compare: bool) -> Self {
        self.full_compare = full_compare;
        self
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn with_deadline(mut self, deadline: Option<Duration>) -> Self {
        self.deadline = deadline;
        self
    }
}
