//! Batch download policy.

/// How `download_required` reacts to per-plugin failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DownloadStrategy {
    /// Collect failures, log them, and report success with the failure
    /// list attached.
    #[default]
    ContinueOnError,
    /// Abort the batch on the first failure.
    FailOnError,
    /// Abort only when a critical plugin fails; other failures are
    /// log-only.
    RequireCritical,
}
