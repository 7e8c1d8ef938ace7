//! Profiler errors.

use thiserror::Error;

/// Errors returned by profiler commands.
///
/// Empty groupings are not errors; they come back as
/// [`GroupOutcome::NoGroups`](super::GroupOutcome::NoGroups).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PerfError {
    /// The requested group does not exist in the current grouping.
    #[error("Group index out of range. Max = {max}")]
    GroupIndexOutOfRange {
        /// Requested index.
        index: usize,
        /// Largest valid index.
        max: usize,
    },

    /// An auto-analysis duration outside `1..=max_secs` seconds.
    #[error("Analysis duration must be between 1 and {max_secs} seconds, got {secs}")]
    DurationOutOfRange {
        /// Requested duration in whole seconds.
        secs: u64,
        /// Longest accepted duration.
        max_secs: u64,
    },
}

/// Result type for profiler commands.
pub type PerfResult<T> = Result<T, PerfError>;
