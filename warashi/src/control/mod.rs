//! Load-adaptive control of chunk tickets.
//!
//! - [`TickRateEstimator`] turns tick durations into a rate.
//! - [`GroupCostEstimator`] ranks groups by block entity count.
//! - [`TicketScheduler`] combines both with the grouping to suspend the
//!   costliest groups under load and rotate the rest.
//! - [`apply_pause`] / [`propagate_levels`] are shared with the profiler.

mod cost;
mod propagate;
mod scheduler;
mod tps;

pub use cost::{GroupCost, GroupCostEstimator};
pub use propagate::{apply_pause, propagate_levels, ModifiedChunks};
pub use scheduler::{
    update_suspended_count, LoadConfig, RotationSummary, RunSummary, SchedulerConfig,
    SkipReason, TicketScheduler, DEFAULT_RUN_EVERY, TPS_DISABLE_THRESHOLD, TPS_RECOVER_THRESHOLD,
};
pub use tps::{TickRateEstimator, DEFAULT_TPS_WINDOW, NOMINAL_TPS};
