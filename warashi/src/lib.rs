//! Warashi - load-adaptive chunk ticket scheduling.
//!
//! Keeps a simulated-world server responsive by rationing the chunks held
//! loaded by non-system tickets. Tickets are grouped along a Z-order curve;
//! under load the costliest groups are suspended and the remaining groups
//! take turns being active. A profiler measures what a single group costs.
//!
//! ```text
//!  host tick ──► TicketScheduler::process(world, age)
//!                  │ TicketGrouper ──► GroupCostEstimator ──► hysteresis
//!                  └► pause / resume tickets ──► LevelTracker::notify
//!
//!  operator ──► ChunkProfiler::{start, stop, lower, restore, list_groups}
//!  tick hooks ──► ChunkProfiler::{should_track, record}
//! ```
//!
//! The host engine is reached only through the traits in [`host`].

pub mod config;
pub mod control;
pub mod coord;
pub mod grouping;
pub mod host;
pub mod perf;
pub mod ticket;
