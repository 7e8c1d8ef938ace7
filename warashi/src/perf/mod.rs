//! Chunk group profiling.
//!
//! An operator picks a ticket group by index and the profiler times every
//! chunk, entity and block entity tick inside it until the session is
//! stopped, either by hand or by a deadline. The same commands can lower
//! (pause) or restore a group to compare the server with and without it.
//!
//! ```text
//!  start(G) ──► PerfSession{chunks} ◄── should_track / record (hot path)
//!                     │
//!  stop / sweep ──────┴──► PerfReport ──► operator / ReportSink
//! ```

mod error;
mod owners;
mod profiler;
mod report;
mod session;

pub use error::{PerfError, PerfResult};
pub use owners::{owner_stats, OwnerLevel, OwnerStats};
pub use profiler::{
    ChunkProfiler, GroupAction, GroupChange, GroupOutcome, GroupSummary, ProfilerConfig,
    ReportSink, SessionStarted, DEFAULT_TOP_TYPES, MAX_ANALYSIS_DURATION,
};
pub use report::{CategorySummary, PerfReport, TypeSummary};
pub use session::{PerfCategory, PerfSession};
