//! Spatial grouping of chunk tickets.
//!
//! Tickets are placed on a Z-order curve by their chunk position and the
//! sorted sequence is cut into groups:
//!
//! ```text
//! morton-sorted tickets:  a a b c d | e f f g h i | j k ...
//!                         └ target ┘└ padding ┘
//! ```
//!
//! A group is filled up to `target_size`. Past that, the next ticket is only
//! appended while the group is below `2 × target_size` and the ticket's key
//! lies within `proximity_threshold` of the previous key. Tickets sharing a
//! chunk are never split across groups, so the chunk sets of the groups are
//! disjoint.
//!
//! The result is a pure function of the host's ticket order and the
//! configuration: no hashing or randomness is involved in the cut.

mod filter;
mod result;

pub use filter::GroupingFilter;
pub use result::{GroupEntry, GroupingResult, TicketGroup};

use std::ops::Range;

use crate::coord::morton_key;
use crate::host::TicketSource;

/// Default number of tickets a group is filled to before padding starts.
pub const DEFAULT_GROUP_SIZE: usize = 64;

/// Default Z-order distance under which a ticket still pads a full group.
pub const DEFAULT_PROXIMITY_THRESHOLD: u64 = 64;

/// Group sizing parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GroupingConfig {
    /// Tickets per group before proximity padding.
    pub target_size: usize,
    /// Maximum Z-order key distance for padding a full group.
    pub proximity_threshold: u64,
}

impl Default for GroupingConfig {
    fn default() -> Self {
        Self {
            target_size: DEFAULT_GROUP_SIZE,
            proximity_threshold: DEFAULT_PROXIMITY_THRESHOLD,
        }
    }
}

/// Builds [`GroupingResult`]s from a host's tickets.
#[derive(Debug, Clone, Copy, Default)]
pub struct TicketGrouper {
    config: GroupingConfig,
}

impl TicketGrouper {
    /// Create a grouper with the given sizing.
    pub fn new(config: GroupingConfig) -> Self {
        Self { config }
    }

    /// The sizing in use.
    pub fn config(&self) -> GroupingConfig {
        self.config
    }

    /// Snapshot and group the tickets of `source` that pass `filter`.
    pub fn build<S: TicketSource>(&self, source: &S, filter: GroupingFilter) -> GroupingResult {
        let mut entries = Vec::new();
        source.for_each_ticket(&mut |handle, ticket| {
            if filter.accepts(ticket) {
                entries.push(GroupEntry {
                    handle,
                    morton: morton_key(handle.pos),
                    pos: handle.pos,
                });
            }
        });

        // Stable: equal keys keep the host's iteration order.
        entries.sort_by_key(|e| e.morton);

        let spans = divide(
            &entries,
            self.config.target_size,
            self.config.proximity_threshold,
        );
        GroupingResult::new(entries, spans)
    }
}

/// Cut Morton-sorted entries into group spans.
fn divide(entries: &[GroupEntry], target_size: usize, proximity: u64) -> Vec<Range<usize>> {
    let target = target_size.max(1);
    let max = target.saturating_mul(2);

    let mut spans = Vec::new();
    let mut start = 0;
    for i in 0..entries.len() {
        let len = i - start;
        if len < target {
            continue;
        }
        let previous = entries[i - 1].morton;
        let key = entries[i].morton;
        if key == previous {
            continue;
        }
        if key - previous <= proximity && len < max {
            continue;
        }
        spans.push(start..i);
        start = i;
    }
    if start < entries.len() {
        spans.push(start..entries.len());
    }
    spans
}
