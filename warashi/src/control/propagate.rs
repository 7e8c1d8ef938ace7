//! Pause/resume application and level propagation.
//!
//! Both the scheduler and the profiler's lower/restore commands flip pause
//! flags on grouped tickets and then have to tell the host which chunks
//! changed. The first change recorded for a chunk in a pass decides whether
//! its notification is relaxing.

use std::collections::HashSet;

use crate::coord::ChunkPos;
use crate::host::{LevelTracker, TicketHandle, TicketSource};
use crate::ticket::PauseableTicket;

/// Chunks modified during one pass, in first-modification order.
#[derive(Debug, Default)]
pub struct ModifiedChunks {
    order: Vec<(ChunkPos, bool)>,
    seen: HashSet<ChunkPos>,
}

impl ModifiedChunks {
    /// Empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a modification. Later marks for the same chunk are ignored.
    pub fn mark(&mut self, pos: ChunkPos, relaxing: bool) {
        if self.seen.insert(pos) {
            self.order.push((pos, relaxing));
        }
    }

    /// Number of distinct chunks modified.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn contains(&self, pos: ChunkPos) -> bool {
        self.seen.contains(&pos)
    }

    /// Modified chunks with their relaxing flag.
    pub fn iter(&self) -> impl Iterator<Item = (ChunkPos, bool)> + '_ {
        self.order.iter().copied()
    }
}

/// Set the pause state of one ticket.
///
/// If the ticket reports a state change it is acknowledged and its chunk is
/// recorded in `modified`. Returns whether the ticket changed.
pub fn apply_pause<S: TicketSource + ?Sized>(
    source: &mut S,
    handle: TicketHandle,
    paused: bool,
    modified: &mut ModifiedChunks,
) -> bool {
    let Some(ticket) = source.ticket_mut(handle) else {
        return false;
    };
    ticket.set_paused(paused);
    if !ticket.is_dirty() {
        return false;
    }
    ticket.clear_dirty();
    modified.mark(handle.pos, !paused);
    true
}

/// Re-sort every modified chunk and notify the level tracker.
///
/// Chunks that no longer hold a ticket set are skipped. Returns the number
/// of notifications sent.
pub fn propagate_levels<W: TicketSource + LevelTracker + ?Sized>(
    world: &mut W,
    modified: &ModifiedChunks,
) -> usize {
    let mut notified = 0;
    for (pos, relaxing) in modified.iter() {
        if let Some(level) = world.refresh_chunk(pos) {
            world.notify(pos, level, relaxing);
            notified += 1;
        }
    }
    if notified > 0 {
        tracing::trace!(chunks = notified, "Propagated chunk levels");
    }
    notified
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grouping::{GroupingFilter, TicketGrouper};
    use crate::host::MemoryWorld;
    use crate::ticket::{SimTicket, PAUSED_TICKET_LEVEL};

    fn world() -> MemoryWorld {
        let mut world = MemoryWorld::new("overworld");
        world.add_ticket(ChunkPos::new(0, 0), SimTicket::custom(31, "a"));
        world.add_ticket(ChunkPos::new(0, 0), SimTicket::custom(31, "b"));
        world.add_ticket(ChunkPos::new(1, 0), SimTicket::custom(31, "c"));
        world
    }

    #[test]
    fn test_first_mark_wins() {
        let mut modified = ModifiedChunks::new();
        let pos = ChunkPos::new(3, 4);
        modified.mark(pos, false);
        modified.mark(pos, true);
        assert_eq!(modified.len(), 1);
        assert_eq!(modified.iter().next(), Some((pos, false)));
    }

    #[test]
    fn test_pause_and_propagate() {
        let mut world = world();
        let grouping = TicketGrouper::default().build(&world, GroupingFilter::Scheduling);
        let mut modified = ModifiedChunks::new();
        for entry in grouping.entries() {
            assert!(apply_pause(&mut world, entry.handle, true, &mut modified));
        }
        assert_eq!(modified.len(), 2);

        let notified = propagate_levels(&mut world, &modified);
        assert_eq!(notified, 2);
        let notes = world.take_notifications();
        assert!(notes.iter().all(|n| n.level == PAUSED_TICKET_LEVEL && !n.relaxing));
    }

    #[test]
    fn test_unchanged_ticket_not_recorded() {
        let mut world = world();
        let grouping = TicketGrouper::default().build(&world, GroupingFilter::Scheduling);
        let mut modified = ModifiedChunks::new();
        for entry in grouping.entries() {
            assert!(!apply_pause(&mut world, entry.handle, false, &mut modified));
        }
        assert!(modified.is_empty());
        assert_eq!(propagate_levels(&mut world, &modified), 0);
        assert!(world.notifications().is_empty());
    }

    #[test]
    fn test_missing_ticket_set_skipped() {
        let mut world = world();
        let mut modified = ModifiedChunks::new();
        modified.mark(ChunkPos::new(50, 50), true);
        assert_eq!(propagate_levels(&mut world, &modified), 0);
    }
}
