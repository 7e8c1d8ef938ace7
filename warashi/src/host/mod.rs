//! Host-facing interfaces.
//!
//! The scheduler and profiler do not own chunks or tickets. Everything they
//! need from the simulation engine goes through the traits in this module:
//!
//! ```text
//! ┌──────────────────┐   for_each_ticket / ticket_mut    ┌──────────────┐
//! │                  │ ─────────────────────────────────►│              │
//! │ TicketScheduler  │   refresh_chunk / notify          │  ChunkWorld  │
//! │ ChunkProfiler    │ ─────────────────────────────────►│  (host)      │
//! │                  │   block_entity_count / entity_count│              │
//! └──────────────────┘ ─────────────────────────────────►└──────────────┘
//! ```
//!
//! [`MemoryWorld`] implements all of them in memory and backs the tests and
//! the CLI simulation.

mod memory;

pub use memory::{LevelNotification, MemoryWorld};

use std::fmt;
use std::sync::Arc;

use crate::coord::ChunkPos;
use crate::ticket::Ticket;

/// Identity of a world (dimension) on the host.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WorldId(Arc<str>);

impl WorldId {
    /// Create a world id.
    pub fn new(name: impl AsRef<str>) -> Self {
        Self(Arc::from(name.as_ref()))
    }

    /// The id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for WorldId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for WorldId {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

/// Location of one ticket inside the host's ticket storage.
///
/// `slot` indexes the ticket set of `pos`. Handles stay valid only until the
/// host re-sorts that set, which the scheduler triggers at the end of every
/// pass, so a handle must never outlive the pass that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TicketHandle {
    /// Chunk the ticket is attached to.
    pub pos: ChunkPos,
    /// Index within the chunk's ticket set.
    pub slot: usize,
}

/// Enumeration and mutation of the host's tickets.
pub trait TicketSource {
    /// Host ticket type.
    type Ticket: Ticket;

    /// Visit every ticket in a stable, deterministic order.
    fn for_each_ticket(&self, visit: &mut dyn FnMut(TicketHandle, &Self::Ticket));

    /// Visit the tickets attached to one chunk.
    fn for_each_ticket_at(
        &self,
        pos: ChunkPos,
        visit: &mut dyn FnMut(TicketHandle, &Self::Ticket),
    ) {
        self.for_each_ticket(&mut |handle, ticket| {
            if handle.pos == pos {
                visit(handle, ticket);
            }
        });
    }

    /// Shared access to one ticket.
    fn ticket(&self, handle: TicketHandle) -> Option<&Self::Ticket>;

    /// Mutable access to one ticket.
    fn ticket_mut(&mut self, handle: TicketHandle) -> Option<&mut Self::Ticket>;

    /// Re-sort the ticket set at `pos` after pause states changed and return
    /// the chunk's new effective level.
    ///
    /// Returns `None` when the position holds no ticket set.
    fn refresh_chunk(&mut self, pos: ChunkPos) -> Option<u32>;
}

/// The host's chunk level tracker.
pub trait LevelTracker {
    /// Propagate a new effective level for `pos`.
    ///
    /// `relaxing` is true when tickets were resumed (the chunk becomes more
    /// active) and false when they were paused.
    fn notify(&mut self, pos: ChunkPos, level: u32, relaxing: bool);
}

/// Queries against chunk data that may or may not be resident.
pub trait ResidencyQuery {
    /// Number of block entities in the chunk, or `None` if not loaded.
    fn block_entity_count(&self, pos: ChunkPos) -> Option<u32>;

    /// Number of entities in the chunk, or `None` if not loaded.
    fn entity_count(&self, pos: ChunkPos) -> Option<u32>;
}

/// Everything the scheduler and profiler need from one host world.
pub trait ChunkWorld: TicketSource + LevelTracker + ResidencyQuery {
    /// Identity of this world.
    fn id(&self) -> &WorldId;
}
