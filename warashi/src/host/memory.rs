//! In-memory host world.
//!
//! Keeps tickets per chunk in a `BTreeMap`, so iteration order is stable
//! across runs, and records every level notification it receives.

use std::collections::BTreeMap;

use super::{ChunkWorld, LevelTracker, ResidencyQuery, TicketHandle, TicketSource, WorldId};
use crate::coord::ChunkPos;
use crate::ticket::{PauseableTicket, SimTicket, Ticket, UNTICKETED_LEVEL};

/// A level change reported through [`LevelTracker::notify`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelNotification {
    /// Chunk whose level changed.
    pub pos: ChunkPos,
    /// New effective level.
    pub level: u32,
    /// Whether the change resumed tickets.
    pub relaxing: bool,
}

#[derive(Debug, Clone, Copy, Default)]
struct ChunkContents {
    block_entities: u32,
    entities: u32,
}

/// In-memory implementation of [`ChunkWorld`].
#[derive(Debug)]
pub struct MemoryWorld {
    id: WorldId,
    tickets: BTreeMap<ChunkPos, Vec<SimTicket>>,
    resident: BTreeMap<ChunkPos, ChunkContents>,
    notifications: Vec<LevelNotification>,
}

impl MemoryWorld {
    /// Create an empty world.
    pub fn new(id: impl Into<WorldId>) -> Self {
        Self {
            id: id.into(),
            tickets: BTreeMap::new(),
            resident: BTreeMap::new(),
            notifications: Vec::new(),
        }
    }

    /// Attach a ticket to a chunk.
    ///
    /// The chunk's ticket set is kept sorted by effective level, so existing
    /// handles into this chunk are invalidated.
    pub fn add_ticket(&mut self, pos: ChunkPos, ticket: SimTicket) {
        let set = self.tickets.entry(pos).or_default();
        set.push(ticket);
        set.sort_by_key(|t| t.effective_level());
    }

    /// Remove every ticket at `pos`.
    pub fn remove_tickets(&mut self, pos: ChunkPos) -> Vec<SimTicket> {
        self.tickets.remove(&pos).unwrap_or_default()
    }

    /// Mark a chunk as loaded with the given contents.
    pub fn load_chunk(&mut self, pos: ChunkPos, block_entities: u32, entities: u32) {
        self.resident.insert(
            pos,
            ChunkContents {
                block_entities,
                entities,
            },
        );
    }

    /// Mark a chunk as no longer loaded.
    pub fn unload_chunk(&mut self, pos: ChunkPos) {
        self.resident.remove(&pos);
    }

    /// Tickets attached to `pos`, in level order.
    pub fn tickets_at(&self, pos: ChunkPos) -> &[SimTicket] {
        self.tickets.get(&pos).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Effective level of a chunk: its most important ticket's level.
    pub fn chunk_level(&self, pos: ChunkPos) -> u32 {
        self.tickets_at(pos)
            .iter()
            .map(Ticket::effective_level)
            .min()
            .unwrap_or(UNTICKETED_LEVEL)
    }

    /// Chunks that hold at least one ticket.
    pub fn ticketed_chunks(&self) -> impl Iterator<Item = ChunkPos> + '_ {
        self.tickets.keys().copied()
    }

    /// Total number of tickets.
    pub fn ticket_count(&self) -> usize {
        self.tickets.values().map(Vec::len).sum()
    }

    /// Number of paused tickets.
    pub fn paused_count(&self) -> usize {
        self.tickets
            .values()
            .flatten()
            .filter(|t| t.is_paused())
            .count()
    }

    /// Notifications received so far.
    pub fn notifications(&self) -> &[LevelNotification] {
        &self.notifications
    }

    /// Drain the recorded notifications.
    pub fn take_notifications(&mut self) -> Vec<LevelNotification> {
        std::mem::take(&mut self.notifications)
    }
}

impl TicketSource for MemoryWorld {
    type Ticket = SimTicket;

    fn for_each_ticket(&self, visit: &mut dyn FnMut(TicketHandle, &SimTicket)) {
        for (pos, set) in &self.tickets {
            for (slot, ticket) in set.iter().enumerate() {
                visit(TicketHandle { pos: *pos, slot }, ticket);
            }
        }
    }

    fn for_each_ticket_at(&self, pos: ChunkPos, visit: &mut dyn FnMut(TicketHandle, &SimTicket)) {
        for (slot, ticket) in self.tickets_at(pos).iter().enumerate() {
            visit(TicketHandle { pos, slot }, ticket);
        }
    }

    fn ticket(&self, handle: TicketHandle) -> Option<&SimTicket> {
        self.tickets.get(&handle.pos)?.get(handle.slot)
    }

    fn ticket_mut(&mut self, handle: TicketHandle) -> Option<&mut SimTicket> {
        self.tickets.get_mut(&handle.pos)?.get_mut(handle.slot)
    }

    fn refresh_chunk(&mut self, pos: ChunkPos) -> Option<u32> {
        let set = self.tickets.get_mut(&pos)?;
        set.sort_by_key(|t| t.effective_level());
        Some(
            set.first()
                .map(Ticket::effective_level)
                .unwrap_or(UNTICKETED_LEVEL),
        )
    }
}

impl LevelTracker for MemoryWorld {
    fn notify(&mut self, pos: ChunkPos, level: u32, relaxing: bool) {
        self.notifications.push(LevelNotification {
            pos,
            level,
            relaxing,
        });
    }
}

impl ResidencyQuery for MemoryWorld {
    fn block_entity_count(&self, pos: ChunkPos) -> Option<u32> {
        self.resident.get(&pos).map(|c| c.block_entities)
    }

    fn entity_count(&self, pos: ChunkPos) -> Option<u32> {
        self.resident.get(&pos).map(|c| c.entities)
    }
}

impl ChunkWorld for MemoryWorld {
    fn id(&self) -> &WorldId {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ticket::{TicketKind, PAUSED_TICKET_LEVEL};

    #[test]
    fn test_empty_world() {
        let world = MemoryWorld::new("overworld");
        assert_eq!(world.id().as_str(), "overworld");
        assert_eq!(world.ticket_count(), 0);
        assert_eq!(world.chunk_level(ChunkPos::new(0, 0)), UNTICKETED_LEVEL);
    }

    #[test]
    fn test_tickets_sorted_by_level() {
        let mut world = MemoryWorld::new("overworld");
        let pos = ChunkPos::new(1, 1);
        world.add_ticket(pos, SimTicket::custom(31, "a"));
        world.add_ticket(pos, SimTicket::new(22, TicketKind::Forced, "b"));

        let levels: Vec<u32> = world.tickets_at(pos).iter().map(|t| t.level()).collect();
        assert_eq!(levels, vec![22, 31]);
        assert_eq!(world.chunk_level(pos), 22);
    }

    #[test]
    fn test_refresh_chunk_resorts_after_pause() {
        let mut world = MemoryWorld::new("overworld");
        let pos = ChunkPos::new(0, 0);
        world.add_ticket(pos, SimTicket::custom(30, "a"));
        world.add_ticket(pos, SimTicket::custom(31, "b"));

        let handle = TicketHandle { pos, slot: 0 };
        world.ticket_mut(handle).unwrap().set_paused(true);

        assert_eq!(world.refresh_chunk(pos), Some(31));
        assert_eq!(world.tickets_at(pos)[0].owner(), "b");
        assert_eq!(world.tickets_at(pos)[1].effective_level(), PAUSED_TICKET_LEVEL);
    }

    #[test]
    fn test_refresh_unknown_chunk() {
        let mut world = MemoryWorld::new("overworld");
        assert_eq!(world.refresh_chunk(ChunkPos::new(5, 5)), None);
    }

    #[test]
    fn test_residency() {
        let mut world = MemoryWorld::new("overworld");
        let pos = ChunkPos::new(2, 3);
        assert_eq!(world.block_entity_count(pos), None);

        world.load_chunk(pos, 12, 4);
        assert_eq!(world.block_entity_count(pos), Some(12));
        assert_eq!(world.entity_count(pos), Some(4));

        world.unload_chunk(pos);
        assert_eq!(world.entity_count(pos), None);
    }

    #[test]
    fn test_notifications_recorded() {
        let mut world = MemoryWorld::new("overworld");
        world.notify(ChunkPos::new(1, 2), 33, false);
        assert_eq!(world.notifications().len(), 1);

        let drained = world.take_notifications();
        assert_eq!(drained[0].level, 33);
        assert!(!drained[0].relaxing);
        assert!(world.notifications().is_empty());
    }
}
