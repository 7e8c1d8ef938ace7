//! Ticket owner statistics.
//!
//! Each ticketed chunk is attributed to one owner: the first ticket in the
//! chunk's level order that is still at or below [`PAUSED_TICKET_LEVEL`].
//! Chunks whose deciding ticket is a system ticket are left out, the same
//! way groupings leave them out.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::fmt;

use crate::coord::ChunkPos;
use crate::host::{ResidencyQuery, TicketSource};
use crate::ticket::{Ticket, PAUSED_TICKET_LEVEL};

/// Which level picks the deciding ticket of a chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OwnerLevel {
    /// The level each ticket was created with, ignoring pauses.
    #[default]
    Requested,
    /// The level each ticket imposes right now.
    Working,
}

impl OwnerLevel {
    fn of<T: Ticket + ?Sized>(self, ticket: &T) -> u32 {
        match self {
            OwnerLevel::Requested => ticket.level(),
            OwnerLevel::Working => ticket.effective_level(),
        }
    }
}

/// Load held by one ticket owner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnerStats {
    pub owner: String,
    pub chunk_count: usize,
    /// Block entities in the owner's loaded chunks.
    pub block_entities: u64,
    /// Entities in the owner's loaded chunks.
    pub entities: u64,
}

impl fmt::Display for OwnerStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} C={} BE={} E={}",
            self.owner, self.chunk_count, self.block_entities, self.entities
        )
    }
}

/// Owner statistics of `world`, heaviest block-entity load first and then
/// by owner name.
pub fn owner_stats<W>(world: &W, level: OwnerLevel) -> Vec<OwnerStats>
where
    W: TicketSource + ResidencyQuery + ?Sized,
{
    let mut decided: HashSet<ChunkPos> = HashSet::new();
    let mut owners: HashMap<String, BTreeSet<ChunkPos>> = HashMap::new();
    world.for_each_ticket(&mut |handle, ticket| {
        if decided.contains(&handle.pos) || level.of(ticket) > PAUSED_TICKET_LEVEL {
            return;
        }
        decided.insert(handle.pos);
        if ticket.is_system() {
            return;
        }
        // get_mut first so repeat owners don't allocate.
        if let Some(chunks) = owners.get_mut(ticket.owner()) {
            chunks.insert(handle.pos);
            return;
        }
        owners.insert(ticket.owner().to_string(), BTreeSet::from([handle.pos]));
    });

    let mut stats: Vec<OwnerStats> = owners
        .into_iter()
        .map(|(owner, chunks)| {
            let (block_entities, entities) = chunks.iter().fold((0u64, 0u64), |(be, e), &pos| {
                (
                    be + u64::from(world.block_entity_count(pos).unwrap_or(0)),
                    e + u64::from(world.entity_count(pos).unwrap_or(0)),
                )
            });
            OwnerStats {
                owner,
                chunk_count: chunks.len(),
                block_entities,
                entities,
            }
        })
        .collect();
    stats.sort_by(|a, b| {
        b.block_entities
            .cmp(&a.block_entities)
            .then_with(|| a.owner.cmp(&b.owner))
    });

    tracing::debug!(owners = stats.len(), chunks = decided.len(), "Collected ticket owner stats");
    stats
}
