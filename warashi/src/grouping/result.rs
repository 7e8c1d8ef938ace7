//! Grouping output types.

use std::collections::HashMap;
use std::ops::Range;

use crate::coord::ChunkPos;
use crate::host::{TicketHandle, TicketSource};
use crate::ticket::Ticket;

/// One ticket placed on the Z-order curve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GroupEntry {
    /// Where the ticket lives in the host.
    pub handle: TicketHandle,
    /// Z-order key of the ticket's chunk.
    pub morton: u64,
    /// The ticket's chunk.
    pub pos: ChunkPos,
}

/// A run of spatially close tickets scheduled as a unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TicketGroup {
    span: Range<usize>,
    chunks: Vec<ChunkPos>,
}

impl TicketGroup {
    pub(super) fn new(span: Range<usize>, entries: &[GroupEntry]) -> Self {
        let mut chunks: Vec<ChunkPos> = Vec::new();
        for entry in &entries[span.clone()] {
            // Entries of one chunk are adjacent after the Morton sort.
            if chunks.last() != Some(&entry.pos) {
                chunks.push(entry.pos);
            }
        }
        Self { span, chunks }
    }

    /// Number of tickets in the group.
    pub fn len(&self) -> usize {
        self.span.len()
    }

    /// Whether the group holds no tickets.
    pub fn is_empty(&self) -> bool {
        self.span.is_empty()
    }

    /// Unique chunks touched by the group, in Z-order.
    pub fn chunks(&self) -> &[ChunkPos] {
        &self.chunks
    }

    /// Number of unique chunks touched by the group.
    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }
}

/// Tickets of one world, sorted by Z-order and cut into groups.
///
/// Valid for a single scheduling pass: the handles inside refer to ticket
/// slots that the host may reorder afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupingResult {
    entries: Vec<GroupEntry>,
    groups: Vec<TicketGroup>,
}

impl GroupingResult {
    pub(super) fn new(entries: Vec<GroupEntry>, spans: Vec<Range<usize>>) -> Self {
        let groups = spans
            .into_iter()
            .map(|span| TicketGroup::new(span, &entries))
            .collect();
        Self { entries, groups }
    }

    /// All filtered entries in ascending Z-order.
    pub fn entries(&self) -> &[GroupEntry] {
        &self.entries
    }

    /// The groups, in Z-order of their first entry.
    pub fn groups(&self) -> &[TicketGroup] {
        &self.groups
    }

    /// Number of groups.
    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    /// Whether no ticket passed the filter.
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Group at `index`.
    pub fn group(&self, index: usize) -> Option<&TicketGroup> {
        self.groups.get(index)
    }

    /// Entries belonging to `group`.
    pub fn entries_of(&self, group: &TicketGroup) -> &[GroupEntry] {
        &self.entries[group.span.clone()]
    }

    /// Iterate `(index, group, entries)`.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &TicketGroup, &[GroupEntry])> + '_ {
        self.groups
            .iter()
            .enumerate()
            .map(move |(index, group)| (index, group, self.entries_of(group)))
    }

    /// Most frequent ticket owner in `group`, ties going to the owner seen
    /// first in Z-order.
    pub fn owner_label<S: TicketSource>(&self, source: &S, group: &TicketGroup) -> String {
        let mut counts: HashMap<&str, (usize, usize)> = HashMap::new();
        for (order, entry) in self.entries_of(group).iter().enumerate() {
            if let Some(ticket) = source.ticket(entry.handle) {
                counts.entry(ticket.owner()).or_insert((0, order)).0 += 1;
            }
        }
        counts
            .into_iter()
            .max_by(|(_, (count_a, first_a)), (_, (count_b, first_b))| {
                count_a.cmp(count_b).then(first_b.cmp(first_a))
            })
            .map(|(owner, _)| owner.to_string())
            .unwrap_or_else(|| "unknown".to_string())
    }
}
