//! Aggregates collected while a group is being profiled.

use std::collections::{HashMap, HashSet};
use std::time::{Duration, Instant};

use super::report::{CategorySummary, PerfReport, TypeSummary};
use crate::coord::ChunkPos;
use crate::host::WorldId;

/// What a timing measurement belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PerfCategory {
    /// A whole chunk tick.
    ChunkTick,
    /// One entity tick.
    EntityTick,
    /// One block entity tick.
    BlockEntityTick,
}

#[derive(Debug, Clone, Copy, Default)]
struct Stats {
    count: u64,
    total_nanos: u64,
    max_nanos: u64,
}

impl Stats {
    #[inline]
    fn add(&mut self, nanos: u64) {
        self.count += 1;
        self.total_nanos = self.total_nanos.saturating_add(nanos);
        self.max_nanos = self.max_nanos.max(nanos);
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct TypeStats {
    count: u64,
    total_nanos: u64,
}

impl TypeStats {
    #[inline]
    fn add(&mut self, nanos: u64) {
        self.count += 1;
        self.total_nanos = self.total_nanos.saturating_add(nanos);
    }
}

#[derive(Debug, Default)]
struct TypeTable {
    by_type: HashMap<Box<str>, TypeStats>,
}

impl TypeTable {
    #[inline]
    fn add(&mut self, type_name: &str, nanos: u64) {
        // Lookup first so repeat types never allocate.
        if let Some(stats) = self.by_type.get_mut(type_name) {
            stats.add(nanos);
            return;
        }
        self.by_type
            .entry(Box::from(type_name))
            .or_default()
            .add(nanos);
    }

    /// Up to `limit` types by total time, largest first; ties by name.
    fn top(&self, limit: usize) -> Vec<TypeSummary> {
        let mut rows: Vec<TypeSummary> = self
            .by_type
            .iter()
            .map(|(name, stats)| TypeSummary {
                name: name.to_string(),
                count: stats.count,
                total: Duration::from_nanos(stats.total_nanos),
            })
            .collect();
        rows.sort_by(|a, b| b.total.cmp(&a.total).then_with(|| a.name.cmp(&b.name)));
        rows.truncate(limit);
        rows
    }
}

/// Profiling state of one group in one world.
#[derive(Debug)]
pub struct PerfSession {
    world: WorldId,
    group_index: usize,
    owner_label: String,
    chunks: HashSet<ChunkPos>,
    block_entity_count: u64,
    entity_count: u64,
    started_at: Instant,
    chunk_ticks: Stats,
    entity_ticks: Stats,
    block_entity_ticks: Stats,
    entity_types: TypeTable,
    block_entity_types: TypeTable,
}

impl PerfSession {
    /// Start a session over a snapshot of the group's chunks.
    pub fn new(
        world: WorldId,
        group_index: usize,
        owner_label: String,
        chunks: impl IntoIterator<Item = ChunkPos>,
        block_entity_count: u64,
        entity_count: u64,
        started_at: Instant,
    ) -> Self {
        Self {
            world,
            group_index,
            owner_label,
            chunks: chunks.into_iter().collect(),
            block_entity_count,
            entity_count,
            started_at,
            chunk_ticks: Stats::default(),
            entity_ticks: Stats::default(),
            block_entity_ticks: Stats::default(),
            entity_types: TypeTable::default(),
            block_entity_types: TypeTable::default(),
        }
    }

    pub fn world(&self) -> &WorldId {
        &self.world
    }

    pub fn group_index(&self) -> usize {
        self.group_index
    }

    pub fn owner_label(&self) -> &str {
        &self.owner_label
    }

    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    pub fn started_at(&self) -> Instant {
        self.started_at
    }

    /// Whether `pos` belongs to the profiled group.
    #[inline]
    pub fn contains(&self, pos: ChunkPos) -> bool {
        self.chunks.contains(&pos)
    }

    /// Add one measurement. `type_name` is ignored for chunk ticks.
    #[inline]
    pub fn record(&mut self, category: PerfCategory, type_name: &str, nanos: u64) {
        match category {
            PerfCategory::ChunkTick => self.chunk_ticks.add(nanos),
            PerfCategory::EntityTick => {
                self.entity_ticks.add(nanos);
                self.entity_types.add(type_name, nanos);
            }
            PerfCategory::BlockEntityTick => {
                self.block_entity_ticks.add(nanos);
                self.block_entity_types.add(type_name, nanos);
            }
        }
    }

    /// Summarize the session as of `now`.
    pub fn report(&self, now: Instant, top_types: usize) -> PerfReport {
        PerfReport {
            world: self.world.clone(),
            group_index: self.group_index,
            owner_label: self.owner_label.clone(),
            chunk_count: self.chunks.len(),
            block_entity_count: self.block_entity_count,
            entity_count: self.entity_count,
            elapsed: now.saturating_duration_since(self.started_at),
            block_entities: summarize(&self.block_entity_ticks),
            entities: summarize(&self.entity_ticks),
            chunks: summarize(&self.chunk_ticks),
            top_block_entities: self.block_entity_types.top(top_types),
            top_entities: self.entity_types.top(top_types),
        }
    }
}

fn summarize(stats: &Stats) -> CategorySummary {
    CategorySummary {
        count: stats.count,
        total: Duration::from_nanos(stats.total_nanos),
        max: Duration::from_nanos(stats.max_nanos),
    }
}
