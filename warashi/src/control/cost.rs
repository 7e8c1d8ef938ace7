//! Group cost ranking by block entity count.
//!
//! The cost of a group is the number of block entities across its chunks.
//! Counts of loaded chunks are read fresh and remembered per world; a chunk
//! that is not loaded right now contributes its last remembered count (zero
//! if it was never seen loaded).

use std::collections::HashMap;

use crate::coord::ChunkPos;
use crate::grouping::GroupingResult;
use crate::host::{ResidencyQuery, WorldId};

/// Cost of one group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GroupCost {
    /// Group index in the grouping.
    pub index: usize,
    /// Block entities across the group's chunks.
    pub cost: u64,
}

/// Ranks groups by block entity count with a per-chunk cache.
#[derive(Debug, Default)]
pub struct GroupCostEstimator {
    caches: HashMap<WorldId, HashMap<ChunkPos, u32>>,
}

impl GroupCostEstimator {
    /// Create an estimator with empty caches.
    pub fn new() -> Self {
        Self::default()
    }

    /// Cost of a set of unique chunks.
    pub fn group_cost<W: ResidencyQuery + ?Sized>(
        &mut self,
        world_id: &WorldId,
        world: &W,
        chunks: &[ChunkPos],
    ) -> u64 {
        let cache = self.caches.entry(world_id.clone()).or_default();
        let mut total = 0u64;
        for &pos in chunks {
            match world.block_entity_count(pos) {
                Some(count) => {
                    cache.insert(pos, count);
                    total += u64::from(count);
                }
                None => total += u64::from(cache.get(&pos).copied().unwrap_or(0)),
            }
        }
        total
    }

    /// Costs of every group, costliest first; equal costs keep index order.
    pub fn rank<W: ResidencyQuery + ?Sized>(
        &mut self,
        world_id: &WorldId,
        world: &W,
        grouping: &GroupingResult,
    ) -> Vec<GroupCost> {
        let mut costs: Vec<GroupCost> = grouping
            .groups()
            .iter()
            .enumerate()
            .map(|(index, group)| GroupCost {
                index,
                cost: self.group_cost(world_id, world, group.chunks()),
            })
            .collect();
        costs.sort_by(|a, b| b.cost.cmp(&a.cost).then(a.index.cmp(&b.index)));
        costs
    }

    /// Remembered block entity count of a chunk.
    pub fn cached(&self, world_id: &WorldId, pos: ChunkPos) -> Option<u32> {
        self.caches.get(world_id)?.get(&pos).copied()
    }

    /// Drop the cache of a world that was unloaded.
    pub fn forget_world(&mut self, world_id: &WorldId) {
        self.caches.remove(world_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grouping::{GroupingConfig, GroupingFilter, TicketGrouper};
    use crate::host::{ChunkWorld, MemoryWorld};
    use crate::ticket::SimTicket;

    /// Three groups of one chunk each, far apart on the curve.
    fn three_group_world() -> MemoryWorld {
        let mut world = MemoryWorld::new("overworld");
        for x in [0, 1000, 2000] {
            world.add_ticket(ChunkPos::new(x, 0), SimTicket::custom(31, "loader"));
        }
        world
    }

    fn group(world: &MemoryWorld) -> GroupingResult {
        TicketGrouper::new(GroupingConfig {
            target_size: 1,
            proximity_threshold: 0,
        })
        .build(world, GroupingFilter::Scheduling)
    }

    #[test]
    fn test_rank_costliest_first() {
        let mut world = three_group_world();
        world.load_chunk(ChunkPos::new(0, 0), 5, 0);
        world.load_chunk(ChunkPos::new(1000, 0), 50, 0);
        world.load_chunk(ChunkPos::new(2000, 0), 20, 0);
        let grouping = group(&world);

        let mut estimator = GroupCostEstimator::new();
        let ranked = estimator.rank(world.id(), &world, &grouping);
        let order: Vec<usize> = ranked.iter().map(|c| c.index).collect();
        assert_eq!(order, vec![1, 2, 0]);
        assert_eq!(ranked[0].cost, 50);
    }

    #[test]
    fn test_equal_costs_keep_index_order() {
        let mut world = three_group_world();
        world.load_chunk(ChunkPos::new(0, 0), 7, 0);
        world.load_chunk(ChunkPos::new(1000, 0), 7, 0);
        world.load_chunk(ChunkPos::new(2000, 0), 7, 0);
        let grouping = group(&world);

        let mut estimator = GroupCostEstimator::new();
        let order: Vec<usize> = estimator
            .rank(world.id(), &world, &grouping)
            .iter()
            .map(|c| c.index)
            .collect();
        assert_eq!(order, vec![0, 1, 2]);
    }

    #[test]
    fn test_non_resident_without_cache_costs_zero() {
        let world = three_group_world();
        let grouping = group(&world);

        let mut estimator = GroupCostEstimator::new();
        let ranked = estimator.rank(world.id(), &world, &grouping);
        assert!(ranked.iter().all(|c| c.cost == 0));
        let order: Vec<usize> = ranked.iter().map(|c| c.index).collect();
        assert_eq!(order, vec![0, 1, 2]);
    }

    #[test]
    fn test_unloaded_chunk_uses_cached_count() {
        let mut world = three_group_world();
        let pos = ChunkPos::new(2000, 0);
        world.load_chunk(pos, 30, 0);
        let grouping = group(&world);

        let mut estimator = GroupCostEstimator::new();
        estimator.rank(world.id(), &world, &grouping);
        assert_eq!(estimator.cached(world.id(), pos), Some(30));

        world.unload_chunk(pos);
        let ranked = estimator.rank(world.id(), &world, &grouping);
        assert_eq!(ranked[0], GroupCost { index: 2, cost: 30 });
    }

    #[test]
    fn test_fresh_count_overwrites_cache() {
        let mut world = three_group_world();
        let pos = ChunkPos::new(0, 0);
        world.load_chunk(pos, 30, 0);
        let grouping = group(&world);

        let mut estimator = GroupCostEstimator::new();
        estimator.rank(world.id(), &world, &grouping);
        world.load_chunk(pos, 2, 0);
        estimator.rank(world.id(), &world, &grouping);
        assert_eq!(estimator.cached(world.id(), pos), Some(2));
    }

    #[test]
    fn test_caches_are_per_world() {
        let mut overworld = three_group_world();
        overworld.load_chunk(ChunkPos::new(0, 0), 9, 0);
        let grouping = group(&overworld);

        let mut estimator = GroupCostEstimator::new();
        estimator.rank(overworld.id(), &overworld, &grouping);

        let nether = WorldId::new("nether");
        assert_eq!(estimator.cached(&nether, ChunkPos::new(0, 0)), None);

        estimator.forget_world(overworld.id());
        assert_eq!(estimator.cached(overworld.id(), ChunkPos::new(0, 0)), None);
    }
}
