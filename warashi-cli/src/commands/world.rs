//! Synthetic world shared by `simulate` and `perf`.

use warashi::coord::ChunkPos;
use warashi::host::MemoryWorld;
use warashi::ticket::{SimTicket, TicketKind};

/// Chunks between farm origins.
const FARM_SPACING: i32 = 256;

/// Chunks per farm side.
pub const FARM_SIDE: i32 = 4;

const MACHINES: &[&str] = &["furnace", "hopper", "crusher", "chest", "pipe"];
const MOBS: &[&str] = &["zombie", "cow", "item", "villager"];

/// A world of `farms` square farms, each loaded by one owner's tickets.
///
/// Farm `i` has `4 * (i + 1)` block entities and `i % 3 + 1` entities per
/// chunk, so later farms are costlier. A player and the spawn area hold
/// system tickets that the scheduler must leave alone.
pub fn synthetic_world(farms: usize) -> MemoryWorld {
    let mut world = MemoryWorld::new("overworld");
    world.add_ticket(
        ChunkPos::new(0, 0),
        SimTicket::new(22, TicketKind::Start, "spawn"),
    );

    for farm in 0..farms {
        let origin_x = (farm as i32 % 4) * FARM_SPACING;
        let origin_z = (farm as i32 / 4) * FARM_SPACING;
        let owner = format!("farm-{}", farm);
        for dx in 0..FARM_SIDE {
            for dz in 0..FARM_SIDE {
                let pos = ChunkPos::new(origin_x + dx, origin_z + dz);
                world.add_ticket(pos, SimTicket::custom(31, owner.clone()));
                world.load_chunk(pos, 4 * (farm as u32 + 1), farm as u32 % 3 + 1);
            }
        }
    }

    world.add_ticket(
        ChunkPos::new(FARM_SPACING, 0),
        SimTicket::new(31, TicketKind::Player, "operator"),
    );
    world
}

/// Block entity type name for the `i`-th machine in a chunk.
pub fn machine_type(i: u32) -> &'static str {
    MACHINES[i as usize % MACHINES.len()]
}

/// Entity type name for the `i`-th mob in a chunk.
pub fn mob_type(i: u32) -> &'static str {
    MOBS[i as usize % MOBS.len()]
}
