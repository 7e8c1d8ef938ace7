//! Chunk coordinates and Z-order (Morton) keys.
//!
//! Tickets are grouped by sorting their chunk positions along a Z-order
//! curve. Interleaving the bits of X and Z gives a 1D key in which chunks
//! that are close on the grid are usually close in key space, so cutting the
//! sorted sequence into runs yields spatially coherent groups.

mod types;

pub use types::{ChunkPos, CHUNK_SHIFT};

/// Spread the low 32 bits of `x` so that bit `i` lands on bit `2i`.
#[inline]
pub fn interleave_bits(x: u64) -> u64 {
    let mut x = x & 0x0000_0000_FFFF_FFFF;
    x = (x | (x << 16)) & 0x0000_FFFF_0000_FFFF;
    x = (x | (x << 8)) & 0x00FF_00FF_00FF_00FF;
    x = (x | (x << 4)) & 0x0F0F_0F0F_0F0F_0F0F;
    x = (x | (x << 2)) & 0x3333_3333_3333_3333;
    x = (x | (x << 1)) & 0x5555_5555_5555_5555;
    x
}

/// Z-order key of a chunk position.
///
/// X occupies the even bit positions and Z the odd ones. Both axes are
/// reinterpreted as unsigned, so negative coordinates sort after positive
/// ones.
#[inline]
pub fn morton_key(pos: ChunkPos) -> u64 {
    let x = pos.x as u32 as u64;
    let z = pos.z as u32 as u64;
    interleave_bits(x) | (interleave_bits(z) << 1)
}
