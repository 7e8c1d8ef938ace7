//! Chunk position type.

use std::fmt;

/// Width of a chunk in blocks, as a shift amount (16 = 2^4).
pub const CHUNK_SHIFT: u32 = 4;

/// Grid position of a chunk in a world.
///
/// Chunks are the unit tickets are attached to. Positions are signed; the
/// packed and Morton forms reinterpret each axis as an unsigned 32-bit value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChunkPos {
    /// Chunk X coordinate.
    pub x: i32,
    /// Chunk Z coordinate.
    pub z: i32,
}

impl ChunkPos {
    /// Create a chunk position.
    pub const fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }

    /// Chunk containing the given block coordinates.
    #[inline]
    pub const fn from_block(block_x: i32, block_z: i32) -> Self {
        Self {
            x: block_x >> CHUNK_SHIFT,
            z: block_z >> CHUNK_SHIFT,
        }
    }

    /// Pack into a single `u64`: X in the low 32 bits, Z in the high 32 bits.
    #[inline]
    pub const fn pack(self) -> u64 {
        (self.x as u32 as u64) | ((self.z as u32 as u64) << 32)
    }

    /// Inverse of [`ChunkPos::pack`].
    #[inline]
    pub const fn unpack(packed: u64) -> Self {
        Self {
            x: packed as u32 as i32,
            z: (packed >> 32) as u32 as i32,
        }
    }
}

impl fmt::Display for ChunkPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.x, self.z)
    }
}

impl From<(i32, i32)> for ChunkPos {
    fn from((x, z): (i32, i32)) -> Self {
        Self::new(x, z)
    }
}
