//! Custom collision maps and their ROM encoding.
//!
//! A room's custom collision is a 64×64 grid of tile attribute bytes, one per
//! 8×8 tile, where 0 means "no custom collision". In ROM only the non-zero
//! cells are kept:
//!
//! ```text
//! F0 F0                      marker
//! oo oo vv   (repeated)      offset (u16 LE, y * 64 + x) and value
//! FF FF                      terminator
//! ```
//!
//! so a map with `N` non-zero cells always takes `4 + 3 * N` bytes.
//!
//! Hand-authored data may also start with rectangle blocks ahead of the
//! marker: an offset word, a width and height byte, then `width * height`
//! values row by row. Those are read but never written.

pub mod json;
pub mod region;

use serde::{Deserialize, Serialize};
use serde_with::serde_as;

use crate::error::{Error, Result};

/// Tiles per side of a collision map.
pub const COLLISION_SIZE: usize = 64;

/// Cells in a collision map.
pub const COLLISION_TILES: usize = COLLISION_SIZE * COLLISION_SIZE;

pub const COLLISION_MARKER: u16 = 0xF0F0;
pub const COLLISION_TERMINATOR: u16 = 0xFFFF;

#[serde_as]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollisionMap {
    #[serde_as(as = "Box<[_; 4096]>")]
    tiles: Box<[u8; COLLISION_TILES]>,
}

impl Default for CollisionMap {
    fn default() -> Self {
        Self {
            tiles: Box::new([0; COLLISION_TILES]),
        }
    }
}

impl CollisionMap {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn offset(x: usize, y: usize) -> usize {
        y * COLLISION_SIZE + x
    }

    /// Value at `(x, y)`, 0 outside the map.
    #[must_use]
    pub fn get(&self, x: usize, y: usize) -> u8 {
        if x >= COLLISION_SIZE || y >= COLLISION_SIZE {
            return 0;
        }
        self.tiles[Self::offset(x, y)]
    }

    /// Sets `(x, y)`. Returns `false` when the cell is outside the map.
    pub fn set(&mut self, x: usize, y: usize, value: u8) -> bool {
        if x >= COLLISION_SIZE || y >= COLLISION_SIZE {
            return false;
        }
        self.tiles[Self::offset(x, y)] = value;
        true
    }

    #[must_use]
    pub fn tiles(&self) -> &[u8; COLLISION_TILES] {
        &self.tiles
    }

    pub fn clear(&mut self) {
        self.tiles.fill(0);
    }

    /// True when every cell is 0.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tiles.iter().all(|&t| t == 0)
    }

    /// Non-zero cells as `(offset, value)`, in offset order.
    pub fn non_zero(&self) -> impl Iterator<Item = (usize, u8)> + '_ {
        self.tiles
            .iter()
            .enumerate()
            .filter(|&(_, &value)| value != 0)
            .map(|(offset, &value)| (offset, value))
    }

    #[must_use]
    pub fn non_zero_count(&self) -> usize {
        self.non_zero().count()
    }

    #[must_use]
    pub fn encoded_len(&self) -> usize {
        4 + 3 * self.non_zero_count()
    }

    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn encode(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.encoded_len());
        bytes.extend_from_slice(&COLLISION_MARKER.to_le_bytes());
        for (offset, value) in self.non_zero() {
            // Offsets stay below 4096.
            bytes.extend_from_slice(&(offset as u16).to_le_bytes());
            bytes.push(value);
        }
        bytes.extend_from_slice(&COLLISION_TERMINATOR.to_le_bytes());
        bytes
    }

    /// Decodes a map from the start of `data`.
    ///
    /// Returns the map and the number of bytes it spanned, terminator
    /// included.
    pub fn decode(data: &[u8]) -> Result<(Self, usize)> {
        let invalid = |reason: String| Error::InvalidCollisionData {
            room_id: None,
            reason,
        };
        let truncated = |at: usize| invalid(format!("truncated at byte {at}"));

        let read_u16 = |at: usize| -> Option<u16> {
            let bytes = data.get(at..at + 2)?;
            Some(u16::from_le_bytes([bytes[0], bytes[1]]))
        };

        let mut map = Self::new();
        let mut single_tiles = false;
        let mut cursor = 0;
        loop {
            let word = read_u16(cursor).ok_or_else(|| truncated(cursor))?;
            cursor += 2;

            match word {
                COLLISION_TERMINATOR => return Ok((map, cursor)),
                COLLISION_MARKER => {
                    single_tiles = true;
                    continue;
                }
                _ => {}
            }

            let offset = usize::from(word);
            if offset >= COLLISION_TILES {
                return Err(invalid(format!("tile offset {offset} out of range")));
            }

            if single_tiles {
                let value = *data.get(cursor).ok_or_else(|| truncated(cursor))?;
                cursor += 1;
                map.tiles[offset] = value;
                continue;
            }

            let [width, height] = data
                .get(cursor..cursor + 2)
                .and_then(|size| <[u8; 2]>::try_from(size).ok())
                .ok_or_else(|| truncated(cursor))?;
            cursor += 2;

            let (width, height) = (usize::from(width), usize::from(height));
            let values = data
                .get(cursor..cursor + width * height)
                .ok_or_else(|| truncated(cursor))?;
            cursor += values.len();

            let (x, y) = (offset % COLLISION_SIZE, offset / COLLISION_SIZE);
            for (row, line) in values.chunks(width.max(1)).enumerate() {
                for (column, &value) in line.iter().enumerate() {
                    map.set(x + column, y + row, value);
                }
            }
        }
    }
}
