//! The custom collision region of an expanded ROM.
//!
//! ```text
//! pointer_table   3 bytes per room, LoROM address (LE) of the room's data,
//!                 0 when the room has no custom collision
//! data_start ..   encoded maps, packed one after another
//! data_end        soft end, nothing may be written past it
//! ```

use std::ops::Range;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::CollisionMap;
use crate::error::{Error, Result};
use crate::room::{ROOM_COUNT, Room};

/// LoROM address of a PC file offset.
#[must_use]
pub const fn pc_to_snes(pc: usize) -> usize {
    ((pc << 1) & 0x7F_0000) | (pc & 0x7FFF) | 0x8000
}

/// PC file offset of a LoROM address.
#[must_use]
pub const fn snes_to_pc(address: usize) -> usize {
    ((address & 0x7F_0000) >> 1) | (address & 0x7FFF)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollisionRegion {
    pub pointer_table: usize,
    pub room_count: usize,
    pub data_start: usize,
    pub data_end: usize,
}

impl Default for CollisionRegion {
    fn default() -> Self {
        Self {
            pointer_table: 0x12_8090,
            room_count: ROOM_COUNT,
            data_start: 0x12_8450,
            data_end: 0x13_0000,
        }
    }
}

/// Where [`CollisionRegion::write`] put a room's map.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WriteOutcome {
    /// The map was empty and the pointer was cleared.
    Cleared,
    /// Rewritten over the room's previous data.
    InPlace { offset: usize, len: usize },
    /// Written after all existing data.
    Appended { offset: usize, len: usize },
}

impl CollisionRegion {
    const fn pointer_offset(&self, room_id: usize) -> usize {
        self.pointer_table + room_id * 3
    }

    const fn table_end(&self) -> usize {
        self.pointer_offset(self.room_count)
    }

    /// True when the ROM is large enough to hold the pointer table.
    #[must_use]
    pub fn is_present(&self, rom: &[u8]) -> bool {
        rom.len() >= self.table_end()
    }

    fn check_room(&self, room_id: usize) -> Result<()> {
        if room_id >= self.room_count {
            return Err(Error::RoomOutOfRange {
                room_id,
                room_count: self.room_count,
            });
        }
        Ok(())
    }

    fn require(&self, rom: &[u8], required: usize) -> Result<()> {
        if rom.len() < required {
            return Err(Error::RegionMissing {
                required,
                rom_len: rom.len(),
            });
        }
        Ok(())
    }

    /// PC offset of the room's data, `None` when it has none.
    pub fn pointer(&self, rom: &[u8], room_id: usize) -> Result<Option<usize>> {
        self.check_room(room_id)?;
        self.require(rom, self.table_end())?;

        let at = self.pointer_offset(room_id);
        let address = usize::from(rom[at]) | (usize::from(rom[at + 1]) << 8) | (usize::from(rom[at + 2]) << 16);
        if address == 0 {
            return Ok(None);
        }

        let pc = snes_to_pc(address);
        if pc >= rom.len() {
            return Err(Error::PointerOutOfRange { room_id, address });
        }
        Ok(Some(pc))
    }

    #[allow(clippy::cast_possible_truncation)]
    fn set_pointer(&self, rom: &mut [u8], room_id: usize, pc: Option<usize>) {
        let address = pc.map_or(0, pc_to_snes);
        let at = self.pointer_offset(room_id);
        rom[at] = address as u8;
        rom[at + 1] = (address >> 8) as u8;
        rom[at + 2] = (address >> 16) as u8;
    }

    /// Decodes the data at `pc`, tagging errors with the room.
    fn decode_at(rom: &[u8], room_id: usize, pc: usize) -> Result<(CollisionMap, usize)> {
        CollisionMap::decode(&rom[pc..]).map_err(|err| match err {
            Error::InvalidCollisionData { reason, .. } => Error::InvalidCollisionData {
                room_id: Some(room_id),
                reason,
            },
            other => other,
        })
    }

    /// The room's custom collision, if it has any.
    pub fn load(&self, rom: &[u8], room_id: usize) -> Result<Option<CollisionMap>> {
        let Some(pc) = self.pointer(rom, room_id)? else {
            return Ok(None);
        };

        let (map, _) = Self::decode_at(rom, room_id, pc)?;
        Ok(Some(map))
    }

    /// Bytes taken by the room's current data.
    pub fn span(&self, rom: &[u8], room_id: usize) -> Result<Option<Range<usize>>> {
        let Some(pc) = self.pointer(rom, room_id)? else {
            return Ok(None);
        };

        let (_, len) = Self::decode_at(rom, room_id, pc)?;
        Ok(Some(pc..pc + len))
    }

    /// First byte after every room's data, never before `data_start`.
    pub fn first_free_offset(&self, rom: &[u8]) -> Result<usize> {
        let mut free = self.data_start;
        for room_id in 0..self.room_count {
            if let Some(span) = self.span(rom, room_id)? {
                free = free.max(span.end);
            }
        }
        Ok(free)
    }

    /// Stores `map` as the room's custom collision.
    ///
    /// The old data is overwritten when the new encoding fits in it,
    /// otherwise the map goes after all existing data. An empty map clears
    /// the room's pointer.
    pub fn write(&self, rom: &mut [u8], room_id: usize, map: &CollisionMap) -> Result<WriteOutcome> {
        self.check_room(room_id)?;
        self.require(rom, self.data_end.max(self.table_end()))?;

        if map.is_empty() {
            self.set_pointer(rom, room_id, None);
            debug!("room 0x{room_id:03X}: empty collision, pointer cleared");
            return Ok(WriteOutcome::Cleared);
        }

        let bytes = map.encode();
        let len = bytes.len();

        if let Some(span) = self.span(rom, room_id)?
            && len <= span.len()
        {
            rom[span.start..span.start + len].copy_from_slice(&bytes);
            info!("room 0x{room_id:03X}: rewrote {len} collision bytes at {:#08X}", span.start);
            return Ok(WriteOutcome::InPlace {
                offset: span.start,
                len,
            });
        }

        let offset = self.first_free_offset(rom)?;
        let available = self.data_end.saturating_sub(offset);
        if len > available {
            return Err(Error::OutOfSpace {
                room_id,
                required: len,
                available,
                region_start: self.data_start,
                region_end: self.data_end,
            });
        }

        rom[offset..offset + len].copy_from_slice(&bytes);
        self.set_pointer(rom, room_id, Some(offset));
        info!("room 0x{room_id:03X}: wrote {len} collision bytes at {offset:#08X}");

        Ok(WriteOutcome::Appended { offset, len })
    }

    /// Writes the collision of every loaded room marked dirty.
    ///
    /// A ROM without the region is left alone. Returns the number of rooms
    /// written.
    pub fn save_all(&self, rom: &mut [u8], rooms: &mut [Room]) -> Result<usize> {
        if !self.is_present(rom) {
            debug!("no custom collision region, nothing saved");
            return Ok(0);
        }

        let mut saved = 0;
        for room in rooms.iter_mut().filter(|r| r.is_loaded() && r.is_collision_dirty()) {
            self.write(rom, room.id(), room.custom_collision())?;
            room.clear_collision_dirty();
            saved += 1;
        }

        Ok(saved)
    }
}
