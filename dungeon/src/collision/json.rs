//! JSON interchange for custom collision.
//!
//! ```json
//! {
//!   "version": 1,
//!   "rooms": [
//!     { "room_id": "0x25", "tiles": [[65, 8], [66, "0xB7"]] }
//!   ]
//! }
//! ```
//!
//! Tiles are `[offset, value]` pairs with `offset = y * 64 + x`. Any number
//! may be written as an integer or as a hex string (`"0x"` optional).

use serde::{Deserialize, Serialize};

use super::{COLLISION_SIZE, COLLISION_TILES, CollisionMap};
use crate::error::{Error, Result};
use crate::room::ROOM_COUNT;

pub const COLLISION_JSON_VERSION: u32 = 1;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CollisionTileEntry {
    pub offset: u16,
    pub value: u8,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CollisionRoomEntry {
    pub room_id: usize,
    pub tiles: Vec<CollisionTileEntry>,
}

impl CollisionRoomEntry {
    #[allow(clippy::cast_possible_truncation)]
    #[must_use]
    pub fn from_map(room_id: usize, map: &CollisionMap) -> Self {
        Self {
            room_id,
            tiles: map
                .non_zero()
                .map(|(offset, value)| CollisionTileEntry {
                    offset: offset as u16,
                    value,
                })
                .collect(),
        }
    }

    #[must_use]
    pub fn to_map(&self) -> CollisionMap {
        let mut map = CollisionMap::new();
        for tile in &self.tiles {
            let offset = usize::from(tile.offset);
            map.set(offset % COLLISION_SIZE, offset / COLLISION_SIZE, tile.value);
        }
        map
    }
}

/// An integer or a hex string.
#[derive(Deserialize)]
#[serde(untagged)]
enum Number {
    Int(u64),
    Text(String),
}

impl Number {
    fn parse(&self, what: &str) -> Result<u64> {
        match self {
            Self::Int(value) => Ok(*value),
            Self::Text(text) => {
                let digits = text
                    .trim()
                    .trim_start_matches("0x")
                    .trim_start_matches("0X");
                u64::from_str_radix(digits, 16)
                    .map_err(|_| Error::InvalidJson(format!("{what} {text:?} is not a hex number")))
            }
        }
    }
}

#[derive(Deserialize)]
struct Document {
    version: u32,
    #[serde(default)]
    rooms: Vec<RoomDocument>,
}

#[derive(Deserialize)]
struct RoomDocument {
    room_id: Number,
    #[serde(default)]
    tiles: Vec<(Number, Number)>,
}

#[derive(Serialize)]
struct DumpDocument {
    version: u32,
    rooms: Vec<DumpRoom>,
}

#[derive(Serialize)]
struct DumpRoom {
    room_id: String,
    tiles: Vec<(u16, u8)>,
}

fn bounded(value: u64, limit: usize, what: &str) -> Result<usize> {
    usize::try_from(value)
        .ok()
        .filter(|&v| v < limit)
        .ok_or_else(|| Error::InvalidJson(format!("{what} {value:#X} out of range (expected < {limit:#X})")))
}

/// Reads collision rooms from a JSON document.
///
/// Zero-valued tiles are dropped.
#[allow(clippy::cast_possible_truncation)]
pub fn load_rooms_from_json(text: &str) -> Result<Vec<CollisionRoomEntry>> {
    let document: Document = serde_json::from_str(text)?;
    if document.version != COLLISION_JSON_VERSION {
        return Err(Error::InvalidJson(format!(
            "unsupported version {} (expected {COLLISION_JSON_VERSION})",
            document.version
        )));
    }

    document
        .rooms
        .iter()
        .map(|room| {
            let room_id = bounded(room.room_id.parse("room id")?, ROOM_COUNT, "room id")?;

            let mut tiles = Vec::with_capacity(room.tiles.len());
            for (offset, value) in &room.tiles {
                // Both bounds checked, the casts can't truncate.
                let offset = bounded(offset.parse("tile offset")?, COLLISION_TILES, "tile offset")? as u16;
                let value = bounded(value.parse("tile value")?, 0x100, "tile value")? as u8;
                if value != 0 {
                    tiles.push(CollisionTileEntry { offset, value });
                }
            }

            Ok(CollisionRoomEntry { room_id, tiles })
        })
        .collect()
}

/// Writes rooms as a JSON document, room ids in hex.
pub fn dump_rooms_to_json(rooms: &[CollisionRoomEntry]) -> Result<String> {
    if let Some(room) = rooms.iter().find(|room| room.room_id >= ROOM_COUNT) {
        return Err(Error::RoomOutOfRange {
            room_id: room.room_id,
            room_count: ROOM_COUNT,
        });
    }

    let document = DumpDocument {
        version: COLLISION_JSON_VERSION,
        rooms: rooms
            .iter()
            .map(|room| DumpRoom {
                room_id: format!("0x{:02X}", room.room_id),
                tiles: room.tiles.iter().map(|t| (t.offset, t.value)).collect(),
            })
            .collect(),
    };

    Ok(serde_json::to_string_pretty(&document)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn load_mixed_numbers() {
        let rooms = load_rooms_from_json(
            r#"{"version": 1, "rooms": [{"room_id": "0x25", "tiles": [[65, 8], [66, "0xB7"], ["43", 0]]}]}"#,
        )
        .unwrap();

        assert_eq!(
            rooms,
            vec![CollisionRoomEntry {
                room_id: 0x25,
                tiles: vec![
                    CollisionTileEntry { offset: 65, value: 8 },
                    CollisionTileEntry {
                        offset: 66,
                        value: 0xB7
                    },
                ],
            }]
        );

        let map = rooms[0].to_map();
        assert_eq!(map.get(1, 1), 8);
        assert_eq!(map.get(2, 1), 0xB7);
    }

    #[test]
    fn load_validates_ranges() {
        let bad = [
            r#"{"version": 2, "rooms": []}"#,
            r#"{"version": 1, "rooms": [{"room_id": 296, "tiles": []}]}"#,
            r#"{"version": 1, "rooms": [{"room_id": 1, "tiles": [[4096, 1]]}]}"#,
            r#"{"version": 1, "rooms": [{"room_id": 1, "tiles": [[0, 256]]}]}"#,
            r#"{"version": 1, "rooms": [{"room_id": "zz", "tiles": []}]}"#,
            r#"{"rooms": []}"#,
        ];

        for text in bad {
            assert!(
                matches!(load_rooms_from_json(text), Err(Error::InvalidJson(_))),
                "{text}"
            );
        }
    }

    #[test]
    fn dump_then_load() {
        let mut map = CollisionMap::new();
        map.set(10, 5, 0xB9);
        map.set(11, 5, 0xB0);
        let rooms = vec![CollisionRoomEntry::from_map(0x127, &map)];

        let text = dump_rooms_to_json(&rooms).unwrap();
        assert!(text.contains("\"0x127\""));
        assert!(text.contains("\"version\": 1"));

        let loaded = load_rooms_from_json(&text).unwrap();
        assert_eq!(loaded, rooms);
        assert_eq!(loaded[0].to_map(), map);
    }

    #[test]
    fn dump_rejects_unknown_room() {
        let rooms = vec![
            CollisionRoomEntry::default(),
            CollisionRoomEntry {
                room_id: ROOM_COUNT,
                tiles: vec![CollisionTileEntry { offset: 0, value: 1 }],
            },
        ];

        assert!(matches!(
            dump_rooms_to_json(&rooms),
            Err(Error::RoomOutOfRange {
                room_id: ROOM_COUNT,
                room_count: ROOM_COUNT
            })
        ));
    }
}
