use std::fmt;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug)]
pub enum Error {
    /// Room id outside the room table.
    RoomOutOfRange { room_id: usize, room_count: usize },
    /// The room has no data to work with yet.
    RoomNotLoaded { room_id: usize },
    /// A placement object that can't seed the track grid.
    MalformedObject {
        room_id: usize,
        index: usize,
        reason: &'static str,
    },
    /// The ROM image doesn't contain the collision region.
    RegionMissing { required: usize, rom_len: usize },
    /// A room pointer addresses bytes outside the ROM image.
    PointerOutOfRange { room_id: usize, address: usize },
    /// Encoded collision data doesn't fit in the remaining region space.
    OutOfSpace {
        room_id: usize,
        required: usize,
        available: usize,
        region_start: usize,
        region_end: usize,
    },
    InvalidCollisionData {
        room_id: Option<usize>,
        reason: String,
    },
    InvalidJson(String),
    Io(std::io::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RoomOutOfRange {
                room_id,
                room_count,
            } => write!(
                f,
                "room 0x{room_id:03X} out of range (expected < 0x{room_count:03X})"
            ),
            Self::RoomNotLoaded { room_id } => write!(f, "room 0x{room_id:03X} is not loaded"),
            Self::MalformedObject {
                room_id,
                index,
                reason,
            } => write!(f, "room 0x{room_id:03X}: object #{index} is malformed: {reason}"),
            Self::RegionMissing { required, rom_len } => write!(
                f,
                "collision region missing: ROM is {rom_len:#X} bytes, need at least {required:#X}"
            ),
            Self::PointerOutOfRange { room_id, address } => write!(
                f,
                "room 0x{room_id:03X}: collision pointer {address:#08X} is outside the ROM"
            ),
            Self::OutOfSpace {
                room_id,
                required,
                available,
                region_start,
                region_end,
            } => write!(
                f,
                "room 0x{room_id:03X}: collision data needs {required} bytes but only \
                 {available} are free in region {region_start:#08X}..{region_end:#08X}"
            ),
            Self::InvalidCollisionData {
                room_id: Some(room_id),
                reason,
            } => write!(f, "room 0x{room_id:03X}: invalid collision data: {reason}"),
            Self::InvalidCollisionData {
                room_id: None,
                reason,
            } => write!(f, "invalid collision data: {reason}"),
            Self::InvalidJson(reason) => write!(f, "invalid collision JSON: {reason}"),
            Self::Io(err) => write!(f, "I/O error: {err}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::InvalidJson(err.to_string())
    }
}
