pub mod batch;

#[allow(clippy::cast_possible_truncation)]
mod bitwise;

pub mod collision;
pub mod color;
pub mod compositor;
pub mod error;
pub mod layers;

#[allow(clippy::missing_panics_doc)]
pub mod pixel_buffer;

pub mod room;
pub mod track;

pub use compositor::{CompositeStrategy, Compositor, LayerSource};
pub use error::{Error, Result};
pub use layers::{LayerBlendMode, LayerManager, LayerType, MergeType};
pub use pixel_buffer::PixelBuffer;
pub use room::{Room, RoomDescription, RoomObject};
