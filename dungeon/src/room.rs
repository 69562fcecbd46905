use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::collision::CollisionMap;
use crate::color::Color;
use crate::compositor::{CompositeStats, Compositor, LayerSource};
use crate::error::{Error, Result};
use crate::layers::{LayerManager, LayerType, MergeType};
use crate::pixel_buffer::{PixelBuffer, TRANSPARENT, TileWord};
use crate::track::GeneratorOptions;

/// Rooms in the stock dungeon room table.
pub const ROOM_COUNT: usize = 296;

/// An object placed in a room, with its footprint in 8×8 tiles.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomObject {
    pub type_id: u16,
    pub tile_x: usize,
    pub tile_y: usize,
    pub width: usize,
    pub height: usize,
    /// Object layer (0-2) from the room data.
    #[serde(default)]
    pub layer: u8,
}

impl RoomObject {
    /// Buffer the object's tiles are drawn into.
    #[must_use]
    pub const fn target_layer(&self) -> LayerType {
        LayerType::for_object_layer(self.layer)
    }
}

/// One dungeon room: metadata, objects and its four layer buffers.
pub struct Room {
    id: usize,
    palette_id: u8,
    merge_type_id: u8,
    objects: Vec<RoomObject>,
    layers: [PixelBuffer; 4],
    composite: PixelBuffer,
    /// Layer state the cached composite was built with.
    composed_with: Option<(LayerManager, Compositor)>,
    custom_collision: CollisionMap,
    collision_dirty: bool,
    loaded: bool,
}

impl Room {
    /// An empty, unloaded room with transparent layers.
    #[must_use]
    pub fn new(id: usize) -> Self {
        Self {
            id,
            palette_id: 0,
            merge_type_id: 0,
            objects: Vec::new(),
            layers: std::array::from_fn(|_| PixelBuffer::room()),
            composite: PixelBuffer::default(),
            composed_with: None,
            custom_collision: CollisionMap::new(),
            collision_dirty: false,
            loaded: false,
        }
    }

    #[must_use]
    pub const fn id(&self) -> usize {
        self.id
    }

    #[must_use]
    pub const fn palette_id(&self) -> u8 {
        self.palette_id
    }

    pub fn set_palette_id(&mut self, palette_id: u8) {
        self.palette_id = palette_id;
    }

    #[must_use]
    pub const fn merge_type_id(&self) -> u8 {
        self.merge_type_id
    }

    /// The room's merge type, or the default one for unknown ids.
    #[must_use]
    pub fn merge_type(&self) -> MergeType {
        MergeType::from_id(self.merge_type_id).copied().unwrap_or_else(|| {
            warn!(
                "room 0x{:03X}: unknown merge type {}, using {}",
                self.id,
                self.merge_type_id,
                MergeType::default().name
            );
            MergeType::default()
        })
    }

    pub fn set_merge_type_id(&mut self, merge_type_id: u8) {
        self.merge_type_id = merge_type_id;
    }

    #[must_use]
    pub const fn is_loaded(&self) -> bool {
        self.loaded
    }

    #[must_use]
    pub fn objects(&self) -> &[RoomObject] {
        &self.objects
    }

    /// Replaces the object list and marks the room as loaded.
    pub fn load_objects(&mut self, objects: Vec<RoomObject>) {
        debug!("room 0x{:03X}: loaded {} objects", self.id, objects.len());
        self.objects = objects;
        self.loaded = true;
    }

    #[must_use]
    pub fn buffer(&self, layer: LayerType) -> &PixelBuffer {
        &self.layers[layer.index()]
    }

    /// Mutable layer access. Invalidates the cached composite.
    pub fn buffer_mut(&mut self, layer: LayerType) -> &mut PixelBuffer {
        self.composed_with = None;
        &mut self.layers[layer.index()]
    }

    pub fn draw_tile(&mut self, layer: LayerType, tile_x: usize, tile_y: usize, word: TileWord, tile: &[u8; 64]) -> bool {
        self.buffer_mut(layer).draw_tile(tile_x, tile_y, word, tile)
    }

    /// Resets both object buffers, priorities included, ahead of a redraw.
    pub fn clear_object_buffers(&mut self) {
        for layer in [LayerType::Bg1Objects, LayerType::Bg2Objects] {
            self.buffer_mut(layer).clear(TRANSPARENT);
        }
    }

    /// Gives every layer the same palette.
    pub fn set_palette(&mut self, palette: &[Color]) {
        for layer in LayerType::ALL {
            self.buffer_mut(layer).set_palette(palette.to_vec());
        }
    }

    /// The composited room, rebuilt only when a layer or the layer state
    /// changed since the last call.
    pub fn composite(&mut self, manager: &LayerManager, compositor: &Compositor) -> &PixelBuffer {
        let current = self
            .composed_with
            .as_ref()
            .is_some_and(|(m, c)| m == manager && c == compositor);

        if !current {
            let stats = compositor.composite(&self.layers, manager, &mut self.composite);
            debug!(
                "room 0x{:03X}: composited {} layers, {} opaque pixels",
                self.id, stats.layers_drawn, stats.opaque_pixels
            );
            self.composed_with = Some((manager.clone(), *compositor));
        }

        &self.composite
    }

    /// Forces a rebuild, returning the stats of this pass.
    pub fn recomposite(&mut self, manager: &LayerManager, compositor: &Compositor) -> CompositeStats {
        let stats = compositor.composite(&self.layers, manager, &mut self.composite);
        self.composed_with = Some((manager.clone(), *compositor));
        stats
    }

    #[must_use]
    pub fn custom_collision(&self) -> &CollisionMap {
        &self.custom_collision
    }

    pub fn set_custom_collision(&mut self, map: CollisionMap) {
        self.custom_collision = map;
        self.collision_dirty = true;
    }

    /// Sets one collision tile. Returns `false` outside the map.
    pub fn set_collision_tile(&mut self, x: usize, y: usize, value: u8) -> bool {
        let changed = self.custom_collision.set(x, y, value);
        self.collision_dirty |= changed;
        changed
    }

    #[must_use]
    pub const fn is_collision_dirty(&self) -> bool {
        self.collision_dirty
    }

    pub fn clear_collision_dirty(&mut self) {
        self.collision_dirty = false;
    }
}

impl LayerSource for Room {
    fn layer(&self, layer: LayerType) -> &PixelBuffer {
        self.buffer(layer)
    }
}

/// A tilemap entry placed on one layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlacedTile {
    pub layer: LayerType,
    pub x: usize,
    pub y: usize,
    /// Raw tilemap word, see [`TileWord`].
    pub word: u16,
}

/// A room written out as a JSON document.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoomDescription {
    pub room_id: usize,
    pub palette_id: u8,
    pub merge_type: u8,
    /// BGR555 colors.
    pub palette: Vec<u16>,
    /// Tile graphics, 64 source indices each, addressed by tile number.
    pub graphics: Vec<Vec<u8>>,
    pub tiles: Vec<PlacedTile>,
    pub objects: Vec<RoomObject>,
    pub generator: GeneratorOptions,
    pub compositor: Compositor,
}

impl RoomDescription {
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn from_path(path: impl AsRef<std::path::Path>) -> Result<Self> {
        Self::from_json(&std::fs::read_to_string(path)?)
    }

    /// Builds a loaded room with its tiles drawn.
    ///
    /// Tiles whose graphics are missing or not 64 pixels long are skipped.
    pub fn build(&self) -> Result<Room> {
        if self.room_id >= ROOM_COUNT {
            return Err(Error::RoomOutOfRange {
                room_id: self.room_id,
                room_count: ROOM_COUNT,
            });
        }

        let mut room = Room::new(self.room_id);
        room.set_palette_id(self.palette_id);
        room.set_merge_type_id(self.merge_type);

        let palette: Vec<Color> = self.palette.iter().copied().map(Color::from).collect();
        room.set_palette(&palette);

        for placed in &self.tiles {
            let word = TileWord(placed.word);
            let graphics = self
                .graphics
                .get(usize::from(word.tile()))
                .and_then(|pixels| <&[u8; 64]>::try_from(pixels.as_slice()).ok());

            let Some(graphics) = graphics else {
                warn!(
                    "room 0x{:03X}: no graphics for tile {:#05X}, skipping",
                    self.room_id,
                    word.tile()
                );
                continue;
            };

            if !room.draw_tile(placed.layer, placed.x, placed.y, word, graphics) {
                warn!(
                    "room 0x{:03X}: tile at ({}, {}) is outside the room",
                    self.room_id, placed.x, placed.y
                );
            }
        }

        room.load_objects(self.objects.clone());
        Ok(room)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compositor::CompositeStrategy;
    use crate::layers::LayerBlendMode;
    use pretty_assertions::assert_eq;

    #[test]
    fn new_room_is_unloaded_and_transparent() {
        let room = Room::new(0x25);
        assert!(!room.is_loaded());
        for layer in LayerType::ALL {
            assert!(room.buffer(layer).is_room_sized());
            assert_eq!(room.buffer(layer).opaque_count(), 0);
        }
    }

    #[test]
    fn object_layer_routing() {
        let object = |layer| RoomObject {
            layer,
            ..RoomObject::default()
        };
        assert_eq!(object(0).target_layer(), LayerType::Bg1Objects);
        assert_eq!(object(1).target_layer(), LayerType::Bg2Objects);
        assert_eq!(object(2).target_layer(), LayerType::Bg1Objects);
    }

    #[test]
    fn clearing_objects_resets_priority() {
        let mut room = Room::new(1);
        room.draw_tile(LayerType::Bg1Objects, 0, 0, TileWord::new(0, 0, true, false, false), &[1; 64]);
        room.draw_tile(LayerType::Bg1Layout, 0, 0, TileWord::new(0, 0, true, false, false), &[1; 64]);

        room.clear_object_buffers();

        let objects = room.buffer(LayerType::Bg1Objects);
        assert_eq!(objects.opaque_count(), 0);
        assert!(objects.priorities().iter().all(|&p| p == crate::pixel_buffer::PRIORITY_UNSET));
        assert_eq!(room.buffer(LayerType::Bg1Layout).opaque_count(), 64);
    }

    #[test]
    fn composite_is_cached_until_something_changes() {
        let mut room = Room::new(2);
        let compositor = Compositor::default();
        let mut manager = LayerManager::new();

        room.draw_tile(LayerType::Bg2Layout, 1, 1, TileWord::new(0, 1, false, false, false), &[2; 64]);
        assert_eq!(room.composite(&manager, &compositor)[(8, 8)], 18);

        // Writing through the buffer invalidates the cache.
        room.buffer_mut(LayerType::Bg2Layout).set_pixel(8, 8, 40);
        assert_eq!(room.composite(&manager, &compositor)[(8, 8)], 40);

        manager.set_visible(LayerType::Bg2Layout, false);
        assert_eq!(room.composite(&manager, &compositor)[(8, 8)], 0);

        let priority = Compositor::new(CompositeStrategy::Priority);
        manager.set_visible(LayerType::Bg2Layout, true);
        assert_eq!(room.composite(&manager, &priority)[(8, 8)], 40);
    }

    #[test]
    fn unknown_merge_type_falls_back() {
        let mut room = Room::new(3);
        room.set_merge_type_id(8);
        assert!(room.merge_type().is_dark_room());

        room.set_merge_type_id(42);
        assert_eq!(room.merge_type(), MergeType::default());
    }

    #[test]
    fn collision_tiles_mark_dirty() {
        let mut room = Room::new(4);
        assert!(!room.set_collision_tile(64, 0, 1));
        assert!(!room.is_collision_dirty());

        assert!(room.set_collision_tile(3, 4, 0xB0));
        assert!(room.is_collision_dirty());
        assert_eq!(room.custom_collision().get(3, 4), 0xB0);

        room.clear_collision_dirty();
        assert!(!room.is_collision_dirty());

        room.set_custom_collision(CollisionMap::new());
        assert!(room.is_collision_dirty());
        assert!(room.custom_collision().is_empty());
    }

    #[test]
    fn description_builds_room() {
        let json = r#"{
            "room_id": 37,
            "merge_type": 4,
            "palette": [0, 31, 992],
            "graphics": [[1, 1, 1, 1, 1, 1, 1, 1,
                          1, 1, 1, 1, 1, 1, 1, 1,
                          1, 1, 1, 1, 1, 1, 1, 1,
                          1, 1, 1, 1, 1, 1, 1, 1,
                          1, 1, 1, 1, 1, 1, 1, 1,
                          1, 1, 1, 1, 1, 1, 1, 1,
                          1, 1, 1, 1, 1, 1, 1, 1,
                          2, 2, 2, 2, 2, 2, 2, 2]],
            "tiles": [
                {"layer": "Bg1Layout", "x": 0, "y": 0, "word": 0},
                {"layer": "Bg2Layout", "x": 1, "y": 0, "word": 5}
            ],
            "objects": [
                {"type_id": 49, "tile_x": 2, "tile_y": 3, "width": 4, "height": 1}
            ]
        }"#;

        let description = RoomDescription::from_json(json).unwrap();
        assert_eq!(description.generator, GeneratorOptions::default());

        let room = description.build().unwrap();
        assert!(room.is_loaded());
        assert_eq!(room.id(), 37);
        assert_eq!(room.objects().len(), 1);
        assert_eq!(room.merge_type().name, "Translucent");
        assert_eq!(room.buffer(LayerType::Bg1Layout)[(0, 7)], 2);
        assert_eq!(room.buffer(LayerType::Bg1Layout).palette()[1], Color::from_rgb(31, 0, 0));
        // Tile 5 has no graphics.
        assert_eq!(room.buffer(LayerType::Bg2Layout).opaque_count(), 0);
    }

    #[test]
    fn description_rejects_bad_room() {
        let description = RoomDescription {
            room_id: ROOM_COUNT,
            ..RoomDescription::default()
        };
        assert!(matches!(description.build(), Err(Error::RoomOutOfRange { .. })));
        assert!(matches!(RoomDescription::from_json("{"), Err(Error::InvalidJson(_))));
        assert!(matches!(
            RoomDescription::from_path("/nonexistent/room.json"),
            Err(Error::Io(_))
        ));
    }

    #[test]
    fn room_feeds_compositor() {
        let mut room = Room::new(5);
        room.buffer_mut(LayerType::Bg1Objects).set_pixel(0, 0, 3);

        let mut manager = LayerManager::new();
        manager.set_blend_mode(LayerType::Bg1Objects, LayerBlendMode::Off);

        let mut output = PixelBuffer::default();
        Compositor::default().composite(&room, &manager, &mut output);
        assert_eq!(output[(0, 0)], 0);
    }
}
