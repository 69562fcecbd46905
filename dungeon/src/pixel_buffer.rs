//! Indexed-color layer buffers.
//!
//! A [`PixelBuffer`] holds one palette index per pixel and a parallel priority
//! array. Room layers are always [`ROOM_SIZE`]×[`ROOM_SIZE`] (64×64 tiles of
//! 8×8 pixels).
//!
//! # Transparency
//!
//! Only index [`TRANSPARENT`] (255) means "nothing drawn here". Index 0 is a
//! real, opaque color: tiles write `bank * 16 + index` and never write their
//! index 0, so a fresh buffer is filled with 255, not 0.
//!
//! # Priority
//!
//! Each pixel carries the priority bit of the tile that drew it: 0, 1, or
//! [`PRIORITY_UNSET`] when no tile has been drawn there. Unset reads as 0.

use serde::{Deserialize, Serialize};

use crate::bitwise::Bits;
use crate::color::Color;

/// Width and height of a room layer, in pixels.
pub const ROOM_SIZE: usize = 512;

/// Width and height of a tile, in pixels.
pub const TILE_SIZE: usize = 8;

/// Room layers are 64×64 tiles.
pub const ROOM_TILES: usize = ROOM_SIZE / TILE_SIZE;

/// Palette index reserved for "nothing drawn".
pub const TRANSPARENT: u8 = 255;

/// Priority value of a pixel no tile has touched.
pub const PRIORITY_UNSET: u8 = 0xFF;

/// Fill value of a composited output before any layer lands on it.
pub const BACKDROP: u8 = 0;

/// Display properties of a buffer once handed to the renderer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SurfaceState {
    /// Palette index rendered fully transparent, if any.
    pub color_key: Option<u8>,
    /// Whether the surface is alpha blended over what's below it.
    pub alpha_blend: bool,
    /// Color modulation applied to every channel, 255 = full brightness.
    pub brightness: u8,
}

impl Default for SurfaceState {
    fn default() -> Self {
        Self {
            color_key: None,
            alpha_blend: false,
            brightness: u8::MAX,
        }
    }
}

/// A 16-bit tilemap entry.
///
/// ```text
/// vhopppcc cccccccc
/// v: vertical flip, h: horizontal flip, o: priority,
/// p: palette bank, c: tile number
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileWord(pub u16);

impl TileWord {
    #[must_use]
    pub fn new(tile: u16, palette_bank: u8, priority: bool, h_flip: bool, v_flip: bool) -> Self {
        let word = (tile & 0x3FF) | (u16::from(palette_bank & 0x07) << 10);
        Self(word.with_bit(13, priority).with_bit(14, h_flip).with_bit(15, v_flip))
    }

    #[must_use]
    pub fn tile(self) -> u16 {
        self.0.get_bits(0..=9)
    }

    #[must_use]
    pub fn palette_bank(self) -> u8 {
        #[allow(clippy::cast_possible_truncation)]
        let bank = self.0.get_bits(10..=12) as u8;
        bank
    }

    #[must_use]
    pub fn priority(self) -> bool {
        self.0.get_bit(13)
    }

    #[must_use]
    pub fn h_flip(self) -> bool {
        self.0.get_bit(14)
    }

    #[must_use]
    pub fn v_flip(self) -> bool {
        self.0.get_bit(15)
    }
}

#[derive(Clone, Debug)]
pub struct PixelBuffer {
    width: usize,
    height: usize,
    pixels: Vec<u8>,
    priority: Vec<u8>,
    palette: Vec<Color>,
    active: bool,
    modified: bool,
    surface: SurfaceState,
}

impl Default for PixelBuffer {
    /// An unallocated, inactive buffer.
    fn default() -> Self {
        Self {
            width: 0,
            height: 0,
            pixels: Vec::new(),
            priority: Vec::new(),
            palette: Vec::new(),
            active: false,
            modified: false,
            surface: SurfaceState::default(),
        }
    }
}

impl PixelBuffer {
    /// An active buffer with every pixel transparent and every priority unset.
    #[must_use]
    pub fn new(width: usize, height: usize) -> Self {
        Self::filled(width, height, TRANSPARENT)
    }

    #[must_use]
    pub fn filled(width: usize, height: usize, value: u8) -> Self {
        Self {
            width,
            height,
            pixels: vec![value; width * height],
            priority: vec![PRIORITY_UNSET; width * height],
            active: true,
            ..Self::default()
        }
    }

    /// A transparent room layer.
    #[must_use]
    pub fn room() -> Self {
        Self::new(ROOM_SIZE, ROOM_SIZE)
    }

    #[must_use]
    pub const fn width(&self) -> usize {
        self.width
    }

    #[must_use]
    pub const fn height(&self) -> usize {
        self.height
    }

    #[must_use]
    pub const fn dimensions(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.pixels.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }

    /// Whether this is a full-size room layer the compositor can read.
    #[must_use]
    pub fn is_room_sized(&self) -> bool {
        self.dimensions() == (ROOM_SIZE, ROOM_SIZE) && self.pixels.len() == ROOM_SIZE * ROOM_SIZE
    }

    #[must_use]
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn pixels_mut(&mut self) -> &mut [u8] {
        &mut self.pixels
    }

    #[must_use]
    pub fn priorities(&self) -> &[u8] {
        &self.priority
    }

    pub fn priorities_mut(&mut self) -> &mut [u8] {
        &mut self.priority
    }

    /// Pixels and priorities borrowed mutably together.
    pub fn planes_mut(&mut self) -> (&mut [u8], &mut [u8]) {
        (&mut self.pixels, &mut self.priority)
    }

    /// Priority bit at a linear index, unset read as 0.
    #[must_use]
    pub fn priority_bit(&self, index: usize) -> u8 {
        match self.priority.get(index) {
            Some(1) => 1,
            _ => 0,
        }
    }

    #[must_use]
    pub const fn index(&self, x: usize, y: usize) -> usize {
        y * self.width + x
    }

    #[must_use]
    pub fn get(&self, x: usize, y: usize) -> Option<u8> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.pixels.get(self.index(x, y)).copied()
    }

    pub fn set_pixel(&mut self, x: usize, y: usize, value: u8) {
        self[(x, y)] = value;
    }

    pub fn set_priority(&mut self, x: usize, y: usize, priority: u8) {
        assert!(x < self.width && y < self.height);
        let index = self.index(x, y);
        self.priority[index] = priority;
    }

    /// Fills pixels with `value` and resets every priority to unset.
    pub fn clear(&mut self, value: u8) {
        self.pixels.fill(value);
        self.clear_priority();
    }

    pub fn clear_priority(&mut self) {
        self.priority.fill(PRIORITY_UNSET);
    }

    /// Resizes to the given dimensions when they differ, then clears.
    ///
    /// Reallocation only happens on a size change.
    pub fn reset(&mut self, width: usize, height: usize, value: u8) {
        if self.dimensions() != (width, height) || self.pixels.len() != width * height {
            self.width = width;
            self.height = height;
            self.pixels = vec![value; width * height];
            self.priority = vec![PRIORITY_UNSET; width * height];
        } else {
            self.clear(value);
        }
        self.active = true;
    }

    #[must_use]
    pub fn palette(&self) -> &[Color] {
        &self.palette
    }

    pub fn set_palette(&mut self, palette: Vec<Color>) {
        self.palette = palette;
    }

    pub fn copy_palette_from(&mut self, other: &Self) {
        self.palette.clone_from(&other.palette);
    }

    /// The palette as shown on screen, scaled by the surface brightness.
    #[must_use]
    pub fn display_palette(&self) -> Vec<Color> {
        self.palette
            .iter()
            .map(|color| color.modulate(self.surface.brightness))
            .collect()
    }

    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.active
    }

    pub fn set_active(&mut self, active: bool) {
        self.active = active;
    }

    #[must_use]
    pub const fn is_modified(&self) -> bool {
        self.modified
    }

    pub fn mark_modified(&mut self) {
        self.modified = true;
    }

    /// Returns the modified flag and clears it, for the texture upload side.
    pub fn take_modified(&mut self) -> bool {
        std::mem::take(&mut self.modified)
    }

    #[must_use]
    pub const fn surface(&self) -> &SurfaceState {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut SurfaceState {
        &mut self.surface
    }

    /// Number of pixels that aren't [`TRANSPARENT`].
    #[must_use]
    pub fn opaque_count(&self) -> usize {
        self.pixels.iter().filter(|&&p| p != TRANSPARENT).count()
    }

    /// Draws an 8×8 tile at tile coordinates `(tile_x, tile_y)`.
    ///
    /// `tile` holds the tile's 64 source indices (0-15), row major. Source index
    /// 0 is left undrawn; any other index lands as `bank * 16 + index`. The
    /// tile's priority bit is stored for all of its 64 cells.
    ///
    /// Returns `false` when the tile lies outside the buffer.
    pub fn draw_tile(&mut self, tile_x: usize, tile_y: usize, word: TileWord, tile: &[u8; 64]) -> bool {
        let (Some(origin_x), Some(origin_y)) = (tile_x.checked_mul(TILE_SIZE), tile_y.checked_mul(TILE_SIZE)) else {
            return false;
        };
        let fits = |origin: usize, limit: usize| origin.checked_add(TILE_SIZE).is_some_and(|end| end <= limit);
        if !fits(origin_x, self.width) || !fits(origin_y, self.height) {
            return false;
        }

        let bank = word.palette_bank();
        let priority = u8::from(word.priority());

        for py in 0..TILE_SIZE {
            let sy = if word.v_flip() { 7 - py } else { py };
            for px in 0..TILE_SIZE {
                let sx = if word.h_flip() { 7 - px } else { px };
                let index = self.index(origin_x + px, origin_y + py);

                self.priority[index] = priority;

                let source = tile[sy * TILE_SIZE + sx] & 0x0F;
                if source != 0 {
                    self.pixels[index] = bank * 16 + source;
                }
            }
        }

        self.active = true;
        self.modified = true;
        true
    }
}

impl std::ops::Index<(usize, usize)> for PixelBuffer {
    type Output = u8;

    fn index(&self, (x, y): (usize, usize)) -> &u8 {
        assert!(x < self.width && y < self.height);
        &self.pixels[y * self.width + x]
    }
}

impl std::ops::IndexMut<(usize, usize)> for PixelBuffer {
    fn index_mut(&mut self, (x, y): (usize, usize)) -> &mut Self::Output {
        assert!(x < self.width && y < self.height);
        &mut self.pixels[y * self.width + x]
    }
}
