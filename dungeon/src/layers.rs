//! Layer visibility and blend state for a room view.
//!
//! Dungeon rooms render through two hardware backgrounds, each split into a
//! *layout* part (floor and walls from the room layout) and an *objects* part
//! (tiles drawn by placed objects):
//!
//! | Layer        | Background | Content                         |
//! |--------------|------------|---------------------------------|
//! | BG1 Layout   | BG1        | Layout tiles                    |
//! | BG1 Objects  | BG1        | Objects on layers 0 and 2       |
//! | BG2 Layout   | BG2        | Layout tiles                    |
//! | BG2 Objects  | BG2        | Objects on layer 1              |
//!
//! BG1 is in front of BG2. That order is fixed by the hardware; a room's
//! merge type only changes how the layers blend, never the order they're
//! drawn in.

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LayerType {
    Bg1Layout,
    Bg1Objects,
    Bg2Layout,
    Bg2Objects,
}

impl LayerType {
    pub const ALL: [Self; 4] = [
        Self::Bg1Layout,
        Self::Bg1Objects,
        Self::Bg2Layout,
        Self::Bg2Objects,
    ];

    /// Back to front.
    pub const DRAW_ORDER: [Self; 4] = [
        Self::Bg2Layout,
        Self::Bg2Objects,
        Self::Bg1Layout,
        Self::Bg1Objects,
    ];

    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Bg1Layout => "BG1 Layout",
            Self::Bg1Objects => "BG1 Objects",
            Self::Bg2Layout => "BG2 Layout",
            Self::Bg2Objects => "BG2 Objects",
        }
    }

    #[must_use]
    pub const fn is_bg1(self) -> bool {
        matches!(self, Self::Bg1Layout | Self::Bg1Objects)
    }

    /// Object layer 1 draws into BG2; layers 0 and 2 draw into BG1.
    #[must_use]
    pub const fn for_object_layer(object_layer: u8) -> Self {
        if is_object_on_bg2(object_layer) {
            Self::Bg2Objects
        } else {
            Self::Bg1Objects
        }
    }
}

#[must_use]
pub const fn is_object_on_bg2(object_layer: u8) -> bool {
    object_layer == 1
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LayerBlendMode {
    #[default]
    Normal,
    Translucent,
    Additive,
    Dark,
    Off,
}

impl LayerBlendMode {
    pub const ALL: [Self; 5] = [
        Self::Normal,
        Self::Translucent,
        Self::Additive,
        Self::Dark,
        Self::Off,
    ];

    /// Indexed-color stand-in for the mode's opacity.
    #[must_use]
    pub const fn alpha(self) -> u8 {
        match self {
            Self::Normal => 255,
            Self::Translucent => 180,
            Self::Additive => 220,
            Self::Dark => 120,
            Self::Off => 0,
        }
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Normal => "Normal",
            Self::Translucent => "Translucent",
            Self::Additive => "Addition",
            Self::Dark => "Dark",
            Self::Off => "Off",
        }
    }
}

/// A room's layer merge setting, as authored in the room header.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct MergeType {
    pub id: u8,
    pub name: &'static str,
    /// BG2 takes part in sub-screen color math.
    pub color_math: bool,
    /// BG2 blends translucently over BG1.
    pub translucent: bool,
    /// BG2 is expected to be shown. Informational only, the view decides.
    pub bg2_visible: bool,
}

/// Merge type that darkens BG1 and the final surface.
pub const DARK_ROOM_MERGE_ID: u8 = 0x08;

const fn merge(
    id: u8,
    name: &'static str,
    bg2_visible: bool,
    color_math: bool,
    translucent: bool,
) -> MergeType {
    MergeType {
        id,
        name,
        color_math,
        translucent,
        bg2_visible,
    }
}

pub static MERGE_TYPES: [MergeType; 9] = [
    merge(0x00, "Off", true, false, false),
    merge(0x01, "Parallax", true, false, false),
    merge(0x02, "Dark", true, true, true),
    merge(0x03, "On top", false, true, false),
    merge(0x04, "Translucent", true, true, true),
    merge(0x05, "Addition", true, true, true),
    merge(0x06, "Normal", true, false, false),
    merge(0x07, "Transparent", true, true, true),
    merge(DARK_ROOM_MERGE_ID, "Dark room", true, true, true),
];

impl MergeType {
    #[must_use]
    pub fn from_id(id: u8) -> Option<&'static Self> {
        MERGE_TYPES.get(usize::from(id))
    }

    #[must_use]
    pub const fn is_dark_room(&self) -> bool {
        self.id == DARK_ROOM_MERGE_ID
    }
}

impl Default for MergeType {
    fn default() -> Self {
        MERGE_TYPES[0]
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ObjectTranslucency {
    pub object_index: usize,
    pub translucent: bool,
    pub alpha: u8,
}

/// Default alpha of an object marked translucent.
pub const DEFAULT_OBJECT_ALPHA: u8 = 128;

/// Visibility, blend mode and merge state of the four room layers.
///
/// Visibility is the user's choice and is never touched by
/// [`apply_merge`](Self::apply_merge). Blend modes follow the room's merge
/// type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LayerManager {
    visible: [bool; 4],
    blend_mode: [LayerBlendMode; 4],
    alpha: [u8; 4],
    object_translucency: Vec<ObjectTranslucency>,
    color_math: bool,
    layers_merged: bool,
    merge_type_id: u8,
}

impl Default for LayerManager {
    fn default() -> Self {
        Self {
            visible: [true; 4],
            blend_mode: [LayerBlendMode::Normal; 4],
            alpha: [LayerBlendMode::Normal.alpha(); 4],
            object_translucency: Vec::new(),
            color_math: false,
            layers_merged: false,
            merge_type_id: 0,
        }
    }
}

impl LayerManager {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Back to all visible, normal blend, no merge.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn set_visible(&mut self, layer: LayerType, visible: bool) {
        self.visible[layer.index()] = visible;
    }

    #[must_use]
    pub const fn is_visible(&self, layer: LayerType) -> bool {
        self.visible[layer.index()]
    }

    pub fn set_blend_mode(&mut self, layer: LayerType, mode: LayerBlendMode) {
        self.blend_mode[layer.index()] = mode;
        self.alpha[layer.index()] = mode.alpha();
    }

    #[must_use]
    pub const fn blend_mode(&self, layer: LayerType) -> LayerBlendMode {
        self.blend_mode[layer.index()]
    }

    #[must_use]
    pub const fn alpha(&self, layer: LayerType) -> u8 {
        self.alpha[layer.index()]
    }

    /// Visible and not switched off.
    #[must_use]
    pub fn is_enabled(&self, layer: LayerType) -> bool {
        self.is_visible(layer) && self.blend_mode(layer) != LayerBlendMode::Off
    }

    /// Applies a room merge type to the blend modes.
    pub fn apply_merge(&mut self, merge: &MergeType) {
        self.merge_type_id = merge.id;
        self.layers_merged = merge.id != 0;
        self.color_math = merge.color_math;

        let bg2_mode = if merge.translucent {
            LayerBlendMode::Translucent
        } else {
            LayerBlendMode::Normal
        };
        self.set_blend_mode(LayerType::Bg2Layout, bg2_mode);
        self.set_blend_mode(LayerType::Bg2Objects, bg2_mode);

        let bg1_mode = if merge.is_dark_room() {
            LayerBlendMode::Dark
        } else {
            LayerBlendMode::Normal
        };
        self.set_blend_mode(LayerType::Bg1Layout, bg1_mode);
        self.set_blend_mode(LayerType::Bg1Objects, bg1_mode);
    }

    /// Same as [`apply_merge`](Self::apply_merge), keeping the user's
    /// visibility toggles across ROM driven updates.
    pub fn apply_merge_preserve_visibility(&mut self, merge: &MergeType) {
        let visible = self.visible;
        self.apply_merge(merge);
        self.visible = visible;
    }

    #[must_use]
    pub const fn draw_order(&self) -> [LayerType; 4] {
        LayerType::DRAW_ORDER
    }

    #[must_use]
    pub const fn color_math(&self) -> bool {
        self.color_math
    }

    pub fn set_color_math(&mut self, enabled: bool) {
        self.color_math = enabled;
    }

    #[must_use]
    pub const fn layers_merged(&self) -> bool {
        self.layers_merged
    }

    #[must_use]
    pub const fn merge_type_id(&self) -> u8 {
        self.merge_type_id
    }

    #[must_use]
    pub const fn is_dark_room(&self) -> bool {
        self.merge_type_id == DARK_ROOM_MERGE_ID
    }

    /// Color modulation for the room surfaces: half brightness in dark rooms.
    #[must_use]
    pub const fn surface_brightness(&self) -> u8 {
        if self.is_dark_room() { 128 } else { 255 }
    }

    pub fn set_object_translucency(&mut self, object_index: usize, translucent: bool, alpha: u8) {
        if let Some(entry) = self
            .object_translucency
            .iter_mut()
            .find(|entry| entry.object_index == object_index)
        {
            entry.translucent = translucent;
            entry.alpha = alpha;
            return;
        }

        self.object_translucency.push(ObjectTranslucency {
            object_index,
            translucent,
            alpha,
        });
    }

    #[must_use]
    pub fn is_object_translucent(&self, object_index: usize) -> bool {
        self.object_translucency
            .iter()
            .any(|entry| entry.object_index == object_index && entry.translucent)
    }

    /// 255 unless the object is marked translucent.
    #[must_use]
    pub fn object_alpha(&self, object_index: usize) -> u8 {
        self.object_translucency
            .iter()
            .find(|entry| entry.object_index == object_index && entry.translucent)
            .map_or(u8::MAX, |entry| entry.alpha)
    }

    pub fn clear_object_translucency(&mut self) {
        self.object_translucency.clear();
    }
}
