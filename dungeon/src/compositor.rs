//! Merges the four room layers into one displayable buffer.
//!
//! # Strategies
//!
//! [`CompositeStrategy::BackToFront`] walks the layers in hardware draw order
//! (BG2 layout, BG2 objects, BG1 layout, BG1 objects) and lets each opaque
//! pixel land through the layer's blend rule. Per-tile priority is already
//! baked into the buffers when tiles are drawn, so this is the default.
//!
//! [`CompositeStrategy::Priority`] resolves BG1 against BG2 per pixel using the
//! priority bit of the tile that drew it:
//!
//! | Background | Priority | Rank      |
//! |------------|----------|-----------|
//! | BG2        | 0        | 0 (back)  |
//! | BG1        | 0        | 1         |
//! | BG2        | 1        | 2         |
//! | BG1        | 1        | 3 (front) |
//!
//! Within one background the objects part always covers the layout part.
//!
//! # Indexed blending
//!
//! Buffers hold palette indices, not RGB, so blend modes can't mix colors.
//! [`IndexedBlendPolicy`] decides per pixel whether a source index replaces the
//! destination; [`ThresholdBlend`] is the approximation used by the editor.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::layers::{LayerBlendMode, LayerManager, LayerType};
use crate::pixel_buffer::{BACKDROP, PRIORITY_UNSET, PixelBuffer, ROOM_SIZE, TRANSPARENT};

/// Anything holding the four room layer buffers.
pub trait LayerSource {
    fn layer(&self, layer: LayerType) -> &PixelBuffer;
}

impl LayerSource for [PixelBuffer; 4] {
    fn layer(&self, layer: LayerType) -> &PixelBuffer {
        &self[layer.index()]
    }
}

/// Decides how a source palette index lands on the output.
pub trait IndexedBlendPolicy {
    /// Value to store for an opaque `src` pixel, or `None` to keep the
    /// destination. `dst` is `None` where no layer has drawn yet.
    fn blend(&self, mode: LayerBlendMode, alpha: u8, src: u8, dst: Option<u8>) -> Option<u8>;
}

/// Alpha a translucent layer must exceed to cover pixels already drawn.
pub const TRANSLUCENT_THRESHOLD: u8 = 180;

/// Overwrite-or-keep approximation of the hardware blend modes.
///
/// * Normal, Additive, Dark: overwrite. Additive would need RGB values and
///   Dark is applied later as a surface brightness.
/// * Translucent: overwrite only where nothing is drawn yet, or when the
///   layer alpha is above [`TRANSLUCENT_THRESHOLD`].
/// * Off: never drawn.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ThresholdBlend;

impl IndexedBlendPolicy for ThresholdBlend {
    fn blend(&self, mode: LayerBlendMode, alpha: u8, src: u8, dst: Option<u8>) -> Option<u8> {
        match mode {
            LayerBlendMode::Normal | LayerBlendMode::Additive | LayerBlendMode::Dark => Some(src),
            LayerBlendMode::Translucent => {
                (dst.is_none() || alpha > TRANSLUCENT_THRESHOLD).then_some(src)
            }
            LayerBlendMode::Off => None,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompositeStrategy {
    #[default]
    BackToFront,
    Priority,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CompositeStats {
    /// Layers that contributed to the output.
    pub layers_drawn: usize,
    /// Output pixels covered by some layer.
    pub opaque_pixels: usize,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Compositor {
    pub strategy: CompositeStrategy,
}

impl Compositor {
    #[must_use]
    pub const fn new(strategy: CompositeStrategy) -> Self {
        Self { strategy }
    }

    /// Composites with the [`ThresholdBlend`] policy.
    pub fn composite<S>(&self, layers: &S, manager: &LayerManager, output: &mut PixelBuffer) -> CompositeStats
    where
        S: LayerSource + ?Sized,
    {
        self.composite_with(layers, manager, &ThresholdBlend, output)
    }

    /// Merges `layers` into `output`.
    ///
    /// `output` is resized to a room layer if needed and cleared to
    /// [`BACKDROP`]. Its priority plane records the priority bit of whatever
    /// landed on each pixel, unset where nothing did. Never fails: layers that
    /// aren't active room-sized buffers are skipped.
    pub fn composite_with<S, P>(
        &self,
        layers: &S,
        manager: &LayerManager,
        policy: &P,
        output: &mut PixelBuffer,
    ) -> CompositeStats
    where
        S: LayerSource + ?Sized,
        P: IndexedBlendPolicy + ?Sized,
    {
        output.reset(ROOM_SIZE, ROOM_SIZE, BACKDROP);

        let layers_drawn = match self.strategy {
            CompositeStrategy::BackToFront => back_to_front(layers, manager, policy, output),
            CompositeStrategy::Priority => by_priority(layers, manager, output),
        };

        output.copy_palette_from(palette_source(layers, manager));

        let surface = output.surface_mut();
        surface.color_key = Some(TRANSPARENT);
        surface.alpha_blend = true;
        surface.brightness = manager.surface_brightness();
        output.mark_modified();

        let opaque_pixels = output
            .priorities()
            .iter()
            .filter(|&&p| p != PRIORITY_UNSET)
            .count();

        CompositeStats {
            layers_drawn,
            opaque_pixels,
        }
    }
}

/// The buffer of an enabled layer, if the compositor can read it.
fn readable<'a, S>(layers: &'a S, manager: &LayerManager, layer: LayerType) -> Option<&'a PixelBuffer>
where
    S: LayerSource + ?Sized,
{
    if !manager.is_enabled(layer) {
        return None;
    }

    let buffer = layers.layer(layer);
    if !buffer.is_active() || !buffer.is_room_sized() {
        warn!(
            "skipping {}: active={} size={:?}",
            layer.name(),
            buffer.is_active(),
            buffer.dimensions()
        );
        return None;
    }

    Some(buffer)
}

fn back_to_front<S, P>(layers: &S, manager: &LayerManager, policy: &P, output: &mut PixelBuffer) -> usize
where
    S: LayerSource + ?Sized,
    P: IndexedBlendPolicy + ?Sized,
{
    let mut layers_drawn = 0;
    let (out_pixels, out_priority) = output.planes_mut();

    for layer in manager.draw_order() {
        let Some(source) = readable(layers, manager, layer) else {
            continue;
        };

        let mode = manager.blend_mode(layer);
        let alpha = manager.alpha(layer);

        for (index, &src) in source.pixels().iter().enumerate() {
            if src == TRANSPARENT {
                continue;
            }

            let dst = (out_priority[index] != PRIORITY_UNSET).then_some(out_pixels[index]);
            if let Some(value) = policy.blend(mode, alpha, src, dst) {
                out_pixels[index] = value;
                out_priority[index] = source.priority_bit(index);
            }
        }

        layers_drawn += 1;
    }

    layers_drawn
}

/// One background seen through its layout and objects parts.
struct Background<'a> {
    layout: Option<&'a PixelBuffer>,
    objects: Option<&'a PixelBuffer>,
    bg1: bool,
}

impl<'a> Background<'a> {
    fn new<S>(layers: &'a S, manager: &LayerManager, layout: LayerType, objects: LayerType) -> Self
    where
        S: LayerSource + ?Sized,
    {
        Self {
            layout: readable(layers, manager, layout),
            objects: readable(layers, manager, objects),
            bg1: layout.is_bg1(),
        }
    }

    fn layer_count(&self) -> usize {
        usize::from(self.layout.is_some()) + usize::from(self.objects.is_some())
    }

    /// Pixel and rank at `index`, objects covering layout.
    fn sample(&self, index: usize) -> Option<(u8, u8)> {
        [self.objects, self.layout]
            .into_iter()
            .flatten()
            .find_map(|buffer| {
                let pixel = buffer.pixels()[index];
                (pixel != TRANSPARENT).then(|| (pixel, buffer.priority_bit(index)))
            })
            .map(|(pixel, priority)| (pixel, self.rank(priority)))
    }

    const fn rank(&self, priority: u8) -> u8 {
        priority * 2 + if self.bg1 { 1 } else { 0 }
    }
}

fn by_priority<S>(layers: &S, manager: &LayerManager, output: &mut PixelBuffer) -> usize
where
    S: LayerSource + ?Sized,
{
    let bg1 = Background::new(layers, manager, LayerType::Bg1Layout, LayerType::Bg1Objects);
    let bg2 = Background::new(layers, manager, LayerType::Bg2Layout, LayerType::Bg2Objects);
    let (out_pixels, out_priority) = output.planes_mut();

    for index in 0..out_pixels.len() {
        let winner = match (bg2.sample(index), bg1.sample(index)) {
            (None, None) => continue,
            (Some(back), None) => back,
            (None, Some(front)) => front,
            // Ranks of the two backgrounds never tie.
            (Some(back), Some(front)) => {
                if front.1 > back.1 {
                    front
                } else {
                    back
                }
            }
        };

        out_pixels[index] = winner.0;
        out_priority[index] = winner.1 / 2;
    }

    bg1.layer_count() + bg2.layer_count()
}

/// First enabled layer in draw order with an active palette, falling back to
/// BG1 layout so the output always gets one.
fn palette_source<'a, S>(layers: &'a S, manager: &LayerManager) -> &'a PixelBuffer
where
    S: LayerSource + ?Sized,
{
    manager
        .draw_order()
        .into_iter()
        .filter(|&layer| manager.is_enabled(layer))
        .map(|layer| layers.layer(layer))
        .find(|buffer| buffer.is_active() && !buffer.palette().is_empty())
        .unwrap_or_else(|| layers.layer(LayerType::Bg1Layout))
}
