// Copyright 2025 the Parley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Cached glyph records and their upload into a [`GlyphAtlas`].

use hashbrown::HashMap;

use crate::atlas::{GlyphAtlas, SubTexture, TextureDataFormat, TextureSampling};
use crate::bitmap::PixelMode;
use crate::error::Error;
use crate::pack::{SINGLE_CHANNEL, SUBPIXEL_CHANNELS, pack_single_channel, pack_subpixel};
use crate::rasterizer::RasterBitmap;

/// Code point substituted for glyphs that fail to rasterize.
pub const REPLACEMENT_CHARACTER: u32 = 0xFFFD;

/// Index of a glyph within a face. Index `0` is the face's missing glyph.
#[derive(Copy, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct GlyphIndex(pub u32);

impl GlyphIndex {
    /// The face's missing glyph.
    pub const NOTDEF: Self = Self(0);
}

/// Placement metrics of a cached glyph, in device pixels.
#[derive(Copy, Clone, Default, PartialEq, Debug)]
pub struct GlyphMetrics {
    /// Width of the glyph's bounding box, rounded.
    pub width: f64,
    /// Height of the glyph's bounding box, rounded.
    pub height: f64,
    /// Pen position to left edge, rounded.
    pub bearing_x: f64,
    /// Baseline to top edge (y up), rounded.
    pub bearing_y: f64,
    /// Horizontal advance, unrounded.
    pub advance: f64,
}

/// A glyph rasterized into the atlas.
#[derive(Copy, Clone, PartialEq, Debug)]
pub struct GlyphRecord {
    texture: SubTexture,
    subpixel: bool,
    metrics: GlyphMetrics,
    pixel_mode: PixelMode,
    outline_texture: Option<SubTexture>,
}

impl GlyphRecord {
    pub(crate) fn new(
        texture: SubTexture,
        subpixel: bool,
        metrics: GlyphMetrics,
        pixel_mode: PixelMode,
    ) -> Self {
        Self {
            texture,
            subpixel,
            metrics,
            pixel_mode,
            outline_texture: None,
        }
    }

    /// Where the glyph's texels live.
    pub fn texture(&self) -> &SubTexture {
        &self.texture
    }

    /// Whether the texture holds sub-pixel coverage.
    pub fn is_subpixel(&self) -> bool {
        self.subpixel
    }

    /// Placement metrics.
    pub fn metrics(&self) -> &GlyphMetrics {
        &self.metrics
    }

    /// Pixel layout the rasterizer produced.
    pub fn pixel_mode(&self) -> PixelMode {
        self.pixel_mode
    }

    /// The stroked variant, for faces with a non-zero stroke radius.
    pub fn outline_texture(&self) -> Option<&SubTexture> {
        self.outline_texture.as_ref()
    }

    pub(crate) fn set_outline_texture(&mut self, texture: SubTexture) {
        self.outline_texture = Some(texture);
    }
}

/// Which variant of a glyph a render request produces.
#[derive(Copy, Clone, Default, PartialEq, Eq, Debug)]
pub(crate) enum RenderPass {
    /// The filled glyph, creating the cache record.
    #[default]
    Normal,
    /// The stroked glyph, attached to an existing record.
    Outline,
}

/// Transient state of one glyph request.
///
/// Replaces ambient per-thread flags: the pass and the substitution guard travel with
/// the request instead.
pub(crate) struct RenderContext<'a> {
    pub(crate) atlas: &'a mut dyn GlyphAtlas,
    pub(crate) pass: RenderPass,
    /// Set while rendering U+FFFD in place of a failed glyph.
    pub(crate) substituting: bool,
}

impl<'a> RenderContext<'a> {
    pub(crate) fn new(atlas: &'a mut dyn GlyphAtlas) -> Self {
        Self {
            atlas,
            pass: RenderPass::Normal,
            substituting: false,
        }
    }

    pub(crate) fn outline(&mut self) -> RenderContext<'_> {
        RenderContext {
            atlas: &mut *self.atlas,
            pass: RenderPass::Outline,
            substituting: self.substituting,
        }
    }

    pub(crate) fn substitute(&mut self) -> RenderContext<'_> {
        RenderContext {
            atlas: &mut *self.atlas,
            pass: self.pass,
            substituting: true,
        }
    }
}

/// A successfully rasterized glyph, before it reaches the atlas.
#[derive(Clone, Debug)]
pub(crate) struct RasterizedGlyph {
    pub(crate) bitmap: RasterBitmap,
    pub(crate) metrics: GlyphMetrics,
}

/// A bitmap stored in the atlas.
pub(crate) struct StoredBitmap {
    pub(crate) texture: SubTexture,
    pub(crate) pixel_mode: PixelMode,
    pub(crate) subpixel: bool,
}

/// Allocates a sub-texture for `bitmap`, packs it and uploads it.
///
/// Only horizontal LCD bitmaps are packed as sub-pixel texels; everything else becomes
/// single channel coverage.
pub(crate) fn store_bitmap(
    atlas: &mut dyn GlyphAtlas,
    bitmap: &RasterBitmap,
) -> Result<StoredBitmap, Error> {
    let pixel_mode = PixelMode::classify(bitmap.format);
    let subpixel = pixel_mode.is_subpixel();
    let (width, format, channels) = if subpixel {
        (
            bitmap.width.div_ceil(3),
            TextureDataFormat::SubPixel,
            SUBPIXEL_CHANNELS,
        )
    } else {
        (bitmap.width, TextureDataFormat::Red, SINGLE_CHANNEL)
    };
    let height = bitmap.rows;
    let texture =
        atlas.create_sub_texture(width, height, 1.0, TextureSampling::Normal, format)?;
    if width != 0 && height != 0 {
        let texels = if subpixel {
            pack_subpixel(bitmap, width, height)
        } else {
            pack_single_channel(bitmap, width, height)
        };
        atlas.upload(&texture, &texels, channels)?;
    }
    Ok(StoredBitmap {
        texture,
        pixel_mode,
        subpixel,
    })
}

/// Builds the marker drawn for glyphs that cannot be rendered at all: a hollow box
/// inset by one texel, crossed by both diagonals, in white sub-pixel texels.
pub(crate) fn invalid_glyph_texels(width: u32, height: u32) -> Vec<u8> {
    const WHITE: [u8; 4] = [0xFF; 4];
    let stride = width as usize;
    let mut texels = vec![[0_u8; 4]; stride * height as usize];
    if width < 3 || height < 3 {
        return texels.into_flattened();
    }
    let (left, top, right, bottom) = (1, 1, width as usize - 2, height as usize - 2);
    let mut plot = |x: usize, y: usize| texels[y * stride + x] = WHITE;
    for x in left..=right {
        plot(x, top);
        plot(x, bottom);
    }
    for y in top..=bottom {
        plot(left, y);
        plot(right, y);
    }
    for (x, y) in line(left, top, right, bottom) {
        plot(x, y);
    }
    for (x, y) in line(right, top, left, bottom) {
        plot(x, y);
    }
    texels.into_flattened()
}

/// Points of a Bresenham line between two texels, both ends included.
fn line(x0: usize, y0: usize, x1: usize, y1: usize) -> impl Iterator<Item = (usize, usize)> {
    let (x0, y0, x1, y1) = (x0 as isize, y0 as isize, x1 as isize, y1 as isize);
    let dx = (x1 - x0).abs();
    let dy = -(y1 - y0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut state = Some((x0, y0, dx + dy));
    core::iter::from_fn(move || {
        let (x, y, err) = state?;
        state = if x == x1 && y == y1 {
            None
        } else {
            let (mut nx, mut ny, mut nerr) = (x, y, err);
            if 2 * err >= dy {
                nerr += dy;
                nx += sx;
            }
            if 2 * err <= dx {
                nerr += dx;
                ny += sy;
            }
            Some((nx, ny, nerr))
        };
        Some((x as usize, y as usize))
    })
}

/// Per-face store of glyph records, keyed by glyph index.
///
/// Records are never evicted. Lookups hand out slot numbers so that a caller can keep
/// rendering (and inserting) before borrowing the final record. The invalid glyph
/// occupies a slot of its own that no glyph index maps to.
#[derive(Clone, Debug, Default)]
pub(crate) struct GlyphCache {
    records: Vec<GlyphRecord>,
    slots: HashMap<GlyphIndex, usize>,
    invalid: Option<usize>,
}

impl GlyphCache {
    pub(crate) fn slot(&self, glyph: GlyphIndex) -> Option<usize> {
        self.slots.get(&glyph).copied()
    }

    pub(crate) fn insert(&mut self, glyph: GlyphIndex, record: GlyphRecord) -> usize {
        let slot = self.push(record);
        self.slots.insert(glyph, slot);
        slot
    }

    pub(crate) fn record(&self, slot: usize) -> &GlyphRecord {
        &self.records[slot]
    }

    pub(crate) fn record_mut(&mut self, slot: usize) -> &mut GlyphRecord {
        &mut self.records[slot]
    }

    pub(crate) fn invalid_slot(&self) -> Option<usize> {
        self.invalid
    }

    pub(crate) fn set_invalid(&mut self, record: GlyphRecord) -> usize {
        let slot = self.push(record);
        self.invalid = Some(slot);
        slot
    }

    /// Number of glyph indices with a record.
    pub(crate) fn len(&self) -> usize {
        self.slots.len()
    }

    fn push(&mut self, record: GlyphRecord) -> usize {
        self.records.push(record);
        self.records.len() - 1
    }
}
