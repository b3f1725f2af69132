// Copyright 2025 the Parley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Contracts for the outline rasterizer and shaping engine behind a face.

use crate::error::RasterizerError;
use crate::fixed::F26Dot6;
use crate::glyph::GlyphIndex;
use crate::style::Stroke;

/// Flags for [`OutlineRasterizer::load_glyph`].
#[derive(Copy, Clone, Default, PartialEq, Eq, Hash, Debug)]
pub struct LoadFlags {
    /// Use the auto-hinter even when the font carries its own hinting.
    pub force_autohint: bool,
    /// Hint for horizontal LCD sub-pixel rendering instead of grayscale.
    pub target_lcd: bool,
    /// Ignore embedded bitmap strikes and always load the outline.
    pub no_bitmap: bool,
}

impl LoadFlags {
    /// The flags a face uses to load glyphs for rasterization.
    pub fn for_rendering(subpixel: bool) -> Self {
        Self {
            force_autohint: true,
            target_lcd: subpixel,
            no_bitmap: true,
        }
    }
}

/// How a loaded outline is turned into pixels.
#[derive(Copy, Clone, Default, PartialEq, Eq, Hash, Debug)]
pub enum RenderMode {
    /// 8-bit antialiased coverage.
    #[default]
    Normal,
    /// 1-bit coverage.
    Mono,
    /// Horizontal LCD: three coverage samples per pixel, bitmap three times as wide.
    Lcd,
    /// Vertical LCD: three coverage samples per pixel, bitmap three times as tall.
    LcdVertical,
}

impl RenderMode {
    /// The mode matching a load target.
    pub fn for_target(subpixel: bool) -> Self {
        if subpixel { Self::Lcd } else { Self::Normal }
    }
}

/// Pixel format of a [`RasterBitmap`], as the rasterizer reports it.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub enum NativePixelFormat {
    /// No pixels.
    None,
    /// 1 bit per pixel, most significant bit first.
    Mono,
    /// 8 bits per pixel.
    Gray,
    /// 2 bits per pixel, most significant pair first.
    Gray2,
    /// 4 bits per pixel, high nibble first.
    Gray4,
    /// 8 bits per sample, three horizontal samples per pixel.
    Lcd,
    /// 8 bits per sample, three vertical samples per pixel.
    LcdVertical,
    /// 32-bit premultiplied BGRA.
    Bgra,
    /// A format this crate does not know about.
    Other(u8),
}

/// A rendered glyph bitmap, rows stored top-down.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct RasterBitmap {
    /// Width in samples (three times the pixel width for [`NativePixelFormat::Lcd`]).
    pub width: u32,
    /// Number of rows.
    pub rows: u32,
    /// Bytes per row.
    pub pitch: usize,
    /// Sample format.
    pub format: NativePixelFormat,
    /// `rows * pitch` bytes.
    pub buffer: Vec<u8>,
}

impl RasterBitmap {
    /// An empty bitmap of the given format.
    pub fn empty(format: NativePixelFormat) -> Self {
        Self {
            width: 0,
            rows: 0,
            pitch: 0,
            format,
            buffer: Vec::new(),
        }
    }

    /// Bytes one row needs to hold `width` samples in this format.
    pub fn min_pitch(&self) -> usize {
        let width = self.width as usize;
        match self.format {
            NativePixelFormat::Mono => width.div_ceil(8),
            NativePixelFormat::Gray2 => width.div_ceil(4),
            NativePixelFormat::Gray4 => width.div_ceil(2),
            NativePixelFormat::Bgra => width * 4,
            _ => width,
        }
    }

    /// Returns `true` if every row fits in its pitch and every row is in the buffer.
    pub fn is_well_formed(&self) -> bool {
        self.pitch >= self.min_pitch()
            && self
                .pitch
                .checked_mul(self.rows as usize)
                .is_some_and(|len| self.buffer.len() >= len)
    }

    /// The bytes of row `y`.
    ///
    /// Panics if the row is outside the buffer; see [`RasterBitmap::is_well_formed`].
    pub fn row(&self, y: u32) -> &[u8] {
        let start = y as usize * self.pitch;
        &self.buffer[start..start + self.pitch]
    }
}

/// Metrics of the glyph currently loaded into the rasterizer, in 26.6.
#[derive(Copy, Clone, Default, PartialEq, Eq, Debug)]
pub struct GlyphSlotMetrics {
    /// Width of the outline bounding box.
    pub width: F26Dot6,
    /// Height of the outline bounding box.
    pub height: F26Dot6,
    /// Distance from the pen position to the left edge of the bounding box.
    pub bearing_x: F26Dot6,
    /// Distance from the baseline to the top of the bounding box (y up).
    pub bearing_y: F26Dot6,
    /// Horizontal advance.
    pub advance: F26Dot6,
}

/// Metrics of the rasterizer's active size, in 26.6 except for the ppem values.
#[derive(Copy, Clone, Default, PartialEq, Eq, Debug)]
pub struct SizeMetrics {
    /// Horizontal pixels per em.
    pub x_ppem: u16,
    /// Vertical pixels per em.
    pub y_ppem: u16,
    /// Distance from the baseline to the top of the line (positive).
    pub ascender: F26Dot6,
    /// Distance from the baseline to the bottom of the line (negative).
    pub descender: F26Dot6,
    /// Baseline-to-baseline distance.
    pub height: F26Dot6,
    /// Largest horizontal advance of any glyph.
    pub max_advance: F26Dot6,
}

/// One embedded bitmap strike.
#[derive(Copy, Clone, Default, PartialEq, Eq, Debug)]
pub struct FixedStrike {
    /// Nominal width in pixels.
    pub width: i16,
    /// Nominal height in pixels.
    pub height: i16,
    /// Nominal size of the strike.
    pub size: F26Dot6,
}

/// A character map encoding offered by a face.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub enum CharmapEncoding {
    /// Unicode (any platform).
    Unicode,
    /// Symbol fonts.
    Symbol,
    /// Anything else.
    Other,
}

/// Handle to one face of an outline font rasterizer (the role FreeType plays).
///
/// The handle is stateful: [`set_char_size`](Self::set_char_size) or
/// [`select_fixed_size`](Self::select_fixed_size) choose the active size, and
/// [`load_glyph`](Self::load_glyph) fills a glyph slot that the following
/// [`render_glyph`](Self::render_glyph) or [`stroke_glyph`](Self::stroke_glyph) call
/// consumes.
pub trait OutlineRasterizer {
    /// Whether the face has scalable outlines. Faces without are bitmap-strike fonts.
    fn is_scalable(&self) -> bool;

    /// Whether the face carries pair kerning data.
    fn has_kerning(&self) -> bool;

    /// The face's own style name, such as `"Bold Italic"`.
    fn style_name(&self) -> &str;

    /// Embedded bitmap strikes, in font order.
    fn fixed_strikes(&self) -> &[FixedStrike];

    /// Encodings of the character maps the face offers.
    fn charmaps(&self) -> &[CharmapEncoding];

    /// Makes the character map with the given encoding active.
    fn select_charmap(&mut self, encoding: CharmapEncoding) -> Result<(), RasterizerError>;

    /// Sets the active size from a point size at the given resolution.
    fn set_char_size(
        &mut self,
        point_size: F26Dot6,
        dpi_x: u32,
        dpi_y: u32,
    ) -> Result<(), RasterizerError>;

    /// Makes the fixed strike at `index` the active size.
    fn select_fixed_size(&mut self, index: usize) -> Result<(), RasterizerError>;

    /// Metrics of the active size.
    fn size_metrics(&self) -> SizeMetrics;

    /// Underline thickness at the active size, for scalable faces.
    fn underline_thickness(&self) -> Option<F26Dot6>;

    /// Glyph index for a code point through the active character map, `0` if missing.
    fn char_index(&self, code_point: u32) -> GlyphIndex;

    /// Unfitted horizontal kerning between two glyphs at the active size.
    fn kerning(&self, left: GlyphIndex, right: GlyphIndex) -> Result<F26Dot6, RasterizerError>;

    /// Horizontal advance of a glyph at the active size.
    fn advance(&mut self, glyph: GlyphIndex, flags: LoadFlags) -> Result<F26Dot6, RasterizerError>;

    /// Loads a glyph outline into the glyph slot.
    fn load_glyph(
        &mut self,
        glyph: GlyphIndex,
        flags: LoadFlags,
    ) -> Result<GlyphSlotMetrics, RasterizerError>;

    /// Rasterizes the loaded outline.
    fn render_glyph(&mut self, mode: RenderMode) -> Result<RasterBitmap, RasterizerError>;

    /// Strokes the loaded outline and rasterizes the stroke.
    ///
    /// Outline strokers take the radius and miter limit in 26.6, see
    /// [`Stroke::radius_26_6`] and [`Stroke::miter_limit_26_6`].
    fn stroke_glyph(
        &mut self,
        stroke: &Stroke,
        mode: RenderMode,
    ) -> Result<RasterBitmap, RasterizerError>;
}

/// Handle to the shaping engine's font object (the role a HarfBuzz font plays).
pub trait ShapingFont {
    /// Sets the scale, in 26.6 device pixels per em, for each axis.
    fn set_scale(&mut self, x_scale: i32, y_scale: i32);
}

/// Font callbacks a shaping engine calls back into while shaping.
///
/// [`FontFace`](crate::FontFace) implements this, so a shaper holding a
/// `&mut dyn ShapingFontFuncs` gets kerning and advances from the face's caches.
pub trait ShapingFontFuncs {
    /// Horizontal kerning between two glyphs, in 26.6.
    fn glyph_h_kerning(&mut self, first: GlyphIndex, second: GlyphIndex) -> i32;

    /// Horizontal advance of a glyph, in 26.6.
    fn glyph_h_advance(&mut self, glyph: GlyphIndex) -> i32;
}
