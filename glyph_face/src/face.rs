// Copyright 2025 the Parley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A single sized face of a font family and everything cached for it.

use core::fmt;

use log::{debug, error, trace, warn};

use crate::atlas::{GlyphAtlas, TextureDataFormat, TextureSampling};
use crate::bitmap::{PixelMode, embolden};
use crate::error::{Error, GlyphError, RasterizerError};
use crate::fallback::{FallbackLink, FontManager};
use crate::fixed::F26Dot6;
use crate::glyph::{
    GlyphCache, GlyphIndex, GlyphMetrics, GlyphRecord, REPLACEMENT_CHARACTER, RasterizedGlyph,
    RenderContext, RenderPass, invalid_glyph_texels, store_bitmap,
};
use crate::kerning::KerningCache;
use crate::metrics::{
    AdvanceCache, FaceKind, FaceMetrics, RealizedSize, SizeRequest, point_size, realize_size,
    underline_position, underline_thickness,
};
use crate::pack::SUBPIXEL_CHANNELS;
use crate::rasterizer::{LoadFlags, OutlineRasterizer, RenderMode, ShapingFont, ShapingFontFuncs};
use crate::style::{Dpi, FontSize, FontStyle, KerningMethod, Stroke};

/// Identifier a font manager assigns to a face.
#[derive(Copy, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct FontId(pub u32);

/// What a font manager asks for when it creates a [`FontFace`].
#[derive(Clone, PartialEq, Debug)]
pub struct FaceDescriptor {
    /// Identifier of the face.
    pub id: FontId,
    /// Family name of the owning logical font.
    pub family_name: String,
    /// Requested style flags.
    pub style: FontStyle,
    /// Requested size.
    pub size: FontSize,
    /// Stroke for outline glyphs. A zero radius disables them.
    pub outline: Stroke,
    /// Resolution of the target surface.
    pub dpi: Dpi,
}

impl FaceDescriptor {
    /// A regular, unstroked face at the default resolution.
    pub fn new(id: FontId, family_name: impl Into<String>, size: FontSize) -> Self {
        Self {
            id,
            family_name: family_name.into(),
            style: FontStyle::NORMAL,
            size,
            outline: Stroke::default(),
            dpi: Dpi::default(),
        }
    }
}

/// Rendering options of a [`FontFace`].
#[derive(Copy, Clone, PartialEq, Debug)]
pub struct FaceOptions {
    /// Rasterize for horizontal LCD sub-pixel filtering instead of grayscale.
    pub subpixel_rendering: bool,
    /// Horizontal dilation, in device pixels, applied to emulated bold glyphs.
    pub embolden_scale: f64,
    /// Initial kerning method.
    pub kerning_method: KerningMethod,
}

impl Default for FaceOptions {
    fn default() -> Self {
        Self {
            subpixel_rendering: true,
            embolden_scale: 1.0,
            kerning_method: KerningMethod::Shaping,
        }
    }
}

/// One concrete face (family, style, size and stroke) bound to a rasterizer handle.
///
/// The face computes its realized metrics once, when it is created. Glyphs, kerning
/// pairs and advances are cached on first use and never evicted. The face owns its
/// rasterizer and shaping handles and its fallback face; the glyph pixels live in the
/// [`GlyphAtlas`] passed to [`glyph`](Self::glyph).
pub struct FontFace {
    id: FontId,
    family_name: String,
    style: FontStyle,
    style_name: String,
    size: f64,
    outline: Stroke,
    dpi: Dpi,
    options: FaceOptions,
    kind: FaceKind,
    has_kerning: bool,
    realized: RealizedSize,
    rasterizer: Box<dyn OutlineRasterizer>,
    shaping: Option<Box<dyn ShapingFont>>,
    kerning: KerningCache,
    kerning_enabled: bool,
    advances: AdvanceCache,
    glyphs: GlyphCache,
    fallback: FallbackLink,
}

impl FontFace {
    /// Creates a face and sizes the rasterizer for it.
    ///
    /// Fails with [`ErrorKind::InvalidDpi`](crate::ErrorKind::InvalidDpi) for a
    /// non-positive resolution, with
    /// [`ErrorKind::BadFixedSizeIndex`](crate::ErrorKind::BadFixedSizeIndex) for a
    /// bitmap-strike face without strikes, and with
    /// [`ErrorKind::Rasterizer`](crate::ErrorKind::Rasterizer) when the rasterizer rejects
    /// the size or character map.
    pub fn new(
        descriptor: FaceDescriptor,
        mut rasterizer: Box<dyn OutlineRasterizer>,
        mut shaping: Option<Box<dyn ShapingFont>>,
        options: FaceOptions,
    ) -> Result<Self, Error> {
        let FaceDescriptor {
            id,
            family_name,
            style,
            size,
            outline,
            dpi,
        } = descriptor;
        if !dpi.is_valid() {
            return Err(Error::invalid_dpi());
        }
        let style_name = match emulated_style_name(style) {
            Some(name) => name.to_owned(),
            None => rasterizer.style_name().to_owned(),
        };
        let size = size.to_signed();
        let kind = FaceKind::of(&*rasterizer);
        let request = SizeRequest::new(size, style, dpi);
        let realized = realize_size(&mut *rasterizer, kind, request, dpi)?;
        if let Some(shaping) = shaping.as_deref_mut() {
            let (x_scale, y_scale) = realized.shaping_scale(dpi);
            shaping.set_scale(x_scale, y_scale);
        }
        debug!(
            "created face {family_name} {style_name} at {size} ({kind:?}, correction {})",
            realized.correction
        );
        let has_kerning = rasterizer.has_kerning();
        Ok(Self {
            id,
            family_name,
            style,
            style_name,
            size,
            outline,
            dpi,
            options,
            kind,
            has_kerning,
            realized,
            rasterizer,
            shaping,
            kerning: KerningCache::new(options.kerning_method),
            kerning_enabled: true,
            advances: AdvanceCache::default(),
            glyphs: GlyphCache::default(),
            fallback: FallbackLink::default(),
        })
    }

    /// Identifier of the face.
    pub fn id(&self) -> FontId {
        self.id
    }

    /// Family name of the owning logical font.
    pub fn family_name(&self) -> &str {
        &self.family_name
    }

    /// Requested style flags.
    pub fn style(&self) -> FontStyle {
        self.style
    }

    /// The font's style name, or a synthesized one for emulated styles.
    pub fn style_name(&self) -> &str {
        &self.style_name
    }

    /// Size in points, whether the face was requested by point size or pixel height.
    pub fn size(&self) -> f64 {
        point_size(self.size, self.dpi)
    }

    /// The size as requested.
    pub fn font_size(&self) -> FontSize {
        FontSize::from_signed(self.size)
    }

    /// Stroke used for outline glyphs.
    pub fn outline(&self) -> &Stroke {
        &self.outline
    }

    /// Resolution of the target surface.
    pub fn dpi(&self) -> Dpi {
        self.dpi
    }

    /// Horizontal resolution.
    pub fn horizontal_dpi(&self) -> f64 {
        self.dpi.x
    }

    /// Vertical resolution.
    pub fn vertical_dpi(&self) -> f64 {
        self.dpi.y
    }

    /// Rendering options.
    pub fn options(&self) -> &FaceOptions {
        &self.options
    }

    /// Realized line metrics.
    pub fn metrics(&self) -> &FaceMetrics {
        &self.realized.metrics
    }

    /// Pixels per em along each axis.
    pub fn em_size(&self) -> (f64, f64) {
        let metrics = &self.realized.metrics;
        (metrics.em_width, metrics.em_height)
    }

    /// Baseline-to-baseline distance in device pixels.
    pub fn height(&self) -> f64 {
        self.realized.metrics.height
    }

    /// Baseline to top of the line in device pixels.
    pub fn ascender(&self) -> f64 {
        self.realized.metrics.ascender
    }

    /// Baseline to bottom of the line in device pixels (negative).
    pub fn descender(&self) -> f64 {
        self.realized.metrics.descender
    }

    /// Largest advance of any glyph in device pixels.
    pub fn max_advance(&self) -> f64 {
        self.realized.metrics.max_advance
    }

    /// Extra spacing between lines. Always zero.
    pub fn line_spacing(&self) -> f64 {
        0.0
    }

    /// Ratio applied to the point size so that a requested pixel height is met.
    pub fn size_correction(&self) -> f64 {
        self.realized.correction
    }

    /// Underline thickness in whole device pixels.
    pub fn underline_thickness(&self) -> f64 {
        underline_thickness(
            self.kind,
            self.rasterizer.underline_thickness(),
            &self.style_name,
            self.size(),
        )
    }

    /// Underline position relative to the baseline, derived from its thickness.
    pub fn underline_position(&self) -> f64 {
        underline_position(self.underline_thickness())
    }

    /// Whether the face consists of bitmap strikes only.
    pub fn is_bitmap_font(&self) -> bool {
        self.kind == FaceKind::BitmapStrike
    }

    /// Number of embedded bitmap strikes.
    pub fn num_fixed_sizes(&self) -> usize {
        self.rasterizer.fixed_strikes().len()
    }

    /// Nominal size of the strike at `index`, in points.
    pub fn fixed_size(&self, index: usize) -> Result<f64, Error> {
        self.rasterizer
            .fixed_strikes()
            .get(index)
            .map(|strike| strike.size.to_f64())
            .ok_or_else(|| Error::bad_fixed_size_index(index))
    }

    /// The strike selected for a bitmap-strike face.
    pub fn selected_fixed_size(&self) -> Option<usize> {
        self.realized.strike
    }

    /// The rasterizer handle.
    pub fn rasterizer(&self) -> &dyn OutlineRasterizer {
        &*self.rasterizer
    }

    /// The shaping font handle, scaled to this face's size.
    pub fn shaping_font(&self) -> Option<&dyn ShapingFont> {
        self.shaping.as_deref()
    }

    /// Glyph index for a code point, `GlyphIndex(0)` when the face lacks it.
    pub fn glyph_index(&self, code_point: u32) -> GlyphIndex {
        self.rasterizer.char_index(code_point)
    }

    /// The active kerning method.
    pub fn kerning_method(&self) -> KerningMethod {
        self.kerning.method()
    }

    /// Switches the kerning method, dropping all memoized pairs.
    pub fn set_kerning_method(&mut self, method: KerningMethod) {
        trace!("kerning method {:?} -> {method:?}", self.kerning.method());
        self.kerning.set_method(method);
    }

    /// Whether the shaping callbacks report kerning.
    pub fn kerning_enabled(&self) -> bool {
        self.kerning_enabled
    }

    /// Turns kerning in the shaping callbacks on or off.
    ///
    /// [`kerning`](Self::kerning) itself is unaffected.
    pub fn set_kerning_enabled(&mut self, enabled: bool) {
        self.kerning_enabled = enabled;
    }

    /// Horizontal kerning between two glyphs, in device pixels.
    ///
    /// Zero for faces without kerning data and when kerning is disabled. Pairs are
    /// memoized until the method changes.
    pub fn kerning(&mut self, left: GlyphIndex, right: GlyphIndex) -> Result<f64, Error> {
        if !self.has_kerning {
            return Ok(0.0);
        }
        if let Some(delta) = self.kerning.get(left, right) {
            return Ok(delta);
        }
        match self.kerning.method() {
            // Both methods read the font's pair table; they differ in who asks.
            KerningMethod::Table | KerningMethod::Shaping => {
                let delta = self.rasterizer.kerning(left, right)?.to_f64();
                Ok(self.kerning.insert(left, right, delta))
            }
            KerningMethod::Disabled => Ok(0.0),
        }
    }

    /// Number of memoized kerning pairs.
    pub fn cached_kerning_pairs(&self) -> usize {
        self.kerning.len()
    }

    /// Horizontal advance of a glyph, in device pixels.
    pub fn advance(&mut self, glyph: GlyphIndex) -> Result<f64, Error> {
        Ok(self.advance_26_6(glyph)?.to_f64())
    }

    fn advance_26_6(&mut self, glyph: GlyphIndex) -> Result<F26Dot6, Error> {
        let flags = LoadFlags::for_rendering(self.options.subpixel_rendering);
        let rasterizer = &mut self.rasterizer;
        Ok(self
            .advances
            .get_or_try_insert_with(glyph, || rasterizer.advance(glyph, flags))?)
    }

    /// Number of memoized advances.
    pub fn cached_advances(&self) -> usize {
        self.advances.len()
    }

    /// Returns the rasterized glyph, rendering and uploading it on first use.
    ///
    /// A glyph that fails to load or render is replaced by U+FFFD, and by the face's
    /// invalid glyph when U+FFFD is missing or fails too. Faces with a stroke also
    /// render the outline variant into [`GlyphRecord::outline_texture`]. Only atlas
    /// failures are reported as errors.
    pub fn glyph(
        &mut self,
        glyph: GlyphIndex,
        atlas: &mut dyn GlyphAtlas,
    ) -> Result<&GlyphRecord, Error> {
        let slot = self.render(glyph, &mut RenderContext::new(atlas))?;
        Ok(self.glyphs.record(slot))
    }

    /// The cached record of a glyph, without rendering it.
    pub fn glyph_cached(&self, glyph: GlyphIndex) -> Option<&GlyphRecord> {
        self.glyphs.slot(glyph).map(|slot| self.glyphs.record(slot))
    }

    /// Number of glyph indices with a cached record.
    pub fn cached_glyphs(&self) -> usize {
        self.glyphs.len()
    }

    /// The marker drawn in place of glyphs that cannot be rendered at all.
    ///
    /// Built once per face: an em wide, ascender tall sub-pixel box crossed by its
    /// diagonals.
    pub fn invalid_glyph(&mut self, atlas: &mut dyn GlyphAtlas) -> Result<&GlyphRecord, Error> {
        let slot = self.invalid_glyph_slot(atlas)?;
        Ok(self.glyphs.record(slot))
    }

    pub(crate) fn render(
        &mut self,
        glyph: GlyphIndex,
        cx: &mut RenderContext<'_>,
    ) -> Result<usize, Error> {
        let existing = self.glyphs.slot(glyph);
        debug_assert!(
            cx.pass == RenderPass::Normal || existing.is_some(),
            "outline pass for glyph {} without a cached glyph",
            glyph.0
        );
        match (cx.pass, existing) {
            (RenderPass::Normal, Some(slot)) => return Ok(slot),
            (RenderPass::Outline, None) => {
                error!("outline pass for glyph {} without a cached glyph", glyph.0);
                return self.invalid_glyph_slot(cx.atlas);
            }
            _ => {}
        }
        let RasterizedGlyph {
            mut bitmap,
            metrics,
        } = match self.rasterize(glyph, cx.pass) {
            Ok(rasterized) => rasterized,
            Err(err) => return self.recover(glyph, existing, err, cx),
        };
        if self.style.contains(FontStyle::EMULATED_BOLD) {
            // The strength is in device pixels at 96 dpi.
            let strength = self.options.embolden_scale * self.dpi.x / 96.0;
            embolden(&mut bitmap, F26Dot6::from_f64(strength));
        }
        let stored = store_bitmap(cx.atlas, &bitmap)?;
        let slot = match existing {
            // Only the outline pass gets here with a record.
            Some(slot) => {
                self.glyphs
                    .record_mut(slot)
                    .set_outline_texture(stored.texture);
                slot
            }
            None => self.glyphs.insert(
                glyph,
                GlyphRecord::new(stored.texture, stored.subpixel, metrics, stored.pixel_mode),
            ),
        };
        if cx.pass == RenderPass::Normal && self.outline.is_enabled() {
            self.render(glyph, &mut cx.outline())?;
        }
        Ok(slot)
    }

    fn rasterize(
        &mut self,
        glyph: GlyphIndex,
        pass: RenderPass,
    ) -> Result<RasterizedGlyph, GlyphError> {
        let subpixel = self.options.subpixel_rendering;
        let slot = self
            .rasterizer
            .load_glyph(glyph, LoadFlags::for_rendering(subpixel))
            .map_err(GlyphError::Load)?;
        let mode = RenderMode::for_target(subpixel);
        let bitmap = match pass {
            RenderPass::Normal => self.rasterizer.render_glyph(mode),
            RenderPass::Outline => self.rasterizer.stroke_glyph(&self.outline, mode),
        }
        .map_err(GlyphError::Render)?;
        if !bitmap.is_well_formed() {
            return Err(GlyphError::Render(RasterizerError::new(format!(
                "{}x{} bitmap with pitch {} does not fit its {} byte buffer",
                bitmap.width,
                bitmap.rows,
                bitmap.pitch,
                bitmap.buffer.len()
            ))));
        }
        Ok(RasterizedGlyph {
            bitmap,
            metrics: GlyphMetrics {
                width: slot.width.to_f64().round(),
                height: slot.height.to_f64().round(),
                bearing_x: slot.bearing_x.to_f64().round(),
                bearing_y: slot.bearing_y.to_f64().round(),
                advance: slot.advance.to_f64(),
            },
        })
    }

    fn recover(
        &mut self,
        glyph: GlyphIndex,
        existing: Option<usize>,
        err: GlyphError,
        cx: &mut RenderContext<'_>,
    ) -> Result<usize, Error> {
        if let (RenderPass::Outline, Some(slot)) = (cx.pass, existing) {
            debug!("glyph {}: no outline variant: {err}", glyph.0);
            return Ok(slot);
        }
        debug!("glyph {}: {err}", glyph.0);
        if !cx.substituting {
            let replacement = self.rasterizer.char_index(REPLACEMENT_CHARACTER);
            if replacement != GlyphIndex::NOTDEF {
                debug!(
                    "glyph {}: substituting U+FFFD (glyph {})",
                    glyph.0, replacement.0
                );
                return self.render(replacement, &mut cx.substitute());
            }
        }
        self.invalid_glyph_slot(cx.atlas)
    }

    fn invalid_glyph_slot(&mut self, atlas: &mut dyn GlyphAtlas) -> Result<usize, Error> {
        if let Some(slot) = self.glyphs.invalid_slot() {
            return Ok(slot);
        }
        let metrics = &self.realized.metrics;
        let width = texel_extent(metrics.em_width);
        let height = texel_extent(metrics.ascender);
        warn!(
            "{} {}: drawing invalid glyph ({width}x{height})",
            self.family_name, self.style_name
        );
        let texture = atlas.create_sub_texture(
            width,
            height,
            1.0,
            TextureSampling::Normal,
            TextureDataFormat::SubPixel,
        )?;
        if width != 0 && height != 0 {
            atlas.upload(
                &texture,
                &invalid_glyph_texels(width, height),
                SUBPIXEL_CHANNELS,
            )?;
        }
        let metrics = GlyphMetrics {
            width: f64::from(width),
            height: f64::from(height),
            bearing_x: 0.0,
            bearing_y: 0.0,
            advance: f64::from(width),
        };
        Ok(self.glyphs.set_invalid(GlyphRecord::new(
            texture,
            true,
            metrics,
            PixelMode::LcdHorizontal,
        )))
    }

    /// Whether the font manager has a fallback face for this face. Asked once.
    pub fn has_fallback(&self, fonts: &dyn FontManager) -> bool {
        self.fallback.is_available(self, fonts)
    }

    /// Whether the fallback face has been created.
    pub fn fallback_cached(&self) -> bool {
        self.fallback.is_cached()
    }

    /// The fallback face, created through `fonts` on first use.
    ///
    /// Fails with [`ErrorKind::NoFallbackFont`](crate::ErrorKind::NoFallbackFont) when
    /// the font manager has none.
    pub fn fallback(&mut self, fonts: &dyn FontManager) -> Result<&mut Self, Error> {
        if !self.has_fallback(fonts) {
            return Err(Error::no_fallback_font());
        }
        if !self.fallback.is_cached() {
            debug!(
                "creating fallback for {} {}",
                self.family_name, self.style_name
            );
            let face = fonts.create_fallback_font(self)?;
            return Ok(self.fallback.set(face));
        }
        self.fallback.get_mut().ok_or_else(Error::no_fallback_font)
    }
}

impl ShapingFontFuncs for FontFace {
    fn glyph_h_kerning(&mut self, first: GlyphIndex, second: GlyphIndex) -> i32 {
        if !self.kerning_enabled {
            return 0;
        }
        match self.kerning(first, second) {
            Ok(delta) => F26Dot6::from_f64(delta).to_bits(),
            Err(err) => {
                debug!("kerning {} {}: {err}", first.0, second.0);
                0
            }
        }
    }

    fn glyph_h_advance(&mut self, glyph: GlyphIndex) -> i32 {
        match self.advance_26_6(glyph) {
            Ok(advance) => advance.to_bits(),
            Err(err) => {
                debug!("advance {}: {err}", glyph.0);
                0
            }
        }
    }
}

impl fmt::Debug for FontFace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FontFace")
            .field("id", &self.id)
            .field("family_name", &self.family_name)
            .field("style", &self.style)
            .field("style_name", &self.style_name)
            .field("size", &self.size)
            .field("dpi", &self.dpi)
            .field("metrics", &self.realized.metrics)
            .field("cached_glyphs", &self.glyphs.len())
            .finish_non_exhaustive()
    }
}

fn emulated_style_name(style: FontStyle) -> Option<&'static str> {
    if style.contains(FontStyle::EMULATED_BOLD_ITALIC) {
        Some("Bold Italic (Emulated)")
    } else if style.contains(FontStyle::EMULATED_BOLD) {
        Some("Bold (Emulated)")
    } else if style.contains(FontStyle::EMULATED_ITALIC) {
        Some("Italic (Emulated)")
    } else {
        None
    }
}

#[expect(
    clippy::cast_possible_truncation,
    reason = "glyph boxes are far smaller than u32::MAX texels"
)]
fn texel_extent(pixels: f64) -> u32 {
    pixels.ceil().max(0.0) as u32
}
