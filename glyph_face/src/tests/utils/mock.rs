// Copyright 2025 the Parley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Scriptable collaborators that record how a face drives them.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use hashbrown::{HashMap, HashSet};

use crate::{
    CharmapEncoding, Error, FaceDescriptor, FaceOptions, FixedStrike, FontFace, FontId,
    FontManager, FontSize, GlyphAtlas, GlyphIndex, GlyphSlotMetrics, LoadFlags,
    NativePixelFormat, OutlineRasterizer, RasterBitmap, RasterizerError, RenderMode,
    ShapingFont, ShelfAtlas, ShelfAtlasConfig, SizeMetrics, Stroke, SubTexture,
    TextureDataFormat, TextureSampling, F26Dot6,
};

/// Width and height, in pixels, of every filled glyph the mock renders.
pub(crate) const GLYPH_WIDTH: u32 = 4;
pub(crate) const GLYPH_HEIGHT: u32 = 5;

/// Width and height, in pixels, of every stroked glyph the mock renders.
pub(crate) const OUTLINE_WIDTH: u32 = 6;
pub(crate) const OUTLINE_HEIGHT: u32 = 7;

/// Glyph index the mock maps U+FFFD to, unless told otherwise.
pub(crate) const REPLACEMENT_GLYPH: GlyphIndex = GlyphIndex(99);

/// Everything a [`MockRasterizer`] was asked to do.
#[derive(Clone, Debug, Default)]
pub(crate) struct RasterizerCalls {
    pub(crate) set_char_size: Vec<(F26Dot6, u32, u32)>,
    pub(crate) select_fixed_size: Vec<usize>,
    pub(crate) select_charmap: Vec<CharmapEncoding>,
    pub(crate) kerning: Vec<(GlyphIndex, GlyphIndex)>,
    pub(crate) advance: Vec<GlyphIndex>,
    pub(crate) load: Vec<(GlyphIndex, LoadFlags)>,
    pub(crate) render: Vec<RenderMode>,
    pub(crate) stroke: Vec<(F26Dot6, RenderMode)>,
}

/// An [`OutlineRasterizer`] with scripted answers.
///
/// At a given size the em is `ppem` pixels, the ascender `0.75 em`, the descender
/// `-0.25 em` and the line height `height_ratio em`.
#[derive(Clone, Debug)]
pub(crate) struct MockRasterizer {
    pub(crate) calls: Rc<RefCell<RasterizerCalls>>,
    pub(crate) scalable: bool,
    pub(crate) has_kerning: bool,
    pub(crate) style_name: String,
    pub(crate) strikes: Vec<FixedStrike>,
    pub(crate) charmaps: Vec<CharmapEncoding>,
    pub(crate) height_ratio: f64,
    pub(crate) underline_thickness: Option<F26Dot6>,
    pub(crate) kerning_pairs: HashMap<(GlyphIndex, GlyphIndex), F26Dot6>,
    pub(crate) cmap: HashMap<u32, GlyphIndex>,
    pub(crate) failing_loads: HashSet<GlyphIndex>,
    pub(crate) failing_renders: HashSet<GlyphIndex>,
    pub(crate) failing_strokes: bool,
    pub(crate) truncated_renders: HashSet<GlyphIndex>,
    pub(crate) format: NativePixelFormat,
    pub(crate) size: SizeMetrics,
    pub(crate) loaded: Option<GlyphIndex>,
}

impl Default for MockRasterizer {
    fn default() -> Self {
        Self {
            calls: Rc::default(),
            scalable: true,
            has_kerning: true,
            style_name: "Regular".to_owned(),
            strikes: Vec::new(),
            charmaps: vec![CharmapEncoding::Symbol, CharmapEncoding::Unicode],
            height_ratio: 1.0,
            underline_thickness: Some(F26Dot6::from_f64(1.0)),
            kerning_pairs: HashMap::new(),
            cmap: [
                ('A' as u32, GlyphIndex(1)),
                ('V' as u32, GlyphIndex(2)),
                (0xFFFD, REPLACEMENT_GLYPH),
            ]
            .into_iter()
            .collect(),
            failing_loads: HashSet::new(),
            failing_renders: HashSet::new(),
            failing_strokes: false,
            truncated_renders: HashSet::new(),
            format: NativePixelFormat::Lcd,
            size: SizeMetrics::default(),
            loaded: None,
        }
    }
}

impl MockRasterizer {
    /// A bitmap-strike face with strikes of the given pixel sizes.
    #[expect(clippy::cast_possible_truncation, reason = "small test sizes")]
    pub(crate) fn with_strikes(sizes: &[f64]) -> Self {
        Self {
            scalable: false,
            underline_thickness: None,
            strikes: sizes
                .iter()
                .map(|&size| FixedStrike {
                    width: size as i16,
                    height: size as i16,
                    size: F26Dot6::from_f64(size),
                })
                .collect(),
            ..Self::default()
        }
    }

    /// Shares the call log, for inspection after the rasterizer moved into a face.
    pub(crate) fn calls(&self) -> Rc<RefCell<RasterizerCalls>> {
        self.calls.clone()
    }

    #[expect(clippy::cast_possible_truncation, reason = "small test sizes")]
    fn set_ppem(&mut self, x_ppem: f64, y_ppem: f64) {
        self.size = SizeMetrics {
            x_ppem: x_ppem.round() as u16,
            y_ppem: y_ppem.round() as u16,
            ascender: F26Dot6::from_f64(y_ppem * 0.75),
            descender: F26Dot6::from_f64(-y_ppem * 0.25),
            height: F26Dot6::from_f64(y_ppem * self.height_ratio),
            max_advance: F26Dot6::from_f64(x_ppem),
        };
    }

    fn bitmap(&self, width: u32, rows: u32) -> RasterBitmap {
        let samples = match self.format {
            NativePixelFormat::Lcd => width * 3,
            _ => width,
        };
        let pitch = match self.format {
            NativePixelFormat::Mono => samples.div_ceil(8) as usize,
            NativePixelFormat::Bgra => samples as usize * 4,
            _ => samples as usize,
        };
        RasterBitmap {
            width: samples,
            rows,
            pitch,
            format: self.format,
            buffer: vec![0xFF; pitch * rows as usize],
        }
    }

    fn loaded(&self) -> Result<GlyphIndex, RasterizerError> {
        self.loaded
            .ok_or_else(|| RasterizerError::new("nothing loaded"))
    }
}

impl OutlineRasterizer for MockRasterizer {
    fn is_scalable(&self) -> bool {
        self.scalable
    }

    fn has_kerning(&self) -> bool {
        self.has_kerning
    }

    fn style_name(&self) -> &str {
        &self.style_name
    }

    fn fixed_strikes(&self) -> &[FixedStrike] {
        &self.strikes
    }

    fn charmaps(&self) -> &[CharmapEncoding] {
        &self.charmaps
    }

    fn select_charmap(&mut self, encoding: CharmapEncoding) -> Result<(), RasterizerError> {
        self.calls.borrow_mut().select_charmap.push(encoding);
        Ok(())
    }

    fn set_char_size(
        &mut self,
        point_size: F26Dot6,
        dpi_x: u32,
        dpi_y: u32,
    ) -> Result<(), RasterizerError> {
        self.calls
            .borrow_mut()
            .set_char_size
            .push((point_size, dpi_x, dpi_y));
        let points = point_size.to_f64();
        self.set_ppem(
            points * f64::from(dpi_x) / 72.0,
            points * f64::from(dpi_y) / 72.0,
        );
        Ok(())
    }

    fn select_fixed_size(&mut self, index: usize) -> Result<(), RasterizerError> {
        self.calls.borrow_mut().select_fixed_size.push(index);
        let size = self
            .strikes
            .get(index)
            .ok_or_else(|| RasterizerError::new("bad strike"))?
            .size
            .to_f64();
        self.set_ppem(size, size);
        Ok(())
    }

    fn size_metrics(&self) -> SizeMetrics {
        self.size
    }

    fn underline_thickness(&self) -> Option<F26Dot6> {
        self.underline_thickness
    }

    fn char_index(&self, code_point: u32) -> GlyphIndex {
        self.cmap
            .get(&code_point)
            .copied()
            .unwrap_or(GlyphIndex::NOTDEF)
    }

    fn kerning(&self, left: GlyphIndex, right: GlyphIndex) -> Result<F26Dot6, RasterizerError> {
        self.calls.borrow_mut().kerning.push((left, right));
        Ok(self
            .kerning_pairs
            .get(&(left, right))
            .copied()
            .unwrap_or_default())
    }

    fn advance(
        &mut self,
        glyph: GlyphIndex,
        _flags: LoadFlags,
    ) -> Result<F26Dot6, RasterizerError> {
        self.calls.borrow_mut().advance.push(glyph);
        Ok(F26Dot6::from_f64(5.5))
    }

    fn load_glyph(
        &mut self,
        glyph: GlyphIndex,
        flags: LoadFlags,
    ) -> Result<GlyphSlotMetrics, RasterizerError> {
        self.calls.borrow_mut().load.push((glyph, flags));
        self.loaded = None;
        if self.failing_loads.contains(&glyph) {
            return Err(RasterizerError::new("load failed"));
        }
        self.loaded = Some(glyph);
        Ok(GlyphSlotMetrics {
            width: F26Dot6::from_f64(4.4),
            height: F26Dot6::from_f64(4.6),
            bearing_x: F26Dot6::from_f64(0.5),
            bearing_y: F26Dot6::from_f64(5.2),
            advance: F26Dot6::from_f64(5.5),
        })
    }

    fn render_glyph(&mut self, mode: RenderMode) -> Result<RasterBitmap, RasterizerError> {
        self.calls.borrow_mut().render.push(mode);
        let glyph = self.loaded()?;
        if self.failing_renders.contains(&glyph) {
            return Err(RasterizerError::new("render failed"));
        }
        let mut bitmap = self.bitmap(GLYPH_WIDTH, GLYPH_HEIGHT);
        if self.truncated_renders.contains(&glyph) {
            // Rows claim more bytes than the buffer holds.
            bitmap.pitch = 2;
            bitmap.buffer.truncate(2);
            bitmap.rows = 1;
        }
        Ok(bitmap)
    }

    fn stroke_glyph(
        &mut self,
        stroke: &Stroke,
        mode: RenderMode,
    ) -> Result<RasterBitmap, RasterizerError> {
        self.calls
            .borrow_mut()
            .stroke
            .push((stroke.radius_26_6(), mode));
        self.loaded()?;
        if self.failing_strokes {
            return Err(RasterizerError::new("stroke failed"));
        }
        Ok(self.bitmap(OUTLINE_WIDTH, OUTLINE_HEIGHT))
    }
}

/// A [`ShapingFont`] that remembers the last scale it was given.
#[derive(Clone, Debug, Default)]
pub(crate) struct MockShaping {
    pub(crate) scale: Rc<Cell<Option<(i32, i32)>>>,
}

impl ShapingFont for MockShaping {
    fn set_scale(&mut self, x_scale: i32, y_scale: i32) {
        self.scale.set(Some((x_scale, y_scale)));
    }
}

/// One sub-texture request seen by a [`RecordingAtlas`].
#[derive(Copy, Clone, PartialEq, Debug)]
pub(crate) struct AllocationRequest {
    pub(crate) width: u32,
    pub(crate) height: u32,
    pub(crate) format: TextureDataFormat,
}

/// A [`ShelfAtlas`] that logs allocations and uploads.
#[derive(Debug, Default)]
pub(crate) struct RecordingAtlas {
    pub(crate) atlas: ShelfAtlas,
    pub(crate) allocations: Vec<AllocationRequest>,
    pub(crate) uploads: Vec<(SubTexture, u8)>,
}

impl RecordingAtlas {
    pub(crate) fn with_config(config: ShelfAtlasConfig) -> Self {
        Self {
            atlas: ShelfAtlas::new(config),
            ..Self::default()
        }
    }
}

impl GlyphAtlas for RecordingAtlas {
    fn create_sub_texture(
        &mut self,
        width: u32,
        height: u32,
        scale: f32,
        sampling: TextureSampling,
        format: TextureDataFormat,
    ) -> Result<SubTexture, Error> {
        self.allocations.push(AllocationRequest {
            width,
            height,
            format,
        });
        self.atlas
            .create_sub_texture(width, height, scale, sampling, format)
    }

    fn upload(
        &mut self,
        sub_texture: &SubTexture,
        data: &[u8],
        channels: u8,
    ) -> Result<(), Error> {
        self.uploads.push((*sub_texture, channels));
        self.atlas.upload(sub_texture, data, channels)
    }
}

/// A [`FontManager`] that counts how often it is consulted.
#[derive(Debug, Default)]
pub(crate) struct MockFontManager {
    pub(crate) available: bool,
    pub(crate) queries: Cell<usize>,
    pub(crate) created: Cell<usize>,
}

impl MockFontManager {
    pub(crate) fn new(available: bool) -> Self {
        Self {
            available,
            ..Self::default()
        }
    }
}

impl FontManager for MockFontManager {
    fn has_fallback_font(&self, _face: &FontFace) -> bool {
        self.queries.set(self.queries.get() + 1);
        self.available
    }

    fn create_fallback_font(&self, face: &FontFace) -> Result<FontFace, Error> {
        self.created.set(self.created.get() + 1);
        let descriptor = FaceDescriptor {
            id: FontId(face.id().0 + 1000),
            family_name: "Fallback".to_owned(),
            dpi: face.dpi(),
            ..FaceDescriptor::new(face.id(), face.family_name(), FontSize::Points(face.size()))
        };
        FontFace::new(
            descriptor,
            Box::new(MockRasterizer::default()),
            None,
            FaceOptions::default(),
        )
    }
}
