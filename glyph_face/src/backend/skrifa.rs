// Copyright 2025 the Parley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! An [`OutlineRasterizer`] over Skrifa outlines, rasterized with Zeno.
//!
//! Outlines are hinted with Skrifa's auto-hinter and filled (or stroked) into coverage
//! masks by Zeno. Only outline glyphs are supported: embedded bitmap strikes are
//! reported so that sizes can be selected, but their glyphs fail to load, which makes a
//! face fall back to U+FFFD or the invalid glyph.

use std::sync::Arc;

use skrifa::instance::{LocationRef, Size};
use skrifa::outline::{
    DrawSettings, Engine, HintingInstance, HintingOptions, OutlinePen, SmoothMode, Target,
};
use skrifa::raw::TableProvider;
use skrifa::raw::tables::kern::SubtableKind;
use skrifa::string::StringId;
use skrifa::{FontRef, GlyphId, MetadataProvider};
use smallvec::SmallVec;
use swash::zeno::{self, Command, Format, Mask, Vector};

use crate::error::RasterizerError;
use crate::fixed::F26Dot6;
use crate::glyph::GlyphIndex;
use crate::rasterizer::{
    CharmapEncoding, FixedStrike, GlyphSlotMetrics, LoadFlags, NativePixelFormat,
    OutlineRasterizer, RasterBitmap, RenderMode, SizeMetrics,
};
use crate::style::{LineCap, LineJoin, Stroke};

/// An [`OutlineRasterizer`] for one face of a font file.
pub struct SkrifaRasterizer {
    data: Arc<[u8]>,
    index: u32,
    style_name: String,
    scalable: bool,
    units_per_em: u16,
    strikes: SmallVec<[FixedStrike; 4]>,
    charmaps: SmallVec<[CharmapEncoding; 1]>,
    has_kern: bool,
    /// Horizontal pixels per em.
    x_ppem: f32,
    /// Vertical pixels per em; outlines are hinted at this size.
    ppem: f32,
    size_metrics: SizeMetrics,
    underline_thickness: Option<F26Dot6>,
    hinting: Option<(bool, HintingInstance)>,
    path: Vec<Command>,
    loaded: Option<GlyphIndex>,
}

impl SkrifaRasterizer {
    /// Opens face `index` of a font file (`0` for single-face files).
    pub fn new(data: impl Into<Arc<[u8]>>, index: u32) -> Result<Self, RasterizerError> {
        let data = data.into();
        let font = font_ref(&data, index)?;
        let style_name = font
            .localized_strings(StringId::SUBFAMILY_NAME)
            .english_or_first()
            .map(|name| name.to_string())
            .unwrap_or_default();
        let scalable = font.outline_glyphs().format().is_some();
        let units_per_em = font.head().map(|head| head.units_per_em()).unwrap_or(1000);
        let strikes = font
            .bitmap_strikes()
            .iter()
            .map(|strike| strike_size(strike.ppem()))
            .collect();
        let mut charmaps = SmallVec::new();
        if font.cmap().is_ok() {
            charmaps.push(CharmapEncoding::Unicode);
        }
        let has_kern = font
            .kern()
            .is_ok_and(|kern| kern.subtables().next().is_some());
        Ok(Self {
            data,
            index,
            style_name,
            scalable,
            units_per_em,
            strikes,
            charmaps,
            has_kern,
            x_ppem: 0.0,
            ppem: 0.0,
            size_metrics: SizeMetrics::default(),
            underline_thickness: None,
            hinting: None,
            path: Vec::new(),
            loaded: None,
        })
    }

    fn apply_ppem(&mut self, x_ppem: f32, ppem: f32) -> Result<(), RasterizerError> {
        let font = font_ref(&self.data, self.index)?;
        let metrics = font.metrics(Size::new(ppem), LocationRef::default());
        let max_width = font
            .metrics(Size::new(x_ppem), LocationRef::default())
            .max_width
            .unwrap_or(0.0);
        let ascender = F26Dot6::from_f64_rounded(f64::from(metrics.ascent)).ceil();
        let descender = F26Dot6::from_f64_rounded(f64::from(metrics.descent)).floor();
        let height = F26Dot6::from_f64_rounded(f64::from(
            metrics.ascent - metrics.descent + metrics.leading,
        ))
        .round();
        self.size_metrics = SizeMetrics {
            x_ppem: rounded_u16(x_ppem),
            y_ppem: rounded_u16(ppem),
            ascender,
            descender,
            height,
            max_advance: F26Dot6::from_f64_rounded(f64::from(max_width)).round(),
        };
        self.underline_thickness = metrics
            .underline
            .map(|decoration| F26Dot6::from_f64_rounded(f64::from(decoration.thickness)));
        self.x_ppem = x_ppem;
        self.ppem = ppem;
        self.hinting = None;
        self.loaded = None;
        Ok(())
    }
}

impl core::fmt::Debug for SkrifaRasterizer {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SkrifaRasterizer")
            .field("index", &self.index)
            .field("style_name", &self.style_name)
            .field("scalable", &self.scalable)
            .field("x_ppem", &self.x_ppem)
            .field("ppem", &self.ppem)
            .finish_non_exhaustive()
    }
}

impl OutlineRasterizer for SkrifaRasterizer {
    fn is_scalable(&self) -> bool {
        self.scalable
    }

    fn has_kerning(&self) -> bool {
        self.has_kern
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
        if self.charmaps.contains(&encoding) {
            Ok(())
        } else {
            Err(RasterizerError::new(format!(
                "no {encoding:?} character map"
            )))
        }
    }

    #[expect(
        clippy::cast_possible_truncation,
        reason = "pixels per em fit easily in f32"
    )]
    fn set_char_size(
        &mut self,
        point_size: F26Dot6,
        dpi_x: u32,
        dpi_y: u32,
    ) -> Result<(), RasterizerError> {
        if point_size.to_bits() <= 0 || dpi_x == 0 || dpi_y == 0 {
            return Err(RasterizerError::new("invalid character size"));
        }
        let points = point_size.to_f64();
        let x_ppem = points * f64::from(dpi_x) / 72.0;
        let y_ppem = points * f64::from(dpi_y) / 72.0;
        self.apply_ppem(x_ppem as f32, y_ppem as f32)
    }

    #[expect(
        clippy::cast_possible_truncation,
        reason = "strike sizes fit easily in f32"
    )]
    fn select_fixed_size(&mut self, index: usize) -> Result<(), RasterizerError> {
        let strike = self
            .strikes
            .get(index)
            .copied()
            .ok_or_else(|| RasterizerError::new(format!("no strike {index}")))?;
        let ppem = strike.size.to_f64() as f32;
        self.apply_ppem(ppem, ppem)
    }

    fn size_metrics(&self) -> SizeMetrics {
        self.size_metrics
    }

    fn underline_thickness(&self) -> Option<F26Dot6> {
        self.underline_thickness
    }

    fn char_index(&self, code_point: u32) -> GlyphIndex {
        font_ref(&self.data, self.index)
            .ok()
            .and_then(|font| font.charmap().map(code_point))
            .map_or(GlyphIndex::NOTDEF, |glyph| GlyphIndex(glyph.to_u32()))
    }

    fn kerning(&self, left: GlyphIndex, right: GlyphIndex) -> Result<F26Dot6, RasterizerError> {
        if !self.has_kern {
            return Ok(F26Dot6::ZERO);
        }
        let font = font_ref(&self.data, self.index)?;
        let kern = font
            .kern()
            .map_err(|e| RasterizerError::new(e.to_string()))?;
        let (left, right) = (GlyphId::new(left.0), GlyphId::new(right.0));
        let mut value = 0_i32;
        for subtable in kern.subtables() {
            let subtable = subtable.map_err(|e| RasterizerError::new(e.to_string()))?;
            // Only plain horizontal pair adjustments move the pen along the line.
            if !subtable.is_horizontal() || subtable.is_cross_stream() || subtable.is_variable() {
                continue;
            }
            let adjustment = match subtable.kind() {
                Ok(SubtableKind::Format0(table)) => table.kerning(left, right),
                Ok(SubtableKind::Format2(table)) => table.kerning(left, right),
                Ok(SubtableKind::Format3(table)) => table.kerning(left, right),
                Ok(SubtableKind::Format1(_)) | Err(_) => None,
            };
            value += adjustment.unwrap_or(0);
        }
        let scale = f64::from(self.x_ppem) / f64::from(self.units_per_em.max(1));
        Ok(F26Dot6::from_f64_rounded(f64::from(value) * scale))
    }

    fn advance(
        &mut self,
        glyph: GlyphIndex,
        _flags: LoadFlags,
    ) -> Result<F26Dot6, RasterizerError> {
        let font = font_ref(&self.data, self.index)?;
        font.glyph_metrics(Size::new(self.x_ppem), LocationRef::default())
            .advance_width(GlyphId::new(glyph.0))
            .map(|advance| F26Dot6::from_f64_rounded(f64::from(advance)))
            .ok_or_else(|| RasterizerError::new(format!("no advance for glyph {}", glyph.0)))
    }

    fn load_glyph(
        &mut self,
        glyph: GlyphIndex,
        flags: LoadFlags,
    ) -> Result<GlyphSlotMetrics, RasterizerError> {
        self.loaded = None;
        let font = font_ref(&self.data, self.index)?;
        let outlines = font.outline_glyphs();
        let outline = outlines
            .get(GlyphId::new(glyph.0))
            .ok_or_else(|| RasterizerError::new(format!("no outline for glyph {}", glyph.0)))?;
        let size = Size::new(self.ppem);
        if self
            .hinting
            .as_ref()
            .is_none_or(|(lcd, _)| *lcd != flags.target_lcd)
        {
            let instance = HintingInstance::new(
                &outlines,
                size,
                LocationRef::default(),
                hinting_options(flags),
            )
            .map_err(|e| RasterizerError::new(e.to_string()))?;
            self.hinting = Some((flags.target_lcd, instance));
        }
        self.path.clear();
        let mut pen = ZenoPen::new(&mut self.path, self.x_ppem / self.ppem);
        let settings = match &self.hinting {
            Some((_, instance)) => DrawSettings::hinted(instance, false),
            None => DrawSettings::unhinted(size, LocationRef::default()),
        };
        outline
            .draw(settings, &mut pen)
            .map_err(|e| RasterizerError::new(e.to_string()))?;
        let bounds = pen.bounds;
        let advance = font
            .glyph_metrics(Size::new(self.x_ppem), LocationRef::default())
            .advance_width(GlyphId::new(glyph.0))
            .unwrap_or(0.0);
        self.loaded = Some(glyph);
        Ok(bounds.slot_metrics(advance))
    }

    fn render_glyph(&mut self, mode: RenderMode) -> Result<RasterBitmap, RasterizerError> {
        self.ensure_loaded()?;
        rasterize(&self.path, None, mode)
    }

    #[expect(
        clippy::cast_possible_truncation,
        reason = "stroke parameters are small device pixel values"
    )]
    fn stroke_glyph(
        &mut self,
        stroke: &Stroke,
        mode: RenderMode,
    ) -> Result<RasterBitmap, RasterizerError> {
        self.ensure_loaded()?;
        let mut style = zeno::Stroke::new(stroke.radius_26_6().to_f64() as f32 * 2.0);
        style
            .cap(match stroke.line_cap {
                LineCap::Butt => zeno::Cap::Butt,
                LineCap::Round => zeno::Cap::Round,
                LineCap::Square => zeno::Cap::Square,
            })
            .join(match stroke.line_join {
                LineJoin::Bevel => zeno::Join::Bevel,
                LineJoin::Miter | LineJoin::MiterFixed => zeno::Join::Miter,
                LineJoin::Round => zeno::Join::Round,
            })
            .miter_limit(stroke.miter_limit_26_6().to_f64() as f32);
        rasterize(&self.path, Some(style), mode)
    }
}

impl SkrifaRasterizer {
    fn ensure_loaded(&self) -> Result<(), RasterizerError> {
        self.loaded
            .map(|_| ())
            .ok_or_else(|| RasterizerError::new("no glyph loaded"))
    }
}

fn font_ref(data: &[u8], index: u32) -> Result<FontRef<'_>, RasterizerError> {
    FontRef::from_index(data, index).map_err(|e| RasterizerError::new(e.to_string()))
}

fn hinting_options(flags: LoadFlags) -> HintingOptions {
    HintingOptions {
        engine: if flags.force_autohint {
            Engine::Auto(None)
        } else {
            Engine::AutoFallback
        },
        target: Target::Smooth {
            mode: if flags.target_lcd {
                SmoothMode::Lcd
            } else {
                SmoothMode::Normal
            },
            symmetric_rendering: false,
            preserve_linear_metrics: true,
        },
    }
}

#[expect(
    clippy::cast_possible_truncation,
    reason = "strike sizes are small positive pixel counts"
)]
fn strike_size(ppem: f32) -> FixedStrike {
    let pixels = ppem.round() as i16;
    FixedStrike {
        width: pixels,
        height: pixels,
        size: F26Dot6::from_f64_rounded(f64::from(ppem)),
    }
}

#[expect(
    clippy::cast_possible_truncation,
    reason = "clamped to the u16 range first"
)]
fn rounded_u16(value: f32) -> u16 {
    value.round().clamp(0.0, f32::from(u16::MAX)) as u16
}

fn rasterize(
    path: &[Command],
    stroke: Option<zeno::Stroke<'_>>,
    mode: RenderMode,
) -> Result<RasterBitmap, RasterizerError> {
    let format = match mode {
        RenderMode::Normal => NativePixelFormat::Gray,
        RenderMode::Mono => NativePixelFormat::Mono,
        RenderMode::Lcd => NativePixelFormat::Lcd,
        RenderMode::LcdVertical => {
            return Err(RasterizerError::new("vertical LCD rendering is not supported"));
        }
    };
    if path.is_empty() {
        return Ok(RasterBitmap::empty(format));
    }
    let mut mask = Mask::new(path);
    mask.format(if format == NativePixelFormat::Lcd {
        Format::Subpixel
    } else {
        Format::Alpha
    });
    if let Some(stroke) = stroke {
        mask.style(stroke);
    }
    let (coverage, placement) = mask.render();
    let width = placement.width as usize;
    let rows = placement.height;
    Ok(match format {
        NativePixelFormat::Lcd => RasterBitmap {
            width: placement.width * 3,
            rows,
            pitch: width * 3,
            format,
            // RGBA sub-pixel texels to three horizontal samples per pixel.
            buffer: coverage
                .chunks_exact(4)
                .flat_map(|texel| [texel[0], texel[1], texel[2]])
                .collect(),
        },
        NativePixelFormat::Mono => {
            let pitch = width.div_ceil(8);
            let mut buffer = vec![0_u8; pitch * rows as usize];
            for (y, row) in coverage.chunks_exact(width.max(1)).enumerate() {
                for (x, &value) in row.iter().enumerate() {
                    if value >= 0x80 {
                        buffer[y * pitch + x / 8] |= 0x80 >> (x % 8);
                    }
                }
            }
            RasterBitmap {
                width: placement.width,
                rows,
                pitch,
                format,
                buffer,
            }
        }
        _ => RasterBitmap {
            width: placement.width,
            rows,
            pitch: width,
            format,
            buffer: coverage,
        },
    })
}

/// Control box of a drawn outline, y down.
#[derive(Copy, Clone, Debug)]
struct Bounds {
    min: Vector,
    max: Vector,
}

impl Bounds {
    fn empty() -> Self {
        Self {
            min: Vector::new(f32::INFINITY, f32::INFINITY),
            max: Vector::new(f32::NEG_INFINITY, f32::NEG_INFINITY),
        }
    }

    fn add(&mut self, x: f32, y: f32) {
        self.min = Vector::new(self.min.x.min(x), self.min.y.min(y));
        self.max = Vector::new(self.max.x.max(x), self.max.y.max(y));
    }

    fn slot_metrics(self, advance: f32) -> GlyphSlotMetrics {
        let advance = F26Dot6::from_f64_rounded(f64::from(advance));
        if self.min.x > self.max.x {
            return GlyphSlotMetrics {
                advance,
                ..GlyphSlotMetrics::default()
            };
        }
        let left = F26Dot6::from_f64_rounded(f64::from(self.min.x)).floor();
        let right = F26Dot6::from_f64_rounded(f64::from(self.max.x)).ceil();
        // Flip back to y up.
        let top = F26Dot6::from_f64_rounded(f64::from(-self.min.y)).ceil();
        let bottom = F26Dot6::from_f64_rounded(f64::from(-self.max.y)).floor();
        GlyphSlotMetrics {
            width: right - left,
            height: top - bottom,
            bearing_x: left,
            bearing_y: top,
            advance,
        }
    }
}

/// Collects an outline as Zeno path commands, flipping the y axis.
///
/// `x_scale` stretches the outline horizontally when the two resolutions differ.
struct ZenoPen<'a> {
    commands: &'a mut Vec<Command>,
    x_scale: f32,
    bounds: Bounds,
}

impl<'a> ZenoPen<'a> {
    fn new(commands: &'a mut Vec<Command>, x_scale: f32) -> Self {
        Self {
            commands,
            x_scale,
            bounds: Bounds::empty(),
        }
    }

    fn point(&mut self, x: f32, y: f32) -> Vector {
        let x = x * self.x_scale;
        self.bounds.add(x, -y);
        Vector::new(x, -y)
    }
}

impl OutlinePen for ZenoPen<'_> {
    fn move_to(&mut self, x: f32, y: f32) {
        let to = self.point(x, y);
        self.commands.push(Command::MoveTo(to));
    }

    fn line_to(&mut self, x: f32, y: f32) {
        let to = self.point(x, y);
        self.commands.push(Command::LineTo(to));
    }

    fn quad_to(&mut self, cx0: f32, cy0: f32, x: f32, y: f32) {
        let c0 = self.point(cx0, cy0);
        let to = self.point(x, y);
        self.commands.push(Command::QuadTo(c0, to));
    }

    fn curve_to(&mut self, cx0: f32, cy0: f32, cx1: f32, cy1: f32, x: f32, y: f32) {
        let c0 = self.point(cx0, cy0);
        let c1 = self.point(cx1, cy1);
        let to = self.point(x, y);
        self.commands.push(Command::CurveTo(c0, c1, to));
    }

    fn close(&mut self) {
        self.commands.push(Command::Close);
    }
}
