// Copyright 2025 the Parley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Size negotiation with the rasterizer and the metrics derived from it.

use hashbrown::HashMap;
use log::trace;

use crate::error::Error;
use crate::fixed::F26Dot6;
use crate::glyph::GlyphIndex;
use crate::rasterizer::{CharmapEncoding, OutlineRasterizer, SizeMetrics};
use crate::style::{Dpi, FontStyle, FontWeight};

/// Size reduction applied to super- and subscript faces.
const SCRIPT_SCALE: f64 = 0.58;

/// Below this point size, underlines are never thicker than one pixel.
const THIN_UNDERLINE_POINT_SIZE: f64 = 20.0;

/// How a face's size is realized.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub(crate) enum FaceKind {
    /// Outlines scaled to any size.
    Scalable,
    /// Embedded bitmaps at a fixed set of sizes.
    BitmapStrike,
}

impl FaceKind {
    pub(crate) fn of(rasterizer: &dyn OutlineRasterizer) -> Self {
        if rasterizer.is_scalable() {
            Self::Scalable
        } else {
            Self::BitmapStrike
        }
    }
}

/// Line metrics of a face at its realized size, in device pixels.
#[derive(Copy, Clone, Default, PartialEq, Debug)]
pub struct FaceMetrics {
    /// Horizontal pixels per em.
    pub em_width: f64,
    /// Vertical pixels per em.
    pub em_height: f64,
    /// Baseline to top of the line.
    pub ascender: f64,
    /// Baseline to bottom of the line, negative below the baseline.
    pub descender: f64,
    /// Baseline-to-baseline distance.
    pub height: f64,
    /// Largest advance of any glyph.
    pub max_advance: f64,
}

impl From<SizeMetrics> for FaceMetrics {
    fn from(metrics: SizeMetrics) -> Self {
        Self {
            em_width: f64::from(metrics.x_ppem),
            em_height: f64::from(metrics.y_ppem),
            ascender: metrics.ascender.to_f64(),
            descender: metrics.descender.to_f64(),
            height: metrics.height.to_f64(),
            max_advance: metrics.max_advance.to_f64(),
        }
    }
}

/// The size a face asks the rasterizer for, in both points and pixels.
#[derive(Copy, Clone, PartialEq, Debug)]
pub(crate) struct SizeRequest {
    pub(crate) point_size: f64,
    pub(crate) pixel_height: f64,
    /// The face was requested by pixel height rather than point size.
    pub(crate) height_specified: bool,
}

impl SizeRequest {
    /// Decodes a signed size (points if non-negative, negated pixel height otherwise).
    pub(crate) fn new(size: f64, style: FontStyle, dpi: Dpi) -> Self {
        let desired = if style.is_scripted() {
            size * SCRIPT_SCALE
        } else {
            size
        };
        if size >= 0.0 {
            Self {
                point_size: desired,
                pixel_height: desired * dpi.y / 72.0,
                height_specified: false,
            }
        } else {
            Self {
                point_size: -desired / dpi.y * 72.0,
                pixel_height: -desired,
                height_specified: true,
            }
        }
    }
}

/// Outcome of negotiating a size with the rasterizer.
#[derive(Copy, Clone, PartialEq, Debug)]
pub(crate) struct RealizedSize {
    pub(crate) metrics: FaceMetrics,
    pub(crate) point_size: f64,
    /// Ratio applied to the point size so the line height matches a requested pixel height.
    pub(crate) correction: f64,
    /// The selected strike, for bitmap-strike faces.
    pub(crate) strike: Option<usize>,
}

impl RealizedSize {
    /// Scale for the shaping engine, in 26.6 pixels per em along each axis.
    #[expect(
        clippy::cast_possible_truncation,
        reason = "the shaping engine takes integer 26.6 scales"
    )]
    pub(crate) fn shaping_scale(&self, dpi: Dpi) -> (i32, i32) {
        let size = self.point_size * self.correction;
        (
            (size * dpi.x / 72.0 * 64.0) as i32,
            (size * dpi.y / 72.0 * 64.0) as i32,
        )
    }
}

/// Sizes the rasterizer for `request` and reads back the realized metrics.
///
/// Scalable faces are sized once, plus one corrective request when a pixel height was
/// asked for and the realized line height differs. Bitmap-strike faces select the strike
/// closest to the requested pixel height, preferring the earliest on ties.
pub(crate) fn realize_size(
    rasterizer: &mut dyn OutlineRasterizer,
    kind: FaceKind,
    request: SizeRequest,
    dpi: Dpi,
) -> Result<RealizedSize, Error> {
    let (dpi_x, dpi_y) = dpi_to_u32(dpi);
    let mut correction = 1.0;
    let mut strike = None;
    match kind {
        FaceKind::Scalable => {
            rasterizer.set_char_size(F26Dot6::from_f64(request.point_size), dpi_x, dpi_y)?;
            if request.height_specified {
                let got_height = rasterizer.size_metrics().height.to_f64();
                if got_height != request.pixel_height {
                    correction = request.pixel_height / got_height;
                    trace!(
                        "line height {got_height} differs from requested {}, correcting by {correction}",
                        request.pixel_height
                    );
                    rasterizer.set_char_size(
                        F26Dot6::from_f64(request.point_size * correction),
                        dpi_x,
                        dpi_y,
                    )?;
                }
            }
        }
        FaceKind::BitmapStrike => {
            let index = closest_strike(rasterizer, request.pixel_height)?;
            trace!(
                "selected strike {index} for pixel height {}",
                request.pixel_height
            );
            rasterizer.select_fixed_size(index)?;
            strike = Some(index);
        }
    }
    if rasterizer.charmaps().contains(&CharmapEncoding::Unicode) {
        rasterizer.select_charmap(CharmapEncoding::Unicode)?;
    }
    Ok(RealizedSize {
        metrics: rasterizer.size_metrics().into(),
        point_size: request.point_size,
        correction,
        strike,
    })
}

fn closest_strike(rasterizer: &dyn OutlineRasterizer, pixel_height: f64) -> Result<usize, Error> {
    let strikes = rasterizer.fixed_strikes();
    let first = strikes.first().ok_or_else(Error::no_fixed_sizes)?;
    let mut best = (0, (pixel_height - first.size.to_f64()).abs());
    for (index, strike) in strikes.iter().enumerate().skip(1) {
        let distance = (pixel_height - strike.size.to_f64()).abs();
        if distance < best.1 {
            best = (index, distance);
        }
    }
    Ok(best.0)
}

#[expect(
    clippy::cast_possible_truncation,
    reason = "rasterizers take integral resolutions"
)]
fn dpi_to_u32(dpi: Dpi) -> (u32, u32) {
    (dpi.x as u32, dpi.y as u32)
}

/// Point size of a face with a signed size.
pub(crate) fn point_size(size: f64, dpi: Dpi) -> f64 {
    if size >= 0.0 {
        size
    } else {
        72.0 / dpi.y * -size
    }
}

/// Underline thickness in whole device pixels.
///
/// Scalable faces use the font's own thickness. Bitmap-strike faces derive one from the
/// weight implied by their style name. Small faces always get a one pixel underline.
pub(crate) fn underline_thickness(
    kind: FaceKind,
    font_thickness: Option<F26Dot6>,
    style_name: &str,
    point_size: f64,
) -> f64 {
    let thickness = match (kind, font_thickness) {
        (FaceKind::Scalable, Some(thickness)) => thickness.to_f64(),
        (FaceKind::Scalable, None) => 1.0,
        (FaceKind::BitmapStrike, _) => {
            f64::from(FontWeight::from_style_name(style_name).value())
                / f64::from(FontWeight::NORMAL.value())
        }
    };
    if thickness < 1.0 || (thickness > 1.0 && point_size < THIN_UNDERLINE_POINT_SIZE) {
        1.0
    } else {
        thickness.floor()
    }
}

/// Underline position relative to the baseline, derived from the thickness alone.
///
/// The font's own underline position is not consulted.
pub(crate) fn underline_position(thickness: f64) -> f64 {
    (-1.0 - thickness).floor()
}

/// Per-face memo of horizontal advances in 26.6.
#[derive(Clone, Debug, Default)]
pub(crate) struct AdvanceCache {
    advances: HashMap<GlyphIndex, F26Dot6>,
}

impl AdvanceCache {
    pub(crate) fn get_or_try_insert_with<E>(
        &mut self,
        glyph: GlyphIndex,
        f: impl FnOnce() -> Result<F26Dot6, E>,
    ) -> Result<F26Dot6, E> {
        if let Some(advance) = self.advances.get(&glyph) {
            return Ok(*advance);
        }
        let advance = f()?;
        self.advances.insert(glyph, advance);
        Ok(advance)
    }

    pub(crate) fn len(&self) -> usize {
        self.advances.len()
    }
}

#[cfg(test)]
mod tests {
    use super::{FaceKind, SizeRequest, point_size, underline_position, underline_thickness};
    use crate::fixed::F26Dot6;
    use crate::style::{Dpi, FontStyle};

    #[test]
    fn point_size_request() {
        let request = SizeRequest::new(12.0, FontStyle::NORMAL, Dpi::new(96.0, 96.0));
        assert_eq!(request.point_size, 12.0);
        assert_eq!(request.pixel_height, 16.0);
        assert!(!request.height_specified);
    }

    #[test]
    fn pixel_height_request() {
        let request = SizeRequest::new(-16.0, FontStyle::NORMAL, Dpi::new(96.0, 96.0));
        assert!((request.point_size - 12.0).abs() < 1e-9);
        assert_eq!(request.pixel_height, 16.0);
        assert!(request.height_specified);
    }

    #[test]
    fn scripted_request_shrinks() {
        let request = SizeRequest::new(10.0, FontStyle::SUPERSCRIPT, Dpi::new(72.0, 72.0));
        assert!((request.point_size - 5.8).abs() < 1e-9);
        assert!((request.pixel_height - 5.8).abs() < 1e-9);
    }

    #[test]
    fn signed_point_size() {
        let dpi = Dpi::new(96.0, 144.0);
        assert_eq!(point_size(10.0, dpi), 10.0);
        assert_eq!(point_size(-20.0, dpi), 10.0);
    }

    #[test]
    fn underline_thickness_rules() {
        let thick = Some(F26Dot6::from_f64(2.5));
        assert_eq!(underline_thickness(FaceKind::Scalable, thick, "", 12.0), 1.0);
        assert_eq!(underline_thickness(FaceKind::Scalable, thick, "", 24.0), 2.0);
        let thin = Some(F26Dot6::from_f64(0.5));
        assert_eq!(underline_thickness(FaceKind::Scalable, thin, "", 48.0), 1.0);
        assert_eq!(
            underline_thickness(FaceKind::BitmapStrike, None, "Black", 30.0),
            2.0
        );
        assert_eq!(
            underline_thickness(FaceKind::BitmapStrike, None, "Bold", 12.0),
            1.0
        );
    }

    #[test]
    fn underline_sits_below_baseline() {
        assert_eq!(underline_position(1.0), -2.0);
        assert_eq!(underline_position(2.0), -3.0);
    }
}
