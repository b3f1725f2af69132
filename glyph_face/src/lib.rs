// Copyright 2025 the Parley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Glyph Face rasterizes, packs and caches the glyphs of a single sized font face.
//!
//! A [`FontFace`] binds one [`OutlineRasterizer`] handle to a family, style, size, stroke
//! and DPI. It computes the realized metrics of that size once, memoizes kerning pairs and
//! advances, and turns glyph indices into [`GlyphRecord`]s whose pixels live in a shared
//! [`GlyphAtlas`]. Missing or broken glyphs degrade to U+FFFD and then to a hollow
//! "invalid glyph" box instead of failing the caller.
//!
//! The rasterizer, the shaping engine, the atlas and the font manager are collaborators
//! expressed as traits, so hosts can plug in their own backends.
//!
//! ## Features
//!
//! - `skrifa`: Provides [`backend::skrifa::SkrifaRasterizer`], an [`OutlineRasterizer`]
//!   built on Skrifa outlines with Zeno coverage rasterization.
//!
//! ## Example
//!
//! ```ignore
//! use glyph_face::{FaceDescriptor, FaceOptions, FontFace, ShelfAtlas};
//!
//! let mut atlas = ShelfAtlas::default();
//! let mut face = FontFace::new(descriptor, rasterizer, None, FaceOptions::default())?;
//! let index = face.glyph_index('g' as u32);
//! let record = face.glyph(index, &mut atlas)?;
//! ```

// LINEBENDER LINT SET - lib.rs - v3
// See https://linebender.org/wiki/canonical-lints/
// These lints shouldn't apply to examples or tests.
#![cfg_attr(not(test), warn(unused_crate_dependencies))]
// These lints shouldn't apply to examples.
#![warn(clippy::print_stdout, clippy::print_stderr)]
// Targeting e.g. 32-bit means structs containing usize can give false positives for 64-bit.
#![cfg_attr(target_pointer_width = "64", warn(clippy::trivially_copy_pass_by_ref))]
// END LINEBENDER LINT SET
#![cfg_attr(docsrs, feature(doc_cfg))]

mod atlas;
mod bitmap;
mod error;
mod face;
mod fallback;
mod fixed;
mod glyph;
mod kerning;
mod metrics;
mod pack;
mod rasterizer;
mod style;

pub mod backend;

#[cfg(test)]
mod tests;

pub use atlas::{
    AtlasRect, GlyphAtlas, ShelfAtlas, ShelfAtlasConfig, SubTexture, SubTextureId,
    TextureDataFormat, TextureSampling,
};
pub use bitmap::PixelMode;
pub use error::{Error, ErrorKind, GlyphError, RasterizerError};
pub use face::{FaceDescriptor, FaceOptions, FontFace, FontId};
pub use fallback::FontManager;
pub use fixed::F26Dot6;
pub use glyph::{GlyphIndex, GlyphMetrics, GlyphRecord, REPLACEMENT_CHARACTER};
pub use metrics::FaceMetrics;
pub use rasterizer::{
    CharmapEncoding, FixedStrike, GlyphSlotMetrics, LoadFlags, NativePixelFormat,
    OutlineRasterizer, RasterBitmap, RenderMode, ShapingFont, ShapingFontFuncs, SizeMetrics,
};
pub use style::{Dpi, FontSize, FontStyle, FontWeight, KerningMethod, LineCap, LineJoin, Stroke};
