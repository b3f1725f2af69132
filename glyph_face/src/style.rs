// Copyright 2025 the Parley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Style flags, sizes and stroke parameters of a font face.

use bitflags::bitflags;

use crate::fixed::F26Dot6;

bitflags! {
    /// Set of style flags requested for a face.
    ///
    /// The `EMULATED_*` flags ask for synthesized styles when the family has no real face
    /// for them.
    #[derive(Copy, Clone, Default, PartialEq, Eq, Hash, Debug)]
    pub struct FontStyle: u32 {
        /// The regular style.
        const NORMAL = 0x0001;
        /// Italic.
        const ITALIC = 0x0002;
        /// Bold.
        const BOLD = 0x0004;
        /// Underlined.
        const UNDERLINE = 0x0008;
        /// Raised and reduced.
        const SUPERSCRIPT = 0x0010;
        /// Lowered and reduced.
        const SUBSCRIPT = 0x0020;
        /// Struck through.
        const STRIKE = 0x0040;
        /// Bold synthesized by emboldening the rendered bitmaps.
        const EMULATED_BOLD = 0x0100;
        /// Italic synthesized by the renderer.
        const EMULATED_ITALIC = 0x0200;
        /// Both synthesized styles.
        const EMULATED_BOLD_ITALIC = Self::EMULATED_BOLD.bits() | Self::EMULATED_ITALIC.bits();
    }
}

impl FontStyle {
    /// Whether the size is reduced for super- or subscript rendering.
    pub const fn is_scripted(self) -> bool {
        self.intersects(Self::SUPERSCRIPT.union(Self::SUBSCRIPT))
    }
}

/// Visual weight of a face, on the usual 100..=900 scale.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct FontWeight(u16);

impl FontWeight {
    /// Thin (100).
    pub const THIN: Self = Self(100);
    /// Extra light (200).
    pub const EXTRA_LIGHT: Self = Self(200);
    /// Light (300).
    pub const LIGHT: Self = Self(300);
    /// Normal (400).
    pub const NORMAL: Self = Self(400);
    /// Medium (500).
    pub const MEDIUM: Self = Self(500);
    /// Semi bold (600).
    pub const SEMI_BOLD: Self = Self(600);
    /// Bold (700).
    pub const BOLD: Self = Self(700);
    /// Extra bold (800).
    pub const EXTRA_BOLD: Self = Self(800);
    /// Black (900).
    pub const BLACK: Self = Self(900);

    /// Creates a weight from a raw value.
    pub const fn new(weight: u16) -> Self {
        Self(weight)
    }

    /// Returns the raw value.
    pub const fn value(self) -> u16 {
        self.0
    }

    /// Guesses the weight from a style name such as `"Semibold Italic"`.
    ///
    /// Bitmap fonts rarely carry an `OS/2` weight, so the name is all there is.
    /// Unrecognized names are [`FontWeight::NORMAL`].
    pub fn from_style_name(name: &str) -> Self {
        let name: String = name
            .chars()
            .filter(|c| !matches!(c, ' ' | '-' | '_'))
            .flat_map(char::to_lowercase)
            .collect();
        // Longer names first so that "extrabold" does not match "bold".
        const TABLE: &[(&str, FontWeight)] = &[
            ("extralight", FontWeight::EXTRA_LIGHT),
            ("ultralight", FontWeight::EXTRA_LIGHT),
            ("extrabold", FontWeight::EXTRA_BOLD),
            ("ultrabold", FontWeight::EXTRA_BOLD),
            ("semibold", FontWeight::SEMI_BOLD),
            ("demibold", FontWeight::SEMI_BOLD),
            ("hairline", FontWeight::THIN),
            ("regular", FontWeight::NORMAL),
            ("medium", FontWeight::MEDIUM),
            ("normal", FontWeight::NORMAL),
            ("black", FontWeight::BLACK),
            ("heavy", FontWeight::BLACK),
            ("light", FontWeight::LIGHT),
            ("thin", FontWeight::THIN),
            ("bold", FontWeight::BOLD),
            ("book", FontWeight::NORMAL),
        ];
        TABLE
            .iter()
            .find(|(key, _)| name.contains(key))
            .map_or(Self::NORMAL, |(_, weight)| *weight)
    }
}

impl Default for FontWeight {
    fn default() -> Self {
        Self::NORMAL
    }
}

/// Requested size of a face.
///
/// The signed encoding used by font managers is kept: a non-negative value is a point
/// size, a negative value is a negated pixel height.
#[derive(Copy, Clone, PartialEq, Debug)]
pub enum FontSize {
    /// Size in points.
    Points(f64),
    /// Line height in device pixels.
    Pixels(f64),
}

impl FontSize {
    /// Decodes the signed representation.
    pub fn from_signed(size: f64) -> Self {
        if size >= 0.0 {
            Self::Points(size)
        } else {
            Self::Pixels(-size)
        }
    }

    /// Encodes into the signed representation.
    pub fn to_signed(self) -> f64 {
        match self {
            Self::Points(points) => points,
            Self::Pixels(pixels) => -pixels,
        }
    }
}

/// Dots per inch of the target surface.
#[derive(Copy, Clone, PartialEq, Debug)]
pub struct Dpi {
    /// Horizontal resolution.
    pub x: f64,
    /// Vertical resolution.
    pub y: f64,
}

impl Dpi {
    /// Creates a resolution.
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Returns `true` when both axes are strictly positive.
    pub fn is_valid(self) -> bool {
        self.x > 0.0 && self.y > 0.0
    }
}

impl Default for Dpi {
    fn default() -> Self {
        Self::new(96.0, 96.0)
    }
}

/// How the ends of open stroked segments are drawn.
#[derive(Copy, Clone, Default, PartialEq, Eq, Hash, Debug)]
pub enum LineCap {
    /// Squared off at the end point.
    Butt,
    /// Rounded around the end point.
    #[default]
    Round,
    /// Squared off half a stroke width past the end point.
    Square,
}

/// How stroked segments are joined.
#[derive(Copy, Clone, Default, PartialEq, Eq, Hash, Debug)]
pub enum LineJoin {
    /// Cut off at the outer corner.
    Bevel,
    /// Extended to a point, falling back to bevel past the miter limit.
    Miter,
    /// Extended to a point, clipped at the miter limit.
    MiterFixed,
    /// Rounded around the corner.
    #[default]
    Round,
}

/// Stroke used to render the outline variant of glyphs.
#[derive(Copy, Clone, PartialEq, Debug)]
pub struct Stroke {
    /// Stroke radius (half the width) in device pixels. Zero disables outline glyphs.
    pub radius: f64,
    /// End cap style.
    pub line_cap: LineCap,
    /// Join style.
    pub line_join: LineJoin,
    /// Miter limit, as a ratio of the radius.
    pub miter_limit: f64,
}

impl Stroke {
    /// A stroke of the given radius with round caps and joins.
    pub fn new(radius: f64) -> Self {
        Self {
            radius,
            ..Self::default()
        }
    }

    /// Whether this stroke produces outline glyphs.
    pub fn is_enabled(&self) -> bool {
        self.radius != 0.0
    }

    /// Radius in 26.6.
    pub fn radius_26_6(&self) -> F26Dot6 {
        F26Dot6::from_f64(self.radius)
    }

    /// Miter limit in 26.6.
    pub fn miter_limit_26_6(&self) -> F26Dot6 {
        F26Dot6::from_f64(self.miter_limit)
    }
}

impl Default for Stroke {
    fn default() -> Self {
        Self {
            radius: 0.0,
            line_cap: LineCap::Round,
            line_join: LineJoin::Round,
            miter_limit: 4.0,
        }
    }
}

/// Source of kerning deltas for a face.
#[derive(Copy, Clone, Default, PartialEq, Eq, Hash, Debug)]
pub enum KerningMethod {
    /// Pair adjustments read straight from the rasterizer's kerning table.
    Table,
    /// Pair adjustments served to the shaping engine through its kerning callback.
    #[default]
    Shaping,
    /// No kerning.
    Disabled,
}
