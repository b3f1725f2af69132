// Copyright 2025 the Parley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use core::fmt;

/// A failure reported by an [`OutlineRasterizer`](crate::OutlineRasterizer).
///
/// Carries the diagnostic string of the underlying library.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RasterizerError {
    message: String,
}

impl RasterizerError {
    /// Creates a rasterizer error with the given diagnostic.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// The diagnostic reported by the rasterizer.
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for RasterizerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl core::error::Error for RasterizerError {}

/// Why a single glyph could not be rasterized.
///
/// These never reach callers of [`FontFace::glyph`](crate::FontFace::glyph): the face
/// substitutes U+FFFD or the invalid glyph instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GlyphError {
    /// Loading the outline failed.
    Load(RasterizerError),
    /// Rendering or stroking the loaded outline failed.
    Render(RasterizerError),
}

impl fmt::Display for GlyphError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Load(e) => write!(f, "cannot load glyph: {e}"),
            Self::Render(e) => write!(f, "cannot render glyph: {e}"),
        }
    }
}

impl core::error::Error for GlyphError {
    fn source(&self) -> Option<&(dyn core::error::Error + 'static)> {
        match self {
            Self::Load(e) | Self::Render(e) => Some(e),
        }
    }
}

/// Error type for font face operations.
///
/// Carries a non-exhaustive [`ErrorKind`] plus, where relevant, the offending index
/// and the rasterizer diagnostic.
#[derive(Debug, Clone, PartialEq)]
pub struct Error {
    kind: ErrorKind,
    index: Option<usize>,
    source: Option<RasterizerError>,
}

impl Error {
    /// The machine-readable category for this error.
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// The offending index for [`ErrorKind::BadFixedSizeIndex`].
    pub fn index(&self) -> Option<usize> {
        self.index
    }

    /// The rasterizer diagnostic, if the error came from the rasterizer.
    pub fn rasterizer_error(&self) -> Option<&RasterizerError> {
        self.source.as_ref()
    }

    fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            index: None,
            source: None,
        }
    }

    pub(crate) fn bad_fixed_size_index(index: usize) -> Self {
        Self {
            index: Some(index),
            ..Self::new(ErrorKind::BadFixedSizeIndex)
        }
    }

    pub(crate) fn no_fixed_sizes() -> Self {
        Self::new(ErrorKind::BadFixedSizeIndex)
    }

    pub(crate) fn no_fallback_font() -> Self {
        Self::new(ErrorKind::NoFallbackFont)
    }

    pub(crate) fn invalid_dpi() -> Self {
        Self::new(ErrorKind::InvalidDpi)
    }

    /// An atlas that cannot satisfy a sub-texture request.
    pub fn atlas_allocation() -> Self {
        Self::new(ErrorKind::AtlasAllocation)
    }

    /// An upload whose data does not match the sub-texture it targets.
    pub fn atlas_upload() -> Self {
        Self::new(ErrorKind::AtlasUpload)
    }

    /// A font manager that failed to build a fallback face.
    pub fn fallback_creation(source: RasterizerError) -> Self {
        Self {
            source: Some(source),
            ..Self::new(ErrorKind::FallbackCreation)
        }
    }
}

impl From<RasterizerError> for Error {
    fn from(source: RasterizerError) -> Self {
        Self {
            source: Some(source),
            ..Self::new(ErrorKind::Rasterizer)
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            ErrorKind::BadFixedSizeIndex => match self.index {
                Some(index) => write!(f, "fixed size index {index} out of range"),
                None => f.write_str("font has no fixed sizes"),
            },
            ErrorKind::NoFallbackFont => f.write_str("no fallback font available"),
            ErrorKind::InvalidDpi => f.write_str("DPI must be positive in both axes"),
            ErrorKind::AtlasAllocation => f.write_str("glyph atlas allocation failed"),
            ErrorKind::AtlasUpload => f.write_str("glyph atlas upload failed"),
            ErrorKind::FallbackCreation => match &self.source {
                Some(source) => write!(f, "fallback face creation failed: {source}"),
                None => f.write_str("fallback face creation failed"),
            },
            ErrorKind::Rasterizer => match &self.source {
                Some(source) => write!(f, "rasterizer error: {source}"),
                None => f.write_str("rasterizer error"),
            },
        }
    }
}

impl core::error::Error for Error {
    fn source(&self) -> Option<&(dyn core::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e as &(dyn core::error::Error + 'static))
    }
}

/// The non-exhaustive category of an [`Error`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum ErrorKind {
    /// A fixed strike index was out of range, or the face has no strikes at all.
    BadFixedSizeIndex,
    /// A fallback face was requested but the font manager has none.
    NoFallbackFont,
    /// The font manager reported a fallback but failed to create it.
    FallbackCreation,
    /// The face was constructed with a non-positive DPI.
    InvalidDpi,
    /// The rasterizer failed while setting up the face or answering a query.
    Rasterizer,
    /// The glyph atlas could not allocate a sub-texture.
    AtlasAllocation,
    /// The glyph atlas rejected a pixel upload.
    AtlasUpload,
}
