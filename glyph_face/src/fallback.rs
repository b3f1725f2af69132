// Copyright 2025 the Parley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use core::cell::OnceCell;

use crate::error::Error;
use crate::face::FontFace;

/// The host's font manager, which knows which face to fall back to when a face lacks a
/// code point.
pub trait FontManager {
    /// Whether a fallback face exists for `face`.
    fn has_fallback_font(&self, face: &FontFace) -> bool;

    /// Creates the fallback face for `face`.
    ///
    /// Only called after [`has_fallback_font`](Self::has_fallback_font) returned `true`.
    fn create_fallback_font(&self, face: &FontFace) -> Result<FontFace, Error>;
}

/// A face's link to its fallback: the memoized availability answer and the lazily
/// created face, owned.
#[derive(Debug, Default)]
pub(crate) struct FallbackLink {
    available: OnceCell<bool>,
    face: Option<Box<FontFace>>,
}

impl FallbackLink {
    pub(crate) fn is_available(&self, owner: &FontFace, fonts: &dyn FontManager) -> bool {
        *self
            .available
            .get_or_init(|| fonts.has_fallback_font(owner))
    }

    pub(crate) fn is_cached(&self) -> bool {
        self.face.is_some()
    }

    pub(crate) fn get_mut(&mut self) -> Option<&mut FontFace> {
        self.face.as_deref_mut()
    }

    pub(crate) fn set(&mut self, face: FontFace) -> &mut FontFace {
        self.face.insert(Box::new(face))
    }
}
