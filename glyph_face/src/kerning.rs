// Copyright 2025 the Parley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use hashbrown::HashMap;

use crate::glyph::GlyphIndex;
use crate::style::KerningMethod;

/// Memo of pair kerning deltas in device pixels, keyed by ordered glyph pair.
///
/// The deltas are only valid for the method they were computed with, so changing the
/// method empties the cache.
#[derive(Clone, Debug, Default)]
pub(crate) struct KerningCache {
    method: KerningMethod,
    deltas: HashMap<(GlyphIndex, GlyphIndex), f64>,
}

impl KerningCache {
    pub(crate) fn new(method: KerningMethod) -> Self {
        Self {
            method,
            deltas: HashMap::new(),
        }
    }

    pub(crate) fn method(&self) -> KerningMethod {
        self.method
    }

    pub(crate) fn set_method(&mut self, method: KerningMethod) {
        self.method = method;
        self.deltas.clear();
    }

    pub(crate) fn get(&self, left: GlyphIndex, right: GlyphIndex) -> Option<f64> {
        self.deltas.get(&(left, right)).copied()
    }

    pub(crate) fn insert(&mut self, left: GlyphIndex, right: GlyphIndex, delta: f64) -> f64 {
        self.deltas.insert((left, right), delta);
        delta
    }

    pub(crate) fn len(&self) -> usize {
        self.deltas.len()
    }
}
