// Copyright 2025 the Parley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use super::utils::{MockFontManager, RecordingAtlas, TestFace};
use crate::{ErrorKind, FontId, GlyphIndex};

#[test]
fn availability_is_asked_once() {
    let fonts = MockFontManager::new(true);
    let (face, _) = TestFace::new().build();
    assert!(face.has_fallback(&fonts));
    assert!(face.has_fallback(&fonts));
    assert_eq!(fonts.queries.get(), 1);
    assert!(!face.fallback_cached());
}

#[test]
fn fallback_is_created_once() {
    let fonts = MockFontManager::new(true);
    let (mut face, _) = TestFace::new().build();

    let fallback = face.fallback(&fonts).unwrap();
    assert_eq!(fallback.id(), FontId(1001));
    assert_eq!(fallback.family_name(), "Fallback");
    assert_eq!(fallback.size(), 12.0);

    face.fallback(&fonts).unwrap();
    assert_eq!(fonts.created.get(), 1);
    assert_eq!(fonts.queries.get(), 1);
    assert!(face.fallback_cached());
}

#[test]
fn missing_fallback_is_an_error() {
    let fonts = MockFontManager::new(false);
    let (mut face, _) = TestFace::new().build();
    for _ in 0..2 {
        let err = face.fallback(&fonts).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NoFallbackFont);
    }
    assert_eq!(fonts.queries.get(), 1);
    assert_eq!(fonts.created.get(), 0);
    assert!(!face.fallback_cached());
}

#[test]
fn fallback_renders_into_the_shared_atlas() {
    let fonts = MockFontManager::new(true);
    let mut atlas = RecordingAtlas::default();
    let (mut face, _) = TestFace::new().build();
    face.glyph(GlyphIndex(1), &mut atlas).unwrap();

    let fallback = face.fallback(&fonts).unwrap();
    let record = *fallback.glyph(GlyphIndex(1), &mut atlas).unwrap();
    assert_eq!(fallback.cached_glyphs(), 1);
    assert_eq!(atlas.allocations.len(), 2);
    let own = face.glyph_cached(GlyphIndex(1)).unwrap();
    assert_ne!(record.texture().id, own.texture().id);
}
