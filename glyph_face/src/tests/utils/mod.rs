// Copyright 2025 the Parley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

mod mock;

use std::cell::RefCell;
use std::rc::Rc;

use crate::{
    Dpi, Error, FaceDescriptor, FaceOptions, FontFace, FontId, FontSize, FontStyle, ShapingFont,
    Stroke,
};

pub(crate) use mock::{
    GLYPH_HEIGHT, GLYPH_WIDTH, MockFontManager, MockRasterizer, MockShaping, OUTLINE_HEIGHT,
    OUTLINE_WIDTH, REPLACEMENT_GLYPH, RasterizerCalls, RecordingAtlas,
};

/// Builds faces over a [`MockRasterizer`] and keeps a handle on its call log.
pub(crate) struct TestFace {
    pub(crate) descriptor: FaceDescriptor,
    pub(crate) rasterizer: MockRasterizer,
    pub(crate) shaping: Option<MockShaping>,
    pub(crate) options: FaceOptions,
}

impl TestFace {
    /// A 12 point face at 96 DPI, which is 16 pixels per em.
    pub(crate) fn new() -> Self {
        Self {
            descriptor: FaceDescriptor {
                dpi: Dpi::new(96.0, 96.0),
                ..FaceDescriptor::new(FontId(1), "Mock Sans", FontSize::Points(12.0))
            },
            rasterizer: MockRasterizer::default(),
            shaping: None,
            options: FaceOptions::default(),
        }
    }

    pub(crate) fn size(mut self, size: FontSize) -> Self {
        self.descriptor.size = size;
        self
    }

    pub(crate) fn dpi(mut self, x: f64, y: f64) -> Self {
        self.descriptor.dpi = Dpi::new(x, y);
        self
    }

    pub(crate) fn style(mut self, style: FontStyle) -> Self {
        self.descriptor.style = style;
        self
    }

    pub(crate) fn outline(mut self, radius: f64) -> Self {
        self.descriptor.outline = Stroke::new(radius);
        self
    }

    pub(crate) fn rasterizer(mut self, rasterizer: MockRasterizer) -> Self {
        self.rasterizer = rasterizer;
        self
    }

    pub(crate) fn shaping(mut self, shaping: MockShaping) -> Self {
        self.shaping = Some(shaping);
        self
    }

    pub(crate) fn options(mut self, options: FaceOptions) -> Self {
        self.options = options;
        self
    }

    /// Creates the face, returning the rasterizer's call log alongside it.
    pub(crate) fn build(self) -> (FontFace, Rc<RefCell<RasterizerCalls>>) {
        let calls = self.rasterizer.calls();
        (self.try_build().unwrap(), calls)
    }

    pub(crate) fn try_build(self) -> Result<FontFace, Error> {
        FontFace::new(
            self.descriptor,
            Box::new(self.rasterizer),
            self.shaping
                .map(|shaping| Box::new(shaping) as Box<dyn ShapingFont>),
            self.options,
        )
    }
}
