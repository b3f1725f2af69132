// Copyright 2025 the Parley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Texture atlas contract and a guillotine-packing implementation backed by CPU pages.
//!
//! A face never owns pixel storage: it asks a [`GlyphAtlas`] for a sub-texture of the
//! right size and format, then uploads packed texels into it. The returned
//! [`SubTexture`] is a plain handle that stays valid for the lifetime of the atlas.

use core::fmt;

use guillotiere::{AtlasAllocator, size2};
use log::trace;
use smallvec::SmallVec;

use crate::error::Error;

/// Identifier of a sub-texture, unique within one atlas.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct SubTextureId(pub u32);

/// Pixel rectangle of a sub-texture within its atlas page.
#[derive(Copy, Clone, Default, PartialEq, Eq, Hash, Debug)]
pub struct AtlasRect {
    /// Left edge.
    pub x: u32,
    /// Bottom edge; rows are addressed bottom-up.
    pub y: u32,
    /// Width in texels.
    pub width: u32,
    /// Height in texels.
    pub height: u32,
}

impl AtlasRect {
    /// Returns `true` if the two rectangles share any texel.
    pub fn intersects(&self, other: &Self) -> bool {
        self.x < other.x + other.width
            && other.x < self.x + self.width
            && self.y < other.y + other.height
            && other.y < self.y + self.height
    }
}

/// Texel layout of a sub-texture.
#[derive(Copy, Clone, Default, PartialEq, Eq, Hash, Debug)]
pub enum TextureDataFormat {
    /// One coverage byte per texel.
    #[default]
    Red,
    /// Four bytes per texel: three sub-pixel coverage channels and one unused byte.
    SubPixel,
}

impl TextureDataFormat {
    /// Bytes per texel.
    pub fn channels(self) -> u8 {
        match self {
            Self::Red => 1,
            Self::SubPixel => 4,
        }
    }
}

/// Filtering used when a sub-texture is sampled.
#[derive(Copy, Clone, Default, PartialEq, Eq, Hash, Debug)]
pub enum TextureSampling {
    /// Linear filtering.
    #[default]
    Normal,
    /// Nearest texel, for glyphs that must stay pixel exact.
    Nearest,
}

/// Handle to a region of an atlas page.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub struct SubTexture {
    /// Atlas-unique identifier.
    pub id: SubTextureId,
    /// Index of the page the region lives on.
    pub page: u32,
    /// Region on the page.
    pub rect: AtlasRect,
    /// Texel layout of the region.
    pub format: TextureDataFormat,
}

impl SubTexture {
    /// Width in texels.
    pub fn width(&self) -> u32 {
        self.rect.width
    }

    /// Height in texels.
    pub fn height(&self) -> u32 {
        self.rect.height
    }
}

/// Storage for glyph textures.
///
/// Allocation and upload both take `&mut self`, so a face always fills a
/// sub-texture before anyone else can allocate from the same atlas.
pub trait GlyphAtlas {
    /// Reserves a `width x height` region.
    ///
    /// `scale` is the device scale the texels were rasterized at.
    fn create_sub_texture(
        &mut self,
        width: u32,
        height: u32,
        scale: f32,
        sampling: TextureSampling,
        format: TextureDataFormat,
    ) -> Result<SubTexture, Error>;

    /// Copies packed texels into a region, rows bottom-up, `channels` bytes each.
    fn upload(&mut self, sub_texture: &SubTexture, data: &[u8], channels: u8)
    -> Result<(), Error>;
}

/// Options for a [`ShelfAtlas`].
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct ShelfAtlasConfig {
    /// Width of each page in texels.
    pub page_width: u32,
    /// Height of each page in texels.
    pub page_height: u32,
    /// Empty texels kept between neighboring regions.
    pub padding: u32,
    /// Number of pages per format before allocation fails.
    pub max_pages: usize,
}

impl Default for ShelfAtlasConfig {
    fn default() -> Self {
        Self {
            page_width: 1024,
            page_height: 1024,
            padding: 1,
            max_pages: 4,
        }
    }
}

struct Page {
    format: TextureDataFormat,
    allocator: AtlasAllocator,
    texels: Vec<u8>,
}

impl Page {
    fn new(format: TextureDataFormat, config: &ShelfAtlasConfig) -> Result<Self, Error> {
        let width = i32::try_from(config.page_width).map_err(|_| Error::atlas_allocation())?;
        let height = i32::try_from(config.page_height).map_err(|_| Error::atlas_allocation())?;
        let len = config.page_width as usize
            * config.page_height as usize
            * usize::from(format.channels());
        Ok(Self {
            format,
            allocator: AtlasAllocator::new(size2(width, height)),
            texels: vec![0; len],
        })
    }

    /// Reserves a region with `padding` texels of gap to its right and above it.
    ///
    /// The gap is dropped along an axis where the region spans the whole page.
    fn allocate(
        &mut self,
        width: u32,
        height: u32,
        config: &ShelfAtlasConfig,
    ) -> Option<(u32, u32)> {
        let padded_width = (width + config.padding).min(config.page_width);
        let padded_height = (height + config.padding).min(config.page_height);
        let request = size2(
            i32::try_from(padded_width).ok()?,
            i32::try_from(padded_height).ok()?,
        );
        let allocation = self.allocator.allocate(request)?;
        let origin = allocation.rectangle.min;
        Some((u32::try_from(origin.x).ok()?, u32::try_from(origin.y).ok()?))
    }
}

impl fmt::Debug for Page {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Page")
            .field("format", &self.format)
            .field("size", &self.allocator.size())
            .field("texels", &self.texels.len())
            .finish()
    }
}

/// A [`GlyphAtlas`] that packs regions into CPU-side pages with a guillotine allocator.
///
/// Each page holds a single [`TextureDataFormat`]. Regions are never freed.
#[derive(Debug)]
pub struct ShelfAtlas {
    config: ShelfAtlasConfig,
    pages: SmallVec<[Page; 1]>,
    next_id: u32,
}

impl ShelfAtlas {
    /// Creates an empty atlas.
    pub fn new(config: ShelfAtlasConfig) -> Self {
        Self {
            config,
            pages: SmallVec::new(),
            next_id: 0,
        }
    }

    /// The options this atlas was created with.
    pub fn config(&self) -> &ShelfAtlasConfig {
        &self.config
    }

    /// Number of pages allocated so far.
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Number of sub-textures handed out.
    pub fn len(&self) -> usize {
        self.next_id as usize
    }

    /// Returns `true` if no sub-texture has been handed out.
    pub fn is_empty(&self) -> bool {
        self.next_id == 0
    }

    /// All texels of a page, rows bottom-up.
    pub fn page_texels(&self, page: u32) -> Option<&[u8]> {
        self.pages.get(page as usize).map(|p| p.texels.as_slice())
    }

    /// Reads back the texels of a region, rows bottom-up.
    pub fn texels(&self, sub_texture: &SubTexture) -> Option<Vec<u8>> {
        let page = self.pages.get(sub_texture.page as usize)?;
        let channels = usize::from(page.format.channels());
        let rect = sub_texture.rect;
        let stride = self.config.page_width as usize * channels;
        let row_len = rect.width as usize * channels;
        let mut out = Vec::with_capacity(row_len * rect.height as usize);
        for row in 0..rect.height as usize {
            let start = (rect.y as usize + row) * stride + rect.x as usize * channels;
            out.extend_from_slice(&page.texels[start..start + row_len]);
        }
        Some(out)
    }

    fn next_id(&mut self) -> SubTextureId {
        let id = SubTextureId(self.next_id);
        self.next_id += 1;
        id
    }
}

impl Default for ShelfAtlas {
    fn default() -> Self {
        Self::new(ShelfAtlasConfig::default())
    }
}

impl GlyphAtlas for ShelfAtlas {
    fn create_sub_texture(
        &mut self,
        width: u32,
        height: u32,
        scale: f32,
        sampling: TextureSampling,
        format: TextureDataFormat,
    ) -> Result<SubTexture, Error> {
        if width > self.config.page_width || height > self.config.page_height {
            return Err(Error::atlas_allocation());
        }
        // Empty glyphs (spaces) get a handle without consuming page space.
        if width == 0 || height == 0 {
            let page = self
                .pages
                .iter()
                .position(|p| p.format == format)
                .unwrap_or(0);
            return Ok(SubTexture {
                id: self.next_id(),
                page: u32::try_from(page).unwrap_or(u32::MAX),
                rect: AtlasRect {
                    width,
                    height,
                    ..AtlasRect::default()
                },
                format,
            });
        }
        let config = self.config;
        let placed = self
            .pages
            .iter_mut()
            .enumerate()
            .filter(|(_, page)| page.format == format)
            .find_map(|(index, page)| {
                page.allocate(width, height, &config)
                    .map(|(x, y)| (index, x, y))
            });
        let (page, x, y) = match placed {
            Some(placed) => placed,
            None => {
                let same_format = self.pages.iter().filter(|p| p.format == format).count();
                if same_format >= self.config.max_pages {
                    return Err(Error::atlas_allocation());
                }
                let mut page = Page::new(format, &config)?;
                let (x, y) = page
                    .allocate(width, height, &config)
                    .ok_or_else(Error::atlas_allocation)?;
                self.pages.push(page);
                (self.pages.len() - 1, x, y)
            }
        };
        trace!(
            "atlas: {width}x{height} {format:?} region at ({x}, {y}) on page {page}, scale {scale}, {sampling:?}"
        );
        Ok(SubTexture {
            id: self.next_id(),
            page: u32::try_from(page).map_err(|_| Error::atlas_allocation())?,
            rect: AtlasRect {
                x,
                y,
                width,
                height,
            },
            format,
        })
    }

    fn upload(
        &mut self,
        sub_texture: &SubTexture,
        data: &[u8],
        channels: u8,
    ) -> Result<(), Error> {
        let rect = sub_texture.rect;
        if channels != sub_texture.format.channels()
            || data.len() != rect.width as usize * rect.height as usize * usize::from(channels)
        {
            return Err(Error::atlas_upload());
        }
        if data.is_empty() {
            return Ok(());
        }
        let page_width = self.config.page_width as usize;
        let page = self
            .pages
            .get_mut(sub_texture.page as usize)
            .filter(|p| p.format == sub_texture.format)
            .ok_or_else(Error::atlas_upload)?;
        let channels = usize::from(channels);
        let row_len = rect.width as usize * channels;
        for (row, src) in data.chunks_exact(row_len).enumerate() {
            let start = ((rect.y as usize + row) * page_width + rect.x as usize) * channels;
            page.texels[start..start + row_len].copy_from_slice(src);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{
        GlyphAtlas, ShelfAtlas, ShelfAtlasConfig, SubTexture, TextureDataFormat, TextureSampling,
    };
    use crate::error::ErrorKind;

    fn small_atlas() -> ShelfAtlas {
        ShelfAtlas::new(ShelfAtlasConfig {
            page_width: 32,
            page_height: 16,
            padding: 1,
            max_pages: 1,
        })
    }

    fn alloc(atlas: &mut ShelfAtlas, w: u32, h: u32) -> SubTexture {
        atlas
            .create_sub_texture(w, h, 1.0, TextureSampling::Normal, TextureDataFormat::Red)
            .unwrap()
    }

    #[test]
    fn regions_do_not_overlap() {
        let mut atlas = small_atlas();
        let regions: Vec<_> = [(5, 3), (5, 2), (5, 3), (7, 3), (3, 1)]
            .into_iter()
            .map(|(w, h)| alloc(&mut atlas, w, h))
            .collect();
        for (i, a) in regions.iter().enumerate() {
            for b in &regions[i + 1..] {
                assert!(!a.rect.intersects(&b.rect), "{a:?} overlaps {b:?}");
            }
        }
        assert_eq!(atlas.len(), 5);
        assert_eq!(atlas.page_count(), 1);
    }

    #[test]
    fn padding_separates_neighbors() {
        let mut atlas = small_atlas();
        let regions: Vec<_> = (0..6).map(|_| alloc(&mut atlas, 4, 4)).collect();
        for (i, a) in regions.iter().enumerate() {
            for b in &regions[i + 1..] {
                let grown = super::AtlasRect {
                    width: a.rect.width + 1,
                    height: a.rect.height + 1,
                    ..a.rect
                };
                let other = super::AtlasRect {
                    width: b.rect.width + 1,
                    height: b.rect.height + 1,
                    ..b.rect
                };
                assert!(!grown.intersects(&other), "{a:?} touches {b:?}");
            }
        }
    }

    #[test]
    fn full_page_spills_to_a_new_page() {
        let mut atlas = ShelfAtlas::new(ShelfAtlasConfig {
            page_width: 8,
            page_height: 8,
            padding: 0,
            max_pages: 2,
        });
        let first = alloc(&mut atlas, 8, 8);
        let second = alloc(&mut atlas, 8, 8);
        assert_eq!((first.page, second.page), (0, 1));
        assert_eq!(atlas.page_count(), 2);
        let err = atlas
            .create_sub_texture(1, 1, 1.0, TextureSampling::Normal, TextureDataFormat::Red)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AtlasAllocation);
    }

    #[test]
    fn full_atlas_reports_allocation_error() {
        let mut atlas = small_atlas();
        alloc(&mut atlas, 32, 16);
        let err = atlas
            .create_sub_texture(1, 1, 1.0, TextureSampling::Normal, TextureDataFormat::Red)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AtlasAllocation);
        let err = atlas
            .create_sub_texture(33, 1, 1.0, TextureSampling::Normal, TextureDataFormat::Red)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AtlasAllocation);
    }

    #[test]
    fn formats_live_on_separate_pages() {
        let mut atlas = small_atlas();
        let red = alloc(&mut atlas, 2, 2);
        let sub = atlas
            .create_sub_texture(2, 2, 1.0, TextureSampling::Nearest, TextureDataFormat::SubPixel)
            .unwrap();
        assert_ne!(red.page, sub.page);
        assert_eq!(atlas.page_count(), 2);
    }

    #[test]
    fn upload_reads_back() {
        let mut atlas = small_atlas();
        alloc(&mut atlas, 3, 1);
        let region = alloc(&mut atlas, 2, 2);
        atlas.upload(&region, &[1, 2, 3, 4], 1).unwrap();
        assert_eq!(atlas.texels(&region).unwrap(), vec![1, 2, 3, 4]);
    }

    #[test]
    fn upload_validates_size_and_channels() {
        let mut atlas = small_atlas();
        let region = alloc(&mut atlas, 2, 2);
        assert_eq!(
            atlas.upload(&region, &[1, 2, 3], 1).unwrap_err().kind(),
            ErrorKind::AtlasUpload
        );
        assert_eq!(
            atlas.upload(&region, &[0; 16], 4).unwrap_err().kind(),
            ErrorKind::AtlasUpload
        );
    }

    #[test]
    fn empty_regions_take_no_space() {
        let mut atlas = small_atlas();
        let empty = alloc(&mut atlas, 0, 5);
        atlas.upload(&empty, &[], 1).unwrap();
        assert_eq!(atlas.page_count(), 0);
        alloc(&mut atlas, 32, 16);
    }
}
