// Copyright 2025 the Parley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Pixel modes and synthetic emboldening of rasterized glyph bitmaps.

use crate::fixed::F26Dot6;
use crate::rasterizer::{NativePixelFormat, RasterBitmap};

/// Pixel layout of a cached glyph.
#[derive(Copy, Clone, Default, PartialEq, Eq, Hash, Debug)]
pub enum PixelMode {
    /// Unknown or empty.
    #[default]
    None,
    /// 1-bit coverage.
    Mono,
    /// 8-bit coverage.
    Gray,
    /// 2-bit coverage.
    Gray2Bit,
    /// 4-bit coverage.
    Gray4Bit,
    /// Horizontal LCD sub-pixel coverage.
    LcdHorizontal,
    /// Vertical LCD sub-pixel coverage.
    LcdVertical,
    /// Color.
    Bgra,
}

impl PixelMode {
    /// Classifies a rasterizer pixel format. Unknown formats are [`PixelMode::None`].
    pub fn classify(format: NativePixelFormat) -> Self {
        match format {
            NativePixelFormat::Mono => Self::Mono,
            NativePixelFormat::Gray => Self::Gray,
            NativePixelFormat::Gray2 => Self::Gray2Bit,
            NativePixelFormat::Gray4 => Self::Gray4Bit,
            NativePixelFormat::Lcd => Self::LcdHorizontal,
            NativePixelFormat::LcdVertical => Self::LcdVertical,
            NativePixelFormat::Bgra => Self::Bgra,
            NativePixelFormat::None | NativePixelFormat::Other(_) => Self::None,
        }
    }

    /// Whether glyphs in this mode are packed as sub-pixel texels.
    pub fn is_subpixel(self) -> bool {
        self == Self::LcdHorizontal
    }
}

/// Reads the 8-bit coverage of sample `x` in a row of a low bit depth bitmap.
pub(crate) fn gray_sample(row: &[u8], x: usize, format: NativePixelFormat) -> u8 {
    match format {
        NativePixelFormat::Mono => {
            if row[x / 8] & (0x80 >> (x % 8)) != 0 {
                0xFF
            } else {
                0x00
            }
        }
        NativePixelFormat::Gray2 => {
            let shift = 6 - 2 * (x % 4);
            ((row[x / 4] >> shift) & 0x03) * 0x55
        }
        NativePixelFormat::Gray4 => {
            let shift = 4 - 4 * (x % 2);
            ((row[x / 2] >> shift) & 0x0F) * 0x11
        }
        NativePixelFormat::Bgra => row[x * 4 + 3],
        _ => row[x],
    }
}

/// Widens a bitmap horizontally to synthesize a bolder weight.
///
/// `strength` is the horizontal dilation in 26.6 device pixels. Low bit depth bitmaps are
/// converted to 8-bit gray first; LCD bitmaps dilate by three samples per pixel. Color
/// and empty bitmaps are left alone.
pub(crate) fn embolden(bitmap: &mut RasterBitmap, strength: F26Dot6) {
    let pixels = strength.round().to_bits() >> 6;
    if pixels <= 0 || bitmap.width == 0 || bitmap.rows == 0 {
        return;
    }
    let samples = match bitmap.format {
        NativePixelFormat::Mono | NativePixelFormat::Gray2 | NativePixelFormat::Gray4 => {
            convert_to_gray(bitmap);
            pixels
        }
        NativePixelFormat::Gray => pixels,
        NativePixelFormat::Lcd => pixels * 3,
        _ => return,
    };
    let samples = samples.unsigned_abs() as usize;
    let old_width = bitmap.width as usize;
    let new_width = old_width + samples;
    let mut buffer = vec![0_u8; new_width * bitmap.rows as usize];
    for y in 0..bitmap.rows {
        let src = bitmap.row(y);
        let dst = &mut buffer[y as usize * new_width..(y as usize + 1) * new_width];
        for (x, out) in dst.iter_mut().enumerate() {
            let first = x.saturating_sub(samples);
            let last = x.min(old_width - 1);
            *out = src[first..=last].iter().copied().max().unwrap_or(0);
        }
    }
    bitmap.width = u32::try_from(new_width).unwrap_or(u32::MAX);
    bitmap.pitch = new_width;
    bitmap.buffer = buffer;
}

fn convert_to_gray(bitmap: &mut RasterBitmap) {
    let width = bitmap.width as usize;
    let mut buffer = Vec::with_capacity(width * bitmap.rows as usize);
    for y in 0..bitmap.rows {
        let row = bitmap.row(y);
        buffer.extend((0..width).map(|x| gray_sample(row, x, bitmap.format)));
    }
    bitmap.pitch = width;
    bitmap.format = NativePixelFormat::Gray;
    bitmap.buffer = buffer;
}
