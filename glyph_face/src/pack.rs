// Copyright 2025 the Parley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Conversion of rasterized bitmaps into atlas texel data.
//!
//! Bitmaps arrive top-down; atlas textures are addressed bottom-up, so every packer
//! writes source row `y` to destination row `rows - 1 - y`. Destination texels outside
//! the bitmap (the sub-texture size is rounded up) stay zero.

use crate::bitmap::gray_sample;
use crate::rasterizer::{NativePixelFormat, RasterBitmap};

/// Bytes per texel of sub-pixel data.
pub(crate) const SUBPIXEL_CHANNELS: u8 = 4;

/// Bytes per texel of single channel data.
pub(crate) const SINGLE_CHANNEL: u8 = 1;

/// Taps of the horizontal FIR filter applied to LCD coverage to reduce color fringes.
const LCD_FILTER: [f64; 5] = [1.5 / 16.0, 3.5 / 16.0, 6.0 / 16.0, 3.5 / 16.0, 1.5 / 16.0];

/// Filters LCD coverage into `width x height` texels of [`SUBPIXEL_CHANNELS`] bytes.
///
/// Sample `x` of the bitmap lands in channel `x % 3` of texel `x / 3`.
#[expect(
    clippy::cast_possible_truncation,
    reason = "each tap is in 0..=255 and the taps sum to one"
)]
pub(crate) fn pack_subpixel(bitmap: &RasterBitmap, width: u32, height: u32) -> Vec<u8> {
    let stride = width as usize * usize::from(SUBPIXEL_CHANNELS);
    let mut texels = vec![0_u8; stride * height as usize];
    let samples = bitmap.width as usize;
    for y in 0..bitmap.rows.min(height) {
        let row = bitmap.row(y);
        let dst_row = (bitmap.rows - 1 - y) as usize * stride;
        for x in 0..samples {
            let mut value: u8 = 0;
            for (tap, coefficient) in LCD_FILTER.iter().enumerate() {
                let Some(s) = (x + tap).checked_sub(2) else {
                    continue;
                };
                if s < samples {
                    value = value.saturating_add((f64::from(row[s]) * coefficient) as u8);
                }
            }
            let texel = x / 3;
            if texel < width as usize {
                texels[dst_row + texel * usize::from(SUBPIXEL_CHANNELS) + x % 3] = value;
            }
        }
    }
    texels
}

/// Converts coverage into `width x height` single byte texels.
///
/// Mono bits expand to `0xFF`/`0x00`, 2 and 4 bit gray scale up to 8 bits, color
/// bitmaps contribute their alpha, and everything else is copied byte for byte.
pub(crate) fn pack_single_channel(bitmap: &RasterBitmap, width: u32, height: u32) -> Vec<u8> {
    let stride = width as usize;
    let mut texels = vec![0_u8; stride * height as usize];
    let columns = (bitmap.width as usize).min(stride);
    for y in 0..bitmap.rows.min(height) {
        let row = bitmap.row(y);
        let dst = &mut texels[(bitmap.rows - 1 - y) as usize * stride..][..columns];
        match bitmap.format {
            NativePixelFormat::Gray => dst.copy_from_slice(&row[..columns]),
            format => {
                for (x, texel) in dst.iter_mut().enumerate() {
                    *texel = gray_sample(row, x, format);
                }
            }
        }
    }
    texels
}

#[cfg(test)]
mod tests {
    use super::{pack_single_channel, pack_subpixel};
    use crate::rasterizer::{NativePixelFormat, RasterBitmap};

    #[test]
    fn subpixel_filter_spreads_a_single_sample() {
        // One full-coverage sample in the middle of a 2 pixel (6 sample) row.
        let bitmap = RasterBitmap {
            width: 6,
            rows: 1,
            pitch: 6,
            format: NativePixelFormat::Lcd,
            buffer: vec![0, 0, 255, 0, 0, 0],
        };
        let texels = pack_subpixel(&bitmap, 2, 1);
        // 255 * 1.5/16 = 23, 255 * 3.5/16 = 55, 255 * 6/16 = 95
        assert_eq!(texels, vec![23, 55, 95, 0, 55, 23, 0, 0]);
    }

    #[test]
    fn subpixel_rows_are_flipped() {
        let bitmap = RasterBitmap {
            width: 3,
            rows: 2,
            pitch: 3,
            format: NativePixelFormat::Lcd,
            buffer: vec![0, 0, 0, 255, 255, 255],
        };
        let texels = pack_subpixel(&bitmap, 1, 2);
        assert_eq!(&texels[4..], &[0, 0, 0, 0]);
        assert!(texels[..3].iter().all(|&c| c > 0));
    }

    #[test]
    fn mono_bits_expand_and_flip() {
        let bitmap = RasterBitmap {
            width: 10,
            rows: 2,
            pitch: 2,
            format: NativePixelFormat::Mono,
            buffer: vec![0b1010_0000, 0b0100_0000, 0b0000_0001, 0b1000_0000],
        };
        let texels = pack_single_channel(&bitmap, 10, 2);
        assert_eq!(
            &texels[..10],
            &[0, 0, 0, 0, 0, 0, 0, 0xFF, 0xFF, 0],
            "bottom texel row holds the last bitmap row"
        );
        assert_eq!(
            &texels[10..],
            &[0xFF, 0, 0xFF, 0, 0, 0, 0, 0, 0, 0xFF],
            "top texel row holds the first bitmap row"
        );
    }

    #[test]
    fn gray_copies_and_pads() {
        let bitmap = RasterBitmap {
            width: 2,
            rows: 1,
            pitch: 4,
            format: NativePixelFormat::Gray,
            buffer: vec![7, 9, 99, 99],
        };
        assert_eq!(pack_single_channel(&bitmap, 3, 2), vec![7, 9, 0, 0, 0, 0]);
    }
}
