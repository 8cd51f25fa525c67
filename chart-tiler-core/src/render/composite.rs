//
// Copyright (c) Pirmin Kalberer. All rights reserved.
// Licensed under the MIT License. See LICENSE file in the project root for full license information.
//

//! Alpha compositing of resampled source buffers

use crate::core::raster::PixelBuffer;
use image::{Rgba, RgbaImage};

/// Merge the resampled buffers of all sources contributing to one tile into
/// a single RGBA image.
///
/// The output starts fully transparent. Buffers are painted in slice order
/// with their coverage mask as a stencil: masked pixels overwrite color and
/// alpha, unmasked pixels leave the composite untouched. On overlap the last
/// source wins ("painter's algorithm"); callers provide a stable ordering.
pub fn composite(buffers: &[PixelBuffer], size: u32) -> RgbaImage {
    let mut img = RgbaImage::from_pixel(size, size, Rgba([0, 0, 0, 0]));
    for buf in buffers {
        if buf.size != size as usize {
            warn!("Ignoring buffer of size {} in {}px composite", buf.size, size);
            continue;
        }
        let mask = buf.coverage_mask();
        for row in 0..buf.size {
            for col in 0..buf.size {
                let alpha = mask[row * buf.size + col];
                if alpha == 0 {
                    continue;
                }
                let px = Rgba([
                    buf.get(0, row, col),
                    if buf.bands > 1 { buf.get(1, row, col) } else { 0 },
                    if buf.bands > 2 { buf.get(2, row, col) } else { 0 },
                    alpha,
                ]);
                img.put_pixel(col as u32, row as u32, px);
            }
        }
    }
    img
}
