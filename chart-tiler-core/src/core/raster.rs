//
// Copyright (c) Pirmin Kalberer. All rights reserved.
// Licensed under the MIT License. See LICENSE file in the project root for full license information.
//

//! Raster data model shared by catalog, resampler and compositor

use std::path::PathBuf;
use tile_grid::Extent;

/// Pixel layout of a source raster, resolved once when the catalog opens it
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub enum PixelFormat {
    Rgb,
    Rgba,
}

impl PixelFormat {
    pub fn from_band_count(count: usize) -> Result<PixelFormat, String> {
        match count {
            3 => Ok(PixelFormat::Rgb),
            4 => Ok(PixelFormat::Rgba),
            n => Err(format!("Unsupported number of raster bands: {}", n)),
        }
    }
    pub fn bands(&self) -> usize {
        match self {
            PixelFormat::Rgb => 3,
            PixelFormat::Rgba => 4,
        }
    }
}

/// Static description of a georeferenced source raster.
/// Immutable for the duration of a run.
#[derive(Clone, Debug)]
pub struct RasterMetadata {
    pub path: PathBuf,
    /// Raster width/height in pixels
    pub width: usize,
    pub height: usize,
    pub format: PixelFormat,
    pub nodata: Option<f64>,
    /// GDAL-style affine transform (origin x, pixel width, 0, origin y, 0, pixel height)
    pub geo_transform: [f64; 6],
    /// Spatial reference of the raster in WKT
    pub projection: String,
}

impl RasterMetadata {
    /// Source file name used in logs
    pub fn name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| self.path.display().to_string())
    }
    /// Bounds in the raster's native CRS, assuming a north-up transform
    pub fn native_extent(&self) -> Extent {
        let gt = &self.geo_transform;
        let (x0, x1) = (gt[0], gt[0] + self.width as f64 * gt[1]);
        let (y0, y1) = (gt[3], gt[3] + self.height as f64 * gt[5]);
        Extent {
            minx: x0.min(x1),
            miny: y0.min(y1),
            maxx: x0.max(x1),
            maxy: y0.max(y1),
        }
    }
}

/// Resampled pixel data of one source for one tile: `bands` planes of
/// `size x size` bytes, band-major. Produced by the resampler, consumed by
/// the compositor within the same task.
#[derive(Clone, Debug)]
pub struct PixelBuffer {
    pub size: usize,
    pub bands: usize,
    data: Vec<u8>,
}

impl PixelBuffer {
    pub fn new(size: usize, bands: usize) -> PixelBuffer {
        PixelBuffer {
            size,
            bands,
            data: vec![0; bands * size * size],
        }
    }
    pub fn band(&self, band: usize) -> &[u8] {
        let plane = self.size * self.size;
        &self.data[band * plane..(band + 1) * plane]
    }
    pub fn band_mut(&mut self, band: usize) -> &mut [u8] {
        let plane = self.size * self.size;
        &mut self.data[band * plane..(band + 1) * plane]
    }
    pub fn get(&self, band: usize, row: usize, col: usize) -> u8 {
        self.data[band * self.size * self.size + row * self.size + col]
    }
    pub fn set(&mut self, band: usize, row: usize, col: usize, value: u8) {
        self.data[band * self.size * self.size + row * self.size + col] = value;
    }
    /// Per-pixel alpha used when merging this buffer onto a composite.
    ///
    /// A fourth band that is not uniformly zero is taken as the source's own
    /// alpha channel. Otherwise a mask is synthesized marking every pixel
    /// opaque where any of the first three bands is non-zero.
    pub fn coverage_mask(&self) -> Vec<u8> {
        let plane = self.size * self.size;
        if self.bands >= 4 {
            let alpha = self.band(3);
            if alpha.iter().any(|&a| a != 0) {
                return alpha.to_vec();
            }
        }
        let mut mask = vec![0u8; plane];
        for band in 0..self.bands.min(3) {
            for (m, &v) in mask.iter_mut().zip(self.band(band)) {
                if v != 0 {
                    *m = 255;
                }
            }
        }
        mask
    }
}
