//
// Copyright (c) Pirmin Kalberer. All rights reserved.
// Licensed under the MIT License. See LICENSE file in the project root for full license information.
//

//! Reprojecting resampler from source rasters into tile pixel grids

use crate::catalog::wgs84;
use chart_tiler_core::core::raster::{PixelBuffer, RasterMetadata};
use gdal::spatial_ref::{AxisMappingStrategy, CoordTransform, SpatialRef};
use gdal::Dataset;
use tile_grid::Extent;

/// Upper bound of the read resolution, as a multiple of the tile size per
/// axis. Larger source windows are decimated by GDAL on read, which keeps
/// low-zoom tiles over large charts within a bounded memory footprint.
const MAX_READ_FACTOR: usize = 4;

/// Resample one source raster into the pixel grid of one tile.
///
/// Every destination pixel center is projected from lat/lon into the source
/// CRS and sampled with fixed **bilinear** interpolation, so two invocations
/// over the same inputs produce byte-identical buffers. Per band the raw
/// values are rescaled linearly to `[0,255]` over the whole destination
/// buffer; a constant band comes out all-zero. Destination pixels outside
/// the source coverage and no-data samples contribute a raw value of 0.
///
/// Reads `min(source bands, tile_bands)` bands. Errors are per-task: the
/// caller drops this source's contribution and carries on.
pub fn resample(
    source: &RasterMetadata,
    tile_extent: &Extent,
    tile_size: u16,
    tile_bands: u8,
) -> Result<PixelBuffer, String> {
    let size = tile_size as usize;
    let bands = source.format.bands().min(tile_bands as usize);
    let npix = size * size;

    let ds = Dataset::open(&source.path)
        .map_err(|e| format!("{}: {}", source.path.display(), e))?;
    let mut src_srs = SpatialRef::from_wkt(&source.projection)
        .map_err(|e| format!("{}: {}", source.path.display(), e))?;
    src_srs.set_axis_mapping_strategy(AxisMappingStrategy::TraditionalGisOrder);

    // Destination pixel centers in lon/lat, row major from the north-west
    let dx = (tile_extent.maxx - tile_extent.minx) / size as f64;
    let dy = (tile_extent.maxy - tile_extent.miny) / size as f64;
    let mut xs = Vec::with_capacity(npix);
    let mut ys = Vec::with_capacity(npix);
    for row in 0..size {
        let lat = tile_extent.maxy - (row as f64 + 0.5) * dy;
        for col in 0..size {
            xs.push(tile_extent.minx + (col as f64 + 0.5) * dx);
            ys.push(lat);
        }
    }
    let mut zs = vec![0.0; npix];
    let transform = CoordTransform::new(&wgs84()?, &src_srs)
        .map_err(|e| format!("{}: {}", source.path.display(), e))?;
    transform
        .transform_coords(&mut xs, &mut ys, &mut zs)
        .map_err(|e| {
            format!(
                "{}: tile {:?} projection failed ({})",
                source.path.display(),
                tile_extent,
                e
            )
        })?;

    // Fractional source pixel coordinates (north-up transform)
    let gt = &source.geo_transform;
    for i in 0..npix {
        xs[i] = (xs[i] - gt[0]) / gt[1];
        ys[i] = (ys[i] - gt[3]) / gt[5];
    }

    let window = match source_window(&xs, &ys, source.width, source.height) {
        Some(w) => w,
        // Tile entirely outside the raster: all-transparent buffer
        None => return Ok(PixelBuffer::new(size, bands)),
    };
    let (win_x, win_y, win_w, win_h) = window;
    let out_w = win_w.min(MAX_READ_FACTOR * size);
    let out_h = win_h.min(MAX_READ_FACTOR * size);
    let sx = out_w as f64 / win_w as f64;
    let sy = out_h as f64 / win_h as f64;

    let mut buffer = PixelBuffer::new(size, bands);
    let mut raw = vec![0.0f64; npix];
    for b in 0..bands {
        let band = ds
            .rasterband(b + 1)
            .map_err(|e| format!("{}: {}", source.path.display(), e))?;
        let data = band
            .read_as::<f64>(
                (win_x as isize, win_y as isize),
                (win_w, win_h),
                (out_w, out_h),
                None,
            )
            .map_err(|e| format!("{}: read failed ({})", source.path.display(), e))?;
        let samples = data.data();

        for v in raw.iter_mut() {
            *v = 0.0;
        }
        for i in 0..npix {
            let u = (xs[i] - win_x as f64) * sx - 0.5;
            let v = (ys[i] - win_y as f64) * sy - 0.5;
            if !u.is_finite()
                || !v.is_finite()
                || u < -0.5
                || v < -0.5
                || u > out_w as f64 - 0.5
                || v > out_h as f64 - 0.5
            {
                continue;
            }
            let value = bilinear(samples, out_w, out_h, u, v, source.nodata);
            if value.is_finite() {
                raw[i] = value;
            }
        }

        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        for &v in &raw {
            min = min.min(v);
            max = max.max(v);
        }
        if min < max {
            let scale = 255.0 / (max - min);
            for (out, &v) in buffer.band_mut(b).iter_mut().zip(&raw) {
                *out = ((v - min) * scale) as u8;
            }
        }
        // min == max: band stays all-zero
    }
    Ok(buffer)
}

/// Pixel window of the source raster covering all destination sample
/// positions, padded by one pixel for the interpolation kernel.
/// `None` if the tile does not touch the raster.
fn source_window(
    xs: &[f64],
    ys: &[f64],
    width: usize,
    height: usize,
) -> Option<(usize, usize, usize, usize)> {
    let mut minx = f64::INFINITY;
    let mut maxx = f64::NEG_INFINITY;
    let mut miny = f64::INFINITY;
    let mut maxy = f64::NEG_INFINITY;
    for (&x, &y) in xs.iter().zip(ys) {
        if x.is_finite() && y.is_finite() {
            minx = minx.min(x);
            maxx = maxx.max(x);
            miny = miny.min(y);
            maxy = maxy.max(y);
        }
    }
    if minx > maxx || maxx < 0.0 || minx > width as f64 || maxy < 0.0 || miny > height as f64 {
        return None;
    }
    let x0 = ((minx.floor() as i64) - 1).max(0).min(width as i64) as usize;
    let x1 = ((maxx.ceil() as i64) + 1).max(0).min(width as i64) as usize;
    let y0 = ((miny.floor() as i64) - 1).max(0).min(height as i64) as usize;
    let y1 = ((maxy.ceil() as i64) + 1).max(0).min(height as i64) as usize;
    if x1 <= x0 || y1 <= y0 {
        return None;
    }
    Some((x0, y0, x1 - x0, y1 - y0))
}

/// Bilinear interpolation at fractional position `(u, v)` of a row-major
/// sample grid; edge samples are clamped. Returns NaN if a contributing
/// sample carries the no-data value.
fn bilinear(data: &[f64], width: usize, height: usize, u: f64, v: f64, nodata: Option<f64>) -> f64 {
    let x0 = u.floor() as i64;
    let y0 = v.floor() as i64;
    let cx = |x: i64| x.max(0).min(width as i64 - 1) as usize;
    let cy = |y: i64| y.max(0).min(height as i64 - 1) as usize;
    let xf = u - x0 as f64;
    let yf = v - y0 as f64;

    let v00 = data[cy(y0) * width + cx(x0)];
    let v10 = data[cy(y0) * width + cx(x0 + 1)];
    let v01 = data[cy(y0 + 1) * width + cx(x0)];
    let v11 = data[cy(y0 + 1) * width + cx(x0 + 1)];
    if [v00, v10, v01, v11]
        .iter()
        .any(|&v| v.is_nan() || nodata.map_or(false, |nd| v == nd))
    {
        return f64::NAN;
    }

    let top = v00 * (1.0 - xf) + v10 * xf;
    let bottom = v01 * (1.0 - xf) + v11 * xf;
    top * (1.0 - yf) + bottom * yf
}
