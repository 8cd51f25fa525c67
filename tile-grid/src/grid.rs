//
// Copyright (c) Pirmin Kalberer. All rights reserved.
// Licensed under the MIT License. See LICENSE file in the project root for full license information.
//

//!Slippy map tile grid

use std::f64::consts::PI;

/// Maximum latitude of the spherical Mercator projection
pub const MAX_LAT: f64 = 85.05112877980659;

/// Geographic extent in degrees (minx = west, miny = south, maxx = east, maxy = north)
#[derive(PartialEq, Clone, Debug)]
pub struct Extent {
    pub minx: f64,
    pub miny: f64,
    pub maxx: f64,
    pub maxy: f64,
}

impl Extent {
    pub fn intersects(&self, other: &Extent) -> bool {
        self.minx < other.maxx
            && self.maxx > other.minx
            && self.miny < other.maxy
            && self.maxy > other.miny
    }
}

/// Min and max grid cell numbers. Upper bounds are exclusive.
#[derive(PartialEq, Clone, Debug)]
pub struct ExtentInt {
    pub minx: u32,
    pub miny: u32,
    pub maxx: u32,
    pub maxy: u32,
}

impl ExtentInt {
    pub fn is_empty(&self) -> bool {
        self.maxx <= self.minx || self.maxy <= self.miny
    }
    pub fn count(&self) -> u64 {
        if self.is_empty() {
            0
        } else {
            (self.maxx - self.minx) as u64 * (self.maxy - self.miny) as u64
        }
    }
}

/// Tile address in XYZ adressing scheme (row 0 at the north edge).
/// `x, y` are in `[0, 2^z)`. Plain value type, freely copied.
#[derive(PartialEq, Eq, PartialOrd, Ord, Hash, Clone, Copy, Debug)]
pub struct TileCoord {
    pub z: u8,
    pub x: u32,
    pub y: u32,
}

impl TileCoord {
    pub fn new(z: u8, x: u32, y: u32) -> TileCoord {
        TileCoord { z, x, y }
    }
}

/// Power-of-two tile grid over the spherical Mercator extent, addressed in
/// the XYZ scheme and measured in WGS84 degrees.
///
/// All tile boundary math is plain `f64`. At the zoom levels in scope
/// (<= ~20) the rounding error is orders of magnitude below one pixel of a
/// 512px tile, so no high-precision arithmetic is used.
#[derive(Clone, Debug)]
pub struct Grid {
    /// The geographical extent covered by the grid, in degrees.
    /// Latitude is clamped to the Mercator limit.
    pub extent: Extent,
}

impl Grid {
    /// Standard web map grid (Google/OSM compatible XYZ scheme)
    pub fn xyz() -> Grid {
        Grid {
            extent: Extent {
                minx: -180.0,
                miny: -MAX_LAT,
                maxx: 180.0,
                maxy: MAX_LAT,
            },
        }
    }
    /// (maxx, maxy) of grid level
    pub fn level_limit(&self, zoom: u8) -> (u32, u32) {
        let n = 1u32 << zoom;
        (n, n)
    }
    /// Continuous tile coordinates of a lon/lat position
    fn tile_frac(&self, lon: f64, lat: f64, zoom: u8) -> (f64, f64) {
        let n = (1u64 << zoom) as f64;
        let lat = lat.max(-MAX_LAT).min(MAX_LAT);
        let x = (lon + 180.0) / 360.0 * n;
        let y = (1.0 - lat.to_radians().tan().asinh() / PI) / 2.0 * n;
        (x, y)
    }
    /// Northern latitude of tile row `y`
    fn row_lat(&self, y: u32, zoom: u8) -> f64 {
        let n = (1u64 << zoom) as f64;
        (PI * (1.0 - 2.0 * y as f64 / n)).sinh().atan().to_degrees()
    }
    /// Extent of a given tile in the grid given its x, y, and z in XYZ adressing scheme
    pub fn tile_extent(&self, xtile: u32, ytile: u32, zoom: u8) -> Extent {
        let n = (1u64 << zoom) as f64;
        Extent {
            minx: xtile as f64 / n * 360.0 - 180.0,
            miny: self.row_lat(ytile + 1, zoom),
            maxx: (xtile + 1) as f64 / n * 360.0 - 180.0,
            maxy: self.row_lat(ytile, zoom),
        }
    }
    /// Tile containing a lon/lat position
    pub fn tile_at(&self, lon: f64, lat: f64, zoom: u8) -> TileCoord {
        let (maxx, maxy) = self.level_limit(zoom);
        let (x, y) = self.tile_frac(lon, lat, zoom);
        TileCoord {
            z: zoom,
            x: (x.floor() as i64).max(0).min(maxx as i64 - 1) as u32,
            y: (y.floor() as i64).max(0).min(maxy as i64 - 1) as u32,
        }
    }
    /// Tile index limits covering extent.
    ///
    /// An extent edge lying exactly on a tile boundary is inclusive on the
    /// lower edge and exclusive on the upper edge, consistent with the grid
    /// definition.
    pub fn tile_limits(&self, extent: &Extent, zoom: u8) -> ExtentInt {
        const EPSILON: f64 = 0.0000001;
        let (level_maxx, level_maxy) = self.level_limit(zoom);

        // Row numbers grow southwards, so the extent's north edge yields miny
        let (fminx, fminy) = self.tile_frac(extent.minx, extent.maxy, zoom);
        let (fmaxx, fmaxy) = self.tile_frac(extent.maxx, extent.miny, zoom);

        let minx = (fminx + EPSILON).floor() as i64;
        let maxx = (fmaxx - EPSILON).floor() as i64 + 1;
        let miny = (fminy + EPSILON).floor() as i64;
        let maxy = (fmaxy - EPSILON).floor() as i64 + 1;

        // to avoid requesting out-of-range tiles
        let clamp = |v: i64, max: u32| v.max(0).min(max as i64) as u32;
        let minx = clamp(minx, level_maxx);
        let maxx = clamp(maxx, level_maxx);
        let miny = clamp(miny, level_maxy);
        let maxy = clamp(maxy, level_maxy);

        ExtentInt {
            minx,
            miny,
            maxx: maxx.max(minx),
            maxy: maxy.max(miny),
        }
    }
}
