//
// Copyright (c) Pirmin Kalberer. All rights reserved.
// Licensed under the MIT License. See LICENSE file in the project root for full license information.
//

use crate::grid::{Extent, ExtentInt, Grid, TileCoord, MAX_LAT};

fn assert_extent_eq(a: &Extent, b: &Extent) {
    assert!((a.minx - b.minx).abs() < 1e-9, "minx {} != {}", a.minx, b.minx);
    assert!((a.miny - b.miny).abs() < 1e-9, "miny {} != {}", a.miny, b.miny);
    assert!((a.maxx - b.maxx).abs() < 1e-9, "maxx {} != {}", a.maxx, b.maxx);
    assert!((a.maxy - b.maxy).abs() < 1e-9, "maxy {} != {}", a.maxy, b.maxy);
}

#[test]
fn test_bbox() {
    let grid = Grid::xyz();

    let extent000 = grid.tile_extent(0, 0, 0);
    assert_extent_eq(
        &extent000,
        &Extent {
            minx: -180.0,
            miny: -MAX_LAT,
            maxx: 180.0,
            maxy: MAX_LAT,
        },
    );

    // Quadrants of zoom 1. The equator row boundary is exact.
    let extent = grid.tile_extent(0, 0, 1);
    assert_extent_eq(
        &extent,
        &Extent {
            minx: -180.0,
            miny: 0.0,
            maxx: 0.0,
            maxy: MAX_LAT,
        },
    );
    assert_eq!(extent.miny, 0.0);
    let extent = grid.tile_extent(1, 1, 1);
    assert_extent_eq(
        &extent,
        &Extent {
            minx: 0.0,
            miny: -MAX_LAT,
            maxx: 180.0,
            maxy: 0.0,
        },
    );

    // Well-known reference tile 10/486/332 (Irish Sea)
    let extent = grid.tile_extent(486, 332, 10);
    assert_extent_eq(
        &extent,
        &Extent {
            minx: -9.140625,
            miny: 53.33087298301705,
            maxx: -8.7890625,
            maxy: 53.54030739150022,
        },
    );
}

#[test]
fn test_tile_at() {
    let grid = Grid::xyz();

    // New York City
    let tile = grid.tile_at(-74.0060, 40.7128, 16);
    assert_eq!(tile, TileCoord::new(16, 19295, 24640));

    assert_eq!(grid.tile_at(0.0, 0.0, 0), TileCoord::new(0, 0, 0));

    // Positions on the grid edge stay within the level limits
    assert_eq!(grid.tile_at(180.0, -MAX_LAT, 2), TileCoord::new(2, 3, 3));
    assert_eq!(grid.tile_at(-180.0, MAX_LAT, 2), TileCoord::new(2, 0, 0));
}

#[test]
fn test_extent_to_tile_coverage() {
    let grid = Grid::xyz();

    // Full grid extent covers all tiles of the level
    let limits = grid.tile_limits(&grid.extent, 2);
    assert_eq!(
        limits,
        ExtentInt {
            minx: 0,
            miny: 0,
            maxx: 4,
            maxy: 4,
        }
    );

    // An extent matching one tile exactly yields that single tile:
    // boundaries are inclusive on the lower edge, exclusive on the upper
    let extent = grid.tile_extent(1, 1, 2);
    let limits = grid.tile_limits(&extent, 2);
    assert_eq!(
        limits,
        ExtentInt {
            minx: 1,
            miny: 1,
            maxx: 2,
            maxy: 2,
        }
    );

    // A small box well inside one tile
    let extent = Extent {
        minx: 10.1,
        miny: 45.1,
        maxx: 10.2,
        maxy: 45.2,
    };
    let limits = grid.tile_limits(&extent, 4);
    assert_eq!(limits.count(), 1);
    let tile = grid.tile_at(10.15, 45.15, 4);
    assert_eq!(limits.minx, tile.x);
    assert_eq!(limits.miny, tile.y);

    // Every covered tile intersects the extent, neighbours don't
    let extent = Extent {
        minx: -120.3,
        miny: 33.7,
        maxx: -100.9,
        maxy: 44.2,
    };
    let limits = grid.tile_limits(&extent, 6);
    for x in limits.minx..limits.maxx {
        for y in limits.miny..limits.maxy {
            assert!(grid.tile_extent(x, y, 6).intersects(&extent));
        }
    }
    if limits.minx > 0 {
        assert!(!grid
            .tile_extent(limits.minx - 1, limits.miny, 6)
            .intersects(&extent));
    }
    assert!(!grid
        .tile_extent(limits.maxx, limits.miny, 6)
        .intersects(&extent));
}

#[test]
fn test_limit_clamping() {
    let grid = Grid::xyz();

    // Extents reaching beyond the grid are clamped to valid tile numbers
    let extent = Extent {
        minx: -200.0,
        miny: -89.9,
        maxx: 200.0,
        maxy: 89.9,
    };
    let limits = grid.tile_limits(&extent, 3);
    assert_eq!(
        limits,
        ExtentInt {
            minx: 0,
            miny: 0,
            maxx: 8,
            maxy: 8,
        }
    );
}
