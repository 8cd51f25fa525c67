//
// Copyright (c) Pirmin Kalberer. All rights reserved.
// Licensed under the MIT License. See LICENSE file in the project root for full license information.
//

//! Grid iterators

use crate::grid::{ExtentInt, TileCoord};

/// Iterator over all tiles of one zoom level within index limits
pub struct GridIterator {
    z: u8,
    x: u32,
    y: u32,
    limits: ExtentInt,
    finished: bool,
}

impl GridIterator {
    pub fn new(zoom: u8, limits: ExtentInt) -> GridIterator {
        let finished = limits.is_empty();
        GridIterator {
            z: zoom,
            x: limits.minx,
            y: limits.miny,
            limits,
            finished,
        }
    }
}

impl Iterator for GridIterator {
    type Item = TileCoord;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        let current = TileCoord::new(self.z, self.x, self.y);
        if self.y < self.limits.maxy - 1 {
            self.y += 1;
        } else if self.x < self.limits.maxx - 1 {
            self.x += 1;
            self.y = self.limits.miny;
        } else {
            self.finished = true;
        }
        Some(current)
    }
}

#[test]
fn test_grid_iter() {
    use crate::grid::Grid;
    let grid = Grid::xyz();
    let limits = grid.tile_limits(&grid.extent, 1);
    let cells = GridIterator::new(1, limits).collect::<Vec<_>>();
    assert_eq!(
        cells,
        vec![
            TileCoord::new(1, 0, 0),
            TileCoord::new(1, 0, 1),
            TileCoord::new(1, 1, 0),
            TileCoord::new(1, 1, 1),
        ]
    );

    let limits = grid.tile_limits(&grid.extent, 0);
    let cells = GridIterator::new(0, limits).collect::<Vec<_>>();
    assert_eq!(cells, vec![TileCoord::new(0, 0, 0)]);
}

#[test]
fn test_empty_limits() {
    let limits = ExtentInt {
        minx: 3,
        miny: 7,
        maxx: 3,
        maxy: 7,
    };
    let cells = GridIterator::new(5, limits).collect::<Vec<_>>();
    assert_eq!(cells, vec![]);
}
