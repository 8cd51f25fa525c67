//! A library for slippy map tile grid calculations
//!
//! ## Tile extents
//!
//! ```rust
//! use tile_grid::{Extent, Grid, MAX_LAT};
//!
//! let grid = Grid::xyz();
//! let extent = grid.tile_extent(0, 0, 1);
//! assert_eq!(extent.minx, -180.0);
//! assert_eq!(extent.maxx, 0.0);
//! assert_eq!(extent.miny, 0.0);
//! assert!((extent.maxy - MAX_LAT).abs() < 1e-9);
//! ```
//!
//! ## Grid iterators
//!
//! ```rust
//! use tile_grid::{Grid, GridIterator};
//!
//! let grid = Grid::xyz();
//! let limits = grid.tile_limits(&grid.extent, 2);
//! for tile in GridIterator::new(2, limits) {
//!     println!("Tile {}/{}/{}", tile.z, tile.x, tile.y);
//! }
//! ```

mod grid;
mod grid_iterator;
#[cfg(test)]
mod grid_test;

pub use grid::{Extent, ExtentInt, Grid, TileCoord, MAX_LAT};
pub use grid_iterator::GridIterator;
