//
// Copyright (c) Pirmin Kalberer. All rights reserved.
// Licensed under the MIT License. See LICENSE file in the project root for full license information.
//

//! Tile artifact encoding and the write/skip decision

use crate::cache::{Cache, Filecache};
use image::RgbaImage;
use std::io::Cursor;
use tile_grid::TileCoord;

/// Terminal state of one tile task
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub enum TileOutcome {
    Written,
    Skipped,
}

/// Composited RGBA tile ready for persistence
pub struct Tile {
    pub coord: TileCoord,
    pub image: RgbaImage,
}

impl Tile {
    pub fn new(coord: TileCoord, image: RgbaImage) -> Tile {
        Tile { coord, image }
    }
    /// Cache path of the tile artifact
    pub fn path(&self) -> String {
        format!("{}/{}/{}.png", self.coord.z, self.coord.x, self.coord.y)
    }
    /// True if no pixel of the composite is opaque
    pub fn is_blank(&self) -> bool {
        self.image.pixels().all(|px| px.0[3] == 0)
    }
    /// PNG-encoded tile content
    pub fn to_png(&self) -> Result<Vec<u8>, String> {
        let mut bytes: Vec<u8> = Vec::new();
        self.image
            .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
            .map_err(|e| format!("PNG encoding failed: {}", e))?;
        Ok(bytes)
    }
    /// Persist the tile, skipping fully transparent composites.
    ///
    /// The blank check and the write happen under the tile's advisory lock
    /// so a concurrent regeneration of the same path cannot interleave a
    /// partial write. The lock is released on every exit path.
    pub fn write(&self, cache: &Filecache) -> Result<TileOutcome, String> {
        let path = self.path();
        let _lock = cache
            .lock(&path)
            .map_err(|e| format!("Locking {} failed: {}", path, e))?;
        if self.is_blank() {
            debug!("{} - Skipping empty tile", path);
            return Ok(TileOutcome::Skipped);
        }
        let png = self.to_png()?;
        cache
            .write(&path, &png)
            .map_err(|e| format!("Error writing {}: {}", path, e))?;
        debug!("{} - {} bytes written", path, png.len());
        Ok(TileOutcome::Written)
    }
}
