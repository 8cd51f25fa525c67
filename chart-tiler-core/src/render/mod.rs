//
// Copyright (c) Pirmin Kalberer. All rights reserved.
// Licensed under the MIT License. See LICENSE file in the project root for full license information.
//

pub mod composite;
pub mod tile;

pub use self::composite::composite;
pub use self::tile::{Tile, TileOutcome};
