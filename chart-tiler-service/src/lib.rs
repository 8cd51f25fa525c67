//
// Copyright (c) Pirmin Kalberer. All rights reserved.
// Licensed under the MIT License. See LICENSE file in the project root for full license information.
//

#[macro_use]
extern crate log;

pub mod tile_service;
#[cfg(test)]
mod tile_service_test;

pub use tile_service::{GenerationStats, TileService};
