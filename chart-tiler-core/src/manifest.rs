//
// Copyright (c) Pirmin Kalberer. All rights reserved.
// Licensed under the MIT License. See LICENSE file in the project root for full license information.
//

//! Chart update manifest passed along the processing pipeline

use crate::cache::{Cache, Filecache};
use std::fs;
use std::path::Path;

pub const MANIFEST_FILE: &str = "update_metadata.json";

/// Publication record produced by the chart extraction stage:
/// `last_updated` ISO-8601 timestamp and one entry per processed chart.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct UpdateManifest {
    pub last_updated: String,
    pub maps: Vec<ManifestEntry>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct ManifestEntry {
    pub name: String,
    pub last_updated: String,
}

/// Copy the update manifest from the source directory into the tile cache,
/// unmodified. The file is parsed first so a corrupt manifest is reported
/// instead of propagated. Returns `Ok(false)` when no manifest is present.
pub fn copy_manifest(source_dir: &Path, cache: &Filecache) -> Result<bool, String> {
    let src = source_dir.join(MANIFEST_FILE);
    if !src.exists() {
        return Ok(false);
    }
    let data =
        fs::read(&src).map_err(|e| format!("Error reading {}: {}", src.display(), e))?;
    let manifest: UpdateManifest = serde_json::from_slice(&data)
        .map_err(|e| format!("Invalid manifest {}: {}", src.display(), e))?;
    info!(
        "Copying update manifest ({} maps, last updated {})",
        manifest.maps.len(),
        manifest.last_updated
    );
    cache
        .write(MANIFEST_FILE, &data)
        .map_err(|e| format!("Error writing {}: {}", MANIFEST_FILE, e))?;
    Ok(true)
}
