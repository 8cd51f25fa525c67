//
// Copyright (c) Pirmin Kalberer. All rights reserved.
// Licensed under the MIT License. See LICENSE file in the project root for full license information.
//

use crate::tile_service::TileService;
use chart_tiler_core::cache::{Cache, Filecache};
use chart_tiler_gdal::ChartCatalog;
use gdal::raster::Buffer;
use gdal::spatial_ref::SpatialRef;
use gdal::DriverManager;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use tile_grid::Grid;

const W: usize = 32;

/// 32x32 3-band chart raster over a one degree square (EPSG:4326)
fn create_chart(dir: &Path, name: &str, west: f64, north: f64, value: u8) {
    let path = dir.join(name);
    let driver = DriverManager::get_driver_by_name("GTiff").unwrap();
    let mut ds = driver.create(&path, W, W, 3).unwrap();
    ds.set_geo_transform(&[west, 1.0 / W as f64, 0.0, north, 0.0, -1.0 / W as f64])
        .unwrap();
    let srs = SpatialRef::from_epsg(4326).unwrap();
    ds.set_spatial_ref(&srs).unwrap();
    for b in 1..=3 {
        let mut band = ds.rasterband(b).unwrap();
        let mut buf = Buffer::new((W, W), vec![value; W * W]);
        band.write((0, 0), (W, W), &mut buf).unwrap();
    }
}

fn test_dirs(name: &str) -> (PathBuf, PathBuf) {
    let sources = env::temp_dir().join(format!("{}_sources", name));
    let cache = env::temp_dir().join(format!("{}_cache", name));
    let _ = fs::remove_dir_all(&sources);
    let _ = fs::remove_dir_all(&cache);
    fs::create_dir_all(&sources).unwrap();
    (sources, cache)
}

fn test_service(sources_dir: &Path, cache_dir: &Path) -> TileService {
    let catalog = ChartCatalog::scan(sources_dir).unwrap();
    TileService {
        sources: catalog.sources,
        grid: Grid::xyz(),
        minzoom: 0,
        maxzoom: 20,
        tile_size: 64,
        tile_bands: 4,
        workers: None,
        cache: Filecache {
            basepath: format!("{}", cache_dir.display()),
        },
    }
}

fn tile_paths(cache_dir: &Path) -> Vec<String> {
    let mut paths = Vec::new();
    let mut stack = vec![cache_dir.to_path_buf()];
    while let Some(dir) = stack.pop() {
        for entry in fs::read_dir(&dir).unwrap() {
            let path = entry.unwrap().path();
            if path.is_dir() {
                stack.push(path);
            } else if path.extension().and_then(|e| e.to_str()) == Some("png") {
                paths.push(
                    path.strip_prefix(cache_dir)
                        .unwrap()
                        .to_string_lossy()
                        .to_string(),
                );
            }
        }
    }
    paths.sort();
    paths
}

#[test]
fn test_level_tasks_dedup() {
    let (sources, cache) = test_dirs("chart_tiler_svc_dedup");
    // Two charts over the identical extent request the same tiles
    create_chart(&sources, "first.tif", -107.0, 36.0, 120);
    create_chart(&sources, "second.tif", -107.0, 36.0, 200);
    let service = test_service(&sources, &cache);
    assert_eq!(service.sources.len(), 2);

    let tasks = service.level_tasks(7);
    // Same task set as a single source would produce
    let limits = service
        .grid
        .tile_limits(&service.sources[0].latlon_extent, 7);
    assert_eq!(tasks.len() as u64, limits.count());
    for tile in &tasks {
        assert!(service
            .grid
            .tile_extent(tile.x, tile.y, 7)
            .intersects(&service.sources[0].latlon_extent));
    }
}

#[test]
fn test_generate_writes_covered_tiles() {
    let (sources, cache) = test_dirs("chart_tiler_svc_generate");
    create_chart(&sources, "chart.tif", -107.0, 36.0, 150);
    let service = test_service(&sources, &cache);

    let stats = service.generate(Some(6), Some(6), Some(2), false, false);
    assert_eq!(stats.failed, 0);
    let tasks = service.level_tasks(6);
    assert_eq!(
        stats.written + stats.skipped,
        tasks.len() as u64,
        "every task reaches a terminal outcome"
    );
    let written = tile_paths(&cache);
    assert_eq!(written.len() as u64, stats.written);
    for path in &written {
        assert!(path.starts_with("6/"));
        // No lock files left behind
        assert!(!service.cache.exists(&format!("{}.lock", path)));
    }
    assert!(stats.written >= 1);

    // A second run without overwrite skips everything already cached
    let stats2 = service.generate(Some(6), Some(6), Some(2), false, false);
    assert_eq!(stats2.written, 0);
    assert_eq!(stats2.skipped, tasks.len() as u64);
}

#[test]
fn test_parallelism_parity() {
    let (sources, cache1) = test_dirs("chart_tiler_svc_parity1");
    let cache2 = env::temp_dir().join("chart_tiler_svc_parity2_cache");
    let _ = fs::remove_dir_all(&cache2);
    create_chart(&sources, "west.tif", -107.0, 36.0, 90);
    create_chart(&sources, "east.tif", -106.0, 36.0, 210);

    let service1 = test_service(&sources, &cache1);
    let stats1 = service1.generate(Some(7), Some(7), Some(1), false, false);
    let service2 = test_service(&sources, &cache2);
    let stats2 = service2.generate(Some(7), Some(7), Some(8), false, false);

    assert_eq!(stats1, stats2);
    let paths1 = tile_paths(&cache1);
    let paths2 = tile_paths(&cache2);
    assert_eq!(paths1, paths2);
    for path in &paths1 {
        let bytes1 = fs::read(cache1.join(path)).unwrap();
        let bytes2 = fs::read(cache2.join(path)).unwrap();
        assert_eq!(bytes1, bytes2, "{} differs between runs", path);
    }
}

#[test]
fn test_regenerate_single_tile() {
    let (sources, cache) = test_dirs("chart_tiler_svc_regen");
    create_chart(&sources, "chart.tif", -107.0, 36.0, 150);
    let service = test_service(&sources, &cache);

    service.generate(Some(8), Some(8), Some(2), false, false);
    let before: Vec<(String, Vec<u8>)> = tile_paths(&cache)
        .into_iter()
        .map(|p| {
            let bytes = fs::read(cache.join(&p)).unwrap();
            (p, bytes)
        })
        .collect();
    assert!(!before.is_empty());

    let target = before[0].0.clone();
    let parts: Vec<u32> = target
        .trim_end_matches(".png")
        .split('/')
        .map(|p| p.parse().unwrap())
        .collect();
    let stats = service
        .regenerate(parts[0] as u8, parts[1], Some(parts[2]), Some(2), false)
        .unwrap();
    assert_eq!(stats.written, 1);
    assert_eq!(stats.failed, 0);

    // Only the requested artifact was rewritten, and identically so
    let after = tile_paths(&cache);
    assert_eq!(after.len(), before.len());
    for (path, bytes) in &before {
        assert_eq!(&fs::read(cache.join(path)).unwrap(), bytes);
    }
}

#[test]
fn test_regenerate_column() {
    let (sources, cache) = test_dirs("chart_tiler_svc_regen_col");
    create_chart(&sources, "chart.tif", -107.0, 36.0, 150);
    let service = test_service(&sources, &cache);

    let tasks = service.level_tasks(7);
    let column = tasks.iter().next().unwrap().x;
    let rows: Vec<u32> = tasks
        .iter()
        .filter(|t| t.x == column)
        .map(|t| t.y)
        .collect();
    let stats = service
        .regenerate(7, column, None, Some(2), false)
        .unwrap();
    // The whole column is a candidate; everything off the chart is skipped
    assert_eq!(stats.written + stats.skipped, 128);
    assert_eq!(stats.written, rows.len() as u64);
    for y in rows {
        assert!(service.cache.exists(&format!("7/{}/{}.png", column, y)));
    }

    // Out-of-range requests are rejected
    assert!(service.regenerate(7, 128, None, None, false).is_err());
    assert!(service.regenerate(7, 0, Some(128), None, false).is_err());
}
