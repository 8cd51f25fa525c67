//
// Copyright (c) Pirmin Kalberer. All rights reserved.
// Licensed under the MIT License. See LICENSE file in the project root for full license information.
//

use chart_tiler_core::cache::{Cache, Filecache};
use chart_tiler_core::core::config::DEFAULT_CONFIG;
use chart_tiler_core::core::{ApplicationCfg, Config};
use chart_tiler_core::render::{composite, Tile, TileOutcome};
use chart_tiler_gdal::{resample, ChartCatalog, ChartSource};
use pbr::ProgressBar;
use std::cmp;
use std::collections::BTreeSet;
use std::path::Path;
use tile_grid::{Extent, Grid, GridIterator, TileCoord};
use tokio::task::{self, JoinError, JoinHandle};

/// Chart Tiling Service
#[derive(Clone)]
pub struct TileService {
    /// Source rasters in compositing order
    pub sources: Vec<ChartSource>,
    pub grid: Grid,
    pub minzoom: u8,
    pub maxzoom: u8,
    pub tile_size: u16,
    pub tile_bands: u8,
    pub workers: Option<usize>,
    pub cache: Filecache,
}

/// Terminal outcomes of a generation run
#[derive(PartialEq, Eq, Clone, Default, Debug)]
pub struct GenerationStats {
    pub written: u64,
    pub skipped: u64,
    pub failed: u64,
}

impl GenerationStats {
    fn record(&mut self, result: Result<Result<TileOutcome, String>, JoinError>) {
        match result {
            Ok(Ok(TileOutcome::Written)) => self.written += 1,
            Ok(Ok(TileOutcome::Skipped)) => self.skipped += 1,
            Ok(Err(e)) => {
                error!("{}", e);
                self.failed += 1;
            }
            Err(e) => {
                error!("Tile worker failed: {}", e);
                self.failed += 1;
            }
        }
    }
    pub fn has_failures(&self) -> bool {
        self.failed > 0
    }
}

type TileTaskHandle = JoinHandle<Result<TileOutcome, String>>;

impl TileService {
    /// Sources intersecting the tile extent, in catalog order
    fn intersecting_sources(&self, extent: &Extent) -> Vec<&ChartSource> {
        self.sources
            .iter()
            .filter(|s| s.latlon_extent.intersects(extent))
            .collect()
    }
    /// Create chart tile at x, y, z in XYZ adressing scheme.
    ///
    /// Every intersecting source is resampled into the tile's pixel grid and
    /// composited in catalog order. A failing source is logged and dropped;
    /// the remaining sources still contribute.
    pub fn tile(&self, xtile: u32, ytile: u32, zoom: u8) -> Tile {
        let extent = self.grid.tile_extent(xtile, ytile, zoom);
        debug!("{}/{}/{} retrieving with {:?}", zoom, xtile, ytile, extent);
        let mut buffers = Vec::new();
        for source in self.intersecting_sources(&extent) {
            match resample(&source.meta, &extent, self.tile_size, self.tile_bands) {
                Ok(buf) => buffers.push(buf),
                Err(e) => error!("{}/{}/{}: {}", zoom, xtile, ytile, e),
            }
        }
        let image = composite(&buffers, self.tile_size as u32);
        Tile::new(TileCoord::new(zoom, xtile, ytile), image)
    }
    /// Task set of one zoom level: one task per unique tile any source
    /// intersects, regardless of how many sources requested it.
    pub(crate) fn level_tasks(&self, zoom: u8) -> BTreeSet<TileCoord> {
        let mut tiles = BTreeSet::new();
        for source in &self.sources {
            let limits = self.grid.tile_limits(&source.latlon_extent, zoom);
            for tile in GridIterator::new(zoom, limits) {
                tiles.insert(tile);
            }
        }
        tiles
    }
    fn queue_size(&self, workers: Option<usize>) -> usize {
        let workers = workers
            .or(self.workers)
            .unwrap_or_else(|| num_cpus::get() * 2);
        cmp::max(1, cmp::min(workers, 64))
    }
    /// Seed the tile cache for the given zoom range.
    ///
    /// Zoom levels are processed strictly in ascending order; one level's
    /// task set is fully retired before the next level's tasks are derived.
    /// A single task's failure is terminal for that task only.
    pub fn generate(
        &self,
        minzoom: Option<u8>,
        maxzoom: Option<u8>,
        workers: Option<usize>,
        progress: bool,
        overwrite: bool,
    ) -> GenerationStats {
        let rt = tokio::runtime::Runtime::new().expect("Couldn't initialize tokio runtime");
        info!("{}", self.cache.info());
        let minzoom = cmp::max(self.minzoom, minzoom.unwrap_or(0));
        let maxzoom = cmp::min(self.maxzoom, maxzoom.unwrap_or(99));
        let queue_size = self.queue_size(workers);
        let mut stats = GenerationStats::default();
        for zoom in minzoom..=maxzoom {
            let tiles = self.level_tasks(zoom);
            debug!("level {}: {} tiles", zoom, tiles.len());
            rt.block_on(self.run_level(zoom, tiles, queue_size, overwrite, progress, &mut stats));
        }
        if progress {
            println!();
        }
        info!(
            "Generation finished: {} tiles written, {} skipped, {} failed",
            stats.written, stats.skipped, stats.failed
        );
        stats
    }
    /// Regenerate a single tile, or a full tile column when `ytile` is None.
    ///
    /// Task source lists are derived fresh from the catalog and existing
    /// artifacts are overwritten, so a column can be rebuilt after source
    /// rasters have changed.
    pub fn regenerate(
        &self,
        zoom: u8,
        xtile: u32,
        ytile: Option<u32>,
        workers: Option<usize>,
        progress: bool,
    ) -> Result<GenerationStats, String> {
        let (level_maxx, level_maxy) = self.grid.level_limit(zoom);
        if xtile >= level_maxx {
            return Err(format!("Column {} out of range at zoom {}", xtile, zoom));
        }
        let tiles: BTreeSet<TileCoord> = match ytile {
            Some(y) if y >= level_maxy => {
                return Err(format!("Row {} out of range at zoom {}", y, zoom));
            }
            Some(y) => Some(TileCoord::new(zoom, xtile, y)).into_iter().collect(),
            None => (0..level_maxy)
                .map(|y| TileCoord::new(zoom, xtile, y))
                .collect(),
        };
        let rt = tokio::runtime::Runtime::new().expect("Couldn't initialize tokio runtime");
        info!("{}", self.cache.info());
        let queue_size = self.queue_size(workers);
        let mut stats = GenerationStats::default();
        rt.block_on(self.run_level(zoom, tiles, queue_size, true, progress, &mut stats));
        if progress {
            println!();
        }
        info!(
            "Regeneration finished: {} tiles written, {} skipped, {} failed",
            stats.written, stats.skipped, stats.failed
        );
        Ok(stats)
    }
    /// Fan one level's task set out over a bounded queue of blocking tasks.
    /// Tiles complete in no guaranteed order within the level.
    async fn run_level(
        &self,
        zoom: u8,
        tiles: BTreeSet<TileCoord>,
        queue_size: usize,
        overwrite: bool,
        progress: bool,
        stats: &mut GenerationStats,
    ) {
        let mut tasks: Vec<TileTaskHandle> = Vec::with_capacity(queue_size);
        let mut pb = ProgressBar::new(tiles.len() as u64);
        pb.message(&format!("Level {}: ", zoom));
        pb.show_speed = false;
        pb.show_percent = false;
        pb.show_time_left = false;
        for coord in tiles {
            if !overwrite {
                let path = format!("{}/{}/{}.png", coord.z, coord.x, coord.y);
                if self.cache.exists(&path) {
                    stats.skipped += 1;
                    if progress {
                        pb.inc();
                    }
                    continue;
                }
            }
            let svc = self.clone();
            tasks.push(task::spawn(async move {
                match task::spawn_blocking(move || {
                    let tile = svc.tile(coord.x, coord.y, coord.z);
                    tile.write(&svc.cache)
                })
                .await
                {
                    Ok(outcome) => outcome,
                    Err(e) => Err(format!(
                        "{}/{}/{}: tile worker panicked ({})",
                        coord.z, coord.x, coord.y, e
                    )),
                }
            }));
            if tasks.len() >= queue_size {
                tasks = await_one_task(tasks, stats).await;
            }
            if progress {
                pb.inc();
            }
        }
        // Finish remaining tasks
        for result in futures_util::future::join_all(tasks).await {
            stats.record(result);
        }
    }
}

async fn await_one_task(
    tasks: Vec<TileTaskHandle>,
    stats: &mut GenerationStats,
) -> Vec<TileTaskHandle> {
    let (result, _index, remaining) = futures_util::future::select_all(tasks).await;
    stats.record(result);
    remaining
}

impl<'a> Config<'a, ApplicationCfg> for TileService {
    fn from_config(config: &ApplicationCfg) -> Result<Self, String> {
        if config.tiling.minzoom > config.tiling.maxzoom {
            return Err(format!(
                "Invalid zoom range {}-{}",
                config.tiling.minzoom, config.tiling.maxzoom
            ));
        }
        if config.tiling.tile_size == 0 {
            return Err("tile_size must be positive".to_string());
        }
        match config.tiling.tile_bands {
            3 | 4 => {}
            n => return Err(format!("Unsupported number of tile bands: {}", n)),
        }
        let cache = config
            .cache
            .file
            .as_ref()
            .map(|cfg| Filecache {
                basepath: cfg.base.clone(),
            })
            .ok_or("Missing configuration entry base in [cache.file]".to_string())?;
        let catalog = ChartCatalog::scan(Path::new(&config.sources.dir))?;
        if catalog.is_empty() {
            warn!("No GeoTIFF files found in '{}'", config.sources.dir);
        }
        Ok(TileService {
            sources: catalog.sources,
            grid: Grid::xyz(),
            minzoom: config.tiling.minzoom,
            maxzoom: config.tiling.maxzoom,
            tile_size: config.tiling.tile_size,
            tile_bands: config.tiling.tile_bands,
            workers: config.tiling.workers,
            cache,
        })
    }
    fn gen_config() -> String {
        DEFAULT_CONFIG.to_string()
    }
}
