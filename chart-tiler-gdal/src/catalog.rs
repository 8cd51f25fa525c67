//
// Copyright (c) Pirmin Kalberer. All rights reserved.
// Licensed under the MIT License. See LICENSE file in the project root for full license information.
//

//! Source raster catalog

use chart_tiler_core::core::raster::{PixelFormat, RasterMetadata};
use gdal::spatial_ref::{AxisMappingStrategy, CoordTransform, SpatialRef};
use gdal::Dataset;
use std::fs;
use std::path::{Path, PathBuf};
use tile_grid::Extent;

/// WGS84 with traditional GIS axis order (x = lon, y = lat)
pub(crate) fn wgs84() -> Result<SpatialRef, String> {
    let mut srs = SpatialRef::from_epsg(4326).map_err(|e| e.to_string())?;
    srs.set_axis_mapping_strategy(AxisMappingStrategy::TraditionalGisOrder);
    Ok(srs)
}

pub(crate) fn spatial_ref(ds: &Dataset, path: &Path) -> Result<SpatialRef, String> {
    let mut srs = ds
        .spatial_ref()
        .map_err(|e| format!("{}: no spatial reference ({})", path.display(), e))?;
    srs.set_axis_mapping_strategy(AxisMappingStrategy::TraditionalGisOrder);
    Ok(srs)
}

/// One ready-to-tile chart raster: static metadata plus its bounds in the
/// lat/lon reference frame all tile math happens in.
#[derive(Clone, Debug)]
pub struct ChartSource {
    pub meta: RasterMetadata,
    pub latlon_extent: Extent,
}

/// Enumerates the tileable rasters of an input directory.
///
/// Sources are sorted by file name so that compositing order, and with it
/// overlap resolution, is reproducible across runs and filesystems.
pub struct ChartCatalog {
    pub sources: Vec<ChartSource>,
}

impl ChartCatalog {
    /// Scan `dir` for GeoTIFF files. Unreadable rasters and rasters with an
    /// unsupported band layout are logged and excluded, never fatal.
    pub fn scan(dir: &Path) -> Result<ChartCatalog, String> {
        let entries = fs::read_dir(dir)
            .map_err(|e| format!("Error reading source directory {}: {}", dir.display(), e))?;
        let mut paths: Vec<PathBuf> = entries
            .filter_map(|e| e.ok().map(|e| e.path()))
            .filter(|p| {
                matches!(
                    p.extension().and_then(|e| e.to_str()),
                    Some("tif") | Some("tiff")
                )
            })
            .collect();
        paths.sort();

        let mut sources = Vec::new();
        for path in paths {
            match ChartSource::open(&path) {
                Ok(source) => {
                    info!(
                        "Catalog: {} {}x{} {:?} {:?}",
                        source.meta.name(),
                        source.meta.width,
                        source.meta.height,
                        source.meta.format,
                        source.latlon_extent
                    );
                    sources.push(source);
                }
                Err(e) => {
                    error!("Skipping source raster: {}", e);
                }
            }
        }
        Ok(ChartCatalog { sources })
    }
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
    pub fn len(&self) -> usize {
        self.sources.len()
    }
}

impl ChartSource {
    pub fn open(path: &Path) -> Result<ChartSource, String> {
        let ds =
            Dataset::open(path).map_err(|e| format!("{}: {}", path.display(), e))?;
        let (width, height) = ds.raster_size();
        let band_count = ds.raster_count();
        let format = PixelFormat::from_band_count(band_count)
            .map_err(|e| format!("{}: {}", path.display(), e))?;
        let geo_transform = ds
            .geo_transform()
            .map_err(|e| format!("{}: no geotransform ({})", path.display(), e))?;
        if geo_transform[2] != 0.0 || geo_transform[4] != 0.0 {
            return Err(format!(
                "{}: rotated rasters are not supported",
                path.display()
            ));
        }
        let nodata = ds
            .rasterband(1)
            .map_err(|e| format!("{}: {}", path.display(), e))?
            .no_data_value();
        let src_srs = spatial_ref(&ds, path)?;
        let projection = ds.projection();

        let meta = RasterMetadata {
            path: path.to_path_buf(),
            width,
            height,
            format,
            nodata,
            geo_transform,
            projection,
        };

        let native = meta.native_extent();
        let transform = CoordTransform::new(&src_srs, &wgs84()?)
            .map_err(|e| format!("{}: {}", path.display(), e))?;
        let bounds = transform
            .transform_bounds(&[native.minx, native.miny, native.maxx, native.maxy], 21)
            .map_err(|e| format!("{}: bounds transformation failed ({})", path.display(), e))?;
        let latlon_extent = Extent {
            minx: bounds[0],
            miny: bounds[1],
            maxx: bounds[2],
            maxy: bounds[3],
        };

        Ok(ChartSource {
            meta,
            latlon_extent,
        })
    }
}
