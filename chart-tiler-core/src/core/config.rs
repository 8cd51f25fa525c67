//
// Copyright (c) Pirmin Kalberer. All rights reserved.
// Licensed under the MIT License. See LICENSE file in the project root for full license information.
//

use serde::Deserialize;
use std::collections::HashMap;
use std::env;
use std::error::Error;
use std::fs::File;
use std::io::prelude::*;
use tera::{Context, Tera};
use toml::Value;

pub trait Config<'a, C: Deserialize<'a>>
where
    Self: std::marker::Sized,
{
    /// Read configuration
    fn from_config(config: &C) -> Result<Self, String>;
    /// Generate configuration template
    fn gen_config() -> String;
    /// Generate configuration template with runtime information
    fn gen_runtime_config(&self) -> String {
        Self::gen_config()
    }
}

#[derive(Deserialize, Clone, Debug)]
pub struct ApplicationCfg {
    pub sources: SourcesCfg,
    pub tiling: TilingCfg,
    pub cache: CacheCfg,
}

#[derive(Deserialize, Clone, Debug)]
pub struct SourcesCfg {
    /// Directory containing the ready-to-tile GeoTIFF rasters
    pub dir: String,
}

#[derive(Deserialize, Clone, Debug)]
pub struct TilingCfg {
    pub minzoom: u8,
    pub maxzoom: u8,
    /// Edge length of the square output tiles, in pixels
    #[serde(default = "default_tile_size")]
    pub tile_size: u16,
    /// Number of raster bands read from each source (3 or 4)
    #[serde(default = "default_tile_bands")]
    pub tile_bands: u8,
    /// Parallel tile workers. Defaults to 2x the number of CPU cores.
    pub workers: Option<usize>,
}

fn default_tile_size() -> u16 {
    512
}

fn default_tile_bands() -> u8 {
    4
}

#[derive(Deserialize, Clone, Debug)]
pub struct CacheCfg {
    pub file: Option<FileCacheCfg>,
}

#[derive(Deserialize, Clone, Debug)]
pub struct FileCacheCfg {
    /// Base directory of the tile tree
    pub base: String,
}

pub const DEFAULT_CONFIG: &'static str = r#"
[sources]
dir = "./reprojected"

[tiling]
minzoom = 8
maxzoom = 11
tile_size = 512
tile_bands = 4

[cache.file]
base = "./tiles"
"#;

/// Load and parse the config file into an config struct.
pub fn read_config<'a, T: Deserialize<'a>>(path: &str) -> Result<T, String> {
    let mut file = match File::open(path) {
        Ok(file) => file,
        Err(_) => {
            return Err("Could not find config file!".to_string());
        }
    };
    let mut config_toml = String::new();
    if let Err(err) = file.read_to_string(&mut config_toml) {
        return Err(format!("Error while reading config: [{}]", err));
    };

    parse_config(config_toml, path)
}

/// Parse the configuration into an config struct.
///
/// `{{env.VARNAME}}` expressions are expanded from the process environment.
pub fn parse_config<'a, T: Deserialize<'a>>(config_toml: String, path: &str) -> Result<T, String> {
    let mut tera = Tera::default();
    tera.add_raw_template(path, &config_toml)
        .map_err(|e| format!("Template error: {}", e))?;
    let mut context = Context::new();
    let mut env = HashMap::new();
    for (key, value) in env::vars() {
        env.insert(key, value);
    }
    context.insert("env", &env);
    let toml = tera
        .render(path, &context)
        .map_err(|e| format!("Template error: {}", e.source().unwrap()))?;

    toml.parse::<Value>()
        .and_then(|cfg| cfg.try_into::<T>())
        .map_err(|err| format!("{} - {}", path, err))
}
