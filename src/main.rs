//
// Copyright (c) Pirmin Kalberer. All rights reserved.
// Licensed under the MIT License. See LICENSE file in the project root for full license information.
//

#[macro_use]
extern crate clap;
#[macro_use]
extern crate log;

use chart_tiler_core::core::config::{ApplicationCfg, DEFAULT_CONFIG};
use chart_tiler_core::core::{parse_config, read_config, Config};
use chart_tiler_core::manifest::copy_manifest;
use chart_tiler_service::TileService;
use clap::{App, AppSettings, ArgMatches, SubCommand};
use dotenv::dotenv;
use env_logger::Builder;
use log::Record;
use std::env;
use std::io::Write;
use std::path::Path;
use std::process;
use time;

fn init_logger(args: &ArgMatches<'_>) {
    let mut builder = Builder::new();
    builder.format(|buf, record: &Record<'_>| {
        let t = time::now();
        writeln!(
            buf,
            "{}.{:03} {} {}",
            time::strftime("%Y-%m-%d %H:%M:%S", &t).unwrap(),
            t.tm_nsec / 1000_000,
            record.level(),
            record.args()
        )
    });

    let rust_log_env = env::var("RUST_LOG");
    let rust_log = if args.value_of("loglevel").is_none() && rust_log_env.is_ok() {
        rust_log_env.as_ref().unwrap()
    } else {
        match args.value_of("loglevel").unwrap_or("info") {
            "debug" => "debug,tokio=info",
            loglevel => loglevel,
        }
    };
    builder.parse_filters(rust_log);

    builder.init();
}

fn config_from_args(args: &ArgMatches<'_>) -> ApplicationCfg {
    if let Some(cfgpath) = args.value_of("config") {
        info!("Reading configuration from '{}'", cfgpath);
        for argname in vec!["sourcedir", "cache"] {
            if args.value_of(argname).is_some() {
                warn!("Ignoring argument `{}`", argname);
            }
        }
        read_config(cfgpath).unwrap_or_else(|err| {
            println!("Error reading configuration - {} ", err);
            process::exit(1)
        })
    } else {
        let mut config: ApplicationCfg = parse_config(DEFAULT_CONFIG.to_string(), "").unwrap();
        if let Some(dir) = args.value_of("sourcedir") {
            config.sources.dir = dir.to_string();
        }
        if let Some(dir) = args.value_of("cache") {
            if let Some(ref mut file_cfg) = config.cache.file {
                file_cfg.base = dir.to_string();
            }
        }
        if let Some(size) = args.value_of("tilesize") {
            config.tiling.tile_size = size
                .parse()
                .expect("Error parsing 'tilesize' as integer value");
        }
        if let Some(bands) = args.value_of("bands") {
            config.tiling.tile_bands = bands
                .parse()
                .expect("Error parsing 'bands' as integer value");
        }
        config
    }
}

fn service_from_args(config: &ApplicationCfg) -> TileService {
    let svc = TileService::from_config(config).unwrap_or_else(|err| {
        println!("Error reading configuration - {} ", err);
        process::exit(1)
    });
    if svc.sources.is_empty() {
        println!("No GeoTIFF files found in '{}'", config.sources.dir);
        process::exit(1)
    }
    svc
}

fn parse_zoom(args: &ArgMatches<'_>, name: &str) -> Option<u8> {
    args.value_of(name).map(|s| {
        s.parse::<u8>()
            .unwrap_or_else(|_| panic!("Error parsing '{}' as integer value", name))
    })
}

fn generate(args: &ArgMatches<'_>) {
    let config = config_from_args(args);
    let service = service_from_args(&config);
    let minzoom = parse_zoom(args, "minzoom");
    let maxzoom = parse_zoom(args, "maxzoom");
    let workers = args.value_of("workers").map(|s| {
        s.parse::<usize>()
            .expect("Error parsing 'workers' as integer value")
    });
    let progress = args.value_of("progress").map_or(true, |s| {
        s.parse::<bool>()
            .expect("Error parsing 'progress' as boolean value")
    });
    let overwrite = args.value_of("overwrite").map_or(false, |s| {
        s.parse::<bool>()
            .expect("Error parsing 'overwrite' as boolean value")
    });
    let stats = service.generate(minzoom, maxzoom, workers, progress, overwrite);
    println!(
        "{} tiles written, {} skipped, {} failed",
        stats.written, stats.skipped, stats.failed
    );

    match copy_manifest(Path::new(&config.sources.dir), &service.cache) {
        Ok(true) => info!("Update manifest copied to the tile cache"),
        Ok(false) => warn!(
            "Update manifest not found in '{}'",
            config.sources.dir
        ),
        Err(e) => error!("{}", e),
    }

    if stats.has_failures() {
        process::exit(2)
    }
}

fn regenerate(args: &ArgMatches<'_>) {
    let config = config_from_args(args);
    let service = service_from_args(&config);
    let zoom = parse_zoom(args, "zoom").expect("Missing 'zoom' argument");
    let xtile = args.value_of("x").map(|s| {
        s.parse::<u32>()
            .expect("Error parsing 'x' as integer value")
    });
    let ytile = args.value_of("y").map(|s| {
        s.parse::<u32>()
            .expect("Error parsing 'y' as integer value")
    });
    let workers = args.value_of("workers").map(|s| {
        s.parse::<usize>()
            .expect("Error parsing 'workers' as integer value")
    });
    let progress = args.value_of("progress").map_or(true, |s| {
        s.parse::<bool>()
            .expect("Error parsing 'progress' as boolean value")
    });
    let stats = service
        .regenerate(
            zoom,
            xtile.expect("Missing 'x' argument"),
            ytile,
            workers,
            progress,
        )
        .unwrap_or_else(|err| {
            println!("{}", err);
            process::exit(1)
        });
    println!(
        "{} tiles written, {} skipped, {} failed",
        stats.written, stats.skipped, stats.failed
    );
    if stats.has_failures() {
        process::exit(2)
    }
}

fn version_info() -> String {
    format!(
        "{} (GDAL version {})",
        crate_version!(),
        chart_tiler_gdal::gdal_version()
    )
}

fn main() {
    dotenv().ok();
    let version_info = version_info();
    let mut app = App::new("chart_tiler")
        .version(&version_info as &str)
        .author("Pirmin Kalberer <pka@sourcepole.ch>")
        .about("Generates slippy map tile trees from georeferenced sectional charts")
        .subcommand(SubCommand::with_name("generate")
                        .setting(AppSettings::AllowLeadingHyphen)
                        .args_from_usage("-c, --config=[FILE] 'Load from custom config file'
                                              --loglevel=[error|warn|info|debug|trace] 'Log level (Default: info)'
                                              --sourcedir=[DIR] 'Directory with reprojected GeoTIFF files'
                                              --cache=[DIR] 'Use tile cache in DIR'
                                              --minzoom=[LEVEL] 'Minimum zoom level'
                                              --maxzoom=[LEVEL] 'Maximum zoom level'
                                              --tilesize=[PIXELS] 'Tile edge length in pixels'
                                              --bands=[3|4] 'Raster bands read per source'
                                              --workers=[NUM] 'Number of parallel tile workers'
                                              --progress=[true|false] 'Show progress bar'
                                              --overwrite=[false|true] 'Overwrite previously cached tiles'")
                        .about("Generate tiles for cache"))
        .subcommand(SubCommand::with_name("regenerate")
                        .setting(AppSettings::AllowLeadingHyphen)
                        .args_from_usage("-c, --config=[FILE] 'Load from custom config file'
                                              --loglevel=[error|warn|info|debug|trace] 'Log level (Default: info)'
                                              --sourcedir=[DIR] 'Directory with reprojected GeoTIFF files'
                                              --cache=[DIR] 'Use tile cache in DIR'
                                              --zoom=<LEVEL> 'Zoom level of the target tiles'
                                              --x=<COLUMN> 'Tile column'
                                              --y=[ROW] 'Tile row (full column without)'
                                              --workers=[NUM] 'Number of parallel tile workers'
                                              --progress=[true|false] 'Show progress bar'")
                        .about("Regenerate a single tile or tile column"))
        .subcommand(SubCommand::with_name("genconfig")
                        .about("Generate configuration template"));

    match app.get_matches_from_safe_borrow(env::args()) {
        //app.get_matches() prohibits later call of app.print_help()
        Result::Err(e) => {
            println!("{}", e);
        }
        Result::Ok(matches) => match matches.subcommand() {
            ("generate", Some(sub_m)) => {
                init_logger(sub_m);
                generate(sub_m);
            }
            ("regenerate", Some(sub_m)) => {
                init_logger(sub_m);
                regenerate(sub_m);
            }
            ("genconfig", Some(_sub_m)) => {
                println!("{}", TileService::gen_config());
            }
            _ => {
                let _ = app.print_help();
                println!("");
            }
        },
    }
}
