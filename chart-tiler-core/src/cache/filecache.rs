//
// Copyright (c) Pirmin Kalberer. All rights reserved.
// Licensed under the MIT License. See LICENSE file in the project root for full license information.
//

use crate::cache::cache::Cache;
use crate::cache::lock::TileLock;
use std::fs::{self, File};
use std::io::{self, Read, Write};
use std::path::Path;

#[derive(Clone)]
pub struct Filecache {
    pub basepath: String,
}

impl Filecache {
    pub fn fullpath(&self, path: &str) -> String {
        format!("{}/{}", self.basepath, path)
    }
    /// Acquire the advisory lock guarding `path`, creating the parent
    /// directory if needed. Blocks until the lock is free.
    pub fn lock(&self, path: &str) -> Result<TileLock, io::Error> {
        let fullpath = self.fullpath(path);
        let p = Path::new(&fullpath);
        if let Some(dir) = p.parent() {
            // Safe under concurrent creation; existing directories are fine
            fs::create_dir_all(dir)?;
        }
        TileLock::acquire(p)
    }
}

impl Cache for Filecache {
    fn info(&self) -> String {
        format!("Tile cache directory: {}", self.basepath)
    }
    fn read<F>(&self, path: &str, mut read: F) -> bool
    where
        F: FnMut(&mut dyn Read),
    {
        let fullpath = self.fullpath(path);
        debug!("Filecache.read {}", fullpath);
        match File::open(&fullpath) {
            Ok(mut f) => {
                read(&mut f);
                true
            }
            Err(_e) => false,
        }
    }
    fn write(&self, path: &str, obj: &[u8]) -> Result<(), io::Error> {
        let fullpath = self.fullpath(path);
        debug!("Filecache.write {}", fullpath);
        let p = Path::new(&fullpath);
        fs::create_dir_all(p.parent().unwrap())?;
        let mut f = File::create(&fullpath)?;
        f.write_all(obj)
    }
    fn exists(&self, path: &str) -> bool {
        let fullpath = self.fullpath(path);
        Path::new(&fullpath).exists()
    }
}
