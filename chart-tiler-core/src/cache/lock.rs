//
// Copyright (c) Pirmin Kalberer. All rights reserved.
// Licensed under the MIT License. See LICENSE file in the project root for full license information.
//

//! Advisory per-tile lock files

use std::fs::{self, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

const LOCK_SUFFIX: &str = ".lock";
const RETRY_WAIT_MS: u64 = 50;

/// Scoped mutual exclusion for one tile path, backed by a lock file next to
/// the artifact (`<tile>.png.lock`).
///
/// Advisory only: it coordinates cooperating tile workers and overlapping
/// runs of this tool, nothing else. The lock is released when the guard is
/// dropped, on every exit path.
pub struct TileLock {
    path: PathBuf,
}

impl TileLock {
    /// Block until the lock file for `tile_path` could be created.
    pub fn acquire(tile_path: &Path) -> Result<TileLock, io::Error> {
        let mut os_path = tile_path.as_os_str().to_os_string();
        os_path.push(LOCK_SUFFIX);
        let path = PathBuf::from(os_path);
        loop {
            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(_f) => {
                    trace!("Lock acquired: {}", path.display());
                    return Ok(TileLock { path });
                }
                Err(ref e) if e.kind() == io::ErrorKind::AlreadyExists => {
                    thread::sleep(Duration::from_millis(RETRY_WAIT_MS));
                }
                Err(e) => return Err(e),
            }
        }
    }
}

impl Drop for TileLock {
    fn drop(&mut self) {
        if let Err(e) = fs::remove_file(&self.path) {
            warn!("Releasing lock {} failed: {}", self.path.display(), e);
        }
    }
}
