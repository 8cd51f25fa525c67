//
// Copyright (c) Pirmin Kalberer. All rights reserved.
// Licensed under the MIT License. See LICENSE file in the project root for full license information.
//

use crate::cache::cache::Cache;
use crate::cache::filecache::Filecache;
use std::fs;
use std::io::Read;
use std::path::Path;

#[test]
fn test_dircache() {
    use std::env;

    let mut dir = env::temp_dir();
    dir.push("chart_tiler_test");
    let basepath = format!("{}", &dir.display());
    let _ = fs::remove_dir_all(&basepath);

    let cache = Filecache { basepath };
    let path = "9/120/200.png";
    let fullpath = format!("{}/{}", cache.basepath, path);
    let obj = "0123456789";

    // Cache miss
    assert_eq!(cache.read(path, |_| {}), false);
    assert!(!cache.exists(path));

    // Write into cache
    let _ = cache.write(path, obj.as_bytes());
    assert!(Path::new(&fullpath).exists());
    assert!(cache.exists(path));

    // Cache hit
    assert_eq!(cache.read(path, |_| {}), true);

    // Read from cache
    let mut s = String::new();
    cache.read(path, |f| {
        let _ = f.read_to_string(&mut s);
    });
    assert_eq!(&s, "0123456789");
}

#[test]
fn test_lock_path() {
    use std::env;

    let mut dir = env::temp_dir();
    dir.push("chart_tiler_lock_dir_test");
    let basepath = format!("{}", &dir.display());
    let _ = fs::remove_dir_all(&basepath);

    let cache = Filecache { basepath };
    // Locking creates the tile directory on demand
    let lock = cache.lock("7/33/41.png").unwrap();
    assert!(Path::new(&cache.fullpath("7/33")).is_dir());
    assert!(Path::new(&cache.fullpath("7/33/41.png.lock")).exists());
    drop(lock);
    assert!(!Path::new(&cache.fullpath("7/33/41.png.lock")).exists());
}
