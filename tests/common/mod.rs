//! Scratch locations shared by the integration tests.

#![allow(dead_code)]

use std::fs;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

fn scratch_name(label: &str) -> String {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_nanos())
        .unwrap_or_default();
    format!("covidproject-{label}-{}-{nanos}", std::process::id())
}

/// A store path under the system temp dir; the file itself is not created.
pub fn scratch_store(label: &str) -> PathBuf {
    std::env::temp_dir().join(format!("{}.csv", scratch_name(label)))
}

/// A fresh, empty working directory under the system temp dir.
pub fn scratch_dir(label: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(scratch_name(label));
    fs::create_dir_all(&dir).expect("scratch dir should be created");
    dir
}
