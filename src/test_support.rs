//! Helpers for unit tests that touch the filesystem.

use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

/// A path under the system temp dir that no other test run will pick.
/// Nothing is created on disk.
pub(crate) fn scratch_path(label: &str, extension: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_nanos())
        .unwrap_or_default();
    std::env::temp_dir().join(format!(
        "covidproject-{label}-{}-{nanos}.{extension}",
        std::process::id()
    ))
}
