// src/writer.rs
use anyhow::{Context, Result};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::snapshot::Snapshot;

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| "snapshot".into());
    name.push(".tmp");
    path.with_file_name(name)
}

/// Write the snapshot as indented JSON: temp file in the same directory, then rename.
///
/// Readers see either the previous document or the new one, never a partial file.
pub fn write_snapshot(path: &Path, snapshot: &Snapshot) -> Result<()> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    }

    let json = snapshot.to_pretty_json().context("serializing snapshot")?;
    let tmp = tmp_path(path);
    let written = write_tmp(&tmp, json.as_bytes()).and_then(|_| {
        fs::rename(&tmp, path)
            .with_context(|| format!("renaming {} to {}", tmp.display(), path.display()))
    });
    if written.is_err() {
        let _ = fs::remove_file(&tmp);
    }
    written
}

fn write_tmp(tmp: &Path, json: &[u8]) -> Result<()> {
    let mut f = fs::File::create(tmp).with_context(|| format!("creating {}", tmp.display()))?;
    f.write_all(json)
        .and_then(|_| f.write_all(b"\n"))
        .and_then(|_| f.sync_all())
        .with_context(|| format!("writing {}", tmp.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn overwrites_in_place_and_leaves_no_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("data.json");
        let now = chrono::Utc.with_ymd_and_hms(2025, 12, 29, 10, 0, 0).unwrap();

        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "stale and much longer than anything else ".repeat(500)).unwrap();

        write_snapshot(&path, &Snapshot::fallback(now)).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let v: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(v["lastUpdated"], "2025-12-29T10:00:00Z");
        assert!(text.contains("\n  \"servicenow\": {"), "two-space indent");
        assert!(!tmp_path(&path).exists());
    }

    #[test]
    fn unwritable_target_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        // A directory where the file should go.
        let path = dir.path().join("data.json");
        std::fs::create_dir_all(path.join("child")).unwrap();
        let now = chrono::Utc.with_ymd_and_hms(2025, 12, 29, 10, 0, 0).unwrap();
        assert!(write_snapshot(&path, &Snapshot::fallback(now)).is_err());
        assert!(!tmp_path(&path).exists());
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn failed_temp_write_is_cleaned_up() {
        if !Path::new("/dev/full").exists() {
            return;
        }
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.json");
        // Every write to /dev/full fails with ENOSPC.
        std::os::unix::fs::symlink("/dev/full", tmp_path(&path)).unwrap();
        let now = chrono::Utc.with_ymd_and_hms(2025, 12, 29, 10, 0, 0).unwrap();

        let err = write_snapshot(&path, &Snapshot::fallback(now)).unwrap_err();
        assert!(format!("{err:#}").contains("writing"));
        assert!(std::fs::symlink_metadata(tmp_path(&path)).is_err());
        assert!(!path.exists());
    }
}
