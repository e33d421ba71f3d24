//! Crash and failure simulation for the atomic file store.
//!
//! A save goes through three on-disk states: staged, previous version
//! removed, staged file renamed into place. This module reproduces the
//! state a crash leaves behind at each step, and can make the staging
//! write fail outright.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use tessera_testkit::crash::{leave_crash_state, CrashPoint};
//!
//! leave_crash_state(dir, "project.json", b"{}", CrashPoint::AfterRemoval)?;
//! ```

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tessera_storage::StoreConfig;

/// Where a save was interrupted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrashPoint {
    /// The staged file was written, the previous version is intact.
    AfterStaging,
    /// The previous version was removed, the rename never happened.
    AfterRemoval,
}

impl CrashPoint {
    /// All crash points.
    pub const ALL: [CrashPoint; 2] = [CrashPoint::AfterStaging, CrashPoint::AfterRemoval];

    /// Returns true if the previous version survives this crash.
    #[must_use]
    pub fn keeps_previous(self) -> bool {
        matches!(self, CrashPoint::AfterStaging)
    }
}

/// Returns the staging path the store uses for `<directory>/<file_name>`.
#[must_use]
pub fn staging_path(config: &StoreConfig, directory: &Path, file_name: &str) -> PathBuf {
    directory.join(format!("{file_name}{}", config.temp_suffix))
}

/// Leaves `directory` as a save of `staged` would after crashing at `point`.
///
/// # Errors
///
/// Returns any filesystem error.
pub fn leave_crash_state(
    directory: &Path,
    file_name: &str,
    staged: &[u8],
    point: CrashPoint,
) -> io::Result<()> {
    fs::create_dir_all(directory)?;
    fs::write(
        staging_path(&StoreConfig::default(), directory, file_name),
        staged,
    )?;
    if point == CrashPoint::AfterRemoval {
        match fs::remove_file(directory.join(file_name)) {
            Err(e) if e.kind() != io::ErrorKind::NotFound => return Err(e),
            _ => {}
        }
    }
    Ok(())
}

/// Makes the staging write for `<directory>/<file_name>` fail while alive.
///
/// A directory is put where the staging file would go, so creating it
/// fails. Dropping the guard removes the directory.
#[derive(Debug)]
pub struct StagingBlocker {
    path: PathBuf,
}

impl StagingBlocker {
    /// Blocks staging for the default store configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the blocking directory cannot be created.
    pub fn new(directory: &Path, file_name: &str) -> io::Result<Self> {
        let path = staging_path(&StoreConfig::default(), directory, file_name);
        fs::create_dir_all(&path)?;
        Ok(Self { path })
    }

    /// Returns the blocked staging path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for StagingBlocker {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.path);
    }
}

/// Lists the file names in `directory`, sorted.
///
/// # Errors
///
/// Returns any filesystem error.
pub fn file_names(directory: &Path) -> io::Result<Vec<String>> {
    let mut names = Vec::new();
    for entry in fs::read_dir(directory)? {
        names.push(entry?.file_name().to_string_lossy().into_owned());
    }
    names.sort();
    Ok(names)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};
    use tempfile::tempdir;
    use tessera_storage::AtomicFileStore;

    #[tokio::test]
    async fn blocked_staging_keeps_the_previous_version() {
        let dir = tempdir().unwrap();
        let store = AtomicFileStore::with_defaults();
        store.save(dir.path(), "doc.json", &json!({"v": 1}), false).await.unwrap();
        let before = fs::read(dir.path().join("doc.json")).unwrap();

        {
            let blocker = StagingBlocker::new(dir.path(), "doc.json").unwrap();
            let err = store
                .save(dir.path(), "doc.json", &json!({"v": 2}), false)
                .await
                .unwrap_err();
            assert_eq!(err.path(), Some(blocker.path()));
        }

        assert_eq!(fs::read(dir.path().join("doc.json")).unwrap(), before);
        assert_eq!(file_names(dir.path()).unwrap(), ["doc.json"]);
    }

    #[tokio::test]
    async fn next_save_recovers_from_every_crash_point() {
        for point in CrashPoint::ALL {
            let dir = tempdir().unwrap();
            let store = AtomicFileStore::with_defaults();
            store.save(dir.path(), "doc.json", &json!({"v": 1}), false).await.unwrap();

            leave_crash_state(dir.path(), "doc.json", br#"{"v":2}"#, point).unwrap();
            let survived: Option<Value> = store.load(&dir.path().join("doc.json")).await.unwrap();
            assert_eq!(survived.is_some(), point.keeps_previous(), "{point:?}");

            store.save(dir.path(), "doc.json", &json!({"v": 3}), false).await.unwrap();
            let loaded: Option<Value> = store.load(&dir.path().join("doc.json")).await.unwrap();
            assert_eq!(loaded, Some(json!({"v": 3})));
            assert_eq!(file_names(dir.path()).unwrap(), ["doc.json"], "{point:?}");
        }
    }
}
