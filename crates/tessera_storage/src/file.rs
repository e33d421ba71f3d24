//! Atomic JSON file store.

use crate::config::StoreConfig;
use crate::error::{StoreError, StoreResult};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::io;
use std::path::{Component, Path, PathBuf};
use tessera_protocol::unix_millis;
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

/// Location of a successfully written document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedFile {
    /// Final path of the written file.
    pub path: PathBuf,
}

/// A document store with crash-safe overwrites.
///
/// # Durability
///
/// A normal save stages the document in `<fileName>.temp`, removes the
/// previous `<fileName>` if present and renames the staged file into place.
/// A crash before the removal leaves the previous version intact. A crash
/// between removal and rename leaves only the staged file, which the next
/// save overwrites.
///
/// Backups are written to `<fileName>-<unixMillis>` with exclusive creation,
/// so an existing file is never replaced or removed.
///
/// # Concurrency
///
/// Each save is a sequence of awaited steps. Two concurrent saves to the
/// same target are not excluded from each other; callers must not overlap
/// them.
#[derive(Debug, Clone, Default)]
pub struct AtomicFileStore {
    config: StoreConfig,
}

impl AtomicFileStore {
    /// Creates a store with the given configuration.
    #[must_use]
    pub fn new(config: StoreConfig) -> Self {
        Self { config }
    }

    /// Creates a store with default configuration.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::default()
    }

    /// Returns the store configuration.
    #[must_use]
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Reads and decodes the document at `path`.
    ///
    /// Returns `Ok(None)` when the file does not exist, so callers can tell
    /// "nothing saved yet" apart from a failed read.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] if the file exists but cannot be read and
    /// [`StoreError::Decode`] if its content is not a valid document.
    pub async fn load<T: DeserializeOwned>(&self, path: &Path) -> StoreResult<Option<T>> {
        let bytes = match fs::read(path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "document not found");
                return Ok(None);
            }
            Err(e) => return Err(StoreError::io(path, e)),
        };

        let value = serde_json::from_slice(&bytes).map_err(|source| StoreError::Decode {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), bytes = bytes.len(), "document loaded");
        Ok(Some(value))
    }

    /// Writes `data` as `<directory>/<file_name>`.
    ///
    /// With `is_backup` set, the document is written to a new timestamped
    /// sibling instead and nothing existing is touched. The directory is
    /// created recursively if it is missing.
    ///
    /// # Errors
    ///
    /// - [`StoreError::InvalidArgument`] if `directory` is the filesystem root
    ///   or `file_name` is not a plain file name; nothing is written.
    /// - [`StoreError::Io`] if any filesystem step fails.
    /// - [`StoreError::Encode`] if `data` cannot be serialized.
    pub async fn save<T: Serialize + ?Sized>(
        &self,
        directory: &Path,
        file_name: &str,
        data: &T,
        is_backup: bool,
    ) -> StoreResult<SavedFile> {
        check_directory(directory)?;
        check_file_name(file_name)?;
        let bytes = self.encode(data)?;

        ensure_directory(directory).await?;

        if is_backup {
            self.write_backup(directory, file_name, unix_millis(), &bytes)
                .await
        } else {
            self.write_atomic(directory, file_name, &bytes).await
        }
    }

    /// Removes the file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] carrying `path` if the removal fails,
    /// including when the file does not exist.
    pub async fn delete(&self, path: &Path) -> StoreResult<()> {
        fs::remove_file(path)
            .await
            .map_err(|e| StoreError::io(path, e))?;
        debug!(path = %path.display(), "file deleted");
        Ok(())
    }

    fn encode<T: Serialize + ?Sized>(&self, data: &T) -> StoreResult<Vec<u8>> {
        let encoded = if self.config.pretty {
            serde_json::to_vec_pretty(data)
        } else {
            serde_json::to_vec(data)
        };
        encoded.map_err(StoreError::Encode)
    }

    async fn write_atomic(
        &self,
        directory: &Path,
        file_name: &str,
        bytes: &[u8],
    ) -> StoreResult<SavedFile> {
        let target = directory.join(file_name);
        let staged = directory.join(format!("{file_name}{}", self.config.temp_suffix));

        // Stage: the target is untouched until this has fully succeeded.
        let mut file = fs::File::create(&staged)
            .await
            .map_err(|e| StoreError::io(&staged, e))?;
        file.write_all(bytes)
            .await
            .map_err(|e| StoreError::io(&staged, e))?;
        file.flush().await.map_err(|e| StoreError::io(&staged, e))?;
        if self.config.sync_on_write {
            file.sync_all()
                .await
                .map_err(|e| StoreError::io(&staged, e))?;
        }
        drop(file);

        if contains_file(directory, file_name).await? {
            fs::remove_file(&target)
                .await
                .map_err(|e| StoreError::io(&target, e))?;
        }

        fs::rename(&staged, &target)
            .await
            .map_err(|e| StoreError::io(&target, e))?;

        info!(path = %target.display(), bytes = bytes.len(), "document saved");
        Ok(SavedFile { path: target })
    }

    async fn write_backup(
        &self,
        directory: &Path,
        file_name: &str,
        stamp: u128,
        bytes: &[u8],
    ) -> StoreResult<SavedFile> {
        let base = directory.join(format!("{file_name}-{stamp}"));

        for attempt in 0..self.config.max_backup_attempts {
            let candidate = if attempt == 0 {
                base.clone()
            } else {
                directory.join(format!("{file_name}-{stamp}-{attempt}"))
            };

            let mut file = match OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&candidate)
                .await
            {
                Ok(file) => file,
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => continue,
                Err(e) => return Err(StoreError::io(&candidate, e)),
            };

            if let Err(e) = write_all_synced(&mut file, bytes, self.config.sync_on_write).await {
                drop(file);
                if let Err(cleanup) = fs::remove_file(&candidate).await {
                    warn!(
                        path = %candidate.display(),
                        error = %cleanup,
                        "failed to remove partial backup"
                    );
                }
                return Err(StoreError::io(&candidate, e));
            }

            info!(path = %candidate.display(), bytes = bytes.len(), "backup written");
            return Ok(SavedFile { path: candidate });
        }

        Err(StoreError::BackupNameExhausted {
            path: base,
            attempts: self.config.max_backup_attempts,
        })
    }
}

async fn write_all_synced(file: &mut fs::File, bytes: &[u8], sync: bool) -> io::Result<()> {
    file.write_all(bytes).await?;
    file.flush().await?;
    if sync {
        file.sync_all().await?;
    }
    Ok(())
}

fn check_directory(directory: &Path) -> StoreResult<()> {
    if directory.as_os_str().is_empty() {
        return Err(StoreError::invalid_argument("directory is empty"));
    }
    if is_filesystem_root(directory) {
        return Err(StoreError::invalid_argument(format!(
            "refusing to write into filesystem root {}",
            directory.display()
        )));
    }
    Ok(())
}

/// Returns true if `directory` resolves to the root once made absolute and
/// its `.` and `..` components are folded lexically.
fn is_filesystem_root(directory: &Path) -> bool {
    let absolute = match std::path::absolute(directory) {
        Ok(path) => path,
        Err(_) => directory.to_path_buf(),
    };
    let mut depth = 0usize;
    for component in absolute.components() {
        match component {
            Component::Normal(_) => depth += 1,
            Component::ParentDir => depth = depth.saturating_sub(1),
            Component::Prefix(_) | Component::RootDir | Component::CurDir => {}
        }
    }
    depth == 0 && absolute.has_root()
}

fn check_file_name(file_name: &str) -> StoreResult<()> {
    if file_name.is_empty() || file_name == "." || file_name == ".." {
        return Err(StoreError::invalid_argument(format!(
            "invalid file name {file_name:?}"
        )));
    }
    if file_name.contains(['/', '\\']) {
        return Err(StoreError::invalid_argument(format!(
            "file name {file_name:?} must not contain a path separator"
        )));
    }
    Ok(())
}

async fn ensure_directory(directory: &Path) -> StoreResult<()> {
    let exists = fs::try_exists(directory)
        .await
        .map_err(|e| StoreError::io(directory, e))?;
    if !exists {
        debug!(path = %directory.display(), "creating directory");
        fs::create_dir_all(directory)
            .await
            .map_err(|e| StoreError::io(directory, e))?;
    }
    Ok(())
}

/// Lists `directory` and reports whether an entry named exactly `file_name` exists.
async fn contains_file(directory: &Path, file_name: &str) -> StoreResult<bool> {
    let mut entries = fs::read_dir(directory)
        .await
        .map_err(|e| StoreError::io(directory, e))?;
    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| StoreError::io(directory, e))?
    {
        if entry.file_name() == file_name {
            return Ok(true);
        }
    }
    Ok(false)
}
