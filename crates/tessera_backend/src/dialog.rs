//! Native dialog seam.
//!
//! The backend never draws UI itself. Dialog requests go through a
//! [`DialogProvider`]; a desktop shell plugs in its native dialogs, a
//! headless process uses [`Headless`].

use crate::error::{BackendError, BackendResult};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::path::PathBuf;
use tessera_protocol::{DialogRequest, DirectoryDialogResult, FileDialogResult};

/// Shows file and directory pickers.
pub trait DialogProvider: Send + Sync {
    /// Lets the user pick a directory.
    fn select_directory(&self, request: &DialogRequest) -> BackendResult<DirectoryDialogResult>;

    /// Lets the user pick an existing file.
    fn select_file(&self, request: &DialogRequest) -> BackendResult<FileDialogResult>;

    /// Lets the user choose where to save a file.
    fn save_file(&self, request: &DialogRequest) -> BackendResult<FileDialogResult>;
}

/// Provider for processes without a window. Every dialog is refused.
#[derive(Debug, Clone, Copy, Default)]
pub struct Headless;

const NO_WINDOW: &str = "no window context for a dialog";

impl DialogProvider for Headless {
    fn select_directory(&self, _request: &DialogRequest) -> BackendResult<DirectoryDialogResult> {
        Err(BackendError::invalid_argument(NO_WINDOW))
    }

    fn select_file(&self, _request: &DialogRequest) -> BackendResult<FileDialogResult> {
        Err(BackendError::invalid_argument(NO_WINDOW))
    }

    fn save_file(&self, _request: &DialogRequest) -> BackendResult<FileDialogResult> {
        Err(BackendError::invalid_argument(NO_WINDOW))
    }
}

/// Provider answering from queued choices. An empty queue means "canceled".
///
/// Used by tests and scripted sessions.
#[derive(Debug, Default)]
pub struct ScriptedDialogs {
    directories: Mutex<VecDeque<PathBuf>>,
    files: Mutex<VecDeque<PathBuf>>,
    requests: Mutex<Vec<DialogRequest>>,
}

impl ScriptedDialogs {
    /// Creates a provider with nothing queued.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues the answer to the next directory dialog.
    pub fn push_directory(&self, path: impl Into<PathBuf>) {
        self.directories.lock().push_back(path.into());
    }

    /// Queues the answer to the next file or save dialog.
    pub fn push_file(&self, path: impl Into<PathBuf>) {
        self.files.lock().push_back(path.into());
    }

    /// Returns every request seen so far.
    pub fn requests(&self) -> Vec<DialogRequest> {
        self.requests.lock().clone()
    }

    fn next_file(&self, request: &DialogRequest) -> FileDialogResult {
        self.requests.lock().push(request.clone());
        let path = self.files.lock().pop_front();
        FileDialogResult {
            canceled: path.is_none(),
            path,
        }
    }
}

impl DialogProvider for ScriptedDialogs {
    fn select_directory(&self, request: &DialogRequest) -> BackendResult<DirectoryDialogResult> {
        self.requests.lock().push(request.clone());
        let directory = self.directories.lock().pop_front();
        Ok(DirectoryDialogResult {
            canceled: directory.is_none(),
            directory,
        })
    }

    fn select_file(&self, request: &DialogRequest) -> BackendResult<FileDialogResult> {
        Ok(self.next_file(request))
    }

    fn save_file(&self, request: &DialogRequest) -> BackendResult<FileDialogResult> {
        Ok(self.next_file(request))
    }
}
