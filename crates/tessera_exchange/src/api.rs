//! Typed wrappers over the backend operations.

use crate::client::ExchangeClient;
use crate::error::ExchangeResult;
use crate::transport::Outbound;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tessera_core::Project;
use tessera_protocol::{
    decode_payload, encode_payload, AppSettings, BackupRequest, DialogRequest,
    DirectoryDialogResult, FileDialogResult, OpType, SavedPath,
};

impl<T: Outbound> ExchangeClient<T> {
    async fn call<P, R>(&self, op: OpType, payload: &P) -> ExchangeResult<R>
    where
        P: Serialize,
        R: DeserializeOwned,
    {
        let payload = encode_payload(payload)?;
        let timeout = if op.is_interactive() && self.config().interactive_without_timeout {
            None
        } else {
            Some(self.config().timeout)
        };
        let data = self.exchange_with(op, payload, timeout).await?;
        Ok(decode_payload(op, data)?)
    }

    /// Reads the application settings. The backend creates them on first run.
    ///
    /// # Errors
    ///
    /// Returns an error if the exchange fails or the reply is malformed.
    pub async fn load_application_data(&self) -> ExchangeResult<AppSettings> {
        self.call(OpType::LoadApplicationData, &Value::Null).await
    }

    /// Replaces the application settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the exchange fails.
    pub async fn update_application_data(&self, settings: &AppSettings) -> ExchangeResult<()> {
        let _: Value = self.call(OpType::UpdateApplicationData, settings).await?;
        Ok(())
    }

    /// Reads the project stored at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the exchange fails or the file does not hold a
    /// project.
    pub async fn fetch_project(&self, path: &Path) -> ExchangeResult<Project> {
        self.call(OpType::FetchProject, &path).await
    }

    /// Writes a project to its own path.
    ///
    /// # Errors
    ///
    /// Returns an error if the exchange fails. A project without a path is
    /// rejected by the backend as an invalid argument.
    pub async fn save_project(&self, project: &Project) -> ExchangeResult<SavedPath> {
        self.call(OpType::SaveProject, project).await
    }

    /// Asks the user for a file and writes the project there.
    ///
    /// Returns `None` if the user canceled.
    ///
    /// # Errors
    ///
    /// Returns an error if the exchange fails.
    pub async fn save_project_as(&self, project: &Project) -> ExchangeResult<Option<PathBuf>> {
        self.call(OpType::SaveProjectAs, project).await
    }

    /// Writes a timestamped copy of `project` next to `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the exchange fails.
    pub async fn backup_project(
        &self,
        path: &Path,
        project: &Project,
    ) -> ExchangeResult<SavedPath> {
        let request = BackupRequest {
            path: path.to_path_buf(),
            data: encode_payload(project)?,
        };
        self.call(OpType::BackupProject, &request).await
    }

    /// Checks that the backend can write to `directory`.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory is not writable or the exchange fails.
    pub async fn test_path(&self, directory: &Path) -> ExchangeResult<()> {
        let _: Value = self.call(OpType::TestPath, &directory).await?;
        Ok(())
    }

    /// Lets the user pick a directory.
    ///
    /// # Errors
    ///
    /// Returns an error if no dialog can be shown or the exchange fails.
    pub async fn select_directory_dialog(
        &self,
        request: &DialogRequest,
    ) -> ExchangeResult<DirectoryDialogResult> {
        self.call(OpType::SelectDirectoryDialog, request).await
    }

    /// Lets the user pick a file.
    ///
    /// # Errors
    ///
    /// Returns an error if no dialog can be shown or the exchange fails.
    pub async fn select_file_dialog(
        &self,
        request: &DialogRequest,
    ) -> ExchangeResult<FileDialogResult> {
        self.call(OpType::SelectFileDialog, request).await
    }
}
