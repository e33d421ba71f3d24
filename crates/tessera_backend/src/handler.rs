//! Handlers for each backend operation.

use crate::config::BackendConfig;
use crate::dialog::DialogProvider;
use crate::error::{BackendError, BackendResult};
use serde_json::json;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tessera_core::Project;
use tessera_protocol::{
    unix_millis, AppSettings, BackupRequest, DialogRequest, DirectoryDialogResult,
    FileDialogResult, SavedPath,
};
use tessera_storage::AtomicFileStore;
use tracing::{debug, info};

/// Shared state of all handlers.
pub struct HandlerContext {
    /// Backend configuration.
    pub config: BackendConfig,
    /// Document store used for settings and projects.
    pub store: AtomicFileStore,
    dialogs: Arc<dyn DialogProvider>,
}

impl HandlerContext {
    /// Creates a handler context.
    pub fn new(
        config: BackendConfig,
        store: AtomicFileStore,
        dialogs: Arc<dyn DialogProvider>,
    ) -> Self {
        Self {
            config,
            store,
            dialogs,
        }
    }

    /// Returns the dialog provider.
    pub fn dialogs(&self) -> &dyn DialogProvider {
        self.dialogs.as_ref()
    }
}

/// Runs the backend operations.
pub struct RequestHandler {
    context: Arc<HandlerContext>,
}

impl RequestHandler {
    /// Creates a request handler.
    pub fn new(context: Arc<HandlerContext>) -> Self {
        Self { context }
    }

    /// Returns the shared context.
    pub fn context(&self) -> &HandlerContext {
        &self.context
    }

    /// Reads the settings, writing defaults on first run.
    pub async fn load_application_data(&self) -> BackendResult<AppSettings> {
        let path = self.context.config.settings_path();
        if let Some(settings) = self.context.store.load::<AppSettings>(&path).await? {
            return Ok(settings);
        }
        let settings = AppSettings::default();
        self.write_settings(&settings).await?;
        info!(path = %path.display(), "created default settings");
        Ok(settings)
    }

    /// Overwrites the settings.
    pub async fn update_application_data(&self, settings: AppSettings) -> BackendResult<()> {
        self.write_settings(&settings).await
    }

    /// Reads the project at `path`. The returned project carries `path`.
    pub async fn fetch_project(&self, path: PathBuf) -> BackendResult<Project> {
        let project: Option<Project> = self.context.store.load(&path).await?;
        let mut project = project.ok_or_else(|| BackendError::NotFound { path: path.clone() })?;
        debug!(path = %path.display(), types = project.types.len(), "project fetched");
        project.path = Some(path);
        Ok(project)
    }

    /// Writes a project to its own path.
    pub async fn save_project(&self, project: Project) -> BackendResult<SavedPath> {
        let (directory, file_name) = project
            .location()
            .ok_or_else(|| BackendError::invalid_argument("project has no save path"))?;
        self.write_project(&directory, &file_name, &project).await
    }

    /// Asks for a target file, then writes the project there.
    ///
    /// Returns `None` if the dialog was canceled; nothing is written then.
    pub async fn save_project_as(&self, mut project: Project) -> BackendResult<Option<PathBuf>> {
        let request = DialogRequest::new("Save", project.path.clone());
        let choice = self.context.dialogs().save_file(&request)?;
        let Some(path) = choice.path.filter(|_| !choice.canceled) else {
            debug!("save as canceled");
            return Ok(None);
        };

        project.path = Some(path);
        let (directory, file_name) = project
            .location()
            .ok_or_else(|| BackendError::invalid_argument("chosen path has no file name"))?;
        let saved = self.write_project(&directory, &file_name, &project).await?;
        Ok(Some(saved.path))
    }

    /// Writes a timestamped copy of the project next to `request.path`.
    pub async fn backup_project(&self, request: BackupRequest) -> BackendResult<SavedPath> {
        let (directory, file_name) = split_path(&request.path)?;
        let saved = self
            .context
            .store
            .save(&directory, &file_name, &request.data, true)
            .await?;
        Ok(SavedPath { path: saved.path })
    }

    /// Checks that `directory` is writable by writing and removing a probe file.
    pub async fn test_path(&self, directory: PathBuf) -> BackendResult<()> {
        let probe = json!({ "probe": unix_millis() });
        let saved = self
            .context
            .store
            .save(&directory, &self.context.config.probe_file, &probe, false)
            .await?;
        self.context.store.delete(&saved.path).await?;
        debug!(path = %directory.display(), "directory is writable");
        Ok(())
    }

    /// Shows the directory picker.
    pub async fn select_directory_dialog(
        &self,
        request: DialogRequest,
    ) -> BackendResult<DirectoryDialogResult> {
        self.context.dialogs().select_directory(&request)
    }

    /// Shows the file picker.
    pub async fn select_file_dialog(
        &self,
        request: DialogRequest,
    ) -> BackendResult<FileDialogResult> {
        self.context.dialogs().select_file(&request)
    }

    async fn write_settings(&self, settings: &AppSettings) -> BackendResult<()> {
        let config = &self.context.config;
        self.context
            .store
            .save(&config.app_data_dir, &config.settings_file, settings, false)
            .await?;
        Ok(())
    }

    async fn write_project(
        &self,
        directory: &Path,
        file_name: &str,
        project: &Project,
    ) -> BackendResult<SavedPath> {
        let saved = self
            .context
            .store
            .save(directory, file_name, project, false)
            .await?;
        Ok(SavedPath { path: saved.path })
    }
}

/// Splits `path` into its directory and file name. A bare file name lives in `.`.
fn split_path(path: &Path) -> BackendResult<(PathBuf, String)> {
    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| {
            BackendError::invalid_argument(format!("{} has no file name", path.display()))
        })?;
    let directory = path
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    Ok((directory.to_path_buf(), file_name.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialog::{Headless, ScriptedDialogs};
    use tempfile::TempDir;
    use tessera_protocol::ErrorKind;

    fn handler(dir: &TempDir, dialogs: Arc<dyn DialogProvider>) -> RequestHandler {
        let config = BackendConfig::new(dir.path().join("app"));
        let context = HandlerContext::new(config, AtomicFileStore::with_defaults(), dialogs);
        RequestHandler::new(Arc::new(context))
    }

    #[tokio::test]
    async fn first_load_writes_defaults() {
        let dir = TempDir::new().unwrap();
        let handler = handler(&dir, Arc::new(Headless));

        let settings = handler.load_application_data().await.unwrap();
        assert_eq!(settings, AppSettings::default());
        assert!(dir.path().join("app/settings.json").exists());

        let updated = AppSettings {
            allow_backup: true,
            ..settings
        };
        handler.update_application_data(updated.clone()).await.unwrap();
        assert_eq!(handler.load_application_data().await.unwrap(), updated);
    }

    #[tokio::test]
    async fn save_then_fetch() {
        let dir = TempDir::new().unwrap();
        let handler = handler(&dir, Arc::new(Headless));
        let path = dir.path().join("projects/notes.json");

        let project = Project::new("Notes").with_path(&path);
        let saved = handler.save_project(project.clone()).await.unwrap();
        assert_eq!(saved.path, path);

        let fetched = handler.fetch_project(path).await.unwrap();
        assert_eq!(fetched, project);
    }

    #[tokio::test]
    async fn fetch_missing_is_not_found() {
        let dir = TempDir::new().unwrap();
        let handler = handler(&dir, Arc::new(Headless));
        let err = handler
            .fetch_project(dir.path().join("nope.json"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn unsaved_project_is_rejected() {
        let dir = TempDir::new().unwrap();
        let handler = handler(&dir, Arc::new(Headless));
        let err = handler.save_project(Project::new("x")).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }

    #[tokio::test]
    async fn saving_into_root_is_rejected() {
        let dir = TempDir::new().unwrap();
        let handler = handler(&dir, Arc::new(Headless));
        let err = handler
            .save_project(Project::new("x").with_path("/x.json"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }

    #[tokio::test]
    async fn save_as_uses_dialog_choice() {
        let dir = TempDir::new().unwrap();
        let dialogs = Arc::new(ScriptedDialogs::new());
        let target = dir.path().join("chosen.json");
        dialogs.push_file(&target);
        let handler = handler(&dir, dialogs.clone());

        let saved = handler.save_project_as(Project::new("x")).await.unwrap();
        assert_eq!(saved, Some(target.clone()));
        let fetched = handler.fetch_project(target.clone()).await.unwrap();
        assert_eq!(fetched.path, Some(target));

        assert_eq!(handler.save_project_as(Project::new("y")).await.unwrap(), None);
        assert_eq!(dialogs.requests().len(), 2);
    }

    #[tokio::test]
    async fn save_as_without_window_is_rejected() {
        let dir = TempDir::new().unwrap();
        let handler = handler(&dir, Arc::new(Headless));
        let err = handler.save_project_as(Project::new("x")).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }

    #[tokio::test]
    async fn backup_writes_sibling() {
        let dir = TempDir::new().unwrap();
        let handler = handler(&dir, Arc::new(Headless));
        let path = dir.path().join("notes.json");
        let data = serde_json::to_value(Project::new("Notes")).unwrap();

        let saved = handler
            .backup_project(BackupRequest {
                path: path.clone(),
                data: data.clone(),
            })
            .await
            .unwrap();

        assert_eq!(saved.path.parent(), path.parent());
        let name = saved.path.file_name().unwrap().to_str().unwrap();
        assert!(name.starts_with("notes.json-"));
        assert!(!path.exists());

        let text = std::fs::read_to_string(&saved.path).unwrap();
        let back: Project = serde_json::from_str(&text).unwrap();
        assert_eq!(back.name, "Notes");
    }

    #[test]
    fn bare_file_name_lives_in_current_directory() {
        let (directory, file_name) = split_path(Path::new("notes.json")).unwrap();
        assert_eq!(directory, Path::new("."));
        assert_eq!(file_name, "notes.json");

        let (directory, _) = split_path(Path::new("/data/notes.json")).unwrap();
        assert_eq!(directory, Path::new("/data"));
        assert!(split_path(Path::new("/")).is_err());
    }

    #[tokio::test]
    async fn test_path_leaves_nothing_behind() {
        let dir = TempDir::new().unwrap();
        let handler = handler(&dir, Arc::new(Headless));
        let target = dir.path().join("fresh");

        handler.test_path(target.clone()).await.unwrap();
        assert!(target.is_dir());
        assert_eq!(std::fs::read_dir(&target).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn dialogs_pass_through() {
        let dir = TempDir::new().unwrap();
        let dialogs = Arc::new(ScriptedDialogs::new());
        dialogs.push_directory("/projects");
        let handler = handler(&dir, dialogs);

        let result = handler
            .select_directory_dialog(DialogRequest::new("Choose", None))
            .await
            .unwrap();
        assert_eq!(result.directory, Some(PathBuf::from("/projects")));
        assert!(handler
            .select_file_dialog(DialogRequest::default())
            .await
            .unwrap()
            .canceled);
    }
}
