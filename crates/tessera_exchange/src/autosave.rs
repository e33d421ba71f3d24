//! Periodic autosave and backup.

use crate::client::ExchangeClient;
use crate::transport::Outbound;
use std::path::PathBuf;
use std::time::Duration;
use tessera_core::Project;
use tessera_protocol::AppSettings;
use tokio::sync::watch;
use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};
use tracing::{debug, info, warn};

/// What a scheduler tick did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    /// The project was written to this path.
    Written(PathBuf),
    /// There was no saved project to write.
    Skipped,
    /// The exchange failed. The failure has been logged.
    Failed,
}

/// Saves and backs up the open project on the intervals from [`AppSettings`].
///
/// Only projects that already have a path are written; an unsaved project
/// needs an explicit "save as" first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AutosaveScheduler {
    autosave: Option<Duration>,
    backup: Option<Duration>,
}

impl AutosaveScheduler {
    /// Creates a scheduler with explicit periods. `None` disables a job.
    pub fn new(autosave: Option<Duration>, backup: Option<Duration>) -> Self {
        Self { autosave, backup }
    }

    /// Reads the periods from the application settings.
    pub fn from_settings(settings: &AppSettings) -> Self {
        Self::new(settings.autosave_period(), settings.backup_period())
    }

    /// Returns the autosave period.
    pub fn autosave_period(&self) -> Option<Duration> {
        self.autosave
    }

    /// Returns the backup period.
    pub fn backup_period(&self) -> Option<Duration> {
        self.backup
    }

    /// Returns true if neither job is enabled.
    pub fn is_idle(&self) -> bool {
        self.autosave.is_none() && self.backup.is_none()
    }

    /// Runs until `shutdown` turns true or its sender is dropped.
    ///
    /// `current` returns a snapshot of the open project, or `None` when no
    /// project is open.
    pub async fn run<T, F>(
        &self,
        client: &ExchangeClient<T>,
        current: F,
        mut shutdown: watch::Receiver<bool>,
    ) where
        T: Outbound,
        F: Fn() -> Option<Project>,
    {
        let mut autosave = self.autosave.map(ticker);
        let mut backup = self.backup.map(ticker);
        debug!(autosave = ?self.autosave, backup = ?self.backup, "autosave scheduler started");

        loop {
            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
                _ = tick(&mut autosave) => {
                    autosave_once(client, current()).await;
                }
                _ = tick(&mut backup) => {
                    backup_once(client, current()).await;
                }
            }
        }
        debug!("autosave scheduler stopped");
    }
}

/// Saves `project` to its own path.
pub async fn autosave_once<T: Outbound>(
    client: &ExchangeClient<T>,
    project: Option<Project>,
) -> TickOutcome {
    let Some(project) = project.filter(|p| p.path.is_some()) else {
        debug!("autosave skipped, no saved project");
        return TickOutcome::Skipped;
    };
    match client.save_project(&project).await {
        Ok(saved) => {
            info!(path = %saved.path.display(), "autosaved project");
            TickOutcome::Written(saved.path)
        }
        Err(e) => {
            warn!(error = %e, retryable = e.is_retryable(), "autosave failed");
            TickOutcome::Failed
        }
    }
}

/// Writes a timestamped backup next to `project`'s path.
pub async fn backup_once<T: Outbound>(
    client: &ExchangeClient<T>,
    project: Option<Project>,
) -> TickOutcome {
    let Some((project, path)) = project.and_then(|p| p.path.clone().map(|path| (p, path))) else {
        debug!("backup skipped, no saved project");
        return TickOutcome::Skipped;
    };
    match client.backup_project(&path, &project).await {
        Ok(saved) => {
            info!(path = %saved.path.display(), "backed up project");
            TickOutcome::Written(saved.path)
        }
        Err(e) => {
            warn!(error = %e, retryable = e.is_retryable(), "backup failed");
            TickOutcome::Failed
        }
    }
}

fn ticker(period: Duration) -> Interval {
    let mut interval = interval_at(Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    interval
}

async fn tick(interval: &mut Option<Interval>) {
    match interval {
        Some(interval) => {
            interval.tick().await;
        }
        None => std::future::pending::<()>().await,
    }
}
