pub mod cloner;

use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

use crate::github::auth::InstallationToken;
use crate::github::models::PushEvent;
use cloner::Cloner;

#[derive(Debug, Error)]
pub enum BackupError {
    #[error("invalid repository identifier: {0:?}")]
    InvalidName(String),
    #[error("failed to create backup directory: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to clone repository: {0}")]
    Clone(String),
}

/// Timestamped destination for one clone. Built fresh per backup; the
/// timestamp keeps concurrent backups of the same repository apart.
#[derive(Debug)]
pub struct BackupTarget {
    pub owner: String,
    pub repo: String,
    pub timestamp: DateTime<Utc>,
    pub path: PathBuf,
}

impl BackupTarget {
    pub fn new(
        root: &Path,
        owner: &str,
        repo: &str,
        now: DateTime<Utc>,
    ) -> Result<Self, BackupError> {
        validate_component(owner)?;
        validate_component(repo)?;

        let path = root
            .join(owner)
            .join(repo)
            .join(now.format("%Y%m%d_%H%M%S").to_string());

        Ok(Self {
            owner: owner.to_string(),
            repo: repo.to_string(),
            timestamp: now,
            path,
        })
    }
}

/// Owner and repo names come from an only-partially-trusted payload and
/// become filesystem path components, so separators and traversal
/// sequences are rejected outright.
fn validate_component(name: &str) -> Result<(), BackupError> {
    if name.is_empty() || name.contains('/') || name.contains('\\') || name.contains("..") {
        return Err(BackupError::InvalidName(name.to_string()));
    }
    Ok(())
}

pub struct BackupOrchestrator {
    root: PathBuf,
    cloner: Arc<dyn Cloner>,
}

impl BackupOrchestrator {
    pub fn new(root: PathBuf, cloner: Arc<dyn Cloner>) -> Self {
        Self { root, cloner }
    }

    /// Clones the pushed repository into a fresh timestamped directory
    /// under the backup root, authenticating with the installation token.
    /// A partially written directory is kept on failure for diagnosis.
    pub async fn backup(
        &self,
        event: &PushEvent,
        token: &InstallationToken,
    ) -> Result<PathBuf, BackupError> {
        let target = BackupTarget::new(
            &self.root,
            &event.repository.owner.name,
            &event.repository.name,
            Utc::now(),
        )?;

        tokio::fs::create_dir_all(&target.path).await?;
        info!(backup_dir = %target.path.display(), "created backup directory");

        info!(repository = %event.repository.full_name, "starting repository clone");
        self.cloner
            .clone_repo(
                &event.repository.clone_url,
                "x-access-token",
                &token.token,
                &target.path,
            )
            .await?;

        info!(backup_dir = %target.path.display(), "repository backup completed");
        Ok(target.path)
    }
}
