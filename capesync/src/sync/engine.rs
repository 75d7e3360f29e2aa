use std::io;
use std::path::{Path, PathBuf};

use capes_core::{CapeApiClient, CapeApiError, RemoteDirectory, RemoteEntry};
use thiserror::Error;
use tracing::{debug, error, info, warn};

use super::assets::write_cape;
use super::paths::{cape_repo_url, cape_target_path, ensure_category_dirs};
use crate::config::SyncConfig;
use crate::store::{LoadStatus, StoreDiff, StoreError, UserStore};

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("store error: {0}")]
    Store(#[from] StoreError),
    #[error("filesystem error at {path}: {source}")]
    Io { path: PathBuf, source: io::Error },
}

impl SyncError {
    fn io(path: &Path) -> impl FnOnce(io::Error) -> Self + '_ {
        move |source| SyncError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// The directory came back empty; the store file was not touched.
    Aborted,
    Completed(SyncReport),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub downloaded: usize,
    pub skipped_existing: usize,
    pub failed_downloads: usize,
    pub invalid_entries: usize,
    pub diff: StoreDiff,
}

pub struct Synchronizer {
    client: CapeApiClient,
    config: SyncConfig,
}

impl Synchronizer {
    pub fn new(client: CapeApiClient, config: SyncConfig) -> Self {
        Self { client, config }
    }

    pub fn from_config(config: SyncConfig) -> Result<Self, CapeApiError> {
        let client = CapeApiClient::with_base_url(&config.api_url)?;
        Ok(Self::new(client, config))
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    pub async fn run(&self) -> Result<SyncOutcome, SyncError> {
        ensure_category_dirs(&self.config.capes_dir)
            .await
            .map_err(SyncError::io(&self.config.capes_dir))?;

        let prior = self.load_prior().await?;

        let directory = self.fetch_directory().await;
        if directory.is_empty() {
            warn!("cape directory is empty or unavailable, keeping existing users.json");
            return Ok(SyncOutcome::Aborted);
        }
        info!(users = directory.len(), "fetched cape directory");

        let (merged, mut report) = self.reconcile(&prior, &directory).await?;

        report.diff = StoreDiff::between(&prior, &merged);
        info!(
            added = report.diff.added.len(),
            updated = report.diff.updated.len(),
            unchanged = report.diff.unchanged.len(),
            "merged user index"
        );

        merged.save(&self.config.users_json).await?;
        info!(
            path = %self.config.users_json.display(),
            downloaded = report.downloaded,
            failed = report.failed_downloads,
            "sync finished"
        );
        Ok(SyncOutcome::Completed(report))
    }

    async fn load_prior(&self) -> Result<UserStore, SyncError> {
        let path = &self.config.users_json;
        let outcome = UserStore::load(path).await?;
        match &outcome.status {
            LoadStatus::Missing => info!(path = %path.display(), "no existing users.json"),
            LoadStatus::Loaded(count) => {
                info!(users = count, path = %path.display(), "loaded existing users")
            }
            LoadStatus::Corrupt(reason) => error!(
                path = %path.display(),
                reason = %reason,
                "users.json is unreadable, starting from an empty index"
            ),
        }
        Ok(outcome.store)
    }

    /// Any fetch failure degrades to an empty directory.
    async fn fetch_directory(&self) -> RemoteDirectory {
        match self.client.fetch_directory().await {
            Ok(directory) => directory,
            Err(err) => {
                error!(
                    error = %err,
                    url = %self.client.base_url(),
                    "failed to fetch cape directory"
                );
                RemoteDirectory::default()
            }
        }
    }

    /// Walks the directory in API order and returns the merged index. The merge
    /// starts from `prior`, so users missing from the directory keep their entry.
    async fn reconcile(
        &self,
        prior: &UserStore,
        directory: &RemoteDirectory,
    ) -> Result<(UserStore, SyncReport), SyncError> {
        let mut merged = prior.clone();
        let mut report = SyncReport::default();

        for (username, entry) in directory.iter() {
            let descriptor = match entry {
                RemoteEntry::Descriptor(descriptor) => descriptor,
                RemoteEntry::Malformed(reason) => {
                    error!(user = username, reason = %reason, "malformed cape descriptor");
                    report.invalid_entries += 1;
                    continue;
                }
            };
            let Some(cape_id) = descriptor.cape_id() else {
                error!(user = username, "user has no cape id");
                report.invalid_entries += 1;
                continue;
            };

            let category = descriptor.category();
            let paths = cape_target_path(&self.config.capes_dir, category, cape_id)
                .and_then(|target| {
                    cape_repo_url(&self.config.repo_url, category, cape_id).map(|url| (target, url))
                });
            let (target, repo_url) = match paths {
                Ok(paths) => paths,
                Err(err) => {
                    error!(user = username, cape_id, error = %err, "rejected cape id");
                    report.invalid_entries += 1;
                    continue;
                }
            };

            if let Some(parent) = target.parent() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(SyncError::io(parent))?;
            }

            let exists = tokio::fs::try_exists(&target)
                .await
                .map_err(SyncError::io(&target))?;
            if exists {
                debug!(user = username, cape_id, "cape already present, skipping download");
                report.skipped_existing += 1;
            } else {
                info!(user = username, cape_id, %category, "downloading cape");
                match self.client.download_cape(cape_id).await {
                    Ok(bytes) => {
                        write_cape(&target, &bytes)
                            .await
                            .map_err(SyncError::io(&target))?;
                        info!(user = username, path = %target.display(), "cape saved");
                        report.downloaded += 1;
                    }
                    Err(err) => {
                        error!(user = username, cape_id, error = %err, "failed to download cape");
                        report.failed_downloads += 1;
                        if prior.contains(username) {
                            warn!(user = username, "keeping existing entry");
                        }
                        // merged still holds whatever prior had for this user
                        continue;
                    }
                }
            }

            merged.set_url(username, repo_url);
        }

        Ok((merged, report))
    }
}

#[cfg(test)]
#[path = "engine_tests.rs"]
mod tests;
