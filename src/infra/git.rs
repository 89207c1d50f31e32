//! Manifest repository adapter backed by libgit2.
//!
//! libgit2 calls are blocking, so every operation runs on the blocking
//! thread pool. The repository is reopened per operation — opens are cheap
//! and keeping no handle across awaits keeps the adapter `Send`.

use std::path::PathBuf;

use anyhow::{Context, Result};
use git2::build::{CheckoutBuilder, RepoBuilder};
use git2::{ErrorCode, Oid, Repository, ResetType};

use crate::application::ports::{ManifestRepo, RemoteStatus};
use crate::domain::error::CycleError;

/// The local checkout of the tracked deployment-manifest repository.
///
/// The checkout is disposable: an invalid or corrupt one is destroyed and
/// re-cloned rather than repaired, and local modifications are discarded
/// unconditionally — tracked manifests are never edited locally.
#[derive(Debug, Clone)]
pub struct GitManifestRepo {
    url: String,
    branch: String,
    path: PathBuf,
}

impl GitManifestRepo {
    pub fn new(url: impl Into<String>, branch: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            url: url.into(),
            branch: branch.into(),
            path: path.into(),
        }
    }

    fn open_or_clone(&self) -> Result<Repository, CycleError> {
        if self.path.exists() {
            if !self.path.is_dir() {
                return Err(CycleError::CheckoutNotADirectory(self.path.clone()));
            }
            match Repository::open(&self.path) {
                Ok(repo) => return Ok(repo),
                Err(err) if err.code() == ErrorCode::NotFound => {
                    tracing::warn!(
                        path = %self.path.display(),
                        "checkout is not a valid repository, destroying and recloning",
                    );
                    std::fs::remove_dir_all(&self.path).with_context(|| {
                        format!("removing corrupt checkout {}", self.path.display())
                    })?;
                }
                Err(err) => {
                    return Err(anyhow::Error::new(err)
                        .context(format!("opening checkout {}", self.path.display()))
                        .into());
                }
            }
        }

        tracing::info!(url = %self.url, path = %self.path.display(), "cloning manifest repository");
        let repo = RepoBuilder::new()
            .branch(&self.branch)
            .clone(&self.url, &self.path)
            .with_context(|| format!("cloning {}", self.url))?;
        Ok(repo)
    }

    fn fetch_origin(&self, repo: &Repository) -> Result<()> {
        let mut remote = repo.find_remote("origin").context("finding remote origin")?;
        // Explicit refspec so the tracking ref updates even when the remote
        // config carries no default fetch mapping.
        let refspec = format!(
            "+refs/heads/{branch}:refs/remotes/origin/{branch}",
            branch = self.branch
        );
        remote
            .fetch(&[refspec.as_str()], None, None)
            .with_context(|| format!("fetching origin/{}", self.branch))?;
        Ok(())
    }

    fn head_commit(repo: &Repository) -> Result<Oid> {
        Ok(repo
            .head()
            .context("resolving HEAD")?
            .peel_to_commit()
            .context("peeling HEAD to a commit")?
            .id())
    }

    fn remote_tip(&self, repo: &Repository) -> Result<Oid> {
        Ok(repo
            .find_reference(&format!("refs/remotes/origin/{}", self.branch))
            .with_context(|| format!("finding origin/{}", self.branch))?
            .peel_to_commit()
            .context("peeling remote tip to a commit")?
            .id())
    }
}

impl ManifestRepo for GitManifestRepo {
    async fn ensure_checkout(&self) -> Result<(), CycleError> {
        let this = self.clone();
        run_blocking(move || this.open_or_clone().map(|_| ())).await
    }

    async fn remote_update(&self) -> Result<RemoteStatus, CycleError> {
        let this = self.clone();
        run_blocking(move || {
            let repo = this.open_or_clone()?;
            this.fetch_origin(&repo)?;
            let current = Self::head_commit(&repo)?;
            let latest = this.remote_tip(&repo)?;
            Ok(RemoteStatus {
                current: current.to_string(),
                latest: latest.to_string(),
            })
        })
        .await
    }

    async fn fast_forward(&self) -> Result<(), CycleError> {
        let this = self.clone();
        run_blocking(move || {
            let repo = this.open_or_clone()?;
            this.fetch_origin(&repo)?;
            let tip = this.remote_tip(&repo)?;
            let commit = repo.find_commit(tip).context("finding remote tip commit")?;

            // Pin the local branch ref to the remote tip and put HEAD on it,
            // then hard-reset so the working tree reflects the remote exactly
            // even if a previous cycle left partial local state.
            let refname = format!("refs/heads/{}", this.branch);
            repo.reference(&refname, tip, true, "fast-forward to remote tip")
                .context("updating local branch ref")?;
            repo.set_head(&refname).context("setting HEAD")?;
            repo.reset(
                commit.as_object(),
                ResetType::Hard,
                Some(CheckoutBuilder::new().force()),
            )
            .context("hard reset to remote tip")?;

            tracing::info!(commit = %tip, branch = %this.branch, "checkout fast-forwarded");
            Ok(())
        })
        .await
    }
}

async fn run_blocking<T>(
    job: impl FnOnce() -> Result<T, CycleError> + Send + 'static,
) -> Result<T, CycleError>
where
    T: Send + 'static,
{
    tokio::task::spawn_blocking(job)
        .await
        .map_err(|err| CycleError::Transient(anyhow::anyhow!("git task failed: {err}")))?
}
