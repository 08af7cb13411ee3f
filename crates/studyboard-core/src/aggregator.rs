//! Builds the submission matrix from member repositories.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info, warn};

use crate::api::ApiError;
use crate::cache::MatrixCache;
use crate::config::{Member, StudyConfig};
use crate::detector::{detect_chapter, is_notebook};
use crate::models::{MemberProgress, SubmissionMatrix};

/// An entry in the root of a member repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoFile {
    pub name: String,
    pub html_url: Option<String>,
    /// False for directories, submodules and symlinks
    pub is_file: bool,
}

/// Lists the files at the root of a repository.
#[async_trait]
pub trait RepoLister: Send + Sync {
    async fn list_files(&self, org: &str, repo: &str) -> Result<Vec<RepoFile>, ApiError>;
}

/// Turns repository listings into a cached submission matrix.
pub struct Aggregator {
    org: String,
    roster: Vec<Member>,
    lister: Option<Arc<dyn RepoLister>>,
    cache: MatrixCache,
}

impl Aggregator {
    pub fn new(
        org: String,
        roster: Vec<Member>,
        lister: Option<Arc<dyn RepoLister>>,
        validity: Duration,
    ) -> Self {
        if lister.is_none() {
            warn!("No repository access configured, submission tracking will report no members");
        }
        Self {
            org,
            roster,
            lister,
            cache: MatrixCache::new(validity),
        }
    }

    pub fn from_config(config: &StudyConfig, lister: Option<Arc<dyn RepoLister>>) -> Self {
        Self::new(
            config.org_name.clone(),
            config.members.clone(),
            lister,
            config.cache_duration(),
        )
    }

    pub fn cache(&self) -> &MatrixCache {
        &self.cache
    }

    /// Prime the cache with a matrix built earlier (e.g. a disk snapshot).
    ///
    /// A matrix built for a different roster is rejected and `false` is
    /// returned, so added or removed members show up on the next read.
    pub fn seed(&mut self, matrix: SubmissionMatrix, built_at: DateTime<Utc>) -> bool {
        if !self.matches_roster(&matrix) {
            debug!(
                cached = matrix.len(),
                roster = self.roster.len(),
                "Snapshot roster differs from config, not seeding"
            );
            return false;
        }
        self.cache.set(matrix, built_at);
        true
    }

    fn matches_roster(&self, matrix: &SubmissionMatrix) -> bool {
        let mut cached: Vec<&str> = matrix.members.iter().map(|m| m.handle.as_str()).collect();
        let mut roster: Vec<&str> = self.roster.iter().map(|m| m.handle.as_str()).collect();
        cached.sort_unstable();
        roster.sort_unstable();
        cached == roster
    }

    /// Current submission matrix, rebuilt when the cache has expired.
    ///
    /// Never fails: without repository access the matrix is empty, and
    /// per-member listing errors only affect that member's row.
    pub async fn submission_matrix(&mut self, now: DateTime<Utc>) -> SubmissionMatrix {
        if let Some(cached) = self.cache.get(now) {
            debug!(members = cached.len(), "Serving cached submission matrix");
            return cached.clone();
        }

        if self.lister.is_none() {
            return SubmissionMatrix::default();
        }

        let matrix = self.build_matrix().await;
        self.cache.set(matrix.clone(), now);
        matrix
    }

    /// Drop the cached matrix and rebuild immediately
    pub async fn refresh(&mut self, now: DateTime<Utc>) -> SubmissionMatrix {
        self.invalidate();
        self.submission_matrix(now).await
    }

    pub fn invalidate(&mut self) {
        info!("Submission cache invalidated");
        self.cache.invalidate();
    }

    /// Build a fresh matrix, one listing call per member in roster order
    pub async fn build_matrix(&self) -> SubmissionMatrix {
        let Some(ref lister) = self.lister else {
            return SubmissionMatrix::default();
        };

        let mut matrix = SubmissionMatrix {
            members: self.roster.iter().map(MemberProgress::new).collect(),
        };

        for row in &mut matrix.members {
            match lister.list_files(&self.org, &row.handle).await {
                Ok(files) => Self::apply_listing(row, files),
                Err(e) => {
                    warn!(member = %row.handle, error = %e, "Failed to list repository, keeping partial results");
                }
            }
        }

        info!(
            members = matrix.len(),
            completed = matrix.total_completed(),
            "Built submission matrix"
        );
        matrix
    }

    /// Record every notebook in a listing against the member's row.
    ///
    /// Listings come back in no guaranteed order, so they are sorted by name
    /// first; the first file per chapter is the one recorded.
    fn apply_listing(row: &mut MemberProgress, mut files: Vec<RepoFile>) {
        files.retain(|f| f.is_file && is_notebook(&f.name));
        files.sort_by(|a, b| a.name.cmp(&b.name));

        for file in &files {
            match detect_chapter(&file.name) {
                Some(chapter) => {
                    if row.record(chapter, &file.name, file.html_url.as_deref()) {
                        debug!(member = %row.handle, chapter = %chapter, file = %file.name, "Chapter completed");
                    }
                }
                None => {
                    debug!(member = %row.handle, file = %file.name, "No chapter detected");
                }
            }
        }
    }
}
