//! Wiring between the configuration, the hosted services and the core.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use tracing::{info, warn};

use studyboard_core::api::{GithubClient, SupabaseClient};
use studyboard_core::cache::SnapshotStore;
use studyboard_core::config::Member;
use studyboard_core::credentials;
use studyboard_core::models::{MemberProgress, SubmissionMatrix};
use studyboard_core::scoring::Activity;
use studyboard_core::{Aggregator, Board, BoardStore, JsonFileStore, RepoLister, StudyConfig};

const LOCAL_BOARD_FILE: &str = "board.json";

pub struct App {
    pub config: StudyConfig,
    pub board: Board,
    aggregator: Aggregator,
    snapshots: SnapshotStore,
    /// Build time of the matrix currently on disk
    persisted_at: Option<DateTime<Utc>>,
}

impl App {
    pub fn new(config_path: Option<&Path>) -> Result<Self> {
        let config = match config_path {
            Some(path) => StudyConfig::load_from(path)?,
            None => StudyConfig::load()?,
        };
        let cache_dir = config.cache_dir()?;
        let snapshots = SnapshotStore::new(cache_dir.clone())?;

        let lister = Self::repo_lister();
        let mut aggregator = Aggregator::from_config(&config, lister);

        let mut persisted_at = None;
        match snapshots.load_matrix() {
            Ok(Some(snapshot)) => {
                let cached_at = snapshot.cached_at;
                if aggregator.seed(snapshot.data, cached_at) {
                    persisted_at = Some(cached_at);
                } else {
                    info!("Roster changed since the last snapshot, rebuilding");
                }
            }
            Ok(None) => {}
            Err(e) => warn!(error = %e, "Ignoring unreadable submission snapshot"),
        }

        let board = Board::new(Some(Self::board_store(&cache_dir)));

        Ok(Self {
            config,
            board,
            aggregator,
            snapshots,
            persisted_at,
        })
    }

    fn repo_lister() -> Option<Arc<dyn RepoLister>> {
        let token = credentials::github_token()?;
        match GithubClient::new(token) {
            Ok(client) => Some(Arc::new(client) as Arc<dyn RepoLister>),
            Err(e) => {
                warn!(error = %e, "Failed to create GitHub client");
                None
            }
        }
    }

    fn board_store(cache_dir: &Path) -> Arc<dyn BoardStore> {
        if let Some(settings) = credentials::supabase_settings() {
            match SupabaseClient::new(&settings.url, settings.key) {
                Ok(client) => return Arc::new(client),
                Err(e) => warn!(error = %e, "Failed to create Supabase client, using local board"),
            }
        }
        let path = cache_dir.join(LOCAL_BOARD_FILE);
        info!(path = %path.display(), "Using local board storage");
        Arc::new(JsonFileStore::new(path))
    }

    /// Current matrix; a fresh build is written back to the snapshot
    pub async fn matrix(&mut self) -> SubmissionMatrix {
        let matrix = self.aggregator.submission_matrix(Utc::now()).await;
        self.persist(&matrix);
        matrix
    }

    /// Drop the cached matrix, rebuild it and persist the result
    pub async fn refresh(&mut self) -> Result<SubmissionMatrix> {
        self.snapshots
            .clear_matrix()
            .context("Failed to clear submission snapshot")?;
        self.persisted_at = None;
        let matrix = self.aggregator.refresh(Utc::now()).await;
        self.persist(&matrix);
        Ok(matrix)
    }

    fn persist(&mut self, matrix: &SubmissionMatrix) {
        let Some(built_at) = self.aggregator.cache().built_at() else {
            return;
        };
        if self.persisted_at == Some(built_at) {
            return;
        }
        match self.snapshots.save_matrix(matrix, built_at) {
            Ok(()) => self.persisted_at = Some(built_at),
            Err(e) => warn!(error = %e, "Failed to save submission snapshot"),
        }
    }

    pub fn snapshot_age(&self) -> String {
        self.snapshots.matrix_age(Utc::now())
    }

    pub async fn activity(&self) -> Activity {
        self.board.activity().await
    }

    pub fn member(&self, handle: &str) -> Result<&Member> {
        self.config
            .member(handle)
            .ok_or_else(|| anyhow::anyhow!("Unknown member: {}", handle))
    }

    /// A member's row, looked up in a freshly fetched matrix
    pub async fn progress_of(&mut self, handle: &str) -> Result<MemberProgress> {
        self.member(handle)?;
        let matrix = self.matrix().await;
        matrix
            .member(handle)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("No submission data for {}", handle))
    }
}
