//! Study board: quiz completions, shared papers with comments, and
//! portfolio projects.
//!
//! The board works over an optional [`BoardStore`]. Read paths favour
//! availability and come back empty when the store is missing or failing;
//! write paths validate their input before touching the store and report
//! failures as [`BoardError`].

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::api::ApiError;
use crate::config::Quiz;
use crate::models::{
    Comment, NewComment, NewPaper, NewProject, Paper, Project, ProjectUpdate, QuizCompletion,
    DEFAULT_PROJECT_STATUS,
};
use crate::scoring::{competition_ranks, Activity};

#[derive(Error, Debug)]
pub enum BoardError {
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Board storage is not configured")]
    StorageUnavailable,

    #[error("Storage request failed: {0}")]
    Storage(#[from] ApiError),

    #[error("Local board file I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Local board file is malformed: {0}")]
    Serde(#[from] serde_json::Error),
}

impl BoardError {
    /// HTTP status a web front end would answer with
    pub fn status_code(&self) -> u16 {
        match self {
            BoardError::MissingField(_) => 400,
            BoardError::NotFound(_) => 404,
            BoardError::Storage(ApiError::NotFound(_)) => 404,
            BoardError::StorageUnavailable
            | BoardError::Storage(_)
            | BoardError::Io(_)
            | BoardError::Serde(_) => 500,
        }
    }

    pub fn payload(&self) -> ErrorPayload {
        ErrorPayload {
            error: self.to_string(),
            status: self.status_code(),
        }
    }
}

/// Structured error body for write requests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorPayload {
    pub error: String,
    pub status: u16,
}

/// Tables behind the board. Implemented by the hosted database client and
/// by a local JSON file.
#[async_trait]
pub trait BoardStore: Send + Sync {
    async fn quiz_completions(&self) -> Result<Vec<QuizCompletion>, BoardError>;

    async fn quiz_completions_for(&self, user_name: &str) -> Result<Vec<QuizCompletion>, BoardError>;

    /// Insert or replace the completion keyed by (user name, quiz id)
    async fn upsert_quiz_completion(&self, completion: &QuizCompletion) -> Result<(), BoardError>;

    /// Papers, newest first
    async fn papers(&self, limit: Option<usize>) -> Result<Vec<Paper>, BoardError>;

    async fn papers_by(&self, author: &str) -> Result<Vec<Paper>, BoardError>;

    async fn paper(&self, id: i64) -> Result<Option<Paper>, BoardError>;

    async fn insert_paper(&self, paper: &NewPaper) -> Result<Paper, BoardError>;

    /// Comments on a paper, oldest first
    async fn comments(&self, paper_id: i64) -> Result<Vec<Comment>, BoardError>;

    async fn insert_comment(&self, comment: &NewComment) -> Result<Comment, BoardError>;

    /// A member's projects, newest first
    async fn projects(&self, user_name: &str) -> Result<Vec<Project>, BoardError>;

    async fn insert_project(&self, project: &NewProject) -> Result<Project, BoardError>;

    async fn update_project(&self, id: &str, update: &ProjectUpdate) -> Result<(), BoardError>;

    async fn delete_project(&self, id: &str) -> Result<(), BoardError>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuizStat {
    pub quiz_id: String,
    pub title: String,
    pub completed: usize,
    pub users: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuizLeader {
    pub rank: usize,
    pub name: String,
    pub completed: u32,
}

/// Paper with its comment thread.
#[derive(Debug, Clone, Serialize)]
pub struct PaperThread {
    #[serde(flatten)]
    pub paper: Paper,
    pub comments: Vec<Comment>,
}

fn require(value: &str, field: &'static str) -> Result<(), BoardError> {
    if value.trim().is_empty() {
        Err(BoardError::MissingField(field))
    } else {
        Ok(())
    }
}

fn count_by<T>(rows: &[T], key: impl Fn(&T) -> &str) -> HashMap<String, u32> {
    let mut counts = HashMap::new();
    for row in rows {
        *counts.entry(key(row).to_string()).or_insert(0) += 1;
    }
    counts
}

pub struct Board {
    store: Option<Arc<dyn BoardStore>>,
}

impl Board {
    pub fn new(store: Option<Arc<dyn BoardStore>>) -> Self {
        if store.is_none() {
            warn!("No board storage configured, quizzes, papers and projects are read-only and empty");
        }
        Self { store }
    }

    pub fn is_available(&self) -> bool {
        self.store.is_some()
    }

    fn store(&self) -> Result<&Arc<dyn BoardStore>, BoardError> {
        self.store.as_ref().ok_or(BoardError::StorageUnavailable)
    }

    /// Run a read, degrading to the default value when storage is missing or failing
    async fn read_or_default<T, F, Fut>(&self, what: &str, read: F) -> T
    where
        T: Default,
        F: FnOnce(Arc<dyn BoardStore>) -> Fut,
        Fut: std::future::Future<Output = Result<T, BoardError>>,
    {
        let Some(store) = self.store.clone() else {
            return T::default();
        };
        match read(store).await {
            Ok(value) => value,
            Err(e) => {
                warn!(read = what, error = %e, "Board read failed, using empty result");
                T::default()
            }
        }
    }

    // ===== Quizzes =====

    pub async fn complete_quiz(
        &self,
        user_name: &str,
        quiz_id: &str,
        now: DateTime<Utc>,
    ) -> Result<(), BoardError> {
        require(user_name, "user_name")?;
        require(quiz_id, "quiz_id")?;
        let completion = QuizCompletion {
            user_name: user_name.trim().to_string(),
            quiz_id: quiz_id.trim().to_string(),
            completed_at: Some(now),
        };
        self.store()?.upsert_quiz_completion(&completion).await?;
        info!(user = %completion.user_name, quiz = %completion.quiz_id, "Quiz completed");
        Ok(())
    }

    pub async fn quiz_completions(&self) -> Vec<QuizCompletion> {
        self.read_or_default("quiz_completions", |s| async move { s.quiz_completions().await })
            .await
    }

    pub async fn quiz_count_for(&self, user_name: &str) -> u32 {
        let rows = self
            .read_or_default("quiz_completions_for", |s| async move {
                s.quiz_completions_for(user_name).await
            })
            .await;
        rows.len() as u32
    }

    /// Completion count and completing users for every quiz in the catalog
    pub async fn quiz_stats(&self, catalog: &[Quiz]) -> Vec<QuizStat> {
        let completions = self.quiz_completions().await;
        catalog
            .iter()
            .map(|quiz| {
                let users: Vec<String> = completions
                    .iter()
                    .filter(|c| c.quiz_id == quiz.id)
                    .map(|c| c.user_name.clone())
                    .collect();
                QuizStat {
                    quiz_id: quiz.id.clone(),
                    title: quiz.title.clone(),
                    completed: users.len(),
                    users,
                }
            })
            .collect()
    }

    /// Members by number of completed quizzes, tied counts sharing a rank
    pub async fn quiz_leaderboard(&self) -> Vec<QuizLeader> {
        let completions = self.quiz_completions().await;
        let mut counts: Vec<(String, u32)> = count_by(&completions, |c| c.user_name.as_str())
            .into_iter()
            .collect();
        counts.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

        let scores: Vec<u32> = counts.iter().map(|(_, n)| *n).collect();
        competition_ranks(&scores)
            .into_iter()
            .zip(counts)
            .map(|(rank, (name, completed))| QuizLeader {
                rank,
                name,
                completed,
            })
            .collect()
    }

    // ===== Papers =====

    pub async fn papers(&self) -> Result<Vec<Paper>, BoardError> {
        self.store()?.papers(None).await
    }

    pub async fn recent_papers(&self, limit: usize) -> Vec<Paper> {
        self.read_or_default("recent_papers", |s| async move { s.papers(Some(limit)).await })
            .await
    }

    pub async fn paper(&self, id: i64) -> Result<Paper, BoardError> {
        self.store()?
            .paper(id)
            .await?
            .ok_or_else(|| BoardError::NotFound(format!("paper {}", id)))
    }

    pub async fn paper_thread(&self, id: i64) -> Result<PaperThread, BoardError> {
        let paper = self.paper(id).await?;
        let comments = self.store()?.comments(id).await?;
        Ok(PaperThread { paper, comments })
    }

    pub async fn create_paper(&self, paper: NewPaper) -> Result<Paper, BoardError> {
        require(&paper.title, "title")?;
        require(&paper.author, "author")?;
        let created = self.store()?.insert_paper(&paper).await?;
        info!(id = created.id, author = %created.author, "Paper shared");
        Ok(created)
    }

    pub async fn comments(&self, paper_id: i64) -> Result<Vec<Comment>, BoardError> {
        self.store()?.comments(paper_id).await
    }

    pub async fn create_comment(
        &self,
        paper_id: i64,
        author: &str,
        content: &str,
    ) -> Result<Comment, BoardError> {
        require(author, "author")?;
        require(content, "content")?;
        let comment = NewComment {
            paper_id,
            author: author.to_string(),
            content: content.to_string(),
        };
        self.store()?.insert_comment(&comment).await
    }

    pub async fn paper_count_for(&self, author: &str) -> u32 {
        let rows = self
            .read_or_default("papers_by", |s| async move { s.papers_by(author).await })
            .await;
        rows.len() as u32
    }

    // ===== Projects =====

    pub async fn projects(&self, user_name: &str) -> Vec<Project> {
        self.read_or_default("projects", |s| async move { s.projects(user_name).await })
            .await
    }

    pub async fn add_project(&self, mut project: NewProject) -> Result<Project, BoardError> {
        require(&project.user_name, "user_name")?;
        require(&project.title, "title")?;
        if project.status.trim().is_empty() {
            project.status = DEFAULT_PROJECT_STATUS.to_string();
        }
        let created = self.store()?.insert_project(&project).await?;
        info!(id = %created.id, user = %created.user_name, "Project added");
        Ok(created)
    }

    pub async fn update_project(&self, id: &str, update: &ProjectUpdate) -> Result<(), BoardError> {
        require(id, "id")?;
        if update.is_empty() {
            return Err(BoardError::MissingField("update fields"));
        }
        self.store()?.update_project(id, update).await
    }

    pub async fn delete_project(&self, id: &str) -> Result<(), BoardError> {
        require(id, "id")?;
        self.store()?.delete_project(id).await
    }

    // ===== Aggregates for scoring =====

    /// Quiz and paper counts per display name
    pub async fn activity(&self) -> Activity {
        let completions = self.quiz_completions().await;
        let papers = self
            .read_or_default("papers", |s| async move { s.papers(None).await })
            .await;
        Activity {
            quizzes: count_by(&completions, |c| c.user_name.as_str()),
            papers: count_by(&papers, |p| p.author.as_str()),
        }
    }
}
