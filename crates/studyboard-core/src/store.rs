//! Local JSON file implementation of [`BoardStore`].
//!
//! Used when no hosted database is configured. All tables live in one JSON
//! document that is rewritten on every change.

use std::path::PathBuf;

use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::debug;

use crate::board::{BoardError, BoardStore};
use crate::models::{
    Comment, NewComment, NewPaper, NewProject, Paper, Project, ProjectUpdate, QuizCompletion,
};

#[derive(Debug, Default, Serialize, Deserialize)]
struct BoardDocument {
    #[serde(default)]
    next_id: i64,
    #[serde(default)]
    quiz_completions: Vec<QuizCompletion>,
    #[serde(default)]
    papers: Vec<Paper>,
    #[serde(default)]
    comments: Vec<Comment>,
    #[serde(default)]
    projects: Vec<Project>,
}

impl BoardDocument {
    fn allocate_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

pub struct JsonFileStore {
    path: PathBuf,
    /// Serializes read-modify-write cycles on the file
    lock: Mutex<()>,
}

impl JsonFileStore {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            lock: Mutex::new(()),
        }
    }

    fn read(&self) -> Result<BoardDocument, BoardError> {
        if !self.path.exists() {
            return Ok(BoardDocument::default());
        }
        let contents = std::fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&contents)?)
    }

    fn write(&self, doc: &BoardDocument) -> Result<(), BoardError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(doc)?;
        std::fs::write(&self.path, contents)?;
        debug!(path = %self.path.display(), "Saved local board");
        Ok(())
    }

    async fn view<T>(&self, f: impl FnOnce(&BoardDocument) -> T) -> Result<T, BoardError> {
        let _guard = self.lock.lock().await;
        let doc = self.read()?;
        Ok(f(&doc))
    }

    async fn modify<T>(&self, f: impl FnOnce(&mut BoardDocument) -> T) -> Result<T, BoardError> {
        let _guard = self.lock.lock().await;
        let mut doc = self.read()?;
        let result = f(&mut doc);
        self.write(&doc)?;
        Ok(result)
    }
}

fn newest_first<T>(rows: &mut [T], key: impl Fn(&T) -> (Option<chrono::DateTime<Utc>>, i64)) {
    rows.sort_by(|a, b| key(b).cmp(&key(a)));
}

#[async_trait]
impl BoardStore for JsonFileStore {
    async fn quiz_completions(&self) -> Result<Vec<QuizCompletion>, BoardError> {
        self.view(|doc| doc.quiz_completions.clone()).await
    }

    async fn quiz_completions_for(&self, user_name: &str) -> Result<Vec<QuizCompletion>, BoardError> {
        self.view(|doc| {
            doc.quiz_completions
                .iter()
                .filter(|c| c.user_name == user_name)
                .cloned()
                .collect()
        })
        .await
    }

    async fn upsert_quiz_completion(&self, completion: &QuizCompletion) -> Result<(), BoardError> {
        self.modify(|doc| {
            match doc
                .quiz_completions
                .iter_mut()
                .find(|c| c.user_name == completion.user_name && c.quiz_id == completion.quiz_id)
            {
                Some(existing) => *existing = completion.clone(),
                None => doc.quiz_completions.push(completion.clone()),
            }
        })
        .await
    }

    async fn papers(&self, limit: Option<usize>) -> Result<Vec<Paper>, BoardError> {
        self.view(|doc| {
            let mut papers = doc.papers.clone();
            newest_first(&mut papers, |p| (p.created_at, p.id));
            if let Some(limit) = limit {
                papers.truncate(limit);
            }
            papers
        })
        .await
    }

    async fn papers_by(&self, author: &str) -> Result<Vec<Paper>, BoardError> {
        self.view(|doc| doc.papers.iter().filter(|p| p.author == author).cloned().collect())
            .await
    }

    async fn paper(&self, id: i64) -> Result<Option<Paper>, BoardError> {
        self.view(|doc| doc.papers.iter().find(|p| p.id == id).cloned())
            .await
    }

    async fn insert_paper(&self, paper: &NewPaper) -> Result<Paper, BoardError> {
        self.modify(|doc| {
            let row = Paper {
                id: doc.allocate_id(),
                title: paper.title.clone(),
                author: paper.author.clone(),
                content: paper.content.clone(),
                link: paper.link.clone(),
                created_at: Some(Utc::now()),
            };
            doc.papers.push(row.clone());
            row
        })
        .await
    }

    async fn comments(&self, paper_id: i64) -> Result<Vec<Comment>, BoardError> {
        self.view(|doc| {
            let mut comments: Vec<Comment> = doc
                .comments
                .iter()
                .filter(|c| c.paper_id == paper_id)
                .cloned()
                .collect();
            comments.sort_by_key(|c| (c.created_at, c.id));
            comments
        })
        .await
    }

    async fn insert_comment(&self, comment: &NewComment) -> Result<Comment, BoardError> {
        self.modify(|doc| {
            let row = Comment {
                id: doc.allocate_id(),
                paper_id: comment.paper_id,
                author: comment.author.clone(),
                content: comment.content.clone(),
                created_at: Some(Utc::now()),
            };
            doc.comments.push(row.clone());
            row
        })
        .await
    }

    async fn projects(&self, user_name: &str) -> Result<Vec<Project>, BoardError> {
        self.view(|doc| {
            let mut projects: Vec<Project> = doc
                .projects
                .iter()
                .filter(|p| p.user_name == user_name)
                .cloned()
                .collect();
            newest_first(&mut projects, |p| {
                (p.created_at, p.id.parse::<i64>().unwrap_or_default())
            });
            projects
        })
        .await
    }

    async fn insert_project(&self, project: &NewProject) -> Result<Project, BoardError> {
        self.modify(|doc| {
            let row = Project {
                id: doc.allocate_id().to_string(),
                user_name: project.user_name.clone(),
                title: project.title.clone(),
                description: project.description.clone(),
                notion_url: project.notion_url.clone(),
                github_url: project.github_url.clone(),
                demo_url: project.demo_url.clone(),
                status: Some(project.status.clone()),
                start_date: project.start_date.clone(),
                end_date: project.end_date.clone(),
                tech_stack: project.tech_stack.clone(),
                tags: project.tags.clone(),
                created_at: Some(Utc::now()),
            };
            doc.projects.push(row.clone());
            row
        })
        .await
    }

    async fn update_project(&self, id: &str, update: &ProjectUpdate) -> Result<(), BoardError> {
        let found = self
            .modify(|doc| match doc.projects.iter_mut().find(|p| p.id == id) {
                Some(project) => {
                    update.apply_to(project);
                    true
                }
                None => false,
            })
            .await?;
        if found {
            Ok(())
        } else {
            Err(BoardError::NotFound(format!("project {}", id)))
        }
    }

    async fn delete_project(&self, id: &str) -> Result<(), BoardError> {
        let removed = self
            .modify(|doc| {
                let before = doc.projects.len();
                doc.projects.retain(|p| p.id != id);
                before != doc.projects.len()
            })
            .await?;
        if removed {
            Ok(())
        } else {
            Err(BoardError::NotFound(format!("project {}", id)))
        }
    }
}
