use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// One row of the `quiz_completions` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuizCompletion {
    pub user_name: String,
    pub quiz_id: String,
    pub completed_at: Option<DateTime<Utc>>,
}

/// A shared paper post.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Paper {
    pub id: i64,
    pub title: String,
    pub author: String,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub link: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

/// Insert payload for the `papers` table.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewPaper {
    pub title: String,
    pub author: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
}

/// A comment on a paper post.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: i64,
    pub paper_id: i64,
    pub author: String,
    pub content: String,
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewComment {
    pub paper_id: i64,
    pub author: String,
    pub content: String,
}

/// Default status of a freshly added portfolio project
pub const DEFAULT_PROJECT_STATUS: &str = "in_progress";

/// Project ids are uuids or serial integers depending on the table setup
fn id_as_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Number(i64),
    }

    Ok(match RawId::deserialize(deserializer)? {
        RawId::Text(s) => s,
        RawId::Number(n) => n.to_string(),
    })
}

/// Nullable array columns read as empty lists
fn null_as_empty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
    Ok(Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default())
}

/// A portfolio project record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    #[serde(deserialize_with = "id_as_string")]
    pub id: String,
    pub user_name: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub notion_url: Option<String>,
    #[serde(default)]
    pub github_url: Option<String>,
    #[serde(default)]
    pub demo_url: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub tech_stack: Vec<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub tags: Vec<String>,
    pub created_at: Option<DateTime<Utc>>,
}

/// Insert payload for the `portfolio_projects` table.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewProject {
    pub user_name: String,
    pub title: String,
    pub description: Option<String>,
    pub notion_url: Option<String>,
    pub github_url: Option<String>,
    pub demo_url: Option<String>,
    pub status: String,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    #[serde(default)]
    pub tech_stack: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Partial update of a project. Only fields that are `Some` are written.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notion_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub github_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub demo_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
}

impl ProjectUpdate {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    /// Apply the set fields onto an existing record
    pub fn apply_to(&self, project: &mut Project) {
        if let Some(ref status) = self.status {
            project.status = Some(status.clone());
        }
        if let Some(ref url) = self.notion_url {
            project.notion_url = Some(url.clone());
        }
        if let Some(ref url) = self.github_url {
            project.github_url = Some(url.clone());
        }
        if let Some(ref url) = self.demo_url {
            project.demo_url = Some(url.clone());
        }
        if let Some(ref date) = self.end_date {
            project.end_date = Some(date.clone());
        }
    }
}
