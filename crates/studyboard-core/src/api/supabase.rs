//! Supabase (PostgREST) client backing the study board tables.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header, Client, RequestBuilder};
use serde::{de::DeserializeOwned, Serialize};
use tracing::debug;

use super::ApiError;
use crate::board::{BoardError, BoardStore};
use crate::models::{
    Comment, NewComment, NewPaper, NewProject, Paper, Project, ProjectUpdate, QuizCompletion,
};

/// HTTP request timeout in seconds
const REQUEST_TIMEOUT_SECS: u64 = 30;

const QUIZ_TABLE: &str = "quiz_completions";
const PAPER_TABLE: &str = "papers";
const COMMENT_TABLE: &str = "comments";
const PROJECT_TABLE: &str = "portfolio_projects";

/// Unique key of a quiz completion, used for upserts
const QUIZ_CONFLICT_COLUMNS: &str = "user_name,quiz_id";

/// Supabase REST client.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct SupabaseClient {
    client: Client,
    rest_url: String,
    key: String,
}

impl SupabaseClient {
    pub fn new(url: &str, key: String) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            rest_url: format!("{}/rest/v1", url.trim_end_matches('/')),
            key,
        })
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/{}", self.rest_url, table)
    }

    fn authed(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("apikey", &self.key)
            .bearer_auth(&self.key)
            .header(header::ACCEPT, "application/json")
    }

    /// Check if response is successful, returning an error with body if not.
    async fn check_response(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body, false))
        }
    }

    async fn parse<T: DeserializeOwned>(response: reqwest::Response, table: &str) -> Result<T, ApiError> {
        let text = response.text().await?;
        serde_json::from_str(&text)
            .map_err(|e| ApiError::InvalidResponse(format!("{} rows: {}", table, e)))
    }

    async fn select<T: DeserializeOwned>(
        &self,
        table: &str,
        query: &[(&str, String)],
    ) -> Result<Vec<T>, ApiError> {
        let mut params = vec![("select", "*".to_string())];
        params.extend(query.iter().map(|(k, v)| (*k, v.clone())));

        let response = self
            .authed(self.client.get(self.table_url(table)))
            .query(&params)
            .send()
            .await?;

        let response = Self::check_response(response).await?;
        let rows: Vec<T> = Self::parse(response, table).await?;
        debug!(table = table, count = rows.len(), "Selected rows");
        Ok(rows)
    }

    async fn insert<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        table: &str,
        body: &B,
        prefer: &str,
        query: &[(&str, String)],
    ) -> Result<Vec<T>, ApiError> {
        let response = self
            .authed(self.client.post(self.table_url(table)))
            .header("Prefer", prefer)
            .query(query)
            .json(body)
            .send()
            .await?;

        let response = Self::check_response(response).await?;
        Self::parse(response, table).await
    }

    fn first<T>(rows: Vec<T>, table: &str) -> Result<T, ApiError> {
        rows.into_iter()
            .next()
            .ok_or_else(|| ApiError::InvalidResponse(format!("insert into {} returned no rows", table)))
    }
}

fn eq(value: impl std::fmt::Display) -> String {
    format!("eq.{}", value)
}

#[async_trait]
impl BoardStore for SupabaseClient {
    async fn quiz_completions(&self) -> Result<Vec<QuizCompletion>, BoardError> {
        Ok(self.select(QUIZ_TABLE, &[]).await?)
    }

    async fn quiz_completions_for(&self, user_name: &str) -> Result<Vec<QuizCompletion>, BoardError> {
        Ok(self.select(QUIZ_TABLE, &[("user_name", eq(user_name))]).await?)
    }

    async fn upsert_quiz_completion(&self, completion: &QuizCompletion) -> Result<(), BoardError> {
        let _: Vec<QuizCompletion> = self
            .insert(
                QUIZ_TABLE,
                completion,
                "resolution=merge-duplicates,return=representation",
                &[("on_conflict", QUIZ_CONFLICT_COLUMNS.to_string())],
            )
            .await?;
        Ok(())
    }

    async fn papers(&self, limit: Option<usize>) -> Result<Vec<Paper>, BoardError> {
        let mut query = vec![("order", "created_at.desc".to_string())];
        if let Some(limit) = limit {
            query.push(("limit", limit.to_string()));
        }
        Ok(self.select(PAPER_TABLE, &query).await?)
    }

    async fn papers_by(&self, author: &str) -> Result<Vec<Paper>, BoardError> {
        Ok(self.select(PAPER_TABLE, &[("author", eq(author))]).await?)
    }

    async fn paper(&self, id: i64) -> Result<Option<Paper>, BoardError> {
        let rows: Vec<Paper> = self.select(PAPER_TABLE, &[("id", eq(id))]).await?;
        Ok(rows.into_iter().next())
    }

    async fn insert_paper(&self, paper: &NewPaper) -> Result<Paper, BoardError> {
        let rows = self
            .insert(PAPER_TABLE, paper, "return=representation", &[])
            .await?;
        Ok(Self::first(rows, PAPER_TABLE)?)
    }

    async fn comments(&self, paper_id: i64) -> Result<Vec<Comment>, BoardError> {
        Ok(self
            .select(
                COMMENT_TABLE,
                &[
                    ("paper_id", eq(paper_id)),
                    ("order", "created_at.asc".to_string()),
                ],
            )
            .await?)
    }

    async fn insert_comment(&self, comment: &NewComment) -> Result<Comment, BoardError> {
        let rows = self
            .insert(COMMENT_TABLE, comment, "return=representation", &[])
            .await?;
        Ok(Self::first(rows, COMMENT_TABLE)?)
    }

    async fn projects(&self, user_name: &str) -> Result<Vec<Project>, BoardError> {
        Ok(self
            .select(
                PROJECT_TABLE,
                &[
                    ("user_name", eq(user_name)),
                    ("order", "created_at.desc".to_string()),
                ],
            )
            .await?)
    }

    async fn insert_project(&self, project: &NewProject) -> Result<Project, BoardError> {
        let rows = self
            .insert(PROJECT_TABLE, project, "return=representation", &[])
            .await?;
        Ok(Self::first(rows, PROJECT_TABLE)?)
    }

    async fn update_project(&self, id: &str, update: &ProjectUpdate) -> Result<(), BoardError> {
        let response = self
            .authed(self.client.patch(self.table_url(PROJECT_TABLE)))
            .query(&[("id", eq(id))])
            .json(update)
            .send()
            .await
            .map_err(ApiError::from)?;
        Self::check_response(response).await?;
        Ok(())
    }

    async fn delete_project(&self, id: &str) -> Result<(), BoardError> {
        let response = self
            .authed(self.client.delete(self.table_url(PROJECT_TABLE)))
            .query(&[("id", eq(id))])
            .send()
            .await
            .map_err(ApiError::from)?;
        Self::check_response(response).await?;
        Ok(())
    }
}
