//! REST client for the review API.

use crate::config::TuiConfig;
use revdeck_core::{FeedbackCreate, FeedbackResponse, HealthResponse, WebhookResponse};
use revdeck_query::FetchError;
use serde_json::Value;
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum ApiClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("HTTP {status}: {message}")]
    Remote { status: u16, message: String },
}

impl From<ApiClientError> for FetchError {
    fn from(err: ApiClientError) -> Self {
        match err {
            ApiClientError::Remote { status, message } => FetchError::Remote { status, message },
            other => FetchError::Network(other.to_string()),
        }
    }
}

/// Shape of the server's error body, e.g. `{"detail": "Analysis not found"}`.
#[derive(Debug, serde::Deserialize)]
struct ErrorBody {
    detail: String,
}

#[derive(Clone)]
pub struct ApiClient {
    client: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(config: &TuiConfig) -> Result<Self, ApiClientError> {
        let timeout = Duration::from_millis(config.request_timeout_ms);
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
        })
    }

    /// `GET /api/metrics`. Returned untyped; the cache stores raw JSON and
    /// views deserialize at the render boundary.
    pub async fn get_metrics(
        &self,
        repo: Option<&str>,
        days: u32,
    ) -> Result<Value, ApiClientError> {
        let mut query: Vec<(&str, String)> = vec![("days", days.to_string())];
        if let Some(repo) = repo {
            query.push(("repo", repo.to_string()));
        }
        self.get_json("/api/metrics", Some(&query)).await
    }

    /// `GET /api/analyses`.
    pub async fn get_analyses(
        &self,
        repo: Option<&str>,
        limit: u32,
    ) -> Result<Value, ApiClientError> {
        let mut query: Vec<(&str, String)> = vec![("limit", limit.to_string())];
        if let Some(repo) = repo {
            query.push(("repo", repo.to_string()));
        }
        self.get_json("/api/analyses", Some(&query)).await
    }

    /// `GET /api/analysis/{id}`.
    pub async fn get_analysis(&self, id: &str) -> Result<Value, ApiClientError> {
        let path = format!("/api/analysis/{}", id);
        self.get_json(&path, None).await
    }

    /// `GET /api/repos`.
    pub async fn get_repos(&self) -> Result<Value, ApiClientError> {
        self.get_json("/api/repos", None).await
    }

    /// `POST /api/feedback`.
    pub async fn submit_feedback(
        &self,
        feedback: &FeedbackCreate,
    ) -> Result<FeedbackResponse, ApiClientError> {
        let url = format!("{}/api/feedback", self.base_url);
        let response = self.client.post(url).json(feedback).send().await?;
        self.parse_response(response).await
    }

    /// `POST /webhook/test`. Parameters go in the query string; there is
    /// no body.
    pub async fn trigger_analysis(
        &self,
        repo: &str,
        pr_number: u64,
    ) -> Result<WebhookResponse, ApiClientError> {
        let url = format!("{}/webhook/test", self.base_url);
        let response = self
            .client
            .post(url)
            .query(&[("repo", repo.to_string()), ("pr_number", pr_number.to_string())])
            .send()
            .await?;
        self.parse_response(response).await
    }

    /// `GET /health`.
    pub async fn health(&self) -> Result<HealthResponse, ApiClientError> {
        let url = format!("{}/health", self.base_url);
        let response = self.client.get(url).send().await?;
        self.parse_response(response).await
    }

    async fn get_json<T>(
        &self,
        path: &str,
        query: Option<&[(&str, String)]>,
    ) -> Result<T, ApiClientError>
    where
        T: serde::de::DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url, path);
        let mut request = self.client.get(url);
        if let Some(query) = query {
            request = request.query(query);
        }
        let response = request.send().await?;
        self.parse_response(response).await
    }

    async fn parse_response<T: serde::de::DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, ApiClientError> {
        let status = response.status();
        if status.is_success() {
            Ok(response.json::<T>().await?)
        } else {
            let text = response.text().await?;
            if let Ok(body) = serde_json::from_str::<ErrorBody>(&text) {
                return Err(ApiClientError::Remote {
                    status: status.as_u16(),
                    message: body.detail,
                });
            }
            Err(ApiClientError::Remote {
                status: status.as_u16(),
                message: text,
            })
        }
    }
}
