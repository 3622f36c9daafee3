//! Query definitions: key construction, refresh intervals, and execution.
//!
//! Every read endpoint is a named query family. The key carries the exact
//! parameters the request is made with, so a filter change addresses a
//! different cache entry and execution can reconstruct the request from
//! the key alone.

use crate::api_client::ApiClient;
use revdeck_query::{FetchError, QueryKey};
use serde_json::Value;
use std::time::Duration;

pub const QUERY_METRICS: &str = "metrics";
pub const QUERY_ANALYSES: &str = "analyses";
pub const QUERY_ANALYSIS: &str = "analysis";
pub const QUERY_REPOS: &str = "repos";

/// How many rows the dashboard's recent-analyses list requests.
pub const ANALYSES_LIMIT: u32 = 10;

pub fn metrics_key(repo: Option<&str>, days: u32) -> QueryKey {
    let key = QueryKey::new(QUERY_METRICS).with_param("days", days);
    match repo {
        Some(repo) => key.with_param("repo", repo),
        None => key,
    }
}

pub fn analyses_key(repo: Option<&str>, limit: u32) -> QueryKey {
    let key = QueryKey::new(QUERY_ANALYSES).with_param("limit", limit);
    match repo {
        Some(repo) => key.with_param("repo", repo),
        None => key,
    }
}

pub fn analysis_key(id: &str) -> QueryKey {
    QueryKey::new(QUERY_ANALYSIS).with_param("id", id)
}

pub fn repos_key() -> QueryKey {
    QueryKey::new(QUERY_REPOS)
}

/// Poll interval for a query family. `None` means the query is fetched on
/// subscription and invalidation only.
pub fn refresh_interval(key: &QueryKey) -> Option<Duration> {
    match key.name() {
        QUERY_METRICS => Some(Duration::from_secs(30)),
        QUERY_ANALYSES => Some(Duration::from_secs(10)),
        _ => None,
    }
}

/// Whether a key has the parameters it needs to execute. A detail query
/// with an empty id is never dispatched; it simply stays idle.
pub fn is_enabled(key: &QueryKey) -> bool {
    match key.name() {
        QUERY_ANALYSIS => key.param("id").is_some_and(|id| !id.is_empty()),
        _ => true,
    }
}

/// Execute the request a key describes. Dispatches on the query name and
/// reads the parameters back off the key.
pub async fn execute(api: &ApiClient, key: &QueryKey) -> Result<Value, FetchError> {
    match key.name() {
        QUERY_METRICS => {
            let days = parse_u32_param(key, "days")?;
            Ok(api.get_metrics(key.param("repo"), days).await?)
        }
        QUERY_ANALYSES => {
            let limit = parse_u32_param(key, "limit")?;
            Ok(api.get_analyses(key.param("repo"), limit).await?)
        }
        QUERY_ANALYSIS => {
            let id = key
                .param("id")
                .filter(|id| !id.is_empty())
                .ok_or_else(|| FetchError::Network("analysis query missing id".to_string()))?;
            Ok(api.get_analysis(id).await?)
        }
        QUERY_REPOS => Ok(api.get_repos().await?),
        other => Err(FetchError::Network(format!("unknown query: {}", other))),
    }
}

fn parse_u32_param(key: &QueryKey, name: &str) -> Result<u32, FetchError> {
    key.param(name)
        .and_then(|value| value.parse().ok())
        .ok_or_else(|| FetchError::Network(format!("{} query missing {}", key.name(), name)))
}
