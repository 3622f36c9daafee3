//! Request and response types for the review API.
//!
//! Field names and optionality follow the server's JSON exactly; everything
//! deserializes straight off the wire with serde.

use crate::enums::{AnalysisStatus, Category, Severity};
use crate::Timestamp;
use serde::{Deserialize, Serialize};

// ============================================================================
// ISSUES
// ============================================================================

/// A single review issue inside an analysis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssueResponse {
    pub id: String,
    pub category: Category,
    pub severity: Severity,
    pub file_path: String,
    #[serde(default)]
    pub line_number: Option<u32>,
    pub title: String,
    pub message: String,
    #[serde(default)]
    pub explanation: Option<String>,
    #[serde(default)]
    pub suggestion: Option<String>,
    #[serde(default)]
    pub code_snippet: Option<String>,
    /// Tri-state feedback field: `None` until a reviewer decides.
    #[serde(default)]
    pub is_helpful: Option<bool>,
    #[serde(default)]
    pub dismiss_reason: Option<String>,
    #[serde(default)]
    pub github_comment_id: Option<String>,
    pub created_at: Timestamp,
}

// ============================================================================
// ANALYSES
// ============================================================================

/// Issue counts rolled up per analysis.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct AnalysisSummary {
    #[serde(default)]
    pub critical: u32,
    #[serde(default)]
    pub warnings: u32,
    #[serde(default)]
    pub suggestions: u32,
    #[serde(default)]
    pub total_issues: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisMetadata {
    pub analyzed_at: Timestamp,
    pub analysis_time_ms: u64,
    pub files_changed: u32,
    pub lines_added: u32,
    pub lines_removed: u32,
    pub tokens_used: u64,
}

/// Full analysis record served by `GET /api/analysis/{id}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResponse {
    pub id: String,
    pub repo: String,
    pub pr_number: u64,
    #[serde(default)]
    pub pr_title: Option<String>,
    #[serde(default)]
    pub pr_url: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    pub status: AnalysisStatus,
    #[serde(default)]
    pub error_message: Option<String>,
    pub summary: AnalysisSummary,
    #[serde(default)]
    pub issues: Vec<IssueResponse>,
    pub metadata: AnalysisMetadata,
}

/// Summary row served by `GET /api/analyses`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisListItem {
    pub id: String,
    pub repo: String,
    pub pr_number: u64,
    #[serde(default)]
    pub pr_title: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    pub status: AnalysisStatus,
    pub summary: AnalysisSummary,
    pub analyzed_at: Timestamp,
}

// ============================================================================
// METRICS
// ============================================================================

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct IssuesByCategory {
    #[serde(default)]
    pub security: u32,
    #[serde(default)]
    pub quality: u32,
    #[serde(default)]
    pub testing: u32,
    #[serde(default)]
    pub docs: u32,
    #[serde(default)]
    pub performance: u32,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct IssuesBySeverity {
    #[serde(default)]
    pub critical: u32,
    #[serde(default)]
    pub warning: u32,
    #[serde(default)]
    pub suggestion: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyMetrics {
    pub date: String,
    #[serde(default)]
    pub prs_analyzed: u32,
    #[serde(default)]
    pub issues_found: u32,
    #[serde(default)]
    pub critical_issues: u32,
}

/// A recurring issue title with its occurrence count.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopIssue {
    pub title: String,
    pub category: Category,
    pub severity: Severity,
    pub count: u32,
}

/// Aggregate metrics served by `GET /api/metrics`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MetricsResponse {
    #[serde(default)]
    pub total_prs_analyzed: u32,
    #[serde(default)]
    pub total_issues_found: u32,
    #[serde(default)]
    pub issues_by_category: IssuesByCategory,
    #[serde(default)]
    pub issues_by_severity: IssuesBySeverity,
    #[serde(default)]
    pub avg_issues_per_pr: f64,
    #[serde(default)]
    pub estimated_time_saved_hours: f64,
    #[serde(default)]
    pub daily_metrics: Vec<DailyMetrics>,
    #[serde(default)]
    pub top_issues: Vec<TopIssue>,
}

// ============================================================================
// REPOS
// ============================================================================

/// Repository entry served by `GET /api/repos`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepoInfo {
    pub repo: String,
    pub analysis_count: u32,
}

// ============================================================================
// FEEDBACK
// ============================================================================

/// Body of `POST /api/feedback`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedbackCreate {
    pub issue_id: String,
    pub is_helpful: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedbackResponse {
    pub id: String,
    pub issue_id: String,
    pub is_helpful: bool,
    #[serde(default)]
    pub reason: Option<String>,
    pub created_at: Timestamp,
}

// ============================================================================
// WEBHOOK / HEALTH
// ============================================================================

/// Acknowledgement from `POST /webhook/test`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookResponse {
    pub status: String,
    pub message: String,
    #[serde(default)]
    pub analysis_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issue_deserializes_with_null_feedback() {
        let json = r#"{
            "id": "iss-1",
            "category": "security",
            "severity": "critical",
            "file_path": "src/auth.rs",
            "line_number": 42,
            "title": "Hardcoded secret",
            "message": "Secret committed to source",
            "is_helpful": null,
            "created_at": "2024-05-01T12:00:00Z"
        }"#;

        let issue: IssueResponse = serde_json::from_str(json).unwrap();
        assert_eq!(issue.id, "iss-1");
        assert_eq!(issue.severity, Severity::Critical);
        assert_eq!(issue.is_helpful, None);
        assert_eq!(issue.line_number, Some(42));
        // Absent optionals default to None
        assert!(issue.suggestion.is_none());
        assert!(issue.code_snippet.is_none());
    }

    #[test]
    fn test_metrics_defaults_fill_missing_fields() {
        let metrics: MetricsResponse = serde_json::from_str("{}").unwrap();
        assert_eq!(metrics.total_prs_analyzed, 0);
        assert_eq!(metrics.issues_by_severity.critical, 0);
        assert!(metrics.daily_metrics.is_empty());
        assert!(metrics.top_issues.is_empty());
    }

    #[test]
    fn test_analysis_list_item_roundtrip() {
        let item = AnalysisListItem {
            id: "a-9".to_string(),
            repo: "owner/repo".to_string(),
            pr_number: 123,
            pr_title: Some("Fix login".to_string()),
            author: Some("dev".to_string()),
            status: AnalysisStatus::Completed,
            summary: AnalysisSummary {
                critical: 1,
                warnings: 2,
                suggestions: 3,
                total_issues: 6,
            },
            analyzed_at: chrono::Utc::now(),
        };

        let json = serde_json::to_string(&item).unwrap();
        let back: AnalysisListItem = serde_json::from_str(&json).unwrap();
        assert_eq!(back.id, item.id);
        assert_eq!(back.summary.total_issues, 6);
        assert_eq!(back.status, AnalysisStatus::Completed);
    }

    #[test]
    fn test_feedback_create_omits_empty_optionals() {
        let body = FeedbackCreate {
            issue_id: "iss-1".to_string(),
            is_helpful: true,
            reason: None,
            comment: None,
        };
        let json = serde_json::to_string(&body).unwrap();
        assert_eq!(json, r#"{"issue_id":"iss-1","is_helpful":true}"#);
    }

    #[test]
    fn test_webhook_response_with_analysis_id() {
        let json = r#"{"status":"queued","message":"analysis queued","analysis_id":"a-9"}"#;
        let resp: WebhookResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.analysis_id.as_deref(), Some("a-9"));
    }
}
