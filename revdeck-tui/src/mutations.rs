//! Mutation definitions: server writes and the query families they
//! invalidate on success.

use crate::api_client::ApiClient;
use revdeck_core::FeedbackCreate;
use revdeck_query::{FetchError, InvalidationRule};

/// Feedback touches the analysis detail and every analyses list; a newly
/// triggered analysis only changes the lists.
const FEEDBACK_INVALIDATES: InvalidationRule = InvalidationRule::new(&["analysis", "analyses"]);
const TRIGGER_INVALIDATES: InvalidationRule = InvalidationRule::new(&["analyses"]);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MutationKind {
    SubmitFeedback { issue_id: String, is_helpful: bool },
    TriggerAnalysis { repo: String, pr_number: u64 },
}

impl MutationKind {
    pub fn invalidation_rule(&self) -> InvalidationRule {
        match self {
            MutationKind::SubmitFeedback { .. } => FEEDBACK_INVALIDATES,
            MutationKind::TriggerAnalysis { .. } => TRIGGER_INVALIDATES,
        }
    }
}

/// Execute a mutation against the server. Returns a human-readable
/// confirmation for the notification bar.
pub async fn execute(api: &ApiClient, kind: &MutationKind) -> Result<String, FetchError> {
    match kind {
        MutationKind::SubmitFeedback {
            issue_id,
            is_helpful,
        } => {
            let body = FeedbackCreate {
                issue_id: issue_id.clone(),
                is_helpful: *is_helpful,
                reason: None,
                comment: None,
            };
            api.submit_feedback(&body).await?;
            Ok("Feedback recorded".to_string())
        }
        MutationKind::TriggerAnalysis { repo, pr_number } => {
            let response = api.trigger_analysis(repo, *pr_number).await?;
            Ok(response.message)
        }
    }
}
