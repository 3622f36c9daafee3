//! Per-issue feedback locks.
//!
//! Feedback on an issue is write-once: once a decision is pending or
//! recorded, further submissions for that issue are rejected locally.
//! The lock survives refetches of the containing analysis — server data
//! saying the issue is decided seeds the lock, and a lock that is already
//! decided never reopens.

use revdeck_core::IssueResponse;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FeedbackState {
    #[default]
    Undecided,
    /// Submission dispatched, server not yet confirmed. Blocks duplicates.
    Pending(bool),
    /// Terminal. Reached from a confirmed submission or from server data.
    Decided(bool),
}

impl FeedbackState {
    pub fn decision(&self) -> Option<bool> {
        match self {
            FeedbackState::Undecided => None,
            FeedbackState::Pending(choice) | FeedbackState::Decided(choice) => Some(*choice),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct FeedbackLocks {
    locks: HashMap<String, FeedbackState>,
}

impl FeedbackLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self, issue_id: &str) -> FeedbackState {
        self.locks.get(issue_id).copied().unwrap_or_default()
    }

    pub fn can_submit(&self, issue_id: &str) -> bool {
        self.state(issue_id) == FeedbackState::Undecided
    }

    /// Absorb server state for an issue. A recorded decision locks the
    /// issue; a null never downgrades an existing pending or decided lock.
    pub fn seed_from_issue(&mut self, issue: &IssueResponse) {
        if let Some(choice) = issue.is_helpful {
            self.locks
                .insert(issue.id.clone(), FeedbackState::Decided(choice));
        }
    }

    /// Claim the lock for a submission. Returns false without dispatching
    /// anything if the issue is already pending or decided, so a double
    /// keypress produces exactly one request.
    pub fn try_submit(&mut self, issue_id: &str, choice: bool) -> bool {
        if !self.can_submit(issue_id) {
            return false;
        }
        self.locks
            .insert(issue_id.to_string(), FeedbackState::Pending(choice));
        true
    }

    /// Confirmed by the server: the pending choice becomes terminal.
    pub fn resolve_success(&mut self, issue_id: &str) {
        if let Some(state) = self.locks.get_mut(issue_id) {
            if let FeedbackState::Pending(choice) = *state {
                *state = FeedbackState::Decided(choice);
            }
        }
    }

    /// Submission failed: release the lock so the reviewer can retry.
    pub fn resolve_failure(&mut self, issue_id: &str) {
        if let Some(state) = self.locks.get_mut(issue_id) {
            if matches!(state, FeedbackState::Pending(_)) {
                *state = FeedbackState::Undecided;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use revdeck_core::{Category, Severity};

    fn issue(id: &str, is_helpful: Option<bool>) -> IssueResponse {
        IssueResponse {
            id: id.to_string(),
            category: Category::Security,
            severity: Severity::Critical,
            file_path: "src/auth.rs".to_string(),
            line_number: Some(1),
            title: "Hardcoded secret".to_string(),
            message: "Secret committed to source".to_string(),
            explanation: None,
            suggestion: None,
            code_snippet: None,
            is_helpful,
            dismiss_reason: None,
            github_comment_id: None,
            created_at: chrono::Utc::now(),
        }
    }

    #[test]
    fn test_double_submit_dispatches_once() {
        let mut locks = FeedbackLocks::new();
        assert!(locks.try_submit("iss-1", true));
        // Second press while the first is pending does nothing.
        assert!(!locks.try_submit("iss-1", true));
        assert!(!locks.try_submit("iss-1", false));
        assert_eq!(locks.state("iss-1"), FeedbackState::Pending(true));
    }

    #[test]
    fn test_decided_is_terminal() {
        let mut locks = FeedbackLocks::new();
        assert!(locks.try_submit("iss-1", false));
        locks.resolve_success("iss-1");
        assert_eq!(locks.state("iss-1"), FeedbackState::Decided(false));
        assert!(!locks.try_submit("iss-1", true));

        // A failure resolution arriving late cannot reopen it.
        locks.resolve_failure("iss-1");
        assert_eq!(locks.state("iss-1"), FeedbackState::Decided(false));
    }

    #[test]
    fn test_failure_releases_lock_for_retry() {
        let mut locks = FeedbackLocks::new();
        assert!(locks.try_submit("iss-1", true));
        locks.resolve_failure("iss-1");
        assert_eq!(locks.state("iss-1"), FeedbackState::Undecided);
        assert!(locks.try_submit("iss-1", false));
    }

    #[test]
    fn test_seed_locks_server_decided_issues() {
        let mut locks = FeedbackLocks::new();
        locks.seed_from_issue(&issue("iss-1", Some(true)));
        locks.seed_from_issue(&issue("iss-2", None));

        assert_eq!(locks.state("iss-1"), FeedbackState::Decided(true));
        assert!(!locks.try_submit("iss-1", false));
        assert!(locks.can_submit("iss-2"));
    }

    #[test]
    fn test_seed_with_null_keeps_pending_lock() {
        let mut locks = FeedbackLocks::new();
        assert!(locks.try_submit("iss-1", true));

        // A refetch started before the write landed still reports null;
        // the in-flight submission must stay locked.
        locks.seed_from_issue(&issue("iss-1", None));
        assert_eq!(locks.state("iss-1"), FeedbackState::Pending(true));
    }

    #[test]
    fn test_locks_are_per_issue() {
        let mut locks = FeedbackLocks::new();
        assert!(locks.try_submit("iss-1", true));
        assert!(locks.try_submit("iss-2", false));
        locks.resolve_success("iss-1");
        assert_eq!(locks.state("iss-1"), FeedbackState::Decided(true));
        assert_eq!(locks.state("iss-2"), FeedbackState::Pending(false));
    }
}
