//! Mutation lifecycle and targeted invalidation.
//!
//! A mutation is a server write tracked through idle → pending →
//! success/error. On success the caller applies the mutation's
//! [`InvalidationRule`] to the cache, which marks the affected query
//! families stale and triggers refetches for subscribed keys. Mutations
//! never write response data into the cache directly; the refetch is the
//! only path by which server state re-enters it.

use crate::cache::FetchError;
use crate::key::QueryKey;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MutationStatus {
    #[default]
    Idle,
    Pending,
    Success,
    Error,
}

/// Tracks one mutation's lifecycle: status, the last error, and the
/// confirmation the server returned on success. Re-dispatch is rejected
/// while a previous dispatch is still pending.
#[derive(Debug, Clone, Default)]
pub struct MutationState {
    status: MutationStatus,
    error: Option<FetchError>,
    result: Option<String>,
}

impl MutationState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self) -> MutationStatus {
        self.status
    }

    pub fn error(&self) -> Option<&FetchError> {
        self.error.as_ref()
    }

    /// Server confirmation from the last successful dispatch.
    pub fn result(&self) -> Option<&str> {
        self.result.as_deref()
    }

    pub fn is_pending(&self) -> bool {
        self.status == MutationStatus::Pending
    }

    /// Move to pending. Returns false (and changes nothing) if a dispatch
    /// is already in flight.
    pub fn begin(&mut self) -> bool {
        if self.is_pending() {
            return false;
        }
        self.status = MutationStatus::Pending;
        self.error = None;
        self.result = None;
        true
    }

    pub fn succeed(&mut self, result: impl Into<String>) {
        if self.is_pending() {
            self.status = MutationStatus::Success;
            self.error = None;
            self.result = Some(result.into());
        }
    }

    pub fn fail(&mut self, error: FetchError) {
        if self.is_pending() {
            self.status = MutationStatus::Error;
            self.error = Some(error);
        }
    }
}

/// Which query families a successful mutation invalidates.
///
/// Matching is by query name only: every parameterization of a named
/// family goes stale together. Feedback on one issue invalidates the
/// containing analysis detail and every analyses list, regardless of
/// which repo filter or limit each list was fetched under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidationRule {
    names: &'static [&'static str],
}

impl InvalidationRule {
    pub const fn new(names: &'static [&'static str]) -> Self {
        Self { names }
    }

    pub fn matches(&self, key: &QueryKey) -> bool {
        self.names.contains(&key.name())
    }

    pub fn names(&self) -> &'static [&'static str] {
        self.names
    }
}
