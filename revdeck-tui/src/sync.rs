//! Glue between the query cache and the outside world.
//!
//! The cache itself is pure; this layer turns its effect values into
//! spawned fetches and poll timers, and feeds resolutions back in. All
//! calls happen on the event loop, so cache access needs no locking.

use crate::api_client::ApiClient;
use crate::events::AppEvent;
use crate::mutations::{self, MutationKind};
use crate::notifications::NotificationLevel;
use crate::queries;
use crate::scheduler::PollScheduler;
use crate::state::App;
use revdeck_query::{FetchError, MutationState, QueryKey};
use serde_json::Value;
use std::collections::HashSet;
use tokio::sync::mpsc;

pub struct SyncState {
    sender: mpsc::Sender<AppEvent>,
    scheduler: PollScheduler,
    subscribed: HashSet<QueryKey>,
}

impl SyncState {
    pub fn new(sender: mpsc::Sender<AppEvent>) -> Self {
        let scheduler = PollScheduler::new(sender.clone());
        Self {
            sender,
            scheduler,
            subscribed: HashSet::new(),
        }
    }

    pub fn is_subscribed(&self, key: &QueryKey) -> bool {
        self.subscribed.contains(key)
    }

    /// Align subscriptions with what the current route and filters need.
    /// Called after every state change that can alter the active key set.
    pub fn reconcile(&mut self, app: &mut App) {
        let desired: HashSet<QueryKey> = app
            .active_keys()
            .into_iter()
            .filter(queries::is_enabled)
            .collect();

        let dropped: Vec<QueryKey> = self.subscribed.difference(&desired).cloned().collect();
        for key in dropped {
            let effect = app.cache.unsubscribe(&key);
            if effect.stop_timer {
                self.scheduler.stop(&key);
            }
            self.subscribed.remove(&key);
        }

        let added: Vec<QueryKey> = desired.difference(&self.subscribed).cloned().collect();
        for key in added {
            let effect = app.cache.subscribe(&key);
            if let Some(generation) = effect.start_fetch {
                self.spawn_fetch(&app.api, &key, generation);
            }
            if effect.start_timer {
                if let Some(interval) = queries::refresh_interval(&key) {
                    self.scheduler.arm(&key, interval);
                }
            }
            self.subscribed.insert(key);
        }
    }

    /// A poll timer elapsed. Overlap with an in-flight fetch is resolved
    /// by the cache's dedup: `begin_fetch` returns nothing and the tick
    /// is skipped. The timer re-arms when the in-flight fetch resolves.
    pub fn handle_poll_tick(&mut self, app: &mut App, key: &QueryKey) {
        if !self.subscribed.contains(key) {
            return;
        }
        if let Some(generation) = app.cache.begin_fetch(key) {
            self.spawn_fetch(&app.api, key, generation);
        }
    }

    /// A fetch resolved. Applies the result, re-arms the poll timer from
    /// now, and on success chases any invalidation that landed mid-fetch.
    /// Errors are never chased: a failed entry waits for the next poll
    /// tick or resubscription, so a down server sees one attempt per
    /// tick, not a retry loop.
    pub fn handle_query_done(
        &mut self,
        app: &mut App,
        key: &QueryKey,
        generation: u64,
        result: Result<Value, FetchError>,
    ) {
        match result {
            Ok(data) => {
                if app.cache.apply_success(key, generation, data) {
                    if key.name() == queries::QUERY_ANALYSIS {
                        seed_feedback_locks(app, key);
                    }
                }

                if !self.subscribed.contains(key) {
                    return;
                }

                // Entry still stale after a success means a write
                // invalidated it while this fetch was out; fetch again
                // right away to pick the write up.
                let needs_refetch = app
                    .cache
                    .entry(key)
                    .is_some_and(|entry| entry.is_stale() && !entry.is_in_flight());
                if needs_refetch {
                    if let Some(next) = app.cache.begin_fetch(key) {
                        self.spawn_fetch(&app.api, key, next);
                        return;
                    }
                }
            }
            Err(error) => {
                let message = format!("{} fetch failed: {}", key.name(), error);
                if app.cache.apply_error(key, generation, error) {
                    app.notify(NotificationLevel::Error, message);
                }

                if !self.subscribed.contains(key) {
                    return;
                }
            }
        }

        if let Some(interval) = queries::refresh_interval(key) {
            self.scheduler.arm(key, interval);
        }
    }

    /// Force-refresh every subscribed query, deduped against in-flight
    /// fetches.
    pub fn refresh_all(&mut self, app: &mut App) {
        let keys: Vec<QueryKey> = self.subscribed.iter().cloned().collect();
        for key in keys {
            if let Some(generation) = app.cache.begin_fetch(&key) {
                self.spawn_fetch(&app.api, &key, generation);
            }
        }
    }

    /// Dispatch a mutation. Returns false if one of the same kind is
    /// already pending.
    pub fn dispatch_mutation(&mut self, app: &mut App, kind: MutationKind) -> bool {
        if !mutation_state_mut(app, &kind).begin() {
            return false;
        }
        let api = app.api.clone();
        let sender = self.sender.clone();
        tokio::spawn(async move {
            let result = mutations::execute(&api, &kind).await;
            let _ = sender.send(AppEvent::MutationDone { kind, result }).await;
        });
        true
    }

    /// A mutation resolved. On success, apply its invalidation rule and
    /// refetch every subscribed key it touched.
    pub fn handle_mutation_done(
        &mut self,
        app: &mut App,
        kind: MutationKind,
        result: Result<String, FetchError>,
    ) {
        match result {
            Ok(message) => {
                mutation_state_mut(app, &kind).succeed(message.clone());
                if let MutationKind::SubmitFeedback { issue_id, .. } = &kind {
                    app.feedback_locks.resolve_success(issue_id);
                }
                app.notify(NotificationLevel::Success, message);

                let rule = kind.invalidation_rule();
                let refetch = app.cache.invalidate(|key| rule.matches(key));
                for key in refetch {
                    if let Some(generation) = app.cache.begin_fetch(&key) {
                        self.spawn_fetch(&app.api, &key, generation);
                    }
                }
            }
            Err(error) => {
                let message = error.to_string();
                mutation_state_mut(app, &kind).fail(error);
                if let MutationKind::SubmitFeedback { issue_id, .. } = &kind {
                    app.feedback_locks.resolve_failure(issue_id);
                }
                app.notify(NotificationLevel::Error, message);
            }
        }
    }

    fn spawn_fetch(&self, api: &ApiClient, key: &QueryKey, generation: u64) {
        let api = api.clone();
        let key = key.clone();
        let sender = self.sender.clone();
        tokio::spawn(async move {
            let result = queries::execute(&api, &key).await;
            let _ = sender
                .send(AppEvent::QueryDone {
                    key,
                    generation,
                    result,
                })
                .await;
        });
    }
}

fn mutation_state_mut<'a>(app: &'a mut App, kind: &MutationKind) -> &'a mut MutationState {
    match kind {
        MutationKind::SubmitFeedback { .. } => &mut app.feedback_mutation,
        MutationKind::TriggerAnalysis { .. } => &mut app.trigger_mutation,
    }
}

/// Lock issues the server already has decisions for, so refetched data
/// immediately disables their feedback controls.
fn seed_feedback_locks(app: &mut App, key: &QueryKey) {
    let Some(entry) = app.cache.entry(key) else {
        return;
    };
    let Some(data) = entry.data() else {
        return;
    };
    let Ok(analysis) = serde_json::from_value::<revdeck_core::AnalysisResponse>(data.clone())
    else {
        return;
    };
    for issue in &analysis.issues {
        app.feedback_locks.seed_from_issue(issue);
    }
}
