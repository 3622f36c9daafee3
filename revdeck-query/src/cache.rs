//! Keyed cache for asynchronous query results.
//!
//! Entries are addressed by [`QueryKey`] and move through
//! idle → loading → success/error. Previously fetched data is retained
//! while a revalidating fetch is in flight and after a failed one, so views
//! can keep rendering the last good result. Invalidation marks entries
//! stale; it never writes data — the fetch path is the only writer.

use crate::key::QueryKey;
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::collections::HashMap;

/// Fetch failures recorded on a cache entry.
///
/// `Network` covers requests that never completed (timeout, connectivity);
/// `Remote` is a non-success HTTP status with a body. A query whose required
/// parameter is absent is not executed at all and produces neither.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    #[error("network failure: {0}")]
    Network(String),
    #[error("HTTP {status}: {message}")]
    Remote { status: u16, message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryStatus {
    Idle,
    Loading,
    Success,
    Error,
}

/// Last known result for one query key.
///
/// Fields are private: every transition goes through [`QueryCache`] so the
/// single-flight and staleness invariants cannot be bypassed.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    status: QueryStatus,
    data: Option<Value>,
    error: Option<FetchError>,
    fetched_at: Option<DateTime<Utc>>,
    is_stale: bool,
    /// Generation of the currently executing fetch, if any. Presence of a
    /// value is the single-flight check.
    in_flight: Option<u64>,
    /// Set when the entry is invalidated while a fetch is in flight: that
    /// response predates the write, so it must not clear the stale mark.
    invalidated_in_flight: bool,
    subscribers: usize,
}

impl Default for CacheEntry {
    fn default() -> Self {
        Self {
            status: QueryStatus::Idle,
            data: None,
            error: None,
            fetched_at: None,
            is_stale: false,
            in_flight: None,
            invalidated_in_flight: false,
            subscribers: 0,
        }
    }
}

impl CacheEntry {
    pub fn status(&self) -> QueryStatus {
        self.status
    }

    /// Last successful payload, retained through revalidation and errors.
    pub fn data(&self) -> Option<&Value> {
        self.data.as_ref()
    }

    pub fn error(&self) -> Option<&FetchError> {
        self.error.as_ref()
    }

    pub fn fetched_at(&self) -> Option<DateTime<Utc>> {
        self.fetched_at
    }

    pub fn is_stale(&self) -> bool {
        self.is_stale
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn subscribers(&self) -> usize {
        self.subscribers
    }

    fn needs_fetch(&self) -> bool {
        if self.in_flight.is_some() {
            return false;
        }
        self.is_stale || matches!(self.status, QueryStatus::Idle | QueryStatus::Error)
    }
}

/// Effects of a subscription change, to be acted on by the event loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubscribeEffect {
    /// Generation of a fetch the caller must now start, if any. `None`
    /// when the entry is fresh or a fetch is already in flight (dedup).
    pub start_fetch: Option<u64>,
    /// True on the first subscriber: the caller should start this key's
    /// poll timer if the query declares a refresh interval.
    pub start_timer: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnsubscribeEffect {
    /// True on the last unsubscribe: the caller must cancel the poll timer.
    /// The entry itself stays cached.
    pub stop_timer: bool,
}

/// Process-wide query cache. Constructed once at the composition root and
/// driven from the single event loop; never shared across threads.
#[derive(Debug, Default)]
pub struct QueryCache {
    entries: HashMap<QueryKey, CacheEntry>,
    next_generation: u64,
}

impl QueryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up the entry for a key, creating an idle one if absent.
    pub fn get(&mut self, key: &QueryKey) -> &CacheEntry {
        self.entries.entry(key.clone()).or_default()
    }

    /// Look up an entry without creating it.
    pub fn entry(&self, key: &QueryKey) -> Option<&CacheEntry> {
        self.entries.get(key)
    }

    /// Register a consumer of `key`. Starts a fetch when the entry is idle,
    /// stale, or errored and nothing is in flight; attaches to the existing
    /// fetch otherwise.
    pub fn subscribe(&mut self, key: &QueryKey) -> SubscribeEffect {
        let needs_fetch = {
            let entry = self.entries.entry(key.clone()).or_default();
            entry.subscribers += 1;
            entry.needs_fetch()
        };
        let start_timer = self.entries[key].subscribers == 1;
        let start_fetch = if needs_fetch {
            self.begin_fetch(key)
        } else {
            None
        };
        SubscribeEffect {
            start_fetch,
            start_timer,
        }
    }

    /// Drop one consumer of `key`. An in-flight fetch is not aborted; its
    /// response is still applied to the cache when it arrives.
    pub fn unsubscribe(&mut self, key: &QueryKey) -> UnsubscribeEffect {
        let stop_timer = match self.entries.get_mut(key) {
            Some(entry) if entry.subscribers > 0 => {
                entry.subscribers -= 1;
                entry.subscribers == 0
            }
            _ => false,
        };
        UnsubscribeEffect { stop_timer }
    }

    /// Begin a fetch for `key` unless one is already in flight.
    ///
    /// Returns the generation the caller must pass back to
    /// [`apply_success`](Self::apply_success) /
    /// [`apply_error`](Self::apply_error). Poll ticks and invalidation
    /// refetches re-enter through here, so an overlapping tick is a no-op.
    pub fn begin_fetch(&mut self, key: &QueryKey) -> Option<u64> {
        let entry = self.entries.entry(key.clone()).or_default();
        if entry.in_flight.is_some() {
            return None;
        }
        self.next_generation += 1;
        let generation = self.next_generation;
        entry.in_flight = Some(generation);
        entry.status = QueryStatus::Loading;
        // data is kept for stale-while-revalidate display
        Some(generation)
    }

    /// Apply a successful fetch result. Ignored unless `generation` matches
    /// the entry's in-flight fetch, so a resolution can never be attributed
    /// to a fetch it did not belong to.
    pub fn apply_success(&mut self, key: &QueryKey, generation: u64, data: Value) -> bool {
        let Some(entry) = self.entries.get_mut(key) else {
            return false;
        };
        if entry.in_flight != Some(generation) {
            return false;
        }
        entry.in_flight = None;
        entry.status = QueryStatus::Success;
        entry.data = Some(data);
        entry.error = None;
        entry.fetched_at = Some(Utc::now());
        // A write that landed mid-fetch outranks this response.
        entry.is_stale = entry.invalidated_in_flight;
        entry.invalidated_in_flight = false;
        true
    }

    /// Apply a failed fetch result. Prior data is retained for display and
    /// the entry is flagged stale so the next subscription or poll tick
    /// tries again.
    pub fn apply_error(&mut self, key: &QueryKey, generation: u64, error: FetchError) -> bool {
        let Some(entry) = self.entries.get_mut(key) else {
            return false;
        };
        if entry.in_flight != Some(generation) {
            return false;
        }
        entry.in_flight = None;
        entry.status = QueryStatus::Error;
        entry.error = Some(error);
        entry.is_stale = true;
        entry.invalidated_in_flight = false;
        true
    }

    /// Mark every entry whose key matches `predicate` as stale.
    ///
    /// Returns the matching keys that currently have subscribers; the
    /// caller refetches those immediately (through the dedup path).
    /// Unsubscribed entries refetch lazily on their next subscription.
    pub fn invalidate<F>(&mut self, predicate: F) -> Vec<QueryKey>
    where
        F: Fn(&QueryKey) -> bool,
    {
        let mut refetch = Vec::new();
        for (key, entry) in &mut self.entries {
            if !predicate(key) {
                continue;
            }
            entry.is_stale = true;
            if entry.in_flight.is_some() {
                entry.invalidated_in_flight = true;
            }
            if entry.subscribers > 0 {
                refetch.push(key.clone());
            }
        }
        refetch.sort();
        refetch
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn metrics_key(days: u32) -> QueryKey {
        QueryKey::new("metrics").with_param("days", days)
    }

    fn analyses_key(repo: &str) -> QueryKey {
        let key = QueryKey::new("analyses").with_param("limit", 10);
        if repo.is_empty() {
            key
        } else {
            key.with_param("repo", repo)
        }
    }

    fn analysis_key(id: &str) -> QueryKey {
        QueryKey::new("analysis").with_param("id", id)
    }

    // ========================================================================
    // Subscription and dedup
    // ========================================================================

    #[test]
    fn test_first_subscribe_starts_fetch_and_timer() {
        let mut cache = QueryCache::new();
        let key = metrics_key(30);

        let effect = cache.subscribe(&key);
        assert!(effect.start_fetch.is_some());
        assert!(effect.start_timer);
        assert_eq!(cache.get(&key).status(), QueryStatus::Loading);
    }

    #[test]
    fn test_second_subscriber_attaches_to_in_flight_fetch() {
        let mut cache = QueryCache::new();
        let key = metrics_key(30);

        let first = cache.subscribe(&key);
        let second = cache.subscribe(&key);

        // Exactly one network call: the second subscriber gets no fetch.
        assert!(first.start_fetch.is_some());
        assert!(second.start_fetch.is_none());
        assert!(!second.start_timer);
        assert_eq!(cache.get(&key).subscribers(), 2);
    }

    #[test]
    fn test_begin_fetch_dedups_while_in_flight() {
        let mut cache = QueryCache::new();
        let key = analyses_key("");

        let generation = cache.begin_fetch(&key).unwrap();
        assert_eq!(cache.begin_fetch(&key), None);

        cache.apply_success(&key, generation, json!([]));
        // After resolution a new fetch may start again.
        assert!(cache.begin_fetch(&key).is_some());
    }

    #[test]
    fn test_subscribe_to_fresh_entry_does_not_fetch() {
        let mut cache = QueryCache::new();
        let key = metrics_key(30);

        let generation = cache.subscribe(&key).start_fetch.unwrap();
        cache.apply_success(&key, generation, json!({"total_prs_analyzed": 4}));
        cache.unsubscribe(&key);

        // Remounting the same view reuses warm data without a network call.
        let effect = cache.subscribe(&key);
        assert!(effect.start_fetch.is_none());
        assert!(effect.start_timer);
        assert_eq!(cache.get(&key).status(), QueryStatus::Success);
    }

    #[test]
    fn test_subscribe_to_errored_entry_retries() {
        let mut cache = QueryCache::new();
        let key = metrics_key(30);

        let generation = cache.subscribe(&key).start_fetch.unwrap();
        cache.apply_error(&key, generation, FetchError::Network("timeout".into()));
        cache.unsubscribe(&key);

        let effect = cache.subscribe(&key);
        assert!(effect.start_fetch.is_some());
    }

    // ========================================================================
    // Key isolation
    // ========================================================================

    #[test]
    fn test_distinct_keys_are_isolated() {
        let mut cache = QueryCache::new();
        let all = analyses_key("");
        let filtered = analyses_key("owner/repo");

        let generation = cache.subscribe(&all).start_fetch.unwrap();
        cache.apply_success(&all, generation, json!([{"id": "a-1"}, {"id": "a-2"}]));

        // Switching the filter addresses a different, cold entry.
        let effect = cache.subscribe(&filtered);
        assert!(effect.start_fetch.is_some());
        let entry = cache.get(&filtered);
        assert_eq!(entry.status(), QueryStatus::Loading);
        assert!(entry.data().is_none());

        // The warm entry is untouched.
        let warm = cache.get(&all);
        assert_eq!(warm.status(), QueryStatus::Success);
        assert_eq!(warm.data().unwrap().as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_superseded_key_response_updates_its_own_entry() {
        let mut cache = QueryCache::new();
        let old = analyses_key("");
        let new = analyses_key("owner/repo");

        let old_generation = cache.subscribe(&old).start_fetch.unwrap();
        cache.unsubscribe(&old);
        let new_generation = cache.subscribe(&new).start_fetch.unwrap();

        // Old response arrives after the filter switch: it lands in its own
        // entry and is never attributed to the new key.
        cache.apply_success(&old, old_generation, json!([{"id": "a-1"}]));
        assert_eq!(cache.get(&new).status(), QueryStatus::Loading);
        assert!(cache.get(&new).data().is_none());
        assert_eq!(cache.get(&old).status(), QueryStatus::Success);

        cache.apply_success(&new, new_generation, json!([]));
        assert_eq!(cache.get(&new).status(), QueryStatus::Success);
    }

    // ========================================================================
    // Stale-while-revalidate
    // ========================================================================

    #[test]
    fn test_data_retained_during_revalidation() {
        let mut cache = QueryCache::new();
        let key = metrics_key(30);

        let generation = cache.subscribe(&key).start_fetch.unwrap();
        cache.apply_success(&key, generation, json!({"total_prs_analyzed": 7}));

        // Poll tick re-triggers the fetch; old data stays displayable.
        let next = cache.begin_fetch(&key).unwrap();
        let entry = cache.get(&key);
        assert_eq!(entry.status(), QueryStatus::Loading);
        assert_eq!(entry.data().unwrap()["total_prs_analyzed"], 7);

        cache.apply_success(&key, next, json!({"total_prs_analyzed": 8}));
        assert_eq!(cache.get(&key).data().unwrap()["total_prs_analyzed"], 8);
    }

    #[test]
    fn test_error_retains_data_and_flags_stale() {
        let mut cache = QueryCache::new();
        let key = metrics_key(30);

        let generation = cache.subscribe(&key).start_fetch.unwrap();
        cache.apply_success(&key, generation, json!({"total_prs_analyzed": 7}));

        let next = cache.begin_fetch(&key).unwrap();
        cache.apply_error(
            &key,
            next,
            FetchError::Remote {
                status: 503,
                message: "unavailable".into(),
            },
        );

        let entry = cache.get(&key);
        assert_eq!(entry.status(), QueryStatus::Error);
        assert!(entry.is_stale());
        // Last successful metrics still render alongside the error.
        assert_eq!(entry.data().unwrap()["total_prs_analyzed"], 7);
        assert!(matches!(
            entry.error(),
            Some(FetchError::Remote { status: 503, .. })
        ));
    }

    #[test]
    fn test_success_clears_error_and_staleness() {
        let mut cache = QueryCache::new();
        let key = metrics_key(30);

        let generation = cache.subscribe(&key).start_fetch.unwrap();
        cache.apply_error(&key, generation, FetchError::Network("refused".into()));
        assert!(cache.get(&key).is_stale());

        let next = cache.begin_fetch(&key).unwrap();
        cache.apply_success(&key, next, json!({}));
        let entry = cache.get(&key);
        assert_eq!(entry.status(), QueryStatus::Success);
        assert!(!entry.is_stale());
        assert!(entry.error().is_none());
        assert!(entry.fetched_at().is_some());
    }

    // ========================================================================
    // Invalidation
    // ========================================================================

    #[test]
    fn test_invalidation_targets_exactly_matching_entries() {
        let mut cache = QueryCache::new();
        let detail_a = analysis_key("a-1");
        let detail_b = analysis_key("b-2");
        let list = analyses_key("");

        for key in [&detail_a, &detail_b, &list] {
            let generation = cache.subscribe(key).start_fetch.unwrap();
            cache.apply_success(key, generation, json!({}));
        }

        // Feedback on an issue in analysis a-1 invalidates that detail and
        // every analyses list, never the unrelated detail.
        let refetch = cache.invalidate(|key| {
            key.name() == "analyses" || (key.name() == "analysis" && key.param("id") == Some("a-1"))
        });

        assert!(cache.get(&detail_a).is_stale());
        assert!(cache.get(&list).is_stale());
        assert!(!cache.get(&detail_b).is_stale());
        assert_eq!(refetch.len(), 2);
        assert!(refetch.contains(&detail_a));
        assert!(refetch.contains(&list));
    }

    #[test]
    fn test_invalidation_without_subscribers_refetches_lazily() {
        let mut cache = QueryCache::new();
        let key = analyses_key("");

        let generation = cache.subscribe(&key).start_fetch.unwrap();
        cache.apply_success(&key, generation, json!([]));
        cache.unsubscribe(&key);

        let refetch = cache.invalidate(|k| k.name() == "analyses");
        assert!(refetch.is_empty());
        assert!(cache.get(&key).is_stale());

        // Next subscription picks the staleness up.
        assert!(cache.subscribe(&key).start_fetch.is_some());
    }

    #[test]
    fn test_invalidation_during_flight_survives_resolution() {
        let mut cache = QueryCache::new();
        let key = analyses_key("");

        let generation = cache.subscribe(&key).start_fetch.unwrap();

        // A write lands while the pre-write fetch is still out: that
        // response must not clear the stale mark.
        let refetch = cache.invalidate(|k| k.name() == "analyses");
        assert!(refetch.contains(&key));
        assert_eq!(cache.begin_fetch(&key), None); // dedup holds

        cache.apply_success(&key, generation, json!([{"id": "pre-write"}]));
        let entry = cache.get(&key);
        assert_eq!(entry.status(), QueryStatus::Success);
        assert!(entry.is_stale());

        // The follow-up fetch clears it.
        let next = cache.begin_fetch(&key).unwrap();
        cache.apply_success(&key, next, json!([{"id": "post-write"}]));
        assert!(!cache.get(&key).is_stale());
    }

    // ========================================================================
    // Generation guard and unsubscribe
    // ========================================================================

    #[test]
    fn test_mismatched_generation_is_ignored() {
        let mut cache = QueryCache::new();
        let key = metrics_key(30);

        let generation = cache.subscribe(&key).start_fetch.unwrap();
        assert!(!cache.apply_success(&key, generation + 1, json!({})));
        assert_eq!(cache.get(&key).status(), QueryStatus::Loading);

        assert!(cache.apply_success(&key, generation, json!({})));
        // A late duplicate of the same generation is also ignored.
        assert!(!cache.apply_error(&key, generation, FetchError::Network("late".into())));
        assert_eq!(cache.get(&key).status(), QueryStatus::Success);
    }

    #[test]
    fn test_unsubscribe_keeps_entry_and_applies_late_response() {
        let mut cache = QueryCache::new();
        let key = analysis_key("a-1");

        let generation = cache.subscribe(&key).start_fetch.unwrap();
        let effect = cache.unsubscribe(&key);
        assert!(effect.stop_timer);

        // Response after last unsubscribe is not wasted.
        assert!(cache.apply_success(&key, generation, json!({"id": "a-1"})));
        let entry = cache.get(&key);
        assert_eq!(entry.status(), QueryStatus::Success);
        assert_eq!(entry.subscribers(), 0);
    }

    #[test]
    fn test_unsubscribe_stops_timer_only_on_last_consumer() {
        let mut cache = QueryCache::new();
        let key = analyses_key("");

        cache.subscribe(&key);
        cache.subscribe(&key);

        assert!(!cache.unsubscribe(&key).stop_timer);
        assert!(cache.unsubscribe(&key).stop_timer);
        // Unbalanced unsubscribe is a no-op, not an underflow.
        assert!(!cache.unsubscribe(&key).stop_timer);
    }

    #[test]
    fn test_get_creates_idle_entry() {
        let mut cache = QueryCache::new();
        let key = QueryKey::new("repos");

        assert!(cache.entry(&key).is_none());
        let entry = cache.get(&key);
        assert_eq!(entry.status(), QueryStatus::Idle);
        assert!(!entry.is_stale());
        assert!(entry.data().is_none());
    }
}

// ============================================================================
// PROPERTY-BASED TESTS
// ============================================================================

#[cfg(test)]
mod prop_tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    fn arb_key() -> impl Strategy<Value = QueryKey> {
        ("[a-c]{1}", 0u32..4).prop_map(|(name, p)| QueryKey::new(name).with_param("p", p))
    }

    #[derive(Debug, Clone)]
    enum Op {
        Subscribe,
        Unsubscribe,
        BeginFetch,
        ResolveOk,
        ResolveErr,
        Invalidate,
    }

    fn arb_op() -> impl Strategy<Value = Op> {
        prop_oneof![
            Just(Op::Subscribe),
            Just(Op::Unsubscribe),
            Just(Op::BeginFetch),
            Just(Op::ResolveOk),
            Just(Op::ResolveErr),
            Just(Op::Invalidate),
        ]
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        /// Property: under any interleaving, at most one fetch is in flight
        /// per key and subscriber counts never underflow.
        #[test]
        fn prop_single_flight_invariant(
            ops in prop::collection::vec((arb_key(), arb_op()), 0..60)
        ) {
            let mut cache = QueryCache::new();
            let mut in_flight: std::collections::HashMap<QueryKey, u64> =
                std::collections::HashMap::new();

            for (key, op) in ops {
                match op {
                    Op::Subscribe => {
                        let effect = cache.subscribe(&key);
                        if let Some(generation) = effect.start_fetch {
                            prop_assert!(!in_flight.contains_key(&key));
                            in_flight.insert(key.clone(), generation);
                        }
                    }
                    Op::Unsubscribe => {
                        cache.unsubscribe(&key);
                    }
                    Op::BeginFetch => {
                        if let Some(generation) = cache.begin_fetch(&key) {
                            prop_assert!(!in_flight.contains_key(&key));
                            in_flight.insert(key.clone(), generation);
                        }
                    }
                    Op::ResolveOk => {
                        if let Some(generation) = in_flight.remove(&key) {
                            prop_assert!(cache.apply_success(&key, generation, json!(1)));
                        }
                    }
                    Op::ResolveErr => {
                        if let Some(generation) = in_flight.remove(&key) {
                            prop_assert!(cache.apply_error(
                                &key,
                                generation,
                                FetchError::Network("x".into())
                            ));
                        }
                    }
                    Op::Invalidate => {
                        let name = key.name().to_string();
                        for refetch_key in cache.invalidate(|k| k.name() == name) {
                            prop_assert!(cache.entry(&refetch_key).is_some());
                        }
                    }
                }

                // Model and cache agree on in-flight state per key.
                for (k, _) in in_flight.iter() {
                    prop_assert!(cache.entry(k).map(CacheEntry::is_in_flight).unwrap_or(false));
                }
            }
        }

        /// Property: fetch generations are unique and strictly increasing.
        #[test]
        fn prop_generations_strictly_increase(
            keys in prop::collection::vec(arb_key(), 1..30)
        ) {
            let mut cache = QueryCache::new();
            let mut last = 0u64;
            for key in keys {
                if let Some(generation) = cache.begin_fetch(&key) {
                    prop_assert!(generation > last);
                    last = generation;
                    cache.apply_success(&key, generation, json!(null));
                }
            }
        }

        /// Property: invalidation marks exactly the matching entries stale.
        #[test]
        fn prop_invalidation_is_exact(
            keys in prop::collection::vec(arb_key(), 1..20),
            target in "[a-c]{1}"
        ) {
            let mut cache = QueryCache::new();
            for key in &keys {
                if let Some(generation) = cache.begin_fetch(key) {
                    cache.apply_success(key, generation, json!(null));
                }
            }

            cache.invalidate(|k| k.name() == target);

            for key in &keys {
                let entry = cache.entry(key).unwrap();
                prop_assert_eq!(entry.is_stale(), key.name() == target);
            }
        }
    }
}
