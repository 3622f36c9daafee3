//! Event types for the TUI event loop.

use crate::mutations::MutationKind;
use crossterm::event::KeyEvent;
use revdeck_query::{FetchError, QueryKey};
use serde_json::Value;

#[derive(Debug, Clone)]
pub enum AppEvent {
    Input(KeyEvent),
    Resize { width: u16, height: u16 },
    /// A poll timer elapsed for a subscribed key.
    PollTick(QueryKey),
    /// A spawned fetch resolved. The generation ties the result back to
    /// the fetch that produced it.
    QueryDone {
        key: QueryKey,
        generation: u64,
        result: Result<Value, FetchError>,
    },
    /// A mutation resolved; on success its invalidation rule is applied.
    MutationDone {
        kind: MutationKind,
        result: Result<String, FetchError>,
    },
}
