//! REVDECK TUI library exports.

pub mod api_client;
pub mod config;
pub mod error;
pub mod events;
pub mod feedback;
pub mod keys;
pub mod mutations;
pub mod nav;
pub mod notifications;
pub mod queries;
pub mod scheduler;
pub mod state;
pub mod sync;
pub mod theme;
pub mod views;
