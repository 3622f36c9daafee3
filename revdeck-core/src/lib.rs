//! REVDECK Core - Wire Types
//!
//! Pure data structures with no behavior. All other crates depend on this.
//! These types mirror the JSON surface of the review API; nothing here owns
//! network or cache state.

use chrono::{DateTime, Utc};

pub mod enums;
pub mod types;

pub use enums::{AnalysisStatus, Category, ParseEnumError, Severity};
pub use types::*;

/// Timestamp type using UTC timezone.
pub type Timestamp = DateTime<Utc>;
