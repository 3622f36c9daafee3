//! Route definitions for the TUI.

/// Active screen. The detail route carries the analysis it shows; a
/// different analysis id is a different route and therefore a different
/// set of active queries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Dashboard,
    AnalysisDetail { analysis_id: String },
}

impl Route {
    pub fn title(&self) -> &'static str {
        match self {
            Route::Dashboard => "Dashboard",
            Route::AnalysisDetail { .. } => "Analysis",
        }
    }
}
