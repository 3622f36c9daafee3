//! Application state and view state definitions.

use crate::api_client::ApiClient;
use crate::config::TuiConfig;
use crate::feedback::FeedbackLocks;
use crate::nav::Route;
use crate::notifications::{Notification, NotificationLevel};
use crate::queries::{analyses_key, analysis_key, metrics_key, repos_key, ANALYSES_LIMIT};
use crate::theme::SynthBruteTheme;
use revdeck_core::{AnalysisListItem, AnalysisResponse, MetricsResponse, RepoInfo, Severity};
use revdeck_query::{MutationState, QueryCache, QueryKey};

/// Time-window choices for the metrics panel, cycled with `d`.
pub const DAYS_CHOICES: [u32; 4] = [7, 14, 30, 90];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardFilters {
    /// `None` means all repositories.
    pub repo: Option<String>,
    pub days: u32,
}

impl Default for DashboardFilters {
    fn default() -> Self {
        Self {
            repo: None,
            days: 30,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct DashboardViewState {
    pub selected_analysis: usize,
}

#[derive(Debug, Clone, Default)]
pub struct DetailViewState {
    pub selected_issue: usize,
}

/// Modal input for triggering a new analysis, e.g. `owner/repo 42`.
#[derive(Debug, Clone, Default)]
pub struct TriggerPrompt {
    pub input: String,
}

impl TriggerPrompt {
    pub fn push_char(&mut self, c: char) {
        self.input.push(c);
    }

    pub fn backspace(&mut self) {
        self.input.pop();
    }

    pub fn parse(&self) -> Option<(String, u64)> {
        let mut parts = self.input.split_whitespace();
        let repo = parts.next()?;
        let pr_number = parts.next()?.parse().ok()?;
        if parts.next().is_some() || !repo.contains('/') {
            return None;
        }
        Some((repo.to_string(), pr_number))
    }
}

pub struct App {
    pub config: TuiConfig,
    pub theme: SynthBruteTheme,
    pub api: ApiClient,
    pub cache: QueryCache,
    pub route: Route,
    pub filters: DashboardFilters,

    pub dashboard: DashboardViewState,
    pub detail: DetailViewState,
    pub trigger_prompt: Option<TriggerPrompt>,

    pub feedback_locks: FeedbackLocks,
    pub feedback_mutation: MutationState,
    pub trigger_mutation: MutationState,

    pub notifications: Vec<Notification>,
}

impl App {
    pub fn new(config: TuiConfig, api: ApiClient) -> Self {
        Self {
            config,
            theme: SynthBruteTheme::synthbrute(),
            api,
            cache: QueryCache::new(),
            route: Route::Dashboard,
            filters: DashboardFilters::default(),
            dashboard: DashboardViewState::default(),
            detail: DetailViewState::default(),
            trigger_prompt: None,
            feedback_locks: FeedbackLocks::new(),
            feedback_mutation: MutationState::new(),
            trigger_mutation: MutationState::new(),
            notifications: Vec::new(),
        }
    }

    pub fn notify(&mut self, level: NotificationLevel, message: impl Into<String>) {
        self.notifications.push(Notification::new(level, message));
    }

    /// The queries the current route needs, with the current filter
    /// parameters baked into the keys. The sync layer diffs consecutive
    /// results of this to decide what to subscribe and unsubscribe.
    pub fn active_keys(&self) -> Vec<QueryKey> {
        match &self.route {
            Route::Dashboard => vec![
                metrics_key(self.filters.repo.as_deref(), self.filters.days),
                analyses_key(self.filters.repo.as_deref(), ANALYSES_LIMIT),
                repos_key(),
            ],
            Route::AnalysisDetail { analysis_id } => vec![analysis_key(analysis_id)],
        }
    }

    // ------------------------------------------------------------------------
    // Typed cache reads (render boundary)
    // ------------------------------------------------------------------------

    pub fn metrics(&self) -> Option<MetricsResponse> {
        self.decode(&metrics_key(self.filters.repo.as_deref(), self.filters.days))
    }

    pub fn analyses(&self) -> Option<Vec<AnalysisListItem>> {
        self.decode(&analyses_key(self.filters.repo.as_deref(), ANALYSES_LIMIT))
    }

    pub fn repos(&self) -> Option<Vec<RepoInfo>> {
        self.decode(&repos_key())
    }

    /// Current analysis with its issues grouped most-severe first. The
    /// server interleaves severities; sorting here keeps the rendered
    /// list and the selection index walking the same order.
    pub fn analysis(&self) -> Option<AnalysisResponse> {
        match &self.route {
            Route::AnalysisDetail { analysis_id } => {
                let mut analysis: AnalysisResponse = self.decode(&analysis_key(analysis_id))?;
                analysis.issues.sort_by_key(|issue| severity_rank(issue.severity));
                Some(analysis)
            }
            Route::Dashboard => None,
        }
    }

    fn decode<T: serde::de::DeserializeOwned>(&self, key: &QueryKey) -> Option<T> {
        let data = self.cache.entry(key)?.data()?.clone();
        serde_json::from_value(data).ok()
    }

    // ------------------------------------------------------------------------
    // Filters and navigation
    // ------------------------------------------------------------------------

    /// Advance the metrics window: 7 → 14 → 30 → 90 → 7.
    pub fn cycle_days(&mut self) {
        let position = DAYS_CHOICES
            .iter()
            .position(|&d| d == self.filters.days)
            .unwrap_or(0);
        self.filters.days = DAYS_CHOICES[(position + 1) % DAYS_CHOICES.len()];
    }

    /// Advance the repo filter through the known repos: all → first →
    /// ... → last → all. Resets the list selection since the rows change.
    pub fn cycle_repo_filter(&mut self) {
        let repos = self.repos().unwrap_or_default();
        let next = match &self.filters.repo {
            None => repos.first().map(|r| r.repo.clone()),
            Some(current) => {
                let position = repos.iter().position(|r| &r.repo == current);
                match position {
                    Some(i) if i + 1 < repos.len() => Some(repos[i + 1].repo.clone()),
                    _ => None,
                }
            }
        };
        self.filters.repo = next;
        self.dashboard.selected_analysis = 0;
    }

    pub fn move_selection(&mut self, down: bool) {
        match &self.route {
            Route::Dashboard => {
                let len = self.analyses().map(|a| a.len()).unwrap_or(0);
                self.dashboard.selected_analysis =
                    step(self.dashboard.selected_analysis, len, down);
            }
            Route::AnalysisDetail { .. } => {
                let len = self.analysis().map(|a| a.issues.len()).unwrap_or(0);
                self.detail.selected_issue = step(self.detail.selected_issue, len, down);
            }
        }
    }

    /// Enter on the dashboard list: navigate to the selected analysis.
    pub fn open_selected_analysis(&mut self) {
        if let Some(analyses) = self.analyses() {
            if let Some(item) = analyses.get(self.dashboard.selected_analysis) {
                self.route = Route::AnalysisDetail {
                    analysis_id: item.id.clone(),
                };
                self.detail = DetailViewState::default();
            }
        }
    }

    pub fn back_to_dashboard(&mut self) {
        self.route = Route::Dashboard;
    }

    /// Issue currently highlighted in the detail view.
    pub fn selected_issue_id(&self) -> Option<String> {
        let analysis = self.analysis()?;
        analysis
            .issues
            .get(self.detail.selected_issue)
            .map(|issue| issue.id.clone())
    }
}

fn severity_rank(severity: Severity) -> usize {
    Severity::all()
        .iter()
        .position(|&s| s == severity)
        .unwrap_or(Severity::all().len())
}

fn step(current: usize, len: usize, down: bool) -> usize {
    if len == 0 {
        return 0;
    }
    let max = len - 1;
    if down {
        (current + 1).min(max)
    } else {
        current.min(max).saturating_sub(1)
    }
}
