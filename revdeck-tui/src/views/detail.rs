//! Analysis detail view: PR summary, issue list, and feedback controls.

use crate::feedback::FeedbackState;
use crate::nav::Route;
use crate::state::App;
use crate::theme::severity_color;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};
use revdeck_core::{AnalysisResponse, IssueResponse, Severity};

pub fn render(f: &mut Frame<'_>, app: &App, area: Rect) {
    let Some(analysis) = app.analysis() else {
        let loading = Paragraph::new(placeholder(&app.route))
            .block(Block::default().borders(Borders::ALL).title("Analysis"))
            .style(Style::default().fg(app.theme.text_dim));
        f.render_widget(loading, area);
        return;
    };

    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(6), Constraint::Min(0)])
        .split(area);

    render_summary(f, app, &analysis, layout[0]);

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
        .split(layout[1]);

    render_issue_list(f, app, &analysis, columns[0]);
    render_issue_detail(f, app, &analysis, columns[1]);
}

/// Text shown when there is no analysis to render. A route with an empty
/// id is never fetched at all, which is distinct from a fetch that has
/// not resolved yet.
fn placeholder(route: &Route) -> &'static str {
    match route {
        Route::AnalysisDetail { analysis_id } if analysis_id.is_empty() => "No analysis selected",
        _ => "Loading...",
    }
}

fn render_summary(f: &mut Frame<'_>, app: &App, analysis: &AnalysisResponse, area: Rect) {
    let pr_title = analysis.pr_title.as_deref().unwrap_or("(untitled)");
    let author = analysis.author.as_deref().unwrap_or("unknown");
    let lines = vec![
        Line::from(format!(
            "{}#{} — {}",
            analysis.repo, analysis.pr_number, pr_title
        )),
        Line::from(format!("Author: {}  Status: {}", author, analysis.status)),
        Line::from(format!(
            "Issues: {} critical, {} warnings, {} suggestions",
            analysis.summary.critical, analysis.summary.warnings, analysis.summary.suggestions
        )),
        Line::from(format!(
            "{} files, +{}/-{} lines, {} ms",
            analysis.metadata.files_changed,
            analysis.metadata.lines_added,
            analysis.metadata.lines_removed,
            analysis.metadata.analysis_time_ms
        )),
    ];
    let summary = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title("Analysis"))
        .style(Style::default().fg(app.theme.text));
    f.render_widget(summary, area);
}

/// `App::analysis` delivers issues sorted most-severe first, so emitting
/// a header on each severity change yields exactly one group per
/// severity present.
fn render_issue_list(f: &mut Frame<'_>, app: &App, analysis: &AnalysisResponse, area: Rect) {
    let mut lines = Vec::new();
    let mut last_severity: Option<Severity> = None;
    for (i, issue) in analysis.issues.iter().enumerate() {
        if last_severity != Some(issue.severity) {
            lines.push(Line::from(Span::styled(
                format!("── {} ──", issue.severity),
                Style::default().fg(severity_color(issue.severity, &app.theme)),
            )));
            last_severity = Some(issue.severity);
        }
        let marker = match app.feedback_locks.state(&issue.id) {
            FeedbackState::Undecided => " ",
            FeedbackState::Pending(_) => "~",
            FeedbackState::Decided(true) => "+",
            FeedbackState::Decided(false) => "-",
        };
        let style = if i == app.detail.selected_issue {
            Style::default()
                .fg(app.theme.primary)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(app.theme.text)
        };
        lines.push(Line::from(Span::styled(
            format!("[{}] {}  ({})", marker, issue.title, issue.file_path),
            style,
        )));
    }
    if lines.is_empty() {
        lines.push(Line::from("No issues found"));
    }

    let list = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .title(format!("Issues ({})", analysis.issues.len())),
    );
    f.render_widget(list, area);
}

fn render_issue_detail(f: &mut Frame<'_>, app: &App, analysis: &AnalysisResponse, area: Rect) {
    let Some(issue) = analysis.issues.get(app.detail.selected_issue) else {
        let empty = Paragraph::new("")
            .block(Block::default().borders(Borders::ALL).title("Issue"));
        f.render_widget(empty, area);
        return;
    };

    let mut lines = vec![
        Line::from(Span::styled(
            issue.title.clone(),
            Style::default().fg(severity_color(issue.severity, &app.theme)),
        )),
        Line::from(format!(
            "{}:{}",
            issue.file_path,
            issue.line_number.map(|n| n.to_string()).unwrap_or_default()
        )),
        Line::from(""),
        Line::from(issue.message.clone()),
    ];
    if let Some(explanation) = &issue.explanation {
        lines.push(Line::from(""));
        lines.push(Line::from(explanation.clone()));
    }
    if let Some(suggestion) = &issue.suggestion {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            format!("Suggestion: {}", suggestion),
            Style::default().fg(app.theme.info),
        )));
    }
    lines.push(Line::from(""));
    lines.push(feedback_line(app, issue));

    let detail = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title("Issue"))
        .style(Style::default().fg(app.theme.text))
        .wrap(ratatui::widgets::Wrap { trim: false });
    f.render_widget(detail, area);
}

fn feedback_line(app: &App, issue: &IssueResponse) -> Line<'static> {
    match app.feedback_locks.state(&issue.id) {
        FeedbackState::Undecided => Line::from(Span::styled(
            "Feedback: y helpful / x not helpful".to_string(),
            Style::default().fg(app.theme.text_dim),
        )),
        FeedbackState::Pending(_) => Line::from(Span::styled(
            "Submitting feedback...".to_string(),
            Style::default().fg(app.theme.warning),
        )),
        FeedbackState::Decided(choice) => Line::from(Span::styled(
            format!(
                "Feedback recorded: {}",
                if choice { "helpful" } else { "not helpful" }
            ),
            Style::default().fg(app.theme.success),
        )),
    }
}
