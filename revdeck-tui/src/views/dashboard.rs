//! Dashboard view: aggregate metrics and the recent-analyses list.

use crate::state::App;
use crate::theme::{analysis_status_color, severity_color};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Row, Table},
    Frame,
};
use revdeck_core::MetricsResponse;

pub fn render(f: &mut Frame<'_>, app: &App, area: Rect) {
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(8), Constraint::Min(0)])
        .split(area);

    render_metrics(f, app, layout[0]);
    render_analyses(f, app, layout[1]);
}

fn render_metrics(f: &mut Frame<'_>, app: &App, area: Rect) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);

    let metrics = app.metrics();
    let title = metrics_title(app);

    let lines = match &metrics {
        Some(m) => vec![
            Line::from(format!("PRs analyzed      {}", m.total_prs_analyzed)),
            Line::from(format!("Issues found      {}", m.total_issues_found)),
            Line::from(format!("Issues per PR     {:.1}", m.avg_issues_per_pr)),
            Line::from(format!("Time saved        {:.1} h", m.estimated_time_saved_hours)),
            Line::from(vec![
                Span::styled(
                    format!("critical {}  ", m.issues_by_severity.critical),
                    Style::default().fg(app.theme.error),
                ),
                Span::styled(
                    format!("warning {}  ", m.issues_by_severity.warning),
                    Style::default().fg(app.theme.warning),
                ),
                Span::styled(
                    format!("suggestion {}", m.issues_by_severity.suggestion),
                    Style::default().fg(app.theme.info),
                ),
            ]),
        ],
        None => vec![Line::from("Loading...")],
    };
    let summary = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title(title))
        .style(Style::default().fg(app.theme.text));
    f.render_widget(summary, columns[0]);

    render_top_issues(f, app, metrics.as_ref(), columns[1]);
}

fn metrics_title(app: &App) -> String {
    let key = crate::queries::metrics_key(app.filters.repo.as_deref(), app.filters.days);
    let refreshing = app
        .cache
        .entry(&key)
        .map(|entry| entry.is_in_flight() && entry.data().is_some())
        .unwrap_or(false);
    if refreshing {
        "Metrics (refreshing)".to_string()
    } else {
        "Metrics".to_string()
    }
}

fn render_top_issues(f: &mut Frame<'_>, app: &App, metrics: Option<&MetricsResponse>, area: Rect) {
    let lines: Vec<Line> = match metrics {
        Some(m) if !m.top_issues.is_empty() => m
            .top_issues
            .iter()
            .take(area.height.saturating_sub(2) as usize)
            .map(|issue| {
                Line::from(vec![
                    Span::styled(
                        format!("{:>3}x ", issue.count),
                        Style::default().fg(app.theme.secondary),
                    ),
                    Span::styled(
                        format!("[{}] ", issue.severity),
                        Style::default().fg(severity_color(issue.severity, &app.theme)),
                    ),
                    Span::raw(issue.title.clone()),
                ])
            })
            .collect(),
        Some(_) => vec![Line::from("No recurring issues")],
        None => vec![Line::from("Loading...")],
    };
    let panel = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title("Top issues"))
        .style(Style::default().fg(app.theme.text));
    f.render_widget(panel, area);
}

fn render_analyses(f: &mut Frame<'_>, app: &App, area: Rect) {
    let analyses = app.analyses().unwrap_or_default();
    let rows: Vec<Row> = analyses
        .iter()
        .enumerate()
        .map(|(i, item)| {
            let style = if i == app.dashboard.selected_analysis {
                Style::default()
                    .fg(app.theme.primary)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(analysis_status_color(item.status, &app.theme))
            };
            Row::new(vec![
                format!("{}#{}", item.repo, item.pr_number),
                item.pr_title.clone().unwrap_or_default(),
                item.status.to_string(),
                format!(
                    "{}c/{}w/{}s",
                    item.summary.critical, item.summary.warnings, item.summary.suggestions
                ),
                item.analyzed_at.format("%m-%d %H:%M").to_string(),
            ])
            .style(style)
        })
        .collect();

    let table = Table::new(
        rows,
        [
            Constraint::Percentage(25),
            Constraint::Percentage(35),
            Constraint::Length(12),
            Constraint::Length(12),
            Constraint::Length(12),
        ],
    )
    .header(
        Row::new(vec!["PR", "Title", "Status", "Issues", "Analyzed"])
            .style(Style::default().fg(app.theme.text_dim)),
    )
    .block(
        Block::default()
            .borders(Borders::ALL)
            .title("Recent analyses"),
    );
    f.render_widget(table, area);
}
