//! View rendering dispatch.

pub mod dashboard;
pub mod detail;

use crate::nav::Route;
use crate::notifications::NotificationLevel;
use crate::state::App;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    text::Span,
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

pub fn render_view(f: &mut Frame<'_>, app: &App) {
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(0),
            Constraint::Length(3),
        ])
        .split(f.size());

    render_header(f, app, layout[0]);

    match &app.route {
        Route::Dashboard => dashboard::render(f, app, layout[1]),
        Route::AnalysisDetail { .. } => detail::render(f, app, layout[1]),
    }

    render_footer(f, app, layout[2]);

    if let Some(prompt) = &app.trigger_prompt {
        render_trigger_prompt(f, app, &prompt.input);
    }
}

fn render_header(f: &mut Frame<'_>, app: &App, area: Rect) {
    let repo = app.filters.repo.as_deref().unwrap_or("all repos");
    let title = format!(
        "REVDECK | {} | {} | last {} days",
        app.route.title(),
        repo,
        app.filters.days
    );
    let block = Block::default().borders(Borders::ALL).title(Span::styled(
        title,
        Style::default().fg(app.theme.primary),
    ));
    f.render_widget(block, area);
}

fn render_footer(f: &mut Frame<'_>, app: &App, area: Rect) {
    let help = match app.route {
        Route::Dashboard => {
            "j/k move • Enter open • r repo filter • d days • n new analysis • Ctrl-r refresh • q quit"
        }
        Route::AnalysisDetail { .. } => {
            "j/k move • y helpful • x not helpful • Esc back • Ctrl-r refresh • q quit"
        }
    };
    let (text, style) = if let Some(note) = app.notifications.last() {
        let label = match note.level {
            NotificationLevel::Info => "INFO",
            NotificationLevel::Warning => "WARN",
            NotificationLevel::Error => "ERROR",
            NotificationLevel::Success => "SUCCESS",
        };
        let color = match note.level {
            NotificationLevel::Info => app.theme.info,
            NotificationLevel::Warning => app.theme.warning,
            NotificationLevel::Error => app.theme.error,
            NotificationLevel::Success => app.theme.success,
        };
        (format!("{}: {}", label, note.message), Style::default().fg(color))
    } else {
        (help.to_string(), Style::default().fg(app.theme.text_dim))
    };
    let footer = Paragraph::new(text)
        .block(Block::default().borders(Borders::ALL))
        .style(style);
    f.render_widget(footer, area);
}

fn render_trigger_prompt(f: &mut Frame<'_>, app: &App, input: &str) {
    let area = centered_rect(50, 3, f.size());
    f.render_widget(Clear, area);
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(app.theme.border_focus))
        .title("Trigger analysis (repo pr-number)");
    let prompt = Paragraph::new(format!("> {}", input))
        .block(block)
        .style(Style::default().fg(app.theme.text));
    f.render_widget(prompt, area);
}

fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let x = area.x + area.width.saturating_sub(width) / 2;
    let y = area.y + area.height.saturating_sub(height) / 2;
    Rect {
        x,
        y,
        width: width.min(area.width),
        height: height.min(area.height),
    }
}
