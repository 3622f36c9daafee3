//! REVDECK TUI entry point.

use crossterm::{
    event::{self, Event as CrosstermEvent, KeyCode},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use revdeck_tui::api_client::ApiClient;
use revdeck_tui::config::TuiConfig;
use revdeck_tui::error::TuiError;
use revdeck_tui::events::AppEvent;
use revdeck_tui::keys::{map_key, Action};
use revdeck_tui::mutations::MutationKind;
use revdeck_tui::nav::Route;
use revdeck_tui::notifications::NotificationLevel;
use revdeck_tui::state::{App, TriggerPrompt};
use revdeck_tui::sync::SyncState;
use revdeck_tui::views::render_view;
use std::io::{self, Stdout};
use std::time::Duration;
use tokio::sync::mpsc;

#[tokio::main]
async fn main() -> Result<(), TuiError> {
    let config = TuiConfig::load()?;
    let api = ApiClient::new(&config)?;
    let mut app = App::new(config, api);

    let mut terminal = setup_terminal()?;
    let _guard = TerminalGuard {};

    let (event_tx, mut event_rx) = mpsc::channel::<AppEvent>(256);
    spawn_input_reader(event_tx.clone());

    check_health(&mut app).await;

    let mut sync = SyncState::new(event_tx.clone());
    sync.reconcile(&mut app);

    loop {
        terminal.draw(|f| render_view(f, &app))?;

        match event_rx.recv().await {
            Some(event) => {
                if handle_event(&mut app, &mut sync, event) {
                    break;
                }
            }
            None => break,
        }
    }

    Ok(())
}

fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>, TuiError> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    Ok(Terminal::new(backend)?)
}

struct TerminalGuard;

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let mut stdout = io::stdout();
        let _ = execute!(stdout, LeaveAlternateScreen);
    }
}

fn spawn_input_reader(sender: mpsc::Sender<AppEvent>) {
    std::thread::spawn(move || loop {
        if let Ok(true) = event::poll(Duration::from_millis(200)) {
            if let Ok(evt) = event::read() {
                match evt {
                    CrosstermEvent::Key(key) => {
                        let _ = sender.blocking_send(AppEvent::Input(key));
                    }
                    CrosstermEvent::Resize(width, height) => {
                        let _ = sender.blocking_send(AppEvent::Resize { width, height });
                    }
                    _ => {}
                }
            }
        }
    });
}

async fn check_health(app: &mut App) {
    match app.api.health().await {
        Ok(health) => {
            app.notify(
                NotificationLevel::Info,
                format!("API reachable ({})", health.status),
            );
        }
        Err(err) => {
            app.notify(
                NotificationLevel::Error,
                format!("API health check failed: {}", err),
            );
        }
    }
}

fn handle_event(app: &mut App, sync: &mut SyncState, event: AppEvent) -> bool {
    match event {
        AppEvent::Input(key) => {
            if app.trigger_prompt.is_some() {
                handle_prompt_key(app, sync, key.code);
                return false;
            }
            if let Some(action) = map_key(key) {
                return handle_action(app, sync, action);
            }
        }
        AppEvent::PollTick(key) => sync.handle_poll_tick(app, &key),
        AppEvent::QueryDone {
            key,
            generation,
            result,
        } => sync.handle_query_done(app, &key, generation, result),
        AppEvent::MutationDone { kind, result } => sync.handle_mutation_done(app, kind, result),
        AppEvent::Resize { .. } => {}
    }
    false
}

fn handle_prompt_key(app: &mut App, sync: &mut SyncState, code: KeyCode) {
    match code {
        KeyCode::Esc => {
            app.trigger_prompt = None;
        }
        KeyCode::Enter => {
            let parsed = app.trigger_prompt.as_ref().and_then(TriggerPrompt::parse);
            match parsed {
                Some((repo, pr_number)) => {
                    app.trigger_prompt = None;
                    let kind = MutationKind::TriggerAnalysis { repo, pr_number };
                    if !sync.dispatch_mutation(app, kind) {
                        app.notify(
                            NotificationLevel::Warning,
                            "An analysis trigger is already in flight",
                        );
                    }
                }
                None => {
                    app.notify(
                        NotificationLevel::Warning,
                        "Expected: owner/repo pr-number (e.g. acme/api 42)",
                    );
                }
            }
        }
        KeyCode::Backspace => {
            if let Some(prompt) = app.trigger_prompt.as_mut() {
                prompt.backspace();
            }
        }
        KeyCode::Char(c) => {
            if let Some(prompt) = app.trigger_prompt.as_mut() {
                prompt.push_char(c);
            }
        }
        _ => {}
    }
}

fn handle_action(app: &mut App, sync: &mut SyncState, action: Action) -> bool {
    match action {
        Action::Quit => return true,
        Action::MoveUp => app.move_selection(false),
        Action::MoveDown => app.move_selection(true),
        Action::Confirm => {
            if app.route == Route::Dashboard {
                app.open_selected_analysis();
                sync.reconcile(app);
            }
        }
        Action::Cancel => {
            if app.route != Route::Dashboard {
                app.back_to_dashboard();
                sync.reconcile(app);
            }
        }
        Action::CycleRepoFilter => {
            if app.route == Route::Dashboard {
                app.cycle_repo_filter();
                sync.reconcile(app);
            }
        }
        Action::CycleDays => {
            if app.route == Route::Dashboard {
                app.cycle_days();
                sync.reconcile(app);
            }
        }
        Action::Refresh => sync.refresh_all(app),
        Action::NewAnalysis => {
            if app.route == Route::Dashboard {
                app.trigger_prompt = Some(TriggerPrompt::default());
            }
        }
        Action::MarkHelpful => submit_feedback(app, sync, true),
        Action::MarkNotHelpful => submit_feedback(app, sync, false),
    }
    false
}

fn submit_feedback(app: &mut App, sync: &mut SyncState, is_helpful: bool) {
    if app.route == Route::Dashboard {
        return;
    }
    let Some(issue_id) = app.selected_issue_id() else {
        return;
    };
    // The per-issue lock makes a repeated keypress a no-op.
    if !app.feedback_locks.try_submit(&issue_id, is_helpful) {
        return;
    }
    let kind = MutationKind::SubmitFeedback {
        issue_id: issue_id.clone(),
        is_helpful,
    };
    if !sync.dispatch_mutation(app, kind) {
        // Another issue's submission is still pending; release this claim.
        app.feedback_locks.resolve_failure(&issue_id);
        app.notify(
            NotificationLevel::Warning,
            "A feedback submission is already in flight",
        );
    }
}
