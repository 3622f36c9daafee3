//! Keybinding definitions for the TUI.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Quit,
    MoveUp,
    MoveDown,
    Confirm,
    Cancel,
    CycleRepoFilter,
    CycleDays,
    Refresh,
    NewAnalysis,
    MarkHelpful,
    MarkNotHelpful,
}

pub fn map_key(event: KeyEvent) -> Option<Action> {
    let KeyEvent { code, modifiers, .. } = event;

    if modifiers.contains(KeyModifiers::CONTROL) {
        return match code {
            KeyCode::Char('c') => Some(Action::Quit),
            KeyCode::Char('r') => Some(Action::Refresh),
            _ => None,
        };
    }

    match code {
        KeyCode::Char('q') => Some(Action::Quit),
        KeyCode::Enter => Some(Action::Confirm),
        KeyCode::Esc => Some(Action::Cancel),
        KeyCode::Up | KeyCode::Char('k') => Some(Action::MoveUp),
        KeyCode::Down | KeyCode::Char('j') => Some(Action::MoveDown),
        KeyCode::Char('r') => Some(Action::CycleRepoFilter),
        KeyCode::Char('d') => Some(Action::CycleDays),
        KeyCode::Char('n') => Some(Action::NewAnalysis),
        KeyCode::Char('y') => Some(Action::MarkHelpful),
        KeyCode::Char('x') => Some(Action::MarkNotHelpful),
        _ => None,
    }
}
