use crossterm::event::{KeyCode, KeyEvent};

use super::app::App;
use crate::ui::TreeKeyAction;

/// Result of handling a key press.
#[derive(Debug, PartialEq, Eq)]
pub enum KeyAction {
    Quit,
    Reload,
    Continue,
}

/// Handle a key press. Returns an action indicating what the event loop should do.
pub fn handle_key(app: &mut App, key: KeyEvent) -> KeyAction {
    match app.tree.handle_key(key) {
        TreeKeyAction::Quit => KeyAction::Quit,
        TreeKeyAction::Select => {
            app.select();
            KeyAction::Continue
        }
        TreeKeyAction::Continue => KeyAction::Continue,
        TreeKeyAction::Unhandled => match key.code {
            KeyCode::Esc => KeyAction::Quit,
            KeyCode::Char('r') => KeyAction::Reload,
            KeyCode::Char('c') => {
                app.clear_selection();
                KeyAction::Continue
            }
            _ => KeyAction::Continue,
        },
    }
}
