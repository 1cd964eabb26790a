//! Keyboard handling for the dashboard.
//!
//! `r` refreshes, `a` flips auto-refresh, `q`, Esc and Ctrl+C quit.

use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

/// Result of polling for a terminal event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEvent {
    /// User pressed quit (q, Esc or Ctrl+C).
    Quit,
    /// User asked for an immediate refresh cycle.
    Refresh,
    /// User flipped the auto-refresh switch.
    ToggleAutoRefresh,
    /// A terminal resize occurred.
    Resize(u16, u16),
    /// No actionable event within the poll window.
    None,
}

/// Polls for a single input event, waiting at most `timeout`.
///
/// Polling errors are reported as `InputEvent::None`.
pub fn poll_event(timeout: Duration) -> InputEvent {
    let available = match event::poll(timeout) {
        Ok(v) => v,
        Err(e) => {
            log::debug!("terminal poll failed: {}", e);
            return InputEvent::None;
        }
    };
    if !available {
        return InputEvent::None;
    }

    match event::read() {
        Ok(Event::Key(key)) => translate_key(key),
        Ok(Event::Resize(w, h)) => InputEvent::Resize(w, h),
        _ => InputEvent::None,
    }
}

/// Translates a crossterm key event to an `InputEvent`.
pub fn translate_key(key: KeyEvent) -> InputEvent {
    if key.kind == KeyEventKind::Release {
        return InputEvent::None;
    }
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        return InputEvent::Quit;
    }

    match key.code {
        KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => InputEvent::Quit,
        KeyCode::Char('r') | KeyCode::Char('R') | KeyCode::F(5) => InputEvent::Refresh,
        KeyCode::Char('a') | KeyCode::Char('A') => InputEvent::ToggleAutoRefresh,
        _ => InputEvent::None,
    }
}
