//! # Module: Terminal Dashboard
//!
//! Ratatui front end for the dashboard. `ui` draws a `View` plus toasts,
//! `events` turns key presses into dashboard actions, and the helpers here
//! enter and leave the alternate screen.
//!
//! The terminal is restored on normal exit and when the UI thread panics.

pub mod events;
pub mod ui;

use std::io;
use std::thread::{self, ThreadId};

use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;

pub type DashboardTerminal = Terminal<CrosstermBackend<io::Stdout>>;

/// Switches to raw mode and the alternate screen.
pub fn setup_terminal() -> Result<DashboardTerminal, io::Error> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    Terminal::new(backend)
}

/// Leaves the alternate screen and shows the cursor again.
pub fn restore_terminal(terminal: &mut DashboardTerminal) -> Result<(), io::Error> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}

/// Installs a panic hook that restores the terminal before the default hook
/// prints the panic message.
///
/// Must be called from the thread that owns the terminal. Panics on other
/// threads (a fetch task caught by tokio, for instance) are only logged so the
/// dashboard keeps its screen.
pub fn install_panic_hook() {
    let ui_thread = thread::current().id();
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        route_panic(
            ui_thread,
            || {
                let _ = disable_raw_mode();
                let _ = execute!(io::stdout(), LeaveAlternateScreen);
                default_hook(info);
            },
            || log::error!("background task {}", info),
        );
    }));
}

/// Runs `on_ui_thread` when called from `ui_thread`, `elsewhere` otherwise.
fn route_panic(ui_thread: ThreadId, on_ui_thread: impl FnOnce(), elsewhere: impl FnOnce()) {
    if thread::current().id() == ui_thread {
        on_ui_thread();
    } else {
        elsewhere();
    }
}
