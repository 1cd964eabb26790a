//! # Render Engine
//!
//! Owns the dashboard `View`, the headless state the terminal UI draws, and
//! rebuilds it from a `Snapshot`. The view is created once when the
//! engine is constructed and every entry point mutates it under one lock, so a
//! frame drawn by the terminal UI never sees half of a render.
//!
//! Cycles are fenced by generation: `show_loading` hands out a `CycleTicket`
//! and `render`/`show_full_error` only apply when that ticket still belongs to
//! the newest cycle. Results from superseded cycles are dropped.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::Local;

use crate::endpoints::Endpoint;
use crate::notifier::{NotificationKind, Notifier};
use crate::snapshot::{format_count, CountReading, RefreshCycleState, Snapshot, StateRow, StateRows};

pub const LOADING_TEXT: &str = "...";
pub const REFRESHING_MESSAGE: &str = "Refreshing data...";
pub const LOADING_STATES_TEXT: &str = "Loading agent data...";
pub const INVALID_DATA_TEXT: &str = "Invalid data format";
pub const ERROR_TEXT: &str = "Error";
pub const ERROR_CARD_TEXT: &str = "Err";
pub const UNABLE_TO_LOAD_TEXT: &str = "Unable to load data";
pub const REFRESH_FAILED_TOAST: &str = "Failed to refresh data";

/// Style class of a count display, next to the implicit `count` class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CountStyle {
    /// No modifier class.
    #[default]
    Plain,
    /// Waiting for the current cycle.
    Loading,
    /// Count above zero.
    Positive,
    /// Source failed.
    Error,
}

/// One of the two headline counters.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CountDisplay {
    pub text: String,
    pub style: CountStyle,
}

/// Style of a per-state card.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardStyle {
    /// Agents ready in this state.
    Available,
    /// No agents ready.
    Unavailable,
    /// The upstream reported an error for this state.
    Error,
}

/// A rendered per-state card.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateCard {
    pub state_code: String,
    /// Count text, or `"Err"` for error cards.
    pub count_text: String,
    /// Error detail, only set on error cards.
    pub tooltip: Option<String>,
    pub style: CardStyle,
}

/// Contents of the state list area.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StateListView {
    /// Loading placeholder.
    Loading,
    /// One card per state row, in snapshot order.
    Cards(Vec<StateCard>),
    /// The DH source failed or did not return an array.
    InvalidData,
    /// Full-error view with the cycle's failure message.
    Error(String),
}

impl Default for StateListView {
    fn default() -> Self {
        StateListView::Cards(Vec::new())
    }
}

/// The summary line under the state list.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SummaryView {
    pub text: String,
    pub highlight: bool,
}

/// Everything the terminal UI draws, apart from toasts.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct View {
    pub guardians: CountDisplay,
    pub platinum: CountDisplay,
    pub states: StateListView,
    pub summary: SummaryView,
    pub refreshing_message: String,
    pub last_updated: Option<String>,
    pub cycle_state: RefreshCycleState,
}

impl View {
    /// Plain-text rendering used by one-shot mode, one line per row.
    pub fn to_text(&self) -> String {
        let mut lines = vec![
            format!("GUARDIANS: {}", self.guardians.text),
            format!("PLATINUM:  {}", self.platinum.text),
            "DH Insurance:".to_string(),
        ];
        match &self.states {
            StateListView::Loading => lines.push(format!("  {}", LOADING_STATES_TEXT)),
            StateListView::InvalidData => lines.push(format!("  {}", INVALID_DATA_TEXT)),
            StateListView::Error(message) => {
                lines.push(format!("  Error loading data: {}", message))
            }
            StateListView::Cards(cards) => lines.extend(cards.iter().map(card_text)),
        }
        if !self.summary.text.is_empty() {
            lines.push(self.summary.text.clone());
        }
        if let Some(ts) = &self.last_updated {
            lines.push(ts.clone());
        }

        let mut out = String::new();
        for line in lines {
            out.push_str(&line);
            out.push('\n');
        }
        out
    }
}

fn card_text(card: &StateCard) -> String {
    match &card.tooltip {
        Some(detail) => format!("  {:<4} {} ({})", card.state_code, card.count_text, detail),
        None => format!("  {:<4} {}", card.state_code, card.count_text),
    }
}

/// Proof that a caller started a cycle; required to render its result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CycleTicket {
    generation: u64,
}

impl CycleTicket {
    /// Monotonic cycle number, starting at 1.
    pub fn generation(self) -> u64 {
        self.generation
    }
}

struct ViewState {
    view: View,
    generation: u64,
}

/// Shared handle to the view; clones render into the same view.
#[derive(Clone)]
pub struct RenderEngine {
    state: Arc<Mutex<ViewState>>,
    notifier: Notifier,
}

impl RenderEngine {
    pub fn new(notifier: Notifier) -> Self {
        Self {
            state: Arc::new(Mutex::new(ViewState {
                view: View::default(),
                generation: 0,
            })),
            notifier,
        }
    }

    pub fn notifier(&self) -> &Notifier {
        &self.notifier
    }

    /// Copy of the current view for drawing or inspection.
    pub fn view(&self) -> View {
        self.lock().view.clone()
    }

    /// True while no newer cycle has started since `ticket` was issued.
    pub fn is_current(&self, ticket: CycleTicket) -> bool {
        self.lock().generation == ticket.generation
    }

    /// Starts a new cycle: claims the next generation and shows the loading view.
    pub fn show_loading(&self) -> CycleTicket {
        let mut state = self.lock();
        state.generation += 1;
        let view = &mut state.view;

        view.refreshing_message = REFRESHING_MESSAGE.to_string();
        view.states = StateListView::Loading;
        view.guardians = loading_count();
        view.platinum = loading_count();
        view.summary = SummaryView::default();
        view.cycle_state = RefreshCycleState::Loading;

        CycleTicket {
            generation: state.generation,
        }
    }

    /// Rebuilds the view from `snapshot`. Returns false, leaving the view
    /// untouched, if a newer cycle has started.
    pub fn render(&self, ticket: CycleTicket, snapshot: &Snapshot) -> bool {
        let mut toasts = Vec::new();
        {
            let mut state = self.lock();
            if state.generation != ticket.generation {
                log::debug!(
                    "discarding render of cycle {} (current {})",
                    ticket.generation,
                    state.generation
                );
                return false;
            }
            let view = &mut state.view;

            view.guardians =
                count_display(snapshot.guardians_count, Endpoint::Guardians, &mut toasts);
            view.platinum = count_display(snapshot.platinum_count, Endpoint::Platinum, &mut toasts);

            match &snapshot.state_rows {
                StateRows::Rows(rows) => {
                    view.states = StateListView::Cards(rows.iter().map(state_card).collect());
                    view.summary = summary(snapshot.state_rows.available_states(), rows.len());
                }
                StateRows::SourceFailed => {
                    view.states = StateListView::InvalidData;
                    view.summary = SummaryView::default();
                }
            }

            view.last_updated = Some(timestamp());
            view.refreshing_message.clear();
            view.cycle_state = RefreshCycleState::Rendered;
        }

        for message in toasts {
            self.notifier.notify(message, NotificationKind::Success);
        }
        true
    }

    /// Replaces counts and state list with an error display carrying `message`.
    /// Returns false if a newer cycle has started.
    pub fn show_full_error(&self, ticket: CycleTicket, message: &str) -> bool {
        {
            let mut state = self.lock();
            if state.generation != ticket.generation {
                log::debug!("discarding error view of cycle {}", ticket.generation);
                return false;
            }
            let view = &mut state.view;
            let message = if message.is_empty() {
                "Unknown error occurred"
            } else {
                message
            };

            view.states = StateListView::Error(message.to_string());
            view.guardians = error_count();
            view.platinum = error_count();
            view.refreshing_message.clear();
            view.summary = SummaryView {
                text: UNABLE_TO_LOAD_TEXT.to_string(),
                highlight: false,
            };
            view.cycle_state = RefreshCycleState::Failed;
        }

        self.notifier.notify(REFRESH_FAILED_TOAST, NotificationKind::Error);
        true
    }

    fn lock(&self) -> MutexGuard<'_, ViewState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn loading_count() -> CountDisplay {
    CountDisplay {
        text: LOADING_TEXT.to_string(),
        style: CountStyle::Loading,
    }
}

fn error_count() -> CountDisplay {
    CountDisplay {
        text: ERROR_TEXT.to_string(),
        style: CountStyle::Error,
    }
}

fn count_display(
    reading: CountReading,
    source: Endpoint,
    toasts: &mut Vec<String>,
) -> CountDisplay {
    match reading {
        CountReading::ErrorMarker => error_count(),
        CountReading::Value(n) => {
            let text = format_count(n);
            if n > 0.0 {
                toasts.push(format!("{}: {} agents available!", source.label(), text));
                CountDisplay {
                    text,
                    style: CountStyle::Positive,
                }
            } else {
                CountDisplay {
                    text,
                    style: CountStyle::Plain,
                }
            }
        }
    }
}

fn state_card(row: &StateRow) -> StateCard {
    match (&row.error_detail, row.ready_count) {
        (Some(detail), _) => StateCard {
            state_code: row.state_code.clone(),
            count_text: ERROR_CARD_TEXT.to_string(),
            tooltip: Some(detail.clone()),
            style: CardStyle::Error,
        },
        (None, ready) => {
            let ready = ready.unwrap_or(0.0);
            StateCard {
                state_code: row.state_code.clone(),
                count_text: format_count(ready),
                tooltip: None,
                style: if ready > 0.0 {
                    CardStyle::Available
                } else {
                    CardStyle::Unavailable
                },
            }
        }
    }
}

fn summary(available_states: usize, total_states: usize) -> SummaryView {
    if available_states > 0 {
        SummaryView {
            text: format!(
                "\u{1F389} {} out of {} states have agents available!",
                available_states, total_states
            ),
            highlight: true,
        }
    } else {
        SummaryView {
            text: format!("No agents currently available across {} states", total_states),
            highlight: false,
        }
    }
}

fn timestamp() -> String {
    let now = Local::now();
    format!("Last updated: {}", now.format("%Y-%m-%d %H:%M:%S"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::StateRow;

    fn row(code: &str, ready: Option<f64>, error: Option<&str>) -> StateRow {
        StateRow {
            state_code: code.to_string(),
            ready_count: ready,
            error_detail: error.map(str::to_string),
        }
    }

    fn sample_snapshot() -> Snapshot {
        Snapshot {
            guardians_count: CountReading::Value(5.0),
            platinum_count: CountReading::Value(0.0),
            state_rows: StateRows::Rows(vec![
                row("CA", Some(3.0), None),
                row("TX", Some(0.0), None),
            ]),
        }
    }

    #[tokio::test]
    async fn loading_replaces_everything_with_placeholders() {
        let engine = RenderEngine::new(Notifier::new());
        let ticket = engine.show_loading();
        assert_eq!(ticket.generation(), 1);

        let view = engine.view();
        assert_eq!(view.guardians.text, "...");
        assert_eq!(view.guardians.style, CountStyle::Loading);
        assert_eq!(view.platinum.style, CountStyle::Loading);
        assert_eq!(view.states, StateListView::Loading);
        assert!(view.summary.text.is_empty());
        assert_eq!(view.refreshing_message, REFRESHING_MESSAGE);
        assert_eq!(view.cycle_state, RefreshCycleState::Loading);
    }

    #[tokio::test]
    async fn render_applies_counts_cards_and_summary() {
        let notifier = Notifier::new();
        let engine = RenderEngine::new(notifier.clone());
        let ticket = engine.show_loading();
        assert!(engine.render(ticket, &sample_snapshot()));

        let view = engine.view();
        assert_eq!(view.guardians.text, "5");
        assert_eq!(view.guardians.style, CountStyle::Positive);
        assert_eq!(view.platinum.text, "0");
        assert_eq!(view.platinum.style, CountStyle::Plain);

        match &view.states {
            StateListView::Cards(cards) => {
                assert_eq!(cards.len(), 2);
                assert_eq!(cards[0].state_code, "CA");
                assert_eq!(cards[0].style, CardStyle::Available);
                assert_eq!(cards[1].state_code, "TX");
                assert_eq!(cards[1].style, CardStyle::Unavailable);
            }
            other => panic!("expected cards, got {other:?}"),
        }
        assert_eq!(view.summary.text, "\u{1F389} 1 out of 2 states have agents available!");
        assert!(view.summary.highlight);
        assert!(view.refreshing_message.is_empty());
        assert_eq!(view.cycle_state, RefreshCycleState::Rendered);

        let toasts = notifier.active();
        assert_eq!(toasts.len(), 1);
        assert_eq!(toasts[0].message, "GUARDIANS: 5 agents available!");
        assert_eq!(toasts[0].kind, NotificationKind::Success);
    }

    #[tokio::test]
    async fn error_row_renders_error_card_with_tooltip() {
        let engine = RenderEngine::new(Notifier::new());
        let ticket = engine.show_loading();
        let snapshot = Snapshot {
            guardians_count: CountReading::Value(0.0),
            platinum_count: CountReading::Value(0.0),
            state_rows: StateRows::Rows(vec![row("NY", None, Some("timeout"))]),
        };
        engine.render(ticket, &snapshot);

        let view = engine.view();
        assert_eq!(
            view.states,
            StateListView::Cards(vec![StateCard {
                state_code: "NY".into(),
                count_text: "Err".into(),
                tooltip: Some("timeout".into()),
                style: CardStyle::Error,
            }])
        );
        assert_eq!(view.summary.text, "No agents currently available across 1 states");
        assert!(!view.summary.highlight);
    }

    #[tokio::test]
    async fn failed_sources_render_error_counts_and_invalid_data() {
        let notifier = Notifier::new();
        let engine = RenderEngine::new(notifier.clone());
        let ticket = engine.show_loading();
        let snapshot = Snapshot {
            guardians_count: CountReading::ErrorMarker,
            platinum_count: CountReading::ErrorMarker,
            state_rows: StateRows::SourceFailed,
        };
        engine.render(ticket, &snapshot);

        let view = engine.view();
        assert_eq!(view.guardians.text, "Error");
        assert_eq!(view.guardians.style, CountStyle::Error);
        assert_eq!(view.platinum.style, CountStyle::Error);
        assert_eq!(view.states, StateListView::InvalidData);
        assert!(view.summary.text.is_empty());
        assert!(view.last_updated.as_deref().is_some_and(|t| t.starts_with("Last updated: ")));
        assert!(notifier.active().is_empty());
    }

    #[tokio::test]
    async fn empty_array_is_zero_states_not_invalid() {
        let engine = RenderEngine::new(Notifier::new());
        let ticket = engine.show_loading();
        engine.render(
            ticket,
            &Snapshot {
                guardians_count: CountReading::Value(0.0),
                platinum_count: CountReading::Value(0.0),
                state_rows: StateRows::Rows(Vec::new()),
            },
        );
        let view = engine.view();
        assert_eq!(view.states, StateListView::Cards(Vec::new()));
        assert_eq!(view.summary.text, "No agents currently available across 0 states");
    }

    #[tokio::test]
    async fn full_error_view_and_toast() {
        let notifier = Notifier::new();
        let engine = RenderEngine::new(notifier.clone());
        let ticket = engine.show_loading();
        assert!(engine.show_full_error(ticket, "task panicked"));

        let view = engine.view();
        assert_eq!(view.states, StateListView::Error("task panicked".into()));
        assert_eq!(view.guardians.text, "Error");
        assert_eq!(view.platinum.style, CountStyle::Error);
        assert_eq!(view.summary.text, UNABLE_TO_LOAD_TEXT);
        assert_eq!(view.cycle_state, RefreshCycleState::Failed);

        let toasts = notifier.active();
        assert_eq!(toasts.len(), 1);
        assert_eq!(toasts[0].message, REFRESH_FAILED_TOAST);
        assert_eq!(toasts[0].kind, NotificationKind::Error);
    }

    #[tokio::test]
    async fn stale_ticket_is_discarded() {
        let notifier = Notifier::new();
        let engine = RenderEngine::new(notifier.clone());
        let old = engine.show_loading();
        let new = engine.show_loading();
        assert!(!engine.is_current(old));
        assert!(engine.is_current(new));

        assert!(!engine.render(old, &sample_snapshot()));
        assert!(!engine.show_full_error(old, "late"));
        let view = engine.view();
        assert_eq!(view.states, StateListView::Loading);
        assert_eq!(view.cycle_state, RefreshCycleState::Loading);
        assert!(notifier.active().is_empty());

        assert!(engine.render(new, &sample_snapshot()));
        assert_eq!(engine.view().cycle_state, RefreshCycleState::Rendered);
    }

    #[test]
    fn view_text_lists_cards_and_summary() {
        let view = View {
            guardians: CountDisplay {
                text: "5".into(),
                style: CountStyle::Positive,
            },
            platinum: CountDisplay {
                text: "Error".into(),
                style: CountStyle::Error,
            },
            states: StateListView::Cards(vec![StateCard {
                state_code: "NY".into(),
                count_text: "Err".into(),
                tooltip: Some("timeout".into()),
                style: CardStyle::Error,
            }]),
            summary: SummaryView {
                text: "No agents currently available across 1 states".into(),
                highlight: false,
            },
            refreshing_message: String::new(),
            last_updated: Some("Last updated: 2026-01-01 00:00:00".into()),
            cycle_state: RefreshCycleState::Rendered,
        };
        let text = view.to_text();
        assert!(text.contains("GUARDIANS: 5"));
        assert!(text.contains("PLATINUM:  Error"));
        assert!(text.contains("NY   Err (timeout)"));
        assert!(text.ends_with("Last updated: 2026-01-01 00:00:00\n"));
    }

    #[test]
    fn view_text_for_error_and_placeholder_lists() {
        let mut view = View {
            states: StateListView::Error("task panicked".into()),
            ..View::default()
        };
        assert_eq!(
            view.to_text(),
            "GUARDIANS: \nPLATINUM:  \nDH Insurance:\n  Error loading data: task panicked\n"
        );

        view.states = StateListView::InvalidData;
        assert!(view.to_text().ends_with("  Invalid data format\n"));

        view.states = StateListView::Loading;
        assert!(view.to_text().ends_with("  Loading agent data...\n"));
    }
}
