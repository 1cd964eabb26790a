//! # Module: Dashboard Rendering
//!
//! Draws a `View` and the active toasts into a ratatui frame. Drawing is a
//! pure function of its inputs; all state lives in the render engine and the
//! notifier.

use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};
use ratatui::Frame;

use crate::notifier::{NotificationKind, Toast, ToastPhase};
use crate::render::{
    CardStyle, CountDisplay, CountStyle, StateCard, StateListView, View, INVALID_DATA_TEXT,
    LOADING_STATES_TEXT,
};

/// Minimum terminal width for the full layout.
pub const MIN_COLS: u16 = 40;

/// Minimum terminal height for the full layout.
pub const MIN_ROWS: u16 = 14;

/// Width reserved for one state card, borders included.
const CARD_WIDTH: u16 = 12;

const TOAST_HEIGHT: u16 = 3;

/// Renders the whole dashboard.
pub fn draw(f: &mut Frame, view: &View, toasts: &[Toast], auto_refresh: bool) {
    let size = f.area();

    if size.width < MIN_COLS || size.height < MIN_ROWS {
        draw_too_small(f, size);
        return;
    }

    let outer_block = Block::default()
        .title(Span::styled(
            " Agent Availability ",
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));
    let inner = outer_block.inner(size);
    f.render_widget(outer_block, size);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(4),
            Constraint::Length(3),
            Constraint::Length(1),
        ])
        .split(inner);

    let counts = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(rows[0]);
    draw_count(f, counts[0], "GUARDIANS", &view.guardians);
    draw_count(f, counts[1], "PLATINUM", &view.platinum);

    draw_states(f, rows[1], &view.states);
    draw_summary(f, rows[2], view);
    draw_footer(f, rows[3], view, auto_refresh);
    draw_toasts(f, size, toasts);
}

fn count_style(style: CountStyle) -> Style {
    match style {
        CountStyle::Plain => Style::default().fg(Color::White),
        CountStyle::Loading => Style::default().fg(Color::DarkGray),
        CountStyle::Positive => Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
        CountStyle::Error => Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
    }
}

fn draw_count(f: &mut Frame, area: Rect, title: &str, count: &CountDisplay) {
    let block = Block::default()
        .title(format!(" {} ", title))
        .borders(Borders::ALL);
    let text = Span::styled(count.text.clone(), count_style(count.style));
    let paragraph = Paragraph::new(Line::from(text))
        .alignment(Alignment::Center)
        .block(block);
    f.render_widget(paragraph, area);
}

fn card_span(card: &StateCard) -> Span<'static> {
    let style = match card.style {
        CardStyle::Available => Style::default().fg(Color::Black).bg(Color::Green),
        CardStyle::Unavailable => Style::default().fg(Color::White).bg(Color::DarkGray),
        CardStyle::Error => Style::default().fg(Color::White).bg(Color::Red),
    };
    let label = format!(" {} {} ", card.state_code, card.count_text);
    let width = usize::from(CARD_WIDTH - 1);
    Span::styled(format!("{:<width$}", label, width = width), style)
}

/// Lines for the card grid followed by the error details that a browser
/// would show as tooltips.
pub fn state_lines(states: &StateListView, width: u16) -> Vec<Line<'static>> {
    match states {
        StateListView::Loading => vec![Line::from(Span::styled(
            LOADING_STATES_TEXT,
            Style::default().fg(Color::DarkGray),
        ))],
        StateListView::InvalidData => vec![Line::from(Span::styled(
            INVALID_DATA_TEXT,
            Style::default().fg(Color::Red),
        ))],
        StateListView::Error(message) => vec![Line::from(Span::styled(
            format!("Error loading data: {}", message),
            Style::default().fg(Color::Red),
        ))],
        StateListView::Cards(cards) => {
            let per_row = usize::from((width / CARD_WIDTH).max(1));
            let mut lines: Vec<Line<'static>> = cards
                .chunks(per_row)
                .map(|chunk| {
                    let mut spans = Vec::with_capacity(chunk.len() * 2);
                    for card in chunk {
                        spans.push(card_span(card));
                        spans.push(Span::raw(" "));
                    }
                    Line::from(spans)
                })
                .collect();

            let details: Vec<Line<'static>> = cards
                .iter()
                .filter_map(|card| {
                    card.tooltip.as_ref().map(|detail| {
                        Line::from(Span::styled(
                            format!("{}: {}", card.state_code, detail),
                            Style::default().fg(Color::Red),
                        ))
                    })
                })
                .collect();
            if !details.is_empty() {
                lines.push(Line::raw(""));
                lines.extend(details);
            }
            lines
        }
    }
}

fn draw_states(f: &mut Frame, area: Rect, states: &StateListView) {
    let block = Block::default().title(" DH Insurance ").borders(Borders::ALL);
    let inner_width = block.inner(area).width;
    let paragraph = Paragraph::new(state_lines(states, inner_width))
        .block(block)
        .wrap(Wrap { trim: false });
    f.render_widget(paragraph, area);
}

fn draw_summary(f: &mut Frame, area: Rect, view: &View) {
    let style = if view.summary.highlight {
        Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::Gray)
    };
    let paragraph = Paragraph::new(Line::from(Span::styled(view.summary.text.clone(), style)))
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::TOP));
    f.render_widget(paragraph, area);
}

fn draw_footer(f: &mut Frame, area: Rect, view: &View, auto_refresh: bool) {
    let mut spans = vec![Span::styled(
        view.last_updated.clone().unwrap_or_else(|| "Not updated yet".to_string()),
        Style::default().fg(Color::Gray),
    )];
    if !view.refreshing_message.is_empty() {
        spans.push(Span::raw("  "));
        spans.push(Span::styled(
            view.refreshing_message.clone(),
            Style::default().fg(Color::Yellow),
        ));
    }
    spans.push(Span::raw("  "));
    spans.push(if auto_refresh {
        Span::styled("AUTO ON", Style::default().fg(Color::Green))
    } else {
        Span::styled("AUTO OFF", Style::default().fg(Color::DarkGray))
    });
    spans.push(Span::styled(
        "  [r]efresh  [a]uto  [q]uit",
        Style::default().fg(Color::DarkGray),
    ));
    f.render_widget(Paragraph::new(Line::from(spans)), area);
}

/// Stacks toasts in the top-right corner, oldest first.
fn draw_toasts(f: &mut Frame, area: Rect, toasts: &[Toast]) {
    let mut y = area.y + 1;
    for toast in toasts {
        if y + TOAST_HEIGHT > area.bottom() {
            break;
        }
        let wanted = toast.message.chars().count() as u16 + 4;
        let width = wanted.clamp(20, area.width.saturating_sub(2));
        let rect = Rect::new(area.right().saturating_sub(width + 1), y, width, TOAST_HEIGHT);

        let color = match toast.kind {
            NotificationKind::Error => Color::Red,
            NotificationKind::Success | NotificationKind::Info => Color::Green,
        };
        let mut style = Style::default().fg(color);
        if toast.phase != ToastPhase::Visible {
            style = style.add_modifier(Modifier::DIM);
        }

        f.render_widget(Clear, rect);
        f.render_widget(
            Paragraph::new(Line::from(Span::styled(toast.message.clone(), style)))
                .alignment(Alignment::Center)
                .block(Block::default().borders(Borders::ALL).border_style(style)),
            rect,
        );
        y += TOAST_HEIGHT;
    }
}

fn draw_too_small(f: &mut Frame, area: Rect) {
    let msg = format!(
        "Terminal too small ({}x{}), need {}x{}",
        area.width, area.height, MIN_COLS, MIN_ROWS
    );
    let paragraph = Paragraph::new(msg)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .style(Style::default().fg(Color::Yellow));
    f.render_widget(paragraph, area);
}
