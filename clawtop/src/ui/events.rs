//! Latest events timeline, filtered by level and origin.

use chrono::Local;
use clawtop_core::Event;
use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};

use crate::filters::EventFilter;
use crate::ui::theme;
use crate::ui::util::truncate;

const MESSAGE_CHARS: usize = 80;

pub fn event_lines(events: &[Event], filter: &EventFilter, max_rows: usize) -> Vec<Line<'static>> {
    let shown: Vec<&Event> = events.iter().filter(|e| filter.allows(e)).collect();
    if shown.is_empty() {
        return vec![Line::styled("(no events match filters)", theme::dim())];
    }
    let mut lines = Vec::with_capacity(shown.len().min(max_rows));
    for (i, e) in shown.iter().enumerate() {
        if i + 1 >= max_rows && shown.len() > max_rows {
            lines.push(Line::styled("…", theme::dim()));
            break;
        }
        let msg = if e.detail.is_empty() {
            e.title.clone()
        } else {
            format!("{}: {}", e.title, e.detail)
        };
        lines.push(Line::from(vec![
            Span::styled(
                e.at.with_timezone(&Local).format("%H:%M:%S ").to_string(),
                theme::dim(),
            ),
            Span::styled(format!("{:<5} ", e.level.as_str()), theme::level(e.level)),
            Span::styled(format!("{:<8} ", e.origin.as_str()), theme::dim()),
            Span::raw(truncate(&msg, MESSAGE_CHARS)),
        ]));
    }
    lines
}

pub fn draw_events(f: &mut ratatui::Frame<'_>, area: Rect, events: &[Event], filter: &EventFilter) {
    let block = Block::default().borders(Borders::ALL).title("Latest events");
    let rows = area.height.saturating_sub(2) as usize;
    let lines = event_lines(events, filter, rows.max(1));
    f.render_widget(Paragraph::new(lines).block(block), area);
}
