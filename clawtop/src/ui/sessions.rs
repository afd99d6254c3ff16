//! Sessions list (filtered) followed by the most recent subagent runs.

use chrono::{DateTime, Utc};
use clawtop_core::{Session, SubagentRun};
use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};

use crate::filters::SessionFilter;
use crate::ui::theme;
use crate::ui::util::{ago, model_short, pad};

pub const MAX_SUBAGENT_ROWS: usize = 6;

pub fn session_lines(
    sessions: &[Session],
    subagents: &[SubagentRun],
    filter: &SessionFilter,
    primary: Option<&str>,
    now: DateTime<Utc>,
) -> Vec<Line<'static>> {
    let mut lines = Vec::new();
    for s in sessions.iter().filter(|s| filter.allows(s, now, primary)) {
        let label = if s.label.is_empty() { &s.key } else { &s.label };
        lines.push(Line::from(vec![
            Span::raw(format!(
                "{}  {}  {}",
                pad(&s.key, 28),
                pad(label, 24),
                pad(model_short(&s.model), 16)
            )),
            Span::styled(format!("  {}", ago(Some(s.updated_at), now)), theme::dim()),
        ]));
    }
    if lines.is_empty() {
        lines.push(Line::styled("(no sessions match filters)", theme::dim()));
    }

    if !subagents.is_empty() {
        lines.push(Line::styled("subagents:", theme::dim()));
        for r in subagents.iter().take(MAX_SUBAGENT_ROWS) {
            let state = if r.finished_at.is_some() {
                "done"
            } else if r.started_at.is_some() {
                "running"
            } else {
                "queued"
            };
            lines.push(Line::from(vec![
                Span::raw(format!("{}  {:<8}", pad(&r.label, 20), state)),
                Span::styled(ago(Some(r.created_at), now), theme::dim()),
            ]));
        }
        if subagents.len() > MAX_SUBAGENT_ROWS {
            lines.push(Line::styled("…", theme::dim()));
        }
    }
    lines
}

pub fn draw_sessions(f: &mut ratatui::Frame<'_>, area: Rect, lines: Vec<Line<'static>>) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title("Sessions / Subagents");
    f.render_widget(Paragraph::new(lines).block(block), area);
}
