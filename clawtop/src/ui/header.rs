//! Top header: title, host, refresh cadence and status, plus the filter line.

use chrono::{DateTime, Utc};
use clawtop_core::readers::format_every;
use ratatui::{
    layout::Rect,
    style::{Color, Style},
    text::{Line, Span},
    widgets::Paragraph,
};
use std::time::Duration;

use crate::ui::theme;
use crate::ui::util::ago;

pub struct HeaderInfo<'a> {
    pub hostname: Option<&'a str>,
    pub refresh_every: Duration,
    pub last_update: Option<DateTime<Utc>>,
    pub refreshing: bool,
    pub error: Option<&'a str>,
    pub now: DateTime<Utc>,
}

pub fn header_line(h: &HeaderInfo<'_>) -> Line<'static> {
    let mut spans = vec![Span::styled("clawtop", theme::title())];
    if let Some(host) = h.hostname.filter(|s| !s.is_empty()) {
        spans.push(Span::raw(format!("  host: {host}")));
    }
    spans.push(Span::raw(format!(
        "  refresh={}  updated={}",
        format_every(h.refresh_every.as_millis() as i64),
        ago(h.last_update, h.now)
    )));
    if h.refreshing {
        spans.push(Span::styled("  ⟳", Style::default().fg(Color::Cyan)));
    }
    if h.last_update.is_none() {
        spans.push(Span::styled("  waiting for first refresh...", theme::dim()));
    }
    if let Some(e) = h.error {
        spans.push(Span::styled(
            format!("  err={e}"),
            Style::default().fg(theme::BAD),
        ));
    }
    Line::from(spans)
}

pub fn draw_header(f: &mut ratatui::Frame<'_>, area: Rect, h: &HeaderInfo<'_>) {
    f.render_widget(Paragraph::new(header_line(h)), area);
}

pub fn draw_filter_line(f: &mut ratatui::Frame<'_>, area: Rect, text: &str) {
    f.render_widget(Paragraph::new(Span::styled(text.to_string(), theme::dim())), area);
}
