//! Host panel: CPU / memory / load summary, memory gauge and CPU history sparkline.

use std::collections::VecDeque;

use clawtop_core::HostSnapshot;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    widgets::{Block, Borders, Gauge, Paragraph, Sparkline},
};

use crate::history::tail_window;
use crate::ui::theme;
use crate::ui::util::human;

pub fn host_summary(h: &HostSnapshot) -> String {
    format!(
        "CPU: {:5.1}%   Mem: {}/{}   Load: {:.2} {:.2} {:.2}",
        h.cpu_percent,
        human(h.mem_used_bytes),
        human(h.mem_total_bytes),
        h.load1,
        h.load5,
        h.load15
    )
}

pub fn draw_host(
    f: &mut ratatui::Frame<'_>,
    area: Rect,
    host: Option<&HostSnapshot>,
    cpu_hist: &VecDeque<u64>,
) {
    let block = Block::default().borders(Borders::ALL).title("Host");
    let inner = block.inner(area);
    f.render_widget(block, area);
    let Some(h) = host else { return };
    if inner.height == 0 {
        return;
    }

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Min(0),
        ])
        .split(inner);

    f.render_widget(
        Paragraph::new(host_summary(h)).style(Style::default().fg(theme::load(h.cpu_percent))),
        rows[0],
    );

    let pct = if h.mem_total_bytes > 0 {
        (h.mem_used_bytes as f64 / h.mem_total_bytes as f64 * 100.0).clamp(0.0, 100.0) as u16
    } else {
        0
    };
    let g = Gauge::default()
        .gauge_style(Style::default().fg(Color::Magenta))
        .percent(pct)
        .label(format!("mem {pct}%"));
    f.render_widget(g, rows[1]);

    let data = tail_window(cpu_hist, rows[2].width as usize);
    let spark = Sparkline::default()
        .data(&data)
        .max(100)
        .style(Style::default().fg(Color::Cyan));
    f.render_widget(spark, rows[2]);
}
