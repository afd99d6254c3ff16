//! Cron jobs: enabled flag, schedule, next/last run and last error.

use chrono::{DateTime, Utc};
use clawtop_core::CronJob;
use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};

use crate::ui::theme;
use crate::ui::util::{ago, pad, truncate, until};

pub const MAX_CRON_ROWS: usize = 12;

/// Rows the panel wants, borders included.
pub fn crons_height(jobs: &[CronJob]) -> u16 {
    let body = jobs.len().min(MAX_CRON_ROWS) + usize::from(jobs.len() > MAX_CRON_ROWS);
    body.max(1) as u16 + 2
}

pub fn cron_lines(jobs: &[CronJob], now: DateTime<Utc>) -> Vec<Line<'static>> {
    if jobs.is_empty() {
        return vec![Line::styled("(no jobs.json)", theme::dim())];
    }
    let mut lines = Vec::new();
    for j in jobs.iter().take(MAX_CRON_ROWS) {
        let enabled = if j.enabled { "on " } else { "off" };
        let next = j.next_run.map(|t| until(t, now)).unwrap_or_else(|| "-".into());
        let err = if j.last_error.is_empty() {
            "-".to_string()
        } else {
            truncate(&j.last_error, 40)
        };
        lines.push(Line::from(vec![
            Span::raw(pad(&j.name, 20)),
            Span::styled(format!(" {enabled} "), theme::dim()),
            Span::styled(format!("{} ", pad(&j.schedule, 14)), theme::dim()),
            Span::raw(format!("next:{next} last:{} ", ago(j.last_run, now))),
            Span::styled(format!("err:{err}"), theme::status(&j.last_status)),
        ]));
    }
    if jobs.len() > MAX_CRON_ROWS {
        lines.push(Line::styled("…", theme::dim()));
    }
    lines
}

pub fn draw_crons(f: &mut ratatui::Frame<'_>, area: Rect, jobs: &[CronJob], now: DateTime<Utc>) {
    let block = Block::default().borders(Borders::ALL).title("Crons");
    f.render_widget(Paragraph::new(cron_lines(jobs, now)).block(block), area);
}
