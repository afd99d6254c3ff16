//! Token usage: latest cumulative total and cost, with a sparkline of recent samples.

use clawtop_core::TokenSample;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    widgets::{Block, Borders, Paragraph, Sparkline},
};

use crate::history::token_series;
use crate::ui::theme;

pub fn draw_tokens(f: &mut ratatui::Frame<'_>, area: Rect, samples: &[TokenSample]) {
    let block = Block::default().borders(Borders::ALL).title("Tokens");
    let inner = block.inner(area);
    f.render_widget(block, area);
    if inner.height == 0 {
        return;
    }

    let Some(last) = samples.last() else {
        f.render_widget(Paragraph::new("(no tokens.jsonl)").style(theme::dim()), inner);
        return;
    };

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Min(0)])
        .split(inner);
    f.render_widget(
        Paragraph::new(format!(
            "OpenClaw total: {}   cost: ${:.2}",
            last.total_tokens, last.cost_usd
        )),
        rows[0],
    );

    let series = token_series(samples);
    let start = series.len().saturating_sub(rows[1].width as usize);
    let spark = Sparkline::default()
        .data(&series[start..])
        .style(Style::default().fg(Color::Green));
    f.render_widget(spark, rows[1]);
}
