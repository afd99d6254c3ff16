//! Shared UI theme constants.

use clawtop_core::Level;
use ratatui::style::{Color, Modifier, Style};

pub const DIM: Color = Color::DarkGray;
pub const OK: Color = Color::Green;
pub const BAD: Color = Color::Red;
pub const WARN: Color = Color::Yellow;

pub fn title() -> Style {
    Style::default().add_modifier(Modifier::BOLD)
}

pub fn dim() -> Style {
    Style::default().fg(DIM)
}

pub fn level(l: Level) -> Style {
    match l {
        Level::Error => Style::default().fg(BAD),
        Level::Warn => Style::default().fg(WARN),
        Level::Info => Style::default().fg(OK),
        Level::Debug => dim(),
    }
}

/// Colour for a cron job's last status.
pub fn status(s: &str) -> Style {
    match s {
        "ok" => Style::default().fg(OK),
        "error" => Style::default().fg(BAD),
        _ => dim(),
    }
}

/// Same green/yellow/red bands the CPU bars use.
pub fn load(pct: f64) -> Color {
    match pct {
        x if x < 25.0 => Color::Green,
        x if x < 60.0 => Color::Yellow,
        _ => Color::Red,
    }
}
