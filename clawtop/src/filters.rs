//! Display filters for the session list and the event timeline.
//!
//! `Filters` is a plain value; key presses map to a `FilterAction` and `reduce` returns the
//! next value. Nothing here touches the snapshot.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use clawtop_core::{Event, Level, Origin, Session};

pub const MAIN_SESSION_KEY: &str = "agent:main:main";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventFilter {
    pub error: bool,
    pub warn: bool,
    pub info: bool,
    pub debug: bool,
    pub cron: bool,
    pub subagent: bool,
    pub tool: bool,
}

impl Default for EventFilter {
    fn default() -> Self {
        Self {
            error: true,
            warn: true,
            info: true,
            debug: false,
            cron: true,
            subagent: true,
            tool: true,
        }
    }
}

impl EventFilter {
    pub fn level_enabled(&self, l: Level) -> bool {
        match l {
            Level::Error => self.error,
            Level::Warn => self.warn,
            Level::Info => self.info,
            Level::Debug => self.debug,
        }
    }

    pub fn origin_enabled(&self, o: Origin) -> bool {
        match o {
            Origin::Cron => self.cron,
            Origin::Subagent => self.subagent,
            Origin::Tool => self.tool,
        }
    }

    pub fn allows(&self, e: &Event) -> bool {
        self.level_enabled(e.level) && self.origin_enabled(e.origin)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SessionFilter {
    pub last_24h: bool,
    pub hide_runs: bool,
    pub primary_only: bool,
}

impl SessionFilter {
    /// `primary` of `None` (or empty) disables the model filter even when toggled on.
    pub fn allows(&self, s: &Session, now: DateTime<Utc>, primary: Option<&str>) -> bool {
        if self.last_24h && s.updated_at < now - Duration::hours(24) {
            return false;
        }
        if self.hide_runs && s.key.contains(":run:") {
            return false;
        }
        match primary.filter(|m| !m.is_empty()) {
            Some(m) if self.primary_only => s.model == m,
            _ => true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Filters {
    pub events: EventFilter,
    pub sessions: SessionFilter,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterAction {
    ToggleLevel(Level),
    ToggleOrigin(Origin),
    ToggleLast24h,
    ToggleHideRuns,
    TogglePrimaryOnly,
}

impl FilterAction {
    pub fn from_key(c: char) -> Option<Self> {
        Some(match c {
            '1' => FilterAction::ToggleLast24h,
            '2' => FilterAction::ToggleHideRuns,
            '3' => FilterAction::TogglePrimaryOnly,
            'e' => FilterAction::ToggleLevel(Level::Error),
            'w' => FilterAction::ToggleLevel(Level::Warn),
            'i' => FilterAction::ToggleLevel(Level::Info),
            'd' => FilterAction::ToggleLevel(Level::Debug),
            'c' => FilterAction::ToggleOrigin(Origin::Cron),
            's' => FilterAction::ToggleOrigin(Origin::Subagent),
            't' => FilterAction::ToggleOrigin(Origin::Tool),
            _ => return None,
        })
    }
}

pub fn reduce(f: Filters, action: FilterAction) -> Filters {
    let mut ev = f.events;
    let mut ss = f.sessions;
    match action {
        FilterAction::ToggleLevel(Level::Error) => ev.error = !ev.error,
        FilterAction::ToggleLevel(Level::Warn) => ev.warn = !ev.warn,
        FilterAction::ToggleLevel(Level::Info) => ev.info = !ev.info,
        FilterAction::ToggleLevel(Level::Debug) => ev.debug = !ev.debug,
        FilterAction::ToggleOrigin(Origin::Cron) => ev.cron = !ev.cron,
        FilterAction::ToggleOrigin(Origin::Subagent) => ev.subagent = !ev.subagent,
        FilterAction::ToggleOrigin(Origin::Tool) => ev.tool = !ev.tool,
        FilterAction::ToggleLast24h => ss.last_24h = !ss.last_24h,
        FilterAction::ToggleHideRuns => ss.hide_runs = !ss.hide_runs,
        FilterAction::TogglePrimaryOnly => ss.primary_only = !ss.primary_only,
    }
    Filters {
        events: ev,
        sessions: ss,
    }
}

/// Model of the main session, else the most common model (ties go to the smaller name).
pub fn guess_primary_model(sessions: &[Session]) -> Option<String> {
    if let Some(s) = sessions
        .iter()
        .find(|s| s.key == MAIN_SESSION_KEY && !s.model.is_empty())
    {
        return Some(s.model.clone());
    }
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for s in sessions.iter().filter(|s| !s.model.is_empty()) {
        *counts.entry(s.model.as_str()).or_default() += 1;
    }
    counts
        .into_iter()
        .max_by(|a, b| a.1.cmp(&b.1).then_with(|| b.0.cmp(a.0)))
        .map(|(m, _)| m.to_string())
}

fn on_off(b: bool) -> &'static str {
    if b {
        "on"
    } else {
        "off"
    }
}

/// One-line summary of every toggle, shown under the header.
pub fn describe(f: &Filters, primary: Option<&str>) -> String {
    let ev = &f.events;
    let ss = &f.sessions;
    // each toggle is shown under its key, which is the first letter of its name
    let toggle = |name: &str, on: bool| format!("{}:{}", &name[..1], on_off(on));
    let levels: Vec<String> = Level::ALL
        .iter()
        .map(|&l| toggle(l.as_str(), ev.level_enabled(l)))
        .collect();
    let origins: Vec<String> = Origin::ALL
        .iter()
        .map(|&o| toggle(o.as_str(), ev.origin_enabled(o)))
        .collect();
    format!(
        "[1]24h:{} [2]hide:run:{} [3]primary({}):{}  levels {}  src {}  r refresh  +/- rate  q quit",
        on_off(ss.last_24h),
        on_off(ss.hide_runs),
        primary.unwrap_or("-"),
        on_off(ss.primary_only),
        levels.join(" "),
        origins.join(" "),
    )
}
