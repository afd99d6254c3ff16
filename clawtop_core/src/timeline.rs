//! Merge cron results, tool results and subagent launches into one bounded timeline.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::readers::{cron_run_file, read_latest_cron_run, read_tool_events};
use crate::types::{CronJob, Event, Level, Origin, SubagentRun};

/// Upper bound on the merged event list.
pub const MAX_EVENTS: usize = 40;
/// Lines tailed from the active session log.
pub const SESSION_TAIL_LINES: usize = 400;
/// Tool results taken from the active session log.
pub const MAX_TOOL_EVENTS: usize = 25;
/// Character budget for a subagent task shown as event detail.
pub const SUBAGENT_DETAIL_CHARS: usize = 90;

/// Decides which session log counts as "current".
pub trait ActiveLogResolver {
    fn resolve_active_log(&self) -> Option<PathBuf>;
}

/// The most recently modified `*.jsonl` in a directory.
#[derive(Debug, Clone)]
pub struct NewestLogInDir {
    pub dir: PathBuf,
}

impl NewestLogInDir {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl ActiveLogResolver for NewestLogInDir {
    fn resolve_active_log(&self) -> Option<PathBuf> {
        let pattern = format!("{}/*.jsonl", glob::Pattern::escape(&self.dir.to_string_lossy()));
        let mut found: Vec<(SystemTime, PathBuf)> = glob::glob(&pattern)
            .map(|paths| paths.filter_map(Result::ok).collect::<Vec<_>>())
            .unwrap_or_default()
            .into_iter()
            .filter_map(|p| {
                let modified = fs::metadata(&p).and_then(|m| m.modified()).ok()?;
                Some((modified, p))
            })
            .collect();
        // newest mtime first, then path descending
        found.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| b.1.cmp(&a.1)));
        found.into_iter().next().map(|(_, p)| p)
    }
}

/// A log chosen up front (or none at all).
#[derive(Debug, Clone, Default)]
pub struct FixedLog(pub Option<PathBuf>);

impl ActiveLogResolver for FixedLog {
    fn resolve_active_log(&self) -> Option<PathBuf> {
        self.0.clone()
    }
}

/// Collapse newlines and cap to `n` characters, marking a cut with `…`.
pub fn truncate_chars(s: &str, n: usize) -> String {
    let s = s.replace('\n', " ");
    let s = s.trim();
    if s.chars().count() <= n {
        return s.to_string();
    }
    let mut out: String = s.chars().take(n.saturating_sub(1)).collect();
    out.push('…');
    out
}

/// Sort newest first and keep at most [`MAX_EVENTS`]. Equal timestamps keep input order.
pub fn merge_events(mut events: Vec<Event>) -> Vec<Event> {
    events.sort_by(|a, b| b.at.cmp(&a.at));
    events.truncate(MAX_EVENTS);
    events
}

/// Latest finished run of every job that has a run log.
pub fn cron_events(cron_runs_dir: &Path, jobs: &[CronJob]) -> Vec<Event> {
    if !cron_runs_dir.is_dir() {
        return Vec::new();
    }
    let mut out = Vec::new();
    for job in jobs {
        let path = cron_run_file(cron_runs_dir, &job.id);
        if !path.exists() {
            continue;
        }
        match read_latest_cron_run(&path) {
            Ok(Some(mut ev)) => {
                ev.title = format!("cron: {}", job.name);
                out.push(ev);
            }
            Ok(None) => {}
            Err(e) => debug!("skipping cron run log: {e}"),
        }
    }
    out
}

/// Tool results from whatever log the resolver picks.
pub fn tool_events(resolver: &dyn ActiveLogResolver, now: DateTime<Utc>) -> Vec<Event> {
    let Some(path) = resolver.resolve_active_log() else {
        return Vec::new();
    };
    match read_tool_events(&path, SESSION_TAIL_LINES, MAX_TOOL_EVENTS, now) {
        Ok(v) => v,
        Err(e) => {
            debug!("skipping session log: {e}");
            Vec::new()
        }
    }
}

/// One launch event per subagent run.
pub fn subagent_events(runs: &[SubagentRun]) -> Vec<Event> {
    runs.iter()
        .map(|r| Event {
            at: r.created_at,
            level: Level::Info,
            origin: Origin::Subagent,
            title: format!("subagent: {}", r.label),
            detail: truncate_chars(&r.task, SUBAGENT_DETAIL_CHARS),
        })
        .collect()
}

/// Inputs for one timeline build.
pub struct TimelineSources<'a> {
    pub cron_runs_dir: &'a Path,
    pub jobs: &'a [CronJob],
    pub subagents: &'a [SubagentRun],
    pub active_log: &'a dyn ActiveLogResolver,
}

pub fn build_timeline(src: &TimelineSources<'_>, now: DateTime<Utc>) -> Vec<Event> {
    let mut events = cron_events(src.cron_runs_dir, src.jobs);
    events.extend(tool_events(src.active_log, now));
    events.extend(subagent_events(src.subagents));
    merge_events(events)
}
