//! Normalized entities built from OpenClaw state files and host counters.
//! Every refresh produces a fresh set; nothing here is mutated after construction.

use chrono::{DateTime, TimeZone, Utc};
use serde::Serialize;
use std::fmt;

/// Convert a millisecond epoch value into a UTC timestamp.
/// Out-of-range values clamp to the epoch instead of panicking.
pub fn from_millis(ms: i64) -> DateTime<Utc> {
    Utc.timestamp_millis_opt(ms)
        .single()
        .unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
}

/// Cumulative CPU time-in-state counters from the first `cpu` line of /proc/stat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct CounterSample {
    pub user: u64,
    pub nice: u64,
    pub system: u64,
    pub idle: u64,
    pub iowait: u64,
    pub irq: u64,
    pub softirq: u64,
    pub steal: u64,
}

impl CounterSample {
    pub fn idle_total(&self) -> u64 {
        self.idle.saturating_add(self.iowait)
    }

    pub fn busy_total(&self) -> u64 {
        self.user
            .saturating_add(self.nice)
            .saturating_add(self.system)
            .saturating_add(self.irq)
            .saturating_add(self.softirq)
            .saturating_add(self.steal)
    }

    pub fn total(&self) -> u64 {
        self.idle_total().saturating_add(self.busy_total())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HostSnapshot {
    pub at: DateTime<Utc>,
    pub hostname: String,
    pub cpu_percent: f64,
    pub mem_used_bytes: u64,
    pub mem_total_bytes: u64,
    pub load1: f64,
    pub load5: f64,
    pub load15: f64,
}

impl HostSnapshot {
    pub fn empty(at: DateTime<Utc>) -> Self {
        Self {
            at,
            hostname: String::new(),
            cpu_percent: 0.0,
            mem_used_bytes: 0,
            mem_total_bytes: 0,
            load1: 0.0,
            load5: 0.0,
            load15: 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Session {
    pub key: String,
    pub label: String,
    pub model: String,
    pub provider: String,
    pub updated_at: DateTime<Utc>,
    pub input_tokens: i64,
    pub output_tokens: i64,
    pub total_tokens: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubagentRun {
    pub run_id: String,
    pub child_session_key: String,
    pub label: String,
    pub task: String,
    pub model: String,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CronJob {
    pub id: String,
    pub name: String,
    pub enabled: bool,
    /// Human-readable schedule, e.g. `*/5 * * * *`, `at 09:00`, `every 1h0m0s`.
    pub schedule: String,
    pub tz: String,
    pub next_run: Option<DateTime<Utc>>,
    pub last_run: Option<DateTime<Utc>>,
    pub last_status: String,
    pub last_error: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Error,
    Warn,
    Info,
    Debug,
}

impl Level {
    pub const ALL: [Level; 4] = [Level::Error, Level::Warn, Level::Info, Level::Debug];

    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Error => "error",
            Level::Warn => "warn",
            Level::Info => "info",
            Level::Debug => "debug",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Origin {
    Cron,
    Subagent,
    Tool,
}

impl Origin {
    pub const ALL: [Origin; 3] = [Origin::Cron, Origin::Subagent, Origin::Tool];

    pub fn as_str(&self) -> &'static str {
        match self {
            Origin::Cron => "cron",
            Origin::Subagent => "subagent",
            Origin::Tool => "tool",
        }
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One normalized timeline entry. `detail` never contains a newline.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Event {
    pub at: DateTime<Utc>,
    pub level: Level,
    pub origin: Origin,
    pub title: String,
    pub detail: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TokenSample {
    pub at: DateTime<Utc>,
    pub total_tokens: i64,
    pub cost_usd: f64,
}

/// Everything one refresh cycle produced. Published whole, never patched.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    pub taken_at: DateTime<Utc>,
    pub host: HostSnapshot,
    pub sessions: Vec<Session>,
    pub subagents: Vec<SubagentRun>,
    pub crons: Vec<CronJob>,
    pub events: Vec<Event>,
    pub token_samples: Vec<TokenSample>,
}
