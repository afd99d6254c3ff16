//! Decoders for the OpenClaw state files.
//!
//! Whole-document files (sessions.json, runs.json, jobs.json) fail as a unit; JSON-Lines
//! files skip malformed lines one at a time. Each `read_*` has a pure `parse_*`/`decode_*`
//! counterpart working on text or lines so the rules can be exercised without a filesystem.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use tracing::trace;

use crate::error::{Error, Result};
use crate::tail::tail_lines;
use crate::types::{from_millis, CronJob, Event, Level, Origin, Session, SubagentRun, TokenSample};

/// Lines tailed from a cron run log when looking for the latest finished run.
pub const CRON_RUN_TAIL_LINES: usize = 200;

fn read_file(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|e| Error::io(path, e))
}

/// Explicit `null` decodes like an absent field: the type's zero value.
fn null_as_default<'de, D, T>(d: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(d).map(Option::unwrap_or_default)
}

/// Decode one JSON-Lines record; blank and malformed lines yield `None`.
fn decode_line<T: DeserializeOwned>(line: &str) -> Option<T> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    match serde_json::from_str(line) {
        Ok(v) => Some(v),
        Err(e) => {
            trace!("skipping malformed record: {e}");
            None
        }
    }
}

/// First line of `s`, trimmed. Handles CRLF text.
pub fn first_line(s: &str) -> String {
    let s = s.replace("\r\n", "\n");
    match s.find('\n') {
        Some(idx) => s[..idx].trim().to_string(),
        None => s.trim().to_string(),
    }
}

// ---------- sessions.json ----------

#[derive(Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
struct RawSession {
    #[serde(deserialize_with = "null_as_default")]
    label: String,
    #[serde(deserialize_with = "null_as_default")]
    model: String,
    #[serde(deserialize_with = "null_as_default")]
    model_provider: String,
    #[serde(deserialize_with = "null_as_default")]
    updated_at: i64,
    #[serde(deserialize_with = "null_as_default")]
    input_tokens: i64,
    #[serde(deserialize_with = "null_as_default")]
    output_tokens: i64,
    #[serde(deserialize_with = "null_as_default")]
    total_tokens: i64,
}

/// Decode a session registry: `{ sessionKey: state }`, newest first.
pub fn parse_sessions(text: &str) -> serde_json::Result<Vec<Session>> {
    let raw: HashMap<String, Option<RawSession>> = serde_json::from_str(text)?;
    let mut out: Vec<Session> = raw
        .into_iter()
        .map(|(key, v)| (key, v.unwrap_or_default()))
        .map(|(key, v)| Session {
            key,
            label: v.label,
            model: v.model,
            provider: v.model_provider,
            updated_at: from_millis(v.updated_at),
            input_tokens: v.input_tokens,
            output_tokens: v.output_tokens,
            total_tokens: v.total_tokens,
        })
        .collect();
    // key as secondary order keeps HashMap iteration order out of the result
    out.sort_by(|a, b| b.updated_at.cmp(&a.updated_at).then_with(|| a.key.cmp(&b.key)));
    Ok(out)
}

pub fn read_sessions(path: &Path) -> Result<Vec<Session>> {
    let text = read_file(path)?;
    parse_sessions(&text).map_err(|e| Error::parse(path, e))
}

// ---------- subagents/runs.json ----------

#[derive(Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
struct RawRun {
    #[serde(deserialize_with = "null_as_default")]
    run_id: String,
    #[serde(deserialize_with = "null_as_default")]
    child_session_key: String,
    #[serde(deserialize_with = "null_as_default")]
    label: String,
    #[serde(deserialize_with = "null_as_default")]
    task: String,
    #[serde(deserialize_with = "null_as_default")]
    model: String,
    #[serde(deserialize_with = "null_as_default")]
    created_at: i64,
    started_at: Option<i64>,
    finished_at: Option<i64>,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct RawRuns {
    #[serde(deserialize_with = "null_as_default")]
    runs: HashMap<String, Option<RawRun>>,
}

pub fn parse_subagent_runs(text: &str) -> serde_json::Result<Vec<SubagentRun>> {
    let raw: RawRuns = serde_json::from_str(text)?;
    let mut out: Vec<SubagentRun> = raw
        .runs
        .into_values()
        .map(Option::unwrap_or_default)
        .map(|r| SubagentRun {
            run_id: r.run_id,
            child_session_key: r.child_session_key,
            label: r.label,
            task: r.task,
            model: r.model,
            created_at: from_millis(r.created_at),
            started_at: r.started_at.map(from_millis),
            finished_at: r.finished_at.map(from_millis),
        })
        .collect();
    out.sort_by(|a, b| {
        b.created_at
            .cmp(&a.created_at)
            .then_with(|| a.run_id.cmp(&b.run_id))
    });
    Ok(out)
}

pub fn read_subagent_runs(path: &Path) -> Result<Vec<SubagentRun>> {
    let text = read_file(path)?;
    parse_subagent_runs(&text).map_err(|e| Error::parse(path, e))
}

// ---------- cron/jobs.json ----------

#[derive(Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
struct RawSchedule {
    #[serde(deserialize_with = "null_as_default")]
    kind: String,
    #[serde(deserialize_with = "null_as_default")]
    expr: String,
    #[serde(deserialize_with = "null_as_default")]
    tz: String,
    #[serde(deserialize_with = "null_as_default")]
    at: String,
    #[serde(deserialize_with = "null_as_default")]
    every_ms: i64,
}

#[derive(Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
struct RawJobState {
    #[serde(deserialize_with = "null_as_default")]
    next_run_at_ms: i64,
    #[serde(deserialize_with = "null_as_default")]
    last_run_at_ms: i64,
    #[serde(deserialize_with = "null_as_default")]
    last_status: String,
    #[serde(deserialize_with = "null_as_default")]
    last_error: String,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct RawJob {
    #[serde(deserialize_with = "null_as_default")]
    id: String,
    #[serde(deserialize_with = "null_as_default")]
    name: String,
    #[serde(deserialize_with = "null_as_default")]
    enabled: bool,
    #[serde(deserialize_with = "null_as_default")]
    schedule: RawSchedule,
    #[serde(deserialize_with = "null_as_default")]
    state: RawJobState,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct RawJobs {
    #[serde(deserialize_with = "null_as_default")]
    jobs: Vec<RawJob>,
}

/// Format a millisecond interval the way durations print elsewhere in OpenClaw:
/// `500ms`, `45s`, `1.5s`, `1m30s`, `1h0m0s`.
pub fn format_every(ms: i64) -> String {
    if ms == 0 {
        return "0s".into();
    }
    let sign = if ms < 0 { "-" } else { "" };
    let ms = ms.unsigned_abs();
    if ms < 1000 {
        return format!("{sign}{ms}ms");
    }
    let hours = ms / 3_600_000;
    let mins = (ms / 60_000) % 60;
    let secs_ms = ms % 60_000;
    let secs = if secs_ms % 1000 == 0 {
        format!("{}", secs_ms / 1000)
    } else {
        let frac = format!("{:03}", secs_ms % 1000);
        format!("{}.{}", secs_ms / 1000, frac.trim_end_matches('0'))
    };
    if hours > 0 {
        format!("{sign}{hours}h{mins}m{secs}s")
    } else if mins > 0 {
        format!("{sign}{mins}m{secs}s")
    } else {
        format!("{sign}{secs}s")
    }
}

fn describe_schedule(s: &RawSchedule) -> String {
    match s.kind.as_str() {
        "cron" => s.expr.clone(),
        "at" => format!("at {}", s.at),
        "every" => format!("every {}", format_every(s.every_ms)),
        other => other.to_string(),
    }
}

fn nonzero_millis(ms: i64) -> Option<DateTime<Utc>> {
    (ms != 0).then(|| from_millis(ms))
}

/// Ascending by next run; jobs without one go last. Stable for equal keys.
fn cmp_next_run(a: &CronJob, b: &CronJob) -> Ordering {
    match (a.next_run, b.next_run) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

pub fn parse_cron_jobs(text: &str) -> serde_json::Result<Vec<CronJob>> {
    let raw: RawJobs = serde_json::from_str(text)?;
    let mut out: Vec<CronJob> = raw
        .jobs
        .into_iter()
        .map(|j| CronJob {
            schedule: describe_schedule(&j.schedule),
            id: j.id,
            name: j.name,
            enabled: j.enabled,
            tz: j.schedule.tz,
            next_run: nonzero_millis(j.state.next_run_at_ms),
            last_run: nonzero_millis(j.state.last_run_at_ms),
            last_status: j.state.last_status,
            last_error: j.state.last_error,
        })
        .collect();
    out.sort_by(cmp_next_run);
    Ok(out)
}

pub fn read_cron_jobs(path: &Path) -> Result<Vec<CronJob>> {
    let text = read_file(path)?;
    parse_cron_jobs(&text).map_err(|e| Error::parse(path, e))
}

// ---------- cron/runs/<job>.jsonl ----------

#[derive(Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
struct RawCronRun {
    #[serde(deserialize_with = "null_as_default")]
    ts: i64,
    #[serde(deserialize_with = "null_as_default")]
    action: String,
    #[serde(deserialize_with = "null_as_default")]
    status: String,
    #[serde(deserialize_with = "null_as_default")]
    error: String,
    #[serde(deserialize_with = "null_as_default")]
    summary: String,
    #[serde(deserialize_with = "null_as_default")]
    job_id: String,
}

/// Location of the run log for `job_id`. One file per job id.
pub fn cron_run_file(cron_runs_dir: &Path, job_id: &str) -> PathBuf {
    cron_runs_dir.join(format!("{job_id}.jsonl"))
}

/// The newest `finished` record among `lines` (oldest first), if any.
pub fn latest_cron_run(lines: &[String]) -> Option<Event> {
    lines
        .iter()
        .rev()
        .filter_map(|l| decode_line::<RawCronRun>(l))
        .find(|rec| rec.action == "finished")
        .map(|rec| {
            let level = if rec.status == "error" {
                Level::Error
            } else {
                Level::Info
            };
            let detail = if rec.error.is_empty() {
                first_line(&rec.summary)
            } else {
                first_line(&rec.error)
            };
            Event {
                at: from_millis(rec.ts),
                level,
                origin: Origin::Cron,
                title: rec.job_id,
                detail,
            }
        })
}

/// `Ok(None)` means the tailed window holds no finished run.
pub fn read_latest_cron_run(path: &Path) -> Result<Option<Event>> {
    let lines = tail_lines(path, CRON_RUN_TAIL_LINES)?;
    Ok(latest_cron_run(&lines))
}

// ---------- agents/main/sessions/<id>.jsonl ----------

#[derive(Deserialize, Default)]
#[serde(default)]
struct RawContent {
    #[serde(deserialize_with = "null_as_default")]
    text: String,
}

#[derive(Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
struct RawMessage {
    #[serde(deserialize_with = "null_as_default")]
    role: String,
    #[serde(deserialize_with = "null_as_default")]
    tool_name: String,
    #[serde(deserialize_with = "null_as_default")]
    is_error: bool,
    #[serde(deserialize_with = "null_as_default")]
    timestamp: i64,
    #[serde(deserialize_with = "null_as_default")]
    content: Vec<RawContent>,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct RawSessionLine {
    #[serde(rename = "type")]
    #[serde(deserialize_with = "null_as_default")]
    kind: String,
    #[serde(deserialize_with = "null_as_default")]
    message: RawMessage,
}

/// Tool results from a session log, newest `max_events` of them, returned oldest first.
/// Records without a timestamp are stamped with `now`.
pub fn decode_tool_events(lines: &[String], max_events: usize, now: DateTime<Utc>) -> Vec<Event> {
    let mut events: Vec<Event> = lines
        .iter()
        .rev()
        .filter_map(|l| decode_line::<RawSessionLine>(l))
        .filter(|rec| rec.kind == "message" && rec.message.role == "toolResult")
        .take(max_events)
        .map(|rec| {
            let msg = rec.message;
            Event {
                at: nonzero_millis(msg.timestamp).unwrap_or(now),
                level: if msg.is_error {
                    Level::Error
                } else {
                    Level::Info
                },
                origin: Origin::Tool,
                detail: msg
                    .content
                    .first()
                    .map(|c| first_line(&c.text))
                    .unwrap_or_default(),
                title: msg.tool_name,
            }
        })
        .collect();
    events.reverse();
    events
}

pub fn read_tool_events(
    path: &Path,
    max_lines: usize,
    max_events: usize,
    now: DateTime<Utc>,
) -> Result<Vec<Event>> {
    let lines = tail_lines(path, max_lines)?;
    Ok(decode_tool_events(&lines, max_events, now))
}

// ---------- dashboard/metrics/tokens.jsonl ----------

#[derive(Deserialize, Default)]
#[serde(default)]
struct RawOpenClawUsage {
    #[serde(deserialize_with = "null_as_default")]
    total: i64,
}

#[derive(Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
struct RawClaudeUsage {
    #[serde(rename = "costUSD")]
    #[serde(deserialize_with = "null_as_default")]
    cost_usd: f64,
}

#[derive(Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
struct RawTokenLine {
    #[serde(deserialize_with = "null_as_default")]
    ts: i64,
    #[serde(deserialize_with = "null_as_default")]
    openclaw: RawOpenClawUsage,
    #[serde(deserialize_with = "null_as_default")]
    claude_code: RawClaudeUsage,
}

/// Chronological token samples; with `max > 0` only the newest `max` survive.
pub fn parse_token_samples(text: &str, max: usize) -> Vec<TokenSample> {
    let mut samples: Vec<TokenSample> = text
        .lines()
        .filter_map(decode_line::<RawTokenLine>)
        .map(|r| TokenSample {
            at: from_millis(r.ts),
            total_tokens: r.openclaw.total,
            cost_usd: r.claude_code.cost_usd,
        })
        .collect();
    samples.sort_by(|a, b| a.at.cmp(&b.at));
    if max > 0 && samples.len() > max {
        samples.drain(..samples.len() - max);
    }
    samples
}

pub fn read_token_samples(path: &Path, max: usize) -> Result<Vec<TokenSample>> {
    let text = read_file(path)?;
    Ok(parse_token_samples(&text, max))
}
