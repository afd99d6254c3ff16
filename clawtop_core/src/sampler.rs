//! One refresh cycle: host metrics, state files, timeline, assembled into a `Snapshot`.
//! Plain blocking code; the orchestrator in `state` runs it off the UI loop.

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::error::{Error, Result};
use crate::host::HostSampler;
use crate::paths::Paths;
use crate::readers::{read_cron_jobs, read_sessions, read_subagent_runs, read_token_samples};
use crate::timeline::{build_timeline, ActiveLogResolver, TimelineSources};
use crate::types::{CounterSample, Snapshot};

/// Token samples kept for the usage sparkline.
pub const MAX_TOKEN_SAMPLES: usize = 48;

/// Degrade a failed optional source to an empty list.
fn optional<T>(what: &str, r: Result<Vec<T>>) -> Vec<T> {
    match r {
        Ok(v) => v,
        Err(Error::Io { source, .. }) if source.kind() == std::io::ErrorKind::NotFound => {
            debug!("{what}: not present");
            Vec::new()
        }
        Err(e) => {
            debug!("{what}: {e}");
            Vec::new()
        }
    }
}

/// Build one snapshot. The returned counter sample is the new "previous" CPU reading
/// (`None` if the counters could not be read), independent of whether the snapshot succeeded.
///
/// Only the session registry is fatal; every other source degrades to empty.
pub fn collect_snapshot(
    paths: &Paths,
    host: &HostSampler,
    active_log: &dyn ActiveLogResolver,
    prev_cpu: Option<CounterSample>,
    now: DateTime<Utc>,
) -> (Option<CounterSample>, Result<Snapshot>) {
    let (host_snap, cpu) = host.snapshot(prev_cpu.as_ref(), now);

    let sessions = match read_sessions(&paths.sessions_json) {
        Ok(s) => s,
        Err(e) => return (cpu, Err(e)),
    };
    let subagents = optional("subagent runs", read_subagent_runs(&paths.subagent_runs));
    let crons = optional("cron jobs", read_cron_jobs(&paths.cron_jobs));
    let token_samples = optional(
        "token samples",
        read_token_samples(&paths.tokens_jsonl, MAX_TOKEN_SAMPLES),
    );

    let events = build_timeline(
        &TimelineSources {
            cron_runs_dir: &paths.cron_runs_dir,
            jobs: &crons,
            subagents: &subagents,
            active_log,
        },
        now,
    );

    let snap = Snapshot {
        taken_at: now,
        host: host_snap,
        sessions,
        subagents,
        crons,
        events,
        token_samples,
    };
    (cpu, Ok(snap))
}
