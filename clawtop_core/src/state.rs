//! Refresh orchestration: sequence-numbered refresh jobs and the last-good snapshot.
//!
//! Jobs run on the blocking pool and report back over a channel. An outcome is applied
//! only if its sequence number is newer than the last applied one, so a slow refresh can
//! never overwrite a fresher snapshot. With single-flight on, no new job starts while one
//! is outstanding.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, warn};

use crate::error::Result;
use crate::host::HostSampler;
use crate::paths::Paths;
use crate::sampler::collect_snapshot;
use crate::types::{CounterSample, Snapshot};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshState {
    /// Showing the last-good snapshot, nothing outstanding.
    Idle,
    /// At least one refresh is in flight; the last-good snapshot is still shown.
    Refreshing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    Updated,
    /// Refresh failed; previous snapshot kept, error recorded.
    Failed,
    /// Older than what is already applied; dropped.
    Stale,
}

#[derive(Debug)]
pub struct RefreshOutcome {
    pub seq: u64,
    pub at: DateTime<Utc>,
    pub cpu: Option<CounterSample>,
    pub result: Result<Snapshot>,
}

/// Everything a refresh needs, detached from the orchestrator so it can move to another thread.
#[derive(Debug, Clone)]
pub struct RefreshJob {
    pub seq: u64,
    paths: Arc<Paths>,
    host: HostSampler,
    prev_cpu: Option<CounterSample>,
}

impl RefreshJob {
    pub fn run(self) -> RefreshOutcome {
        let at = Utc::now();
        let resolver = self.paths.active_session_log();
        let (cpu, result) = collect_snapshot(&self.paths, &self.host, &resolver, self.prev_cpu, at);
        RefreshOutcome {
            seq: self.seq,
            at,
            cpu,
            result,
        }
    }
}

pub struct Refresher {
    paths: Arc<Paths>,
    host: HostSampler,
    single_flight: bool,

    // Only cross-refresh mutable state of the pipeline
    prev_cpu: Option<CounterSample>,

    next_seq: u64,
    applied_seq: u64,
    in_flight: usize,

    current: Option<Arc<Snapshot>>,
    last_error: Option<String>,
    last_update: Option<DateTime<Utc>>,
}

impl Refresher {
    pub fn new(paths: Paths) -> Self {
        Self {
            paths: Arc::new(paths),
            host: HostSampler::default(),
            single_flight: true,
            prev_cpu: None,
            next_seq: 0,
            applied_seq: 0,
            in_flight: 0,
            current: None,
            last_error: None,
            last_update: None,
        }
    }

    pub fn with_host_sampler(mut self, host: HostSampler) -> Self {
        self.host = host;
        self
    }

    pub fn with_single_flight(mut self, on: bool) -> Self {
        self.single_flight = on;
        self
    }

    pub fn paths(&self) -> &Paths {
        &self.paths
    }

    pub fn state(&self) -> RefreshState {
        if self.in_flight > 0 {
            RefreshState::Refreshing
        } else {
            RefreshState::Idle
        }
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    pub fn snapshot(&self) -> Option<Arc<Snapshot>> {
        self.current.clone()
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Time of the last applied (successful or failed) refresh.
    pub fn last_update(&self) -> Option<DateTime<Utc>> {
        self.last_update
    }

    pub fn prev_cpu(&self) -> Option<CounterSample> {
        self.prev_cpu
    }

    /// Allocate the next job, or `None` when single-flight holds it back.
    pub fn begin(&mut self) -> Option<RefreshJob> {
        if self.single_flight && self.in_flight > 0 {
            debug!(in_flight = self.in_flight, "refresh suppressed (single-flight)");
            return None;
        }
        self.next_seq += 1;
        self.in_flight += 1;
        Some(RefreshJob {
            seq: self.next_seq,
            paths: Arc::clone(&self.paths),
            host: self.host.clone(),
            prev_cpu: self.prev_cpu,
        })
    }

    /// Start a refresh on the blocking pool; the outcome arrives on `tx`.
    /// Must be called from within a tokio runtime.
    pub fn dispatch(&mut self, tx: &UnboundedSender<RefreshOutcome>) -> Option<u64> {
        let job = self.begin()?;
        let seq = job.seq;
        let tx = tx.clone();
        tokio::task::spawn_blocking(move || {
            let outcome = job.run();
            // receiver gone means the UI is shutting down
            let _ = tx.send(outcome);
        });
        debug!(seq, "refresh dispatched");
        Some(seq)
    }

    pub fn apply(&mut self, out: RefreshOutcome) -> Applied {
        self.in_flight = self.in_flight.saturating_sub(1);
        if out.seq <= self.applied_seq {
            debug!(seq = out.seq, applied = self.applied_seq, "dropping stale refresh");
            return Applied::Stale;
        }
        self.applied_seq = out.seq;
        self.last_update = Some(out.at);
        match out.result {
            Ok(snap) => {
                if let Some(c) = out.cpu {
                    self.prev_cpu = Some(c);
                }
                self.current = Some(Arc::new(snap));
                self.last_error = None;
                Applied::Updated
            }
            Err(e) => {
                warn!(seq = out.seq, "refresh failed: {e}");
                self.last_error = Some(e.to_string());
                Applied::Failed
            }
        }
    }
}
