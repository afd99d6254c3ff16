//! Host metrics from the Linux status files (/proc/stat, /proc/meminfo, /proc/loadavg).
//! CPU% is derived from two counter samples; every metric fails independently.

use std::fs;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use once_cell::sync::OnceCell;
use sysinfo::System;
use tracing::debug;

use crate::error::{Error, Result};
use crate::types::{CounterSample, HostSnapshot};

/// Utilization between two counter samples, in 0..=100.
/// Returns 0 when no time elapsed or the counters went backwards (reset).
pub fn cpu_percent(prev: &CounterSample, cur: &CounterSample) -> f64 {
    let total_prev = prev.total();
    let total_cur = cur.total();
    if total_cur <= total_prev {
        return 0.0;
    }
    let total_delta = (total_cur - total_prev) as f64;
    let idle_delta = cur.idle_total().saturating_sub(prev.idle_total()) as f64;
    ((total_delta - idle_delta) / total_delta * 100.0).clamp(0.0, 100.0)
}

/// Parse the aggregate `cpu` line of /proc/stat.
pub fn parse_cpu_line(line: &str) -> Result<CounterSample> {
    let mut it = line.split_whitespace();
    match it.next() {
        Some("cpu") => {}
        _ => return Err(Error::Host("/proc/stat: missing cpu line".into())),
    }
    // cpu user nice system idle iowait irq softirq steal guest guest_nice
    let vals: Vec<u64> = it
        .take(8)
        .map(|tok| tok.parse::<u64>().unwrap_or(0))
        .collect();
    if vals.len() < 8 {
        return Err(Error::Host("/proc/stat: cpu line too short".into()));
    }
    Ok(CounterSample {
        user: vals[0],
        nice: vals[1],
        system: vals[2],
        idle: vals[3],
        iowait: vals[4],
        irq: vals[5],
        softirq: vals[6],
        steal: vals[7],
    })
}

/// Returns (total, available) in bytes. Values in meminfo are kB.
pub fn parse_meminfo(text: &str) -> Result<(u64, u64)> {
    let mut total: Option<u64> = None;
    let mut available: Option<u64> = None;
    for line in text.lines() {
        let line = line.trim();
        let slot = if line.starts_with("MemTotal:") {
            &mut total
        } else if line.starts_with("MemAvailable:") {
            &mut available
        } else {
            continue;
        };
        if let Some(v) = line.split_whitespace().nth(1) {
            *slot = v.parse::<u64>().ok();
        }
    }
    match total {
        Some(t) => Ok((
            t.saturating_mul(1024),
            available.unwrap_or(0).saturating_mul(1024),
        )),
        None => Err(Error::Host("/proc/meminfo: no MemTotal".into())),
    }
}

pub fn parse_loadavg(text: &str) -> Result<(f64, f64, f64)> {
    let f: Vec<&str> = text.split_whitespace().take(3).collect();
    if f.len() < 3 {
        return Err(Error::Host("/proc/loadavg too short".into()));
    }
    let p = |s: &str| s.parse::<f64>().unwrap_or(0.0);
    Ok((p(f[0]), p(f[1]), p(f[2])))
}

fn hostname() -> &'static str {
    static HOST: OnceCell<String> = OnceCell::new();
    HOST.get_or_init(|| System::host_name().unwrap_or_else(|| "unknown".into()))
}

/// Reads host counters below a status root (normally `/proc`).
#[derive(Debug, Clone)]
pub struct HostSampler {
    root: PathBuf,
}

impl Default for HostSampler {
    fn default() -> Self {
        Self::new("/proc")
    }
}

impl HostSampler {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn read(&self, name: &str) -> Result<String> {
        let path = self.root.join(name);
        fs::read_to_string(&path).map_err(|e| Error::io(path, e))
    }

    pub fn sample(&self) -> Result<CounterSample> {
        let text = self.read("stat")?;
        parse_cpu_line(text.lines().next().unwrap_or(""))
    }

    pub fn load_averages(&self) -> Result<(f64, f64, f64)> {
        match self.read("loadavg").and_then(|s| parse_loadavg(&s)) {
            Ok(v) => Ok(v),
            Err(e) if cfg!(not(target_os = "linux")) => {
                debug!("loadavg unavailable ({e}), using sysinfo");
                let l = System::load_average();
                Ok((l.one, l.five, l.fifteen))
            }
            Err(e) => Err(e),
        }
    }

    /// Returns (total, available) bytes.
    pub fn memory(&self) -> Result<(u64, u64)> {
        match self.read("meminfo").and_then(|s| parse_meminfo(&s)) {
            Ok(v) => Ok(v),
            Err(e) if cfg!(not(target_os = "linux")) => {
                debug!("meminfo unavailable ({e}), using sysinfo");
                let mut sys = System::new();
                sys.refresh_memory();
                Ok((sys.total_memory(), sys.available_memory()))
            }
            Err(e) => Err(e),
        }
    }

    /// Sample everything once. Returns the snapshot plus the counter sample to keep as
    /// "previous" for the next call (`None` when the CPU counters could not be read).
    pub fn snapshot(
        &self,
        prev: Option<&CounterSample>,
        at: DateTime<Utc>,
    ) -> (HostSnapshot, Option<CounterSample>) {
        let mut out = HostSnapshot::empty(at);
        out.hostname = hostname().to_string();

        let cur = match self.sample() {
            Ok(c) => Some(c),
            Err(e) => {
                debug!("cpu counters unavailable: {e}");
                None
            }
        };
        if let (Some(p), Some(c)) = (prev, cur.as_ref()) {
            out.cpu_percent = cpu_percent(p, c);
        }

        match self.memory() {
            Ok((total, avail)) => {
                out.mem_total_bytes = total;
                out.mem_used_bytes = total.saturating_sub(avail);
            }
            Err(e) => debug!("memory unavailable: {e}"),
        }

        match self.load_averages() {
            Ok((l1, l5, l15)) => {
                out.load1 = l1;
                out.load5 = l5;
                out.load15 = l15;
            }
            Err(e) => debug!("load average unavailable: {e}"),
        }

        (out, cur)
    }
}
