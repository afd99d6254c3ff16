//! Persistent settings: load/save a small JSON file of defaults for the CLI.
//! Stored under XDG config dir: $XDG_CONFIG_HOME/clawtop/config.json (fallback ~/.config/clawtop/config.json)

use serde::{Deserialize, Serialize};
use std::{fs, io, path::PathBuf, time::Duration};

pub const DEFAULT_REFRESH: Duration = Duration::from_secs(2);
pub const MIN_REFRESH: Duration = Duration::from_millis(500);
pub const REFRESH_STEP: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct ConfigFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub openclaw_root: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workspace: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub single_flight: Option<bool>,
}

/// Values given on the command line; `None` means "not given".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Overrides {
    pub openclaw_root: Option<PathBuf>,
    pub workspace: Option<PathBuf>,
    pub refresh: Option<Duration>,
}

/// Effective settings after layering CLI over file over defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub openclaw_root: Option<PathBuf>,
    pub workspace: Option<PathBuf>,
    pub refresh: Duration,
    pub single_flight: bool,
}

pub fn config_dir() -> PathBuf {
    if let Some(xdg) = std::env::var_os("XDG_CONFIG_HOME").filter(|v| !v.is_empty()) {
        PathBuf::from(xdg).join("clawtop")
    } else {
        dirs_next::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("clawtop")
    }
}

pub fn config_path() -> PathBuf {
    config_dir().join("config.json")
}

/// Missing, unreadable or malformed files all load as defaults.
pub fn load_config() -> ConfigFile {
    let path = config_path();
    match fs::read_to_string(&path) {
        Ok(s) => serde_json::from_str(&s).unwrap_or_else(|e| {
            tracing::warn!(path = %path.display(), "ignoring malformed config: {e}");
            ConfigFile::default()
        }),
        Err(_) => ConfigFile::default(),
    }
}

pub fn save_config(c: &ConfigFile) -> io::Result<()> {
    let path = config_path();
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let data = serde_json::to_vec_pretty(c).map_err(io::Error::other)?;
    fs::write(path, data)
}

/// `500ms`, `2s`, `1m`, or bare milliseconds.
pub fn parse_duration(s: &str) -> Option<Duration> {
    let s = s.trim();
    let (num, unit_ms) = if let Some(n) = s.strip_suffix("ms") {
        (n, 1)
    } else if let Some(n) = s.strip_suffix('s') {
        (n, 1_000)
    } else if let Some(n) = s.strip_suffix('m') {
        (n, 60_000)
    } else {
        (s, 1)
    };
    let n: u64 = num.trim().parse().ok()?;
    n.checked_mul(unit_ms).map(Duration::from_millis)
}

fn clamp_refresh(d: Duration) -> Duration {
    d.max(MIN_REFRESH)
}

impl ConfigFile {
    pub fn resolve(&self, cli: &Overrides) -> Settings {
        let refresh = cli
            .refresh
            .or_else(|| self.refresh_ms.map(Duration::from_millis))
            .unwrap_or(DEFAULT_REFRESH);
        Settings {
            openclaw_root: cli.openclaw_root.clone().or_else(|| self.openclaw_root.clone()),
            workspace: cli.workspace.clone().or_else(|| self.workspace.clone()),
            refresh: clamp_refresh(refresh),
            single_flight: self.single_flight.unwrap_or(true),
        }
    }

    /// Fold the values given on the command line into the file; returns whether anything changed.
    pub fn merge(&mut self, cli: &Overrides) -> bool {
        let before = self.clone();
        if let Some(r) = &cli.openclaw_root {
            self.openclaw_root = Some(r.clone());
        }
        if let Some(w) = &cli.workspace {
            self.workspace = Some(w.clone());
        }
        if let Some(d) = cli.refresh {
            self.refresh_ms = Some(clamp_refresh(d).as_millis() as u64);
        }
        *self != before
    }
}

/// One `+` press: faster, never below the floor.
pub fn faster(d: Duration) -> Duration {
    d.saturating_sub(REFRESH_STEP).max(MIN_REFRESH)
}

/// One `-` press: slower.
pub fn slower(d: Duration) -> Duration {
    d.saturating_add(REFRESH_STEP)
}
