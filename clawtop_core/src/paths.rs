//! Resolved locations of OpenClaw state. Everything here is read-only for clawtop.
//!
//! Defaults: root is `$OPENCLAW_ROOT` or `~/.openclaw`, workspace is `<root>/workspace`.
//! Optional files (tokens.jsonl, runs.json, ...) may not exist.

use std::env;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::timeline::NewestLogInDir;

pub const ROOT_ENV: &str = "OPENCLAW_ROOT";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paths {
    pub openclaw_root: PathBuf,
    pub workspace_dir: PathBuf,

    pub sessions_json: PathBuf,
    pub sessions_dir: PathBuf,
    pub subagent_runs: PathBuf,
    pub cron_jobs: PathBuf,
    pub cron_runs_dir: PathBuf,
    pub tokens_jsonl: PathBuf,
}

fn absolute(p: &Path) -> PathBuf {
    if p.is_absolute() {
        return p.to_path_buf();
    }
    env::current_dir()
        .map(|cwd| cwd.join(p))
        .unwrap_or_else(|_| p.to_path_buf())
}

impl Paths {
    /// Lay out every state file below `root` / `workspace` without touching the filesystem.
    pub fn from_root(root: impl Into<PathBuf>, workspace: Option<PathBuf>) -> Self {
        let root = root.into();
        let ws = workspace.unwrap_or_else(|| root.join("workspace"));
        let sessions_dir = root.join("agents").join("main").join("sessions");
        Self {
            sessions_json: sessions_dir.join("sessions.json"),
            sessions_dir,
            subagent_runs: root.join("subagents").join("runs.json"),
            cron_jobs: root.join("cron").join("jobs.json"),
            cron_runs_dir: root.join("cron").join("runs"),
            tokens_jsonl: ws.join("dashboard").join("metrics").join("tokens.jsonl"),
            openclaw_root: root,
            workspace_dir: ws,
        }
    }

    /// Resolve the root from the override, `$OPENCLAW_ROOT`, or `~/.openclaw`, in that order.
    /// The root must be an existing directory.
    pub fn discover(root_override: Option<&Path>, workspace_override: Option<&Path>) -> Result<Self> {
        let root = match root_override {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => match env::var_os(ROOT_ENV).filter(|v| !v.is_empty()) {
                Some(v) => PathBuf::from(v),
                None => dirs_next::home_dir().ok_or(Error::NoHome)?.join(".openclaw"),
            },
        };
        let root = absolute(&root);
        if !root.is_dir() {
            return Err(Error::RootNotFound(root));
        }
        let ws = workspace_override
            .filter(|p| !p.as_os_str().is_empty())
            .map(absolute);
        Ok(Self::from_root(root, ws))
    }

    /// Resolver for the main agent's current session log.
    pub fn active_session_log(&self) -> NewestLogInDir {
        NewestLogInDir::new(&self.sessions_dir)
    }
}
