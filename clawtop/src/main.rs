//! Entry point for the clawtop TUI. Parses args, resolves settings and runs the App.

use std::{
    env, fs,
    path::PathBuf,
    process::ExitCode,
    sync::Mutex,
    time::Duration,
};

use anyhow::Context;
use chrono::Utc;
use clawtop::app::App;
use clawtop::config::{config_dir, config_path, load_config, parse_duration, save_config, Overrides};
use clawtop_core::{host::HostSampler, sampler::collect_snapshot, Paths, Refresher};
use tracing::info;
use tracing_subscriber::EnvFilter;

const LOG_ENV: &str = "CLAWTOP_LOG";
// gap between the two counter reads in --once so CPU% means something
const ONCE_CPU_WINDOW: Duration = Duration::from_millis(250);

struct ParsedArgs {
    overrides: Overrides,
    save: bool, // --save
    once: bool, // --once
}

enum ArgsError {
    Help(String),
    Invalid(String),
}

fn usage(prog: &str) -> String {
    format!(
        "Usage: {prog} [--openclaw-root DIR|-r DIR] [--workspace DIR|-w DIR] [--refresh DUR] [--save] [--once]\n\
         \n\
         \x20 --openclaw-root, -r DIR  OpenClaw root (default: $OPENCLAW_ROOT or ~/.openclaw)\n\
         \x20 --workspace, -w DIR      workspace dir (default: <root>/workspace)\n\
         \x20 --refresh DUR            refresh interval: 500ms, 2s, 1m or milliseconds (default 2s)\n\
         \x20 --save                   store the given options in the config file\n\
         \x20 --once                   print one snapshot as JSON and exit\n\
         \x20 -h, --help               show this help\n\
         \n\
         Set {LOG_ENV}=debug to log to {}",
        config_dir().join("clawtop.log").display()
    )
}

fn parse_args<I: IntoIterator<Item = String>>(args: I) -> Result<ParsedArgs, ArgsError> {
    let mut it = args.into_iter();
    let prog = it.next().unwrap_or_else(|| "clawtop".into());
    let mut overrides = Overrides::default();
    let mut save = false;
    let mut once = false;

    let invalid = |what: String| ArgsError::Invalid(format!("{what}\n{}", usage(&prog)));

    while let Some(arg) = it.next() {
        let (flag, inline) = match arg.split_once('=') {
            Some((f, v)) if f.starts_with("--") => (f.to_string(), Some(v.to_string())),
            _ => (arg.clone(), None),
        };
        let mut value = |name: &str| -> Result<String, ArgsError> {
            match inline.clone().or_else(|| it.next()) {
                Some(v) if !v.is_empty() => Ok(v),
                _ => Err(invalid(format!("missing value for {name}"))),
            }
        };
        match flag.as_str() {
            "-h" | "--help" => return Err(ArgsError::Help(usage(&prog))),
            "--openclaw-root" | "-r" => {
                overrides.openclaw_root = Some(PathBuf::from(value("--openclaw-root")?));
            }
            "--workspace" | "-w" => {
                overrides.workspace = Some(PathBuf::from(value("--workspace")?));
            }
            "--refresh" => {
                let v = value("--refresh")?;
                match parse_duration(&v) {
                    Some(d) if !d.is_zero() => overrides.refresh = Some(d),
                    _ => return Err(invalid(format!("invalid --refresh value: {v}"))),
                }
            }
            "--save" if inline.is_none() => save = true,
            "--once" if inline.is_none() => once = true,
            _ => return Err(invalid(format!("unexpected argument: {arg}"))),
        }
    }
    Ok(ParsedArgs {
        overrides,
        save,
        once,
    })
}

/// File logging only, and only when asked for: stderr belongs to the alternate screen.
fn init_logging() -> Option<PathBuf> {
    let directive = env::var(LOG_ENV).ok().filter(|v| !v.trim().is_empty())?;
    let dir = config_dir();
    fs::create_dir_all(&dir).ok()?;
    let path = dir.join("clawtop.log");
    let file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .ok()?;
    let filter = EnvFilter::try_new(&directive).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .try_init()
        .ok()?;
    Some(path)
}

#[tokio::main]
async fn main() -> ExitCode {
    let parsed = match parse_args(env::args()) {
        Ok(v) => v,
        Err(ArgsError::Help(msg)) => {
            println!("{msg}");
            return ExitCode::SUCCESS;
        }
        Err(ArgsError::Invalid(msg)) => {
            eprintln!("{msg}");
            return ExitCode::from(2);
        }
    };

    match run(parsed).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("clawtop: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(parsed: ParsedArgs) -> anyhow::Result<ExitCode> {
    if let Some(path) = init_logging() {
        info!(log = %path.display(), "clawtop starting");
    }

    let mut file_cfg = load_config();
    let settings = file_cfg.resolve(&parsed.overrides);

    let paths = match Paths::discover(
        settings.openclaw_root.as_deref(),
        settings.workspace.as_deref(),
    ) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("clawtop: {e}");
            return Ok(ExitCode::from(2));
        }
    };
    info!(root = %paths.openclaw_root.display(), workspace = %paths.workspace_dir.display(), "paths resolved");

    if parsed.save {
        // persist resolved (absolute) paths, not whatever was typed
        let given = &parsed.overrides;
        let persisted = Overrides {
            openclaw_root: given.openclaw_root.as_ref().map(|_| paths.openclaw_root.clone()),
            workspace: given.workspace.as_ref().map(|_| paths.workspace_dir.clone()),
            refresh: given.refresh,
        };
        if file_cfg.merge(&persisted) || !config_path().exists() {
            save_config(&file_cfg).context("saving config")?;
            info!(path = %config_path().display(), "config saved");
        } else {
            info!("config unchanged, not rewritten");
        }
    }

    if parsed.once {
        return print_once(&paths).await.map(|_| ExitCode::SUCCESS);
    }

    let refresher = Refresher::new(paths).with_single_flight(settings.single_flight);
    let mut app = App::new(refresher, settings.refresh);
    app.run().await?;
    Ok(ExitCode::SUCCESS)
}

async fn print_once(paths: &Paths) -> anyhow::Result<()> {
    let host = HostSampler::default();
    let prev = host.sample().ok();
    if prev.is_some() {
        tokio::time::sleep(ONCE_CPU_WINDOW).await;
    }
    let resolver = paths.active_session_log();
    let (_, res) = collect_snapshot(paths, &host, &resolver, prev, Utc::now());
    let snap = res.context("collecting snapshot")?;
    println!("{}", serde_json::to_string_pretty(&snap)?);
    Ok(())
}
