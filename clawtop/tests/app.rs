//! App state: key mapping, refresh rate, outcome handling and a full-frame render.
use std::fs;
use std::path::Path;
use std::time::Duration;

use clawtop::app::{command_for_key, App, Command};
use clawtop::filters::FilterAction;
use clawtop_core::{host::HostSampler, Applied, Level, Origin, Paths, Refresher};
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::{backend::TestBackend, Terminal};

fn key(c: KeyCode) -> KeyEvent {
    KeyEvent::new(c, KeyModifiers::NONE)
}

fn seed_root(root: &Path) -> Paths {
    let paths = Paths::from_root(root, None);
    fs::create_dir_all(&paths.sessions_dir).unwrap();
    fs::write(
        &paths.sessions_json,
        r#"{
  "agent:main:main": {"label":"Main","model":"openai/gpt-5","updatedAt":1700000000000},
  "agent:main:cron:a:run:1": {"model":"mini","updatedAt":1690000000000}
}"#,
    )
    .unwrap();
    fs::create_dir_all(paths.cron_jobs.parent().unwrap()).unwrap();
    fs::write(
        &paths.cron_jobs,
        r#"{"version":1,"jobs":[{"id":"a","name":"nightly","enabled":true,"schedule":{"kind":"cron","expr":"0 3 * * *"},"state":{"lastStatus":"error","lastError":"disk full"}}]}"#,
    )
    .unwrap();
    paths
}

fn app_for(root: &Path) -> App {
    let r = Refresher::new(seed_root(root)).with_host_sampler(HostSampler::new(root.join("no-proc")));
    App::new(r, Duration::from_secs(2))
}

fn screen(app: &App) -> String {
    let mut term = Terminal::new(TestBackend::new(160, 40)).unwrap();
    term.draw(|f| app.draw(f)).unwrap();
    let buf = term.backend().buffer().clone();
    let mut out = String::new();
    for row in buf.content.chunks(buf.area.width as usize) {
        for cell in row {
            out.push_str(cell.symbol());
        }
        out.push('\n');
    }
    out
}

#[test]
fn keys_map_to_commands() {
    assert_eq!(command_for_key(&key(KeyCode::Char('q'))), Some(Command::Quit));
    assert_eq!(command_for_key(&key(KeyCode::Esc)), Some(Command::Quit));
    assert_eq!(
        command_for_key(&KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)),
        Some(Command::Quit)
    );
    assert_eq!(
        command_for_key(&key(KeyCode::Char('c'))),
        Some(Command::Filter(FilterAction::ToggleOrigin(Origin::Cron)))
    );
    assert_eq!(
        command_for_key(&key(KeyCode::Char('d'))),
        Some(Command::Filter(FilterAction::ToggleLevel(Level::Debug)))
    );
    assert_eq!(command_for_key(&key(KeyCode::Char('r'))), Some(Command::RefreshNow));
    assert_eq!(command_for_key(&key(KeyCode::Char('+'))), Some(Command::Faster));
    assert_eq!(command_for_key(&key(KeyCode::Char('-'))), Some(Command::Slower));
    assert_eq!(command_for_key(&key(KeyCode::Char('z'))), None);

    let mut release = key(KeyCode::Char('q'));
    release.kind = KeyEventKind::Release;
    assert_eq!(command_for_key(&release), None);
}

#[test]
fn rate_commands_respect_floor() {
    let td = tempfile::tempdir().unwrap();
    let mut app = app_for(td.path());
    for _ in 0..10 {
        app.apply_command(Command::Faster);
    }
    assert_eq!(app.refresh_every(), Duration::from_millis(500));
    app.apply_command(Command::Slower);
    assert_eq!(app.refresh_every(), Duration::from_secs(1));

    app.apply_command(Command::Filter(FilterAction::ToggleHideRuns));
    assert!(app.filters().sessions.hide_runs);
    assert!(!app.should_quit());
    app.apply_command(Command::Quit);
    assert!(app.should_quit());
}

#[test]
fn outcomes_feed_history_and_primary_model() {
    let td = tempfile::tempdir().unwrap();
    let paths = seed_root(td.path());
    let mut feeder = Refresher::new(paths.clone())
        .with_host_sampler(HostSampler::new(td.path().join("no-proc")))
        .with_single_flight(false);
    let mut app = app_for(td.path());

    assert_eq!(app.primary_model(), None);
    let first = feeder.begin().unwrap().run();
    assert_eq!(app.on_outcome(first), Applied::Updated);
    assert_eq!(app.primary_model(), Some("openai/gpt-5"));
    assert_eq!(app.cpu_history().len(), 1);

    // primary model is not re-guessed later
    fs::write(&paths.sessions_json, r#"{"x":{"model":"other","updatedAt":1}}"#).unwrap();
    let second = feeder.begin().unwrap().run();
    assert_eq!(app.on_outcome(second), Applied::Updated);
    assert_eq!(app.primary_model(), Some("openai/gpt-5"));
    assert_eq!(app.cpu_history().len(), 2);

    // failed refresh: history untouched, snapshot kept
    fs::remove_file(&paths.sessions_json).unwrap();
    let third = feeder.begin().unwrap().run();
    assert_eq!(app.on_outcome(third), Applied::Failed);
    assert_eq!(app.cpu_history().len(), 2);
    assert!(app.refresher().last_error().is_some());
    assert_eq!(app.refresher().snapshot().unwrap().sessions[0].key, "x");
}

#[test]
fn renders_every_panel() {
    let td = tempfile::tempdir().unwrap();
    let mut app = app_for(td.path());
    let before = screen(&app);
    assert!(before.contains("waiting for first refresh"));

    let job = Refresher::new(Paths::from_root(td.path(), None))
        .with_host_sampler(HostSampler::new(td.path().join("no-proc")))
        .begin()
        .unwrap();
    app.on_outcome(job.run());
    let s = screen(&app);
    for needle in [
        "clawtop",
        "Host",
        "Tokens",
        "(no tokens.jsonl)",
        "Sessions / Subagents",
        "agent:main:main",
        "gpt-5",
        "Latest events",
        "Crons",
        "nightly",
        "err:disk full",
        "[1]24h:off",
    ] {
        assert!(s.contains(needle), "missing {needle:?}\n{s}");
    }

    app.apply_command(Command::Filter(FilterAction::ToggleHideRuns));
    assert!(!screen(&app).contains(":run:1"));
}
