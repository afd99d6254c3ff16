//! Timeline merge: sources, retitling, ordering and the 40-event cap.
use std::fs;
use std::path::PathBuf;
use std::time::{Duration, SystemTime};

use chrono::Utc;
use clawtop_core::timeline::{
    build_timeline, merge_events, subagent_events, truncate_chars, ActiveLogResolver, FixedLog,
    NewestLogInDir, TimelineSources, MAX_EVENTS,
};
use clawtop_core::{from_millis, CronJob, Event, Level, Origin, SubagentRun};

fn job(id: &str, name: &str) -> CronJob {
    CronJob {
        id: id.into(),
        name: name.into(),
        enabled: true,
        schedule: "* * * * *".into(),
        tz: String::new(),
        next_run: None,
        last_run: None,
        last_status: String::new(),
        last_error: String::new(),
    }
}

fn run(label: &str, task: &str, created_ms: i64) -> SubagentRun {
    SubagentRun {
        run_id: label.into(),
        child_session_key: String::new(),
        label: label.into(),
        task: task.into(),
        model: String::new(),
        created_at: from_millis(created_ms),
        started_at: None,
        finished_at: None,
    }
}

fn ev(ms: i64, title: &str) -> Event {
    Event {
        at: from_millis(ms),
        level: Level::Info,
        origin: Origin::Tool,
        title: title.into(),
        detail: String::new(),
    }
}

#[test]
fn merge_sorts_descending_and_caps() {
    let input: Vec<Event> = (0..100).map(|i| ev(i * 1000, &format!("e{i}"))).collect();
    let out = merge_events(input);
    assert_eq!(out.len(), MAX_EVENTS);
    assert!(out.windows(2).all(|w| w[0].at >= w[1].at));
    assert_eq!(out[0].title, "e99");
    assert_eq!(out[MAX_EVENTS - 1].title, "e60");
}

#[test]
fn merge_keeps_input_order_for_equal_timestamps() {
    let out = merge_events(vec![ev(5, "first"), ev(9, "newest"), ev(5, "second")]);
    let titles: Vec<&str> = out.iter().map(|e| e.title.as_str()).collect();
    assert_eq!(titles, vec!["newest", "first", "second"]);
}

#[test]
fn subagent_detail_is_single_line_and_bounded() {
    let long = "x".repeat(200);
    let evs = subagent_events(&[run("r", &format!("line one\nline two {long}"), 10)]);
    assert_eq!(evs.len(), 1);
    assert_eq!(evs[0].title, "subagent: r");
    assert_eq!(evs[0].origin, Origin::Subagent);
    assert!(!evs[0].detail.contains('\n'));
    assert_eq!(evs[0].detail.chars().count(), 90);
    assert!(evs[0].detail.ends_with('…'));
    assert!(evs[0].detail.starts_with("line one line two"));

    assert_eq!(truncate_chars("  short  ", 90), "short");
}

#[test]
fn build_timeline_merges_all_sources() {
    let td = tempfile::tempdir().unwrap();
    let runs_dir = td.path().join("runs");
    fs::create_dir_all(&runs_dir).unwrap();
    fs::write(
        runs_dir.join("nightly.jsonl"),
        "{\"ts\":3000,\"action\":\"finished\",\"status\":\"error\",\"error\":\"disk full\",\"jobId\":\"nightly\"}\n",
    )
    .unwrap();
    let session_log = td.path().join("sess.jsonl");
    fs::write(
        &session_log,
        "{\"type\":\"message\",\"message\":{\"role\":\"toolResult\",\"toolName\":\"exec\",\"timestamp\":2000,\"content\":[{\"text\":\"ok\"}]}}\n",
    )
    .unwrap();

    let jobs = vec![job("nightly", "Nightly backup"), job("nolog", "No log")];
    let subs = vec![run("helper", "do things", 1000)];
    let log = FixedLog(Some(session_log));
    let events = build_timeline(
        &TimelineSources {
            cron_runs_dir: &runs_dir,
            jobs: &jobs,
            subagents: &subs,
            active_log: &log,
        },
        Utc::now(),
    );
    assert_eq!(events.len(), 3);
    assert_eq!(events[0].title, "cron: Nightly backup");
    assert_eq!(events[0].level, Level::Error);
    assert_eq!(events[0].detail, "disk full");
    assert_eq!(events[1].origin, Origin::Tool);
    assert_eq!(events[2].origin, Origin::Subagent);
}

#[test]
fn build_timeline_without_optional_inputs() {
    let td = tempfile::tempdir().unwrap();
    let events = build_timeline(
        &TimelineSources {
            cron_runs_dir: &td.path().join("missing"),
            jobs: &[job("a", "A")],
            subagents: &[],
            active_log: &FixedLog(None),
        },
        Utc::now(),
    );
    assert!(events.is_empty());
}

#[test]
fn newest_log_in_dir_picks_latest_mtime() {
    let td = tempfile::tempdir().unwrap();
    let old = td.path().join("old.jsonl");
    let new = td.path().join("new.jsonl");
    fs::write(&old, "{}\n").unwrap();
    fs::write(&new, "{}\n").unwrap();
    fs::write(td.path().join("sessions.json"), "{}").unwrap();

    let past = SystemTime::now() - Duration::from_secs(3600);
    fs::File::options()
        .write(true)
        .open(&old)
        .unwrap()
        .set_modified(past)
        .unwrap();

    let got: Option<PathBuf> = NewestLogInDir::new(td.path()).resolve_active_log();
    assert_eq!(got, Some(new));

    let empty = tempfile::tempdir().unwrap();
    assert_eq!(NewestLogInDir::new(empty.path()).resolve_active_log(), None);
}
