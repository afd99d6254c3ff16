//! Filter reducer and session/event predicates.
use chrono::{Duration, Utc};
use clawtop::filters::{
    describe, guess_primary_model, reduce, EventFilter, FilterAction, Filters, SessionFilter,
};
use clawtop_core::{from_millis, Event, Level, Origin, Session};

fn session(key: &str, model: &str, updated: chrono::DateTime<Utc>) -> Session {
    Session {
        key: key.into(),
        label: String::new(),
        model: model.into(),
        provider: String::new(),
        updated_at: updated,
        input_tokens: 0,
        output_tokens: 0,
        total_tokens: 0,
    }
}

fn flags(f: &Filters) -> [bool; 10] {
    let e = &f.events;
    let s = &f.sessions;
    [
        e.error, e.warn, e.info, e.debug, e.cron, e.subagent, e.tool, s.last_24h, s.hide_runs,
        s.primary_only,
    ]
}

#[test]
fn defaults_hide_debug_only() {
    let f = Filters::default();
    assert_eq!(
        flags(&f),
        [true, true, true, false, true, true, true, false, false, false]
    );
}

#[test]
fn every_key_toggles_exactly_one_field() {
    let keys = ['1', '2', '3', 'e', 'w', 'i', 'd', 'c', 's', 't'];
    let base = Filters::default();
    let mut touched = Vec::new();
    for k in keys {
        let action = FilterAction::from_key(k).expect("bound key");
        let next = reduce(base, action);
        let diff: Vec<usize> = flags(&base)
            .iter()
            .zip(flags(&next).iter())
            .enumerate()
            .filter(|(_, (a, b))| a != b)
            .map(|(i, _)| i)
            .collect();
        assert_eq!(diff.len(), 1, "key {k} changed {diff:?}");
        touched.push(diff[0]);
        assert_eq!(reduce(next, action), base, "key {k} is an involution");
    }
    touched.sort_unstable();
    touched.dedup();
    assert_eq!(touched.len(), keys.len(), "each key owns a distinct field");

    assert_eq!(FilterAction::from_key('x'), None);
    assert_eq!(FilterAction::from_key('q'), None);
}

#[test]
fn event_filter_checks_level_and_origin() {
    let ev = |level, origin| Event {
        at: from_millis(0),
        level,
        origin,
        title: "t".into(),
        detail: String::new(),
    };
    let f = EventFilter::default();
    assert!(f.allows(&ev(Level::Error, Origin::Tool)));
    assert!(!f.allows(&ev(Level::Debug, Origin::Tool)));

    let f = reduce(Filters::default(), FilterAction::ToggleOrigin(Origin::Cron)).events;
    assert!(!f.allows(&ev(Level::Error, Origin::Cron)));
    assert!(f.allows(&ev(Level::Error, Origin::Subagent)));
}

#[test]
fn session_filter_combinations() {
    let now = Utc::now();
    let fresh = session("agent:main:main", "gpt-5", now - Duration::hours(1));
    let stale = session("agent:main:old", "gpt-5", now - Duration::hours(30));
    let run = session("agent:main:cron:x:run:1", "mini", now);

    let none = SessionFilter::default();
    assert!([&fresh, &stale, &run].iter().all(|s| none.allows(s, now, Some("gpt-5"))));

    let day = SessionFilter {
        last_24h: true,
        ..Default::default()
    };
    assert!(day.allows(&fresh, now, None));
    assert!(!day.allows(&stale, now, None));

    let hide = SessionFilter {
        hide_runs: true,
        ..Default::default()
    };
    assert!(!hide.allows(&run, now, None));
    assert!(hide.allows(&fresh, now, None));

    let primary = SessionFilter {
        primary_only: true,
        ..Default::default()
    };
    assert!(!primary.allows(&run, now, Some("gpt-5")));
    assert!(primary.allows(&fresh, now, Some("gpt-5")));
    // no known primary model: nothing filtered
    assert!(primary.allows(&run, now, None));
}

#[test]
fn primary_model_prefers_main_session_then_majority() {
    let t = from_millis(0);
    let sessions = vec![
        session("a", "mini", t),
        session("b", "mini", t),
        session("agent:main:main", "gpt-5", t),
    ];
    assert_eq!(guess_primary_model(&sessions).as_deref(), Some("gpt-5"));

    let sessions = vec![
        session("agent:main:main", "", t),
        session("a", "mini", t),
        session("b", "mini", t),
        session("c", "large", t),
    ];
    assert_eq!(guess_primary_model(&sessions).as_deref(), Some("mini"));

    let tie = vec![session("a", "zeta", t), session("b", "alpha", t)];
    assert_eq!(guess_primary_model(&tie).as_deref(), Some("alpha"));
    assert_eq!(guess_primary_model(&[]), None);
}

#[test]
fn describe_reports_state() {
    let f = reduce(Filters::default(), FilterAction::ToggleLast24h);
    let s = describe(&f, Some("gpt-5"));
    assert!(s.starts_with("[1]24h:on [2]hide:run:off [3]primary(gpt-5):off"));
    assert!(s.contains("d:off"));
}

#[test]
fn describe_lists_every_level_and_origin_toggle() {
    let f = reduce(Filters::default(), FilterAction::ToggleLevel(Level::Debug));
    let f = reduce(f, FilterAction::ToggleOrigin(Origin::Subagent));
    assert_eq!(
        describe(&f, None),
        "[1]24h:off [2]hide:run:off [3]primary(-):off  levels e:on w:on i:on d:on  src c:on s:off t:on  r refresh  +/- rate  q quit"
    );
}
