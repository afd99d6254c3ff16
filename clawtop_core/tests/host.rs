//! Host sampler: CPU delta math and /proc parsing against a fake status root.
use std::fs;

use chrono::Utc;
use clawtop_core::host::{cpu_percent, parse_cpu_line, parse_loadavg, parse_meminfo, HostSampler};
use clawtop_core::CounterSample;

#[test]
fn cpu_percent_matches_worked_example() {
    let prev = CounterSample {
        user: 100,
        idle: 100,
        ..Default::default()
    };
    let cur = CounterSample {
        user: 150,
        idle: 120,
        ..Default::default()
    };
    let pct = cpu_percent(&prev, &cur);
    assert!((pct - 50.0 / 70.0 * 100.0).abs() < 1e-9, "pct={pct}");
    assert!((pct - 71.4).abs() < 0.1);
}

#[test]
fn cpu_percent_is_zero_without_progress_or_after_reset() {
    let s = CounterSample {
        user: 10,
        system: 5,
        idle: 100,
        ..Default::default()
    };
    assert_eq!(cpu_percent(&s, &s), 0.0);

    let reset = CounterSample {
        user: 1,
        idle: 1,
        ..Default::default()
    };
    assert_eq!(cpu_percent(&s, &reset), 0.0);
}

#[test]
fn cpu_percent_stays_in_range_for_growing_counters() {
    let mut prev = CounterSample::default();
    for step in 1..50u64 {
        let cur = CounterSample {
            user: prev.user + step * 3,
            nice: prev.nice + step % 2,
            system: prev.system + step,
            idle: prev.idle + (50 - step),
            iowait: prev.iowait + step % 3,
            irq: prev.irq,
            softirq: prev.softirq + 1,
            steal: prev.steal,
        };
        let pct = cpu_percent(&prev, &cur);
        assert!((0.0..=100.0).contains(&pct), "step {step}: {pct}");
        prev = cur;
    }
    // all-idle interval
    let idle_only = CounterSample {
        idle: prev.idle + 500,
        ..prev
    };
    assert_eq!(cpu_percent(&prev, &idle_only), 0.0);
}

#[test]
fn parses_proc_formats() {
    let c = parse_cpu_line("cpu  4705 356 584 3699 23 0 12 7 0 0").unwrap();
    assert_eq!(c.user, 4705);
    assert_eq!(c.idle, 3699);
    assert_eq!(c.steal, 7);
    assert!(parse_cpu_line("cpu 1 2 3").is_err());
    assert!(parse_cpu_line("intr 1 2 3 4 5 6 7 8").is_err());

    let (total, avail) =
        parse_meminfo("MemTotal:       16000 kB\nMemFree:  100 kB\nMemAvailable:    4000 kB\n")
            .unwrap();
    assert_eq!(total, 16000 * 1024);
    assert_eq!(avail, 4000 * 1024);

    let (l1, l5, l15) = parse_loadavg("0.52 0.58 0.59 1/467 12345\n").unwrap();
    assert_eq!((l1, l5, l15), (0.52, 0.58, 0.59));
    assert!(parse_loadavg("0.5").is_err());
}

#[cfg(target_os = "linux")]
#[test]
fn each_metric_fails_on_its_own() {
    let td = tempfile::tempdir().unwrap();
    fs::write(
        td.path().join("stat"),
        "cpu  100 0 0 100 0 0 0 0 0 0\ncpu0 1 2 3 4 5 6 7 8\n",
    )
    .unwrap();
    fs::write(
        td.path().join("meminfo"),
        "MemTotal: 1000 kB\nMemAvailable: 250 kB\n",
    )
    .unwrap();
    // no loadavg file at all

    let sampler = HostSampler::new(td.path());
    let (first, cpu) = sampler.snapshot(None, Utc::now());
    assert_eq!(first.cpu_percent, 0.0, "first sample has no delta");
    assert_eq!(first.mem_total_bytes, 1000 * 1024);
    assert_eq!(first.mem_used_bytes, 750 * 1024);
    assert_eq!((first.load1, first.load5, first.load15), (0.0, 0.0, 0.0));
    let cpu = cpu.expect("counters read");

    fs::write(td.path().join("stat"), "cpu  150 0 0 120 0 0 0 0 0 0\n").unwrap();
    let (second, _) = sampler.snapshot(Some(&cpu), Utc::now());
    assert!((second.cpu_percent - 71.428).abs() < 0.01);

    // counters gone too: still a snapshot, just zeros
    fs::remove_file(td.path().join("stat")).unwrap();
    let (third, none) = sampler.snapshot(Some(&cpu), Utc::now());
    assert!(none.is_none());
    assert_eq!(third.cpu_percent, 0.0);
    assert_eq!(third.mem_total_bytes, 1000 * 1024);
}
