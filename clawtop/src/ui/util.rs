//! Small UI helpers: human-readable sizes, relative times, truncation.

use chrono::{DateTime, Utc};

pub fn human(b: u64) -> String {
    const K: f64 = 1024.0;
    let b = b as f64;
    if b < K {
        return format!("{b:.0}B");
    }
    let kb = b / K;
    if kb < K {
        return format!("{kb:.1}K");
    }
    let mb = kb / K;
    if mb < K {
        return format!("{mb:.1}M");
    }
    let gb = mb / K;
    if gb < K {
        return format!("{gb:.1}G");
    }
    format!("{:.2}T", gb / K)
}

/// Char-safe cut with a trailing ellipsis.
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    if max == 0 {
        return String::new();
    }
    let mut out: String = s.chars().take(max - 1).collect();
    out.push('…');
    out
}

pub fn pad(s: &str, width: usize) -> String {
    format!("{:<width$}", truncate(s, width))
}

/// "now", "12s ago", "5m ago", "3h ago"; "-" when never.
pub fn ago(t: Option<DateTime<Utc>>, now: DateTime<Utc>) -> String {
    let Some(t) = t else { return "-".into() };
    let secs = (now - t).num_seconds();
    if secs < 1 {
        "now".into()
    } else if secs < 60 {
        format!("{secs}s ago")
    } else if secs < 3600 {
        format!("{}m ago", secs / 60)
    } else {
        format!("{}h ago", secs / 3600)
    }
}

/// Time until a future instant: "due", "40s", "12m", "5h".
pub fn until(t: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let secs = (t - now).num_seconds();
    if secs < 0 {
        "due".into()
    } else if secs < 60 {
        format!("{secs}s")
    } else if secs < 3600 {
        format!("{}m", secs / 60)
    } else {
        format!("{}h", secs / 3600)
    }
}

/// Last path segment of a model id, "-" when empty.
pub fn model_short(m: &str) -> &str {
    if m.is_empty() {
        return "-";
    }
    m.rsplit('/').next().unwrap_or(m)
}
