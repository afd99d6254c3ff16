//! Small utilities to manage bounded history buffers for charts.

use std::collections::VecDeque;

use clawtop_core::TokenSample;

/// CPU% points kept for the host sparkline.
pub const CPU_HISTORY: usize = 600;

pub fn push_capped<T>(dq: &mut VecDeque<T>, v: T, cap: usize) {
    if cap == 0 {
        return;
    }
    while dq.len() >= cap {
        dq.pop_front();
    }
    dq.push_back(v);
}

/// Cumulative counters only ever climb, so chart them relative to the window minimum.
/// A flat window renders as a mid-height line.
pub fn relative_series(vals: &[i64]) -> Vec<u64> {
    let (Some(min), Some(max)) = (vals.iter().min(), vals.iter().max()) else {
        return Vec::new();
    };
    if min == max {
        return vec![1; vals.len()];
    }
    vals.iter().map(|v| v.abs_diff(*min)).collect()
}

pub fn token_series(samples: &[TokenSample]) -> Vec<u64> {
    let vals: Vec<i64> = samples.iter().map(|s| s.total_tokens).collect();
    relative_series(&vals)
}

/// Last `width` points, for widgets that draw one column per point.
pub fn tail_window<T: Copy>(dq: &VecDeque<T>, width: usize) -> Vec<T> {
    let start = dq.len().saturating_sub(width);
    dq.iter().skip(start).copied().collect()
}
