use std::collections::VecDeque;

use crate::error::{PipelineError, PipelineResult, Stage};

/// Window width used when none is configured.
pub const DEFAULT_WINDOW: usize = 10;

// ---------------------------------------------------------------------------
// Sliding minimum with mirror padding
// ---------------------------------------------------------------------------

/// Map an out-of-range index onto the array by mirroring about its edges
/// (`d c b a | a b c d | d c b a`).
fn reflect(index: isize, len: usize) -> usize {
    let period = 2 * len as isize;
    let folded = index.rem_euclid(period) as usize;
    if folded < len {
        folded
    } else {
        2 * len - 1 - folded
    }
}

/// Running minimum over a window of `window` samples.
///
/// The window at index `i` spans `[i - window/2, i - window/2 + window)`, so
/// even widths lean one sample to the left. Samples past either edge are
/// mirrored back into the array.
pub fn minimum_filter(values: &[f64], window: usize) -> PipelineResult<Vec<f64>> {
    check_window(values.len(), window)?;

    let n = values.len();
    let left = (window / 2) as isize;
    let padded: Vec<f64> = (-left..(n + window - 1) as isize - left)
        .map(|j| values[reflect(j, n)])
        .collect();

    // Monotonic deque of indices into `padded`; front is the current minimum.
    let mut candidates: VecDeque<usize> = VecDeque::with_capacity(window);
    let mut out = Vec::with_capacity(n);
    for (k, &v) in padded.iter().enumerate() {
        while candidates.back().is_some_and(|&b| padded[b] >= v) {
            candidates.pop_back();
        }
        candidates.push_back(k);
        if candidates.front().is_some_and(|&f| f + window <= k) {
            candidates.pop_front();
        }
        if k + 1 >= window {
            if let Some(&f) = candidates.front() {
                out.push(padded[f]);
            }
        }
    }
    Ok(out)
}

fn check_window(len: usize, window: usize) -> PipelineResult<()> {
    if window == 0 {
        return Err(PipelineError::config(
            Stage::Baseline,
            "window size must be at least 1",
        ));
    }
    if window > len {
        return Err(PipelineError::config(
            Stage::Baseline,
            format!("window size {window} exceeds spectrum length {len}"),
        ));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Fluorescence removal
// ---------------------------------------------------------------------------

/// Subtract a rolling-minimum baseline and clamp at zero.
///
/// Peaks narrower than `window` stand above the local minimum and survive;
/// the broad fluorescence hump underneath them is removed.
pub fn remove_baseline(spectrum: &[f64], window: usize) -> PipelineResult<Vec<f64>> {
    let baseline = minimum_filter(spectrum, window)?;
    Ok(spectrum
        .iter()
        .zip(&baseline)
        .map(|(s, b)| (s - b).max(0.0))
        .collect())
}
