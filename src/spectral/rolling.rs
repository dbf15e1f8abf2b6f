use crate::error::{PipelineError, PipelineResult, Stage};

// ---------------------------------------------------------------------------
// RollingAverager – temporal smoothing over the last N raw spectra
// ---------------------------------------------------------------------------

/// Fixed-depth circular buffer of raw spectra.
///
/// `push` overwrites the oldest slot; `current` averages *all* slots. Before
/// `depth` spectra have been pushed the never-written slots still count as
/// zeros, so early output ramps up from zero. Use [`is_warmed_up`] to tell
/// when every slot holds a real observation.
///
/// [`is_warmed_up`]: RollingAverager::is_warmed_up
#[derive(Debug, Clone)]
pub struct RollingAverager {
    width: usize,
    slots: Vec<Vec<f64>>,
    cursor: u64,
}

impl RollingAverager {
    pub fn new(depth: usize, width: usize) -> PipelineResult<Self> {
        if depth == 0 {
            return Err(PipelineError::config(
                Stage::RollingAverager,
                "rolling depth must be at least 1",
            ));
        }
        Ok(RollingAverager {
            width,
            slots: vec![vec![0.0; width]; depth],
            cursor: 0,
        })
    }

    pub fn depth(&self) -> usize {
        self.slots.len()
    }

    pub fn width(&self) -> usize {
        self.width
    }

    /// Total number of spectra pushed so far.
    pub fn pushed(&self) -> u64 {
        self.cursor
    }

    /// True once every slot has been written at least once.
    pub fn is_warmed_up(&self) -> bool {
        self.cursor >= self.slots.len() as u64
    }

    /// Store `spectrum` in the next slot, replacing the oldest one.
    pub fn push(&mut self, spectrum: &[f64]) -> PipelineResult<()> {
        if spectrum.len() != self.width {
            return Err(PipelineError::shape(
                Stage::RollingAverager,
                format!(
                    "spectrum has {} columns, buffer expects {}",
                    spectrum.len(),
                    self.width
                ),
            ));
        }
        let slot = (self.cursor % self.slots.len() as u64) as usize;
        self.slots[slot].copy_from_slice(spectrum);
        self.cursor += 1;
        Ok(())
    }

    /// Column-wise mean across every slot. Does not modify the buffer.
    pub fn current(&self) -> Vec<f64> {
        let depth = self.slots.len() as f64;
        let mut mean = vec![0.0; self.width];
        for slot in &self.slots {
            for (acc, v) in mean.iter_mut().zip(slot) {
                *acc += v;
            }
        }
        for acc in &mut mean {
            *acc /= depth;
        }
        mean
    }
}
