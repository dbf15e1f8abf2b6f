use crate::error::{PipelineError, PipelineResult, Stage};

// ---------------------------------------------------------------------------
// DarkFrame – fixed sensor offset captured with the laser blocked
// ---------------------------------------------------------------------------

/// Reference spectrum subtracted from every smoothed spectrum.
/// Immutable once built; all-zero when no capture is available.
#[derive(Debug, Clone, PartialEq)]
pub struct DarkFrame {
    intensities: Vec<f64>,
    captured: bool,
}

impl DarkFrame {
    /// Implicit reference used when no dark capture exists.
    pub fn zeros(width: usize) -> Self {
        DarkFrame {
            intensities: vec![0.0; width],
            captured: false,
        }
    }

    /// Wrap a captured reference, which must cover every sensor column.
    pub fn from_intensities(intensities: Vec<f64>, width: usize) -> PipelineResult<Self> {
        if intensities.len() != width {
            return Err(PipelineError::config(
                Stage::DarkFrame,
                format!(
                    "dark frame has {} values but the sensor is {width} columns wide",
                    intensities.len()
                ),
            ));
        }
        Ok(DarkFrame {
            intensities,
            captured: true,
        })
    }

    pub fn intensities(&self) -> &[f64] {
        &self.intensities
    }

    /// False for the all-zero stand-in.
    pub fn is_captured(&self) -> bool {
        self.captured
    }

    pub fn len(&self) -> usize {
        self.intensities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.intensities.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Correction
// ---------------------------------------------------------------------------

/// Element-wise `spectrum - dark`. Both operands must have the same length.
pub fn subtract_dark(spectrum: &[f64], dark: &DarkFrame) -> PipelineResult<Vec<f64>> {
    if spectrum.len() != dark.len() {
        return Err(PipelineError::config(
            Stage::DarkFrame,
            format!(
                "spectrum has {} columns but dark frame has {}",
                spectrum.len(),
                dark.len()
            ),
        ));
    }
    Ok(spectrum
        .iter()
        .zip(dark.intensities())
        .map(|(s, d)| s - d)
        .collect())
}

/// Shift `spectrum` so its minimum is exactly zero.
///
/// This is only a display floor, not an offset correction.
pub fn zero_floor(spectrum: &[f64]) -> Vec<f64> {
    let min = spectrum.iter().cloned().fold(f64::INFINITY, f64::min);
    spectrum.iter().map(|v| v - min).collect()
}
