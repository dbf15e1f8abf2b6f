use std::ops::Range;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, PipelineResult, Stage};
use crate::spectral::baseline::DEFAULT_WINDOW;
use crate::spectral::calibration::CalibrationModel;

// ---------------------------------------------------------------------------
// PipelineConfig – everything resolved before the first frame
// ---------------------------------------------------------------------------

/// Immutable settings for one acquisition session.
///
/// Missing keys in a JSON config file fall back to the bench rig defaults
/// (1920×1080 sensor, 532 nm laser).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// nm per pixel column.
    pub slope: f64,
    /// Wavelength (nm) of column 0.
    pub intercept: f64,
    pub laser_wavelength_nm: f64,

    /// Expected frame size in pixels.
    pub sensor_width: usize,
    pub sensor_height: usize,

    /// Vertical band averaged into the spectrum, as fractions of frame height.
    pub crop_y1: f64,
    pub crop_y2: f64,

    /// Number of frames averaged together.
    pub rolling_depth: usize,

    pub baseline_removal_enabled: bool,
    pub baseline_window_size: usize,

    /// Mirror every frame left/right before reduction. The default
    /// calibration was fitted on mirrored frames, so turning this off
    /// needs a calibration fitted on unmirrored columns.
    pub flip_horizontal: bool,

    /// Optional dark reference; absence means an all-zero dark frame.
    pub dark_frame_path: PathBuf,
    /// Where timestamped spectrum exports land.
    pub export_dir: PathBuf,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            slope: 0.5378783977636364,
            intercept: 251.83884117409121,
            laser_wavelength_nm: 532.0,
            sensor_width: 1920,
            sensor_height: 1080,
            crop_y1: 0.53,
            crop_y2: 0.64,
            rolling_depth: 1,
            baseline_removal_enabled: false,
            baseline_window_size: DEFAULT_WINDOW,
            flip_horizontal: true,
            dark_frame_path: PathBuf::from("dark_frame.csv"),
            export_dir: PathBuf::from("."),
        }
    }
}

impl PipelineConfig {
    /// Read a JSON config file. Keys not present keep their defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config: PipelineConfig = serde_json::from_str(&text)
            .with_context(|| format!("parsing config {}", path.display()))?;
        log::info!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Write the config as pretty JSON.
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("serialising config")?;
        std::fs::write(path, json).with_context(|| format!("writing config {}", path.display()))?;
        Ok(())
    }

    /// Rows `[y1, y2)` averaged for a frame of the given height.
    /// Fractions are truncated toward zero.
    pub fn band_rows(&self, height: usize) -> Range<usize> {
        let y1 = (self.crop_y1 * height as f64) as usize;
        let y2 = (self.crop_y2 * height as f64) as usize;
        y1..y2
    }

    /// Build the pixel → wavenumber mapping for this sensor.
    pub fn calibration(&self) -> CalibrationModel {
        CalibrationModel::new(
            self.slope,
            self.intercept,
            self.laser_wavelength_nm,
            self.sensor_width,
        )
    }

    /// Check every invariant the pipeline relies on.
    pub fn validate(&self) -> PipelineResult<()> {
        if !self.slope.is_finite() || self.slope == 0.0 {
            return Err(PipelineError::config(
                Stage::Calibration,
                format!("slope must be finite and non-zero, got {}", self.slope),
            ));
        }
        if !self.intercept.is_finite() {
            return Err(PipelineError::config(
                Stage::Calibration,
                format!("intercept must be finite, got {}", self.intercept),
            ));
        }
        if !self.laser_wavelength_nm.is_finite() || self.laser_wavelength_nm <= 0.0 {
            return Err(PipelineError::config(
                Stage::Calibration,
                format!(
                    "laser wavelength must be positive, got {} nm",
                    self.laser_wavelength_nm
                ),
            ));
        }
        if self.sensor_width == 0 || self.sensor_height == 0 {
            return Err(PipelineError::config(
                Stage::Config,
                format!(
                    "sensor size {}x{} has no pixels",
                    self.sensor_width, self.sensor_height
                ),
            ));
        }

        // The axis is linear, so its extremes sit at the two end columns.
        let last = self.slope * (self.sensor_width - 1) as f64 + self.intercept;
        if self.intercept <= 0.0 || last <= 0.0 {
            return Err(PipelineError::config(
                Stage::Calibration,
                format!(
                    "calibrated wavelengths must stay positive, got {} nm .. {last} nm",
                    self.intercept
                ),
            ));
        }

        if !(0.0..=1.0).contains(&self.crop_y1)
            || !(0.0..=1.0).contains(&self.crop_y2)
            || self.crop_y1 >= self.crop_y2
        {
            return Err(PipelineError::config(
                Stage::FrameReducer,
                format!(
                    "crop band must satisfy 0 <= crop_y1 < crop_y2 <= 1, got {} .. {}",
                    self.crop_y1, self.crop_y2
                ),
            ));
        }
        let band = self.band_rows(self.sensor_height);
        if band.is_empty() {
            return Err(PipelineError::config(
                Stage::FrameReducer,
                format!(
                    "crop band {} .. {} selects no rows of a {}-row frame",
                    self.crop_y1, self.crop_y2, self.sensor_height
                ),
            ));
        }

        if self.rolling_depth == 0 {
            return Err(PipelineError::config(
                Stage::RollingAverager,
                "rolling depth must be at least 1",
            ));
        }

        if self.baseline_window_size == 0 || self.baseline_window_size > self.sensor_width {
            return Err(PipelineError::config(
                Stage::Baseline,
                format!(
                    "window size {} must be between 1 and the sensor width {}",
                    self.baseline_window_size, self.sensor_width
                ),
            ));
        }
        Ok(())
    }
}
