use std::ops::Range;

use crate::config::PipelineConfig;
use crate::error::{PipelineError, PipelineResult, Stage};
use crate::io::export::SpectrumExport;

use super::baseline::remove_baseline;
use super::calibration::CalibrationModel;
use super::dark::{subtract_dark, zero_floor, DarkFrame};
use super::frame::{reduce_band, Frame};
use super::rolling::RollingAverager;

// ---------------------------------------------------------------------------
// Per-frame output
// ---------------------------------------------------------------------------

/// Result of pushing one frame through the pipeline. Every vector is aligned
/// index-for-index with the calibration axes.
#[derive(Debug, Clone, PartialEq)]
pub struct CorrectedSpectrum {
    /// Rolling mean before dark subtraction (what a dark capture records).
    pub smoothed: Vec<f64>,
    /// `smoothed - dark`, unshifted.
    pub dark_subtracted: Vec<f64>,
    /// `dark_subtracted` shifted so its minimum is zero; always shown.
    pub normalized: Vec<f64>,
    /// Fluorescence-corrected trace, present only when baseline removal is on.
    pub corrected: Option<Vec<f64>>,
    /// Whether every rolling slot held a real frame when this was computed.
    pub warmed_up: bool,
    /// 1-based count of frames processed, including this one.
    pub frame_number: u64,
}

// ---------------------------------------------------------------------------
// PipelineState – the only thing that changes between frames
// ---------------------------------------------------------------------------

/// Mutable per-session state. Owned by a single driver; never shared.
#[derive(Debug, Clone)]
pub struct PipelineState {
    rolling: RollingAverager,
}

impl PipelineState {
    pub fn is_warmed_up(&self) -> bool {
        self.rolling.is_warmed_up()
    }

    pub fn frames_processed(&self) -> u64 {
        self.rolling.pushed()
    }

    pub fn rolling_depth(&self) -> usize {
        self.rolling.depth()
    }
}

// ---------------------------------------------------------------------------
// Pipeline – immutable stages wired in fixed order
// ---------------------------------------------------------------------------

/// Calibration, band geometry and dark reference for one session.
///
/// ```text
///   Frame ──reduce──▶ raw ──push──▶ RollingAverager ──mean──▶ smoothed
///                                                             │
///                                             smoothed - dark ▼
///                                   ┌──────── dark_subtracted ────────┐
///                                   ▼                                 ▼
///                             zero_floor                     remove_baseline?
///                             normalized                        corrected
/// ```
#[derive(Debug, Clone)]
pub struct Pipeline {
    config: PipelineConfig,
    calibration: CalibrationModel,
    dark: DarkFrame,
    band: Range<usize>,
    empty_rolling: RollingAverager,
}

impl Pipeline {
    /// Validate `config` and build the static stages. `dark` defaults to
    /// an all-zero reference.
    pub fn new(config: PipelineConfig, dark: Option<DarkFrame>) -> PipelineResult<Self> {
        config.validate()?;

        let dark = match dark {
            Some(dark) if dark.len() != config.sensor_width => {
                return Err(PipelineError::config(
                    Stage::DarkFrame,
                    format!(
                        "dark frame has {} values but the sensor is {} columns wide",
                        dark.len(),
                        config.sensor_width
                    ),
                ));
            }
            Some(dark) => dark,
            None => DarkFrame::zeros(config.sensor_width),
        };

        let calibration = config.calibration();
        let band = config.band_rows(config.sensor_height);
        let empty_rolling = RollingAverager::new(config.rolling_depth, config.sensor_width)?;
        Ok(Pipeline {
            config,
            calibration,
            dark,
            band,
            empty_rolling,
        })
    }

    /// Fresh state with an all-zero rolling buffer.
    pub fn new_state(&self) -> PipelineState {
        PipelineState {
            rolling: self.empty_rolling.clone(),
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn calibration(&self) -> &CalibrationModel {
        &self.calibration
    }

    pub fn dark_frame(&self) -> &DarkFrame {
        &self.dark
    }

    /// Rows averaged from every frame.
    pub fn band(&self) -> Range<usize> {
        self.band.clone()
    }

    /// Run one frame through every stage.
    ///
    /// A frame whose size does not match the sensor is rejected and leaves
    /// `state` untouched.
    pub fn process_one_frame(
        &self,
        state: &mut PipelineState,
        mut frame: Frame,
    ) -> PipelineResult<CorrectedSpectrum> {
        if frame.width() != self.config.sensor_width || frame.height() != self.config.sensor_height
        {
            return Err(PipelineError::shape(
                Stage::FrameReducer,
                format!(
                    "frame is {}x{}, sensor is configured as {}x{}",
                    frame.width(),
                    frame.height(),
                    self.config.sensor_width,
                    self.config.sensor_height
                ),
            ));
        }
        if self.config.flip_horizontal {
            frame.flip_horizontal();
        }

        let raw = reduce_band(&frame, self.band.clone())?;
        state.rolling.push(&raw)?;
        let smoothed = state.rolling.current();

        let dark_subtracted = subtract_dark(&smoothed, &self.dark)?;
        let normalized = zero_floor(&dark_subtracted);
        let corrected = if self.config.baseline_removal_enabled {
            Some(remove_baseline(
                &dark_subtracted,
                self.config.baseline_window_size,
            )?)
        } else {
            None
        };

        Ok(CorrectedSpectrum {
            smoothed,
            dark_subtracted,
            normalized,
            corrected,
            warmed_up: state.rolling.is_warmed_up(),
            frame_number: state.rolling.pushed(),
        })
    }

    /// Columns for a spectrum file: calibration axes plus the
    /// display-normalized intensities.
    pub fn export(&self, spectrum: &CorrectedSpectrum) -> SpectrumExport {
        SpectrumExport {
            wavelengths: self.calibration.wavelengths().to_vec(),
            wavenumbers: self.calibration.wavenumbers().to_vec(),
            intensities: spectrum.normalized.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 4×4 sensor, unit slope, laser at 1e7 nm so the reference term is 1.
    fn tiny_config() -> PipelineConfig {
        PipelineConfig {
            slope: 1.0,
            intercept: 1.0,
            laser_wavelength_nm: 1e7,
            sensor_width: 4,
            sensor_height: 4,
            crop_y1: 0.25,
            crop_y2: 0.75,
            rolling_depth: 1,
            baseline_removal_enabled: false,
            baseline_window_size: 2,
            flip_horizontal: false,
            ..PipelineConfig::default()
        }
    }

    /// Rows 1 and 2 carry the signal; rows 0 and 3 are noise the band must skip.
    fn tiny_frame() -> Frame {
        let rows: [[u8; 4]; 4] = [
            [200, 200, 200, 200],
            [10, 20, 30, 40],
            [30, 40, 50, 60],
            [250, 0, 250, 0],
        ];
        Frame::from_fn(4, 4, 3, |r, c, ch| rows[r][c] + ch as u8)
    }

    #[test]
    fn hand_computed_scenario() {
        let pipeline = Pipeline::new(tiny_config(), None).unwrap();
        assert_eq!(pipeline.band(), 1..3);
        let mut state = pipeline.new_state();

        let out = pipeline.process_one_frame(&mut state, tiny_frame()).unwrap();
        // Column 0: (10+11+12 + 30+31+32) / 6 = 21
        assert_eq!(out.smoothed, vec![21.0, 31.0, 41.0, 51.0]);
        assert_eq!(out.dark_subtracted, vec![21.0, 31.0, 41.0, 51.0]);
        assert_eq!(out.normalized, vec![0.0, 10.0, 20.0, 30.0]);
        assert_eq!(out.corrected, None);
        assert!(out.warmed_up);
        assert_eq!(out.frame_number, 1);

        let export = pipeline.export(&out);
        assert_eq!(export.wavelengths, vec![1.0, 2.0, 3.0, 4.0]);
        assert_eq!(export.wavenumbers[1], 1e7 / 2.0 - 1.0);
        assert_eq!(export.intensities, out.normalized);
    }

    #[test]
    fn dark_equal_to_signal_gives_zeros() {
        let config = PipelineConfig {
            sensor_height: 2,
            crop_y1: 0.0,
            crop_y2: 1.0,
            ..tiny_config()
        };
        let dark = DarkFrame::from_intensities(vec![1.0; 4], 4).unwrap();
        let pipeline = Pipeline::new(config, Some(dark)).unwrap();
        let mut state = pipeline.new_state();

        let frame = Frame::from_fn(4, 2, 3, |_, _, _| 1);
        let out = pipeline.process_one_frame(&mut state, frame).unwrap();
        assert_eq!(out.dark_subtracted, vec![0.0; 4]);
        assert_eq!(out.normalized, vec![0.0; 4]);
    }

    #[test]
    fn baseline_variant_present_when_enabled() {
        let config = PipelineConfig {
            baseline_removal_enabled: true,
            ..tiny_config()
        };
        let pipeline = Pipeline::new(config, None).unwrap();
        let mut state = pipeline.new_state();
        let out = pipeline.process_one_frame(&mut state, tiny_frame()).unwrap();
        // Window 2 leans left: baseline [21, 21, 31, 41].
        assert_eq!(out.corrected, Some(vec![0.0, 10.0, 10.0, 10.0]));
        assert_eq!(out.normalized, vec![0.0, 10.0, 20.0, 30.0]);
    }

    #[test]
    fn warm_up_ramps_from_zero() {
        let config = PipelineConfig {
            rolling_depth: 2,
            ..tiny_config()
        };
        let pipeline = Pipeline::new(config, None).unwrap();
        let mut state = pipeline.new_state();

        let first = pipeline.process_one_frame(&mut state, tiny_frame()).unwrap();
        assert!(!first.warmed_up);
        assert_eq!(first.smoothed, vec![10.5, 15.5, 20.5, 25.5]);

        let second = pipeline.process_one_frame(&mut state, tiny_frame()).unwrap();
        assert!(second.warmed_up);
        assert!(state.is_warmed_up());
        assert_eq!(second.smoothed, vec![21.0, 31.0, 41.0, 51.0]);
    }

    #[test]
    fn flip_reverses_columns() {
        let config = PipelineConfig {
            flip_horizontal: true,
            ..tiny_config()
        };
        let pipeline = Pipeline::new(config, None).unwrap();
        let mut state = pipeline.new_state();
        let out = pipeline.process_one_frame(&mut state, tiny_frame()).unwrap();
        assert_eq!(out.smoothed, vec![51.0, 41.0, 31.0, 21.0]);
    }

    #[test]
    fn wrong_frame_size_rejected_and_state_kept() {
        let pipeline = Pipeline::new(tiny_config(), None).unwrap();
        let mut state = pipeline.new_state();
        let frame = Frame::from_fn(5, 4, 3, |_, _, _| 9);
        let err = pipeline.process_one_frame(&mut state, frame).unwrap_err();
        assert!(err.is_per_frame());
        assert_eq!(state.frames_processed(), 0);

        // The pipeline keeps working after a rejected frame.
        pipeline.process_one_frame(&mut state, tiny_frame()).unwrap();
        assert_eq!(state.frames_processed(), 1);
    }

    #[test]
    fn bad_config_or_dark_prevents_construction() {
        let err = Pipeline::new(PipelineConfig { rolling_depth: 0, ..tiny_config() }, None)
            .unwrap_err();
        assert_eq!(err.stage(), Stage::RollingAverager);

        let dark = DarkFrame::from_intensities(vec![0.0; 3], 3).unwrap();
        let err = Pipeline::new(tiny_config(), Some(dark)).unwrap_err();
        assert_eq!(err.stage(), Stage::DarkFrame);
    }
}
