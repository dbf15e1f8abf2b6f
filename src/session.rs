use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};

use crate::acquisition::FrameSource;
use crate::error::PipelineError;
use crate::io::{dark_frame, export};
use crate::spectral::frame::Frame;
use crate::spectral::pipeline::{CorrectedSpectrum, Pipeline, PipelineState};

// ---------------------------------------------------------------------------
// Session – one acquisition run: RUNNING until stopped
// ---------------------------------------------------------------------------

/// Outcome of a single [`Session::step`].
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    /// A frame was processed; see [`Session::latest`].
    Processed,
    /// The frame had the wrong shape and was dropped.
    Rejected(PipelineError),
    /// The source ran dry or [`Session::stop`] was called.
    Stopped,
}

/// Drives a [`Pipeline`] from a [`FrameSource`], one frame per call.
///
/// The caller owns the loop; a session never blocks except inside the
/// source's `next_frame`.
pub struct Session<S: FrameSource> {
    pipeline: Pipeline,
    state: PipelineState,
    source: S,
    latest: Option<CorrectedSpectrum>,
    latest_frame: Option<Frame>,
    keep_frames: bool,
    running: bool,
    rejected: u64,
}

impl<S: FrameSource> Session<S> {
    pub fn new(pipeline: Pipeline, source: S) -> Self {
        let state = pipeline.new_state();
        log::info!("Session started on {}", source.describe());
        Session {
            pipeline,
            state,
            source,
            latest: None,
            latest_frame: None,
            keep_frames: false,
            running: true,
            rejected: 0,
        }
    }

    /// Keep a copy of each accepted frame for a preview.
    pub fn with_frame_preview(mut self, keep: bool) -> Self {
        self.keep_frames = keep;
        self
    }

    /// Pull one frame and run it through the pipeline.
    ///
    /// An acquisition error or a configuration error ends the session and
    /// is returned; a badly shaped frame is only reported.
    pub fn step(&mut self) -> Result<Step> {
        if !self.running {
            return Ok(Step::Stopped);
        }

        let frame = match self.source.next_frame() {
            Ok(Some(frame)) => frame,
            Ok(None) => {
                log::info!("{} has no more frames", self.source.describe());
                self.running = false;
                return Ok(Step::Stopped);
            }
            Err(e) => {
                self.running = false;
                return Err(e.context("acquisition failed"));
            }
        };

        let preview = if self.keep_frames {
            Some(frame.clone())
        } else {
            None
        };

        match self.pipeline.process_one_frame(&mut self.state, frame) {
            Ok(spectrum) => {
                self.latest = Some(spectrum);
                if preview.is_some() {
                    self.latest_frame = preview;
                }
                Ok(Step::Processed)
            }
            Err(e) if e.is_per_frame() => {
                self.rejected += 1;
                log::warn!("Dropped frame: {e}");
                Ok(Step::Rejected(e))
            }
            Err(e) => {
                self.running = false;
                Err(e.into())
            }
        }
    }

    /// RUNNING → STOPPED. Further steps do nothing.
    pub fn stop(&mut self) {
        if self.running {
            log::info!(
                "Session stopped after {} frames ({} rejected)",
                self.state.frames_processed(),
                self.rejected
            );
        }
        self.running = false;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    pub fn state(&self) -> &PipelineState {
        &self.state
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Most recent processed spectrum.
    pub fn latest(&self) -> Option<&CorrectedSpectrum> {
        self.latest.as_ref()
    }

    /// Most recent accepted frame, when previews are kept.
    pub fn latest_frame(&self) -> Option<&Frame> {
        self.latest_frame.as_ref()
    }

    /// Frames dropped for having the wrong shape.
    pub fn rejected(&self) -> u64 {
        self.rejected
    }

    fn require_latest(&self) -> Result<&CorrectedSpectrum> {
        match &self.latest {
            Some(spectrum) => Ok(spectrum),
            None => bail!("no spectrum has been acquired yet"),
        }
    }

    /// Save the latest spectrum under `dir` with a timestamped name.
    pub fn save_spectrum(&self, dir: &Path) -> Result<PathBuf> {
        let spectrum = self.require_latest()?;
        export::save_timestamped(dir, &self.pipeline.export(spectrum))
    }

    /// Save the latest spectrum to an explicit path (`.csv` or `.parquet`).
    pub fn save_spectrum_to(&self, path: &Path) -> Result<()> {
        let spectrum = self.require_latest()?;
        export::write_spectrum(path, &self.pipeline.export(spectrum))
    }

    /// Record the current smoothed spectrum as the dark reference for the
    /// next session. The running pipeline keeps its own reference.
    pub fn save_dark_frame(&self, path: &Path) -> Result<()> {
        let spectrum = self.require_latest()?;
        dark_frame::write_dark_frame(path, &spectrum.smoothed)
            .context("capturing dark frame")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::acquisition::synthetic::SyntheticSource;
    use crate::config::PipelineConfig;

    struct Scripted {
        frames: Vec<Result<Option<Frame>>>,
    }

    impl FrameSource for Scripted {
        fn next_frame(&mut self) -> Result<Option<Frame>> {
            if self.frames.is_empty() {
                return Ok(None);
            }
            self.frames.remove(0)
        }

        fn describe(&self) -> String {
            "scripted".to_string()
        }
    }

    fn small_config() -> PipelineConfig {
        PipelineConfig {
            sensor_width: 64,
            sensor_height: 20,
            crop_y1: 0.4,
            crop_y2: 0.6,
            rolling_depth: 3,
            baseline_removal_enabled: true,
            ..PipelineConfig::default()
        }
    }

    fn synthetic_session(frames: u64) -> Session<SyntheticSource> {
        let pipeline = Pipeline::new(small_config(), None).unwrap();
        let source = SyntheticSource::new(64, 20, pipeline.band(), 11).with_limit(frames);
        Session::new(pipeline, source)
    }

    #[test]
    fn runs_until_source_stops() {
        let mut session = synthetic_session(4);
        let mut processed = 0;
        while session.step().unwrap() == Step::Processed {
            processed += 1;
        }
        assert_eq!(processed, 4);
        assert!(!session.is_running());
        assert_eq!(session.step().unwrap(), Step::Stopped);

        let latest = session.latest().unwrap();
        assert!(latest.warmed_up);
        assert_eq!(latest.frame_number, 4);
        assert!(latest.corrected.as_ref().unwrap().iter().all(|&v| v >= 0.0));
    }

    #[test]
    fn explicit_stop() {
        let mut session = synthetic_session(100);
        assert_eq!(session.step().unwrap(), Step::Processed);
        session.stop();
        assert_eq!(session.step().unwrap(), Step::Stopped);
        assert_eq!(session.state().frames_processed(), 1);
    }

    #[test]
    fn bad_frame_is_skipped_not_fatal() {
        let pipeline = Pipeline::new(small_config(), None).unwrap();
        let source = Scripted {
            frames: vec![
                Ok(Some(Frame::from_fn(10, 20, 3, |_, _, _| 1))),
                Ok(Some(Frame::from_fn(64, 20, 3, |_, _, _| 1))),
            ],
        };
        let mut session = Session::new(pipeline, source);
        assert!(matches!(session.step().unwrap(), Step::Rejected(_)));
        assert_eq!(session.step().unwrap(), Step::Processed);
        assert_eq!(session.rejected(), 1);
    }

    #[test]
    fn acquisition_error_ends_session() {
        let pipeline = Pipeline::new(small_config(), None).unwrap();
        let source = Scripted {
            frames: vec![Err(anyhow::anyhow!("camera unplugged"))],
        };
        let mut session = Session::new(pipeline, source);
        let err = session.step().unwrap_err();
        assert!(format!("{err:#}").contains("camera unplugged"));
        assert!(!session.is_running());
    }

    #[test]
    fn saving_needs_a_spectrum() {
        let dir = tempfile::tempdir().unwrap();
        let session = synthetic_session(1);
        assert!(session.save_spectrum(dir.path()).is_err());
        assert!(session.save_dark_frame(&dir.path().join("dark.csv")).is_err());
    }

    #[test]
    fn exported_file_matches_memory() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = synthetic_session(2);
        session.step().unwrap();
        let path = session.save_spectrum(dir.path()).unwrap();

        let back = export::read_spectrum(&path).unwrap();
        let latest = session.latest().unwrap();
        let cal = session.pipeline().calibration();
        assert_eq!(back.len(), 64);
        for i in 0..64 {
            assert!((back.wavelengths[i] - cal.wavelengths()[i]).abs() < 1e-9);
            assert!((back.wavenumbers[i] - cal.wavenumbers()[i]).abs() < 1e-9);
            assert!((back.intensities[i] - latest.normalized[i]).abs() < 1e-9);
        }
    }

    #[test]
    fn dark_capture_cancels_next_session() {
        let dir = tempfile::tempdir().unwrap();
        let dark_path = dir.path().join("dark_frame.csv");

        // Constant frames so the capture matches what comes next exactly.
        let constant = || Frame::from_fn(64, 20, 3, |_, c, _| (c % 7) as u8 + 3);
        let config = PipelineConfig { rolling_depth: 1, ..small_config() };

        let pipeline = Pipeline::new(config.clone(), None).unwrap();
        let mut first = Session::new(pipeline, Scripted { frames: vec![Ok(Some(constant()))] });
        first.step().unwrap();
        first.save_dark_frame(&dark_path).unwrap();

        let dark = dark_frame::load_dark_frame(&dark_path, 64).unwrap();
        let pipeline = Pipeline::new(config, dark).unwrap();
        let mut second = Session::new(pipeline, Scripted { frames: vec![Ok(Some(constant()))] });
        second.step().unwrap();
        assert!(second.latest().unwrap().dark_subtracted.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn preview_keeps_last_frame() {
        let mut session = synthetic_session(1).with_frame_preview(true);
        assert!(session.latest_frame().is_none());
        session.step().unwrap();
        assert_eq!(session.latest_frame().unwrap().width(), 64);
    }
}
