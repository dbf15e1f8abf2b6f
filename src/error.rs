use std::fmt;

use thiserror::Error;

// ---------------------------------------------------------------------------
// Pipeline stages – used to tag every error with where it came from
// ---------------------------------------------------------------------------

/// The stage of the extraction pipeline that raised an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Config,
    Calibration,
    FrameReducer,
    RollingAverager,
    DarkFrame,
    Baseline,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Config => "config",
            Stage::Calibration => "calibration",
            Stage::FrameReducer => "frame reducer",
            Stage::RollingAverager => "rolling averager",
            Stage::DarkFrame => "dark frame",
            Stage::Baseline => "baseline",
        };
        f.write_str(name)
    }
}

// ---------------------------------------------------------------------------
// PipelineError
// ---------------------------------------------------------------------------

/// Errors raised by the spectral core.
///
/// `Configuration` errors are fatal: they prevent a [`Pipeline`] from being
/// built. `InputShape` errors reject a single frame; the caller decides
/// whether to keep going.
///
/// [`Pipeline`]: crate::spectral::pipeline::Pipeline
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PipelineError {
    #[error("configuration error in {stage}: {reason}")]
    Configuration { stage: Stage, reason: String },

    #[error("input shape error in {stage}: {reason}")]
    InputShape { stage: Stage, reason: String },
}

impl PipelineError {
    pub fn config(stage: Stage, reason: impl Into<String>) -> Self {
        PipelineError::Configuration {
            stage,
            reason: reason.into(),
        }
    }

    pub fn shape(stage: Stage, reason: impl Into<String>) -> Self {
        PipelineError::InputShape {
            stage,
            reason: reason.into(),
        }
    }

    /// Stage that raised the error.
    pub fn stage(&self) -> Stage {
        match self {
            PipelineError::Configuration { stage, .. } | PipelineError::InputShape { stage, .. } => {
                *stage
            }
        }
    }

    /// Whether only the offending frame is affected.
    pub fn is_per_frame(&self) -> bool {
        matches!(self, PipelineError::InputShape { .. })
    }
}

pub type PipelineResult<T> = Result<T, PipelineError>;
