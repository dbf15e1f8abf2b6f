//! Live Raman spectrum extraction from camera frames.
//!
//! A [`Session`](session::Session) pulls frames from a
//! [`FrameSource`](acquisition::FrameSource) and hands each one to
//! [`Pipeline::process_one_frame`](spectral::pipeline::Pipeline::process_one_frame).

pub mod acquisition;
pub mod config;
pub mod error;
pub mod io;
pub mod session;
pub mod spectral;

pub use config::PipelineConfig;
pub use error::{PipelineError, Stage};
pub use session::{Session, Step};
pub use spectral::pipeline::{CorrectedSpectrum, Pipeline, PipelineState};
