/// Frame delivery: where camera frames come from.
///
/// The pipeline never loops on its own. A driver pulls frames from a
/// [`FrameSource`] until it returns `Ok(None)` (stop) or an error
/// (terminal acquisition failure).

pub mod images;
pub mod synthetic;

use anyhow::Result;

use crate::spectral::frame::Frame;

/// A producer of camera frames.
pub trait FrameSource {
    /// Block until the next frame is ready. `Ok(None)` ends the session.
    fn next_frame(&mut self) -> Result<Option<Frame>>;

    /// Human-readable label for logs and the status bar.
    fn describe(&self) -> String;
}

impl<S: FrameSource + ?Sized> FrameSource for Box<S> {
    fn next_frame(&mut self) -> Result<Option<Frame>> {
        (**self).next_frame()
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}
