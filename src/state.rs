use std::path::{Path, PathBuf};

use eframe::egui::TextureHandle;
use raman_scope::acquisition::FrameSource;
use raman_scope::{Session, Step};

use crate::color::TracePalette;

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// Status line shown in the top bar.
pub struct Status {
    pub text: String,
    pub is_error: bool,
}

/// The full UI state, independent of rendering.
pub struct AppState {
    /// Acquisition session; the only owner of the rolling buffer.
    pub session: Session<Box<dyn FrameSource>>,

    /// Whether new frames are pulled each repaint.
    pub paused: bool,

    /// Show the camera preview with the crop band.
    pub show_preview: bool,

    /// Cached preview texture, updated in place.
    pub preview_texture: Option<TextureHandle>,

    pub colors: TracePalette,

    /// Status / error message shown in the UI.
    pub status: Option<Status>,

    /// Set by the Quit command; the app closes the viewport.
    pub quit_requested: bool,
}

impl AppState {
    pub fn new(session: Session<Box<dyn FrameSource>>) -> Self {
        Self {
            session,
            paused: false,
            show_preview: true,
            preview_texture: None,
            colors: TracePalette::default(),
            status: None,
            quit_requested: false,
        }
    }

    fn info(&mut self, text: String) {
        self.status = Some(Status {
            text,
            is_error: false,
        });
    }

    fn error(&mut self, text: String) {
        log::error!("{text}");
        self.status = Some(Status {
            text,
            is_error: true,
        });
    }

    /// Pull and process one frame unless paused or stopped.
    pub fn tick(&mut self) {
        if self.paused || !self.session.is_running() {
            return;
        }
        match self.session.step() {
            Ok(Step::Processed) => {
                if self.status.as_ref().is_some_and(|s| s.is_error) {
                    self.status = None;
                }
            }
            Ok(Step::Rejected(e)) => self.error(format!("Dropped frame: {e}")),
            Ok(Step::Stopped) => self.info("Acquisition stopped".to_string()),
            Err(e) => self.error(format!("Error: {e:#}")),
        }
    }

    pub fn toggle_pause(&mut self) {
        self.paused = !self.paused;
    }

    /// Quick save into the configured export directory.
    pub fn save_spectrum(&mut self) {
        let dir = self.session.pipeline().config().export_dir.clone();
        match self.session.save_spectrum(&dir) {
            Ok(path) => self.info(format!("Spectrum saved to {}", path.display())),
            Err(e) => self.error(format!("Save failed: {e:#}")),
        }
    }

    /// Save to a path chosen by the user.
    pub fn export_to(&mut self, path: &Path) {
        match self.session.save_spectrum_to(path) {
            Ok(()) => self.info(format!("Spectrum exported to {}", path.display())),
            Err(e) => self.error(format!("Export failed: {e:#}")),
        }
    }

    /// Capture the current smoothed spectrum as next session's dark frame.
    pub fn save_dark_frame(&mut self) {
        let path: PathBuf = self.session.pipeline().config().dark_frame_path.clone();
        match self.session.save_dark_frame(&path) {
            Ok(()) => self.info(format!(
                "Dark frame saved to {} (used from next start)",
                path.display()
            )),
            Err(e) => self.error(format!("Dark capture failed: {e:#}")),
        }
    }

    pub fn request_quit(&mut self) {
        self.session.stop();
        self.quit_requested = true;
    }
}
