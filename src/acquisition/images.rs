use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};

use super::FrameSource;
use crate::spectral::frame::Frame;

/// Replays still images from a directory as if they came from the camera.
///
/// Files are played in name order; PNG and JPEG are decoded to 8-bit RGB.
#[derive(Debug, Clone)]
pub struct ImageSequenceSource {
    dir: PathBuf,
    files: Vec<PathBuf>,
    next: usize,
    looping: bool,
}

impl ImageSequenceSource {
    pub fn open(dir: &Path, looping: bool) -> Result<Self> {
        let mut files = Vec::new();
        for entry in std::fs::read_dir(dir)
            .with_context(|| format!("listing frames in {}", dir.display()))?
        {
            let path = entry.context("reading directory entry")?.path();
            let ext = path
                .extension()
                .and_then(|e| e.to_str())
                .unwrap_or("")
                .to_ascii_lowercase();
            if matches!(ext.as_str(), "png" | "jpg" | "jpeg") {
                files.push(path);
            }
        }
        if files.is_empty() {
            bail!("No PNG or JPEG frames found in {}", dir.display());
        }
        files.sort();
        log::info!("Found {} frames in {}", files.len(), dir.display());

        Ok(ImageSequenceSource {
            dir: dir.to_path_buf(),
            files,
            next: 0,
            looping,
        })
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

/// Decode one image file into an RGB frame.
pub fn decode_frame(path: &Path) -> Result<Frame> {
    let rgb = image::open(path)
        .with_context(|| format!("decoding frame {}", path.display()))?
        .to_rgb8();
    let (width, height) = rgb.dimensions();
    let frame = Frame::new(width as usize, height as usize, 3, rgb.into_raw())?;
    Ok(frame)
}

impl FrameSource for ImageSequenceSource {
    fn next_frame(&mut self) -> Result<Option<Frame>> {
        if self.next >= self.files.len() {
            if !self.looping {
                return Ok(None);
            }
            self.next = 0;
        }
        let path = &self.files[self.next];
        self.next += 1;
        decode_frame(path).map(Some)
    }

    fn describe(&self) -> String {
        format!("{} frames from {}", self.files.len(), self.dir.display())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_png(path: &Path, width: u32, height: u32, value: u8) {
        let img = image::RgbImage::from_pixel(width, height, image::Rgb([value, value, value]));
        img.save(path).unwrap();
    }

    #[test]
    fn plays_in_name_order_then_stops() {
        let dir = tempfile::tempdir().unwrap();
        write_png(&dir.path().join("b.png"), 4, 2, 20);
        write_png(&dir.path().join("a.png"), 4, 2, 10);
        std::fs::write(dir.path().join("notes.txt"), "skip me").unwrap();

        let mut source = ImageSequenceSource::open(dir.path(), false).unwrap();
        assert_eq!(source.len(), 2);
        let first = source.next_frame().unwrap().unwrap();
        assert_eq!((first.width(), first.height(), first.channels()), (4, 2, 3));
        assert!(first.as_bytes().iter().all(|&v| v == 10));
        let second = source.next_frame().unwrap().unwrap();
        assert!(second.as_bytes().iter().all(|&v| v == 20));
        assert!(source.next_frame().unwrap().is_none());
    }

    #[test]
    fn looping_restarts() {
        let dir = tempfile::tempdir().unwrap();
        write_png(&dir.path().join("only.png"), 2, 2, 5);
        let mut source = ImageSequenceSource::open(dir.path(), true).unwrap();
        for _ in 0..3 {
            assert!(source.next_frame().unwrap().is_some());
        }
    }

    #[test]
    fn empty_directory_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(ImageSequenceSource::open(dir.path(), true).is_err());
    }
}
