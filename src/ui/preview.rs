use eframe::egui::{self, Color32, ColorImage, Stroke, TextureOptions, Ui};
use raman_scope::spectral::frame::Frame;

use crate::state::AppState;

// ---------------------------------------------------------------------------
// Camera preview (bottom panel)
// ---------------------------------------------------------------------------

/// Downsample `frame` by `step` in both directions into an egui image.
/// Single-channel frames are shown as grey.
pub fn frame_to_image(frame: &Frame, step: usize) -> ColorImage {
    let step = step.max(1);
    let width = frame.width().div_ceil(step);
    let height = frame.height().div_ceil(step);
    let channels = frame.channels();

    let mut pixels = Vec::with_capacity(width * height);
    for row in (0..frame.height()).step_by(step) {
        let samples = frame.row(row);
        for col in (0..frame.width()).step_by(step) {
            let px = &samples[col * channels..(col + 1) * channels];
            pixels.push(match px {
                [r, g, b, ..] => Color32::from_rgb(*r, *g, *b),
                [v, ..] => Color32::from_gray(*v),
                [] => Color32::BLACK,
            });
        }
    }
    let mut image = ColorImage::new([width, height], Color32::BLACK);
    image.pixels = pixels;
    image
}

/// Render the most recent frame with the crop band marked.
pub fn camera_preview(ui: &mut Ui, state: &mut AppState) {
    let Some(frame) = state.session.latest_frame() else {
        ui.label("No frame yet.");
        return;
    };
    let (frame_width, frame_height) = (frame.width() as f32, frame.height() as f32);
    // Half resolution is plenty for aiming the slit.
    let image = frame_to_image(frame, 2);

    match &mut state.preview_texture {
        Some(texture) => texture.set(image, TextureOptions::LINEAR),
        None => {
            state.preview_texture =
                Some(ui.ctx().load_texture("camera_preview", image, TextureOptions::LINEAR));
        }
    }
    let Some(texture) = &state.preview_texture else {
        return;
    };

    let available = ui.available_size();
    let scale = (available.x / frame_width).min(available.y / frame_height);
    let size = egui::vec2(frame_width * scale, frame_height * scale);
    let response = ui.add(egui::Image::new((texture.id(), size)));

    let rect = response.rect;
    let band = state.session.pipeline().band();
    let stroke = Stroke::new(1.0, state.colors.band);
    for row in [band.start, band.end] {
        let y = rect.top() + row as f32 / frame_height * rect.height();
        ui.painter().hline(rect.x_range(), y, stroke);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn downsamples_and_keeps_colour() {
        let frame = Frame::from_fn(5, 3, 3, |r, c, ch| (r * 50 + c * 10 + ch) as u8);
        let image = frame_to_image(&frame, 2);
        assert_eq!(image.size, [3, 2]);
        // Row 2, column 4 of the frame.
        assert_eq!(image.pixels[5], Color32::from_rgb(140, 141, 142));
    }

    #[test]
    fn grey_frames() {
        let frame = Frame::from_fn(2, 1, 1, |_, c, _| c as u8 * 100);
        let image = frame_to_image(&frame, 1);
        assert_eq!(image.pixels, vec![Color32::from_gray(0), Color32::from_gray(100)]);
    }
}
