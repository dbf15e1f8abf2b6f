use eframe::egui::Color32;
use palette::{Hsl, IntoColor, Srgb};

// ---------------------------------------------------------------------------
// Color palette generator
// ---------------------------------------------------------------------------

/// Generates `n` visually distinct colours using evenly spaced hues.
pub fn generate_palette(n: usize) -> Vec<Color32> {
    if n == 0 {
        return Vec::new();
    }
    (0..n)
        .map(|i| {
            let hue = 220.0 + (i as f32 / n as f32) * 360.0;
            let hsl = Hsl::new(hue, 0.75, 0.55);
            let rgb: Srgb = hsl.into_color();
            Color32::from_rgb(
                (rgb.red * 255.0) as u8,
                (rgb.green * 255.0) as u8,
                (rgb.blue * 255.0) as u8,
            )
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Trace colours
// ---------------------------------------------------------------------------

/// Colours for the two spectrum traces and the band markers.
#[derive(Debug, Clone, Copy)]
pub struct TracePalette {
    /// Dark-subtracted, zero-floored trace (always drawn, dimmed).
    pub normalized: Color32,
    /// Fluorescence-corrected trace.
    pub corrected: Color32,
    /// Crop band lines on the camera preview.
    pub band: Color32,
}

impl Default for TracePalette {
    fn default() -> Self {
        let hues = generate_palette(2);
        TracePalette {
            normalized: hues[0].gamma_multiply(0.5),
            corrected: hues[1],
            band: Color32::GREEN,
        }
    }
}
