use eframe::egui::Ui;
use egui_plot::{Line, Plot, PlotPoints};

use crate::state::AppState;

// ---------------------------------------------------------------------------
// Spectrum plot (central panel)
// ---------------------------------------------------------------------------

/// Pair each intensity with its wavenumber.
fn trace<'a>(wavenumbers: &'a [f64], intensities: &'a [f64]) -> PlotPoints<'a> {
    wavenumbers
        .iter()
        .zip(intensities)
        .map(|(&x, &y)| [x, y])
        .collect()
}

/// Render the live spectrum against Raman shift.
pub fn spectrum_plot(ui: &mut Ui, state: &AppState) {
    let spectrum = match state.session.latest() {
        Some(s) => s,
        None => {
            ui.centered_and_justified(|ui: &mut Ui| {
                ui.heading("Waiting for the first frame…");
            });
            return;
        }
    };
    let wavenumbers = state.session.pipeline().calibration().wavenumbers();
    let colors = state.colors;

    Plot::new("spectrum_plot")
        .legend(egui_plot::Legend::default())
        .x_axis_label("Wavenumber (1/cm)")
        .y_axis_label("Intensity (arb.)")
        .include_y(0.0)
        .include_y(255.0)
        .allow_boxed_zoom(true)
        .allow_drag(true)
        .allow_scroll(true)
        .allow_zoom(true)
        .show(ui, |plot_ui| {
            plot_ui.line(
                Line::new(trace(wavenumbers, &spectrum.normalized))
                    .name("Dark-subtracted")
                    .color(colors.normalized)
                    .width(1.0),
            );

            if let Some(corrected) = &spectrum.corrected {
                plot_ui.line(
                    Line::new(trace(wavenumbers, corrected))
                        .name("Fluorescence removed")
                        .color(colors.corrected)
                        .width(1.5),
                );
            }
        });
}
