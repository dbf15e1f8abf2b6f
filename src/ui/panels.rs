use eframe::egui::{self, Color32, RichText, Ui};
use egui_extras::{Column, TableBuilder};
use raman_scope::io::export::default_file_name;

use crate::state::AppState;

// ---------------------------------------------------------------------------
// Left side panel – pipeline settings (read-only for the session)
// ---------------------------------------------------------------------------

/// Render the settings summary.
pub fn side_panel(ui: &mut Ui, state: &AppState) {
    ui.heading("Pipeline");
    ui.separator();

    let pipeline = state.session.pipeline();
    let config = pipeline.config();
    let band = pipeline.band();
    let dark = if pipeline.dark_frame().is_captured() {
        config.dark_frame_path.display().to_string()
    } else {
        "none (zero)".to_string()
    };
    let range = pipeline
        .calibration()
        .wavenumber_range()
        .map(|(lo, hi)| format!("{lo:.0} .. {hi:.0} 1/cm"))
        .unwrap_or_default();

    let rows: Vec<(&str, String)> = vec![
        ("Sensor", format!("{} x {}", config.sensor_width, config.sensor_height)),
        ("Calibration", format!("{:.4} nm/px + {:.2} nm", config.slope, config.intercept)),
        ("Laser", format!("{} nm", config.laser_wavelength_nm)),
        ("Shift range", range),
        ("Band rows", format!("{} .. {}", band.start, band.end)),
        ("Rolling depth", config.rolling_depth.to_string()),
        (
            "Baseline",
            if config.baseline_removal_enabled {
                format!("on, window {}", config.baseline_window_size)
            } else {
                "off".to_string()
            },
        ),
        ("Mirrored", config.flip_horizontal.to_string()),
        ("Dark frame", dark),
        ("Exports", config.export_dir.display().to_string()),
        ("Source", state.session.source().describe()),
    ];

    TableBuilder::new(ui)
        .striped(true)
        .column(Column::auto())
        .column(Column::remainder())
        .header(20.0, |mut header| {
            header.col(|ui| {
                ui.strong("Option");
            });
            header.col(|ui| {
                ui.strong("Value");
            });
        })
        .body(|mut body| {
            for (name, value) in &rows {
                body.row(18.0, |mut row| {
                    row.col(|ui| {
                        ui.label(*name);
                    });
                    row.col(|ui| {
                        ui.label(value);
                    });
                });
            }
        });
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Save spectrum  (S)").clicked() {
                state.save_spectrum();
                ui.close_menu();
            }
            if ui.button("Export as…").clicked() {
                export_file_dialog(state);
                ui.close_menu();
            }
            if ui.button("Capture dark frame  (D)").clicked() {
                state.save_dark_frame();
                ui.close_menu();
            }
            ui.separator();
            if ui.button("Quit  (Q)").clicked() {
                state.request_quit();
                ui.close_menu();
            }
        });

        ui.separator();

        let label = if state.paused { "Resume" } else { "Pause" };
        if ui.selectable_label(state.paused, label).clicked() {
            state.toggle_pause();
        }
        if ui.selectable_label(state.show_preview, "Camera").clicked() {
            state.show_preview = !state.show_preview;
        }

        ui.separator();

        let session = &state.session;
        let frames = session.state().frames_processed();
        ui.label(format!("{frames} frames"));
        if !session.state().is_warmed_up() {
            let depth = session.state().rolling_depth();
            ui.label(
                RichText::new(format!("warming up {frames}/{depth}")).color(Color32::YELLOW),
            );
        }
        if session.rejected() > 0 {
            ui.label(format!("{} dropped", session.rejected()));
        }

        if let Some(status) = &state.status {
            ui.separator();
            let color = if status.is_error {
                Color32::RED
            } else {
                Color32::LIGHT_GREEN
            };
            ui.label(RichText::new(&status.text).color(color));
        }
    });
}

// ---------------------------------------------------------------------------
// File dialog
// ---------------------------------------------------------------------------

pub fn export_file_dialog(state: &mut AppState) {
    let config = state.session.pipeline().config();
    let file = rfd::FileDialog::new()
        .set_title("Export spectrum")
        .add_filter("CSV", &["csv"])
        .add_filter("Parquet", &["parquet"])
        .set_directory(&config.export_dir)
        .set_file_name(default_file_name(chrono::Local::now().naive_local()))
        .save_file();

    if let Some(path) = file {
        state.export_to(&path);
    }
}
