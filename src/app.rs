use eframe::egui;
use raman_scope::acquisition::FrameSource;
use raman_scope::Session;

use crate::state::AppState;
use crate::ui::{panels, plot, preview};

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

pub struct ScopeApp {
    pub state: AppState,
}

impl ScopeApp {
    pub fn new(session: Session<Box<dyn FrameSource>>) -> Self {
        Self {
            state: AppState::new(session),
        }
    }

    /// S saves, D captures a dark frame, Space pauses, Q quits.
    fn handle_keys(&mut self, ctx: &egui::Context) {
        let (save, dark, pause, quit) = ctx.input(|i| {
            (
                i.key_pressed(egui::Key::S),
                i.key_pressed(egui::Key::D),
                i.key_pressed(egui::Key::Space),
                i.key_pressed(egui::Key::Q),
            )
        });
        if save {
            self.state.save_spectrum();
        }
        if dark {
            self.state.save_dark_frame();
        }
        if pause {
            self.state.toggle_pause();
        }
        if quit {
            self.state.request_quit();
        }
    }
}

impl eframe::App for ScopeApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.handle_keys(ctx);
        self.state.tick();

        // ---- Top panel: menu bar ----
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            panels::top_bar(ui, &mut self.state);
        });

        // ---- Left side panel: pipeline settings ----
        egui::SidePanel::left("settings_panel")
            .default_width(240.0)
            .resizable(true)
            .show(ctx, |ui| {
                panels::side_panel(ui, &self.state);
            });

        // ---- Bottom panel: camera preview ----
        if self.state.show_preview {
            egui::TopBottomPanel::bottom("preview_panel")
                .resizable(true)
                .default_height(220.0)
                .show(ctx, |ui| {
                    preview::camera_preview(ui, &mut self.state);
                });
        }

        // ---- Central panel: plot ----
        egui::CentralPanel::default().show(ctx, |ui| {
            plot::spectrum_plot(ui, &self.state);
        });

        if self.state.quit_requested {
            ctx.send_viewport_cmd(egui::ViewportCommand::Close);
        } else if !self.state.paused && self.state.session.is_running() {
            ctx.request_repaint();
        }
    }
}
