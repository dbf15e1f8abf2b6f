mod app;
mod color;
mod state;
mod ui;

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use eframe::egui;

use app::ScopeApp;
use raman_scope::acquisition::images::ImageSequenceSource;
use raman_scope::acquisition::synthetic::SyntheticSource;
use raman_scope::acquisition::FrameSource;
use raman_scope::io::dark_frame::load_dark_frame;
use raman_scope::{Pipeline, PipelineConfig, Session, Step};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum SourceKind {
    /// Built-in simulated slit image.
    Synthetic,
    /// PNG/JPEG frames replayed from a directory.
    Images,
}

/// Raman spectrometer terminal.
#[derive(Debug, Parser)]
#[command(name = "raman-scope", version, about)]
struct Cli {
    /// JSON config file; missing keys keep their defaults.
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = SourceKind::Synthetic)]
    source: SourceKind,

    /// Directory of frames for `--source images`.
    #[arg(long, required_if_eq("source", "images"))]
    images: Option<PathBuf>,

    /// Dark reference to subtract (overrides the config).
    #[arg(long)]
    dark_frame: Option<PathBuf>,

    /// Where spectrum exports are written (overrides the config).
    #[arg(long)]
    export_dir: Option<PathBuf>,

    /// Number of frames to average (overrides the config).
    #[arg(long)]
    rolling: Option<usize>,

    /// Enable fluorescence baseline removal.
    #[arg(long)]
    baseline: bool,

    /// Run without a window and export the final spectrum.
    #[arg(long)]
    headless: bool,

    /// Stop after this many frames.
    #[arg(long)]
    frames: Option<u64>,

    /// Seed for the synthetic source.
    #[arg(long, default_value_t = 42)]
    seed: u64,
}

fn resolve_config(cli: &Cli) -> Result<PipelineConfig> {
    let mut config = match &cli.config {
        Some(path) => PipelineConfig::load(path)?,
        None => PipelineConfig::default(),
    };
    if let Some(path) = &cli.dark_frame {
        config.dark_frame_path = path.clone();
    }
    if let Some(dir) = &cli.export_dir {
        config.export_dir = dir.clone();
    }
    if let Some(depth) = cli.rolling {
        config.rolling_depth = depth;
    }
    if cli.baseline {
        config.baseline_removal_enabled = true;
    }
    config.validate().context("invalid configuration")?;
    Ok(config)
}

fn open_source(cli: &Cli, pipeline: &Pipeline) -> Result<Box<dyn FrameSource>> {
    let config = pipeline.config();
    let source: Box<dyn FrameSource> = match cli.source {
        SourceKind::Synthetic => {
            if cli.headless && cli.frames.is_none() {
                bail!("--headless with the synthetic source needs --frames <n>");
            }
            let synthetic = SyntheticSource::new(
                config.sensor_width,
                config.sensor_height,
                pipeline.band(),
                cli.seed,
            );
            match cli.frames {
                Some(limit) => Box::new(synthetic.with_limit(limit)),
                None => Box::new(synthetic),
            }
        }
        SourceKind::Images => {
            let Some(dir) = &cli.images else {
                bail!("--images <dir> is required with --source images");
            };
            Box::new(ImageSequenceSource::open(dir, !cli.headless)?)
        }
    };
    Ok(source)
}

fn build_session(cli: &Cli) -> Result<Session<Box<dyn FrameSource>>> {
    let config = resolve_config(cli)?;
    log::info!("Configuration: {config:?}");

    let dark = load_dark_frame(&config.dark_frame_path, config.sensor_width)?;
    let pipeline = Pipeline::new(config, dark).context("building pipeline")?;

    let cal = pipeline.calibration();
    if let (Some(first), Some(last)) = (cal.wavelengths().first(), cal.wavelengths().last()) {
        log::info!(
            "Calibration: {first:.2} nm .. {last:.2} nm, {:.1} .. {:.1} 1/cm",
            cal.wavenumbers()[0],
            cal.wavenumbers()[cal.len() - 1]
        );
    }

    let source = open_source(cli, &pipeline)?;
    Ok(Session::new(pipeline, source))
}

/// Process frames without a window, then export the last spectrum once.
/// Any rejected frame aborts the run.
fn run_headless(cli: &Cli, mut session: Session<Box<dyn FrameSource>>) -> Result<()> {
    let mut processed = 0u64;
    loop {
        if cli.frames.is_some_and(|limit| processed >= limit) {
            session.stop();
            break;
        }
        match session.step()? {
            Step::Processed => processed += 1,
            Step::Rejected(e) => return Err(e).context("frame rejected in headless mode"),
            Step::Stopped => break,
        }
    }

    if processed == 0 {
        bail!("source produced no frames");
    }
    let dir = session.pipeline().config().export_dir.clone();
    let path = session.save_spectrum(&dir)?;
    println!("Processed {processed} frames; spectrum saved to {}", path.display());
    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let session = build_session(&cli)?;
    if cli.headless {
        return run_headless(&cli, session);
    }

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1200.0, 800.0])
            .with_min_inner_size([600.0, 400.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Raman Scope – Spectrometer Terminal",
        options,
        Box::new(move |_cc| Ok(Box::new(ScopeApp::new(session.with_frame_preview(true))))),
    )
    .map_err(|e| anyhow::anyhow!("GUI failed: {e}"))
}
