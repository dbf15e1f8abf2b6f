use std::path::Path;

use raman_scope::acquisition::synthetic::{Line, SyntheticSource};
use raman_scope::acquisition::FrameSource;
use raman_scope::io::dark_frame::write_dark_frame;
use raman_scope::{Pipeline, PipelineConfig};

/// Frames written to `sample_frames/`.
const FRAME_COUNT: u64 = 12;
/// Frames averaged into the dark capture.
const DARK_DEPTH: usize = 8;

fn main() {
    let config = PipelineConfig {
        rolling_depth: DARK_DEPTH,
        ..PipelineConfig::default()
    };
    let pipeline = Pipeline::new(config.clone(), None).expect("default config is valid");
    let (width, height) = (config.sensor_width, config.sensor_height);

    // ---- Illuminated frames: a few lines on a fluorescence hump ----
    let w = width as f64;
    let lines = [
        Line { column: 0.22 * w, sigma: 3.0, amplitude: 70.0 },
        Line { column: 0.41 * w, sigma: 5.0, amplitude: 120.0 },
        Line { column: 0.43 * w, sigma: 4.0, amplitude: 45.0 },
        Line { column: 0.66 * w, sigma: 6.0, amplitude: 95.0 },
    ];
    let mut source =
        SyntheticSource::with_lines(width, height, pipeline.band(), &lines, 60.0, 42)
            .with_limit(FRAME_COUNT);

    let out_dir = Path::new("sample_frames");
    std::fs::create_dir_all(out_dir).expect("Failed to create sample_frames/");
    let mut written = 0;
    while let Some(frame) = source.next_frame().expect("synthetic frames never fail") {
        let img = image::RgbImage::from_raw(
            frame.width() as u32,
            frame.height() as u32,
            frame.as_bytes().to_vec(),
        )
        .expect("frame buffer matches its dimensions");
        let path = out_dir.join(format!("frame_{written:04}.png"));
        img.save(&path).expect("Failed to write frame");
        written += 1;
    }

    // ---- Dark capture: same sensor, laser blocked ----
    let mut dark_source =
        SyntheticSource::with_lines(width, height, pipeline.band(), &[], 0.0, 7)
            .with_limit(DARK_DEPTH as u64);
    let mut state = pipeline.new_state();
    let mut dark = None;
    while let Some(frame) = dark_source.next_frame().expect("synthetic frames never fail") {
        dark = Some(
            pipeline
                .process_one_frame(&mut state, frame)
                .expect("synthetic frame matches the sensor"),
        );
    }
    let dark = dark.expect("at least one dark frame");
    write_dark_frame(Path::new("dark_frame.csv"), &dark.smoothed)
        .expect("Failed to write dark_frame.csv");

    println!(
        "Wrote {written} frames ({width}x{height}) to {} and dark_frame.csv",
        out_dir.display()
    );
}
