use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;

use super::{read_parquet_columns, TableFormat};
use crate::spectral::dark::DarkFrame;

const INTENSITY: &str = "Intensity";

/// Load a dark reference from a table with an `Intensity` column.
///
/// A missing file is not an error: it yields `Ok(None)` and the pipeline
/// falls back to an all-zero reference. A file whose row count differs from
/// `width` is rejected.
pub fn load_dark_frame(path: &Path, width: usize) -> Result<Option<DarkFrame>> {
    if !path.exists() {
        log::info!(
            "No dark frame at {}; using an all-zero reference",
            path.display()
        );
        return Ok(None);
    }

    let intensities = match TableFormat::from_path(path)? {
        TableFormat::Csv => read_csv_intensities(path),
        TableFormat::Parquet => read_parquet_columns(path, &[INTENSITY])
            .map(|mut cols| cols.pop().unwrap_or_default()),
    }
    .with_context(|| format!("reading dark frame {}", path.display()))?;

    let dark = DarkFrame::from_intensities(intensities, width)
        .with_context(|| format!("dark frame {}", path.display()))?;
    log::info!("Loaded dark frame from {} ({width} columns)", path.display());
    Ok(Some(dark))
}

fn read_csv_intensities(path: &Path) -> Result<Vec<f64>> {
    let mut reader = csv::Reader::from_path(path).context("opening CSV")?;
    let idx = reader
        .headers()
        .context("reading CSV headers")?
        .iter()
        .position(|h| h.trim() == INTENSITY)
        .context("CSV missing 'Intensity' column")?;

    let mut values = Vec::new();
    for (row_no, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("CSV row {row_no}"))?;
        let cell = record.get(idx).unwrap_or("").trim();
        let value = cell
            .parse::<f64>()
            .with_context(|| format!("CSV row {row_no}: '{cell}' is not a number"))?;
        values.push(value);
    }
    Ok(values)
}

#[derive(Serialize)]
struct DarkRow {
    #[serde(rename = "Pixel")]
    pixel: usize,
    #[serde(rename = "Intensity")]
    intensity: f64,
}

/// Record a dark capture as CSV (`Pixel,Intensity`) for the next session.
pub fn write_dark_frame(path: &Path, intensities: &[f64]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("creating dark frame {}", path.display()))?;
    for (pixel, &intensity) in intensities.iter().enumerate() {
        writer.serialize(DarkRow { pixel, intensity })?;
    }
    writer.flush().context("flushing dark frame")?;
    log::info!("Dark frame saved to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_means_zero_reference() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = load_dark_frame(&dir.path().join("dark_frame.csv"), 8).unwrap();
        assert!(loaded.is_none());
    }

    #[test]
    fn capture_then_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dark_frame.csv");
        write_dark_frame(&path, &[1.5, 2.0, 0.25]).unwrap();

        let dark = load_dark_frame(&path, 3).unwrap().unwrap();
        assert_eq!(dark.intensities(), &[1.5, 2.0, 0.25]);
        assert!(dark.is_captured());
    }

    #[test]
    fn reads_intensity_among_other_columns() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dark.csv");
        std::fs::write(
            &path,
            "Wavelength,Intensity,Wavenumber\n500,3,10\n501,4,9\n",
        )
        .unwrap();
        let dark = load_dark_frame(&path, 2).unwrap().unwrap();
        assert_eq!(dark.intensities(), &[3.0, 4.0]);
    }

    #[test]
    fn wrong_row_count_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dark_frame.csv");
        write_dark_frame(&path, &[1.0, 2.0]).unwrap();
        let err = load_dark_frame(&path, 3).unwrap_err();
        assert!(format!("{err:#}").contains("3 columns wide"));
    }

    #[test]
    fn missing_intensity_column_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dark.csv");
        std::fs::write(&path, "Pixel,Counts\n0,1\n").unwrap();
        assert!(load_dark_frame(&path, 1).is_err());
    }

    #[test]
    fn parquet_dark_frame() {
        use crate::io::export::{write_spectrum, SpectrumExport};

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dark.parquet");
        let export = SpectrumExport {
            wavelengths: vec![500.0, 501.0],
            wavenumbers: vec![-1200.0, -1240.0],
            intensities: vec![7.0, 8.0],
        };
        write_spectrum(&path, &export).unwrap();
        let dark = load_dark_frame(&path, 2).unwrap().unwrap();
        assert_eq!(dark.intensities(), &[7.0, 8.0]);
    }
}
