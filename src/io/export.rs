use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use arrow::array::Float64Array;
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use chrono::NaiveDateTime;
use parquet::arrow::ArrowWriter;
use serde::{Deserialize, Serialize};

use super::{read_parquet_columns, TableFormat};

const WAVELENGTH: &str = "Wavelength";
const WAVENUMBER: &str = "Wavenumber";
const INTENSITY: &str = "Intensity";

// ---------------------------------------------------------------------------
// SpectrumExport – the three columns of a saved spectrum
// ---------------------------------------------------------------------------

/// One saved spectrum: one row per sensor column, in calibration order.
#[derive(Debug, Clone, PartialEq)]
pub struct SpectrumExport {
    /// nm
    pub wavelengths: Vec<f64>,
    /// 1/cm
    pub wavenumbers: Vec<f64>,
    /// Display-normalized, dark-subtracted intensity.
    pub intensities: Vec<f64>,
}

impl SpectrumExport {
    pub fn len(&self) -> usize {
        self.intensities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.intensities.is_empty()
    }

    fn check_lengths(&self) -> Result<()> {
        let n = self.intensities.len();
        if self.wavelengths.len() != n || self.wavenumbers.len() != n {
            bail!(
                "column lengths differ: {} wavelengths, {} wavenumbers, {} intensities",
                self.wavelengths.len(),
                self.wavenumbers.len(),
                n
            );
        }
        Ok(())
    }
}

/// CSV row layout, header names as written to disk.
#[derive(Debug, Serialize, Deserialize)]
struct SpectrumRow {
    #[serde(rename = "Wavelength")]
    wavelength: f64,
    #[serde(rename = "Wavenumber")]
    wavenumber: f64,
    #[serde(rename = "Intensity")]
    intensity: f64,
}

// ---------------------------------------------------------------------------
// File naming
// ---------------------------------------------------------------------------

/// `spectrum_<YYYYMMDD_HHMMSS>.csv` for the given export time.
pub fn default_file_name(at: NaiveDateTime) -> String {
    format!("spectrum_{}.csv", at.format("%Y%m%d_%H%M%S"))
}

/// Save `export` under `dir` with a name stamped with the current local time.
pub fn save_timestamped(dir: &Path, export: &SpectrumExport) -> Result<PathBuf> {
    let path = dir.join(default_file_name(chrono::Local::now().naive_local()));
    write_spectrum(&path, export)?;
    Ok(path)
}

// ---------------------------------------------------------------------------
// Writing
// ---------------------------------------------------------------------------

/// Write a spectrum file. Format follows the extension (`.csv` or `.parquet`).
pub fn write_spectrum(path: &Path, export: &SpectrumExport) -> Result<()> {
    export.check_lengths()?;
    let written = match TableFormat::from_path(path)? {
        TableFormat::Csv => write_csv(path, export),
        TableFormat::Parquet => write_parquet(path, export),
    };
    written.with_context(|| format!("writing spectrum {}", path.display()))?;

    log::info!("Spectrum saved to {}", path.display());
    Ok(())
}

fn write_csv(path: &Path, export: &SpectrumExport) -> Result<()> {
    let mut writer = csv::Writer::from_path(path).context("creating CSV")?;
    for i in 0..export.len() {
        writer.serialize(SpectrumRow {
            wavelength: export.wavelengths[i],
            wavenumber: export.wavenumbers[i],
            intensity: export.intensities[i],
        })?;
    }
    writer.flush().context("flushing CSV")?;
    Ok(())
}

fn write_parquet(path: &Path, export: &SpectrumExport) -> Result<()> {
    let schema = Arc::new(Schema::new(vec![
        Field::new(WAVELENGTH, DataType::Float64, false),
        Field::new(WAVENUMBER, DataType::Float64, false),
        Field::new(INTENSITY, DataType::Float64, false),
    ]));

    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            Arc::new(Float64Array::from(export.wavelengths.clone())),
            Arc::new(Float64Array::from(export.wavenumbers.clone())),
            Arc::new(Float64Array::from(export.intensities.clone())),
        ],
    )
    .context("building record batch")?;

    let file = std::fs::File::create(path).context("creating parquet file")?;
    let mut writer = ArrowWriter::try_new(file, schema, None).context("creating parquet writer")?;
    writer.write(&batch).context("writing record batch")?;
    writer.close().context("closing parquet writer")?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Reading back
// ---------------------------------------------------------------------------

/// Load a spectrum file written by [`write_spectrum`].
pub fn read_spectrum(path: &Path) -> Result<SpectrumExport> {
    let export = match TableFormat::from_path(path)? {
        TableFormat::Csv => read_csv(path),
        TableFormat::Parquet => read_parquet(path),
    }
    .with_context(|| format!("reading spectrum {}", path.display()))?;
    export.check_lengths()?;
    Ok(export)
}

fn read_csv(path: &Path) -> Result<SpectrumExport> {
    let mut reader = csv::Reader::from_path(path).context("opening CSV")?;
    let mut export = SpectrumExport {
        wavelengths: Vec::new(),
        wavenumbers: Vec::new(),
        intensities: Vec::new(),
    };
    for (row_no, result) in reader.deserialize::<SpectrumRow>().enumerate() {
        let row = result.with_context(|| format!("CSV row {row_no}"))?;
        export.wavelengths.push(row.wavelength);
        export.wavenumbers.push(row.wavenumber);
        export.intensities.push(row.intensity);
    }
    Ok(export)
}

fn read_parquet(path: &Path) -> Result<SpectrumExport> {
    let mut columns = read_parquet_columns(path, &[WAVELENGTH, WAVENUMBER, INTENSITY])?;
    let intensities = columns.pop().unwrap_or_default();
    let wavenumbers = columns.pop().unwrap_or_default();
    let wavelengths = columns.pop().unwrap_or_default();
    Ok(SpectrumExport {
        wavelengths,
        wavenumbers,
        intensities,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spectral::calibration::CalibrationModel;

    fn sample_export() -> SpectrumExport {
        let cal = CalibrationModel::new(0.5378783977636364, 251.83884117409121, 532.0, 16);
        SpectrumExport {
            wavelengths: cal.wavelengths().to_vec(),
            wavenumbers: cal.wavenumbers().to_vec(),
            intensities: (0..16).map(|i| (i as f64 * 0.37).sin().abs() * 40.0).collect(),
        }
    }

    #[test]
    fn file_name_uses_export_time() {
        let at = chrono::NaiveDate::from_ymd_opt(2024, 3, 9)
            .unwrap()
            .and_hms_opt(7, 5, 42)
            .unwrap();
        assert_eq!(default_file_name(at), "spectrum_20240309_070542.csv");
    }

    #[test]
    fn csv_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("spectrum.csv");
        let export = sample_export();
        write_spectrum(&path, &export).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text.lines().next(), Some("Wavelength,Wavenumber,Intensity"));
        assert_eq!(text.lines().count(), 17);

        let back = read_spectrum(&path).unwrap();
        for (a, b) in back.intensities.iter().zip(&export.intensities) {
            assert!((a - b).abs() < 1e-12);
        }
        for (a, b) in back.wavelengths.iter().zip(&export.wavelengths) {
            assert!((a - b).abs() < 1e-12);
        }
        for (a, b) in back.wavenumbers.iter().zip(&export.wavenumbers) {
            assert!((a - b).abs() < 1e-9);
        }
        assert_eq!(back.len(), export.len());
    }

    #[test]
    fn parquet_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("spectrum.parquet");
        let export = sample_export();
        write_spectrum(&path, &export).unwrap();
        assert_eq!(read_spectrum(&path).unwrap(), export);
    }

    #[test]
    fn timestamped_save_lands_in_dir() {
        let dir = tempfile::tempdir().unwrap();
        let path = save_timestamped(dir.path(), &sample_export()).unwrap();
        let name = path.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("spectrum_") && name.ends_with(".csv"), "{name}");
        assert!(path.exists());
    }

    #[test]
    fn mismatched_columns_refused() {
        let dir = tempfile::tempdir().unwrap();
        let mut export = sample_export();
        export.intensities.pop();
        assert!(write_spectrum(&dir.path().join("bad.csv"), &export).is_err());
    }

    #[test]
    fn unknown_extension_refused() {
        let dir = tempfile::tempdir().unwrap();
        assert!(write_spectrum(&dir.path().join("spectrum.txt"), &sample_export()).is_err());
    }
}
