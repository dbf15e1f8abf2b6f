/// File contracts at the edge of the pipeline.
///
/// ```text
///   dark_frame.csv / .parquet            spectrum_<timestamp>.csv / .parquet
///        │                                         ▲
///        ▼                                         │
///   ┌────────────┐                           ┌──────────┐
///   │ dark_frame │  Intensity column →       │  export  │  Wavelength,
///   └────────────┘  DarkFrame                └──────────┘  Wavenumber, Intensity
/// ```

pub mod dark_frame;
pub mod export;

use std::path::Path;

use anyhow::{bail, Context, Result};
use arrow::array::{Array, Float32Array, Float64Array};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;

/// Tabular formats understood on both the read and write side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableFormat {
    Csv,
    Parquet,
}

impl TableFormat {
    /// Pick the format from the file extension.
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_ascii_lowercase();

        match ext.as_str() {
            "csv" => Ok(TableFormat::Csv),
            "parquet" | "pq" => Ok(TableFormat::Parquet),
            other => bail!("Unsupported file extension: .{other}"),
        }
    }
}

/// Read whole Float64 (or Float32) columns out of a Parquet file, in the
/// order given by `names`. Null cells become NaN.
pub(crate) fn read_parquet_columns(path: &Path, names: &[&str]) -> Result<Vec<Vec<f64>>> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("opening parquet file {}", path.display()))?;
    let builder =
        ParquetRecordBatchReaderBuilder::try_new(file).context("reading parquet metadata")?;
    let reader = builder.build().context("building parquet reader")?;

    let mut columns: Vec<Vec<f64>> = vec![Vec::new(); names.len()];
    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        let schema = batch.schema();
        for (name, out) in names.iter().zip(columns.iter_mut()) {
            let idx = schema
                .index_of(name)
                .map_err(|_| anyhow::anyhow!("Parquet file missing '{name}' column"))?;
            let col = batch.column(idx);
            if let Some(arr) = col.as_any().downcast_ref::<Float64Array>() {
                out.extend(arr.iter().map(|v| v.unwrap_or(f64::NAN)));
            } else if let Some(arr) = col.as_any().downcast_ref::<Float32Array>() {
                out.extend(arr.iter().map(|v| v.unwrap_or(f32::NAN) as f64));
            } else {
                bail!(
                    "Column '{name}' is {:?}, expected Float64 or Float32",
                    col.data_type()
                );
            }
        }
    }
    Ok(columns)
}
