// ---------------------------------------------------------------------------
// CalibrationModel – pixel index → wavelength → Raman shift
// ---------------------------------------------------------------------------

/// Conversion factor between nanometres and reciprocal centimetres.
const NM_TO_INV_CM: f64 = 1e7;

/// Static pixel → wavelength → wavenumber mapping, built once at startup.
///
/// `wavelengths[i] = slope * i + intercept` and
/// `wavenumbers[i] = 1e7 / wavelengths[i] - 1e7 / laser_wavelength_nm`.
///
/// With `slope > 0` the wavelength axis rises and the wavenumber axis falls;
/// callers plotting in ascending wavenumber order must reverse.
///
/// No validation happens here; a zero wavelength yields an infinite
/// wavenumber. [`PipelineConfig::validate`] rejects such setups up front.
///
/// [`PipelineConfig::validate`]: crate::config::PipelineConfig::validate
#[derive(Debug, Clone, PartialEq)]
pub struct CalibrationModel {
    slope: f64,
    intercept: f64,
    laser_wavelength_nm: f64,
    wavelengths: Vec<f64>,
    wavenumbers: Vec<f64>,
}

impl CalibrationModel {
    pub fn new(slope: f64, intercept: f64, laser_wavelength_nm: f64, sensor_width: usize) -> Self {
        let laser_wavenumber = NM_TO_INV_CM / laser_wavelength_nm;
        let wavelengths: Vec<f64> = (0..sensor_width)
            .map(|i| slope * i as f64 + intercept)
            .collect();
        let wavenumbers = wavelengths
            .iter()
            .map(|&wl| NM_TO_INV_CM / wl - laser_wavenumber)
            .collect();

        CalibrationModel {
            slope,
            intercept,
            laser_wavelength_nm,
            wavelengths,
            wavenumbers,
        }
    }

    pub fn slope(&self) -> f64 {
        self.slope
    }

    pub fn intercept(&self) -> f64 {
        self.intercept
    }

    pub fn laser_wavelength_nm(&self) -> f64 {
        self.laser_wavelength_nm
    }

    /// Wavelength (nm) of every sensor column.
    pub fn wavelengths(&self) -> &[f64] {
        &self.wavelengths
    }

    /// Raman shift (1/cm) of every sensor column.
    pub fn wavenumbers(&self) -> &[f64] {
        &self.wavenumbers
    }

    /// Number of sensor columns covered.
    pub fn len(&self) -> usize {
        self.wavelengths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.wavelengths.is_empty()
    }

    /// `(min, max)` of the wavenumber axis, or `None` for an empty model.
    pub fn wavenumber_range(&self) -> Option<(f64, f64)> {
        if self.wavenumbers.is_empty() {
            return None;
        }
        let min = self.wavenumbers.iter().cloned().fold(f64::INFINITY, f64::min);
        let max = self.wavenumbers.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        Some((min, max))
    }
}
