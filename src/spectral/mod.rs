/// Spectral core: calibration, reduction, smoothing and correction.
///
/// Architecture:
/// ```text
///   camera Frame
///        │
///        ▼
///   ┌──────────┐
///   │  frame    │  average band rows × channels → raw spectrum
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │ rolling   │  mean of the last N raw spectra
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  dark     │  subtract dark reference, zero-floor for display
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │ baseline  │  optional rolling-minimum fluorescence removal
///   └──────────┘
/// ```
///
/// `calibration` supplies the wavelength / wavenumber axis every stage's
/// output lines up with. `pipeline` wires the stages together.

pub mod baseline;
pub mod calibration;
pub mod dark;
pub mod frame;
pub mod pipeline;
pub mod rolling;
