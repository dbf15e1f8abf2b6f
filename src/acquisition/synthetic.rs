use std::ops::Range;

use anyhow::Result;

use super::FrameSource;
use crate::spectral::frame::Frame;

// ---------------------------------------------------------------------------
// Deterministic noise
// ---------------------------------------------------------------------------

/// Minimal deterministic PRNG (xoshiro256**)
#[derive(Debug, Clone)]
pub struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    pub fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    pub fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5)).rotate_left(7).wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    pub fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Box-Muller transform for normal distribution
    pub fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }
}

fn gaussian(x: f64, mu: f64, sigma: f64, amplitude: f64) -> f64 {
    amplitude * (-(x - mu).powi(2) / (2.0 * sigma.powi(2))).exp()
}

// ---------------------------------------------------------------------------
// SyntheticSource – fake camera for demos and tests
// ---------------------------------------------------------------------------

/// A Raman line: centre column, width in columns, peak counts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Line {
    pub column: f64,
    pub sigma: f64,
    pub amplitude: f64,
}

/// Generates frames of a slit image: sharp lines on a broad fluorescence
/// hump, lit only inside `band`, with a constant dark offset and uniform
/// pixel noise everywhere.
#[derive(Debug, Clone)]
pub struct SyntheticSource {
    width: usize,
    height: usize,
    band: Range<usize>,
    /// Counts per column at full illumination, before noise.
    profile: Vec<f64>,
    dark_level: f64,
    noise: u8,
    rng: SimpleRng,
    emitted: u64,
    limit: Option<u64>,
}

impl SyntheticSource {
    /// Default scene: three lines on a hump, scaled to the sensor width.
    pub fn new(width: usize, height: usize, band: Range<usize>, seed: u64) -> Self {
        let w = width as f64;
        let lines = [
            Line { column: 0.30 * w, sigma: 0.004 * w, amplitude: 90.0 },
            Line { column: 0.52 * w, sigma: 0.003 * w, amplitude: 140.0 },
            Line { column: 0.71 * w, sigma: 0.005 * w, amplitude: 60.0 },
        ];
        Self::with_lines(width, height, band, &lines, 50.0, seed)
    }

    /// Custom scene. `fluorescence` is the height of the broad hump.
    pub fn with_lines(
        width: usize,
        height: usize,
        band: Range<usize>,
        lines: &[Line],
        fluorescence: f64,
        seed: u64,
    ) -> Self {
        let w = width.max(1) as f64;
        let profile = (0..width)
            .map(|col| {
                let x = col as f64;
                let hump = gaussian(x, 0.45 * w, 0.35 * w, fluorescence);
                let lines: f64 = lines
                    .iter()
                    .map(|l| gaussian(x, l.column, l.sigma, l.amplitude))
                    .sum();
                hump + lines
            })
            .collect();

        SyntheticSource {
            width,
            height,
            band,
            profile,
            dark_level: 6.0,
            noise: 4,
            rng: SimpleRng::new(seed),
            emitted: 0,
            limit: None,
        }
    }

    /// Stop after `frames` frames.
    pub fn with_limit(mut self, frames: u64) -> Self {
        self.limit = Some(frames);
        self
    }

    /// Peak-to-peak uniform noise added to every sample.
    pub fn with_noise(mut self, noise: u8) -> Self {
        self.noise = noise;
        self
    }

    /// Noise-free counts per column inside the band.
    pub fn profile(&self) -> &[f64] {
        &self.profile
    }

    pub fn render(&mut self) -> Frame {
        // Laser power jitter, shared by the whole frame.
        let gain = self.rng.gauss(1.0, 0.02).max(0.0);
        let noise = self.noise as u64 + 1;
        let half = (self.noise / 2) as f64;

        let mut pool = 0u64;
        let mut pool_left = 0;
        let (band, profile, dark) = (self.band.clone(), &self.profile, self.dark_level);
        let rng = &mut self.rng;
        Frame::from_fn(self.width, self.height, 3, |row, col, _| {
            if pool_left == 0 {
                pool = rng.next_u64();
                pool_left = 8;
            }
            let jitter = ((pool & 0xff) % noise) as f64 - half;
            pool >>= 8;
            pool_left -= 1;

            let signal = if band.contains(&row) { profile[col] * gain } else { 0.0 };
            (dark + signal + jitter).round().clamp(0.0, 255.0) as u8
        })
    }
}

impl FrameSource for SyntheticSource {
    fn next_frame(&mut self) -> Result<Option<Frame>> {
        if self.limit.is_some_and(|limit| self.emitted >= limit) {
            return Ok(None);
        }
        self.emitted += 1;
        Ok(Some(self.render()))
    }

    fn describe(&self) -> String {
        format!("synthetic {}x{} slit", self.width, self.height)
    }
}
