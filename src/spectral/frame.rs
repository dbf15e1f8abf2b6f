use std::ops::Range;

use crate::error::{PipelineError, PipelineResult, Stage};

// ---------------------------------------------------------------------------
// Frame – one camera image, interleaved 8-bit samples
// ---------------------------------------------------------------------------

/// A 2-D colour frame stored row-major with interleaved channels
/// (`height × width × channels`, 8 bits per sample).
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    width: usize,
    height: usize,
    channels: usize,
    data: Vec<u8>,
}

impl Frame {
    /// Wrap raw samples. Fails if `data` does not hold exactly
    /// `width * height * channels` samples or if `channels` is zero.
    pub fn new(width: usize, height: usize, channels: usize, data: Vec<u8>) -> PipelineResult<Self> {
        if channels == 0 {
            return Err(PipelineError::shape(
                Stage::FrameReducer,
                "frame has zero colour channels",
            ));
        }
        let expected = width * height * channels;
        if data.len() != expected {
            return Err(PipelineError::shape(
                Stage::FrameReducer,
                format!(
                    "frame buffer holds {} samples, expected {width}x{height}x{channels} = {expected}",
                    data.len()
                ),
            ));
        }
        Ok(Frame {
            width,
            height,
            channels,
            data,
        })
    }

    /// Build a frame by evaluating `f(row, col, channel)` for every sample.
    pub fn from_fn(
        width: usize,
        height: usize,
        channels: usize,
        mut f: impl FnMut(usize, usize, usize) -> u8,
    ) -> Self {
        let mut data = Vec::with_capacity(width * height * channels);
        for row in 0..height {
            for col in 0..width {
                for ch in 0..channels {
                    data.push(f(row, col, ch));
                }
            }
        }
        Frame {
            width,
            height,
            channels,
            data,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn channels(&self) -> usize {
        self.channels
    }

    /// All samples, row-major, channels interleaved.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Samples of one row (`width * channels` bytes).
    pub fn row(&self, row: usize) -> &[u8] {
        let stride = self.width * self.channels;
        &self.data[row * stride..(row + 1) * stride]
    }

    /// Mirror the frame left/right, as the camera preview on the bench rig does.
    pub fn flip_horizontal(&mut self) {
        let stride = self.width * self.channels;
        let channels = self.channels;
        for row in self.data.chunks_exact_mut(stride.max(1)) {
            let mut left = 0;
            let mut right = self.width;
            while left + 1 < right {
                right -= 1;
                for ch in 0..channels {
                    row.swap(left * channels + ch, right * channels + ch);
                }
                left += 1;
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Frame reducer – 2-D band → 1-D raw spectrum
// ---------------------------------------------------------------------------

/// Collapse the rows in `band` of `frame` into one intensity per column,
/// averaging over every row of the band and every colour channel.
///
/// An empty band or one reaching past the frame is an input-contract
/// violation and is rejected rather than producing NaNs.
pub fn reduce_band(frame: &Frame, band: Range<usize>) -> PipelineResult<Vec<f64>> {
    if band.start >= band.end {
        return Err(PipelineError::config(
            Stage::FrameReducer,
            format!("band [{}, {}) selects no rows", band.start, band.end),
        ));
    }
    if band.end > frame.height {
        return Err(PipelineError::shape(
            Stage::FrameReducer,
            format!(
                "band [{}, {}) exceeds frame height {}",
                band.start, band.end, frame.height
            ),
        ));
    }

    let channels = frame.channels;
    let mut sums = vec![0u64; frame.width];
    for row in band.clone() {
        for (col, pixel) in frame.row(row).chunks_exact(channels).enumerate() {
            sums[col] += pixel.iter().map(|&v| v as u64).sum::<u64>();
        }
    }

    // Integer accumulation keeps the result independent of row order.
    let count = (band.len() * channels) as f64;
    Ok(sums.into_iter().map(|s| s as f64 / count).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn gray(width: usize, rows: &[&[u8]]) -> Frame {
        Frame::from_fn(width, rows.len(), 3, |r, c, _| rows[r][c])
    }

    #[test]
    fn rejects_wrong_buffer_length() {
        let err = Frame::new(4, 2, 3, vec![0; 23]).unwrap_err();
        assert!(err.is_per_frame());
        assert!(Frame::new(4, 2, 0, Vec::new()).is_err());
        assert!(Frame::new(4, 2, 3, vec![0; 24]).is_ok());
    }

    #[test]
    fn averages_rows_and_channels() {
        let frame = Frame::from_fn(2, 3, 3, |r, c, ch| (r * 10 + c + ch) as u8);
        // Rows 1..3, column 0: (10+11+12 + 20+21+22) / 6 = 16
        let spectrum = reduce_band(&frame, 1..3).unwrap();
        assert_eq!(spectrum, vec![16.0, 17.0]);
    }

    #[test]
    fn empty_band_fails_fast() {
        let frame = gray(2, &[&[1, 2], &[3, 4]]);
        let err = reduce_band(&frame, 1..1).unwrap_err();
        assert!(matches!(err, PipelineError::Configuration { stage: Stage::FrameReducer, .. }));
    }

    #[test]
    fn band_past_frame_is_shape_error() {
        let frame = gray(2, &[&[1, 2], &[3, 4]]);
        let err = reduce_band(&frame, 0..3).unwrap_err();
        assert!(err.is_per_frame());
    }

    #[test]
    fn widening_band_changes_result() {
        let frame = gray(2, &[&[10, 10], &[20, 20], &[90, 20]]);
        let narrow = reduce_band(&frame, 0..2).unwrap();
        let wide = reduce_band(&frame, 0..3).unwrap();
        // Row 2 sits above the narrow band average in both columns.
        assert_eq!(narrow, vec![15.0, 15.0]);
        assert_eq!(wide, vec![40.0, 50.0 / 3.0]);
    }

    #[test]
    fn flip_mirrors_columns() {
        let mut frame = Frame::from_fn(3, 1, 2, |_, c, ch| (c * 2 + ch) as u8);
        frame.flip_horizontal();
        assert_eq!(frame.as_bytes(), &[4, 5, 2, 3, 0, 1]);
    }

    proptest! {
        #[test]
        fn row_order_does_not_matter(
            rows in proptest::collection::vec(proptest::collection::vec(any::<u8>(), 5), 2..8),
        ) {
            let height = rows.len();
            let frame = Frame::from_fn(5, height, 3, |r, c, _| rows[r][c]);
            let reversed = Frame::from_fn(5, height, 3, |r, c, _| rows[height - 1 - r][c]);
            prop_assert_eq!(
                reduce_band(&frame, 0..height).unwrap(),
                reduce_band(&reversed, 0..height).unwrap()
            );
        }
    }
}
