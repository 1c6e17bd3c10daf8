//! Upload pattern for the transfer probes.
//!
//! Byte `col` of row `row` holds `(row + col) mod 256`, where `col` counts
//! bytes within the row. The same formula checks the readback, so a full
//! upload, copy and download round trip must reproduce the image exactly.

use crate::config::Extent;
use crate::error::ReadbackMismatch;

/// Pattern value at byte `col` of row `row`.
#[inline]
pub fn expected_byte(row: u32, col: u32) -> u8 {
    (row.wrapping_add(col) & 0xFF) as u8
}

/// Host-side image filled with the gradient pattern, tightly packed.
#[derive(Debug, Clone)]
pub struct GradientImage {
    extent: Extent,
    data: Vec<u8>,
}

impl GradientImage {
    /// Allocates and fills an image of `extent`.
    pub fn new(extent: Extent) -> Self {
        let pitch = extent.row_pitch() as usize;
        let mut data = vec![0u8; extent.byte_len()];
        for (row, line) in data.chunks_exact_mut(pitch.max(1)).enumerate() {
            for (col, byte) in line.iter_mut().enumerate() {
                *byte = expected_byte(row as u32, col as u32);
            }
        }
        Self { extent, data }
    }

    pub fn extent(&self) -> Extent {
        self.extent
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Row pitch of [`as_bytes`](Self::as_bytes).
    pub fn row_pitch(&self) -> u32 {
        self.extent.row_pitch()
    }

    /// Checks a readback whose rows start every `row_pitch` bytes.
    ///
    /// Bytes past `width * 4` in each row are padding and are ignored.
    ///
    /// # Errors
    ///
    /// Returns the first byte that differs from the pattern, or the first
    /// byte that lies beyond the end of `data`.
    pub fn verify(&self, data: &[u8], row_pitch: usize) -> Result<(), ReadbackMismatch> {
        let width = self.extent.row_pitch() as usize;
        for row in 0..self.extent.height {
            let start = row as usize * row_pitch;
            let line = data.get(start..).unwrap_or(&[]);
            let line = &line[..width.min(line.len())];

            for (col, &actual) in line.iter().enumerate() {
                let expected = expected_byte(row, col as u32);
                if actual != expected {
                    return Err(ReadbackMismatch::new(row, col as u32, expected, actual));
                }
            }
            if line.len() < width {
                let col = line.len() as u32;
                return Err(ReadbackMismatch::truncated(
                    row,
                    col,
                    expected_byte(row, col),
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expected_byte_wraps() {
        assert_eq!(expected_byte(0, 0), 0);
        assert_eq!(expected_byte(1, 2), 3);
        assert_eq!(expected_byte(200, 56), 0);
        assert_eq!(expected_byte(255, 255), 254);
    }

    #[test]
    fn test_image_layout() {
        let image = GradientImage::new(Extent::new(3, 2));
        assert_eq!(image.as_bytes().len(), 3 * 2 * 4);
        assert_eq!(image.row_pitch(), 12);
        assert_eq!(image.as_bytes()[0], 0);
        assert_eq!(image.as_bytes()[11], 11);
        // Second row starts one higher.
        assert_eq!(image.as_bytes()[12], 1);
        assert_eq!(image.as_bytes()[23], 12);
    }

    #[test]
    fn test_pattern_formula_for_every_byte() {
        let extent = Extent::new(70, 5);
        let image = GradientImage::new(extent);
        let pitch = extent.row_pitch() as usize;
        for (i, &b) in image.as_bytes().iter().enumerate() {
            let row = (i / pitch) as u32;
            let col = (i % pitch) as u32;
            assert_eq!(b, ((row + col) % 256) as u8);
        }
    }

    #[test]
    fn test_verify_tight_copy() {
        let image = GradientImage::new(Extent::new(64, 16));
        assert!(image
            .verify(image.as_bytes(), image.row_pitch() as usize)
            .is_ok());
    }

    #[test]
    fn test_verify_padded_rows() {
        let extent = Extent::new(5, 3);
        let image = GradientImage::new(extent);
        let pitch = 32;
        let mut padded = vec![0xEEu8; pitch * 3];
        for row in 0..3 {
            let src = &image.as_bytes()[row * 20..row * 20 + 20];
            padded[row * pitch..row * pitch + 20].copy_from_slice(src);
        }
        assert!(image.verify(&padded, pitch).is_ok());
    }

    #[test]
    fn test_verify_reports_first_mismatch() {
        let image = GradientImage::new(Extent::new(4, 4));
        let mut data = image.as_bytes().to_vec();
        data[2 * 16 + 5] ^= 0xFF;
        data[3 * 16] ^= 0xFF;

        let err = image.verify(&data, 16).unwrap_err();
        assert_eq!(err.row, 2);
        assert_eq!(err.col, 5);
        assert_eq!(err.expected, 7);
        assert_eq!(err.actual, Some(7 ^ 0xFF));
    }

    #[test]
    fn test_verify_truncated_buffer() {
        let image = GradientImage::new(Extent::new(4, 4));
        let data = &image.as_bytes()[..40];
        let err = image.verify(data, 16).unwrap_err();
        assert_eq!(err.row, 2);
        assert_eq!(err.col, 8);
        assert_eq!(err.actual, None);
    }
}
