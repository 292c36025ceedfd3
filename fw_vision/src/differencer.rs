//! ABOUTME: Pure-Rust frame differencing against a rolling grayscale baseline
//! ABOUTME: Blurs, diffs, and binary-thresholds frames into a single motion score

use crate::Frame;
use fw_core::{Error, Result};
use image::{imageops, GrayImage};
use tracing::trace;

/// Sum of the binary threshold mask (each changed pixel contributes 255)
pub type MotionScore = u64;

/// Value written to the mask for a changed pixel
pub const MASK_ON: u8 = 255;

/// Computes motion scores between preprocessed frames. Holds no frame state;
/// the caller owns and replaces the reference.
#[derive(Debug, Clone)]
pub struct FrameDifferencer {
    blur_sigma: f32,
    pixel_threshold: u8,
}

impl FrameDifferencer {
    pub fn new(blur_sigma: f32, pixel_threshold: u8) -> Self {
        Self {
            blur_sigma,
            pixel_threshold,
        }
    }

    /// Grayscale followed by a fixed Gaussian blur
    pub fn preprocess(&self, frame: &Frame) -> GrayImage {
        let gray = imageops::grayscale(frame.as_image());
        if self.blur_sigma > 0.0 {
            imageops::blur(&gray, self.blur_sigma)
        } else {
            gray
        }
    }

    /// Sum of the thresholded absolute difference between two preprocessed frames
    pub fn score(&self, reference: &GrayImage, current: &GrayImage) -> Result<MotionScore> {
        Self::check_dimensions(reference, current)?;

        let changed = reference
            .as_raw()
            .iter()
            .zip(current.as_raw().iter())
            .filter(|(r, c)| r.abs_diff(**c) > self.pixel_threshold)
            .count() as u64;

        let score = changed * MASK_ON as u64;
        trace!(changed_pixels = changed, score = score, "Frame difference scored");
        Ok(score)
    }

    fn check_dimensions(reference: &GrayImage, current: &GrayImage) -> Result<()> {
        if reference.dimensions() != current.dimensions() {
            return Err(Error::Validation(format!(
                "Reference frame is {:?} but current frame is {:?}",
                reference.dimensions(),
                current.dimensions()
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::{create_solid_frame, create_test_frame_with_motion};

    #[test]
    fn test_identical_frames_score_zero() {
        let differencer = FrameDifferencer::new(3.5, 25);
        let frame = create_test_frame_with_motion(64, 48, 10, 10, 20, 20, 200);
        let a = differencer.preprocess(&frame);
        let b = differencer.preprocess(&frame);
        assert_eq!(differencer.score(&a, &b).unwrap(), 0);
    }

    #[test]
    fn test_preprocess_is_deterministic() {
        let differencer = FrameDifferencer::new(3.5, 25);
        let frame = create_test_frame_with_motion(64, 48, 5, 5, 30, 20, 220);
        assert_eq!(differencer.preprocess(&frame), differencer.preprocess(&frame));
    }

    #[test]
    fn test_score_counts_changed_pixels_unblurred() {
        let differencer = FrameDifferencer::new(0.0, 25);
        let background = differencer.preprocess(&create_solid_frame(40, 40, 64));
        let patched =
            differencer.preprocess(&create_test_frame_with_motion(40, 40, 0, 0, 10, 5, 200));

        assert_eq!(differencer.score(&background, &patched).unwrap(), 50 * 255);
    }

    #[test]
    fn test_small_intensity_change_below_cutoff() {
        let differencer = FrameDifferencer::new(0.0, 25);
        let a = differencer.preprocess(&create_solid_frame(30, 30, 100));
        let b = differencer.preprocess(&create_solid_frame(30, 30, 120));
        assert_eq!(differencer.score(&a, &b).unwrap(), 0);
    }

    #[test]
    fn test_blurred_patch_scores_in_mask_units() {
        let differencer = FrameDifferencer::new(3.5, 25);
        let a = differencer.preprocess(&create_solid_frame(60, 60, 64));
        let b = differencer.preprocess(&create_test_frame_with_motion(60, 60, 20, 20, 20, 20, 230));

        let score = differencer.score(&a, &b).unwrap();
        assert!(score > 300);
        assert_eq!(score % MASK_ON as u64, 0);
    }

    #[test]
    fn test_dimension_mismatch_is_error() {
        let differencer = FrameDifferencer::new(0.0, 25);
        let a = differencer.preprocess(&create_solid_frame(10, 10, 0));
        let b = differencer.preprocess(&create_solid_frame(12, 10, 0));
        assert!(differencer.score(&a, &b).is_err());
    }
}
