//! ABOUTME: Motion scoring, debouncing, and face detection for the watch loop
//! ABOUTME: Pure-Rust frame differencing with an optional OpenCV face detector

pub mod debouncer;
pub mod differencer;
pub mod face;
pub mod frame;
#[cfg(feature = "heavy_opencv")]
pub mod opencv_detector;

pub use debouncer::MotionDebouncer;
pub use differencer::{FrameDifferencer, MotionScore, MASK_ON};
pub use face::{FaceDetector, NullFaceDetector};
pub use frame::{FaceRegion, Frame};
#[cfg(feature = "heavy_opencv")]
pub use opencv_detector::HaarCascadeDetector;

// Re-export image types for downstream crates
pub use image;

/// Utility functions for building synthetic frames
pub mod utils {
    use super::Frame;
    use image::{Rgb, RgbImage};

    /// Uniform gray frame
    pub fn create_solid_frame(width: u32, height: u32, intensity: u8) -> Frame {
        Frame::new(RgbImage::from_pixel(
            width,
            height,
            Rgb([intensity, intensity, intensity]),
        ))
    }

    /// Dark gray frame with a bright rectangular patch
    pub fn create_test_frame_with_motion(
        width: u32,
        height: u32,
        motion_x: u32,
        motion_y: u32,
        motion_width: u32,
        motion_height: u32,
        intensity: u8,
    ) -> Frame {
        let mut img = RgbImage::from_pixel(width, height, Rgb([64u8, 64, 64]));

        for y in motion_y..(motion_y + motion_height).min(height) {
            for x in motion_x..(motion_x + motion_width).min(width) {
                img.put_pixel(x, y, Rgb([intensity, intensity, intensity]));
            }
        }

        Frame::new(img)
    }
}
