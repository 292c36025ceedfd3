//! ABOUTME: OpenCV Haar cascade face detector
//! ABOUTME: Runs multi-scale cascade detection on the grayscale frame

#[cfg(feature = "heavy_opencv")]
use crate::{FaceDetector, FaceRegion, Frame};
#[cfg(feature = "heavy_opencv")]
use fw_core::{Error, Result};
#[cfg(feature = "heavy_opencv")]
use opencv::{
    core::{Mat, Rect, Size, Vector},
    objdetect::CascadeClassifier,
    prelude::*,
};
#[cfg(feature = "heavy_opencv")]
use tracing::debug;

/// Pyramid step between detection scales
pub const SCALE_FACTOR: f64 = 1.1;
/// Overlapping hits required to keep a candidate
pub const MIN_NEIGHBORS: i32 = 5;
/// Smallest face considered; zero means no lower bound
pub const MIN_FACE_SIZE: (i32, i32) = (0, 0);

#[cfg(feature = "heavy_opencv")]
/// Haar cascade face detector
pub struct HaarCascadeDetector {
    classifier: CascadeClassifier,
    scale_factor: f64,
    min_neighbors: i32,
    min_size: Size,
}

#[cfg(feature = "heavy_opencv")]
impl HaarCascadeDetector {
    /// Load a cascade from an XML file such as `haarcascade_frontalface_default.xml`
    pub fn new(cascade_path: &str) -> Result<Self> {
        let classifier = CascadeClassifier::new(cascade_path).map_err(|e| {
            Error::Detection(format!("Failed to load cascade {}: {}", cascade_path, e))
        })?;

        let empty = classifier
            .empty()
            .map_err(|e| Error::Detection(format!("Failed to inspect cascade: {}", e)))?;
        if empty {
            return Err(Error::Detection(format!(
                "Cascade {} contains no stages",
                cascade_path
            )));
        }

        debug!(cascade = cascade_path, "Loaded Haar cascade");

        Ok(Self {
            classifier,
            scale_factor: SCALE_FACTOR,
            min_neighbors: MIN_NEIGHBORS,
            min_size: Size::new(MIN_FACE_SIZE.0, MIN_FACE_SIZE.1),
        })
    }
}

#[cfg(feature = "heavy_opencv")]
impl FaceDetector for HaarCascadeDetector {
    fn detect(&mut self, frame: &Frame) -> Result<Vec<FaceRegion>> {
        let gray = image::imageops::grayscale(frame.as_image());
        let mat = Mat::new_rows_cols_with_data(
            gray.height() as i32,
            gray.width() as i32,
            gray.as_raw().as_slice(),
        )
        .map_err(|e| Error::Detection(format!("Failed to wrap frame: {}", e)))?;

        let mut faces = Vector::<Rect>::new();
        self.classifier
            .detect_multi_scale(
                &*mat,
                &mut faces,
                self.scale_factor,
                self.min_neighbors,
                0,
                self.min_size,
                Size::default(),
            )
            .map_err(|e| Error::Detection(format!("Cascade detection failed: {}", e)))?;

        Ok(faces
            .iter()
            .map(|r| {
                FaceRegion::new(
                    r.x.max(0) as u32,
                    r.y.max(0) as u32,
                    r.width.max(0) as u32,
                    r.height.max(0) as u32,
                )
            })
            .collect())
    }

    fn name(&self) -> &'static str {
        "haar_cascade"
    }
}
