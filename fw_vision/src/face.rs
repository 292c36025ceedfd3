//! ABOUTME: Face detector seam consumed by the detection controller
//! ABOUTME: Detector implementations return face rectangles in enumeration order

use crate::{FaceRegion, Frame};
use fw_core::Result;

/// Trait for face detection collaborators
///
/// The returned vector's order is the stable enumeration of faces for this
/// call; snapshot filenames are derived from the index.
pub trait FaceDetector: Send {
    fn detect(&mut self, frame: &Frame) -> Result<Vec<FaceRegion>>;

    fn name(&self) -> &'static str;
}

/// Detector that never finds a face. Used when no real detector is
/// available; motion escalation still works without snapshots.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullFaceDetector;

impl FaceDetector for NullFaceDetector {
    fn detect(&mut self, _frame: &Frame) -> Result<Vec<FaceRegion>> {
        Ok(Vec::new())
    }

    fn name(&self) -> &'static str {
        "null"
    }
}
