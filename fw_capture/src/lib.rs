//! ABOUTME: Frame acquisition, snapshot persistence, and snapshot throttling
//! ABOUTME: Provides the FrameSource seam and owned snapshot batches

use fw_core::Result;
use fw_vision::Frame;

#[cfg(feature = "heavy_opencv")]
pub mod camera_source;
pub mod sequence_source;
pub mod snapshot;
pub mod throttle;

#[cfg(feature = "heavy_opencv")]
pub use camera_source::CameraSource;
pub use sequence_source::ImageSequenceSource;
pub use snapshot::{SnapshotBatch, SnapshotStore};
pub use throttle::SnapshotThrottle;

/// Trait for frame sources (cameras, image sequences, test scripts)
///
/// A failed read is fatal to the watch loop; sources do not reconnect.
pub trait FrameSource: Send {
    fn read(&mut self) -> Result<Frame>;

    fn name(&self) -> &'static str;
}

impl<S: FrameSource + ?Sized> FrameSource for Box<S> {
    fn read(&mut self) -> Result<Frame> {
        (**self).read()
    }

    fn name(&self) -> &'static str {
        (**self).name()
    }
}
