//! ABOUTME: OpenCV camera frame source
//! ABOUTME: Reads BGR frames from a capture device and converts them to RGB

#[cfg(feature = "heavy_opencv")]
use crate::FrameSource;
#[cfg(feature = "heavy_opencv")]
use fw_core::{Error, Result};
#[cfg(feature = "heavy_opencv")]
use fw_vision::Frame;
#[cfg(feature = "heavy_opencv")]
use opencv::{core::Mat, imgproc, prelude::*, videoio};
#[cfg(feature = "heavy_opencv")]
use tracing::info;

#[cfg(feature = "heavy_opencv")]
/// Live camera source backed by `VideoCapture`
pub struct CameraSource {
    capture: videoio::VideoCapture,
    bgr: Mat,
    rgb: Mat,
}

#[cfg(feature = "heavy_opencv")]
impl CameraSource {
    /// Open camera `device` and request a 640x480 feed
    pub fn open(device: i32) -> Result<Self> {
        let mut capture = videoio::VideoCapture::new(device, videoio::CAP_ANY)
            .map_err(|e| Error::Capture(format!("Failed to open camera {}: {}", device, e)))?;

        let opened = capture
            .is_opened()
            .map_err(|e| Error::Capture(format!("Failed to query camera {}: {}", device, e)))?;
        if !opened {
            return Err(Error::Capture(format!("Camera {} is not available", device)));
        }

        // Best effort; some drivers ignore these
        let _ = capture.set(videoio::CAP_PROP_FRAME_WIDTH, 640.0);
        let _ = capture.set(videoio::CAP_PROP_FRAME_HEIGHT, 480.0);

        info!(device = device, "Opened camera");

        Ok(Self {
            capture,
            bgr: Mat::default(),
            rgb: Mat::default(),
        })
    }
}

#[cfg(feature = "heavy_opencv")]
impl FrameSource for CameraSource {
    fn read(&mut self) -> Result<Frame> {
        let grabbed = self
            .capture
            .read(&mut self.bgr)
            .map_err(|e| Error::Capture(format!("Camera read failed: {}", e)))?;
        if !grabbed || self.bgr.empty() {
            return Err(Error::Capture("Camera returned no frame".to_string()));
        }

        imgproc::cvt_color_def(&self.bgr, &mut self.rgb, imgproc::COLOR_BGR2RGB)
            .map_err(|e| Error::Capture(format!("Color conversion failed: {}", e)))?;

        let bytes = self
            .rgb
            .data_bytes()
            .map_err(|e| Error::Capture(format!("Frame is not contiguous: {}", e)))?;

        Frame::from_raw(self.rgb.cols() as u32, self.rgb.rows() as u32, bytes.to_vec())
    }

    fn name(&self) -> &'static str {
        "camera"
    }
}
