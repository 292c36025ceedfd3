//! ABOUTME: Color frame and face rectangle types shared across the pipeline
//! ABOUTME: Handles width normalization and clamped face cropping

use fw_core::{Error, Result};
use image::{imageops, RgbImage};
use serde::{Deserialize, Serialize};

/// An immutable RGB frame at a fixed resolution
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    image: RgbImage,
}

impl Frame {
    pub fn new(image: RgbImage) -> Self {
        Self { image }
    }

    /// Build a frame from packed RGB8 bytes
    pub fn from_raw(width: u32, height: u32, data: Vec<u8>) -> Result<Self> {
        RgbImage::from_raw(width, height, data)
            .map(Self::new)
            .ok_or_else(|| {
                Error::Validation(format!(
                    "Frame buffer does not match {}x{} RGB dimensions",
                    width, height
                ))
            })
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    pub fn as_image(&self) -> &RgbImage {
        &self.image
    }

    /// Scale to `width` keeping the aspect ratio; a frame already at that
    /// width is returned untouched
    pub fn resize_to_width(self, width: u32) -> Frame {
        let (orig_width, orig_height) = self.dimensions();
        if width == 0 || orig_width == 0 || orig_width == width {
            return self;
        }

        let height = ((orig_height as u64 * width as u64 + orig_width as u64 / 2)
            / orig_width as u64)
            .max(1) as u32;

        Frame::new(imageops::resize(
            &self.image,
            width,
            height,
            imageops::FilterType::Triangle,
        ))
    }

    /// Copy out the pixels under `region`, clamped to the frame bounds.
    /// Returns `None` when nothing of the region lies inside the frame.
    pub fn crop(&self, region: &FaceRegion) -> Option<RgbImage> {
        let clamped = region.clamp_to(self.width(), self.height())?;
        Some(
            imageops::crop_imm(
                &self.image,
                clamped.x,
                clamped.y,
                clamped.width,
                clamped.height,
            )
            .to_image(),
        )
    }
}

/// Axis-aligned rectangle where a face is believed to be
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FaceRegion {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl FaceRegion {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Intersect with a `frame_width` x `frame_height` frame
    pub fn clamp_to(&self, frame_width: u32, frame_height: u32) -> Option<FaceRegion> {
        if self.x >= frame_width || self.y >= frame_height {
            return None;
        }
        let width = self.width.min(frame_width - self.x);
        let height = self.height.min(frame_height - self.y);
        if width == 0 || height == 0 {
            return None;
        }
        Some(FaceRegion::new(self.x, self.y, width, height))
    }
}
