//! ABOUTME: Image-sequence frame source replaying still images as a feed
//! ABOUTME: Implements FrameSource over a directory of PNG/JPEG files in name order

use crate::FrameSource;
use fw_core::{Error, Result};
use fw_vision::Frame;
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument};

const SUPPORTED_EXTENSIONS: [&str; 3] = ["png", "jpg", "jpeg"];

/// Frame source that reads image files from a directory, sorted by name
#[derive(Debug)]
pub struct ImageSequenceSource {
    dir: PathBuf,
    files: Vec<PathBuf>,
    position: usize,
    looping: bool,
}

impl ImageSequenceSource {
    /// Scan `dir` for supported images
    #[instrument]
    pub fn open<P: AsRef<Path> + std::fmt::Debug>(dir: P, looping: bool) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        if !dir.is_dir() {
            return Err(Error::Config(format!(
                "Frame directory does not exist: {}",
                dir.display()
            )));
        }

        let mut files: Vec<PathBuf> = std::fs::read_dir(&dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.is_file() && is_supported(path))
            .collect();
        files.sort();

        if files.is_empty() {
            return Err(Error::Config(format!(
                "No images found in frame directory: {}",
                dir.display()
            )));
        }

        info!(dir = %dir.display(), frames = files.len(), looping, "Opened image sequence");

        Ok(Self {
            dir,
            files,
            position: 0,
            looping,
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

fn is_supported(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| SUPPORTED_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

impl FrameSource for ImageSequenceSource {
    fn read(&mut self) -> Result<Frame> {
        if self.position >= self.files.len() {
            if !self.looping {
                return Err(Error::Capture(format!(
                    "Image sequence exhausted after {} frames",
                    self.files.len()
                )));
            }
            debug!("Restarting image sequence");
            self.position = 0;
        }

        let path = &self.files[self.position];
        self.position += 1;

        let image = image::open(path)
            .map_err(|e| Error::Capture(format!("Failed to read {}: {}", path.display(), e)))?;
        Ok(Frame::new(image.to_rgb8()))
    }

    fn name(&self) -> &'static str {
        "image_sequence"
    }
}
