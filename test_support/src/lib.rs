//! ABOUTME: Shared testing utilities and helper functions
//! ABOUTME: Common test fixtures for all facewatch crates

use image::{GrayImage, Luma};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Fresh temporary directory, removed when the guard drops
pub fn scratch_dir() -> TempDir {
    tempfile::Builder::new()
        .prefix("facewatch-test")
        .tempdir()
        .expect("create scratch dir")
}

/// Write a uniform grayscale PNG and return its path
pub fn write_gray_png(dir: &Path, name: &str, width: u32, height: u32, value: u8) -> PathBuf {
    let path = dir.join(name);
    GrayImage::from_pixel(width, height, Luma([value]))
        .save(&path)
        .expect("write test png");
    path
}

/// Write placeholder snapshot files and return their paths
pub fn write_placeholder_files(dir: &Path, count: usize) -> Vec<PathBuf> {
    (0..count)
        .map(|i| {
            let path = dir.join(format!("snapshot_{}_0.jpg", i));
            std::fs::write(&path, b"not really a jpeg").expect("write placeholder");
            path
        })
        .collect()
}
