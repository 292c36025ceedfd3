//! ABOUTME: Face snapshot persistence and the owning guard that deletes them
//! ABOUTME: Each batch removes its files when dropped, on every exit path

use chrono::{DateTime, Local};
use fw_core::{unix_millis, Error, Result};
use fw_vision::{FaceRegion, Frame};
use image::ImageFormat;
use metrics::counter;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::{debug, info, instrument, warn};

/// Writes face crops as JPEG files into a snapshot directory
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    dir: PathBuf,
}

impl SnapshotStore {
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// `snapshot_<index>_<unix-millis>.jpg`
    pub fn snapshot_filename(index: usize, captured: SystemTime) -> String {
        format!("snapshot_{}_{}.jpg", index, unix_millis(captured))
    }

    /// Crop one snapshot per face and persist them as a batch.
    ///
    /// Faces lying entirely outside the frame are skipped. If any write
    /// fails the partial batch is dropped, which removes what was written.
    pub fn capture(&self, frame: &Frame, faces: &[FaceRegion]) -> Result<SnapshotBatch> {
        self.capture_at(frame, faces, SystemTime::now())
    }

    /// [`SnapshotStore::capture`] with an explicit capture time, which fixes
    /// the file names of the batch
    #[instrument(skip(self, frame, faces), fields(faces = faces.len()))]
    pub fn capture_at(
        &self,
        frame: &Frame,
        faces: &[FaceRegion],
        captured: SystemTime,
    ) -> Result<SnapshotBatch> {
        std::fs::create_dir_all(&self.dir)?;

        let mut batch = SnapshotBatch::new(DateTime::<Local>::from(captured));

        for (index, face) in faces.iter().enumerate() {
            let Some(crop) = frame.crop(face) else {
                warn!(index = index, ?face, "Face region outside frame, skipping");
                continue;
            };

            let path = self.dir.join(Self::snapshot_filename(index, captured));
            crop.save_with_format(&path, ImageFormat::Jpeg).map_err(|e| {
                Error::Image(format!("Failed to write snapshot {}: {}", path.display(), e))
            })?;

            debug!(path = %path.display(), "Wrote snapshot");
            batch.push(path);
        }

        counter!("snapshot_batches_total").increment(1);
        counter!("snapshot_files_total").increment(batch.len() as u64);
        info!(files = batch.len(), dir = %self.dir.display(), "Captured snapshot batch");

        Ok(batch)
    }
}

/// Owned set of snapshot files awaiting transmission.
///
/// Dropping the batch deletes every file it holds.
#[derive(Debug)]
pub struct SnapshotBatch {
    paths: Vec<PathBuf>,
    captured_at: DateTime<Local>,
}

impl SnapshotBatch {
    pub fn new(captured_at: DateTime<Local>) -> Self {
        Self {
            paths: Vec::new(),
            captured_at,
        }
    }

    /// Take ownership of files already on disk
    pub fn from_paths(paths: Vec<PathBuf>, captured_at: DateTime<Local>) -> Self {
        Self { paths, captured_at }
    }

    pub fn push(&mut self, path: PathBuf) {
        self.paths.push(path);
    }

    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }

    pub fn captured_at(&self) -> DateTime<Local> {
        self.captured_at
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

impl Drop for SnapshotBatch {
    fn drop(&mut self) {
        for path in self.paths.drain(..) {
            match std::fs::remove_file(&path) {
                Ok(()) => debug!(path = %path.display(), "Removed snapshot"),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => warn!(path = %path.display(), error = %e, "Failed to remove snapshot"),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fw_vision::utils::create_test_frame_with_motion;
    use std::time::{Duration, UNIX_EPOCH};
    use tempfile::TempDir;

    #[test]
    fn test_snapshot_filename_format() {
        let at = UNIX_EPOCH + Duration::from_millis(1_700_000_000_123);
        assert_eq!(
            SnapshotStore::snapshot_filename(2, at),
            "snapshot_2_1700000000123.jpg"
        );
    }

    #[test]
    fn test_capture_writes_one_file_per_face() {
        let dir = TempDir::new().unwrap();
        let store = SnapshotStore::new(dir.path().join("snaps"));
        let frame = create_test_frame_with_motion(120, 90, 10, 10, 40, 40, 220);
        let faces = [FaceRegion::new(10, 10, 30, 30), FaceRegion::new(60, 20, 20, 25)];

        let batch = store.capture(&frame, &faces).unwrap();

        assert_eq!(batch.len(), 2);
        for path in batch.paths() {
            assert!(path.exists());
        }
        let first = image::open(&batch.paths()[0]).unwrap();
        assert_eq!((first.width(), first.height()), (30, 30));
    }

    #[test]
    fn test_out_of_frame_face_skipped() {
        let dir = TempDir::new().unwrap();
        let store = SnapshotStore::new(dir.path());
        let frame = create_test_frame_with_motion(50, 50, 0, 0, 10, 10, 200);

        let batch = store
            .capture(&frame, &[FaceRegion::new(100, 100, 10, 10)])
            .unwrap();
        assert!(batch.is_empty());
    }

    #[test]
    fn test_drop_removes_files() {
        let dir = TempDir::new().unwrap();
        let store = SnapshotStore::new(dir.path());
        let frame = create_test_frame_with_motion(64, 64, 0, 0, 32, 32, 200);

        let batch = store
            .capture(&frame, &[FaceRegion::new(0, 0, 32, 32)])
            .unwrap();
        let paths = batch.paths().to_vec();
        assert!(paths[0].exists());

        drop(batch);
        assert!(!paths[0].exists());
    }

    #[test]
    fn test_failed_write_removes_earlier_snapshots() {
        let dir = TempDir::new().unwrap();
        let store = SnapshotStore::new(dir.path());
        let frame = create_test_frame_with_motion(120, 90, 10, 10, 40, 40, 220);
        let faces = [FaceRegion::new(10, 10, 30, 30), FaceRegion::new(60, 20, 20, 25)];
        let at = UNIX_EPOCH + Duration::from_millis(1_700_000_000_456);

        // A directory where the second snapshot should go makes that write fail
        std::fs::create_dir(dir.path().join(SnapshotStore::snapshot_filename(1, at))).unwrap();

        let result = store.capture_at(&frame, &faces, at);

        assert!(matches!(result, Err(Error::Image(_))));
        assert!(!dir.path().join(SnapshotStore::snapshot_filename(0, at)).exists());
        let leftover_files = std::fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.path().is_file())
            .count();
        assert_eq!(leftover_files, 0);
    }

    #[test]
    fn test_unwritable_snapshot_dir_is_error() {
        let dir = TempDir::new().unwrap();
        let blocked = dir.path().join("not-a-dir");
        std::fs::write(&blocked, b"file in the way").unwrap();
        let store = SnapshotStore::new(&blocked);
        let frame = create_test_frame_with_motion(64, 64, 0, 0, 32, 32, 200);

        assert!(store.capture(&frame, &[FaceRegion::new(0, 0, 32, 32)]).is_err());
    }

    #[test]
    fn test_drop_tolerates_missing_file() {
        let dir = TempDir::new().unwrap();
        let batch = SnapshotBatch::from_paths(vec![dir.path().join("never-written.jpg")], Local::now());
        drop(batch);
    }
}
