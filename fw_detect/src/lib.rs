//! ABOUTME: Detection controller and watch loop for the facewatch pipeline
//! ABOUTME: Ties motion scoring, face gating, snapshots, and alerts together

pub mod controller;
pub mod watcher;

pub use controller::{DetectionController, FrameOutcome, FrameView, Mode};
pub use watcher::{ControlInput, WatchSummary, Watcher};
