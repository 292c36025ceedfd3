//! ABOUTME: Core types, errors, alert IDs, and tracing utilities
//! ABOUTME: Foundation crate used by all other facewatch components

pub mod error;
pub mod id;
pub mod telemetry;
pub mod time;

pub use error::{Error, Result};
pub use id::AlertId;
pub use time::{format_alert_time, unix_millis};
