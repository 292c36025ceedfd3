// ABOUTME: Utilities for alert timestamps and snapshot naming.
// ABOUTME: Provides human-readable local timestamps and unix millisecond stamps.
use chrono::{DateTime, Local};
use std::time::{SystemTime, UNIX_EPOCH};

/// Format used in alert bodies, e.g. `2024-03-01 14:05:09`
pub const ALERT_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Format a local time the way alert messages present it
///
/// # Examples
///
/// ```
/// use chrono::{Local, TimeZone};
/// use fw_core::format_alert_time;
///
/// let at = Local.with_ymd_and_hms(2024, 3, 1, 14, 5, 9).unwrap();
/// assert_eq!(format_alert_time(&at), "2024-03-01 14:05:09");
/// ```
pub fn format_alert_time(at: &DateTime<Local>) -> String {
    at.format(ALERT_TIMESTAMP_FORMAT).to_string()
}

/// Milliseconds since the unix epoch, saturating at zero for pre-epoch clocks
pub fn unix_millis(time: SystemTime) -> u128 {
    time.duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default()
}
