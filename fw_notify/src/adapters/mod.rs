//! ABOUTME: Notification adapter implementations for different channels
//! ABOUTME: Contains the SMTP email adapter and the log-only fallback

pub mod log_notifier;
pub mod smtp;

pub use log_notifier::LogNotifier;
pub use smtp::SmtpNotifier;
