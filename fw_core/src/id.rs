use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of one alert instance, used to correlate the log lines of a
/// snapshot batch with its notification task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AlertId(ulid::Ulid);

impl AlertId {
    pub fn new() -> Self {
        Self(ulid::Ulid::new())
    }
}

impl Default for AlertId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for AlertId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "alert-{}", self.0)
    }
}
