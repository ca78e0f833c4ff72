//! Time source for the registry and the HTTP handlers.
//!
//! Registry operations take an explicit `now`; the server reads it from a
//! [`Clock`] so tests can move time forward without sleeping.

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, Utc};

/// Something that can tell the current UTC instant.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock that only moves when told to.
///
/// Cloning shares the underlying instant, so a test can keep one handle and
/// give the other to the server.
#[derive(Debug, Clone)]
pub struct ManualClock {
    instant: Arc<Mutex<DateTime<Utc>>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            instant: Arc::new(Mutex::new(start)),
        }
    }

    /// Move the clock forward (or backward, for a negative duration).
    pub fn advance(&self, by: Duration) {
        let mut instant = self.instant.lock().unwrap_or_else(|e| e.into_inner());
        *instant += by;
    }

    pub fn set(&self, to: DateTime<Utc>) {
        let mut instant = self.instant.lock().unwrap_or_else(|e| e.into_inner());
        *instant = to;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.instant.lock().unwrap_or_else(|e| e.into_inner())
    }
}
