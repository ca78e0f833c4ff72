//! License lifecycle event logging.
//!
//! Audit lines for issuance, validation outcomes and the expiry sweep, each
//! emitted inside a `license_event` span carrying the event name and key.

use tracing::{info, info_span, warn};

/// License lifecycle events worth an audit line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LicenseEvent {
    /// A new license was generated
    Issued,
    /// A key was checked and is valid
    Validated,
    /// A key was checked and is unknown
    ValidationFailed,
    /// A key was checked and has lapsed
    Expired,
    /// The expiry sweep removed a license
    Pruned,
}

impl std::fmt::Display for LicenseEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            LicenseEvent::Issued => "issued",
            LicenseEvent::Validated => "validated",
            LicenseEvent::ValidationFailed => "validation_failed",
            LicenseEvent::Expired => "expired",
            LicenseEvent::Pruned => "pruned",
        };
        write!(f, "{}", s)
    }
}

/// Log a license event with optional details.
///
/// Failed and expired validations are logged at `warn`, everything else at
/// `info`.
pub fn log_license_event(event: LicenseEvent, key: &str, details: Option<&str>) {
    let span = info_span!(
        "license_event",
        event = %event,
        key = %key,
    );
    let _enter = span.enter();

    match event {
        LicenseEvent::ValidationFailed | LicenseEvent::Expired => {
            if let Some(d) = details {
                warn!(reason = %d, "License event occurred");
            } else {
                warn!("License event occurred");
            }
        }
        _ => {
            if let Some(d) = details {
                info!(details = %d, "License event occurred");
            } else {
                info!("License event occurred");
            }
        }
    }
}
