//! License key generation.
//!
//! Keys have the form `PREFIX-xxxxxxxx-xxxx-4xxx-yxxx-xxxxxxxxxxxx`: a
//! configurable prefix followed by a random (v4) UUID. The UUID carries 122
//! random bits, so collisions are not a practical concern.
//!
//! # Example
//!
//! ```rust,ignore
//! use eyeshield::license_key::generate_license_key;
//!
//! let key = generate_license_key("EyesShield");
//! assert!(key.starts_with("EyesShield-"));
//! ```

use uuid::Uuid;

/// Prefix used when no configuration overrides it.
pub const DEFAULT_KEY_PREFIX: &str = "EyesShield";

/// Generate a new license key with the given prefix.
pub fn generate_license_key(prefix: &str) -> String {
    format!("{}-{}", prefix, Uuid::new_v4())
}
