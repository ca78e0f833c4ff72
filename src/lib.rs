//! Eyeshield - time-bounded license keys over HTTP
//!
//! Licenses are issued with an expiry computed from a human-readable duration
//! (`"2 hours"`, `"1 year 3 months"`, `"lifetime"`), held in memory by a
//! [`registry::Registry`] and mirrored to a JSON file on every mutation.
//!
//! # Features
//!
//! - `server` - axum handlers, router and request logging. Enabled by default.
//!
//! # Example
//!
//! ```rust,ignore
//! use eyeshield::registry::Registry;
//! use eyeshield::store::JsonFileStore;
//!
//! let mut registry = Registry::load(JsonFileStore::new("licenses.json"), "EyesShield");
//! let issued = registry.generate("30 days")?;
//! assert!(registry.validate(&issued.key)?.is_valid());
//! ```

// Core modules (always available)
pub mod clock;
pub mod config;
pub mod duration;
pub mod errors;
pub mod events;
pub mod license_key;
pub mod registry;
pub mod store;

// Server-related modules (requires "server" feature)
#[cfg(feature = "server")]
#[path = "server/mod.rs"]
pub mod server;
