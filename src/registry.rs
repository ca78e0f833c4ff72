//! The license registry: issued licenses, their expiry, and write-through
//! persistence.
//!
//! The registry owns the authoritative in-memory set and rewrites the whole
//! set through its [`LicenseStore`] after every insertion or removal. Expired
//! licenses are swept out at the start of every [`Registry::validate`] and
//! [`Registry::generate`] call; there is no background timer.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::duration::{format_expiry, DurationSpec};
use crate::errors::{LicenseError, LicenseResult};
use crate::events::{log_license_event, LicenseEvent};
use crate::license_key::generate_license_key;
use crate::store::LicenseStore;

/// An issued license key and its fixed expiry instant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct License {
    pub key: String,
    pub expiry_date: DateTime<Utc>,
}

impl License {
    /// A license is expired once `now` is strictly after its expiry.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now > self.expiry_date
    }
}

/// Outcome of looking up a key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Validation {
    /// Known and not yet expired.
    Valid(License),
    /// Known, but its expiry has passed.
    Expired,
    /// Never issued (or lapsed before this process started).
    NotFound,
}

impl Validation {
    pub fn is_valid(&self) -> bool {
        matches!(self, Validation::Valid(_))
    }
}

/// A freshly generated license.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedLicense {
    pub key: String,
    pub expiry_date: DateTime<Utc>,
}

impl IssuedLicense {
    /// Expiry as `YYYY-MM-DD HH:mm:ss` (UTC).
    pub fn formatted_expiry(&self) -> String {
        format_expiry(&self.expiry_date)
    }
}

/// In-memory license set mirrored to a [`LicenseStore`].
pub struct Registry {
    licenses: HashMap<String, License>,
    /// Keys removed by the pruning sweep during this process.
    ///
    /// Holds one entry per license ever pruned and is never shrunk; it is only
    /// cleared by a restart, after which lapsed keys report as unknown.
    lapsed: HashSet<String>,
    store: Box<dyn LicenseStore>,
    key_prefix: String,
}

impl Registry {
    /// Build a registry from whatever `store` currently holds.
    ///
    /// Missing state starts an empty registry. Malformed state is logged and
    /// also starts an empty registry; it is overwritten on the next mutation.
    pub fn load(store: impl LicenseStore + 'static, key_prefix: impl Into<String>) -> Self {
        let loaded = match store.load() {
            Ok(Some(licenses)) => {
                info!(
                    "Loaded {} licenses from {}",
                    licenses.len(),
                    store.location()
                );
                licenses
            }
            Ok(None) => {
                info!(
                    "No license file at {}, starting with an empty license list",
                    store.location()
                );
                Vec::new()
            }
            Err(e) => {
                error!(
                    "Ignoring unreadable license state at {}: {e}",
                    store.location()
                );
                Vec::new()
            }
        };

        let mut licenses = HashMap::with_capacity(loaded.len());
        for license in loaded {
            if let Some(previous) = licenses.insert(license.key.clone(), license) {
                warn!("Duplicate license key {} in stored state", previous.key);
            }
        }

        Self {
            licenses,
            lapsed: HashSet::new(),
            store: Box::new(store),
            key_prefix: key_prefix.into(),
        }
    }

    pub fn key_prefix(&self) -> &str {
        &self.key_prefix
    }

    /// Number of licenses currently held (including any not yet swept).
    pub fn len(&self) -> usize {
        self.licenses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.licenses.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&License> {
        self.licenses.get(key)
    }

    /// Snapshot of every license, ordered by expiry then key.
    pub fn licenses(&self) -> Vec<License> {
        let mut all: Vec<License> = self.licenses.values().cloned().collect();
        all.sort_by(|a, b| {
            a.expiry_date
                .cmp(&b.expiry_date)
                .then_with(|| a.key.cmp(&b.key))
        });
        all
    }

    /// Remove every license whose expiry is at or before `now`.
    ///
    /// Storage is rewritten only if something was removed. Returns the number
    /// of licenses removed.
    pub fn prune_at(&mut self, now: DateTime<Utc>) -> usize {
        let expired: Vec<String> = self
            .licenses
            .values()
            .filter(|license| license.expiry_date <= now)
            .map(|license| license.key.clone())
            .collect();

        if expired.is_empty() {
            return 0;
        }

        for key in &expired {
            self.licenses.remove(key);
            log_license_event(LicenseEvent::Pruned, key, None);
        }
        let removed = expired.len();
        self.lapsed.extend(expired);

        info!("Removed {} expired licenses", removed);
        self.persist();
        removed
    }

    /// Validate `key` against the current time.
    pub fn validate(&mut self, key: &str) -> LicenseResult<Validation> {
        self.validate_at(key, Utc::now())
    }

    /// Validate `key` as of `now`.
    ///
    /// # Errors
    ///
    /// Returns [`LicenseError::InvalidRequest`] if `key` is empty.
    pub fn validate_at(&mut self, key: &str, now: DateTime<Utc>) -> LicenseResult<Validation> {
        if key.is_empty() {
            return Err(LicenseError::InvalidRequest(
                "license key is required".to_string(),
            ));
        }

        self.prune_at(now);

        let outcome = match self.licenses.get(key) {
            Some(license) if license.is_expired_at(now) => Validation::Expired,
            Some(license) => Validation::Valid(license.clone()),
            None if self.lapsed.contains(key) => Validation::Expired,
            None => Validation::NotFound,
        };

        Ok(outcome)
    }

    /// Issue a new license whose expiry is described by `duration`.
    pub fn generate(&mut self, duration: &str) -> LicenseResult<IssuedLicense> {
        self.generate_at(duration, Utc::now())
    }

    /// Issue a new license as of `now`.
    ///
    /// The duration is checked before anything is created. On success the full
    /// set is written to storage before returning.
    ///
    /// # Errors
    ///
    /// - [`LicenseError::InvalidRequest`] if `duration` is empty.
    /// - [`LicenseError::InvalidDuration`] if it cannot be parsed.
    pub fn generate_at(
        &mut self,
        duration: &str,
        now: DateTime<Utc>,
    ) -> LicenseResult<IssuedLicense> {
        if duration.is_empty() {
            return Err(LicenseError::InvalidRequest(
                "duration is required".to_string(),
            ));
        }

        self.prune_at(now);

        let expiry_date = DurationSpec::parse(duration)?.expiry_from(now)?;

        let key = loop {
            let candidate = generate_license_key(&self.key_prefix);
            if !self.licenses.contains_key(&candidate) && !self.lapsed.contains(&candidate) {
                break candidate;
            }
        };

        self.licenses.insert(
            key.clone(),
            License {
                key: key.clone(),
                expiry_date,
            },
        );
        self.persist();

        Ok(IssuedLicense { key, expiry_date })
    }

    /// Write the whole set to storage. Failures are logged, not returned.
    fn persist(&self) {
        if let Err(e) = self.store.save(&self.licenses()) {
            warn!(
                "Failed to save {} licenses to {}: {e}",
                self.licenses.len(),
                self.store.location()
            );
        }
    }
}
