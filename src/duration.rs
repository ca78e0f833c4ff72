//! Duration specifications and expiry computation.
//!
//! A duration specification is either the literal `lifetime` or free text
//! containing one or more `<count><optional whitespace><unit>` pairs, where
//! unit is `hour`, `day`, `month` or `year` (an `s` suffix is allowed):
//!
//! ```text
//! "2 hours"            -> now + 2h
//! "1 year 3 months"    -> now + 15 calendar months
//! "30days"             -> now + 30 days
//! "lifetime"           -> 9999-12-31T00:00:00Z
//! ```
//!
//! Pairs are summed per unit before being applied, so the order in which they
//! appear does not matter. Months (and years, as 12 months) are added on the
//! calendar first, clamping to the last day of a shorter month, then days, then
//! hours.

use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use chrono::{DateTime, Days, Duration, Months, Utc};
use regex::Regex;

use crate::errors::{LicenseError, LicenseResult};

/// Keyword for a license that never expires.
pub const LIFETIME: &str = "lifetime";

/// Seconds since the epoch of 9999-12-31T00:00:00Z.
const LIFETIME_TIMESTAMP: i64 = 253_402_214_400;

/// Format used when showing an expiry to a caller.
pub const EXPIRY_DISPLAY_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

fn duration_regex() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"([0-9]+)\s*(hour|day|month|year)s?").expect("duration pattern is valid")
    })
}

/// The sentinel expiry used for lifetime licenses.
pub fn lifetime_expiry() -> DateTime<Utc> {
    DateTime::from_timestamp(LIFETIME_TIMESTAMP, 0).unwrap_or(DateTime::<Utc>::MAX_UTC)
}

/// Render an expiry the way the HTTP API reports it (`YYYY-MM-DD HH:mm:ss`, UTC).
pub fn format_expiry(expiry: &DateTime<Utc>) -> String {
    expiry.format(EXPIRY_DISPLAY_FORMAT).to_string()
}

/// Accumulated calendar offset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Offset {
    pub months: u32,
    pub days: u32,
    pub hours: u32,
}

/// A parsed duration specification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DurationSpec {
    Lifetime,
    Offset(Offset),
}

impl DurationSpec {
    /// Parse a duration specification.
    ///
    /// # Errors
    ///
    /// Returns [`LicenseError::InvalidDuration`] if the input is not `lifetime`
    /// and contains no recognizable `<count> <unit>` pair, or if a count
    /// overflows.
    pub fn parse(spec: &str) -> LicenseResult<Self> {
        if spec == LIFETIME {
            return Ok(DurationSpec::Lifetime);
        }

        let mut offset = Offset::default();
        let mut matched = false;

        for caps in duration_regex().captures_iter(spec) {
            matched = true;

            let amount: u32 = caps[1]
                .parse()
                .map_err(|_| overflow(spec))?;

            let slot = match &caps[2] {
                "hour" => &mut offset.hours,
                "day" => &mut offset.days,
                "month" => &mut offset.months,
                "year" => {
                    let months = amount.checked_mul(12).ok_or_else(|| overflow(spec))?;
                    offset.months = offset
                        .months
                        .checked_add(months)
                        .ok_or_else(|| overflow(spec))?;
                    continue;
                }
                _ => unreachable!("regex only captures known units"),
            };
            *slot = slot.checked_add(amount).ok_or_else(|| overflow(spec))?;
        }

        if !matched {
            return Err(LicenseError::InvalidDuration(format!(
                "'{spec}' contains no hour, day, month or year amount"
            )));
        }

        Ok(DurationSpec::Offset(offset))
    }

    /// Compute the expiry instant for a license issued at `now`.
    pub fn expiry_from(&self, now: DateTime<Utc>) -> LicenseResult<DateTime<Utc>> {
        let offset = match self {
            DurationSpec::Lifetime => return Ok(lifetime_expiry()),
            DurationSpec::Offset(offset) => offset,
        };

        now.checked_add_months(Months::new(offset.months))
            .and_then(|t| t.checked_add_days(Days::new(u64::from(offset.days))))
            .and_then(|t| {
                Duration::try_hours(i64::from(offset.hours)).and_then(|h| t.checked_add_signed(h))
            })
            .ok_or_else(|| {
                LicenseError::InvalidDuration(format!("{self} from {now} is out of range"))
            })
    }
}

fn overflow(spec: &str) -> LicenseError {
    LicenseError::InvalidDuration(format!("'{spec}' has an amount that is too large"))
}

impl FromStr for DurationSpec {
    type Err = LicenseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for DurationSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DurationSpec::Lifetime => write!(f, "{LIFETIME}"),
            DurationSpec::Offset(o) => {
                write!(f, "{} months {} days {} hours", o.months, o.days, o.hours)
            }
        }
    }
}

/// Parse `spec` and compute the expiry for a license issued at `now`.
pub fn compute_expiry(spec: &str, now: DateTime<Utc>) -> LicenseResult<DateTime<Utc>> {
    DurationSpec::parse(spec)?.expiry_from(now)
}
