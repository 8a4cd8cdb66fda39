//! ISO 8601 UTC timestamps for checksum manifests.
//!
//! Built on `std::time::SystemTime` so the crate does not need `chrono`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

/// A `YYYY-MM-DDThh:mm:ssZ` timestamp.
///
/// # Examples
///
/// ```
/// use apg_packager::timestamp::Timestamp;
///
/// let ts = Timestamp::from_epoch_secs(946_684_800);
/// assert_eq!(ts.as_str(), "2000-01-01T00:00:00Z");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(String);

impl Timestamp {
    /// Return the current UTC time.
    ///
    /// A system clock set before the Unix epoch is reported as the epoch.
    #[must_use]
    pub fn now() -> Self {
        let secs = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_secs())
            .unwrap_or_default();
        Self::from_epoch_secs(secs)
    }

    /// Format a Unix epoch timestamp.
    #[must_use]
    pub fn from_epoch_secs(epoch_secs: u64) -> Self {
        Self(format_epoch_secs(epoch_secs))
    }

    /// Return the timestamp as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Return true when `value` has the `YYYY-MM-DDThh:mm:ssZ` shape.
    #[must_use]
    pub fn is_well_formed(value: &str) -> bool {
        let b = value.as_bytes();
        b.len() == 20
            && b[4] == b'-'
            && b[7] == b'-'
            && b[10] == b'T'
            && b[13] == b':'
            && b[16] == b':'
            && b[19] == b'Z'
            && [0..4, 5..7, 8..10, 11..13, 14..16, 17..19]
                .into_iter()
                .all(|range| b[range].iter().all(u8::is_ascii_digit))
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn format_epoch_secs(epoch_secs: u64) -> String {
    let (year, month, day) = civil_from_days(epoch_secs / 86_400);
    let day_secs = epoch_secs % 86_400;
    let hour = day_secs / 3_600;
    let minute = (day_secs % 3_600) / 60;
    let second = day_secs % 60;
    format!("{year:04}-{month:02}-{day:02}T{hour:02}:{minute:02}:{second:02}Z")
}

/// Convert days since the Unix epoch to a `(year, month, day)` triple.
///
/// Howard Hinnant's `civil_from_days`, restricted to post-epoch dates.
fn civil_from_days(days: u64) -> (u64, u64, u64) {
    let z = days + 719_468;
    let era = z / 146_097;
    let doe = z % 146_097;
    let yoe = (doe - doe / 1_460 + doe / 36_524 - doe / 146_096) / 365;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let day = doy - (153 * mp + 2) / 5 + 1;
    let month = if mp < 10 { mp + 3 } else { mp - 9 };
    let year = yoe + era * 400 + u64::from(month <= 2);
    (year, month, day)
}
