//! Epoch arithmetic over the satkit time scale.

use std::cmp::Ordering;
use std::fmt;

use satkit::{Duration, Instant};

use crate::error::{Error, Result};

/// Seconds in one day.
pub const SECONDS_IN_DAY: f64 = 86_400.0;

/// A point in time, ordered and offsettable by days or seconds.
///
/// Wraps a `satkit::Instant` so the rest of the crate never touches the
/// underlying time scale directly.
#[derive(Debug, Clone, Copy)]
pub struct Epoch(Instant);

impl Epoch {
    /// Build an epoch from a Gregorian date/time tuple.
    ///
    /// Callers are expected to have range-checked the fields; a rejection
    /// from the time library is still reported as an error.
    pub fn from_gregorian(
        year: i32,
        month: u32,
        day: u32,
        hour: u32,
        minute: u32,
        second: f64,
    ) -> Result<Self> {
        let instant = Instant::from_datetime(
            year,
            month as i32,
            day as i32,
            hour as i32,
            minute as i32,
            second,
        )
        .map_err(|e| Error::EpochConstruction {
            message: e.to_string(),
        })?;
        Ok(Self(instant))
    }

    /// Offset by a (possibly fractional, possibly negative) number of days.
    pub fn plus_days(&self, days: f64) -> Self {
        self.plus_seconds(days * SECONDS_IN_DAY)
    }

    /// Offset by seconds.
    pub fn plus_seconds(&self, seconds: f64) -> Self {
        Self(self.0 + Duration::from_seconds(seconds))
    }

    /// Signed seconds from `other` to `self`.
    pub fn seconds_since(&self, other: &Epoch) -> f64 {
        (self.0 - other.0).as_seconds()
    }

    /// Decompose into `(year, month, day, hour, minute, second)`.
    pub fn as_gregorian(&self) -> (i32, i32, i32, i32, i32, f64) {
        self.0.as_datetime()
    }
}

impl PartialEq for Epoch {
    fn eq(&self, other: &Self) -> bool {
        self.seconds_since(other) == 0.0
    }
}

impl PartialOrd for Epoch {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        self.seconds_since(other).partial_cmp(&0.0)
    }
}

impl fmt::Display for Epoch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (year, month, day, hour, min, sec) = self.as_gregorian();
        write!(
            f,
            "{:04}-{:02}-{:02} {:02}:{:02}:{:02}",
            year, month, day, hour, min, sec as u32
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ordering() {
        let a = Epoch::from_gregorian(2023, 1, 26, 12, 30, 0.0).unwrap();
        let b = a.plus_days(0.5);
        assert!(a < b);
        assert!(b > a);
        assert_eq!(a, a.plus_days(0.0));
    }

    #[test]
    fn test_day_offset_roundtrip() {
        let a = Epoch::from_gregorian(2023, 1, 26, 12, 30, 0.0).unwrap();
        let back = a.plus_days(1.0).plus_days(-1.0);
        assert!(a.seconds_since(&back).abs() < 1e-6);
    }

    #[test]
    fn test_seconds_since() {
        let a = Epoch::from_gregorian(2023, 1, 26, 12, 0, 0.0).unwrap();
        let b = a.plus_seconds(600.0);
        assert!((b.seconds_since(&a) - 600.0).abs() < 1e-9);
        assert!((a.seconds_since(&b) + 600.0).abs() < 1e-9);
    }

    #[test]
    fn test_display_format() {
        let a = Epoch::from_gregorian(2023, 1, 26, 12, 30, 0.0).unwrap();
        assert_eq!(a.to_string(), "2023-01-26 12:30:00");
    }
}
