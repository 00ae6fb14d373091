//! Epoch text validation.
//!
//! Gates free-text input before it reaches the store. The accepted format
//! is `YYYY-MM-DD hh:mm:ss`: a strict two-part split on a single space,
//! then a `-`-split date and a `:`-split time. Rules are applied in order
//! and the first failure wins; the caller leaves the store untouched on
//! any error, so the prior epoch survives bad input.

use thiserror::Error;

use crate::astro::Epoch;

/// Lower bound of the supported time system.
const MIN_YEAR: i32 = 1858;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EpochTextError {
    #[error("expected `YYYY-MM-DD hh:mm:ss`")]
    Shape,
    #[error("date must be `YYYY-MM-DD`")]
    DateComponents,
    #[error("time must be `hh:mm:ss`")]
    TimeComponents,
    #[error("{0} is not a number")]
    NotANumber(&'static str),
    #[error("{0} out of range")]
    OutOfRange(&'static str),
    #[error("time system rejected the epoch: {0}")]
    Rejected(String),
}

/// A validated Gregorian tuple, ready for the six epoch cells.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EpochFields {
    pub year: i32,
    pub month: u32,
    pub day: u32,
    pub hour: u32,
    pub minute: u32,
    pub second: f64,
}

/// Parse and range-check epoch text.
pub fn parse_epoch_text(text: &str) -> Result<EpochFields, EpochTextError> {
    let mut parts = text.trim().split(' ');
    let (date, time) = match (parts.next(), parts.next(), parts.next()) {
        (Some(date), Some(time), None) if !date.is_empty() && !time.is_empty() => (date, time),
        _ => return Err(EpochTextError::Shape),
    };

    let date: Vec<&str> = date.split('-').collect();
    if date.len() != 3 {
        return Err(EpochTextError::DateComponents);
    }
    let time: Vec<&str> = time.split(':').collect();
    if time.len() != 3 {
        return Err(EpochTextError::TimeComponents);
    }

    let year: i32 = date[0]
        .parse()
        .map_err(|_| EpochTextError::NotANumber("year"))?;
    let month: u32 = date[1]
        .parse()
        .map_err(|_| EpochTextError::NotANumber("month"))?;
    let day: u32 = date[2]
        .parse()
        .map_err(|_| EpochTextError::NotANumber("day"))?;
    let hour: u32 = time[0]
        .parse()
        .map_err(|_| EpochTextError::NotANumber("hour"))?;
    let minute: u32 = time[1]
        .parse()
        .map_err(|_| EpochTextError::NotANumber("minute"))?;
    let second: f64 = time[2]
        .parse()
        .map_err(|_| EpochTextError::NotANumber("second"))?;

    if hour >= 24 {
        return Err(EpochTextError::OutOfRange("hour"));
    }
    if minute >= 60 {
        return Err(EpochTextError::OutOfRange("minute"));
    }
    if !(0.0..60.0).contains(&second) {
        return Err(EpochTextError::OutOfRange("second"));
    }
    if year < MIN_YEAR {
        return Err(EpochTextError::OutOfRange("year"));
    }
    if !(1..=12).contains(&month) {
        return Err(EpochTextError::OutOfRange("month"));
    }
    let max_day = match month {
        2 => 29,
        4 | 6 | 9 | 11 => 30,
        _ => 31,
    };
    if !(1..=max_day).contains(&day) {
        return Err(EpochTextError::OutOfRange("day"));
    }

    Ok(EpochFields {
        year,
        month,
        day,
        hour,
        minute,
        second,
    })
}

/// Full validation path: parse, range-check, and convert through the time
/// system. Conversion rejection is an input error like any other.
pub fn epoch_from_text(text: &str) -> Result<(EpochFields, Epoch), EpochTextError> {
    let fields = parse_epoch_text(text)?;
    let epoch = Epoch::from_gregorian(
        fields.year,
        fields.month,
        fields.day,
        fields.hour,
        fields.minute,
        fields.second,
    )
    .map_err(|e| EpochTextError::Rejected(e.to_string()))?;
    Ok((fields, epoch))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_valid_text() {
        let fields = parse_epoch_text("2023-01-26 12:30:00").unwrap();
        assert_eq!(
            fields,
            EpochFields {
                year: 2023,
                month: 1,
                day: 26,
                hour: 12,
                minute: 30,
                second: 0.0,
            }
        );
    }

    #[test]
    fn test_shape_errors() {
        assert_eq!(parse_epoch_text("2023-01-26"), Err(EpochTextError::Shape));
        assert_eq!(
            parse_epoch_text("2023-01-26  12:30:00"),
            Err(EpochTextError::Shape)
        );
        assert_eq!(
            parse_epoch_text("2023-01-26 12:30:00 extra"),
            Err(EpochTextError::Shape)
        );
        assert_eq!(
            parse_epoch_text("2023/01/26 12:30:00"),
            Err(EpochTextError::DateComponents)
        );
        assert_eq!(
            parse_epoch_text("2023-01-26 12:30"),
            Err(EpochTextError::TimeComponents)
        );
    }

    #[test]
    fn test_numeric_errors() {
        assert_eq!(
            parse_epoch_text("2023-ab-26 12:30:00"),
            Err(EpochTextError::NotANumber("month"))
        );
        assert_eq!(
            parse_epoch_text("2023-01-26 12:30:xx"),
            Err(EpochTextError::NotANumber("second"))
        );
    }

    #[test]
    fn test_range_rules_in_order() {
        assert_eq!(
            parse_epoch_text("2023-01-26 24:00:00"),
            Err(EpochTextError::OutOfRange("hour"))
        );
        assert_eq!(
            parse_epoch_text("2023-01-26 12:60:00"),
            Err(EpochTextError::OutOfRange("minute"))
        );
        assert_eq!(
            parse_epoch_text("2023-01-26 12:30:60"),
            Err(EpochTextError::OutOfRange("second"))
        );
        assert_eq!(
            parse_epoch_text("1857-01-26 12:30:00"),
            Err(EpochTextError::OutOfRange("year"))
        );
        assert_eq!(
            parse_epoch_text("2023-13-26 12:30:00"),
            Err(EpochTextError::OutOfRange("month"))
        );
        // Hour is checked before the date fields.
        assert_eq!(
            parse_epoch_text("1857-13-26 25:30:00"),
            Err(EpochTextError::OutOfRange("hour"))
        );
    }

    #[test]
    fn test_day_bounds_per_month() {
        assert_eq!(
            parse_epoch_text("2023-02-30 10:00:00"),
            Err(EpochTextError::OutOfRange("day"))
        );
        assert_eq!(
            parse_epoch_text("2023-04-31 10:00:00"),
            Err(EpochTextError::OutOfRange("day"))
        );
        assert_eq!(
            parse_epoch_text("2023-01-32 10:00:00"),
            Err(EpochTextError::OutOfRange("day"))
        );
        assert_eq!(
            parse_epoch_text("2023-01-00 10:00:00"),
            Err(EpochTextError::OutOfRange("day"))
        );
        assert!(parse_epoch_text("2023-01-31 10:00:00").is_ok());
        assert!(parse_epoch_text("2023-04-30 10:00:00").is_ok());
        assert!(parse_epoch_text("2023-02-29 10:00:00").is_ok());
    }

    #[test]
    fn test_conversion_produces_comparable_epoch() {
        let (_, early) = epoch_from_text("2023-01-26 12:30:00").unwrap();
        let (_, late) = epoch_from_text("2023-01-27 12:30:00").unwrap();
        assert!(early < late);
    }
}
