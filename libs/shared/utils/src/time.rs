// libs/shared/utils/src/time.rs
//
// Conversion between wire `HH:MM` strings and minute offsets within the
// operating day.

use chrono::{NaiveTime, Timelike};
use thiserror::Error;

pub const MINUTES_PER_DAY: u32 = 24 * 60;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Invalid time '{0}', expected HH:MM")]
pub struct TimeFormatError(pub String);

/// Parse `HH:MM` into minutes since the start of the day.
///
/// `24:00` is accepted as the end-of-day boundary so availability can run
/// until midnight.
pub fn parse_hhmm(value: &str) -> Result<u32, TimeFormatError> {
    let value = value.trim();
    if value == "24:00" {
        return Ok(MINUTES_PER_DAY);
    }

    let time = NaiveTime::parse_from_str(value, "%H:%M")
        .map_err(|_| TimeFormatError(value.to_string()))?;

    Ok(time.hour() * 60 + time.minute())
}

pub fn format_hhmm(minutes: u32) -> String {
    format!("{:02}:{:02}", minutes / 60, minutes % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hhmm() {
        assert_eq!(parse_hhmm("00:00"), Ok(0));
        assert_eq!(parse_hhmm("09:30"), Ok(570));
        assert_eq!(parse_hhmm("23:59"), Ok(1439));
        assert_eq!(parse_hhmm("24:00"), Ok(MINUTES_PER_DAY));
    }

    #[test]
    fn test_parse_hhmm_rejects_garbage() {
        assert!(parse_hhmm("25:00").is_err());
        assert!(parse_hhmm("09:75").is_err());
        assert!(parse_hhmm("nine").is_err());
        assert!(parse_hhmm("").is_err());
    }

    #[test]
    fn test_format_hhmm() {
        assert_eq!(format_hhmm(0), "00:00");
        assert_eq!(format_hhmm(570), "09:30");
        assert_eq!(format_hhmm(MINUTES_PER_DAY), "24:00");
    }
}
