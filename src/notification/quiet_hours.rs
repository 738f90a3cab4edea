use chrono::{NaiveTime, Timelike};
use std::fmt;

/// Invalid quiet-hours boundary
#[derive(Debug, Clone, PartialEq)]
pub enum QuietHoursError {
    InvalidFormat(String),
    OutOfRange(String),
}

impl fmt::Display for QuietHoursError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QuietHoursError::InvalidFormat(s) => {
                write!(f, "invalid quiet hours time '{}': expected HH:MM", s)
            }
            QuietHoursError::OutOfRange(s) => {
                write!(f, "quiet hours time '{}' is not a valid time of day", s)
            }
        }
    }
}

impl std::error::Error for QuietHoursError {}

/// Parse "HH:MM" into an HHMM integer (e.g. "22:30" → 2230).
pub fn parse_hhmm(value: &str) -> Result<u32, QuietHoursError> {
    let (hours, minutes) = value
        .trim()
        .split_once(':')
        .ok_or_else(|| QuietHoursError::InvalidFormat(value.to_string()))?;

    let hours: u32 = hours
        .parse()
        .map_err(|_| QuietHoursError::InvalidFormat(value.to_string()))?;
    let minutes: u32 = minutes
        .parse()
        .map_err(|_| QuietHoursError::InvalidFormat(value.to_string()))?;

    if hours > 23 || minutes > 59 {
        return Err(QuietHoursError::OutOfRange(value.to_string()));
    }

    Ok(hours * 100 + minutes)
}

/// Time of day as an HHMM integer.
pub fn hhmm(time: NaiveTime) -> u32 {
    time.hour() * 100 + time.minute()
}

/// Inclusive window test on HHMM integers; `start > end` spans midnight.
pub fn in_window(current: u32, start: u32, end: u32) -> bool {
    if start <= end {
        current >= start && current <= end
    } else {
        current >= start || current <= end
    }
}
