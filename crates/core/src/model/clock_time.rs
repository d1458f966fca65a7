use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ClockTimeError {
    #[error("clock time must look like HH:MM:SS, got {raw:?}")]
    Malformed { raw: String },

    #[error("clock time must not be negative, got {raw:?}")]
    Negative { raw: String },

    #[error("{field} out of range in {raw:?}")]
    OutOfRange { field: &'static str, raw: String },
}

/// Remaining section time as carried on the wire (`"HH:MM:SS"`, zero padded).
///
/// ```
/// # use exam_core::model::ClockTime;
/// let t: ClockTime = "01:05:30".parse()?;
/// assert_eq!(t.as_secs(), 3930);
/// assert_eq!(ClockTime::from_secs(2520).to_string(), "00:42:00");
/// # Ok::<(), exam_core::model::ClockTimeError>(())
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct ClockTime(u32);

impl ClockTime {
    pub const ZERO: Self = Self(0);

    #[must_use]
    pub fn from_secs(secs: u32) -> Self {
        Self(secs)
    }

    #[must_use]
    pub fn as_secs(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for ClockTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hours = self.0 / 3600;
        let minutes = (self.0 % 3600) / 60;
        let seconds = self.0 % 60;
        write!(f, "{hours:02}:{minutes:02}:{seconds:02}")
    }
}

fn parse_part(raw: &str, part: &str, field: &'static str, max: Option<u32>) -> Result<u32, ClockTimeError> {
    if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ClockTimeError::Malformed { raw: raw.to_owned() });
    }
    let value: u32 = part.parse().map_err(|_| ClockTimeError::OutOfRange {
        field,
        raw: raw.to_owned(),
    })?;
    if max.is_some_and(|max| value > max) {
        return Err(ClockTimeError::OutOfRange {
            field,
            raw: raw.to_owned(),
        });
    }
    Ok(value)
}

impl FromStr for ClockTime {
    type Err = ClockTimeError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let trimmed = raw.trim();
        if trimmed.starts_with('-') {
            return Err(ClockTimeError::Negative { raw: raw.to_owned() });
        }

        let mut parts = trimmed.split(':');
        let (Some(h), Some(m), Some(s), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(ClockTimeError::Malformed { raw: raw.to_owned() });
        };
        if m.len() != 2 || s.len() != 2 {
            return Err(ClockTimeError::Malformed { raw: raw.to_owned() });
        }

        let hours = parse_part(raw, h, "hours", None)?;
        let minutes = parse_part(raw, m, "minutes", Some(59))?;
        let seconds = parse_part(raw, s, "seconds", Some(59))?;

        hours
            .checked_mul(3600)
            .and_then(|h| h.checked_add(minutes * 60 + seconds))
            .map(Self)
            .ok_or(ClockTimeError::OutOfRange {
                field: "hours",
                raw: raw.to_owned(),
            })
    }
}

impl Serialize for ClockTime {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ClockTime {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_zero_padded() {
        assert_eq!(ClockTime::from_secs(2520).to_string(), "00:42:00");
        assert_eq!(ClockTime::from_secs(0).to_string(), "00:00:00");
        assert_eq!(ClockTime::from_secs(5).to_string(), "00:00:05");
        assert_eq!(ClockTime::from_secs(3930).to_string(), "01:05:30");
    }

    #[test]
    fn parses_wire_format() {
        assert_eq!("01:05:30".parse::<ClockTime>().unwrap().as_secs(), 3930);
        assert_eq!("00:42:00".parse::<ClockTime>().unwrap().as_secs(), 2520);
        assert_eq!(" 00:00:05 ".parse::<ClockTime>().unwrap().as_secs(), 5);
    }

    #[test]
    fn hours_may_exceed_two_digits() {
        let t: ClockTime = "100:00:00".parse().unwrap();
        assert_eq!(t.as_secs(), 360_000);
        assert_eq!(t.to_string(), "100:00:00");
    }

    #[test]
    fn rejects_garbage() {
        assert!(matches!(
            "abc".parse::<ClockTime>(),
            Err(ClockTimeError::Malformed { .. })
        ));
        assert!(matches!(
            "00:4:00".parse::<ClockTime>(),
            Err(ClockTimeError::Malformed { .. })
        ));
        assert!(matches!(
            "00:61:00".parse::<ClockTime>(),
            Err(ClockTimeError::OutOfRange { field: "minutes", .. })
        ));
        assert!(matches!(
            "-00:01:00".parse::<ClockTime>(),
            Err(ClockTimeError::Negative { .. })
        ));
        assert!(matches!(
            "00:00:00:00".parse::<ClockTime>(),
            Err(ClockTimeError::Malformed { .. })
        ));
    }
}
