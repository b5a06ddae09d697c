use chrono::{DateTime, Utc};

use super::scalar::parse_signed;
use super::{FlagError, FlagValue};

/// Seconds since the Unix epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct UnixTimestamp(pub DateTime<Utc>);

impl UnixTimestamp {
    /// The calendar instant.
    pub fn time(&self) -> DateTime<Utc> {
        self.0
    }
}

impl FlagValue for UnixTimestamp {
    const KIND: &'static str = "unix-timestamp (sec)";

    fn parse_flag(text: &str) -> Result<Self, FlagError> {
        let seconds = parse_signed(text).map_err(|e| FlagError::invalid("timestamp", text, e))?;
        DateTime::from_timestamp(seconds, 0)
            .map(Self)
            .ok_or_else(|| FlagError::invalid("timestamp", text, "out of range"))
    }

    fn format_flag(&self) -> String {
        self.0.timestamp().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_is_epoch() {
        let ts = UnixTimestamp::parse_flag("0").unwrap();
        assert_eq!(ts.time(), DateTime::UNIX_EPOCH);
        assert_eq!(ts.format_flag(), "0");
    }

    #[test]
    fn test_signed_seconds() {
        let ts = UnixTimestamp::parse_flag("1700000000").unwrap();
        assert_eq!(ts.time().timestamp(), 1_700_000_000);
        let before = UnixTimestamp::parse_flag("-60").unwrap();
        assert_eq!(before.time().timestamp(), -60);
    }

    #[test]
    fn test_rejects() {
        assert!(UnixTimestamp::parse_flag("yesterday").is_err());
        assert!(UnixTimestamp::parse_flag("9223372036854775807").is_err());
        let err = UnixTimestamp::parse_flag("").unwrap_err();
        assert!(err.to_string().starts_with("invalid timestamp"));
    }
}
