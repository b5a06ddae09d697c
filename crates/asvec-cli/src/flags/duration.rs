//! Duration flag kinds.
//!
//! Durations are written as a sequence of decimal numbers with unit suffixes,
//! such as `300ms`, `1.5h` or `2h45m`. Valid units are `ns`, `us` (or `µs`),
//! `ms`, `s`, `m` and `h`. A bare `0` is accepted.

use std::fmt::Write as _;
use std::time::Duration;

use super::{FlagError, FlagValue};

/// A non-negative duration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct FlagDuration(pub Duration);

impl FlagDuration {
    /// Whole milliseconds, saturating at `u32::MAX`.
    pub fn as_millis_u32(&self) -> u32 {
        u32::try_from(self.0.as_millis()).unwrap_or(u32::MAX)
    }

    /// Whole milliseconds, saturating at `u64::MAX`.
    pub fn as_millis_u64(&self) -> u64 {
        u64::try_from(self.0.as_millis()).unwrap_or(u64::MAX)
    }
}

impl FlagValue for FlagDuration {
    const KIND: &'static str = "duration";

    fn parse_flag(text: &str) -> Result<Self, FlagError> {
        let (negative, duration) =
            parse_signed_duration(text).map_err(|e| FlagError::invalid(Self::KIND, text, e))?;
        if negative && !duration.is_zero() {
            return Err(FlagError::invalid(
                Self::KIND,
                text,
                "negative durations are not allowed",
            ));
        }
        Ok(Self(duration))
    }

    fn format_flag(&self) -> String {
        format_duration(self.0)
    }
}

/// A duration that may also be infinite, written as `-1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InfDuration {
    Infinite,
    Finite(Duration),
}

impl InfDuration {
    /// Milliseconds, with `-1` for [`InfDuration::Infinite`].
    pub fn as_millis_i64(&self) -> i64 {
        match self {
            Self::Infinite => -1,
            Self::Finite(d) => i64::try_from(d.as_millis()).unwrap_or(i64::MAX),
        }
    }
}

impl FlagValue for InfDuration {
    const KIND: &'static str = "duration";

    fn parse_flag(text: &str) -> Result<Self, FlagError> {
        if text.trim() == "-1" {
            return Ok(Self::Infinite);
        }
        FlagDuration::parse_flag(text).map(|d| Self::Finite(d.0))
    }

    fn format_flag(&self) -> String {
        match self {
            Self::Infinite => "-1".to_string(),
            Self::Finite(d) => format_duration(*d),
        }
    }
}

fn parse_signed_duration(text: &str) -> Result<(bool, Duration), String> {
    let (negative, body) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text.strip_prefix('+').unwrap_or(text)),
    };
    if body == "0" {
        return Ok((negative, Duration::ZERO));
    }
    if body.is_empty() {
        return Err("invalid duration".to_string());
    }

    let mut nanos = 0f64;
    let mut rest = body;
    while !rest.is_empty() {
        let number_len = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(rest.len());
        let (number, tail) = rest.split_at(number_len);
        if number.is_empty() || number == "." {
            return Err("invalid duration".to_string());
        }
        let value: f64 = number
            .parse()
            .map_err(|_| format!("invalid number {number:?}"))?;

        let unit_len = tail
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(tail.len());
        let (unit, tail) = tail.split_at(unit_len);
        let scale = match unit {
            "ns" => 1.0,
            "us" | "µs" | "μs" => 1e3,
            "ms" => 1e6,
            "s" => 1e9,
            "m" => 60e9,
            "h" => 3600e9,
            "" => return Err(format!("missing unit in duration {text:?}")),
            other => return Err(format!("unknown unit {other:?} in duration {text:?}")),
        };
        nanos += value * scale;
        rest = tail;
    }

    if !nanos.is_finite() || nanos >= u64::MAX as f64 {
        return Err("duration out of range".to_string());
    }
    Ok((negative, Duration::from_nanos(nanos.round() as u64)))
}

/// Formats a duration the way it is accepted: `1h0m0s`, `2m30s`, `1.5s`,
/// `250ms`, `0s`.
pub fn format_duration(duration: Duration) -> String {
    let nanos = duration.as_nanos();
    if nanos == 0 {
        return "0s".to_string();
    }
    if nanos < 1_000 {
        return format!("{nanos}ns");
    }
    if nanos < 1_000_000 {
        return format!("{}µs", decimal(nanos, 1_000));
    }
    if nanos < 1_000_000_000 {
        return format!("{}ms", decimal(nanos, 1_000_000));
    }

    let total_secs = duration.as_secs();
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let mut out = String::new();
    if hours > 0 {
        let _ = write!(out, "{hours}h");
    }
    if hours > 0 || minutes > 0 {
        let _ = write!(out, "{minutes}m");
    }
    let _ = write!(out, "{}s", decimal(nanos % 60_000_000_000, 1_000_000_000));
    out
}

/// `value / unit` with the fractional part kept and trailing zeros dropped.
fn decimal(value: u128, unit: u128) -> String {
    let whole = value / unit;
    let fraction = value % unit;
    if fraction == 0 {
        return whole.to_string();
    }
    let width = unit.ilog10() as usize;
    let digits = format!("{fraction:0width$}");
    format!("{whole}.{}", digits.trim_end_matches('0'))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn test_parse_composite() {
        assert_eq!(FlagDuration::parse_flag("10ms").unwrap().0, ms(10));
        assert_eq!(
            FlagDuration::parse_flag("2h30m").unwrap().0,
            Duration::from_secs(9000)
        );
        assert_eq!(FlagDuration::parse_flag("1.5s").unwrap().0, ms(1500));
        assert_eq!(FlagDuration::parse_flag("1m30s").unwrap().0, ms(90_000));
        assert_eq!(
            FlagDuration::parse_flag("5us").unwrap().0,
            Duration::from_micros(5)
        );
    }

    #[test]
    fn test_zero_is_set() {
        assert_eq!(FlagDuration::parse_flag("0s").unwrap().0, Duration::ZERO);
        assert_eq!(FlagDuration::parse_flag("0").unwrap().0, Duration::ZERO);
        assert_eq!(FlagDuration::parse_flag("0s").unwrap().as_millis_u32(), 0);
    }

    #[test]
    fn test_parse_rejects() {
        for text in ["", "10", "ms", "1x", "-5s", "1..5s", "."] {
            assert!(FlagDuration::parse_flag(text).is_err(), "{text:?}");
        }
    }

    #[test]
    fn test_millisecond_projections() {
        let d = FlagDuration::parse_flag("2h").unwrap();
        assert_eq!(d.as_millis_u32(), 7_200_000);
        assert_eq!(d.as_millis_u64(), 7_200_000);
        let huge = FlagDuration(Duration::from_secs(10_000_000));
        assert_eq!(huge.as_millis_u32(), u32::MAX);
    }

    #[test]
    fn test_inf_duration() {
        assert_eq!(InfDuration::parse_flag("-1").unwrap(), InfDuration::Infinite);
        assert_eq!(InfDuration::Infinite.as_millis_i64(), -1);
        assert_eq!(InfDuration::parse_flag("10s").unwrap().as_millis_i64(), 10_000);
        assert!(InfDuration::parse_flag("-2s").is_err());
        assert_eq!(InfDuration::Infinite.format_flag(), "-1");
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::ZERO), "0s");
        assert_eq!(format_duration(ms(250)), "250ms");
        assert_eq!(format_duration(ms(1500)), "1.5s");
        assert_eq!(format_duration(ms(90_000)), "1m30s");
        assert_eq!(format_duration(Duration::from_secs(3600)), "1h0m0s");
        assert_eq!(format_duration(Duration::from_micros(1500)), "1.5ms");
        assert_eq!(format_duration(Duration::from_nanos(42)), "42ns");
    }
}
