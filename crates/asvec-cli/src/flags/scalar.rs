//! Scalar flag kinds.

use super::{FlagError, FlagValue};

/// Parses an unsigned integer, honoring `0x`, `0o`, `0b` and leading-zero
/// octal prefixes. Underscores between digits are ignored.
pub(crate) fn parse_unsigned(text: &str) -> Result<u64, String> {
    let cleaned = text.replace('_', "");
    let body = cleaned.strip_prefix('+').unwrap_or(&cleaned);
    let lower = body.to_ascii_lowercase();
    let (digits, radix) = if let Some(rest) = lower.strip_prefix("0x") {
        (rest, 16)
    } else if let Some(rest) = lower.strip_prefix("0o") {
        (rest, 8)
    } else if let Some(rest) = lower.strip_prefix("0b") {
        (rest, 2)
    } else if lower.len() > 1 && lower.starts_with('0') {
        (&lower[1..], 8)
    } else {
        (lower.as_str(), 10)
    };
    if digits.is_empty() || digits.starts_with(['+', '-']) {
        return Err("invalid syntax".to_string());
    }
    u64::from_str_radix(digits, radix).map_err(|e| e.to_string())
}

/// Signed counterpart of [`parse_unsigned`].
pub(crate) fn parse_signed(text: &str) -> Result<i64, String> {
    let (negative, magnitude) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text),
    };
    let value = parse_unsigned(magnitude)?;
    if negative {
        0i64.checked_sub_unsigned(value)
            .ok_or_else(|| "value out of range".to_string())
    } else {
        i64::try_from(value).map_err(|_| "value out of range".to_string())
    }
}

/// Parses a boolean: `1 t T TRUE true True` or `0 f F FALSE false False`.
pub fn parse_bool(text: &str) -> Option<bool> {
    match text {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Some(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Some(false),
        _ => None,
    }
}

impl FlagValue for u32 {
    const KIND: &'static str = "uint32";

    fn parse_flag(text: &str) -> Result<Self, FlagError> {
        let wide = parse_unsigned(text).map_err(|e| FlagError::invalid(Self::KIND, text, e))?;
        u32::try_from(wide).map_err(|_| FlagError::invalid(Self::KIND, text, "value out of range"))
    }

    fn format_flag(&self) -> String {
        self.to_string()
    }
}

impl FlagValue for u64 {
    const KIND: &'static str = "uint64";

    fn parse_flag(text: &str) -> Result<Self, FlagError> {
        parse_unsigned(text).map_err(|e| FlagError::invalid(Self::KIND, text, e))
    }

    fn format_flag(&self) -> String {
        self.to_string()
    }
}

impl FlagValue for i64 {
    const KIND: &'static str = "int64";

    fn parse_flag(text: &str) -> Result<Self, FlagError> {
        parse_signed(text).map_err(|e| FlagError::invalid(Self::KIND, text, e))
    }

    fn format_flag(&self) -> String {
        self.to_string()
    }
}

impl FlagValue for f32 {
    const KIND: &'static str = "float32";

    fn parse_flag(text: &str) -> Result<Self, FlagError> {
        let value: f32 = text
            .parse()
            .map_err(|e: std::num::ParseFloatError| FlagError::invalid(Self::KIND, text, e))?;
        if value.is_finite() {
            Ok(value)
        } else {
            Err(FlagError::invalid(Self::KIND, text, "value must be finite"))
        }
    }

    fn format_flag(&self) -> String {
        self.to_string()
    }
}

impl FlagValue for bool {
    const KIND: &'static str = "bool";

    fn parse_flag(text: &str) -> Result<Self, FlagError> {
        parse_bool(text).ok_or_else(|| FlagError::invalid(Self::KIND, text, "invalid syntax"))
    }

    fn format_flag(&self) -> String {
        self.to_string()
    }
}

impl FlagValue for String {
    const KIND: &'static str = "string";

    fn parse_flag(text: &str) -> Result<Self, FlagError> {
        Ok(text.to_string())
    }

    fn format_flag(&self) -> String {
        self.clone()
    }
}
