//! The `--vector` flag.
//!
//! Accepts `[v1,v2,...]` with brackets and whitespace tolerated. When every
//! element is a boolean spelling (`1`, `0`, `t`, `false`, ...) the result is a
//! boolean vector, otherwise every element must be a 32-bit float. `1.0` and
//! `0.0` are floats. Float elements must be finite.

use asvec_client::Vector;

use super::scalar::parse_bool;
use super::{FlagError, FlagValue};

impl FlagValue for Vector {
    const KIND: &'static str = "[]float32 or []bool";

    fn parse_flag(text: &str) -> Result<Self, FlagError> {
        let cleaned: String = text
            .trim()
            .trim_matches(|c| c == '[' || c == ']')
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect();
        if cleaned.is_empty() {
            return Err(FlagError::EmptyVector);
        }

        let elements: Vec<&str> = cleaned.split(',').collect();
        if let Some(bools) = elements
            .iter()
            .map(|e| parse_bool(e))
            .collect::<Option<Vec<bool>>>()
        {
            return Ok(Vector::Bool(bools));
        }

        elements
            .iter()
            .map(|e| {
                let value = e.parse::<f32>().map_err(|err| {
                    FlagError::invalid("vector", text, format!("failed to parse float vector: {e:?}: {err}"))
                })?;
                if value.is_finite() {
                    Ok(value)
                } else {
                    Err(FlagError::invalid(
                        "vector",
                        text,
                        format!("float vector elements must be finite: {e:?}"),
                    ))
                }
            })
            .collect::<Result<Vec<f32>, _>>()
            .map(Vector::Float)
    }

    fn format_flag(&self) -> String {
        format_vector(self)
    }
}

/// `[1,0,1]` for booleans, `[0.5,1.0]` for floats.
pub fn format_vector(vector: &Vector) -> String {
    let parts: Vec<String> = match vector {
        Vector::Bool(bits) => bits
            .iter()
            .map(|&bit| if bit { "1" } else { "0" }.to_string())
            .collect(),
        Vector::Float(values) => values.iter().map(|v| format_float(*v)).collect(),
    };
    format!("[{}]", parts.join(","))
}

/// Six decimals with trailing zeros removed, keeping at least one.
pub fn format_float(value: f32) -> String {
    let fixed = format!("{value:.6}");
    let trimmed = fixed.trim_end_matches('0');
    if trimmed.ends_with('.') {
        format!("{trimmed}0")
    } else {
        trimmed.to_string()
    }
}
