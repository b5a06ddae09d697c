//! Closed-set flags. Input is case-insensitive and normalized to upper case.

use std::fmt;

use asvec_client::DistanceMetric;

use super::{FlagError, FlagValue};

impl FlagValue for DistanceMetric {
    const KIND: &'static str = "enum";

    fn parse_flag(text: &str) -> Result<Self, FlagError> {
        text.to_ascii_uppercase()
            .parse()
            .map_err(|_| FlagError::invalid("distance metric", text, unrecognized("distance metric", &metric_names())))
    }

    fn format_flag(&self) -> String {
        self.as_str().to_string()
    }
}

/// Accepted distance metric names, alphabetical.
pub fn metric_names() -> Vec<&'static str> {
    DistanceMetric::ALL.iter().map(DistanceMetric::as_str).collect()
}

/// Log verbosity, least severe first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub const ALL: [Self; 4] = [Self::Debug, Self::Info, Self::Warn, Self::Error];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Debug => "DEBUG",
            Self::Info => "INFO",
            Self::Warn => "WARN",
            Self::Error => "ERROR",
        }
    }

    /// Accepted names, in severity order.
    pub fn names() -> Vec<&'static str> {
        Self::ALL.iter().map(Self::as_str).collect()
    }

    pub fn as_tracing(&self) -> tracing::Level {
        match self {
            Self::Debug => tracing::Level::DEBUG,
            Self::Info => tracing::Level::INFO,
            Self::Warn => tracing::Level::WARN,
            Self::Error => tracing::Level::ERROR,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FlagValue for LogLevel {
    const KIND: &'static str = "enum";

    fn parse_flag(text: &str) -> Result<Self, FlagError> {
        let upper = text.to_ascii_uppercase();
        Self::ALL
            .into_iter()
            .find(|level| level.as_str() == upper)
            .ok_or_else(|| FlagError::invalid("log level", text, unrecognized("log level", &Self::names())))
    }

    fn format_flag(&self) -> String {
        self.as_str().to_string()
    }
}

fn unrecognized(what: &str, names: &[&str]) -> String {
    format!("unrecognized {what}, expected one of [{}]", names.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distance_metric_case_insensitive() {
        assert_eq!(
            DistanceMetric::parse_flag("squared_euclidean").unwrap(),
            DistanceMetric::SquaredEuclidean
        );
        assert_eq!(
            DistanceMetric::parse_flag("Cosine").unwrap(),
            DistanceMetric::Cosine
        );
        let err = DistanceMetric::parse_flag("euclid").unwrap_err();
        assert!(err.to_string().contains("unrecognized distance metric"));
    }

    #[test]
    fn test_metric_names_alphabetical() {
        assert_eq!(
            metric_names(),
            vec!["COSINE", "DOT_PRODUCT", "HAMMING", "MANHATTAN", "SQUARED_EUCLIDEAN"]
        );
    }

    #[test]
    fn test_log_level() {
        assert_eq!(LogLevel::parse_flag("debug").unwrap(), LogLevel::Debug);
        assert_eq!(LogLevel::parse_flag("WARN").unwrap(), LogLevel::Warn);
        assert!(LogLevel::parse_flag("TRACE").is_err());
        assert_eq!(LogLevel::names(), vec!["DEBUG", "INFO", "WARN", "ERROR"]);
        assert!(LogLevel::Debug < LogLevel::Error);
    }
}
