//! Error taxonomy for the forecast pipeline.

use thiserror::Error;

/// Result type alias using ForecastError.
pub type ForecastResult<T> = Result<T, ForecastError>;

/// Every failure a forecast cycle can run into before it reaches the
/// resilience boundary.
#[derive(Debug, Error)]
pub enum ForecastError {
    // === Upstream Errors ===
    #[error("Transport error for {url}: {message}")]
    Transport { url: String, message: String },

    #[error("Upstream fetch for {url} timed out after {seconds}s")]
    Timeout { url: String, seconds: u64 },

    // === Data Errors ===
    #[error("Payload is not a decodable grid: {0}")]
    Decode(String),

    #[error("Missing required variable: {0}")]
    MissingVariable(String),

    #[error("Grid dataset contains no cells")]
    EmptyDataset,

    #[error("Variable '{variable}' has {available} forecast slots, {required} required")]
    InsufficientHorizon {
        variable: String,
        required: usize,
        available: usize,
    },

    // === Storage Errors ===
    #[error("Storage error: {0}")]
    Storage(String),
}

impl ForecastError {
    /// Short stable label used for log fields and metric labels.
    pub fn category(&self) -> &'static str {
        match self {
            Self::Transport { .. } => "transport",
            Self::Timeout { .. } => "timeout",
            Self::Decode(_) => "decode",
            Self::MissingVariable(_) => "missing_variable",
            Self::EmptyDataset => "empty_dataset",
            Self::InsufficientHorizon { .. } => "insufficient_horizon",
            Self::Storage(_) => "storage",
        }
    }

    /// Whether the failure happened before any payload was received.
    pub fn is_upstream(&self) -> bool {
        matches!(self, Self::Transport { .. } | Self::Timeout { .. })
    }
}

impl From<serde_json::Error> for ForecastError {
    fn from(e: serde_json::Error) -> Self {
        ForecastError::Decode(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_categories_are_distinct() {
        let errors = [
            ForecastError::Transport {
                url: "u".into(),
                message: "m".into(),
            },
            ForecastError::Timeout {
                url: "u".into(),
                seconds: 1,
            },
            ForecastError::Decode("x".into()),
            ForecastError::MissingVariable("precipitation".into()),
            ForecastError::EmptyDataset,
            ForecastError::InsufficientHorizon {
                variable: "precipitation".into(),
                required: 7,
                available: 3,
            },
            ForecastError::Storage("disk".into()),
        ];
        let mut labels: Vec<_> = errors.iter().map(|e| e.category()).collect();
        labels.sort();
        labels.dedup();
        assert_eq!(labels.len(), errors.len());
    }

    #[test]
    fn test_upstream_classification() {
        let timeout = ForecastError::Timeout {
            url: "https://example.com/data.nc".into(),
            seconds: 30,
        };
        assert!(timeout.is_upstream());
        assert!(!ForecastError::EmptyDataset.is_upstream());
    }

    #[test]
    fn test_missing_variable_message() {
        let err = ForecastError::MissingVariable("probability".into());
        assert_eq!(err.to_string(), "Missing required variable: probability");
    }
}
