//! Error types for drivetrain_latency

use thiserror::Error;

/// Main error type for plant, controller and simulator construction
#[derive(Debug, Error)]
pub enum ControlError {
    /// Invalid parameter (non-positive dt, negative delay, bad weights, ...)
    #[error("Construction error: {0}")]
    Construction(String),
    /// Matrix dimensions do not conform
    #[error("Dimension mismatch: {what} (expected {expected}, got {actual})")]
    DimensionMismatch {
        what: &'static str,
        expected: String,
        actual: String,
    },
    /// The discrete algebraic Riccati equation could not be solved
    #[error("Riccati solve failed: {0}")]
    RiccatiConvergence(String),
    /// Configuration could not be parsed
    #[error("Config error: {0}")]
    Config(#[from] serde_json::Error),
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// Visualization error
    #[error("Visualization error: {0}")]
    Visualization(String),
}

impl ControlError {
    pub(crate) fn dimension(
        what: &'static str,
        expected: (usize, usize),
        actual: (usize, usize),
    ) -> Self {
        ControlError::DimensionMismatch {
            what,
            expected: format!("{}x{}", expected.0, expected.1),
            actual: format!("{}x{}", actual.0, actual.1),
        }
    }
}

/// Result type alias for control operations
pub type ControlResult<T> = Result<T, ControlError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ControlError::Construction("dt must be positive".to_string());
        assert_eq!(format!("{}", err), "Construction error: dt must be positive");
    }

    #[test]
    fn test_dimension_display() {
        let err = ControlError::dimension("B", (1, 1), (2, 1));
        assert_eq!(
            format!("{}", err),
            "Dimension mismatch: B (expected 1x1, got 2x1)"
        );
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: ControlError = io_err.into();
        assert!(matches!(err, ControlError::Io(_)));
    }
}
