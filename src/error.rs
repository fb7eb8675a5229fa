//! Error types for the rooftop analysis pipeline

use thiserror::Error;

/// Main error type for analysis operations.
///
/// Degenerate physical outcomes (no usable area, no panels, IRR that does not
/// converge) are valid results and never surface here.
#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("Invalid input: {field} = {value} ({reason})")]
    InvalidInput { field: String, value: String, reason: String },

    #[error("Unknown panel type '{requested}' (available: {available})")]
    UnknownPanelType { requested: String, available: String },

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl AnalysisError {
    pub fn invalid(field: impl Into<String>, value: impl ToString, reason: impl Into<String>) -> Self {
        AnalysisError::InvalidInput {
            field: field.into(),
            value: value.to_string(),
            reason: reason.into(),
        }
    }

    /// Field path of an `InvalidInput` error
    pub fn field(&self) -> Option<&str> {
        match self {
            AnalysisError::InvalidInput { field, .. } => Some(field),
            _ => None,
        }
    }
}

/// Result type alias for analysis operations
pub type Result<T> = std::result::Result<T, AnalysisError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_input_message_names_field() {
        let err = AnalysisError::invalid("roof.usable_area_sqm", 200.0, "exceeds roof area 150");
        assert_eq!(err.field(), Some("roof.usable_area_sqm"));
        let msg = err.to_string();
        assert!(msg.contains("roof.usable_area_sqm"), "message was {}", msg);
        assert!(msg.contains("200"), "message was {}", msg);
    }
}
