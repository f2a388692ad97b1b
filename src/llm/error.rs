//! Model-invocation error types

use std::time::Duration;
use thiserror::Error;

use crate::schema::SchemaViolation;

/// Errors that can occur while invoking the model service
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("Rate limited, retry after {retry_after:?}")]
    RateLimited { retry_after: Duration },

    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Timeout after {0:?}")]
    Timeout(Duration),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Schema(#[from] SchemaViolation),

    #[error("Unknown tool requested: {0}")]
    UnknownTool(String),

    #[error("Tool '{name}' failed: {message}")]
    Tool { name: String, message: String },

    #[error("Model kept calling tools after {0} rounds")]
    ToolRoundsExceeded(usize),
}

impl ModelError {
    /// Check if this is a timeout, either ours or the HTTP client's
    pub fn is_timeout(&self) -> bool {
        match self {
            ModelError::Timeout(_) => true,
            ModelError::Network(e) => e.is_timeout(),
            _ => false,
        }
    }

    /// Check if the service answered but the answer was unusable
    pub fn is_bad_output(&self) -> bool {
        matches!(
            self,
            ModelError::InvalidResponse(_) | ModelError::Json(_) | ModelError::Schema(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_timeout() {
        assert!(ModelError::Timeout(Duration::from_secs(30)).is_timeout());
        assert!(!ModelError::InvalidResponse("bad".to_string()).is_timeout());
    }

    #[test]
    fn test_is_bad_output() {
        let violation = SchemaViolation {
            path: "$.items".to_string(),
            expected: "array".to_string(),
            found: "missing".to_string(),
        };
        assert!(ModelError::from(violation).is_bad_output());
        assert!(ModelError::InvalidResponse("no content".to_string()).is_bad_output());
        assert!(
            !ModelError::Api {
                status: 500,
                message: "Server error".to_string()
            }
            .is_bad_output()
        );
    }

    #[test]
    fn test_tool_error_display() {
        let err = ModelError::Tool {
            name: "geocode_location".to_string(),
            message: "Location not found: Atlantis".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Tool 'geocode_location' failed: Location not found: Atlantis"
        );
    }
}
