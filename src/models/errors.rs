//! Centralized Error Handling Module
//!
//! Every failure carries a unique error code, which makes log grepping and
//! monitoring straightforward.
//!
//! Error codes follow pattern: CATEGORY_SPECIFIC_ERROR
//! - GW_xxx: chain-data gateway / provider errors
//! - MODEL_xxx: trained-model load / inference errors
//! - API_xxx: HTTP API errors
//! - CFG_xxx: configuration errors

use std::fmt;

/// Application-wide error type
#[derive(Debug)]
pub struct AppError {
    /// Unique error code for logging/monitoring
    pub code: ErrorCode,
    /// Human-readable message
    pub message: String,
    /// Optional underlying error
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl AppError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            source: None,
        }
    }

    pub fn with_source(
        code: ErrorCode,
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            code,
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Get error code as string (for logging)
    pub fn code_str(&self) -> &'static str {
        self.code.as_str()
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code.as_str(), self.message)
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

/// Unique error codes for monitoring
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    // ============================================
    // Gateway / provider errors
    // ============================================
    /// Provider connection failed
    GatewayConnectionFailed,
    /// Provider request timeout
    GatewayTimeout,
    /// Provider rate limited (HTTP 429)
    GatewayRateLimited,
    /// Provider returned an error payload
    GatewayError,
    /// Provider response could not be parsed
    GatewayInvalidResponse,

    // ============================================
    // Model errors
    // ============================================
    /// Trained-model artifact missing on disk
    ModelArtifactMissing,
    /// Artifact present but unparsable
    ModelArtifactInvalid,
    /// Classifier and feature-transform versions disagree
    ModelVersionMismatch,
    /// Inference failed at runtime
    ModelInferenceFailed,

    // ============================================
    // API errors
    // ============================================
    /// Invalid request format
    ApiBadRequest,
    /// Internal server error
    ApiInternalError,
    /// Resource not found
    ApiNotFound,

    // ============================================
    // Configuration errors
    // ============================================
    /// Invalid configuration value
    ConfigInvalidValue,
    /// Component weights do not sum to 1.0
    ConfigInvalidWeights,
    /// Unsupported chain name
    ConfigUnsupportedChain,

    // ============================================
    // Input errors
    // ============================================
    /// Malformed address in the transaction
    InputInvalidAddress,

    // ============================================
    // Generic
    // ============================================
    /// Unknown error
    Unknown,
}

impl ErrorCode {
    /// Get string representation of error code
    pub fn as_str(&self) -> &'static str {
        match self {
            // Gateway
            Self::GatewayConnectionFailed => "GW_CONNECTION_FAILED",
            Self::GatewayTimeout => "GW_TIMEOUT",
            Self::GatewayRateLimited => "GW_RATE_LIMITED",
            Self::GatewayError => "GW_ERROR",
            Self::GatewayInvalidResponse => "GW_INVALID_RESPONSE",

            // Model
            Self::ModelArtifactMissing => "MODEL_ARTIFACT_MISSING",
            Self::ModelArtifactInvalid => "MODEL_ARTIFACT_INVALID",
            Self::ModelVersionMismatch => "MODEL_VERSION_MISMATCH",
            Self::ModelInferenceFailed => "MODEL_INFERENCE_FAILED",

            // API
            Self::ApiBadRequest => "API_BAD_REQUEST",
            Self::ApiInternalError => "API_INTERNAL_ERROR",
            Self::ApiNotFound => "API_NOT_FOUND",

            // Configuration
            Self::ConfigInvalidValue => "CFG_INVALID_VALUE",
            Self::ConfigInvalidWeights => "CFG_INVALID_WEIGHTS",
            Self::ConfigUnsupportedChain => "CFG_UNSUPPORTED_CHAIN",

            // Input
            Self::InputInvalidAddress => "INPUT_INVALID_ADDRESS",

            // Generic
            Self::Unknown => "UNKNOWN_ERROR",
        }
    }

    /// Get HTTP status code for API responses
    pub fn http_status(&self) -> u16 {
        match self {
            Self::ApiBadRequest | Self::InputInvalidAddress | Self::ConfigInvalidValue => 400,
            Self::ApiNotFound => 404,
            Self::GatewayRateLimited => 429,
            _ => 500,
        }
    }

    /// Check if a provider error is worth retrying
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::GatewayTimeout | Self::GatewayRateLimited | Self::GatewayConnectionFailed
        )
    }
}

// ============================================
// Convenience constructors
// ============================================

impl AppError {
    pub fn gateway_timeout(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::GatewayTimeout, msg)
    }

    pub fn gateway_rate_limited() -> Self {
        Self::new(ErrorCode::GatewayRateLimited, "Rate limited (HTTP 429)")
    }

    pub fn gateway_error(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::GatewayError, msg)
    }

    pub fn gateway_invalid_response(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::GatewayInvalidResponse, msg)
    }

    pub fn model_artifact_missing(path: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::ModelArtifactMissing,
            format!("Model artifact not found: {}", path.into()),
        )
    }

    pub fn model_version_mismatch(model: &str, transform: &str) -> Self {
        Self::new(
            ErrorCode::ModelVersionMismatch,
            format!(
                "Classifier version '{}' does not match feature-transform version '{}'",
                model, transform
            ),
        )
    }

    pub fn model_inference_failed(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::ModelInferenceFailed, msg)
    }

    pub fn invalid_address(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::InputInvalidAddress, msg)
    }

    pub fn invalid_weights(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::ConfigInvalidWeights, msg)
    }

    pub fn unsupported_chain(name: &str) -> Self {
        Self::new(
            ErrorCode::ConfigUnsupportedChain,
            format!("Unsupported chain: {}", name),
        )
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::ApiBadRequest, msg)
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::ApiInternalError, msg)
    }
}

// ============================================
// Result type alias
// ============================================

/// Application Result type
pub type AppResult<T> = Result<T, AppError>;

// ============================================
// Conversion from common error types
// ============================================

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        if err.kind() == std::io::ErrorKind::NotFound {
            Self::with_source(ErrorCode::ModelArtifactMissing, "File not found", err)
        } else {
            Self::with_source(ErrorCode::Unknown, "IO error", err)
        }
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::new(ErrorCode::GatewayTimeout, "Request timeout")
        } else if err.is_connect() {
            Self::new(ErrorCode::GatewayConnectionFailed, "Connection failed")
        } else {
            Self::new(ErrorCode::GatewayError, err.to_string())
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        Self::with_source(ErrorCode::GatewayInvalidResponse, "JSON parse error", err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        let err = AppError::gateway_timeout("lookup timed out");
        assert_eq!(err.code, ErrorCode::GatewayTimeout);
        assert_eq!(err.code_str(), "GW_TIMEOUT");
    }

    #[test]
    fn test_retryable() {
        assert!(ErrorCode::GatewayTimeout.is_retryable());
        assert!(ErrorCode::GatewayRateLimited.is_retryable());
        assert!(!ErrorCode::ModelVersionMismatch.is_retryable());
    }

    #[test]
    fn test_http_status() {
        assert_eq!(ErrorCode::ApiBadRequest.http_status(), 400);
        assert_eq!(ErrorCode::GatewayRateLimited.http_status(), 429);
        assert_eq!(ErrorCode::ModelInferenceFailed.http_status(), 500);
    }

    #[test]
    fn test_display_includes_code() {
        let err = AppError::model_version_mismatch("v2", "v1");
        let text = err.to_string();
        assert!(text.contains("MODEL_VERSION_MISMATCH"));
        assert!(text.contains("v2"));
    }
}
