//! Response envelope
//!
//! Every operation result crossing the service boundary is wrapped in the
//! same envelope: a numeric code, a human-readable message, the optional
//! payload and a millisecond timestamp.

use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Code used for successful results
pub const CODE_OK: i32 = 200;
/// Code used for failed results
pub const CODE_ERROR: i32 = 500;

/// Uniform result envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResult<T> {
    /// Status code (200 success, 500 failure)
    pub code: i32,
    /// Human-readable message
    pub message: String,
    /// Payload, absent on failure
    pub data: Option<T>,
    /// Unix timestamp in milliseconds
    pub timestamp: i64,
}

impl<T> ApiResult<T> {
    /// Wrap a payload in a success envelope
    pub fn success(data: T) -> Self {
        Self {
            code: CODE_OK,
            message: "success".to_string(),
            data: Some(data),
            timestamp: Utc::now().timestamp_millis(),
        }
    }

    /// Build a failure envelope carrying only a message
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            code: CODE_ERROR,
            message: message.into(),
            data: None,
            timestamp: Utc::now().timestamp_millis(),
        }
    }

    /// Whether the envelope carries a success code
    pub fn is_success(&self) -> bool {
        self.code == CODE_OK
    }

    /// Convert a fallible operation result into an envelope.
    ///
    /// Errors are rendered into the message; they never cross the boundary
    /// raw.
    pub fn from_result<E: std::fmt::Display>(result: Result<T, E>) -> Self {
        match result {
            Ok(data) => Self::success(data),
            Err(err) => Self::error(err.to_string()),
        }
    }
}

impl<T> From<Result<T, anyhow::Error>> for ApiResult<T> {
    fn from(result: Result<T, anyhow::Error>) -> Self {
        match result {
            Ok(data) => Self::success(data),
            Err(err) => Self::error(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_envelope() {
        let result = ApiResult::success(42);
        assert_eq!(result.code, CODE_OK);
        assert_eq!(result.data, Some(42));
        assert!(result.is_success());
        assert!(result.timestamp > 0);
    }

    #[test]
    fn test_error_envelope() {
        let result: ApiResult<()> = ApiResult::error("boom");
        assert_eq!(result.code, CODE_ERROR);
        assert_eq!(result.message, "boom");
        assert!(result.data.is_none());
        assert!(!result.is_success());
    }

    #[test]
    fn test_from_result() {
        let ok: ApiResult<i32> = Ok::<_, anyhow::Error>(7).into();
        assert!(ok.is_success());

        let err = ApiResult::<i32>::from_result(Err::<i32, _>(anyhow::anyhow!("nope")));
        assert_eq!(err.message, "nope");
        assert_eq!(err.code, CODE_ERROR);
    }

    #[test]
    fn test_serializes_null_data_on_error() {
        let result: ApiResult<i32> = ApiResult::error("missing");
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["code"], 500);
        assert!(json["data"].is_null());
    }
}
