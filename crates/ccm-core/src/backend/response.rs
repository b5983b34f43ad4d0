//! Response envelope of the backend boundary

use crate::backend::BackendError;
use serde::{Deserialize, Serialize};

/// `{success, data?, error?}` envelope wrapping every backend response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

impl<T> ApiResponse<T> {
    /// Successful response carrying data
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            code: None,
        }
    }

    /// Failed response carrying a message
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
            code: None,
        }
    }

    /// Convert back into a result; a failed envelope becomes its message
    ///
    /// # Errors
    /// Returns the envelope's error message (or `fallback`) when `success` is false
    pub fn into_result(self, fallback: &str) -> Result<T, String> {
        match (self.success, self.data) {
            (true, Some(data)) => Ok(data),
            (true, None) => Err(format!("{fallback}: empty response")),
            (false, _) => Err(self.error.unwrap_or_else(|| fallback.to_string())),
        }
    }
}

impl<T> From<Result<T, BackendError>> for ApiResponse<T> {
    fn from(result: Result<T, BackendError>) -> Self {
        match result {
            Ok(data) => Self::success(data),
            Err(e) => Self {
                code: Some(e.code().to_string()),
                ..Self::error(e.to_string())
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_envelope_carries_code() {
        let response: ApiResponse<String> = Err(BackendError::BackupUnavailable).into();
        assert!(!response.success);
        assert_eq!(response.code.as_deref(), Some("BACKUP_UNAVAILABLE"));

        let json = serde_json::to_value(&response).unwrap();
        assert!(json.get("data").is_none());
        assert!(json["error"].as_str().unwrap().contains("Backup"));
    }

    #[test]
    fn test_into_result() {
        assert_eq!(ApiResponse::success(3).into_result("x"), Ok(3));
        assert_eq!(
            ApiResponse::<i32>::error("boom").into_result("x"),
            Err("boom".to_string())
        );
        let failed = ApiResponse::<i32> {
            success: false,
            data: None,
            error: None,
            code: None,
        };
        assert_eq!(
            failed.into_result("Failed to read config"),
            Err("Failed to read config".to_string())
        );
    }
}
