use serde::Deserialize;
use thiserror::Error;

/// Shown for transport failures, where there is no server message.
pub const GENERIC_FAILURE_MESSAGE: &str = "An error occurred. Please try again.";

#[derive(Error, Debug)]
pub enum ApiError {
    /// No usable local session, or the backend refused the token.
    #[error("Login required - session is missing or expired")]
    LoginRequired,

    /// Non-2xx response; `message` is the backend's `detail` verbatim
    /// when it sent one.
    #[error("{message}")]
    Rejected {
        status: reqwest::StatusCode,
        message: String,
    },

    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// Error body shape used by every endpoint.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    detail: Option<serde_json::Value>,
}

impl ApiError {
    /// Build a rejection from a failed response body, falling back to
    /// `fallback` when the body carries no usable `detail`.
    pub fn from_status(status: reqwest::StatusCode, body: &str, fallback: &str) -> Self {
        let message = Self::extract_detail(body).unwrap_or_else(|| fallback.to_string());
        ApiError::Rejected { status, message }
    }

    fn extract_detail(body: &str) -> Option<String> {
        let parsed: ErrorBody = serde_json::from_str(body).ok()?;
        match parsed.detail? {
            serde_json::Value::String(s) if !s.is_empty() => Some(s),
            serde_json::Value::String(_) | serde_json::Value::Null => None,
            // Validation errors arrive as a list of objects
            other => Some(other.to_string()),
        }
    }

    /// Text to put in front of the user.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::NetworkError(_) => GENERIC_FAILURE_MESSAGE.to_string(),
            other => other.to_string(),
        }
    }

    pub fn is_login_required(&self) -> bool {
        matches!(self, ApiError::LoginRequired)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    #[test]
    fn test_detail_is_used_verbatim() {
        let err = ApiError::from_status(
            StatusCode::NOT_FOUND,
            r#"{"detail":"No customer with id 9 found"}"#,
            "Error fetching customer",
        );
        assert_eq!(err.to_string(), "No customer with id 9 found");
        assert!(matches!(
            err,
            ApiError::Rejected { status, .. } if status == StatusCode::NOT_FOUND
        ));
    }

    #[test]
    fn test_fallback_without_detail() {
        let err = ApiError::from_status(
            StatusCode::BAD_GATEWAY,
            "<html>oops</html>",
            "Error fetching customers",
        );
        assert_eq!(err.user_message(), "Error fetching customers");

        let err = ApiError::from_status(
            StatusCode::BAD_REQUEST,
            r#"{"detail":""}"#,
            "Registration failed",
        );
        assert_eq!(err.user_message(), "Registration failed");
    }

    #[test]
    fn test_structured_detail_is_stringified() {
        let err = ApiError::from_status(
            StatusCode::UNPROCESSABLE_ENTITY,
            r#"{"detail":[{"loc":["body","income"],"msg":"field required"}]}"#,
            "Error adding customer",
        );
        assert!(err.to_string().contains("field required"));
    }

    #[test]
    fn test_login_required_message() {
        assert!(ApiError::LoginRequired.is_login_required());
        assert!(ApiError::LoginRequired.user_message().contains("Login required"));
    }
}
