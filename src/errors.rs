use thiserror::Error;

/// Failure talking to the SOCIO backend.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("no signed-in email")]
    MissingEmail,

    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("backend returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("invalid response body: {0}")]
    Decode(#[from] serde_json::Error),
}

impl ApiError {
    /// Message shown to the user when a mutating call fails.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::MissingEmail => "You need to be signed in to do that.".to_string(),
            ApiError::Request(e) if e.is_timeout() => {
                "The server took too long to respond. Please try again.".to_string()
            }
            ApiError::Request(_) => {
                "Failed to reach the server. Please check your connection and try again."
                    .to_string()
            }
            ApiError::Status { status, .. } if *status >= 500 => {
                "The server had a problem saving your changes. Please try again.".to_string()
            }
            ApiError::Status { status, .. } => {
                format!("The server rejected the request (HTTP {}).", status)
            }
            ApiError::Decode(_) => "The server sent an unexpected response.".to_string(),
        }
    }
}

/// Why the device could not produce a position fix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
pub enum LocationErrorKind {
    #[error("location permission denied")]
    PermissionDenied,

    #[error("position unavailable")]
    PositionUnavailable,

    #[error("location request timed out")]
    Timeout,

    #[error("location capability unsupported")]
    Unsupported,
}

/// An action was invoked in a state that does not offer it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cannot {action} while {state}")]
pub struct InvalidTransition {
    pub state: &'static str,
    pub action: &'static str,
}
