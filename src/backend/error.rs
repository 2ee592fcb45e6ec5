//! Error types surfaced by the backend client and the stores

use thiserror::Error;

/// Failure talking to the hosted backend
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The backend answered with an error payload
    #[error("backend returned {status}: {message}")]
    Api {
        status: u16,
        code: Option<String>,
        message: String,
    },

    #[error("failed to decode backend response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("count requested but no Content-Range header was returned")]
    MissingCount,

    #[error("invalid backend url: {0}")]
    Url(#[from] url::ParseError),
}

impl BackendError {
    /// Status code of an API error, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            Self::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// The backend refused the request itself, retrying will not help
    pub fn is_rejection(&self) -> bool {
        matches!(self, Self::Api { status, .. } if (400..500).contains(status))
    }
}

/// Authentication failures rewritten to user-facing text
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("Invalid email or password")]
    InvalidCredentials,
    #[error("An account with this email already exists")]
    EmailTaken,
    #[error("No account found for this email")]
    UnknownEmail,
}

impl AuthError {
    /// Map a raw auth service message to a known failure
    pub fn from_message(message: &str) -> Option<Self> {
        let lower = message.to_ascii_lowercase();
        if lower.contains("invalid login credentials") || lower.contains("invalid_grant") {
            Some(Self::InvalidCredentials)
        } else if lower.contains("already registered") || lower.contains("already exists") {
            Some(Self::EmailTaken)
        } else if lower.contains("user not found") || lower.contains("email not found") {
            Some(Self::UnknownEmail)
        } else {
            None
        }
    }
}

/// Preconditions checked by the stores before any backend call
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("User not found")]
    UserNotFound,
    #[error("Company not found")]
    CompanyNotFound,
    #[error("Survey status is undefined")]
    SurveyStatusUndefined,
    #[error("Missing answers for required questions: {}", .0.join(", "))]
    MissingRequiredAnswers(Vec<String>),
    #[error("Nothing to submit")]
    EmptySubmission,
}

/// Rewrite a failed auth call into a user-facing error when the message is known
pub fn map_auth_error(err: anyhow::Error) -> anyhow::Error {
    let known = match err.downcast_ref::<BackendError>() {
        Some(BackendError::Api { message, code, .. }) => AuthError::from_message(message)
            .or_else(|| code.as_deref().and_then(AuthError::from_message)),
        _ => None,
    };
    match known {
        Some(auth) => auth.into(),
        None => err,
    }
}
