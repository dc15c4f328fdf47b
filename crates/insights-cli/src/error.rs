use std::fmt;

/// The login form field an authentication error should highlight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthField {
    Email,
    Password,
}

impl fmt::Display for AuthField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthField::Email => write!(f, "email"),
            AuthField::Password => write!(f, "password"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{message}")]
    Validation { field: AuthField, message: String },

    #[error("No account found for this email address")]
    EmailNotFound,

    #[error("Incorrect password")]
    InvalidPassword,

    /// Generic login failure covering directory fetch/parse problems. The
    /// message must not reveal which lookup step broke.
    #[error("Authentication failed. Please check your credentials.")]
    AuthenticationFailed,

    #[error("Failed to save session data: {0}")]
    StorageWrite(#[source] std::io::Error),

    #[error("Invalid query: {0}")]
    InvalidQuerySpec(String),

    #[error("Not signed in")]
    NotAuthenticated,

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Unexpected API response: {0}")]
    UnexpectedResponse(String),
}

impl AppError {
    /// The form field a login failure maps to, if any.
    pub fn field(&self) -> Option<AuthField> {
        match self {
            AppError::Validation { field, .. } => Some(*field),
            AppError::EmailNotFound => Some(AuthField::Email),
            AppError::InvalidPassword => Some(AuthField::Password),
            _ => None,
        }
    }

    /// Stable machine-readable code for authentication failures.
    pub fn code(&self) -> Option<&'static str> {
        match self {
            AppError::Validation { .. } => Some("VALIDATION"),
            AppError::EmailNotFound => Some("EMAIL_NOT_FOUND"),
            AppError::InvalidPassword => Some("INVALID_PASSWORD"),
            AppError::AuthenticationFailed => Some("AUTH_FAILED"),
            _ => None,
        }
    }
}

pub type AppResult<T> = Result<T, AppError>;
