//! Screen controllers.
//!
//! Each controller owns the state of one dashboard screen, calls the API client,
//! and turns every failure into a [`Notification`] plus a fallback state instead
//! of propagating it.

pub mod account;
pub mod live_alerts;
pub mod report;
pub mod statistics;

use incialert_api_client::ClientError;
use incialert_core::ValidationErrors;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Success,
    Error,
}

/// Transient message shown to the user (a toast in the browser dashboard).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub severity: Severity,
    pub title: String,
    pub description: String,
}

impl Notification {
    pub fn info(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(Severity::Info, title, description)
    }

    pub fn success(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(Severity::Success, title, description)
    }

    pub fn error(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(Severity::Error, title, description)
    }

    fn new(severity: Severity, title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            severity,
            title: title.into(),
            description: description.into(),
        }
    }
}

/// Why a form submission did not go through.
#[derive(Debug, thiserror::Error)]
pub enum FormError {
    /// Rejected client-side; nothing was sent.
    #[error("{0}")]
    Invalid(ValidationErrors),

    #[error("{0}")]
    Media(String),

    #[error(transparent)]
    Client(#[from] ClientError),
}

impl From<ValidationErrors> for FormError {
    fn from(errors: ValidationErrors) -> Self {
        FormError::Invalid(errors)
    }
}
