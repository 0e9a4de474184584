use crate::domain::model::Action;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ContentError {
    #[error("No {attribute} found for {action} content action")]
    MissingEndpoint {
        action: Action,
        attribute: &'static str,
    },

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Transport error: {message}")]
    Transport { message: String },

    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("A modal session is already open")]
    ModalBusy,

    #[error("The modal body does not contain a form")]
    MissingForm,

    #[error("The content container has already been removed")]
    Detached,

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error in '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Transport,
    Modal,
    Lifecycle,
}

impl ContentError {
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::MissingEndpoint { .. }
            | Self::Url(_)
            | Self::ConfigValidationError { .. }
            | Self::InvalidConfigValueError { .. } => ErrorCategory::Configuration,
            Self::Http(_) | Self::Transport { .. } | Self::SerializationError(_) => {
                ErrorCategory::Transport
            }
            Self::ModalBusy | Self::MissingForm => ErrorCategory::Modal,
            Self::Detached | Self::IoError(_) => ErrorCategory::Lifecycle,
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Configuration => format!("Configuration problem: {}", self),
            ErrorCategory::Transport => format!("Could not reach the server: {}", self),
            ErrorCategory::Modal => format!("Dialog unavailable: {}", self),
            ErrorCategory::Lifecycle => format!("Content unavailable: {}", self),
        }
    }

    /// Exit code used by the CLI.
    pub fn exit_code(&self) -> i32 {
        match self.category() {
            ErrorCategory::Configuration => 1,
            ErrorCategory::Transport => 2,
            ErrorCategory::Modal | ErrorCategory::Lifecycle => 3,
        }
    }
}

pub type Result<T> = std::result::Result<T, ContentError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_endpoint_is_configuration_error() {
        let err = ContentError::MissingEndpoint {
            action: Action::Edit,
            attribute: "content-edit-url",
        };
        assert_eq!(err.category(), ErrorCategory::Configuration);
        assert_eq!(
            err.to_string(),
            "No content-edit-url found for edit content action"
        );
        assert_eq!(err.exit_code(), 1);
    }

    #[test]
    fn test_transport_error_message() {
        let err = ContentError::transport("connection reset");
        assert_eq!(err.category(), ErrorCategory::Transport);
        assert!(err.user_friendly_message().contains("connection reset"));
    }
}
