use thiserror::Error;

use crate::message::MessageError;
use crate::relay::RelayError;

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Message(#[from] MessageError),

    #[error("Relay error: {0}")]
    Relay(#[from] RelayError),

    #[error("There is no configured application ARN for {0}")]
    PlatformNotConfigured(String),
}

impl AppError {
    /// Stable code for logs and callers
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Message(MessageError::TooLong { .. }) => "MESSAGE_TOO_LONG",
            AppError::Relay(_) => "RELAY_ERROR",
            AppError::PlatformNotConfigured(_) => "PLATFORM_NOT_CONFIGURED",
        }
    }

    /// Whether the message itself is at fault, so resending cannot help
    pub fn is_rejected_message(&self) -> bool {
        matches!(self, AppError::Message(_))
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
