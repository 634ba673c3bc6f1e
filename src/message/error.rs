use thiserror::Error;

use super::Platform;

/// Encoding error raised while rendering a message
#[derive(Debug, Error)]
pub enum MessageError {
    /// The platform payload stays over its byte budget after trimming (or trimming was impossible)
    #[error("Your message for {platform} is too long ({length} bytes, limit {limit}): {payload}")]
    TooLong {
        platform: Platform,
        length: usize,
        limit: usize,
        payload: String,
    },
}

impl MessageError {
    /// Platform whose payload failed to encode
    pub fn platform(&self) -> Platform {
        match self {
            MessageError::TooLong { platform, .. } => *platform,
        }
    }
}

/// Result type for message encoding
pub type MessageResult<T> = Result<T, MessageError>;
