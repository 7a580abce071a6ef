use thiserror::Error;
use tracing::error;

use crate::services::qr::ParseError;

/// Shown instead of the raw transport error.
pub const NETWORK_ERROR_MESSAGE: &str = "ネットワークエラーが発生しました";

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Server error {status}: {message}")]
    Server { status: u16, message: String },

    #[error("Failed to decode response: {0}")]
    Decode(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Invalid code: {0}")]
    InvalidCode(#[from] ParseError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Session error: {0}")]
    Session(String),

    #[error("Failed to write {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl AppError {
    /// Text for the user. Server and validation messages pass through verbatim.
    pub fn user_message(&self) -> String {
        match self {
            AppError::Transport(e) => {
                error!("transport error: {}", e);
                NETWORK_ERROR_MESSAGE.to_string()
            }
            AppError::Server { message, .. } => message.clone(),
            AppError::Validation(msg) => msg.clone(),
            AppError::InvalidCode(e) => e.to_string(),
            AppError::Decode(_) | AppError::Config(_) | AppError::Session(_) | AppError::Io { .. } => {
                self.to_string()
            }
        }
    }

    pub fn is_local(&self) -> bool {
        matches!(self, AppError::Validation(_) | AppError::InvalidCode(_))
    }
}
