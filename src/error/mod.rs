//! Error types surfaced at the process boundary.

use thiserror::Error;

use crate::auth::{AuthError, StoreError, TokenError};
use crate::intent::IntentError;

/// Primary error type for launcher operations.
#[derive(Error, Debug)]
pub enum LauncherError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("Credential store error: {0}")]
    Store(#[from] StoreError),

    #[error("Invalid intent payload: {0}")]
    Intent(#[from] IntentError),

    #[error("Could not open browser: {0}")]
    Browser(String),

    #[error("Account selection failed: {0}")]
    Picker(String),

    #[error("Could not launch game: {0}")]
    Launch(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Interrupted")]
    Interrupted,
}

/// Coarse classification used when reporting failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum ErrorCategory {
    /// Cache or config file access.
    ConfigIo,
    /// Identity token failed structural validation.
    Token,
    /// Outbound request failed or returned an unexpected response.
    Transport,
    /// Login callback was denied, timed out or did not match.
    Login,
    /// Malformed command-line payload.
    Intent,
    /// Browser, account picker or game process.
    Collaborator,
    Interrupted,
}

impl LauncherError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Configuration(_) | Self::Store(_) | Self::Io(_) => ErrorCategory::ConfigIo,
            Self::Auth(auth) => match auth {
                AuthError::Token(_) | AuthError::MissingSubject | AuthError::InvalidCredential => {
                    ErrorCategory::Token
                }
                AuthError::Store(_) | AuthError::MissingVerifier | AuthError::InvalidUrl(_) => {
                    ErrorCategory::ConfigIo
                }
                AuthError::StateMismatch
                | AuthError::CallbackDenied(_)
                | AuthError::CallbackTimedOut(_)
                | AuthError::Callback(_) => ErrorCategory::Login,
                AuthError::ExchangeFailed(_)
                | AuthError::ProfileFetchFailed(_)
                | AuthError::SessionCreateFailed(_)
                | AuthError::AccountListFailed(_)
                | AuthError::Network(_)
                | AuthError::Serialization(_) => ErrorCategory::Transport,
            },
            Self::Intent(_) => ErrorCategory::Intent,
            Self::Browser(_) | Self::Picker(_) | Self::Launch(_) => ErrorCategory::Collaborator,
            Self::Interrupted => ErrorCategory::Interrupted,
        }
    }
}

impl From<TokenError> for LauncherError {
    fn from(error: TokenError) -> Self {
        Self::Auth(AuthError::Token(error))
    }
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, LauncherError>;
