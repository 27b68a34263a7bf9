use std::time::Duration;

use thiserror::Error;

use super::id_token::TokenError;
use super::store::StoreError;

/// Failures of the login, exchange and session-acquisition steps.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid identity token: {0}")]
    Token(#[from] TokenError),
    #[error("credential store: {0}")]
    Store(#[from] StoreError),
    #[error("authorization code exchange failed: {0}")]
    ExchangeFailed(String),
    #[error("could not get user details: {0}")]
    ProfileFetchFailed(String),
    #[error("could not create game session: {0}")]
    SessionCreateFailed(String),
    #[error("could not list accounts: {0}")]
    AccountListFailed(String),
    #[error("OAuth state mismatch")]
    StateMismatch,
    #[error("no pending login found; start a new login")]
    MissingVerifier,
    #[error("identity token has no subject claim")]
    MissingSubject,
    #[error("login was denied: {0}")]
    CallbackDenied(String),
    #[error("no login callback received within {0:?}")]
    CallbackTimedOut(Duration),
    #[error("callback listener error: {0}")]
    Callback(String),
    #[error("invalid endpoint URL: {0}")]
    InvalidUrl(String),
    #[error("credential cannot be sent as a header value")]
    InvalidCredential,
    #[error("Network error: {0}")]
    Network(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<reqwest::Error> for AuthError {
    fn from(error: reqwest::Error) -> Self {
        Self::Network(error.to_string())
    }
}

impl From<serde_json::Error> for AuthError {
    fn from(error: serde_json::Error) -> Self {
        Self::Serialization(error.to_string())
    }
}
