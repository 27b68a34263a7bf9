use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// OAuth token set returned by the authorization-code exchange.
///
/// Serialized as JSON into the `token` blob; the identity token is also
/// cached on its own in the `id_token` blob.
///
/// # Example
/// ```no_run
/// use chrono::{Duration, Utc};
/// use jxlaunch::auth::Token;
///
/// let token = Token {
///     access_token: "access".to_string(),
///     refresh_token: Some("refresh".to_string()),
///     token_type: Some("bearer".to_string()),
///     expiry: Some(Utc::now() + Duration::hours(1)),
///     id_token: None,
///     scope: Some("openid offline".to_string()),
/// };
/// assert!(token.is_usable(Duration::minutes(30)));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Token {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub expiry: Option<DateTime<Utc>>,
    #[serde(default)]
    pub id_token: Option<String>,
    #[serde(default)]
    pub scope: Option<String>,
}

impl Token {
    /// Whether the token stays valid for at least `margin` past `now`.
    ///
    /// A token without an expiry is never considered usable.
    pub fn is_usable_at(&self, now: DateTime<Utc>, margin: Duration) -> bool {
        match self.expiry {
            Some(expiry) => expiry - now >= margin,
            None => false,
        }
    }

    pub fn is_usable(&self, margin: Duration) -> bool {
        self.is_usable_at(Utc::now(), margin)
    }
}
