//! Wire shapes returned by the identity and game-session services.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Display identity of the logged-in user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct UserDetails {
    pub display_name: String,
    pub id: String,
    pub suffix: String,
    pub user_id: String,
}

impl fmt::Display for UserDetails {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.suffix.is_empty() {
            f.write_str(&self.display_name)
        } else {
            write!(f, "{}#{}", self.display_name, self.suffix)
        }
    }
}

/// A game character available under the current game session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Account {
    pub account_id: String,
    pub display_name: String,
    pub user_hash: String,
}

/// Opaque game session handle.
#[derive(Clone, PartialEq, Eq)]
pub struct GameSession {
    pub session_id: String,
}

impl fmt::Debug for GameSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GameSession")
            .field("session_id", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub expires_in: Option<i64>,
    #[serde(default)]
    pub id_token: Option<String>,
    #[serde(default)]
    pub scope: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CreateSessionRequest<'a> {
    pub id_token: &'a str,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_details_render_with_suffix() {
        let user: UserDetails = serde_json::from_str(
            r#"{"displayName":"Zezima","id":"1","suffix":"1234","userId":"u-1"}"#,
        )
        .unwrap();
        assert_eq!(user.to_string(), "Zezima#1234");
        assert_eq!(user.user_id, "u-1");
    }

    #[test]
    fn accounts_tolerate_missing_fields() {
        let accounts: Vec<Account> =
            serde_json::from_str(r#"[{"accountId":"42","displayName":"Main"}]"#).unwrap();
        assert_eq!(accounts[0].account_id, "42");
        assert_eq!(accounts[0].user_hash, "");
    }

    #[test]
    fn session_debug_hides_identifier() {
        let session = GameSession {
            session_id: "secret".to_string(),
        };
        assert!(!format!("{session:?}").contains("secret"));
    }
}
