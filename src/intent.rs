//! Command-line intent payloads (`jagex:key=value,key=value,...`).
//!
//! The browser redirect re-launches the program with one of these as its only
//! argument; it is the deferred delivery of the authorization callback.

use std::collections::BTreeMap;
use std::str::FromStr;

use thiserror::Error;

/// Scheme prefix every payload must carry.
pub const SCHEME: &str = "jagex";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IntentError {
    #[error("expected `jagex:key=value,...`, got {0:?}")]
    Malformed(String),
    #[error("no intent found in payload")]
    MissingIntent,
    #[error("intent `{intent}` is missing `{field}`")]
    MissingField { intent: String, field: &'static str },
    #[error("unsupported intent `{0}`")]
    Unsupported(String),
}

/// What a payload asks the launcher to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    /// Resume a launcher login with the authorization code from the redirect.
    SocialAuth { code: String, state: Option<String> },
}

/// Parsed key-value pairs of an intent payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntentPayload {
    pairs: BTreeMap<String, String>,
}

impl IntentPayload {
    /// Parse a raw payload. Pairs without `=` are skipped; an `intent` key is required.
    pub fn parse(raw: &str) -> Result<Self, IntentError> {
        let body = match raw.trim().split_once(':') {
            Some((scheme, body)) if scheme == SCHEME => body,
            _ => return Err(IntentError::Malformed(raw.to_string())),
        };

        let pairs: BTreeMap<String, String> = body
            .split(',')
            .filter_map(|pair| pair.split_once('='))
            .filter(|(key, _)| !key.is_empty())
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();

        if !pairs.contains_key("intent") {
            return Err(IntentError::MissingIntent);
        }
        Ok(Self { pairs })
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs.get(key).map(String::as_str)
    }

    pub fn intent_name(&self) -> &str {
        self.get("intent").unwrap_or_default()
    }

    /// Interpret the payload as one of the supported intents.
    pub fn intent(&self) -> Result<Intent, IntentError> {
        match self.intent_name() {
            "social_auth" => {
                let code = self
                    .get("code")
                    .filter(|code| !code.is_empty())
                    .ok_or_else(|| IntentError::MissingField {
                        intent: "social_auth".to_string(),
                        field: "code",
                    })?;
                Ok(Intent::SocialAuth {
                    code: code.to_string(),
                    state: self.get("state").map(str::to_string),
                })
            }
            other => Err(IntentError::Unsupported(other.to_string())),
        }
    }
}

impl FromStr for IntentPayload {
    type Err = IntentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
