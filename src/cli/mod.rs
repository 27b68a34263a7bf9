//! Command-line interface for jxlaunch.

pub mod auth;

use clap::Parser;

use crate::intent::{IntentError, IntentPayload};

/// Log in and launch the game client.
#[derive(Parser, Debug)]
#[command(name = "jxlaunch", version, about = "Log in and launch the game client")]
pub struct Cli {
    /// Intent payload delivered by the login redirect (`jagex:intent=...`)
    pub payload: Option<String>,

    /// Show cached credential status and exit
    #[arg(long, conflicts_with_all = ["payload", "logout"])]
    pub status: bool,

    /// Remove cached credentials and exit
    #[arg(long, conflicts_with = "payload")]
    pub logout: bool,
}

impl Cli {
    /// Parsed intent payload, if one was passed.
    pub fn intent_payload(&self) -> Result<Option<IntentPayload>, IntentError> {
        self.payload.as_deref().map(IntentPayload::parse).transpose()
    }

    /// Whether this invocation came from a person rather than a redirect.
    pub fn is_interactive(&self) -> bool {
        self.payload.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_is_positional() {
        let cli = Cli::try_parse_from(["jxlaunch", "jagex:intent=social_auth,code=1"]).unwrap();
        assert!(!cli.is_interactive());
        let payload = cli.intent_payload().unwrap().unwrap();
        assert_eq!(payload.get("code"), Some("1"));
    }

    #[test]
    fn no_arguments_is_interactive() {
        let cli = Cli::try_parse_from(["jxlaunch"]).unwrap();
        assert!(cli.is_interactive());
        assert!(cli.intent_payload().unwrap().is_none());
    }

    #[test]
    fn malformed_payload_surfaces_intent_error() {
        let cli = Cli::try_parse_from(["jxlaunch", "https://example.com"]).unwrap();
        assert!(matches!(
            cli.intent_payload(),
            Err(IntentError::Malformed(_))
        ));
    }

    #[test]
    fn status_conflicts_with_payload() {
        assert!(Cli::try_parse_from(["jxlaunch", "--status", "jagex:intent=x"]).is_err());
    }
}
