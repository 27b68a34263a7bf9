//! Starting the game client for a chosen account.

use std::path::PathBuf;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;

use crate::error::LauncherError;
use crate::provider::{Account, GameSession};

pub const SESSION_ID_VAR: &str = "JX_SESSION_ID";
pub const CHARACTER_ID_VAR: &str = "JX_CHARACTER_ID";
pub const DISPLAY_NAME_VAR: &str = "JX_DISPLAY_NAME";

#[async_trait]
pub trait GameLauncher: Send + Sync {
    async fn launch(&self, session: &GameSession, account: &Account) -> Result<(), LauncherError>;
}

/// Spawns the game executable and returns without waiting for it.
#[derive(Debug, Clone)]
pub struct ProcessLauncher {
    game_path: PathBuf,
}

impl ProcessLauncher {
    pub fn new(game_path: impl Into<PathBuf>) -> Self {
        Self {
            game_path: game_path.into(),
        }
    }

    fn command(&self, session: &GameSession, account: &Account) -> Command {
        let mut command = Command::new(&self.game_path);
        command
            .env(SESSION_ID_VAR, &session.session_id)
            .env(CHARACTER_ID_VAR, &account.account_id)
            .env(DISPLAY_NAME_VAR, &account.display_name)
            .stdin(Stdio::null());
        command
    }
}

#[async_trait]
impl GameLauncher for ProcessLauncher {
    async fn launch(&self, session: &GameSession, account: &Account) -> Result<(), LauncherError> {
        let child = self.command(session, account).spawn().map_err(|err| {
            LauncherError::Launch(format!("{}: {err}", self.game_path.display()))
        })?;
        tracing::info!(
            game = %self.game_path.display(),
            pid = ?child.id(),
            account = %account.display_name,
            "game started"
        );
        Ok(())
    }
}
