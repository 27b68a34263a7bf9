//! Opening URLs in the user's browser.

use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;

use crate::error::LauncherError;

/// Something that can show the user a login page.
#[async_trait]
pub trait Browser: Send + Sync {
    async fn open(&self, url: &str) -> Result<(), LauncherError>;
}

/// Hands the URL to the platform's default opener.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemBrowser;

#[async_trait]
impl Browser for SystemBrowser {
    async fn open(&self, url: &str) -> Result<(), LauncherError> {
        let mut command = opener_command(url);
        command
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());
        let status = command
            .status()
            .await
            .map_err(|err| LauncherError::Browser(err.to_string()))?;
        if !status.success() {
            return Err(LauncherError::Browser(format!("opener exited with {status}")));
        }
        tracing::debug!("opened login page in browser");
        Ok(())
    }
}

fn opener_command(url: &str) -> Command {
    if cfg!(target_os = "windows") {
        // `cmd /C start` would split the URL at every `&`.
        let mut command = Command::new("rundll32.exe");
        command.arg("url.dll,FileProtocolHandler").arg(url);
        command
    } else if cfg!(target_os = "macos") {
        let mut command = Command::new("open");
        command.arg(url);
        command
    } else {
        let mut command = Command::new("xdg-open");
        command.arg(url);
        command
    }
}
