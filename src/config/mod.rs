//! Configuration system (layered: code > env > config file > defaults).

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::auth::store::default_config_dir;
use crate::error::LauncherError;

pub const DEFAULT_AUTHORIZE_URL: &str = "https://account.jagex.com/oauth2/auth";
pub const DEFAULT_TOKEN_URL: &str = "https://account.jagex.com/oauth2/token";
pub const DEFAULT_REDIRECT_URL: &str = "https://secure.runescape.com/m=weblogin/launcher-redirect";
pub const DEFAULT_API_URL: &str = "https://api.jagex.com/v1";
pub const DEFAULT_GAME_SESSION_URL: &str = "https://auth.jagex.com/game-session/v1";
pub const DEFAULT_SHIELD_URL: &str = "https://auth.jagex.com/shield/oauth/token";

pub const DEFAULT_CLIENT_ID: &str = "com_jagex_auth_desktop_launcher";
pub const DEFAULT_STANDARD_LOGIN_CLIENT_ID: &str = "1fddee4e-b100-4f4e-b2b0-097f9088f9d2";
pub const DEFAULT_LOGIN_PROVIDER: &str = "runescape";
/// Redirect registered for the standard-login client. Port 80 is expected to
/// forward to the callback listener.
pub const DEFAULT_CALLBACK_REDIRECT_URI: &str = "http://localhost";
const DEFAULT_SHIELD_BASIC_AUTH: &str = "Basic Y29tX2phZ2V4X2F1dGhfZGVza3RvcF9vc3JzOnB1YmxpYw==";

const DEFAULT_CALLBACK_PORT: u16 = 8080;
const DEFAULT_CALLBACK_TIMEOUT_SECS: u64 = 10 * 60;
const DEFAULT_EXPIRY_MARGIN_MINUTES: i64 = 30;
const DEFAULT_GAME_PATH: &str = "RuneLite.AppImage";

const CONFIG_FILE_NAME: &str = "config.toml";

/// Remote endpoints the launcher talks to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    /// Browser-navigated authorization endpoint.
    pub authorize_url: String,
    pub token_url: String,
    /// Redirect registered for the launcher client.
    pub redirect_url: String,
    pub api_url: String,
    pub game_session_url: String,
    pub shield_url: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            authorize_url: DEFAULT_AUTHORIZE_URL.to_string(),
            token_url: DEFAULT_TOKEN_URL.to_string(),
            redirect_url: DEFAULT_REDIRECT_URL.to_string(),
            api_url: DEFAULT_API_URL.to_string(),
            game_session_url: DEFAULT_GAME_SESSION_URL.to_string(),
            shield_url: DEFAULT_SHIELD_URL.to_string(),
        }
    }
}

impl Endpoints {
    /// Every endpoint rooted at `base` (used against local mock servers).
    pub fn rooted_at(base: &str) -> Self {
        let base = base.trim_end_matches('/');
        Self {
            authorize_url: format!("{base}/oauth2/auth"),
            token_url: format!("{base}/oauth2/token"),
            redirect_url: format!("{base}/m=weblogin/launcher-redirect"),
            api_url: format!("{base}/v1"),
            game_session_url: format!("{base}/game-session/v1"),
            shield_url: format!("{base}/shield/oauth/token"),
        }
    }
}

/// Launcher configuration.
///
/// # Example
/// ```no_run
/// use std::time::Duration;
/// use jxlaunch::config::LauncherConfig;
///
/// let config = LauncherConfig::load()?
///     .with_callback_timeout(Some(Duration::from_secs(120)));
/// # Ok::<(), jxlaunch::error::LauncherError>(())
/// ```
#[derive(Debug, Clone)]
pub struct LauncherConfig {
    pub endpoints: Endpoints,
    pub client_id: String,
    pub standard_login_client_id: String,
    /// `login_provider` claim that can mint a game session directly.
    pub login_provider: String,
    pub scopes: Vec<String>,
    pub standard_login_scopes: Vec<String>,
    pub shield_basic_auth: String,
    pub config_dir: PathBuf,
    pub callback_port: u16,
    /// Redirect sent with the standard login. `None` advertises the bound
    /// listener port instead.
    pub callback_redirect_uri: Option<String>,
    /// `None` waits for the login callback indefinitely.
    pub callback_timeout: Option<Duration>,
    pub expiry_margin: chrono::Duration,
    pub game_path: PathBuf,
    pub shield_diagnostics: bool,
}

impl Default for LauncherConfig {
    fn default() -> Self {
        Self {
            endpoints: Endpoints::default(),
            client_id: DEFAULT_CLIENT_ID.to_string(),
            standard_login_client_id: DEFAULT_STANDARD_LOGIN_CLIENT_ID.to_string(),
            login_provider: DEFAULT_LOGIN_PROVIDER.to_string(),
            scopes: ["openid", "offline", "gamesso.token.create", "user.profile.read"]
                .map(String::from)
                .to_vec(),
            standard_login_scopes: ["openid", "offline"].map(String::from).to_vec(),
            shield_basic_auth: DEFAULT_SHIELD_BASIC_AUTH.to_string(),
            config_dir: default_config_dir(),
            callback_port: DEFAULT_CALLBACK_PORT,
            callback_redirect_uri: Some(DEFAULT_CALLBACK_REDIRECT_URI.to_string()),
            callback_timeout: Some(Duration::from_secs(DEFAULT_CALLBACK_TIMEOUT_SECS)),
            expiry_margin: chrono::Duration::minutes(DEFAULT_EXPIRY_MARGIN_MINUTES),
            game_path: PathBuf::from(DEFAULT_GAME_PATH),
            shield_diagnostics: false,
        }
    }
}

impl LauncherConfig {
    /// Defaults, then `config.toml` from the config dir, then environment.
    pub fn load() -> Result<Self, LauncherError> {
        let _ = dotenvy::dotenv(); // load .env if present, ignore error
        let mut config = Self::default();
        if let Some(dir) = non_empty_env("JXLAUNCH_CONFIG_DIR") {
            config.config_dir = PathBuf::from(dir);
        }
        let file = config.config_dir.join(CONFIG_FILE_NAME);
        config.apply_file(&file)?;
        config.apply_env(non_empty_env)?;
        Ok(config)
    }

    /// Apply `path` if it exists; a missing file is not an error.
    pub fn apply_file(&mut self, path: &Path) -> Result<(), LauncherError> {
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(()),
            Err(err) => {
                return Err(LauncherError::Configuration(format!(
                    "could not read {}: {err}",
                    path.display()
                )))
            }
        };
        let file: ConfigFile = toml::from_str(&raw).map_err(|err| {
            LauncherError::Configuration(format!("invalid {}: {err}", path.display()))
        })?;

        if let Some(path) = file.game_path {
            self.game_path = path;
        }
        if let Some(port) = file.callback_port {
            self.callback_port = port;
        }
        if let Some(uri) = file.callback_redirect_uri {
            self.callback_redirect_uri = Some(uri);
        }
        if let Some(secs) = file.callback_timeout_secs {
            self.callback_timeout = timeout_from_secs(secs);
        }
        if let Some(minutes) = file.expiry_margin_minutes {
            self.expiry_margin = chrono::Duration::try_minutes(minutes).ok_or_else(|| {
                LauncherError::Configuration(format!(
                    "invalid {}: expiry_margin_minutes out of range: {minutes}",
                    path.display()
                ))
            })?;
        }
        if let Some(enabled) = file.shield_diagnostics {
            self.shield_diagnostics = enabled;
        }
        Ok(())
    }

    /// Apply `JXLAUNCH_*` overrides read through `lookup`.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), LauncherError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = lookup("JXLAUNCH_GAME_PATH") {
            self.game_path = PathBuf::from(path);
        }
        if let Some(port) = lookup("JXLAUNCH_CALLBACK_PORT") {
            self.callback_port = parse_env("JXLAUNCH_CALLBACK_PORT", &port)?;
        }
        if let Some(uri) = lookup("JXLAUNCH_CALLBACK_REDIRECT_URI") {
            self.callback_redirect_uri = Some(uri);
        }
        if let Some(secs) = lookup("JXLAUNCH_CALLBACK_TIMEOUT_SECS") {
            self.callback_timeout =
                timeout_from_secs(parse_env("JXLAUNCH_CALLBACK_TIMEOUT_SECS", &secs)?);
        }
        if let Some(flag) = lookup("JXLAUNCH_SHIELD_DIAGNOSTICS") {
            self.shield_diagnostics = matches!(flag.as_str(), "1" | "true" | "TRUE" | "yes");
        }
        Ok(())
    }

    pub fn with_endpoints(mut self, endpoints: Endpoints) -> Self {
        self.endpoints = endpoints;
        self
    }

    pub fn with_config_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config_dir = dir.into();
        self
    }

    pub fn with_callback_port(mut self, port: u16) -> Self {
        self.callback_port = port;
        self
    }

    pub fn with_callback_redirect_uri(mut self, uri: Option<String>) -> Self {
        self.callback_redirect_uri = uri;
        self
    }

    pub fn with_callback_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.callback_timeout = timeout;
        self
    }

    pub fn with_expiry_margin(mut self, margin: chrono::Duration) -> Self {
        self.expiry_margin = margin;
        self
    }

    pub fn with_game_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.game_path = path.into();
        self
    }

    pub fn with_shield_diagnostics(mut self, enabled: bool) -> Self {
        self.shield_diagnostics = enabled;
        self
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct ConfigFile {
    game_path: Option<PathBuf>,
    callback_port: Option<u16>,
    callback_redirect_uri: Option<String>,
    callback_timeout_secs: Option<u64>,
    expiry_margin_minutes: Option<i64>,
    shield_diagnostics: Option<bool>,
}

fn timeout_from_secs(secs: u64) -> Option<Duration> {
    (secs > 0).then(|| Duration::from_secs(secs))
}

fn parse_env<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, LauncherError> {
    value
        .trim()
        .parse()
        .map_err(|_| LauncherError::Configuration(format!("{key} has an invalid value: {value:?}")))
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|value| !value.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_match_provider_constants() {
        let config = LauncherConfig::default();
        assert_eq!(config.login_provider, "runescape");
        assert_eq!(config.callback_port, 8080);
        assert_eq!(config.expiry_margin, chrono::Duration::minutes(30));
        assert_eq!(config.scopes.len(), 4);
        assert_eq!(config.standard_login_scopes, vec!["openid", "offline"]);
        assert!(config.callback_timeout.is_some());
        assert_eq!(
            config.callback_redirect_uri.as_deref(),
            Some("http://localhost")
        );
    }

    #[test]
    fn builders_override_fields() {
        let config = LauncherConfig::default()
            .with_game_path("/opt/game/client")
            .with_expiry_margin(chrono::Duration::minutes(5))
            .with_callback_redirect_uri(None);
        assert_eq!(config.game_path, PathBuf::from("/opt/game/client"));
        assert_eq!(config.expiry_margin, chrono::Duration::minutes(5));
        assert_eq!(config.callback_redirect_uri, None);
    }

    #[test]
    fn out_of_range_margin_is_a_configuration_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, format!("expiry_margin_minutes = {}\n", i64::MAX)).unwrap();
        let err = LauncherConfig::default().apply_file(&path).unwrap_err();
        assert!(matches!(err, LauncherError::Configuration(_)));
        assert!(err.to_string().contains("expiry_margin_minutes"));
    }

    #[test]
    fn config_file_overrides_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "game_path = \"/opt/game\"\ncallback_port = 9000\ncallback_timeout_secs = 0\nexpiry_margin_minutes = 5\n",
        )
        .unwrap();

        let mut config = LauncherConfig::default();
        config.apply_file(&path).unwrap();

        assert_eq!(config.game_path, PathBuf::from("/opt/game"));
        assert_eq!(config.callback_port, 9000);
        assert_eq!(config.callback_timeout, None);
        assert_eq!(config.expiry_margin, chrono::Duration::minutes(5));
    }

    #[test]
    fn missing_config_file_is_ignored() {
        let dir = TempDir::new().unwrap();
        let mut config = LauncherConfig::default();
        config.apply_file(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.callback_port, 8080);
    }

    #[test]
    fn unknown_config_key_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "colour = \"blue\"\n").unwrap();
        let err = LauncherConfig::default().apply_file(&path).unwrap_err();
        assert!(matches!(err, LauncherError::Configuration(_)));
    }

    #[test]
    fn env_overrides_file_values() {
        let mut config = LauncherConfig::default();
        config
            .apply_env(env(&[
                ("JXLAUNCH_GAME_PATH", "/usr/bin/runelite"),
                ("JXLAUNCH_CALLBACK_PORT", "8181"),
                ("JXLAUNCH_CALLBACK_TIMEOUT_SECS", "30"),
                ("JXLAUNCH_SHIELD_DIAGNOSTICS", "true"),
            ]))
            .unwrap();

        assert_eq!(config.game_path, PathBuf::from("/usr/bin/runelite"));
        assert_eq!(config.callback_port, 8181);
        assert_eq!(config.callback_timeout, Some(Duration::from_secs(30)));
        assert!(config.shield_diagnostics);
    }

    #[test]
    fn invalid_env_port_is_a_configuration_error() {
        let mut config = LauncherConfig::default();
        let err = config
            .apply_env(env(&[("JXLAUNCH_CALLBACK_PORT", "eighty")]))
            .unwrap_err();
        assert!(err.to_string().contains("JXLAUNCH_CALLBACK_PORT"));
    }

    #[test]
    fn rooted_endpoints_share_base() {
        let endpoints = Endpoints::rooted_at("http://127.0.0.1:9999/");
        assert_eq!(endpoints.token_url, "http://127.0.0.1:9999/oauth2/token");
        assert_eq!(
            endpoints.game_session_url,
            "http://127.0.0.1:9999/game-session/v1"
        );
    }
}
