//! The launch state machine: cached credentials or a fresh login, then a game
//! session, an account choice and finally the game process.

use std::sync::{Arc, Mutex};

use tracing::{debug, info, warn};

use crate::auth::pkce::random_state;
use crate::auth::store::{self, FileCredentialStore};
use crate::auth::{
    id_token, AuthError, AuthorizationRequest, CallbackServer, CredentialStore, StoreError, Token,
};
use crate::browser::{Browser, SystemBrowser};
use crate::config::LauncherConfig;
use crate::error::LauncherError;
use crate::intent::{Intent, IntentPayload};
use crate::launcher::{GameLauncher, ProcessLauncher};
use crate::picker::{AccountPicker, TerminalPicker};
use crate::provider::{Account, ProviderClient};

/// Every state the orchestrator passes through.
#[derive(Debug, Clone, PartialEq, Eq, strum::Display)]
pub enum SessionState {
    Start,
    LoadCache,
    CacheValid,
    CacheInvalid,
    Authenticate,
    Exchanged,
    IdentityResolved,
    SessionCreated,
    AccountsListed,
    AccountChosen,
    Launched,
    NoAccountChosen,
    Failed(String),
}

/// How a successful run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LaunchOutcome {
    /// The browser was sent to the login page; a later invocation carrying
    /// the redirect payload continues the flow.
    LoginStarted { authorize_url: String },
    NoAccountChosen,
    Launched { account: Account },
}

/// Sequences cache lookup, login, session creation, account choice and launch.
///
/// # Example
/// ```no_run
/// use jxlaunch::config::LauncherConfig;
/// use jxlaunch::session::SessionOrchestrator;
///
/// # async fn example() -> jxlaunch::error::Result<()> {
/// let orchestrator = SessionOrchestrator::from_config(LauncherConfig::load()?);
/// let outcome = orchestrator.run(None).await?;
/// println!("{outcome:?}");
/// # Ok(())
/// # }
/// ```
pub struct SessionOrchestrator {
    config: LauncherConfig,
    client: ProviderClient,
    store: Arc<dyn CredentialStore>,
    browser: Arc<dyn Browser>,
    picker: Arc<dyn AccountPicker>,
    launcher: Arc<dyn GameLauncher>,
    transitions: Mutex<Vec<SessionState>>,
}

impl SessionOrchestrator {
    pub fn new(
        config: LauncherConfig,
        store: Arc<dyn CredentialStore>,
        browser: Arc<dyn Browser>,
        picker: Arc<dyn AccountPicker>,
        launcher: Arc<dyn GameLauncher>,
    ) -> Self {
        let client = ProviderClient::new(&config);
        Self {
            config,
            client,
            store,
            browser,
            picker,
            launcher,
            transitions: Mutex::new(Vec::new()),
        }
    }

    /// File-backed store, system browser, terminal picker and process launcher.
    pub fn from_config(config: LauncherConfig) -> Self {
        let store = Arc::new(FileCredentialStore::new(config.config_dir.clone()));
        let launcher = Arc::new(ProcessLauncher::new(config.game_path.clone()));
        Self::new(
            config,
            store,
            Arc::new(SystemBrowser),
            Arc::new(TerminalPicker),
            launcher,
        )
    }

    /// States visited so far, in order.
    pub fn transitions(&self) -> Vec<SessionState> {
        self.transitions
            .lock()
            .map(|states| states.clone())
            .unwrap_or_default()
    }

    /// Run once: resume from `payload` when given, otherwise start from the cache.
    pub async fn run(
        &self,
        payload: Option<IntentPayload>,
    ) -> Result<LaunchOutcome, LauncherError> {
        self.transition(SessionState::Start);
        let result = match payload {
            Some(payload) => self.handle_intent(&payload).await,
            None => self.regular_launch().await,
        };
        if let Err(err) = &result {
            self.transition(SessionState::Failed(err.to_string()));
        }
        result
    }

    async fn handle_intent(&self, payload: &IntentPayload) -> Result<LaunchOutcome, LauncherError> {
        debug!(intent = payload.intent_name(), "handling intent payload");
        match payload.intent()? {
            Intent::SocialAuth { code, state } => self.social_auth(&code, state.as_deref()).await,
        }
    }

    async fn regular_launch(&self) -> Result<LaunchOutcome, LauncherError> {
        self.transition(SessionState::LoadCache);
        let Some((token, id_token)) = self.load_cache() else {
            self.transition(SessionState::CacheInvalid);
            info!("Could not load cached tokens, starting a new login");
            return self.begin_interactive_login().await;
        };

        self.transition(SessionState::CacheValid);
        info!("Loaded cached tokens");
        match self.launch_with_identity(&token, id_token).await {
            Ok(outcome) => Ok(outcome),
            Err(err) => {
                warn!(error = %err, "could not launch with cached tokens, starting a new login");
                self.begin_interactive_login().await
            }
        }
    }

    /// Cached token set and identity token, if both exist and the token
    /// outlives the configured margin. Any store failure is a miss.
    fn load_cache(&self) -> Option<(Token, String)> {
        let raw = self
            .store
            .get(store::TOKEN)
            .map_err(|err| debug!(error = %err, "no cached token"))
            .ok()?;
        let token: Token = serde_json::from_str(&raw)
            .map_err(|err| warn!(error = %err, "cached token is unreadable"))
            .ok()?;
        if !token.is_usable(self.config.expiry_margin) {
            debug!(expiry = ?token.expiry, "cached token is expired or about to expire");
            return None;
        }
        let id_token = self
            .store
            .get(store::ID_TOKEN)
            .map_err(|err| debug!(error = %err, "no cached identity token"))
            .ok()?;
        Some((token, id_token))
    }

    /// Persist a fresh authorization request and send the browser to it.
    async fn begin_interactive_login(&self) -> Result<LaunchOutcome, LauncherError> {
        self.transition(SessionState::Authenticate);
        let request = AuthorizationRequest::generate();
        request.persist(self.store.as_ref())?;
        let authorize_url = self.client.authorize_url(&request)?;
        self.browser.open(&authorize_url).await?;
        info!("Continue the login in your browser");
        Ok(LaunchOutcome::LoginStarted { authorize_url })
    }

    async fn social_auth(
        &self,
        code: &str,
        received_state: Option<&str>,
    ) -> Result<LaunchOutcome, LauncherError> {
        self.transition(SessionState::Authenticate);

        if let Some(received) = received_state {
            match self.store.get(store::STATE) {
                Ok(expected) if expected == received => {}
                _ => return Err(AuthError::StateMismatch.into()),
            }
        }
        let verifier = match self.store.get(store::VERIFIER) {
            Ok(verifier) => verifier,
            Err(StoreError::NotFound { .. }) => return Err(AuthError::MissingVerifier.into()),
            Err(err) => return Err(err.into()),
        };

        let token = self.client.exchange_code(code, &verifier).await?;
        self.transition(SessionState::Exchanged);

        let id_token = token.id_token.clone().ok_or_else(|| {
            AuthError::ExchangeFailed("token response has no id_token".to_string())
        })?;
        self.store.put(store::ID_TOKEN, &id_token)?;
        let serialized = serde_json::to_string(&token).map_err(AuthError::from)?;
        self.store.put(store::TOKEN, &serialized)?;

        for blob in [store::STATE, store::VERIFIER] {
            if let Err(err) = self.store.remove(blob) {
                warn!(blob, error = %err, "could not clear pending login material");
            }
        }

        self.launch_with_identity(&token, id_token).await
    }

    async fn launch_with_identity(
        &self,
        token: &Token,
        id_token: String,
    ) -> Result<LaunchOutcome, LauncherError> {
        self.transition(SessionState::IdentityResolved);
        let claims = id_token::decode(&id_token)?;
        let subject = claims.subject().ok_or(AuthError::MissingSubject)?;

        if self.config.shield_diagnostics {
            self.spawn_shield_exchange(&token.access_token);
        }

        let user = self
            .client
            .fetch_user_details(subject, &token.access_token)
            .await?;
        info!("You are logged in as: {user}");

        let id_token = if claims.login_provider() == Some(self.config.login_provider.as_str()) {
            id_token
        } else {
            info!(
                login_provider = ?claims.login_provider(),
                "No known login_provider in identity token, using standard login"
            );
            self.standard_login(&id_token).await?
        };

        let session = self.client.create_game_session(&id_token).await?;
        self.transition(SessionState::SessionCreated);

        let accounts = self.client.list_accounts(&session).await?;
        self.transition(SessionState::AccountsListed);
        info!(count = accounts.len(), "Found accounts");

        let Some(account) = self.picker.choose(&user, &accounts).await? else {
            self.transition(SessionState::NoAccountChosen);
            info!("No account was chosen");
            return Ok(LaunchOutcome::NoAccountChosen);
        };
        self.transition(SessionState::AccountChosen);

        self.launcher.launch(&session, &account).await?;
        self.transition(SessionState::Launched);
        Ok(LaunchOutcome::Launched { account })
    }

    /// Capture a new code and identity token through the local listener.
    async fn standard_login(&self, id_token_hint: &str) -> Result<String, LauncherError> {
        let server = CallbackServer::bind(self.config.callback_port).await?;
        let redirect_uri = self
            .config
            .callback_redirect_uri
            .clone()
            .unwrap_or_else(|| server.redirect_uri());
        let url = self
            .client
            .standard_login_url(&random_state(), id_token_hint, &redirect_uri)?;
        self.browser.open(&url).await?;

        let callback = server.wait(self.config.callback_timeout).await?;
        debug!("standard login callback received");
        self.store.put(store::ID_TOKEN, &callback.id_token)?;
        Ok(callback.id_token)
    }

    fn spawn_shield_exchange(&self, access_token: &str) {
        let client = self.client.clone();
        let access_token = access_token.to_string();
        tokio::spawn(async move { shield_exchange(&client, &access_token).await });
    }

    fn transition(&self, state: SessionState) {
        debug!(state = %state, "session state");
        if let Ok(mut states) = self.transitions.lock() {
            states.push(state);
        }
    }
}

/// Diagnostic only: the response carries tokens, so only its field names are logged.
async fn shield_exchange(client: &ProviderClient, access_token: &str) {
    match client.exchange_shield_token(access_token).await {
        Ok(response) => {
            let fields: Vec<&str> = response
                .as_object()
                .map(|map| map.keys().map(String::as_str).collect())
                .unwrap_or_default();
            debug!(?fields, "shield token exchange succeeded");
        }
        Err(err) => warn!(error = %err, "shield token exchange failed"),
    }
}
