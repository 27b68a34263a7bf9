//! Remote calls against the identity provider and the game-session service.
//!
//! Every operation is a single request/response; nothing here retries.

pub mod http;
pub mod types;

pub use types::{Account, GameSession, UserDetails};

use chrono::{DateTime, Duration, Utc};
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::{StatusCode, Url};
use serde_json::Value;

use crate::auth::id_token;
use crate::auth::{AuthError, AuthorizationRequest, Token};
use crate::config::{Endpoints, LauncherConfig};
use http::{bearer_headers, json_headers, shared_client, truncate_body};
use types::{CreateSessionRequest, TokenResponse};

/// Client for the provider's OAuth, profile and game-session endpoints.
///
/// # Example
/// ```no_run
/// use jxlaunch::auth::AuthorizationRequest;
/// use jxlaunch::config::LauncherConfig;
/// use jxlaunch::provider::ProviderClient;
///
/// let client = ProviderClient::new(&LauncherConfig::default());
/// let url = client.authorize_url(&AuthorizationRequest::generate())?;
/// println!("{url}");
/// # Ok::<(), jxlaunch::auth::AuthError>(())
/// ```
#[derive(Debug, Clone)]
pub struct ProviderClient {
    client: reqwest::Client,
    endpoints: Endpoints,
    client_id: String,
    standard_login_client_id: String,
    scopes: Vec<String>,
    standard_login_scopes: Vec<String>,
    shield_basic_auth: String,
}

impl ProviderClient {
    pub fn new(config: &LauncherConfig) -> Self {
        Self {
            client: shared_client().clone(),
            endpoints: config.endpoints.clone(),
            client_id: config.client_id.clone(),
            standard_login_client_id: config.standard_login_client_id.clone(),
            scopes: config.scopes.clone(),
            standard_login_scopes: config.standard_login_scopes.clone(),
            shield_basic_auth: config.shield_basic_auth.clone(),
        }
    }

    /// Browser URL for the launcher login (code flow with PKCE).
    pub fn authorize_url(&self, request: &AuthorizationRequest) -> Result<String, AuthError> {
        let scope = self.scopes.join(" ");
        build_url(
            &self.endpoints.authorize_url,
            &[
                ("client_id", self.client_id.as_str()),
                ("redirect_uri", self.endpoints.redirect_url.as_str()),
                ("response_type", "code"),
                ("scope", scope.as_str()),
                ("state", request.state.as_str()),
                ("code_challenge", request.code_challenge.as_str()),
                ("code_challenge_method", "S256"),
            ],
        )
    }

    /// Browser URL for the standard login that answers with a URL fragment.
    pub fn standard_login_url(
        &self,
        state: &str,
        id_token_hint: &str,
        redirect_uri: &str,
    ) -> Result<String, AuthError> {
        let scope = self.standard_login_scopes.join(" ");
        let nonce = uuid::Uuid::new_v4().to_string();
        build_url(
            &self.endpoints.authorize_url,
            &[
                ("client_id", self.standard_login_client_id.as_str()),
                ("redirect_uri", redirect_uri),
                ("response_type", "id_token code"),
                ("scope", scope.as_str()),
                ("state", state),
                ("id_token_hint", id_token_hint),
                ("nonce", nonce.as_str()),
                ("prompt", "consent"),
            ],
        )
    }

    /// Trade an authorization code and its PKCE verifier for a token set.
    pub async fn exchange_code(&self, code: &str, verifier: &str) -> Result<Token, AuthError> {
        let resp = self
            .client
            .post(&self.endpoints.token_url)
            .headers(json_headers())
            .form(&[
                ("grant_type", "authorization_code"),
                ("code", code),
                ("redirect_uri", self.endpoints.redirect_url.as_str()),
                ("client_id", self.client_id.as_str()),
                ("code_verifier", verifier),
            ])
            .send()
            .await
            .map_err(|err| AuthError::ExchangeFailed(err.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(AuthError::ExchangeFailed(format!(
                "token endpoint returned {status}: {}",
                truncate_body(&body)
            )));
        }

        let payload: TokenResponse = resp
            .json()
            .await
            .map_err(|err| AuthError::ExchangeFailed(format!("invalid token response: {err}")))?;
        let expiry = payload.expires_in.map(expiry_after).transpose()?;
        tracing::debug!(expires_in = ?payload.expires_in, "authorization code exchanged");

        Ok(Token {
            access_token: payload.access_token,
            refresh_token: payload.refresh_token,
            token_type: payload.token_type,
            expiry,
            id_token: payload.id_token,
            scope: payload.scope,
        })
    }

    pub async fn fetch_user_details(
        &self,
        subject: &str,
        access_token: &str,
    ) -> Result<UserDetails, AuthError> {
        let url = format!(
            "{}/users/{subject}/displayName",
            self.endpoints.api_url.trim_end_matches('/')
        );
        let resp = self
            .client
            .get(&url)
            .headers(bearer_headers(access_token)?)
            .send()
            .await?;

        let status = resp.status();
        let body = resp.text().await?;
        if status != StatusCode::OK {
            return Err(AuthError::ProfileFetchFailed(format!(
                "{status}: {}",
                truncate_body(&body)
            )));
        }
        serde_json::from_str(&body)
            .map_err(|err| AuthError::ProfileFetchFailed(format!("invalid response: {err}")))
    }

    /// Mint a game session from an identity token.
    ///
    /// The token is decoded locally first; a malformed token never leaves the process.
    pub async fn create_game_session(&self, id_token: &str) -> Result<GameSession, AuthError> {
        id_token::decode(id_token)?;

        let url = format!(
            "{}/sessions",
            self.endpoints.game_session_url.trim_end_matches('/')
        );
        let resp = self
            .client
            .post(&url)
            .headers(json_headers())
            .json(&CreateSessionRequest { id_token })
            .send()
            .await?;

        let status = resp.status();
        let body = resp.text().await?;
        let data: Value = serde_json::from_str(&body).map_err(|err| {
            AuthError::SessionCreateFailed(format!("{status}: invalid response: {err}"))
        })?;
        match data.get("sessionId").and_then(Value::as_str) {
            Some(session_id) => Ok(GameSession {
                session_id: session_id.to_string(),
            }),
            None => Err(AuthError::SessionCreateFailed(format!(
                "{status}: response has no sessionId: {}",
                truncate_body(&body)
            ))),
        }
    }

    /// Characters under `session`; an empty list is a valid answer.
    pub async fn list_accounts(&self, session: &GameSession) -> Result<Vec<Account>, AuthError> {
        let url = format!(
            "{}/accounts",
            self.endpoints.game_session_url.trim_end_matches('/')
        );
        let resp = self
            .client
            .get(&url)
            .headers(bearer_headers(&session.session_id)?)
            .send()
            .await
            .map_err(|err| AuthError::AccountListFailed(err.to_string()))?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|err| AuthError::AccountListFailed(err.to_string()))?;
        if !status.is_success() {
            return Err(AuthError::AccountListFailed(format!(
                "{status}: {}",
                truncate_body(&body)
            )));
        }
        serde_json::from_str(&body)
            .map_err(|err| AuthError::AccountListFailed(format!("invalid response: {err}")))
    }

    /// Exchange an access token at the shield endpoint. The result is only logged.
    ///
    /// The token travels in the query string, so transport errors are
    /// stripped of their URL.
    pub async fn exchange_shield_token(&self, access_token: &str) -> Result<Value, AuthError> {
        let resp = self
            .client
            .post(&self.endpoints.shield_url)
            .header(AUTHORIZATION, self.shield_basic_auth.as_str())
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .query(&[
                ("token", access_token),
                ("grant_type", "token_exchange"),
                ("scope", "gamesso.token.create"),
            ])
            .send()
            .await
            .map_err(|err| AuthError::from(err.without_url()))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(AuthError::ExchangeFailed(format!(
                "shield token exchange returned {status}"
            )));
        }
        resp.json()
            .await
            .map_err(|err| AuthError::from(err.without_url()))
    }
}

fn expiry_after(secs: i64) -> Result<DateTime<Utc>, AuthError> {
    Duration::try_seconds(secs)
        .and_then(|lifetime| Utc::now().checked_add_signed(lifetime))
        .ok_or_else(|| AuthError::ExchangeFailed(format!("expires_in out of range: {secs}")))
}

fn build_url(base: &str, params: &[(&str, &str)]) -> Result<String, AuthError> {
    Url::parse_with_params(base, params)
        .map(String::from)
        .map_err(|err| AuthError::InvalidUrl(format!("{base}: {err}")))
}
