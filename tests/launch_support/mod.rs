#![allow(dead_code)]

use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::Utc;
use jxlaunch::auth::store;
use jxlaunch::auth::{CredentialStore, Token};
use jxlaunch::browser::Browser;
use jxlaunch::config::{Endpoints, LauncherConfig};
use jxlaunch::error::LauncherError;
use jxlaunch::launcher::GameLauncher;
use jxlaunch::picker::AccountPicker;
use jxlaunch::provider::{Account, GameSession, UserDetails};
use reqwest::Url;
use serde_json::{json, Value};
use wiremock::matchers::{body_json, body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Unsigned token with a `JWT` header and the given claims.
pub fn jwt(claims: Value) -> String {
    let header = URL_SAFE_NO_PAD.encode(json!({"alg": "RS256", "typ": "JWT"}).to_string());
    let payload = URL_SAFE_NO_PAD.encode(claims.to_string());
    format!("{header}.{payload}.c2lnbmF0dXJl")
}

pub fn runescape_id_token(subject: &str) -> String {
    jwt(json!({"sub": subject, "login_provider": "runescape", "iss": "https://account.jagex.com"}))
}

pub fn config_for(server: &MockServer, dir: &Path) -> LauncherConfig {
    LauncherConfig::default()
        .with_endpoints(Endpoints::rooted_at(&server.uri()))
        .with_config_dir(dir)
        .with_callback_port(0)
        .with_callback_redirect_uri(None)
        .with_callback_timeout(Some(Duration::from_secs(5)))
}

pub fn cached_token(expires_in: chrono::Duration) -> String {
    serde_json::to_string(&Token {
        access_token: "cached-access".to_string(),
        refresh_token: Some("cached-refresh".to_string()),
        token_type: Some("Bearer".to_string()),
        expiry: Some(Utc::now() + expires_in),
        id_token: None,
        scope: None,
    })
    .expect("serialize token")
}

pub fn seed_pending_login(store: &dyn CredentialStore, state: &str, verifier: &str) {
    store.put(store::STATE, state).expect("seed state");
    store.put(store::VERIFIER, verifier).expect("seed verifier");
}

pub fn account(id: &str, name: &str) -> Account {
    Account {
        account_id: id.to_string(),
        display_name: name.to_string(),
        user_hash: format!("hash-{id}"),
    }
}

pub async fn mount_token_exchange(server: &MockServer, code: &str, verifier: &str, id_token: &str) {
    Mock::given(method("POST"))
        .and(path("/oauth2/token"))
        .and(body_string_contains("grant_type=authorization_code"))
        .and(body_string_contains(format!("code={code}")))
        .and(body_string_contains(format!("code_verifier={verifier}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "fresh-access",
            "refresh_token": "fresh-refresh",
            "token_type": "Bearer",
            "expires_in": 3600,
            "id_token": id_token,
            "scope": "openid offline gamesso.token.create user.profile.read"
        })))
        .expect(1)
        .mount(server)
        .await;
}

pub async fn mount_user_details(server: &MockServer, subject: &str, access_token: &str) {
    Mock::given(method("GET"))
        .and(path(format!("/v1/users/{subject}/displayName")))
        .and(header("authorization", format!("Bearer {access_token}").as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "displayName": "Zezima",
            "id": "100",
            "suffix": "0001",
            "userId": subject
        })))
        .mount(server)
        .await;
}

pub async fn mount_game_session(server: &MockServer, id_token: &str, session_id: &str) {
    Mock::given(method("POST"))
        .and(path("/game-session/v1/sessions"))
        .and(body_json(json!({"idToken": id_token})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"sessionId": session_id})))
        .expect(1)
        .mount(server)
        .await;
}

pub async fn mount_accounts(server: &MockServer, session_id: &str, accounts: &[Account]) {
    Mock::given(method("GET"))
        .and(path("/game-session/v1/accounts"))
        .and(header("authorization", format!("Bearer {session_id}").as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(accounts)))
        .expect(1)
        .mount(server)
        .await;
}

/// What the fake browser does when handed a standard-login URL.
#[derive(Clone)]
pub enum FragmentReply {
    Authorized { code: String, id_token: String },
    Denied(String),
}

/// Records every URL and optionally plays the provider's fragment redirect
/// against the local callback listener.
#[derive(Default)]
pub struct FakeBrowser {
    opened: Mutex<Vec<String>>,
    reply: Option<FragmentReply>,
}

impl FakeBrowser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn replying(reply: FragmentReply) -> Self {
        Self {
            opened: Mutex::new(Vec::new()),
            reply: Some(reply),
        }
    }

    pub fn opened(&self) -> Vec<String> {
        self.opened.lock().expect("browser lock").clone()
    }
}

#[async_trait]
impl Browser for FakeBrowser {
    async fn open(&self, url: &str) -> Result<(), LauncherError> {
        self.opened.lock().expect("browser lock").push(url.to_string());

        let Some(reply) = &self.reply else {
            return Ok(());
        };
        let parsed = Url::parse(url).expect("valid url");
        let Some((_, redirect)) = parsed.query_pairs().find(|(key, _)| key == "redirect_uri") else {
            return Ok(());
        };
        if !redirect.starts_with("http://localhost") {
            return Ok(());
        }

        let base = redirect.replacen("localhost", "127.0.0.1", 1);
        let mut target = Url::parse(&format!("{base}/process_fragment")).expect("callback url");
        match reply {
            FragmentReply::Authorized { code, id_token } => {
                target
                    .query_pairs_mut()
                    .append_pair("code", code)
                    .append_pair("id_token", id_token);
            }
            FragmentReply::Denied(error) => {
                target.query_pairs_mut().append_pair("error", error);
            }
        }
        let status = reqwest::get(target).await.expect("callback request").status();
        assert!(status.is_success(), "callback answered {status}");
        Ok(())
    }
}

/// Picks the first offered account, or nothing when the list is empty.
#[derive(Default)]
pub struct FirstAccountPicker {
    offered: Mutex<Vec<Vec<Account>>>,
}

impl FirstAccountPicker {
    pub fn offered(&self) -> Vec<Vec<Account>> {
        self.offered.lock().expect("picker lock").clone()
    }
}

#[async_trait]
impl AccountPicker for FirstAccountPicker {
    async fn choose(
        &self,
        _user: &UserDetails,
        accounts: &[Account],
    ) -> Result<Option<Account>, LauncherError> {
        self.offered
            .lock()
            .expect("picker lock")
            .push(accounts.to_vec());
        Ok(accounts.first().cloned())
    }
}

#[derive(Default)]
pub struct RecordingLauncher {
    launched: Mutex<Vec<(String, Account)>>,
}

impl RecordingLauncher {
    pub fn launched(&self) -> Vec<(String, Account)> {
        self.launched.lock().expect("launcher lock").clone()
    }
}

#[async_trait]
impl GameLauncher for RecordingLauncher {
    async fn launch(&self, session: &GameSession, account: &Account) -> Result<(), LauncherError> {
        self.launched
            .lock()
            .expect("launcher lock")
            .push((session.session_id.clone(), account.clone()));
        Ok(())
    }
}

pub struct Fakes {
    pub browser: Arc<FakeBrowser>,
    pub picker: Arc<FirstAccountPicker>,
    pub launcher: Arc<RecordingLauncher>,
}

impl Fakes {
    pub fn new(browser: FakeBrowser) -> Self {
        Self {
            browser: Arc::new(browser),
            picker: Arc::new(FirstAccountPicker::default()),
            launcher: Arc::new(RecordingLauncher::default()),
        }
    }
}
