//! Per-attempt authorization request material (state + PKCE pair).

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand::{Rng, RngCore};
use sha2::{Digest, Sha256};

use super::error::AuthError;
use super::store::{self, CredentialStore};

const STATE_CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz";
const STATE_LEN: usize = 12;
const VERIFIER_BYTES: usize = 32;

/// A fresh `state` and PKCE verifier/challenge for one login attempt.
///
/// The pair is single-use: every attempt generates a new one and
/// [`persist`](Self::persist) overwrites whatever the previous attempt left.
#[derive(Debug, Clone)]
pub struct AuthorizationRequest {
    pub state: String,
    pub pkce_verifier: String,
    pub code_challenge: String,
}

impl AuthorizationRequest {
    pub fn generate() -> Self {
        let pkce_verifier = generate_code_verifier();
        let code_challenge = compute_code_challenge(&pkce_verifier);
        Self {
            state: random_state(),
            pkce_verifier,
            code_challenge,
        }
    }

    /// Write `state` and `verifier` so a later invocation can resume the flow.
    pub fn persist(&self, store: &dyn CredentialStore) -> Result<(), AuthError> {
        store.put(store::STATE, &self.state)?;
        store.put(store::VERIFIER, &self.pkce_verifier)?;
        Ok(())
    }
}

/// 12 random ASCII letters.
pub fn random_state() -> String {
    let mut rng = rand::thread_rng();
    (0..STATE_LEN)
        .map(|_| STATE_CHARSET[rng.gen_range(0..STATE_CHARSET.len())] as char)
        .collect()
}

pub fn generate_code_verifier() -> String {
    let mut buf = [0u8; VERIFIER_BYTES];
    rand::thread_rng().fill_bytes(&mut buf);
    URL_SAFE_NO_PAD.encode(buf)
}

pub fn compute_code_challenge(verifier: &str) -> String {
    let digest = Sha256::digest(verifier.as_bytes());
    URL_SAFE_NO_PAD.encode(digest)
}
