//! `--status` and `--logout` handlers for the cached credentials.

use std::io::Write;

use chrono::{DateTime, Duration, Utc};

use crate::auth::store::{self, CredentialStore, StoreError};
use crate::auth::{id_token, Token};
use crate::error::LauncherError;

/// Print what is cached and whether it can be used for a direct launch.
pub fn handle_status<W: Write>(
    store: &dyn CredentialStore,
    margin: Duration,
    out: &mut W,
) -> Result<(), LauncherError> {
    let now = Utc::now();
    writeln!(out, "🔐 Cached credentials\n")?;
    writeln!(out, "  Token: {}", token_status(store, margin, now))?;
    writeln!(out, "  Identity: {}", identity_status(store))?;
    let pending = if store.get(store::VERIFIER).is_ok() { "yes" } else { "no" };
    writeln!(out, "  Pending login: {pending}")?;
    Ok(())
}

/// Remove every cached blob.
pub fn handle_logout<W: Write>(store: &dyn CredentialStore, out: &mut W) -> Result<(), LauncherError> {
    for blob in store::ALL_BLOBS {
        store.remove(blob)?;
    }
    writeln!(out, "✅ Cached credentials removed")?;
    Ok(())
}

fn token_status(store: &dyn CredentialStore, margin: Duration, now: DateTime<Utc>) -> String {
    let raw = match store.get(store::TOKEN) {
        Ok(raw) => raw,
        Err(StoreError::NotFound { .. }) => return "❌ Not logged in".to_string(),
        Err(err) => return format!("⚠️  Error: {err}"),
    };
    let token: Token = match serde_json::from_str(&raw) {
        Ok(token) => token,
        Err(err) => return format!("⚠️  Unreadable: {err}"),
    };
    match token.expiry {
        Some(expiry) if token.is_usable_at(now, margin) => {
            format!("✅ Valid (expires {})", expiry.format("%Y-%m-%d %H:%M"))
        }
        Some(expiry) => format!(
            "⚠️  Expired or expiring soon ({})",
            expiry.format("%Y-%m-%d %H:%M")
        ),
        None => "⚠️  No expiry recorded".to_string(),
    }
}

fn identity_status(store: &dyn CredentialStore) -> String {
    let raw = match store.get(store::ID_TOKEN) {
        Ok(raw) => raw,
        Err(StoreError::NotFound { .. }) => return "❌ None".to_string(),
        Err(err) => return format!("⚠️  Error: {err}"),
    };
    match id_token::decode(&raw) {
        Ok(claims) => format!(
            "✅ login_provider={}",
            claims.login_provider().unwrap_or("<none>")
        ),
        Err(err) => format!("⚠️  {err}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::MemoryCredentialStore;

    fn token_json(expiry: Option<DateTime<Utc>>) -> String {
        serde_json::to_string(&Token {
            access_token: "a".to_string(),
            refresh_token: None,
            token_type: None,
            expiry,
            id_token: None,
            scope: None,
        })
        .unwrap()
    }

    #[test]
    fn empty_store_reports_not_logged_in() {
        let store = MemoryCredentialStore::new();
        let mut out = Vec::new();
        handle_status(&store, Duration::minutes(30), &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("Token: ❌ Not logged in"));
        assert!(text.contains("Identity: ❌ None"));
        assert!(text.contains("Pending login: no"));
    }

    #[test]
    fn token_status_respects_margin() {
        let store = MemoryCredentialStore::new();
        let now = Utc::now();
        store
            .put(store::TOKEN, &token_json(Some(now + Duration::minutes(10))))
            .unwrap();
        assert!(token_status(&store, Duration::minutes(30), now).contains("Expired"));
        assert!(token_status(&store, Duration::minutes(5), now).contains("Valid"));

        store.put(store::TOKEN, &token_json(None)).unwrap();
        assert!(token_status(&store, Duration::minutes(5), now).contains("No expiry"));
    }

    #[test]
    fn logout_clears_every_blob() {
        let store = MemoryCredentialStore::new();
        for blob in store::ALL_BLOBS {
            store.put(blob, "x").unwrap();
        }
        let mut out = Vec::new();
        handle_logout(&store, &mut out).unwrap();
        for blob in store::ALL_BLOBS {
            assert!(matches!(store.get(blob), Err(StoreError::NotFound { .. })));
        }
        // Idempotent.
        handle_logout(&store, &mut out).unwrap();
    }
}
