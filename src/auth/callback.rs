//! One-shot localhost listener for the standard login flow.
//!
//! The provider hands `code` and `id_token` back in the URL fragment, which
//! browsers never send to a server. The root page therefore serves a small
//! script that re-issues the fragment as a query string against
//! [`FRAGMENT_PATH`], whose handler publishes the result exactly once.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::Html;
use axum::routing::get;
use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::error::AuthError;

/// Path the fragment-forwarding script calls back into.
pub const FRAGMENT_PATH: &str = "/process_fragment";

const FRAGMENT_PAGE: &str = r#"<!DOCTYPE html>
<html>
<head><meta charset="utf-8"><title>jxlaunch</title></head>
<body>
<p>Completing login...</p>
<script>
  var params = window.location.hash.substring(1) || window.location.search.substring(1);
  var xhr = new XMLHttpRequest();
  xhr.open('GET', '/process_fragment?' + params, true);
  xhr.onreadystatechange = function () {
    if (xhr.readyState === XMLHttpRequest.DONE) {
      document.body.innerHTML = xhr.status === 200
        ? 'You may now close this window.'
        : 'Login failed: ' + xhr.responseText;
    }
  };
  xhr.send();
</script>
</body>
</html>
"#;

/// The pair captured from the standard login redirect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FragmentCallback {
    pub code: String,
    pub id_token: String,
}

#[derive(Debug)]
enum CallbackOutcome {
    Authorized(FragmentCallback),
    Denied {
        error: String,
        description: Option<String>,
    },
}

type Slot = Arc<Mutex<Option<oneshot::Sender<CallbackOutcome>>>>;

/// A listener scoped to a single login attempt.
///
/// Dropping it without calling [`wait`](Self::wait) still signals the
/// server to shut down.
///
/// # Example
/// ```no_run
/// use std::time::Duration;
/// use jxlaunch::auth::CallbackServer;
///
/// # async fn example() -> Result<(), jxlaunch::auth::AuthError> {
/// let server = CallbackServer::bind(8080).await?;
/// println!("redirect to {}", server.redirect_uri());
/// let callback = server.wait(Some(Duration::from_secs(600))).await?;
/// println!("got code {}", callback.code);
/// # Ok(())
/// # }
/// ```
pub struct CallbackServer {
    local_addr: SocketAddr,
    receiver: oneshot::Receiver<CallbackOutcome>,
    shutdown_tx: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl CallbackServer {
    /// Bind `127.0.0.1:port` (0 picks a free port) and start serving.
    pub async fn bind(port: u16) -> Result<Self, AuthError> {
        let listener = TcpListener::bind(("127.0.0.1", port))
            .await
            .map_err(|err| AuthError::Callback(format!("could not bind 127.0.0.1:{port}: {err}")))?;
        let local_addr = listener
            .local_addr()
            .map_err(|err| AuthError::Callback(format!("local_addr failed: {err}")))?;

        let (sender, receiver) = oneshot::channel();
        let slot: Slot = Arc::new(Mutex::new(Some(sender)));
        let app = Router::new()
            .route("/", get(fragment_page))
            .route(FRAGMENT_PATH, get(process_fragment))
            .with_state(slot);

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let task = tokio::spawn(async move {
            let serve = axum::serve(listener, app).with_graceful_shutdown(async move {
                let _ = shutdown_rx.await;
            });
            if let Err(err) = serve.await {
                warn!(%local_addr, "callback listener error: {err}");
            }
        });
        debug!(%local_addr, "callback listener started");

        Ok(Self {
            local_addr,
            receiver,
            shutdown_tx: Some(shutdown_tx),
            task: Some(task),
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Default redirect target for this listener.
    pub fn redirect_uri(&self) -> String {
        format!("http://localhost:{}", self.local_addr.port())
    }

    /// Wait for the first callback, then shut the listener down gracefully.
    ///
    /// `None` waits indefinitely.
    pub async fn wait(mut self, timeout: Option<Duration>) -> Result<FragmentCallback, AuthError> {
        let received = match timeout {
            Some(limit) => match tokio::time::timeout(limit, &mut self.receiver).await {
                Ok(received) => received,
                Err(_) => {
                    self.shutdown().await;
                    return Err(AuthError::CallbackTimedOut(limit));
                }
            },
            None => (&mut self.receiver).await,
        };
        self.shutdown().await;

        match received {
            Ok(CallbackOutcome::Authorized(callback)) => Ok(callback),
            Ok(CallbackOutcome::Denied { error, description }) => Err(AuthError::CallbackDenied(
                match description {
                    Some(description) => format!("{error}: {description}"),
                    None => error,
                },
            )),
            Err(_) => Err(AuthError::Callback(
                "listener stopped before a callback arrived".to_string(),
            )),
        }
    }

    async fn shutdown(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(task) = self.task.take() {
            if let Err(err) = task.await {
                warn!(local_addr = %self.local_addr, "callback listener task failed: {err}");
            }
        }
        debug!(local_addr = %self.local_addr, "callback listener stopped");
    }
}

impl Drop for CallbackServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

async fn fragment_page() -> Html<&'static str> {
    Html(FRAGMENT_PAGE)
}

async fn process_fragment(
    State(slot): State<Slot>,
    Query(params): Query<HashMap<String, String>>,
) -> (StatusCode, &'static str) {
    let outcome = if let Some(error) = params.get("error") {
        CallbackOutcome::Denied {
            error: error.clone(),
            description: params.get("error_description").cloned(),
        }
    } else {
        match (params.get("code"), params.get("id_token")) {
            (Some(code), Some(id_token)) if !code.is_empty() && !id_token.is_empty() => {
                CallbackOutcome::Authorized(FragmentCallback {
                    code: code.clone(),
                    id_token: id_token.clone(),
                })
            }
            _ => return (StatusCode::BAD_REQUEST, "Missing code or id_token"),
        }
    };

    let sender = slot
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
        .take();
    match sender {
        Some(sender) => {
            if sender.send(outcome).is_err() {
                debug!("login callback arrived after the waiter went away");
            }
        }
        None => debug!("ignoring repeated login callback"),
    }
    (StatusCode::OK, "Received")
}
