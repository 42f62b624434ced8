//! Localhost loopback OAuth callback server, grounded on the calendar
//! integration's own loopback implementation (the one concrete OAuth flow
//! already present in this codebase) rather than the `oauth2` crate.

use std::collections::HashMap;
use std::sync::{Arc, Mutex as StdMutex};
use std::time::{Duration, Instant};

use axum::extract::Query;
use axum::response::Html;
use axum::routing::get;
use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::error;
use tsic_domain::{Result, TsicError};

#[derive(Debug, Clone)]
struct CallbackData {
    code: String,
    state: String,
}

/// Loopback HTTP server that receives one OAuth redirect callback.
pub struct OAuthCallbackServer {
    port: u16,
    callback_data: Arc<StdMutex<Option<CallbackData>>>,
    expected_state: Arc<StdMutex<Option<String>>>,
    shutdown_tx: Option<oneshot::Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl OAuthCallbackServer {
    /// Bind an ephemeral port and start serving `/callback`.
    pub async fn start() -> Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0").await.map_err(|err| {
            TsicError::InternalInvariantViolated {
                message: format!("failed to bind OAuth loopback server: {err}"),
            }
        })?;

        let port = listener.local_addr().map_err(|err| TsicError::InternalInvariantViolated {
            message: format!("failed to determine loopback port: {err}"),
        })?
        .port();

        let callback_data = Arc::new(StdMutex::new(None));
        let expected_state = Arc::new(StdMutex::new(None));

        let callback_data_clone = callback_data.clone();
        let expected_state_clone = expected_state.clone();

        let app = Router::new().route(
            "/callback",
            get(move |query: Query<HashMap<String, String>>| {
                handle_callback(query, callback_data_clone.clone(), expected_state_clone.clone())
            }),
        );

        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let handle = tokio::spawn(async move {
            if let Err(err) = axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    let _ = shutdown_rx.await;
                })
                .await
            {
                error!("OAuth callback server error: {}", err);
            }
        });

        Ok(Self { port, callback_data, expected_state, shutdown_tx: Some(shutdown_tx), handle: Some(handle) })
    }

    /// Redirect URI to supply to the authorization request.
    #[must_use]
    pub fn redirect_uri(&self) -> String {
        format!("http://localhost:{}/callback", self.port)
    }

    /// Record the `state` this server should accept.
    pub fn set_expected_state(&self, state: String) {
        let mut guard = self.expected_state.lock().expect("expected_state poisoned");
        *guard = Some(state);
    }

    /// Block until the callback fires or `timeout` elapses.
    pub async fn wait_for_code(&self, timeout: Duration) -> Result<String> {
        {
            let guard = self.expected_state.lock().expect("expected_state poisoned");
            if guard.is_none() {
                return Err(TsicError::InternalInvariantViolated {
                    message: "OAuth expected state not configured".into(),
                });
            }
        }

        let deadline = Instant::now() + timeout;
        loop {
            {
                let data_guard = self.callback_data.lock().expect("callback_data poisoned");
                if let Some(data) = data_guard.as_ref() {
                    return Ok(data.code.clone());
                }
            }
            if Instant::now() >= deadline {
                return Err(TsicError::ProviderTransient {
                    provider: "oauth".into(),
                    message: "timed out waiting for OAuth callback".into(),
                });
            }
            sleep(Duration::from_millis(100)).await;
        }
    }

    /// Stop the server.
    pub async fn shutdown(mut self) -> Result<()> {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
        Ok(())
    }
}

async fn handle_callback(
    Query(params): Query<HashMap<String, String>>,
    callback_data: Arc<StdMutex<Option<CallbackData>>>,
    expected_state: Arc<StdMutex<Option<String>>>,
) -> Html<&'static str> {
    let Some(code) = params.get("code") else {
        return Html("<html><body>Missing authorization code.</body></html>");
    };
    let Some(state) = params.get("state") else {
        return Html("<html><body>Missing state parameter.</body></html>");
    };

    let expected = expected_state.lock().expect("expected_state poisoned").clone();
    if expected.as_deref() != Some(state.as_str()) {
        return Html("<html><body>State mismatch; possible CSRF attempt.</body></html>");
    }

    let mut guard = callback_data.lock().expect("callback_data poisoned");
    *guard = Some(CallbackData { code: code.clone(), state: state.clone() });

    Html("<html><body>Authentication complete. You may close this window.</body></html>")
}
