//! Single-shot localhost listener for the OAuth redirect.
//!
//! Serves the confirmation page to the first request it receives, hands that
//! request's query parameters to the waiting flow and shuts itself down.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    Router,
    extract::{RawQuery, State},
    http::{StatusCode, header},
    response::{Html, IntoResponse, Response},
};
use parking_lot::Mutex;
use tokio::net::TcpListener;
use tokio::sync::{Notify, oneshot};

use crate::error::{AuthError, Result};

/// Host used in the advertised redirect URL.
pub const CALLBACK_HOST: &str = "localhost";

/// What the redirect delivered.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallbackResult {
    /// Query parameters of the redirect request.
    pub params: HashMap<String, String>,
    /// Body sent back to the browser.
    pub page: String,
}

impl CallbackResult {
    pub fn code(&self) -> Option<&str> {
        self.params.get("code").map(String::as_str)
    }

    pub fn error(&self) -> Option<&str> {
        self.params.get("error").map(String::as_str)
    }
}

struct CallbackState {
    page: String,
    result_tx: Mutex<Option<oneshot::Sender<CallbackResult>>>,
    shutdown: Arc<Notify>,
}

/// A bound redirect listener.
///
/// Dropping the listener before a redirect arrives shuts the server down.
#[derive(Debug)]
pub struct CallbackListener {
    local_addr: SocketAddr,
    callback_url: String,
    result_rx: Option<oneshot::Receiver<CallbackResult>>,
    shutdown: Arc<Notify>,
}

impl CallbackListener {
    /// Bind on `127.0.0.1:port` (0 = OS-assigned) and start serving.
    pub async fn bind(port: u16, page: impl Into<String>) -> Result<Self> {
        let addr = SocketAddr::from(([127, 0, 0, 1], port));
        let bind_error = |e: std::io::Error| AuthError::Bind {
            addr: addr.to_string(),
            message: e.to_string(),
        };
        let listener = TcpListener::bind(addr).await.map_err(bind_error)?;
        let local_addr = listener.local_addr().map_err(bind_error)?;

        let (result_tx, result_rx) = oneshot::channel();
        let shutdown = Arc::new(Notify::new());
        let state = Arc::new(CallbackState {
            page: page.into(),
            result_tx: Mutex::new(Some(result_tx)),
            shutdown: shutdown.clone(),
        });

        let signal = shutdown.clone();
        tokio::spawn(async move {
            let served = axum::serve(listener, router(state))
                .with_graceful_shutdown(async move { signal.notified().await })
                .await;
            if let Err(e) = served {
                tracing::warn!(addr = %local_addr, error = %e, "Callback listener failed");
            }
            tracing::debug!(addr = %local_addr, "Callback listener stopped");
        });

        tracing::info!(addr = %local_addr, "Callback listener bound");
        Ok(Self {
            local_addr,
            callback_url: format!("http://{}:{}/", CALLBACK_HOST, local_addr.port()),
            result_rx: Some(result_rx),
            shutdown,
        })
    }

    /// The socket address actually bound.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Redirect URL to hand to the authorization endpoint.
    pub fn callback_url(&self) -> &str {
        &self.callback_url
    }

    /// Wait for the redirect. There is no timeout.
    pub async fn wait(&mut self) -> Result<CallbackResult> {
        let rx = self.result_rx.take().ok_or(AuthError::ListenerClosed)?;
        rx.await.map_err(|_| AuthError::ListenerClosed)
    }

    /// Stop serving without waiting for a redirect.
    pub fn shutdown(&self) {
        self.shutdown.notify_one();
    }
}

impl Drop for CallbackListener {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn router(state: Arc<CallbackState>) -> Router {
    Router::new().fallback(handle_redirect).with_state(state)
}

async fn handle_redirect(
    State(state): State<Arc<CallbackState>>,
    RawQuery(query): RawQuery,
) -> Response {
    let Some(tx) = state.result_tx.lock().take() else {
        return (
            StatusCode::GONE,
            [(header::CONNECTION, "close")],
            "Redirect already handled",
        )
            .into_response();
    };

    let params: HashMap<String, String> =
        url::form_urlencoded::parse(query.unwrap_or_default().as_bytes())
            .into_owned()
            .collect();
    tracing::info!(
        has_code = params.contains_key("code"),
        has_error = params.contains_key("error"),
        "OAuth redirect received"
    );

    let _ = tx.send(CallbackResult {
        params,
        page: state.page.clone(),
    });
    state.shutdown.notify_one();

    ([(header::CONNECTION, "close")], Html(state.page.clone())).into_response()
}
