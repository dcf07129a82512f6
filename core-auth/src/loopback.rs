//! Loopback Consent Flow
//!
//! Runs the installed-application consent flow: a one-shot HTTP listener is
//! bound on an ephemeral `127.0.0.1` port, the user is sent to Google's consent
//! page with that listener as the redirect URI, and the authorization code is
//! read from the redirect.

use crate::error::{AuthError, Result};
use crate::oauth::OAuthFlowManager;
use crate::types::OAuthTokens;
use async_trait::async_trait;
use core_runtime::events::{AuthEvent, CoreEvent, SyncObserver};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, info, instrument, warn};
use url::Url;

/// How long to wait for the user to finish consenting.
pub const DEFAULT_CONSENT_TIMEOUT: Duration = Duration::from_secs(300);

const MAX_REQUEST_HEAD: usize = 8 * 1024;

const SUCCESS_PAGE: &str = "<html><body><h1>Authorization complete</h1>\
    <p>You can close this window and return to the terminal.</p></body></html>";

const FAILURE_PAGE: &str = "<html><body><h1>Authorization failed</h1>\
    <p>Return to the terminal for details.</p></body></html>";

/// Interactive step that turns user consent into a token set.
#[async_trait]
pub trait ConsentFlow: Send + Sync {
    async fn authorize(&self, oauth: &OAuthFlowManager) -> Result<OAuthTokens>;
}

/// Parameters delivered to the redirect URI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallbackParams {
    pub code: String,
    pub state: String,
}

/// One-shot HTTP listener receiving the OAuth redirect.
pub struct LoopbackReceiver {
    listener: TcpListener,
    addr: SocketAddr,
}

impl LoopbackReceiver {
    /// Bind on `127.0.0.1` with an OS-assigned port.
    pub async fn bind() -> Result<Self> {
        let listener = TcpListener::bind(("127.0.0.1", 0))
            .await
            .map_err(|e| AuthError::CallbackFailed(format!("cannot bind listener: {}", e)))?;
        let addr = listener
            .local_addr()
            .map_err(|e| AuthError::CallbackFailed(e.to_string()))?;

        debug!(%addr, "Loopback receiver listening");

        Ok(Self { listener, addr })
    }

    pub fn redirect_uri(&self) -> String {
        format!("http://127.0.0.1:{}/", self.addr.port())
    }

    /// Wait for the redirect carrying the authorization code.
    ///
    /// Requests for other paths (e.g. `/favicon.ico`) get a 404 and are
    /// otherwise ignored.
    pub async fn wait_for_callback(self, wait: Duration) -> Result<CallbackParams> {
        match tokio::time::timeout(wait, self.accept_callback()).await {
            Ok(result) => result,
            Err(_) => Err(AuthError::OperationTimeout {
                operation: "waiting for authorization".to_string(),
            }),
        }
    }

    async fn accept_callback(&self) -> Result<CallbackParams> {
        loop {
            let (mut stream, peer) = self
                .listener
                .accept()
                .await
                .map_err(|e| AuthError::CallbackFailed(e.to_string()))?;

            let target = match read_request_target(&mut stream).await {
                Ok(target) => target,
                Err(e) => {
                    debug!(%peer, error = %e, "Ignoring malformed request");
                    respond(&mut stream, "400 Bad Request", FAILURE_PAGE).await;
                    continue;
                }
            };

            let Ok(url) = Url::parse(&format!("http://127.0.0.1{}", target)) else {
                respond(&mut stream, "400 Bad Request", FAILURE_PAGE).await;
                continue;
            };

            if url.path() != "/" {
                respond(&mut stream, "404 Not Found", "").await;
                continue;
            }

            let mut code = None;
            let mut state = None;
            let mut error = None;
            for (key, value) in url.query_pairs() {
                match key.as_ref() {
                    "code" => code = Some(value.into_owned()),
                    "state" => state = Some(value.into_owned()),
                    "error" => error = Some(value.into_owned()),
                    _ => {}
                }
            }

            if let Some(error) = error {
                respond(&mut stream, "200 OK", FAILURE_PAGE).await;
                return Err(AuthError::AuthorizationDenied(error));
            }

            return match (code, state) {
                (Some(code), Some(state)) => {
                    respond(&mut stream, "200 OK", SUCCESS_PAGE).await;
                    Ok(CallbackParams { code, state })
                }
                _ => {
                    respond(&mut stream, "400 Bad Request", FAILURE_PAGE).await;
                    Err(AuthError::CallbackFailed(
                        "redirect did not carry an authorization code".to_string(),
                    ))
                }
            };
        }
    }
}

/// Read the request head and return the request target of a `GET`.
async fn read_request_target(stream: &mut TcpStream) -> std::io::Result<String> {
    let mut buf = Vec::with_capacity(1024);
    let mut chunk = [0u8; 1024];

    while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
        let n = stream.read(&mut chunk).await?;
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
        if buf.len() > MAX_REQUEST_HEAD {
            return Err(invalid("request head too large"));
        }
    }

    let head = String::from_utf8_lossy(&buf);
    let request_line = head.lines().next().unwrap_or_default();
    let mut parts = request_line.split_whitespace();

    match (parts.next(), parts.next()) {
        (Some("GET"), Some(target)) if target.starts_with('/') => Ok(target.to_string()),
        _ => Err(invalid("expected a GET request")),
    }
}

fn invalid(message: &str) -> std::io::Error {
    std::io::Error::new(std::io::ErrorKind::InvalidData, message.to_string())
}

async fn respond(stream: &mut TcpStream, status: &str, body: &str) {
    let response = format!(
        "HTTP/1.1 {status}\r\nContent-Type: text/html; charset=utf-8\r\n\
         Content-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len()
    );

    if let Err(e) = stream.write_all(response.as_bytes()).await {
        debug!(error = %e, "Failed to answer loopback request");
    }
    let _ = stream.shutdown().await;
}

/// Consent via the system browser and a loopback redirect.
///
/// The authorization URL is handed to `prompt`; the binary prints it so the
/// user can open it.
pub struct LoopbackConsent {
    timeout: Duration,
    prompt: Arc<dyn Fn(&str) + Send + Sync>,
    observer: Option<Arc<dyn SyncObserver>>,
}

impl LoopbackConsent {
    pub fn new(prompt: impl Fn(&str) + Send + Sync + 'static) -> Self {
        Self {
            timeout: DEFAULT_CONSENT_TIMEOUT,
            prompt: Arc::new(prompt),
            observer: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_observer(mut self, observer: Arc<dyn SyncObserver>) -> Self {
        self.observer = Some(observer);
        self
    }
}

#[async_trait]
impl ConsentFlow for LoopbackConsent {
    #[instrument(skip(self, oauth))]
    async fn authorize(&self, oauth: &OAuthFlowManager) -> Result<OAuthTokens> {
        let receiver = LoopbackReceiver::bind().await?;
        let oauth = oauth.with_redirect_uri(receiver.redirect_uri());
        let (auth_url, verifier) = oauth.build_auth_url()?;

        if let Some(observer) = &self.observer {
            observer.on_event(CoreEvent::Auth(AuthEvent::AuthorizationRequired {
                auth_url: auth_url.clone(),
            }));
        }
        (self.prompt)(&auth_url);

        info!("Waiting for authorization in the browser");

        let params = receiver.wait_for_callback(self.timeout).await.map_err(|e| {
            warn!(error = %e, "Authorization was not completed");
            e
        })?;

        oauth
            .exchange_code(&params.code, &params.state, &verifier)
            .await
    }
}
