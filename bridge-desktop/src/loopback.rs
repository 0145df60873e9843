//! OAuth consent via the system browser and a loopback redirect listener

use async_trait::async_trait;
use bridge_traits::{
    auth::{AuthorizationPrompt, AuthorizationRedirect},
    error::{BridgeError, Result},
};
use std::net::{Ipv4Addr, SocketAddr};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, info, warn};

/// Upper bound on the request head we are willing to buffer.
const MAX_REQUEST_HEAD: usize = 16 * 1024;

const SUCCESS_PAGE: &str = "<html><body><h3>Authorization received.</h3>\
<p>You can close this window and return to the terminal.</p></body></html>";

/// Installed-app authorization prompt.
///
/// Opens the consent page in the default browser (and prints it, for
/// headless sessions), then accepts the provider's redirect on
/// `http://127.0.0.1:<port>/`.
pub struct LoopbackPrompt {
    listener: TcpListener,
    addr: SocketAddr,
    open_browser: bool,
}

impl LoopbackPrompt {
    /// Bind the redirect listener. Port `0` picks a free port.
    pub async fn bind(port: u16) -> Result<Self> {
        let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, port)).await?;
        let addr = listener.local_addr()?;
        debug!(%addr, "Bound OAuth redirect listener");

        Ok(Self {
            listener,
            addr,
            open_browser: true,
        })
    }

    /// Only print the consent URL; never launch a browser.
    pub fn without_browser(mut self) -> Self {
        self.open_browser = false;
        self
    }

    async fn read_request_target(stream: &mut TcpStream) -> Result<String> {
        let mut head = Vec::with_capacity(1024);
        let mut buf = [0u8; 1024];

        while !head.windows(4).any(|w| w == b"\r\n\r\n") {
            let n = stream.read(&mut buf).await?;
            if n == 0 {
                break;
            }
            head.extend_from_slice(&buf[..n]);
            if head.len() > MAX_REQUEST_HEAD {
                return Err(BridgeError::OperationFailed(
                    "Redirect request head too large".to_string(),
                ));
            }
        }

        let head = String::from_utf8_lossy(&head);
        let request_line = head.lines().next().unwrap_or_default();
        request_line
            .split_whitespace()
            .nth(1)
            .map(str::to_string)
            .ok_or_else(|| {
                BridgeError::OperationFailed(format!(
                    "Malformed redirect request: {:?}",
                    request_line
                ))
            })
    }

    async fn respond(stream: &mut TcpStream, status: &str, body: &str) -> Result<()> {
        let response = format!(
            "HTTP/1.1 {}\r\nContent-Type: text/html; charset=utf-8\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            status,
            body.len(),
            body
        );
        stream.write_all(response.as_bytes()).await?;
        stream.shutdown().await?;
        Ok(())
    }
}

/// Parse `code`, `state` and `error` from a request target such as `/?code=..&state=..`.
fn parse_redirect_target(target: &str) -> Option<AuthorizationRedirect> {
    let url = url::Url::parse("http://127.0.0.1")
        .and_then(|base| base.join(target))
        .ok()?;

    let mut redirect = AuthorizationRedirect::default();
    for (key, value) in url.query_pairs() {
        match key.as_ref() {
            "code" => redirect.code = Some(value.into_owned()),
            "state" => redirect.state = Some(value.into_owned()),
            "error" => redirect.error = Some(value.into_owned()),
            _ => {}
        }
    }

    if redirect.code.is_none() && redirect.error.is_none() {
        return None;
    }
    Some(redirect)
}

#[async_trait]
impl AuthorizationPrompt for LoopbackPrompt {
    fn redirect_uri(&self) -> String {
        format!("http://{}:{}/", self.addr.ip(), self.addr.port())
    }

    async fn present(&self, authorization_url: &str) -> Result<()> {
        info!("Authorization required; complete the sign-in in your browser");
        eprintln!(
            "\nOpen this URL to authorize access to Google Drive:\n\n    {}\n",
            authorization_url
        );

        if self.open_browser {
            if let Err(e) = webbrowser::open(authorization_url) {
                warn!(error = %e, "Could not launch a browser; open the URL manually");
            }
        }
        Ok(())
    }

    async fn wait_for_redirect(&self) -> Result<AuthorizationRedirect> {
        loop {
            let (mut stream, peer) = self.listener.accept().await?;
            debug!(%peer, "Accepted redirect connection");

            let target = match Self::read_request_target(&mut stream).await {
                Ok(target) => target,
                Err(e) => {
                    warn!(error = %e, "Ignoring malformed redirect request");
                    continue;
                }
            };

            match parse_redirect_target(&target) {
                Some(redirect) => {
                    Self::respond(&mut stream, "200 OK", SUCCESS_PAGE).await?;
                    return Ok(redirect);
                }
                None => {
                    // Browsers also ask for /favicon.ico and the like.
                    let _ = Self::respond(&mut stream, "404 Not Found", "").await;
                }
            }
        }
    }
}
