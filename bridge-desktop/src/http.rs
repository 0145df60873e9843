//! HTTP Client Implementation using Reqwest

use async_trait::async_trait;
use bridge_traits::{
    error::{BridgeError, Result},
    http::{ByteStream, HttpClient, HttpMethod, HttpRequest, HttpResponse, RetryPolicy},
};
use bytes::Bytes;
use futures_util::{Stream, StreamExt};
use reqwest::cookie::{CookieStore, Jar};
use reqwest::Client;
use std::collections::HashMap;
use std::io;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

const USER_AGENT: &str = concat!("lecture-sync/", env!("CARGO_PKG_VERSION"));

/// Longest a download may go without receiving a byte
const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(60);

/// Reqwest-based HTTP client implementation
///
/// Provides HTTP operations with:
/// - A shared cookie jar, so a login sequence yields a usable session
/// - Automatic retry with exponential backoff on 429/5xx and connect errors
/// - TLS via rustls
/// - Streaming downloads that fail once the server stops sending
pub struct ReqwestHttpClient {
    client: Client,
    cookies: Arc<Jar>,
    default_policy: RetryPolicy,
    request_timeout: Option<Duration>,
    idle_timeout: Duration,
}

impl ReqwestHttpClient {
    /// Create a new HTTP client with default configuration
    pub fn new() -> Result<Self> {
        Self::with_timeout(Duration::from_secs(60))
    }

    /// Create a new HTTP client with a custom per-request timeout
    ///
    /// The timeout applies to regular requests unless the request carries
    /// its own. Streaming downloads are bounded by the idle timeout instead,
    /// so large videos are not cut off.
    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        let cookies = Arc::new(Jar::default());
        let client = Client::builder()
            .cookie_provider(Arc::clone(&cookies))
            .connect_timeout(Duration::from_secs(10))
            .pool_max_idle_per_host(10)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| {
                BridgeError::OperationFailed(format!("Failed to build HTTP client: {}", e))
            })?;

        Ok(Self {
            client,
            cookies,
            default_policy: RetryPolicy::default(),
            request_timeout: Some(timeout),
            idle_timeout: DEFAULT_IDLE_TIMEOUT,
        })
    }

    /// Set how long a download may stall before it fails.
    pub fn with_idle_timeout(mut self, idle_timeout: Duration) -> Self {
        self.idle_timeout = idle_timeout;
        self
    }

    /// Convert bridge HttpMethod to reqwest Method
    fn convert_method(method: HttpMethod) -> reqwest::Method {
        match method {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Put => reqwest::Method::PUT,
        }
    }

    /// Build reqwest request from bridge request
    fn build_request(&self, request: HttpRequest) -> reqwest::RequestBuilder {
        let method = Self::convert_method(request.method);
        let mut req = self.client.request(method, &request.url);

        for (key, value) in request.headers {
            req = req.header(key, value);
        }

        if let Some(body) = request.body {
            req = req.body(body);
        }

        if let Some(timeout) = request.timeout.or(self.request_timeout) {
            req = req.timeout(timeout);
        }

        req
    }

    /// Delay before attempt number `attempt + 1`
    fn backoff_delay(policy: &RetryPolicy, attempt: u32) -> Duration {
        if policy.use_exponential_backoff {
            let exponential_delay = policy.base_delay * 2u32.pow(attempt.saturating_sub(1));
            exponential_delay.min(policy.max_delay)
        } else {
            policy.base_delay
        }
    }

    /// Execute request with retry logic
    async fn execute_with_retry_internal(
        &self,
        request: HttpRequest,
        policy: RetryPolicy,
    ) -> Result<HttpResponse> {
        let mut attempt = 0;
        let mut last_error = None;

        while attempt < policy.max_attempts {
            debug!(
                attempt = attempt + 1,
                max_attempts = policy.max_attempts,
                url = %request.url,
                "Executing HTTP request"
            );

            let req_builder = self.build_request(request.clone());

            match req_builder.send().await {
                Ok(response) => {
                    let status = response.status().as_u16();

                    if status >= 500 || status == 429 {
                        warn!(
                            status = status,
                            attempt = attempt + 1,
                            "HTTP request failed with retryable status"
                        );
                        last_error = Some(BridgeError::OperationFailed(format!(
                            "HTTP {} error from {}",
                            status, request.url
                        )));
                    } else {
                        let url = response.url().to_string();
                        let headers: HashMap<String, String> = response
                            .headers()
                            .iter()
                            .filter_map(|(k, v)| {
                                v.to_str().ok().map(|s| (k.as_str().to_string(), s.to_string()))
                            })
                            .collect();

                        let body = response
                            .bytes()
                            .await
                            .map_err(|e| BridgeError::OperationFailed(e.to_string()))?;

                        return Ok(HttpResponse {
                            status,
                            url,
                            headers,
                            body,
                        });
                    }
                }
                Err(e) => {
                    warn!(
                        error = %e,
                        attempt = attempt + 1,
                        "HTTP request failed"
                    );

                    if e.is_timeout() {
                        last_error = Some(BridgeError::OperationFailed(format!(
                            "Request to {} timed out",
                            request.url
                        )));
                    } else if e.is_connect() {
                        last_error = Some(BridgeError::OperationFailed(format!(
                            "Connection failed: {}",
                            e
                        )));
                    } else {
                        last_error = Some(BridgeError::OperationFailed(e.to_string()));
                    }
                }
            }

            attempt += 1;

            if attempt < policy.max_attempts {
                let delay = Self::backoff_delay(&policy, attempt);
                debug!(delay_ms = delay.as_millis() as u64, "Retrying after delay");
                sleep(delay).await;
            }
        }

        Err(last_error.unwrap_or_else(|| {
            BridgeError::OperationFailed("All retry attempts exhausted".to_string())
        }))
    }
}

#[async_trait]
impl HttpClient for ReqwestHttpClient {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse> {
        self.execute_with_retry(request, self.default_policy.clone())
            .await
    }

    async fn execute_with_retry(
        &self,
        request: HttpRequest,
        policy: RetryPolicy,
    ) -> Result<HttpResponse> {
        self.execute_with_retry_internal(request, policy).await
    }

    async fn download_stream(&self, url: String) -> Result<ByteStream> {
        let response = tokio::time::timeout(self.idle_timeout, self.client.get(&url).send())
            .await
            .map_err(|_| {
                BridgeError::OperationFailed(format!("Download of {} timed out", url))
            })?
            .map_err(|e| BridgeError::OperationFailed(format!("Download failed: {}", e)))?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN
        {
            return Err(BridgeError::Unauthorized(format!(
                "Download rejected with HTTP {}",
                status
            )));
        }
        if !status.is_success() {
            return Err(BridgeError::OperationFailed(format!(
                "HTTP error: {}",
                status
            )));
        }

        let content_length = response.content_length();
        let body = idle_bounded(Box::pin(response.bytes_stream()), self.idle_timeout);
        let reader = tokio_util::io::StreamReader::new(Box::pin(body));

        Ok(ByteStream::new(Box::new(reader), content_length))
    }

    async fn cookie_names(&self, url: &str) -> Vec<String> {
        let Ok(url) = url::Url::parse(url) else {
            return Vec::new();
        };

        self.cookies
            .cookies(&url)
            .and_then(|header| header.to_str().map(parse_cookie_names).ok())
            .unwrap_or_default()
    }
}

/// Fail the body with `TimedOut` when no chunk arrives within `idle`.
fn idle_bounded<S, E>(stream: S, idle: Duration) -> impl Stream<Item = io::Result<Bytes>> + Send
where
    S: Stream<Item = std::result::Result<Bytes, E>> + Send + Unpin + 'static,
    E: Into<Box<dyn std::error::Error + Send + Sync>> + Send + 'static,
{
    futures_util::stream::unfold(Some(stream), move |state| async move {
        let mut stream = state?;
        match tokio::time::timeout(idle, stream.next()).await {
            Ok(Some(Ok(chunk))) => Some((Ok(chunk), Some(stream))),
            Ok(Some(Err(e))) => Some((Err(io::Error::other(e)), None)),
            Ok(None) => None,
            Err(_) => {
                warn!(idle_ms = idle.as_millis() as u64, "Download stalled");
                Some((
                    Err(io::Error::new(
                        io::ErrorKind::TimedOut,
                        format!("no data received for {}s", idle.as_secs_f32()),
                    )),
                    None,
                ))
            }
        }
    })
}

/// Extract cookie names from a `Cookie` header value (`a=1; b=2`).
fn parse_cookie_names(header: &str) -> Vec<String> {
    header
        .split(';')
        .filter_map(|pair| pair.split('=').next())
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn test_http_client_creation() {
        assert!(ReqwestHttpClient::new().is_ok());
    }

    #[tokio::test]
    async fn test_stalled_download_times_out() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = [0u8; 1024];
            let _ = socket.read(&mut request).await;
            socket
                .write_all(b"HTTP/1.1 200 OK\r\nContent-Length: 1000000\r\n\r\nabc")
                .await
                .unwrap();
            // Connection stays open, nothing more is sent.
            sleep(Duration::from_secs(30)).await;
            drop(socket);
        });

        let client = ReqwestHttpClient::new()
            .unwrap()
            .with_idle_timeout(Duration::from_millis(300));
        let mut stream = client
            .download_stream(format!("http://{}/lecture.mp4", addr))
            .await
            .unwrap();
        assert_eq!(stream.content_length, Some(1_000_000));

        let mut data = Vec::new();
        let err = tokio::time::timeout(Duration::from_secs(10), stream.reader.read_to_end(&mut data))
            .await
            .expect("stalled read must fail instead of hanging")
            .unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::TimedOut);
    }

    #[tokio::test]
    async fn test_idle_bound_passes_steady_stream() {
        let chunks: Vec<std::result::Result<Bytes, io::Error>> =
            vec![Ok(Bytes::from_static(b"ab")), Ok(Bytes::from_static(b"cd"))];
        let body = idle_bounded(futures_util::stream::iter(chunks), Duration::from_secs(1));

        let collected: Vec<Bytes> = body.map(|chunk| chunk.unwrap()).collect().await;
        assert_eq!(collected, vec![Bytes::from_static(b"ab"), Bytes::from_static(b"cd")]);
    }

    #[test]
    fn test_method_conversion() {
        assert_eq!(
            ReqwestHttpClient::convert_method(HttpMethod::Get),
            reqwest::Method::GET
        );
        assert_eq!(
            ReqwestHttpClient::convert_method(HttpMethod::Put),
            reqwest::Method::PUT
        );
    }

    #[test]
    fn test_backoff_is_capped() {
        let policy = RetryPolicy::default();
        assert_eq!(
            ReqwestHttpClient::backoff_delay(&policy, 1),
            Duration::from_secs(1)
        );
        assert_eq!(
            ReqwestHttpClient::backoff_delay(&policy, 2),
            Duration::from_secs(2)
        );
        assert_eq!(
            ReqwestHttpClient::backoff_delay(&policy, 8),
            Duration::from_secs(10)
        );
    }

    #[test]
    fn test_parse_cookie_names() {
        assert_eq!(
            parse_cookie_names("JSESSIONID=abc; _csrf_token=x=y;  .ASPXAUTH=1"),
            vec!["JSESSIONID", "_csrf_token", ".ASPXAUTH"]
        );
        assert!(parse_cookie_names("").is_empty());
    }

    #[tokio::test]
    async fn test_cookie_names_from_jar() {
        let client = ReqwestHttpClient::new().unwrap();
        let url = url::Url::parse("https://example.edu/").unwrap();
        client.cookies.add_cookie_str("session=1; Path=/", &url);

        let names = client.cookie_names("https://example.edu/page").await;
        assert_eq!(names, vec!["session"]);
        assert!(client.cookie_names("not a url").await.is_empty());
    }
}
