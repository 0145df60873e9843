//! SAML single sign-on into Panopto
//!
//! The sign-in replays what a browser does when a student clicks through
//! Canvas:
//!
//! 1. `GET` the Canvas SAML login URL, which redirects to the identity
//!    provider's login form (sets `_csrf_token` and `JSESSIONID`)
//! 2. `POST` the username and password to that form
//! 3. pull the hidden `SAMLResponse` out of the auto-submit page
//! 4. `POST` it to the Canvas assertion consumer
//! 5. `GET` the Panopto login page, which completes the round trip and sets
//!    `.ASPXAUTH`
//!
//! All cookies live in the `HttpClient`'s jar, so the same client must be
//! used for the listing calls afterwards.

use bridge_traits::http::{HttpClient, HttpMethod, HttpRequest, HttpResponse};
use core_runtime::logging::redact_if_sensitive;
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, instrument};

use crate::endpoints::PanoptoEndpoints;
use crate::error::{PanoptoError, Result};

const PANOPTO_AUTH_COOKIE: &str = ".ASPXAUTH";
const IDP_CSRF_COOKIE: &str = "_csrf_token";
const IDP_SESSION_COOKIE: &str = "JSESSIONID";

static INPUT_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<input\b[^>]*>").expect("Invalid input tag regex"));
static NAME_ATTR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)\bname\s*=\s*["']([^"']*)["']"#).expect("Invalid name attribute regex")
});
static VALUE_ATTR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?is)\bvalue\s*=\s*["']([^"']*)["']"#).expect("Invalid value attribute regex")
});
static HTML_ENTITY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"&(#[xX][0-9a-fA-F]+|#[0-9]+|amp|quot|lt|gt|apos);").expect("Invalid entity regex")
});

/// University sign-in credentials
#[derive(Clone)]
pub struct PanoptoCredentials {
    username: String,
    password: String,
}

impl PanoptoCredentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Result<Self> {
        let username = username.into();
        let password = password.into();

        if username.trim().is_empty() {
            return Err(PanoptoError::MissingCredentials(
                "PANOPTO_USERNAME is not set".to_string(),
            ));
        }
        if password.is_empty() {
            return Err(PanoptoError::MissingCredentials(
                "PANOPTO_PASSWORD is not set".to_string(),
            ));
        }

        Ok(Self { username, password })
    }

    pub fn username(&self) -> &str {
        &self.username
    }
}

impl fmt::Debug for PanoptoCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PanoptoCredentials")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Value of the named `<input>` in an HTML form, entity-decoded.
pub(crate) fn hidden_input_value(html: &str, name: &str) -> Option<String> {
    INPUT_TAG.find_iter(html).find_map(|tag| {
        let tag = tag.as_str();
        let tag_name = NAME_ATTR.captures(tag)?.get(1)?.as_str();
        if tag_name != name {
            return None;
        }
        let value = VALUE_ATTR.captures(tag)?.get(1)?.as_str();
        Some(decode_html_entities(value))
    })
}

fn decode_html_entities(value: &str) -> String {
    HTML_ENTITY
        .replace_all(value, |caps: &regex::Captures<'_>| {
            let entity = &caps[1];
            let decoded = match entity {
                "amp" => Some('&'),
                "quot" => Some('"'),
                "lt" => Some('<'),
                "gt" => Some('>'),
                "apos" => Some('\''),
                _ if entity.starts_with("#x") || entity.starts_with("#X") => {
                    u32::from_str_radix(&entity[2..], 16)
                        .ok()
                        .and_then(char::from_u32)
                }
                _ => entity[1..].parse::<u32>().ok().and_then(char::from_u32),
            };
            decoded
                .map(String::from)
                .unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

/// Establishes an authenticated Panopto session in the client's cookie jar.
pub struct SamlAuthenticator {
    http_client: Arc<dyn HttpClient>,
    endpoints: PanoptoEndpoints,
}

impl SamlAuthenticator {
    pub fn new(http_client: Arc<dyn HttpClient>, endpoints: PanoptoEndpoints) -> Self {
        Self {
            http_client,
            endpoints,
        }
    }

    async fn send(&self, request: HttpRequest, step: &str) -> Result<HttpResponse> {
        let response = self.http_client.execute(request).await?;
        if !response.is_success() {
            return Err(PanoptoError::from_status(response.status, step));
        }
        Ok(response)
    }

    async fn require_cookie(&self, url: &str, cookie: &str, step: &str) -> Result<()> {
        let names = self.http_client.cookie_names(url).await;
        if names.iter().any(|name| name == cookie) {
            Ok(())
        } else {
            Err(PanoptoError::MissingCookie {
                step: step.to_string(),
                cookie: cookie.to_string(),
            })
        }
    }

    /// Run the sign-in sequence.
    ///
    /// # Errors
    ///
    /// - [`PanoptoError::SamlResponseMissing`] when the identity provider
    ///   does not accept the credentials
    /// - [`PanoptoError::MissingCookie`] when a step did not establish the
    ///   session it should have
    #[instrument(skip(self, credentials))]
    pub async fn sign_in(&self, credentials: &PanoptoCredentials) -> Result<()> {
        info!(
            username = %redact_if_sensitive("username", credentials.username()),
            "Beginning SAML negotiation"
        );

        let login_form = self
            .send(
                HttpRequest::new(HttpMethod::Get, self.endpoints.saml_login_url.clone()),
                "opening the identity provider",
            )
            .await?;
        let form_url = if login_form.url.is_empty() {
            self.endpoints.saml_login_url.clone()
        } else {
            login_form.url.clone()
        };

        self.require_cookie(
            &self.endpoints.saml_login_url,
            IDP_CSRF_COOKIE,
            "opening the identity provider",
        )
        .await?;
        self.require_cookie(&form_url, IDP_SESSION_COOKIE, "opening the identity provider")
            .await?;

        debug!(form_url = %form_url, "Submitting credentials");
        let signed_in = self
            .send(
                HttpRequest::new(HttpMethod::Post, form_url).form(&[
                    ("j_username", credentials.username.as_str()),
                    ("j_password", credentials.password.as_str()),
                    ("_eventId_proceed", "Sign in"),
                ])?,
                "submitting credentials",
            )
            .await?;

        // The identity provider answers 200 even for bad credentials; only
        // the missing assertion tells them apart.
        let html = signed_in
            .text()
            .map_err(|e| PanoptoError::ParseError(e.to_string()))?;
        let saml_response =
            hidden_input_value(&html, "SAMLResponse").ok_or(PanoptoError::SamlResponseMissing)?;
        let relay_state = hidden_input_value(&html, "RelayState");

        debug!("Posting SAML assertion");
        let mut assertion = vec![("SAMLResponse", saml_response.as_str())];
        if let Some(relay_state) = relay_state.as_deref() {
            assertion.push(("RelayState", relay_state));
        }
        self.send(
            HttpRequest::new(HttpMethod::Post, self.endpoints.saml_consumer_url.clone())
                .form(&assertion)?,
            "posting the SAML assertion",
        )
        .await?;

        debug!("Connecting to Panopto");
        self.send(
            HttpRequest::new(HttpMethod::Get, self.endpoints.login_url()),
            "opening the Panopto login page",
        )
        .await?;
        self.require_cookie(
            &self.endpoints.base_url,
            PANOPTO_AUTH_COOKIE,
            "opening the Panopto login page",
        )
        .await?;

        info!("Panopto session established");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::MockHttpClient;
    use bridge_traits::error::BridgeError;
    use std::collections::HashMap;

    const IDP_FORM_URL: &str = "https://idp.u.washington.edu/idp/profile/SAML2/Redirect/SSO?execution=e1s1";

    const ASSERTION_PAGE: &str = r#"<html><body onload="document.forms[0].submit()">
        <form action="https://canvas.uw.edu/login/saml" method="post">
        <input type="hidden" name="RelayState" value="cookie&#x3a;1"/>
        <input type="hidden" value="PHNhbWw&#x2b;Zm9v&#x3d;" name="SAMLResponse"/>
        </form></body></html>"#;

    fn form_params(request: &HttpRequest) -> HashMap<String, String> {
        request
            .body
            .as_ref()
            .and_then(|body| parse_form(body))
            .unwrap_or_default()
    }

    fn parse_form(body: &[u8]) -> Option<HashMap<String, String>> {
        let text = std::str::from_utf8(body).ok()?;
        Some(
            text.split('&')
                .filter_map(|pair| pair.split_once('='))
                .map(|(k, v)| {
                    let decode = |s: &str| {
                        urlencoding::decode(&s.replace('+', " "))
                            .map(|c| c.into_owned())
                            .unwrap_or_default()
                    };
                    (decode(k), decode(v))
                })
                .collect(),
        )
    }

    fn session_cookies(url: &str) -> Vec<String> {
        if url.starts_with("https://canvas.uw.edu") {
            vec!["_csrf_token".to_string(), "_normandy_session".to_string()]
        } else if url.starts_with("https://idp.u.washington.edu") {
            vec!["JSESSIONID".to_string()]
        } else if url.starts_with("https://uw.hosted.panopto.com") {
            vec![".ASPXAUTH".to_string()]
        } else {
            Vec::new()
        }
    }

    fn mock_sign_in_flow(mock: &mut MockHttpClient, assertion_page: &'static str) {
        mock.expect_execute().returning(move |request| {
            let response = match (request.method, request.url.as_str()) {
                (HttpMethod::Get, "https://canvas.uw.edu/login/saml/83") => {
                    HttpResponse::new(200, "<form/>").with_url(IDP_FORM_URL)
                }
                (HttpMethod::Post, IDP_FORM_URL) => {
                    let params = form_params(&request);
                    assert_eq!(params.get("j_username").map(String::as_str), Some("student"));
                    assert_eq!(params.get("j_password").map(String::as_str), Some("hunter2"));
                    assert_eq!(
                        params.get("_eventId_proceed").map(String::as_str),
                        Some("Sign in")
                    );
                    HttpResponse::new(200, assertion_page)
                }
                (HttpMethod::Post, "https://canvas.uw.edu/login/saml") => {
                    let params = form_params(&request);
                    assert_eq!(
                        params.get("SAMLResponse").map(String::as_str),
                        Some("PHNhbWw+Zm9v=")
                    );
                    assert_eq!(params.get("RelayState").map(String::as_str), Some("cookie:1"));
                    HttpResponse::new(200, "")
                }
                (HttpMethod::Get, url) if url.contains("/Panopto/Pages/Auth/Login.aspx") => {
                    HttpResponse::new(200, "home")
                }
                (method, url) => panic!("unexpected request {:?} {}", method, url),
            };
            Ok(response)
        });
    }

    fn credentials() -> PanoptoCredentials {
        PanoptoCredentials::new("student", "hunter2").unwrap()
    }

    #[test]
    fn test_hidden_input_value() {
        assert_eq!(
            hidden_input_value(ASSERTION_PAGE, "SAMLResponse").as_deref(),
            Some("PHNhbWw+Zm9v=")
        );
        assert_eq!(
            hidden_input_value(ASSERTION_PAGE, "RelayState").as_deref(),
            Some("cookie:1")
        );
        assert_eq!(hidden_input_value("<p>Invalid password</p>", "SAMLResponse"), None);
    }

    #[test]
    fn test_decode_html_entities() {
        assert_eq!(decode_html_entities("a&amp;b&#43;c&#x2F;&bogus;"), "a&b+c/&bogus;");
    }

    #[test]
    fn test_credentials_validation_and_debug() {
        assert!(matches!(
            PanoptoCredentials::new("", "pw"),
            Err(PanoptoError::MissingCredentials(_))
        ));
        assert!(PanoptoCredentials::new("user", "").is_err());

        let debug = format!("{:?}", credentials());
        assert!(debug.contains("student"));
        assert!(!debug.contains("hunter2"));
    }

    #[tokio::test]
    async fn test_sign_in_success() {
        let mut mock = MockHttpClient::new();
        mock_sign_in_flow(&mut mock, ASSERTION_PAGE);
        mock.expect_cookie_names()
            .returning(|url| session_cookies(url));

        let authenticator = SamlAuthenticator::new(Arc::new(mock), PanoptoEndpoints::default());
        authenticator.sign_in(&credentials()).await.unwrap();
    }

    #[tokio::test]
    async fn test_sign_in_bad_credentials() {
        let mut mock = MockHttpClient::new();
        mock_sign_in_flow(&mut mock, "<html><p>Incorrect password</p></html>");
        mock.expect_cookie_names()
            .returning(|url| session_cookies(url));

        let authenticator = SamlAuthenticator::new(Arc::new(mock), PanoptoEndpoints::default());
        let err = authenticator.sign_in(&credentials()).await.unwrap_err();

        assert!(matches!(err, PanoptoError::SamlResponseMissing));
        assert!(BridgeError::from(err).is_unauthorized());
    }

    #[tokio::test]
    async fn test_sign_in_requires_panopto_cookie() {
        let mut mock = MockHttpClient::new();
        mock_sign_in_flow(&mut mock, ASSERTION_PAGE);
        mock.expect_cookie_names().returning(|url| {
            if url.starts_with("https://uw.hosted.panopto.com") {
                Vec::new()
            } else {
                session_cookies(url)
            }
        });

        let authenticator = SamlAuthenticator::new(Arc::new(mock), PanoptoEndpoints::default());
        let err = authenticator.sign_in(&credentials()).await.unwrap_err();

        assert!(matches!(err, PanoptoError::MissingCookie { cookie, .. } if cookie == ".ASPXAUTH"));
    }

    #[tokio::test]
    async fn test_sign_in_requires_identity_provider_cookies() {
        let mut mock = MockHttpClient::new();
        mock.expect_execute()
            .times(1)
            .returning(|_| Ok(HttpResponse::new(200, "").with_url(IDP_FORM_URL)));
        mock.expect_cookie_names().returning(|_| Vec::new());

        let authenticator = SamlAuthenticator::new(Arc::new(mock), PanoptoEndpoints::default());
        let err = authenticator.sign_in(&credentials()).await.unwrap_err();

        assert!(matches!(err, PanoptoError::MissingCookie { cookie, .. } if cookie == "_csrf_token"));
    }

    #[tokio::test]
    async fn test_sign_in_network_failure_is_not_auth_error() {
        let mut mock = MockHttpClient::new();
        mock.expect_execute()
            .returning(|_| Err(BridgeError::OperationFailed("Connection refused".to_string())));

        let authenticator = SamlAuthenticator::new(Arc::new(mock), PanoptoEndpoints::default());
        let err = authenticator.sign_in(&credentials()).await.unwrap_err();

        assert!(!BridgeError::from(err).is_unauthorized());
    }
}
