// AirControlBase HTTP client
//
// Owns the session (user id + cookie string) and the debounce window, and
// implements the one authenticated request primitive every endpoint goes
// through. Login lives in `auth.rs`, device endpoints in `devices.rs`.

use std::time::Duration;

use reqwest::StatusCode;
use reqwest::header::COOKIE;
use tracing::{debug, trace, warn};
use url::Url;

use crate::auth::{Credentials, SessionState};
use crate::debounce::{DEFAULT_DEBOUNCE_INTERVAL, DebounceWindow};
use crate::error::Error;
use crate::response::{ApiResponse, Outcome};
use crate::transport::TransportConfig;

/// Production API root.
pub const DEFAULT_BASE_URL: &str = "https://www.aircontrolbase.com";

/// Construction-time settings for a [`SessionClient`].
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: Url,
    pub transport: TransportConfig,
    /// Quiet period after a control command during which listing is skipped.
    pub debounce_interval: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: Url::parse(DEFAULT_BASE_URL).expect("static base URL is valid"),
            transport: TransportConfig::default(),
            debounce_interval: DEFAULT_DEBOUNCE_INTERVAL,
        }
    }
}

impl ClientConfig {
    pub fn with_base_url(mut self, base_url: Url) -> Self {
        self.base_url = base_url;
        self
    }

    pub fn with_debounce_interval(mut self, interval: Duration) -> Self {
        self.debounce_interval = interval;
        self
    }
}

/// Form-encoded request body.
///
/// A user-scoped form gets `userId` filled in when the request is sent,
/// so a retry after re-login carries the fresh id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Form {
    user_scoped: bool,
    fields: Vec<(String, String)>,
}

impl Form {
    pub fn new() -> Self {
        Self::default()
    }

    /// A form whose first field is the session's `userId`.
    pub fn user_scoped() -> Self {
        Self {
            user_scoped: true,
            fields: Vec::new(),
        }
    }

    pub fn field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.push((name.into(), value.into()));
        self
    }

    pub(crate) fn encode<'a>(&'a self, user_id: &'a str) -> Vec<(&'a str, &'a str)> {
        let user = self.user_scoped.then_some(("userId", user_id));
        user.into_iter()
            .chain(self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .collect()
    }
}

/// Result of a single HTTP attempt.
enum Attempt {
    Completed(ApiResponse),
    Expired(String),
}

/// Session-holding client for the AirControlBase cloud API.
///
/// Operations that may touch the session take `&mut self`, so one client
/// runs one logical operation at a time. Wrap it in
/// [`SharedSessionClient`](crate::SharedSessionClient) to share it between tasks.
pub struct SessionClient {
    http: reqwest::Client,
    base_url: Url,
    timeout: Duration,
    credentials: Credentials,
    pub(crate) session: SessionState,
    pub(crate) debounce: DebounceWindow,
}

impl SessionClient {
    /// Create a client, building the HTTP transport from `config`.
    pub fn new(credentials: Credentials, config: ClientConfig) -> Result<Self, Error> {
        let http = config.transport.build_client()?;
        Ok(Self::with_client(http, credentials, config))
    }

    /// Create a client around a pre-built `reqwest::Client`.
    ///
    /// The client must not carry a cookie store; the session cookie is
    /// read from the login response and sent explicitly.
    pub fn with_client(http: reqwest::Client, credentials: Credentials, config: ClientConfig) -> Self {
        Self {
            http,
            base_url: config.base_url,
            timeout: config.transport.timeout,
            credentials,
            session: SessionState::default(),
            debounce: DebounceWindow::new(config.debounce_interval),
        }
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// Current session identity.
    pub fn session(&self) -> &SessionState {
        &self.session
    }

    /// Adopt a session obtained elsewhere (e.g. by another client instance).
    pub fn restore_session(&mut self, session: SessionState) {
        self.session = session;
    }

    pub fn debounce(&self) -> &DebounceWindow {
        &self.debounce
    }

    pub(crate) fn http(&self) -> &reqwest::Client {
        &self.http
    }

    pub(crate) fn endpoint_url(&self, path: &str) -> Result<Url, Error> {
        self.base_url.join(path).map_err(Error::InvalidUrl)
    }

    pub(crate) fn transport_error(&self, err: reqwest::Error) -> Error {
        Error::from_transport(err, self.timeout)
    }

    // ── Request primitive ────────────────────────────────────────────

    /// POST `form` to `endpoint` with the session cookie, re-authenticating once on expiry.
    pub async fn request(&mut self, endpoint: &str, form: &Form) -> Result<ApiResponse, Error> {
        self.request_with_retry(endpoint, form, true).await
    }

    /// Like [`request`](Self::request), with control over the re-login retry.
    ///
    /// Without a user id the client logs in first. An expiry signal (HTTP
    /// 401/403, body code 401/403, or a re-login message) clears the
    /// session, logs in and sends the request once more with retry
    /// disabled; a second expiry is an [`Error::Authentication`].
    pub async fn request_with_retry(
        &mut self,
        endpoint: &str,
        form: &Form,
        allow_retry: bool,
    ) -> Result<ApiResponse, Error> {
        if self.session.user_id().is_none() {
            debug!(endpoint, "no session, logging in first");
            self.login().await?;
        }

        let url = self.endpoint_url(endpoint)?;
        let mut allow_retry = allow_retry;

        loop {
            match self.send(&url, form).await? {
                Attempt::Completed(body) => return Ok(body),
                Attempt::Expired(message) if allow_retry => {
                    warn!(endpoint, %message, "session expired, re-authenticating");
                    self.session.clear();
                    self.login().await?;
                    allow_retry = false;
                }
                Attempt::Expired(message) => {
                    return Err(Error::Authentication { message });
                }
            }
        }
    }

    /// One HTTP round trip, classified.
    async fn send(&self, url: &Url, form: &Form) -> Result<Attempt, Error> {
        let user_id = self.session.user_id().unwrap_or_default();

        // `form` also sets `Content-Type: application/x-www-form-urlencoded`.
        let mut builder = self.http.post(url.clone()).form(&form.encode(user_id));
        if let Some(token) = self.session.token().filter(|t| !t.is_empty()) {
            builder = builder.header(COOKIE, token);
        }

        debug!("POST {}", url);
        let resp = builder.send().await.map_err(|e| self.transport_error(e))?;
        let status = resp.status();

        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Ok(Attempt::Expired(format!(
                "session rejected (HTTP {})",
                status.as_u16()
            )));
        }
        if status != StatusCode::OK {
            return Err(Error::HttpStatus {
                status: status.as_u16(),
            });
        }

        let body = resp.text().await.map_err(|e| self.transport_error(e))?;
        trace!(%body, "response body");
        let envelope = ApiResponse::from_body(&body)?;

        match envelope.outcome() {
            Outcome::Success => Ok(Attempt::Completed(envelope)),
            Outcome::AuthExpired { message } => Ok(Attempt::Expired(message)),
            Outcome::Failure { message } => Err(Error::Api {
                message,
                code: envelope.code_text(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_scoped_form_puts_user_id_first() {
        let form = Form::user_scoped()
            .field("control", "{}")
            .field("operation", "{}");
        assert_eq!(
            form.encode("u-42"),
            vec![("userId", "u-42"), ("control", "{}"), ("operation", "{}")]
        );
    }

    #[test]
    fn plain_form_has_no_user_id() {
        let form = Form::new().field("a", "1");
        assert_eq!(form.encode("ignored"), vec![("a", "1")]);
    }

    #[test]
    fn default_config_points_at_production() {
        let config = ClientConfig::default();
        assert_eq!(config.base_url.as_str(), "https://www.aircontrolbase.com/");
        assert_eq!(config.debounce_interval, Duration::from_millis(5000));
        assert_eq!(config.transport.timeout, Duration::from_secs(10));
    }
}
