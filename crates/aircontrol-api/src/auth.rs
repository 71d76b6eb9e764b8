// Session authentication
//
// Form-encoded login against `/web/user/login`. A successful login yields
// the account's user id (from the body) and the raw `Set-Cookie` values,
// which are replayed verbatim as the `Cookie` header afterwards.

use std::fmt;

use reqwest::StatusCode;
use reqwest::header::{HeaderMap, SET_COOKIE};
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::client::SessionClient;
use crate::error::Error;
use crate::response::ApiResponse;

pub(crate) const LOGIN_PATH: &str = "/web/user/login";

/// Account credentials. The password is never printed.
#[derive(Debug, Clone)]
pub struct Credentials {
    email: String,
    password: SecretString,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: SecretString) -> Self {
        Self {
            email: email.into(),
            password,
        }
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn password(&self) -> &SecretString {
        &self.password
    }
}

/// Session identity: user id plus the cookie string presented on each call.
///
/// Both halves change together: [`establish`](Self::establish) after a
/// login, [`clear`](Self::clear) on expiry.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct SessionState {
    user_id: Option<String>,
    token: Option<String>,
}

impl SessionState {
    /// A session that has already been established.
    pub fn new(user_id: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            user_id: Some(user_id.into()),
            token: Some(token.into()),
        }
    }

    pub fn user_id(&self) -> Option<&str> {
        self.user_id.as_deref()
    }

    /// Joined `Set-Cookie` values from login. Empty if the server sent none.
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    /// Both user id and token present.
    pub fn is_established(&self) -> bool {
        self.user_id.is_some() && self.token.is_some()
    }

    pub(crate) fn establish(&mut self, user_id: String, token: String) {
        *self = Self {
            user_id: Some(user_id),
            token: Some(token),
        };
    }

    pub(crate) fn clear(&mut self) {
        *self = Self::default();
    }
}

impl fmt::Debug for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionState")
            .field("user_id", &self.user_id)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl SessionClient {
    /// Log in with the stored credentials and replace the session.
    ///
    /// HTTP 401/403 and any non-success body are [`Error::Authentication`];
    /// a success body without `result.id` is too. On failure the previous
    /// session is left untouched.
    pub async fn login(&mut self) -> Result<(), Error> {
        let url = self.endpoint_url(LOGIN_PATH)?;
        debug!(email = %self.credentials().email(), "logging in at {}", url);

        let interval_ms = self.debounce.interval_ms().to_string();
        let form = [
            ("account", self.credentials().email()),
            ("password", self.credentials().password().expose_secret()),
            ("avoidRefreshStatusOnUpdateInMs", interval_ms.as_str()),
        ];

        let resp = self
            .http()
            .post(url)
            .form(&form[..])
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = resp.status();
        debug!(status = status.as_u16(), "login response");

        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(Error::Authentication {
                message: format!("login rejected (HTTP {})", status.as_u16()),
            });
        }
        if status != StatusCode::OK {
            return Err(Error::HttpStatus {
                status: status.as_u16(),
            });
        }

        let cookies = session_cookies(resp.headers());
        let body = resp.text().await.map_err(|e| self.transport_error(e))?;
        let envelope = ApiResponse::from_body(&body)?;

        if !envelope.is_success() {
            let message = envelope.failure_message();
            warn!(%message, "login failed");
            return Err(Error::Authentication { message });
        }

        let user_id = envelope
            .result
            .as_ref()
            .and_then(|r| r.get("id"))
            .and_then(identity_text)
            .ok_or_else(|| Error::Authentication {
                message: "no user id in login response".into(),
            })?;

        if cookies.is_empty() {
            warn!("login response carried no session cookies");
        }
        let token = cookies.join("; ");

        info!(%user_id, "logged in to AirControlBase");
        self.session.establish(user_id, token);
        Ok(())
    }

    /// Log in unless both user id and session token are present.
    pub async fn ensure_authenticated(&mut self) -> Result<(), Error> {
        if !self.session.is_established() {
            warn!("not authenticated or session incomplete, logging in");
            self.login().await?;
        }
        Ok(())
    }
}

/// Every `Set-Cookie` value, verbatim, in header order.
fn session_cookies(headers: &HeaderMap) -> Vec<String> {
    headers
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .map(String::from)
        .collect()
}

/// The login id arrives as a string or a number.
fn identity_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use reqwest::header::HeaderValue;
    use serde_json::json;

    use super::*;

    #[test]
    fn establish_and_clear_move_together() {
        let mut session = SessionState::default();
        assert!(!session.is_established());

        session.establish("user-1".into(), "JSESSIONID=abc".into());
        assert_eq!(session.user_id(), Some("user-1"));
        assert_eq!(session.token(), Some("JSESSIONID=abc"));
        assert!(session.is_established());

        session.clear();
        assert_eq!(session, SessionState::default());
    }

    #[test]
    fn debug_redacts_token() {
        let session = SessionState::new("user-1", "JSESSIONID=secret");
        let printed = format!("{session:?}");
        assert!(printed.contains("user-1"));
        assert!(!printed.contains("secret"));
    }

    #[test]
    fn credentials_debug_hides_password() {
        let creds = Credentials::new("a@b.c", SecretString::from("hunter2".to_owned()));
        assert!(!format!("{creds:?}").contains("hunter2"));
        assert_eq!(creds.email(), "a@b.c");
    }

    #[test]
    fn cookies_collected_in_order() {
        let mut headers = HeaderMap::new();
        headers.append(SET_COOKIE, HeaderValue::from_static("JSESSIONID=abc; Path=/"));
        headers.append(SET_COOKIE, HeaderValue::from_static("lang=zh"));
        assert_eq!(
            session_cookies(&headers),
            vec!["JSESSIONID=abc; Path=/".to_owned(), "lang=zh".to_owned()]
        );
        assert!(session_cookies(&HeaderMap::new()).is_empty());
    }

    #[test]
    fn identity_accepts_string_and_number() {
        assert_eq!(identity_text(&json!("u1")), Some("u1".into()));
        assert_eq!(identity_text(&json!(1024)), Some("1024".into()));
        assert_eq!(identity_text(&json!("")), None);
        assert_eq!(identity_text(&json!(null)), None);
    }
}
