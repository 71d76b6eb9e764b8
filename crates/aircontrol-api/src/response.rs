// Response envelope normalization
//
// Every AirControlBase endpoint answers with `{ code, msg, result }`.
// Success and session expiry are both signalled redundantly (string or
// numeric code, or a fixed localized message), so the envelope is reduced
// to a single `Outcome` here and nowhere else.

use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Error;

/// `msg` value the server sends on success ("operation successful").
pub const SUCCESS_MESSAGE: &str = "操作成功";

/// `msg` values meaning the session is gone and the user must log in again.
pub const RELOGIN_MESSAGES: &[&str] = &[
    "请重新登录",
    "登录已过期，请重新登录",
    "登录失效，请重新登录",
    "用户未登录",
];

/// Application status code, kept as the raw JSON value.
///
/// The server mixes `"200"` and `200`. Text codes must match exactly;
/// numbers compare numerically, so `200.0` is `200` but `"0200"` is not.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResponseCode(pub Value);

impl ResponseCode {
    pub fn is(&self, expected: i32) -> bool {
        match &self.0 {
            Value::String(s) => *s == format!("{expected}"),
            Value::Number(n) => {
                n.as_i64() == Some(i64::from(expected))
                    || n.as_f64()
                        .is_some_and(|f| (f - f64::from(expected)).abs() < f64::EPSILON)
            }
            _ => false,
        }
    }
}

impl fmt::Display for ResponseCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            Value::String(s) => f.write_str(s),
            other => write!(f, "{other}"),
        }
    }
}

/// The `{ code, msg, message, result }` envelope.
///
/// Unknown top-level fields are kept in `extra` so the body handed back
/// to callers is the one the server sent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<ResponseCode>,
    /// Only read as text when it is a JSON string.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub msg: Option<Value>,
    /// Alternate message field used by some error responses.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

/// Normalized meaning of a response envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Success,
    AuthExpired { message: String },
    Failure { message: String },
}

impl ApiResponse {
    /// Parse a raw body. Anything that isn't a JSON object is a
    /// [`Error::Deserialization`].
    pub fn from_body(body: &str) -> Result<Self, Error> {
        serde_json::from_str(body).map_err(|e| {
            let preview: String = body.chars().take(200).collect();
            Error::Deserialization {
                message: format!("{e} (body preview: {preview:?})"),
                body: body.to_owned(),
            }
        })
    }

    /// `msg` when the server sent it as a string.
    pub fn msg_text(&self) -> Option<&str> {
        self.msg.as_ref().and_then(Value::as_str)
    }

    /// `message` when the server sent it as a string.
    pub fn message_text(&self) -> Option<&str> {
        self.message.as_ref().and_then(Value::as_str)
    }

    /// Code `200` (either encoding) or the localized success message.
    pub fn is_success(&self) -> bool {
        self.code.as_ref().is_some_and(|c| c.is(200)) || self.msg_text() == Some(SUCCESS_MESSAGE)
    }

    /// Code `401`/`403` or one of the "please log in again" messages.
    pub fn is_auth_expired(&self) -> bool {
        self.code.as_ref().is_some_and(|c| c.is(401) || c.is(403))
            || self.msg_text().is_some_and(|m| RELOGIN_MESSAGES.contains(&m))
    }

    /// Best human-readable message: `msg`, then `message`, then one naming the code.
    pub fn failure_message(&self) -> String {
        fn non_empty(m: Option<&str>) -> Option<&str> {
            m.filter(|m| !m.is_empty())
        }

        non_empty(self.msg_text())
            .or_else(|| non_empty(self.message_text()))
            .map_or_else(
                || {
                    let code = self
                        .code
                        .as_ref()
                        .map_or_else(|| "none".to_owned(), ToString::to_string);
                    format!("Unknown error (code: {code})")
                },
                str::to_owned,
            )
    }

    /// Success takes precedence over expiry markers.
    pub fn outcome(&self) -> Outcome {
        if self.is_success() {
            Outcome::Success
        } else if self.is_auth_expired() {
            Outcome::AuthExpired {
                message: self.failure_message(),
            }
        } else {
            Outcome::Failure {
                message: self.failure_message(),
            }
        }
    }

    /// The code as text, for error reporting.
    pub fn code_text(&self) -> Option<String> {
        self.code.as_ref().map(ToString::to_string)
    }

    /// Deserialize the `result` payload. A missing or `null` result becomes `T::default()`.
    pub fn result_as<T: DeserializeOwned + Default>(&self) -> Result<T, Error> {
        match &self.result {
            None | Some(Value::Null) => Ok(T::default()),
            Some(value) => serde_json::from_value(value.clone()).map_err(|e| Error::Deserialization {
                message: format!("unexpected result payload: {e}"),
                body: value.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    fn parse(value: &Value) -> ApiResponse {
        ApiResponse::from_body(&value.to_string()).unwrap()
    }

    #[test]
    fn success_accepts_string_and_numeric_codes() {
        assert!(parse(&json!({"code": "200"})).is_success());
        assert!(parse(&json!({"code": 200})).is_success());
        assert!(parse(&json!({"code": "500", "msg": SUCCESS_MESSAGE})).is_success());
        assert!(!parse(&json!({"code": "500", "msg": "busy"})).is_success());
        assert!(!parse(&json!({})).is_success());
    }

    #[test]
    fn expiry_signals() {
        assert_eq!(
            parse(&json!({"code": 401, "msg": "session expired"})).outcome(),
            Outcome::AuthExpired {
                message: "session expired".into()
            }
        );
        assert!(parse(&json!({"code": "403"})).is_auth_expired());
        assert!(parse(&json!({"code": "500", "msg": "请重新登录"})).is_auth_expired());
        assert!(!parse(&json!({"code": "500", "msg": "device busy"})).is_auth_expired());
    }

    #[test]
    fn success_wins_over_relogin_marker() {
        let resp = parse(&json!({"code": 200, "msg": "用户未登录"}));
        assert_eq!(resp.outcome(), Outcome::Success);
    }

    #[test]
    fn failure_message_fallback_chain() {
        let with_msg = parse(&json!({"code": "500", "msg": "busy", "message": "other"}));
        assert_eq!(with_msg.failure_message(), "busy");

        let with_message = parse(&json!({"code": "500", "message": "device offline"}));
        assert_eq!(with_message.failure_message(), "device offline");

        let bare = parse(&json!({"code": 500}));
        assert_eq!(bare.failure_message(), "Unknown error (code: 500)");
        assert_eq!(
            bare.outcome(),
            Outcome::Failure {
                message: "Unknown error (code: 500)".into()
            }
        );

        let empty = parse(&json!({}));
        assert_eq!(empty.failure_message(), "Unknown error (code: none)");
    }

    #[test]
    fn text_codes_match_exactly() {
        for code in ["0200", "+200", " 200", "200.0"] {
            let resp = parse(&json!({ "code": code }));
            assert!(!resp.is_success(), "{code:?} counted as success");
        }
        for code in ["0401", "+403"] {
            let resp = parse(&json!({ "code": code }));
            assert!(!resp.is_auth_expired(), "{code:?} counted as expiry");
        }
        assert_eq!(
            parse(&json!({"code": "0200"})).outcome(),
            Outcome::Failure {
                message: "Unknown error (code: 0200)".into()
            }
        );
    }

    #[test]
    fn integral_float_codes_compare_numerically() {
        let ok = ApiResponse::from_body(r#"{"code":200.0,"result":{}}"#).unwrap();
        assert_eq!(ok.outcome(), Outcome::Success);

        let expired = ApiResponse::from_body(r#"{"code":401.0}"#).unwrap();
        assert!(expired.is_auth_expired());

        let odd = ApiResponse::from_body(r#"{"code":200.5}"#).unwrap();
        assert!(!odd.is_success());
    }

    #[test]
    fn non_string_messages_are_not_messages() {
        let ok = parse(&json!({"code": "200", "msg": 0}));
        assert_eq!(ok.outcome(), Outcome::Success);

        let failed = parse(&json!({"code": 500, "msg": ["busy"], "message": "device offline"}));
        assert_eq!(failed.failure_message(), "device offline");

        let bare = parse(&json!({"code": 500, "msg": null, "message": {"k": 1}}));
        assert_eq!(bare.failure_message(), "Unknown error (code: 500)");
    }

    #[test]
    fn odd_code_types_do_not_break_parsing() {
        let resp = parse(&json!({"code": true, "msg": SUCCESS_MESSAGE}));
        assert_eq!(resp.outcome(), Outcome::Success);
        assert_eq!(resp.code_text().as_deref(), Some("true"));
    }

    #[test]
    fn non_json_body_is_deserialization_error() {
        let err = ApiResponse::from_body("<html>502 Bad Gateway</html>").unwrap_err();
        assert!(matches!(err, Error::Deserialization { .. }), "got {err:?}");
    }

    #[test]
    fn unknown_fields_survive_round_trip() {
        let body = json!({"code": "200", "msg": SUCCESS_MESSAGE, "traceId": "abc", "result": {"id": 7}});
        let resp = parse(&body);
        assert_eq!(serde_json::to_value(&resp).unwrap(), body);
    }
}
