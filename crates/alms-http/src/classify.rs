//! Error classification.
//!
//! Every failed call is mapped to exactly one [`ErrorKind`], checked in
//! priority order: no response → `Network`; 401/403 → `Auth`; other 4xx with
//! a structured payload → `Validation`; anything else → `Server`.

use serde_json::Value;

use crate::error::{ErrorKind, ErrorRecord};
use crate::transport::TransportError;

pub const NETWORK_MESSAGE: &str = "Unable to connect to server. Please check your connection.";
pub const AUTH_MESSAGE: &str = "Your session has expired. Please log in again.";
pub const SERVER_MESSAGE: &str = "Something went wrong. Please try again.";

/// What went wrong with a call, before classification.
#[derive(Debug)]
pub enum Failure {
    /// The transport never produced a response.
    NoResponse(TransportError),
    /// A response arrived but was a rejection (non-2xx, or a 2xx envelope
    /// with `status: "error"`).
    Rejected { status: u16, body: Value },
}

/// Classify a failed call.
#[must_use]
pub fn classify(failure: &Failure) -> ErrorRecord {
    match failure {
        Failure::NoResponse(error) => {
            tracing::debug!(%error, "no response from backend");
            ErrorRecord::new(ErrorKind::Network, NETWORK_MESSAGE.to_string(), None)
        }
        Failure::Rejected { status, body } => classify_rejection(*status, body),
    }
}

fn classify_rejection(status: u16, body: &Value) -> ErrorRecord {
    if status == 401 || status == 403 {
        let message = body_message(body).unwrap_or_else(|| AUTH_MESSAGE.to_string());
        return ErrorRecord::new(ErrorKind::Auth, message, Some(status));
    }

    if (400..500).contains(&status)
        && let Some(message) = structured_message(body)
    {
        return ErrorRecord::new(ErrorKind::Validation, message, Some(status));
    }

    let exception = format!("Request failed with status code {status}");
    let message = body_message(body)
        .or_else(|| text_body(body))
        .unwrap_or(exception);
    ErrorRecord::new(ErrorKind::Server, message, Some(status))
}

/// A 2xx response whose payload does not have a shape the caller knows.
#[must_use]
pub fn invalid_payload(message: impl Into<String>) -> ErrorRecord {
    ErrorRecord::new(ErrorKind::Validation, message.into(), None)
}

/// An internal failure with no response to draw a message from.
#[must_use]
pub fn internal(message: Option<String>) -> ErrorRecord {
    let message = message
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| SERVER_MESSAGE.to_string());
    ErrorRecord::new(ErrorKind::Server, message, None)
}

/// `message` (or `error`) from an envelope, if it is a non-empty string.
#[must_use]
pub fn body_message(body: &Value) -> Option<String> {
    ["message", "error"]
        .iter()
        .filter_map(|key| body.get(key).and_then(Value::as_str))
        .map(str::trim)
        .find(|m| !m.is_empty())
        .map(ToString::to_string)
}

/// The server's own explanation of a rejected request: the envelope
/// message, else the `errors` list joined.
fn structured_message(body: &Value) -> Option<String> {
    if let Some(message) = body_message(body) {
        return Some(message);
    }
    let errors = body.get("errors")?.as_array()?;
    let parts: Vec<&str> = errors
        .iter()
        .filter_map(|entry| {
            entry
                .as_str()
                .or_else(|| entry.get("msg").and_then(Value::as_str))
                .or_else(|| entry.get("message").and_then(Value::as_str))
        })
        .filter(|m| !m.is_empty())
        .collect();
    if parts.is_empty() {
        None
    } else {
        Some(parts.join("; "))
    }
}

fn text_body(body: &Value) -> Option<String> {
    body.as_str()
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(ToString::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    fn rejected(status: u16, body: Value) -> ErrorRecord {
        classify(&Failure::Rejected { status, body })
    }

    #[rstest]
    #[case::timeout(TransportError::Timeout)]
    #[case::refused(TransportError::Connect("connection refused".into()))]
    #[case::other(TransportError::Other("dns failure".into()))]
    fn no_response_is_network(#[case] error: TransportError) {
        let record = classify(&Failure::NoResponse(error));
        assert_eq!(record.kind(), ErrorKind::Network);
        assert!(record.message().contains("connect"));
        assert_eq!(record.status(), None);
    }

    #[rstest]
    #[case(401)]
    #[case(403)]
    fn unauthorized_and_forbidden_are_auth(#[case] status: u16) {
        let record = rejected(status, json!({"status": "error", "message": "Token invalid"}));
        assert_eq!(record.kind(), ErrorKind::Auth);
        assert_eq!(record.message(), "Token invalid");
        assert_eq!(record.status(), Some(status));
    }

    #[test]
    fn auth_without_body_uses_default() {
        let record = rejected(401, Value::Null);
        assert_eq!(record.message(), AUTH_MESSAGE);
    }

    #[test]
    fn structured_4xx_is_validation_verbatim() {
        let record = rejected(
            422,
            json!({"status": "error", "message": "Amount must be at least 1"}),
        );
        assert_eq!(record.kind(), ErrorKind::Validation);
        assert_eq!(record.message(), "Amount must be at least 1");
    }

    #[test]
    fn errors_list_is_joined() {
        let record = rejected(
            400,
            json!({"errors": [{"msg": "Email is required"}, {"message": "Password too short"}]}),
        );
        assert_eq!(record.kind(), ErrorKind::Validation);
        assert_eq!(record.message(), "Email is required; Password too short");
    }

    #[test]
    fn unstructured_4xx_is_server() {
        let record = rejected(404, Value::Null);
        assert_eq!(record.kind(), ErrorKind::Server);
        assert_eq!(record.message(), "Request failed with status code 404");
    }

    #[rstest]
    #[case::body_message(json!({"message": "Database unavailable"}), "Database unavailable")]
    #[case::error_field(json!({"error": "Upstream timeout"}), "Upstream timeout")]
    #[case::text_body(json!("Bad Gateway"), "Bad Gateway")]
    #[case::nothing(Value::Null, "Request failed with status code 502")]
    fn server_message_fallback_chain(#[case] body: Value, #[case] expected: &str) {
        let record = rejected(502, body);
        assert_eq!(record.kind(), ErrorKind::Server);
        assert_eq!(record.message(), expected);
    }

    #[test]
    fn internal_never_empty() {
        assert_eq!(internal(Some("  ".into())).message(), SERVER_MESSAGE);
        assert_eq!(internal(None).message(), SERVER_MESSAGE);
        assert_eq!(internal(Some("broken".into())).message(), "broken");
    }
}
