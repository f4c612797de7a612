//! Error normalization
//!
//! Converts every failure source into an `ApiError`:
//! - no response (connect error, timeout) → status 0 + connectivity message
//! - 400 with an `errors` array → `fieldErrors`, last entry per field wins
//! - any other status → server `message` (or a generic one) and `code`
//! - an already normalized error → unchanged

use std::collections::BTreeMap;

use admin_auth::envelope_message;
use bytes::Bytes;
use serde_json::Value;

use crate::error::{ApiError, generic_message};

/// A failed request before normalization.
#[derive(Debug, Clone)]
pub enum Failure {
    /// No response was received.
    Transport { timed_out: bool, detail: String },
    /// The server answered with a non-2xx status.
    Status { status: u16, body: Bytes },
    /// Already in the normalized shape.
    Normalized(ApiError),
}

impl From<ApiError> for Failure {
    fn from(err: ApiError) -> Self {
        Failure::Normalized(err)
    }
}

impl From<admin_auth::Error> for Failure {
    fn from(err: admin_auth::Error) -> Self {
        match err {
            admin_auth::Error::Http(detail) => Failure::Transport {
                timed_out: false,
                detail,
            },
            admin_auth::Error::Timeout(detail) => Failure::Transport {
                timed_out: true,
                detail,
            },
            admin_auth::Error::Rejected { status, body } => Failure::Status {
                status,
                body: Bytes::from(body),
            },
            admin_auth::Error::InvalidResponse(detail) => {
                Failure::Normalized(ApiError::invalid_response(detail))
            }
            other @ (admin_auth::Error::SessionParse(_) | admin_auth::Error::Io(_)) => {
                Failure::Normalized(ApiError::local(format!("Session storage failed: {other}")))
            }
        }
    }
}

/// Convert any failure into the normalized shape.
pub fn normalize(failure: impl Into<Failure>) -> ApiError {
    match failure.into() {
        Failure::Transport { timed_out, .. } => ApiError::network(timed_out),
        Failure::Status { status, body } => from_status(status, &body),
        Failure::Normalized(err) => err,
    }
}

fn from_status(status: u16, body: &[u8]) -> ApiError {
    let parsed: Option<Value> = serde_json::from_slice(body).ok();

    let message = parsed
        .as_ref()
        .and_then(envelope_message)
        .map(str::to_owned)
        .unwrap_or_else(|| generic_message(status).to_owned());

    let code = parsed
        .as_ref()
        .and_then(|v| v.get("code"))
        .and_then(Value::as_str)
        .map(str::to_owned);

    let field_errors = if status == 400 {
        parsed.as_ref().and_then(field_errors)
    } else {
        None
    };

    ApiError {
        status,
        message,
        code,
        field_errors,
    }
}

fn field_errors(body: &Value) -> Option<BTreeMap<String, String>> {
    let entries = body.get("errors")?.as_array()?;
    let mut map = BTreeMap::new();
    for entry in entries {
        let field = entry.get("field").and_then(Value::as_str);
        let message = entry.get("message").and_then(Value::as_str);
        if let (Some(field), Some(message)) = (field, message) {
            map.insert(field.to_owned(), message.to_owned());
        }
    }
    (!map.is_empty()).then_some(map)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ErrorKind, NETWORK_ERROR_MESSAGE};
    use serde_json::json;

    fn status(status: u16, body: Value) -> Failure {
        Failure::Status {
            status,
            body: Bytes::from(body.to_string()),
        }
    }

    #[test]
    fn transport_failure_is_status_zero() {
        let err = normalize(Failure::Transport {
            timed_out: false,
            detail: "connection refused".into(),
        });
        assert_eq!(err.status, 0);
        assert_eq!(err.message, NETWORK_ERROR_MESSAGE);
        assert_eq!(err.kind(), ErrorKind::Transport);
    }

    #[test]
    fn timeout_is_a_transport_failure() {
        let err = normalize(Failure::Transport {
            timed_out: true,
            detail: "operation timed out".into(),
        });
        assert_eq!(err.status, 0);
        assert_eq!(err.code.as_deref(), Some("timeout"));
    }

    #[test]
    fn validation_errors_become_field_map() {
        let err = normalize(status(
            400,
            json!({
                "success": false,
                "message": "Validation failed",
                "errors": [{"field": "email", "message": "invalid"}]
            }),
        ));
        assert_eq!(err.status, 400);
        assert_eq!(err.message, "Validation failed");
        assert_eq!(
            err.field_errors,
            Some(BTreeMap::from([("email".to_string(), "invalid".to_string())]))
        );
    }

    #[test]
    fn repeated_field_keeps_last_message() {
        let err = normalize(status(
            400,
            json!({
                "message": "Validation failed",
                "errors": [
                    {"field": "title", "message": "required"},
                    {"field": "title", "message": "too short"},
                    {"field": "order", "message": "must be positive"}
                ]
            }),
        ));
        assert_eq!(err.field_error("title"), Some("too short"));
        assert_eq!(err.field_error("order"), Some("must be positive"));
    }

    #[test]
    fn bad_request_without_errors_array_has_no_field_map() {
        let err = normalize(status(400, json!({"message": "Malformed JSON"})));
        assert_eq!(err.message, "Malformed JSON");
        assert!(err.field_errors.is_none());
    }

    #[test]
    fn server_message_and_code_are_kept() {
        let err = normalize(status(
            409,
            json!({"success": false, "message": "Slug already exists", "code": "DUPLICATE_SLUG"}),
        ));
        assert_eq!(err.status, 409);
        assert_eq!(err.message, "Slug already exists");
        assert_eq!(err.code.as_deref(), Some("DUPLICATE_SLUG"));
    }

    #[test]
    fn non_json_body_uses_generic_message() {
        let err = normalize(Failure::Status {
            status: 502,
            body: Bytes::from_static(b"<html>Bad Gateway</html>"),
        });
        assert_eq!(err.status, 502);
        assert_eq!(err.message, generic_message(502));
        assert_eq!(err.kind(), ErrorKind::Server);
    }

    #[test]
    fn field_errors_only_apply_to_400() {
        let err = normalize(status(
            422,
            json!({"message": "Unprocessable", "errors": [{"field": "a", "message": "b"}]}),
        ));
        assert!(err.field_errors.is_none());
    }

    #[test]
    fn normalizing_twice_is_identity() {
        let once = normalize(status(
            400,
            json!({"message": "Validation failed", "errors": [{"field": "email", "message": "invalid"}]}),
        ));
        let twice = normalize(once.clone());
        assert_eq!(once, twice);

        let network = ApiError::network(true);
        assert_eq!(normalize(Failure::Normalized(network.clone())), network);
    }

    #[test]
    fn auth_crate_errors_map_onto_taxonomy() {
        let err = normalize(admin_auth::Error::Timeout("slow".into()));
        assert_eq!(err.kind(), ErrorKind::Transport);

        let err = normalize(admin_auth::Error::Rejected {
            status: 401,
            body: r#"{"message":"Refresh token expired"}"#.into(),
        });
        assert_eq!(err.status, 401);
        assert_eq!(err.message, "Refresh token expired");

        let err = normalize(admin_auth::Error::Io("disk full".into()));
        assert_eq!(err.kind(), ErrorKind::Local);
    }
}
