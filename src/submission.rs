//! Form submissions and their field-level validation errors.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use regex::Regex;
use serde::Serialize;
use serde_json::json;

static USERNAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_]{3,20}$").unwrap());

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap());

/// A parsed form post. `value` is only present when the payload passed
/// validation and nothing has been flagged on `error` since.
#[derive(Debug, Clone, Serialize)]
pub struct Submission<T> {
    pub payload: BTreeMap<String, String>,
    pub error: BTreeMap<String, String>,
    #[serde(skip)]
    pub value: Option<T>,
}

impl<T> Submission<T> {
    pub fn new(payload: BTreeMap<String, String>) -> Self {
        Self {
            payload,
            error: BTreeMap::new(),
            value: None,
        }
    }

    /// Trimmed, non-empty payload value for `field`.
    pub fn field(&self, field: &str) -> Option<&str> {
        self.payload
            .get(field)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    /// Like [`Submission::field`], recording `message` when the field is absent.
    pub fn require(&mut self, field: &str, message: &str) -> Option<String> {
        let value = self.field(field).map(str::to_string);
        if value.is_none() {
            self.add_error(field, message);
        }
        value
    }

    /// Flag `field`. The first message recorded for a field wins.
    pub fn add_error(&mut self, field: &str, message: &str) {
        self.error
            .entry(field.to_string())
            .or_insert_with(|| message.to_string());
        self.value = None;
    }

    pub fn is_valid(&self) -> bool {
        self.error.is_empty()
    }

    /// Accept `value` if no field has been flagged.
    pub fn accept(mut self, value: T) -> Self {
        if self.is_valid() {
            self.value = Some(value);
        }
        self
    }

    /// 400 response carrying the submission back to the form.
    pub fn reply(&self) -> Response {
        (
            StatusCode::BAD_REQUEST,
            Json(json!({ "status": "error", "submission": self })),
        )
            .into_response()
    }
}

pub fn is_username(s: &str) -> bool {
    USERNAME_RE.is_match(s)
}

pub fn is_email(s: &str) -> bool {
    s.len() <= 254 && EMAIL_RE.is_match(s)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn require_flags_blank_fields() {
        let mut submission: Submission<()> = Submission::new(payload(&[("code", "  ")]));
        assert_eq!(submission.require("code", "Code is required"), None);
        assert_eq!(submission.require("target", "Target is required"), None);
        assert_eq!(submission.error["code"], "Code is required");
        assert_eq!(submission.error["target"], "Target is required");
        assert!(!submission.is_valid());
    }

    #[test]
    fn add_error_clears_value_and_keeps_first_message() {
        let submission: Submission<u8> = Submission::new(payload(&[])).accept(1);
        assert_eq!(submission.value, Some(1));

        let mut submission = submission;
        submission.add_error("code", "Invalid code");
        submission.add_error("code", "Something else");
        assert_eq!(submission.value, None);
        assert_eq!(submission.error["code"], "Invalid code");
    }

    #[test]
    fn accept_refuses_invalid_submission() {
        let mut submission: Submission<u8> = Submission::new(payload(&[]));
        submission.add_error("code", "Invalid code");
        assert_eq!(submission.accept(1).value, None);
    }

    #[test]
    fn username_and_email_shapes() {
        assert!(is_username("alice"));
        assert!(is_username("kody_2"));
        assert!(!is_username("al"));
        assert!(!is_username("alice@example.com"));
        assert!(!is_username("a".repeat(21).as_str()));

        assert!(is_email("alice@example.com"));
        assert!(!is_email("alice@"));
        assert!(!is_email("alice example@x.com"));
    }
}
