//! Error taxonomy shared across the resolution and planning boundary.
//!
//! Failures travel as data, never as control flow: the resolver returns a
//! [`ResolveError`] in place of a record, and the plan builder copies it into
//! an error plan. Every code maps to a stable dotted string on the wire.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable, dotted error codes grouped by origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorCode {
    #[serde(rename = "link.invalid")]
    LinkInvalid,
    #[serde(rename = "link.unsupported")]
    LinkUnsupported,

    #[serde(rename = "service.disabled")]
    ServiceDisabled,
    #[serde(rename = "service.not_supported")]
    ServiceNotSupported,
    #[serde(rename = "service.unsupported")]
    ServiceUnsupported,
    #[serde(rename = "service.audio_not_supported")]
    ServiceAudioNotSupported,

    #[serde(rename = "fetch.fail")]
    FetchFail,
    #[serde(rename = "fetch.rate")]
    FetchRate,
    #[serde(rename = "fetch.critical")]
    FetchCritical,
    #[serde(rename = "fetch.empty")]
    FetchEmpty,
    #[serde(rename = "fetch.short_link")]
    FetchShortLink,

    #[serde(rename = "content.too_long")]
    ContentTooLong,
    #[serde(rename = "content.post.unavailable")]
    ContentPostUnavailable,
    #[serde(rename = "content.post.age")]
    ContentPostAge,
    #[serde(rename = "content.video.unavailable")]
    ContentVideoUnavailable,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::LinkInvalid => "link.invalid",
            ErrorCode::LinkUnsupported => "link.unsupported",
            ErrorCode::ServiceDisabled => "service.disabled",
            ErrorCode::ServiceNotSupported => "service.not_supported",
            ErrorCode::ServiceUnsupported => "service.unsupported",
            ErrorCode::ServiceAudioNotSupported => "service.audio_not_supported",
            ErrorCode::FetchFail => "fetch.fail",
            ErrorCode::FetchRate => "fetch.rate",
            ErrorCode::FetchCritical => "fetch.critical",
            ErrorCode::FetchEmpty => "fetch.empty",
            ErrorCode::FetchShortLink => "fetch.short_link",
            ErrorCode::ContentTooLong => "content.too_long",
            ErrorCode::ContentPostUnavailable => "content.post.unavailable",
            ErrorCode::ContentPostAge => "content.post.age",
            ErrorCode::ContentVideoUnavailable => "content.video.unavailable",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Interpolation data attached to an error code.
///
/// Only ever carries display hints (a service name, a duration limit); raw
/// internal messages are never part of the wire contract.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ErrorContext {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u64>,
}

impl ErrorContext {
    pub fn service(name: impl Into<String>) -> Self {
        Self {
            service: Some(name.into()),
            limit: None,
        }
    }

    pub fn limit(limit: u64) -> Self {
        Self {
            service: None,
            limit: Some(limit),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.service.is_none() && self.limit.is_none()
    }
}

/// A typed failure produced by the resolver or the plan builder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, thiserror::Error)]
#[error("{code}")]
pub struct ResolveError {
    pub code: ErrorCode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<ErrorContext>,
    /// A critical failure is not request-specific (e.g. an upstream API shape
    /// changed) and is logged distinctly; the wire shape stays the same.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub critical: bool,
}

impl ResolveError {
    pub fn new(code: ErrorCode) -> Self {
        Self {
            code,
            context: None,
            critical: false,
        }
    }

    pub fn with_context(code: ErrorCode, context: ErrorContext) -> Self {
        Self {
            code,
            context: Some(context),
            critical: false,
        }
    }

    pub fn critical(code: ErrorCode) -> Self {
        Self {
            code,
            context: None,
            critical: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_serialize_as_dotted_strings() {
        let json = serde_json::to_string(&ErrorCode::ServiceNotSupported).unwrap();
        assert_eq!(json, "\"service.not_supported\"");

        let back: ErrorCode = serde_json::from_str("\"content.post.age\"").unwrap();
        assert_eq!(back, ErrorCode::ContentPostAge);
    }

    #[test]
    fn error_context_omits_absent_fields() {
        let err = ResolveError::with_context(
            ErrorCode::ContentTooLong,
            ErrorContext::limit(600),
        );
        let value = serde_json::to_value(&err).unwrap();
        assert_eq!(value["code"], "content.too_long");
        assert_eq!(value["context"]["limit"], 600);
        assert!(value["context"].get("service").is_none());
        assert!(value.get("critical").is_none());
    }
}
