//! The canonical error body
//!
//! Every handler, built-in or not, ends up producing the same four fields:
//!
//! ```text
//! { "type": <uri>, "title": <string>, "status": <int>, "detail": <string, optional> }
//! ```

use crate::error::ConfigError;
use axum::http::StatusCode;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

pub mod codec;

pub use codec::{Format, decode_json, decode_xml, encode};

/// Default `type` URI template; `{code}` is replaced with the status code.
pub const DEFAULT_TYPE_TEMPLATE: &str = "http://httpstatus.es/{code}";

const CODE_PLACEHOLDER: &str = "{code}";

fn serialize_status<S>(status: &StatusCode, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_u16(status.as_u16())
}

fn deserialize_status<'de, D>(deserializer: D) -> Result<StatusCode, D::Error>
where
    D: Deserializer<'de>,
{
    let code = u16::deserialize(deserializer)?;
    if !is_valid_status(code) {
        return Err(serde::de::Error::custom(format!(
            "status {} is outside 100-599",
            code
        )));
    }
    StatusCode::from_u16(code).map_err(serde::de::Error::custom)
}

pub(crate) fn is_valid_status(code: u16) -> bool {
    (100..=599).contains(&code)
}

/// Error body sent to the client. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename = "problem")]
pub struct ErrorResponse {
    #[serde(rename = "type")]
    type_uri: String,
    title: String,
    #[serde(serialize_with = "serialize_status", deserialize_with = "deserialize_status")]
    status: StatusCode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    detail: Option<String>,
}

impl ErrorResponse {
    /// Start a response for `status`; the usual entry point for handlers.
    pub fn builder(status: StatusCode) -> ErrorResponseBuilder {
        ErrorResponseBuilder::new(status)
    }

    pub fn type_uri(&self) -> &str {
        &self.type_uri
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn detail(&self) -> Option<&str> {
        self.detail.as_deref()
    }

    pub(crate) fn check_invariants(&self) -> Result<(), String> {
        if self.type_uri.is_empty() {
            return Err("type is empty".to_string());
        }
        if self.title.is_empty() {
            return Err("title is empty".to_string());
        }
        Ok(())
    }
}

/// A not yet finalised [`ErrorResponse`], as returned by handlers.
///
/// Title and type are optional here. Whatever is left unset is derived from
/// the *final* status when the resolver builds the response, so a status
/// override also changes a defaulted title. An explicit title is kept as is.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use]
pub struct ErrorResponseBuilder {
    status: StatusCode,
    title: Option<String>,
    type_uri: Option<String>,
    detail: Option<String>,
}

impl ErrorResponseBuilder {
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            title: None,
            type_uri: None,
            detail: None,
        }
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn type_uri(mut self, type_uri: impl Into<String>) -> Self {
        self.type_uri = Some(type_uri.into());
        self
    }

    pub fn detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn has_explicit_title(&self) -> bool {
        self.title.is_some()
    }

    /// Finalise against `template`.
    ///
    /// A status outside 100-599 is replaced with 500, and empty strings count
    /// as unset, so the result always satisfies the body's invariants.
    pub fn build(self, template: &TypeTemplate) -> ErrorResponse {
        let status = if is_valid_status(self.status.as_u16()) {
            self.status
        } else {
            tracing::warn!(
                "Handler produced out-of-range status {}; using 500",
                self.status.as_u16()
            );
            StatusCode::INTERNAL_SERVER_ERROR
        };

        let title = self
            .title
            .filter(|title| !title.is_empty())
            .unwrap_or_else(|| reason_phrase(status).to_string());
        let type_uri = self
            .type_uri
            .filter(|type_uri| !type_uri.is_empty())
            .unwrap_or_else(|| template.expand(status));

        ErrorResponse {
            type_uri,
            title,
            status,
            detail: self.detail,
        }
    }
}

/// URI template for the default `type` field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeTemplate(String);

impl TypeTemplate {
    pub fn new(template: impl Into<String>) -> crate::Result<Self> {
        let template = template.into();
        if !template.contains(CODE_PLACEHOLDER) {
            return Err(ConfigError::InvalidTypeTemplate(template));
        }
        Ok(Self(template))
    }

    pub fn expand(&self, status: StatusCode) -> String {
        self.0.replace(CODE_PLACEHOLDER, status.as_str())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for TypeTemplate {
    fn default() -> Self {
        Self(DEFAULT_TYPE_TEMPLATE.to_string())
    }
}

/// Standard reason phrase for `status`, or its class name for codes without
/// one, so a title is never empty.
pub fn reason_phrase(status: StatusCode) -> &'static str {
    if let Some(reason) = status.canonical_reason() {
        return reason;
    }
    match status.as_u16() {
        100..=199 => "Informational",
        200..=299 => "Success",
        300..=399 => "Redirection",
        400..=499 => "Client Error",
        _ => "Server Error",
    }
}
