use crate::error::ConfigError;
use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

pub const APPLICATION_JSON: MediaType = MediaType::from_static("application", "json");
pub const APPLICATION_PROBLEM_JSON: MediaType =
    MediaType::from_static("application", "problem+json");
pub const APPLICATION_XML: MediaType = MediaType::from_static("application", "xml");
pub const APPLICATION_PROBLEM_XML: MediaType =
    MediaType::from_static("application", "problem+xml");
pub const TEXT_XML: MediaType = MediaType::from_static("text", "xml");
pub const TEXT_PLAIN: MediaType = MediaType::from_static("text", "plain");

const UTF_8: &str = "utf-8";

/// A concrete media type, or a media range when either part is `*`.
///
/// Only the `charset` parameter is kept; other parameters do not affect how
/// an error body is rendered.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MediaType {
    top: Cow<'static, str>,
    sub: Cow<'static, str>,
    charset: Option<String>,
}

impl MediaType {
    pub const fn from_static(top: &'static str, sub: &'static str) -> Self {
        Self {
            top: Cow::Borrowed(top),
            sub: Cow::Borrowed(sub),
            charset: None,
        }
    }

    pub fn top(&self) -> &str {
        &self.top
    }

    pub fn sub(&self) -> &str {
        &self.sub
    }

    /// Structured syntax suffix, e.g. `json` for `application/problem+json`.
    pub fn suffix(&self) -> Option<&str> {
        self.sub.rsplit_once('+').map(|(_, suffix)| suffix)
    }

    pub fn charset(&self) -> Option<&str> {
        self.charset.as_deref()
    }

    /// `type/subtype` without parameters.
    pub fn essence(&self) -> String {
        format!("{}/{}", self.top, self.sub)
    }

    pub fn is_wildcard(&self) -> bool {
        self.top == "*" || self.sub == "*"
    }

    pub fn with_charset(mut self, charset: impl Into<String>) -> Self {
        self.charset = Some(charset.into().to_ascii_lowercase());
        self
    }

    /// Types carrying text: `text/*`, JSON and XML, including `+json`/`+xml`
    /// suffixed types.
    pub fn is_textual(&self) -> bool {
        self.top == "text"
            || (self.top == "application"
                && (matches!(&*self.sub, "json" | "xml")
                    || matches!(self.suffix(), Some("json" | "xml"))))
    }

    /// Textual types get `charset=utf-8` unless a charset is already set.
    pub fn with_default_charset(self) -> Self {
        if self.charset.is_none() && self.is_textual() {
            self.with_charset(UTF_8)
        } else {
            self
        }
    }

    pub fn has_utf8_charset(&self) -> bool {
        match self.charset.as_deref() {
            None => true,
            Some(charset) => {
                charset.eq_ignore_ascii_case(UTF_8) || charset.eq_ignore_ascii_case("utf8")
            }
        }
    }

    /// Same `type/subtype`, ignoring parameters.
    pub fn same_essence(&self, other: &MediaType) -> bool {
        self.top == other.top && self.sub == other.sub
    }

    /// Whether `self`, read as a media range, covers the concrete `other`.
    pub fn matches(&self, other: &MediaType) -> bool {
        (self.top == "*" || self.top == other.top) && (self.sub == "*" || self.sub == other.sub)
    }
}

impl FromStr for MediaType {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let parsed: mime::Mime = value
            .trim()
            .parse()
            .map_err(|e: mime::FromStrError| ConfigError::InvalidMediaType {
                value: value.to_string(),
                reason: e.to_string(),
            })?;
        Ok(Self::from(&parsed))
    }
}

impl From<&mime::Mime> for MediaType {
    fn from(mime: &mime::Mime) -> Self {
        let sub = match mime.suffix() {
            Some(suffix) => format!("{}+{}", mime.subtype(), suffix),
            None => mime.subtype().to_string(),
        };
        Self {
            top: Cow::Owned(mime.type_().as_str().to_ascii_lowercase()),
            sub: Cow::Owned(sub.to_ascii_lowercase()),
            charset: mime
                .get_param(mime::CHARSET)
                .map(|charset| charset.as_str().to_ascii_lowercase()),
        }
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.top, self.sub)?;
        if let Some(charset) = &self.charset {
            write!(f, "; charset={}", charset)?;
        }
        Ok(())
    }
}
