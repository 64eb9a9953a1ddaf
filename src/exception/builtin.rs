//! Built-in failure categories
//!
//! These cover the HTTP-level failures every service runs into. They all
//! extend [`HttpException`], and the built-in default handler knows how to
//! render each of them.

use super::{ExceptionClass, ExceptionType};
use crate::Exception;
use crate::negotiation::MediaType;
use axum::http::{Method, StatusCode};
use serde::Deserialize;
use std::fmt;
use strum::IntoEnumIterator;

/// Common HTTP failure classes handled generically by the default handler.
///
/// The snake_case name (`method_not_allowed`) is the configuration key used
/// for status overrides.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Deserialize,
    strum_macros::Display,
    strum_macros::EnumString,
    strum_macros::AsRefStr,
    strum_macros::EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum FailureCategory {
    BadRequest,
    NotFound,
    MethodNotAllowed,
    NotAcceptable,
    UnsupportedMediaType,
    InternalServerError,
}

impl FailureCategory {
    pub fn default_status(self) -> StatusCode {
        match self {
            Self::BadRequest => StatusCode::BAD_REQUEST,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            Self::NotAcceptable => StatusCode::NOT_ACCEPTABLE,
            Self::UnsupportedMediaType => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            Self::InternalServerError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn from_status(status: StatusCode) -> Option<Self> {
        match status {
            StatusCode::BAD_REQUEST => Some(Self::BadRequest),
            StatusCode::NOT_FOUND => Some(Self::NotFound),
            StatusCode::METHOD_NOT_ALLOWED => Some(Self::MethodNotAllowed),
            StatusCode::NOT_ACCEPTABLE => Some(Self::NotAcceptable),
            StatusCode::UNSUPPORTED_MEDIA_TYPE => Some(Self::UnsupportedMediaType),
            StatusCode::INTERNAL_SERVER_ERROR => Some(Self::InternalServerError),
            _ => None,
        }
    }

    /// The built-in exception type that stands for this category.
    pub fn exception_type(self) -> &'static ExceptionType {
        match self {
            Self::BadRequest => BadRequest::descriptor(),
            Self::NotFound => NotFound::descriptor(),
            Self::MethodNotAllowed => MethodNotAllowed::descriptor(),
            Self::NotAcceptable => NotAcceptable::descriptor(),
            Self::UnsupportedMediaType => UnsupportedMediaType::descriptor(),
            Self::InternalServerError => InternalServerError::descriptor(),
        }
    }

    /// Nearest category among the supertypes of `exception_type`, the type
    /// itself included.
    pub fn nearest(exception_type: &'static ExceptionType) -> Option<Self> {
        exception_type.ancestry().iter().find_map(|ancestor| {
            Self::iter().find(|category| category.exception_type() == ancestor.exception_type)
        })
    }

    /// The category the default handler files an exception under.
    ///
    /// Subtypes of a built-in exception share its category. Anything else
    /// is treated as an internal server error, which is how the default
    /// handler renders it.
    pub fn of(exception: &dyn Exception) -> Option<Self> {
        if exception.is::<BadRequest>() {
            Some(Self::BadRequest)
        } else if exception.is::<NotFound>() {
            Some(Self::NotFound)
        } else if exception.is::<MethodNotAllowed>() {
            Some(Self::MethodNotAllowed)
        } else if exception.is::<NotAcceptable>() {
            Some(Self::NotAcceptable)
        } else if exception.is::<UnsupportedMediaType>() {
            Some(Self::UnsupportedMediaType)
        } else if let Some(http) = exception.downcast_ref::<HttpException>() {
            Self::from_status(http.status())
        } else {
            Self::nearest(exception.exception_type()).or(Some(Self::InternalServerError))
        }
    }
}

/// Generic HTTP failure with an explicit status, and the root of the
/// built-in hierarchy.
#[derive(Debug, thiserror::Error, Exception)]
#[error("{status}: {message}")]
pub struct HttpException {
    status: StatusCode,
    message: String,
}

impl HttpException {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// The client's `Accept` header matches none of the resource's media types.
#[derive(Debug, thiserror::Error, Exception)]
#[error("none of the acceptable media types can be produced (supported: {})", MediaList(.supported))]
#[exception(extends(HttpException))]
pub struct NotAcceptable {
    pub supported: Vec<MediaType>,
}

impl NotAcceptable {
    pub fn new(supported: impl IntoIterator<Item = MediaType>) -> Self {
        Self {
            supported: supported.into_iter().collect(),
        }
    }
}

/// The resource exists but does not support the request method.
#[derive(Debug, thiserror::Error, Exception)]
#[error("method {method} not allowed")]
#[exception(extends(HttpException))]
pub struct MethodNotAllowed {
    pub method: Method,
    pub allowed: Vec<Method>,
}

impl MethodNotAllowed {
    pub fn new(method: Method, allowed: impl IntoIterator<Item = Method>) -> Self {
        Self {
            method,
            allowed: allowed.into_iter().collect(),
        }
    }
}

/// The request body's content type cannot be consumed by the resource.
#[derive(Debug, thiserror::Error, Exception)]
#[error("unsupported content type {}", .content_type.as_deref().unwrap_or("(none)"))]
#[exception(extends(HttpException))]
pub struct UnsupportedMediaType {
    pub content_type: Option<String>,
    pub supported: Vec<MediaType>,
}

impl UnsupportedMediaType {
    pub fn new(
        content_type: Option<impl Into<String>>,
        supported: impl IntoIterator<Item = MediaType>,
    ) -> Self {
        Self {
            content_type: content_type.map(Into::into),
            supported: supported.into_iter().collect(),
        }
    }
}

#[derive(Debug, thiserror::Error, Exception)]
#[error("not found: {}", .path.as_deref().unwrap_or("(unknown)"))]
#[exception(extends(HttpException))]
pub struct NotFound {
    pub path: Option<String>,
}

impl NotFound {
    pub fn new() -> Self {
        Self { path: None }
    }

    pub fn at(path: impl Into<String>) -> Self {
        Self {
            path: Some(path.into()),
        }
    }
}

impl Default for NotFound {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, thiserror::Error, Exception)]
#[error("bad request: {message}")]
#[exception(extends(HttpException))]
pub struct BadRequest {
    pub message: String,
}

impl BadRequest {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Catch-all for failures with no better classification.
///
/// The cause is kept for logging and `source()` chains only; it never
/// reaches the response body.
#[derive(Debug, thiserror::Error, Exception)]
#[error("internal server error")]
#[exception(extends(HttpException))]
pub struct InternalServerError {
    #[source]
    cause: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl InternalServerError {
    pub fn new() -> Self {
        Self { cause: None }
    }

    pub fn with_cause(cause: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self {
            cause: Some(cause.into()),
        }
    }
}

impl Default for InternalServerError {
    fn default() -> Self {
        Self::new()
    }
}

impl From<anyhow::Error> for InternalServerError {
    fn from(err: anyhow::Error) -> Self {
        Self::with_cause(err)
    }
}

/// Comma separated rendering of a media type list.
pub(crate) struct MediaList<'a>(pub &'a [MediaType]);

impl fmt::Display for MediaList<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, media_type) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", media_type.essence())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exception::ExceptionClass;
    use crate::negotiation::{APPLICATION_JSON, TEXT_PLAIN};
    use std::str::FromStr;
    use strum::IntoEnumIterator;

    #[test]
    fn test_category_names_round_trip() {
        for category in FailureCategory::iter() {
            let parsed = FailureCategory::from_str(category.as_ref()).unwrap();
            assert_eq!(parsed, category);
        }
        assert_eq!(
            FailureCategory::from_str("method_not_allowed").unwrap(),
            FailureCategory::MethodNotAllowed
        );
        assert!(FailureCategory::from_str("teapot").is_err());
    }

    #[test]
    fn test_category_of_builtins() {
        let not_allowed = MethodNotAllowed::new(Method::DELETE, [Method::GET]);
        assert_eq!(
            FailureCategory::of(&not_allowed),
            Some(FailureCategory::MethodNotAllowed)
        );

        let conflict = HttpException::new(StatusCode::CONFLICT, "already exists");
        assert_eq!(FailureCategory::of(&conflict), None);

        let gone = HttpException::new(StatusCode::NOT_FOUND, "gone");
        assert_eq!(FailureCategory::of(&gone), Some(FailureCategory::NotFound));

        let internal = InternalServerError::from(anyhow::anyhow!("boom"));
        assert_eq!(
            FailureCategory::of(&internal),
            Some(FailureCategory::InternalServerError)
        );
    }

    #[derive(Debug, thiserror::Error, Exception)]
    #[error("no ghost at {0}")]
    #[exception(extends(NotFound))]
    struct NoGhost(&'static str);

    #[derive(Debug, thiserror::Error, Exception)]
    #[error("proton pack overheated")]
    #[exception(extends(NoGhost, MethodNotAllowed))]
    struct Overheated;

    #[test]
    fn test_category_of_builtin_subtypes() {
        assert_eq!(
            FailureCategory::of(&NoGhost("/library")),
            Some(FailureCategory::NotFound)
        );
        // NotFound is two hops away, MethodNotAllowed one.
        assert_eq!(
            FailureCategory::of(&Overheated),
            Some(FailureCategory::MethodNotAllowed)
        );
        assert_eq!(
            FailureCategory::nearest(HttpException::descriptor()),
            None
        );
    }

    #[test]
    fn test_builtins_extend_http_exception() {
        let root = HttpException::descriptor();
        assert!(NotAcceptable::descriptor().is_subtype_of(root));
        assert!(InternalServerError::descriptor().is_subtype_of(root));
        assert_eq!(NotFound::descriptor().distance_to(root), Some(1));
    }

    #[test]
    fn test_not_acceptable_message_lists_types() {
        let err = NotAcceptable::new([TEXT_PLAIN, APPLICATION_JSON]);
        assert_eq!(
            err.to_string(),
            "none of the acceptable media types can be produced (supported: text/plain, application/json)"
        );
    }

    #[test]
    fn test_internal_error_keeps_cause() {
        use std::error::Error as _;
        let err = InternalServerError::from(anyhow::anyhow!("database unreachable"));
        assert_eq!(err.source().unwrap().to_string(), "database unreachable");
    }
}
