use thiserror::Error;

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Errors raised while assembling a resolver at startup.
///
/// None of these can occur while a request is being handled: everything is
/// validated once, when the resolver is built.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Duplicate handler registration for exception type: {exception}")]
    DuplicateRegistration { exception: String },

    #[error("Handler for {exception} produces no media types")]
    EmptyProduces { exception: String },

    #[error("No encoder available for media type '{media_type}'")]
    UnsupportedMediaType { media_type: String },

    #[error("Unsupported charset '{charset}' in media type '{media_type}'")]
    UnsupportedCharset { media_type: String, charset: String },

    #[error("Invalid media type '{value}': {reason}")]
    InvalidMediaType { value: String, reason: String },

    #[error("Invalid status code {status} for {category}: must be between 100 and 599")]
    InvalidStatus { category: String, status: u16 },

    #[error("Status override for {category} configured more than once")]
    DuplicateOverride { category: String },

    #[error("Unknown failure category: {0}")]
    UnknownCategory(String),

    #[error("Type URI template must contain '{{code}}': {0}")]
    InvalidTypeTemplate(String),

    #[error("Invalid value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

impl ConfigError {
    pub fn invalid_value(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidValue {
            key: key.into(),
            message: message.into(),
        }
    }
}

/// Failure reported by an exception handler while building a response.
///
/// The resolver never lets these escape; they are downgraded to the generic
/// internal server error response.
#[derive(Debug, Error)]
pub enum HandlerError {
    #[error("Handler expected {expected} but received {actual}")]
    TypeMismatch {
        expected: &'static str,
        actual: &'static str,
    },

    #[error("Handler failed: {0}")]
    Failed(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Failure while rendering or reading an error body.
#[derive(Debug, Error)]
pub enum EncodeError {
    #[error("No encoder for media type '{0}'")]
    UnsupportedMediaType(String),

    #[error("JSON encoding failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("XML encoding failed: {0}")]
    XmlSerialize(#[from] quick_xml::errors::serialize::SeError),

    #[error("XML decoding failed: {0}")]
    XmlDeserialize(#[from] quick_xml::errors::serialize::DeError),

    #[error("Malformed error body: {0}")]
    Malformed(String),
}
