//! Rendering [`ErrorResponse`] in the negotiated media type

use super::ErrorResponse;
use crate::error::EncodeError;
use crate::negotiation::MediaType;
use axum::body::Bytes;

const XML_ROOT: &str = "problem";
const XML_DECLARATION: &str = r#"<?xml version="1.0" encoding="UTF-8"?>"#;

/// Wire formats an error body can be written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum Format {
    Json,
    Xml,
    PlainText,
}

impl Format {
    /// Format for a concrete media type. Only UTF-8 (or unspecified)
    /// charsets can be produced.
    pub fn for_media_type(media_type: &MediaType) -> Option<Self> {
        if !media_type.has_utf8_charset() || media_type.is_wildcard() {
            return None;
        }
        match (media_type.top(), media_type.sub(), media_type.suffix()) {
            ("application", "json", _) | ("application", _, Some("json")) => Some(Self::Json),
            ("application" | "text", "xml", _) | ("application", _, Some("xml")) => {
                Some(Self::Xml)
            }
            ("text", "plain", _) => Some(Self::PlainText),
            _ => None,
        }
    }
}

/// Serialise `response` as `media_type`.
pub fn encode(response: &ErrorResponse, media_type: &MediaType) -> Result<Bytes, EncodeError> {
    let format = Format::for_media_type(media_type)
        .ok_or_else(|| EncodeError::UnsupportedMediaType(media_type.to_string()))?;

    let body = match format {
        Format::Json => serde_json::to_vec(response)?,
        Format::Xml => {
            let xml = quick_xml::se::to_string_with_root(XML_ROOT, response)?;
            format!("{}{}", XML_DECLARATION, xml).into_bytes()
        }
        Format::PlainText => plain_text(response).into_bytes(),
    };

    Ok(Bytes::from(body))
}

fn plain_text(response: &ErrorResponse) -> String {
    let mut text = format!("{} {}", response.status().as_u16(), response.title());
    if let Some(detail) = response.detail() {
        text.push_str(": ");
        text.push_str(detail);
    }
    text
}

pub fn decode_json(body: &[u8]) -> Result<ErrorResponse, EncodeError> {
    let response: ErrorResponse = serde_json::from_slice(body)?;
    response.check_invariants().map_err(EncodeError::Malformed)?;
    Ok(response)
}

pub fn decode_xml(body: &[u8]) -> Result<ErrorResponse, EncodeError> {
    let text = std::str::from_utf8(body).map_err(|e| EncodeError::Malformed(e.to_string()))?;
    let response: ErrorResponse = quick_xml::de::from_str(text)?;
    response.check_invariants().map_err(EncodeError::Malformed)?;
    Ok(response)
}
