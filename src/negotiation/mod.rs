//! Content negotiation for error bodies
//!
//! Reconciles what the client asked for (`Accept`) with what a handler can
//! produce, falling back to the configured default type when the two do not
//! meet.

use crate::exception::NotAcceptable;

mod accept;
mod media_type;

pub use accept::{AcceptPreferences, MediaRange, Quality};
pub use media_type::{
    APPLICATION_JSON, APPLICATION_PROBLEM_JSON, APPLICATION_PROBLEM_XML, APPLICATION_XML,
    MediaType, TEXT_PLAIN, TEXT_XML,
};

/// The media type chosen for a response and whether it came from the
/// client's preferences.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NegotiationOutcome {
    pub media_type: MediaType,
    pub honored: bool,
}

impl NegotiationOutcome {
    fn honored(media_type: MediaType) -> Self {
        Self {
            media_type: media_type.with_default_charset(),
            honored: true,
        }
    }

    fn fallback(media_type: MediaType) -> Self {
        Self {
            media_type: media_type.with_default_charset(),
            honored: false,
        }
    }
}

/// Chooses a response media type.
///
/// Holds the configured default, which must be renderable; the resolver
/// builder checks that before a negotiator is ever created.
#[derive(Debug, Clone)]
pub struct ContentNegotiator {
    default_type: MediaType,
}

impl ContentNegotiator {
    pub fn new(default_type: MediaType) -> Self {
        Self { default_type }
    }

    pub fn default_type(&self) -> &MediaType {
        &self.default_type
    }

    /// Pick the best of `supported` for the client, or fall back.
    ///
    /// Ranges are tried in rank order. An exact range selects the supported
    /// type with the same essence. A wildcard range prefers `default` when it
    /// is supported and covered, otherwise the first supported type it
    /// covers.
    pub fn negotiate(
        &self,
        preferences: &AcceptPreferences,
        supported: &[MediaType],
        default: Option<&MediaType>,
    ) -> NegotiationOutcome {
        let default = default.unwrap_or(&self.default_type);

        if preferences.has_no_preference() {
            return NegotiationOutcome::fallback(default.clone());
        }

        for range in preferences.ranges() {
            if let Some(found) = select(&range.media_type, supported, default) {
                return NegotiationOutcome::honored(found.clone());
            }
        }

        NegotiationOutcome::fallback(default.clone())
    }
}

fn select<'a>(
    range: &MediaType,
    supported: &'a [MediaType],
    default: &MediaType,
) -> Option<&'a MediaType> {
    if range.is_wildcard() {
        supported
            .iter()
            .find(|candidate| candidate.same_essence(default) && range.matches(candidate))
            .or_else(|| supported.iter().find(|candidate| range.matches(candidate)))
    } else {
        supported
            .iter()
            .find(|candidate| candidate.same_essence(range))
    }
}

/// For routers: check a request's `Accept` values against what the resource
/// can produce before running it.
///
/// Returns the type to respond with, or a [`NotAcceptable`] listing
/// `supported`, ready to be raised.
pub fn require_acceptable<I, S>(
    accept: I,
    supported: &[MediaType],
) -> Result<MediaType, NotAcceptable>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let preferences = AcceptPreferences::parse(accept);
    let Some(first) = supported.first() else {
        return Err(NotAcceptable::new(Vec::new()));
    };

    if preferences.has_no_preference() {
        return Ok(first.clone().with_default_charset());
    }

    preferences
        .ranges()
        .iter()
        .find_map(|range| select(&range.media_type, supported, first))
        .map(|found| found.clone().with_default_charset())
        .ok_or_else(|| NotAcceptable::new(supported.iter().cloned()))
}
