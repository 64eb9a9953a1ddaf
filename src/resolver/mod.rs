//! Exception resolution
//!
//! The [`ExceptionResolver`] turns any raised [`Exception`] into a complete
//! HTTP error response. It is assembled once at startup with a
//! [`ResolverBuilder`] and is read-only afterwards, so it can be shared across
//! requests behind an `Arc` without locking.
//!
//! Handler selection, in priority order:
//!
//! 1. a handler local to the invoked operation ([`OperationHandlers`]),
//! 2. the most specific globally registered handler,
//! 3. the [`BuiltinDefaultHandler`].
//!
//! [`OperationHandlers`]: crate::handler::OperationHandlers

use crate::error::HandlerError;
use crate::exception::{Exception, FailureCategory, InternalServerError, NotAcceptable};
use crate::handler::{BuiltinDefaultHandler, ExceptionHandler, builtin::internal_error};
use crate::negotiation::{
    AcceptPreferences, ContentNegotiator, MediaType, NegotiationOutcome, TEXT_PLAIN,
};
use crate::policy::{HandlerIdentity, StatusOverridePolicy};
use crate::response::{ErrorResponse, ErrorResponseBuilder, Format, TypeTemplate, encode};
use axum::body::Bytes;
use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use std::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind};

mod builder;
mod context;
pub mod registry;

pub use builder::ResolverBuilder;
pub use context::RequestContext;

use registry::HandlerTable;

const LAST_RESORT_BODY: &str = "500 Internal Server Error";

/// Resolves exceptions into error responses. Build with
/// [`ExceptionResolver::builder`].
pub struct ExceptionResolver {
    registry: HandlerTable,
    builtin: BuiltinDefaultHandler,
    negotiator: ContentNegotiator,
    policy: StatusOverridePolicy,
    type_template: TypeTemplate,
}

/// The handler picked for an exception, before it runs.
struct Selected<'a> {
    handler: &'a dyn ExceptionHandler,
    identity: HandlerIdentity,
}

impl ExceptionResolver {
    pub fn builder() -> ResolverBuilder {
        ResolverBuilder::new()
    }

    /// Resolve `exception` for the request described by `context`.
    ///
    /// Never fails and never panics: handler errors, handler panics and
    /// encoding failures all end in a generic 500 response.
    pub fn resolve(&self, exception: &dyn Exception, context: &RequestContext) -> FinalResponse {
        let preferences = AcceptPreferences::parse(context.accept());
        let default_type = self.default_type_for(context);
        let selected = self.select(exception, context);

        tracing::debug!(
            "Resolving {} with {} ({})",
            exception.exception_type(),
            selected.identity,
            selected.handler.name()
        );

        if !preferences.accepts_any(selected.handler.produces())
            && !preferences.accepts_any(self.builtin.produces())
        {
            return self.not_acceptable(&preferences, default_type, context);
        }

        // A 406 is never answered in the type the client was just refused.
        if selected.identity == HandlerIdentity::Builtin(Some(FailureCategory::NotAcceptable)) {
            let negotiation = NegotiationOutcome {
                media_type: default_type.clone().with_default_charset(),
                honored: false,
            };
            return self.finish(
                self.builtin.render(exception, context),
                selected.identity,
                negotiation,
            );
        }

        let negotiation =
            self.negotiator
                .negotiate(&preferences, selected.handler.produces(), Some(default_type));
        if !negotiation.honored && !preferences.has_no_preference() {
            tracing::warn!(
                "{} cannot produce any type the client accepts; falling back to {}",
                selected.handler.name(),
                negotiation.media_type
            );
        }

        match run_handler(selected.handler, exception, context) {
            Ok(builder) => self.finish(builder, selected.identity, negotiation),
            Err(err) => {
                tracing::error!(
                    "Handler {} failed for {}: {}",
                    selected.handler.name(),
                    exception.exception_type(),
                    err
                );
                let negotiation =
                    self.negotiator
                        .negotiate(&preferences, self.builtin.produces(), Some(default_type));
                self.finish(
                    internal_error(),
                    HandlerIdentity::Builtin(Some(FailureCategory::InternalServerError)),
                    negotiation,
                )
            }
        }
    }

    /// Resolve an arbitrary error as an internal server error.
    pub fn resolve_error(&self, error: anyhow::Error, context: &RequestContext) -> FinalResponse {
        self.resolve(&InternalServerError::from(error), context)
    }

    /// The configured fallback content type.
    pub fn default_content_type(&self) -> &MediaType {
        self.negotiator.default_type()
    }

    pub fn type_template(&self) -> &TypeTemplate {
        &self.type_template
    }

    /// Number of globally registered handlers.
    pub fn len(&self) -> usize {
        self.registry.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registry.is_empty()
    }

    fn select<'a>(&'a self, exception: &dyn Exception, context: &'a RequestContext) -> Selected<'a> {
        if let Some(local) = context.operation().and_then(|ops| ops.find(exception)) {
            return Selected {
                handler: local.registration.handler.as_ref(),
                identity: HandlerIdentity::Local(local.registration.exception_type.name()),
            };
        }

        if let Some(found) = self.registry.find(exception.exception_type()) {
            return Selected {
                handler: found.registration.handler.as_ref(),
                identity: HandlerIdentity::Registered(found.registration.exception_type.name()),
            };
        }

        Selected {
            handler: &self.builtin,
            identity: HandlerIdentity::Builtin(FailureCategory::of(exception)),
        }
    }

    /// A request may carry its own default type; it is only honoured when
    /// it can actually be rendered.
    fn default_type_for<'a>(&'a self, context: &'a RequestContext) -> &'a MediaType {
        match context.default_content_type() {
            Some(media_type) if Format::for_media_type(media_type).is_some() => media_type,
            Some(media_type) => {
                tracing::warn!(
                    "Ignoring request default content type {}: no encoder",
                    media_type
                );
                self.negotiator.default_type()
            }
            None => self.negotiator.default_type(),
        }
    }

    fn not_acceptable(
        &self,
        preferences: &AcceptPreferences,
        default_type: &MediaType,
        context: &RequestContext,
    ) -> FinalResponse {
        tracing::warn!(
            "No handler can produce any of {:?}; responding 406",
            preferences
                .ranges()
                .iter()
                .map(|range| range.media_type.essence())
                .collect::<Vec<_>>()
        );
        let exception = NotAcceptable::new(self.builtin.produces().iter().cloned());
        let negotiation = NegotiationOutcome {
            media_type: default_type.clone().with_default_charset(),
            honored: false,
        };
        self.finish(
            self.builtin.render(&exception, context),
            HandlerIdentity::Builtin(Some(FailureCategory::NotAcceptable)),
            negotiation,
        )
    }

    fn finish(
        &self,
        mut builder: ErrorResponseBuilder,
        identity: HandlerIdentity,
        negotiation: NegotiationOutcome,
    ) -> FinalResponse {
        if let Some(status) = self.policy.override_status(&identity, builder.status()) {
            tracing::debug!(
                "Overriding status {} with {} for {}",
                builder.status().as_u16(),
                status.as_u16(),
                identity
            );
            builder = builder.with_status(status);
        }

        let model = builder.build(&self.type_template);

        match encode(&model, &negotiation.media_type) {
            Ok(body) => FinalResponse {
                status: model.status(),
                content_type: negotiation.media_type.clone(),
                body,
                negotiation,
                model,
                handler: identity,
            },
            Err(err) => {
                tracing::error!(
                    "Failed to encode error response as {}: {}",
                    negotiation.media_type,
                    err
                );
                self.last_resort()
            }
        }
    }

    fn last_resort(&self) -> FinalResponse {
        let model = internal_error().build(&self.type_template);
        let media_type = TEXT_PLAIN.with_default_charset();
        let body = encode(&model, &media_type)
            .unwrap_or_else(|_| Bytes::from_static(LAST_RESORT_BODY.as_bytes()));
        FinalResponse {
            status: model.status(),
            content_type: media_type.clone(),
            body,
            negotiation: NegotiationOutcome {
                media_type,
                honored: false,
            },
            model,
            handler: HandlerIdentity::Builtin(Some(FailureCategory::InternalServerError)),
        }
    }
}

impl std::fmt::Debug for ExceptionResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExceptionResolver")
            .field("handlers", &self.registry.len())
            .field("default_content_type", self.negotiator.default_type())
            .field("type_template", &self.type_template)
            .field("overrides", &self.policy.len())
            .finish()
    }
}

fn run_handler(
    handler: &dyn ExceptionHandler,
    exception: &dyn Exception,
    context: &RequestContext,
) -> Result<ErrorResponseBuilder, HandlerError> {
    catch_unwind(AssertUnwindSafe(|| handler.handle(exception, context)))
        .unwrap_or_else(|payload| Err(HandlerError::Failed(panic_message(payload.as_ref()))))
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        format!("panicked: {}", message)
    } else if let Some(message) = payload.downcast_ref::<String>() {
        format!("panicked: {}", message)
    } else {
        "panicked".to_string()
    }
}

/// The fully rendered error response.
#[derive(Debug, Clone)]
pub struct FinalResponse {
    status: StatusCode,
    content_type: MediaType,
    body: Bytes,
    negotiation: NegotiationOutcome,
    model: ErrorResponse,
    handler: HandlerIdentity,
}

impl FinalResponse {
    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn content_type(&self) -> &MediaType {
        &self.content_type
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    pub fn negotiation(&self) -> &NegotiationOutcome {
        &self.negotiation
    }

    /// The body before encoding.
    pub fn model(&self) -> &ErrorResponse {
        &self.model
    }

    /// Which handler produced the body.
    pub fn handler(&self) -> HandlerIdentity {
        self.handler
    }

    pub fn into_body(self) -> Bytes {
        self.body
    }
}

impl IntoResponse for FinalResponse {
    fn into_response(self) -> Response {
        let content_type = HeaderValue::from_str(&self.content_type.to_string());
        let mut response = (self.status, self.body).into_response();
        match content_type {
            Ok(value) => {
                response.headers_mut().insert(header::CONTENT_TYPE, value);
            }
            Err(_) => {
                response.headers_mut().insert(
                    header::CONTENT_TYPE,
                    HeaderValue::from_static("text/plain; charset=utf-8"),
                );
            }
        }
        response
    }
}
