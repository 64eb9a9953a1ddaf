use super::ExceptionHandler;
use crate::error::HandlerError;
use crate::exception::builtin::MediaList;
use crate::exception::{
    BadRequest, Exception, FailureCategory, HttpException, MethodNotAllowed, NotAcceptable,
    NotFound, UnsupportedMediaType,
};
use crate::negotiation::{
    APPLICATION_JSON, APPLICATION_PROBLEM_JSON, APPLICATION_PROBLEM_XML, APPLICATION_XML,
    MediaType, TEXT_PLAIN,
};
use crate::resolver::RequestContext;
use crate::response::{ErrorResponse, ErrorResponseBuilder, reason_phrase};
use axum::http::StatusCode;

const GENERIC_DETAIL: &str = "An unexpected error occurred while processing the request";

/// Last handler in the chain: renders the built-in failure categories and
/// degrades everything else to a generic 500.
///
/// Each category uses the reason phrase of its default status as `title`.
/// The title is set explicitly, so it survives a status override.
#[derive(Debug, Clone)]
pub struct BuiltinDefaultHandler {
    produces: Vec<MediaType>,
}

impl BuiltinDefaultHandler {
    pub fn new() -> Self {
        Self {
            produces: vec![
                APPLICATION_JSON,
                APPLICATION_PROBLEM_JSON,
                APPLICATION_XML,
                APPLICATION_PROBLEM_XML,
                TEXT_PLAIN,
            ],
        }
    }

    /// Render `exception`; never fails.
    pub fn render(&self, exception: &dyn Exception, context: &RequestContext) -> ErrorResponseBuilder {
        if let Some(e) = exception.downcast_ref::<NotAcceptable>() {
            return category_response(FailureCategory::NotAcceptable).detail(format!(
                "The resource cannot produce any of the requested media types. Supported media types: {}",
                MediaList(&e.supported)
            ));
        }

        if let Some(e) = exception.downcast_ref::<MethodNotAllowed>() {
            let allowed = e
                .allowed
                .iter()
                .map(|method| method.as_str())
                .collect::<Vec<_>>()
                .join(", ");
            return category_response(FailureCategory::MethodNotAllowed).detail(format!(
                "HTTP method {} is not supported by this resource. Allowed methods: {}",
                e.method, allowed
            ));
        }

        if let Some(e) = exception.downcast_ref::<UnsupportedMediaType>() {
            let requested = e.content_type.as_deref().unwrap_or("(none)");
            return category_response(FailureCategory::UnsupportedMediaType).detail(format!(
                "Content type {} is not supported. Supported media types: {}",
                requested,
                MediaList(&e.supported)
            ));
        }

        if let Some(e) = exception.downcast_ref::<NotFound>() {
            let builder = category_response(FailureCategory::NotFound);
            return match e.path.as_deref().or(context.path()) {
                Some(path) => builder.detail(format!("No resource found at {}", path)),
                None => builder,
            };
        }

        if let Some(e) = exception.downcast_ref::<BadRequest>() {
            return category_response(FailureCategory::BadRequest).detail(e.message.clone());
        }

        if let Some(e) = exception.downcast_ref::<HttpException>() {
            let builder = ErrorResponse::builder(e.status()).title(reason_phrase(e.status()));
            return if e.status().is_server_error() {
                builder.detail(GENERIC_DETAIL)
            } else {
                builder.detail(e.message())
            };
        }

        if let Some(category) = FailureCategory::nearest(exception.exception_type()) {
            tracing::debug!(
                "Rendering {} as inherited category {}",
                exception.exception_type(),
                category
            );
            return inherited_response(category, context);
        }

        tracing::debug!(
            "No built-in category for {}; rendering as internal server error",
            exception.exception_type()
        );
        internal_error()
    }
}

impl Default for BuiltinDefaultHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl ExceptionHandler for BuiltinDefaultHandler {
    fn handle(
        &self,
        exception: &dyn Exception,
        context: &RequestContext,
    ) -> Result<ErrorResponseBuilder, HandlerError> {
        Ok(self.render(exception, context))
    }

    fn produces(&self) -> &[MediaType] {
        &self.produces
    }

    fn name(&self) -> &str {
        "BuiltinDefaultHandler"
    }
}

fn category_response(category: FailureCategory) -> ErrorResponseBuilder {
    let status = category.default_status();
    ErrorResponse::builder(status).title(reason_phrase(status))
}

// Subtypes carry none of the built-in fields, so only the request is
// available for the detail.
fn inherited_response(category: FailureCategory, context: &RequestContext) -> ErrorResponseBuilder {
    match category {
        FailureCategory::InternalServerError => internal_error(),
        FailureCategory::NotFound => {
            let builder = category_response(category);
            match context.path() {
                Some(path) => builder.detail(format!("No resource found at {}", path)),
                None => builder,
            }
        }
        _ => category_response(category),
    }
}

/// The generic 500 body used for anything the chain cannot otherwise
/// render, including failing handlers.
pub fn internal_error() -> ErrorResponseBuilder {
    category_response(FailureCategory::InternalServerError).detail(GENERIC_DETAIL)
}
