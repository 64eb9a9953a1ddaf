use crate::error::HandlerError;
use crate::exception::{Exception, ExceptionClass};
use crate::negotiation::{APPLICATION_JSON, APPLICATION_XML, MediaType};
use crate::resolver::RequestContext;
use crate::response::ErrorResponseBuilder;
use std::marker::PhantomData;

pub mod builtin;
pub mod local;

pub use builtin::BuiltinDefaultHandler;
pub use local::{OperationHandlers, OperationHandlersBuilder};

static DEFAULT_PRODUCES: [MediaType; 2] = [APPLICATION_JSON, APPLICATION_XML];

/// Media types a handler produces when it does not say otherwise.
pub fn default_produces() -> &'static [MediaType] {
    &DEFAULT_PRODUCES
}

/// Converts a failure into an error body.
///
/// Handlers are registered once at startup and shared across requests, so
/// they must not keep per-request state.
///
/// # Example
/// ```ignore
/// struct ZuulHandler;
///
/// impl ExceptionHandler for ZuulHandler {
///     fn handle(&self, _: &dyn Exception, _: &RequestContext) -> Result<ErrorResponseBuilder, HandlerError> {
///         Ok(ErrorResponse::builder(StatusCode::NOT_FOUND).title("There's no Dana, only Zuul!"))
///     }
/// }
/// ```
pub trait ExceptionHandler: Send + Sync + 'static {
    fn handle(
        &self,
        exception: &dyn Exception,
        context: &RequestContext,
    ) -> Result<ErrorResponseBuilder, HandlerError>;

    /// Media types this handler can be rendered in.
    fn produces(&self) -> &[MediaType] {
        default_produces()
    }

    /// Whether the handler also applies to subtypes of the exception type it
    /// is registered for.
    fn handles_subtypes(&self) -> bool {
        true
    }

    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

/// Handler built from a closure over `&dyn Exception`.
pub struct FnHandler<F> {
    handler: F,
    produces: Vec<MediaType>,
}

impl<F> FnHandler<F>
where
    F: Fn(&dyn Exception, &RequestContext) -> ErrorResponseBuilder + Send + Sync + 'static,
{
    pub fn new(handler: F) -> Self {
        Self {
            handler,
            produces: default_produces().to_vec(),
        }
    }

    pub fn with_produces(mut self, media_types: impl IntoIterator<Item = MediaType>) -> Self {
        self.produces = media_types.into_iter().collect();
        self
    }
}

impl<F> ExceptionHandler for FnHandler<F>
where
    F: Fn(&dyn Exception, &RequestContext) -> ErrorResponseBuilder + Send + Sync + 'static,
{
    fn handle(
        &self,
        exception: &dyn Exception,
        context: &RequestContext,
    ) -> Result<ErrorResponseBuilder, HandlerError> {
        Ok((self.handler)(exception, context))
    }

    fn produces(&self) -> &[MediaType] {
        &self.produces
    }
}

/// Handler for exactly one concrete exception type.
///
/// Rust subtypes are distinct types, so this never matches subtypes of `E`;
/// register an [`FnHandler`] on the supertype for that.
pub struct TypedHandler<E, F> {
    handler: F,
    produces: Vec<MediaType>,
    _exception: PhantomData<fn(&E)>,
}

impl<E, F> TypedHandler<E, F>
where
    E: ExceptionClass,
    F: Fn(&E, &RequestContext) -> ErrorResponseBuilder + Send + Sync + 'static,
{
    pub fn new(handler: F) -> Self {
        Self {
            handler,
            produces: default_produces().to_vec(),
            _exception: PhantomData,
        }
    }

    pub fn with_produces(mut self, media_types: impl IntoIterator<Item = MediaType>) -> Self {
        self.produces = media_types.into_iter().collect();
        self
    }
}

impl<E, F> ExceptionHandler for TypedHandler<E, F>
where
    E: ExceptionClass,
    F: Fn(&E, &RequestContext) -> ErrorResponseBuilder + Send + Sync + 'static,
{
    fn handle(
        &self,
        exception: &dyn Exception,
        context: &RequestContext,
    ) -> Result<ErrorResponseBuilder, HandlerError> {
        let typed = exception
            .downcast_ref::<E>()
            .ok_or_else(|| HandlerError::TypeMismatch {
                expected: E::descriptor().name(),
                actual: exception.exception_type().name(),
            })?;
        Ok((self.handler)(typed, context))
    }

    fn produces(&self) -> &[MediaType] {
        &self.produces
    }

    fn handles_subtypes(&self) -> bool {
        false
    }
}
