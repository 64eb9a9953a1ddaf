use super::Raised;
use crate::exception::{MethodNotAllowed, NotFound};
use crate::handler::OperationHandlers;
use crate::resolver::{ExceptionResolver, RequestContext};
use axum::{
    body::Body,
    http::{HeaderMap, Method, Request, StatusCode, header},
    response::{IntoResponse, Response},
};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tower::{Layer, Service};

/// Tower Layer that resolves raised exceptions into error responses
///
/// Apply it to the whole router for global handling. Apply another one to a
/// single route with [`with_operation`](Self::with_operation) to give that
/// route its own handlers; the innermost layer resolves first.
#[derive(Clone)]
pub struct ExceptionLayer {
    resolver: Arc<ExceptionResolver>,
    operation: Option<Arc<OperationHandlers>>,
    translate_router_errors: bool,
}

impl ExceptionLayer {
    pub fn new(resolver: Arc<ExceptionResolver>) -> Self {
        Self {
            resolver,
            operation: None,
            translate_router_errors: false,
        }
    }

    /// Handlers local to the route this layer wraps.
    pub fn with_operation(mut self, handlers: OperationHandlers) -> Self {
        self.operation = Some(Arc::new(handlers));
        self
    }

    /// Also render the router's own bare 404 and 405 responses.
    pub fn translate_router_errors(mut self, enabled: bool) -> Self {
        self.translate_router_errors = enabled;
        self
    }
}

impl<S> Layer<S> for ExceptionLayer {
    type Service = ExceptionMiddleware<S>;

    fn layer(&self, inner: S) -> Self::Service {
        ExceptionMiddleware {
            inner,
            layer: self.clone(),
        }
    }
}

#[derive(Clone)]
pub struct ExceptionMiddleware<S> {
    inner: S,
    layer: ExceptionLayer,
}

impl<S> Service<Request<Body>> for ExceptionMiddleware<S>
where
    S: Service<Request<Body>, Response = Response> + Clone + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: Request<Body>) -> Self::Future {
        let context = self.request_context(&request);
        let resolver = self.layer.resolver.clone();
        let translate = self.layer.translate_router_errors;

        // The clone may not be ready; keep the one poll_ready was called on.
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);

        Box::pin(async move {
            let response = inner.call(request).await?;

            if let Some(raised) = Raised::from_response(&response) {
                return Ok(resolver
                    .resolve(raised.exception(), &context)
                    .into_response());
            }

            if translate {
                if let Some(translated) = translate_router_error(&resolver, &context, &response) {
                    return Ok(translated);
                }
            }

            Ok(response)
        })
    }
}

impl<S> ExceptionMiddleware<S> {
    fn request_context(&self, request: &Request<Body>) -> RequestContext {
        let context = RequestContext::from_headers(request.headers())
            .with_path(request.uri().path())
            .with_method(request.method().clone());

        let operation = self
            .layer
            .operation
            .clone()
            .or_else(|| request.extensions().get::<Arc<OperationHandlers>>().cloned());

        match operation {
            Some(handlers) => context.with_operation(handlers),
            None => context,
        }
    }
}

/// The router answers unknown paths and methods with empty bodies; give
/// those the same treatment as raised exceptions.
fn translate_router_error(
    resolver: &ExceptionResolver,
    context: &RequestContext,
    response: &Response,
) -> Option<Response> {
    if response.headers().contains_key(header::CONTENT_TYPE) {
        return None;
    }

    match response.status() {
        StatusCode::NOT_FOUND => {
            let exception = match context.path() {
                Some(path) => NotFound::at(path),
                None => NotFound::new(),
            };
            Some(resolver.resolve(&exception, context).into_response())
        }
        StatusCode::METHOD_NOT_ALLOWED => {
            let method = context.method().cloned().unwrap_or_default();
            let exception = MethodNotAllowed::new(method, allowed_methods(response.headers()));
            let mut resolved = resolver.resolve(&exception, context).into_response();
            if let Some(allow) = response.headers().get(header::ALLOW) {
                resolved.headers_mut().insert(header::ALLOW, allow.clone());
            }
            Some(resolved)
        }
        _ => None,
    }
}

fn allowed_methods(headers: &HeaderMap) -> Vec<Method> {
    headers
        .get_all(header::ALLOW)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(','))
        .filter_map(|method| method.trim().parse::<Method>().ok())
        .collect()
}
