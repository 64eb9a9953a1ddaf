use crate::handler::OperationHandlers;
use crate::negotiation::MediaType;
use axum::http::{HeaderMap, Method, header};
use std::sync::Arc;

/// What the resolver needs to know about the failed request.
///
/// Built by the router for each request; cheap to clone.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    accept: Vec<String>,
    operation: Option<Arc<OperationHandlers>>,
    path: Option<String>,
    method: Option<Method>,
    default_content_type: Option<MediaType>,
}

impl RequestContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Collect every `Accept` value from `headers`, in order.
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let accept = headers
            .get_all(header::ACCEPT)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .map(str::to_string)
            .collect();
        Self {
            accept,
            ..Self::default()
        }
    }

    pub fn with_accept(mut self, value: impl Into<String>) -> Self {
        self.accept.push(value.into());
        self
    }

    /// Handlers local to the operation being invoked.
    pub fn with_operation(mut self, handlers: Arc<OperationHandlers>) -> Self {
        self.operation = Some(handlers);
        self
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn with_method(mut self, method: Method) -> Self {
        self.method = Some(method);
        self
    }

    /// Use `media_type` instead of the resolver's configured default for
    /// this request.
    pub fn with_default_content_type(mut self, media_type: MediaType) -> Self {
        self.default_content_type = Some(media_type);
        self
    }

    pub fn accept(&self) -> &[String] {
        &self.accept
    }

    pub fn operation(&self) -> Option<&OperationHandlers> {
        self.operation.as_deref()
    }

    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }

    pub fn method(&self) -> Option<&Method> {
        self.method.as_ref()
    }

    pub fn default_content_type(&self) -> Option<&MediaType> {
        self.default_content_type.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_from_headers_keeps_every_accept_value() {
        let mut headers = HeaderMap::new();
        headers.append(header::ACCEPT, HeaderValue::from_static("application/xml"));
        headers.append(header::ACCEPT, HeaderValue::from_static("text/plain;q=0.5"));
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("text/csv"));

        let context = RequestContext::from_headers(&headers);
        assert_eq!(context.accept(), &["application/xml", "text/plain;q=0.5"]);
        assert!(context.operation().is_none());
    }

    #[test]
    fn test_builder_methods() {
        let context = RequestContext::new()
            .with_accept("application/json")
            .with_path("/ghosts")
            .with_method(Method::DELETE);
        assert_eq!(context.path(), Some("/ghosts"));
        assert_eq!(context.method(), Some(&Method::DELETE));
        assert_eq!(context.accept().len(), 1);
    }
}
