//! axum / tower integration
//!
//! Handlers return [`RaisedResult<T>`]; [`ExceptionLayer`] turns every
//! raised exception into the resolver's response for the current request.
//!
//! ```ignore
//! async fn summon() -> RaisedResult<String> {
//!     Err(ZuulException.into())
//! }
//!
//! let resolver = Arc::new(ExceptionResolver::builder().build()?);
//! let app = Router::new()
//!     .route("/summon", get(summon))
//!     .layer(ExceptionLayer::new(resolver));
//! ```

use crate::exception::{Exception, InternalServerError};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use std::fmt;
use std::sync::Arc;

mod layer;

pub use layer::{ExceptionLayer, ExceptionMiddleware};

/// Result type for request handlers that raise exceptions.
pub type RaisedResult<T> = std::result::Result<T, Raised>;

/// An exception raised by a request handler.
///
/// As a response it is only a placeholder 500 carrying the exception in its
/// extensions; [`ExceptionLayer`] replaces it with the resolved error body.
#[derive(Clone)]
pub struct Raised(Arc<dyn Exception>);

impl Raised {
    pub fn new(exception: impl Exception) -> Self {
        Self(Arc::new(exception))
    }

    pub fn exception(&self) -> &dyn Exception {
        self.0.as_ref()
    }

    /// Pull a raised exception back out of a response, if it carries one.
    pub fn from_response(response: &Response) -> Option<Self> {
        response.extensions().get::<Self>().cloned()
    }
}

impl<E: Exception> From<E> for Raised {
    fn from(exception: E) -> Self {
        Self::new(exception)
    }
}

impl From<anyhow::Error> for Raised {
    fn from(error: anyhow::Error) -> Self {
        Self::new(InternalServerError::from(error))
    }
}

impl fmt::Debug for Raised {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Raised")
            .field(&self.0.exception_type().name())
            .finish()
    }
}

impl fmt::Display for Raised {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl IntoResponse for Raised {
    fn into_response(self) -> Response {
        let mut response = StatusCode::INTERNAL_SERVER_ERROR.into_response();
        response.extensions_mut().insert(self);
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Exception;
    use crate::exception::NotFound;

    #[derive(Debug, thiserror::Error, Exception)]
    #[error("Slimer got loose")]
    struct SlimerLoose;

    #[test]
    fn test_raised_response_carries_exception() {
        let response = Raised::from(SlimerLoose).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let raised = Raised::from_response(&response).unwrap();
        assert!(raised.exception().is::<SlimerLoose>());
        assert_eq!(raised.to_string(), "Slimer got loose");
    }

    #[test]
    fn test_question_mark_conversions() {
        fn lookup() -> Result<(), Raised> {
            let found: Result<(), NotFound> = Err(NotFound::at("/firehouse"));
            found?;
            Ok(())
        }
        fn query() -> Result<(), Raised> {
            let rows: anyhow::Result<()> = Err(anyhow::anyhow!("connection reset"));
            rows?;
            Ok(())
        }

        assert!(lookup().unwrap_err().exception().is::<NotFound>());
        assert!(
            query()
                .unwrap_err()
                .exception()
                .is::<InternalServerError>()
        );
    }
}
