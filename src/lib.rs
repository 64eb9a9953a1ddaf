//! # problemkit
//!
//! Exception-to-response resolution for axum services.
//!
//! Request handlers raise typed exceptions; problemkit picks the most
//! specific handler for each one, negotiates a media type with the client,
//! applies configured status overrides and renders a problem-style body:
//!
//! ```text
//! { "type": "http://httpstatus.es/404", "title": "Not Found", "status": 404, "detail": "..." }
//! ```
//!
//! ## Features
//!
//! - **Typed dispatch**: exact type beats supertype, nearest ancestor wins,
//!   first registration breaks ties
//! - **Resource-local handlers**: per-operation handlers outrank global ones
//! - **Content negotiation**: JSON, XML and plain text, honouring `Accept`
//!   quality values and falling back to a configured default
//! - **Status overrides**: remap a built-in failure category's status without
//!   writing a handler
//! - **Total**: every exception produces a well-formed response, including
//!   failing and panicking handlers
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use problemkit::prelude::*;
//!
//! #[derive(Debug, thiserror::Error, Exception)]
//! #[error("there is no Dana")]
//! pub struct ZuulException;
//!
//! async fn summon() -> RaisedResult<&'static str> {
//!     Err(ZuulException.into())
//! }
//!
//! # fn main() -> problemkit::Result<()> {
//! let resolver = ExceptionResolver::builder()
//!     .register_fn::<ZuulException, _>(|_, _| {
//!         ErrorResponse::builder(StatusCode::NOT_FOUND).title("There's no Dana, only Zuul!")
//!     })
//!     .override_status(FailureCategory::MethodNotAllowed, 418)
//!     .build()?;
//!
//! let app: Router = Router::new()
//!     .route("/summon", problemkit::axum::routing::get(summon))
//!     .layer(ExceptionLayer::new(Arc::new(resolver)));
//! # Ok(())
//! # }
//! ```

extern crate self as problemkit;

pub mod config;
pub mod error;
pub mod exception;
pub mod handler;
pub mod middleware;
pub mod negotiation;
pub mod policy;
pub mod resolver;
pub mod response;

// Re-export core types
pub use config::{ConfigService, ResolverConfig};
pub use error::{ConfigError, EncodeError, HandlerError, Result};
pub use exception::{Exception, ExceptionClass, ExceptionType, FailureCategory};
pub use handler::{ExceptionHandler, OperationHandlers};
pub use middleware::{ExceptionLayer, Raised, RaisedResult};
pub use negotiation::{MediaType, NegotiationOutcome};
pub use policy::{HandlerIdentity, StatusOverridePolicy};
pub use resolver::{ExceptionResolver, FinalResponse, RequestContext, ResolverBuilder};
pub use response::{ErrorResponse, ErrorResponseBuilder};

// Re-export the derive
pub use problemkit_macro::Exception;

// Re-export commonly used types from dependencies
pub use axum;

/// Prelude module for convenient imports
///
/// ```
/// use problemkit::prelude::*;
/// ```
pub mod prelude {
    pub use crate::config::{ConfigService, ResolverConfig};
    pub use crate::error::{ConfigError, HandlerError, Result};
    pub use crate::exception::{
        BadRequest, ExceptionClass, FailureCategory, HttpException, InternalServerError,
        MethodNotAllowed, NotAcceptable, NotFound, UnsupportedMediaType,
    };
    pub use crate::handler::{ExceptionHandler, FnHandler, OperationHandlers, TypedHandler};
    pub use crate::middleware::{ExceptionLayer, Raised, RaisedResult};
    pub use crate::negotiation::{
        APPLICATION_JSON, APPLICATION_PROBLEM_JSON, APPLICATION_PROBLEM_XML, APPLICATION_XML,
        MediaType, TEXT_PLAIN, require_acceptable,
    };
    pub use crate::resolver::{ExceptionResolver, FinalResponse, RequestContext};
    pub use crate::response::{ErrorResponse, ErrorResponseBuilder};
    // Both the trait and the derive
    pub use crate::Exception;
    pub use axum::{
        Router,
        http::StatusCode,
        response::{IntoResponse, Response},
    };
    pub use std::sync::Arc;
}
