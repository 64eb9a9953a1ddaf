//! Resource-local handlers
//!
//! An operation (one route/method pair) can carry its own handlers. The
//! router builds an [`OperationHandlers`] per operation at startup and passes
//! it with each request; these handlers take priority over every global one.

use super::{ExceptionHandler, FnHandler, TypedHandler};
use crate::error::Result;
use crate::exception::{Exception, ExceptionClass};
use crate::resolver::registry::{HandlerTable, Match, Registration};
use crate::resolver::RequestContext;
use crate::response::ErrorResponseBuilder;
use std::fmt;
use std::sync::Arc;

/// Handlers declared by a single operation.
#[derive(Clone)]
pub struct OperationHandlers {
    operation: String,
    table: HandlerTable,
}

impl OperationHandlers {
    pub fn builder(operation: impl Into<String>) -> OperationHandlersBuilder {
        OperationHandlersBuilder {
            operation: operation.into(),
            registrations: Vec::new(),
        }
    }

    /// Name of the operation, for logs.
    pub fn operation(&self) -> &str {
        &self.operation
    }

    pub(crate) fn find(&self, exception: &dyn Exception) -> Option<Match<'_>> {
        self.table.find(exception.exception_type())
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

impl fmt::Debug for OperationHandlers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OperationHandlers")
            .field("operation", &self.operation)
            .field(
                "handles",
                &self
                    .table
                    .iter()
                    .map(|r| r.exception_type.name())
                    .collect::<Vec<_>>(),
            )
            .finish()
    }
}

/// Collects an operation's handlers; validated by [`build`](Self::build).
pub struct OperationHandlersBuilder {
    operation: String,
    registrations: Vec<Registration>,
}

impl OperationHandlersBuilder {
    /// Handle `E` and its subtypes.
    pub fn register<E: ExceptionClass>(mut self, handler: impl ExceptionHandler) -> Self {
        self.registrations.push(Registration {
            exception_type: E::descriptor(),
            handler: Arc::new(handler),
        });
        self
    }

    pub fn register_fn<E, F>(self, handler: F) -> Self
    where
        E: ExceptionClass,
        F: Fn(&dyn Exception, &RequestContext) -> ErrorResponseBuilder + Send + Sync + 'static,
    {
        self.register::<E>(FnHandler::new(handler))
    }

    /// Handle exactly `E`, receiving it already downcast.
    pub fn register_typed<E, F>(self, handler: F) -> Self
    where
        E: ExceptionClass,
        F: Fn(&E, &RequestContext) -> ErrorResponseBuilder + Send + Sync + 'static,
    {
        self.register::<E>(TypedHandler::<E, F>::new(handler))
    }

    pub fn build(self) -> Result<OperationHandlers> {
        Ok(OperationHandlers {
            operation: self.operation,
            table: HandlerTable::new(self.registrations)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Exception;
    use crate::error::ConfigError;
    use crate::response::ErrorResponse;
    use axum::http::StatusCode;

    #[derive(Debug, thiserror::Error, Exception)]
    #[error("stay puft")]
    struct StayPuft;

    #[test]
    fn test_build_and_find() {
        let handlers = OperationHandlers::builder("GET /marshmallow")
            .register_typed::<StayPuft, _>(|_, _| ErrorResponse::builder(StatusCode::GONE))
            .build()
            .unwrap();

        assert_eq!(handlers.operation(), "GET /marshmallow");
        assert_eq!(handlers.len(), 1);
        assert!(handlers.find(&StayPuft).is_some());
    }

    #[test]
    fn test_duplicate_local_registration_fails() {
        let result = OperationHandlers::builder("GET /marshmallow")
            .register_typed::<StayPuft, _>(|_, _| ErrorResponse::builder(StatusCode::GONE))
            .register_fn::<StayPuft, _>(|_, _| ErrorResponse::builder(StatusCode::GONE))
            .build();

        assert!(matches!(
            result,
            Err(ConfigError::DuplicateRegistration { .. })
        ));
    }
}
