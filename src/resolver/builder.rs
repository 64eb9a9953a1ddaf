use super::ExceptionResolver;
use super::registry::{HandlerTable, Registration};
use crate::config::ResolverConfig;
use crate::error::{ConfigError, Result};
use crate::exception::{Exception, ExceptionClass, FailureCategory};
use crate::handler::{BuiltinDefaultHandler, ExceptionHandler, FnHandler, TypedHandler};
use crate::negotiation::{APPLICATION_JSON, ContentNegotiator, MediaType};
use crate::policy::StatusOverridePolicy;
use crate::response::{ErrorResponseBuilder, Format, TypeTemplate};
use crate::resolver::RequestContext;
use std::fmt;
use std::sync::Arc;

/// Builder for an [`ExceptionResolver`]
///
/// Registrations are collected as given and validated together in
/// [`build`](Self::build), which is where every configuration mistake
/// surfaces. Registration order matters: among equally specific handlers the
/// one registered first wins.
///
/// # Example
/// ```ignore
/// let resolver = ExceptionResolver::builder()
///     .register_fn::<ZuulException, _>(|_, _| {
///         ErrorResponse::builder(StatusCode::NOT_FOUND).title("There's no Dana, only Zuul!")
///     })
///     .override_status(FailureCategory::MethodNotAllowed, 418)
///     .default_content_type(APPLICATION_XML)
///     .build()?;
/// ```
#[derive(Default)]
pub struct ResolverBuilder {
    registrations: Vec<Registration>,
    overrides: Vec<(FailureCategory, u16)>,
    default_content_type: Option<String>,
    type_template: Option<String>,
}

impl ResolverBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` for `E` and its subtypes.
    pub fn register<E: ExceptionClass>(mut self, handler: impl ExceptionHandler) -> Self {
        self.registrations.push(Registration {
            exception_type: E::descriptor(),
            handler: Arc::new(handler),
        });
        self
    }

    /// Register an already shared handler.
    pub fn register_arc<E: ExceptionClass>(mut self, handler: Arc<dyn ExceptionHandler>) -> Self {
        self.registrations.push(Registration {
            exception_type: E::descriptor(),
            handler,
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

    /// Register a handler for exactly `E` (not its subtypes).
    pub fn register_typed<E, F>(self, handler: F) -> Self
    where
        E: ExceptionClass,
        F: Fn(&E, &RequestContext) -> ErrorResponseBuilder + Send + Sync + 'static,
    {
        self.register::<E>(TypedHandler::<E, F>::new(handler))
    }

    /// Report `category` with `status` instead of its default status.
    pub fn override_status(mut self, category: FailureCategory, status: u16) -> Self {
        self.overrides.push((category, status));
        self
    }

    /// Content type used when the client expresses no usable preference.
    /// Defaults to `application/json`.
    pub fn default_content_type(mut self, media_type: impl fmt::Display) -> Self {
        self.default_content_type = Some(media_type.to_string());
        self
    }

    /// Template for the default `type` URI; must contain `{code}`.
    pub fn type_template(mut self, template: impl Into<String>) -> Self {
        self.type_template = Some(template.into());
        self
    }

    /// Apply settings loaded from configuration.
    ///
    /// A later `default_content_type` or `type_template` call replaces the
    /// configured value. Status overrides are merged instead, and a category
    /// overridden both here and through [`override_status`](Self::override_status)
    /// fails the build.
    pub fn with_config(mut self, config: ResolverConfig) -> Self {
        if let Some(media_type) = config.default_content_type {
            self.default_content_type = Some(media_type);
        }
        if let Some(template) = config.type_template {
            self.type_template = Some(template);
        }
        self.overrides.extend(config.status_overrides);
        self
    }

    /// Validate everything and freeze the resolver.
    pub fn build(self) -> Result<ExceptionResolver> {
        let default_type = match self.default_content_type {
            Some(value) => value.parse::<MediaType>()?,
            None => APPLICATION_JSON,
        };
        validate_default_type(&default_type)?;

        let type_template = match self.type_template {
            Some(template) => TypeTemplate::new(template)?,
            None => TypeTemplate::default(),
        };

        let policy = self
            .overrides
            .into_iter()
            .try_fold(StatusOverridePolicy::new(), |policy, (category, status)| {
                policy.with_override(category, status)
            })?;

        let registry = HandlerTable::new(self.registrations)?;

        tracing::info!(
            "Exception resolver ready: {} handler(s), {} status override(s), default content type {}",
            registry.len(),
            policy.len(),
            default_type
        );
        for registration in registry.iter() {
            tracing::debug!(
                "  {} -> {}",
                registration.exception_type,
                registration.handler.name()
            );
        }

        Ok(ExceptionResolver {
            registry,
            builtin: BuiltinDefaultHandler::new(),
            negotiator: ContentNegotiator::new(default_type),
            policy,
            type_template,
        })
    }
}

fn validate_default_type(media_type: &MediaType) -> Result<()> {
    if !media_type.has_utf8_charset() {
        return Err(ConfigError::UnsupportedCharset {
            media_type: media_type.to_string(),
            charset: media_type.charset().unwrap_or_default().to_string(),
        });
    }
    if Format::for_media_type(media_type).is_none() {
        return Err(ConfigError::UnsupportedMediaType {
            media_type: media_type.to_string(),
        });
    }
    Ok(())
}
