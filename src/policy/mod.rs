//! Status overrides
//!
//! Lets an application change the status a built-in failure category is
//! reported with (say, 405 → 418) without writing a handler of its own.

use crate::error::{ConfigError, Result};
use crate::exception::FailureCategory;
use crate::response::is_valid_status;
use axum::http::StatusCode;
use std::collections::HashMap;
use std::fmt;

/// Which handler produced a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandlerIdentity {
    /// The built-in default handler, with the category it rendered (if any).
    Builtin(Option<FailureCategory>),
    /// A globally registered handler, by the exception type it was
    /// registered for.
    Registered(&'static str),
    /// A handler local to the invoked operation.
    Local(&'static str),
}

impl HandlerIdentity {
    pub fn category(&self) -> Option<FailureCategory> {
        match self {
            Self::Builtin(category) => *category,
            Self::Registered(_) | Self::Local(_) => None,
        }
    }
}

impl fmt::Display for HandlerIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Builtin(Some(category)) => write!(f, "builtin:{}", category),
            Self::Builtin(None) => f.write_str("builtin"),
            Self::Registered(name) => write!(f, "registered:{}", name),
            Self::Local(name) => write!(f, "local:{}", name),
        }
    }
}

/// Category → status remapping, fixed at startup.
#[derive(Debug, Clone, Default)]
pub struct StatusOverridePolicy {
    overrides: HashMap<FailureCategory, StatusCode>,
}

impl StatusOverridePolicy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an override; `status` must be 100-599 and each category may be
    /// overridden only once.
    pub fn with_override(mut self, category: FailureCategory, status: u16) -> Result<Self> {
        let status = validate_status(category, status)?;
        if self.overrides.insert(category, status).is_some() {
            return Err(ConfigError::DuplicateOverride {
                category: category.to_string(),
            });
        }
        Ok(self)
    }

    /// The replacement for `default_status`, if one is configured for the
    /// handler's category.
    pub fn override_status(
        &self,
        identity: &HandlerIdentity,
        default_status: StatusCode,
    ) -> Option<StatusCode> {
        let category = identity.category()?;
        let replacement = self.overrides.get(&category).copied()?;
        (replacement != default_status).then_some(replacement)
    }

    pub fn is_empty(&self) -> bool {
        self.overrides.is_empty()
    }

    pub fn len(&self) -> usize {
        self.overrides.len()
    }
}

fn validate_status(category: FailureCategory, status: u16) -> Result<StatusCode> {
    let invalid = || ConfigError::InvalidStatus {
        category: category.to_string(),
        status,
    };
    if !is_valid_status(status) {
        return Err(invalid());
    }
    StatusCode::from_u16(status).map_err(|_| invalid())
}
