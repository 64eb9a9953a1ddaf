use crate::error::{ConfigError, Result};
use crate::exception::FailureCategory;
use dashmap::DashMap;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::env;
use std::str::FromStr;
use std::sync::Arc;

pub const DEFAULT_CONTENT_TYPE_KEY: &str = "PROBLEM_DEFAULT_CONTENT_TYPE";
pub const TYPE_TEMPLATE_KEY: &str = "PROBLEM_TYPE_TEMPLATE";
pub const STATUS_OVERRIDES_KEY: &str = "PROBLEM_STATUS_OVERRIDES";

/// Configuration service
#[derive(Clone, Default)]
pub struct ConfigService {
    config: Arc<DashMap<String, String>>,
}

impl ConfigService {
    /// Seeded from the process environment.
    pub fn new() -> Self {
        Self::with_values(env::vars())
    }

    pub fn with_values<I, K, V>(values: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let service = Self::default();
        for (key, value) in values {
            service.set(key.as_ref(), value.as_ref());
        }
        service
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.config.get(key).map(|v| v.clone())
    }

    pub fn set(&self, key: &str, value: &str) {
        self.config.insert(key.to_string(), value.to_string());
    }
}

/// Resolver settings that can come from configuration rather than code.
///
/// Unset fields leave the builder's defaults alone.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    pub default_content_type: Option<String>,
    pub type_template: Option<String>,
    pub status_overrides: BTreeMap<FailureCategory, u16>,
}

impl ResolverConfig {
    /// Read the `PROBLEM_*` keys from `service`.
    ///
    /// Overrides are written as `method_not_allowed=418,not_found=410`.
    pub fn from_service(service: &ConfigService) -> Result<Self> {
        let status_overrides = match service.get(STATUS_OVERRIDES_KEY) {
            Some(raw) => parse_overrides(&raw)?,
            None => BTreeMap::new(),
        };

        Ok(Self {
            default_content_type: non_empty(service.get(DEFAULT_CONTENT_TYPE_KEY)),
            type_template: non_empty(service.get(TYPE_TEMPLATE_KEY)),
            status_overrides,
        })
    }

    pub fn from_env() -> Result<Self> {
        Self::from_service(&ConfigService::new())
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_overrides(raw: &str) -> Result<BTreeMap<FailureCategory, u16>> {
    let mut overrides = BTreeMap::new();

    for entry in raw.split(',').map(str::trim).filter(|e| !e.is_empty()) {
        let (category, status) = entry.split_once('=').ok_or_else(|| {
            ConfigError::invalid_value(
                STATUS_OVERRIDES_KEY,
                format!("expected category=status, got '{}'", entry),
            )
        })?;

        let category = category.trim();
        let category = FailureCategory::from_str(category)
            .map_err(|_| ConfigError::UnknownCategory(category.to_string()))?;
        let status = status.trim().parse::<u16>().map_err(|e| {
            ConfigError::invalid_value(
                STATUS_OVERRIDES_KEY,
                format!("bad status for {}: {}", category, e),
            )
        })?;

        overrides.insert(category, status);
    }

    Ok(overrides)
}
