#[cfg(feature = "cli")]
pub mod cli;
pub mod toml_config;

use crate::core::GatewayConfigProvider;
use std::collections::HashMap;

pub use toml_config::GatewayConfig;

/// Key/value settings handed over by an embedding host.
#[derive(Debug, Clone, Default)]
pub struct StaticConfig {
    fields: HashMap<String, String>,
}

impl StaticConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }
}

impl From<HashMap<String, String>> for StaticConfig {
    fn from(fields: HashMap<String, String>) -> Self {
        Self { fields }
    }
}

impl GatewayConfigProvider for StaticConfig {
    fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }
}
