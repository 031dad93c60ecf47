//! Configuration loading.
//!
//! Configuration is layered with figment, in order of priority:
//! 1. Default values (compiled in)
//! 2. Config file: `spanctx.toml` in the working directory (optional)
//! 3. Environment variables prefixed `SPANCTX_`, with `__` separating
//!    sections, e.g. `SPANCTX_LAMBDA__MAX_CLIENT_CONTEXT_BYTES`
//!
//! The defaults interoperate with stock Jaeger clients. Override them only
//! when every producer and consumer of a queue agrees on the new values.

use crate::error::Result;
use crate::jaeger::{TRACE_BAGGAGE_HEADER_PREFIX, TRACE_CONTEXT_HEADER_NAME};
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::Path;

const DEFAULT_CONFIG_PATH: &str = "spanctx.toml";
const ENV_PREFIX: &str = "SPANCTX_";

/// Maximum length of the encoded Lambda client context.
///
/// Lambda caps the raw field at 3583 bytes of base64.
pub const MAX_CLIENT_CONTEXT_BYTES: usize = 3583;

/// Main configuration struct.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Carrier key names.
    pub headers: HeadersConfig,
    /// Lambda client context settings.
    pub lambda: LambdaConfig,
}

impl Config {
    /// Loads configuration from all sources.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration parsing fails.
    pub fn load() -> Result<Self> {
        Self::load_from_path(DEFAULT_CONFIG_PATH)
    }

    /// Loads configuration from a custom config file path.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration parsing fails.
    pub fn load_from_path<P: AsRef<Path>>(config_path: P) -> Result<Self> {
        let mut figment = Figment::from(Serialized::defaults(Config::default()));

        if config_path.as_ref().exists() {
            figment = figment.merge(Toml::file(config_path));
        }

        figment = figment.merge(Env::prefixed(ENV_PREFIX).split("__"));

        Ok(figment.extract()?)
    }

    /// Creates a new config builder.
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::new()
    }
}

/// Names of the carrier keys used by the Jaeger text-map format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeadersConfig {
    /// Key holding the serialised span context.
    pub trace_context_header_name: String,
    /// Prefix of keys holding baggage items.
    pub trace_baggage_header_prefix: String,
}

impl Default for HeadersConfig {
    fn default() -> Self {
        Self {
            trace_context_header_name: TRACE_CONTEXT_HEADER_NAME.to_string(),
            trace_baggage_header_prefix: TRACE_BAGGAGE_HEADER_PREFIX.to_string(),
        }
    }
}

/// Lambda client context configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LambdaConfig {
    /// Maximum length of the base64 client context in bytes.
    ///
    /// Values above [`MAX_CLIENT_CONTEXT_BYTES`] are clamped by the codec.
    pub max_client_context_bytes: usize,
}

impl Default for LambdaConfig {
    fn default() -> Self {
        Self {
            max_client_context_bytes: MAX_CLIENT_CONTEXT_BYTES,
        }
    }
}

/// Builder for constructing configuration programmatically.
#[must_use = "builders do nothing unless .build() is called"]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Creates a new config builder with default values.
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    /// Sets the trace context key.
    pub fn trace_context_header_name(mut self, name: impl Into<String>) -> Self {
        self.config.headers.trace_context_header_name = name.into();
        self
    }

    /// Sets the baggage key prefix.
    pub fn trace_baggage_header_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.config.headers.trace_baggage_header_prefix = prefix.into();
        self
    }

    /// Sets the maximum encoded client context length.
    pub fn max_client_context_bytes(mut self, limit: usize) -> Self {
        self.config.lambda.max_client_context_bytes = limit;
        self
    }

    /// Builds the configuration.
    pub fn build(self) -> Config {
        self.config
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
