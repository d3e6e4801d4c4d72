//! Oracle types for configuration and requests.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::core::config::GeneratorConfig;
use crate::core::errors::{DocsmithError, Result};
use crate::core::model::RoutineMetadata;

/// Default request timeout for the completion endpoint.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Configuration for the content oracle
#[derive(Debug, Clone)]
pub struct OracleConfig {
    /// API key read from the environment
    pub api_key: String,
    /// Chat-completions endpoint
    pub api_endpoint: String,
    /// Model name
    pub model: String,
    /// Sampling temperature
    pub temperature: f32,
    /// Per-request timeout
    pub request_timeout: Duration,
}

/// Factory and builder methods for [`OracleConfig`].
impl OracleConfig {
    /// Create configuration from `generator`, reading the key from the
    /// environment variable it names.
    ///
    /// A missing or empty key is a configuration error.
    pub fn from_env(generator: &GeneratorConfig) -> Result<Self> {
        let api_key = std::env::var(&generator.api_key_env)
            .ok()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| {
                DocsmithError::config_field(
                    format!("{} environment variable not set", generator.api_key_env),
                    "generator.api_key_env",
                )
            })?;

        Ok(Self::with_key(generator, api_key))
    }

    /// Create configuration with an explicit key.
    pub fn with_key(generator: &GeneratorConfig, api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            api_endpoint: generator.endpoint.clone(),
            model: generator.model.clone(),
            temperature: generator.temperature,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    /// Sets the endpoint.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.api_endpoint = endpoint.into();
        self
    }

    /// Sets the per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
}

/// What the oracle is told about one routine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentRequest {
    /// Routine name
    pub name: String,
    /// Declared argument names, in order
    pub args: Vec<String>,
    /// Return annotation, if any
    pub returns: Option<String>,
    /// Raised expressions found in the body
    pub raises: Vec<String>,
}

impl ContentRequest {
    /// Build the request for `routine`.
    pub fn from_routine(routine: &RoutineMetadata) -> Self {
        Self {
            name: routine.name.clone(),
            args: routine.arg_names().into_iter().map(str::to_string).collect(),
            returns: routine.returns.clone(),
            raises: routine.raises.iter().cloned().collect(),
        }
    }
}
