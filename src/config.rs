//! Provider configuration
//!
//! Loaded from a JSON file. Every field is optional except the entity
//! mappings, which default to none.
//!
//! Error codes:
//! - AERO_CONFIG_IO (FATAL)
//! - AERO_CONFIG_PARSE (FATAL)
//! - AERO_CONFIG_INVALID (FATAL)

use std::fmt;
use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::executor::RetryWithBackoff;
use crate::mapping::{EntityMapping, StaticMappings};

/// Configuration error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigErrorCode {
    /// Config file could not be read
    AeroConfigIo,
    /// Config file is not valid JSON for this schema
    AeroConfigParse,
    /// Config parsed but holds invalid values
    AeroConfigInvalid,
}

impl ConfigErrorCode {
    pub fn code(&self) -> &'static str {
        match self {
            ConfigErrorCode::AeroConfigIo => "AERO_CONFIG_IO",
            ConfigErrorCode::AeroConfigParse => "AERO_CONFIG_PARSE",
            ConfigErrorCode::AeroConfigInvalid => "AERO_CONFIG_INVALID",
        }
    }
}

impl fmt::Display for ConfigErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

#[derive(Debug, Clone)]
pub struct ConfigError {
    code: ConfigErrorCode,
    message: String,
}

impl ConfigError {
    pub fn io(path: &Path, err: std::io::Error) -> Self {
        Self {
            code: ConfigErrorCode::AeroConfigIo,
            message: format!("failed to read config '{}': {}", path.display(), err),
        }
    }

    pub fn parse(err: serde_json::Error) -> Self {
        Self {
            code: ConfigErrorCode::AeroConfigParse,
            message: format!("invalid config JSON: {}", err),
        }
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        Self {
            code: ConfigErrorCode::AeroConfigInvalid,
            message: message.into(),
        }
    }

    pub fn code(&self) -> ConfigErrorCode {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[FATAL] {}: {}", self.code, self.message)
    }
}

impl std::error::Error for ConfigError {}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Retry policy for store round trips
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Retries after the first attempt (default: 3)
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Delay before the first retry (default: 50ms)
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,

    /// Upper bound on any single delay (default: 2000ms)
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
}

fn default_max_retries() -> u32 {
    3
}
fn default_base_delay_ms() -> u64 {
    50
}
fn default_max_delay_ms() -> u64 {
    2000
}
fn default_auto_paginate() -> bool {
    true
}
fn default_log_diagnostics() -> bool {
    true
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            base_delay_ms: default_base_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
        }
    }
}

impl RetryConfig {
    pub fn strategy(&self) -> RetryWithBackoff {
        RetryWithBackoff::new(
            self.max_retries,
            Duration::from_millis(self.base_delay_ms),
            Duration::from_millis(self.max_delay_ms),
        )
    }
}

/// Query provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Page size requested from the store; absent lets the store decide
    #[serde(default)]
    pub default_page_size: Option<u32>,

    /// Follow continuation tokens (default: true)
    #[serde(default = "default_auto_paginate")]
    pub auto_paginate: bool,

    #[serde(default)]
    pub retry: RetryConfig,

    /// Emit diagnostics through the JSON logger (default: true)
    #[serde(default = "default_log_diagnostics")]
    pub log_diagnostics: bool,

    #[serde(default)]
    pub mappings: Vec<EntityMapping>,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            default_page_size: None,
            auto_paginate: default_auto_paginate(),
            retry: RetryConfig::default(),
            log_diagnostics: default_log_diagnostics(),
            mappings: Vec::new(),
        }
    }
}

impl ProviderConfig {
    /// Reads, parses and validates a config file
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::io(path, e))?;
        Self::from_json_str(&content)
    }

    pub fn from_json_str(content: &str) -> ConfigResult<Self> {
        let config: ProviderConfig = serde_json::from_str(content).map_err(ConfigError::parse)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.default_page_size == Some(0) {
            return Err(ConfigError::invalid("default_page_size must be > 0"));
        }
        if self.retry.max_delay_ms < self.retry.base_delay_ms {
            return Err(ConfigError::invalid(format!(
                "retry.max_delay_ms ({}) must be >= retry.base_delay_ms ({})",
                self.retry.max_delay_ms, self.retry.base_delay_ms
            )));
        }
        self.static_mappings().map(|_| ())
    }

    /// Builds a mapping provider from the declared mappings
    pub fn static_mappings(&self) -> ConfigResult<StaticMappings> {
        StaticMappings::from_mappings(self.mappings.iter().cloned())
            .map_err(|e| ConfigError::invalid(format!("mapping error: {}", e)))
    }
}
