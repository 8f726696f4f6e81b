//! Client configuration

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::multiplexer::BufferPolicy;

/// Engine log levels, most to least severe
pub const LOG_LEVELS: &[&str] = &["error", "warn", "info", "debug", "trace"];

/// Configuration for a lightlink [`Client`](crate::Client)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Buffering policy applied to response subscriptions
    pub buffer_policy: BufferPolicy,
    /// Engine log level; overrides the `RUST_LOG` environment variable
    pub log_level: Option<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            buffer_policy: BufferPolicy::Unbounded,
            log_level: None,
        }
    }
}

/// Builder for ClientConfig
pub struct ClientConfigBuilder {
    config: ClientConfig,
}

impl ClientConfigBuilder {
    /// Create a new builder with default values
    pub fn new() -> Self {
        Self {
            config: ClientConfig::default(),
        }
    }

    /// Set the subscription buffering policy
    pub fn buffer_policy(mut self, policy: BufferPolicy) -> Self {
        self.config.buffer_policy = policy;
        self
    }

    /// Bound subscription buffers, evicting the oldest response on overflow
    pub fn drop_oldest(mut self, capacity: usize) -> Self {
        self.config.buffer_policy = BufferPolicy::DropOldest(capacity);
        self
    }

    /// Bound subscription buffers, discarding the incoming response on overflow
    pub fn drop_newest(mut self, capacity: usize) -> Self {
        self.config.buffer_policy = BufferPolicy::DropNewest(capacity);
        self
    }

    /// Bound subscription buffers, failing the stream on overflow
    pub fn fail_on_overflow(mut self, capacity: usize) -> Self {
        self.config.buffer_policy = BufferPolicy::Error(capacity);
        self
    }

    /// Set an explicit engine log level instead of reading `RUST_LOG`
    pub fn log_level<S: Into<String>>(mut self, level: S) -> Self {
        self.config.log_level = Some(level.into());
        self
    }

    /// Build the configuration
    pub fn build(self) -> ClientConfig {
        self.config
    }
}

impl Default for ClientConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ClientConfig {
    /// Create a new builder
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::new()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        match self.buffer_policy {
            BufferPolicy::DropOldest(0) | BufferPolicy::DropNewest(0) | BufferPolicy::Error(0) => {
                return Err(anyhow::anyhow!("buffer capacity must be greater than 0"));
            }
            _ => {}
        }

        if let Some(level) = &self.log_level {
            if !LOG_LEVELS.contains(&level.as_str()) {
                return Err(anyhow::anyhow!(
                    "unrecognized log level `{}`, expected one of {:?}",
                    level,
                    LOG_LEVELS
                ));
            }
        }

        Ok(())
    }
}
