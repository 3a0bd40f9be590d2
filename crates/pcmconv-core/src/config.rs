//! Host configuration

use serde::{Deserialize, Serialize};

/// How [`crate::AudioConverter`] feeds successive buffers to its plan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversionMode {
    /// Every buffer is an independent signal
    #[default]
    OneShot,
    /// Buffers are consecutive blocks of one stream
    Loop,
}

/// Configuration of an [`crate::AudioConverter`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConverterConfig {
    /// Buffer feeding mode
    pub mode: ConversionMode,
    /// Log the stage list at info level when a plan is built
    pub log_plan: bool,
}

impl Default for ConverterConfig {
    fn default() -> Self {
        Self {
            mode: ConversionMode::OneShot,
            log_plan: true,
        }
    }
}

impl ConverterConfig {
    /// Create the default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Configuration for continuous streams
    pub fn looping() -> Self {
        Self::new().with_mode(ConversionMode::Loop)
    }

    /// Set the feeding mode
    pub fn with_mode(mut self, mode: ConversionMode) -> Self {
        self.mode = mode;
        self
    }

    /// Enable or disable plan logging
    pub fn with_log_plan(mut self, log_plan: bool) -> Self {
        self.log_plan = log_plan;
        self
    }
}
