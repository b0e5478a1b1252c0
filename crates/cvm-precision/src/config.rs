// Copyright (c) Asymptotic Labs
// SPDX-License-Identifier: Apache-2.0

//! Prover configuration

use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

/// Solver timeout applied when none is configured
pub const DEFAULT_TIMEOUT_MS: u64 = 5000;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProverConfig {
    /// Z3 timeout per check in milliseconds; `None` lets the solver run unbounded
    pub timeout_ms: Option<u64>,
    /// Log the assumption and assertion of every model before proving it
    pub show_props: bool,
}

impl Default for ProverConfig {
    fn default() -> Self {
        Self {
            timeout_ms: Some(DEFAULT_TIMEOUT_MS),
            show_props: false,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid prover config: {0}")]
    Parse(#[from] toml::de::Error),
}

impl ProverConfig {
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(source)?)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let source = std::fs::read_to_string(path)?;
        Self::from_toml_str(&source)
    }
}
