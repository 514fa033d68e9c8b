//! Generator settings, loaded from an optional YAML file and then overridden by flags.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// A flag accepted before the service token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlobalFlag {
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Switch flags take no value and read as `"true"` when present.
    #[serde(default = "default_takes_value")]
    pub takes_value: bool,
    #[serde(default)]
    pub default: Option<String>,
}

fn default_takes_value() -> bool {
    true
}

impl GlobalFlag {
    pub fn value(name: &str, description: &str, default: Option<&str>) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            takes_value: true,
            default: default.map(str::to_string),
        }
    }

    pub fn switch(name: &str, description: &str) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            takes_value: false,
            default: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Program name shown in usage text.
    pub tool: String,
    /// Path prefix of the per-service modules referenced by generated code.
    pub module_path: String,
    pub max_examples: usize,
    pub global_flags: Vec<GlobalFlag>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            tool: "cli".to_string(),
            module_path: "crate".to_string(),
            max_examples: 5,
            global_flags: vec![
                GlobalFlag::value("url", "URL to service host", Some("http://localhost:8080")),
                GlobalFlag::value("timeout", "Maximum number of seconds to wait for response", Some("30")),
                GlobalFlag::switch("verbose", "Print request and response details"),
            ],
        }
    }
}

impl GeneratorConfig {
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).context("Failed to parse generator config")
    }

    /// Read a config file; `None` yields the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::from_yaml(&text)
    }
}
