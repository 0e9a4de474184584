#[cfg(feature = "cli")]
pub mod cli;

#[cfg(feature = "cli")]
pub use cli::{CliConfig, Command, TargetArgs};

use crate::core::content::{ContentOptions, DeleteFailure};
use crate::domain::model::{Action, AllowedActions};
use crate::utils::error::{ContentError, Result};
use crate::utils::validation::{self, Validate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

const DEFAULT_TIMEOUT_SECONDS: u64 = 30;
const DEFAULT_REMOVE_ANIMATION_MS: u64 = 200;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContentConfig {
    #[serde(default)]
    pub transport: TransportConfig,
    #[serde(default)]
    pub content: ContentSection,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TransportConfig {
    pub base_url: Option<String>,
    pub timeout_seconds: Option<u64>,
    pub headers: Option<HashMap<String, String>>,
}

impl TransportConfig {
    pub fn timeout_seconds(&self) -> u64 {
        self.timeout_seconds.unwrap_or(DEFAULT_TIMEOUT_SECONDS)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContentSection {
    pub actions: Option<Vec<Action>>,
    pub remove_animation_ms: Option<u64>,
    pub delete_failure: Option<DeleteFailure>,
}

impl ContentConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| ContentError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// Replaces `${VAR}` with the environment value; unknown variables stay as written.
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| ContentError::ConfigValidationError {
            field: "env_substitution".to_string(),
            message: e.to_string(),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn default_actions(&self) -> AllowedActions {
        match &self.content.actions {
            Some(actions) => actions.iter().copied().collect(),
            None => AllowedActions::all(),
        }
    }

    pub fn content_options(&self) -> ContentOptions {
        ContentOptions {
            default_actions: self.default_actions(),
            remove_animation: Duration::from_millis(
                self.content
                    .remove_animation_ms
                    .unwrap_or(DEFAULT_REMOVE_ANIMATION_MS),
            ),
            delete_failure: self.content.delete_failure.unwrap_or_default(),
        }
    }

    pub fn validate_config(&self) -> Result<()> {
        if let Some(base_url) = &self.transport.base_url {
            validation::validate_url("transport.base_url", base_url)?;
        }

        validation::validate_positive_number(
            "transport.timeout_seconds",
            self.transport.timeout_seconds(),
            1,
        )?;

        if let Some(ms) = self.content.remove_animation_ms {
            validation::validate_range("content.remove_animation_ms", ms, 0, 10_000)?;
        }

        Ok(())
    }
}

impl Validate for ContentConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
