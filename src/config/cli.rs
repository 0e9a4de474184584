use crate::domain::model::{
    DATA_CONTENT_ACTIONS, DATA_CONTENT_DELETE_URL, DATA_CONTENT_EDIT_URL, DATA_CONTENT_KEY,
};
use crate::utils::error::Result;
use crate::utils::validation::{validate_endpoint, validate_url, Validate};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Clone, Parser)]
#[command(name = "content-actions")]
#[command(about = "Run content create/edit/delete workflows against a content backend")]
pub struct CliConfig {
    #[arg(long, global = true, help = "Path to a TOML config file")]
    pub config: Option<PathBuf>,

    #[arg(long, global = true, help = "Override transport.base_url")]
    pub base_url: Option<String>,

    #[arg(short, long, global = true, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, global = true, help = "Log as JSON lines")]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Open a blank form and create a new item
    Create(TargetArgs),
    /// Edit an existing item
    Edit(TargetArgs),
    /// Delete an existing item after confirmation
    Delete(TargetArgs),
}

impl Command {
    pub fn target(&self) -> &TargetArgs {
        match self {
            Command::Create(target) | Command::Edit(target) | Command::Delete(target) => target,
        }
    }
}

/// The data attributes the content container would carry in markup.
#[derive(Debug, Clone, Args)]
pub struct TargetArgs {
    #[arg(long)]
    pub key: Option<String>,

    #[arg(long)]
    pub edit_url: Option<String>,

    #[arg(long)]
    pub delete_url: Option<String>,

    #[arg(long, help = "Allowed actions, e.g. \"edit delete\"")]
    pub actions: Option<String>,
}

impl TargetArgs {
    pub fn data_attributes(&self) -> Vec<(&'static str, String)> {
        [
            (DATA_CONTENT_KEY, &self.key),
            (DATA_CONTENT_EDIT_URL, &self.edit_url),
            (DATA_CONTENT_DELETE_URL, &self.delete_url),
            (DATA_CONTENT_ACTIONS, &self.actions),
        ]
        .into_iter()
        .filter_map(|(name, value)| value.clone().map(|value| (name, value)))
        .collect()
    }
}

impl TargetArgs {
    /// Relative endpoints are only usable once a base URL is known.
    pub fn validate_endpoints(&self, has_base: bool) -> Result<()> {
        if let Some(url) = &self.edit_url {
            validate_endpoint("--edit-url", url, has_base)?;
        }
        if let Some(url) = &self.delete_url {
            validate_endpoint("--delete-url", url, has_base)?;
        }
        Ok(())
    }
}

impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        if let Some(base_url) = &self.base_url {
            validate_url("--base-url", base_url)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_edit_command() {
        let config = CliConfig::parse_from([
            "content-actions",
            "edit",
            "--key",
            "42",
            "--edit-url",
            "https://hub.example.com/content/edit",
            "--verbose",
        ]);
        assert!(config.verbose);
        let Command::Edit(target) = &config.command else {
            panic!("expected edit command");
        };
        assert_eq!(target.key.as_deref(), Some("42"));
        assert!(config.validate().is_ok());
        assert_eq!(
            target.data_attributes(),
            vec![
                (DATA_CONTENT_KEY, "42".to_string()),
                (
                    DATA_CONTENT_EDIT_URL,
                    "https://hub.example.com/content/edit".to_string()
                ),
            ]
        );
    }

    #[test]
    fn test_relative_url_needs_base() {
        let config = CliConfig::parse_from(["content-actions", "delete", "--delete-url", "/delete"]);
        assert!(config.validate().is_ok());
        assert!(config.command.target().validate_endpoints(false).is_err());
        assert!(config.command.target().validate_endpoints(true).is_ok());
    }

    #[test]
    fn test_config_file_alone_does_not_supply_base() {
        let config = CliConfig::parse_from([
            "content-actions",
            "edit",
            "--edit-url",
            "/content/edit",
            "--config",
            "content.toml",
        ]);
        let loaded = crate::config::ContentConfig::from_toml_str("[content]\nactions = [\"edit\"]\n")
            .unwrap();
        let has_base = loaded.transport.base_url.is_some();
        assert!(config
            .command
            .target()
            .validate_endpoints(has_base)
            .is_err());
    }

    #[test]
    fn test_invalid_base_url_override() {
        let config = CliConfig::parse_from([
            "content-actions",
            "delete",
            "--base-url",
            "not a url",
        ]);
        assert!(config.validate().is_err());
    }
}
