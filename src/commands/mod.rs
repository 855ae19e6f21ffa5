//! CLI command definitions and dispatch.

pub mod media;
pub mod project;
pub mod settings;
pub mod upload;

use clap::{Parser, Subcommand};

use mediastore_core::config::AppConfig;
use mediastore_core::error::AppError;
use mediastore_core::types::ItemId;
use mediastore_service::ServiceContext;

use crate::output::OutputFormat;

/// MediaStore: media library and site content administration
#[derive(Debug, Parser)]
#[command(name = "mediastore", version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/default.toml")]
    pub config: String,

    /// Environment overlay loaded from `config/<env>.toml`
    #[arg(short, long, default_value = "development")]
    pub env: String,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Browse and organise the media tree
    Media(media::MediaArgs),
    /// Upload files into the media tree
    Upload(upload::UploadArgs),
    /// Manage portfolio projects
    Project(project::ProjectArgs),
    /// Show or change site settings
    Settings(settings::SettingsArgs),
}

impl Cli {
    /// Load configuration from the selected file and environment.
    pub fn load_config(&self) -> Result<AppConfig, AppError> {
        AppConfig::load(&self.config, &self.env)
    }

    /// Run the selected command against freshly wired services.
    pub async fn execute(&self, config: &AppConfig) -> Result<(), AppError> {
        let ctx = ServiceContext::from_config(config).await?;

        let result = match &self.command {
            Commands::Media(args) => media::execute(args, &ctx, self.format).await,
            Commands::Upload(args) => upload::execute(args, &ctx, self.format).await,
            Commands::Project(args) => project::execute(args, &ctx, self.format).await,
            Commands::Settings(args) => settings::execute(args, &ctx, self.format).await,
        };

        ctx.shutdown().await;
        result
    }
}

/// Parse an optional folder argument; `root` and an empty value mean root.
pub(crate) fn parse_parent(value: Option<&str>) -> Option<ItemId> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty() && !v.eq_ignore_ascii_case("root"))
        .map(ItemId::from)
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_parent() {
        assert_eq!(parse_parent(None), None);
        assert_eq!(parse_parent(Some("root")), None);
        assert_eq!(parse_parent(Some(" ")), None);
        assert_eq!(parse_parent(Some("abc")), Some(ItemId::from("abc")));
    }

    #[test]
    fn test_parses_media_move() {
        let cli = Cli::try_parse_from(["mediastore", "-f", "json", "media", "mv", "a", "b", "--to", "f1"])
            .unwrap();
        assert_eq!(cli.format, OutputFormat::Json);
        assert!(matches!(cli.command, Commands::Media(_)));
    }
}
