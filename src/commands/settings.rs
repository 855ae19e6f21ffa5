//! Site settings commands.

use clap::{Args, Subcommand};

use mediastore_core::error::AppError;
use mediastore_entity::{SettingsPatch, SiteSettings};
use mediastore_service::ServiceContext;

use crate::output::{self, OutputFormat};

/// Arguments for settings commands
#[derive(Debug, Args)]
pub struct SettingsArgs {
    /// Settings subcommand
    #[command(subcommand)]
    pub command: SettingsCommand,
}

/// Settings subcommands
#[derive(Debug, Subcommand)]
pub enum SettingsCommand {
    /// Show the current settings
    Show {
        /// Bypass the cache
        #[arg(long)]
        force: bool,
    },
    /// Change settings; unspecified fields keep their value
    Set {
        /// Site title
        #[arg(long)]
        title: Option<String>,
        /// Tagline
        #[arg(long)]
        tagline: Option<String>,
        /// Contact email
        #[arg(long)]
        email: Option<String>,
        /// Hero headline
        #[arg(long)]
        headline: Option<String>,
        /// Social profile URL, repeatable; replaces the list
        #[arg(long = "link")]
        links: Vec<String>,
    },
}

fn print_settings(settings: &SiteSettings, format: OutputFormat) {
    let pairs = [
        ("Title", settings.site_title.clone()),
        ("Tagline", output::or_dash(settings.tagline.as_deref())),
        ("Email", output::or_dash(settings.contact_email.as_deref())),
        ("Headline", output::or_dash(settings.hero_headline.as_deref())),
        ("Links", settings.social_links.join(", ")),
        ("Updated", settings.updated_at.format("%Y-%m-%d %H:%M").to_string()),
    ];
    output::print_record(settings, &pairs, format);
}

/// Execute settings commands
pub async fn execute(
    args: &SettingsArgs,
    ctx: &ServiceContext,
    format: OutputFormat,
) -> Result<(), AppError> {
    match &args.command {
        SettingsCommand::Show { force } => match ctx.settings.get(*force).await? {
            Some(settings) => print_settings(&settings, format),
            None => output::print_warning("No settings saved yet"),
        },
        SettingsCommand::Set {
            title,
            tagline,
            email,
            headline,
            links,
        } => {
            if ctx.settings.get(true).await?.is_none() {
                let initial = SiteSettings::new(title.clone().unwrap_or_default());
                ctx.settings.save(&initial).await?;
            }
            let patch = SettingsPatch {
                site_title: title.clone(),
                tagline: tagline.clone().map(Some),
                contact_email: email.clone().map(Some),
                hero_headline: headline.clone().map(Some),
                social_links: (!links.is_empty()).then(|| links.clone()),
                ..SettingsPatch::new()
            };
            let settings = ctx.settings.update(patch).await?;
            output::print_success("Settings saved");
            print_settings(&settings, format);
        }
    }

    Ok(())
}
