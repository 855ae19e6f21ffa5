//! Media tree commands.

use clap::{Args, Subcommand, ValueEnum};
use serde::Serialize;
use tabled::Tabled;

use mediastore_core::error::AppError;
use mediastore_core::types::{ItemId, SortDirection};
use mediastore_entity::{MediaItem, MediaMetadata, MediaSortKey};
use mediastore_service::{BatchReport, MoveOutcome, ServiceContext};

use super::parse_parent;
use crate::output::{self, OutputFormat};

/// Arguments for media commands
#[derive(Debug, Args)]
pub struct MediaArgs {
    /// Media subcommand
    #[command(subcommand)]
    pub command: MediaCommand,
}

/// Sort column for listings
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum SortArg {
    /// Name, case-insensitive
    Name,
    /// Last update
    Updated,
    /// Creation time
    Created,
    /// Kind, then name
    Kind,
}

impl From<SortArg> for MediaSortKey {
    fn from(arg: SortArg) -> Self {
        match arg {
            SortArg::Name => Self::Name,
            SortArg::Updated => Self::Updated,
            SortArg::Created => Self::Created,
            SortArg::Kind => Self::Kind,
        }
    }
}

/// Media subcommands
#[derive(Debug, Subcommand)]
pub enum MediaCommand {
    /// List a folder's children (root when omitted)
    Ls {
        /// Folder ID
        folder: Option<String>,
        /// Sort column
        #[arg(short, long, value_enum, default_value = "name")]
        sort: SortArg,
        /// Sort descending
        #[arg(long)]
        desc: bool,
        /// Bypass the cache
        #[arg(long)]
        force: bool,
    },
    /// Create a folder
    Mkdir {
        /// Folder name
        name: String,
        /// Parent folder ID (omit for root)
        #[arg(short, long)]
        parent: Option<String>,
    },
    /// Move items into a folder
    Mv {
        /// Item IDs
        #[arg(required = true)]
        ids: Vec<String>,
        /// Target folder ID (`root` or omitted for root)
        #[arg(short, long)]
        to: Option<String>,
    },
    /// Rename an item
    Rename {
        /// Item ID
        id: String,
        /// New name
        name: String,
        /// Alt text
        #[arg(long)]
        alt: Option<String>,
        /// Caption
        #[arg(long)]
        caption: Option<String>,
    },
    /// Delete items
    Rm {
        /// Item IDs
        #[arg(required = true)]
        ids: Vec<String>,
        /// Also delete folder contents
        #[arg(short, long)]
        recursive: bool,
    },
    /// Show an item's location
    Crumbs {
        /// Item ID
        id: String,
    },
}

/// Media display row
#[derive(Debug, Serialize, Tabled)]
struct MediaRow {
    /// Item ID
    id: String,
    /// Name
    name: String,
    /// Kind
    kind: String,
    /// Size
    size: String,
    /// Updated at
    updated: String,
}

impl From<&MediaItem> for MediaRow {
    fn from(item: &MediaItem) -> Self {
        Self {
            id: item.id.to_string(),
            name: item.name.clone(),
            kind: item.kind.to_string(),
            size: item.size_bytes.map(output::format_size).unwrap_or_else(|| "-".into()),
            updated: item.updated_at.format("%Y-%m-%d %H:%M").to_string(),
        }
    }
}

/// Batch result row
#[derive(Debug, Serialize, Tabled)]
struct BatchRow {
    /// Item ID
    id: String,
    /// Result
    result: String,
}

fn print_report(report: &BatchReport, format: OutputFormat) {
    let rows: Vec<BatchRow> = report
        .succeeded
        .iter()
        .map(|id| BatchRow {
            id: id.to_string(),
            result: "ok".into(),
        })
        .chain(report.failed.iter().map(|(id, e)| BatchRow {
            id: id.to_string(),
            result: e.to_string(),
        }))
        .collect();
    output::print_list(&rows, format);
    if !report.is_complete() {
        output::print_warning(&format!("{} of {} failed", report.failed.len(), report.len()));
    }
}

/// Execute media commands
pub async fn execute(
    args: &MediaArgs,
    ctx: &ServiceContext,
    format: OutputFormat,
) -> Result<(), AppError> {
    let tree = &ctx.media;

    match &args.command {
        MediaCommand::Ls {
            folder,
            sort,
            desc,
            force,
        } => {
            if *force {
                tree.gateway().get_all(true).await?;
            }
            let direction = if *desc {
                SortDirection::Desc
            } else {
                SortDirection::Asc
            };
            let parent = parse_parent(folder.as_deref());
            let items = tree
                .list_children(parent.as_ref(), (*sort).into(), direction)
                .await?;
            let rows: Vec<MediaRow> = items.iter().map(MediaRow::from).collect();
            output::print_list(&rows, format);
        }
        MediaCommand::Mkdir { name, parent } => {
            let parent = parse_parent(parent.as_deref());
            let folder = tree.create_folder(name, parent.as_ref()).await?;
            output::print_success(&format!("Folder '{}' created (id: {})", folder.name, folder.id));
        }
        MediaCommand::Mv { ids, to } => {
            let target = parse_parent(to.as_deref());
            if let [id] = ids.as_slice() {
                match tree.move_item(&ItemId::from(id.as_str()), target.as_ref()).await? {
                    MoveOutcome::Moved(item) => {
                        output::print_success(&format!("Moved '{}'", item.name))
                    }
                    MoveOutcome::Unchanged => output::print_warning("Already in that folder"),
                }
            } else {
                let ids: Vec<ItemId> = ids.iter().map(|id| ItemId::from(id.as_str())).collect();
                let report = tree.bulk_move(&ids, target.as_ref()).await?;
                print_report(&report, format);
            }
        }
        MediaCommand::Rename {
            id,
            name,
            alt,
            caption,
        } => {
            let metadata = (alt.is_some() || caption.is_some()).then(|| MediaMetadata {
                alt_text: alt.clone(),
                caption: caption.clone(),
            });
            let item = tree
                .rename(&ItemId::from(id.as_str()), name, metadata)
                .await?;
            output::print_success(&format!("Renamed to '{}'", item.name));
        }
        MediaCommand::Rm { ids, recursive } => {
            let ids: Vec<ItemId> = ids.iter().map(|id| ItemId::from(id.as_str())).collect();
            if *recursive {
                for id in &ids {
                    let report = tree.delete_recursive(id).await?;
                    print_report(&report, format);
                }
            } else {
                let report = tree.bulk_delete(&ids).await?;
                print_report(&report, format);
            }
        }
        MediaCommand::Crumbs { id } => {
            let id = ItemId::from(id.as_str());
            let crumbs = tree.breadcrumbs(&id).await?;
            let path = tree.path(&id).await?;
            if format == OutputFormat::Table {
                output::print_kv("Path", &path);
            }
            let rows: Vec<MediaRow> = crumbs.iter().map(MediaRow::from).collect();
            output::print_list(&rows, format);
        }
    }

    Ok(())
}
