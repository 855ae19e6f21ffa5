//! File upload command.

use std::path::PathBuf;

use clap::Args;
use serde::Serialize;
use tabled::Tabled;

use mediastore_core::error::AppError;
use mediastore_service::{RawFile, ServiceContext, UploadOutcome};

use super::parse_parent;
use crate::output::{self, OutputFormat};

/// Arguments for the upload command
#[derive(Debug, Args)]
pub struct UploadArgs {
    /// Files to upload, processed in order
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// Target folder ID (omit for root)
    #[arg(short, long)]
    pub parent: Option<String>,
}

/// Upload result row
#[derive(Debug, Serialize, Tabled)]
struct UploadRow {
    /// File name
    file: String,
    /// Final status
    status: String,
    /// Created item or failure reason
    detail: String,
}

impl From<&UploadOutcome> for UploadRow {
    fn from(outcome: &UploadOutcome) -> Self {
        match outcome {
            UploadOutcome::Completed(item) => Self {
                file: item.name.clone(),
                status: "completed".into(),
                detail: item.id.to_string(),
            },
            UploadOutcome::Failed { file_name, error } => Self {
                file: file_name.clone(),
                status: "error".into(),
                detail: error.message.clone(),
            },
            UploadOutcome::Cancelled { file_name } => Self {
                file: file_name.clone(),
                status: "cancelled".into(),
                detail: "-".into(),
            },
        }
    }
}

async fn read_file(path: &PathBuf) -> Result<RawFile, AppError> {
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| AppError::validation(format!("Not a file path: {}", path.display())))?
        .to_string();
    let data = tokio::fs::read(path).await.map_err(|e| {
        AppError::with_source(
            mediastore_core::error::ErrorKind::Storage,
            format!("Failed to read {}", path.display()),
            e,
        )
    })?;
    Ok(RawFile::guessed(file_name, data))
}

/// Execute the upload command
pub async fn execute(
    args: &UploadArgs,
    ctx: &ServiceContext,
    format: OutputFormat,
) -> Result<(), AppError> {
    let mut files = Vec::with_capacity(args.files.len());
    for path in &args.files {
        files.push(read_file(path).await?);
    }

    let parent = parse_parent(args.parent.as_deref());
    let outcomes = ctx.uploads.upload_batch(files, parent.as_ref()).await;

    let rows: Vec<UploadRow> = outcomes.iter().map(UploadRow::from).collect();
    output::print_list(&rows, format);

    let failed = outcomes.iter().filter(|o| o.error().is_some()).count();
    if failed > 0 {
        output::print_warning(&format!("{failed} of {} files failed", outcomes.len()));
    }
    Ok(())
}
