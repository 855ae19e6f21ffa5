//! Ingest of raw files into the media tree.

use std::fmt;
use std::sync::Arc;

use bytes::Bytes;
use tracing::{debug, info, warn};

use mediastore_core::config::UploadConfig;
use mediastore_core::error::AppError;
use mediastore_core::result::AppResult;
use mediastore_core::traits::storage::UploadOptions;
use mediastore_core::types::ItemId;
use mediastore_entity::media::BlobInfo;
use mediastore_entity::{ItemKind, MediaItem};
use mediastore_storage::MediaTransformer;

use super::tracker::{UploadStatus, UploadTracker};
use crate::tree::MediaTree;

const FALLBACK_MIME: &str = "application/octet-stream";

/// A file handed to the pipeline.
#[derive(Debug, Clone)]
pub struct RawFile {
    /// File name including extension.
    pub file_name: String,
    /// Declared MIME type, if the source provided one.
    pub mime_type: Option<String>,
    /// File content.
    pub data: Bytes,
}

impl RawFile {
    /// A file with a declared MIME type.
    pub fn new(file_name: impl Into<String>, mime_type: impl Into<String>, data: impl Into<Bytes>) -> Self {
        Self {
            file_name: file_name.into(),
            mime_type: Some(mime_type.into()),
            data: data.into(),
        }
    }

    /// A file whose MIME type is guessed from its extension.
    pub fn guessed(file_name: impl Into<String>, data: impl Into<Bytes>) -> Self {
        Self {
            file_name: file_name.into(),
            mime_type: None,
            data: data.into(),
        }
    }
}

/// Result for one file of a batch.
#[derive(Debug, Clone)]
pub enum UploadOutcome {
    /// The file was stored and added to the tree.
    Completed(MediaItem),
    /// The file was rejected or failed; siblings were unaffected.
    Failed {
        /// The file's name.
        file_name: String,
        /// Why it failed.
        error: AppError,
    },
    /// The file was cancelled before its result was reported.
    Cancelled {
        /// The file's name.
        file_name: String,
    },
}

impl UploadOutcome {
    /// The created item, when the file completed.
    pub fn item(&self) -> Option<&MediaItem> {
        match self {
            Self::Completed(item) => Some(item),
            _ => None,
        }
    }

    /// The failure, when the file failed.
    pub fn error(&self) -> Option<&AppError> {
        match self {
            Self::Failed { error, .. } => Some(error),
            _ => None,
        }
    }
}

/// Validates, transforms, stores, and records uploaded files.
#[derive(Clone)]
pub struct UploadPipeline {
    tree: MediaTree,
    transformer: Arc<dyn MediaTransformer>,
    tracker: UploadTracker,
    config: UploadConfig,
    key_prefix: String,
}

impl fmt::Debug for UploadPipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UploadPipeline")
            .field("key_prefix", &self.key_prefix)
            .field("transformer", &self.transformer)
            .finish()
    }
}

impl UploadPipeline {
    /// Creates a pipeline. Blobs are stored under `<key_prefix>/<item id>/`.
    pub fn new(
        tree: MediaTree,
        transformer: Arc<dyn MediaTransformer>,
        config: UploadConfig,
        key_prefix: impl Into<String>,
    ) -> Self {
        Self {
            tree,
            transformer,
            tracker: UploadTracker::default(),
            config,
            key_prefix: key_prefix.into(),
        }
    }

    /// Use a specific tracker, e.g. one shared with a progress view.
    pub fn with_tracker(mut self, tracker: UploadTracker) -> Self {
        self.tracker = tracker;
        self
    }

    /// The progress tracker.
    pub fn tracker(&self) -> &UploadTracker {
        &self.tracker
    }

    /// Queue a batch in the tracker without processing it.
    pub fn enqueue(&self, files: Vec<RawFile>) -> Vec<(u64, RawFile)> {
        files
            .into_iter()
            .map(|file| (self.tracker.enqueue(&file.file_name), file))
            .collect()
    }

    /// Upload a batch into a folder (or root), one file at a time.
    pub async fn upload_batch(
        &self,
        files: Vec<RawFile>,
        parent_id: Option<&ItemId>,
    ) -> Vec<UploadOutcome> {
        let queued = self.enqueue(files);
        self.process(queued, parent_id).await
    }

    /// Process files previously queued with [`UploadPipeline::enqueue`].
    ///
    /// Files run sequentially so each duplicate-name check sees the files
    /// saved before it.
    pub async fn process(
        &self,
        queued: Vec<(u64, RawFile)>,
        parent_id: Option<&ItemId>,
    ) -> Vec<UploadOutcome> {
        let parent_check = self.tree.require_parent(parent_id).await;
        let mut outcomes = Vec::with_capacity(queued.len());

        for (upload_id, file) in queued {
            let outcome = match &parent_check {
                Err(e) => self.failed(upload_id, file.file_name, e.clone()),
                Ok(()) => self.process_one(upload_id, file, parent_id).await,
            };
            outcomes.push(outcome);
        }

        let completed = outcomes.iter().filter(|o| o.item().is_some()).count();
        info!(files = outcomes.len(), completed, "Upload batch finished");
        outcomes
    }

    async fn process_one(
        &self,
        upload_id: u64,
        file: RawFile,
        parent_id: Option<&ItemId>,
    ) -> UploadOutcome {
        if !self.tracker.is_tracked(upload_id) {
            debug!(file_name = %file.file_name, "Skipping cancelled upload");
            return UploadOutcome::Cancelled {
                file_name: file.file_name,
            };
        }

        let file_name = file.file_name.clone();
        match self.store(upload_id, file, parent_id).await {
            Ok(item) => {
                if self.tracker.complete(upload_id, item.id.clone()) {
                    return UploadOutcome::Completed(item);
                }
                debug!(item_id = %item.id, "Upload finished after cancellation");
                UploadOutcome::Cancelled { file_name }
            }
            Err(e) => self.failed(upload_id, file_name, e),
        }
    }

    fn failed(&self, upload_id: u64, file_name: String, error: AppError) -> UploadOutcome {
        warn!(file_name = %file_name, error = %error, "Upload failed");
        if self.tracker.fail(upload_id, error.message.clone()) {
            UploadOutcome::Failed { file_name, error }
        } else {
            UploadOutcome::Cancelled { file_name }
        }
    }

    async fn store(
        &self,
        upload_id: u64,
        file: RawFile,
        parent_id: Option<&ItemId>,
    ) -> AppResult<MediaItem> {
        let mime = resolve_mime(&file);
        let kind = ItemKind::from_mime(&mime);
        validate(&self.config, &file, &mime, kind)?;
        self.tree.ensure_unique_name(&file.file_name).await?;

        self.tracker.set_status(upload_id, UploadStatus::Optimizing);
        let data = self.transformer.transform(file.data, &mime).await?;

        self.tracker.set_status(upload_id, UploadStatus::Uploading);
        let item_id = ItemId::new();
        let storage_key = format!(
            "{}/{}/{}",
            self.key_prefix.trim_end_matches('/'),
            item_id,
            file.file_name
        );
        let blobs = self.tree.blobs();
        blobs
            .upload(&storage_key, data.clone(), UploadOptions::with_content_type(&mime))
            .await?;

        let item = MediaItem::file(
            item_id,
            file.file_name,
            parent_id.cloned(),
            BlobInfo {
                url: blobs.public_url(&storage_key),
                size_bytes: data.len() as u64,
                storage_key: storage_key.clone(),
                mime_type: mime,
            },
        );

        if let Err(e) = self.tree.insert_item(&item).await {
            if let Err(cleanup) = blobs.remove(std::slice::from_ref(&storage_key)).await {
                warn!(storage_key = %storage_key, error = %cleanup, "Failed to remove orphaned blob");
            }
            return Err(e);
        }
        Ok(item)
    }
}

/// Declared MIME type without parameters, else a guess from the extension.
fn resolve_mime(file: &RawFile) -> String {
    let declared = file
        .mime_type
        .as_deref()
        .and_then(|m| m.split(';').next())
        .map(|m| m.trim().to_ascii_lowercase())
        .filter(|m| !m.is_empty());

    declared.unwrap_or_else(|| {
        mime_guess::from_path(&file.file_name)
            .first_raw()
            .unwrap_or(FALLBACK_MIME)
            .to_string()
    })
}

fn validate(config: &UploadConfig, file: &RawFile, mime: &str, kind: ItemKind) -> AppResult<()> {
    let name = file.file_name.trim();
    if name.is_empty() || name != file.file_name {
        return Err(AppError::validation("File name cannot be empty or padded"));
    }
    if name.contains(['/', '\\']) {
        return Err(AppError::validation(format!(
            "File name cannot contain a path separator: '{name}'"
        )));
    }
    if file.data.is_empty() {
        return Err(AppError::validation(format!("File '{name}' is empty")));
    }

    let (limit, allowed) = match kind {
        ItemKind::Image => (config.max_image_bytes, Some(&config.allowed_image_types)),
        ItemKind::Video => (config.max_video_bytes, Some(&config.allowed_video_types)),
        _ => (config.max_other_bytes, None),
    };
    if let Some(allowed) = allowed {
        if !allowed.iter().any(|a| a.eq_ignore_ascii_case(mime)) {
            return Err(AppError::validation(format!(
                "File '{name}' has unsupported {kind} type '{mime}'"
            )));
        }
    }
    let size = file.data.len() as u64;
    if size > limit {
        return Err(AppError::validation(format!(
            "File '{name}' is {size} bytes; the {kind} limit is {limit} bytes"
        )));
    }
    Ok(())
}
