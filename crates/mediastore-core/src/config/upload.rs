//! Upload validation and optimization configuration.

use serde::{Deserialize, Serialize};

/// Upload pipeline settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadConfig {
    /// Maximum image size in bytes (default 20 MB).
    #[serde(default = "default_max_image")]
    pub max_image_bytes: u64,
    /// Maximum video size in bytes (default 200 MB).
    #[serde(default = "default_max_video")]
    pub max_video_bytes: u64,
    /// Maximum size for any other file in bytes (default 50 MB).
    #[serde(default = "default_max_other")]
    pub max_other_bytes: u64,
    /// Accepted image MIME types.
    #[serde(default = "default_image_types")]
    pub allowed_image_types: Vec<String>,
    /// Accepted video MIME types.
    #[serde(default = "default_video_types")]
    pub allowed_video_types: Vec<String>,
    /// Image recompression settings.
    #[serde(default)]
    pub image: ImageOptimizeConfig,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_image_bytes: default_max_image(),
            max_video_bytes: default_max_video(),
            max_other_bytes: default_max_other(),
            allowed_image_types: default_image_types(),
            allowed_video_types: default_video_types(),
            image: ImageOptimizeConfig::default(),
        }
    }
}

/// Image recompression settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageOptimizeConfig {
    /// Whether images are recompressed before upload.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Longest edge in pixels; larger images are downscaled.
    #[serde(default = "default_max_dimension")]
    pub max_dimension: u32,
    /// JPEG quality (1-100).
    #[serde(default = "default_quality")]
    pub jpeg_quality: u8,
}

impl Default for ImageOptimizeConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_dimension: default_max_dimension(),
            jpeg_quality: default_quality(),
        }
    }
}

fn default_max_image() -> u64 {
    20_971_520 // 20 MB
}

fn default_max_video() -> u64 {
    209_715_200 // 200 MB
}

fn default_max_other() -> u64 {
    52_428_800 // 50 MB
}

fn default_image_types() -> Vec<String> {
    [
        "image/jpeg",
        "image/png",
        "image/webp",
        "image/gif",
        "image/svg+xml",
        "image/avif",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

fn default_video_types() -> Vec<String> {
    ["video/mp4", "video/webm", "video/quicktime"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_true() -> bool {
    true
}

fn default_max_dimension() -> u32 {
    2048
}

fn default_quality() -> u8 {
    82
}
