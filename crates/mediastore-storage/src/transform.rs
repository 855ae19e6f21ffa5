//! Content transformation applied to uploads before they are stored.

use std::io::Cursor;

use async_trait::async_trait;
use bytes::Bytes;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{CompressionType, FilterType as PngFilter, PngEncoder};
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat};
use tracing::{debug, warn};

use mediastore_core::config::ImageOptimizeConfig;
use mediastore_core::error::{AppError, ErrorKind};
use mediastore_core::result::AppResult;

/// Transforms file content before upload.
///
/// The MIME type of the output always equals the input's.
#[async_trait]
pub trait MediaTransformer: Send + Sync + std::fmt::Debug + 'static {
    /// Return the content to store for a file of the given MIME type.
    async fn transform(&self, data: Bytes, mime_type: &str) -> AppResult<Bytes>;
}

/// Transformer that stores content unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassthroughTransformer;

#[async_trait]
impl MediaTransformer for PassthroughTransformer {
    async fn transform(&self, data: Bytes, _mime_type: &str) -> AppResult<Bytes> {
        Ok(data)
    }
}

/// Downscales and re-encodes JPEG and PNG images.
#[derive(Debug, Clone)]
pub struct ImageRecompressor {
    settings: ImageOptimizeConfig,
}

impl ImageRecompressor {
    /// Create a recompressor with the given settings.
    pub fn new(settings: ImageOptimizeConfig) -> Self {
        Self { settings }
    }

    fn encodable_format(mime_type: &str) -> Option<ImageFormat> {
        match mime_type {
            "image/jpeg" | "image/jpg" => Some(ImageFormat::Jpeg),
            "image/png" => Some(ImageFormat::Png),
            _ => None,
        }
    }

    /// Returns `None` when the original should be kept.
    fn recompress(
        data: &[u8],
        format: ImageFormat,
        settings: &ImageOptimizeConfig,
    ) -> Option<Vec<u8>> {
        let decoded = match image::load_from_memory_with_format(data, format) {
            Ok(img) => img,
            Err(e) => {
                warn!(error = %e, "Image could not be decoded, keeping original");
                return None;
            }
        };

        let max = settings.max_dimension.max(1);
        let resized = decoded.width().max(decoded.height()) > max;
        let img = if resized {
            decoded.resize(max, max, FilterType::Lanczos3)
        } else {
            decoded
        };

        let mut out = Cursor::new(Vec::new());
        let encoded = match format {
            ImageFormat::Jpeg => {
                let quality = settings.jpeg_quality.clamp(1, 100);
                let encoder = JpegEncoder::new_with_quality(&mut out, quality);
                DynamicImage::ImageRgb8(img.to_rgb8()).write_with_encoder(encoder)
            }
            _ => {
                let encoder =
                    PngEncoder::new_with_quality(&mut out, CompressionType::Best, PngFilter::Adaptive);
                img.write_with_encoder(encoder)
            }
        };
        if let Err(e) = encoded {
            warn!(error = %e, "Image could not be re-encoded, keeping original");
            return None;
        }

        let out = out.into_inner();
        if resized || out.len() < data.len() {
            debug!(before = data.len(), after = out.len(), resized, "Recompressed image");
            Some(out)
        } else {
            None
        }
    }
}

#[async_trait]
impl MediaTransformer for ImageRecompressor {
    async fn transform(&self, data: Bytes, mime_type: &str) -> AppResult<Bytes> {
        if !self.settings.enabled {
            return Ok(data);
        }
        let Some(format) = Self::encodable_format(mime_type) else {
            return Ok(data);
        };

        let settings = self.settings.clone();
        let source = data.clone();
        let result = tokio::task::spawn_blocking(move || Self::recompress(&source, format, &settings))
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Internal, "Image task panicked", e))?;

        Ok(result.map(Bytes::from).unwrap_or(data))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage, Rgba, RgbaImage};

    fn settings(max_dimension: u32) -> ImageOptimizeConfig {
        ImageOptimizeConfig {
            enabled: true,
            max_dimension,
            jpeg_quality: 60,
        }
    }

    fn encode(img: DynamicImage, format: ImageFormat) -> Bytes {
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, format).unwrap();
        Bytes::from(out.into_inner())
    }

    fn noisy_rgb(width: u32, height: u32) -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |x, y| {
            let v = ((x * 31 + y * 17) ^ (x * y)) as u8;
            Rgb([v, v.wrapping_mul(3), v.wrapping_add(90)])
        }))
    }

    #[tokio::test]
    async fn test_large_image_is_downscaled() {
        let source = encode(noisy_rgb(300, 120), ImageFormat::Png);
        let out = ImageRecompressor::new(settings(100))
            .transform(source, "image/png")
            .await
            .unwrap();

        let img = image::load_from_memory(&out).unwrap();
        assert_eq!(img.width(), 100);
        assert_eq!(img.height(), 40);
    }

    #[tokio::test]
    async fn test_png_alpha_is_preserved() {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(400, 10, Rgba([10, 20, 30, 0])));
        let out = ImageRecompressor::new(settings(200))
            .transform(encode(img, ImageFormat::Png), "image/png")
            .await
            .unwrap();

        let decoded = image::load_from_memory_with_format(&out, ImageFormat::Png).unwrap();
        assert!(decoded.color().has_alpha());
        assert_eq!(decoded.width(), 200);
    }

    #[tokio::test]
    async fn test_undecodable_data_is_kept() {
        let source = Bytes::from_static(b"definitely not a jpeg");
        let out = ImageRecompressor::new(settings(100))
            .transform(source.clone(), "image/jpeg")
            .await
            .unwrap();
        assert_eq!(out, source);
    }

    #[tokio::test]
    async fn test_other_formats_and_disabled_pass_through() {
        let source = encode(noisy_rgb(300, 300), ImageFormat::Png);
        let gif = ImageRecompressor::new(settings(10))
            .transform(source.clone(), "image/gif")
            .await
            .unwrap();
        assert_eq!(gif, source);

        let disabled = ImageOptimizeConfig {
            enabled: false,
            ..settings(10)
        };
        let out = ImageRecompressor::new(disabled)
            .transform(source.clone(), "image/png")
            .await
            .unwrap();
        assert_eq!(out, source);
    }

    #[tokio::test]
    async fn test_jpeg_not_grown_when_no_resize() {
        let source = encode(noisy_rgb(64, 64), ImageFormat::Jpeg);
        let out = ImageRecompressor::new(settings(2048))
            .transform(source.clone(), "image/jpeg")
            .await
            .unwrap();
        assert!(out.len() <= source.len());
    }
}
