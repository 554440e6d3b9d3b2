use image::imageops::FilterType;
use image::{ImageFormat, ImageReader};
use std::path::PathBuf;
use tracing::{debug, warn};

use super::{ContentKey, ContentStore, StoreError, Variant, formats};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThumbnailSource {
    /// Served from an existing `.thumb.jpg`.
    Cached,
    /// Resized from the output just now and written to the cache.
    Generated,
    /// The output could not be resized; served unmodified.
    Original,
}

#[derive(Debug, Clone)]
pub struct Thumbnail {
    pub path: PathBuf,
    pub source: ThumbnailSource,
}

impl Thumbnail {
    pub fn content_type(&self) -> String {
        mime_guess::from_path(&self.path)
            .first_or_octet_stream()
            .to_string()
    }
}

impl ContentStore {
    /// Cached thumbnail for `key`, generating it on first request.
    ///
    /// Returns `Ok(None)` only when no output artifact exists. Cache entries
    /// are never invalidated.
    pub fn thumbnail_blocking(
        &self,
        key: ContentKey,
        width: u32,
        jpeg_quality: u8,
    ) -> Result<Option<Thumbnail>, StoreError> {
        if let Some(path) = self.locate(key, Variant::Thumbnail) {
            return Ok(Some(Thumbnail {
                path,
                source: ThumbnailSource::Cached,
            }));
        }

        let Some(output) = self.locate(key, Variant::Output) else {
            return Ok(None);
        };

        let fallback = Thumbnail {
            path: output.clone(),
            source: ThumbnailSource::Original,
        };

        let image = match ImageReader::open(&output)
            .and_then(|reader| reader.with_guessed_format())
            .map_err(StoreError::from)
            .and_then(|reader| reader.decode().map_err(StoreError::from))
        {
            Ok(image) => image,
            Err(e) => {
                warn!(hash = %key, "Failed to decode output for thumbnail: {}", e);
                return Ok(Some(fallback));
            }
        };

        if image.width() == 0 || image.height() == 0 {
            return Ok(Some(fallback));
        }

        let height = ((image.height() as f64 * width as f64) / image.width() as f64)
            .round()
            .max(1.0) as u32;
        let resized = image.resize_exact(width, height, FilterType::Lanczos3);

        let cache_path = self.path_for(key, Variant::Thumbnail, "jpg");
        if let Err(e) = formats::save(&resized, &cache_path, ImageFormat::Jpeg, jpeg_quality) {
            warn!(hash = %key, "Failed to write thumbnail cache: {}", e);
            return Ok(Some(fallback));
        }
        debug!(hash = %key, "Generated {}x{} thumbnail", width, height);

        Ok(Some(Thumbnail {
            path: cache_path,
            source: ThumbnailSource::Generated,
        }))
    }

    pub async fn thumbnail(
        &self,
        key: ContentKey,
        width: u32,
        jpeg_quality: u8,
    ) -> Result<Option<Thumbnail>, StoreError> {
        let store = self.clone();
        tokio::task::spawn_blocking(move || store.thumbnail_blocking(key, width, jpeg_quality))
            .await?
    }
}
