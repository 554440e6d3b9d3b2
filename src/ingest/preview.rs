use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat};
use tracing::debug;

use super::{IngestError, Ingestor, UploadRequest};
use crate::filters::FilterHandle;
use crate::store::formats;

impl Ingestor {
    /// Render a filtered JPEG preview without touching the store or the
    /// repository.
    pub async fn preview(&self, request: UploadRequest) -> Result<Vec<u8>, IngestError> {
        let file = request.preview_file().ok_or(IngestError::NoFiles)?;
        self.check_size(&file.bytes)?;

        let bytes = file.bytes.clone();
        let filter = self.resolver.resolve(&request.selection);
        let max_width = self.images.preview_max_width;
        let jpeg_quality = self.images.jpeg_quality;

        tokio::task::spawn_blocking(move || {
            render_preview(&bytes, &filter, max_width, jpeg_quality)
        })
        .await?
    }
}

/// Shrink to `max_width` when wider, keeping the aspect ratio.
pub fn fit_width(image: DynamicImage, max_width: u32) -> DynamicImage {
    if max_width == 0 || image.width() <= max_width {
        return image;
    }
    let height = ((image.height() as f64 * max_width as f64) / image.width() as f64)
        .round()
        .max(1.0) as u32;
    image.resize_exact(max_width, height, FilterType::Lanczos3)
}

fn render_preview(
    bytes: &[u8],
    filter: &FilterHandle,
    max_width: u32,
    jpeg_quality: u8,
) -> Result<Vec<u8>, IngestError> {
    let image = image::load_from_memory(bytes)?;
    let image = fit_width(image, max_width);
    debug!(
        filter = filter.name(),
        "Rendering {}x{} preview",
        image.width(),
        image.height()
    );
    let filtered = filter.apply(image);
    Ok(formats::encode(&filtered, ImageFormat::Jpeg, jpeg_quality)?)
}
