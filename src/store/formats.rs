use image::{DynamicImage, ImageEncoder, ImageFormat, codecs::jpeg::JpegEncoder};
use std::io::{Cursor, Write};
use std::path::Path;
use tracing::debug;

use super::StoreError;

/// Extensions the store writes and probes, lowercase.
pub const SUPPORTED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp", "gif", "bmp", "tif", "tiff"];

pub fn format_for_extension(ext: &str) -> Result<ImageFormat, StoreError> {
    match ImageFormat::from_extension(ext) {
        Some(
            format @ (ImageFormat::Jpeg
            | ImageFormat::Png
            | ImageFormat::WebP
            | ImageFormat::Gif
            | ImageFormat::Bmp
            | ImageFormat::Tiff),
        ) => Ok(format),
        _ => Err(StoreError::UnsupportedFormat(ext.to_string())),
    }
}

/// Pick the artifact extension for an upload: the uploaded file's own
/// extension when the store supports it, else the sniffed format, else jpg.
pub fn extension_for(file_name: Option<&str>, bytes: &[u8]) -> String {
    let declared = file_name
        .and_then(|name| Path::new(name).extension())
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_lowercase());

    if let Some(ext) = declared
        && SUPPORTED_EXTENSIONS.contains(&ext.as_str())
    {
        return ext;
    }

    image::guess_format(bytes)
        .ok()
        .and_then(|format| format.extensions_str().first().copied())
        .filter(|ext| SUPPORTED_EXTENSIONS.contains(ext))
        .unwrap_or("jpg")
        .to_string()
}

pub fn encode(
    image: &DynamicImage,
    format: ImageFormat,
    jpeg_quality: u8,
) -> Result<Vec<u8>, StoreError> {
    let mut buffer = Cursor::new(Vec::new());

    match format {
        ImageFormat::Jpeg => {
            // JPEG doesn't support alpha channel, so convert to RGB
            let rgb_image = image.to_rgb8();
            let encoder = JpegEncoder::new_with_quality(&mut buffer, jpeg_quality);
            encoder.write_image(
                rgb_image.as_raw(),
                rgb_image.width(),
                rgb_image.height(),
                image::ExtendedColorType::Rgb8,
            )?;
        }
        other => {
            DynamicImage::ImageRgba8(image.to_rgba8()).write_to(&mut buffer, other)?;
        }
    }

    Ok(buffer.into_inner())
}

/// Write through a sibling temp file and rename into place, so readers
/// never observe a partially written artifact.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), StoreError> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let mut staged = tempfile::Builder::new().prefix(".write_").tempfile_in(dir)?;
    staged.write_all(bytes)?;
    staged.flush()?;
    staged.persist(path).map_err(|e| e.error)?;
    debug!("Wrote {} bytes to {:?}", bytes.len(), path);
    Ok(())
}

pub fn save(
    image: &DynamicImage,
    path: &Path,
    format: ImageFormat,
    jpeg_quality: u8,
) -> Result<(), StoreError> {
    let bytes = encode(image, format, jpeg_quality)?;
    write_atomic(path, &bytes)
}
