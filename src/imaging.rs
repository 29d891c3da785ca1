//! Photo preparation
//!
//! read bytes → decode → resize → encode, as one awaitable call. Decoding and
//! encoding are CPU bound and run on the blocking pool.

use std::io::Cursor;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::{codecs::jpeg::JpegEncoder, imageops::FilterType, DynamicImage};
use tracing::debug;

use crate::error::{AppError, Result};

/// Width photos are scaled down to before storage and upload.
pub const MAX_WIDTH: u32 = 800;

/// JPEG quality used for stored photos.
pub const JPEG_QUALITY: u8 = 70;

/// Request body limit for routes that carry a camera photo, raw or as a
/// base64 data URL.
pub const MAX_UPLOAD_BYTES: usize = 24 * 1024 * 1024;

/// Decodes any supported image, scales it to at most `MAX_WIDTH` pixels wide
/// keeping the aspect ratio and re-encodes it as JPEG.
pub async fn prepare_photo(data: Vec<u8>) -> Result<Vec<u8>> {
    tokio::task::spawn_blocking(move || prepare_photo_blocking(&data))
        .await
        .map_err(|e| AppError::Internal(format!("resize task failed: {}", e)))?
}

fn prepare_photo_blocking(data: &[u8]) -> Result<Vec<u8>> {
    let img = image::load_from_memory(data)
        .map_err(|e| AppError::Image(format!("cannot decode photo: {}", e)))?;
    let resized = resize_to_width(img, MAX_WIDTH);
    debug!("Photo resized to {}x{}", resized.width(), resized.height());
    encode_jpeg(&resized)
}

fn resize_to_width(img: DynamicImage, max_width: u32) -> DynamicImage {
    if img.width() <= max_width {
        return img;
    }
    let height = ((img.height() as u64 * max_width as u64) / img.width() as u64).max(1) as u32;
    img.resize_exact(max_width, height, FilterType::Triangle)
}

fn encode_jpeg(img: &DynamicImage) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    let encoder = JpegEncoder::new_with_quality(Cursor::new(&mut out), JPEG_QUALITY);
    DynamicImage::ImageRgb8(img.to_rgb8())
        .write_with_encoder(encoder)
        .map_err(|e| AppError::Image(format!("cannot encode photo: {}", e)))?;
    Ok(out)
}

/// `data:` URL for a JPEG body.
pub fn to_data_url(jpeg: &[u8]) -> String {
    format!("data:image/jpeg;base64,{}", STANDARD.encode(jpeg))
}
