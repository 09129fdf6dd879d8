use std::io::Cursor;

use anyhow::Context;
use bytes::Bytes;
use image::{DynamicImage, ImageFormat};
use rand::Rng;
use tracing::{debug, info};

use crate::auth::dto::PROFILE_PICS;
use crate::storage::StorageClient;

/// Uploaded pictures are shrunk to fit inside this square.
pub const THUMBNAIL_SIZE: u32 = 125;

/// The upload could not be understood as a picture.
#[derive(Debug, thiserror::Error)]
#[error("unreadable image: {0}")]
pub struct UnreadableImage(String);

/// Text after the last dot, split the same way the extension allow-list does,
/// so `.png` counts as a png.
fn extension_of(filename: &str) -> Option<&str> {
    filename
        .rsplit_once('.')
        .map(|(_, ext)| ext)
        .filter(|ext| !ext.is_empty())
}

/// 16 random hex chars plus the original extension. Not checked for collisions.
pub fn random_filename(original: &str) -> String {
    let bytes: [u8; 8] = rand::thread_rng().gen();
    let stem: String = bytes.iter().map(|b| format!("{:02x}", b)).collect();
    match extension_of(original) {
        Some(ext) => format!("{}.{}", stem, ext),
        None => stem,
    }
}

fn format_for(filename: &str, body: &[u8]) -> Result<ImageFormat, UnreadableImage> {
    match extension_of(filename).and_then(ImageFormat::from_extension) {
        Some(format) => Ok(format),
        None => image::guess_format(body).map_err(|e| UnreadableImage(e.to_string())),
    }
}

fn content_type(format: ImageFormat) -> &'static str {
    match format {
        ImageFormat::Jpeg => "image/jpeg",
        ImageFormat::Png => "image/png",
        _ => "application/octet-stream",
    }
}

/// Shrink to fit within `max`×`max` keeping the aspect ratio; smaller images are left alone.
pub fn fit_within(img: DynamicImage, max: u32) -> DynamicImage {
    if img.width() <= max && img.height() <= max {
        return img;
    }
    img.thumbnail(max, max)
}

/// Decode, shrink and re-encode in `format`.
pub fn thumbnail_bytes(body: &[u8], format: ImageFormat) -> anyhow::Result<Vec<u8>> {
    let img = image::load_from_memory(body).map_err(|e| UnreadableImage(e.to_string()))?;
    let mut img = fit_within(img, THUMBNAIL_SIZE);
    if format == ImageFormat::Jpeg {
        img = DynamicImage::ImageRgb8(img.to_rgb8());
    }
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, format).context("encode thumbnail")?;
    Ok(out.into_inner())
}

/// Store a resized copy of an uploaded picture; returns the generated file name.
/// Bodies that do not decode fail with an [`UnreadableImage`] inside the error.
pub async fn save_picture(
    storage: &dyn StorageClient,
    original_filename: &str,
    body: Bytes,
) -> anyhow::Result<String> {
    let filename = random_filename(original_filename);
    let format = format_for(&filename, &body)?;

    let resized = tokio::task::spawn_blocking(move || thumbnail_bytes(&body, format))
        .await
        .context("resize task panicked")??;

    let key = format!("{}/{}", PROFILE_PICS, filename);
    storage
        .put_object(&key, Bytes::from(resized), content_type(format))
        .await
        .with_context(|| format!("put_object {}", key))?;
    info!(%filename, "profile picture saved");
    Ok(filename)
}

pub async fn delete_picture(storage: &dyn StorageClient, filename: &str) -> anyhow::Result<()> {
    let key = format!("{}/{}", PROFILE_PICS, filename);
    storage.delete_object(&key).await?;
    debug!(%filename, "profile picture removed");
    Ok(())
}
