//! # rb-storage-local
//! rusty-board/crates/rb-plugins/rb-storage-local/src/lib.rs
//! Local filesystem implementation of `MediaStore`.
//! Features: Content-addressable storage, directory sharding, and thumbnailing.

use std::io::Cursor;
use std::path::{Path, PathBuf};

use anyhow::Context;
use async_trait::async_trait;
use image::{DynamicImage, ImageFormat, ImageReader};
use rb_core::error::AppError;
use rb_core::traits::MediaStore;
use sha2::{Digest, Sha256};
use tokio::fs;

pub struct LocalMediaStore {
    /// Root directory for all uploads (e.g., "./data/uploads")
    root_path: PathBuf,
    /// Public URL prefix (e.g., "/static/uploads")
    url_prefix: String,
    /// Longest edge of thumbnails, in pixels
    thumbnail_size: u32,
}

impl LocalMediaStore {
    pub fn new(root: PathBuf, url_prefix: String, thumbnail_size: u32) -> Self {
        Self {
            root_path: root,
            url_prefix: url_prefix.trim_end_matches('/').to_string(),
            thumbnail_size,
        }
    }

    pub fn root_path(&self) -> &Path {
        &self.root_path
    }

    /// Relative directory for a media id: "ab/cd".
    fn shard(media_id: &str) -> Option<String> {
        Some(format!("{}/{}", media_id.get(0..2)?, media_id.get(2..4)?))
    }

    /// Generates a sharded path: "ab/cd/<file_name>"
    fn get_sharded_path(&self, media_id: &str, file_name: &str) -> anyhow::Result<PathBuf> {
        let shard = Self::shard(media_id).context("media id too short to shard")?;
        Ok(self.root_path.join(shard).join(file_name))
    }

    fn thumbnail_name(media_id: &str) -> String {
        let stem = media_id.split('.').next().unwrap_or(media_id);
        format!("thumb_{stem}.webp")
    }
}

#[async_trait]
impl MediaStore for LocalMediaStore {
    /// Saves an upload using its SHA-256 hash as the filename.
    /// This automatically deduplicates files.
    async fn save_upload(&self, data: Vec<u8>, content_type: &str) -> anyhow::Result<String> {
        // 1. Calculate Hash
        let hash = format!("{:x}", Sha256::digest(&data));
        let media_id = match media_extension(&data, content_type) {
            Some(ext) => format!("{hash}.{ext}"),
            None => hash,
        };

        let target_path = self.get_sharded_path(&media_id, &media_id)?;

        // 2. Save Original and its thumbnail (if not exists)
        if fs::try_exists(&target_path).await? {
            tracing::debug!(%media_id, "upload already stored");
            return Ok(media_id);
        }

        let thumb = generate_thumbnail(data.clone(), self.thumbnail_size).await?;

        let parent = target_path
            .parent()
            .context("sharded path has no parent directory")?;
        fs::create_dir_all(parent).await?;
        fs::write(parent.join(Self::thumbnail_name(&media_id)), thumb).await?;
        fs::write(&target_path, &data).await?;

        tracing::info!(%media_id, bytes = data.len(), "upload stored");
        Ok(media_id)
    }

    fn get_url(&self, media_id: &str) -> String {
        match Self::shard(media_id) {
            Some(shard) => format!("{}/{}/{}", self.url_prefix, shard, media_id),
            None => format!("{}/{}", self.url_prefix, media_id),
        }
    }

    fn get_thumbnail_url(&self, media_id: &str) -> String {
        let thumb = Self::thumbnail_name(media_id);
        match Self::shard(media_id) {
            Some(shard) => format!("{}/{}/{}", self.url_prefix, shard, thumb),
            None => format!("{}/{}", self.url_prefix, thumb),
        }
    }
}

/// File extension for an upload: sniffed from the bytes when `image`
/// recognises them, otherwise taken from the declared content type.
fn media_extension(data: &[u8], content_type: &str) -> Option<&'static str> {
    if let Ok(format) = image::guess_format(data) {
        return format.extensions_str().first().copied();
    }
    match content_type {
        "image/jpeg" | "image/pjpeg" => Some("jpg"),
        other => mime_guess::get_mime_extensions_str(other)?.first().copied(),
    }
}

/// Decodes the upload and encodes a WebP thumbnail off the async runtime.
/// Fails with a validation error if the bytes are not a decodable image.
async fn generate_thumbnail(data: Vec<u8>, size: u32) -> anyhow::Result<Vec<u8>> {
    tokio::task::spawn_blocking(move || -> anyhow::Result<Vec<u8>> {
        let img = ImageReader::new(Cursor::new(data))
            .with_guessed_format()?
            .decode()
            .map_err(|e| AppError::ValidationError(format!("unreadable image: {e}")))?;

        // The WebP encoder only takes 8-bit RGB(A).
        let thumb = DynamicImage::ImageRgba8(img.thumbnail(size, size).to_rgba8());
        let mut out = Vec::new();
        thumb.write_to(&mut Cursor::new(&mut out), ImageFormat::WebP)?;
        Ok(out)
    })
    .await?
}
