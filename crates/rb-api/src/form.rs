//! Multipart parsing for the post and reply forms.

use axum::extract::Multipart;
use rb_core::error::AppError;

use crate::error::ApiError;

/// An uploaded attachment, not yet stored.
#[derive(Debug)]
pub struct Upload {
    pub content_type: String,
    pub data: Vec<u8>,
}

/// Raw form fields, before `NewPost::validate`.
#[derive(Debug, Default)]
pub struct PostForm {
    pub title: Option<String>,
    pub content: String,
    /// Comma-separated
    pub tags: String,
    pub image: Option<Upload>,
}

/// Reads the `title`, `content`, `tags` and `image` fields. Unknown fields
/// are ignored; an empty file input counts as no image.
pub async fn read_post_form(
    mut multipart: Multipart,
    max_upload_bytes: usize,
) -> Result<PostForm, ApiError> {
    let mut form = PostForm::default();

    while let Some(field) = multipart.next_field().await? {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };
        match name.as_str() {
            "title" => form.title = Some(field.text().await?),
            "content" => form.content = field.text().await?,
            "tags" => form.tags = field.text().await?,
            "image" => {
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let data = field.bytes().await?;
                if data.is_empty() {
                    continue;
                }
                form.image = Some(check_upload(content_type, data.to_vec(), max_upload_bytes)?);
            }
            other => tracing::debug!(field = other, "ignoring unknown form field"),
        }
    }

    Ok(form)
}

fn check_upload(
    content_type: String,
    data: Vec<u8>,
    max_upload_bytes: usize,
) -> Result<Upload, AppError> {
    if !content_type.starts_with("image/") {
        return Err(AppError::ValidationError(format!(
            "unsupported attachment type {content_type}"
        )));
    }
    if data.len() > max_upload_bytes {
        return Err(AppError::ValidationError(format!(
            "attachment is larger than {max_upload_bytes} bytes"
        )));
    }
    Ok(Upload { content_type, data })
}
