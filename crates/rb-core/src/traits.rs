//! # Core Traits (Ports)
//!
//! Any plugin must implement these traits to be used by the binary.

use async_trait::async_trait;

use crate::models::{Counter, Post, PostId};

/// Data persistence contract for posts.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait PostRepo: Send + Sync {
    /// Returns a fresh id. Must be atomic across every process sharing the
    /// store: two calls never return the same value.
    async fn allocate_post_id(&self) -> anyhow::Result<PostId>;

    async fn create_post(&self, post: Post) -> anyhow::Result<()>;
    async fn get_post(&self, id: PostId) -> anyhow::Result<Option<Post>>;

    /// Every post, ordered by ascending id.
    async fn list_posts(&self) -> anyhow::Result<Vec<Post>>;

    /// Bumps one counter by one. Returns `false` if the post does not exist.
    async fn increment_counter(&self, id: PostId, counter: Counter) -> anyhow::Result<bool>;
}

/// Media storage contract for handling uploads and thumbnails.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait MediaStore: Send + Sync {
    /// Saves raw bytes and returns a media id for the Post model.
    async fn save_upload(&self, data: Vec<u8>, content_type: &str) -> anyhow::Result<String>;
    /// Returns the URL or path to the original media.
    fn get_url(&self, media_id: &str) -> String;
    /// Returns the URL or path to the thumbnail.
    fn get_thumbnail_url(&self, media_id: &str) -> String;
}
