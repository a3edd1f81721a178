//! # Domain Models
//!
//! These structs represent the core entities of Rusty-Board.
//! Posts are identified by a storage-allocated, strictly increasing integer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Identifier of a post, allocated by the storage layer.
pub type PostId = i64;

pub const MAX_TITLE_CHARS: usize = 100;
pub const MAX_CONTENT_CHARS: usize = 4000;
pub const MAX_TAGS: usize = 8;
pub const MAX_TAG_CHARS: usize = 24;

/// The fundamental unit of conversation.
///
/// A post without a parent is a thread; a post with a parent is a reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: PostId,
    pub title: Option<String>,
    /// Raw body, newline-delimited
    pub content: String,
    pub tags: Vec<String>,
    pub upvotes: u32,
    pub downvotes: u32,
    pub reports: u32,
    /// `None` if the post is a thread
    pub parent: Option<PostId>,
    /// Media id handled by MediaStore
    pub image: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Post {
    pub fn is_thread(&self) -> bool {
        self.parent.is_none()
    }

    /// Title shown in headers, falling back to the numeric id.
    pub fn display_title(&self) -> String {
        self.title.clone().unwrap_or_else(|| self.id.to_string())
    }
}

/// A post as submitted by a user, before an id has been allocated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewPost {
    pub title: Option<String>,
    pub content: String,
    pub tags: Vec<String>,
    pub parent: Option<PostId>,
    pub image: Option<String>,
}

impl NewPost {
    /// Trims and checks user input, returning the normalized post.
    pub fn validate(self) -> Result<NewPost> {
        let title = self
            .title
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty());
        if let Some(t) = &title {
            if t.chars().count() > MAX_TITLE_CHARS {
                return Err(AppError::ValidationError(format!(
                    "title is longer than {MAX_TITLE_CHARS} characters"
                )));
            }
        }

        let content = self.content.trim_end().to_string();
        if content.trim().is_empty() {
            return Err(AppError::ValidationError("content is empty".into()));
        }
        if content.chars().count() > MAX_CONTENT_CHARS {
            return Err(AppError::ValidationError(format!(
                "content is longer than {MAX_CONTENT_CHARS} characters"
            )));
        }

        let tags = normalize_tags(self.tags.iter().map(String::as_str))?;

        Ok(NewPost {
            title,
            content,
            tags,
            parent: self.parent,
            image: self.image,
        })
    }

    /// Turns the submission into a stored post with fresh counters.
    pub fn into_post(self, id: PostId, created_at: DateTime<Utc>) -> Post {
        Post {
            id,
            title: self.title,
            content: self.content,
            tags: self.tags,
            upvotes: 0,
            downvotes: 0,
            reports: 0,
            parent: self.parent,
            image: self.image,
            created_at,
        }
    }
}

/// Splits a comma-separated tag field (e.g. "based, Entrepreneur").
pub fn split_tags(raw: &str) -> Vec<String> {
    raw.split(',').map(str::to_string).collect()
}

/// Lowercases, drops blanks and duplicates. Order of first appearance is kept.
fn normalize_tags<'a>(raw: impl Iterator<Item = &'a str>) -> Result<Vec<String>> {
    let mut tags: Vec<String> = Vec::new();
    for tag in raw {
        let tag = tag.trim().to_lowercase();
        if tag.is_empty() || tags.contains(&tag) {
            continue;
        }
        if tag.chars().count() > MAX_TAG_CHARS {
            return Err(AppError::ValidationError(format!(
                "tag \"{tag}\" is longer than {MAX_TAG_CHARS} characters"
            )));
        }
        tags.push(tag);
    }
    if tags.len() > MAX_TAGS {
        return Err(AppError::ValidationError(format!(
            "at most {MAX_TAGS} tags are allowed"
        )));
    }
    Ok(tags)
}

/// Per-post counters that users can bump.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Counter {
    Upvotes,
    Downvotes,
    Reports,
}

impl Counter {
    /// Storage column backing this counter.
    pub fn column(self) -> &'static str {
        match self {
            Counter::Upvotes => "upvotes",
            Counter::Downvotes => "downvotes",
            Counter::Reports => "reports",
        }
    }
}
