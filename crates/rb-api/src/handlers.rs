//! # rb-api Handlers
//!
//! This module coordinates the flow between HTTP requests and Core traits.

use std::sync::Arc;

use askama::Template;
use axum::extract::{Multipart, Path, State};
use axum::response::{Html, Redirect};
use axum::Json;
use chrono::Utc;
use rb_core::content::{parse_body, ClassifiedLine};
use rb_core::error::AppError;
use rb_core::models::{split_tags, Counter, NewPost, Post, PostId};
use rb_core::threads::{group_threads, ThreadGrouping};
use rb_core::traits::{MediaStore, PostRepo};
use rb_ui::{build_threads, IndexTemplate, PostView, ReplyTemplate};
use serde::Serialize;

use crate::error::ApiError;
use crate::form::{read_post_form, PostForm};

/// State shared across all request handlers.
pub struct AppState {
    pub repo: Box<dyn PostRepo>,
    pub store: Box<dyn MediaStore>,
    pub max_upload_bytes: usize,
    pub board_title: String,
}

/// Renders every thread with its replies.
#[tracing::instrument(skip(state))]
pub async fn index(State(state): State<Arc<AppState>>) -> Result<Html<String>, ApiError> {
    // One snapshot per request; the grouping and the lookups share it.
    let posts = state.repo.list_posts().await?;
    let grouping = group_threads(&posts);
    let threads = build_threads(&grouping, &posts, state.store.as_ref());

    let html = IndexTemplate {
        title: &state.board_title,
        threads: &threads,
    }
    .render()?;
    Ok(Html(html))
}

/// Creates a new thread.
#[tracing::instrument(skip(state, multipart))]
pub async fn new_post(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<Redirect, ApiError> {
    let form = read_post_form(multipart, state.max_upload_bytes).await?;
    submit_post(&state, form, None).await?;
    Ok(Redirect::to("/"))
}

/// Reply input page, not submitting yet.
#[tracing::instrument(skip(state))]
pub async fn reply_form(
    State(state): State<Arc<AppState>>,
    Path(post_id): Path<PostId>,
) -> Result<Html<String>, ApiError> {
    let post = state
        .repo
        .get_post(post_id)
        .await?
        .ok_or_else(|| AppError::post_not_found(post_id))?;

    let view = PostView::new(&post, state.store.as_ref());
    let html = ReplyTemplate {
        title: &post.display_title(),
        post: &view,
    }
    .render()?;
    Ok(Html(html))
}

/// Actual reply submission endpoint.
#[tracing::instrument(skip(state, multipart))]
pub async fn reply(
    State(state): State<Arc<AppState>>,
    Path(post_id): Path<PostId>,
    multipart: Multipart,
) -> Result<Redirect, ApiError> {
    let form = read_post_form(multipart, state.max_upload_bytes).await?;
    submit_post(&state, form, Some(post_id)).await?;
    Ok(Redirect::to("/"))
}

/// Increments a post's upvotes, downvotes or reports.
#[tracing::instrument(skip(state))]
pub async fn bump_counter(
    State(state): State<Arc<AppState>>,
    Path((post_id, action)): Path<(PostId, String)>,
) -> Result<Redirect, ApiError> {
    let counter = match action.as_str() {
        "upvote" => Counter::Upvotes,
        "downvote" => Counter::Downvotes,
        "report" => Counter::Reports,
        _ => return Err(AppError::NotFound("action".into(), action.clone()).into()),
    };

    if !state.repo.increment_counter(post_id, counter).await? {
        return Err(AppError::post_not_found(post_id).into());
    }
    if counter == Counter::Reports {
        tracing::warn!(post_id, "post reported");
    }
    Ok(Redirect::to("/"))
}

/// Thread root id -> reply ids, as JSON.
#[tracing::instrument(skip(state))]
pub async fn api_threads(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ThreadGrouping>, ApiError> {
    let posts = state.repo.list_posts().await?;
    Ok(Json(group_threads(&posts)))
}

#[derive(Debug, Serialize)]
pub struct PostDetail {
    #[serde(flatten)]
    pub post: Post,
    pub lines: Vec<ClassifiedLine>,
}

/// A single post with its classified body.
#[tracing::instrument(skip(state))]
pub async fn api_post(
    State(state): State<Arc<AppState>>,
    Path(post_id): Path<PostId>,
) -> Result<Json<PostDetail>, ApiError> {
    let post = state
        .repo
        .get_post(post_id)
        .await?
        .ok_or_else(|| AppError::post_not_found(post_id))?;

    let lines = parse_body(&post.content);
    Ok(Json(PostDetail { post, lines }))
}

/// Validates, stores the attachment, allocates an id and persists the post.
async fn submit_post(
    state: &AppState,
    form: PostForm,
    parent: Option<PostId>,
) -> Result<PostId, ApiError> {
    // 1. Replies must point at an existing post
    if let Some(parent) = parent {
        if state.repo.get_post(parent).await?.is_none() {
            return Err(AppError::post_not_found(parent).into());
        }
    }

    // 2. Validation before touching storage
    let submission = NewPost {
        title: form.title,
        content: form.content,
        tags: split_tags(&form.tags),
        parent,
        image: None,
    }
    .validate()?;

    // 3. Media: Process image if present
    let image = match form.image {
        Some(upload) => Some(state.store.save_upload(upload.data, &upload.content_type).await?),
        None => None,
    };

    // 4. Persistence
    let media_id = image.clone();
    let id = match persist_post(state, NewPost { image, ..submission }).await {
        Ok(id) => id,
        Err(err) => {
            if let Some(media_id) = media_id {
                tracing::warn!(%media_id, "post not persisted, upload left without a post");
            }
            return Err(err.into());
        }
    };

    tracing::info!(id, ?parent, "post created");
    Ok(id)
}

async fn persist_post(state: &AppState, submission: NewPost) -> anyhow::Result<PostId> {
    let id = state.repo.allocate_post_id().await?;
    state.repo.create_post(submission.into_post(id, Utc::now())).await?;
    Ok(id)
}
