//! # rb-api
//!
//! The web routing and orchestration layer for Rusty-Board.

pub mod error;
pub mod form;
pub mod handlers;
pub mod middleware;

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;

pub use error::ApiError;
pub use handlers::AppState;

/// Multipart framing and text fields on top of the largest allowed image.
const FORM_OVERHEAD_BYTES: usize = 64 * 1024;

/// Configures the routes for the imageboard.
///
/// # Developer Note
/// Middleware and static file serving are left to the caller (see
/// [`middleware::apply`]) so the binary can mount uploads wherever its
/// settings say.
pub fn configure_routes(state: Arc<AppState>) -> Router {
    let body_limit = state.max_upload_bytes + FORM_OVERHEAD_BYTES;

    Router::new()
        // The index: every thread with its replies
        .route("/", get(handlers::index))
        // The posting endpoints
        .route("/new-post", post(handlers::new_post))
        .route("/reply/{post_id}", get(handlers::reply_form).post(handlers::reply))
        // upvote, downvote, report
        .route("/post/{post_id}/{action}", post(handlers::bump_counter))
        // JSON views
        .route("/api/threads", get(handlers::api_threads))
        .route("/api/posts/{post_id}", get(handlers::api_post))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}
