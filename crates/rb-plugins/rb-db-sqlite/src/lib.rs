//! # rb-db-sqlite Implementation
//!
//! This module implements the data mapping between the SQLite relational model
//! and the `rb-core` domain models.

use std::str::FromStr;

use anyhow::Context;
use async_trait::async_trait;
use rb_core::models::{Counter, Post, PostId};
use rb_core::traits::PostRepo;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::Row;

const POST_COLUMNS: &str =
    "id, title, content, tags, upvotes, downvotes, reports, parent, image, created_at";

pub struct SqlitePostRepo {
    pool: SqlitePool,
}

impl SqlitePostRepo {
    /// Connects and applies pending migrations.
    ///
    /// An in-memory database lives only as long as its connection, so
    /// `sqlite::memory:` is pinned to a single connection that never expires.
    pub async fn new(url: &str, max_connections: u32) -> anyhow::Result<Self> {
        let options = SqliteConnectOptions::from_str(url)
            .with_context(|| format!("invalid database url {url:?}"))?
            .create_if_missing(true);

        let pool = if url.contains(":memory:") {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new().max_connections(max_connections)
        }
        .connect_with(options)
        .await?;

        sqlx::migrate!("./migrations").run(&pool).await?;
        tracing::info!(url, "sqlite database ready");

        Ok(Self { pool })
    }
}

fn row_to_post(row: &SqliteRow) -> anyhow::Result<Post> {
    let counter = |name: &str| -> anyhow::Result<u32> {
        let value: i64 = row.try_get(name)?;
        u32::try_from(value).with_context(|| format!("{name} out of range: {value}"))
    };

    Ok(Post {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        content: row.try_get("content")?,
        tags: serde_json::from_str(&row.try_get::<String, _>("tags")?)?,
        upvotes: counter("upvotes")?,
        downvotes: counter("downvotes")?,
        reports: counter("reports")?,
        parent: row.try_get("parent")?,
        image: row.try_get("image")?,
        created_at: row.try_get("created_at")?,
    })
}

#[async_trait]
impl PostRepo for SqlitePostRepo {
    /// Single-statement increment, so concurrent callers (and processes
    /// sharing the database file) always observe distinct values.
    async fn allocate_post_id(&self) -> anyhow::Result<PostId> {
        let id: i64 = sqlx::query_scalar(
            "UPDATE counters SET last_index = last_index + 1 WHERE coll = 'posts' RETURNING last_index",
        )
        .fetch_one(&self.pool)
        .await
        .context("post counter missing")?;
        Ok(id)
    }

    async fn create_post(&self, post: Post) -> anyhow::Result<()> {
        sqlx::query(&format!(
            "INSERT INTO posts ({POST_COLUMNS}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"
        ))
        .bind(post.id)
        .bind(post.title)
        .bind(post.content)
        .bind(serde_json::to_string(&post.tags)?)
        .bind(i64::from(post.upvotes))
        .bind(i64::from(post.downvotes))
        .bind(i64::from(post.reports))
        .bind(post.parent)
        .bind(post.image)
        .bind(post.created_at)
        .execute(&self.pool)
        .await?;

        tracing::debug!(id = post.id, parent = ?post.parent, "post stored");
        Ok(())
    }

    async fn get_post(&self, id: PostId) -> anyhow::Result<Option<Post>> {
        let row = sqlx::query(&format!("SELECT {POST_COLUMNS} FROM posts WHERE id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(row_to_post).transpose()
    }

    async fn list_posts(&self) -> anyhow::Result<Vec<Post>> {
        let rows = sqlx::query(&format!("SELECT {POST_COLUMNS} FROM posts ORDER BY id ASC"))
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(row_to_post).collect()
    }

    async fn increment_counter(&self, id: PostId, counter: Counter) -> anyhow::Result<bool> {
        let column = counter.column();
        let result = sqlx::query(&format!(
            "UPDATE posts SET {column} = {column} + 1 WHERE id = ?"
        ))
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
