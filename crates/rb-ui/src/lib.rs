//! # rb-ui
//!
//! Askama templates plus the view models they render. Views are plain data:
//! every lookup (post by id, media URL, line classification) happens in
//! [`build_threads`] and [`PostView::new`] so templates stay logic-free.

use std::collections::{HashMap, HashSet};

use askama::Template;
use rb_core::content::{parse_body, LineKind};
use rb_core::models::{Post, PostId};
use rb_core::threads::ThreadGrouping;
use rb_core::traits::MediaStore;
use serde::Serialize;

/// One rendered line of a post body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LineView {
    pub text: String,
    /// CSS class: "plain", "greentext" or "reference"
    pub class: &'static str,
    /// In-page anchor of the referenced post
    pub href: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PostView {
    pub id: PostId,
    pub title: Option<String>,
    pub tags: Vec<String>,
    pub upvotes: u32,
    pub downvotes: u32,
    pub reports: u32,
    pub parent: Option<PostId>,
    pub created_at: String,
    pub lines: Vec<LineView>,
    pub image_url: Option<String>,
    pub thumb_url: Option<String>,
}

impl PostView {
    pub fn new(post: &Post, media: &dyn MediaStore) -> Self {
        let lines = parse_body(&post.content)
            .into_iter()
            .map(|line| LineView {
                class: match line.kind {
                    LineKind::Plain => "plain",
                    LineKind::Greentext => "greentext",
                    LineKind::Reference => "reference",
                },
                href: line.reference.map(|id| format!("#p{id}")),
                text: line.text,
            })
            .collect();

        Self {
            id: post.id,
            title: post.title.clone(),
            tags: post.tags.clone(),
            upvotes: post.upvotes,
            downvotes: post.downvotes,
            reports: post.reports,
            parent: post.parent,
            created_at: post.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
            lines,
            image_url: post.image.as_deref().map(|m| media.get_url(m)),
            thumb_url: post.image.as_deref().map(|m| media.get_thumbnail_url(m)),
        }
    }
}

/// A thread with its replies. `op` is `None` for a bucket whose root post is
/// not in the snapshot (replies to an unknown parent).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ThreadView {
    pub root_id: PostId,
    pub op: Option<PostView>,
    pub replies: Vec<PostView>,
}

/// Resolves a grouping against the snapshot it was built from.
///
/// A bucket keyed by a post that is itself a reply is folded into the
/// thread that post belongs to, so every post is rendered exactly once.
/// Reply ids missing from `posts` are skipped.
pub fn build_threads(
    grouping: &ThreadGrouping,
    posts: &[Post],
    media: &dyn MediaStore,
) -> Vec<ThreadView> {
    let posts_by_id: HashMap<PostId, &Post> = posts.iter().map(|p| (p.id, p)).collect();
    let view = |id: &PostId| posts_by_id.get(id).map(|p| PostView::new(p, media));

    let mut threads: Vec<ThreadView> = Vec::new();
    let mut slots: HashMap<PostId, usize> = HashMap::new();
    let mut rendered: HashSet<PostId> = HashSet::new();

    for (bucket_id, replies) in grouping.iter() {
        let root_id = thread_root(bucket_id, &posts_by_id);
        let slot = *slots.entry(root_id).or_insert_with(|| {
            let op = if rendered.insert(root_id) { view(&root_id) } else { None };
            threads.push(ThreadView {
                root_id,
                op,
                replies: Vec::new(),
            });
            threads.len() - 1
        });

        for id in replies {
            if rendered.insert(*id) {
                threads[slot].replies.extend(view(id));
            }
        }
    }
    threads
}

/// Follows parent links up to the post that opens the thread, or to the
/// first id missing from the snapshot.
fn thread_root(id: PostId, posts_by_id: &HashMap<PostId, &Post>) -> PostId {
    let mut current = id;
    let mut visited = HashSet::new();
    while let Some(parent) = posts_by_id.get(&current).and_then(|p| p.parent) {
        if !visited.insert(current) {
            break;
        }
        current = parent;
    }
    current
}

#[derive(Template)]
#[template(path = "index.html")]
pub struct IndexTemplate<'a> {
    pub title: &'a str,
    pub threads: &'a [ThreadView],
}

#[derive(Template)]
#[template(path = "reply.html")]
pub struct ReplyTemplate<'a> {
    pub title: &'a str,
    pub post: &'a PostView,
}
