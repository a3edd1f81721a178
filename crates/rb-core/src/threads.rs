//! # Thread Grouper
//!
//! Turns a flat snapshot of posts into a mapping from thread root to its
//! replies. This is a single linear pass; it does not validate the shape of
//! the reply graph. A reply whose parent is unknown still gets a bucket keyed
//! by that parent, and self-parented posts land in their own bucket.

use indexmap::IndexMap;
use serde::Serialize;

use crate::models::{Post, PostId};

/// Anything that has an id and an optional parent id.
pub trait ThreadNode {
    fn id(&self) -> PostId;
    fn parent(&self) -> Option<PostId>;
}

impl ThreadNode for Post {
    fn id(&self) -> PostId {
        self.id
    }

    fn parent(&self) -> Option<PostId> {
        self.parent
    }
}

impl ThreadNode for (PostId, Option<PostId>) {
    fn id(&self) -> PostId {
        self.0
    }

    fn parent(&self) -> Option<PostId> {
        self.1
    }
}

impl<T: ThreadNode + ?Sized> ThreadNode for &T {
    fn id(&self) -> PostId {
        (**self).id()
    }

    fn parent(&self) -> Option<PostId> {
        (**self).parent()
    }
}

/// Root id -> reply ids. Both levels keep the order posts were seen in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ThreadGrouping {
    buckets: IndexMap<PostId, Vec<PostId>>,
}

impl ThreadGrouping {
    pub fn get(&self, root: PostId) -> Option<&[PostId]> {
        self.buckets.get(&root).map(Vec::as_slice)
    }

    /// Whether `id` keys a bucket (a thread root or the parent of an orphan).
    pub fn is_root(&self, id: PostId) -> bool {
        self.buckets.contains_key(&id)
    }

    pub fn roots(&self) -> impl Iterator<Item = PostId> + '_ {
        self.buckets.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (PostId, &[PostId])> + '_ {
        self.buckets.iter().map(|(root, replies)| (*root, replies.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    pub fn into_inner(self) -> IndexMap<PostId, Vec<PostId>> {
        self.buckets
    }
}

pub fn group_threads<I>(posts: I) -> ThreadGrouping
where
    I: IntoIterator,
    I::Item: ThreadNode,
{
    let mut buckets: IndexMap<PostId, Vec<PostId>> = IndexMap::new();
    for post in posts {
        match post.parent() {
            None => {
                buckets.entry(post.id()).or_default();
            }
            Some(parent) => buckets.entry(parent).or_default().push(post.id()),
        }
    }
    ThreadGrouping { buckets }
}
