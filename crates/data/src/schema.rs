use jigong_core::{Post, PostId};
use serde::{Deserialize, Serialize};

/// A `posts.json` entry as found on disk. Every field may be missing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawPost {
    #[serde(default)]
    pub id: Option<PostId>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
}

impl RawPost {
    /// Posts without a usable id or date are dropped from the pool.
    pub fn into_post(self) -> Option<Post> {
        let id = match self.id? {
            PostId::Text(text) if text.trim().is_empty() => return None,
            id => id,
        };
        let date = self.date.filter(|date| !date.trim().is_empty())?;
        Some(Post {
            id,
            date,
            text: self.text.unwrap_or_default(),
            image: self.image,
        })
    }
}

/// `posts.json` is either a bare array or `{ "posts": [...] }`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum PostsFile {
    List(Vec<RawPost>),
    Wrapped { posts: Vec<RawPost> },
}

impl PostsFile {
    pub fn into_raw(self) -> Vec<RawPost> {
        match self {
            Self::List(posts) | Self::Wrapped { posts } => posts,
        }
    }
}
