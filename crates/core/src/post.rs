use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PostId {
    Number(i64),
    Text(String),
}

impl fmt::Display for PostId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PostId::Number(value) => write!(f, "{value}"),
            PostId::Text(value) => f.write_str(value),
        }
    }
}

impl From<i64> for PostId {
    fn from(value: i64) -> Self {
        PostId::Number(value)
    }
}

impl From<&str> for PostId {
    fn from(value: &str) -> Self {
        PostId::Text(value.to_string())
    }
}

impl From<String> for PostId {
    fn from(value: String) -> Self {
        PostId::Text(value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: PostId,
    pub date: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub image: Option<String>,
}

impl Post {
    pub fn new(id: impl Into<PostId>, date: &str, text: &str, image: Option<&str>) -> Self {
        Self {
            id: id.into(),
            date: date.to_string(),
            text: text.to_string(),
            image: image.map(str::to_string),
        }
    }

    pub fn has_image(&self) -> bool {
        matches!(self.image.as_deref(), Some(image) if !image.is_empty())
    }

    /// Matches on date, text and image; ids are not compared.
    pub fn same_content(&self, other: &Post) -> bool {
        self.date == other.date && self.text == other.text && self.image == other.image
    }
}

/// A post picked by the drawer, with the numbers that led to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DrawnCard {
    #[serde(flatten)]
    pub post: Post,
    pub dice_roll: u8,
    pub random_value: usize,
    pub lucky_number: usize,
}

impl DrawnCard {
    pub fn pool_index(&self, pool_len: usize) -> Option<usize> {
        if pool_len == 0 {
            return None;
        }
        Some(self.lucky_number.saturating_sub(1) % pool_len)
    }

    pub fn image(&self) -> &str {
        self.post.image.as_deref().unwrap_or_default()
    }
}

pub fn locate_in_pool(pool: &[Post], post: &Post) -> Option<usize> {
    pool.iter().position(|candidate| candidate.same_content(post))
}

pub fn eligible_count(pool: &[Post]) -> usize {
    pool.iter().filter(|post| post.has_image()).count()
}
