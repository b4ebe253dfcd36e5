use crate::schema::PostsFile;
use anyhow::Context;
use jigong_core::{GachaConfig, Post, PostId};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::cmp::Ordering;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

const POSTS_FILE: &str = "posts.json";
const GACHA_CONFIG_FILE: &str = "gacha.json";

#[derive(Debug, Clone, Default)]
pub struct PostLoadReport {
    pub posts: Vec<Post>,
    pub skipped: usize,
}

pub fn default_posts_path(assets_dir: &Path) -> PathBuf {
    assets_dir.join(POSTS_FILE)
}

pub fn load_posts(path: &Path) -> anyhow::Result<PostLoadReport> {
    let file: PostsFile = load_json(path)?;
    let raw = file.into_raw();
    let total = raw.len();
    let posts: Vec<Post> = raw.into_iter().filter_map(|post| post.into_post()).collect();
    let skipped = total - posts.len();
    if skipped > 0 {
        warn!(
            path = %path.display(),
            skipped, "posts without an id or date were skipped"
        );
    }
    info!(path = %path.display(), count = posts.len(), "posts loaded");
    Ok(PostLoadReport { posts, skipped })
}

pub fn save_posts(path: &Path, posts: &[Post]) -> anyhow::Result<()> {
    save_json(path, posts)
}

/// Newest first. Numeric ids (including numeric strings) come before other
/// ids; the sort is stable so equal ids keep their file order.
pub fn sort_posts_desc(posts: &mut [Post]) {
    posts.sort_by(|left, right| compare_ids(&right.id, &left.id));
}

fn compare_ids(left: &PostId, right: &PostId) -> Ordering {
    match (numeric_id(left), numeric_id(right)) {
        (Some(left), Some(right)) => left.cmp(&right),
        (Some(_), None) => Ordering::Greater,
        (None, Some(_)) => Ordering::Less,
        (None, None) => left.to_string().cmp(&right.to_string()),
    }
}

fn numeric_id(id: &PostId) -> Option<i64> {
    match id {
        PostId::Number(value) => Some(*value),
        PostId::Text(text) => text.trim().parse().ok(),
    }
}

/// `<dir>/gacha.json` when present, defaults otherwise.
pub fn load_gacha_config(dir: &Path) -> anyhow::Result<GachaConfig> {
    let path = dir.join(GACHA_CONFIG_FILE);
    if !path.exists() {
        return Ok(GachaConfig::default());
    }
    load_json(path)
}

pub fn normalize_locale(locale: Option<&str>) -> String {
    let raw = locale.unwrap_or("en_US").trim();
    if raw.is_empty() {
        return "en_US".to_string();
    }
    let lowered = raw.replace('-', "_").to_ascii_lowercase();
    match lowered.as_str() {
        "zh" | "zh_tw" | "zh_hant" | "zh_hant_tw" | "zh_hk" => "zh_TW".to_string(),
        "en" | "en_us" => "en_US".to_string(),
        _ => raw.replace('-', "_"),
    }
}

pub fn load_json<T: DeserializeOwned>(path: impl AsRef<Path>) -> anyhow::Result<T> {
    let path = path.as_ref();
    let raw = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let value = serde_json::from_str(&raw).with_context(|| format!("parse {}", path.display()))?;
    Ok(value)
}

fn save_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> anyhow::Result<()> {
    let body = serde_json::to_string_pretty(value)
        .with_context(|| format!("serialize {}", path.display()))?;
    fs::write(path, body).with_context(|| format!("write {}", path.display()))
}
