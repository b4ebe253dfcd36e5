use jigong_core::{
    FixedClock, GachaConfig, KeyValueStore, Post, PostId, QuotaTracker, DATE_KEY, DRAWS_KEY,
};
use jigong_data::{
    load_gacha_config, load_posts, save_posts, sort_posts_desc, JsonFileStore,
};
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

fn unique_temp_path(tag: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("time")
        .as_nanos();
    std::env::temp_dir().join(format!(
        "jigong_data_test_{}_{}_{}",
        tag,
        std::process::id(),
        nanos
    ))
}

fn assets_root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..")
        .join("assets")
}

#[test]
fn loader_skips_posts_without_id_or_date() {
    let path = unique_temp_path("posts.json");
    let body = r#"[
  { "id": 12, "date": "2026-10-12", "text": "line one\nline two", "image": "img/12.jpg" },
  { "id": "2026-10-11_11", "date": "2026-10-11", "image": "" },
  { "date": "2026-10-10", "text": "no id" },
  { "id": 9, "text": "no date" },
  { "id": "  ", "date": "2026-10-09" },
  { "id": 8, "date": "2026-10-08", "image": null }
]"#;
    std::fs::write(&path, body).expect("write");
    let report = load_posts(&path).expect("load posts");
    assert_eq!(report.skipped, 3);
    assert_eq!(report.posts.len(), 3);

    let first = &report.posts[0];
    assert_eq!(first.id, PostId::Number(12));
    assert!(first.has_image());

    let second = &report.posts[1];
    assert_eq!(second.id, PostId::Text("2026-10-11_11".to_string()));
    assert_eq!(second.text, "");
    assert!(!second.has_image());

    assert_eq!(report.posts[2].image, None);
    let _ = std::fs::remove_file(path);
}

#[test]
fn wrapped_posts_file_is_accepted() {
    let path = unique_temp_path("wrapped.json");
    std::fs::write(
        &path,
        r#"{ "posts": [ { "id": 1, "date": "2026-10-01", "image": "a.jpg" } ] }"#,
    )
    .expect("write");
    let report = load_posts(&path).expect("load posts");
    assert_eq!(report.posts.len(), 1);
    assert_eq!(report.skipped, 0);
    let _ = std::fs::remove_file(path);
}

#[test]
fn malformed_posts_file_names_the_path() {
    let path = unique_temp_path("broken.json");
    std::fs::write(&path, "{ not json").expect("write");
    let err = load_posts(&path).expect_err("should fail");
    assert!(format!("{err:#}").contains("parse"));
    let _ = std::fs::remove_file(path);
}

#[test]
fn sorted_posts_round_trip_through_disk() {
    let path = unique_temp_path("sorted.json");
    let mut posts = vec![
        Post::new(1, "2026-10-01", "first", Some("1.jpg")),
        Post::new(30, "2026-10-30", "last", Some("30.jpg")),
        Post::new(4, "2026-10-04", "middle", None),
    ];
    sort_posts_desc(&mut posts);
    save_posts(&path, &posts).expect("save");
    let report = load_posts(&path).expect("reload");
    let ids: Vec<String> = report.posts.iter().map(|post| post.id.to_string()).collect();
    assert_eq!(ids, vec!["30", "4", "1"]);
    assert_eq!(report.posts, posts);
    let _ = std::fs::remove_file(path);
}

#[test]
fn gacha_config_defaults_when_absent_and_merges_partial_files() {
    let dir = unique_temp_path("config_dir");
    std::fs::create_dir_all(&dir).expect("mkdir");
    assert_eq!(
        load_gacha_config(&dir).expect("defaults"),
        GachaConfig::default()
    );

    std::fs::write(
        dir.join("gacha.json"),
        r#"{ "max_daily_draws": 5, "timing": { "roll_ms": 10 } }"#,
    )
    .expect("write");
    let config = load_gacha_config(&dir).expect("load config");
    assert_eq!(config.max_daily_draws, 5);
    assert_eq!(config.dice_sides, 6);
    assert_eq!(config.timing.roll_ms, 10);
    assert_eq!(config.timing.settle_ms, 800);
    assert_eq!(config.limits.max_batch_attempts, 50);
    let _ = std::fs::remove_dir_all(dir);
}

#[test]
fn bundled_assets_load() {
    let config = load_gacha_config(&assets_root()).expect("bundled config");
    assert_eq!(config, GachaConfig::default());
    let report = load_posts(&assets_root().join("posts.json")).expect("bundled posts");
    assert!(report.posts.iter().filter(|post| post.has_image()).count() >= 6);
}

#[test]
fn json_store_persists_across_reopen() {
    let path = unique_temp_path("store.json");
    {
        let mut store = JsonFileStore::open(&path);
        assert_eq!(store.get(DRAWS_KEY).expect("get"), None);
        store.set(DRAWS_KEY, "2").expect("set draws");
        store.set(DATE_KEY, "2026-10-17").expect("set date");
    }
    let store = JsonFileStore::open(&path);
    assert_eq!(store.get(DRAWS_KEY).expect("get"), Some("2".to_string()));
    assert_eq!(
        store.get(DATE_KEY).expect("get"),
        Some("2026-10-17".to_string())
    );
    let _ = std::fs::remove_file(path);
}

#[test]
fn corrupt_store_opens_empty_and_is_replaced() {
    let path = unique_temp_path("corrupt.json");
    std::fs::write(&path, "]]garbage").expect("write");
    let mut store = JsonFileStore::open(&path);
    assert_eq!(store.get(DRAWS_KEY).expect("get"), None);
    store.set(DRAWS_KEY, "1").expect("set");
    let reopened = JsonFileStore::open(&path);
    assert_eq!(reopened.get(DRAWS_KEY).expect("get"), Some("1".to_string()));
    let _ = std::fs::remove_file(path);
}

#[test]
fn numeric_store_values_are_read_as_strings() {
    let path = unique_temp_path("numeric.json");
    std::fs::write(&path, r#"{ "dailyDraws": 2, "lastDrawDate": "2026-10-17" }"#)
        .expect("write");
    let store = JsonFileStore::open(&path);
    assert_eq!(store.get(DRAWS_KEY).expect("get"), Some("2".to_string()));
    let _ = std::fs::remove_file(path);
}

#[test]
fn quota_survives_a_restart_on_the_same_day() {
    let path = unique_temp_path("quota.json");
    let now = chrono::NaiveDate::from_ymd_opt(2026, 10, 17)
        .and_then(|date| date.and_hms_opt(12, 0, 0))
        .expect("valid datetime");
    let config = GachaConfig::default();
    {
        let mut quota = QuotaTracker::new(JsonFileStore::open(&path), FixedClock::at(now), &config);
        quota.consume_draw().expect("first");
        quota.consume_draw().expect("second");
    }
    let quota = QuotaTracker::new(JsonFileStore::open(&path), FixedClock::at(now), &config);
    assert_eq!(quota.remaining(), 1);
    assert_eq!(quota.store().path(), path.as_path());
    let _ = std::fs::remove_file(path);
}
