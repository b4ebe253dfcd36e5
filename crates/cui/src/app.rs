use crate::present::{event_line, notice_text, quota_label, UiLocale};
use crate::LaunchOptions;
use anyhow::{Context, Result};
use jigong_core::{
    Clock, DrawBatch, DrawPhase, Event, EventBus, Gacha, GachaConfig, GachaError, KeyValueStore,
    Post, RngState, SystemClock,
};
use jigong_data::{
    default_posts_path, default_store_path, load_gacha_config, load_posts, JsonFileStore,
};
use std::collections::VecDeque;
use std::path::PathBuf;

pub const DEFAULT_ASSETS_DIR: &str = "assets";
const FALLBACK_STORE_FILE: &str = ".jigong_gacha.json";
const MAX_EVENT_LOG: usize = 200;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardDetail {
    pub image: String,
    pub pool_index: Option<usize>,
    pub pool_len: usize,
}

pub struct App<S = JsonFileStore, C = SystemClock> {
    pub locale: UiLocale,
    pub seed: u64,
    pub gacha: Gacha<S, C, RngState>,
    pub posts: Vec<Post>,
    pub events: EventBus,
    pub card_cursor: usize,
    pub roll_frame: usize,
    pub detail: Option<CardDetail>,
    pub event_log: VecDeque<String>,
    pub status_line: String,
    pub show_help: bool,
    pub should_quit: bool,
}

pub fn resolve_assets_dir(options: &LaunchOptions) -> PathBuf {
    options
        .assets_dir
        .clone()
        .or_else(|| std::env::var_os("JIGONG_ASSETS").map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_ASSETS_DIR))
}

pub fn resolve_store_path(options: &LaunchOptions) -> PathBuf {
    options
        .store_path
        .clone()
        .or_else(default_store_path)
        .unwrap_or_else(|| PathBuf::from(FALLBACK_STORE_FILE))
}

impl App<JsonFileStore> {
    pub fn bootstrap(options: &LaunchOptions) -> Result<Self> {
        let locale = UiLocale::from_opt(options.locale.as_deref());
        let assets = resolve_assets_dir(options);
        let config = load_gacha_config(&assets).context("load gacha config")?;
        let posts_path = options
            .posts_path
            .clone()
            .unwrap_or_else(|| default_posts_path(&assets));
        let report = load_posts(&posts_path).context("load posts")?;
        let store = JsonFileStore::open(resolve_store_path(options));
        let rng = options
            .seed
            .map(RngState::from_seed)
            .unwrap_or_else(RngState::from_entropy);

        let mut app = Self::new(locale, config, report.posts, store, SystemClock, rng);
        app.push_event_line(format!(
            "{} {} ({})",
            locale.text("posts loaded:", "已載入文章："),
            app.posts.len(),
            posts_path.display()
        ));
        if report.skipped > 0 {
            app.push_event_line(format!(
                "{} {}",
                locale.text("posts skipped (missing id or date):", "略過文章（缺少 id 或日期）："),
                report.skipped
            ));
        }
        Ok(app)
    }
}

impl<S: KeyValueStore, C: Clock> App<S, C> {
    pub fn new(
        locale: UiLocale,
        config: GachaConfig,
        posts: Vec<Post>,
        store: S,
        clock: C,
        rng: RngState,
    ) -> Self {
        let seed = rng.seed();
        let mut app = Self {
            locale,
            seed,
            gacha: Gacha::new(config, store, clock, rng),
            posts,
            events: EventBus::default(),
            card_cursor: 0,
            roll_frame: 0,
            detail: None,
            event_log: VecDeque::new(),
            status_line: locale.text("ready", "準備就緒").to_string(),
            show_help: false,
            should_quit: false,
        };
        app.gacha.open(&mut app.events);
        app.flush_events();
        app
    }

    pub fn on_tick(&mut self) {
        if matches!(self.gacha.phase(), DrawPhase::Rolling { .. }) {
            self.roll_frame = self.roll_frame.wrapping_add(1);
        }
        if self.gacha.poll(&mut self.events) && self.gacha.phase() == DrawPhase::Revealed {
            self.card_cursor = 0;
        }
        let mut shown = None;
        if self
            .gacha
            .poll_detail(&mut detail_sink(&mut shown, self.posts.len()))
        {
            self.detail = shown;
        }
        self.gacha.tick(&mut self.events);
        self.flush_events();
    }

    pub fn batch(&self) -> Option<&DrawBatch> {
        self.gacha.batch()
    }

    pub fn quota_summary(&self) -> String {
        let quota = self.gacha.quota();
        quota_label(
            self.locale,
            quota.remaining(),
            quota.max_daily_draws(),
            &quota.countdown_text(),
        )
    }

    pub fn draw(&mut self) {
        match self.gacha.start_draw(&self.posts, &mut self.events) {
            Ok(()) => {
                self.detail = None;
                self.card_cursor = 0;
                self.roll_frame = 0;
                self.push_status(self.locale.text("rolling the die...", "擲骰子中..."));
            }
            Err(err) => self.push_error(err),
        }
        self.flush_events();
    }

    pub fn draw_again(&mut self) {
        if let Err(err) = self.gacha.reset_batch() {
            self.push_error(err);
            return;
        }
        self.draw();
    }

    pub fn pick_cursor(&mut self) {
        self.pick(self.card_cursor);
    }

    pub fn pick(&mut self, slot: usize) {
        let mut shown = None;
        let result = self.gacha.pick(
            slot,
            &self.posts,
            &mut detail_sink(&mut shown, self.posts.len()),
            &mut self.events,
        );
        match result {
            Ok(pick) => {
                self.card_cursor = pick.slot;
                if shown.is_some() {
                    self.detail = shown;
                }
                self.push_status(format!(
                    "{} #{}",
                    self.locale.text("picked card", "已選小卡"),
                    pick.slot + 1
                ));
            }
            Err(err) => self.push_error(err),
        }
        self.flush_events();
    }

    pub fn move_cursor(&mut self, down: bool) {
        let len = self.batch().map_or(0, |batch| batch.cards.len());
        move_index(&mut self.card_cursor, len, down);
    }

    pub fn close_overlay(&mut self) {
        if self.show_help {
            self.show_help = false;
        } else {
            self.detail = None;
        }
    }

    pub fn push_status(&mut self, value: impl Into<String>) {
        self.status_line = value.into();
    }

    pub fn push_error(&mut self, err: GachaError) {
        self.status_line = format!("{}: {err}", self.locale.text("error", "錯誤"));
    }

    fn flush_events(&mut self) {
        let drained: Vec<_> = self.events.drain().collect();
        for event in drained {
            match &event {
                Event::CountdownTick { .. } => continue,
                Event::Notice(notice) => self.status_line = notice_text(self.locale, notice),
                _ => {}
            }
            self.push_event_line(event_line(self.locale, &event));
        }
    }

    fn push_event_line(&mut self, line: String) {
        if self.event_log.len() >= MAX_EVENT_LOG {
            let _ = self.event_log.pop_front();
        }
        self.event_log.push_back(line);
    }
}

fn detail_sink(
    shown: &mut Option<CardDetail>,
    pool_len: usize,
) -> impl FnMut(&str, Option<usize>) + '_ {
    move |image: &str, pool_index: Option<usize>| {
        *shown = Some(CardDetail {
            image: image.to_string(),
            pool_index,
            pool_len,
        });
    }
}

fn move_index(cursor: &mut usize, len: usize, down: bool) {
    if len == 0 {
        *cursor = 0;
        return;
    }
    *cursor = if down {
        (*cursor + 1) % len
    } else if *cursor == 0 {
        len - 1
    } else {
        (*cursor - 1).min(len - 1)
    };
}
