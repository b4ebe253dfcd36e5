use anyhow::{Context, Result};
use jigong_core::{
    eligible_count, Clock, DrawPhase, EventBus, Gacha, GachaError, KeyValueStore, Post, RngState,
    SystemClock,
};
use jigong_cui::present::{
    card_back, card_face, draw_again_label, event_line, instructions, quota_label, UiLocale,
};
use jigong_cui::{resolve_assets_dir, resolve_store_path, LaunchOptions};
use jigong_data::{
    default_posts_path, load_gacha_config, load_posts, save_posts, sort_posts_desc, JsonFileStore,
};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

const POLL_INTERVAL: Duration = Duration::from_millis(50);

#[derive(Debug, Clone, Default)]
struct CliOptions {
    cui: bool,
    launch: LaunchOptions,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Quit,
}

struct Session<S, C = SystemClock> {
    locale: UiLocale,
    gacha: Gacha<S, C, RngState>,
    posts: Vec<Post>,
    posts_path: PathBuf,
    events: EventBus,
}

fn parse_cli_options(args: &[String]) -> CliOptions {
    let mut options = CliOptions::default();
    options.launch.locale = std::env::var("JIGONG_LANG").ok();
    let mut idx = 0usize;
    while idx < args.len() {
        let value = args.get(idx + 1);
        match (args[idx].as_str(), value) {
            ("--cui", _) => options.cui = true,
            ("--lang" | "-l", Some(value)) => {
                options.launch.locale = Some(value.clone());
                idx += 1;
            }
            ("--seed", Some(value)) => {
                options.launch.seed = value.parse::<u64>().ok();
                idx += 1;
            }
            ("--assets", Some(value)) => {
                options.launch.assets_dir = Some(PathBuf::from(value));
                idx += 1;
            }
            ("--posts", Some(value)) => {
                options.launch.posts_path = Some(PathBuf::from(value));
                idx += 1;
            }
            ("--store", Some(value)) => {
                options.launch.store_path = Some(PathBuf::from(value));
                idx += 1;
            }
            _ => {}
        }
        idx += 1;
    }
    options
}

fn setup_tracing() {
    let filter = EnvFilter::try_from_env("JIGONG_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    let subscriber = tracing_subscriber::FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .finish();
    if let Err(err) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("tracing setup failed: {err}");
    }
}

fn main() {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let options = parse_cli_options(&args);
    if options.cui {
        if let Err(err) = jigong_cui::run(options.launch) {
            eprintln!("cui launch error: {err:#}");
            std::process::exit(1);
        }
        return;
    }
    setup_tracing();
    if let Err(err) = run_repl(&options.launch) {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}

fn build_session(launch: &LaunchOptions) -> Result<Session<JsonFileStore>> {
    let locale = UiLocale::from_opt(launch.locale.as_deref());
    let assets = resolve_assets_dir(launch);
    let config = load_gacha_config(&assets).context("load gacha config")?;
    let posts_path = launch
        .posts_path
        .clone()
        .unwrap_or_else(|| default_posts_path(&assets));
    let report = load_posts(&posts_path).context("load posts")?;
    if report.skipped > 0 {
        println!(
            "{}: {}",
            locale.text("posts skipped (missing id or date)", "略過文章（缺少 id 或日期）"),
            report.skipped
        );
    }
    let store_path = resolve_store_path(launch);
    tracing::info!(store = %store_path.display(), "opening quota store");
    let rng = launch
        .seed
        .map(RngState::from_seed)
        .unwrap_or_else(RngState::from_entropy);
    Ok(Session::new(
        locale,
        Gacha::new(config, JsonFileStore::open(store_path), SystemClock, rng),
        report.posts,
        posts_path,
    ))
}

fn run_repl(launch: &LaunchOptions) -> Result<()> {
    let mut session = build_session(launch)?;
    let locale = session.locale;
    let mut out = io::stdout();
    writeln!(out, "{}: {}", locale.text("locale", "語言"), locale.code())?;
    writeln!(
        out,
        "{}: {} ({})",
        locale.text("posts loaded", "已載入文章"),
        session.posts.len(),
        session.posts_path.display()
    )?;
    session.open(&mut out)?;
    print_help(locale, &mut out)?;

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        write!(out, "> ")?;
        out.flush()?;
        let Some(line) = lines.next() else {
            break;
        };
        let line = line.context("read command")?;
        if session.execute(&line, &mut out)? == Flow::Quit {
            break;
        }
    }
    Ok(())
}

impl<S: KeyValueStore, C: Clock> Session<S, C> {
    fn new(
        locale: UiLocale,
        gacha: Gacha<S, C, RngState>,
        posts: Vec<Post>,
        posts_path: PathBuf,
    ) -> Self {
        Self {
            locale,
            gacha,
            posts,
            posts_path,
            events: EventBus::default(),
        }
    }

    fn open(&mut self, out: &mut impl Write) -> Result<()> {
        self.gacha.open(&mut self.events);
        self.drain_events(out)?;
        self.print_status(out)
    }

    fn execute(&mut self, line: &str, out: &mut impl Write) -> Result<Flow> {
        let input = line.trim();
        if input.is_empty() {
            return Ok(Flow::Continue);
        }
        let mut parts = input.split_whitespace();
        let cmd = parts.next().unwrap_or("");
        let args: Vec<&str> = parts.collect();
        let locale = self.locale;
        match cmd {
            "help" | "h" | "?" => print_help(locale, out)?,
            "quit" | "exit" | "q" => return Ok(Flow::Quit),
            "status" | "s" => self.print_status(out)?,
            "draw" | "d" => self.draw(out)?,
            "again" | "a" => match self.gacha.reset_batch() {
                Ok(()) => self.draw(out)?,
                Err(err) => print_error(locale, &err, out)?,
            },
            "cards" | "c" => self.print_cards(out)?,
            "pick" | "p" => {
                let slot = args.first().and_then(|arg| arg.parse::<usize>().ok());
                match slot {
                    Some(slot) if slot >= 1 => self.pick(slot - 1, out)?,
                    _ => writeln!(
                        out,
                        "{}",
                        locale.text("usage: pick <1-6>", "用法：pick <1-6>")
                    )?,
                }
            }
            "wait" | "countdown" => self.print_countdown(out)?,
            "posts" => writeln!(
                out,
                "{}: {} ({} {})",
                locale.text("posts", "文章"),
                self.posts.len(),
                eligible_count(&self.posts),
                locale.text("with images", "有圖片")
            )?,
            "sort" => self.sort_posts(out)?,
            _ => writeln!(
                out,
                "{}: {cmd} ({})",
                locale.text("unknown command", "未知指令"),
                locale.text("type help", "輸入 help")
            )?,
        }
        Ok(Flow::Continue)
    }

    fn draw(&mut self, out: &mut impl Write) -> Result<()> {
        if let Err(err) = self.gacha.start_draw(&self.posts, &mut self.events) {
            self.drain_events(out)?;
            if !matches!(err, GachaError::Quota(_) | GachaError::Draw(_)) {
                print_error(self.locale, &err, out)?;
            }
            return Ok(());
        }
        self.drain_events(out)?;
        while self.gacha.phase() != DrawPhase::Revealed {
            if !self.gacha.poll(&mut self.events) {
                std::thread::sleep(POLL_INTERVAL);
                continue;
            }
            self.drain_events(out)?;
        }
        self.print_cards(out)
    }

    fn pick(&mut self, slot: usize, out: &mut impl Write) -> Result<()> {
        let locale = self.locale;
        let pool_len = self.posts.len();
        let mut shown = Vec::new();
        let mut view = |image: &str, pool_index: Option<usize>| {
            shown.push(match pool_index {
                Some(index) => format!(
                    "{}: {image} ({} {}/{pool_len})",
                    locale.text("image", "圖片"),
                    locale.text("post", "文章"),
                    index + 1
                ),
                None => format!("{}: {image}", locale.text("image", "圖片")),
            });
        };
        let result = self.gacha.pick(slot, &self.posts, &mut view, &mut self.events);
        if result.is_ok() {
            while matches!(self.gacha.phase(), DrawPhase::Flipping { .. }) {
                if !self.gacha.poll_detail(&mut view) {
                    std::thread::sleep(POLL_INTERVAL);
                }
            }
        }
        match result {
            Ok(pick) => {
                writeln!(out, "{}", card_face(locale, &pick.card))?;
                for line in shown {
                    writeln!(out, "{line}")?;
                }
                self.drain_events(out)?;
                writeln!(
                    out,
                    "{}",
                    instructions(locale, self.gacha.batch(), self.gacha.quota().remaining())
                )?;
            }
            Err(err) => print_error(locale, &err, out)?,
        }
        Ok(())
    }

    fn print_cards(&self, out: &mut impl Write) -> Result<()> {
        let locale = self.locale;
        let Some(batch) = self.gacha.batch() else {
            writeln!(out, "{}", locale.text("no cards drawn", "尚未抽卡"))?;
            return Ok(());
        };
        for (idx, card) in batch.cards.iter().enumerate() {
            if batch.picked() == Some(idx) {
                writeln!(out, "  {}) {}", idx + 1, card_face(locale, card))?;
            } else {
                writeln!(out, "  {}) {}", idx + 1, card_back(locale, idx))?;
            }
        }
        writeln!(
            out,
            "{}",
            instructions(locale, Some(batch), self.gacha.quota().remaining())
        )?;
        Ok(())
    }

    fn print_status(&mut self, out: &mut impl Write) -> Result<()> {
        let locale = self.locale;
        self.gacha.quota_mut().roll_over_if_stale();
        let quota = self.gacha.quota();
        let label = quota_label(
            locale,
            quota.remaining(),
            quota.max_daily_draws(),
            &quota.countdown_text(),
        );
        writeln!(out, "{label}")?;
        writeln!(
            out,
            "{}: {}/{} | {}: {} | {}: {}",
            locale.text("used today", "今日已抽"),
            quota.draws_used(),
            quota.max_daily_draws(),
            locale.text("date", "日期"),
            quota.last_draw_date(),
            locale.text("reset in", "重置倒數"),
            quota.countdown_text()
        )?;
        if self
            .gacha
            .batch()
            .is_some_and(|batch| batch.is_closed() && quota.remaining() > 0)
        {
            writeln!(
                out,
                "{}",
                draw_again_label(locale, quota.remaining(), quota.max_daily_draws())
            )?;
        }
        Ok(())
    }

    fn print_countdown(&mut self, out: &mut impl Write) -> Result<()> {
        self.gacha.tick(&mut self.events);
        self.drain_events(out)?;
        let quota = self.gacha.quota();
        writeln!(
            out,
            "{}: {} ({}/{})",
            self.locale.text("next reset in", "距離重置"),
            quota.countdown_text(),
            quota.remaining(),
            quota.max_daily_draws()
        )?;
        Ok(())
    }

    fn sort_posts(&mut self, out: &mut impl Write) -> Result<()> {
        if self.gacha.is_busy() {
            print_error(self.locale, &GachaError::DrawInProgress, out)?;
            return Ok(());
        }
        sort_posts_desc(&mut self.posts);
        save_posts(&self.posts_path, &self.posts)?;
        writeln!(
            out,
            "{}: {}",
            self.locale.text("sorted and saved", "已排序並儲存"),
            self.posts_path.display()
        )?;
        Ok(())
    }

    fn drain_events(&mut self, out: &mut impl Write) -> Result<()> {
        for event in self.events.drain() {
            writeln!(out, "  {}", event_line(self.locale, &event))?;
        }
        Ok(())
    }
}

fn print_error(locale: UiLocale, err: &GachaError, out: &mut impl Write) -> Result<()> {
    writeln!(out, "{}: {err}", locale.text("error", "錯誤"))?;
    Ok(())
}

fn print_help(locale: UiLocale, out: &mut impl Write) -> Result<()> {
    let lines = [
        locale.text("commands:", "指令："),
        locale.text(
            "  draw|d          roll the die and draw cards",
            "  draw|d          擲骰子並抽卡",
        ),
        locale.text(
            "  pick|p <n>      pick card n of the batch",
            "  pick|p <n>      選擇第 n 張小卡",
        ),
        locale.text("  again|a         draw again", "  again|a         再抽一次"),
        locale.text(
            "  cards|c         show the current batch",
            "  cards|c         顯示本次小卡",
        ),
        locale.text(
            "  status|s        draws left and reset time",
            "  status|s        剩餘次數與重置時間",
        ),
        locale.text(
            "  wait            show the reset countdown",
            "  wait            顯示重置倒數",
        ),
        locale.text(
            "  posts           pool size",
            "  posts           文章數量",
        ),
        locale.text(
            "  sort            sort posts by id (newest first) and save",
            "  sort            依 id 由新到舊排序並儲存",
        ),
        locale.text("  help|h  quit|q", "  help|h 說明  quit|q 離開"),
    ];
    for line in lines {
        writeln!(out, "{line}")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveDateTime};
    use jigong_core::{DrawTiming, FixedClock, GachaConfig, MemoryStore};

    type TestSession = Session<MemoryStore, FixedClock>;

    fn evening() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 10, 17)
            .and_then(|date| date.and_hms_opt(20, 30, 0))
            .expect("valid datetime")
    }

    fn args(values: &[&str]) -> Vec<String> {
        values.iter().map(|value| value.to_string()).collect()
    }

    fn posts(count: usize) -> Vec<Post> {
        (1..=count)
            .map(|id| {
                Post::new(
                    id as i64,
                    "2026-10-01",
                    &format!("post {id}\nsecond line"),
                    Some(&format!("img/{id}.jpg")),
                )
            })
            .collect()
    }

    fn session(posts: Vec<Post>) -> TestSession {
        let config = GachaConfig {
            timing: DrawTiming {
                roll_ms: 0,
                settle_ms: 0,
                reveal_ms: 0,
                countdown_tick_ms: 1000,
            },
            ..GachaConfig::default()
        };
        let gacha = Gacha::new(
            config,
            MemoryStore::default(),
            FixedClock::at(evening()),
            RngState::from_seed(3),
        );
        Session::new(UiLocale::EnUs, gacha, posts, PathBuf::from("unused.json"))
    }

    fn run(session: &mut TestSession, line: &str) -> String {
        let mut out = Vec::new();
        session.execute(line, &mut out).expect("execute");
        String::from_utf8(out).expect("utf8")
    }

    #[test]
    fn parses_cli_flags() {
        let options = parse_cli_options(&args(&["--cui", "-l", "zh-TW", "--seed", "9"]));
        assert!(options.cui);
        assert_eq!(options.launch.locale.as_deref(), Some("zh-TW"));
        assert_eq!(options.launch.seed, Some(9));
    }

    #[test]
    fn draw_then_pick_prints_the_card() {
        let mut session = session(posts(20));
        let drawn = run(&mut session, "draw");
        assert!(drawn.contains("Face-down card #1"));

        let picked = run(&mut session, "pick 1");
        assert!(picked.contains("Lucky number:"));
        assert!(picked.contains("second line"));
        assert!(picked.contains("image: img/"));
        assert!(picked.contains("Press a to draw again"));

        let again = run(&mut session, "pick 1");
        assert!(again.contains("error:"));
    }

    #[test]
    fn quota_runs_out_after_three_draws() {
        let mut session = session(posts(20));
        for _ in 0..3 {
            run(&mut session, "again");
        }
        let refused = run(&mut session, "again");
        assert!(refused.contains("No draws left today."));
        let status = run(&mut session, "status");
        assert!(status.contains("used today: 3/3"));
        assert!(status.contains("next chance in 03:30:00"));
        assert!(status.contains("date: 2026-10-17"));
    }

    #[test]
    fn empty_pool_is_reported() {
        let mut session = session(Vec::new());
        let out = run(&mut session, "draw");
        assert!(out.contains("No posts to draw from"));
        assert_eq!(session.gacha.quota().remaining(), 3);
    }

    #[test]
    fn quit_and_unknown_commands() {
        let mut session = session(posts(2));
        let mut out = Vec::new();
        assert_eq!(session.execute("q", &mut out).expect("quit"), Flow::Quit);
        assert!(run(&mut session, "bogus").contains("unknown command"));
        assert!(run(&mut session, "pick").contains("usage"));
    }
}
