use crate::app::App;
use crate::present::{card_back, card_face, dice_face, dice_result, instructions};
use jigong_core::{Clock, DrawPhase, KeyValueStore};
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::prelude::{Alignment, Color, Line, Modifier, Style, Stylize};
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap};
use ratatui::Frame;

pub fn draw<S: KeyValueStore, C: Clock>(frame: &mut Frame, app: &App<S, C>) {
    let root = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(6),
            Constraint::Min(10),
            Constraint::Length(5),
            Constraint::Length(10),
        ])
        .split(frame.area());

    draw_header(frame, root[0], app);

    let middle = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(35), Constraint::Percentage(65)])
        .split(root[1]);

    draw_dice(frame, middle[0], app);
    draw_cards(frame, middle[1], app);
    draw_detail(frame, root[2], app);
    draw_events(frame, root[3], app);

    if app.show_help {
        draw_help_popup(frame, app);
    }
}

fn draw_header<S: KeyValueStore, C: Clock>(frame: &mut Frame, area: Rect, app: &App<S, C>) {
    let quota = app.gacha.quota();
    let title = format!(
        "{} | {}",
        app.locale.text("Jigong daily cards", "濟公報 仙佛小卡"),
        app.quota_summary()
    );
    let extra = format!(
        "{} {} | {} {} | {} {} | {} {}",
        app.locale.text("Posts", "文章"),
        app.posts.len(),
        app.locale.text("Used today", "今日已抽"),
        quota.draws_used(),
        app.locale.text("Seed", "種子"),
        app.seed,
        app.locale.text("Lang", "語言"),
        app.locale.code()
    );
    let lines = vec![
        Line::from(title.bold()),
        Line::from(instructions(
            app.locale,
            app.batch(),
            quota.remaining(),
        )),
        Line::from(extra),
        Line::from(format!(
            "{}: {}",
            app.locale.text("Status", "狀態"),
            app.status_line
        )),
    ];
    let block = Block::default()
        .borders(Borders::ALL)
        .title(app.locale.text("Gacha", "抽卡"));
    let paragraph = Paragraph::new(lines).wrap(Wrap { trim: true }).block(block);
    frame.render_widget(paragraph, area);
}

fn draw_dice<S: KeyValueStore, C: Clock>(frame: &mut Frame, area: Rect, app: &App<S, C>) {
    let (face, caption) = match app.gacha.phase() {
        DrawPhase::Idle => ("-".to_string(), String::new()),
        DrawPhase::Rolling { .. } => {
            let spinning = (app.roll_frame % 6) as u8 + 1;
            (
                dice_face(spinning).to_string(),
                app.locale.text("rolling...", "擲骰子中...").to_string(),
            )
        }
        DrawPhase::Settling { dice_roll, .. } => (
            dice_face(dice_roll).to_string(),
            dice_result(app.locale, dice_roll),
        ),
        DrawPhase::Revealed | DrawPhase::Flipping { .. } => match app.batch() {
            Some(batch) => (
                dice_face(batch.dice_roll).to_string(),
                dice_result(app.locale, batch.dice_roll),
            ),
            None => ("-".to_string(), String::new()),
        },
    };
    let lines = vec![
        Line::from(""),
        Line::from(face.bold()),
        Line::from(""),
        Line::from(caption),
    ];
    let block = Block::default()
        .borders(Borders::ALL)
        .title(app.locale.text("Dice", "骰子"));
    frame.render_widget(
        Paragraph::new(lines)
            .alignment(Alignment::Center)
            .block(block),
        area,
    );
}

fn draw_cards<S: KeyValueStore, C: Clock>(frame: &mut Frame, area: Rect, app: &App<S, C>) {
    let batch = app.batch();
    let items: Vec<ListItem<'_>> = match batch {
        Some(batch) if !batch.cards.is_empty() => batch
            .cards
            .iter()
            .enumerate()
            .map(|(idx, card)| {
                if batch.picked() == Some(idx) {
                    ListItem::new(format!("#{} {}", idx + 1, card_face(app.locale, card)))
                        .style(Style::default().fg(Color::Yellow))
                } else {
                    ListItem::new(card_back(app.locale, idx))
                }
            })
            .collect(),
        _ => vec![ListItem::new(app.locale.text("no cards", "尚無小卡"))],
    };
    let selectable = batch.is_some_and(|batch| !batch.cards.is_empty() && !batch.is_closed());
    let block = pane_block(app.locale.text("Cards", "仙佛小卡"), selectable);
    let list = List::new(items)
        .block(block)
        .highlight_style(
            Style::default()
                .fg(Color::Black)
                .bg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol(">> ");
    let mut state = ListState::default();
    if selectable {
        let len = batch.map_or(0, |batch| batch.cards.len());
        state.select(Some(app.card_cursor.min(len.saturating_sub(1))));
    }
    frame.render_stateful_widget(list, area, &mut state);
}

fn draw_detail<S: KeyValueStore, C: Clock>(frame: &mut Frame, area: Rect, app: &App<S, C>) {
    let lines = match app.detail.as_ref() {
        Some(detail) => vec![
            Line::from(format!(
                "{}: {}",
                app.locale.text("Image", "圖片"),
                detail.image
            )),
            Line::from(match detail.pool_index {
                Some(index) => format!(
                    "{}: {}/{}",
                    app.locale.text("Post", "文章"),
                    index + 1,
                    detail.pool_len
                ),
                None => app
                    .locale
                    .text(
                        "Post position unknown; browsing disabled",
                        "找不到文章位置，無法瀏覽前後文章",
                    )
                    .to_string(),
            }),
        ],
        None => vec![Line::from(
            app.locale.text("pick a card to view it", "選一張小卡查看"),
        )],
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .title(app.locale.text("Detail", "詳細"));
    frame.render_widget(
        Paragraph::new(lines).block(block).wrap(Wrap { trim: true }),
        area,
    );
}

fn draw_events<S: KeyValueStore, C: Clock>(frame: &mut Frame, area: Rect, app: &App<S, C>) {
    let height = area.height.saturating_sub(2) as usize;
    let lines: Vec<Line<'_>> = app
        .event_log
        .iter()
        .rev()
        .take(height)
        .rev()
        .map(|line| Line::from(line.as_str()))
        .collect();
    let block = Block::default()
        .borders(Borders::ALL)
        .title(app.locale.text("Events", "事件"));
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn draw_help_popup<S: KeyValueStore, C: Clock>(frame: &mut Frame, app: &App<S, C>) {
    let area = centered_rect(60, 50, frame.area());
    frame.render_widget(Clear, area);
    let lines = vec![
        Line::from(app.locale.text("q quit | ? help", "q 退出 | ? 說明")),
        Line::from(app.locale.text(
            "d roll the die | a draw again",
            "d 擲骰子 | a 再抽一次",
        )),
        Line::from(app.locale.text(
            "arrows/jk move | enter/space pick | 1-6 pick by slot",
            "方向鍵/jk 移動 | 回車/空格 選卡 | 1-6 依序號選卡",
        )),
        Line::from(app.locale.text(
            "esc close help or detail",
            "esc 關閉說明或詳細",
        )),
    ];
    let block = Block::default()
        .title(app.locale.text("Help", "說明"))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));
    frame.render_widget(
        Paragraph::new(lines).block(block).wrap(Wrap { trim: true }),
        area,
    );
}

fn pane_block(title: &str, focused: bool) -> Block<'_> {
    let mut block = Block::default().title(title).borders(Borders::ALL);
    if focused {
        block = block.border_style(Style::default().fg(Color::Yellow));
    }
    block
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);
    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
