use jigong_core::{DrawBatch, DrawnCard, Event, Notice};
use jigong_data::normalize_locale;

const DICE_FACES: [&str; 6] = ["⚀", "⚁", "⚂", "⚃", "⚄", "⚅"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiLocale {
    EnUs,
    ZhTw,
}

impl UiLocale {
    pub fn from_opt(value: Option<&str>) -> Self {
        let normalized = normalize_locale(value);
        if normalized == "zh_TW" {
            Self::ZhTw
        } else {
            Self::EnUs
        }
    }

    pub fn code(self) -> &'static str {
        match self {
            Self::EnUs => "en_US",
            Self::ZhTw => "zh_TW",
        }
    }

    pub fn text<'a>(self, en: &'a str, zh: &'a str) -> &'a str {
        if matches!(self, Self::ZhTw) {
            zh
        } else {
            en
        }
    }
}

pub fn dice_face(value: u8) -> &'static str {
    usize::from(value)
        .checked_sub(1)
        .and_then(|idx| DICE_FACES.get(idx))
        .copied()
        .unwrap_or("?")
}

/// Label for the draw control: `(remaining/max)` while draws remain, the
/// reset countdown once they are gone.
pub fn quota_label(locale: UiLocale, remaining: u32, max: u32, countdown: &str) -> String {
    if remaining > 0 {
        format!(
            "{} ({remaining}/{max})",
            locale.text("Draw a card", "抽仙佛")
        )
    } else {
        format!(
            "{} ({} {countdown})",
            locale.text("No draws left today", "今日機會已用完"),
            locale.text("next chance in", "下次機會")
        )
    }
}

pub fn draw_again_label(locale: UiLocale, remaining: u32, max: u32) -> String {
    format!(
        "{} ({remaining}/{max})",
        locale.text("Draw again", "再抽一次")
    )
}

pub fn flatten_text(text: &str) -> String {
    text.replace("\r\n", " ")
        .replace(|c: char| c == '\n' || c == '\r', " ")
}

pub fn lucky_label(locale: UiLocale, card: &DrawnCard) -> String {
    format!(
        "{}: {}",
        locale.text("Lucky number", "仙佛緣號"),
        card.lucky_number
    )
}

/// One line per card face: lucky number, date and the post text.
pub fn card_face(locale: UiLocale, card: &DrawnCard) -> String {
    format!(
        "{}  {}  {}",
        lucky_label(locale, card),
        card.post.date,
        flatten_text(&card.post.text)
    )
}

pub fn card_back(locale: UiLocale, slot: usize) -> String {
    format!("{} #{}", locale.text("Face-down card", "仙佛小卡"), slot + 1)
}

pub fn dice_result(locale: UiLocale, dice_roll: u8) -> String {
    match locale {
        UiLocale::ZhTw => format!("骰出：{dice_roll} 張仙佛小卡！"),
        UiLocale::EnUs => format!("Rolled {dice_roll}: draw {dice_roll} cards!"),
    }
}

/// Guidance line for the current batch state.
pub fn instructions(locale: UiLocale, batch: Option<&DrawBatch>, remaining: u32) -> String {
    let Some(batch) = batch else {
        return if remaining > 0 {
            locale
                .text("Press d to roll the die", "點擊「擲骰子」來決定抽卡數量")
                .to_string()
        } else {
            locale
                .text("No draws left today.", "今日抽卡機會已用完。")
                .to_string()
        };
    };
    if batch.cards.is_empty() {
        return locale
            .text("Not enough cards to draw.", "沒有足夠的仙佛小卡可以抽取。")
            .to_string();
    }
    if batch.is_closed() {
        return if remaining > 0 {
            locale
                .text("Press a to draw again", "可按 a 再抽一次")
                .to_string()
        } else {
            locale
                .text(
                    "No draws left today, come back tomorrow.",
                    "今日抽卡機會已用完，請明天再來。",
                )
                .to_string()
        };
    }
    if batch.is_short() {
        match locale {
            UiLocale::ZhTw => format!(
                "卡片數量不足！實際只找到了 {} 張。請點擊一張小卡。",
                batch.cards.len()
            ),
            UiLocale::EnUs => format!(
                "Not enough cards! Only found {}. Pick one card.",
                batch.cards.len()
            ),
        }
    } else {
        locale
            .text("Pick the card that calls to you!", "請點擊其中一張您感應到的仙佛小卡！")
            .to_string()
    }
}

pub fn notice_text(locale: UiLocale, notice: &Notice) -> String {
    match notice {
        Notice::QuotaExhausted => locale
            .text(
                "No draws left today. Wait for the countdown or come back tomorrow.",
                "今日抽卡機會已用完，請等待倒數計時結束或明天再來。",
            )
            .to_string(),
        Notice::EmptyPool => locale
            .text(
                "No posts to draw from. Check posts.json.",
                "沒有文章數據可供抽取。請檢查 posts.json。",
            )
            .to_string(),
        Notice::ShortBatch { requested, found } => match locale {
            UiLocale::ZhTw => format!("卡片數量不足！需要 {requested} 張，只找到 {found} 張。"),
            UiLocale::EnUs => format!("Not enough cards: wanted {requested}, found {found}."),
        },
        Notice::NoCards => locale
            .text("Not enough cards to draw.", "沒有足夠的仙佛小卡可以抽取。")
            .to_string(),
    }
}

pub fn event_line(locale: UiLocale, event: &Event) -> String {
    match event {
        Event::QuotaRefreshed { remaining, max } => {
            format!("{} {remaining}/{max}", locale.text("draws left", "剩餘次數"))
        }
        Event::DrawStarted { remaining, max } => format!(
            "{} ({remaining}/{max})",
            locale.text("rolling the die", "擲骰子中")
        ),
        Event::DiceRolled { dice_roll } => dice_result(locale, *dice_roll),
        Event::CardsRevealed { requested, found } => format!(
            "{} {found}/{requested}",
            locale.text("cards revealed", "翻出小卡")
        ),
        Event::CardPicked {
            slot,
            post_id,
            lucky_number,
            pool_index,
        } => format!(
            "{} #{} id={post_id} {}={lucky_number} {}",
            locale.text("picked", "選中"),
            slot + 1,
            locale.text("lucky", "緣號"),
            pool_index
                .map(|idx| format!("@{}", idx + 1))
                .unwrap_or_else(|| "@-".to_string())
        ),
        Event::CountdownTick { remaining } => {
            format!("{} {remaining}", locale.text("reset in", "重置倒數"))
        }
        Event::QuotaReset { remaining } => format!(
            "{} {remaining}",
            locale.text("new day, draws left", "新的一天，剩餘次數")
        ),
        Event::Notice(notice) => notice_text(locale, notice),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jigong_core::Post;

    fn card(text: &str) -> DrawnCard {
        DrawnCard {
            post: Post::new(5, "2026-10-05", text, Some("5.jpg")),
            dice_roll: 2,
            random_value: 3,
            lucky_number: 5,
        }
    }

    #[test]
    fn locale_from_aliases() {
        assert_eq!(UiLocale::from_opt(Some("zh-TW")), UiLocale::ZhTw);
        assert_eq!(UiLocale::from_opt(Some("zh")), UiLocale::ZhTw);
        assert_eq!(UiLocale::from_opt(None), UiLocale::EnUs);
        assert_eq!(UiLocale::from_opt(Some("fr")), UiLocale::EnUs);
    }

    #[test]
    fn quota_label_switches_to_countdown() {
        assert_eq!(
            quota_label(UiLocale::ZhTw, 2, 3, "05:00:00"),
            "抽仙佛 (2/3)"
        );
        assert_eq!(
            quota_label(UiLocale::EnUs, 0, 3, "05:00:00"),
            "No draws left today (next chance in 05:00:00)"
        );
    }

    #[test]
    fn card_face_flattens_newlines() {
        let face = card_face(UiLocale::EnUs, &card("line one\nline two\r\nthree"));
        assert_eq!(face, "Lucky number: 5  2026-10-05  line one line two three");
    }

    #[test]
    fn dice_faces_cover_one_to_six() {
        assert_eq!(dice_face(1), "⚀");
        assert_eq!(dice_face(6), "⚅");
        assert_eq!(dice_face(0), "?");
        assert_eq!(dice_face(7), "?");
    }

    #[test]
    fn short_batch_instructions_name_the_count() {
        let batch = DrawBatch::new(4, vec![card("a")]);
        assert_eq!(
            instructions(UiLocale::EnUs, Some(&batch), 2),
            "Not enough cards! Only found 1. Pick one card."
        );
        let full = DrawBatch::new(1, vec![card("a")]);
        assert_eq!(
            instructions(UiLocale::EnUs, Some(&full), 2),
            "Pick the card that calls to you!"
        );
        assert_eq!(
            instructions(UiLocale::EnUs, None, 0),
            "No draws left today."
        );
    }
}
