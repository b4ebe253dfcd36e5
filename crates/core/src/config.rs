use chrono::Duration;
use serde::{Deserialize, Serialize};

pub const MAX_DAILY_DRAWS: u32 = 3;
pub const DICE_SIDES: u8 = 6;
pub const MAX_CARD_ATTEMPTS: u32 = 10;
pub const MAX_BATCH_ATTEMPTS: u32 = 50;
pub const MAX_UNIQUE_VALUE_ATTEMPTS: u32 = 100;
pub const ROLL_DELAY_MS: u64 = 2000;
pub const SETTLE_DELAY_MS: u64 = 800;
pub const REVEAL_DELAY_MS: u64 = 600;
pub const COUNTDOWN_TICK_MS: u64 = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DrawLimits {
    pub max_card_attempts: u32,
    pub max_batch_attempts: u32,
    pub max_unique_value_attempts: u32,
}

impl Default for DrawLimits {
    fn default() -> Self {
        Self {
            max_card_attempts: MAX_CARD_ATTEMPTS,
            max_batch_attempts: MAX_BATCH_ATTEMPTS,
            max_unique_value_attempts: MAX_UNIQUE_VALUE_ATTEMPTS,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DrawTiming {
    pub roll_ms: u64,
    pub settle_ms: u64,
    /// Card flip before the picked post opens.
    pub reveal_ms: u64,
    pub countdown_tick_ms: u64,
}

impl DrawTiming {
    pub fn roll_delay(&self) -> Duration {
        millis(self.roll_ms)
    }

    pub fn settle_delay(&self) -> Duration {
        millis(self.settle_ms)
    }

    pub fn reveal_delay(&self) -> Duration {
        millis(self.reveal_ms)
    }

    pub fn countdown_tick(&self) -> Duration {
        millis(self.countdown_tick_ms)
    }
}

impl Default for DrawTiming {
    fn default() -> Self {
        Self {
            roll_ms: ROLL_DELAY_MS,
            settle_ms: SETTLE_DELAY_MS,
            reveal_ms: REVEAL_DELAY_MS,
            countdown_tick_ms: COUNTDOWN_TICK_MS,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GachaConfig {
    pub max_daily_draws: u32,
    pub dice_sides: u8,
    pub limits: DrawLimits,
    pub timing: DrawTiming,
}

impl Default for GachaConfig {
    fn default() -> Self {
        Self {
            max_daily_draws: MAX_DAILY_DRAWS,
            dice_sides: DICE_SIDES,
            limits: DrawLimits::default(),
            timing: DrawTiming::default(),
        }
    }
}

fn millis(value: u64) -> Duration {
    Duration::milliseconds(value.min(u64::from(u32::MAX)) as i64)
}
