use crate::PostId;
use serde::{Deserialize, Serialize};

/// User-facing messages. Presenters localize them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum Notice {
    QuotaExhausted,
    EmptyPool,
    ShortBatch { requested: u8, found: usize },
    NoCards,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum Event {
    QuotaRefreshed { remaining: u32, max: u32 },
    DrawStarted { remaining: u32, max: u32 },
    DiceRolled { dice_roll: u8 },
    CardsRevealed { requested: u8, found: usize },
    CardPicked {
        slot: usize,
        post_id: PostId,
        lucky_number: usize,
        pool_index: Option<usize>,
    },
    CountdownTick { remaining: String },
    QuotaReset { remaining: u32 },
    Notice(Notice),
}

#[derive(Debug, Default)]
pub struct EventBus {
    queue: Vec<Event>,
}

impl EventBus {
    pub fn push(&mut self, event: Event) {
        self.queue.push(event);
    }

    pub fn notify(&mut self, notice: Notice) {
        self.queue.push(Event::Notice(notice));
    }

    pub fn drain(&mut self) -> impl Iterator<Item = Event> + '_ {
        self.queue.drain(..)
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}
