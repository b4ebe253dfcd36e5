use crate::drawer::{draw_cards, DrawError};
use crate::{
    locate_in_pool, Clock, CountdownEvent, DrawnCard, Event, EventBus, GachaConfig,
    KeyValueStore, Notice, Post, QuotaError, QuotaState, QuotaTracker, RandomSource,
};
use chrono::{Duration, NaiveDateTime};
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GachaError {
    #[error("quota error: {0}")]
    Quota(#[from] QuotaError),
    #[error("draw error: {0}")]
    Draw(#[from] DrawError),
    #[error("a draw is already in progress")]
    DrawInProgress,
    #[error("no drawn cards to pick from")]
    NoBatch,
    #[error("a card was already picked from this batch")]
    SelectionClosed,
    #[error("invalid card slot {0}")]
    InvalidSlot(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawPhase {
    Idle,
    Rolling { until: NaiveDateTime },
    Settling { dice_roll: u8, until: NaiveDateTime },
    Revealed,
    /// A card was picked and is turning over before its post opens.
    Flipping { until: NaiveDateTime },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DrawBatch {
    pub dice_roll: u8,
    pub cards: Vec<DrawnCard>,
    picked: Option<usize>,
}

impl DrawBatch {
    pub fn new(dice_roll: u8, cards: Vec<DrawnCard>) -> Self {
        Self {
            dice_roll,
            cards,
            picked: None,
        }
    }

    pub fn picked(&self) -> Option<usize> {
        self.picked
    }

    pub fn is_closed(&self) -> bool {
        self.picked.is_some()
    }

    pub fn is_short(&self) -> bool {
        self.cards.len() < usize::from(self.dice_roll)
    }

    pub fn pick(&mut self, slot: usize) -> Result<&DrawnCard, GachaError> {
        if self.picked.is_some() {
            return Err(GachaError::SelectionClosed);
        }
        let card = self.cards.get(slot).ok_or(GachaError::InvalidSlot(slot))?;
        self.picked = Some(slot);
        Ok(card)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardPick {
    pub slot: usize,
    pub card: DrawnCard,
    pub pool_index: Option<usize>,
}

/// Receives the finalized pick: the card image and, when the post is still
/// in the pool, its position there.
pub trait DetailView {
    fn show(&mut self, image: &str, pool_index: Option<usize>);
}

impl<F> DetailView for F
where
    F: FnMut(&str, Option<usize>),
{
    fn show(&mut self, image: &str, pool_index: Option<usize>) {
        self(image, pool_index)
    }
}

/// One reader's gacha: the daily quota plus the draw in progress.
///
/// A draw runs `Idle -> Rolling -> Settling -> Revealed`, advanced by
/// [`Gacha::poll`] once each phase's delay has passed. A started draw always
/// runs to completion. Picking a card passes through `Flipping` when the
/// reveal delay is non-zero; [`Gacha::poll_detail`] then opens it.
#[derive(Debug)]
pub struct Gacha<S, C, R> {
    config: GachaConfig,
    quota: QuotaTracker<S, C>,
    rng: R,
    phase: DrawPhase,
    snapshot: Vec<Post>,
    batch: Option<DrawBatch>,
    pending_detail: Option<(String, Option<usize>)>,
}

impl<S: KeyValueStore, C: Clock, R: RandomSource> Gacha<S, C, R> {
    pub fn new(config: GachaConfig, store: S, clock: C, rng: R) -> Self {
        let quota = QuotaTracker::new(store, clock, &config);
        Self {
            config,
            quota,
            rng,
            phase: DrawPhase::Idle,
            snapshot: Vec::new(),
            batch: None,
            pending_detail: None,
        }
    }

    pub fn config(&self) -> &GachaConfig {
        &self.config
    }

    pub fn quota(&self) -> &QuotaTracker<S, C> {
        &self.quota
    }

    pub fn quota_mut(&mut self) -> &mut QuotaTracker<S, C> {
        &mut self.quota
    }

    pub fn phase(&self) -> DrawPhase {
        self.phase
    }

    pub fn batch(&self) -> Option<&DrawBatch> {
        self.batch.as_ref()
    }

    pub fn is_busy(&self) -> bool {
        matches!(
            self.phase,
            DrawPhase::Rolling { .. } | DrawPhase::Settling { .. } | DrawPhase::Flipping { .. }
        )
    }

    /// Called when the gacha UI opens.
    pub fn open(&mut self, events: &mut EventBus) -> QuotaState {
        self.quota.refresh();
        let state = self.quota.state();
        events.push(Event::QuotaRefreshed {
            remaining: self.quota.remaining(),
            max: self.quota.max_daily_draws(),
        });
        match state {
            QuotaState::Exhausted => {
                events.notify(Notice::QuotaExhausted);
                self.quota.start_countdown();
            }
            QuotaState::Available => {
                self.quota.stop_countdown();
            }
        }
        state
    }

    pub fn start_draw(&mut self, pool: &[Post], events: &mut EventBus) -> Result<(), GachaError> {
        if self.is_busy() {
            return Err(GachaError::DrawInProgress);
        }
        let remaining = match self.quota.consume_draw() {
            Ok(remaining) => remaining,
            Err(err) => {
                events.notify(Notice::QuotaExhausted);
                self.quota.start_countdown();
                return Err(err.into());
            }
        };
        if pool.is_empty() {
            self.quota.refund_draw();
            events.notify(Notice::EmptyPool);
            return Err(DrawError::EmptyPool.into());
        }

        self.snapshot = pool.to_vec();
        self.batch = None;
        let until = self.quota.clock().now() + self.config.timing.roll_delay();
        self.phase = DrawPhase::Rolling { until };
        events.push(Event::DrawStarted {
            remaining,
            max: self.quota.max_daily_draws(),
        });
        if remaining == 0 {
            self.quota.start_countdown();
        }
        debug!(remaining, pool = pool.len(), "draw started");
        Ok(())
    }

    /// Advance the draw in progress. Returns true when the phase changed.
    pub fn poll(&mut self, events: &mut EventBus) -> bool {
        let now = self.quota.clock().now();
        match self.phase {
            DrawPhase::Rolling { until } if now >= until => {
                let dice_roll = self.rng.roll_die(self.config.dice_sides);
                self.phase = DrawPhase::Settling {
                    dice_roll,
                    until: now + self.config.timing.settle_delay(),
                };
                events.push(Event::DiceRolled { dice_roll });
                true
            }
            DrawPhase::Settling { dice_roll, until } if now >= until => {
                let snapshot = std::mem::take(&mut self.snapshot);
                let cards = self.select_cards(dice_roll, &snapshot, events);
                events.push(Event::CardsRevealed {
                    requested: dice_roll,
                    found: cards.len(),
                });
                self.batch = Some(DrawBatch::new(dice_roll, cards));
                self.phase = DrawPhase::Revealed;
                true
            }
            _ => false,
        }
    }

    /// Run the drawer against `pool`, reporting empty pools and short
    /// batches to `events` instead of failing.
    pub fn select_cards(
        &mut self,
        dice_roll: u8,
        pool: &[Post],
        events: &mut EventBus,
    ) -> Vec<DrawnCard> {
        let cards = match draw_cards(dice_roll, pool, &mut self.rng, &self.config.limits) {
            Ok(cards) => cards,
            Err(DrawError::EmptyPool) => {
                events.notify(Notice::EmptyPool);
                return Vec::new();
            }
        };
        if cards.is_empty() {
            events.notify(Notice::NoCards);
        } else if cards.len() < usize::from(dice_roll) {
            events.notify(Notice::ShortBatch {
                requested: dice_roll,
                found: cards.len(),
            });
        }
        cards
    }

    /// Finalize the reader's choice. Only the first pick of a batch counts.
    pub fn pick<V: DetailView + ?Sized>(
        &mut self,
        slot: usize,
        pool: &[Post],
        view: &mut V,
        events: &mut EventBus,
    ) -> Result<CardPick, GachaError> {
        let batch = self.batch.as_mut().ok_or(GachaError::NoBatch)?;
        let card = batch.pick(slot)?.clone();
        let pool_index = locate_in_pool(pool, &card.post);
        if pool_index.is_none() {
            warn!(id = %card.post.id, "picked post is no longer in the pool");
        }
        let reveal_delay = self.config.timing.reveal_delay();
        if reveal_delay > Duration::zero() {
            self.pending_detail = Some((card.image().to_string(), pool_index));
            self.phase = DrawPhase::Flipping {
                until: self.quota.clock().now() + reveal_delay,
            };
        } else {
            view.show(card.image(), pool_index);
        }
        events.push(Event::CardPicked {
            slot,
            post_id: card.post.id.clone(),
            lucky_number: card.lucky_number,
            pool_index,
        });
        Ok(CardPick {
            slot,
            card,
            pool_index,
        })
    }

    /// Open the flipped card in `view` once the reveal delay has passed.
    /// Returns true when the view was called.
    pub fn poll_detail<V: DetailView + ?Sized>(&mut self, view: &mut V) -> bool {
        let DrawPhase::Flipping { until } = self.phase else {
            return false;
        };
        if self.quota.clock().now() < until {
            return false;
        }
        self.phase = DrawPhase::Revealed;
        match self.pending_detail.take() {
            Some((image, pool_index)) => {
                view.show(&image, pool_index);
                true
            }
            None => false,
        }
    }

    /// Drop the revealed batch so a new draw starts from a clean table.
    pub fn reset_batch(&mut self) -> Result<(), GachaError> {
        if self.is_busy() {
            return Err(GachaError::DrawInProgress);
        }
        self.batch = None;
        self.pending_detail = None;
        self.phase = DrawPhase::Idle;
        Ok(())
    }

    pub fn tick(&mut self, events: &mut EventBus) -> Option<CountdownEvent> {
        let event = self.quota.tick()?;
        match &event {
            CountdownEvent::Tick { remaining } => events.push(Event::CountdownTick {
                remaining: remaining.clone(),
            }),
            CountdownEvent::RolledOver { remaining } => {
                events.push(Event::QuotaReset {
                    remaining: *remaining,
                });
                if !self.is_busy() {
                    self.batch = None;
                    self.phase = DrawPhase::Idle;
                }
            }
        }
        Some(event)
    }
}
