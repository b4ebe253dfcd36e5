use crate::{
    format_countdown, format_date, next_midnight, parse_date, Clock, GachaConfig, KeyValueStore,
    DATE_KEY, DRAWS_KEY,
};
use chrono::{Duration, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QuotaState {
    Available,
    Exhausted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum QuotaError {
    #[error("no draws remaining today")]
    Exhausted,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CountdownEvent {
    Tick { remaining: String },
    RolledOver { remaining: u32 },
}

/// Identifies one started countdown. Starting a new countdown invalidates
/// every earlier handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CountdownHandle(u64);

#[derive(Debug, Clone)]
struct Countdown {
    handle: CountdownHandle,
    next_tick: NaiveDateTime,
}

#[derive(Debug)]
pub struct QuotaTracker<S, C> {
    store: S,
    clock: C,
    max_daily_draws: u32,
    tick_interval: Duration,
    draws_used: u32,
    last_draw_date: NaiveDate,
    reset_deadline: NaiveDateTime,
    countdown: Option<Countdown>,
    next_handle: u64,
}

impl<S: KeyValueStore, C: Clock> QuotaTracker<S, C> {
    pub fn new(store: S, clock: C, config: &GachaConfig) -> Self {
        let today = clock.today();
        let mut tracker = Self {
            store,
            clock,
            max_daily_draws: config.max_daily_draws,
            tick_interval: config.timing.countdown_tick(),
            draws_used: 0,
            last_draw_date: today,
            reset_deadline: next_midnight(today),
            countdown: None,
            next_handle: 0,
        };
        tracker.refresh();
        tracker
    }

    /// Reload the counter for today, starting a fresh day when the stored
    /// date is not today. Unreadable values count as zero draws used.
    pub fn refresh(&mut self) {
        let today = self.clock.today();
        let stored_date = self.read(DATE_KEY).as_deref().and_then(parse_date);
        if stored_date == Some(today) {
            self.draws_used = self
                .read(DRAWS_KEY)
                .and_then(|raw| raw.trim().parse::<u32>().ok())
                .unwrap_or(0)
                .min(self.max_daily_draws);
        } else {
            debug!(
                previous = ?stored_date,
                today = %today,
                "starting a new draw day"
            );
            self.draws_used = 0;
            self.write(DRAWS_KEY, "0");
            self.write(DATE_KEY, &format_date(today));
        }
        self.last_draw_date = today;
        self.reset_deadline = next_midnight(today);
    }

    /// Refresh only when the calendar day changed since the last refresh.
    pub fn roll_over_if_stale(&mut self) -> bool {
        if self.clock.today() == self.last_draw_date {
            return false;
        }
        self.refresh();
        true
    }

    /// Use one draw. Returns the draws left afterwards; state is untouched
    /// when the quota is already exhausted.
    pub fn consume_draw(&mut self) -> Result<u32, QuotaError> {
        self.roll_over_if_stale();
        if self.remaining() == 0 {
            return Err(QuotaError::Exhausted);
        }
        self.draws_used += 1;
        self.persist();
        Ok(self.remaining())
    }

    /// Give back the most recent draw, for draws that could not start.
    pub fn refund_draw(&mut self) {
        if self.draws_used == 0 {
            return;
        }
        self.draws_used -= 1;
        self.persist();
    }

    pub fn remaining(&self) -> u32 {
        self.max_daily_draws.saturating_sub(self.draws_used)
    }

    pub fn state(&self) -> QuotaState {
        if self.remaining() > 0 {
            QuotaState::Available
        } else {
            QuotaState::Exhausted
        }
    }

    pub fn draws_used(&self) -> u32 {
        self.draws_used
    }

    pub fn max_daily_draws(&self) -> u32 {
        self.max_daily_draws
    }

    pub fn last_draw_date(&self) -> NaiveDate {
        self.last_draw_date
    }

    pub fn reset_deadline(&self) -> NaiveDateTime {
        self.reset_deadline
    }

    pub fn time_until_reset(&self) -> Duration {
        self.reset_deadline - self.clock.now()
    }

    pub fn countdown_text(&self) -> String {
        format_countdown(self.time_until_reset())
    }

    pub fn start_countdown(&mut self) -> CountdownHandle {
        self.stop_countdown();
        self.next_handle += 1;
        let handle = CountdownHandle(self.next_handle);
        self.countdown = Some(Countdown {
            handle,
            next_tick: self.clock.now() + self.tick_interval,
        });
        debug!(deadline = %self.reset_deadline, "countdown started");
        handle
    }

    pub fn stop_countdown(&mut self) -> bool {
        self.countdown.take().is_some()
    }

    pub fn countdown_handle(&self) -> Option<CountdownHandle> {
        self.countdown.as_ref().map(|countdown| countdown.handle)
    }

    pub fn is_counting_down(&self) -> bool {
        self.countdown.is_some()
    }

    /// Drive the active countdown. Fires at most once per tick interval;
    /// once the deadline passes the countdown stops and the quota refreshes.
    pub fn tick(&mut self) -> Option<CountdownEvent> {
        let now = self.clock.now();
        let interval = self.tick_interval;
        let countdown = self.countdown.as_mut()?;
        if now < countdown.next_tick {
            return None;
        }
        countdown.next_tick = now + interval;
        let left = self.reset_deadline - now;
        if left <= Duration::zero() {
            self.stop_countdown();
            self.refresh();
            return Some(CountdownEvent::RolledOver {
                remaining: self.remaining(),
            });
        }
        Some(CountdownEvent::Tick {
            remaining: format_countdown(left),
        })
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    fn persist(&mut self) {
        let draws = self.draws_used.to_string();
        let date = format_date(self.last_draw_date);
        self.write(DRAWS_KEY, &draws);
        self.write(DATE_KEY, &date);
    }

    fn read(&self, key: &str) -> Option<String> {
        match self.store.get(key) {
            Ok(value) => value,
            Err(err) => {
                warn!(key, %err, "quota read failed; treating as unset");
                None
            }
        }
    }

    fn write(&mut self, key: &str, value: &str) {
        if let Err(err) = self.store.set(key, value) {
            warn!(key, %err, "quota write failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{FixedClock, MemoryStore, StorageError};

    fn at(y: i32, m: u32, d: u32, hh: u32, mm: u32, ss: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .and_then(|date| date.and_hms_opt(hh, mm, ss))
            .expect("valid datetime")
    }

    fn tracker_at(
        store: MemoryStore,
        now: NaiveDateTime,
    ) -> QuotaTracker<MemoryStore, FixedClock> {
        QuotaTracker::new(store, FixedClock::at(now), &GachaConfig::default())
    }

    struct BrokenStore;

    impl KeyValueStore for BrokenStore {
        fn get(&self, _key: &str) -> Result<Option<String>, StorageError> {
            Err(StorageError::Io("disk gone".to_string()))
        }

        fn set(&mut self, _key: &str, _value: &str) -> Result<(), StorageError> {
            Err(StorageError::Io("disk gone".to_string()))
        }
    }

    #[test]
    fn fresh_store_starts_with_full_quota() {
        let tracker = tracker_at(MemoryStore::default(), at(2026, 10, 17, 9, 0, 0));
        assert_eq!(tracker.remaining(), 3);
        assert_eq!(tracker.state(), QuotaState::Available);
        assert_eq!(tracker.store().value(DRAWS_KEY), Some("0"));
        assert_eq!(tracker.store().value(DATE_KEY), Some("2026-10-17"));
        assert_eq!(tracker.reset_deadline(), at(2026, 10, 18, 0, 0, 0));
    }

    #[test]
    fn same_day_counter_is_restored() {
        let store = MemoryStore::with_entries([(DRAWS_KEY, "2"), (DATE_KEY, "2026-10-17")]);
        let tracker = tracker_at(store, at(2026, 10, 17, 21, 30, 0));
        assert_eq!(tracker.draws_used(), 2);
        assert_eq!(tracker.remaining(), 1);
    }

    #[test]
    fn consuming_to_the_cap_exhausts_and_further_draws_are_rejected() {
        let mut tracker = tracker_at(MemoryStore::default(), at(2026, 10, 17, 9, 0, 0));
        assert_eq!(tracker.consume_draw(), Ok(2));
        assert_eq!(tracker.consume_draw(), Ok(1));
        assert_eq!(tracker.consume_draw(), Ok(0));
        assert_eq!(tracker.remaining(), 0);
        assert_eq!(tracker.state(), QuotaState::Exhausted);
        assert_eq!(tracker.store().value(DRAWS_KEY), Some("3"));

        assert_eq!(tracker.consume_draw(), Err(QuotaError::Exhausted));
        assert_eq!(tracker.draws_used(), 3);
        assert_eq!(tracker.store().value(DRAWS_KEY), Some("3"));
    }

    #[test]
    fn refresh_on_a_new_day_resets_the_counter() {
        let store = MemoryStore::with_entries([(DRAWS_KEY, "3"), (DATE_KEY, "2026-10-16")]);
        let mut tracker = tracker_at(store, at(2026, 10, 16, 23, 0, 0));
        assert_eq!(tracker.remaining(), 0);

        tracker.clock().set(at(2026, 10, 17, 8, 0, 0));
        tracker.refresh();
        assert_eq!(tracker.draws_used(), 0);
        assert_eq!(tracker.remaining(), 3);
        assert_eq!(tracker.last_draw_date(), NaiveDate::from_ymd_opt(2026, 10, 17).expect("date"));
        assert_eq!(tracker.store().value(DATE_KEY), Some("2026-10-17"));
    }

    #[test]
    fn refresh_is_idempotent() {
        let store = MemoryStore::with_entries([(DRAWS_KEY, "1"), (DATE_KEY, "2026-10-17")]);
        let mut tracker = tracker_at(store, at(2026, 10, 17, 12, 0, 0));
        tracker.refresh();
        tracker.refresh();
        assert_eq!(tracker.draws_used(), 1);
        assert_eq!(tracker.reset_deadline(), at(2026, 10, 18, 0, 0, 0));
    }

    #[test]
    fn corrupt_values_fail_open() {
        let store = MemoryStore::with_entries([(DRAWS_KEY, "lots"), (DATE_KEY, "2026-10-17")]);
        let tracker = tracker_at(store, at(2026, 10, 17, 12, 0, 0));
        assert_eq!(tracker.remaining(), 3);

        let store = MemoryStore::with_entries([(DRAWS_KEY, "3"), (DATE_KEY, "yesterday")]);
        let tracker = tracker_at(store, at(2026, 10, 17, 12, 0, 0));
        assert_eq!(tracker.remaining(), 3);

        let store = MemoryStore::with_entries([(DRAWS_KEY, "40"), (DATE_KEY, "2026-10-17")]);
        let tracker = tracker_at(store, at(2026, 10, 17, 12, 0, 0));
        assert_eq!(tracker.draws_used(), 3);
        assert_eq!(tracker.remaining(), 0);
    }

    #[test]
    fn storage_failures_fail_open_without_panicking() {
        let mut tracker = QuotaTracker::new(
            BrokenStore,
            FixedClock::at(at(2026, 10, 17, 12, 0, 0)),
            &GachaConfig::default(),
        );
        assert_eq!(tracker.remaining(), 3);
        assert_eq!(tracker.consume_draw(), Ok(2));
    }

    #[test]
    fn refund_gives_back_one_draw() {
        let mut tracker = tracker_at(MemoryStore::default(), at(2026, 10, 17, 9, 0, 0));
        tracker.consume_draw().expect("draw");
        tracker.refund_draw();
        assert_eq!(tracker.remaining(), 3);
        assert_eq!(tracker.store().value(DRAWS_KEY), Some("0"));
        tracker.refund_draw();
        assert_eq!(tracker.draws_used(), 0);
    }

    #[test]
    fn consume_after_midnight_starts_the_new_day_first() {
        let store = MemoryStore::with_entries([(DRAWS_KEY, "3"), (DATE_KEY, "2026-10-17")]);
        let mut tracker = tracker_at(store, at(2026, 10, 17, 23, 59, 0));
        tracker.clock().advance(Duration::minutes(2));
        assert_eq!(tracker.consume_draw(), Ok(2));
        assert_eq!(tracker.store().value(DATE_KEY), Some("2026-10-18"));
    }

    #[test]
    fn deadline_is_next_midnight_and_after_now_while_exhausted() {
        let mut tracker = tracker_at(MemoryStore::default(), at(2026, 10, 17, 23, 59, 58));
        for _ in 0..3 {
            tracker.consume_draw().expect("draw");
        }
        assert_eq!(tracker.state(), QuotaState::Exhausted);
        assert!(tracker.reset_deadline() > tracker.clock().now());
        assert_eq!(tracker.reset_deadline(), at(2026, 10, 18, 0, 0, 0));
        assert_eq!(tracker.countdown_text(), "00:00:02");
    }

    #[test]
    fn countdown_ticks_once_per_interval_and_rolls_over() {
        let mut tracker = tracker_at(MemoryStore::default(), at(2026, 10, 17, 23, 59, 57));
        for _ in 0..3 {
            tracker.consume_draw().expect("draw");
        }
        tracker.start_countdown();
        assert_eq!(tracker.tick(), None);

        tracker.clock().advance(Duration::milliseconds(1000));
        assert_eq!(
            tracker.tick(),
            Some(CountdownEvent::Tick {
                remaining: "00:00:02".to_string()
            })
        );
        tracker.clock().advance(Duration::milliseconds(400));
        assert_eq!(tracker.tick(), None);

        tracker.clock().advance(Duration::milliseconds(600));
        assert_eq!(
            tracker.tick(),
            Some(CountdownEvent::Tick {
                remaining: "00:00:01".to_string()
            })
        );
        tracker.clock().advance(Duration::seconds(1));
        assert_eq!(
            tracker.tick(),
            Some(CountdownEvent::RolledOver { remaining: 3 })
        );
        assert!(!tracker.is_counting_down());
        assert_eq!(tracker.state(), QuotaState::Available);
        assert_eq!(tracker.reset_deadline(), at(2026, 10, 19, 0, 0, 0));
        tracker.clock().advance(Duration::seconds(5));
        assert_eq!(tracker.tick(), None);
    }

    #[test]
    fn starting_a_countdown_replaces_the_previous_one() {
        let mut tracker = tracker_at(MemoryStore::default(), at(2026, 10, 17, 10, 0, 0));
        let first = tracker.start_countdown();
        let second = tracker.start_countdown();
        assert_ne!(first, second);
        assert_eq!(tracker.countdown_handle(), Some(second));
        assert!(tracker.stop_countdown());
        assert!(!tracker.stop_countdown());
        assert_eq!(tracker.countdown_handle(), None);
    }
}
