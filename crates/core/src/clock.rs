use chrono::{Duration, Local, NaiveDate, NaiveDateTime};
use std::cell::Cell;

pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Local wall-clock time. Dates and midnights are all computed in local time.
pub trait Clock {
    fn now(&self) -> NaiveDateTime;

    fn today(&self) -> NaiveDate {
        self.now().date()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

#[derive(Debug, Clone)]
pub struct FixedClock {
    now: Cell<NaiveDateTime>,
}

impl FixedClock {
    pub fn at(now: NaiveDateTime) -> Self {
        Self {
            now: Cell::new(now),
        }
    }

    pub fn set(&self, now: NaiveDateTime) {
        self.now.set(now);
    }

    pub fn advance(&self, by: Duration) {
        self.now.set(self.now.get() + by);
    }
}

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        self.now.get()
    }
}

pub fn next_midnight(date: NaiveDate) -> NaiveDateTime {
    date.succ_opt()
        .and_then(|next| next.and_hms_opt(0, 0, 0))
        .unwrap_or(NaiveDateTime::MAX)
}

pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT).ok()
}

/// `HH:MM:SS`, hours not wrapped. Negative spans render as zero.
pub fn format_countdown(left: Duration) -> String {
    let total = left.num_seconds().max(0);
    format!(
        "{:02}:{:02}:{:02}",
        total / 3600,
        (total % 3600) / 60,
        total % 60
    )
}
