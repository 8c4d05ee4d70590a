use chrono::{Datelike, Duration, NaiveDate, Weekday};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

pub mod catalog;
pub mod datasets;
pub mod fixtures;
pub mod generator;

/// Every stage of a dataset draws from one stream built here.
pub fn seeded_rng(seed: u64) -> ChaCha8Rng {
    ChaCha8Rng::seed_from_u64(seed)
}

pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

pub(crate) fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// `days` consecutive dates ending at `today`, oldest first.
pub fn trailing_dates(today: NaiveDate, days: u32) -> Vec<NaiveDate> {
    (0..i64::from(days))
        .rev()
        .map(|back| today - Duration::days(back))
        .collect()
}

pub(crate) fn month_start(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

pub(crate) fn days_in_month(date: NaiveDate) -> u32 {
    let next_month = if date.month() == 12 {
        NaiveDate::from_ymd_opt(date.year() + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(date.year(), date.month() + 1, 1)
    };
    next_month
        .and_then(|first| first.pred_opt())
        .map(|last| last.day())
        .unwrap_or(28)
}

pub(crate) fn month_end(date: NaiveDate) -> NaiveDate {
    date.with_day(days_in_month(date)).unwrap_or(date)
}

pub(crate) fn months_between(start: NaiveDate, date: NaiveDate) -> i32 {
    (date.year() - start.year()) * 12 + date.month() as i32 - start.month() as i32
}

/// First and last day of the calendar quarter holding `date`.
pub(crate) fn quarter_bounds(date: NaiveDate) -> (NaiveDate, NaiveDate) {
    let first_month = ((date.month() - 1) / 3) * 3 + 1;
    let start = NaiveDate::from_ymd_opt(date.year(), first_month, 1).unwrap_or(date);
    let last_month_day = NaiveDate::from_ymd_opt(date.year(), first_month + 2, 1)
        .map(month_end)
        .unwrap_or(date);
    (start, last_month_day)
}
