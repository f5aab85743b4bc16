//! The recurrence advancer: given one occurrence, compute the next.

use std::collections::BTreeSet;

use chrono::{Datelike, Days, Months, NaiveDate};

use crate::{
    DAYS_PER_WEEK, MONTH_SEARCH_LIMIT, MONTHS_PER_YEAR,
    rule::{Frequency, RecurrenceRule},
    types::{DayOfMonth, DayOfWeek, FIRST_DAY},
};

/// Returns the occurrence that follows `current` under `rule`.
///
/// The result is a calendar day strictly after `current` for every rule the
/// crate can represent. The only exception is arithmetic past the end of
/// chrono's date range, which saturates at [`NaiveDate::MAX`]; callers that
/// loop over `advance` must treat a non-increasing result as a stop signal.
///
/// | frequency | day set | next occurrence                                     |
/// |-----------|---------|-----------------------------------------------------|
/// | daily     | -       | `current + interval` days                           |
/// | weekly    | empty   | `current + 7 × interval` days                       |
/// | weekly    | weekdays| next selected weekday this week, else the first selected weekday `interval` weeks on |
/// | monthly   | empty   | `current + interval` months, clamped to month end   |
/// | monthly   | days    | next selected day this month, else the first valid selected day every `interval` months on; [`NaiveDate::MAX`] if none turns up within [`MONTH_SEARCH_LIMIT`] candidate months |
/// | yearly    | -       | `current + interval` years, clamped to month end    |
pub fn advance(current: NaiveDate, rule: &RecurrenceRule) -> NaiveDate {
    let interval = rule.interval().get();
    match rule.frequency() {
        Frequency::Daily => add_days(current, u64::from(interval)),
        Frequency::Weekly if rule.days_of_week().is_empty() => {
            add_days(current, u64::from(DAYS_PER_WEEK) * u64::from(interval))
        },
        Frequency::Weekly => next_selected_weekday(current, rule.days_of_week(), interval),
        Frequency::Monthly if rule.days_of_month().is_empty() => add_months(current, interval),
        Frequency::Monthly => next_selected_day_of_month(current, rule.days_of_month(), interval),
        Frequency::Yearly => add_months(current, interval.saturating_mul(MONTHS_PER_YEAR)),
    }
}

fn add_days(date: NaiveDate, days: u64) -> NaiveDate {
    date.checked_add_days(Days::new(days)).unwrap_or(NaiveDate::MAX)
}

/// Adds whole months, clamping the day to the end of a shorter target
/// month (Jan 31 + 1 month = Feb 28/29).
fn add_months(date: NaiveDate, months: u32) -> NaiveDate {
    date.checked_add_months(Months::new(months)).unwrap_or(NaiveDate::MAX)
}

fn next_selected_weekday(current: NaiveDate, days: &BTreeSet<DayOfWeek>, interval: u32) -> NaiveDate {
    let today = u64::from(DayOfWeek::of(current).get());

    let later_this_week = days.iter().map(|d| u64::from(d.get())).find(|&d| d > today);
    if let Some(day) = later_this_week {
        return add_days(current, day - today);
    }

    // Wrap to the first selected weekday of the week `interval` weeks on
    let first = days.first().map_or(today, |d| u64::from(d.get()));
    let week = u64::from(DAYS_PER_WEEK);
    let delta = (week - today) + first + (u64::from(interval) - 1) * week;
    add_days(current, delta)
}

fn next_selected_day_of_month(current: NaiveDate, days: &BTreeSet<DayOfMonth>, interval: u32) -> NaiveDate {
    let today = current.day();

    // Only the first later day matters: if it overflows this month, every
    // larger day does too.
    let later_this_month = days
        .iter()
        .find(|d| u32::from(d.get()) > today)
        .and_then(|d| d.in_month(current.year(), current.month()));
    if let Some(date) = later_this_month {
        return date;
    }

    let Some(month_start) = current.with_day(FIRST_DAY) else {
        return NaiveDate::MAX;
    };
    for step in 1..=MONTH_SEARCH_LIMIT {
        let Some(candidate) = step
            .checked_mul(interval)
            .and_then(|offset| month_start.checked_add_months(Months::new(offset)))
        else {
            break;
        };
        let found = days
            .iter()
            .find_map(|d| d.in_month(candidate.year(), candidate.month()));
        if let Some(date) = found {
            return date;
        }
    }

    // Never yield an unselected day
    log::warn!(
        "no selected day of month is valid within {MONTH_SEARCH_LIMIT} candidate months of {current} \
         (every {interval} months)"
    );
    NaiveDate::MAX
}
