//! Calendar plumbing for callers that hold whole tasks rather than bare
//! due dates and rules.

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;

use crate::{advance::advance, expand::Occurrences, rule::RecurrenceRule, window::DateWindow};

/// Something with an optional due date and an optional recurrence rule,
/// typically a to-do task.
pub trait Recurring {
    fn due_date(&self) -> Option<NaiveDate>;
    fn recurrence(&self) -> Option<&RecurrenceRule>;
}

/// One occurrence of an item, as placed on a calendar day. The item is
/// borrowed as-is; `occurrence` replaces its due date for display.
#[derive(Debug)]
pub struct CalendarEntry<'a, T> {
    pub occurrence: NaiveDate,
    pub item:       &'a T,
}

impl<T> Clone for CalendarEntry<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for CalendarEntry<'_, T> {}

impl<T: Recurring> CalendarEntry<'_, T> {
    /// Whether this entry is the item's stored due date rather than a
    /// projected repetition
    pub fn is_due_date(&self) -> bool {
        self.item.due_date() == Some(self.occurrence)
    }
}

fn occurrences_of<T: Recurring>(item: &T, window: &DateWindow) -> impl Iterator<Item = NaiveDate> {
    item.due_date()
        .map(|due| Occurrences::new(due, item.recurrence(), *window))
        .into_iter()
        .flatten()
}

/// Groups every occurrence of `items` inside `window` by day. Items without a
/// due date are left out. Within a day, entries keep the order of `items`.
pub fn entries_by_day<'a, T, I>(items: I, window: &DateWindow) -> BTreeMap<NaiveDate, Vec<CalendarEntry<'a, T>>>
where
    T: Recurring + 'a,
    I: IntoIterator<Item = &'a T>,
{
    let mut by_day: BTreeMap<NaiveDate, Vec<CalendarEntry<'a, T>>> = BTreeMap::new();
    for item in items {
        for occurrence in occurrences_of(item, window) {
            by_day
                .entry(occurrence)
                .or_default()
                .push(CalendarEntry { occurrence, item });
        }
    }
    by_day
}

/// Days inside `window` on which at least one of `items` occurs
pub fn marked_days<'a, T, I>(items: I, window: &DateWindow) -> BTreeSet<NaiveDate>
where
    T: Recurring + 'a,
    I: IntoIterator<Item = &'a T>,
{
    items
        .into_iter()
        .flat_map(|item| occurrences_of(item, window))
        .collect()
}

/// Due date for the next instance of a recurring item, as spawned when the
/// current one is completed. `None` when the item does not recur or has no
/// due date.
pub fn next_due<T: Recurring>(item: &T) -> Option<NaiveDate> {
    let due = item.due_date()?;
    let rule = item.recurrence()?;
    Some(advance(due, rule))
}
