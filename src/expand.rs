//! Window expansion: the occurrences of a task that fall inside a date window.

use std::iter::FusedIterator;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{
    COLLECT_LIMIT, FAST_FORWARD_LIMIT,
    advance::advance,
    rule::RecurrenceRule,
    types::CalendarDay,
    window::DateWindow,
};

/// Iteration caps applied while expanding a rule. They bound the work done
/// for any rule, however old its due date or however dense its cadence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ExpansionLimits {
    /// Advance steps allowed while skipping occurrences before the window
    pub fast_forward: usize,
    /// Steps allowed while collecting occurrences inside the window; also
    /// the most occurrences a single window can yield
    pub collect:      usize,
}

impl Default for ExpansionLimits {
    fn default() -> Self {
        Self {
            fast_forward: FAST_FORWARD_LIMIT,
            collect:      COLLECT_LIMIT,
        }
    }
}

impl ExpansionLimits {
    /// Occurrences of a task inside `window`, expanded under these limits
    pub fn occurrences<'a>(
        &self,
        due: impl CalendarDay,
        rule: Option<&'a RecurrenceRule>,
        window: &DateWindow,
    ) -> Occurrences<'a> {
        Occurrences::with_limits(due, rule, *window, *self)
    }

    /// First occurrence on or after `day`, expanded under these limits.
    /// See [`next_occurrence_on_or_after`].
    pub fn next_on_or_after(
        &self,
        due: impl CalendarDay,
        rule: Option<&RecurrenceRule>,
        day: impl CalendarDay,
    ) -> Option<NaiveDate> {
        let (due, day) = (due.calendar_day(), day.calendar_day());
        match rule {
            None => (due >= day).then_some(due),
            Some(rule) => fast_forward(due, rule, day, self.fast_forward).filter(|found| *found >= day),
        }
    }
}

/// Skips occurrences before `start`. Returns `None` when the rule stops
/// advancing; otherwise the first occurrence at or after `start`, or the
/// last one reached when the step limit ran out first.
fn fast_forward(due: NaiveDate, rule: &RecurrenceRule, start: NaiveDate, limit: usize) -> Option<NaiveDate> {
    let mut occurrence = due;
    for _ in 0..limit {
        if occurrence >= start {
            return Some(occurrence);
        }
        let next = advance(occurrence, rule);
        if next <= occurrence {
            log::debug!("rule '{rule}' stopped advancing at {occurrence} while skipping to {start}");
            return None;
        }
        occurrence = next;
    }
    if occurrence < start {
        log::debug!(
            "rule '{rule}' still before {start} after {limit} steps from {due}, stopped at {occurrence}"
        );
    }
    Some(occurrence)
}

/// The occurrences of one task inside a window, in ascending order.
///
/// Construction performs the fast-forward phase; iteration performs the
/// collection phase lazily. The sequence is finite, strictly ascending and
/// free of duplicates. Building a new `Occurrences` from the same inputs
/// always yields the same dates.
#[derive(Debug, Clone)]
pub struct Occurrences<'a> {
    rule:      Option<&'a RecurrenceRule>,
    window:    DateWindow,
    cursor:    Option<NaiveDate>,
    remaining: usize,
}

impl<'a> Occurrences<'a> {
    /// Expands with the default [`ExpansionLimits`]
    pub fn new(due: impl CalendarDay, rule: Option<&'a RecurrenceRule>, window: DateWindow) -> Self {
        Self::with_limits(due, rule, window, ExpansionLimits::default())
    }

    pub fn with_limits(
        due: impl CalendarDay,
        rule: Option<&'a RecurrenceRule>,
        window: DateWindow,
        limits: ExpansionLimits,
    ) -> Self {
        let due = due.calendar_day();
        let (cursor, remaining) = match rule {
            // A one-off task is its own single occurrence
            None => (Some(due), 1),
            Some(rule) => (
                fast_forward(due, rule, window.start(), limits.fast_forward),
                limits.collect,
            ),
        };
        Self {
            rule,
            window,
            cursor,
            remaining,
        }
    }

    pub const fn window(&self) -> &DateWindow {
        &self.window
    }
}

impl Iterator for Occurrences<'_> {
    type Item = NaiveDate;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let current = self.cursor?;
            if current > self.window.end() {
                self.cursor = None;
                return None;
            }
            if self.remaining == 0 {
                if let Some(rule) = self.rule {
                    log::debug!("rule '{rule}' hit the collection limit at {current} in {}", self.window);
                }
                self.cursor = None;
                return None;
            }
            self.remaining -= 1;

            self.cursor = self.rule.and_then(|rule| {
                let next = advance(current, rule);
                if next > current {
                    Some(next)
                } else {
                    log::debug!("rule '{rule}' stopped advancing at {current}");
                    None
                }
            });

            if current >= self.window.start() {
                return Some(current);
            }
        }
    }
}

impl FusedIterator for Occurrences<'_> {}

/// All occurrences of a task inside `window`, ascending.
///
/// `due` is the first occurrence. Without a rule the task occurs once, on
/// its due date. With a rule, occurrences before the window are skipped (at
/// most [`FAST_FORWARD_LIMIT`] steps) and those inside it are collected (at
/// most [`COLLECT_LIMIT`] steps). A due date so far before the window that
/// skipping runs out of steps yields fewer occurrences, possibly none.
pub fn occurrences_in_window(
    due: impl CalendarDay,
    rule: Option<&RecurrenceRule>,
    window: &DateWindow,
) -> Vec<NaiveDate> {
    Occurrences::new(due, rule, *window).collect()
}

/// The first occurrence on or after `day`, for "next occurrence" badges.
///
/// Returns `None` for a one-off task due before `day`, and for a recurring
/// task whose occurrences could not be followed up to `day` within
/// [`FAST_FORWARD_LIMIT`] steps.
pub fn next_occurrence_on_or_after(
    due: impl CalendarDay,
    rule: Option<&RecurrenceRule>,
    day: impl CalendarDay,
) -> Option<NaiveDate> {
    ExpansionLimits::default().next_on_or_after(due, rule, day)
}
