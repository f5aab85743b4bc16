//! Recurrence rules for to-do tasks and their expansion into calendar days.
//!
//! A task carries a due date and, optionally, a [`RecurrenceRule`]. The due
//! date is the first occurrence; every later one comes from repeatedly
//! applying [`advance`]. [`occurrences_in_window`] materializes the
//! occurrences that land inside a [`DateWindow`], typically one calendar
//! month, with hard iteration caps so that no rule can make it run away.
//!
//! ```
//! use chrono::NaiveDate;
//! use task_recurrence::{DateWindow, DayOfWeek, Frequency, RecurrenceRule, occurrences_in_window};
//!
//! let rule = RecurrenceRule::builder(Frequency::Weekly)
//!     .interval(2)
//!     .days_of_week([DayOfWeek::MONDAY, DayOfWeek::FRIDAY])
//!     .build();
//! let due = NaiveDate::from_ymd_opt(2024, 6, 5).unwrap();
//! let june = DateWindow::month(2024, 6).unwrap();
//!
//! let days: Vec<u32> = occurrences_in_window(due, Some(&rule), &june)
//!     .iter()
//!     .map(chrono::Datelike::day)
//!     .collect();
//! assert_eq!(days, [5, 7, 17, 21]);
//! ```

mod advance;
mod calendar;
mod consts;
mod expand;
mod prelude;
mod rule;
mod types;
mod window;

#[cfg(test)]
mod test_utils;

pub use advance::advance;
pub use calendar::{CalendarEntry, Recurring, entries_by_day, marked_days, next_due};
pub use consts::*;
pub use expand::{ExpansionLimits, Occurrences, next_occurrence_on_or_after, occurrences_in_window};
pub use rule::{Frequency, RecurrenceRule, RecurrenceRuleBuilder, parse_days_of_month};
pub use types::{CalendarDay, DayOfMonth, DayOfWeek, Interval};
pub use window::{DateWindow, WindowError};

use crate::prelude::*;

/// Errors raised when building the validated value types from raw input.
/// The recurrence engine itself never fails; these only surface at the
/// edges where user input is turned into rules.
#[derive(Debug, Clone, PartialEq, Eq, Display)]
pub enum ParseError {
    #[display(fmt = "Invalid day of week: {} (must be 0-{})", "_0", MAX_DAY_OF_WEEK)]
    InvalidDayOfWeek(u8),
    #[display(
        fmt = "Invalid day of month: {} (must be {}-{})",
        "_0",
        MIN_DAY_OF_MONTH,
        MAX_DAY_OF_MONTH
    )]
    InvalidDayOfMonth(u8),
    #[display(fmt = "Unknown frequency: {_0}")]
    UnknownFrequency(String),
    #[display(fmt = "Invalid format: {_0}")]
    InvalidFormat(String),
    #[display(fmt = "Empty input")]
    EmptyInput,
}

impl std::error::Error for ParseError {}
