use std::{fmt, str::FromStr};

use chrono::{Datelike, Months, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::{
    MAX_MONTH, ParseError, WINDOW_SEPARATOR,
    types::{CalendarDay, DayOfWeek, FIRST_DAY},
};

/// An inclusive range of calendar days, such as the month shown by a
/// calendar view. The start day must be on or before the end day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DateWindow {
    start: NaiveDate,
    end:   NaiveDate,
}

/// Error type for date window operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WindowError {
    /// Start date is after end date.
    #[error("Invalid date window: start ({start}) is after end ({end})")]
    InvalidRange { start: NaiveDate, end: NaiveDate },

    /// Year/month pair that does not name a calendar month.
    #[error("Invalid month: {year}-{month:02}")]
    InvalidMonth { year: i32, month: u32 },

    /// Error parsing a date component.
    #[error(transparent)]
    ParseError(#[from] ParseError),

    /// A side of the window is not an ISO 8601 date.
    #[error(transparent)]
    InvalidDate(#[from] chrono::ParseError),

    /// Invalid window format.
    #[error("Invalid window format: {0}")]
    InvalidFormat(String),
}

impl DateWindow {
    /// Creates a new window with validation.
    ///
    /// # Errors
    /// Returns `WindowError::InvalidRange` if start > end.
    pub fn new(start: impl CalendarDay, end: impl CalendarDay) -> Result<Self, WindowError> {
        let (start, end) = (start.calendar_day(), end.calendar_day());
        if start > end {
            return Err(WindowError::InvalidRange { start, end });
        }
        Ok(Self { start, end })
    }

    /// A window covering exactly one day
    pub const fn single_day(day: NaiveDate) -> Self {
        Self { start: day, end: day }
    }

    /// The window from the first to the last day of a calendar month
    ///
    /// # Errors
    /// Returns `WindowError::InvalidMonth` if `month` is not 1-12 or the
    /// year is outside chrono's supported range.
    pub fn month(year: i32, month: u32) -> Result<Self, WindowError> {
        let invalid = || WindowError::InvalidMonth { year, month };
        if !(1..=MAX_MONTH).contains(&month) {
            return Err(invalid());
        }
        let start = NaiveDate::from_ymd_opt(year, month, FIRST_DAY).ok_or_else(invalid)?;
        // Only the last representable month has no successor
        let end = start
            .checked_add_months(Months::new(1))
            .and_then(|next| next.pred_opt())
            .unwrap_or(NaiveDate::MAX);
        Ok(Self { start, end })
    }

    /// The calendar month containing `day`
    pub fn month_of(day: impl CalendarDay) -> Result<Self, WindowError> {
        let day = day.calendar_day();
        Self::month(day.year(), day.month())
    }

    /// Returns the first day of the window
    pub const fn start(&self) -> NaiveDate {
        self.start
    }

    /// Returns the last day of the window (inclusive)
    pub const fn end(&self) -> NaiveDate {
        self.end
    }

    /// Checks if the window contains a given day
    pub fn contains(&self, day: impl CalendarDay) -> bool {
        let day = day.calendar_day();
        self.start <= day && day <= self.end
    }

    /// Checks if this window shares at least one day with another
    pub fn overlaps(&self, other: &Self) -> bool {
        self.start <= other.end && other.start <= self.end
    }

    /// Number of days in the window, counting both ends
    pub fn len_days(&self) -> u64 {
        let span = self.end.signed_duration_since(self.start).num_days();
        u64::try_from(span).unwrap_or(0) + 1
    }

    /// Every day of the window in order
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> {
        let end = self.end;
        self.start.iter_days().take_while(move |day| *day <= end)
    }

    /// Sunday-first calendar layout: one `None` per blank cell before the
    /// window's first day, followed by every day of the window.
    pub fn month_grid(&self) -> Vec<Option<NaiveDate>> {
        let leading = usize::from(DayOfWeek::of(self.start).get());
        std::iter::repeat_n(None, leading)
            .chain(self.days().map(Some))
            .collect()
    }
}

impl fmt::Display for DateWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{WINDOW_SEPARATOR}{}", self.start, self.end)
    }
}

impl FromStr for DateWindow {
    type Err = WindowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(ParseError::EmptyInput.into());
        }

        let separator_count = trimmed.matches(WINDOW_SEPARATOR).count();
        match separator_count {
            0 => Err(WindowError::InvalidFormat(format!(
                "No window separator found (expected '{WINDOW_SEPARATOR}'): {s}"
            ))),
            1 => {
                let (start_str, end_str) = trimmed.split_once(WINDOW_SEPARATOR).ok_or_else(|| {
                    WindowError::InvalidFormat(format!(
                        "Separator '{WINDOW_SEPARATOR}' not found despite count == 1"
                    ))
                })?;
                let start = start_str.trim().parse::<NaiveDate>()?;
                let end = end_str.trim().parse::<NaiveDate>()?;

                Self::new(start, end)
            },
            _ => Err(WindowError::InvalidFormat(format!(
                "Too many '{WINDOW_SEPARATOR}' separators: expected 1, found {separator_count}"
            ))),
        }
    }
}

impl Serialize for DateWindow {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for DateWindow {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{date, window};

    #[test]
    fn test_new_window_cases() {
        struct TestCase {
            start:          NaiveDate,
            end:            NaiveDate,
            should_succeed: bool,
            description:    &'static str,
        }

        let cases = [
            TestCase {
                start:          date(2024, 6, 1),
                end:            date(2024, 6, 30),
                should_succeed: true,
                description:    "valid window (start < end)",
            },
            TestCase {
                start:          date(2024, 6, 30),
                end:            date(2024, 6, 1),
                should_succeed: false,
                description:    "invalid window (start > end)",
            },
            TestCase {
                start:          date(2024, 6, 5),
                end:            date(2024, 6, 5),
                should_succeed: true,
                description:    "single day (start == end)",
            },
        ];

        for case in &cases {
            let result = DateWindow::new(case.start, case.end);
            assert_eq!(result.is_ok(), case.should_succeed, "{}", case.description);
        }
    }

    #[test]
    fn test_new_drops_time_of_day() {
        let start = date(2024, 6, 1).and_hms_opt(18, 0, 0).expect("valid time");
        let end = date(2024, 6, 1).and_hms_opt(9, 0, 0).expect("valid time");
        let w = DateWindow::new(start, end).expect("same calendar day should be accepted");
        assert_eq!(w, DateWindow::single_day(date(2024, 6, 1)));
    }

    #[test]
    fn test_month_windows() {
        let feb = DateWindow::month(2024, 2).expect("February 2024 exists");
        assert_eq!(feb.start(), date(2024, 2, 1));
        assert_eq!(feb.end(), date(2024, 2, 29));
        assert_eq!(feb.len_days(), 29);

        let feb_common = DateWindow::month(2023, 2).expect("February 2023 exists");
        assert_eq!(feb_common.end(), date(2023, 2, 28));

        let feb_century = DateWindow::month(2100, 2).expect("February 2100 exists");
        assert_eq!(feb_century.end(), date(2100, 2, 28));
        let feb_400 = DateWindow::month(2000, 2).expect("February 2000 exists");
        assert_eq!(feb_400.end(), date(2000, 2, 29));

        let ends: Vec<u32> = (1..=12)
            .map(|month| DateWindow::month(2023, month).expect("month exists").end().day())
            .collect();
        assert_eq!(ends, [31, 28, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31]);

        let last = DateWindow::month(NaiveDate::MAX.year(), 12).expect("last month exists");
        assert_eq!(last.end(), NaiveDate::MAX);

        assert_eq!(
            DateWindow::month_of(date(2024, 12, 25)).expect("December exists"),
            window(date(2024, 12, 1), date(2024, 12, 31))
        );

        assert!(matches!(
            DateWindow::month(2024, 13),
            Err(WindowError::InvalidMonth { year: 2024, month: 13 })
        ));
        assert!(DateWindow::month(2024, 0).is_err());
    }

    #[test]
    fn test_contains_is_inclusive() {
        let june = DateWindow::month(2024, 6).expect("June exists");
        assert!(june.contains(date(2024, 6, 1)));
        assert!(june.contains(date(2024, 6, 30)));
        assert!(june.contains(date(2024, 6, 30).and_hms_opt(23, 59, 59).expect("valid time")));
        assert!(!june.contains(date(2024, 5, 31)));
        assert!(!june.contains(date(2024, 7, 1)));
    }

    #[test]
    fn test_overlaps() {
        let june = DateWindow::month(2024, 6).expect("June exists");
        let july = DateWindow::month(2024, 7).expect("July exists");
        let straddle = window(date(2024, 6, 30), date(2024, 7, 2));

        assert!(!june.overlaps(&july));
        assert!(june.overlaps(&straddle));
        assert!(straddle.overlaps(&july));
    }

    #[test]
    fn test_days_iterates_inclusively() {
        let w = window(date(2024, 2, 27), date(2024, 3, 1));
        let days: Vec<NaiveDate> = w.days().collect();
        assert_eq!(
            days,
            [date(2024, 2, 27), date(2024, 2, 28), date(2024, 2, 29), date(2024, 3, 1)]
        );
    }

    #[test]
    fn test_month_grid_leading_blanks() {
        // June 1st 2024 is a Saturday: six blank cells before it
        let grid = DateWindow::month(2024, 6).expect("June exists").month_grid();
        assert_eq!(grid.len(), 6 + 30);
        assert!(grid[..6].iter().all(Option::is_none));
        assert_eq!(grid[6], Some(date(2024, 6, 1)));
        assert_eq!(grid.last(), Some(&Some(date(2024, 6, 30))));

        // September 1st 2024 is a Sunday: no blanks
        let grid = DateWindow::month(2024, 9).expect("September exists").month_grid();
        assert_eq!(grid[0], Some(date(2024, 9, 1)));
    }

    #[test]
    fn test_display_and_from_str() {
        let w = window(date(2024, 6, 1), date(2024, 6, 30));
        assert_eq!(w.to_string(), "2024-06-01/2024-06-30");

        let parsed = " 2024-06-01 / 2024-06-30 "
            .parse::<DateWindow>()
            .expect("failed to parse window");
        assert_eq!(parsed, w);
    }

    #[test]
    fn test_from_str_errors() {
        let err = "2024-06-01".parse::<DateWindow>().expect_err("missing separator");
        assert!(err.to_string().contains("No window separator found"));

        let err = "2024-06-01/2024-06-02/2024-06-03"
            .parse::<DateWindow>()
            .expect_err("too many separators");
        assert!(err.to_string().contains("expected 1, found 2"));

        assert!(matches!(
            "2024-06-30/2024-06-01".parse::<DateWindow>(),
            Err(WindowError::InvalidRange { .. })
        ));
        assert!(matches!(
            "2024-02-30/2024-03-01".parse::<DateWindow>(),
            Err(WindowError::InvalidDate(_))
        ));
        assert!(matches!(
            "".parse::<DateWindow>(),
            Err(WindowError::ParseError(ParseError::EmptyInput))
        ));
    }

    #[test]
    fn test_serde_string_format() {
        let w = window(date(2024, 6, 1), date(2024, 6, 30));
        let json = serde_json::to_string(&w).expect("failed to serialize window");
        assert_eq!(json, r#""2024-06-01/2024-06-30""#);

        let parsed: DateWindow = serde_json::from_str(&json).expect("failed to deserialize window");
        assert_eq!(parsed, w);

        assert!(serde_json::from_str::<DateWindow>(r#""2024-06-30/2024-06-01""#).is_err());
    }
}
