//! Shorthand constructors for tests.

use crate::{DateWindow, DayOfMonth, DayOfWeek, Frequency, RecurrenceRule};
use chrono::NaiveDate;

pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("test date should be valid")
}

pub fn window(start: NaiveDate, end: NaiveDate) -> DateWindow {
    DateWindow::new(start, end).expect("test window should be ordered")
}

pub fn weekly_on(interval: i64, days: &[u8]) -> RecurrenceRule {
    RecurrenceRule::builder(Frequency::Weekly)
        .interval(interval)
        .days_of_week(
            days.iter()
                .map(|&d| DayOfWeek::new(d).expect("test weekday should be valid")),
        )
        .build()
}

pub fn monthly_on(interval: i64, days: &[u8]) -> RecurrenceRule {
    RecurrenceRule::builder(Frequency::Monthly)
        .interval(interval)
        .days_of_month(
            days.iter()
                .map(|&d| DayOfMonth::new(d).expect("test day of month should be valid")),
        )
        .build()
}
