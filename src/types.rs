use crate::ParseError;
use crate::consts::{MAX_DAY_OF_MONTH, MAX_DAY_OF_WEEK, MIN_DAY_OF_MONTH};
use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Weekday};
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::num::{NonZeroU8, NonZeroU32};
use std::str::FromStr;

/// How many frequency units lie between occurrences ("every N days").
/// Uses `NonZeroU32` internally, so an interval is always at least 1.
///
/// Construction never fails: anything below 1 becomes 1. Deserialization is
/// equally forgiving and maps `null`, booleans and non-numeric strings to 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(into = "u32")]
pub struct Interval(NonZeroU32);

impl Interval {
    /// The default "every unit" interval
    pub const ONE: Self = Self(NonZeroU32::MIN);

    /// Creates an interval, coercing non-positive values to 1 and saturating
    /// values that do not fit in a `u32`.
    pub fn new(value: i64) -> Self {
        let clamped = u32::try_from(value.max(1)).unwrap_or(u32::MAX);
        NonZeroU32::new(clamped).map_or(Self::ONE, Self)
    }

    /// Returns the interval value as u32
    #[inline]
    pub const fn get(self) -> u32 {
        self.0.get()
    }

    #[allow(clippy::cast_possible_truncation)]
    fn from_f64(value: f64) -> Self {
        if value.is_nan() {
            return Self::ONE;
        }
        // `as` saturates at the i64 bounds
        Self::new(value.trunc() as i64)
    }
}

impl Default for Interval {
    fn default() -> Self {
        Self::ONE
    }
}

impl From<u32> for Interval {
    fn from(value: u32) -> Self {
        NonZeroU32::new(value).map_or(Self::ONE, Self)
    }
}

impl From<Interval> for u32 {
    fn from(interval: Interval) -> Self {
        interval.0.get()
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

struct IntervalVisitor;

impl Visitor<'_> for IntervalVisitor {
    type Value = Interval;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a recurrence interval")
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Interval, E> {
        Ok(Interval::new(v))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Interval, E> {
        Ok(Interval::new(i64::try_from(v).unwrap_or(i64::MAX)))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Interval, E> {
        Ok(Interval::from_f64(v))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Interval, E> {
        Ok(v.trim().parse::<i64>().map_or(Interval::ONE, Interval::new))
    }

    fn visit_bool<E: de::Error>(self, _: bool) -> Result<Interval, E> {
        Ok(Interval::ONE)
    }

    fn visit_unit<E: de::Error>(self) -> Result<Interval, E> {
        Ok(Interval::ONE)
    }

    fn visit_none<E: de::Error>(self) -> Result<Interval, E> {
        Ok(Interval::ONE)
    }
}

impl<'de> Deserialize<'de> for Interval {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(IntervalVisitor)
    }
}

/// A weekday number guaranteed to be in the range `0..=MAX_DAY_OF_WEEK`,
/// counting from Sunday = 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct DayOfWeek(u8);

const WEEKDAY_NAMES: [&str; 7] = [
    "Sunday",
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
];

impl DayOfWeek {
    pub const SUNDAY: Self = Self(0);
    pub const MONDAY: Self = Self(1);
    pub const TUESDAY: Self = Self(2);
    pub const WEDNESDAY: Self = Self(3);
    pub const THURSDAY: Self = Self(4);
    pub const FRIDAY: Self = Self(5);
    pub const SATURDAY: Self = Self(6);

    /// Creates a new `DayOfWeek`, validating that it's <= `MAX_DAY_OF_WEEK`
    ///
    /// # Errors
    /// Returns `ParseError::InvalidDayOfWeek` if the value is > `MAX_DAY_OF_WEEK`.
    pub fn new(value: u8) -> Result<Self, ParseError> {
        if value > MAX_DAY_OF_WEEK {
            return Err(ParseError::InvalidDayOfWeek(value));
        }
        Ok(Self(value))
    }

    /// Returns the weekday number (Sunday = 0)
    #[inline]
    pub const fn get(self) -> u8 {
        self.0
    }

    /// English name of the weekday
    pub const fn name(self) -> &'static str {
        WEEKDAY_NAMES[self.0 as usize]
    }

    /// Weekday of a calendar date
    pub fn of(date: NaiveDate) -> Self {
        use chrono::Datelike;
        Self::from(date.weekday())
    }
}

impl From<Weekday> for DayOfWeek {
    fn from(weekday: Weekday) -> Self {
        // num_days_from_sunday is always 0..=6
        #[allow(clippy::cast_possible_truncation)]
        Self(weekday.num_days_from_sunday() as u8)
    }
}

impl From<DayOfWeek> for Weekday {
    fn from(day: DayOfWeek) -> Self {
        match day.0 {
            0 => Self::Sun,
            1 => Self::Mon,
            2 => Self::Tue,
            3 => Self::Wed,
            4 => Self::Thu,
            5 => Self::Fri,
            _ => Self::Sat,
        }
    }
}

impl TryFrom<u8> for DayOfWeek {
    type Error = ParseError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<DayOfWeek> for u8 {
    fn from(day: DayOfWeek) -> Self {
        day.0
    }
}

impl FromStr for DayOfWeek {
    type Err = ParseError;

    /// Accepts a weekday number (`"1"`) or an English name or prefix of at
    /// least three letters (`"mon"`, `"Monday"`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(ParseError::EmptyInput);
        }
        if let Ok(value) = trimmed.parse::<u8>() {
            return Self::new(value);
        }

        let lower = trimmed.to_ascii_lowercase();
        if lower.len() >= 3 {
            let found = WEEKDAY_NAMES
                .iter()
                .position(|name| name.to_ascii_lowercase().starts_with(&lower));
            if let Some(index) = found {
                return u8::try_from(index)
                    .map(Self)
                    .map_err(|_| ParseError::InvalidFormat(trimmed.to_owned()));
            }
        }
        Err(ParseError::InvalidFormat(trimmed.to_owned()))
    }
}

impl fmt::Display for DayOfWeek {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A day-of-month value guaranteed to be in the range
/// `MIN_DAY_OF_MONTH..=MAX_DAY_OF_MONTH` (1..=31).
/// Uses `NonZeroU8` internally, so 0 is not a valid day.
///
/// Whether the day exists in a particular month is a separate question,
/// answered by [`DayOfMonth::is_valid_in`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct DayOfMonth(NonZeroU8);

impl DayOfMonth {
    /// Creates a new `DayOfMonth`, validating that it's in `1..=31`
    ///
    /// # Errors
    /// Returns `ParseError::InvalidDayOfMonth` if the value is 0 or > `MAX_DAY_OF_MONTH`.
    pub fn new(value: u8) -> Result<Self, ParseError> {
        let non_zero = NonZeroU8::new(value).ok_or(ParseError::InvalidDayOfMonth(value))?;
        if value > MAX_DAY_OF_MONTH {
            return Err(ParseError::InvalidDayOfMonth(value));
        }
        Ok(Self(non_zero))
    }

    /// Returns the day value as u8
    #[inline]
    pub const fn get(self) -> u8 {
        self.0.get()
    }

    /// Whether this day exists in the given month (e.g. the 31st does not
    /// exist in April, the 29th only exists in February of leap years).
    pub fn is_valid_in(self, year: i32, month: u32) -> bool {
        self.in_month(year, month).is_some()
    }

    /// The calendar date for this day in the given month, if it exists
    pub fn in_month(self, year: i32, month: u32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(year, month, u32::from(self.get()))
    }

    /// English ordinal form: `1st`, `2nd`, `3rd`, `11th`, `22nd`, ...
    pub fn ordinal(self) -> String {
        let day = self.get();
        let suffix = match (day % 10, day % 100) {
            (_, 11..=13) => "th",
            (1, _) => "st",
            (2, _) => "nd",
            (3, _) => "rd",
            _ => "th",
        };
        format!("{day}{suffix}")
    }
}

impl TryFrom<u8> for DayOfMonth {
    type Error = ParseError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<DayOfMonth> for u8 {
    fn from(day: DayOfMonth) -> Self {
        day.0.get()
    }
}

impl FromStr for DayOfMonth {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(ParseError::EmptyInput);
        }
        let value = trimmed
            .parse::<u8>()
            .map_err(|_| ParseError::InvalidFormat(trimmed.to_owned()))?;
        Self::new(value)
    }
}

impl fmt::Display for DayOfMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Anything that can be reduced to a local calendar day. Time-of-day is
/// dropped, which is how the engine normalizes inputs to midnight.
pub trait CalendarDay {
    fn calendar_day(&self) -> NaiveDate;
}

impl CalendarDay for NaiveDate {
    fn calendar_day(&self) -> NaiveDate {
        *self
    }
}

impl CalendarDay for NaiveDateTime {
    fn calendar_day(&self) -> NaiveDate {
        self.date()
    }
}

impl<Tz: TimeZone> CalendarDay for DateTime<Tz> {
    fn calendar_day(&self) -> NaiveDate {
        self.date_naive()
    }
}

/// Smallest valid day-of-month, used where a lower bound is needed
pub(crate) const FIRST_DAY: u32 = MIN_DAY_OF_MONTH as u32;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::date;

    #[test]
    fn test_interval_new_coerces_non_positive() {
        struct TestCase {
            input:    i64,
            expected: u32,
        }

        let cases = [
            TestCase { input: 1, expected: 1 },
            TestCase { input: 3, expected: 3 },
            TestCase { input: 0, expected: 1 },
            TestCase { input: -4, expected: 1 },
            TestCase {
                input:    i64::MIN,
                expected: 1,
            },
            TestCase {
                input:    i64::MAX,
                expected: u32::MAX,
            },
        ];

        for case in &cases {
            assert_eq!(
                Interval::new(case.input).get(),
                case.expected,
                "Interval::new({})",
                case.input
            );
        }
    }

    #[test]
    fn test_interval_default_is_one() {
        assert_eq!(Interval::default(), Interval::ONE);
        assert_eq!(Interval::ONE.get(), 1);
        assert_eq!(Interval::from(0_u32), Interval::ONE);
    }

    #[test]
    fn test_interval_serde_forgiving() {
        let cases = [
            ("2", 2),
            ("0", 1),
            ("-3", 1),
            ("2.9", 2),
            (r#""4""#, 4),
            (r#""abc""#, 1),
            ("null", 1),
            ("true", 1),
        ];
        for (json, expected) in cases {
            let parsed: Interval = serde_json::from_str(json).unwrap();
            assert_eq!(parsed.get(), expected, "deserializing {json}");
        }

        let json = serde_json::to_string(&Interval::new(5)).unwrap();
        assert_eq!(json, "5");
    }

    #[test]
    fn test_day_of_week_new() {
        for value in 0..=6 {
            assert!(DayOfWeek::new(value).is_ok(), "weekday {value} should be valid");
        }
        assert!(matches!(DayOfWeek::new(7), Err(ParseError::InvalidDayOfWeek(7))));
    }

    #[test]
    fn test_day_of_week_from_chrono() {
        // 2024-06-05 is a Wednesday
        assert_eq!(DayOfWeek::of(date(2024, 6, 5)), DayOfWeek::WEDNESDAY);
        assert_eq!(DayOfWeek::of(date(2024, 6, 9)), DayOfWeek::SUNDAY);
        assert_eq!(DayOfWeek::from(Weekday::Sat).get(), 6);
        assert_eq!(Weekday::from(DayOfWeek::MONDAY), Weekday::Mon);
    }

    #[test]
    fn test_day_of_week_from_str() {
        assert_eq!("1".parse::<DayOfWeek>().unwrap(), DayOfWeek::MONDAY);
        assert_eq!("fri".parse::<DayOfWeek>().unwrap(), DayOfWeek::FRIDAY);
        assert_eq!(" Sunday ".parse::<DayOfWeek>().unwrap(), DayOfWeek::SUNDAY);
        assert!(matches!("".parse::<DayOfWeek>(), Err(ParseError::EmptyInput)));
        assert!(matches!("9".parse::<DayOfWeek>(), Err(ParseError::InvalidDayOfWeek(9))));
        assert!("mo".parse::<DayOfWeek>().is_err());
        assert!("funday".parse::<DayOfWeek>().is_err());
    }

    #[test]
    fn test_day_of_week_serde() {
        let json = serde_json::to_string(&DayOfWeek::FRIDAY).unwrap();
        assert_eq!(json, "5");
        let parsed: DayOfWeek = serde_json::from_str("3").unwrap();
        assert_eq!(parsed, DayOfWeek::WEDNESDAY);
        assert!(serde_json::from_str::<DayOfWeek>("7").is_err());
    }

    #[test]
    fn test_day_of_month_new() {
        assert!(DayOfMonth::new(1).is_ok());
        assert!(DayOfMonth::new(31).is_ok());
        assert!(matches!(DayOfMonth::new(0), Err(ParseError::InvalidDayOfMonth(0))));
        assert!(matches!(DayOfMonth::new(32), Err(ParseError::InvalidDayOfMonth(32))));
    }

    #[test]
    fn test_day_of_month_is_valid_in() {
        let thirty_first = DayOfMonth::new(31).unwrap();
        assert!(thirty_first.is_valid_in(2024, 1));
        assert!(!thirty_first.is_valid_in(2024, 2));
        assert!(!thirty_first.is_valid_in(2024, 4));

        let twenty_ninth = DayOfMonth::new(29).unwrap();
        assert!(twenty_ninth.is_valid_in(2024, 2));
        assert!(!twenty_ninth.is_valid_in(2023, 2));
        assert!(!twenty_ninth.is_valid_in(2100, 2));
        assert!(twenty_ninth.is_valid_in(2000, 2));

        assert!(!thirty_first.is_valid_in(2024, 0));
        assert!(!thirty_first.is_valid_in(2024, 13));
        assert!(!DayOfMonth::new(1).unwrap().is_valid_in(2024, u32::MAX));

        assert_eq!(twenty_ninth.in_month(2024, 2), Some(date(2024, 2, 29)));
        assert_eq!(twenty_ninth.in_month(2023, 2), None);
    }

    #[test]
    fn test_day_of_month_ordinal() {
        let cases = [
            (1, "1st"),
            (2, "2nd"),
            (3, "3rd"),
            (4, "4th"),
            (11, "11th"),
            (12, "12th"),
            (13, "13th"),
            (21, "21st"),
            (22, "22nd"),
            (23, "23rd"),
            (31, "31st"),
        ];
        for (day, expected) in cases {
            assert_eq!(DayOfMonth::new(day).unwrap().ordinal(), expected);
        }
    }

    #[test]
    fn test_day_of_month_from_str_and_serde() {
        assert_eq!(" 15 ".parse::<DayOfMonth>().unwrap().get(), 15);
        assert!(matches!("x".parse::<DayOfMonth>(), Err(ParseError::InvalidFormat(_))));
        assert!(matches!("40".parse::<DayOfMonth>(), Err(ParseError::InvalidDayOfMonth(40))));

        let json = serde_json::to_string(&DayOfMonth::new(15).unwrap()).unwrap();
        assert_eq!(json, "15");
        assert!(serde_json::from_str::<DayOfMonth>("0").is_err());
    }

    #[test]
    fn test_calendar_day_drops_time() {
        let datetime = date(2024, 6, 5).and_hms_opt(23, 59, 59).unwrap();
        assert_eq!(datetime.calendar_day(), date(2024, 6, 5));
        assert_eq!(datetime.and_utc().calendar_day(), date(2024, 6, 5));
        assert_eq!(date(2024, 6, 5).calendar_day(), date(2024, 6, 5));
    }
}
