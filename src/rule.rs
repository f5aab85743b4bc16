use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::de::{self, IgnoredAny, MapAccess, SeqAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::{
    DAY_LIST_SEPARATOR, ParseError, advance::advance, prelude::*,
    types::{CalendarDay, DayOfMonth, DayOfWeek, Interval},
};

/// The unit a recurrence counts in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Frequency {
    #[display(fmt = "DAILY")]
    #[serde(alias = "daily", alias = "Daily")]
    Daily,
    #[display(fmt = "WEEKLY")]
    #[serde(alias = "weekly", alias = "Weekly")]
    Weekly,
    #[display(fmt = "MONTHLY")]
    #[serde(alias = "monthly", alias = "Monthly")]
    Monthly,
    #[display(fmt = "YEARLY")]
    #[serde(alias = "yearly", alias = "Yearly")]
    Yearly,
}

impl Frequency {
    /// Singular English unit name ("day", "week", ...)
    pub const fn unit(self) -> &'static str {
        match self {
            Self::Daily => "day",
            Self::Weekly => "week",
            Self::Monthly => "month",
            Self::Yearly => "year",
        }
    }
}

impl FromStr for Frequency {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(ParseError::EmptyInput);
        }
        match trimmed.to_ascii_lowercase().as_str() {
            "daily" => Ok(Self::Daily),
            "weekly" => Ok(Self::Weekly),
            "monthly" => Ok(Self::Monthly),
            "yearly" => Ok(Self::Yearly),
            _ => Err(ParseError::UnknownFrequency(trimmed.to_owned())),
        }
    }
}

/// How a recurring task repeats: a frequency, an interval ("every N units")
/// and, for weekly and monthly rules, an optional set of selected days.
///
/// Rules are immutable values. Every way of producing one keeps the
/// invariant that only the day set matching the frequency can be non-empty:
/// weekdays for [`Frequency::Weekly`], days of month for
/// [`Frequency::Monthly`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "StoredRule", into = "StoredRule")]
pub struct RecurrenceRule {
    frequency:     Frequency,
    interval:      Interval,
    days_of_week:  BTreeSet<DayOfWeek>,
    days_of_month: BTreeSet<DayOfMonth>,
}

impl RecurrenceRule {
    /// A rule repeating every single unit of `frequency`, with no day sets
    pub const fn new(frequency: Frequency) -> Self {
        Self {
            frequency,
            interval: Interval::ONE,
            days_of_week: BTreeSet::new(),
            days_of_month: BTreeSet::new(),
        }
    }

    pub fn daily(interval: i64) -> Self {
        Self::builder(Frequency::Daily).interval(interval).build()
    }

    pub fn weekly(interval: i64) -> Self {
        Self::builder(Frequency::Weekly).interval(interval).build()
    }

    pub fn monthly(interval: i64) -> Self {
        Self::builder(Frequency::Monthly).interval(interval).build()
    }

    pub fn yearly(interval: i64) -> Self {
        Self::builder(Frequency::Yearly).interval(interval).build()
    }

    pub const fn builder(frequency: Frequency) -> RecurrenceRuleBuilder {
        RecurrenceRuleBuilder {
            rule: Self::new(frequency),
        }
    }

    pub const fn frequency(&self) -> Frequency {
        self.frequency
    }

    pub const fn interval(&self) -> Interval {
        self.interval
    }

    /// Selected weekdays, ascending. Always empty unless the rule is weekly.
    pub const fn days_of_week(&self) -> &BTreeSet<DayOfWeek> {
        &self.days_of_week
    }

    /// Selected days of month, ascending. Always empty unless the rule is monthly.
    pub const fn days_of_month(&self) -> &BTreeSet<DayOfMonth> {
        &self.days_of_month
    }

    /// Switches to another frequency. A real change starts over from a plain
    /// "every 1 unit" rule, dropping the interval and any selected days.
    #[must_use]
    pub fn with_frequency(&self, frequency: Frequency) -> Self {
        if self.frequency == frequency {
            return self.clone();
        }
        Self::new(frequency)
    }

    #[must_use]
    pub fn with_interval(&self, interval: i64) -> Self {
        Self {
            interval: Interval::new(interval),
            ..self.clone()
        }
    }

    /// Replaces the selected weekdays. Ignored unless the rule is weekly.
    #[must_use]
    pub fn with_days_of_week<I>(&self, days: I) -> Self
    where
        I: IntoIterator<Item = DayOfWeek>,
    {
        if self.frequency != Frequency::Weekly {
            return self.clone();
        }
        Self {
            days_of_week: days.into_iter().collect(),
            ..self.clone()
        }
    }

    /// Adds the weekday if absent, removes it if present. Ignored unless the
    /// rule is weekly.
    #[must_use]
    pub fn toggle_day_of_week(&self, day: DayOfWeek) -> Self {
        if self.frequency != Frequency::Weekly {
            return self.clone();
        }
        let mut days_of_week = self.days_of_week.clone();
        if !days_of_week.remove(&day) {
            days_of_week.insert(day);
        }
        Self {
            days_of_week,
            ..self.clone()
        }
    }

    /// Replaces the selected days of month. Ignored unless the rule is monthly.
    #[must_use]
    pub fn with_days_of_month<I>(&self, days: I) -> Self
    where
        I: IntoIterator<Item = DayOfMonth>,
    {
        if self.frequency != Frequency::Monthly {
            return self.clone();
        }
        Self {
            days_of_month: days.into_iter().collect(),
            ..self.clone()
        }
    }

    /// The occurrence following `current`. See [`advance`].
    pub fn next_after(&self, current: &impl CalendarDay) -> NaiveDate {
        advance(current.calendar_day(), self)
    }
}

/// Collects a rule piece by piece. Day sets that do not belong to the
/// rule's frequency are dropped by [`RecurrenceRuleBuilder::build`].
#[derive(Debug, Clone)]
pub struct RecurrenceRuleBuilder {
    rule: RecurrenceRule,
}

impl RecurrenceRuleBuilder {
    /// Sets the interval, coercing values below 1 to 1
    #[must_use]
    pub fn interval(mut self, interval: i64) -> Self {
        self.rule.interval = Interval::new(interval);
        self
    }

    #[must_use]
    pub fn day_of_week(mut self, day: DayOfWeek) -> Self {
        self.rule.days_of_week.insert(day);
        self
    }

    #[must_use]
    pub fn days_of_week<I>(mut self, days: I) -> Self
    where
        I: IntoIterator<Item = DayOfWeek>,
    {
        self.rule.days_of_week.extend(days);
        self
    }

    #[must_use]
    pub fn day_of_month(mut self, day: DayOfMonth) -> Self {
        self.rule.days_of_month.insert(day);
        self
    }

    #[must_use]
    pub fn days_of_month<I>(mut self, days: I) -> Self
    where
        I: IntoIterator<Item = DayOfMonth>,
    {
        self.rule.days_of_month.extend(days);
        self
    }

    pub fn build(mut self) -> RecurrenceRule {
        if self.rule.frequency != Frequency::Weekly {
            self.rule.days_of_week.clear();
        }
        if self.rule.frequency != Frequency::Monthly {
            self.rule.days_of_month.clear();
        }
        self.rule
    }
}

/// Parses a free-text list such as `"1, 15, 31"`. Each entry contributes
/// its leading digits (`"15th"` is 15, `"1.5"` is 1); entries without any,
/// or outside `1..=31`, are skipped rather than rejected.
pub fn parse_days_of_month(text: &str) -> BTreeSet<DayOfMonth> {
    text.split(DAY_LIST_SEPARATOR)
        .filter_map(leading_number)
        .filter_map(|value| DayOfMonth::new(value).ok())
        .collect()
}

fn leading_number(part: &str) -> Option<u8> {
    let trimmed = part.trim_start();
    let unsigned = trimmed.strip_prefix('+').unwrap_or(trimmed);
    let end = unsigned
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(unsigned.len());
    unsigned[..end].parse().ok()
}

impl fmt::Display for RecurrenceRule {
    /// Human-readable summary, e.g. `every 2 weeks on Monday, Friday`
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let unit = self.frequency.unit();
        match self.interval.get() {
            1 => write!(f, "every {unit}")?,
            n => write!(f, "every {n} {unit}s")?,
        }

        if !self.days_of_week.is_empty() {
            let names: Vec<&str> = self.days_of_week.iter().map(|d| d.name()).collect();
            write!(f, " on {}", names.join(", "))?;
        }
        if !self.days_of_month.is_empty() {
            let ordinals: Vec<String> = self.days_of_month.iter().map(|d| d.ordinal()).collect();
            write!(f, " on the {}", ordinals.join(", "))?;
        }
        Ok(())
    }
}

/// Storage shape, matching the task store's JSON:
/// `{"frequency":"WEEKLY","interval":2,"daysOfWeek":[1,5]}`
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredRule {
    frequency:     Frequency,
    #[serde(default)]
    interval:      Interval,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    days_of_week:  Option<Vec<StoredDay>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    days_of_month: Option<Vec<StoredDay>>,
}

/// One entry of a stored day list. Integral numbers and numeric strings
/// carry a value; anything else deserializes to `None` and is dropped.
struct StoredDay(Option<i64>);

impl Serialize for StoredDay {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.0.serialize(serializer)
    }
}

struct StoredDayVisitor;

impl<'de> Visitor<'de> for StoredDayVisitor {
    type Value = StoredDay;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a day number")
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<StoredDay, E> {
        Ok(StoredDay(Some(v)))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<StoredDay, E> {
        Ok(StoredDay(i64::try_from(v).ok()))
    }

    #[allow(clippy::float_cmp, clippy::cast_possible_truncation)]
    fn visit_f64<E: de::Error>(self, v: f64) -> Result<StoredDay, E> {
        let integral = v.is_finite() && v.trunc() == v;
        Ok(StoredDay(integral.then(|| v as i64)))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<StoredDay, E> {
        Ok(StoredDay(v.trim().parse().ok()))
    }

    fn visit_bool<E: de::Error>(self, _: bool) -> Result<StoredDay, E> {
        Ok(StoredDay(None))
    }

    fn visit_unit<E: de::Error>(self) -> Result<StoredDay, E> {
        Ok(StoredDay(None))
    }

    fn visit_none<E: de::Error>(self) -> Result<StoredDay, E> {
        Ok(StoredDay(None))
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<StoredDay, A::Error> {
        while seq.next_element::<IgnoredAny>()?.is_some() {}
        Ok(StoredDay(None))
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<StoredDay, A::Error> {
        while map.next_entry::<IgnoredAny, IgnoredAny>()?.is_some() {}
        Ok(StoredDay(None))
    }
}

impl<'de> Deserialize<'de> for StoredDay {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(StoredDayVisitor)
    }
}

fn valid_days<T>(raw: Option<Vec<StoredDay>>, make: fn(u8) -> Result<T, ParseError>) -> Vec<T> {
    raw.unwrap_or_default()
        .into_iter()
        .filter_map(|day| day.0)
        .filter_map(|value| u8::try_from(value).ok())
        .filter_map(|value| make(value).ok())
        .collect()
}

impl From<StoredRule> for RecurrenceRule {
    fn from(stored: StoredRule) -> Self {
        let mut builder = Self::builder(stored.frequency)
            .days_of_week(valid_days(stored.days_of_week, DayOfWeek::new))
            .days_of_month(valid_days(stored.days_of_month, DayOfMonth::new));
        builder.rule.interval = stored.interval;
        builder.build()
    }
}

fn stored_days<T: Copy + Into<u8>>(days: &BTreeSet<T>) -> Option<Vec<StoredDay>> {
    if days.is_empty() {
        return None;
    }
    Some(
        days.iter()
            .map(|&d| {
                let value: u8 = d.into();
                StoredDay(Some(i64::from(value)))
            })
            .collect(),
    )
}

impl From<RecurrenceRule> for StoredRule {
    fn from(rule: RecurrenceRule) -> Self {
        Self {
            frequency:     rule.frequency,
            interval:      rule.interval,
            days_of_week:  stored_days(&rule.days_of_week),
            days_of_month: stored_days(&rule.days_of_month),
        }
    }
}
