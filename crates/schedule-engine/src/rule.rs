//! Recurrence rules and date ranges, validated at construction.
//!
//! [`RecurrenceRuleInput`] is the wire shape accepted from the service layer.
//! [`RecurrenceRule`] is the immutable, validated form the expander consumes;
//! it can only be obtained through `TryFrom<RecurrenceRuleInput>`, so an
//! expander never sees an out-of-range selector.

use std::ops::RangeInclusive;

use chrono::{NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

use crate::calendar;
use crate::error::{Result, ScheduleError};

/// Recurrence cycle granularity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecurrenceType {
    Weekly,
    Monthly,
    Yearly,
}

/// Unvalidated recurrence rule as it arrives over the wire.
///
/// ```json
/// {"type": "weekly", "dayOfWeek": [1, 2], "separationCount": 2}
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecurrenceRuleInput {
    #[serde(rename = "type")]
    pub kind: RecurrenceType,
    #[serde(default)]
    pub day_of_week: Vec<i64>,
    /// Kept as a raw JSON number so fractional values are reported as a rule
    /// error instead of a deserialization failure.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub separation_count: Option<serde_json::Number>,
    #[serde(default)]
    pub week_of_month: Vec<i64>,
    #[serde(default)]
    pub day_of_month: Vec<i64>,
    #[serde(default)]
    pub month_of_year: Vec<i64>,
}

impl RecurrenceRuleInput {
    fn empty(kind: RecurrenceType) -> Self {
        Self {
            kind,
            day_of_week: Vec::new(),
            separation_count: None,
            week_of_month: Vec::new(),
            day_of_month: Vec::new(),
            month_of_year: Vec::new(),
        }
    }

    pub fn weekly(day_of_week: &[i64]) -> Self {
        Self {
            day_of_week: day_of_week.to_vec(),
            ..Self::empty(RecurrenceType::Weekly)
        }
    }

    pub fn monthly_by_day(day_of_month: &[i64]) -> Self {
        Self {
            day_of_month: day_of_month.to_vec(),
            ..Self::empty(RecurrenceType::Monthly)
        }
    }

    pub fn monthly_by_week(week_of_month: &[i64], day_of_week: &[i64]) -> Self {
        Self {
            week_of_month: week_of_month.to_vec(),
            day_of_week: day_of_week.to_vec(),
            ..Self::empty(RecurrenceType::Monthly)
        }
    }

    pub fn yearly(month_of_year: &[i64]) -> Self {
        Self {
            month_of_year: month_of_year.to_vec(),
            ..Self::empty(RecurrenceType::Yearly)
        }
    }

    pub fn with_separation(mut self, count: i64) -> Self {
        self.separation_count = Some(count.into());
        self
    }

    pub fn with_day_of_month(mut self, day_of_month: &[i64]) -> Self {
        self.day_of_month = day_of_month.to_vec();
        self
    }

    pub fn with_week_of_month(mut self, week_of_month: &[i64], day_of_week: &[i64]) -> Self {
        self.week_of_month = week_of_month.to_vec();
        self.day_of_week = day_of_week.to_vec();
        self
    }
}

/// A validated recurrence rule.
///
/// Selector sets are de-duplicated and sorted. Week-days are stored as
/// [`chrono::Weekday`]; the Monday = 1 numbering only exists at the wire
/// boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RecurrenceRuleInput", into = "RecurrenceRuleInput")]
pub struct RecurrenceRule {
    kind: RecurrenceType,
    days_of_week: Vec<Weekday>,
    separation_count: u32,
    weeks_of_month: Vec<u32>,
    days_of_month: Vec<u32>,
    months_of_year: Vec<u32>,
}

impl RecurrenceRule {
    pub fn kind(&self) -> RecurrenceType {
        self.kind
    }

    pub fn days_of_week(&self) -> &[Weekday] {
        &self.days_of_week
    }

    pub fn separation_count(&self) -> u32 {
        self.separation_count
    }

    pub fn weeks_of_month(&self) -> &[u32] {
        &self.weeks_of_month
    }

    pub fn days_of_month(&self) -> &[u32] {
        &self.days_of_month
    }

    pub fn months_of_year(&self) -> &[u32] {
        &self.months_of_year
    }

    pub fn matches_weekday(&self, weekday: Weekday) -> bool {
        self.days_of_week.contains(&weekday)
    }
}

/// Records a failing field name once, keeping first-seen order.
fn flag(failures: &mut Vec<String>, field: &str) {
    if !failures.iter().any(|f| f == field) {
        failures.push(field.to_string());
    }
}

fn selector(
    values: &[i64],
    bounds: RangeInclusive<i64>,
    field: &str,
    failures: &mut Vec<String>,
) -> Vec<u32> {
    let mut accepted = Vec::with_capacity(values.len());
    for &value in values {
        if bounds.contains(&value) {
            accepted.push(value as u32);
        } else {
            flag(failures, field);
        }
    }
    accepted.sort_unstable();
    accepted.dedup();
    accepted
}

/// Selectors present on `input` that its rule type never reads.
///
/// Week-days are only read through a week-of-month selector, except by weekly
/// rules; month-of-year is only read by yearly rules.
fn unread_selectors(input: &RecurrenceRuleInput) -> Vec<&'static str> {
    let mut unread = Vec::new();
    let weekly = input.kind == RecurrenceType::Weekly;
    if !weekly && !input.day_of_week.is_empty() && input.week_of_month.is_empty() {
        unread.push("dayOfWeek");
    }
    if weekly && !input.week_of_month.is_empty() {
        unread.push("weekOfMonth");
    }
    if weekly && !input.day_of_month.is_empty() {
        unread.push("dayOfMonth");
    }
    if input.kind != RecurrenceType::Yearly && !input.month_of_year.is_empty() {
        unread.push("monthOfYear");
    }
    unread
}

impl TryFrom<RecurrenceRuleInput> for RecurrenceRule {
    type Error = ScheduleError;

    fn try_from(input: RecurrenceRuleInput) -> Result<Self> {
        let mut failures = Vec::new();

        let days_of_week: Vec<Weekday> =
            selector(&input.day_of_week, 1..=7, "dayOfWeek", &mut failures)
                .into_iter()
                .filter_map(|n| calendar::weekday_from_number(n as u8))
                .collect();
        let weeks_of_month = selector(&input.week_of_month, 1..=6, "weekOfMonth", &mut failures);
        let days_of_month = selector(&input.day_of_month, 1..=31, "dayOfMonth", &mut failures);
        let months_of_year = selector(&input.month_of_year, 1..=12, "monthOfYear", &mut failures);

        let separation_count = match &input.separation_count {
            None => 1,
            Some(number) => match number.as_u64().and_then(|n| u32::try_from(n).ok()) {
                Some(n) if n >= 1 => n,
                _ => {
                    flag(&mut failures, "separationCount");
                    1
                }
            },
        };

        match input.kind {
            RecurrenceType::Weekly if input.day_of_week.is_empty() => {
                flag(&mut failures, "dayOfWeek")
            }
            RecurrenceType::Monthly
                if input.day_of_month.is_empty() && input.week_of_month.is_empty() =>
            {
                flag(&mut failures, "dayOfMonth/weekOfMonth")
            }
            RecurrenceType::Yearly if input.month_of_year.is_empty() => {
                flag(&mut failures, "monthOfYear")
            }
            _ => {}
        }
        for field in unread_selectors(&input) {
            flag(&mut failures, field);
        }

        if !failures.is_empty() {
            return Err(ScheduleError::InvalidRule { fields: failures });
        }

        Ok(Self {
            kind: input.kind,
            days_of_week,
            separation_count,
            weeks_of_month,
            days_of_month,
            months_of_year,
        })
    }
}

impl From<RecurrenceRule> for RecurrenceRuleInput {
    fn from(rule: RecurrenceRule) -> Self {
        let widen = |values: Vec<u32>| values.into_iter().map(i64::from).collect();
        Self {
            kind: rule.kind,
            day_of_week: rule
                .days_of_week
                .iter()
                .map(|d| i64::from(d.number_from_monday()))
                .collect(),
            separation_count: Some(u64::from(rule.separation_count).into()),
            week_of_month: widen(rule.weeks_of_month),
            day_of_month: widen(rule.days_of_month),
            month_of_year: widen(rule.months_of_year),
        }
    }
}

#[derive(Deserialize)]
struct RawDateRange {
    from: NaiveDate,
    to: NaiveDate,
}

/// Inclusive calendar date range with `from <= to`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawDateRange")]
pub struct DateRange {
    from: NaiveDate,
    to: NaiveDate,
}

impl DateRange {
    pub fn new(from: NaiveDate, to: NaiveDate) -> Result<Self> {
        if from > to {
            return Err(ScheduleError::InvalidRange { from, to });
        }
        Ok(Self { from, to })
    }

    pub fn from(&self) -> NaiveDate {
        self.from
    }

    pub fn to(&self) -> NaiveDate {
        self.to
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.from <= date && date <= self.to
    }

    /// Number of calendar days covered, both ends included.
    pub fn len_days(&self) -> i64 {
        (self.to - self.from).num_days() + 1
    }

    pub fn days(&self) -> impl Iterator<Item = NaiveDate> {
        calendar::days(self.from, self.to)
    }
}

impl TryFrom<RawDateRange> for DateRange {
    type Error = ScheduleError;

    fn try_from(raw: RawDateRange) -> Result<Self> {
        DateRange::new(raw.from, raw.to)
    }
}
