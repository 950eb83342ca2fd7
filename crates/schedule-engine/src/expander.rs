//! Recurrence expansion -- turns a rule plus a date range into applied dates.
//!
//! Each rule type walks a sequence of periods (Sunday-start weeks, months or
//! years) overlapping the range. A [`Cadence`] is folded over that sequence to
//! honour the separation count: once a period yields at least one in-range
//! date, the following `separation_count - 1` periods are skipped outright.
//! Periods that yield nothing do not reset or advance the skip.

use std::collections::BTreeSet;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::calendar;
use crate::error::Result;
use crate::rule::{DateRange, RecurrenceRule, RecurrenceType};

/// Sorted, duplicate-free set of calendar dates a schedule is applied on.
///
/// Serializes as a JSON array of `YYYY-MM-DD` strings in ascending order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AppliedDateSet(BTreeSet<NaiveDate>);

impl AppliedDateSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, date: &NaiveDate) -> bool {
        self.0.contains(date)
    }

    pub fn iter(&self) -> impl Iterator<Item = &NaiveDate> {
        self.0.iter()
    }

    pub fn first(&self) -> Option<NaiveDate> {
        self.0.first().copied()
    }

    pub fn last(&self) -> Option<NaiveDate> {
        self.0.last().copied()
    }

    /// Dates present in both sets, ascending.
    pub fn intersection(&self, other: &AppliedDateSet) -> Vec<NaiveDate> {
        self.0.intersection(&other.0).copied().collect()
    }

    pub fn to_vec(&self) -> Vec<NaiveDate> {
        self.0.iter().copied().collect()
    }
}

impl FromIterator<NaiveDate> for AppliedDateSet {
    fn from_iter<I: IntoIterator<Item = NaiveDate>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Separation-count state threaded through the period fold.
///
/// Only the index of the last period that yielded a date is kept; the number
/// of periods still to skip is derived from it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Cadence {
    last_matched: Option<usize>,
}

impl Cadence {
    /// Periods still to skip when `index` comes up for scanning.
    fn skip_remaining(&self, index: usize, separation: u32) -> usize {
        match self.last_matched {
            Some(matched) => (matched + separation as usize).saturating_sub(index),
            None => 0,
        }
    }

    fn observe(self, index: usize, matched: bool) -> Self {
        if matched {
            Self {
                last_matched: Some(index),
            }
        } else {
            self
        }
    }
}

/// Fold `periods` through a [`Cadence`], collecting the dates each admitted
/// period yields. `matches_in` must already clip its output to the range.
fn fold_periods<P>(
    periods: impl IntoIterator<Item = P>,
    separation: u32,
    mut matches_in: impl FnMut(P) -> Result<Vec<NaiveDate>>,
) -> Result<BTreeSet<NaiveDate>> {
    let (_, dates) = periods.into_iter().enumerate().try_fold(
        (Cadence::default(), BTreeSet::new()),
        |(cadence, mut dates): (Cadence, BTreeSet<NaiveDate>),
         (index, period)|
         -> Result<(Cadence, BTreeSet<NaiveDate>)> {
            let skip = cadence.skip_remaining(index, separation);
            if skip > 0 {
                tracing::trace!(index, skip, "period skipped by separation");
                return Ok((cadence, dates));
            }
            let found = matches_in(period)?;
            let cadence = cadence.observe(index, !found.is_empty());
            dates.extend(found);
            Ok((cadence, dates))
        },
    )?;
    Ok(dates)
}

/// Expand a recurrence rule over an inclusive date range.
///
/// With no rule every day of the range is applied. The result is clipped to
/// the range, de-duplicated and sorted; identical inputs always produce
/// identical output.
///
/// # Errors
/// Returns [`crate::ScheduleError::Computation`] if calendar arithmetic fails,
/// which does not happen for validated rules within chrono's date range.
pub fn expand(rule: Option<&RecurrenceRule>, range: &DateRange) -> Result<AppliedDateSet> {
    let dates = match rule {
        None => range.days().collect(),
        Some(rule) => match rule.kind() {
            RecurrenceType::Weekly => expand_weekly(rule, range)?,
            RecurrenceType::Monthly => expand_monthly(rule, range)?,
            RecurrenceType::Yearly => expand_yearly(rule, range)?,
        },
    };

    tracing::debug!(
        kind = ?rule.map(RecurrenceRule::kind),
        from = %range.from(),
        to = %range.to(),
        applied = dates.len(),
        "expanded recurrence"
    );

    Ok(AppliedDateSet(dates))
}

fn expand_weekly(rule: &RecurrenceRule, range: &DateRange) -> Result<BTreeSet<NaiveDate>> {
    let mut week_starts = Vec::new();
    let mut start = calendar::week_start_sunday(range.from())?;
    while start <= range.to() {
        week_starts.push(start);
        start = calendar::add_days(start, 7)?;
    }

    fold_periods(week_starts, rule.separation_count(), |week_start| {
        let week_end = calendar::add_days(week_start, 6)?;
        Ok(calendar::days(week_start, week_end)
            .filter(|d| range.contains(*d) && rule.matches_weekday(d.weekday()))
            .collect())
    })
}

fn expand_monthly(rule: &RecurrenceRule, range: &DateRange) -> Result<BTreeSet<NaiveDate>> {
    let months = calendar::months_overlapping(range.from(), range.to());
    fold_periods(months, rule.separation_count(), |(year, month)| {
        in_range(month_dates(rule, year, month)?, range)
    })
}

fn expand_yearly(rule: &RecurrenceRule, range: &DateRange) -> Result<BTreeSet<NaiveDate>> {
    let years = calendar::years_overlapping(range.from(), range.to());
    fold_periods(years, rule.separation_count(), |year| {
        let mut found = Vec::new();
        for &month in rule.months_of_year() {
            let first = calendar::first_of_month(year, month)?;
            let last = calendar::last_of_month(year, month)?;
            if last < range.from() || first > range.to() {
                continue;
            }
            found.extend(in_range(month_dates(rule, year, month)?, range)?);
        }
        Ok(found)
    })
}

fn in_range(dates: Vec<NaiveDate>, range: &DateRange) -> Result<Vec<NaiveDate>> {
    Ok(dates.into_iter().filter(|d| range.contains(*d)).collect())
}

/// Dates one month contributes, before range clipping.
///
/// Day-of-month selectors take precedence over week-of-month selectors; a
/// month with neither (only reachable from yearly rules) matches every day.
fn month_dates(rule: &RecurrenceRule, year: i32, month: u32) -> Result<Vec<NaiveDate>> {
    if !rule.days_of_month().is_empty() {
        by_day_of_month(rule.days_of_month(), year, month)
    } else if !rule.weeks_of_month().is_empty() {
        by_week_of_month(rule, year, month)
    } else {
        let first = calendar::first_of_month(year, month)?;
        let last = calendar::last_of_month(year, month)?;
        Ok(calendar::days(first, last).collect())
    }
}

/// Day 31 in a short month lands on its last day, except February which is
/// pinned to the 28th in every year. Other missing days (29 and 30 in
/// February) produce nothing.
fn by_day_of_month(days: &[u32], year: i32, month: u32) -> Result<Vec<NaiveDate>> {
    let length = calendar::days_in_month(year, month)?;
    let mut found = Vec::with_capacity(days.len());
    for &day in days {
        if day <= length {
            found.push(calendar::date(year, month, day)?);
        } else if day == 31 {
            let anchor = if month == 2 { 28 } else { length };
            found.push(calendar::date(year, month, anchor)?);
        }
    }
    Ok(found)
}

/// Week-of-month selection over Monday-start weeks.
///
/// Indices 5 and 6 mean "last week": an index beyond the month's week count
/// resolves to its final week, and a selected week-day missing from that
/// (possibly partial) week falls back to its last occurrence in the month.
/// With no week-day selector the whole resolved week is applied.
fn by_week_of_month(rule: &RecurrenceRule, year: i32, month: u32) -> Result<Vec<NaiveDate>> {
    let weeks = calendar::month_weeks(year, month)?;
    let mut found = Vec::new();

    for &requested in rule.weeks_of_month() {
        let resolved = (requested as usize).min(weeks.len());
        let Some(week) = weeks.get(resolved.saturating_sub(1)) else {
            continue;
        };

        if rule.days_of_week().is_empty() {
            found.extend(week.iter().copied());
            continue;
        }

        for &weekday in rule.days_of_week() {
            if let Some(day) = week.iter().find(|d| d.weekday() == weekday) {
                found.push(*day);
            } else if requested >= 5 {
                let fallback = weeks[..resolved]
                    .iter()
                    .flatten()
                    .rev()
                    .find(|d| d.weekday() == weekday);
                found.extend(fallback.copied());
            }
        }
    }

    Ok(found)
}
