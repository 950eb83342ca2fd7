//! Calendar and time-of-day arithmetic shared by the expander and the slot checks.
//!
//! Week-days use the booking API convention (Monday = 1 .. Sunday = 7). Two
//! week partitions exist side by side: weekly rules scan Sunday-start weeks,
//! while week-of-month selectors number Monday-start weeks inside a month.
//!
//! Every fallible date operation returns [`ScheduleError::Computation`]; for
//! validated input these never fire, so they are logged as defects.

use chrono::{Datelike, Days, NaiveDate, NaiveTime, Timelike, Weekday};

use crate::error::{Result, ScheduleError};

pub const SECONDS_PER_MINUTE: i64 = 60;
pub const SECONDS_PER_DAY: i64 = 86_400;

/// Build a computation error and log it; these indicate a bug, not bad input.
pub(crate) fn computation_error(message: impl Into<String>) -> ScheduleError {
    let message = message.into();
    tracing::error!(%message, "calendar computation failed");
    ScheduleError::Computation(message)
}

/// Week-day number of `date`, Monday = 1 .. Sunday = 7.
pub fn weekday_number(date: NaiveDate) -> u8 {
    date.weekday().number_from_monday() as u8
}

pub fn weekday_from_number(number: u8) -> Option<Weekday> {
    match number {
        1 => Some(Weekday::Mon),
        2 => Some(Weekday::Tue),
        3 => Some(Weekday::Wed),
        4 => Some(Weekday::Thu),
        5 => Some(Weekday::Fri),
        6 => Some(Weekday::Sat),
        7 => Some(Weekday::Sun),
        _ => None,
    }
}

pub fn is_leap_year(year: i32) -> bool {
    NaiveDate::from_ymd_opt(year, 1, 1).is_some_and(|d| d.leap_year())
}

/// Length of a month, taken from the day before the next month's first.
pub fn days_in_month(year: i32, month: u32) -> Result<u32> {
    first_of_month(year, month)?;
    let next = if month == 12 {
        first_of_month(year + 1, 1)?
    } else {
        first_of_month(year, month + 1)?
    };
    let last = next
        .pred_opt()
        .ok_or_else(|| computation_error(format!("no day before {next}")))?;
    Ok(last.day())
}

pub fn date(year: i32, month: u32, day: u32) -> Result<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, day)
        .ok_or_else(|| computation_error(format!("no such date {year:04}-{month:02}-{day:02}")))
}

pub fn first_of_month(year: i32, month: u32) -> Result<NaiveDate> {
    date(year, month, 1)
}

pub fn last_of_month(year: i32, month: u32) -> Result<NaiveDate> {
    date(year, month, days_in_month(year, month)?)
}

pub fn add_days(date: NaiveDate, days: u64) -> Result<NaiveDate> {
    date.checked_add_days(Days::new(days))
        .ok_or_else(|| computation_error(format!("{date} + {days} days overflows")))
}

/// The Sunday on or before `date`.
pub fn week_start_sunday(date: NaiveDate) -> Result<NaiveDate> {
    let back = u64::from(date.weekday().num_days_from_sunday());
    date.checked_sub_days(Days::new(back))
        .ok_or_else(|| computation_error(format!("no Sunday before {date}")))
}

/// 1-based index of the Monday-start week of its month that contains `date`.
pub fn week_of_month(date: NaiveDate) -> u32 {
    let first = date.with_day(1).unwrap_or(date);
    let offset = first.weekday().num_days_from_monday();
    (date.day() + offset - 1) / 7 + 1
}

/// Partition a month into Monday-start weeks.
///
/// The first and last weeks may be partial; a month spans four to six weeks.
pub fn month_weeks(year: i32, month: u32) -> Result<Vec<Vec<NaiveDate>>> {
    let first = first_of_month(year, month)?;
    let last = last_of_month(year, month)?;
    let mut weeks: Vec<Vec<NaiveDate>> = Vec::with_capacity(6);
    for day in days(first, last) {
        let index = week_of_month(day) as usize;
        if weeks.len() < index {
            weeks.push(Vec::with_capacity(7));
        }
        if let Some(week) = weeks.last_mut() {
            week.push(day);
        }
    }
    Ok(weeks)
}

/// Inclusive day iterator; empty when `from > to`.
pub fn days(from: NaiveDate, to: NaiveDate) -> impl Iterator<Item = NaiveDate> {
    from.iter_days().take_while(move |d| *d <= to)
}

/// Every `(year, month)` touched by `[from, to]`, ascending.
pub fn months_overlapping(from: NaiveDate, to: NaiveDate) -> Vec<(i32, u32)> {
    let mut months = Vec::new();
    let (mut year, mut month) = (from.year(), from.month());
    while (year, month) <= (to.year(), to.month()) {
        months.push((year, month));
        if month == 12 {
            year += 1;
            month = 1;
        } else {
            month += 1;
        }
    }
    months
}

pub fn years_overlapping(from: NaiveDate, to: NaiveDate) -> std::ops::RangeInclusive<i32> {
    from.year()..=to.year()
}

/// Seconds since midnight.
pub fn seconds_of_day(time: NaiveTime) -> i64 {
    i64::from(time.num_seconds_from_midnight())
}

/// Inverse of [`seconds_of_day`], rejecting offsets outside the day.
pub fn time_from_seconds(seconds: i64) -> Result<NaiveTime> {
    if !(0..SECONDS_PER_DAY).contains(&seconds) {
        return Err(ScheduleError::InvalidSlot(format!(
            "offset of {seconds}s falls outside the schedule day"
        )));
    }
    let secs = seconds as u32;
    NaiveTime::from_hms_opt(secs / 3600, (secs / 60) % 60, secs % 60)
        .ok_or_else(|| computation_error(format!("no time of day for {seconds}s")))
}
