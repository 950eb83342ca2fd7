//! Box slots: a time of day plus a duration on one box within one schedule.

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

use crate::calendar::{self, SECONDS_PER_MINUTE};
use crate::error::{Result, ScheduleError};

pub type SlotId = i64;
pub type BoxId = i64;
pub type ScheduleId = i64;
pub type VenueId = i64;

/// Longest slot a single schedule day can hold.
pub const MAX_DURATION_MINUTES: u32 = 24 * 60;

/// A time-of-day interval `[start, start + duration)`.
///
/// Offsets are plain seconds from midnight and never wrap, so an interval
/// running past midnight simply ends after `86_400`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeInterval {
    pub start: NaiveTime,
    pub duration_minutes: u32,
}

impl TimeInterval {
    pub fn new(start: NaiveTime, duration_minutes: u32) -> Result<Self> {
        let interval = Self {
            start,
            duration_minutes,
        };
        interval.validate()?;
        Ok(interval)
    }

    pub fn validate(&self) -> Result<()> {
        if self.duration_minutes == 0 || self.duration_minutes > MAX_DURATION_MINUTES {
            return Err(ScheduleError::InvalidSlot(format!(
                "duration must be between 1 and {MAX_DURATION_MINUTES} minutes, got {}",
                self.duration_minutes
            )));
        }
        Ok(())
    }

    pub fn start_seconds(&self) -> i64 {
        calendar::seconds_of_day(self.start)
    }

    pub fn end_seconds(&self) -> i64 {
        self.start_seconds() + i64::from(self.duration_minutes) * SECONDS_PER_MINUTE
    }
}

/// A persisted box slot.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Slot {
    pub id: SlotId,
    pub box_id: BoxId,
    pub schedule_id: ScheduleId,
    pub start: NaiveTime,
    pub duration_minutes: u32,
}

impl Slot {
    pub fn interval(&self) -> TimeInterval {
        TimeInterval {
            start: self.start,
            duration_minutes: self.duration_minutes,
        }
    }

    /// This slot as a placement request on its own box and schedule.
    pub fn to_request(&self) -> SlotRequest {
        SlotRequest {
            box_id: self.box_id,
            schedule_id: self.schedule_id,
            start: self.start,
            duration_minutes: self.duration_minutes,
        }
    }
}

/// A slot the caller wants to create or move; it has no id yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotRequest {
    pub box_id: BoxId,
    pub schedule_id: ScheduleId,
    pub start: NaiveTime,
    pub duration_minutes: u32,
}

impl SlotRequest {
    pub fn interval(&self) -> TimeInterval {
        TimeInterval {
            start: self.start,
            duration_minutes: self.duration_minutes,
        }
    }

    /// The persisted form of this request once storage assigned `id`.
    pub fn into_slot(self, id: SlotId) -> Slot {
        Slot {
            id,
            box_id: self.box_id,
            schedule_id: self.schedule_id,
            start: self.start,
            duration_minutes: self.duration_minutes,
        }
    }
}
