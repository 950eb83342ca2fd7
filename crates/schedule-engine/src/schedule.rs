//! Schedules: a venue-scoped recurrence rule over a date range.

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::expander::{self, AppliedDateSet};
use crate::rule::{DateRange, RecurrenceRule};
use crate::slot::{ScheduleId, VenueId};

/// A schedule as loaded by the service layer.
///
/// The rule and range are canonical; [`Schedule::applied_dates`] recomputes
/// the derived date set on every call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Schedule {
    pub id: ScheduleId,
    pub venue_id: VenueId,
    /// `None` applies the schedule on every day of its range.
    #[serde(default)]
    pub rule: Option<RecurrenceRule>,
    pub range: DateRange,
}

impl Schedule {
    pub fn applied_dates(&self) -> Result<AppliedDateSet> {
        expander::expand(self.rule.as_ref(), &self.range)
    }

    /// Whether the two schedules' ranges share at least one day.
    pub fn range_overlaps(&self, other: &Schedule) -> bool {
        self.range.from() <= other.range.to() && other.range.from() <= self.range.to()
    }
}
