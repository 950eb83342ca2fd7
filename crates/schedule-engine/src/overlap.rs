//! Detect calendar dates on which two schedules of a venue would both apply.
//!
//! This is advisory: the caller surfaces the overlaps as a warning before a
//! schedule is applied, it never blocks on its own.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::expander::AppliedDateSet;
use crate::schedule::Schedule;
use crate::slot::ScheduleId;

/// Dates shared between the candidate and one other schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleOverlap {
    pub schedule_id: ScheduleId,
    pub conflicting_dates: Vec<NaiveDate>,
}

/// Intersect `candidate` with every other schedule's applied dates.
///
/// Schedules sharing no date are omitted; the result is ordered by schedule id.
pub fn find_schedule_overlaps(
    candidate: &AppliedDateSet,
    others: &BTreeMap<ScheduleId, AppliedDateSet>,
) -> Vec<ScheduleOverlap> {
    others
        .iter()
        .filter_map(|(&schedule_id, dates)| {
            let conflicting_dates = candidate.intersection(dates);
            (!conflicting_dates.is_empty()).then_some(ScheduleOverlap {
                schedule_id,
                conflicting_dates,
            })
        })
        .collect()
}

/// Expand `candidate` and every other schedule of the same venue, then report
/// the dates they share.
///
/// Schedules of other venues, the candidate itself (same id) and schedules
/// whose range cannot intersect are skipped without being expanded.
pub fn check_schedule_overlaps(
    candidate: &Schedule,
    others: &[Schedule],
) -> Result<Vec<ScheduleOverlap>> {
    let applied = candidate.applied_dates()?;

    let mut expanded = BTreeMap::new();
    for other in others {
        if other.id == candidate.id
            || other.venue_id != candidate.venue_id
            || !candidate.range_overlaps(other)
        {
            continue;
        }
        expanded.insert(other.id, other.applied_dates()?);
    }

    let overlaps = find_schedule_overlaps(&applied, &expanded);
    if !overlaps.is_empty() {
        tracing::debug!(
            schedule_id = candidate.id,
            venue_id = candidate.venue_id,
            overlapping = overlaps.len(),
            "schedule shares applied dates with other schedules"
        );
    }
    Ok(overlaps)
}
