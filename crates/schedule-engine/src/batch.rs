//! Validate a batch of new slots before any of them is persisted.
//!
//! A single create request may carry several slots for the same box. Those
//! never appear in storage before the write, so besides the per-slot check
//! against persisted rows the batch is checked against itself: requests are
//! grouped by box, sorted by start, and each adjacent pair must leave the
//! cleanup buffer between them.

use std::collections::BTreeMap;

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

use crate::calendar::SECONDS_PER_MINUTE;
use crate::conflict::{self, CleanupBuffer, ConflictPolicy, ConflictingSlot};
use crate::error::{Result, ScheduleError};
use crate::slot::{BoxId, Slot, SlotRequest};

/// Two requests of the same batch that collide on one box.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InternalConflict {
    pub box_id: BoxId,
    /// Positions of the two requests in the submitted batch.
    pub earlier_index: usize,
    pub later_index: usize,
    pub earlier_start: NaiveTime,
    pub later_start: NaiveTime,
}

/// Persisted slots a single request collides with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedConflict {
    pub request_index: usize,
    pub conflicts: Vec<ConflictingSlot>,
}

/// Full outcome of checking a batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchReport {
    pub internal: Vec<InternalConflict>,
    pub persisted: Vec<PersistedConflict>,
}

impl BatchReport {
    pub fn is_clean(&self) -> bool {
        self.internal.is_empty() && self.persisted.is_empty()
    }
}

/// Adjacent pairs within each box whose buffered intervals collide.
fn internal_conflicts(candidates: &[SlotRequest], cleanup: CleanupBuffer) -> Vec<InternalConflict> {
    let mut by_box: BTreeMap<BoxId, Vec<(usize, &SlotRequest)>> = BTreeMap::new();
    for (index, request) in candidates.iter().enumerate() {
        by_box.entry(request.box_id).or_default().push((index, request));
    }

    let gap = i64::from(cleanup.as_minutes()) * SECONDS_PER_MINUTE;
    let mut found = Vec::new();
    for (box_id, mut group) in by_box {
        group.sort_by_key(|(index, request)| (request.start, *index));
        for pair in group.windows(2) {
            let (earlier_index, earlier) = pair[0];
            let (later_index, later) = pair[1];
            if earlier.interval().end_seconds() + gap > later.interval().start_seconds() {
                found.push(InternalConflict {
                    box_id,
                    earlier_index,
                    later_index,
                    earlier_start: earlier.start,
                    later_start: later.start,
                });
            }
        }
    }
    found
}

/// Check every request against the batch and against `persisted`, collecting
/// all findings instead of stopping at the first.
///
/// # Errors
/// [`ScheduleError::InvalidSlot`] if a request has an unusable duration.
pub fn find_batch_conflicts(
    candidates: &[SlotRequest],
    persisted: &[Slot],
    cleanup: CleanupBuffer,
) -> Result<BatchReport> {
    for request in candidates {
        request.interval().validate()?;
    }

    let persisted_hits = candidates
        .iter()
        .enumerate()
        .filter_map(|(request_index, request)| {
            let hits = conflict::find_slot_conflicts(request, persisted, cleanup);
            (!hits.is_empty()).then(|| PersistedConflict {
                request_index,
                conflicts: hits.iter().map(ConflictingSlot::from).collect(),
            })
        })
        .collect();

    Ok(BatchReport {
        internal: internal_conflicts(candidates, cleanup),
        persisted: persisted_hits,
    })
}

/// Reject the batch on its first internal or persisted conflict.
///
/// # Errors
/// [`ScheduleError::BatchConflict`] when two requests collide with each other,
/// [`ScheduleError::SlotConflict`] when a request collides with a stored slot.
pub fn validate_batch(
    candidates: &[SlotRequest],
    persisted: &[Slot],
    cleanup: CleanupBuffer,
) -> Result<()> {
    for request in candidates {
        request.interval().validate()?;
    }

    if let Some(first) = internal_conflicts(candidates, cleanup).into_iter().next() {
        tracing::warn!(
            box_id = first.box_id,
            earlier = %first.earlier_start,
            later = %first.later_start,
            "slot batch conflicts with itself"
        );
        return Err(ScheduleError::BatchConflict {
            box_id: first.box_id,
            earlier: first.earlier_start,
            later: first.later_start,
        });
    }

    for request in candidates {
        conflict::check_slot(request, persisted, cleanup, ConflictPolicy::Create)?;
    }

    tracing::debug!(slots = candidates.len(), "slot batch accepted");
    Ok(())
}
