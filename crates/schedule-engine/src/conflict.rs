//! Detect box slots that collide once the cleanup buffer is applied.
//!
//! A box needs `cleanup` idle minutes between the end of one slot and the
//! start of the next. Two slots therefore conflict unless the later one starts
//! at least `cleanup` minutes after the earlier one ends; slots exactly
//! `cleanup` minutes apart are fine.

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

use crate::calendar::SECONDS_PER_MINUTE;
use crate::error::{Result, ScheduleError};
use crate::slot::{BoxId, Slot, SlotId, SlotRequest, TimeInterval};

/// Idle minutes required between consecutive slots on a box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CleanupBuffer(u32);

impl CleanupBuffer {
    pub const fn minutes(minutes: u32) -> Self {
        Self(minutes)
    }

    pub fn as_minutes(&self) -> u32 {
        self.0
    }

    fn as_seconds(&self) -> i64 {
        i64::from(self.0) * SECONDS_PER_MINUTE
    }
}

/// Whether `candidate` collides with `existing` under `cleanup`.
///
/// The candidate is widened by the buffer on both sides and compared with the
/// existing slot as half-open intervals:
/// `existing.start < candidate.end + c && candidate.start - c < existing.end`.
/// This is symmetric in its two interval arguments.
pub fn intervals_conflict(
    candidate: &TimeInterval,
    existing: &TimeInterval,
    cleanup: CleanupBuffer,
) -> bool {
    let buffered_start = candidate.start_seconds() - cleanup.as_seconds();
    let buffered_end = candidate.end_seconds() + cleanup.as_seconds();
    existing.start_seconds() < buffered_end && buffered_start < existing.end_seconds()
}

/// Every slot in `existing` that collides with `candidate`.
///
/// `existing` is expected to hold the slots of a single box and schedule, read
/// in the same transaction that will write the candidate.
pub fn find_conflicts(
    candidate: &TimeInterval,
    existing: &[Slot],
    cleanup: CleanupBuffer,
) -> Vec<Slot> {
    existing
        .iter()
        .filter(|slot| intervals_conflict(candidate, &slot.interval(), cleanup))
        .cloned()
        .collect()
}

/// [`find_conflicts`] restricted to slots on the request's box and schedule.
pub fn find_slot_conflicts(
    request: &SlotRequest,
    existing: &[Slot],
    cleanup: CleanupBuffer,
) -> Vec<Slot> {
    let candidate = request.interval();
    existing
        .iter()
        .filter(|slot| slot.box_id == request.box_id && slot.schedule_id == request.schedule_id)
        .filter(|slot| intervals_conflict(&candidate, &slot.interval(), cleanup))
        .cloned()
        .collect()
}

/// Which conflicts a write may tolerate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictPolicy {
    /// A new slot tolerates no conflict.
    Create,
    /// Moving `slot_id` in place may collide with its own persisted record or,
    /// for a linked pair, with its partner, as long as that is the only hit.
    Update {
        slot_id: SlotId,
        partner: Option<SlotId>,
    },
}

impl ConflictPolicy {
    /// Accept or reject the output of [`find_conflicts`].
    ///
    /// # Errors
    /// [`ScheduleError::SlotConflict`] carrying every conflicting slot id.
    pub fn enforce(&self, conflicts: &[Slot]) -> Result<()> {
        let tolerated = match (self, conflicts) {
            (_, []) => true,
            (ConflictPolicy::Update { slot_id, partner }, [only]) => {
                only.id == *slot_id || Some(only.id) == *partner
            }
            _ => false,
        };
        if tolerated {
            return Ok(());
        }

        let slot_ids: Vec<SlotId> = conflicts.iter().map(|s| s.id).collect();
        tracing::warn!(policy = ?self, ?slot_ids, "slot rejected by conflict check");
        Err(ScheduleError::SlotConflict { slot_ids })
    }
}

/// Check `request` against persisted slots and apply `policy`.
pub fn check_slot(
    request: &SlotRequest,
    existing: &[Slot],
    cleanup: CleanupBuffer,
    policy: ConflictPolicy,
) -> Result<()> {
    request.interval().validate()?;
    policy.enforce(&find_slot_conflicts(request, existing, cleanup))
}

/// Wire view of a conflicting slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConflictingSlot {
    pub id: SlotId,
    pub start: NaiveTime,
    pub duration_minutes: u32,
    pub box_id: BoxId,
}

impl From<&Slot> for ConflictingSlot {
    fn from(slot: &Slot) -> Self {
        Self {
            id: slot.id,
            start: slot.start,
            duration_minutes: slot.duration_minutes,
            box_id: slot.box_id,
        }
    }
}
