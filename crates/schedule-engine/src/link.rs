//! Linked slots: two slots on different boxes booked as one double unit.
//!
//! A [`SlotLink`] names exactly two distinct slots and is symmetric. The
//! [`SlotBook`] arena keeps slots keyed by id and the link table keyed by
//! either half, so creating, moving and deleting a pair always touches both
//! halves together and a half-link can never be left behind.

use std::collections::HashMap;

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

use crate::calendar::{self, SECONDS_PER_MINUTE};
use crate::conflict::{self, CleanupBuffer, ConflictPolicy};
use crate::error::{Result, ScheduleError};
use crate::slot::{BoxId, ScheduleId, Slot, SlotId};

/// Symmetric association between two slots offset by a fixed number of minutes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotLink {
    first: SlotId,
    second: SlotId,
    offset_minutes: u32,
}

impl SlotLink {
    pub fn first(&self) -> SlotId {
        self.first
    }

    pub fn second(&self) -> SlotId {
        self.second
    }

    pub fn offset_minutes(&self) -> u32 {
        self.offset_minutes
    }

    pub fn contains(&self, slot_id: SlotId) -> bool {
        self.first == slot_id || self.second == slot_id
    }

    /// The other half of the link.
    ///
    /// # Errors
    /// [`ScheduleError::InvalidLink`] if `known` is not part of this link.
    pub fn resolve_partner(&self, known: SlotId) -> Result<SlotId> {
        if known == self.first {
            Ok(self.second)
        } else if known == self.second {
            Ok(self.first)
        } else {
            Err(ScheduleError::InvalidLink(format!(
                "slot {known} is not part of link {}<->{}",
                self.first, self.second
            )))
        }
    }
}

/// Link two conflict-checked slots into one double booking unit.
///
/// The slots must be distinct, sit on different boxes of the same schedule,
/// and start exactly `offset_minutes` apart (in either order).
pub fn link(a: &Slot, b: &Slot, offset_minutes: u32) -> Result<SlotLink> {
    if a.id == b.id {
        return Err(ScheduleError::InvalidLink(format!(
            "slot {} cannot be linked to itself",
            a.id
        )));
    }
    if a.box_id == b.box_id {
        return Err(ScheduleError::InvalidLink(format!(
            "slots {} and {} are on the same box {}",
            a.id, b.id, a.box_id
        )));
    }
    if a.schedule_id != b.schedule_id {
        return Err(ScheduleError::InvalidLink(format!(
            "slots {} and {} belong to different schedules",
            a.id, b.id
        )));
    }
    let apart = (calendar::seconds_of_day(b.start) - calendar::seconds_of_day(a.start)).abs();
    if apart != i64::from(offset_minutes) * SECONDS_PER_MINUTE {
        return Err(ScheduleError::InvalidLink(format!(
            "slots {} and {} start {}s apart, expected {offset_minutes} minutes",
            a.id, b.id, apart
        )));
    }

    Ok(SlotLink {
        first: a.id,
        second: b.id,
        offset_minutes,
    })
}

/// Free-function form of [`SlotLink::resolve_partner`].
pub fn resolve_partner(link: &SlotLink, known: SlotId) -> Result<SlotId> {
    link.resolve_partner(known)
}

/// What [`SlotBook::remove`] took out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Removal {
    pub slots: Vec<Slot>,
    pub link: Option<SlotLink>,
}

/// In-memory arena of slots and their links.
#[derive(Debug, Clone, Default)]
pub struct SlotBook {
    slots: HashMap<SlotId, Slot>,
    links: HashMap<SlotId, SlotLink>,
}

impl SlotBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a book from persisted rows without conflict checks.
    ///
    /// # Errors
    /// [`ScheduleError::InvalidLink`] if a link references a missing slot or
    /// a slot is part of two links.
    pub fn load(
        slots: impl IntoIterator<Item = Slot>,
        links: impl IntoIterator<Item = SlotLink>,
    ) -> Result<Self> {
        let mut book = Self {
            slots: slots.into_iter().map(|s| (s.id, s)).collect(),
            links: HashMap::new(),
        };
        for link in links {
            for half in [link.first, link.second] {
                if book.links.insert(half, link).is_some() {
                    return Err(ScheduleError::InvalidLink(format!(
                        "slot {half} appears in more than one link"
                    )));
                }
            }
        }
        book.check_integrity()?;
        Ok(book)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn get(&self, slot_id: SlotId) -> Option<&Slot> {
        self.slots.get(&slot_id)
    }

    pub fn link_of(&self, slot_id: SlotId) -> Option<&SlotLink> {
        self.links.get(&slot_id)
    }

    pub fn partner_of(&self, slot_id: SlotId) -> Option<&Slot> {
        let partner = self.links.get(&slot_id)?.resolve_partner(slot_id).ok()?;
        self.slots.get(&partner)
    }

    /// Slots on one box within one schedule, ordered by start.
    pub fn slots_for(&self, box_id: BoxId, schedule_id: ScheduleId) -> Vec<Slot> {
        let mut found: Vec<Slot> = self
            .slots
            .values()
            .filter(|s| s.box_id == box_id && s.schedule_id == schedule_id)
            .cloned()
            .collect();
        found.sort_by_key(|s| (s.start, s.id));
        found
    }

    fn check_new(&self, slot: &Slot, cleanup: CleanupBuffer) -> Result<()> {
        if self.slots.contains_key(&slot.id) {
            return Err(ScheduleError::InvalidSlot(format!(
                "slot {} already exists",
                slot.id
            )));
        }
        let request = slot.to_request();
        let existing = self.slots_for(slot.box_id, slot.schedule_id);
        conflict::check_slot(&request, &existing, cleanup, ConflictPolicy::Create)
    }

    /// Add a single unlinked slot after checking it for conflicts.
    pub fn insert(&mut self, slot: Slot, cleanup: CleanupBuffer) -> Result<()> {
        self.check_new(&slot, cleanup)?;
        self.slots.insert(slot.id, slot);
        Ok(())
    }

    /// Add both halves of a double booking and their link in one step.
    ///
    /// Nothing is inserted unless both halves pass the conflict check and
    /// form a valid link.
    pub fn insert_pair(
        &mut self,
        a: Slot,
        b: Slot,
        offset_minutes: u32,
        cleanup: CleanupBuffer,
    ) -> Result<SlotLink> {
        let pair = link(&a, &b, offset_minutes)?;
        self.check_new(&a, cleanup)?;
        self.check_new(&b, cleanup)?;

        self.links.insert(a.id, pair);
        self.links.insert(b.id, pair);
        self.slots.insert(a.id, a);
        self.slots.insert(b.id, b);
        tracing::debug!(first = pair.first, second = pair.second, "linked slot pair created");
        Ok(pair)
    }

    /// Move a slot to a new start and duration, shifting its partner if linked.
    ///
    /// The partner keeps its own duration and its position relative to the
    /// moved slot. Each moved
    /// half may only collide with its own previous record or its partner.
    /// Returns the updated slots; the book is unchanged on error.
    pub fn reschedule(
        &mut self,
        slot_id: SlotId,
        start: NaiveTime,
        duration_minutes: u32,
        cleanup: CleanupBuffer,
    ) -> Result<Vec<Slot>> {
        let current = self.require(slot_id)?.clone();
        let mut moved = vec![Slot {
            start,
            duration_minutes,
            ..current.clone()
        }];

        let partner_id = match self.links.get(&slot_id) {
            Some(link) => Some(link.resolve_partner(slot_id)?),
            None => None,
        };
        if let Some(partner_id) = partner_id {
            let partner = self.require(partner_id)?;
            let delta =
                calendar::seconds_of_day(partner.start) - calendar::seconds_of_day(current.start);
            moved.push(Slot {
                start: calendar::time_from_seconds(calendar::seconds_of_day(start) + delta)?,
                ..partner.clone()
            });
        }

        for slot in &moved {
            let partner = self
                .links
                .get(&slot.id)
                .and_then(|l| l.resolve_partner(slot.id).ok());
            let existing = self.slots_for(slot.box_id, slot.schedule_id);
            conflict::check_slot(
                &slot.to_request(),
                &existing,
                cleanup,
                ConflictPolicy::Update {
                    slot_id: slot.id,
                    partner,
                },
            )?;
        }

        for slot in &moved {
            self.slots.insert(slot.id, slot.clone());
        }
        Ok(moved)
    }

    /// Remove a slot; a linked slot takes its partner and the link with it.
    pub fn remove(&mut self, slot_id: SlotId) -> Result<Removal> {
        self.require(slot_id)?;
        let link = self.links.get(&slot_id).copied();
        let partner_id = link.map(|l| l.resolve_partner(slot_id)).transpose()?;
        if let Some(partner_id) = partner_id {
            self.require(partner_id)?;
        }

        let mut slots = Vec::with_capacity(2);
        for id in std::iter::once(slot_id).chain(partner_id) {
            self.links.remove(&id);
            if let Some(slot) = self.slots.remove(&id) {
                slots.push(slot);
            }
        }
        Ok(Removal { slots, link })
    }

    /// Verify that every link entry is symmetric and both halves exist.
    pub fn check_integrity(&self) -> Result<()> {
        for (&slot_id, link) in &self.links {
            let partner = link.resolve_partner(slot_id)?;
            for half in [slot_id, partner] {
                if !self.slots.contains_key(&half) {
                    return Err(ScheduleError::InvalidLink(format!(
                        "link {}<->{} references missing slot {half}",
                        link.first, link.second
                    )));
                }
            }
            if self.links.get(&partner) != Some(link) {
                return Err(ScheduleError::InvalidLink(format!(
                    "slot {partner} does not link back to slot {slot_id}"
                )));
            }
        }
        Ok(())
    }

    fn require(&self, slot_id: SlotId) -> Result<&Slot> {
        self.slots.get(&slot_id).ok_or_else(|| {
            if self.links.contains_key(&slot_id) {
                ScheduleError::InvalidLink(format!("linked slot {slot_id} no longer exists"))
            } else {
                ScheduleError::InvalidSlot(format!("unknown slot {slot_id}"))
            }
        })
    }
}
