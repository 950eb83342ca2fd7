//! # schedule-engine
//!
//! Scheduling core of the venue box-booking backend.
//!
//! Two pure, deterministic subsystems live here: expansion of weekly, monthly
//! and yearly recurrence rules into the concrete dates a schedule applies on,
//! and detection of colliding box slots once the mandatory cleanup buffer is
//! taken into account. Persistence, transactions and HTTP handling stay with
//! the caller, which hands in plain values and stores whatever comes back.
//!
//! ## Modules
//!
//! - [`calendar`]: week/month arithmetic and time-of-day offsets
//! - [`rule`]: validated recurrence rules and date ranges
//! - [`expander`]: rule + range → [`AppliedDateSet`]
//! - [`schedule`]: venue-scoped schedules
//! - [`overlap`]: dates shared between schedules of a venue
//! - [`slot`]: box slots and slot requests
//! - [`conflict`]: buffered interval conflicts and the update policy
//! - [`batch`]: conflicts within a batch of not-yet-persisted slots
//! - [`link`]: linked double-box slot pairs
//! - [`config`]: environment-driven settings
//! - [`error`]: Error types

pub mod batch;
pub mod calendar;
pub mod config;
pub mod conflict;
pub mod error;
pub mod expander;
pub mod link;
pub mod overlap;
pub mod rule;
pub mod schedule;
pub mod slot;

pub use batch::{find_batch_conflicts, validate_batch, BatchReport};
pub use config::SchedulerConfig;
pub use conflict::{
    find_conflicts, find_slot_conflicts, intervals_conflict, CleanupBuffer, ConflictPolicy,
    ConflictingSlot,
};
pub use error::{ConfigError, ScheduleError};
pub use expander::{expand, AppliedDateSet};
pub use link::{resolve_partner, SlotBook, SlotLink};
pub use overlap::{check_schedule_overlaps, find_schedule_overlaps, ScheduleOverlap};
pub use rule::{DateRange, RecurrenceRule, RecurrenceRuleInput, RecurrenceType};
pub use schedule::Schedule;
pub use slot::{Slot, SlotRequest, TimeInterval};
