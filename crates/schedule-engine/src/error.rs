//! Error types for schedule-engine operations.

use chrono::{NaiveDate, NaiveTime};
use thiserror::Error;

use crate::slot::{BoxId, SlotId};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ScheduleError {
    /// One or more recurrence rule fields failed validation.
    #[error("Invalid recurrence rule: {}", .fields.join(", "))]
    InvalidRule { fields: Vec<String> },

    #[error("Invalid date range: {from} is after {to}")]
    InvalidRange { from: NaiveDate, to: NaiveDate },

    /// Calendar arithmetic failed for a rule that passed validation.
    #[error("Recurrence computation error: {0}")]
    Computation(String),

    /// The candidate overlaps persisted slots the policy does not exempt.
    #[error("Slot conflicts with existing slots: {slot_ids:?}")]
    SlotConflict { slot_ids: Vec<SlotId> },

    /// Two not-yet-persisted slots of the same batch overlap on one box.
    #[error("Slots starting at {earlier} and {later} overlap on box {box_id}")]
    BatchConflict {
        box_id: BoxId,
        earlier: NaiveTime,
        later: NaiveTime,
    },

    #[error("Invalid slot: {0}")]
    InvalidSlot(String),

    #[error("Invalid slot link: {0}")]
    InvalidLink(String),
}

impl ScheduleError {
    /// HTTP status the service layer reports for this error.
    ///
    /// Everything is caller-correctable (4xx) except computation failures,
    /// which indicate a defect in the engine.
    pub fn http_status(&self) -> u16 {
        match self {
            ScheduleError::InvalidRule { .. }
            | ScheduleError::InvalidRange { .. }
            | ScheduleError::InvalidSlot(_)
            | ScheduleError::InvalidLink(_) => 400,
            ScheduleError::SlotConflict { .. } | ScheduleError::BatchConflict { .. } => 409,
            ScheduleError::Computation(_) => 500,
        }
    }
}

/// Errors raised while loading [`crate::config::SchedulerConfig`].
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Invalid value for {name}: {value}")]
    InvalidValue { name: String, value: String },
}

pub type Result<T> = std::result::Result<T, ScheduleError>;
