//! Tests for batch slot validation.

use chrono::NaiveTime;
use schedule_engine::{
    find_batch_conflicts, validate_batch, CleanupBuffer, ScheduleError, Slot, SlotRequest,
};

const CLEANUP: CleanupBuffer = CleanupBuffer::minutes(10);

fn at(hour: u32, minute: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, minute, 0).unwrap()
}

fn request(box_id: i64, hour: u32, minute: u32, duration_minutes: u32) -> SlotRequest {
    SlotRequest {
        box_id,
        schedule_id: 1,
        start: at(hour, minute),
        duration_minutes,
    }
}

fn slot(id: i64, box_id: i64, hour: u32, minute: u32, duration_minutes: u32) -> Slot {
    request(box_id, hour, minute, duration_minutes).into_slot(id)
}

#[test]
fn clean_batch_is_accepted() {
    let batch = [
        request(1, 10, 0, 60),
        request(1, 11, 10, 60),
        request(2, 10, 0, 60),
    ];
    assert!(validate_batch(&batch, &[], CLEANUP).is_ok());
}

#[test]
fn overlapping_new_slots_on_same_box_are_rejected() {
    // Neither slot exists in storage; the batch conflicts with itself.
    let batch = [request(1, 11, 0, 60), request(1, 10, 0, 65)];
    let err = validate_batch(&batch, &[], CLEANUP).unwrap_err();
    assert_eq!(
        err,
        ScheduleError::BatchConflict {
            box_id: 1,
            earlier: at(10, 0),
            later: at(11, 0),
        }
    );
}

#[test]
fn batch_gap_shorter_than_buffer_is_rejected() {
    let batch = [request(3, 10, 0, 60), request(3, 11, 9, 30)];
    assert!(matches!(
        validate_batch(&batch, &[], CLEANUP),
        Err(ScheduleError::BatchConflict { box_id: 3, .. })
    ));
}

#[test]
fn same_times_on_different_boxes_are_fine() {
    let batch = [request(1, 10, 0, 60), request(2, 10, 0, 60)];
    assert!(validate_batch(&batch, &[], CLEANUP).is_ok());
}

#[test]
fn batch_slot_colliding_with_persisted_slot_is_rejected() {
    let persisted = [slot(42, 1, 12, 0, 60)];
    let batch = [request(1, 10, 0, 60), request(1, 11, 30, 30)];
    let err = validate_batch(&batch, &persisted, CLEANUP).unwrap_err();
    assert_eq!(err, ScheduleError::SlotConflict { slot_ids: vec![42] });
}

#[test]
fn invalid_duration_in_batch_is_rejected() {
    let batch = [request(1, 10, 0, 0)];
    assert!(matches!(
        validate_batch(&batch, &[], CLEANUP),
        Err(ScheduleError::InvalidSlot(_))
    ));
}

#[test]
fn report_collects_every_finding() {
    let persisted = [slot(42, 2, 9, 0, 60)];
    let batch = [
        request(1, 10, 0, 60),
        request(1, 10, 30, 60),
        request(1, 11, 0, 60),
        request(2, 9, 30, 30),
    ];
    let report = find_batch_conflicts(&batch, &persisted, CLEANUP).unwrap();

    assert!(!report.is_clean());
    let pairs: Vec<(usize, usize)> = report
        .internal
        .iter()
        .map(|c| (c.earlier_index, c.later_index))
        .collect();
    assert_eq!(pairs, [(0, 1), (1, 2)]);

    assert_eq!(report.persisted.len(), 1);
    assert_eq!(report.persisted[0].request_index, 3);
    assert_eq!(report.persisted[0].conflicts[0].id, 42);
}

#[test]
fn empty_batch_report_is_clean() {
    let report = find_batch_conflicts(&[], &[], CLEANUP).unwrap();
    assert!(report.is_clean());
}
