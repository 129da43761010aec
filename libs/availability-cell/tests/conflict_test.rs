// libs/availability-cell/tests/conflict_test.rs
use chrono::{NaiveDate, NaiveDateTime};

use availability_cell::models::{BookedWindow, SlotWindow};
use availability_cell::services::conflict::{is_slot_free, windows_overlap, ConflictChecker};

fn at(hour: u32, minute: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, 9, 15)
        .unwrap()
        .and_hms_opt(hour, minute, 0)
        .unwrap()
}

fn window(start: (u32, u32), end: (u32, u32)) -> SlotWindow {
    SlotWindow {
        start_time: at(start.0, start.1),
        end_time: at(end.0, end.1),
    }
}

fn booked(start: (u32, u32), end: (u32, u32), cancelled: bool) -> BookedWindow {
    BookedWindow {
        start_time: at(start.0, start.1),
        end_time: at(end.0, end.1),
        cancelled,
    }
}

#[test]
fn test_partial_overlap_blocks() {
    let existing = [booked((10, 0), (11, 0), false)];
    assert!(!is_slot_free(&window((10, 30), (11, 30)), &existing));
    assert!(!is_slot_free(&window((9, 30), (10, 30)), &existing));
}

#[test]
fn test_touching_boundaries_do_not_block() {
    let existing = [booked((10, 0), (11, 0), false)];
    assert!(is_slot_free(&window((11, 0), (12, 0)), &existing));
    assert!(is_slot_free(&window((9, 0), (10, 0)), &existing));
}

#[test]
fn test_containment_blocks_both_ways() {
    let existing = [booked((10, 0), (11, 0), false)];
    assert!(!is_slot_free(&window((9, 0), (12, 0)), &existing));
    assert!(!is_slot_free(&window((10, 15), (10, 45)), &existing));
    assert!(!is_slot_free(&window((10, 0), (11, 0)), &existing));
}

#[test]
fn test_cancelled_reservation_never_blocks() {
    let existing = [booked((10, 0), (11, 0), true)];
    assert!(is_slot_free(&window((10, 0), (11, 0)), &existing));
}

#[test]
fn test_empty_reservation_list_is_free() {
    let existing: [BookedWindow; 0] = [];
    assert!(is_slot_free(&window((10, 0), (11, 0)), &existing));
}

#[test]
fn test_buffer_widens_candidate() {
    let existing = [booked((10, 0), (11, 0), false)];
    let checker = ConflictChecker::with_buffer(15);

    assert!(!checker.is_slot_free(&window((11, 0), (12, 0)), &existing));
    assert!(checker.is_slot_free(&window((11, 15), (12, 15)), &existing));
    assert!(ConflictChecker::with_buffer(-5).is_slot_free(&window((11, 0), (12, 0)), &existing));
}

#[test]
fn test_conflicts_lists_only_blocking_reservations() {
    let existing = [
        booked((9, 0), (10, 0), false),
        booked((10, 0), (11, 0), true),
        booked((10, 30), (11, 30), false),
    ];
    let checker = ConflictChecker::new();
    let slot = window((10, 0), (11, 0));

    let blocking: Vec<_> = checker.conflicts(&slot, &existing).collect();
    assert_eq!(blocking.len(), 1);
    assert_eq!(blocking[0].start_time, at(10, 30));
}

#[test]
fn test_windows_overlap_is_symmetric() {
    assert!(windows_overlap(at(10, 0), at(11, 0), at(10, 59), at(12, 0)));
    assert!(windows_overlap(at(10, 59), at(12, 0), at(10, 0), at(11, 0)));
    assert!(!windows_overlap(at(10, 0), at(11, 0), at(11, 0), at(12, 0)));
}
