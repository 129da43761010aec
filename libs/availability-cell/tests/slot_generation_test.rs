// libs/availability-cell/tests/slot_generation_test.rs
use assert_matches::assert_matches;
use chrono::{NaiveDate, NaiveTime};

use availability_cell::models::{AvailabilityError, WorkingHoursConfig};
use availability_cell::services::{generate_slots, WorkingHoursTable};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn at(hour: u32, minute: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, minute, 0).unwrap()
}

fn monday() -> NaiveDate {
    date(2025, 9, 15)
}

#[test]
fn test_nine_to_six_half_hour_interval_hour_long() {
    let table = WorkingHoursTable::default();
    let slots: Vec<_> = generate_slots(&table, monday(), 30, 60).unwrap().collect();

    assert_eq!(slots.len(), 17);
    assert_eq!(slots[0].start_time, monday().and_time(at(9, 0)));
    assert_eq!(slots[0].end_time, monday().and_time(at(10, 0)));
    assert_eq!(slots[16].start_time, monday().and_time(at(17, 0)));
    assert_eq!(slots[16].end_time, monday().and_time(at(18, 0)));
}

#[test]
fn test_non_working_weekdays_yield_nothing() {
    let table = WorkingHoursTable::default();
    // Saturday and Sunday across several weeks
    for d in [13, 14, 20, 21, 27, 28] {
        let count = generate_slots(&table, date(2025, 9, d), 30, 60).unwrap().count();
        assert_eq!(count, 0, "expected no slots on 2025-09-{}", d);
    }
}

#[test]
fn test_slots_have_exact_duration_and_stay_in_window() {
    let table = WorkingHoursTable::default();
    for (interval, duration) in [(15, 45), (30, 90), (20, 30), (60, 60), (45, 15)] {
        for day in 15..=19 {
            let d = date(2025, 9, day);
            let hours = table.for_date(d);
            for slot in generate_slots(&table, d, interval, duration).unwrap() {
                assert_eq!(slot.duration_minutes(), duration);
                assert!(slot.start_time >= d.and_time(hours.start_time));
                assert!(slot.end_time <= d.and_time(hours.end_time));
            }
        }
    }
}

#[test]
fn test_friday_closes_earlier() {
    let table = WorkingHoursTable::default();
    let friday = date(2025, 9, 19);
    let slots: Vec<_> = generate_slots(&table, friday, 30, 60).unwrap().collect();

    assert_eq!(slots.len(), 15);
    assert_eq!(slots.last().unwrap().end_time, friday.and_time(at(17, 0)));
}

#[test]
fn test_duration_longer_than_window_is_empty() {
    let table = WorkingHoursTable::default();
    assert_eq!(generate_slots(&table, monday(), 30, 9 * 60 + 1).unwrap().count(), 0);
    assert_eq!(generate_slots(&table, monday(), 30, 9 * 60).unwrap().count(), 1);
}

#[test]
fn test_non_positive_parameters_are_rejected() {
    let table = WorkingHoursTable::default();

    assert_matches!(
        generate_slots(&table, monday(), 0, 60),
        Err(AvailabilityError::InvalidParameter(_))
    );
    assert_matches!(
        generate_slots(&table, monday(), 30, -15),
        Err(AvailabilityError::InvalidParameter(_))
    );
    // Still rejected on a closed day
    assert_matches!(
        generate_slots(&table, date(2025, 9, 14), 30, 0),
        Err(AvailabilityError::InvalidParameter(_))
    );
}

#[test]
fn test_generation_is_idempotent() {
    let table = WorkingHoursTable::default();
    let first: Vec<_> = generate_slots(&table, monday(), 20, 50).unwrap().collect();
    let second: Vec<_> = generate_slots(&table, monday(), 20, 50).unwrap().collect();
    assert_eq!(first, second);
}

#[test]
fn test_interval_not_dividing_window_stops_before_close() {
    let table = WorkingHoursTable::from_config(&[WorkingHoursConfig {
        day_of_week: 1,
        is_working_day: true,
        start_time: "09:00".to_string(),
        end_time: "10:00".to_string(),
        breaks: vec![],
    }])
    .unwrap();

    let starts: Vec<_> = generate_slots(&table, monday(), 25, 20)
        .unwrap()
        .map(|s| s.start_time.time())
        .collect();

    assert_eq!(starts, vec![at(9, 0), at(9, 25)]);
}
