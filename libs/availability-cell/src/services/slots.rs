// libs/availability-cell/src/services/slots.rs
use std::iter::FusedIterator;

use chrono::{Duration, NaiveDate, NaiveDateTime};

use crate::models::{AvailabilityError, SlotWindow, WorkingHours, MINUTES_PER_DAY};
use crate::services::calendar::WorkingHoursTable;

/// Lazy sequence of candidate slots for one day.
///
/// Starts at the opening time and steps forward by the slot interval. Each
/// candidate is `[step, step + duration)`; the sequence ends at the first step
/// whose candidate would run past closing time, or past the end of the
/// representable calendar. Clone it to restart.
#[derive(Debug, Clone)]
pub struct SlotGenerator {
    next_start: Option<NaiveDateTime>,
    close: NaiveDateTime,
    interval: Duration,
    duration: Duration,
}

impl SlotGenerator {
    /// Candidates for `date` inside `hours`. Non-working days yield nothing.
    pub fn for_hours(
        date: NaiveDate,
        hours: &WorkingHours,
        interval_minutes: i64,
        duration_minutes: i64,
    ) -> Result<Self, AvailabilityError> {
        validate_minutes("Slot interval", interval_minutes)?;
        validate_minutes("Appointment duration", duration_minutes)?;

        let (open, close) = if hours.is_working_day && duration_minutes <= hours.window_minutes() {
            (date.and_time(hours.start_time), date.and_time(hours.end_time))
        } else {
            let midnight = date.and_time(chrono::NaiveTime::MIN);
            (midnight, midnight)
        };

        // Any step longer than a day lands past closing time anyway.
        let interval_minutes = interval_minutes.min(MINUTES_PER_DAY + 1);
        let duration_minutes = duration_minutes.min(MINUTES_PER_DAY + 1);

        Ok(Self {
            next_start: Some(open),
            close,
            interval: Duration::minutes(interval_minutes),
            duration: Duration::minutes(duration_minutes),
        })
    }
}

impl Iterator for SlotGenerator {
    type Item = SlotWindow;

    fn next(&mut self) -> Option<SlotWindow> {
        let start_time = self.next_start?;
        let end_time = match start_time.checked_add_signed(self.duration) {
            Some(end_time) if end_time <= self.close => end_time,
            _ => {
                self.next_start = None;
                return None;
            }
        };

        self.next_start = start_time.checked_add_signed(self.interval);
        Some(SlotWindow {
            start_time,
            end_time,
        })
    }
}

impl FusedIterator for SlotGenerator {}

fn validate_minutes(name: &str, minutes: i64) -> Result<(), AvailabilityError> {
    if minutes <= 0 {
        return Err(AvailabilityError::InvalidParameter(format!(
            "{} must be greater than zero, got {}",
            name, minutes
        )));
    }
    Ok(())
}

/// Candidate slots covering the working window of `date`'s weekday.
pub fn generate_slots(
    table: &WorkingHoursTable,
    date: NaiveDate,
    interval_minutes: i64,
    duration_minutes: i64,
) -> Result<SlotGenerator, AvailabilityError> {
    SlotGenerator::for_hours(date, table.for_date(date), interval_minutes, duration_minutes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveTime;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 9, 15).unwrap()
    }

    #[test]
    fn test_generator_is_restartable() {
        let hours = WorkingHours::open(
            1,
            NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            NaiveTime::from_hms_opt(11, 0, 0).unwrap(),
        );
        let generator = SlotGenerator::for_hours(day(), &hours, 30, 60).unwrap();
        let first: Vec<_> = generator.clone().collect();
        let second: Vec<_> = generator.collect();
        assert_eq!(first.len(), 3);
        assert_eq!(first, second);
    }

    #[test]
    fn test_huge_interval_yields_single_slot() {
        let hours = WorkingHours::open(
            1,
            NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            NaiveTime::from_hms_opt(18, 0, 0).unwrap(),
        );
        let slots: Vec<_> = SlotGenerator::for_hours(day(), &hours, i64::MAX, 60)
            .unwrap()
            .collect();
        assert_eq!(slots.len(), 1);
    }

    #[test]
    fn test_last_representable_day_ends_cleanly() {
        let hours = WorkingHours::open(
            1,
            NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            NaiveTime::from_hms_opt(23, 59, 0).unwrap(),
        );
        let mut generator = SlotGenerator::for_hours(NaiveDate::MAX, &hours, 1440, 60).unwrap();
        assert!(generator.next().is_some());
        assert!(generator.next().is_none());
        assert!(generator.next().is_none());
    }
}
