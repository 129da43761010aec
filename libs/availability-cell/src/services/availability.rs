// libs/availability-cell/src/services/availability.rs
use std::sync::Arc;

use chrono::{Duration, NaiveDate, NaiveDateTime};
use tracing::debug;

use crate::models::{
    AppointmentType, AvailabilityError, DayAvailability, Reservation, SlotWindow, TimeSlot,
};
use crate::services::calendar::CalendarSettings;
use crate::services::conflict::ConflictChecker;
use crate::services::slots::SlotGenerator;

pub const MAX_SEARCH_DAYS: i64 = 366;

pub struct AvailabilityService {
    settings: Arc<CalendarSettings>,
}

impl AvailabilityService {
    pub fn new(settings: Arc<CalendarSettings>) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &CalendarSettings {
        &self.settings
    }

    pub fn resolve_type(&self, appointment_type_id: &str) -> Result<&AppointmentType, AvailabilityError> {
        self.settings
            .appointment_type(appointment_type_id)
            .ok_or_else(|| AvailabilityError::UnknownAppointmentType(appointment_type_id.to_string()))
    }

    /// Candidate slots for a date, each flagged available or not.
    pub fn get_available_slots<R: Reservation>(
        &self,
        date: NaiveDate,
        appointment_type_id: &str,
        reservations: &[R],
    ) -> Result<Vec<TimeSlot>, AvailabilityError> {
        debug!("Calculating slots for {} on {}", appointment_type_id, date);

        let appointment_type = self.resolve_type(appointment_type_id)?;
        let slots = self.slots_for_type(date, appointment_type, reservations)?;

        debug!(
            "Found {} slots, {} available",
            slots.len(),
            slots.iter().filter(|s| s.is_available).count()
        );
        Ok(slots)
    }

    pub fn slots_for_type<R: Reservation>(
        &self,
        date: NaiveDate,
        appointment_type: &AppointmentType,
        reservations: &[R],
    ) -> Result<Vec<TimeSlot>, AvailabilityError> {
        let hours = self.settings.hours_for(date);
        let checker = self.checker_for(appointment_type);

        let generator = SlotGenerator::for_hours(
            date,
            &hours,
            self.settings.slot_interval_minutes,
            appointment_type.duration_minutes,
        )?;

        let slots = generator
            .map(|window| {
                let is_available = !hours.overlaps_break(window.start_time.time(), window.end_time.time())
                    && checker.is_slot_free(&window, reservations);
                TimeSlot::from_window(window, is_available, Some(&appointment_type.id))
            })
            .collect();

        Ok(slots)
    }

    /// Whether an arbitrary window can be booked for this type: inside working
    /// hours, clear of breaks and closures, and conflict-free.
    pub fn is_window_bookable<R: Reservation>(
        &self,
        window: &SlotWindow,
        appointment_type: &AppointmentType,
        reservations: &[R],
    ) -> bool {
        let date = window.start_time.date();
        if window.end_time.date() != date {
            return false;
        }

        let hours = self.settings.hours_for(date);
        let (start, end) = (window.start_time.time(), window.end_time.time());

        hours.contains(start, end)
            && !hours.overlaps_break(start, end)
            && self.checker_for(appointment_type).is_slot_free(window, reservations)
    }

    /// First available slot starting at or after `from`, scanning forward day by day.
    pub fn find_next_available_slot<R: Reservation>(
        &self,
        from: NaiveDateTime,
        appointment_type_id: &str,
        reservations: &[R],
        max_search_days: i64,
    ) -> Result<Option<TimeSlot>, AvailabilityError> {
        validate_day_count("Search window", max_search_days)?;
        debug!("Finding next available {} slot after {}", appointment_type_id, from);

        let appointment_type = self.resolve_type(appointment_type_id)?;

        for offset in 0..max_search_days {
            // Running off the end of the calendar means nothing was found.
            let Ok(date) = offset_date(from.date(), offset) else {
                break;
            };
            let next = self
                .slots_for_type(date, appointment_type, reservations)?
                .into_iter()
                .find(|slot| slot.is_available && slot.start_time >= from);

            if next.is_some() {
                return Ok(next);
            }
        }

        Ok(None)
    }

    /// Per-day slot counts for `days` consecutive days starting at `from`.
    pub fn get_available_days<R: Reservation>(
        &self,
        from: NaiveDate,
        days: i64,
        appointment_type_id: &str,
        reservations: &[R],
    ) -> Result<Vec<DayAvailability>, AvailabilityError> {
        validate_day_count("Day range", days)?;
        let appointment_type = self.resolve_type(appointment_type_id)?;

        (0..days)
            .map(|offset| {
                let date = offset_date(from, offset)?;
                let slots = self.slots_for_type(date, appointment_type, reservations)?;
                Ok(DayAvailability {
                    date,
                    is_working_day: self.settings.hours_for(date).is_working_day,
                    total_slots: slots.len(),
                    available_slots: slots.iter().filter(|s| s.is_available).count(),
                })
            })
            .collect()
    }

    fn checker_for(&self, appointment_type: &AppointmentType) -> ConflictChecker {
        if self.settings.enforce_buffer {
            ConflictChecker::with_buffer(appointment_type.buffer_minutes)
        } else {
            ConflictChecker::new()
        }
    }
}

fn offset_date(from: NaiveDate, offset: i64) -> Result<NaiveDate, AvailabilityError> {
    from.checked_add_signed(Duration::days(offset)).ok_or_else(|| {
        AvailabilityError::InvalidParameter(format!(
            "Date {} plus {} days is out of range",
            from, offset
        ))
    })
}

fn validate_day_count(name: &str, days: i64) -> Result<(), AvailabilityError> {
    if days <= 0 || days > MAX_SEARCH_DAYS {
        return Err(AvailabilityError::InvalidParameter(format!(
            "{} must be between 1 and {} days, got {}",
            name, MAX_SEARCH_DAYS, days
        )));
    }
    Ok(())
}
