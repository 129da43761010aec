// libs/availability-cell/src/services/calendar.rs
use std::collections::HashSet;
use std::fs;

use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use tracing::{debug, info};

use shared_config::AppConfig;

use crate::models::{
    AppointmentType, AvailabilityError, CalendarFile, DateOverride, TimeBreak, WorkingHours,
    WorkingHoursConfig, MINUTES_PER_DAY,
};

const MAX_ADVANCE_HOURS: i64 = 24 * 366;
const MAX_HORIZON_DAYS: i64 = 3660;

/// Parse a time of day in `HH:MM` form.
pub fn parse_time_of_day(value: &str) -> Result<NaiveTime, AvailabilityError> {
    NaiveTime::parse_from_str(value.trim(), "%H:%M").map_err(|_| {
        AvailabilityError::Configuration(format!("Invalid time of day '{}', expected HH:MM", value))
    })
}

fn time(hour: u32, minute: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, minute, 0).unwrap_or(NaiveTime::MIN)
}

// ==============================================================================
// WORKING HOURS TABLE
// ==============================================================================

/// One entry per weekday, indexed by days from Sunday.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkingHoursTable {
    days: Vec<WorkingHours>,
}

impl Default for WorkingHoursTable {
    fn default() -> Self {
        let mut days: Vec<WorkingHours> = (0..7u8).map(WorkingHours::closed).collect();
        for day in 1..=4 {
            days[day] = WorkingHours::open(day as u8, time(9, 0), time(18, 0));
        }
        days[5] = WorkingHours::open(5, time(9, 0), time(17, 0));
        Self { days }
    }
}

impl WorkingHoursTable {
    /// Validates raw entries. Weekdays absent from `entries` are closed.
    pub fn from_config(entries: &[WorkingHoursConfig]) -> Result<Self, AvailabilityError> {
        let mut days: Vec<WorkingHours> = (0..7u8).map(WorkingHours::closed).collect();
        let mut seen = HashSet::new();

        for entry in entries {
            if !(0..=6).contains(&entry.day_of_week) {
                return Err(AvailabilityError::Configuration(format!(
                    "Day of week must be between 0 (Sunday) and 6 (Saturday), got {}",
                    entry.day_of_week
                )));
            }
            if !seen.insert(entry.day_of_week) {
                return Err(AvailabilityError::Configuration(format!(
                    "Working hours for day {} defined more than once",
                    entry.day_of_week
                )));
            }

            let day = entry.day_of_week as u8;
            if !entry.is_working_day {
                continue;
            }

            let start_time = parse_time_of_day(&entry.start_time)?;
            let end_time = parse_time_of_day(&entry.end_time)?;
            if start_time >= end_time {
                return Err(AvailabilityError::Configuration(format!(
                    "Start time must be before end time for day {}",
                    day
                )));
            }

            let mut hours = WorkingHours::open(day, start_time, end_time);
            for raw in &entry.breaks {
                let break_start = parse_time_of_day(&raw.start_time)?;
                let break_end = parse_time_of_day(&raw.end_time)?;
                if break_start >= break_end || break_start < start_time || break_end > end_time {
                    return Err(AvailabilityError::Configuration(format!(
                        "Break {}-{} on day {} must be a non-empty range inside working hours",
                        raw.start_time, raw.end_time, day
                    )));
                }
                hours.breaks.push(TimeBreak {
                    start_time: break_start,
                    end_time: break_end,
                    title: raw.title.clone(),
                });
            }
            hours.breaks.sort_by_key(|b| b.start_time);

            days[day as usize] = hours;
        }

        Ok(Self { days })
    }

    pub fn for_date(&self, date: NaiveDate) -> &WorkingHours {
        &self.days[date.weekday().num_days_from_sunday() as usize]
    }

    pub fn day(&self, day_of_week: u8) -> Option<&WorkingHours> {
        self.days.get(day_of_week as usize)
    }

    pub fn iter(&self) -> impl Iterator<Item = &WorkingHours> {
        self.days.iter()
    }
}

// ==============================================================================
// CALENDAR SETTINGS
// ==============================================================================

pub fn default_appointment_types() -> Vec<AppointmentType> {
    vec![
        AppointmentType {
            id: "free-consultation".to_string(),
            name: "Free Consultation".to_string(),
            description: "Initial 60 minute call to discuss your project".to_string(),
            duration_minutes: 60,
            buffer_minutes: 15,
            price: Some(0.0),
            is_active: true,
            allow_online_booking: true,
            requires_approval: false,
            min_advance_hours: Some(24),
            max_advance_days: Some(30),
        },
        AppointmentType {
            id: "technical-consulting".to_string(),
            name: "Technical Consulting".to_string(),
            description: "90 minute specialised technical consulting session".to_string(),
            duration_minutes: 90,
            buffer_minutes: 30,
            price: Some(150000.0),
            is_active: true,
            allow_online_booking: true,
            requires_approval: true,
            min_advance_hours: Some(48),
            max_advance_days: Some(60),
        },
        AppointmentType {
            id: "project-presentation".to_string(),
            name: "Project Presentation".to_string(),
            description: "Walkthrough of the proposal and project scope".to_string(),
            duration_minutes: 45,
            buffer_minutes: 15,
            price: Some(0.0),
            is_active: true,
            allow_online_booking: true,
            requires_approval: false,
            min_advance_hours: Some(24),
            max_advance_days: Some(14),
        },
        AppointmentType {
            id: "project-follow-up".to_string(),
            name: "Project Follow-up".to_string(),
            description: "Progress review for ongoing projects".to_string(),
            duration_minutes: 30,
            buffer_minutes: 10,
            price: Some(0.0),
            is_active: true,
            allow_online_booking: false,
            requires_approval: false,
            min_advance_hours: Some(4),
            max_advance_days: Some(30),
        },
    ]
}

fn validate_appointment_types(types: &[AppointmentType]) -> Result<(), AvailabilityError> {
    let mut ids = HashSet::new();
    for appointment_type in types {
        if appointment_type.id.trim().is_empty() {
            return Err(AvailabilityError::Configuration(
                "Appointment type id must not be empty".to_string(),
            ));
        }
        if !ids.insert(appointment_type.id.as_str()) {
            return Err(AvailabilityError::Configuration(format!(
                "Appointment type '{}' defined more than once",
                appointment_type.id
            )));
        }
        if appointment_type.duration_minutes <= 0 || appointment_type.duration_minutes > MINUTES_PER_DAY {
            return Err(AvailabilityError::Configuration(format!(
                "Appointment type '{}' must last between 1 and {} minutes",
                appointment_type.id, MINUTES_PER_DAY
            )));
        }
        if appointment_type.buffer_minutes < 0 || appointment_type.buffer_minutes > MINUTES_PER_DAY {
            return Err(AvailabilityError::Configuration(format!(
                "Appointment type '{}' has an invalid buffer of {} minutes",
                appointment_type.id, appointment_type.buffer_minutes
            )));
        }
        if let Some(hours) = appointment_type.min_advance_hours {
            if !(0..=MAX_ADVANCE_HOURS).contains(&hours) {
                return Err(AvailabilityError::Configuration(format!(
                    "Appointment type '{}' has an invalid minimum advance of {} hours",
                    appointment_type.id, hours
                )));
            }
        }
        if let Some(days) = appointment_type.max_advance_days {
            if !(1..=MAX_HORIZON_DAYS).contains(&days) {
                return Err(AvailabilityError::Configuration(format!(
                    "Appointment type '{}' has an invalid booking horizon of {} days",
                    appointment_type.id, days
                )));
            }
        }
    }
    Ok(())
}

/// Immutable booking calendar, validated once at startup.
#[derive(Debug, Clone)]
pub struct CalendarSettings {
    pub business_name: String,
    pub timezone: String,
    pub utc_offset: FixedOffset,
    pub slot_interval_minutes: i64,
    pub auto_confirm_bookings: bool,
    pub min_advance_booking_hours: i64,
    pub max_future_booking_days: i64,
    pub enforce_buffer: bool,
    pub working_hours: WorkingHoursTable,
    pub appointment_types: Vec<AppointmentType>,
    pub date_overrides: Vec<DateOverride>,
}

impl CalendarSettings {
    /// Builds settings from the environment config, reading the calendar file when one is set.
    pub fn load(config: &AppConfig) -> Result<Self, AvailabilityError> {
        let file = match &config.calendar_config_path {
            Some(path) => {
                debug!("Loading calendar configuration from {}", path.display());
                let raw = fs::read_to_string(path).map_err(|e| {
                    AvailabilityError::Configuration(format!(
                        "Failed to read calendar file {}: {}",
                        path.display(),
                        e
                    ))
                })?;
                serde_json::from_str::<CalendarFile>(&raw).map_err(|e| {
                    AvailabilityError::Configuration(format!(
                        "Failed to parse calendar file {}: {}",
                        path.display(),
                        e
                    ))
                })?
            }
            None => CalendarFile::default(),
        };

        Self::from_parts(config, file)
    }

    pub fn from_parts(config: &AppConfig, file: CalendarFile) -> Result<Self, AvailabilityError> {
        if config.slot_interval_minutes <= 0 || config.slot_interval_minutes > MINUTES_PER_DAY {
            return Err(AvailabilityError::Configuration(format!(
                "Slot interval must be between 1 and {} minutes, got {}",
                MINUTES_PER_DAY, config.slot_interval_minutes
            )));
        }
        if !(0..=MAX_ADVANCE_HOURS).contains(&config.min_advance_booking_hours)
            || !(1..=MAX_HORIZON_DAYS).contains(&config.max_future_booking_days)
        {
            return Err(AvailabilityError::Configuration(format!(
                "Booking window out of range: advance {}h, horizon {}d",
                config.min_advance_booking_hours, config.max_future_booking_days
            )));
        }

        let utc_offset = config
            .utc_offset_minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
            .ok_or_else(|| {
                AvailabilityError::Configuration(format!(
                    "UTC offset of {} minutes is out of range",
                    config.utc_offset_minutes
                ))
            })?;

        let working_hours = match &file.working_hours {
            Some(entries) => WorkingHoursTable::from_config(entries)?,
            None => WorkingHoursTable::default(),
        };

        let appointment_types = file
            .appointment_types
            .unwrap_or_else(default_appointment_types);
        validate_appointment_types(&appointment_types)?;

        info!(
            "Calendar loaded for {}: {} appointment types, {} date overrides",
            config.business_name,
            appointment_types.len(),
            file.date_overrides.len()
        );

        Ok(Self {
            business_name: config.business_name.clone(),
            timezone: config.timezone.clone(),
            utc_offset,
            slot_interval_minutes: config.slot_interval_minutes,
            auto_confirm_bookings: config.auto_confirm_bookings,
            min_advance_booking_hours: config.min_advance_booking_hours,
            max_future_booking_days: config.max_future_booking_days,
            enforce_buffer: config.enforce_buffer,
            working_hours,
            appointment_types,
            date_overrides: file.date_overrides,
        })
    }

    pub fn appointment_type(&self, id: &str) -> Option<&AppointmentType> {
        self.appointment_types.iter().find(|t| t.id == id)
    }

    pub fn closure_for(&self, date: NaiveDate) -> Option<&DateOverride> {
        self.date_overrides.iter().find(|o| o.date == date)
    }

    /// Working hours for `date`, with closures treated as non-working days.
    pub fn hours_for(&self, date: NaiveDate) -> WorkingHours {
        let hours = self.working_hours.for_date(date);
        if self.closure_for(date).is_some() {
            return WorkingHours::closed(hours.day_of_week);
        }
        hours.clone()
    }

    /// Current wall-clock time in the business timezone.
    pub fn local_now(&self, now: DateTime<Utc>) -> NaiveDateTime {
        now.with_timezone(&self.utc_offset).naive_local()
    }

    pub fn min_advance_hours_for(&self, appointment_type: &AppointmentType) -> i64 {
        appointment_type
            .min_advance_hours
            .unwrap_or(self.min_advance_booking_hours)
    }

    pub fn max_advance_days_for(&self, appointment_type: &AppointmentType) -> i64 {
        appointment_type
            .max_advance_days
            .unwrap_or(self.max_future_booking_days)
            .min(self.max_future_booking_days)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_table_closes_weekends() {
        let table = WorkingHoursTable::default();
        assert!(!table.day(0).unwrap().is_working_day);
        assert!(!table.day(6).unwrap().is_working_day);
        assert_eq!(table.day(1).unwrap().window_minutes(), 9 * 60);
        assert_eq!(table.day(5).unwrap().end_time, time(17, 0));
    }

    #[test]
    fn test_parse_time_of_day_rejects_seconds_and_garbage() {
        assert_eq!(parse_time_of_day("09:30").unwrap(), time(9, 30));
        assert!(parse_time_of_day("09:30:00").is_err());
        assert!(parse_time_of_day("25:00").is_err());
        assert!(parse_time_of_day("").is_err());
    }
}
