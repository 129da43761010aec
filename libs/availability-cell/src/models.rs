// libs/availability-cell/src/models.rs
use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const MINUTES_PER_DAY: i64 = 24 * 60;

// ==============================================================================
// ERRORS
// ==============================================================================

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AvailabilityError {
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Appointment type not found: {0}")]
    UnknownAppointmentType(String),
}

// ==============================================================================
// WORKING HOURS
// ==============================================================================

/// Raw working-hours entry as it appears in the calendar file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkingHoursConfig {
    pub day_of_week: i32, // 0 = Sunday, 1 = Monday, etc.
    pub is_working_day: bool,
    #[serde(default)]
    pub start_time: String, // HH:MM
    #[serde(default)]
    pub end_time: String, // HH:MM
    #[serde(default)]
    pub breaks: Vec<TimeBreakConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeBreakConfig {
    pub start_time: String,
    pub end_time: String,
    #[serde(default)]
    pub title: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeBreak {
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub title: Option<String>,
}

/// Validated working hours for one weekday.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkingHours {
    pub day_of_week: u8,
    pub is_working_day: bool,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub breaks: Vec<TimeBreak>,
}

impl WorkingHours {
    pub fn open(day_of_week: u8, start_time: NaiveTime, end_time: NaiveTime) -> Self {
        Self {
            day_of_week,
            is_working_day: true,
            start_time,
            end_time,
            breaks: Vec::new(),
        }
    }

    pub fn closed(day_of_week: u8) -> Self {
        Self {
            day_of_week,
            is_working_day: false,
            start_time: NaiveTime::MIN,
            end_time: NaiveTime::MIN,
            breaks: Vec::new(),
        }
    }

    pub fn window_minutes(&self) -> i64 {
        if !self.is_working_day {
            return 0;
        }
        (self.end_time - self.start_time).num_minutes()
    }

    /// True when `[start, end)` on this day falls entirely inside the open window.
    pub fn contains(&self, start: NaiveTime, end: NaiveTime) -> bool {
        self.is_working_day && start >= self.start_time && end <= self.end_time && start < end
    }

    pub fn overlaps_break(&self, start: NaiveTime, end: NaiveTime) -> bool {
        self.breaks
            .iter()
            .any(|b| start < b.end_time && end > b.start_time)
    }
}

// ==============================================================================
// APPOINTMENT TYPES & OVERRIDES
// ==============================================================================

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AppointmentType {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub duration_minutes: i64,
    #[serde(default)]
    pub buffer_minutes: i64,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default = "default_true")]
    pub allow_online_booking: bool,
    #[serde(default)]
    pub requires_approval: bool,
    #[serde(default)]
    pub min_advance_hours: Option<i64>,
    #[serde(default)]
    pub max_advance_days: Option<i64>,
}

/// A date on which no bookings are taken regardless of the weekday table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DateOverride {
    pub date: NaiveDate,
    #[serde(default)]
    pub reason: Option<String>,
}

/// Contents of the JSON file pointed at by `CALENDAR_CONFIG_PATH`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CalendarFile {
    #[serde(default)]
    pub working_hours: Option<Vec<WorkingHoursConfig>>,
    #[serde(default)]
    pub appointment_types: Option<Vec<AppointmentType>>,
    #[serde(default)]
    pub date_overrides: Vec<DateOverride>,
}

// ==============================================================================
// SLOTS & RESERVATIONS
// ==============================================================================

/// Candidate half-open interval `[start_time, end_time)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SlotWindow {
    pub start_time: NaiveDateTime,
    pub end_time: NaiveDateTime,
}

impl SlotWindow {
    pub fn new(start_time: NaiveDateTime, duration_minutes: i64) -> Self {
        Self {
            start_time,
            end_time: start_time + Duration::minutes(duration_minutes),
        }
    }

    pub fn duration_minutes(&self) -> i64 {
        (self.end_time - self.start_time).num_minutes()
    }

    pub fn overlaps(&self, start: NaiveDateTime, end: NaiveDateTime) -> bool {
        self.start_time < end && self.end_time > start
    }

    /// Extends both ends by `minutes`, clamped to the representable range.
    pub fn widened(&self, minutes: i64) -> Self {
        let delta = Duration::minutes(minutes);
        Self {
            start_time: self
                .start_time
                .checked_sub_signed(delta)
                .unwrap_or(NaiveDateTime::MIN),
            end_time: self
                .end_time
                .checked_add_signed(delta)
                .unwrap_or(NaiveDateTime::MAX),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSlot {
    pub id: String,
    pub start_time: NaiveDateTime,
    pub end_time: NaiveDateTime,
    pub is_available: bool,
    pub appointment_type_id: Option<String>,
}

impl TimeSlot {
    pub fn from_window(window: SlotWindow, is_available: bool, appointment_type_id: Option<&str>) -> Self {
        Self {
            id: window.start_time.format("%Y%m%d%H%M").to_string(),
            start_time: window.start_time,
            end_time: window.end_time,
            is_available,
            appointment_type_id: appointment_type_id.map(str::to_string),
        }
    }

    pub fn window(&self) -> SlotWindow {
        SlotWindow {
            start_time: self.start_time,
            end_time: self.end_time,
        }
    }
}

/// Anything that occupies the calendar: booked appointments, external holds.
pub trait Reservation {
    fn start_time(&self) -> NaiveDateTime;
    fn end_time(&self) -> NaiveDateTime;
    fn is_cancelled(&self) -> bool;
}

/// Minimal reservation used when only the occupied window is known.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookedWindow {
    pub start_time: NaiveDateTime,
    pub end_time: NaiveDateTime,
    #[serde(default)]
    pub cancelled: bool,
}

impl Reservation for BookedWindow {
    fn start_time(&self) -> NaiveDateTime {
        self.start_time
    }

    fn end_time(&self) -> NaiveDateTime {
        self.end_time
    }

    fn is_cancelled(&self) -> bool {
        self.cancelled
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayAvailability {
    pub date: NaiveDate,
    pub is_working_day: bool,
    pub total_slots: usize,
    pub available_slots: usize,
}
